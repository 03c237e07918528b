// crates/fcs-core/src/model/expect.rs
// ============================================================================
// Module: Expectations
// Description: Status, header and body assertions evaluated against responses.
// Purpose: Decide test-case pass/fail and capture values for later test cases.
// Dependencies: crate::model::{context, http, json_path}, regex, serde
// ============================================================================

//! ## Overview
//! An [`Expect`] is cloned from the assertions catalogue into every compiled
//! test case, so test cases never refer back to the catalogue at run time.
//! Each [`Match`] checks one property of the response. Context-put matches
//! run only after every other check passed and copy response values into the
//! journey context.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::model::context::Context;
use crate::model::http::HttpResponse;
use crate::model::json_path::scalar_text;
use crate::model::json_path::select_first;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Expected response properties for a test case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expect {
    /// Expected HTTP status; zero accepts any status.
    #[serde(rename = "status-code", alias = "status_code", default)]
    pub status_code: u16,
    /// Checks applied to the response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<Match>,
    /// Validate the body against the OpenAPI response schema.
    #[serde(rename = "schema-validation", default)]
    pub schema_validation: bool,
    /// Values persisted into the parent context on success.
    #[serde(rename = "contextPut", default, skip_serializing_if = "Option::is_none")]
    pub context_put: Option<ContextPut>,
}

/// Response values copied into the context after a passing test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPut {
    /// Extraction matches; each needs a context name.
    #[serde(default)]
    pub matches: Vec<Match>,
}

/// A single response check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Free-text description used in failure messages.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Context key receiving an extracted value.
    #[serde(rename = "name", default, skip_serializing_if = "String::is_empty")]
    pub context_name: String,
    /// Header to compare.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub header: String,
    /// Header that must be present.
    #[serde(rename = "header-present", default, skip_serializing_if = "String::is_empty")]
    pub header_present: String,
    /// Regular expression applied to the header, JSON value or body.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub regex: String,
    /// Dotted JSON path into the response body.
    #[serde(rename = "JSON", default, skip_serializing_if = "String::is_empty")]
    pub json: String,
    /// Expected value for a header or JSON path.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Expected body length in bytes.
    #[serde(rename = "body-length", default, skip_serializing_if = "Option::is_none")]
    pub body_length: Option<u64>,
}

/// Result of evaluating one [`Match`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The check held.
    Passed,
    /// The check failed with a reason.
    Failed(String),
}

impl MatchOutcome {
    /// Returns true when the check held.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

// ============================================================================
// SECTION: Match Evaluation
// ============================================================================

impl Match {
    /// Creates a context-put match extracting `json` into `name`.
    #[must_use]
    pub fn context_extract(name: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            context_name: name.into(),
            json: json.into(),
            ..Self::default()
        }
    }

    /// Evaluates this check against a response.
    ///
    /// `body` is the response body parsed as JSON, when it parses.
    #[must_use]
    pub fn evaluate(&self, response: &HttpResponse, body: Option<&Value>) -> MatchOutcome {
        if !self.header.is_empty() {
            return self.evaluate_header(response);
        }
        if !self.header_present.is_empty() {
            if response.headers.contains(&self.header_present) {
                return MatchOutcome::Passed;
            }
            return self.fail(format!("header {} not present", self.header_present));
        }
        if !self.json.is_empty() {
            return self.evaluate_json(body);
        }
        if let Some(expected) = self.body_length {
            let actual = u64::try_from(response.body.len()).unwrap_or(u64::MAX);
            if actual == expected {
                return MatchOutcome::Passed;
            }
            return self.fail(format!("body length {actual} does not equal {expected}"));
        }
        if !self.regex.is_empty() {
            let text = String::from_utf8_lossy(&response.body);
            return self.evaluate_regex(&text, "body");
        }
        MatchOutcome::Passed
    }

    /// Header comparison by value, regex or presence.
    fn evaluate_header(&self, response: &HttpResponse) -> MatchOutcome {
        let Some(actual) = response.headers.get(&self.header) else {
            return self.fail(format!("header {} not present", self.header));
        };
        if !self.value.is_empty() {
            if actual == self.value {
                return MatchOutcome::Passed;
            }
            return self.fail(format!(
                "header {} value {actual} does not equal {}",
                self.header, self.value
            ));
        }
        if !self.regex.is_empty() {
            return self.evaluate_regex(actual, &format!("header {}", self.header));
        }
        MatchOutcome::Passed
    }

    /// JSON path comparison by value, regex or presence.
    fn evaluate_json(&self, body: Option<&Value>) -> MatchOutcome {
        let Some(body) = body else {
            return self.fail(format!("JSON path {} checked against a non-JSON body", self.json));
        };
        let found = match select_first(body, &self.json) {
            Ok(found) => found,
            Err(err) => return self.fail(err),
        };
        let Some(found) = found else {
            return self.fail(format!("JSON path {} not found", self.json));
        };
        let actual = scalar_text(&found);
        if !self.value.is_empty() {
            if actual == self.value {
                return MatchOutcome::Passed;
            }
            return self.fail(format!(
                "JSON path {} value {actual} does not equal {}",
                self.json, self.value
            ));
        }
        if !self.regex.is_empty() {
            return self.evaluate_regex(&actual, &format!("JSON path {}", self.json));
        }
        MatchOutcome::Passed
    }

    /// Regex comparison against `text`.
    fn evaluate_regex(&self, text: &str, target: &str) -> MatchOutcome {
        match Regex::new(&self.regex) {
            Ok(pattern) if pattern.is_match(text) => MatchOutcome::Passed,
            Ok(_) => self.fail(format!("{target} does not match regex {}", self.regex)),
            Err(err) => self.fail(format!("invalid regex {}: {err}", self.regex)),
        }
    }

    /// Builds a failure, prefixed with the description when one exists.
    fn fail(&self, reason: String) -> MatchOutcome {
        if self.description.is_empty() {
            MatchOutcome::Failed(reason)
        } else {
            MatchOutcome::Failed(format!("{}: {reason}", self.description))
        }
    }

    /// Extracts the value this match addresses for a context put.
    fn extract(&self, response: &HttpResponse, body: Option<&Value>) -> Option<Value> {
        if !self.json.is_empty() {
            return body.and_then(|body| select_first(body, &self.json).ok().flatten());
        }
        if !self.header.is_empty() {
            return response.headers.get(&self.header).map(|value| Value::String(value.to_string()));
        }
        None
    }
}

// ============================================================================
// SECTION: Expect Evaluation
// ============================================================================

impl Expect {
    /// Evaluates status and matches; returns failure reasons in order.
    #[must_use]
    pub fn evaluate(&self, response: &HttpResponse) -> Vec<String> {
        let mut failures = Vec::new();
        if self.status_code != 0 && self.status_code != response.status {
            failures.push(format!(
                "status code {} does not equal expected {}",
                response.status, self.status_code
            ));
        }
        let body = parse_body(&response.body);
        for check in &self.matches {
            if let MatchOutcome::Failed(reason) = check.evaluate(response, body.as_ref()) {
                failures.push(reason);
            }
        }
        failures
    }

    /// Copies context-put values from `response` into `context`.
    ///
    /// Returns a failure reason for every value that could not be extracted.
    pub fn put_context(&self, response: &HttpResponse, context: &mut Context) -> Vec<String> {
        let Some(context_put) = &self.context_put else {
            return Vec::new();
        };
        let body = parse_body(&response.body);
        let mut failures = Vec::new();
        for check in &context_put.matches {
            if check.context_name.is_empty() {
                continue;
            }
            match check.extract(response, body.as_ref()) {
                Some(Value::String(text)) => context.put_string(check.context_name.clone(), text),
                Some(value) => context.put_json(check.context_name.clone(), value),
                None => failures.push(format!(
                    "could not extract {} for context value {}",
                    if check.json.is_empty() { &check.header } else { &check.json },
                    check.context_name
                )),
            }
        }
        failures
    }

    /// Appends a context-put extraction.
    pub fn push_context_put(&mut self, extraction: Match) {
        self.context_put.get_or_insert_with(ContextPut::default).matches.push(extraction);
    }
}

/// Parses a response body as JSON when possible.
fn parse_body(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;
    use crate::model::http::Headers;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            method: "GET".to_string(),
            path: "/accounts".to_string(),
            status,
            headers: Headers::new().with("Content-Type", "application/json").with("x-fapi-interaction-id", "abc-123"),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn status_zero_accepts_any_status() {
        let expect = Expect::default();
        assert!(expect.evaluate(&response(503, "")).is_empty());
    }

    #[test]
    fn status_mismatch_is_reported() {
        let expect = Expect {
            status_code: 200,
            ..Expect::default()
        };
        let failures = expect.evaluate(&response(403, ""));
        assert_eq!(failures, vec!["status code 403 does not equal expected 200".to_string()]);
    }

    #[test]
    fn header_and_json_matches_evaluate() {
        let expect = Expect {
            status_code: 200,
            matches: vec![
                Match {
                    header: "X-Fapi-Interaction-Id".to_string(),
                    regex: "^[a-z]+-[0-9]+$".to_string(),
                    ..Match::default()
                },
                Match {
                    json: "Data.Account.0.AccountId".to_string(),
                    value: "a1".to_string(),
                    ..Match::default()
                },
                Match {
                    json: "Data.Account.#".to_string(),
                    value: "1".to_string(),
                    ..Match::default()
                },
            ],
            ..Expect::default()
        };
        let body = r#"{"Data":{"Account":[{"AccountId":"a1"}]}}"#;
        assert!(expect.evaluate(&response(200, body)).is_empty());
    }

    #[test]
    fn described_failures_carry_description() {
        let check = Match {
            description: "Account id present".to_string(),
            json: "Data.Account.0.AccountId".to_string(),
            ..Match::default()
        };
        let outcome = check.evaluate(&response(200, "{}"), Some(&serde_json::json!({})));
        assert_eq!(
            outcome,
            MatchOutcome::Failed("Account id present: JSON path Data.Account.0.AccountId not found".to_string())
        );
    }

    #[test]
    fn context_put_extracts_values() {
        let mut expect = Expect::default();
        expect.push_context_put(Match::context_extract("consentId", "Data.ConsentId"));
        let mut context = Context::new();
        let failures = expect.put_context(&response(201, r#"{"Data":{"ConsentId":"c-9"}}"#), &mut context);
        assert!(failures.is_empty());
        assert_eq!(context.get_string("consentId").unwrap(), "c-9");
    }

    #[test]
    fn expect_deserializes_both_status_spellings() {
        let hyphen: Expect = serde_json::from_str(r#"{"status-code":201}"#).unwrap();
        let underscore: Expect = serde_json::from_str(r#"{"status_code":201}"#).unwrap();
        assert_eq!(hyphen, underscore);
    }
}
