// crates/fcs-core/src/model/path_template.rs
// ============================================================================
// Module: Path Templates
// Description: Anchored matching of concrete request paths to `{Name}` templates.
// Purpose: Shared path matcher for validators and conditional-property lookup.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! Specification and discovery paths use `{Name}` placeholders. A template
//! compiles to an anchored regex where each placeholder matches one non-empty
//! path segment (`[^/]+`) and every literal character is escaped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;

// ============================================================================
// SECTION: Path Template
// ============================================================================

/// Compiled `{Name}` path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    /// Original template text.
    template: String,
    /// Anchored matcher.
    matcher: Regex,
}

impl PathTemplate {
    /// Compiles a path template.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] when the generated pattern is rejected.
    pub fn new(template: &str) -> Result<Self, regex::Error> {
        let matcher = Regex::new(&template_pattern(template))?;
        Ok(Self {
            template: template.to_string(),
            matcher,
        })
    }

    /// Returns the original template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Returns true when `path` matches the template in full.
    ///
    /// Any query string on `path` is ignored.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path = path.split_once('?').map_or(path, |(head, _)| head);
        self.matcher.is_match(path)
    }

    /// Returns true when the template declares no placeholders.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        !self.template.contains('{')
    }
}

/// Builds the anchored regex source for a template.
fn template_pattern(template: &str) -> String {
    let mut pattern = String::from("^");
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open ..].find('}') else {
            break;
        };
        pattern.push_str(&regex::escape(&rest[.. open]));
        pattern.push_str("[^/]+");
        rest = &rest[open + close + 1 ..];
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');
    pattern
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn placeholders_match_single_segments() {
        let template = PathTemplate::new("/accounts/{AccountId}/statements/{StatementId}").unwrap();
        assert!(template.matches("/accounts/a1/statements/s9"));
        assert!(!template.matches("/accounts/a1/statements"));
        assert!(!template.matches("/accounts/a1/x/statements/s9"));
    }

    #[test]
    fn literal_templates_are_anchored() {
        let template = PathTemplate::new("/accounts").unwrap();
        assert!(template.is_literal());
        assert!(template.matches("/accounts"));
        assert!(template.matches("/accounts?page=2"));
        assert!(!template.matches("/accounts/a1"));
        assert!(!template.matches("/v3.1/aisp/accounts"));
    }

    #[test]
    fn literal_dots_are_escaped() {
        let template = PathTemplate::new("/v3.1/pisp/{Id}").unwrap();
        assert!(template.matches("/v3.1/pisp/abc"));
        assert!(!template.matches("/v3x1/pisp/abc"));
    }
}
