// crates/fcs-core/src/model/context.rs
// ============================================================================
// Module: Conformance Context
// Description: Ordered key/value bag threaded through compilation and runs.
// Purpose: Carry discovery identifiers, API versions, and per-script values.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`Context`] maps names to typed values. Journey-wide values (discovery
//! resource IDs, base URLs, API versions) and per-script local values both
//! live in contexts. Text containing `$name` tokens is resolved against a
//! context by [`Context::substitute`], which follows tokens recursively up to
//! [`MAX_SUBSTITUTION_DEPTH`] levels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum nesting depth when a substituted value itself contains tokens.
pub const MAX_SUBSTITUTION_DEPTH: usize = 8;

// ============================================================================
// SECTION: Values
// ============================================================================

/// Typed value stored in a [`Context`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    /// Plain string value.
    String(String),
    /// List of strings (permissions, API versions).
    Strings(Vec<String>),
    /// Arbitrary JSON value.
    Json(Value),
}

impl ContextValue {
    /// Renders the value as substitution text.
    ///
    /// String lists render as a JSON array so they can be spliced into
    /// request bodies; non-string JSON renders as compact JSON.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::String(value) => value.clone(),
            Self::Strings(values) => Value::from(values.clone()).to_string(),
            Self::Json(Value::String(value)) => value.clone(),
            Self::Json(value) => value.to_string(),
        }
    }

    /// Returns true when the value is only an unresolved `$key` reference.
    #[must_use]
    pub fn is_self_reference(&self, key: &str) -> bool {
        match self {
            Self::String(value) | Self::Json(Value::String(value)) => value.strip_prefix('$') == Some(key),
            Self::Strings(_) | Self::Json(_) => false,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by context lookups and substitution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A `$name` token had no value in strict mode.
    #[error("missing context value for ${0}")]
    MissingValue(String),
    /// Token resolution exceeded the recursion cap.
    #[error("context substitution for ${0} exceeded depth {MAX_SUBSTITUTION_DEPTH}")]
    RecursionLimit(String),
    /// A value exists but has a different type than requested.
    #[error("context value {0} has an unexpected type")]
    TypeMismatch(String),
}

// ============================================================================
// SECTION: Substitution
// ============================================================================

/// Controls how unresolved tokens are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionMode {
    /// Leave unresolved tokens in place and report them.
    Lenient,
    /// Fail on the first unresolved token.
    Strict,
}

/// Result of a substitution pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Substitution {
    /// Text with every resolvable token replaced.
    pub text: String,
    /// Names of tokens left unresolved (lenient mode only).
    pub missing: Vec<String>,
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Ordered mapping from names to typed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    /// Values keyed by name.
    values: BTreeMap<String, ContextValue>,
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true when a value exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// Returns the rendered text for `key`, if present.
    #[must_use]
    pub fn render(&self, key: &str) -> Option<String> {
        self.values.get(key).map(ContextValue::render)
    }

    /// Returns the string stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MissingValue`] when absent and
    /// [`ContextError::TypeMismatch`] when the value is not a string.
    pub fn get_string(&self, key: &str) -> Result<&str, ContextError> {
        match self.values.get(key) {
            Some(ContextValue::String(value)) => Ok(value),
            Some(ContextValue::Json(Value::String(value))) => Ok(value),
            Some(_) => Err(ContextError::TypeMismatch(key.to_string())),
            None => Err(ContextError::MissingValue(key.to_string())),
        }
    }

    /// Returns the string list stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MissingValue`] when absent and
    /// [`ContextError::TypeMismatch`] when the value is not a string list.
    pub fn get_strings(&self, key: &str) -> Result<&[String], ContextError> {
        match self.values.get(key) {
            Some(ContextValue::Strings(values)) => Ok(values),
            Some(_) => Err(ContextError::TypeMismatch(key.to_string())),
            None => Err(ContextError::MissingValue(key.to_string())),
        }
    }

    /// Stores a value, replacing any previous entry.
    pub fn put(&mut self, key: impl Into<String>, value: ContextValue) {
        self.values.insert(key.into(), value);
    }

    /// Stores a string value.
    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put(key, ContextValue::String(value.into()));
    }

    /// Stores a string list value.
    pub fn put_strings(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.put(key, ContextValue::Strings(values));
    }

    /// Stores a JSON value.
    pub fn put_json(&mut self, key: impl Into<String>, value: Value) {
        self.put(key, ContextValue::Json(value));
    }

    /// Removes and returns the value under `key`.
    pub fn delete(&mut self, key: &str) -> Option<ContextValue> {
        self.values.remove(key)
    }

    /// Copies every entry of `other` into this context, overwriting collisions.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Layers this context over `parent`.
    ///
    /// Parent entries fill absent keys and replace entries that are only an
    /// unresolved reference to their own key.
    pub fn layer_over(&mut self, parent: &Self) {
        for (key, value) in &parent.values {
            let keep_own = self.values.get(key).is_some_and(|own| !own.is_self_reference(key));
            if !keep_own {
                self.values.insert(key.clone(), value.clone());
            }
        }
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ContextValue> {
        self.values.iter()
    }

    /// Replaces every `$name` token in `text` with its context value.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MissingValue`] in strict mode when a token is
    /// unresolved, and [`ContextError::RecursionLimit`] when resolution nests
    /// deeper than [`MAX_SUBSTITUTION_DEPTH`].
    pub fn substitute(
        &self,
        text: &str,
        mode: SubstitutionMode,
    ) -> Result<Substitution, ContextError> {
        let mut missing = Vec::new();
        let text = self.substitute_at_depth(text, mode, 0, &mut missing)?;
        missing.dedup();
        Ok(Substitution {
            text,
            missing,
        })
    }

    /// Recursive worker for [`Context::substitute`].
    fn substitute_at_depth(
        &self,
        text: &str,
        mode: SubstitutionMode,
        depth: usize,
        missing: &mut Vec<String>,
    ) -> Result<String, ContextError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(offset) = rest.find('$') {
            out.push_str(&rest[.. offset]);
            let after = &rest[offset + 1 ..];
            let name_len = after.find(|ch: char| !is_token_char(ch)).unwrap_or(after.len());
            if name_len == 0 {
                out.push('$');
                rest = after;
                continue;
            }
            let name = &after[.. name_len];
            rest = &after[name_len ..];
            let value = self.values.get(name).filter(|value| !value.is_self_reference(name)).map(ContextValue::render);
            match value {
                Some(value) if value.contains('$') => {
                    if depth + 1 >= MAX_SUBSTITUTION_DEPTH {
                        return Err(ContextError::RecursionLimit(name.to_string()));
                    }
                    out.push_str(&self.substitute_at_depth(&value, mode, depth + 1, missing)?);
                }
                Some(value) => out.push_str(&value),
                None => match mode {
                    SubstitutionMode::Strict => {
                        return Err(ContextError::MissingValue(name.to_string()));
                    }
                    SubstitutionMode::Lenient => {
                        missing.push(name.to_string());
                        out.push('$');
                        out.push_str(name);
                    }
                },
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl<'a> IntoIterator for &'a Context {
    type IntoIter = btree_map::Iter<'a, String, ContextValue>;
    type Item = (&'a String, &'a ContextValue);

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Returns true for characters allowed in a `$name` token.
const fn is_token_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

// ============================================================================
// SECTION: Tests
// ============================================================================
