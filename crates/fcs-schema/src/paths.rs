// crates/fcs-schema/src/paths.rs
// ============================================================================
// Module: Path Index
// Description: Operation lookup by method and concrete request path.
// Purpose: Route observed exchanges to the declaring OpenAPI operation.
// Dependencies: fcs-core, serde_json
// ============================================================================

//! ## Overview
//! Every declared path compiles to an anchored [`PathTemplate`]. Lookup strips
//! the document base path and the query string, then returns the first entry
//! whose template matches and which declares the requested verb. Entries are
//! ordered literal-first so a concrete path such as `/accounts/bulk` is never
//! captured by `/accounts/{AccountId}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use fcs_core::PathTemplate;
use fcs_core::ValidatorError;
use serde_json::Value;

use crate::document::OPERATION_METHODS;
use crate::document::SpecDocument;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One declared path with its operations.
#[derive(Debug, Clone)]
pub struct PathEntry {
    /// Compiled template.
    template: PathTemplate,
    /// Lower-case method to operation object.
    operations: BTreeMap<String, Value>,
    /// Path-item level parameters shared by every operation.
    parameters: Vec<Value>,
}

impl PathEntry {
    /// Returns the declared path template.
    #[must_use]
    pub fn path(&self) -> &str {
        self.template.as_str()
    }

    /// Returns the operation for `method`, if declared.
    #[must_use]
    pub fn operation(&self, method: &str) -> Option<&Value> {
        self.operations.get(&method.to_ascii_lowercase())
    }

    /// Returns the path-item level parameters.
    #[must_use]
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }
}

/// Resolved operation for one exchange.
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    /// Matching path entry.
    pub entry: &'a PathEntry,
    /// Operation object.
    pub object: &'a Value,
}

/// Ordered index of declared paths.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    /// Entries, literal templates first.
    entries: Vec<PathEntry>,
    /// Prefix stripped from observed paths.
    base_path: String,
}

impl PathIndex {
    /// Builds the index for a document.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::InvalidSchema`] when a path template does not compile.
    pub fn build(document: &SpecDocument) -> Result<Self, ValidatorError> {
        let mut entries = Vec::new();
        for (path, item) in document.paths() {
            let item = document.resolve(item);
            let template = PathTemplate::new(path)
                .map_err(|err| ValidatorError::InvalidSchema(format!("path {path}: {err}")))?;
            let operations = OPERATION_METHODS
                .iter()
                .filter_map(|method| item.get(*method).map(|operation| ((*method).to_string(), operation.clone())))
                .collect();
            let parameters = item.get("parameters").and_then(Value::as_array).cloned().unwrap_or_default();
            entries.push(PathEntry {
                template,
                operations,
                parameters,
            });
        }
        entries.sort_by_key(|entry| (placeholder_count(entry.path()), entry.path().to_string()));
        Ok(Self {
            entries,
            base_path: document.base_path(),
        })
    }

    /// Returns the operation declared for `method` on `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::NotFound`] when no entry matches with that verb.
    pub fn lookup(&self, method: &str, path: &str) -> Result<Operation<'_>, ValidatorError> {
        let relative = self.relative(path);
        self.entries
            .iter()
            .filter(|entry| entry.template.matches(relative))
            .find_map(|entry| {
                entry.operation(method).map(|object| Operation {
                    entry,
                    object,
                })
            })
            .ok_or_else(|| ValidatorError::NotFound(format!("{} {path}", method.to_ascii_uppercase())))
    }

    /// Returns every declared path with its upper-case methods.
    #[must_use]
    pub fn endpoints(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.entries
            .iter()
            .map(|entry| {
                let methods = entry.operations.keys().map(|method| method.to_ascii_uppercase()).collect();
                (entry.path().to_string(), methods)
            })
            .collect()
    }

    /// Strips the base path from an observed path.
    fn relative<'a>(&self, path: &'a str) -> &'a str {
        if self.base_path.is_empty() {
            return path;
        }
        match path.strip_prefix(self.base_path.as_str()) {
            Some(rest) if rest.starts_with('/') => rest,
            _ => path,
        }
    }
}

/// Counts `{Name}` placeholders in a template.
fn placeholder_count(template: &str) -> usize {
    template.matches('{').count()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
