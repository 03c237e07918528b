// crates/fcs-core/src/compiler/permissions.rs
// ============================================================================
// Module: Token Permission Aggregator
// Description: Greedy packing of test cases into access-token groups.
// Purpose: Minimise token acquisitions while honouring excluded permissions.
// Dependencies: crate::model::{context, identifiers, testcase}, thiserror
// ============================================================================

//! ## Overview
//! Each test case needs an access token carrying its required permissions
//! and none of its excluded permissions. Test cases are scanned in order; the
//! first existing group whose required permissions avoid the test case's
//! exclusions, and whose exclusions avoid the test case's requirements,
//! absorbs it. Otherwise a new group is opened with the next name from the
//! journey's [`TokenNamer`].
//!
//! Invariant: for every group, required ∩ excluded = ∅, and every input test
//! case appears in exactly one group.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::compiler::builder::PERMISSIONS_EXCLUDED_KEY;
use crate::compiler::builder::PERMISSIONS_KEY;
use crate::model::identifiers::TestCaseId;
use crate::model::identifiers::TokenName;
use crate::model::testcase::TestCase;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Placeholder for the client-credentials access token.
pub const CLIENT_CREDENTIALS_TOKEN: &str = "client_access_token";

/// Context directive that suppresses bearer-token injection.
const REQUEST_CONSENT_KEY: &str = "requestConsent";

/// Header receiving the bearer token.
const AUTHORIZATION_HEADER: &str = "Authorization";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Required and excluded permissions of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    /// Test-case identifier.
    pub id: TestCaseId,
    /// Permissions the token must carry.
    pub required: BTreeSet<String>,
    /// Permissions the token must not carry.
    pub excluded: BTreeSet<String>,
}

impl PermissionSet {
    /// Creates a permission set.
    #[must_use]
    pub fn new<R, E>(id: impl Into<TestCaseId>, required: R, excluded: E) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            id: id.into(),
            required: required.into_iter().map(Into::into).collect(),
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }
}

/// Test cases sharing one access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGroup {
    /// Token name, also the `$name` placeholder.
    pub name: TokenName,
    /// Member test cases in assignment order.
    pub test_cases: Vec<TestCaseId>,
    /// Union of member required permissions.
    pub permissions: BTreeSet<String>,
    /// Union of member excluded permissions.
    pub excluded: BTreeSet<String>,
}

impl TokenGroup {
    /// Returns true when `set` can join without violating exclusions.
    fn accepts(&self, set: &PermissionSet) -> bool {
        self.permissions.is_disjoint(&set.excluded) && self.excluded.is_disjoint(&set.required)
    }

    /// Returns the space-joined permission list for the consent request.
    #[must_use]
    pub fn scope(&self) -> String {
        self.permissions.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }

    /// Returns true when the group contains `id`.
    #[must_use]
    pub fn contains(&self, id: &TestCaseId) -> bool {
        self.test_cases.contains(id)
    }
}

/// Monotonic token-name generator owned by a journey.
#[derive(Debug, Clone, Default)]
pub struct TokenNamer {
    /// Last issued counter value.
    issued: u32,
}

impl TokenNamer {
    /// Creates a namer starting at `Token0001`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            issued: 0,
        }
    }

    /// Issues the next token name.
    pub fn next_name(&mut self) -> TokenName {
        self.issued = self.issued.saturating_add(1);
        TokenName::new(format!("Token{:04}", self.issued))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Permission aggregation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// A test case requires and excludes the same permission.
    #[error("test case {id} both requires and excludes permission {permission}")]
    SelfConflict {
        /// Test-case identifier.
        id: String,
        /// Conflicting permission.
        permission: String,
    },
}

// ============================================================================
// SECTION: Grouping
// ============================================================================

/// Packs permission sets into token groups, first fit in input order.
///
/// # Errors
///
/// Returns [`PermissionError::SelfConflict`] when a set conflicts with itself.
pub fn group_permissions(
    sets: &[PermissionSet],
    namer: &mut TokenNamer,
) -> Result<Vec<TokenGroup>, PermissionError> {
    let mut groups: Vec<TokenGroup> = Vec::new();
    for set in sets {
        if let Some(permission) = set.required.intersection(&set.excluded).next() {
            return Err(PermissionError::SelfConflict {
                id: set.id.to_string(),
                permission: permission.clone(),
            });
        }
        if let Some(group) = groups.iter_mut().find(|group| group.accepts(set)) {
            group.test_cases.push(set.id.clone());
            group.permissions.extend(set.required.iter().cloned());
            group.excluded.extend(set.excluded.iter().cloned());
            continue;
        }
        groups.push(TokenGroup {
            name: namer.next_name(),
            test_cases: vec![set.id.clone()],
            permissions: set.required.clone(),
            excluded: set.excluded.clone(),
        });
    }
    Ok(groups)
}

/// Extracts permission sets from compiled test cases.
///
/// Client-credentials test cases are skipped; they use their own token.
#[must_use]
pub fn permission_sets(test_cases: &[TestCase]) -> Vec<PermissionSet> {
    test_cases
        .iter()
        .filter(|test_case| !test_case.use_client_credentials)
        .map(|test_case| {
            let required = test_case.context.get_strings(PERMISSIONS_KEY).map(<[String]>::to_vec).unwrap_or_default();
            let excluded =
                test_case.context.get_strings(PERMISSIONS_EXCLUDED_KEY).map(<[String]>::to_vec).unwrap_or_default();
            PermissionSet::new(test_case.id.clone(), required, excluded)
        })
        .collect()
}

/// Writes bearer-token placeholders into test-case Authorization headers.
///
/// Test cases whose context carries a consent-request directive are left
/// untouched.
pub fn inject_tokens(test_cases: &mut [TestCase], groups: &[TokenGroup]) {
    for test_case in test_cases.iter_mut() {
        let token = if test_case.use_client_credentials {
            format!("${CLIENT_CREDENTIALS_TOKEN}")
        } else if test_case.context.contains(REQUEST_CONSENT_KEY) {
            continue;
        } else if let Some(group) = groups.iter().find(|group| group.contains(&test_case.id)) {
            group.name.placeholder()
        } else {
            continue;
        };
        test_case.input.headers.retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION_HEADER));
        test_case.input.headers.insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {token}"));
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
