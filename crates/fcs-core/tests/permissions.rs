// crates/fcs-core/tests/permissions.rs
// ============================================================================
// Module: Permission Aggregator Tests
// Description: Tests for token grouping and bearer-token injection.
// Purpose: Confirm first-fit grouping and its disjointness invariants.
// ============================================================================
//! ## Overview
//! Exercises `group_permissions`, `permission_sets` and `inject_tokens`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeSet;

use fcs_core::Context;
use fcs_core::PermissionSet;
use fcs_core::TestCase;
use fcs_core::TestCaseId;
use fcs_core::TokenNamer;
use fcs_core::group_permissions;
use fcs_core::inject_tokens;
use fcs_core::permission_sets;
use proptest::prelude::*;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn no_exclusions() -> Vec<String> {
    Vec::new()
}

fn test_case(id: &str, required: &[&str], excluded: &[&str]) -> TestCase {
    let mut context = Context::new();
    if !required.is_empty() {
        context.put_strings("permissions", required.iter().map(|p| (*p).to_string()).collect());
    }
    if !excluded.is_empty() {
        context.put_strings("permissions-excluded", excluded.iter().map(|p| (*p).to_string()).collect());
    }
    TestCase {
        id: TestCaseId::new(id),
        context,
        ..TestCase::default()
    }
}

// ============================================================================
// SECTION: Grouping
// ============================================================================

#[test]
fn conflicting_exclusion_opens_a_second_group() {
    let sets = vec![
        PermissionSet::new("A", ["ReadAccountsBasic"], no_exclusions()),
        PermissionSet::new("B", ["ReadAccountsDetail"], ["ReadAccountsBasic"]),
    ];
    let groups = group_permissions(&sets, &mut TokenNamer::new()).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name.as_str(), "Token0001");
    assert_eq!(groups[0].test_cases, vec![TestCaseId::new("A")]);
    assert_eq!(groups[1].name.as_str(), "Token0002");
    assert_eq!(groups[1].test_cases, vec![TestCaseId::new("B")]);
}

#[test]
fn compatible_sets_share_one_token() {
    let sets = vec![
        PermissionSet::new("A", ["ReadAccountsBasic"], no_exclusions()),
        PermissionSet::new("B", ["ReadTransactionsBasic"], no_exclusions()),
    ];
    let groups = group_permissions(&sets, &mut TokenNamer::new()).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name.as_str(), "Token0001");
    assert_eq!(groups[0].test_cases, vec![TestCaseId::new("A"), TestCaseId::new("B")]);
    let expected: BTreeSet<String> =
        ["ReadAccountsBasic", "ReadTransactionsBasic"].into_iter().map(str::to_string).collect();
    assert_eq!(groups[0].permissions, expected);
}

#[test]
fn namer_continues_across_calls() {
    let mut namer = TokenNamer::new();
    let first = group_permissions(&[PermissionSet::new("A", ["ReadBalances"], no_exclusions())], &mut namer).unwrap();
    let second = group_permissions(&[PermissionSet::new("B", ["ReadBalances"], no_exclusions())], &mut namer).unwrap();
    assert_eq!(first[0].name.as_str(), "Token0001");
    assert_eq!(second[0].name.as_str(), "Token0002");
}

#[test]
fn empty_input_yields_no_groups() {
    let groups = group_permissions(&[], &mut TokenNamer::new()).unwrap();
    assert!(groups.is_empty());
}

// ============================================================================
// SECTION: Test-Case Integration
// ============================================================================

#[test]
fn permission_sets_skip_client_credentials_cases() {
    let mut ccg = test_case("C", &["ReadAccountsBasic"], &[]);
    ccg.use_client_credentials = true;
    let cases = vec![test_case("A", &["ReadAccountsBasic"], &[]), ccg];
    let sets = permission_sets(&cases);
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].id, TestCaseId::new("A"));
}

#[test]
fn tokens_are_injected_as_bearer_placeholders() {
    let mut ccg = test_case("C", &[], &[]);
    ccg.use_client_credentials = true;
    let mut consent = test_case("D", &["ReadBalances"], &[]);
    consent.context.put_string("requestConsent", "true");
    let mut cases = vec![
        test_case("A", &["ReadAccountsBasic"], &[]),
        test_case("B", &["ReadAccountsDetail"], &["ReadAccountsBasic"]),
        ccg,
        consent,
    ];
    let groups = group_permissions(&permission_sets(&cases), &mut TokenNamer::new()).unwrap();
    inject_tokens(&mut cases, &groups);
    let auth = |index: usize| cases[index].input.headers.get("Authorization").cloned();
    assert_eq!(auth(0).as_deref(), Some("Bearer $Token0001"));
    assert_eq!(auth(1).as_deref(), Some("Bearer $Token0002"));
    assert_eq!(auth(2).as_deref(), Some("Bearer $client_access_token"));
    assert_eq!(auth(3), None);
}

// ============================================================================
// SECTION: Properties
// ============================================================================

const PERMISSIONS: [&str; 5] =
    ["ReadAccountsBasic", "ReadAccountsDetail", "ReadBalances", "ReadTransactionsBasic", "ReadParty"];

fn permission_set_strategy() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    let indexes = proptest::collection::vec(0 .. PERMISSIONS.len(), 0 .. 3);
    (indexes.clone(), indexes).prop_map(|(required, excluded)| {
        let excluded: Vec<usize> = excluded.into_iter().filter(|index| !required.contains(index)).collect();
        (required, excluded)
    })
}

proptest! {
    #[test]
    fn groups_are_disjoint_and_cover_every_case(inputs in proptest::collection::vec(permission_set_strategy(), 0 .. 10)) {
        let sets: Vec<PermissionSet> = inputs
            .iter()
            .enumerate()
            .map(|(index, (required, excluded))| {
                PermissionSet::new(
                    format!("T{index}"),
                    required.iter().map(|i| PERMISSIONS[*i]),
                    excluded.iter().map(|i| PERMISSIONS[*i]),
                )
            })
            .collect();
        let groups = group_permissions(&sets, &mut TokenNamer::new()).unwrap();
        for group in &groups {
            prop_assert!(group.permissions.is_disjoint(&group.excluded));
        }
        for set in &sets {
            let owners = groups.iter().filter(|group| group.contains(&set.id)).count();
            prop_assert_eq!(owners, 1);
        }
        let members: usize = groups.iter().map(|group| group.test_cases.len()).sum();
        prop_assert_eq!(members, sets.len());
    }
}
