// crates/fcs-core/src/model/spec_type.rs
// ============================================================================
// Module: Specification Families
// Description: API family classification and canonical endpoint shapes.
// Purpose: Map schema URLs to families and families to endpoint regex tables.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every discovery item names the OpenAPI document it implements. The schema
//! URL identifies the API family, and each family carries the regex table used
//! by the endpoint filter to normalise discovery paths (`{AccountId}`) and
//! manifest URIs (`$accountId`) to the same canonical shape.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Pattern Tables
// ============================================================================

/// Expands to the pattern for one variable path segment.
macro_rules! seg {
    () => {
        "[a-zA-Z0-9_{}-]+"
    };
}

/// Canonical account-information endpoint shapes.
const ACCOUNTS_PATTERNS: &[&str] = &[
    "^/account-access-consents$",
    concat!("^/account-access-consents/", seg!(), "$"),
    "^/accounts$",
    concat!("^/accounts/", seg!(), "$"),
    concat!("^/accounts/", seg!(), "/balances$"),
    "^/balances$",
    concat!("^/accounts/", seg!(), "/beneficiaries$"),
    "^/beneficiaries$",
    concat!("^/accounts/", seg!(), "/direct-debits$"),
    "^/direct-debits$",
    concat!("^/accounts/", seg!(), "/offers$"),
    "^/offers$",
    concat!("^/accounts/", seg!(), "/party$"),
    concat!("^/accounts/", seg!(), "/parties$"),
    "^/party$",
    concat!("^/accounts/", seg!(), "/product$"),
    "^/products$",
    concat!("^/accounts/", seg!(), "/scheduled-payments$"),
    "^/scheduled-payments$",
    concat!("^/accounts/", seg!(), "/standing-orders$"),
    "^/standing-orders$",
    concat!("^/accounts/", seg!(), "/statements$"),
    concat!("^/accounts/", seg!(), "/statements/", seg!(), "$"),
    concat!("^/accounts/", seg!(), "/statements/", seg!(), "/file$"),
    concat!("^/accounts/", seg!(), "/statements/", seg!(), "/transactions$"),
    "^/statements$",
    concat!("^/accounts/", seg!(), "/transactions$"),
    "^/transactions$",
];

/// Canonical payment-initiation endpoint shapes.
const PAYMENTS_PATTERNS: &[&str] = &[
    "^/domestic-payment-consents$",
    concat!("^/domestic-payment-consents/", seg!(), "$"),
    concat!("^/domestic-payment-consents/", seg!(), "/funds-confirmation$"),
    "^/domestic-payments$",
    concat!("^/domestic-payments/", seg!(), "$"),
    concat!("^/domestic-payments/", seg!(), "/payment-details$"),
    "^/domestic-scheduled-payment-consents$",
    concat!("^/domestic-scheduled-payment-consents/", seg!(), "$"),
    "^/domestic-scheduled-payments$",
    concat!("^/domestic-scheduled-payments/", seg!(), "$"),
    concat!("^/domestic-scheduled-payments/", seg!(), "/payment-details$"),
    "^/domestic-standing-order-consents$",
    concat!("^/domestic-standing-order-consents/", seg!(), "$"),
    "^/domestic-standing-orders$",
    concat!("^/domestic-standing-orders/", seg!(), "$"),
    concat!("^/domestic-standing-orders/", seg!(), "/payment-details$"),
    "^/international-payment-consents$",
    concat!("^/international-payment-consents/", seg!(), "$"),
    concat!("^/international-payment-consents/", seg!(), "/funds-confirmation$"),
    "^/international-payments$",
    concat!("^/international-payments/", seg!(), "$"),
    concat!("^/international-payments/", seg!(), "/payment-details$"),
    "^/international-scheduled-payment-consents$",
    concat!("^/international-scheduled-payment-consents/", seg!(), "$"),
    concat!("^/international-scheduled-payment-consents/", seg!(), "/funds-confirmation$"),
    "^/international-scheduled-payments$",
    concat!("^/international-scheduled-payments/", seg!(), "$"),
    concat!("^/international-scheduled-payments/", seg!(), "/payment-details$"),
    "^/international-standing-order-consents$",
    concat!("^/international-standing-order-consents/", seg!(), "$"),
    "^/international-standing-orders$",
    concat!("^/international-standing-orders/", seg!(), "$"),
    concat!("^/international-standing-orders/", seg!(), "/payment-details$"),
    "^/file-payment-consents$",
    concat!("^/file-payment-consents/", seg!(), "$"),
    concat!("^/file-payment-consents/", seg!(), "/file$"),
    "^/file-payments$",
    concat!("^/file-payments/", seg!(), "$"),
    concat!("^/file-payments/", seg!(), "/payment-details$"),
    concat!("^/file-payments/", seg!(), "/report-file$"),
];

/// Canonical confirmation-of-funds endpoint shapes.
const CBPII_PATTERNS: &[&str] = &[
    "^/funds-confirmation-consents$",
    concat!("^/funds-confirmation-consents/", seg!(), "$"),
    "^/funds-confirmations$",
];

/// Canonical variable-recurring-payment endpoint shapes.
const VRPS_PATTERNS: &[&str] = &[
    "^/domestic-vrp-consents$",
    concat!("^/domestic-vrp-consents/", seg!(), "$"),
    concat!("^/domestic-vrp-consents/", seg!(), "/funds-confirmation$"),
    "^/domestic-vrps$",
    concat!("^/domestic-vrps/", seg!(), "$"),
    concat!("^/domestic-vrps/", seg!(), "/payment-details$"),
];

// ============================================================================
// SECTION: Spec Type
// ============================================================================

/// API family implemented by a discovery item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecType {
    /// Account and transaction information.
    Accounts,
    /// Payment initiation.
    Payments,
    /// Confirmation of funds.
    Cbpii,
    /// Variable recurring payments.
    Vrps,
}

impl SpecType {
    /// Classifies a schema URL; returns `None` for unknown families.
    #[must_use]
    pub fn from_schema_url(url: &str) -> Option<Self> {
        let url = url.to_ascii_lowercase();
        if url.contains("vrp") {
            Some(Self::Vrps)
        } else if url.contains("account-info") {
            Some(Self::Accounts)
        } else if url.contains("payment-initiation") {
            Some(Self::Payments)
        } else if url.contains("confirmation-funds") {
            Some(Self::Cbpii)
        } else {
            None
        }
    }

    /// Returns the family tag used in logs and context values.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Payments => "payments",
            Self::Cbpii => "cbpii",
            Self::Vrps => "vrps",
        }
    }

    /// Returns the canonical endpoint regex table.
    #[must_use]
    pub const fn endpoint_patterns(self) -> &'static [&'static str] {
        match self {
            Self::Accounts => ACCOUNTS_PATTERNS,
            Self::Payments => PAYMENTS_PATTERNS,
            Self::Cbpii => CBPII_PATTERNS,
            Self::Vrps => VRPS_PATTERNS,
        }
    }

    /// Returns the manifest used when discovery does not name one.
    #[must_use]
    pub const fn default_manifest(self) -> &'static str {
        match self {
            Self::Accounts => "file://manifests/ob_3.1_accounts_transactions_fca.json",
            Self::Payments => "file://manifests/ob_3.1_payment_fca.json",
            Self::Cbpii => "file://manifests/ob_3.1_cbpii_fca.json",
            Self::Vrps => "file://manifests/ob_3.1_variable_recurring_payments.json",
        }
    }
}

impl fmt::Display for SpecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_urls_classify_by_family() {
        let accounts = "https://raw.githubusercontent.com/OpenBankingUK/read-write-api-specs/v3.1.8/dist/openapi/account-info-openapi.json";
        assert_eq!(SpecType::from_schema_url(accounts), Some(SpecType::Accounts));
        let payments = "https://example.org/dist/swagger/payment-initiation-swagger.json";
        assert_eq!(SpecType::from_schema_url(payments), Some(SpecType::Payments));
        let cbpii = "https://example.org/dist/swagger/confirmation-funds-swagger.json";
        assert_eq!(SpecType::from_schema_url(cbpii), Some(SpecType::Cbpii));
        let vrps = "https://example.org/dist/openapi/vrp-openapi.json";
        assert_eq!(SpecType::from_schema_url(vrps), Some(SpecType::Vrps));
        assert_eq!(SpecType::from_schema_url("https://example.org/other.json"), None);
    }

    #[test]
    fn every_family_has_patterns() {
        for family in [SpecType::Accounts, SpecType::Payments, SpecType::Cbpii, SpecType::Vrps] {
            assert!(!family.endpoint_patterns().is_empty());
            assert!(family.default_manifest().starts_with("file://"));
        }
    }
}
