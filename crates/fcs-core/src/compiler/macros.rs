// crates/fcs-core/src/compiler/macros.rs
// ============================================================================
// Module: Macro Table
// Description: Built-in parameter-generating macros invoked as `$fn:NAME(ARGS)`.
// Purpose: Produce timestamps, identifiers and amounts for request bodies.
// Dependencies: time, uuid, thiserror
// ============================================================================

//! ## Overview
//! Macros are enumerated once in [`BuiltinMacro`]. Each is a function from a
//! list of string arguments to a string. Time-based macros read an explicit
//! clock captured in the [`MacroTable`], so compilation is reproducible for a
//! fixed instant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Amount used when `instructedAmount` has no argument.
const DEFAULT_INSTRUCTED_AMOUNT: f64 = 1.0;

/// Days used when `consentExpiry` has no argument.
const DEFAULT_CONSENT_EXPIRY_DAYS: i64 = 30;

/// Length of generated instruction identifiers.
const INSTRUCTION_ID_LEN: usize = 20;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Built-in macros available to manifest scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinMacro {
    /// Current instant, RFC 3339.
    NowDateTime,
    /// Current instant plus one day, RFC 3339.
    NextDayDateTime,
    /// Current instant minus one day, RFC 3339.
    YesterdayDateTime,
    /// Current instant plus seven days, RFC 3339.
    NextWeekDateTime,
    /// Random UUIDv4.
    Uuid,
    /// Random idempotency key.
    IdempotencyKey,
    /// Random instruction identification.
    InstructionIdentificationId,
    /// Random payment identifier.
    PaymentId,
    /// Two-decimal amount, `1.00` by default.
    InstructedAmount,
    /// Consent expiry instant `days` from now (default 30), RFC 3339.
    ConsentExpiry,
}

impl BuiltinMacro {
    /// Looks up a macro by its manifest name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "nowDateTime" => Some(Self::NowDateTime),
            "nextDayDateTime" => Some(Self::NextDayDateTime),
            "yesterdayDateTime" => Some(Self::YesterdayDateTime),
            "nextWeekDateTime" => Some(Self::NextWeekDateTime),
            "uuid" => Some(Self::Uuid),
            "idempotencyKey" => Some(Self::IdempotencyKey),
            "instructionIdentificationID" => Some(Self::InstructionIdentificationId),
            "paymentId" => Some(Self::PaymentId),
            "instructedAmount" => Some(Self::InstructedAmount),
            "consentExpiry" => Some(Self::ConsentExpiry),
            _ => None,
        }
    }

    /// Returns the manifest name of the macro.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NowDateTime => "nowDateTime",
            Self::NextDayDateTime => "nextDayDateTime",
            Self::YesterdayDateTime => "yesterdayDateTime",
            Self::NextWeekDateTime => "nextWeekDateTime",
            Self::Uuid => "uuid",
            Self::IdempotencyKey => "idempotencyKey",
            Self::InstructionIdentificationId => "instructionIdentificationID",
            Self::PaymentId => "paymentId",
            Self::InstructedAmount => "instructedAmount",
            Self::ConsentExpiry => "consentExpiry",
        }
    }

    /// Returns the maximum number of arguments accepted.
    const fn max_args(self) -> usize {
        match self {
            Self::InstructedAmount | Self::ConsentExpiry => 1,
            _ => 0,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Macro invocation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacroError {
    /// Too many arguments.
    #[error("macro {name} takes at most {max} arguments, got {actual}")]
    Arity {
        /// Macro name.
        name: &'static str,
        /// Maximum accepted.
        max: usize,
        /// Supplied count.
        actual: usize,
    },
    /// Argument could not be parsed.
    #[error("macro {name}: invalid argument {argument}")]
    InvalidArgument {
        /// Macro name.
        name: &'static str,
        /// Offending argument.
        argument: String,
    },
    /// Timestamp could not be computed or formatted.
    #[error("macro {name}: {message}")]
    Time {
        /// Macro name.
        name: &'static str,
        /// Underlying message.
        message: String,
    },
}

// ============================================================================
// SECTION: Macro Table
// ============================================================================

/// Macro evaluator bound to a fixed clock.
#[derive(Debug, Clone)]
pub struct MacroTable {
    /// Instant time-based macros are relative to.
    now: OffsetDateTime,
}

impl MacroTable {
    /// Creates a table evaluating time macros relative to `now`.
    #[must_use]
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: now.replace_nanosecond(0).unwrap_or(now),
        }
    }

    /// Creates a table bound to the current UTC instant.
    #[must_use]
    pub fn now_utc() -> Self {
        Self::new(OffsetDateTime::now_utc())
    }

    /// Returns the clock instant.
    #[must_use]
    pub const fn now(&self) -> OffsetDateTime {
        self.now
    }

    /// Invokes a macro with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError`] on arity violations or unparsable arguments.
    pub fn invoke(&self, function: BuiltinMacro, args: &[String]) -> Result<String, MacroError> {
        if args.len() > function.max_args() {
            return Err(MacroError::Arity {
                name: function.name(),
                max: function.max_args(),
                actual: args.len(),
            });
        }
        match function {
            BuiltinMacro::NowDateTime => self.offset_days(function, 0),
            BuiltinMacro::NextDayDateTime => self.offset_days(function, 1),
            BuiltinMacro::YesterdayDateTime => self.offset_days(function, -1),
            BuiltinMacro::NextWeekDateTime => self.offset_days(function, 7),
            BuiltinMacro::Uuid => Ok(Uuid::new_v4().to_string()),
            BuiltinMacro::IdempotencyKey | BuiltinMacro::PaymentId => {
                Ok(Uuid::new_v4().simple().to_string())
            }
            BuiltinMacro::InstructionIdentificationId => {
                let mut id = Uuid::new_v4().simple().to_string();
                id.truncate(INSTRUCTION_ID_LEN);
                Ok(id)
            }
            BuiltinMacro::InstructedAmount => {
                let amount = match args.first() {
                    Some(raw) => raw.trim().parse::<f64>().ok().filter(|value| value.is_finite()).ok_or_else(
                        || MacroError::InvalidArgument {
                            name: function.name(),
                            argument: raw.clone(),
                        },
                    )?,
                    None => DEFAULT_INSTRUCTED_AMOUNT,
                };
                Ok(format!("{amount:.2}"))
            }
            BuiltinMacro::ConsentExpiry => {
                let days = match args.first() {
                    Some(raw) => raw.trim().parse::<i64>().map_err(|_| MacroError::InvalidArgument {
                        name: function.name(),
                        argument: raw.clone(),
                    })?,
                    None => DEFAULT_CONSENT_EXPIRY_DAYS,
                };
                self.offset_days(function, days)
            }
        }
    }

    /// Formats the clock shifted by `days`.
    fn offset_days(&self, function: BuiltinMacro, days: i64) -> Result<String, MacroError> {
        let shifted = self.now.checked_add(Duration::days(days)).ok_or_else(|| MacroError::Time {
            name: function.name(),
            message: format!("{days} days out of range"),
        })?;
        shifted.format(&Rfc3339).map_err(|err| MacroError::Time {
            name: function.name(),
            message: err.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use time::macros::datetime;

    use super::*;

    fn table() -> MacroTable {
        MacroTable::new(datetime!(2024-03-01 10:30:00.250 UTC))
    }

    #[test]
    fn time_macros_use_the_fixed_clock() {
        let table = table();
        assert_eq!(table.invoke(BuiltinMacro::NowDateTime, &[]).unwrap(), "2024-03-01T10:30:00Z");
        assert_eq!(table.invoke(BuiltinMacro::NextDayDateTime, &[]).unwrap(), "2024-03-02T10:30:00Z");
        assert_eq!(table.invoke(BuiltinMacro::YesterdayDateTime, &[]).unwrap(), "2024-02-29T10:30:00Z");
        assert_eq!(table.invoke(BuiltinMacro::NextWeekDateTime, &[]).unwrap(), "2024-03-08T10:30:00Z");
        assert_eq!(
            table.invoke(BuiltinMacro::ConsentExpiry, &["2".to_string()]).unwrap(),
            "2024-03-03T10:30:00Z"
        );
    }

    #[test]
    fn instructed_amount_formats_two_decimals() {
        let table = table();
        assert_eq!(table.invoke(BuiltinMacro::InstructedAmount, &[]).unwrap(), "1.00");
        assert_eq!(table.invoke(BuiltinMacro::InstructedAmount, &["12.5".to_string()]).unwrap(), "12.50");
        let err = table.invoke(BuiltinMacro::InstructedAmount, &["lots".to_string()]).unwrap_err();
        assert!(matches!(err, MacroError::InvalidArgument { .. }));
    }

    #[test]
    fn arity_is_enforced() {
        let err = table().invoke(BuiltinMacro::Uuid, &["x".to_string()]).unwrap_err();
        assert_eq!(err, MacroError::Arity {
            name: "uuid",
            max: 0,
            actual: 1
        });
    }

    #[test]
    fn names_round_trip() {
        for name in ["nowDateTime", "instructionIdentificationID", "consentExpiry", "paymentId"] {
            assert_eq!(BuiltinMacro::from_name(name).unwrap().name(), name);
        }
        assert_eq!(BuiltinMacro::from_name("notAMacro"), None);
        let id = table().invoke(BuiltinMacro::InstructionIdentificationId, &[]).unwrap();
        assert_eq!(id.len(), 20);
    }
}
