//! How the REST gateway answers a request whose backend call failed.
//!
//! The engine API shim the gateway replaces logged such failures and still
//! answered with a success status and an empty body. `Report` is the default;
//! `Silent` keeps the old behaviour for clients that depend on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

/// Failure reporting mode of the gateway.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ErrorPolicy {
    /// A 4xx or 5xx status with a `{"message": ..}` body.
    #[default]
    Report,
    /// Status 200, no body; the failure only reaches the daemon log.
    Silent,
}

impl ErrorPolicy {
    /// Whether a failed call is hidden from the HTTP client.
    #[must_use]
    pub const fn hides_failures(self) -> bool {
        matches!(self, Self::Silent)
    }

    /// Name accepted in configuration.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ErrorPolicy {
    type Err = ErrorPolicyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::iter()
            .find(|policy| policy.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ErrorPolicyParseError(value.to_owned()))
    }
}

/// A policy name matched neither `report` nor `silent`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown error policy '{0}' (expected report or silent)")]
pub struct ErrorPolicyParseError(String);

impl ErrorPolicyParseError {
    /// The rejected text.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}
