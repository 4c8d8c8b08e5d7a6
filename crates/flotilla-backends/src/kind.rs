use std::str::FromStr;

use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

/// Which engine a factory wires its instances to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    /// HTTP proxy in front of a real container engine.
    #[default]
    Forward,
    /// In-process engine holding containers in memory.
    Debug,
}

impl BackendKind {
    /// Name used in configuration and descriptions.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// A backend name matched none of the [`BackendKind`] variants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported backend kind: {0}")]
pub struct BackendKindParseError(String);

impl BackendKindParseError {
    /// Wraps the rejected name.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The rejected name, trimmed.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl FromStr for BackendKind {
    type Err = BackendKindParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BackendKindParseError::new(wanted))
    }
}
