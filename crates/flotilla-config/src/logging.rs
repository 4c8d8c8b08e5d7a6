use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Shape of the lines the daemon writes to standard error.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, span fields flattened into the record.
    Json,
    /// Terse text lines for a terminal.
    #[default]
    Compact,
}

impl LogFormat {
    /// Whether the format is meant for log collectors rather than people.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Returned when a log format name is not recognised.
pub type LogFormatParseError = strum::ParseError;
