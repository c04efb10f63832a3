//! Log output format for the runtime and its worker processes.
//!
//! Both the embedding service and `slicknode-worker` write logs to stderr,
//! so the format only changes how each event line is rendered.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Rendering of log events on stderr.
///
/// Parsed case-insensitively from `SLICKNODE_LOG_FORMAT` or
/// `--log-format`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, with fields flattened.
    #[default]
    Json,
    /// Compact text for local runs.
    Compact,
}

/// Error returned when a log format name is not recognised.
pub type LogFormatParseError = strum::ParseError;
