//! Command verbs carried on the bus.
//!
//! The command topic carries plain-text payloads: the literal `on` starts
//! the video pipeline, the literal `off` stops it. Everything else is
//! rejected by the dispatcher without touching pipeline state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A recognized command payload.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Start the video pipeline.
    On,
    /// Stop the video pipeline.
    Off,
}

impl Command {
    /// The literal payload text for this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::On => "on",
            Command::Off => "off",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payload did not match any recognized command verb.
///
/// Carries the offending payload so it can be reported verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command: {:?}", self.0)
    }
}

impl std::error::Error for UnknownCommand {}

impl FromStr for Command {
    type Err = UnknownCommand;

    /// Parse a bus payload. Matching is exact: no trimming, no case
    /// folding, so `"ON"` and `" on"` are rejected like any other text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Command::On),
            "off" => Ok(Command::Off),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}
