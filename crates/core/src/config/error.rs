//! Error types for configuration loading.
//!
//! Every configuration error is fatal at startup: the daemon exits with a
//! non-zero status and a diagnostic naming the offending settings.

use thiserror::Error;

/// Errors that can occur while reading configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more required environment variables are not set.
    ///
    /// Collected in one pass so the diagnostic names every missing
    /// variable at once instead of failing on the first.
    #[error("missing required environment variables: {}", names.join(", "))]
    MissingVars { names: Vec<String> },

    /// A variable is set but its value cannot be parsed.
    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: String, reason: String },

    /// Neither a relay config path nor a UDP receiver is configured.
    #[error(
        "no stream sink configured: set RELAY_CONFIG_PATH or WEBCAM_RECEIVER_IP and WEBCAM_RECEIVER_PORT"
    )]
    NoSink,
}

/// Type alias for Result with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
