//! Error types for the sensor collaborator.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while locating or reading the thermometer.
#[derive(Error, Debug)]
pub enum SensorError {
    /// No one-wire device folder was found.
    ///
    /// The physical sensor is required hardware, so callers treat this as
    /// fatal at startup; there is no retry.
    #[error("no one-wire temperature device found under {}", base_dir.display())]
    DeviceAbsent { base_dir: PathBuf },

    /// The slave file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The slave file passed its validity check but carried no `t=` value.
    #[error("malformed w1_slave contents: {raw:?}")]
    Malformed { raw: String },
}
