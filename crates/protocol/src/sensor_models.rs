//! Temperature reading models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single temperature sample from the one-wire thermometer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub celsius: f64,

    /// Number of invalid reads consumed before this valid one.
    ///
    /// The sensor reports a validity marker per conversion; the reader
    /// polls until the marker appears and records how often it had to.
    pub retries: u32,

    /// When the valid read completed.
    pub read_at: DateTime<Utc>,
}

impl Reading {
    /// Wire payload published to the temperature topic.
    pub fn payload(&self) -> String {
        format!("{:.3}", self.celsius)
    }
}
