//! One-wire thermometer collaborator.
//!
//! Reads a DS18B20-style sensor through the kernel's w1 sysfs interface.
//! The slave file holds two lines; the first ends in `YES` once the CRC
//! check passed, the second carries the raw value after a `t=` marker:
//!
//! ```text
//! 5b 01 4b 46 7f ff 05 10 a1 : crc=a1 YES
//! 5b 01 4b 46 7f ff 05 10 a1 t=21687
//! ```
//!
//! Transient invalidity (no `YES` yet) is not an error: the reader polls
//! with a short delay until the conversion completes. Only a missing
//! device is fatal.

pub mod error;

pub use error::SensorError;

use aqm_protocol::Reading;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::warn;
use walkdir::WalkDir;

/// Delay between polls while the validity marker is still missing.
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Device folders for DS18B20 sensors start with family code 28.
const DEVICE_PREFIX: &str = "28";

const SLAVE_FILE: &str = "w1_slave";

/// Raw access to the w1 slave file.
///
/// Separated out so the retry loop can be driven without hardware.
#[async_trait]
pub trait SlaveSource: Send + Sync {
    /// Read the full slave file contents.
    async fn read_slave(&self) -> Result<String, SensorError>;
}

/// The sysfs-backed slave source.
#[derive(Debug, Clone)]
pub struct W1Device {
    slave_path: PathBuf,
}

impl W1Device {
    /// Locate the first `28*` device folder under `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::DeviceAbsent`] when no device folder exists.
    pub fn discover(base_dir: &Path) -> Result<Self, SensorError> {
        for entry in WalkDir::new(base_dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with(DEVICE_PREFIX) {
                return Ok(Self {
                    slave_path: entry.path().join(SLAVE_FILE),
                });
            }
        }
        Err(SensorError::DeviceAbsent {
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Best-effort load of the `w1-gpio` and `w1-therm` kernel modules.
    ///
    /// Needs root to succeed; a failure is only logged, because the device
    /// probe afterwards decides whether the sensor is actually present.
    pub async fn load_kernel_modules() {
        for module in ["w1-gpio", "w1-therm"] {
            match Command::new("modprobe").arg(module).status().await {
                Ok(status) if status.success() => {}
                Ok(status) => warn!(module, %status, "modprobe exited nonzero"),
                Err(error) => warn!(module, %error, "modprobe could not be run"),
            }
        }
    }

    /// Path of the slave file this device reads.
    pub fn slave_path(&self) -> &Path {
        &self.slave_path
    }
}

#[async_trait]
impl SlaveSource for W1Device {
    async fn read_slave(&self) -> Result<String, SensorError> {
        tokio::fs::read_to_string(&self.slave_path)
            .await
            .map_err(|source| SensorError::Io {
                path: self.slave_path.clone(),
                source,
            })
    }
}

/// Temperature reader over any [`SlaveSource`].
pub struct Thermometer<S> {
    source: S,
    retry_delay: Duration,
}

impl<S: SlaveSource> Thermometer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Override the poll delay between invalid reads.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Read one valid temperature sample.
    ///
    /// Blocks the calling task until the validity marker appears; the
    /// retry loop is unbounded with a fixed delay, matching how the kernel
    /// surfaces in-flight conversions. The number of invalid reads
    /// consumed is recorded on the returned [`Reading`].
    ///
    /// # Errors
    ///
    /// I/O failures on the slave file, and a valid read that carries no
    /// `t=` marker.
    pub async fn read(&self) -> Result<Reading, SensorError> {
        let mut retries = 0u32;
        loop {
            let raw = self.source.read_slave().await?;
            if !crc_valid(&raw) {
                retries += 1;
                sleep(self.retry_delay).await;
                continue;
            }
            let celsius = parse_millidegrees(&raw)?;
            return Ok(Reading {
                celsius,
                retries,
                read_at: Utc::now(),
            });
        }
    }
}

/// The first line ends in `YES` once the CRC check passed.
fn crc_valid(raw: &str) -> bool {
    raw.lines()
        .next()
        .map(|line| line.trim_end().ends_with("YES"))
        .unwrap_or(false)
}

/// Extract the millidegree value after `t=` on the second line.
fn parse_millidegrees(raw: &str) -> Result<f64, SensorError> {
    let line = raw.lines().nth(1).unwrap_or("");
    let position = line.find("t=").ok_or_else(|| SensorError::Malformed {
        raw: raw.to_string(),
    })?;
    let digits = line[position + 2..].trim();
    let millidegrees: f64 = digits.parse().map_err(|_| SensorError::Malformed {
        raw: raw.to_string(),
    })?;
    Ok(millidegrees / 1000.0)
}
