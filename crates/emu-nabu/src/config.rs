//! Machine configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no
//! file at all) describes a stock 8K-ROM machine with no disks and no
//! modem connection.
//!
//! ```toml
//! rom = "NabuPC-U53-90020060-RevB-2764.bin"
//! watchdog_scanlines = 58000
//! throttle = true
//! violations = "fatal"
//! printer = "printer.txt"
//!
//! [drives]
//! a = "cpm22.img"
//!
//! [modem]
//! host = "127.0.0.1"
//! port = 5816
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{NabuError, Result};

/// Default ROM image: the 8K revision with floppy boot support.
pub const DEFAULT_ROM: &str = "NabuPC-U53-90020060-RevB-2764.bin";

/// Empty-queue scanlines before the keyboard sends its keep-alive byte.
pub const DEFAULT_WATCHDOG_SCANLINES: u32 = 58_000;

/// Host audio rate the PSG is stepped at.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// What to do when the guest does something the hardware leaves undefined
/// (PSG address above 0x1F, reading a write-only port).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationPolicy {
    /// Stop emulation with an error.
    #[default]
    Fatal,
    /// Log a warning, ignore the access, keep running.
    Warn,
}

/// Disk images mounted at power-on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub a: Option<PathBuf>,
    pub b: Option<PathBuf>,
}

/// Adaptor server for the cable-modem link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 5816,
        }
    }
}

impl ModemConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for creating a [`Nabu`](crate::Nabu).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NabuConfig {
    /// ROM image, 4096 or 8192 bytes.
    pub rom: PathBuf,
    pub drives: DriveConfig,
    pub watchdog_scanlines: u32,
    /// Pace emulation to real time. Turn off for headless runs.
    pub throttle: bool,
    pub violations: ViolationPolicy,
    /// Connect to a modem adaptor. `None` leaves the link disconnected.
    pub modem: Option<ModemConfig>,
    /// File receiving bytes strobed out of the parallel port.
    pub printer: Option<PathBuf>,
    pub sample_rate: u32,
}

impl Default for NabuConfig {
    fn default() -> Self {
        Self {
            rom: PathBuf::from(DEFAULT_ROM),
            drives: DriveConfig::default(),
            watchdog_scanlines: DEFAULT_WATCHDOG_SCANLINES,
            throttle: true,
            violations: ViolationPolicy::Fatal,
            modem: None,
            printer: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl NabuConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| NabuError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
