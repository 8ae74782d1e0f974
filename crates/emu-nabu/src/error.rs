//! Platform error type.
//!
//! Only operator mistakes and guest protocol violations end up here.
//! Missing peripherals are not errors: an empty drive reports not-ready
//! and a dead modem reports no data, exactly as the hardware would.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NabuError {
    #[error("ROM must be 4096 or 8192 bytes, got {0}")]
    RomSize(usize),

    #[error("cannot read ROM {path}: {source}")]
    RomRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("disk image {path} is {size} bytes; expected 204800, 409600 or 819200")]
    DiskImageSize { path: PathBuf, size: u64 },

    #[error("disk image {path}: {source}")]
    DiskImageIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("drive {drive} is already occupied by {path}")]
    DriveOccupied { drive: usize, path: PathBuf },

    #[error("no such drive {0}; the controller has drives 0 and 1")]
    InvalidDrive(usize),

    #[error("PSG register address {value:#04X} out of range (pc={pc:#06X})")]
    PsgRegister { value: u8, pc: u16 },

    #[error("read from write-only port {port:#04X} (pc={pc:#06X})")]
    WriteOnlyPort { port: u8, pc: u16 },

    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("modem connection to {addr} failed: {source}")]
    Modem {
        addr: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, NabuError>;
