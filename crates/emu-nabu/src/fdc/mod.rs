//! NABU floppy disk controller card (ports $C0–$CF).
//!
//! A WD2797-style controller on an expansion card, cut down to what the
//! boot ROM and CP/M BIOS actually use. Commands complete instantly; the
//! only timing is the rotating index hole, advanced once per scanline.
//!
//! # Ports (low nibble)
//!
//! | Nibble | Read              | Write          |
//! |--------|-------------------|----------------|
//! | 0      | status            | command        |
//! | 1      | track register    | track register |
//! | 2      | sector register   | sector register|
//! | 3      | data register     | data register  |
//! | F      | card ID ($10)     | drive select   |
//!
//! # State machine
//!
//! Idle → (READ SECTOR / READ ADDRESS / diagnostic) → TransferActive →
//! (CPU drains the buffer through the data port) → Idle.

pub mod commands;
pub mod image;

use bitflags::bitflags;
use emu_core::Tickable;

pub use commands::Command;
pub use image::{DiskImage, DiskKind, SECTOR_SIZE, SECTORS_PER_TRACK};

use crate::error::{NabuError, Result};

bitflags! {
    /// Status register bits. Several have two meanings depending on the
    /// last command type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FdcStatus: u8 {
        const NOT_READY = 0x80;
        const WRITE_PROTECT = 0x40;
        const HEAD_LOADED = 0x20;
        const SEEK_ERROR = 0x10;
        const CRC_ERROR = 0x08;
        const LOST_DATA = 0x04;
        const DATA_REQUEST = 0x02;
        const BUSY = 0x01;
    }
}

impl FdcStatus {
    /// Type I meaning of bit 2.
    pub const TRACK0: Self = Self::LOST_DATA;
    /// Type I meaning of bit 1.
    pub const INDEX: Self = Self::DATA_REQUEST;
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdcMode {
    Idle,
    /// The CPU is draining the transfer buffer through the data port.
    TransferActive,
}

/// Value read back from the side-channel port: identifies the card.
pub const CARD_ID: u8 = 0x10;

/// Scanlines per disk revolution (300 RPM at 15.7 kHz).
pub const ROTATION_SCANLINES: u32 = 3147;

/// Scanlines the index bit stays up once the hole passes.
pub const INDEX_PULSE_SCANLINES: u32 = 60;

/// Number of drives on the card.
pub const DRIVE_COUNT: usize = 2;

/// Floppy disk controller plus its two drives.
pub struct DiskController {
    drives: [Option<DiskImage>; DRIVE_COUNT],
    /// Selected drive, from bits 1–2 of the side-channel write. Values 2
    /// and 3 select nothing.
    selected: usize,

    track: u8,
    sector: u8,
    data: u8,
    status: FdcStatus,

    mode: FdcMode,
    buffer: Vec<u8>,
    cursor: usize,

    index_counter: u32,
    index_pulse: u32,
}

impl DiskController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            drives: [None, None],
            selected: 0,
            track: 0,
            sector: 1,
            data: 0,
            status: FdcStatus::empty(),
            mode: FdcMode::Idle,
            buffer: Vec::with_capacity(SECTOR_SIZE),
            cursor: 0,
            index_counter: ROTATION_SCANLINES,
            index_pulse: 0,
        }
    }

    /// Mount an image file in `drive`.
    pub fn insert(&mut self, drive: usize, path: impl AsRef<std::path::Path>) -> Result<DiskKind> {
        if drive >= DRIVE_COUNT {
            return Err(NabuError::InvalidDrive(drive));
        }
        let image = DiskImage::open(path)?;
        self.mount(drive, image)
    }

    /// Mount an already-opened image in `drive`. An occupied drive must be
    /// ejected first.
    pub fn mount(&mut self, drive: usize, image: DiskImage) -> Result<DiskKind> {
        let slot = self
            .drives
            .get_mut(drive)
            .ok_or(NabuError::InvalidDrive(drive))?;
        if let Some(existing) = slot {
            return Err(NabuError::DriveOccupied {
                drive,
                path: existing.path().to_path_buf(),
            });
        }
        let kind = image.kind();
        tracing::info!(
            "inserted {} ({}) in drive {}:",
            image.path().display(),
            kind.label(),
            drive_letter(drive)
        );
        *slot = Some(image);
        Ok(kind)
    }

    /// Remove the image from `drive`, returning it.
    pub fn eject(&mut self, drive: usize) -> Option<DiskImage> {
        let image = self.drives.get_mut(drive).and_then(Option::take);
        match &image {
            Some(img) => tracing::info!(
                "ejected {} from drive {}:",
                img.path().display(),
                drive_letter(drive)
            ),
            None => tracing::warn!("drive {drive} is already empty"),
        }
        image
    }

    /// Kind of disk in `drive`, if any.
    #[must_use]
    pub fn drive_kind(&self, drive: usize) -> Option<DiskKind> {
        self.drives.get(drive)?.as_ref().map(DiskImage::kind)
    }

    /// Selected drive exists and holds a disk.
    #[must_use]
    pub fn drive_ready(&self) -> bool {
        self.drive_kind(self.selected).is_some()
    }

    #[must_use]
    pub fn selected_drive(&self) -> usize {
        self.selected
    }

    // -----------------------------------------------------------------------
    // Port interface
    // -----------------------------------------------------------------------

    /// CPU read from `$C0 | nibble`.
    pub fn read_port(&mut self, nibble: u8) -> u8 {
        match nibble & 0x0F {
            0x0 => self.status().bits(),
            0x1 => self.track,
            0x2 => self.sector,
            0x3 => self.read_data(),
            0xF => CARD_ID,
            other => {
                tracing::debug!("FDC: read from unused port nibble {other:X}");
                0
            }
        }
    }

    /// CPU write to `$C0 | nibble`.
    pub fn write_port(&mut self, nibble: u8, value: u8) {
        match nibble & 0x0F {
            0x0 => self.write_command(value),
            0x1 => self.track = value,
            0x2 => self.sector = value,
            0x3 => self.data = value,
            0xF => {
                self.selected = usize::from((value >> 1) & 0x03);
                tracing::trace!("FDC: drive select {:#04X} -> {}", value, self.selected);
            }
            other => tracing::debug!("FDC: write {value:#04X} to unused port nibble {other:X}"),
        }
    }

    /// Status register as the CPU sees it. An empty or nonexistent drive
    /// is always not-ready.
    #[must_use]
    pub fn status(&self) -> FdcStatus {
        if self.drive_ready() {
            self.status
        } else {
            self.status | FdcStatus::NOT_READY
        }
    }

    fn write_command(&mut self, value: u8) {
        tracing::trace!(
            "FDC: command {value:#04X} T={:#04X} S={:#04X} D={:#04X}",
            self.track,
            self.sector,
            self.data
        );
        if value & 0xF0 == commands::DIAGNOSTIC_OOB_COMMAND {
            self.diagnostic_oob();
            return;
        }
        self.execute(Command::decode(value));
    }

    fn read_data(&mut self) -> u8 {
        if self.mode != FdcMode::TransferActive {
            return self.data;
        }
        let byte = self.buffer.get(self.cursor).copied().unwrap_or(0);
        self.data = byte;
        self.cursor += 1;
        if self.cursor >= self.buffer.len() {
            self.status
                .remove(FdcStatus::DATA_REQUEST | FdcStatus::BUSY);
            self.mode = FdcMode::Idle;
        }
        byte
    }

    /// Load `bytes` into the transfer buffer and hand it to the CPU.
    fn begin_transfer(&mut self, bytes: &[u8]) {
        self.buffer.clear();
        self.buffer.extend_from_slice(bytes);
        self.cursor = 0;
        self.status = FdcStatus::DATA_REQUEST | FdcStatus::BUSY;
        self.mode = FdcMode::TransferActive;
    }

    // -----------------------------------------------------------------------
    // Emulator-specific
    // -----------------------------------------------------------------------

    /// Non-standard escape: hand the CPU a fixed 38-byte track header.
    ///
    /// Not real controller behaviour. It exists because one boot ROM
    /// issues a read-track and only checks that an ID field comes back.
    pub fn diagnostic_oob(&mut self) {
        tracing::debug!("FDC: emulator diagnostic track header");
        self.begin_transfer(&commands::DIAGNOSTIC_OOB_TEMPLATE);
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn mode(&self) -> FdcMode {
        self.mode
    }

    #[must_use]
    pub fn track(&self) -> u8 {
        self.track
    }

    #[must_use]
    pub fn sector(&self) -> u8 {
        self.sector
    }

    /// Bytes left in the transfer buffer.
    #[must_use]
    pub fn remaining(&self) -> usize {
        match self.mode {
            FdcMode::Idle => 0,
            FdcMode::TransferActive => self.buffer.len() - self.cursor,
        }
    }
}

impl Default for DiskController {
    fn default() -> Self {
        Self::new()
    }
}

impl Tickable for DiskController {
    /// One scanline of disk rotation.
    fn tick(&mut self) {
        if self.index_pulse > 0 {
            self.index_pulse -= 1;
            if self.index_pulse == 0 && self.mode == FdcMode::Idle {
                self.status.remove(FdcStatus::INDEX);
            }
        }

        self.index_counter -= 1;
        if self.index_counter == 0 {
            self.index_counter = ROTATION_SCANLINES;
            if self.mode == FdcMode::Idle && self.drive_ready() {
                self.status.insert(FdcStatus::INDEX);
                self.index_pulse = INDEX_PULSE_SCANLINES;
            }
        }
    }
}

fn drive_letter(drive: usize) -> char {
    char::from(b'A' + (drive as u8))
}
