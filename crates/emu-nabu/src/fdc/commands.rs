//! Command decode and execution.
//!
//! Commands are identified by the high nibble of the command byte, as on
//! the WD179x family. The low nibble carries step-rate, verify and
//! head-load flags, which an instant-seek model has no use for.

use super::image::{SECTOR_SIZE, SECTORS_PER_TRACK};
use super::{DiskController, FdcMode, FdcStatus};

/// High nibble of the read-track command, which the boot path uses to
/// fetch the diagnostic track header instead.
pub const DIAGNOSTIC_OOB_COMMAND: u8 = 0xE0;

/// Sector length code for 1024-byte sectors in an ID field.
pub const MEDIA_DESCRIPTOR: u8 = 0x03;

/// Fixed track header returned by the diagnostic escape: gap, sync, ID
/// address mark, ID field for track 0 sector 1, and its CRC.
pub const DIAGNOSTIC_OOB_TEMPLATE: [u8; 38] = [
    0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E,
    0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E, 0x4E,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xA1, 0xA1, 0xA1, 0xFE,
    0x00, 0x00, 0x01, MEDIA_DESCRIPTOR, 0xDA, 0x4E,
];

/// A decoded controller command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// $0x: home the head. The boot ROM issues both $00 and $08.
    Restore,
    /// $1x: move to the track in the data register.
    Seek,
    /// $2x–$5x: one track inward.
    StepIn,
    /// $6x–$7x: one track outward.
    StepOut,
    /// $8x–$9x: read one 1024-byte sector.
    ReadSector,
    /// $Ax–$Bx.
    WriteSector,
    /// $Cx: read the next ID field (our "read status").
    ReadAddress,
    /// $Dx: abort whatever is running.
    ForceInterrupt,
    /// $Ex–$Fx: whole-track transfers.
    Track,
}

impl Command {
    #[must_use]
    pub fn decode(byte: u8) -> Self {
        match byte >> 4 {
            0x0 => Self::Restore,
            0x1 => Self::Seek,
            0x2..=0x5 => Self::StepIn,
            0x6 | 0x7 => Self::StepOut,
            0x8 | 0x9 => Self::ReadSector,
            0xA | 0xB => Self::WriteSector,
            0xC => Self::ReadAddress,
            0xD => Self::ForceInterrupt,
            _ => Self::Track,
        }
    }
}

impl DiskController {
    /// Run a decoded command to completion (or to the start of its data
    /// transfer).
    pub(super) fn execute(&mut self, command: Command) {
        match command {
            Command::Restore => {
                self.track = 0;
                self.end_type1();
            }
            Command::Seek => {
                self.track = self.data;
                self.end_type1();
            }
            Command::StepIn => {
                self.track = self.track.wrapping_add(1);
                self.end_type1();
            }
            Command::StepOut => {
                self.track = self.track.saturating_sub(1);
                self.end_type1();
            }
            Command::ReadSector => self.exec_read_sector(),
            Command::ReadAddress => self.exec_read_address(),
            Command::ForceInterrupt => {
                self.status.remove(
                    FdcStatus::BUSY | FdcStatus::NOT_READY | FdcStatus::DATA_REQUEST,
                );
                self.mode = FdcMode::Idle;
            }
            Command::WriteSector | Command::Track => {
                // Images are never written through the controller.
                tracing::debug!("FDC: unsupported command {command:?}, reporting write protect");
                self.mode = FdcMode::Idle;
                self.status = FdcStatus::WRITE_PROTECT;
            }
        }
    }

    /// Type I commands abort any transfer and leave busy/not-ready clear.
    fn end_type1(&mut self) {
        self.mode = FdcMode::Idle;
        self.status
            .remove(FdcStatus::BUSY | FdcStatus::NOT_READY | FdcStatus::DATA_REQUEST);
    }

    fn exec_read_sector(&mut self) {
        self.mode = FdcMode::Idle;

        if !self.drive_ready() {
            self.status = FdcStatus::NOT_READY;
            return;
        }
        if !(1..=SECTORS_PER_TRACK).contains(&self.sector) {
            self.status = FdcStatus::SEEK_ERROR;
            return;
        }

        let linear = u64::from(self.track) * u64::from(SECTORS_PER_TRACK)
            + u64::from(self.sector - 1);
        let offset = linear * SECTOR_SIZE as u64;

        let Some(image) = self.drives.get_mut(self.selected).and_then(Option::as_mut) else {
            self.status = FdcStatus::NOT_READY;
            return;
        };
        if offset + SECTOR_SIZE as u64 > image.kind().size() {
            self.status = FdcStatus::SEEK_ERROR;
            return;
        }

        let mut sector = [0u8; SECTOR_SIZE];
        match image.read_at(offset, &mut sector) {
            Ok(n) if n < SECTOR_SIZE => {
                tracing::warn!(
                    "FDC: short read from {} at {offset:#X} ({n} of {SECTOR_SIZE} bytes)",
                    image.path().display()
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("FDC: read error on {}: {e}", image.path().display());
                self.status = FdcStatus::CRC_ERROR;
                return;
            }
        }

        tracing::trace!("FDC: read T{} S{} -> offset {offset:#X}", self.track, self.sector);
        self.begin_transfer(&sector);
    }

    fn exec_read_address(&mut self) {
        let id = [self.track, 0, self.sector, MEDIA_DESCRIPTOR, 0, 0];
        self.begin_transfer(&id);
    }
}
