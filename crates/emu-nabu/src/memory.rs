//! Address space: 64K RAM with a ROM overlay at the bottom.
//!
//! While the control register's ROM-disable bit is clear, reads below the
//! ROM size come from ROM. Writes always land in RAM, including the cells
//! hidden under the ROM, so software can copy itself down and then bank
//! the ROM out.

use std::path::Path;

use crate::error::{NabuError, Result};

const RAM_SIZE: usize = 0x1_0000;

/// A validated boot ROM image (4K or 8K).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    /// Wrap a ROM image, rejecting anything that is not 4096 or 8192 bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        match data.len() {
            4096 | 8192 => Ok(Self { data }),
            other => Err(NabuError::RomSize(other)),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| NabuError::RomRead {
            path: path.to_path_buf(),
            source,
        })?;
        let rom = Self::from_bytes(data)?;
        tracing::info!("ROM {}: {} KB", path.display(), rom.len() >> 10);
        Ok(rom)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// RAM plus the ROM overlay.
pub struct AddressSpace {
    ram: Vec<u8>,
    rom: Rom,
    rom_enabled: bool,
}

impl AddressSpace {
    #[must_use]
    pub fn new(rom: Rom) -> Self {
        Self {
            ram: vec![0; RAM_SIZE],
            rom,
            rom_enabled: true,
        }
    }

    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        let a = usize::from(addr);
        if self.rom_enabled && a < self.rom.len() {
            self.rom.data[a]
        } else {
            self.ram[a]
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        self.ram[usize::from(addr)] = value;
    }

    pub fn set_rom_enabled(&mut self, enabled: bool) {
        self.rom_enabled = enabled;
    }

    #[must_use]
    pub fn rom_enabled(&self) -> bool {
        self.rom_enabled
    }

    #[must_use]
    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    /// RAM contents, ignoring the overlay.
    #[must_use]
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_space(size: usize) -> AddressSpace {
        let data = (0..size).map(|i| (i as u8) ^ 0xA5).collect();
        AddressSpace::new(Rom::from_bytes(data).expect("valid ROM size"))
    }

    #[test]
    fn rom_sizes() {
        assert!(Rom::from_bytes(vec![0; 4096]).is_ok());
        assert!(Rom::from_bytes(vec![0; 8192]).is_ok());
        assert!(matches!(
            Rom::from_bytes(vec![0; 16384]),
            Err(NabuError::RomSize(16384))
        ));
        assert!(matches!(Rom::from_bytes(Vec::new()), Err(NabuError::RomSize(0))));
    }

    #[test]
    fn overlay_follows_enable_bit() {
        for size in [4096usize, 8192] {
            let mut mem = make_space(size);
            for addr in [0u16, 1, 0x0FFF, (size - 1) as u16] {
                mem.write(addr, 0x11);
                assert_eq!(mem.read(addr), mem.rom().as_bytes()[usize::from(addr)]);
                mem.set_rom_enabled(false);
                assert_eq!(mem.read(addr), 0x11, "RAM under ROM at {addr:#06X}");
                mem.set_rom_enabled(true);
            }
        }
    }

    #[test]
    fn above_rom_is_always_ram() {
        let mut mem = make_space(4096);
        for addr in [0x1000u16, 0x1FFF, 0x8000, 0xFFFF] {
            mem.write(addr, 0x5A);
            assert_eq!(mem.read(addr), 0x5A);
            mem.set_rom_enabled(false);
            assert_eq!(mem.read(addr), 0x5A);
            mem.set_rom_enabled(true);
        }
    }

    #[test]
    fn writes_never_touch_rom() {
        let mut mem = make_space(8192);
        let before = mem.rom().clone();
        for addr in 0..8192u16 {
            mem.write(addr, 0xFF);
        }
        assert_eq!(mem.rom(), &before);
        assert!(mem.ram()[..8192].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn load_rejects_missing_file() {
        assert!(matches!(
            Rom::load("/nonexistent/rom.bin"),
            Err(NabuError::RomRead { .. })
        ));
    }
}
