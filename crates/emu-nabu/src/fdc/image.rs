//! Raw disk images.
//!
//! An image is a flat dump of 1024-byte sectors, five to a track, with no
//! header. The format is identified purely by file size.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{NabuError, Result};

/// Bytes per sector.
pub const SECTOR_SIZE: usize = 1024;

/// Sectors per track.
pub const SECTORS_PER_TRACK: u8 = 5;

/// Physical format, from the image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskKind {
    /// 5.25" single-sided, 40 tracks.
    SingleSided525,
    /// 5.25" double-sided, 40 tracks.
    DoubleSided525,
    /// 3.5" double-sided, 80 tracks.
    DoubleSided35,
}

impl DiskKind {
    #[must_use]
    pub fn from_size(size: u64) -> Option<Self> {
        match size {
            204_800 => Some(Self::SingleSided525),
            409_600 => Some(Self::DoubleSided525),
            819_200 => Some(Self::DoubleSided35),
            _ => None,
        }
    }

    #[must_use]
    pub const fn size(self) -> u64 {
        match self {
            Self::SingleSided525 => 204_800,
            Self::DoubleSided525 => 409_600,
            Self::DoubleSided35 => 819_200,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SingleSided525 => "5.25\" SS",
            Self::DoubleSided525 => "5.25\" DS",
            Self::DoubleSided35 => "3.5\" DS",
        }
    }
}

/// Anything a disk image can be read from.
pub trait Media: Read + Seek + Send {}

impl<T: Read + Seek + Send> Media for T {}

/// A mounted disk image.
pub struct DiskImage {
    media: Box<dyn Media>,
    path: PathBuf,
    kind: DiskKind,
}

impl DiskImage {
    /// Open an image file and identify it by size.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let io_err = |source: io::Error| NabuError::DiskImageIo {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        let size = file.metadata().map_err(io_err)?.len();
        let kind = DiskKind::from_size(size).ok_or_else(|| NabuError::DiskImageSize {
            path: path.to_path_buf(),
            size,
        })?;

        Ok(Self {
            media: Box::new(file),
            path: path.to_path_buf(),
            kind,
        })
    }

    /// Wrap an in-memory image. `name` is only used in messages.
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Result<Self> {
        let size = data.len() as u64;
        let kind = DiskKind::from_size(size).ok_or_else(|| NabuError::DiskImageSize {
            path: PathBuf::from(name),
            size,
        })?;
        Ok(Self {
            media: Box::new(Cursor::new(data)),
            path: PathBuf::from(name),
            kind,
        })
    }

    #[must_use]
    pub fn kind(&self) -> DiskKind {
        self.kind
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read into `buf` starting at `offset`. Returns the number of bytes
    /// actually read, which is short only at end of image.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.media.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.media.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl std::fmt::Debug for DiskImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskImage")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn image_file(size: u64) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        file.as_file().set_len(size).expect("set image size");
        file
    }

    #[test]
    fn kinds_by_size() {
        for (size, kind) in [
            (204_800, DiskKind::SingleSided525),
            (409_600, DiskKind::DoubleSided525),
            (819_200, DiskKind::DoubleSided35),
        ] {
            let file = image_file(size);
            let image = DiskImage::open(file.path()).expect("valid image");
            assert_eq!(image.kind(), kind);
            assert_eq!(kind.size(), size);
        }
    }

    #[test]
    fn odd_sizes_rejected() {
        for size in [0, 1024, 204_801, 368_640] {
            let file = image_file(size);
            assert!(matches!(
                DiskImage::open(file.path()),
                Err(NabuError::DiskImageSize { .. })
            ));
        }
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            DiskImage::open("/nonexistent/disk.img"),
            Err(NabuError::DiskImageIo { .. })
        ));
    }

    #[test]
    fn read_at_offset() {
        let mut file = image_file(204_800);
        file.as_file_mut()
            .seek(SeekFrom::Start(2048))
            .expect("seek");
        file.write_all(b"CP/M").expect("write marker");

        let mut image = DiskImage::open(file.path()).expect("valid image");
        let mut buf = [0u8; 4];
        assert_eq!(image.read_at(2048, &mut buf).expect("read"), 4);
        assert_eq!(&buf, b"CP/M");
    }

    #[test]
    fn read_past_end_is_short() {
        let mut image = DiskImage::from_bytes("mem", vec![7; 204_800]).expect("valid size");
        let mut buf = [0u8; 1024];
        assert_eq!(image.read_at(204_800 - 100, &mut buf).expect("read"), 100);
    }
}
