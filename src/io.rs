//! Read-only access to a disk image.
//!
//! The image is memory-mapped so the scanner works on zero-copy windows
//! starting at any candidate offset.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

use crate::error::{CarveError, Result};

pub struct ImageSource {
    mmap: Mmap,
    path: PathBuf,
}

impl ImageSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new().read(true).open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CarveError::NotFound(path.display().to_string()),
            ErrorKind::PermissionDenied => {
                CarveError::PermissionDenied(format!("{} - try running with sudo", path.display()))
            }
            _ => CarveError::Io(e),
        })?;

        if file.metadata()?.len() == 0 {
            return Err(CarveError::EmptySource(path.display().to_string()));
        }

        // SAFETY: the mapping is read-only and the image is not expected to
        // change while it is being scanned.
        let mmap = unsafe { Mmap::map(&file) }?;
        debug!(path = %path.display(), size = mmap.len(), "mapped image");

        Ok(Self {
            mmap,
            path: path.to_path_buf(),
        })
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.mmap.len() as u64
    }
}
