//! Size-based checks selected by a [`FormatDescriptor`].
//!
//! [`ExactSizeCheck`] watches bytes as they are recovered and says when to
//! stop; [`SizeBoundedFileCheck`] runs once the run of bytes is complete
//! and either truncates it to the calculated size or flags a mismatch.

use serde::Serialize;

use crate::types::{FormatDescriptor, SizeCheckStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCheckStatus {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileCheckOutcome {
    /// Keep this many leading bytes.
    Truncated(u64),
    Mismatch { expected: u64, actual: u64 },
}

impl FileCheckOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FileCheckOutcome::Truncated(_))
    }

    pub fn reason(&self) -> &'static str {
        match self {
            FileCheckOutcome::Truncated(_) => "accepted",
            FileCheckOutcome::Mismatch { .. } => "shorter than expected size",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactSizeCheck {
    calculated: u64,
}

impl ExactSizeCheck {
    pub fn new(calculated: u64) -> Self {
        Self { calculated }
    }

    pub fn target(&self) -> u64 {
        self.calculated
    }

    /// `consumed` is the total number of bytes recovered so far.
    #[inline]
    pub fn observe(&self, consumed: u64) -> DataCheckStatus {
        if consumed >= self.calculated {
            DataCheckStatus::Stop
        } else {
            DataCheckStatus::Continue
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeBoundedFileCheck {
    calculated: u64,
}

impl SizeBoundedFileCheck {
    pub fn new(calculated: u64) -> Self {
        Self { calculated }
    }

    pub fn finish(&self, recovered: u64) -> FileCheckOutcome {
        if recovered < self.calculated {
            FileCheckOutcome::Mismatch {
                expected: self.calculated,
                actual: recovered,
            }
        } else {
            FileCheckOutcome::Truncated(self.calculated)
        }
    }
}

impl SizeCheckStrategy {
    /// Builds the check pair for this strategy, `None` when no size-based
    /// check applies.
    pub fn checks(&self, calculated: Option<u64>) -> Option<(ExactSizeCheck, SizeBoundedFileCheck)> {
        match (self, calculated) {
            (SizeCheckStrategy::ExactSize, Some(size)) => {
                Some((ExactSizeCheck::new(size), SizeBoundedFileCheck::new(size)))
            }
            _ => None,
        }
    }
}

impl FormatDescriptor {
    pub fn checks(&self) -> Option<(ExactSizeCheck, SizeBoundedFileCheck)> {
        self.size_check.checks(self.calculated_file_size)
    }

    /// Length of a recovered run starting at this file's header when
    /// `available` bytes can be read from there, or the reason it was dropped.
    ///
    /// With no size check installed the run extends to `available`, capped
    /// at `max_filesize`, and must reach `min_filesize`.
    pub fn settle_length(&self, available: u64) -> Result<u64, FileCheckOutcome> {
        let limit = available.min(self.max_filesize);

        let length = match self.checks() {
            Some((data_check, file_check)) => {
                // Reading stops as soon as the data check says so.
                let consumed = match data_check.observe(limit) {
                    DataCheckStatus::Stop => data_check.target(),
                    DataCheckStatus::Continue => limit,
                };
                match file_check.finish(consumed) {
                    FileCheckOutcome::Truncated(len) => len,
                    mismatch => return Err(mismatch),
                }
            }
            None => limit,
        };

        if length < self.min_filesize {
            return Err(FileCheckOutcome::Mismatch {
                expected: self.min_filesize,
                actual: length,
            });
        }
        Ok(length)
    }
}
