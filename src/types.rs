use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::formats::header::DbHeader;
use crate::formats::layout::{BERKELEYDB_BE, BERKELEYDB_LE, HeaderLayout};

pub type Offset = u64;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;
const TB: u64 = GB * 1024;

/// Global ceiling on any carved file.
pub const MAX_FILE_SIZE: u64 = 2 * TB - 1;
pub const DEFAULT_ALIGNMENT: usize = 512;
pub const DEFAULT_CHUNK_SIZE: usize = 64 * MB as usize;

/// How much of the buffer an identification attempt may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    #[default]
    Full,
    /// Only the fixed header region is resident; nothing past it may be read.
    HeaderOnly,
}

/// Downstream validation attached to a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SizeCheckStrategy {
    #[default]
    None,
    ExactSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variant {
    #[serde(rename = "bdb")]
    BerkeleyDbLe,
    #[serde(rename = "dat")]
    BerkeleyDbBe,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::BerkeleyDbLe, Variant::BerkeleyDbBe];

    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::BerkeleyDbLe => "bdb",
            Self::BerkeleyDbBe => "dat",
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        "berkeleydb database file"
    }

    #[must_use]
    pub fn layout(&self) -> &'static HeaderLayout {
        match self {
            Self::BerkeleyDbLe => &BERKELEYDB_LE,
            Self::BerkeleyDbBe => &BERKELEYDB_BE,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BerkeleyDbLe => "Berkeley DB (little-endian)",
            Self::BerkeleyDbBe => "Berkeley DB (big-endian)",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.extension().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown variant '{s}' (expected bdb or dat)"))
    }
}

/// Outcome of a successful identification, consumed by the carving engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FormatDescriptor {
    pub variant: Option<Variant>,
    pub extension: &'static str,
    pub description: &'static str,
    pub min_filesize: u64,
    pub max_filesize: u64,
    /// `Some` exactly when the header describes a non-empty database.
    pub calculated_file_size: Option<u64>,
    pub size_check: SizeCheckStrategy,
    pub header: Option<DbHeader>,
}

impl FormatDescriptor {
    /// Clears state left by a previous attempt on a reused descriptor.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.variant.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(Variant::BerkeleyDbLe.extension(), "bdb");
        assert_eq!(Variant::BerkeleyDbBe.extension(), "dat");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("bdb".parse::<Variant>(), Ok(Variant::BerkeleyDbLe));
        assert_eq!("DAT".parse::<Variant>(), Ok(Variant::BerkeleyDbBe));
        assert!("db".parse::<Variant>().is_err());
    }

    #[test]
    fn test_reset() {
        let mut desc = FormatDescriptor {
            variant: Some(Variant::BerkeleyDbLe),
            extension: "bdb",
            min_filesize: 72,
            calculated_file_size: Some(4096),
            size_check: SizeCheckStrategy::ExactSize,
            ..Default::default()
        };
        desc.reset();
        assert!(desc.is_empty());
        assert_eq!(desc, FormatDescriptor::default());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", Variant::BerkeleyDbBe),
            "Berkeley DB (big-endian)"
        );
    }

    #[test]
    fn test_max_file_size() {
        assert_eq!(MAX_FILE_SIZE, (1u64 << 41) - 1);
    }
}
