//! Byte-exact description of the page-0 metadata header.
//!
//! A layout is plain constant data: where each field sits, how wide it is,
//! which byte order the integers use and how the page count is derived from
//! the last page number. The decoder never overlays a struct on the buffer;
//! it reads each field through [`FieldSpec`] at its declared offset.

use serde::Serialize;

/// Size of the metadata header shared by every known variant.
pub const DB_HEADER_SIZE: usize = 72;

/// 16 bytes at the start of page 0: zeroed LSN file, LSN offset 1,
/// page number 0 and the btree magic `0x053162`.
pub const BERKELEYDB_MAGIC: [u8; 16] = [
    0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x62, 0x31, 0x05, 0x00,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    #[inline]
    pub const fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        }
    }
}

/// How `last_pgno` translates into a number of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PageCountRule {
    /// `last_pgno` is the zero-based index of the last page.
    LastIndexPlusOne,
    /// `last_pgno` already holds the number of pages.
    LastIndexIsCount,
}

impl PageCountRule {
    /// Computed in 64 bits so `u32::MAX + 1` does not wrap to zero.
    #[inline]
    pub const fn page_count(self, last_pgno: u32) -> u64 {
        match self {
            PageCountRule::LastIndexPlusOne => last_pgno as u64 + 1,
            PageCountRule::LastIndexIsCount => last_pgno as u64,
        }
    }
}

/// Location of a single header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub offset: usize,
    pub width: usize,
}

impl FieldSpec {
    pub const fn u8(offset: usize) -> Self {
        Self { offset, width: 1 }
    }

    pub const fn u32(offset: usize) -> Self {
        Self { offset, width: 4 }
    }

    pub const fn bytes(offset: usize, width: usize) -> Self {
        Self { offset, width }
    }

    #[inline]
    pub const fn end(&self) -> usize {
        self.offset + self.width
    }
}

/// Field table of the 72-byte metadata page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DbFields {
    pub lsn: FieldSpec,
    pub pgno: FieldSpec,
    pub magic: FieldSpec,
    pub version: FieldSpec,
    pub pagesize: FieldSpec,
    pub encrypt_alg: FieldSpec,
    pub page_type: FieldSpec,
    pub metaflags: FieldSpec,
    pub free: FieldSpec,
    pub last_pgno: FieldSpec,
    pub nparts: FieldSpec,
    pub key_count: FieldSpec,
    pub record_count: FieldSpec,
    pub flags: FieldSpec,
    pub uid: FieldSpec,
}

pub const DB_FIELDS: DbFields = DbFields {
    lsn: FieldSpec::bytes(0, 8),
    pgno: FieldSpec::u32(8),
    magic: FieldSpec::u32(12),
    version: FieldSpec::u32(16),
    pagesize: FieldSpec::u32(20),
    encrypt_alg: FieldSpec::u8(24),
    page_type: FieldSpec::u8(25),
    metaflags: FieldSpec::u8(26),
    free: FieldSpec::u32(28),
    last_pgno: FieldSpec::u32(32),
    nparts: FieldSpec::u32(36),
    key_count: FieldSpec::u32(40),
    record_count: FieldSpec::u32(44),
    flags: FieldSpec::u32(48),
    uid: FieldSpec::bytes(52, 20),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeaderLayout {
    pub magic_pattern: &'static [u8],
    /// Offset from the start of the page where `magic_pattern` must match.
    pub magic_offset: usize,
    pub header_size: usize,
    pub endian: Endian,
    pub page_count: PageCountRule,
    pub fields: DbFields,
}

impl HeaderLayout {
    /// Returns the same layout read with the other byte order.
    pub const fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub const fn with_page_count(mut self, rule: PageCountRule) -> Self {
        self.page_count = rule;
        self
    }

    /// True when the magic pattern and every field lie inside the header.
    pub fn is_consistent(&self) -> bool {
        let f = &self.fields;
        let within = [
            f.lsn, f.pgno, f.magic, f.version, f.pagesize, f.encrypt_alg, f.page_type,
            f.metaflags, f.free, f.last_pgno, f.nparts, f.key_count, f.record_count, f.flags,
            f.uid,
        ]
        .iter()
        .all(|spec| spec.end() <= self.header_size);

        within && self.magic_offset + self.magic_pattern.len() <= self.header_size
    }
}

/// Little-endian metadata header, page count is `last_pgno + 1`.
pub const BERKELEYDB_LE: HeaderLayout = HeaderLayout {
    magic_pattern: &BERKELEYDB_MAGIC,
    magic_offset: 0,
    header_size: DB_HEADER_SIZE,
    endian: Endian::Little,
    page_count: PageCountRule::LastIndexPlusOne,
    fields: DB_FIELDS,
};

/// Same bytes on disk, integers read big-endian.
pub const BERKELEYDB_BE: HeaderLayout = BERKELEYDB_LE.with_endian(Endian::Big);
