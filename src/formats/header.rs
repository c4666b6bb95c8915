use serde::Serialize;

use super::layout::{FieldSpec, HeaderLayout};
use crate::error::Rejection;

/// Bounds-checked field reader over a header prefix.
struct FieldReader<'a> {
    data: &'a [u8],
    layout: &'a HeaderLayout,
}

impl<'a> FieldReader<'a> {
    fn slice(&self, spec: FieldSpec) -> Result<&'a [u8], Rejection> {
        self.data
            .get(spec.offset..spec.end())
            .ok_or(Rejection::InsufficientData {
                expected: spec.end(),
                actual: self.data.len(),
            })
    }

    fn u8(&self, spec: FieldSpec) -> Result<u8, Rejection> {
        self.slice(spec)?
            .first()
            .copied()
            .ok_or_else(|| Rejection::InvalidHeader(format!("empty field at {}", spec.offset)))
    }

    fn u32(&self, spec: FieldSpec) -> Result<u32, Rejection> {
        let bytes: [u8; 4] = self
            .slice(spec)?
            .try_into()
            .map_err(|_| Rejection::InvalidHeader(format!("field at {} is not 4 bytes", spec.offset)))?;
        Ok(self.layout.endian.read_u32(bytes))
    }

    fn array<const N: usize>(&self, spec: FieldSpec) -> Result<[u8; N], Rejection> {
        self.slice(spec)?.try_into().map_err(|_| {
            Rejection::InvalidHeader(format!("field at {} is not {} bytes", spec.offset, N))
        })
    }
}

/// Decoded metadata header. Integers are already in host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DbHeader {
    pub pgno: u32,
    pub magic: u32,
    pub version: u32,
    pub pagesize: u32,
    pub encrypt_alg: u8,
    pub page_type: u8,
    pub metaflags: u8,
    pub free: u32,
    pub last_pgno: u32,
    pub nparts: u32,
    pub key_count: u32,
    pub record_count: u32,
    pub flags: u32,
    pub uid: [u8; 20],
}

impl DbHeader {
    /// Decodes the fixed header at the start of `data` using `layout`.
    ///
    /// Reads nothing past `layout.header_size`. A buffer whose bytes at the
    /// magic offset differ from the layout's pattern is rejected as
    /// [`Rejection::NotMatched`].
    pub fn decode(data: &[u8], layout: &HeaderLayout) -> Result<Self, Rejection> {
        if data.len() < layout.header_size {
            return Err(Rejection::InsufficientData {
                expected: layout.header_size,
                actual: data.len(),
            });
        }
        let data = &data[..layout.header_size];

        let magic_end = layout.magic_offset + layout.magic_pattern.len();
        if data.get(layout.magic_offset..magic_end) != Some(layout.magic_pattern) {
            return Err(Rejection::NotMatched);
        }

        let r = FieldReader { data, layout };
        let f = &layout.fields;

        Ok(Self {
            pgno: r.u32(f.pgno)?,
            magic: r.u32(f.magic)?,
            version: r.u32(f.version)?,
            pagesize: r.u32(f.pagesize)?,
            encrypt_alg: r.u8(f.encrypt_alg)?,
            page_type: r.u8(f.page_type)?,
            metaflags: r.u8(f.metaflags)?,
            free: r.u32(f.free)?,
            last_pgno: r.u32(f.last_pgno)?,
            nparts: r.u32(f.nparts)?,
            key_count: r.u32(f.key_count)?,
            record_count: r.u32(f.record_count)?,
            flags: r.u32(f.flags)?,
            uid: r.array::<20>(f.uid)?,
        })
    }

    /// True when the header declares more than one partition file.
    pub fn is_partitioned(&self) -> bool {
        self.nparts > 1
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypt_alg != 0
    }
}
