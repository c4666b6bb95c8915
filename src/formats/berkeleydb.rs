//! Berkeley DB metadata page identification.
//!
//! Two variants share the same 16-byte signature and 72-byte header but
//! read `pagesize`/`last_pgno` with different byte orders and are saved
//! under different extensions. Each is registered as its own handler so
//! the two decode paths can never alias each other.

use tracing::{debug, trace};

use super::header::DbHeader;
use super::layout::HeaderLayout;
use crate::error::Rejection;
use crate::signatures::{IdentifyFn, Signature, SignatureRegistry};
use crate::types::{FormatDescriptor, MAX_FILE_SIZE, ProbeMode, SizeCheckStrategy, Variant};

/// Total file length implied by the header, or `None` when the layout
/// yields no pages.
///
/// `pagesize` is taken as-is; a zero page size gives `Some(0)`, which the
/// size checks downstream reject against `min_filesize`.
/// The multiplication is done in 64 bits and checked; a product that does
/// not fit is reported as [`Rejection::InvalidHeader`] instead of wrapping.
pub fn calculated_size(layout: &HeaderLayout, header: &DbHeader) -> Result<Option<u64>, Rejection> {
    let pages = layout.page_count.page_count(header.last_pgno);
    if pages == 0 {
        return Ok(None);
    }

    pages
        .checked_mul(u64::from(header.pagesize))
        .map(Some)
        .ok_or_else(|| {
            Rejection::InvalidHeader(format!(
                "{} pages of {} bytes overflows",
                pages, header.pagesize
            ))
        })
}

/// Identifies `variant` at the start of `buffer`, populating `out`.
///
/// `out` is reset first, so a descriptor reused across attempts never
/// carries state from an earlier match. On rejection `out` is left empty.
/// `prior` is the file being recovered when this candidate was found; these
/// variants do not consult it.
pub fn identify_into(
    variant: Variant,
    buffer: &[u8],
    _mode: ProbeMode,
    _prior: Option<&FormatDescriptor>,
    out: &mut FormatDescriptor,
) -> Result<(), Rejection> {
    out.reset();

    let layout = variant.layout();
    // Every field lives in the fixed header, so a full probe reads no more
    // than a header-only one.
    let window = &buffer[..buffer.len().min(layout.header_size)];

    let header = DbHeader::decode(window, layout)?;
    let calculated = calculated_size(layout, &header)?;

    out.variant = Some(variant);
    out.extension = variant.extension();
    out.description = variant.description();
    out.min_filesize = layout.header_size as u64;
    out.max_filesize = MAX_FILE_SIZE;
    out.calculated_file_size = calculated;
    out.size_check = match calculated {
        Some(_) => SizeCheckStrategy::ExactSize,
        None => SizeCheckStrategy::None,
    };
    out.header = Some(header);

    Ok(())
}

/// Identifies `variant` at the start of `buffer` into a fresh descriptor.
pub fn identify(
    variant: Variant,
    buffer: &[u8],
    mode: ProbeMode,
    prior: Option<&FormatDescriptor>,
) -> Result<FormatDescriptor, Rejection> {
    let mut desc = FormatDescriptor::default();
    let result = identify_into(variant, buffer, mode, prior, &mut desc);

    match &result {
        Ok(()) => debug!(
            variant = %variant,
            pagesize = desc.header.map(|h| h.pagesize),
            calculated = ?desc.calculated_file_size,
            "identified database header"
        ),
        Err(reason) => trace!(variant = %variant, %reason, "rejected"),
    }

    result.map(|()| desc)
}

fn identify_le(
    buffer: &[u8],
    mode: ProbeMode,
    prior: Option<&FormatDescriptor>,
) -> Result<FormatDescriptor, Rejection> {
    identify(Variant::BerkeleyDbLe, buffer, mode, prior)
}

fn identify_be(
    buffer: &[u8],
    mode: ProbeMode,
    prior: Option<&FormatDescriptor>,
) -> Result<FormatDescriptor, Rejection> {
    identify(Variant::BerkeleyDbBe, buffer, mode, prior)
}

/// Entry point registered for `variant`.
pub fn identify_fn(variant: Variant) -> IdentifyFn {
    match variant {
        Variant::BerkeleyDbLe => identify_le,
        Variant::BerkeleyDbBe => identify_be,
    }
}

/// Declares `variant`'s signature to `registry`.
pub fn register(registry: &mut SignatureRegistry, variant: Variant) {
    let layout = variant.layout();
    registry.register(Signature::new(
        variant,
        layout.magic_pattern,
        layout.magic_offset,
        identify_fn(variant),
    ));
}
