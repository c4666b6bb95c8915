use pagecarve::formats::layout::{BERKELEYDB_LE, BERKELEYDB_MAGIC, DB_HEADER_SIZE, PageCountRule};
use pagecarve::formats::{DbHeader, calculated_size};
use pagecarve::{
    FormatDescriptor, ProbeMode, Rejection, SizeCheckStrategy, Variant, identify, identify_into,
};

fn make_header(pagesize: [u8; 4], last_pgno: [u8; 4]) -> Vec<u8> {
    let mut buf = vec![0u8; DB_HEADER_SIZE];
    buf[..16].copy_from_slice(&BERKELEYDB_MAGIC);
    buf[20..24].copy_from_slice(&pagesize);
    buf[32..36].copy_from_slice(&last_pgno);
    buf
}

#[test]
fn test_little_endian_end_to_end() {
    let buf = make_header([0x00, 0x10, 0x00, 0x00], [0x09, 0x00, 0x00, 0x00]);
    let desc = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::Full, None).unwrap();

    assert_eq!(desc.extension, "bdb");
    assert_eq!(desc.min_filesize, 72);
    assert_eq!(desc.calculated_file_size, Some(40960));
    assert_eq!(desc.size_check, SizeCheckStrategy::ExactSize);
    assert_eq!(desc.variant, Some(Variant::BerkeleyDbLe));
    assert_eq!(desc.description, "berkeleydb database file");
}

#[test]
fn test_last_page_zero_is_one_page() {
    let buf = make_header(4096u32.to_le_bytes(), [0; 4]);
    let desc = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::Full, None).unwrap();
    assert_eq!(desc.calculated_file_size, Some(4096));
    assert_eq!(desc.min_filesize, 72);
}

#[test]
fn test_zeroed_count_layout_has_no_calculated_size() {
    let buf = make_header([0x00, 0x10, 0x00, 0x00], [0; 4]);
    let layout = BERKELEYDB_LE.with_page_count(PageCountRule::LastIndexIsCount);
    let header = DbHeader::decode(&buf, &layout).unwrap();
    assert_eq!(calculated_size(&layout, &header), Ok(None));
}

#[test]
fn test_zero_pagesize_is_left_to_size_checks() {
    let buf = make_header([0; 4], 9u32.to_le_bytes());
    let desc = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::Full, None).unwrap();
    assert_eq!(desc.calculated_file_size, Some(0));
    assert_eq!(desc.size_check, SizeCheckStrategy::ExactSize);
    assert!(desc.checks().is_some());
    assert_eq!(desc.min_filesize, 72);

    // A zero-length file can never reach the header size.
    assert!(desc.settle_length(1 << 20).is_err());
}

#[test]
fn test_short_buffer_is_insufficient_data() {
    let buf = make_header(4096u32.to_le_bytes(), 9u32.to_le_bytes());
    for len in [0, 16, 71] {
        for variant in Variant::ALL {
            let err = identify(variant, &buf[..len], ProbeMode::Full, None).unwrap_err();
            assert_eq!(
                err,
                Rejection::InsufficientData {
                    expected: 72,
                    actual: len
                }
            );
        }
    }
}

#[test]
fn test_max_fields_do_not_wrap() {
    let buf = make_header([0xFF; 4], [0xFF; 4]);
    let desc = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::Full, None).unwrap();
    let expected = (u32::MAX as u64 + 1) * u32::MAX as u64;
    assert_eq!(desc.calculated_file_size, Some(expected));
}

#[test]
fn test_identify_is_idempotent() {
    let buf = make_header([0x00, 0x10, 0x00, 0x00], [0x09, 0x00, 0x00, 0x00]);
    for variant in Variant::ALL {
        let first = identify(variant, &buf, ProbeMode::Full, None).unwrap();
        let second = identify(variant, &buf, ProbeMode::Full, None).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_endianness_isolation() {
    let buf = make_header([0x00, 0x10, 0x00, 0x00], [0x09, 0x00, 0x00, 0x00]);
    let le = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::Full, None).unwrap();
    let be = identify(Variant::BerkeleyDbBe, &buf, ProbeMode::Full, None).unwrap();

    assert_ne!(le.calculated_file_size, be.calculated_file_size);
    assert_eq!(
        be.calculated_file_size,
        Some((0x0900_0000u64 + 1) * 0x0010_0000)
    );
    assert_eq!(be.extension, "dat");
    assert_eq!(be.min_filesize, 72);
}

#[test]
fn test_big_endian_header() {
    let buf = make_header(4096u32.to_be_bytes(), 9u32.to_be_bytes());
    let desc = identify(Variant::BerkeleyDbBe, &buf, ProbeMode::Full, None).unwrap();
    assert_eq!(desc.calculated_file_size, Some(40960));
    assert_eq!(desc.header.map(|h| h.pagesize), Some(4096));
}

#[test]
fn test_header_only_matches_full_probe() {
    let mut buf = make_header(4096u32.to_le_bytes(), 9u32.to_le_bytes());
    let header_only = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::HeaderOnly, None).unwrap();

    buf.extend_from_slice(&[0xA5; 8192]);
    let full = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::Full, None).unwrap();
    assert_eq!(header_only, full);
}

#[test]
fn test_magic_mismatch_is_not_matched() {
    let mut buf = make_header(4096u32.to_le_bytes(), 9u32.to_le_bytes());
    buf[4] = 0x02;
    let err = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::Full, None).unwrap_err();
    assert!(err.is_not_matched());
}

#[test]
fn test_identify_into_resets_stale_state() {
    let good = make_header(4096u32.to_le_bytes(), 9u32.to_le_bytes());
    let mut desc = FormatDescriptor::default();

    identify_into(Variant::BerkeleyDbLe, &good, ProbeMode::Full, None, &mut desc).unwrap();
    assert_eq!(desc.calculated_file_size, Some(40960));

    let result = identify_into(
        Variant::BerkeleyDbLe,
        &good[..40],
        ProbeMode::Full,
        Some(&desc.clone()),
        &mut desc,
    );
    assert!(result.is_err());
    assert!(desc.is_empty());
    assert_eq!(desc.calculated_file_size, None);
}

#[test]
fn test_decoded_fields_are_kept() {
    let mut buf = make_header(4096u32.to_le_bytes(), 9u32.to_le_bytes());
    buf[36..40].copy_from_slice(&4u32.to_le_bytes());
    buf[40..44].copy_from_slice(&120u32.to_le_bytes());
    buf[48..52].copy_from_slice(&0x20u32.to_le_bytes());
    buf[24] = 1;

    let desc = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::Full, None).unwrap();
    let header = desc.header.unwrap();
    assert_eq!(header.nparts, 4);
    assert!(header.is_partitioned());
    assert_eq!(header.key_count, 120);
    assert_eq!(header.flags, 0x20);
    assert!(header.is_encrypted());
}
