use pagecarve::formats::layout::{BERKELEYDB_MAGIC, DB_HEADER_SIZE};
use pagecarve::{ProbeMode, Rejection, SizeCheckStrategy, Variant, identify};
use proptest::prelude::*;

fn make_header(pagesize: [u8; 4], last_pgno: [u8; 4], filler: u8) -> Vec<u8> {
    let mut buf = vec![filler; DB_HEADER_SIZE];
    buf[..16].copy_from_slice(&BERKELEYDB_MAGIC);
    buf[20..24].copy_from_slice(&pagesize);
    buf[32..36].copy_from_slice(&last_pgno);
    buf
}

proptest! {
    #[test]
    fn le_size_is_pages_times_pagesize(pagesize in 1u32.., last_pgno in any::<u32>(), filler in any::<u8>()) {
        let buf = make_header(pagesize.to_le_bytes(), last_pgno.to_le_bytes(), filler);
        let desc = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::Full, None).unwrap();

        prop_assert_eq!(
            desc.calculated_file_size,
            Some((u64::from(last_pgno) + 1) * u64::from(pagesize))
        );
        prop_assert_eq!(desc.size_check, SizeCheckStrategy::ExactSize);
        prop_assert_eq!(desc.min_filesize, 72);
    }

    #[test]
    fn be_size_is_pages_times_pagesize(pagesize in 1u32.., last_pgno in any::<u32>()) {
        let buf = make_header(pagesize.to_be_bytes(), last_pgno.to_be_bytes(), 0);
        let desc = identify(Variant::BerkeleyDbBe, &buf, ProbeMode::Full, None).unwrap();

        prop_assert_eq!(
            desc.calculated_file_size,
            Some((u64::from(last_pgno) + 1) * u64::from(pagesize))
        );
    }

    #[test]
    fn short_buffers_are_insufficient(bytes in proptest::collection::vec(any::<u8>(), 0..DB_HEADER_SIZE)) {
        for variant in Variant::ALL {
            let err = identify(variant, &bytes, ProbeMode::Full, None).unwrap_err();
            prop_assert_eq!(
                err,
                Rejection::InsufficientData { expected: DB_HEADER_SIZE, actual: bytes.len() }
            );
        }
    }

    #[test]
    fn identify_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        for variant in Variant::ALL {
            let first = identify(variant, &bytes, ProbeMode::HeaderOnly, None);
            let second = identify(variant, &bytes, ProbeMode::HeaderOnly, None);
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn size_is_never_below_one_page(pagesize in 1u32.., last_pgno in any::<u32>()) {
        let buf = make_header(pagesize.to_le_bytes(), last_pgno.to_le_bytes(), 0);
        let desc = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::Full, None).unwrap();
        let size = desc.calculated_file_size.unwrap();

        prop_assert!(size >= u64::from(pagesize));
        prop_assert!(size >= u64::from(last_pgno));
    }

    #[test]
    fn byte_order_changes_asymmetric_sizes(pagesize in 1u32.., last_pgno in any::<u32>()) {
        prop_assume!(pagesize.swap_bytes() != pagesize || last_pgno.swap_bytes() != last_pgno);
        let buf = make_header(pagesize.to_le_bytes(), last_pgno.to_le_bytes(), 0);

        let le = identify(Variant::BerkeleyDbLe, &buf, ProbeMode::Full, None).unwrap();
        let be = identify(Variant::BerkeleyDbBe, &buf, ProbeMode::Full, None).unwrap();
        prop_assert_ne!(le.extension, be.extension);
        prop_assert_ne!(le.header, be.header);
    }
}
