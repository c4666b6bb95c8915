#![no_main]

use libfuzzer_sys::fuzz_target;
use pagecarve::{ProbeMode, Variant, identify};

fuzz_target!(|data: &[u8]| {
    for variant in Variant::ALL {
        let full = identify(variant, data, ProbeMode::Full, None);
        let header_only = identify(variant, data, ProbeMode::HeaderOnly, None);
        assert_eq!(full, header_only);

        if let Ok(desc) = full {
            assert_eq!(desc.min_filesize, 72);
            if let (Some(size), Some(hdr)) = (desc.calculated_file_size, desc.header) {
                assert!(size >= u64::from(hdr.pagesize));
            }
        }
    }
});
