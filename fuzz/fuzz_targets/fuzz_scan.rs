#![no_main]

use libfuzzer_sys::fuzz_target;
use pagecarve::{Carver, DispatchPolicy, ScanConfig, SignatureRegistry};

fuzz_target!(|data: &[u8]| {
    let registry = SignatureRegistry::with_defaults();
    let config = ScanConfig::new()
        .with_alignment(1)
        .with_policy(DispatchPolicy::FirstFitting)
        .sequential();

    let report = Carver::new(&registry, config).scan(data);
    for file in &report.files {
        assert!(file.offset + file.length <= data.len() as u64);
    }
});
