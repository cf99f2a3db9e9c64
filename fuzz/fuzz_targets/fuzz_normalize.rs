#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let once = docsearch::utils::normalize(&raw);
    let twice = docsearch::utils::normalize(&once.joined);

    // Normalization is idempotent
    assert_eq!(once, twice);
});
