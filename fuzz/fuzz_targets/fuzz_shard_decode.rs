#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary payloads must decode or fail cleanly, never panic
    if let Ok(payload) = std::str::from_utf8(data) {
        if let Ok(shard) = docsearch::index::decode::decode_shard("me", payload) {
            // Decoded shards are sorted with unique keys
            let entries = shard.entries();
            assert!(entries.windows(2).all(|w| w[0].key < w[1].key));
        }
        let _ = docsearch::index::decode::decode_key(payload);
        let _ = docsearch::utils::decode_entities(payload);
    }
});
