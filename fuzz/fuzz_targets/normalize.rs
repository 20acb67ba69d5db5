#![no_main]

use goldrun_core::{decode_i32_le, first_order_violation, normalize_transcript, overlaps_placeholder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Artifact decoding must never panic, whatever the length
    if let Ok(values) = decode_i32_le(data) {
        let _ = first_order_violation(&values);
    }

    // Use the first line as the root, the rest as the captured transcript.
    // Roots overlapping a placeholder are a known limit of idempotence.
    if let Ok(s) = std::str::from_utf8(data) {
        let (root, raw) = s.split_once('\n').unwrap_or(("/fuzz/root", s));
        if root.starts_with('/') && !overlaps_placeholder(root) {
            let once = normalize_transcript(raw, root);
            assert_eq!(normalize_transcript(&once, root), once);
        }
    }
});
