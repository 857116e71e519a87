#![no_main]

use libfuzzer_sys::fuzz_target;
use weft_di::{PathSegment, Value};

fuzz_target!(|data: &[u8]| {
    // Each byte is one segment: high bit picks key or index
    let segments: Vec<PathSegment> = data
        .iter()
        .take(16)
        .map(|&b| {
            if b & 0x80 == 0 {
                PathSegment::Key(char::from((b % 26) + b'a').to_string())
            } else {
                PathSegment::Index((b & 0x0f) as usize)
            }
        })
        .collect();

    let mut root = Value::Null;
    if root.set_at(&segments, Value::scalar(data.len())).is_ok() {
        let found = root.get_at(&segments).and_then(Value::as_scalar).cloned();
        assert_eq!(found, Some(serde_json::json!(data.len())));
    }

    // indexes from untrusted side tables must fail cleanly
    if let Some(chunk) = data.get(..8) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        let index = u64::from_le_bytes(bytes) as usize;
        let mut root = Value::seq([Value::Null]);
        let _ = root.set_at(&[PathSegment::Index(index)], Value::Null);
    }
});
