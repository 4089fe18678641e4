#![no_main]
use chain_table::{decode_i64, encode_i64};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // arbitrary bytes never panic, and whatever decodes re-encodes to the same bytes
    if let Ok(n) = decode_i64(data) {
        let encoded = encode_i64(n);
        let terminated = data.split(|&b| b == 0).next().unwrap_or_default();
        assert_eq!(terminated, encoded.as_bytes());
    }

    if let Ok(bytes) = <[u8; 8]>::try_from(data.get(..8).unwrap_or_default()) {
        let n = i64::from_le_bytes(bytes);
        let encoded = encode_i64(n);

        assert!(!encoded.as_bytes().contains(&0));
        assert_eq!(n, decode_i64(&encoded).unwrap());
    }
});
