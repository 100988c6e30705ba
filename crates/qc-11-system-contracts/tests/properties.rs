//! # Property Tests
//!
//! Codec round trip and buffer read/length laws over random inputs.

use proptest::prelude::*;
use qc_11_system_contracts::prelude::*;
use std::sync::Arc;

fn abi_value() -> impl Strategy<Value = AbiValue> {
    prop_oneof![
        any::<u64>().prop_map(AbiValue::UInt64),
        any::<[u8; 20]>().prop_map(|bytes| AbiValue::Address(Address::new(bytes))),
        ".{0,80}".prop_map(AbiValue::String),
        proptest::collection::vec(any::<u8>(), 0..300).prop_map(AbiValue::Bytes),
    ]
}

proptest! {
    #[test]
    fn prop_encode_decode_round_trip(values in proptest::collection::vec(abi_value(), 0..6)) {
        let kinds: Vec<ArgKind> = values.iter().map(AbiValue::kind).collect();
        let encoded = encode_return_value(&values);
        prop_assert_eq!(encoded.len() % 32, 0);
        prop_assert_eq!(extract_params(&encoded, &kinds).unwrap(), values);
    }

    #[test]
    fn prop_uint64_keeps_low_eight_bytes(high in any::<[u8; 24]>(), low in any::<u64>()) {
        let mut word = high.to_vec();
        word.extend_from_slice(&low.to_be_bytes());
        prop_assert_eq!(
            extract_params(&word, &[ArgKind::UInt64]).unwrap(),
            vec![AbiValue::UInt64(low)]
        );
    }

    #[test]
    fn prop_decode_never_panics(
        payload in proptest::collection::vec(any::<u8>(), 0..200),
        kinds in proptest::collection::vec(
            prop_oneof![
                Just(ArgKind::String),
                Just(ArgKind::Bytes),
                Just(ArgKind::UInt64),
                Just(ArgKind::Address),
            ],
            0..5,
        ),
    ) {
        let _ = extract_params(&payload, &kinds);
    }

    #[test]
    fn prop_buffer_reads_what_was_written(
        writes in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..600), 1..5),
        start in 0.0f64..1.0,
        span in 0.0f64..1.0,
    ) {
        let repo = Arc::new(InMemoryRepository::new());
        let buffer = SystemBuffer::with_defaults(repo);

        let mut all = Vec::new();
        for chunk in &writes {
            prop_assert_eq!(buffer.write(chunk).unwrap(), chunk.len() as u64);
            all.extend_from_slice(chunk);
            prop_assert_eq!(buffer.length(), all.len() as u64);
        }

        let offset = (all.len() as f64 * start) as usize;
        let size = ((all.len() - offset) as f64 * span) as usize;
        if buffer.length() > 0 {
            prop_assert_eq!(
                buffer.read(offset as u64, size as u64).unwrap(),
                all[offset..offset + size].to_vec()
            );
        }

        buffer.close().unwrap();
        prop_assert_eq!(buffer.length(), 0);
    }
}
