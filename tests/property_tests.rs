#![forbid(unsafe_code)]

use proptest::prelude::*;

use wallet_adapter_luckywallet::{PublicKey, Transaction, PUBLIC_KEY_LENGTH};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn public_key_base58_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
        let key = PublicKey::new(bytes);
        let parsed: PublicKey = key.to_base58().parse().unwrap();
        prop_assert_eq!(key, parsed);
        prop_assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn public_key_rejects_wrong_lengths(raw in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assume!(raw.len() != PUBLIC_KEY_LENGTH);
        prop_assert!(PublicKey::from_bytes(&raw).is_err());
    }

    #[test]
    fn message_wire_encoding_roundtrip(payload in prop::collection::vec(any::<u8>(), 0..512)) {
        // The sign-message wire format: raw bytes are base58 text on the
        // wire and must decode back to the identical byte payload.
        let wire = bs58::encode(&payload).into_string();
        let decoded = bs58::decode(&wire).into_vec().unwrap();
        prop_assert_eq!(payload, decoded);
    }

    #[test]
    fn transaction_preserves_arbitrary_payloads(payload in prop::collection::vec(any::<u8>(), 0..1024)) {
        let tx = Transaction::new(payload.clone());
        prop_assert_eq!(tx.as_bytes(), &payload[..]);
        prop_assert_eq!(tx.into_bytes(), payload);
    }
}
