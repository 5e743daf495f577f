//! Property-based tests for offer validation and frame decoding.
//!
//! Uses proptest to verify:
//! 1. Offer validation accepts exactly the offers inside the limits and
//!    rejects everything past them, for any field contents.
//! 2. Hostile input never panics the decoder — bad frames fold to `Err`.
//! 3. The wire contract survives arbitrary field values (unicode file
//!    names, extreme sizes, opaque payloads).

use airlift_hub::router::validate_offer;
use airlift_proto::signal::{self, ClientMessage};
use proptest::prelude::*;

/// A cap small enough to leave headroom on both sides of the boundary.
const CAP: u64 = 1 << 20;

/// Strategy for plausible user ids.
fn arb_user_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,23}"
}

/// Strategy for non-empty file names, unicode included.
fn arb_file_name() -> impl Strategy<Value = String> {
    "[^\x00]{1,64}"
}

proptest! {
    /// Any offer with non-empty fields and a size within the cap passes.
    #[test]
    fn within_cap_offer_validates(
        destination in arb_user_id(),
        file_name in arb_file_name(),
        file_size in 0..=CAP,
    ) {
        prop_assert!(validate_offer(&destination, &file_name, file_size, CAP).is_ok());
    }

    /// Any size past the cap is rejected no matter the other fields.
    #[test]
    fn over_cap_offer_rejects(
        destination in arb_user_id(),
        file_name in arb_file_name(),
        file_size in (CAP + 1)..=u64::MAX,
    ) {
        let err = validate_offer(&destination, &file_name, file_size, CAP);
        prop_assert!(err.is_err());
        prop_assert!(err.unwrap_err().contains("file too large"));
    }

    /// An empty destination is rejected regardless of everything else.
    #[test]
    fn empty_destination_rejects(
        file_name in arb_file_name(),
        file_size in 0..=CAP,
    ) {
        prop_assert!(validate_offer("", &file_name, file_size, CAP).is_err());
    }

    /// An empty file name is rejected regardless of everything else.
    #[test]
    fn empty_file_name_rejects(
        destination in arb_user_id(),
        file_size in 0..=CAP,
    ) {
        prop_assert!(validate_offer(&destination, "", file_size, CAP).is_err());
    }

    /// Arbitrary text never panics the client-frame decoder.
    #[test]
    fn random_text_never_panics_decoder(text in ".{0,512}") {
        let _ = signal::decode_client(&text);
    }

    /// Arbitrary bytes reinterpreted as lossy text never panic either.
    #[test]
    fn random_bytes_never_panic_decoder(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let text = String::from_utf8_lossy(&bytes);
        let _ = signal::decode_client(&text);
    }

    /// A frame with the right tag but a mangled body decodes to Err, not a
    /// partial message.
    #[test]
    fn tagged_garbage_is_an_error(noise in "[a-z0-9]{1,32}") {
        let text = format!("{{\"type\":\"offer\",\"{noise}\":true}}");
        prop_assert!(signal::decode_client(&text).is_err());
    }

    /// Offers built from arbitrary field values survive the wire encoding
    /// with every field intact.
    #[test]
    fn offer_fields_survive_the_wire(
        destination in arb_user_id(),
        file_name in arb_file_name(),
        file_size in any::<u64>(),
        mime_type in "[a-z]{1,10}/[a-z0-9.+-]{1,20}",
    ) {
        let msg = ClientMessage::Offer {
            destination_user_id: destination,
            file_name,
            file_size,
            mime_type,
        };
        let text = signal::encode_client(&msg).expect("encode should succeed");
        let decoded = signal::decode_client(&text).expect("decode should succeed");
        prop_assert_eq!(msg, decoded);
    }

    /// Chunk payloads are opaque: any string payload passes through the
    /// codec byte for byte.
    #[test]
    fn chunk_payload_is_opaque(payload in ".{0,256}") {
        let msg = ClientMessage::Chunk {
            transfer_id: signal::TransferId::new(),
            destination_user_id: "u-peer".to_string(),
            sequence_number: 0,
            is_final: false,
            payload: payload.clone(),
        };
        let text = signal::encode_client(&msg).expect("encode should succeed");
        match signal::decode_client(&text).expect("decode should succeed") {
            ClientMessage::Chunk { payload: decoded, .. } => prop_assert_eq!(decoded, payload),
            other => prop_assert!(false, "expected Chunk, got {:?}", other),
        }
    }
}
