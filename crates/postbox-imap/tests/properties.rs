//! Property tests for the wire layer.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use postbox_imap::parser::{Response, ResponseReceiver};
use postbox_imap::types::{SequenceSet, utf7};

proptest! {
    #[test]
    fn receiver_rejects_garbage_and_recovers(line in proptest::collection::vec(any::<u8>(), 0..200)) {
        let mut receiver = ResponseReceiver::new();
        let mut input = line;
        input.extend_from_slice(b"\r\n");
        if receiver.receive_line(&input).is_err() {
            let next = receiver.receive_line(b"* 7 EXISTS\r\n").unwrap();
            prop_assert!(matches!(next, Some(Response::Data(_))));
        }
    }

    #[test]
    fn mailbox_names_encode_to_ascii(name in "\\PC{0,40}") {
        let encoded = utf7::encode(&name);
        prop_assert!(encoded.is_ascii());
        prop_assert_eq!(utf7::decode(encoded.as_bytes()), Some(name));
    }

    #[test]
    fn sequence_sets_reparse(numbers in proptest::collection::vec(1u32..100_000, 1..20)) {
        let set = SequenceSet::from_numbers(&numbers).unwrap();
        let reparsed = SequenceSet::parse(&set.to_string()).unwrap();
        prop_assert_eq!(reparsed.to_string(), set.to_string());
    }
}
