//! Property tests for the codec: round trip, prefix law, and stream
//! reassembly under arbitrary chunking.

use proptest::prelude::*;
use tsuro_protocol::{decode, encode, Message, MessageBuffer, PlayerId};

fn any_message() -> impl Strategy<Value = Message> {
    let id = any::<u16>().prop_map(PlayerId);
    prop_oneof![
        id.clone().prop_map(|idnum| Message::Welcome { idnum }),
        (id.clone(), ".{0,24}").prop_map(|(idnum, name)| Message::PlayerJoined { idnum, name }),
        id.clone().prop_map(|idnum| Message::PlayerLeft { idnum }),
        Just(Message::CountdownStarted),
        Just(Message::GameStart),
        any::<u16>().prop_map(|tileid| Message::AddTileToHand { tileid }),
        id.clone().prop_map(|idnum| Message::PlayerTurn { idnum }),
        (id.clone(), any::<u16>(), any::<u16>(), any::<u16>(), any::<u16>()).prop_map(
            |(idnum, tileid, rotation, x, y)| Message::PlaceTile {
                idnum,
                tileid,
                rotation,
                x,
                y,
            }
        ),
        (id.clone(), any::<u16>(), any::<u16>(), any::<u16>()).prop_map(
            |(idnum, x, y, position)| Message::MoveToken {
                idnum,
                x,
                y,
                position,
            }
        ),
        id.prop_map(|idnum| Message::PlayerEliminated { idnum }),
    ]
}

proptest! {
    #[test]
    fn round_trip_consumes_exactly_the_encoding(msg in any_message()) {
        let bytes = encode(&msg).unwrap();
        prop_assert_eq!(decode(&bytes).unwrap(), Some((msg, bytes.len())));
    }

    #[test]
    fn strict_prefix_decodes_to_nothing(msg in any_message(), cut in any::<prop::sample::Index>()) {
        let bytes = encode(&msg).unwrap();
        let cut = cut.index(bytes.len());
        prop_assert!(decode(&bytes[..cut]).unwrap().is_none());
    }

    #[test]
    fn any_chunking_of_a_stream_yields_the_same_messages(
        msgs in prop::collection::vec(any_message(), 1..12),
        chunk in 1usize..17,
    ) {
        let mut stream = Vec::new();
        for msg in &msgs {
            stream.extend(encode(msg).unwrap());
        }

        let mut buf = MessageBuffer::new();
        let mut out = Vec::new();
        for piece in stream.chunks(chunk) {
            buf.extend(piece);
            let (decoded, err) = buf.drain_messages();
            prop_assert!(err.is_none());
            out.extend(decoded);
        }

        prop_assert_eq!(out, msgs);
        prop_assert_eq!(buf.pending_len(), 0);
    }
}
