//! Byte encoding and decoding for [`Message`].
//!
//! Layout: a 2-byte big-endian type tag followed by the message's fields,
//! each a 2-byte big-endian integer. `PlayerJoined` is the only variable
//! length message; its name length is one of its own fields, so there is
//! no outer length prefix anywhere in the stream.
//!
//! ```rust
//! use tsuro_protocol::{decode, encode, Message, PlayerId};
//!
//! let msg = Message::PlayerTurn { idnum: PlayerId(2) };
//! let bytes = encode(&msg).unwrap();
//! assert_eq!(bytes, [0, 7, 0, 2]);
//!
//! // A strict prefix decodes to "need more bytes".
//! assert!(decode(&bytes[..3]).unwrap().is_none());
//! assert_eq!(decode(&bytes).unwrap(), Some((msg, 4)));
//! ```

use crate::{Message, MessageType, PlayerId, ProtocolError};

/// Size of the type tag that starts every message.
const TAG_LEN: usize = 2;

const FIELD_LEN: usize = 2;

/// Encodes one message into a fresh buffer.
pub fn encode(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    let mut out = Vec::with_capacity(encoded_len(msg));
    encode_into(msg, &mut out)?;
    Ok(out)
}

/// Appends the encoding of `msg` to `out`.
///
/// On error nothing is written.
pub fn encode_into(msg: &Message, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
    if let Message::PlayerJoined { name, .. } = msg {
        if name.len() > usize::from(u16::MAX) {
            return Err(ProtocolError::NameTooLong(name.len()));
        }
    }

    put_u16(out, msg.message_type().as_u16());
    match msg {
        Message::Welcome { idnum }
        | Message::PlayerLeft { idnum }
        | Message::PlayerTurn { idnum }
        | Message::PlayerEliminated { idnum } => put_u16(out, idnum.0),
        Message::PlayerJoined { idnum, name } => {
            put_u16(out, idnum.0);
            // Length checked above.
            put_u16(out, name.len() as u16);
            out.extend_from_slice(name.as_bytes());
        }
        Message::CountdownStarted | Message::GameStart => {}
        Message::AddTileToHand { tileid } => put_u16(out, *tileid),
        Message::PlaceTile {
            idnum,
            tileid,
            rotation,
            x,
            y,
        } => {
            for field in [idnum.0, *tileid, *rotation, *x, *y] {
                put_u16(out, field);
            }
        }
        Message::MoveToken {
            idnum,
            x,
            y,
            position,
        } => {
            for field in [idnum.0, *x, *y, *position] {
                put_u16(out, field);
            }
        }
    }
    Ok(())
}

/// Number of bytes `encode` produces for `msg`.
pub fn encoded_len(msg: &Message) -> usize {
    let fixed = TAG_LEN + msg.message_type().field_count() * FIELD_LEN;
    match msg {
        Message::PlayerJoined { name, .. } => fixed + name.len(),
        _ => fixed,
    }
}

/// Decodes one message from the front of `buf`.
///
/// Returns `Ok(Some((message, consumed)))` when a whole message is present
/// and `Ok(None)` when more bytes are needed. In the `None` case nothing
/// has been consumed; the caller extends the buffer and tries again.
///
/// # Errors
/// An unknown type tag, or a name that isn't UTF-8. The tag is checked as
/// soon as two bytes are available, before the body has arrived.
pub fn decode(buf: &[u8]) -> Result<Option<(Message, usize)>, ProtocolError> {
    let Some(raw_tag) = read_u16(buf, 0) else {
        return Ok(None);
    };
    let ty = MessageType::from_u16(raw_tag)
        .ok_or(ProtocolError::UnknownMessageType(raw_tag))?;

    let fixed = TAG_LEN + ty.field_count() * FIELD_LEN;
    if buf.len() < fixed {
        return Ok(None);
    }
    // Every field read below is inside `fixed`, which was just checked.
    let field = |i: usize| read_u16(buf, TAG_LEN + i * FIELD_LEN).unwrap_or_default();

    let decoded = match ty {
        MessageType::Welcome => (Message::Welcome { idnum: PlayerId(field(0)) }, fixed),
        MessageType::PlayerLeft => (Message::PlayerLeft { idnum: PlayerId(field(0)) }, fixed),
        MessageType::PlayerTurn => (Message::PlayerTurn { idnum: PlayerId(field(0)) }, fixed),
        MessageType::PlayerEliminated => (
            Message::PlayerEliminated {
                idnum: PlayerId(field(0)),
            },
            fixed,
        ),
        MessageType::CountdownStarted => (Message::CountdownStarted, fixed),
        MessageType::GameStart => (Message::GameStart, fixed),
        MessageType::AddTileToHand => (Message::AddTileToHand { tileid: field(0) }, fixed),
        MessageType::PlaceTile => (
            Message::PlaceTile {
                idnum: PlayerId(field(0)),
                tileid: field(1),
                rotation: field(2),
                x: field(3),
                y: field(4),
            },
            fixed,
        ),
        MessageType::MoveToken => (
            Message::MoveToken {
                idnum: PlayerId(field(0)),
                x: field(1),
                y: field(2),
                position: field(3),
            },
            fixed,
        ),
        MessageType::PlayerJoined => {
            let name_len = usize::from(field(1));
            let total = fixed + name_len;
            if buf.len() < total {
                return Ok(None);
            }
            let name = String::from_utf8(buf[fixed..total].to_vec())?;
            (
                Message::PlayerJoined {
                    idnum: PlayerId(field(0)),
                    name,
                },
                total,
            )
        }
    };
    Ok(Some(decoded))
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn read_u16(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Message> {
        vec![
            Message::Welcome { idnum: PlayerId(0) },
            Message::PlayerJoined {
                idnum: PlayerId(12),
                name: "127.0.0.1:50312".into(),
            },
            Message::PlayerJoined {
                idnum: PlayerId(1),
                name: String::new(),
            },
            Message::PlayerLeft { idnum: PlayerId(65_535) },
            Message::CountdownStarted,
            Message::GameStart,
            Message::AddTileToHand { tileid: 10 },
            Message::PlayerTurn { idnum: PlayerId(4) },
            Message::PlaceTile {
                idnum: PlayerId(4),
                tileid: 3,
                rotation: 2,
                x: 0,
                y: 4,
            },
            Message::MoveToken {
                idnum: PlayerId(4),
                x: 0,
                y: 4,
                position: 7,
            },
            Message::PlayerEliminated { idnum: PlayerId(9) },
        ]
    }

    #[test]
    fn test_every_variant_round_trips_with_exact_length() {
        for msg in catalog() {
            let bytes = encode(&msg).unwrap();
            assert_eq!(bytes.len(), encoded_len(&msg), "{msg:?}");
            assert_eq!(decode(&bytes).unwrap(), Some((msg, bytes.len())));
        }
    }

    #[test]
    fn test_every_strict_prefix_needs_more_bytes() {
        for msg in catalog() {
            let bytes = encode(&msg).unwrap();
            for cut in 0..bytes.len() {
                assert!(
                    decode(&bytes[..cut]).unwrap().is_none(),
                    "{msg:?} cut at {cut}"
                );
            }
        }
    }

    #[test]
    fn test_place_tile_layout_is_big_endian() {
        let msg = Message::PlaceTile {
            idnum: PlayerId(0x0102),
            tileid: 3,
            rotation: 1,
            x: 2,
            y: 0,
        };
        assert_eq!(
            encode(&msg).unwrap(),
            [0, 8, 1, 2, 0, 3, 0, 1, 0, 2, 0, 0]
        );
    }

    #[test]
    fn test_player_joined_layout_is_id_then_length_then_name() {
        let msg = Message::PlayerJoined {
            idnum: PlayerId(5),
            name: "ab".into(),
        };
        assert_eq!(encode(&msg).unwrap(), [0, 2, 0, 5, 0, 2, b'a', b'b']);
    }

    #[test]
    fn test_decode_consumes_only_the_first_of_two_messages() {
        let mut bytes = encode(&Message::GameStart).unwrap();
        bytes.extend(encode(&Message::PlayerTurn { idnum: PlayerId(1) }).unwrap());
        let (msg, used) = decode(&bytes).unwrap().unwrap();
        assert_eq!(msg, Message::GameStart);
        assert_eq!(used, 2);
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        let err = decode(&[0, 42, 0, 0]).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownMessageType(42)));
    }

    #[test]
    fn test_invalid_utf8_name_is_an_error() {
        let bytes = [0, 2, 0, 1, 0, 2, 0xff, 0xfe];
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            ProtocolError::InvalidName(_)
        ));
    }

    #[test]
    fn test_oversized_name_is_rejected_without_writing() {
        let msg = Message::PlayerJoined {
            idnum: PlayerId(1),
            name: "x".repeat(70_000),
        };
        let mut out = Vec::new();
        assert!(matches!(
            encode_into(&msg, &mut out),
            Err(ProtocolError::NameTooLong(70_000))
        ));
        assert!(out.is_empty());
    }
}
