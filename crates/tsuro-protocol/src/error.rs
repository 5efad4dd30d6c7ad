//! Error types for the protocol layer.
//!
//! Running out of bytes is never an error here: decoding reports it as
//! `Ok(None)`. These variants cover input the stream can't recover from.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The type tag is not part of the message catalog. The rest of the
    /// stream can't be framed after this.
    #[error("unknown message type {0}")]
    UnknownMessageType(u16),

    /// A `PlayerJoined` name was not valid UTF-8.
    #[error("player name is not valid UTF-8: {0}")]
    InvalidName(#[from] std::string::FromUtf8Error),

    /// A `PlayerJoined` name is longer than its 16-bit length field allows.
    #[error("player name is {0} bytes, longer than the 65535-byte limit")]
    NameTooLong(usize),
}
