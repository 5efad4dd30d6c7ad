//! Wire protocol for the Tsuro server.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Types** ([`Message`], [`MessageType`], [`PlayerId`], [`Recipient`]):
//!   what travels on the wire and who it is addressed to.
//! - **Codec** ([`encode`], [`decode`]): the exact big-endian byte layout.
//! - **Buffer** ([`MessageBuffer`]): reassembly of a fragmented or
//!   coalesced TCP stream into whole messages.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Game (rules)
//! ```
//!
//! The protocol layer knows nothing about sockets or game rules.

mod buffer;
mod codec;
mod error;
mod types;

pub use buffer::MessageBuffer;
pub use codec::{decode, encode, encode_into, encoded_len};
pub use error::ProtocolError;
pub use types::{Message, MessageType, PlayerId, Recipient, IDNUM_LIMIT};
