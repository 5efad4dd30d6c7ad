//! Connection tracking for the Tsuro server.
//!
//! Every accepted socket gets a 16-bit player id and an entry in the
//! [`ConnectionRegistry`], whether it ends up seated or only watches.
//! The registry also owns outbound delivery: [`ConnectionRegistry::broadcast`]
//! and [`ConnectionRegistry::send_to`].
//!
//! # How it fits in the stack
//!
//! ```text
//! Game Layer (above)  ← decides who gets which message
//!     ↕
//! Session Layer (this crate)  ← ids, names, sockets, per-peer buffers
//!     ↕
//! Transport + Protocol (below)  ← bytes and message encoding
//! ```

mod error;
mod registry;

pub use error::SessionError;
pub use registry::ConnectionRegistry;
