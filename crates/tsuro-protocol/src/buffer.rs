//! Reassembly of messages from an arbitrarily chunked byte stream.
//!
//! TCP hands us whatever bytes happen to be available: half a message,
//! three messages, or two and a half. [`MessageBuffer`] keeps the undecoded
//! tail between reads so callers only ever see whole messages.

use crate::{codec, Message, ProtocolError};

/// Accumulates raw reads and yields complete messages in stream order.
#[derive(Debug, Default, Clone)]
pub struct MessageBuffer {
    pending: Vec<u8>,
}

impl MessageBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly received bytes.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    /// Pops the next complete message, or `Ok(None)` if the buffered bytes
    /// don't yet hold one.
    ///
    /// # Errors
    /// A decode error means the stream can no longer be framed. The buffer
    /// is cleared before the error is returned, so the next read starts
    /// from a clean slate.
    pub fn next_message(&mut self) -> Result<Option<Message>, ProtocolError> {
        match codec::decode(&self.pending) {
            Ok(Some((msg, consumed))) => {
                self.pending.drain(..consumed);
                Ok(Some(msg))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.pending.clear();
                Err(e)
            }
        }
    }

    /// Decodes every complete message currently buffered.
    ///
    /// Messages decoded before an error are returned alongside it.
    pub fn drain_messages(&mut self) -> (Vec<Message>, Option<ProtocolError>) {
        let mut out = Vec::new();
        loop {
            match self.next_message() {
                Ok(Some(msg)) => out.push(msg),
                Ok(None) => return (out, None),
                Err(e) => return (out, Some(e)),
            }
        }
    }

    /// Number of bytes waiting for the rest of their message.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Discards any buffered bytes.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
