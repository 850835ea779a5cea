#![warn(missing_docs)]
//! Wire grammar of the FlockDraw whiteboard protocol.
//!
//! The protocol is newline-delimited ISO-8859-2 text over a persistent
//! stream. This crate covers the pure text layer: the legacy encoding,
//! reassembly of lines from arbitrary stream chunks, and the nested
//! envelope/message/command grammar. It performs no I/O.

pub mod codec;
pub mod encoding;
mod framing;

pub use codec::{
    broadcast_line, deliver_line, encode_commands, join_line, Command, Envelope, Op, PeerMessage,
    ProtocolError, DEFAULT_PORT, DEFAULT_SERVER, PROTOCOL_VERSION, READ_CHUNK_SIZE,
};
pub use encoding::EncodeError;
pub use framing::LineFramer;
