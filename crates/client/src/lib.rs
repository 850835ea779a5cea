#![warn(missing_docs)]
//! Connection machinery for the FlockDraw whiteboard client.
//!
//! Builds on [`flockbot_proto`] for the wire grammar and adds everything
//! stateful: the peer roster, the bitmap relay, the transport abstraction,
//! and the session driving them over one connection.

mod bitmap;
mod relay;
mod roster;
mod session;
mod transport;

pub use bitmap::{decode_blob, encode_blob, BitmapError, BitmapStore};
pub use relay::BitmapRelay;
pub use roster::{Roster, RosterError};
pub use session::{Session, SessionOptions, SessionState};
pub use transport::{TcpTransport, Transport};
