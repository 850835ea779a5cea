//! Envelope, message, and command grammar of the whiteboard protocol.
//!
//! One wire line is one envelope: a short tag, a space, and the rest of
//! the line. `M` envelopes multiplex a sender with a tab-separated list of
//! commands, each of which is an op token optionally followed by a single
//! space and its argument.

use std::fmt;
use thiserror::Error;

/// Protocol version announced in the join line.
pub const PROTOCOL_VERSION: u32 = 3;

/// Well-known server host.
pub const DEFAULT_SERVER: &str = "flockdraw.com";

/// Well-known server port.
pub const DEFAULT_PORT: u16 = 443;

/// Bytes requested per transport read.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Errors for lines that cannot be parsed at all.
///
/// Unknown tags and ops are not errors; they parse into the `Unknown`
/// variants so the dispatcher can log and move on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The line has no space, so no envelope tag can be split off.
    #[error("line {0:?} has no envelope prefix")]
    MissingPrefix(String),
    /// An `M` envelope whose payload has no sender separator.
    #[error("message {0:?} is missing its sender")]
    MissingSender(String),
}

/// One decoded wire line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// `A <username>`: a peer joined the whiteboard.
    Add(String),
    /// `R <username>`: a peer left the whiteboard.
    Remove(String),
    /// `M <sender> <commands>`: multiplexed commands from a peer.
    Message(PeerMessage),
    /// `N`: the whiteboard was freshly created.
    Notice,
    /// Any tag this client does not know. Kept as data so dispatch can
    /// warn with full context and continue.
    Unknown {
        /// The unrecognized tag token.
        tag: String,
        /// The rest of the line after the tag.
        rest: String,
    },
}

impl Envelope {
    /// Parse one complete line (newline already stripped).
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let (tag, rest) = line
            .split_once(' ')
            .ok_or_else(|| ProtocolError::MissingPrefix(line.to_string()))?;
        match tag {
            "A" => Ok(Envelope::Add(rest.to_string())),
            "R" => Ok(Envelope::Remove(rest.to_string())),
            "M" => Ok(Envelope::Message(PeerMessage::parse(rest)?)),
            "N" => Ok(Envelope::Notice),
            _ => Ok(Envelope::Unknown {
                tag: tag.to_string(),
                rest: rest.to_string(),
            }),
        }
    }
}

/// The payload of an `M` envelope: who sent it and what they sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerMessage {
    /// Username of the sending peer.
    pub sender: String,
    /// Commands in transmission order.
    pub commands: Vec<Command>,
}

impl PeerMessage {
    /// Parse the rest-of-line of an `M` envelope.
    pub fn parse(rest: &str) -> Result<Self, ProtocolError> {
        let (sender, payload) = rest
            .split_once(' ')
            .ok_or_else(|| ProtocolError::MissingSender(rest.to_string()))?;
        let commands = payload.split('\t').map(Command::parse).collect();
        Ok(Self {
            sender: sender.to_string(),
            commands,
        })
    }
}

/// One command inside a message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The operation.
    pub op: Op,
    /// Everything after the first space of the command text, if any.
    pub arg: Option<String>,
}

impl Command {
    /// Parse one raw command string.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(' ') {
            Some((op, arg)) => Self {
                op: Op::from_token(op),
                arg: Some(arg.to_string()),
            },
            None => Self {
                op: Op::from_token(raw),
                arg: None,
            },
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{} {}", self.op.token(), arg),
            None => write!(f, "{}", self.op.token()),
        }
    }
}

/// Operations carried inside message payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// `Kp`: a key press.
    Keypress,
    /// `Rq`: a peer asks for the current canvas bitmap.
    BitmapRequest,
    /// `Pm`: pointer moved.
    PointerMove,
    /// `Ps`: pointer (brush) size changed.
    PointerSize,
    /// `Pd`: pointer pressed down.
    PointerDown,
    /// `Pu`: pointer released.
    PointerUp,
    /// `Phi`: pointer hidden.
    PointerHide,
    /// `Psh`: pointer shown.
    PointerShow,
    /// `Bch`: brush tool changed.
    BrushChange,
    /// `Cch`: drawing color changed.
    ColorChange,
    /// `F`: flush pending drawing state.
    Flush,
    /// `Bo`: a canvas bitmap blob.
    Bitmap,
    /// An op token this client does not know.
    Unknown(String),
}

impl Op {
    /// Map an op token to its operation.
    pub fn from_token(token: &str) -> Self {
        match token {
            "Kp" => Op::Keypress,
            "Rq" => Op::BitmapRequest,
            "Pm" => Op::PointerMove,
            "Ps" => Op::PointerSize,
            "Pd" => Op::PointerDown,
            "Pu" => Op::PointerUp,
            "Phi" => Op::PointerHide,
            "Psh" => Op::PointerShow,
            "Bch" => Op::BrushChange,
            "Cch" => Op::ColorChange,
            "F" => Op::Flush,
            "Bo" => Op::Bitmap,
            _ => Op::Unknown(token.to_string()),
        }
    }

    /// The wire token for this operation.
    pub fn token(&self) -> &str {
        match self {
            Op::Keypress => "Kp",
            Op::BitmapRequest => "Rq",
            Op::PointerMove => "Pm",
            Op::PointerSize => "Ps",
            Op::PointerDown => "Pd",
            Op::PointerUp => "Pu",
            Op::PointerHide => "Phi",
            Op::PointerShow => "Psh",
            Op::BrushChange => "Bch",
            Op::ColorChange => "Cch",
            Op::Flush => "F",
            Op::Bitmap => "Bo",
            Op::Unknown(token) => token,
        }
    }
}

/// Join a command list into a deliver/broadcast payload.
pub fn encode_commands<S: AsRef<str>>(commands: &[S]) -> String {
    commands
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\t")
}

/// The join line sent once, immediately after connecting.
pub fn join_line(server: &str, whiteboard: &str, username: &str) -> String {
    format!("C whiteboard-http://{server}/{whiteboard} {username} {PROTOCOL_VERSION}")
}

/// A point-to-point delivery line.
pub fn deliver_line(user: &str, payload: &str) -> String {
    format!("D {user} {payload}")
}

/// A broadcast-to-all line.
pub fn broadcast_line(payload: &str) -> String {
    format!("B {payload}")
}
