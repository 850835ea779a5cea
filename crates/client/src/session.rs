//! One whiteboard connection: outbound queue, inbound pump, and dispatch.

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use flockbot_proto::{
    codec, encoding, Command, Envelope, LineFramer, Op, PeerMessage, READ_CHUNK_SIZE,
};

use crate::bitmap::BitmapStore;
use crate::relay::BitmapRelay;
use crate::roster::Roster;
use crate::transport::Transport;

/// Parameters identifying the room being joined.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Server host, as named in the join line.
    pub server: String,
    /// Whiteboard (room) to join.
    pub whiteboard: String,
    /// Username to join as.
    pub username: String,
    /// Directory for bitmap dumps.
    pub dump_dir: PathBuf,
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport connected, join line not yet queued.
    Connecting,
    /// Join queued optimistically; normal traffic.
    Joined,
    /// Shutdown requested; flushing, then waiting for the peer's EOF.
    Draining,
    /// The transport reported end-of-input.
    Closed,
}

/// A joined whiteboard connection over one transport.
///
/// All mutation happens on the single dispatch path: `try_send` and
/// `try_receive` are alternated by the caller and never re-entered, so
/// the roster and the owed queue need no locking.
pub struct Session<T: Transport> {
    transport: T,
    state: SessionState,
    outbound: VecDeque<Vec<u8>>,
    framer: LineFramer,
    roster: Roster,
    relay: BitmapRelay,
    store: BitmapStore,
}

impl<T: Transport> Session<T> {
    /// Wrap a connected transport and queue the join line.
    ///
    /// Joining is optimistic: the session is `Joined` as soon as the line
    /// is queued, without waiting for any acknowledgement.
    pub fn new(transport: T, options: SessionOptions) -> Result<Self> {
        let mut session = Self {
            transport,
            state: SessionState::Connecting,
            outbound: VecDeque::new(),
            framer: LineFramer::new(),
            roster: Roster::new(),
            relay: BitmapRelay::new(),
            store: BitmapStore::new(&options.dump_dir, &options.whiteboard),
        };
        let join = codec::join_line(&options.server, &options.whiteboard, &options.username);
        session.send_line(&join)?;
        session.state = SessionState::Joined;
        Ok(session)
    }

    /// Queue one line for transmission, newline appended.
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        debug!("sending {line:?}");
        let mut frame = encoding::encode(line)
            .with_context(|| format!("cannot encode outbound line {line:?}"))?;
        frame.push(b'\n');
        self.outbound.push_back(frame);
        Ok(())
    }

    /// Queue a point-to-point delivery to `user`.
    pub fn deliver(&mut self, user: &str, payload: &str) -> Result<()> {
        self.send_line(&codec::deliver_line(user, payload))
    }

    /// Queue a broadcast to every peer.
    pub fn broadcast(&mut self, payload: &str) -> Result<()> {
        self.send_line(&codec::broadcast_line(payload))
    }

    /// Deliver a command list to `user`.
    pub fn deliver_commands<S: AsRef<str>>(&mut self, user: &str, commands: &[S]) -> Result<()> {
        self.deliver(user, &codec::encode_commands(commands))
    }

    /// Broadcast a command list to every peer.
    pub fn broadcast_commands<S: AsRef<str>>(&mut self, commands: &[S]) -> Result<()> {
        self.broadcast(&codec::encode_commands(commands))
    }

    /// Transmit queued frames until the transport stops accepting bytes.
    ///
    /// A partially accepted frame has its unsent suffix requeued at the
    /// head, so bytes leave in exactly the order they were queued; the
    /// next call resumes where this one stopped.
    pub async fn try_send(&mut self) -> Result<()> {
        while let Some(frame) = self.outbound.pop_front() {
            let written = self
                .transport
                .send(&frame)
                .await
                .context("transport write failed")?;
            if written < frame.len() {
                self.outbound.push_front(frame[written..].to_vec());
                break;
            }
        }
        Ok(())
    }

    /// Read one chunk and dispatch every line it completes, in order.
    ///
    /// Returns whether any bytes were read. An empty read is the peer's
    /// end-of-input and moves the session to `Closed`.
    pub async fn try_receive(&mut self) -> Result<bool> {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        let read = self
            .transport
            .recv(&mut buf)
            .await
            .context("transport read failed")?;
        if read == 0 {
            debug!("end of input from server");
            self.state = SessionState::Closed;
            return Ok(false);
        }
        for line in self.framer.append(&buf[..read]) {
            self.handle_line(&line)?;
        }
        Ok(true)
    }

    /// Ask a random peer for the canvas, without recording anyone as owed.
    ///
    /// Probe hook for the surrounding idle loop: keeps the session alive
    /// and verifies a peer is still reachable. Returns whether a request
    /// went out.
    pub fn try_obtain_bitmap(&mut self) -> Result<bool> {
        let picked = self.roster.pick_random(&[]).map(str::to_string);
        match picked {
            Some(peer) => {
                info!("requesting bitmap from {peer}");
                self.deliver(&peer, Op::BitmapRequest.token())?;
                Ok(true)
            }
            None => {
                warn!("no peer available to source a bitmap from");
                Ok(false)
            }
        }
    }

    /// Flush every queued frame to completion.
    pub async fn flush(&mut self) -> Result<()> {
        while !self.outbound.is_empty() {
            self.try_send().await?;
        }
        Ok(())
    }

    /// Orderly shutdown: flush, close the write half, drain to EOF.
    ///
    /// No queued frame is abandoned; the write half closes only after the
    /// whole outbound queue has been transmitted.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.state = SessionState::Draining;
        info!("draining session");
        self.flush().await?;
        self.transport
            .shutdown_write()
            .await
            .context("failed to close the write half")?;
        while self.try_receive().await? {}
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Result<()> {
        let envelope = match Envelope::parse(line) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("ignoring line: {err}");
                return Ok(());
            }
        };
        match envelope {
            Envelope::Add(username) => self
                .roster
                .add(&username)
                .context("further dispatch cannot be trusted")?,
            Envelope::Remove(username) => self.roster.remove(&username),
            Envelope::Message(PeerMessage { sender, commands }) => {
                for command in commands {
                    self.handle_command(&sender, command)?;
                }
            }
            Envelope::Notice => info!("whiteboard was freshly created"),
            Envelope::Unknown { tag, rest } => {
                warn!("ignoring line with unknown prefix {tag:?} (rest {rest:?})");
            }
        }
        Ok(())
    }

    fn handle_command(&mut self, origin: &str, command: Command) -> Result<()> {
        match command.op {
            Op::BitmapRequest => self.handle_bitmap_request(origin)?,
            Op::Bitmap => self.handle_bitmap(origin, command.arg.as_deref().unwrap_or(""))?,
            Op::Keypress => debug!("event: {origin} keypress {:?}", command.arg),
            Op::PointerMove => debug!("event: {origin} move {:?}", command.arg),
            Op::PointerSize => debug!("event: {origin} size {:?}", command.arg),
            Op::PointerDown => debug!("event: {origin} down {:?}", command.arg),
            Op::PointerUp => debug!("event: {origin} up {:?}", command.arg),
            Op::PointerHide => debug!("event: {origin} hide {:?}", command.arg),
            Op::PointerShow => debug!("event: {origin} show {:?}", command.arg),
            Op::BrushChange => debug!("event: {origin} tool {:?}", command.arg),
            Op::ColorChange => debug!("event: {origin} color {:?}", command.arg),
            Op::Flush => debug!("event: {origin} flush {:?}", command.arg),
            Op::Unknown(token) => warn!(
                "ignoring command {token:?} from {origin} (argument {:?})",
                command.arg
            ),
        }
        Ok(())
    }

    fn handle_bitmap_request(&mut self, origin: &str) -> Result<()> {
        if let Some(source) = self.relay.on_requested(origin, &self.roster) {
            self.deliver(&source, Op::BitmapRequest.token())?;
        }
        Ok(())
    }

    fn handle_bitmap(&mut self, origin: &str, payload: &str) -> Result<()> {
        let owed = self.relay.on_received();
        if !owed.is_empty() {
            let command = Command {
                op: Op::Bitmap,
                arg: Some(payload.to_string()),
            }
            .to_string();
            for peer in owed {
                info!("relaying bitmap to {peer}");
                self.deliver(&peer, &command)?;
            }
        }
        if let Err(err) = self.store.persist(origin, payload) {
            warn!("dropping bitmap dump from {origin}: {err}");
        }
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The peer roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Whether the room had peers and now has none.
    pub fn is_abandoned(&self) -> bool {
        self.roster.is_abandoned()
    }

    /// Number of bitmap deliveries currently owed.
    pub fn owed_bitmaps(&self) -> usize {
        self.relay.owed()
    }

    /// Whether outbound frames are still queued.
    pub fn has_queued_frames(&self) -> bool {
        !self.outbound.is_empty()
    }
}
