//! The peer roster for the joined whiteboard.

use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while maintaining the roster.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    /// Usernames are space-delimited on the wire, so a name containing a
    /// space means the stream can no longer be parsed reliably.
    #[error("peer name {0:?} contains a space; the stream is corrupted")]
    CorruptName(String),
}

/// Peers currently present on the whiteboard.
///
/// `had_users` is a one-way latch: once any peer has been seen, an empty
/// roster means the room was abandoned rather than never populated.
#[derive(Debug, Default)]
pub struct Roster {
    users: Vec<String>,
    had_users: bool,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a peer joining.
    ///
    /// Fails on a space-containing name, fatal for the session: the
    /// wire-level naming contract is already broken at that point. A name
    /// already present is skipped with a warning, like a redundant leave.
    pub fn add(&mut self, username: &str) -> Result<(), RosterError> {
        if username.contains(' ') {
            return Err(RosterError::CorruptName(username.to_string()));
        }
        if self.users.iter().any(|user| user == username) {
            warn!("peer {username} joined twice; keeping the first entry");
        } else {
            info!("new peer: {username}");
            self.users.push(username.to_string());
        }
        self.had_users = true;
        Ok(())
    }

    /// Record a peer leaving.
    ///
    /// Redundant leave notifications are expected protocol traffic, so an
    /// unknown name is only warned about.
    pub fn remove(&mut self, username: &str) {
        match self.users.iter().position(|user| user == username) {
            Some(index) => {
                self.users.remove(index);
                info!("peer leaving: {username}");
            }
            None => warn!("unknown peer {username} leaving"),
        }
    }

    /// Whether the room had peers at some point and now has none.
    pub fn is_abandoned(&self) -> bool {
        self.had_users && self.users.is_empty()
    }

    /// Pick a peer uniformly at random, skipping the excluded names.
    pub fn pick_random(&self, exclude: &[&str]) -> Option<&str> {
        let candidates: Vec<&String> = self
            .users
            .iter()
            .filter(|user| !exclude.contains(&user.as_str()))
            .collect();
        candidates
            .choose(&mut rand::thread_rng())
            .map(|user| user.as_str())
    }

    /// Number of peers present.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no peers are present.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Whether the named peer is present.
    pub fn contains(&self, username: &str) -> bool {
        self.users.iter().any(|user| user == username)
    }
}
