//! The nickname registry.
//!
//! Single source of truth for "who is online": a map from nickname to the
//! [`Sink`] of the session holding it. Every operation takes one lock for
//! its whole duration, so inserts, conditional removals and renames are
//! linearizable and a rename is never observed half-applied.
//!
//! The lock is a `parking_lot::Mutex` over a plain `HashMap` rather than a
//! sharded `DashMap`: a rename touches two keys that may live in different
//! shards, and those two writes must be one step. The lock is never held
//! across an `.await`.

use crate::state::SessionId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Failure to enqueue a line for another session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("session closed")]
    Closed,
    #[error("outbound queue full")]
    Full,
}

/// Write handle to one session's outbound queue.
///
/// Holding a `Sink` does not keep the session alive: once the owning session
/// ends, sends fail with [`SinkError::Closed`]. A client that stops reading
/// fills its queue and further sends fail with [`SinkError::Full`].
#[derive(Debug, Clone)]
pub struct Sink {
    owner: SessionId,
    tx: mpsc::Sender<Arc<str>>,
}

impl Sink {
    pub fn new(owner: SessionId, tx: mpsc::Sender<Arc<str>>) -> Self {
        Self { owner, tx }
    }

    /// The session this sink writes to.
    pub fn owner(&self) -> SessionId {
        self.owner
    }

    /// Queue a line without waiting. Senders never block on the owner.
    pub fn try_send(&self, line: impl Into<Arc<str>>) -> Result<(), SinkError> {
        self.tx.try_send(line.into()).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

/// Process-wide nickname → sink map.
#[derive(Debug, Default)]
pub struct NickRegistry {
    entries: Mutex<HashMap<String, Sink>>,
}

impl NickRegistry {
    /// Claim `nick` for `sink`. Returns `false` if the nickname is held.
    pub fn try_insert(&self, nick: &str, sink: &Sink) -> bool {
        match self.entries.lock().entry(nick.to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(sink.clone());
                true
            }
        }
    }

    /// Release `nick`, but only if `owner` still holds it.
    pub fn remove_if_owned_by(&self, nick: &str, owner: SessionId) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(nick) {
            Some(sink) if sink.owner() == owner => {
                entries.remove(nick);
                true
            }
            _ => false,
        }
    }

    /// Move `owner`'s entry from `old` to `new` in one step.
    ///
    /// Fails without changes when `new` is held by anyone (including
    /// `owner`) or when `old` is not held by `owner`.
    pub fn rename(&self, old: &str, new: &str, owner: SessionId) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains_key(new) {
            return false;
        }
        match entries.get(old) {
            Some(sink) if sink.owner() == owner => {}
            _ => return false,
        }
        match entries.remove(old) {
            Some(sink) => {
                entries.insert(new.to_owned(), sink);
                true
            }
            None => false,
        }
    }

    /// The sink currently registered under `nick`.
    pub fn lookup(&self, nick: &str) -> Option<Sink> {
        self.entries.lock().get(nick).cloned()
    }

    #[cfg(test)]
    pub fn contains(&self, nick: &str) -> bool {
        self.entries.lock().contains_key(nick)
    }

    /// Consistent copy of every entry, sorted by nickname.
    pub fn snapshot(&self) -> Vec<(String, Sink)> {
        let mut entries: Vec<_> = self
            .entries
            .lock()
            .iter()
            .map(|(nick, sink)| (nick.clone(), sink.clone()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Drop every entry, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
