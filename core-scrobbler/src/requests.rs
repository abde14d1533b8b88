//! # Request Coalescing
//!
//! Shared mutable record of what work callers have asked the worker loop
//! to do: a pending handshake, a number of submit passes, and at most one
//! now-playing subject.
//!
//! ## Overview
//!
//! Any number of caller tasks post requests concurrently; the worker is
//! the only drainer. Requests coalesce rather than queue:
//!
//! - Handshake requests collapse into one, with the auth flag sticky
//!   until drained.
//! - Submit requests are a counter, not a queue of identities; the actual
//!   backlog of records lives with the submitter.
//! - Now-playing requests keep only the subject with the latest
//!   timestamp; racing requests for older listens are silently dropped.
//!
//! All state transitions happen under one mutex, and every mutation that
//! can make [`has_work`](RequestCoalescer::has_work) true signals the
//! worker's wakeup. The capability calls themselves never run under this
//! lock, so callers only ever contend for the few instructions it takes
//! to flip a flag.

use client_traits::Track;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// Coalesced request flags, guarded by [`RequestCoalescer`]'s mutex.
#[derive(Debug, Default)]
struct PendingRequests {
    handshake_requested: bool,
    handshake_is_auth: bool,
    submit_count: u32,
    now_playing: Option<Track>,
}

impl PendingRequests {
    fn has_work(&self) -> bool {
        self.handshake_requested || self.submit_count > 0 || self.now_playing.is_some()
    }
}

/// Shared mailbox between caller tasks and the worker loop.
#[derive(Debug, Default)]
pub struct RequestCoalescer {
    pending: Mutex<PendingRequests>,
    notify: Notify,
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PendingRequests> {
        // The guarded section never panics; recover rather than poison
        // every caller forever.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask for a handshake. `is_auth` marks a user-initiated
    /// (re-)authentication; the flag is sticky across coalesced requests
    /// until the worker drains them as one.
    pub fn request_handshake(&self, is_auth: bool) {
        {
            let mut pending = self.lock();
            pending.handshake_requested = true;
            pending.handshake_is_auth |= is_auth;
        }
        self.notify.notify_one();
    }

    /// Ask for one submit pass. The count may transiently overstate the
    /// true backlog but never understates it.
    pub fn request_submit(&self) {
        {
            let mut pending = self.lock();
            pending.submit_count = pending.submit_count.saturating_add(1);
        }
        self.notify.notify_one();
    }

    /// Ask for a now-playing notification. Latest listen wins: the
    /// pending subject is replaced unless it has a strictly later
    /// timestamp than `track`.
    pub fn request_notify(&self, track: Track) {
        {
            let mut pending = self.lock();
            let keep_existing = pending
                .now_playing
                .as_ref()
                .is_some_and(|existing| existing.started_at > track.started_at);
            if !keep_existing {
                pending.now_playing = Some(track);
            }
        }
        self.notify.notify_one();
    }

    /// Whether anything at all has been requested.
    pub fn has_work(&self) -> bool {
        self.lock().has_work()
    }

    /// Current number of coalesced submit requests.
    pub fn submit_count(&self) -> u32 {
        self.lock().submit_count
    }

    /// Atomically read and clear the handshake request. Returns the
    /// sticky auth flag when a handshake was pending.
    pub(crate) fn take_handshake(&self) -> Option<bool> {
        let mut pending = self.lock();
        if !pending.handshake_requested {
            return None;
        }
        pending.handshake_requested = false;
        Some(std::mem::take(&mut pending.handshake_is_auth))
    }

    /// Retire `n` submit requests once the pass that covered them
    /// completed. Requests that arrived while the pass was in flight are
    /// preserved; the count never goes below zero.
    pub(crate) fn reduce_submit_count(&self, n: u32) {
        let mut pending = self.lock();
        pending.submit_count = pending.submit_count.saturating_sub(n);
    }

    /// Atomically read and clear the pending now-playing subject.
    pub(crate) fn take_now_playing(&self) -> Option<Track> {
        self.lock().now_playing.take()
    }

    /// Whether a now-playing subject is pending.
    pub(crate) fn has_now_playing(&self) -> bool {
        self.lock().now_playing.is_some()
    }

    /// Whether a handshake is pending.
    pub(crate) fn handshake_pending(&self) -> bool {
        self.lock().handshake_requested
    }

    /// Whether session-bound work (submit or notify) is pending.
    pub(crate) fn session_work_pending(&self) -> bool {
        let pending = self.lock();
        pending.submit_count > 0 || pending.now_playing.is_some()
    }

    /// Drop all session-bound request signals. Used when a bad-auth
    /// result means no session will exist to act on them; the durable
    /// backlog itself stays with its owner and is flushed after the user
    /// re-authenticates.
    pub(crate) fn clear_session_work(&self) {
        let mut pending = self.lock();
        pending.submit_count = 0;
        pending.now_playing = None;
    }

    /// Future that resolves when a caller signals new work. A signal sent
    /// while nobody waits is stored, so checking state first and awaiting
    /// afterwards cannot miss a wakeup.
    pub(crate) fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }
}
