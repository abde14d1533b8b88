//! Protocol Capability Traits
//!
//! The three outbound operations the coordination core serializes:
//! handshake, batch submit, and now-playing notify.

use crate::error::Result;
use crate::track::Track;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection parameters returned by a successful handshake.
///
/// Opaque to the coordination core: it only holds the value and passes it
/// back to the session-bound capabilities. The session key is a secret;
/// the `Debug` implementation redacts it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session key authorizing submit/notify calls
    pub session_key: String,
    /// Endpoint accepting now-playing notifications
    pub now_playing_url: String,
    /// Endpoint accepting scrobble submissions
    pub submission_url: String,
}

impl SessionInfo {
    pub fn new(
        session_key: impl Into<String>,
        now_playing_url: impl Into<String>,
        submission_url: impl Into<String>,
    ) -> Self {
        Self {
            session_key: session_key.into(),
            now_playing_url: now_playing_url.into(),
            submission_url: submission_url.into(),
        }
    }
}

// Custom Debug implementation to avoid logging the session key
impl fmt::Debug for SessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionInfo")
            .field("session_key", &"[REDACTED]")
            .field("now_playing_url", &self.now_playing_url)
            .field("submission_url", &self.submission_url)
            .finish()
    }
}

/// Result of one batch-submit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Everything the collaborator had queued at call time was accepted.
    Complete,
    /// A partial batch was accepted and unsent records remain; the caller
    /// should submit again.
    MoreRemains,
}

/// Session establishment with the remote service.
///
/// Implementations read stored credentials themselves; the core only asks
/// for a session and classifies the outcome.
///
/// # Example
///
/// ```ignore
/// use client_traits::{Handshaker, SessionInfo};
///
/// async fn connect(handshaker: &dyn Handshaker) -> Option<SessionInfo> {
///     handshaker.handshake().await.ok()
/// }
/// ```
#[async_trait::async_trait]
pub trait Handshaker: Send + Sync {
    /// Perform the handshake exchange, yielding a usable session or a
    /// classified failure.
    async fn handshake(&self) -> Result<SessionInfo>;
}

/// Batched submission of previously recorded scrobbles.
///
/// The backlog of records lives with the implementation (typically a
/// local database); the core only signals *that* a flush is wanted and
/// reacts to the classified outcome.
#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    /// Submit the next batch of queued records using `session`.
    ///
    /// Returns [`SubmitOutcome::MoreRemains`] when a partial batch was
    /// committed and another call is needed to drain the backlog.
    async fn submit_batch(&self, session: &SessionInfo) -> Result<SubmitOutcome>;
}

/// Best-effort notification of the currently playing track.
#[async_trait::async_trait]
pub trait NowPlayingNotifier: Send + Sync {
    /// Notify the service that `track` is playing now, using `session`.
    async fn notify_now_playing(&self, session: &SessionInfo, track: &Track) -> Result<()>;
}
