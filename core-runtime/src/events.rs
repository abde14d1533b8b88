//! # Event Bus System
//!
//! Provides an event-driven architecture for the scrobble platform core
//! using `tokio::sync::broadcast`. This module enables decoupled
//! communication between the worker loop and its observers through typed
//! events.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for each domain
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! The worker loop is the single writer of [`AuthStatus`]; every status
//! mutation is broadcast as an [`AuthEvent::StatusChanged`] so hosts can
//! mirror the state into their UI without polling.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AuthEvent, AuthStatus, CoreEvent, EventBus};
//!
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Auth(AuthEvent::StatusChanged {
//!         status: AuthStatus::Ok,
//!     }))
//!     .ok();
//! ```
//!
//! ## Error Handling
//!
//! The event bus uses `tokio::sync::broadcast`, which can produce two
//! kinds of receive errors:
//!
//! - **`RecvError::Lagged(n)`**: the subscriber was too slow and missed
//!   `n` events. Non-fatal; the subscriber can continue.
//! - **`RecvError::Closed`**: all senders have been dropped, indicating
//!   shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall behind by more than this receive
/// `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Auth Status
// ============================================================================

/// Externally observable authentication state of the scrobble account.
///
/// Written exclusively by the worker loop; every mutation is broadcast on
/// the event bus as [`AuthEvent::StatusChanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// No credentials are configured (or they were cleared by the user).
    #[default]
    NoAuth,
    /// A user-initiated authentication handshake is in flight.
    Updating,
    /// The last handshake succeeded; a session is active.
    Ok,
    /// The service rejected the configured credentials.
    BadAuth,
    /// The last authentication attempt hit a temporary failure and will
    /// be retried after a backoff.
    RetryLater,
    /// The last handshake failed in an unclassified way; no automatic
    /// retry is scheduled.
    Failed,
}

impl AuthStatus {
    /// Check whether this status means a usable session exists.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Ok)
    }

    /// Check whether the status represents a failure the user has to
    /// resolve (as opposed to one the loop retries on its own).
    pub fn needs_user_action(&self) -> bool {
        matches!(self, AuthStatus::BadAuth | AuthStatus::Failed)
    }

    /// Get the string representation used in logs and serialized events.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStatus::NoAuth => "no_auth",
            AuthStatus::Updating => "updating",
            AuthStatus::Ok => "ok",
            AuthStatus::BadAuth => "bad_auth",
            AuthStatus::RetryLater => "retry_later",
            AuthStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Authentication-related events
    Auth(AuthEvent),
    /// Scrobble submission and now-playing events
    Scrobble(ScrobbleEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Scrobble(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::StatusChanged {
                status: AuthStatus::BadAuth | AuthStatus::Failed,
            }) => EventSeverity::Error,
            CoreEvent::Scrobble(ScrobbleEvent::SubmissionFailed { .. }) => EventSeverity::Error,
            CoreEvent::Auth(AuthEvent::StatusChanged {
                status: AuthStatus::Ok,
            }) => EventSeverity::Info,
            CoreEvent::Scrobble(ScrobbleEvent::BatchSubmitted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Events related to the scrobble session and account state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// The observable auth status changed (or was re-asserted).
    StatusChanged {
        /// The new status.
        status: AuthStatus,
    },
    /// The plaintext password was retired from the credential store after
    /// a successful handshake; the derived secret suffices from here on.
    CredentialsRetired,
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::StatusChanged { .. } => "Auth status changed",
            AuthEvent::CredentialsRetired => "Plaintext credentials retired",
        }
    }
}

// ============================================================================
// Scrobble Events
// ============================================================================

/// Events related to scrobble submission and now-playing notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ScrobbleEvent {
    /// A batch submission was accepted by the service.
    BatchSubmitted {
        /// Number of coalesced submit requests retired by this call.
        requests_drained: u32,
        /// Whether the collaborator reported unsent records remaining.
        more_remains: bool,
    },
    /// A now-playing notification was delivered.
    NowPlayingSent {
        /// Artist of the notified track.
        artist: String,
        /// Title of the notified track.
        title: String,
    },
    /// A transient failure scheduled a retry.
    RetryScheduled {
        /// Consecutive transient failures observed so far.
        consecutive_failures: u32,
        /// Backoff delay before the next automatic attempt, in seconds.
        delay_secs: u64,
    },
    /// An operation failed in a way that is not retried automatically.
    SubmissionFailed {
        /// Human-readable error message.
        message: String,
        /// Whether the triggering request is still pending and will be
        /// picked up on the next wakeup.
        recoverable: bool,
    },
}

impl ScrobbleEvent {
    fn description(&self) -> &str {
        match self {
            ScrobbleEvent::BatchSubmitted { .. } => "Scrobble batch submitted",
            ScrobbleEvent::NowPlayingSent { .. } => "Now-playing notification sent",
            ScrobbleEvent::RetryScheduled { .. } => "Retry scheduled",
            ScrobbleEvent::SubmissionFailed { .. } => "Submission failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all
    /// future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let auth_stream = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Auth(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream. Only events that match the
    /// filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by
    /// `n` events, `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
