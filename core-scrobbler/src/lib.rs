//! # Scrobble Coordination Core
//!
//! Serializes three competing classes of outbound work against a remote
//! scrobbling service: session establishment (handshake), batched
//! scrobble submission, and best-effort now-playing notification.
//!
//! ## Overview
//!
//! One background worker owns the session and the retry state; any number
//! of caller tasks post coalesced requests without ever blocking on
//! network activity. The worker waits on a condition (with an optional
//! backoff deadline), drains the requests in priority order - handshake
//! first, then submit, then notify - and classifies every capability
//! failure into retry, re-handshake, or surface-and-stop.
//!
//! ## Components
//!
//! - **Request Coalescing** (`requests`): the shared mailbox of pending work
//! - **Retry & Backoff** (`retry`): consecutive-failure tracking and delays
//! - **Worker Loop** (`worker`): the state machine draining the requests
//! - **Coordinator** (`coordinator`): public API and worker lifecycle
//! - **Configuration** (`config`): capability injection with fail-fast validation

pub mod config;
pub mod coordinator;
pub mod error;
pub mod requests;
pub mod retry;
mod worker;

pub use config::{ScrobblerConfig, ScrobblerConfigBuilder};
pub use coordinator::ScrobbleCoordinator;
pub use error::{Result, ScrobblerError};
pub use requests::RequestCoalescer;
pub use retry::{RetryPolicy, DEFAULT_BACKOFF_STEP, DEFAULT_REHANDSHAKE_THRESHOLD};

// Re-export the status vocabulary callers observe.
pub use core_runtime::events::AuthStatus;
