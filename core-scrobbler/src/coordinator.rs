//! # Scrobble Coordinator
//!
//! Public surface of the coordination core: callers post coalesced
//! requests here, and a single background worker drains them against the
//! remote service.
//!
//! ## Overview
//!
//! The `ScrobbleCoordinator` owns the shared request state and the worker
//! lifecycle. It coordinates between:
//! - Caller tasks posting handshake/submit/now-playing requests
//! - The [`worker loop`](crate::worker) serializing the protocol calls
//! - Observers consuming status and progress events via the `EventBus`
//!
//! ## Workflow
//!
//! 1. Build a [`ScrobblerConfig`] with the protocol capabilities
//! 2. Create the coordinator and call [`start`](ScrobbleCoordinator::start)
//! 3. Post requests from anywhere; they coalesce and wake the worker
//! 4. Subscribe to the event bus for `AuthStatus` transitions
//! 5. Call [`shutdown`](ScrobbleCoordinator::shutdown) on teardown
//!
//! ## Usage
//!
//! ```ignore
//! use core_scrobbler::{ScrobbleCoordinator, ScrobblerConfig};
//!
//! # async fn example(config: ScrobblerConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = ScrobbleCoordinator::new(config);
//! coordinator.start()?;
//!
//! coordinator.request_handshake(true);
//! coordinator.request_submit();
//!
//! coordinator.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::ScrobblerConfig;
use crate::error::{Result, ScrobblerError};
use crate::requests::RequestCoalescer;
use crate::retry::RetryScheduler;
use crate::worker::Worker;
use client_traits::Track;
use core_runtime::events::{AuthEvent, AuthStatus, CoreEvent, EventBus, Receiver};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// State shared between the coordinator and its worker task.
pub(crate) struct Shared {
    /// Coalesced caller requests plus the worker wakeup
    pub(crate) requests: RequestCoalescer,

    /// Externally observable auth state, written only by the worker
    status: RwLock<AuthStatus>,

    /// Event bus for status and progress events
    pub(crate) event_bus: EventBus,
}

impl Shared {
    fn new(event_bus: EventBus) -> Self {
        Self {
            requests: RequestCoalescer::new(),
            status: RwLock::new(AuthStatus::default()),
            event_bus,
        }
    }

    pub(crate) fn auth_status(&self) -> AuthStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a status mutation and broadcast it. Re-assertions of the
    /// same value are broadcast too; observers rely on the signal, not on
    /// a diff.
    pub(crate) fn publish_status(&self, status: AuthStatus) {
        debug!(%status, "auth status updated");
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
        self.emit(CoreEvent::Auth(AuthEvent::StatusChanged { status }));
    }

    pub(crate) fn emit(&self, event: CoreEvent) {
        // No subscribers is fine; events are best-effort.
        self.event_bus.emit(event).ok();
    }
}

/// Coordinator for the background scrobble worker.
///
/// All request methods are cheap and safe to call from any task or
/// thread: they briefly take one mutex to flip a flag and wake the
/// worker. No network activity ever happens on the caller's side of the
/// fence.
pub struct ScrobbleCoordinator {
    shared: Arc<Shared>,
    config: ScrobblerConfig,
    cancellation_token: CancellationToken,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ScrobbleCoordinator {
    /// Create a new coordinator from a validated configuration.
    ///
    /// The worker does not run until [`start`](Self::start) is called.
    pub fn new(config: ScrobblerConfig) -> Self {
        let shared = Arc::new(Shared::new(config.event_bus.clone()));
        Self {
            shared,
            config,
            cancellation_token: CancellationToken::new(),
            worker_handle: Mutex::new(None),
        }
    }

    /// Spawn the worker task. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ScrobblerError::AlreadyRunning`] if the worker was
    /// already started, [`ScrobblerError::ShutDown`] after `shutdown`.
    pub fn start(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(ScrobblerError::ShutDown);
        }

        let mut handle = self
            .worker_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if handle.is_some() {
            return Err(ScrobblerError::AlreadyRunning);
        }

        let worker = Worker::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.config.handshaker),
            Arc::clone(&self.config.submitter),
            Arc::clone(&self.config.notifier),
            Arc::clone(&self.config.credential_store),
            RetryScheduler::new(self.config.retry_policy.clone()),
        );

        *handle = Some(tokio::spawn(
            worker.run(self.cancellation_token.clone()),
        ));
        info!("scrobble worker started");
        Ok(())
    }

    /// Stop the worker and wait for it to finish its current step.
    ///
    /// # Errors
    ///
    /// Returns [`ScrobblerError::NotRunning`] if the worker was never
    /// started or was already shut down.
    pub async fn shutdown(&self) -> Result<()> {
        let handle = self
            .worker_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ScrobblerError::NotRunning)?;

        self.cancellation_token.cancel();
        if let Err(e) = handle.await {
            error!(error = %e, "worker task ended abnormally");
        }
        info!("scrobble worker stopped");
        Ok(())
    }

    /// Ask the worker to (re-)establish a session.
    ///
    /// `is_auth` marks a user-initiated authentication: its progress and
    /// outcome are surfaced through `Updating`/`Ok`/`BadAuth`/`RetryLater`
    /// status transitions.
    pub fn request_handshake(&self, is_auth: bool) {
        self.shared.requests.request_handshake(is_auth);
    }

    /// Tell the worker the user wiped the stored credentials.
    ///
    /// Equivalent to `request_handshake(false)`: the next handshake fails
    /// with bad credentials against the now-empty store, which drives the
    /// status to `NoAuth` and drops pending session-bound work.
    pub fn request_cleared_credentials(&self) {
        self.request_handshake(false);
    }

    /// Ask the worker to flush the queued scrobble backlog.
    pub fn request_submit(&self) {
        self.shared.requests.request_submit();
    }

    /// Ask the worker to notify the service that `track` is playing.
    ///
    /// Best effort and latest-wins: if another notification with a later
    /// listen timestamp is pending, this one is dropped silently.
    pub fn request_now_playing(&self, track: Track) {
        self.shared.requests.request_notify(track);
    }

    /// Current externally observable auth status.
    pub fn auth_status(&self) -> AuthStatus {
        self.shared.auth_status()
    }

    /// Number of coalesced submit requests not yet retired.
    pub fn pending_submit_requests(&self) -> u32 {
        self.shared.requests.submit_count()
    }

    /// Subscribe to status and progress events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.shared.event_bus.subscribe()
    }

    /// The event bus the coordinator publishes on.
    pub fn event_bus(&self) -> &EventBus {
        &self.shared.event_bus
    }
}

impl std::fmt::Debug for ScrobbleCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrobbleCoordinator")
            .field("auth_status", &self.auth_status())
            .field("cancelled", &self.cancellation_token.is_cancelled())
            .finish()
    }
}
