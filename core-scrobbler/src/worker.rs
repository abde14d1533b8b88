//! # Worker Loop
//!
//! The single background task that serializes handshake, submit, and
//! now-playing calls against one shared, possibly-invalid session.
//!
//! ## Iteration shape
//!
//! Each pass through the loop has four phases:
//!
//! 1. **Wait** - block until a caller signals work, or until the backoff
//!    deadline passes. A timed wait that ends (for either reason) turns
//!    into a non-auth handshake request, so a backed-off loop heartbeats
//!    through the handshake rather than hammering a failing action.
//! 2. **Handshake** - drained first; it invalidates the current session
//!    before the exchange, and nothing else runs in a pass whose
//!    handshake did not succeed.
//! 3. **Submit** - runs only with a live session; without one it converts
//!    itself into a handshake request and stays pending.
//! 4. **Notify** - same session rule; failed subjects are re-posted so
//!    they survive a reconnect, except for serious failures where the
//!    notification is best-effort and dropped.
//!
//! Failure kinds from the capabilities are matched exhaustively; see the
//! per-phase handlers for the exact policy.

use crate::coordinator::Shared;
use crate::retry::RetryScheduler;
use client_traits::{
    store::keys, ApiError, CredentialStore, Handshaker, NowPlayingNotifier, SessionInfo,
    SubmitOutcome, Submitter, Track,
};
use core_runtime::events::{AuthEvent, AuthStatus, CoreEvent, ScrobbleEvent};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub(crate) struct Worker {
    shared: Arc<Shared>,
    handshaker: Arc<dyn Handshaker>,
    submitter: Arc<dyn Submitter>,
    notifier: Arc<dyn NowPlayingNotifier>,
    credentials: Arc<dyn CredentialStore>,
    retry: RetryScheduler,
    /// The active session. `None` means submit/notify must first turn
    /// themselves into a handshake request.
    session: Option<SessionInfo>,
}

impl Worker {
    pub(crate) fn new(
        shared: Arc<Shared>,
        handshaker: Arc<dyn Handshaker>,
        submitter: Arc<dyn Submitter>,
        notifier: Arc<dyn NowPlayingNotifier>,
        credentials: Arc<dyn CredentialStore>,
        retry: RetryScheduler,
    ) -> Self {
        Self {
            shared,
            handshaker,
            submitter,
            notifier,
            credentials,
            retry,
            session: None,
        }
    }

    pub(crate) async fn run(mut self, cancel: CancellationToken) {
        loop {
            if !self.wait_for_work(&cancel).await {
                debug!("worker cancelled");
                return;
            }

            // Handshake requests always win over submit/notify within a
            // pass, and a pass whose handshake failed does nothing else.
            if let Some(is_auth) = self.shared.requests.take_handshake() {
                if !self.do_handshake(is_auth).await {
                    continue;
                }
            }

            let in_flight = self.shared.requests.submit_count();
            if in_flight > 0 {
                if self.session.is_some() {
                    self.do_submit(in_flight).await;
                } else {
                    // Want to submit but have no session: rebuild it and
                    // leave the count pending for the next pass.
                    self.shared.requests.request_handshake(false);
                }
            }

            if self.shared.requests.has_now_playing() {
                if self.session.is_some() {
                    if let Some(track) = self.shared.requests.take_now_playing() {
                        self.do_notify(track).await;
                    }
                } else {
                    self.shared.requests.request_handshake(false);
                }
            }
        }
    }

    /// Block until there is work to act on. Returns `false` on
    /// cancellation.
    async fn wait_for_work(&mut self, cancel: &CancellationToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }

            // Register the wakeup before inspecting state so a request
            // landing in between cannot be missed. Enabling also consumes
            // any permit left over from a request this loop already
            // drained; such a permit must not cut a backoff wait short.
            let notified = self.shared.requests.notified();
            tokio::pin!(notified);
            let pre_signalled = notified.as_mut().enable();

            let deadline = self.retry.next_deadline();
            let wants_handshake = self.shared.requests.handshake_pending();
            let wants_session_work = self.shared.requests.session_work_pending();

            // A pending handshake proceeds even mid-backoff; other work
            // proceeds only when no backoff is in force.
            if wants_handshake || (deadline.is_none() && wants_session_work) {
                return true;
            }

            if pre_signalled {
                // Stale permit with nothing new to act on; arm a fresh
                // wait.
                continue;
            }

            match deadline {
                Some(delay) => {
                    debug!(delay_secs = delay.as_secs(), "backing off");
                    tokio::select! {
                        _ = cancel.cancelled() => return false,
                        _ = tokio::time::timeout(delay, notified) => {
                            // Expired or woken early: either way the next
                            // pass opens with a fresh handshake attempt.
                            self.shared.requests.request_handshake(false);
                            return true;
                        }
                    }
                }
                None => {
                    tokio::select! {
                        _ = cancel.cancelled() => return false,
                        _ = notified => {}
                    }
                }
            }
        }
    }

    /// Perform a drained handshake request. Returns `true` when the rest
    /// of the pass may proceed with the new session.
    async fn do_handshake(&mut self, is_auth: bool) -> bool {
        // The old session is dead the moment a handshake was requested.
        self.session = None;

        if is_auth {
            self.shared.publish_status(AuthStatus::Updating);
        }

        match self.handshaker.handshake().await {
            Ok(info) => {
                info!("handshake succeeded");
                self.session = Some(info);
                self.retry.on_success();
                self.retire_plaintext_password().await;
                self.shared.publish_status(AuthStatus::Ok);
                // Flush whatever a previous bad session left queued.
                self.shared.requests.request_submit();
                true
            }
            Err(ApiError::BadCredentials) => {
                if is_auth {
                    self.shared.publish_status(AuthStatus::BadAuth);
                } else {
                    // A background handshake hitting bad credentials
                    // means the user cleared them in the meantime.
                    self.shared.publish_status(AuthStatus::NoAuth);
                }
                // No session will exist to act on these signals; the
                // durable backlog stays with its owner.
                self.shared.requests.clear_session_work();
                false
            }
            Err(err @ (ApiError::StaleSession | ApiError::Transient(_))) => {
                info!(error = %err, "handshake hit a temporary failure");
                self.schedule_retry();
                if is_auth {
                    self.shared.publish_status(AuthStatus::RetryLater);
                }
                false
            }
            Err(ApiError::Failure(message)) => {
                error!(%message, "serious failure while handshaking");
                self.shared.publish_status(AuthStatus::Failed);
                false
            }
        }
    }

    /// One submit pass covering `in_flight` coalesced requests.
    async fn do_submit(&mut self, in_flight: u32) {
        let Some(session) = self.session.clone() else {
            error!("submit attempted without a session");
            self.shared.requests.request_handshake(false);
            return;
        };

        match self.submitter.submit_batch(&session).await {
            Ok(SubmitOutcome::Complete) => {
                debug!(in_flight, "scrobble batch complete");
                // Retire only what was pending when this call began;
                // requests that raced in stay pending.
                self.shared.requests.reduce_submit_count(in_flight);
                self.shared
                    .emit(CoreEvent::Scrobble(ScrobbleEvent::BatchSubmitted {
                        requests_drained: in_flight,
                        more_remains: false,
                    }));
            }
            Ok(SubmitOutcome::MoreRemains) => {
                // Partial commit; the count stays so the next pass
                // reattempts with the live count.
                debug!("partial batch committed, more records remain");
                self.shared
                    .emit(CoreEvent::Scrobble(ScrobbleEvent::BatchSubmitted {
                        requests_drained: 0,
                        more_remains: true,
                    }));
            }
            Err(ApiError::StaleSession | ApiError::BadCredentials) => {
                info!("session rejected while scrobbling, re-handshaking");
                // Count untouched: the request is retried after reconnect.
                self.shared.requests.request_handshake(false);
            }
            Err(ApiError::Transient(message)) => {
                info!(%message, "temporary failure while scrobbling");
                self.schedule_action_retry();
            }
            Err(ApiError::Failure(message)) => {
                error!(%message, "serious failure while scrobbling");
                // Count untouched; picked up again on the next wakeup.
                self.shared
                    .emit(CoreEvent::Scrobble(ScrobbleEvent::SubmissionFailed {
                        message,
                        recoverable: true,
                    }));
            }
        }
    }

    /// Deliver a drained now-playing subject.
    async fn do_notify(&mut self, track: Track) {
        let Some(session) = self.session.clone() else {
            error!("now-playing attempted without a session");
            self.shared.requests.request_handshake(false);
            self.shared.requests.request_notify(track);
            return;
        };

        match self.notifier.notify_now_playing(&session, &track).await {
            Ok(()) => {
                debug!(%track, "now-playing delivered");
                self.shared
                    .emit(CoreEvent::Scrobble(ScrobbleEvent::NowPlayingSent {
                        artist: track.artist,
                        title: track.title,
                    }));
            }
            Err(ApiError::StaleSession | ApiError::BadCredentials) => {
                info!("session rejected while notifying, re-handshaking");
                self.shared.requests.request_handshake(false);
                // Keep the subject alive across the reconnect.
                self.shared.requests.request_notify(track);
            }
            Err(ApiError::Transient(message)) => {
                info!(%message, "temporary failure while notifying");
                self.schedule_action_retry();
                self.shared.requests.request_notify(track);
            }
            Err(ApiError::Failure(message)) => {
                // Best-effort: the subject is dropped.
                error!(%message, "serious failure while notifying now-playing");
                self.shared
                    .emit(CoreEvent::Scrobble(ScrobbleEvent::SubmissionFailed {
                        message,
                        recoverable: false,
                    }));
            }
        }
    }

    /// Record a transient failure and announce the resulting backoff.
    fn schedule_retry(&mut self) {
        self.retry.on_transient_failure();
        self.shared
            .emit(CoreEvent::Scrobble(ScrobbleEvent::RetryScheduled {
                consecutive_failures: self.retry.consecutive_failures(),
                delay_secs: self.retry.backoff().as_secs(),
            }));
    }

    /// Like [`schedule_retry`](Self::schedule_retry), but for submit and
    /// notify failures: a long enough streak presumes the session stale
    /// and rebuilds it instead of retrying the action forever.
    fn schedule_action_retry(&mut self) {
        self.schedule_retry();
        if self.retry.should_force_rehandshake() {
            info!(
                consecutive_failures = self.retry.consecutive_failures(),
                "failure streak reached threshold, forcing re-handshake"
            );
            self.shared.requests.request_handshake(false);
        }
    }

    /// Drop the stored plaintext password once a session exists; the
    /// derived digest is all later handshakes need.
    async fn retire_plaintext_password(&self) {
        match self.credentials.delete_secret(keys::PLAINTEXT_PASSWORD).await {
            Ok(()) => self
                .shared
                .emit(CoreEvent::Auth(AuthEvent::CredentialsRetired)),
            Err(e) => warn!(error = %e, "failed to retire plaintext password"),
        }
    }
}
