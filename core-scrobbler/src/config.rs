//! # Scrobbler Configuration
//!
//! Builder for wiring the coordination core to its protocol capabilities.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`ScrobblerConfig`] holding the injected capabilities and retry policy.
//! It enforces fail-fast validation so a missing capability surfaces as an
//! actionable error at construction time rather than a panic deep inside
//! the worker loop.
//!
//! ## Required Dependencies
//!
//! - [`Handshaker`] - session establishment
//! - [`Submitter`] - scrobble batch submission
//! - [`NowPlayingNotifier`] - now-playing notification
//! - [`CredentialStore`] - credential persistence
//!
//! ## Usage
//!
//! ```ignore
//! use core_scrobbler::config::ScrobblerConfig;
//! use std::sync::Arc;
//!
//! let config = ScrobblerConfig::builder()
//!     .handshaker(Arc::new(MyHandshaker))
//!     .submitter(Arc::new(MySubmitter))
//!     .notifier(Arc::new(MyNotifier))
//!     .credential_store(Arc::new(MyStore))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Result, ScrobblerError};
use crate::retry::RetryPolicy;
use client_traits::{CredentialStore, Handshaker, NowPlayingNotifier, Submitter};
use core_runtime::events::EventBus;
use std::sync::Arc;

/// Configuration for a [`ScrobbleCoordinator`](crate::ScrobbleCoordinator).
///
/// Use [`ScrobblerConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct ScrobblerConfig {
    /// Session establishment capability (required)
    pub handshaker: Arc<dyn Handshaker>,

    /// Batch submission capability (required)
    pub submitter: Arc<dyn Submitter>,

    /// Now-playing notification capability (required)
    pub notifier: Arc<dyn NowPlayingNotifier>,

    /// Secure credential storage (required)
    pub credential_store: Arc<dyn CredentialStore>,

    /// Event bus carrying status and progress events
    pub event_bus: EventBus,

    /// Retry and backoff behavior
    pub retry_policy: RetryPolicy,
}

impl std::fmt::Debug for ScrobblerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrobblerConfig")
            .field("handshaker", &"Handshaker { ... }")
            .field("submitter", &"Submitter { ... }")
            .field("notifier", &"NowPlayingNotifier { ... }")
            .field("credential_store", &"CredentialStore { ... }")
            .field("event_bus", &self.event_bus)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl ScrobblerConfig {
    /// Creates a new builder for constructing a `ScrobblerConfig`.
    pub fn builder() -> ScrobblerConfigBuilder {
        ScrobblerConfigBuilder::default()
    }
}

fn capability_missing(capability: &str, hint: &str) -> ScrobblerError {
    ScrobblerError::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required. {}",
            capability, hint
        ),
    }
}

/// Builder for constructing [`ScrobblerConfig`] instances.
#[derive(Default)]
pub struct ScrobblerConfigBuilder {
    handshaker: Option<Arc<dyn Handshaker>>,
    submitter: Option<Arc<dyn Submitter>>,
    notifier: Option<Arc<dyn NowPlayingNotifier>>,
    credential_store: Option<Arc<dyn CredentialStore>>,
    event_bus: Option<EventBus>,
    retry_policy: Option<RetryPolicy>,
}

impl ScrobblerConfigBuilder {
    /// Sets the session establishment capability (required).
    pub fn handshaker(mut self, handshaker: Arc<dyn Handshaker>) -> Self {
        self.handshaker = Some(handshaker);
        self
    }

    /// Sets the batch submission capability (required).
    pub fn submitter(mut self, submitter: Arc<dyn Submitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    /// Sets the now-playing notification capability (required).
    pub fn notifier(mut self, notifier: Arc<dyn NowPlayingNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the credential store (required).
    ///
    /// The worker retires plaintext credential material here after a
    /// successful handshake.
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credential_store = Some(store);
        self
    }

    /// Sets the event bus. A fresh bus with the default buffer size is
    /// created when none is supplied.
    pub fn event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Sets the retry policy. Defaults to linear 5-second steps, no
    /// ceiling, re-handshake after 3 consecutive failures.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Builds the final `ScrobblerConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the missing capability, or a
    /// [`ScrobblerError::Config`] when the retry policy is invalid.
    pub fn build(self) -> Result<ScrobblerConfig> {
        let handshaker = self.handshaker.ok_or_else(|| {
            capability_missing(
                "Handshaker",
                "Inject the protocol client that performs the session handshake.",
            )
        })?;

        let submitter = self.submitter.ok_or_else(|| {
            capability_missing(
                "Submitter",
                "Inject the protocol client that flushes queued scrobbles.",
            )
        })?;

        let notifier = self.notifier.ok_or_else(|| {
            capability_missing(
                "NowPlayingNotifier",
                "Inject the protocol client that posts now-playing notifications.",
            )
        })?;

        let credential_store = self.credential_store.ok_or_else(|| {
            capability_missing(
                "CredentialStore",
                "Inject platform-appropriate secure storage (Keychain/Keystore).",
            )
        })?;

        let retry_policy = self.retry_policy.unwrap_or_default();
        retry_policy
            .validate()
            .map_err(ScrobblerError::Config)?;

        Ok(ScrobblerConfig {
            handshaker,
            submitter,
            notifier,
            credential_store,
            event_bus: self.event_bus.unwrap_or_default(),
            retry_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_traits::{
        ApiError, SessionInfo, StoreError, SubmitOutcome, Track,
    };
    use std::time::Duration;

    struct StubHandshaker;

    #[async_trait::async_trait]
    impl Handshaker for StubHandshaker {
        async fn handshake(&self) -> client_traits::error::Result<SessionInfo> {
            Err(ApiError::Transient("stub".to_string()))
        }
    }

    struct StubSubmitter;

    #[async_trait::async_trait]
    impl Submitter for StubSubmitter {
        async fn submit_batch(
            &self,
            _session: &SessionInfo,
        ) -> client_traits::error::Result<SubmitOutcome> {
            Ok(SubmitOutcome::Complete)
        }
    }

    struct StubNotifier;

    #[async_trait::async_trait]
    impl NowPlayingNotifier for StubNotifier {
        async fn notify_now_playing(
            &self,
            _session: &SessionInfo,
            _track: &Track,
        ) -> client_traits::error::Result<()> {
            Ok(())
        }
    }

    struct StubStore;

    #[async_trait::async_trait]
    impl CredentialStore for StubStore {
        async fn set_secret(
            &self,
            _key: &str,
            _value: &[u8],
        ) -> std::result::Result<(), StoreError> {
            Ok(())
        }

        async fn get_secret(
            &self,
            _key: &str,
        ) -> std::result::Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        async fn delete_secret(&self, _key: &str) -> std::result::Result<(), StoreError> {
            Ok(())
        }

        async fn clear_all(&self) -> std::result::Result<(), StoreError> {
            Ok(())
        }
    }

    fn full_builder() -> ScrobblerConfigBuilder {
        ScrobblerConfig::builder()
            .handshaker(Arc::new(StubHandshaker))
            .submitter(Arc::new(StubSubmitter))
            .notifier(Arc::new(StubNotifier))
            .credential_store(Arc::new(StubStore))
    }

    #[test]
    fn test_build_with_all_capabilities() {
        let config = full_builder().build().unwrap();
        assert_eq!(config.retry_policy, RetryPolicy::default());
    }

    #[test]
    fn test_builder_requires_handshaker() {
        let result = ScrobblerConfig::builder()
            .submitter(Arc::new(StubSubmitter))
            .notifier(Arc::new(StubNotifier))
            .credential_store(Arc::new(StubStore))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Handshaker"));
        assert!(err_msg.contains("handshake"));
    }

    #[test]
    fn test_builder_requires_credential_store() {
        let result = ScrobblerConfig::builder()
            .handshaker(Arc::new(StubHandshaker))
            .submitter(Arc::new(StubSubmitter))
            .notifier(Arc::new(StubNotifier))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("CredentialStore"));
    }

    #[test]
    fn test_builder_rejects_invalid_retry_policy() {
        let result = full_builder()
            .retry_policy(RetryPolicy {
                backoff_step: Duration::ZERO,
                ..RetryPolicy::default()
            })
            .build();

        assert!(matches!(result, Err(ScrobblerError::Config(_))));
    }

    #[test]
    fn test_custom_retry_policy_kept() {
        let policy = RetryPolicy {
            backoff_step: Duration::from_secs(2),
            max_backoff: Some(Duration::from_secs(60)),
            rehandshake_threshold: 5,
        };
        let config = full_builder().retry_policy(policy.clone()).build().unwrap();
        assert_eq!(config.retry_policy, policy);
    }
}
