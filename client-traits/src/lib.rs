//! # Scrobble Client Traits
//!
//! Protocol abstraction traits that must be implemented by the concrete
//! scrobble-service client.
//!
//! ## Overview
//!
//! This crate defines the contract between the coordination core and the
//! protocol layer that actually talks to the remote scrobbling service.
//! Each trait represents a capability the core requires but that is
//! implemented per service (Audioscrobbler-style endpoints, test doubles,
//! etc.). The core never sees HTTP, request signing, or record encoding;
//! it only sees these traits and the classified results they return.
//!
//! ## Traits
//!
//! - [`Handshaker`](api::Handshaker) - Session establishment with the remote service
//! - [`Submitter`](api::Submitter) - Batched submission of recorded scrobbles
//! - [`NowPlayingNotifier`](api::NowPlayingNotifier) - Best-effort now-playing notification
//! - [`CredentialStore`](store::CredentialStore) - Credential persistence (Keychain/Keystore)
//!
//! ## Error Handling
//!
//! Protocol capabilities classify every failure into one of the four
//! [`ApiError`](error::ApiError) kinds. The coordination core matches the
//! kind exhaustively and decides whether to retry, re-handshake, or give
//! up; implementations must therefore never leak transport errors as
//! panics or untyped strings.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks. Implementations must ensure thread safety.

pub mod api;
pub mod error;
pub mod store;
pub mod track;

pub use error::{ApiError, StoreError};

// Re-export commonly used types
pub use api::{Handshaker, NowPlayingNotifier, SessionInfo, SubmitOutcome, Submitter};
pub use store::CredentialStore;
pub use track::Track;
