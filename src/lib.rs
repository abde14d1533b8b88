//! Workspace placeholder crate.
//!
//! This crate exists to expose the workspace members (`client-traits`,
//! `core-runtime`, `core-scrobbler`) through a single dependency. Host
//! applications can depend on `scrobbler-workspace` and reach the whole
//! public surface without wiring each crate individually.

pub use core_scrobbler::{
    AuthStatus, RetryPolicy, ScrobbleCoordinator, ScrobblerConfig, ScrobblerError,
};
