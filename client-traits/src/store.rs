//! Credential Persistence
//!
//! Secure storage for credential material the protocol layer needs and
//! the coordination core occasionally retires.

use crate::error::StoreError;

/// Well-known credential keys shared between the protocol layer and the
/// coordination core.
pub mod keys {
    /// Plaintext password entered by the user. Only needed until the
    /// first successful handshake derives the session secret; the core
    /// deletes it afterwards.
    pub const PLAINTEXT_PASSWORD: &str = "scrobble.password";

    /// Derived authentication secret used for handshakes.
    pub const PASSWORD_DIGEST: &str = "scrobble.password_digest";

    /// Stored account name.
    pub const USERNAME: &str = "scrobble.username";
}

/// Secure credential storage.
///
/// Backed by the platform keychain/keystore on real hosts, an in-memory
/// map in tests. Implementations should never log secret values.
///
/// # Example
///
/// ```ignore
/// use client_traits::store::{keys, CredentialStore};
///
/// async fn retire_password(store: &dyn CredentialStore) {
///     store.delete_secret(keys::PLAINTEXT_PASSWORD).await.ok();
/// }
/// ```
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a secret value under `key`, replacing any existing value.
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Retrieve the secret stored under `key`, if any.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Delete the secret stored under `key`. Deleting a missing key is
    /// not an error.
    async fn delete_secret(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every stored secret.
    async fn clear_all(&self) -> Result<(), StoreError>;
}
