use std::fmt;

use keyring::Entry;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::api::{Result, TethrError};

const SERVICE_NAME: &str = "tethr-broker";

/// A string whose memory is zeroed on drop or on an explicit [`wipe`](Self::wipe).
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Expose the secret for immediate use. Do not store or log the result.
    pub fn expose(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Zero the secret in place, leaving an empty string behind.
    pub fn wipe(&mut self) {
        self.inner.zeroize();
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString(***)")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

/// API user and password used for the client credentials grant.
///
/// Both fields are zeroed when the value is dropped, so replacing the
/// `Arc<Credentials>` held by the transport wipes the old secret once the
/// last in-flight token request lets go of it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    api_user: String,
    api_password: SecretString,
}

impl Credentials {
    pub fn new(api_user: impl Into<String>, api_password: SecretString) -> Self {
        Self {
            api_user: api_user.into(),
            api_password,
        }
    }

    pub fn api_user(&self) -> &str {
        &self.api_user
    }

    pub fn api_password(&self) -> &SecretString {
        &self.api_password
    }

    /// Zero both fields in place.
    pub fn wipe(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_user", &self.api_user)
            .field("api_password", &self.api_password)
            .finish()
    }
}

/// OS keychain storage for the API password, keyed by API user.
pub struct CredentialStore;

impl CredentialStore {
    /// Store the password for an API user in the OS keychain
    pub fn store(api_user: &str, password: &SecretString) -> Result<()> {
        let entry = Self::entry(api_user)?;
        entry.set_password(password.expose()).map_err(|e| {
            TethrError::Config(format!("Failed to store password in keychain: {e}"))
        })
    }

    /// Retrieve the password for an API user from the OS keychain
    pub fn get_password(api_user: &str) -> Result<SecretString> {
        let entry = Self::entry(api_user)?;
        entry
            .get_password()
            .map(SecretString::new)
            .map_err(|e| TethrError::Config(format!("Failed to retrieve password from keychain: {e}")))
    }

    /// Delete the stored password for an API user
    pub fn delete(api_user: &str) -> Result<()> {
        let entry = Self::entry(api_user)?;
        entry.delete_credential().map_err(|e| {
            TethrError::Config(format!("Failed to delete credential from keychain: {e}"))
        })
    }

    /// Check if a password exists for an API user
    pub fn has_credentials(api_user: &str) -> bool {
        Self::entry(api_user)
            .map(|entry| entry.get_password().is_ok())
            .unwrap_or(false)
    }

    fn entry(api_user: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, api_user)
            .map_err(|e| TethrError::Config(format!("Failed to create keyring entry: {e}")))
    }
}
