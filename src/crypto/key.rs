//! Pre-shared key module

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ShareError};

/// AES-256 key length in bytes
pub const KEY_SIZE: usize = 32;

/// Key compiled into both the client and the server.
///
/// There is no key exchange; whoever holds this value can read every file.
pub const DEFAULT_SHARED_KEY: SharedKey = SharedKey(*b"ThisIsASecretKey1234567890123456");

/// A 32-byte symmetric key shared out-of-band with the server
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SharedKey(pub(crate) [u8; KEY_SIZE]);

impl SharedKey {
    /// Wrap raw key bytes
    pub fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a key from 64 hex characters
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())?;
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|v: Vec<u8>| {
            ShareError::config_error_with_field(
                format!("Key must be {} bytes, got {}", KEY_SIZE, v.len()),
                "key",
            )
        })?;
        Ok(Self(bytes))
    }

    /// Hex form, as printed by the server for sharing with clients
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl Default for SharedKey {
    fn default() -> Self {
        DEFAULT_SHARED_KEY
    }
}

impl FromStr for SharedKey {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

// Never print key material.
impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedKey(..)")
    }
}
