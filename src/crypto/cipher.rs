//! Cipher codec module
//!
//! Encodes a plaintext file into the stored byte layout and decodes it back.
//!
//! ```text
//! +----------------+-------------------------------------------+
//! | IV (16 bytes)  | AES-256-CBC(PKCS#7(plaintext))            |
//! +----------------+-------------------------------------------+
//! ```
//!
//! There is no authentication tag. A flipped ciphertext bit either decrypts
//! to different plaintext or fails the padding check; neither is reported as
//! tampering.

use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, trace, warn};

use crate::crypto::key::SharedKey;
use crate::error::{Result, ShareError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Initialization vector length in bytes
pub const IV_SIZE: usize = 16;

/// An encrypted file: the IV followed by padded CBC ciphertext
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// Per-file random initialization vector
    pub iv: [u8; IV_SIZE],
    /// Ciphertext, always a non-zero multiple of [`BLOCK_SIZE`]
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Split a stored byte stream into IV and ciphertext.
    ///
    /// Performs only length checks; no cipher work happens here.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < IV_SIZE {
            return Err(ShareError::decrypt_error(format!(
                "Blob too short: {} bytes, need at least {} for the IV",
                bytes.len(),
                IV_SIZE
            )));
        }

        let (iv, ciphertext) = bytes.split_at(IV_SIZE);

        if ciphertext.is_empty() {
            return Err(ShareError::decrypt_error("Blob has an IV but no ciphertext"));
        }

        if ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(ShareError::decrypt_error(format!(
                "Ciphertext length {} is not a multiple of the {}-byte block size",
                ciphertext.len(),
                BLOCK_SIZE
            )));
        }

        let mut iv_bytes = [0u8; IV_SIZE];
        iv_bytes.copy_from_slice(iv);

        Ok(Self {
            iv: iv_bytes,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Serialize as `IV || ciphertext`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Total serialized length
    pub fn encoded_len(&self) -> usize {
        IV_SIZE + self.ciphertext.len()
    }
}

/// Encrypt a plaintext under a fresh random IV
pub fn encrypt(plaintext: &[u8], key: &SharedKey) -> EncryptedBlob {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);
    encrypt_with_iv(plaintext, key, iv)
}

/// Encrypt a plaintext under a caller-chosen IV.
///
/// Reusing an IV with the same key leaks equality of plaintext prefixes;
/// use [`encrypt`] outside of tests.
pub fn encrypt_with_iv(plaintext: &[u8], key: &SharedKey, iv: [u8; IV_SIZE]) -> EncryptedBlob {
    let ciphertext = Aes256CbcEnc::new(&key.0.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    trace!("Encrypted {} bytes into {} bytes of ciphertext", plaintext.len(), ciphertext.len());

    EncryptedBlob { iv, ciphertext }
}

/// Decrypt a stored byte stream (`IV || ciphertext`)
pub fn decrypt(bytes: &[u8], key: &SharedKey) -> Result<Vec<u8>> {
    let blob = EncryptedBlob::parse(bytes)?;
    decrypt_blob(&blob, key)
}

/// Decrypt an already-split blob and strip its padding
pub fn decrypt_blob(blob: &EncryptedBlob, key: &SharedKey) -> Result<Vec<u8>> {
    if blob.ciphertext.is_empty() || blob.ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(ShareError::decrypt_error(format!(
            "Ciphertext length {} is not a positive multiple of {}",
            blob.ciphertext.len(),
            BLOCK_SIZE
        )));
    }

    let plaintext = Aes256CbcDec::new(&key.0.into(), &blob.iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&blob.ciphertext)
        .map_err(|e| {
            warn!("Padding check failed after decrypting {} bytes", blob.ciphertext.len());
            ShareError::decrypt_error_with_source(
                "Invalid padding (wrong key, corrupted transfer, or not encrypted with this scheme)",
                e.to_string(),
            )
        })?;

    debug!("Decrypted {} bytes of ciphertext into {} bytes", blob.ciphertext.len(), plaintext.len());
    Ok(plaintext)
}
