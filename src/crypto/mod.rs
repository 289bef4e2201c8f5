//! Crypto module
//!
//! The cipher codec for stored files: AES-256-CBC with PKCS#7 padding,
//! laid out on disk and on the wire as `IV || ciphertext`.

pub mod cipher;
pub mod key;

pub use cipher::{decrypt, decrypt_blob, encrypt, encrypt_with_iv, EncryptedBlob, BLOCK_SIZE, IV_SIZE};
pub use key::{SharedKey, DEFAULT_SHARED_KEY, KEY_SIZE};
