//! # AES-256-GCM Sealed Payloads
//!
//! Authenticated encryption for owner-only visibility. Every note carries a
//! sealed payload decryptable only with the owner's viewing secret, and the
//! payment router seals settlement receipts to a caller-chosen recipient the
//! same way. Nothing else in the engine looks inside a sealed payload.
//!
//! We use AES-256-GCM because it is an AEAD cipher — authentication and
//! encryption in one operation — and because AES-NI makes it essentially
//! free on every platform we care about.
//!
//! ## Nonce management
//!
//! GCM is unforgiving about nonce reuse. Our strategy: random 96-bit nonces
//! from the OS CSPRNG. Each note payload is sealed under its own derived
//! key, so the per-key message count is one and the birthday bound is not
//! even in the picture.
//!
//! ## Wire format
//!
//! [`seal`] returns `nonce || ciphertext` as a single `Vec<u8>`. The first
//! 12 bytes are the nonce, the rest is the ciphertext with the 16-byte GCM
//! authentication tag appended. [`open`] expects the same format.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use thiserror::Error;

use crate::config::{SEAL_KEY_LENGTH, SEAL_NONCE_LENGTH};

/// Errors that can occur while sealing or opening a payload.
///
/// Intentionally vague. The difference between "wrong key" and "corrupted
/// ciphertext" is none of the caller's business — and definitely none of
/// an attacker's.
#[derive(Debug, Error)]
pub enum SealError {
    /// Sealing failed.
    #[error("sealing failed")]
    SealFailed,

    /// Opening failed — wrong key or tampered ciphertext.
    #[error("opening failed: wrong key or corrupted payload")]
    OpenFailed,

    /// The payload is shorter than a nonce and therefore cannot be valid.
    #[error("sealed payload too short: must be at least {SEAL_NONCE_LENGTH} bytes")]
    PayloadTooShort,
}

/// Seal plaintext under a 32-byte key with a random nonce.
///
/// Returns `nonce || ciphertext`. The caller never manages the nonce
/// separately.
pub fn seal(key: &[u8; SEAL_KEY_LENGTH], plaintext: &[u8]) -> Result<Vec<u8>, SealError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SealError::SealFailed)?;

    let mut nonce_bytes = [0u8; SEAL_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| SealError::SealFailed)?;

    let mut out = Vec::with_capacity(SEAL_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open a payload previously produced by [`seal`].
///
/// Expects the `nonce || ciphertext` format. Fails if the key is wrong or
/// the payload has been modified in any way — GCM authenticates before it
/// decrypts.
pub fn open(key: &[u8; SEAL_KEY_LENGTH], sealed: &[u8]) -> Result<Vec<u8>, SealError> {
    if sealed.len() < SEAL_NONCE_LENGTH {
        return Err(SealError::PayloadTooShort);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(SEAL_NONCE_LENGTH);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SealError::OpenFailed)?;
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| SealError::OpenFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let key = [0x42u8; 32];
        let plaintext = b"note value: 1337";

        let sealed = seal(&key, plaintext).unwrap();
        let recovered = open(&key, &sealed).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn wrong_key_fails_to_open() {
        let key = [0x42u8; 32];
        let other = [0x43u8; 32];

        let sealed = seal(&key, b"secret").unwrap();
        assert!(matches!(open(&other, &sealed), Err(SealError::OpenFailed)));
    }

    #[test]
    fn tampered_payload_fails_to_open() {
        let key = [0x42u8; 32];
        let mut sealed = seal(&key, b"secret").unwrap();

        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(open(&key, &sealed), Err(SealError::OpenFailed)));
    }

    #[test]
    fn truncated_payload_rejected() {
        let key = [0x42u8; 32];
        assert!(matches!(
            open(&key, &[0u8; 5]),
            Err(SealError::PayloadTooShort)
        ));
    }

    #[test]
    fn nonces_are_unique_per_seal() {
        let key = [0x42u8; 32];
        let a = seal(&key, b"same plaintext").unwrap();
        let b = seal(&key, b"same plaintext").unwrap();
        // Random nonces mean distinct wire bytes even for equal plaintexts.
        assert_ne!(a, b);
    }
}
