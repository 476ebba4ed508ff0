//! # Addresses & Viewing Keys
//!
//! An [`Address`] identifies a note owner. A [`ViewKey`] is the capability
//! that backs it: 32 bytes of viewing secret from which the address is
//! derived by domain-separated BLAKE3. Holding the secret is what it means
//! to *be* the owner for read purposes — the store's scan path decrypts a
//! note's sealed payload only for a key whose derived address matches the
//! note's owner.
//!
//! Spend authorization is deliberately NOT modeled here. Callers of the
//! ledger have already verified the right to act on an owner's behalf
//! before invoking credit/debit; the viewing key governs visibility only.

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::ADDRESS_DOMAIN;
use crate::crypto::hash::tagged_hash;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 32-byte owner identifier, derived from a viewing secret.
///
/// Addresses are opaque: nothing about an owner's notes or balance can be
/// recovered from the address alone. Two independently generated viewing
/// secrets collide with negligible probability.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Address {
    /// Creates an `Address` from raw 32 bytes.
    ///
    /// Used when the address arrives over a boundary (storage, wire) rather
    /// than from a local [`ViewKey`].
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 32-byte identifier.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the hex-encoded address.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex-encoded address.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// ---------------------------------------------------------------------------
// ViewKey
// ---------------------------------------------------------------------------

/// The viewing capability for one owner.
///
/// Wraps the 32-byte viewing secret and caches the derived [`Address`].
/// The secret never leaves this struct except through the explicit seal-key
/// derivation used by the note store; in particular, `Debug` does not print
/// it and the struct is deliberately not serializable.
#[derive(Clone)]
pub struct ViewKey {
    secret: [u8; 32],
    address: Address,
}

impl ViewKey {
    /// Generates a fresh viewing key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Self::from_secret(secret)
    }

    /// Reconstructs a viewing key from a known 32-byte secret.
    pub fn from_secret(secret: [u8; 32]) -> Self {
        let address = Address(tagged_hash(ADDRESS_DOMAIN, &[&secret]));
        Self { secret, address }
    }

    /// The address this key can read notes for.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns `true` if this key proves ownership of `address`.
    ///
    /// The address is the domain-separated hash of the viewing secret, so
    /// producing a matching derivation is the proof of knowledge the store's
    /// read path demands before it opens a sealed payload.
    pub fn proves(&self, address: &Address) -> bool {
        self.address == *address
    }
}

impl fmt::Debug for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secret redacted.
        write!(f, "ViewKey({:?})", self.address)
    }
}
