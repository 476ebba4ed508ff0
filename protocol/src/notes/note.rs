//! # Notes
//!
//! A note is an individual, single-owner, single-use value fragment — the
//! unit a confidential balance is made of. A balance is never stored as a
//! number: it is the sum of the owner's live notes, discoverable only by
//! that owner.
//!
//! Notes are immutable once issued. Spending one means recording its
//! [`Nullifier`] in the global set; there is no partial spend — a debit
//! that needs less than a note's full value gets the remainder back as a
//! freshly issued change note.
//!
//! ## Identity
//!
//! A [`NoteId`] is the BLAKE3 hash of `(owner, value, tag)` under a domain
//! tag, where `tag` is 32 random bytes drawn at issuance. The random tag is
//! what makes two notes of equal value to the same owner distinct — and
//! what makes their nullifiers distinct. The nullifier itself is a keyed
//! derivation of the note id, so it is a pure function of note identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::config::{NOTE_ID_DOMAIN, NULLIFIER_DOMAIN};
use crate::crypto::hash::{derive_key, tagged_hash};

/// Note values are unsigned 128-bit integers in the smallest denomination.
/// No floating point, no decimals in arithmetic.
pub type NoteValue = u128;

// ---------------------------------------------------------------------------
// NoteId
// ---------------------------------------------------------------------------

/// Content-derived identifier of a single note.
///
/// Stable for the life of the ledger: dead notes keep their id, and ids are
/// individually addressable across upgrades.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId([u8; 32]);

impl NoteId {
    /// Derives the id for a note from its canonical fields.
    pub fn derive(owner: &Address, value: NoteValue, tag: &[u8; 32]) -> Self {
        Self(tagged_hash(
            NOTE_ID_DOMAIN,
            &[owner.as_bytes(), &value.to_le_bytes(), tag],
        ))
    }

    /// Creates a `NoteId` from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 32-byte identifier.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the hex-encoded id.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Nullifier
// ---------------------------------------------------------------------------

/// The unique marker recorded once a note is spent.
///
/// Derived deterministically from the note id, so the same note always
/// produces the same nullifier — which is exactly what lets the global set
/// reject a second spend.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nullifier([u8; 32]);

impl Nullifier {
    /// Derives the nullifier for a note id.
    pub fn derive(note_id: &NoteId) -> Self {
        Self(derive_key(NULLIFIER_DOMAIN, note_id.as_bytes()))
    }

    /// Returns the raw 32-byte nullifier.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the hex-encoded nullifier.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nullifier({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Note
// ---------------------------------------------------------------------------

/// A single value fragment, immutable once issued.
///
/// The `value` field is the ledger-internal plaintext: the engine executes
/// inside the ledger's trust boundary and needs it for selection. Anything
/// that leaves that boundary goes through [`NoteRecord`], which carries only
/// the id and the sealed payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Note {
    /// Content-derived identifier.
    pub id: NoteId,
    /// The owning address.
    pub owner: Address,
    /// Value in the smallest denomination.
    pub value: NoteValue,
    /// Random uniqueness tag drawn at issuance.
    pub tag: [u8; 32],
    /// AES-256-GCM payload decryptable only with the owner's viewing key.
    pub sealed: Vec<u8>,
}

impl Note {
    /// Derives this note's nullifier.
    pub fn nullifier(&self) -> Nullifier {
        Nullifier::derive(&self.id)
    }
}

/// The public projection of a note: no owner, no value.
///
/// This is the shape a note takes outside the ledger boundary — on the
/// wire, in persisted state, in anything an observer can enumerate. The
/// sealed payload opens only under the owner's viewing key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Note identifier (publicly addressable).
    pub id: NoteId,
    /// The sealed payload (value, visible to the owner alone).
    pub sealed: Vec<u8>,
}

impl From<&Note> for NoteRecord {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            sealed: note.sealed.clone(),
        }
    }
}
