//! # Cryptographic Plumbing
//!
//! The small, boring crypto surface the note ledger actually needs. Umbra
//! deliberately designs no primitives of its own: identifier derivation is
//! BLAKE3 with domain separation, and owner-only payload visibility is
//! AES-256-GCM. The commitment scheme and proof system live in the proving
//! substrate outside this crate — the ledger consumes them as opaque,
//! already-verified operations.

pub mod hash;
pub mod seal;

pub use hash::{blake3_hash, derive_key, tagged_hash};
pub use seal::{open, seal, SealError};
