// Copyright (c) 2026 Umbra Contributors. MIT License.
// See LICENSE for details.

//! # Umbra Protocol — Core Library
//!
//! A confidential balance is not a number. In Umbra it is a collection of
//! independent, cryptographically committed value fragments — notes — each
//! owned by one address, each spendable exactly once. The ledger never
//! materializes "Alice has 100": it holds Alice's live notes, and only
//! Alice can discover what they sum to.
//!
//! The crate's center of gravity is the bounded-selection engine: debiting
//! an arbitrary amount from a balance fragmented across arbitrarily many
//! notes, when each atomic operation may touch at most a fixed handful of
//! them. That ceiling is a hard capacity limit of the proving environment,
//! so selection is incremental and resumable by construction.
//!
//! ## Architecture
//!
//! - **notes** — The engine: note store, global nullifier set, bounded
//!   selector, and the credit/debit balance surface.
//! - **address** — Owner addresses and the viewing keys that back them.
//! - **crypto** — BLAKE3 derivation and AES-256-GCM sealed payloads. No
//!   primitives of our own; the proof substrate lives outside this crate.
//! - **counter** — Checked public counters (supply, payment sequence).
//! - **config** — Engine constants. All of them.
//!
//! ## Design Philosophy
//!
//! 1. Conservation is non-negotiable: checked arithmetic everywhere.
//! 2. Double-spend protection is structural, not best-effort — one global
//!    write-once set, one atomic insert.
//! 3. Bounded work per step, provable termination, no recursion.
//! 4. If it touches money, it has tests. Plural.

pub mod address;
pub mod config;
pub mod counter;
pub mod crypto;
pub mod notes;

pub use address::{Address, ViewKey};
pub use counter::{CounterError, PublicCounter};
pub use notes::{
    BalanceSet, DebitReceipt, LedgerError, Note, NoteId, NoteRecord, NoteStore, NoteValue,
    Nullifier, NullifierSet, StepOutcome,
};
