//! # Global Nullifier Set
//!
//! The single shared structure in the engine. Presence of a nullifier means
//! "this note is spent" — for every owner, in every ledger. The set is
//! append-only and write-once: an entry is never mutated, never removed,
//! and never compacted. Pruning it would silently re-open double-spends,
//! so there is deliberately no API for it.
//!
//! Every contract instance holds an `Arc` to the same set. Two operations
//! racing to nullify the same note resolve at the single atomic insert:
//! exactly one wins, the other observes [`LedgerError::AlreadySpent`] and
//! aborts cleanly.

use std::sync::Arc;

use dashmap::DashMap;

use super::error::LedgerError;
use super::note::Nullifier;

/// The system-wide spent-note set.
///
/// Backed by a `DashMap` so that membership reads are lock-free and the
/// check-then-insert is one atomic operation — there is no window between
/// "not present" and "inserted" for a second spender to slip through.
#[derive(Debug, Default)]
pub struct NullifierSet {
    spent: DashMap<Nullifier, ()>,
}

impl NullifierSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            spent: DashMap::new(),
        }
    }

    /// Creates an empty set behind an `Arc`, ready to be shared across
    /// ledger instances.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns `true` if the nullifier has already been recorded.
    pub fn contains(&self, nullifier: &Nullifier) -> bool {
        self.spent.contains_key(nullifier)
    }

    /// Records a nullifier, failing if it already exists.
    ///
    /// This is the write-once gate: `DashMap::insert` returns the previous
    /// value atomically, so of two concurrent recorders exactly one sees
    /// `None` and wins.
    pub fn record(&self, nullifier: Nullifier) -> Result<(), LedgerError> {
        match self.spent.insert(nullifier, ()) {
            None => Ok(()),
            Some(()) => Err(LedgerError::AlreadySpent(nullifier)),
        }
    }

    /// Number of spent notes recorded system-wide.
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    /// Whether nothing has been spent yet.
    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::note::NoteId;

    fn nf(seed: u8) -> Nullifier {
        Nullifier::derive(&NoteId::from_bytes([seed; 32]))
    }

    #[test]
    fn record_is_write_once() {
        let set = NullifierSet::new();
        set.record(nf(1)).unwrap();

        let second = set.record(nf(1));
        assert!(matches!(second, Err(LedgerError::AlreadySpent(_))));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn contains_reflects_recording() {
        let set = NullifierSet::new();
        assert!(!set.contains(&nf(1)));

        set.record(nf(1)).unwrap();
        assert!(set.contains(&nf(1)));
        assert!(!set.contains(&nf(2)));
    }

    #[test]
    fn concurrent_recorders_exactly_one_wins() {
        let set = NullifierSet::shared();
        let target = nf(9);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = Arc::clone(&set);
                std::thread::spawn(move || set.record(target).is_ok())
            })
            .collect();

        let wins: usize = handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();
        assert_eq!(wins, 1, "exactly one concurrent nullification may succeed");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn independent_nullifiers_do_not_interfere() {
        let set = NullifierSet::new();
        for seed in 0..50 {
            set.record(nf(seed)).unwrap();
        }
        assert_eq!(set.len(), 50);
    }
}
