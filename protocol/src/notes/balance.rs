//! # BalanceSet — Credit/Debit over a Note Multiset
//!
//! The owning wrapper around a [`NoteStore`]. A "balance" here is never a
//! stored integer: it is the sum of the owner's live notes, and every
//! mutation goes through note issuance or nullification.
//!
//! `credit` issues one note. `debit` runs the full bounded-selection chain:
//! a reachability precheck (so insufficiency can never leave partial
//! damage), then ceiling-bounded steps until the amount is covered, with
//! the unspent excess re-issued as a single change note. Callers that need
//! to spread a debit across separate transactions drive
//! [`BalanceSet::debit_step`] themselves and use the reported note count to
//! decide whether to continue.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address::{Address, ViewKey};
use crate::config::MAX_SELECTION_STEPS;

use super::error::LedgerError;
use super::note::{NoteId, NoteRecord, NoteValue};
use super::nullifier::NullifierSet;
use super::selector::{select_step, StepOutcome};
use super::store::NoteStore;

// ---------------------------------------------------------------------------
// DebitReceipt
// ---------------------------------------------------------------------------

/// Summary of a completed debit chain.
///
/// `selected_total - change` always equals `requested`: the conservation
/// identity tests lean on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebitReceipt {
    /// The amount the caller asked to debit.
    pub requested: NoteValue,
    /// Sum of every note nullified across all steps.
    pub selected_total: NoteValue,
    /// Change note issued for the overshoot, if any.
    pub change: Option<(NoteId, NoteValue)>,
    /// Total notes nullified across all steps.
    pub notes_spent: usize,
    /// Bounded steps the chain needed (`ceil(fragments / ceiling)` worst
    /// case).
    pub steps: usize,
}

// ---------------------------------------------------------------------------
// BalanceSet
// ---------------------------------------------------------------------------

/// One ledger's balances: a note store plus the operations over it.
#[derive(Debug)]
pub struct BalanceSet {
    store: NoteStore,
}

impl BalanceSet {
    /// Creates an empty balance set wired to the shared nullifier set.
    pub fn new(nullifiers: Arc<NullifierSet>) -> Self {
        Self {
            store: NoteStore::new(nullifiers),
        }
    }

    // -----------------------------------------------------------------------
    // Credit
    // -----------------------------------------------------------------------

    /// Credits `owner` with a single note of `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAmount`] if `amount` is 0; zero-value
    /// notes are rejected ledger-wide. Given the precondition, the credit
    /// always succeeds.
    pub fn credit(&mut self, owner: Address, amount: NoteValue) -> Result<NoteId, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let id = self.store.issue(owner, amount)?;
        debug!(owner = %owner, amount, note = %id, "credit");
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Debit
    // -----------------------------------------------------------------------

    /// Debits `amount` from `owner`, chaining as many ceiling-bounded steps
    /// as the fragmentation requires.
    ///
    /// Runs a reachability precheck first: if the owner's live notes sum
    /// below `amount`, the debit fails with zero mutations. Past the
    /// precheck the chain cannot run out of value, so the whole call is
    /// all-or-nothing.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAmount`] / [`LedgerError::CeilingViolation`] —
    ///   rejected at entry.
    /// - [`LedgerError::InsufficientBalance`] — live notes sum below
    ///   `amount`; every note left untouched.
    /// - [`LedgerError::SelectionStalled`] — a step made no progress, or
    ///   the chain exceeded [`MAX_SELECTION_STEPS`]. Engine invariant
    ///   violation; fatal.
    /// - [`LedgerError::AlreadySpent`] — nullifier collision during
    ///   commit; fatal.
    pub fn debit(
        &mut self,
        owner: Address,
        amount: NoteValue,
        ceiling: usize,
    ) -> Result<DebitReceipt, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if ceiling == 0 {
            return Err(LedgerError::CeilingViolation { ceiling });
        }

        let available = self.balance_of(&owner)?;
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let mut remaining = amount;
        let mut selected_total: NoteValue = 0;
        let mut notes_spent = 0usize;
        let mut steps = 0usize;

        loop {
            if steps == MAX_SELECTION_STEPS {
                return Err(LedgerError::SelectionStalled { remaining });
            }

            let outcome = select_step(&mut self.store, &owner, remaining, ceiling)?;
            steps += 1;

            // Progress guarantee: a step that consumed nothing while the
            // amount is uncovered would loop forever. Abort instead.
            if outcome.notes_spent() == 0 {
                return Err(LedgerError::SelectionStalled { remaining });
            }

            match outcome {
                StepOutcome::Covered {
                    selected_total: step_total,
                    change,
                    notes_spent: step_notes,
                } => {
                    selected_total += step_total;
                    notes_spent += step_notes;
                    let receipt = DebitReceipt {
                        requested: amount,
                        selected_total,
                        change,
                        notes_spent,
                        steps,
                    };
                    debug!(
                        owner = %owner,
                        amount,
                        steps,
                        notes_spent,
                        "debit complete"
                    );
                    return Ok(receipt);
                }
                StepOutcome::Partial {
                    selected_total: step_total,
                    remaining: next_remaining,
                    notes_spent: step_notes,
                } => {
                    selected_total += step_total;
                    notes_spent += step_notes;
                    remaining = next_remaining;
                }
            }
        }
    }

    /// Executes exactly one ceiling-bounded debit step.
    ///
    /// The continuation surface for callers that chain steps across real
    /// transactions. Unlike [`debit`](Self::debit) there is no whole-chain
    /// reachability precheck: a chain that ultimately comes up short
    /// surfaces [`LedgerError::InsufficientBalance`] on its final step, and
    /// discarding the earlier steps' work is the enclosing transaction's
    /// concern.
    pub fn debit_step(
        &mut self,
        owner: Address,
        amount: NoteValue,
        ceiling: usize,
    ) -> Result<StepOutcome, LedgerError> {
        select_step(&mut self.store, &owner, amount, ceiling)
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Sum of the owner's live notes.
    pub fn balance_of(&self, owner: &Address) -> Result<NoteValue, LedgerError> {
        let mut total: NoteValue = 0;
        for note in self.store.live_notes_of(owner) {
            total = total
                .checked_add(note.value)
                .ok_or(LedgerError::BalanceOverflow)?;
        }
        Ok(total)
    }

    /// Number of live notes (fragments) the owner holds.
    pub fn live_note_count(&self, owner: &Address) -> usize {
        self.store.live_count(owner)
    }

    /// Owner-only read path: live `(id, value)` pairs visible to `key`.
    pub fn scan(&self, key: &ViewKey) -> Result<Vec<(NoteId, NoteValue)>, LedgerError> {
        self.store.scan(key)
    }

    /// Public projection of the backing store.
    pub fn records(&self) -> Vec<NoteRecord> {
        self.store.records()
    }

    /// A handle to the shared nullifier set.
    pub fn nullifier_set(&self) -> Arc<NullifierSet> {
        self.store.nullifier_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(values: &[NoteValue]) -> (BalanceSet, Address) {
        let mut set = BalanceSet::new(NullifierSet::shared());
        let owner = ViewKey::generate().address();
        for &v in values {
            set.credit(owner, v).unwrap();
        }
        (set, owner)
    }

    #[test]
    fn credit_increases_balance() {
        let (mut set, owner) = funded(&[]);
        set.credit(owner, 1000).unwrap();
        set.credit(owner, 500).unwrap();

        assert_eq!(set.balance_of(&owner).unwrap(), 1500);
        assert_eq!(set.live_note_count(&owner), 2);
    }

    #[test]
    fn credit_zero_rejected() {
        let (mut set, owner) = funded(&[]);
        assert!(matches!(
            set.credit(owner, 0),
            Err(LedgerError::ZeroAmount)
        ));
        assert_eq!(set.live_note_count(&owner), 0);
    }

    #[test]
    fn debit_single_step_with_change() {
        // Four equal fragments, ceiling 2: one step covers 50 with 10 change.
        let (mut set, owner) = funded(&[30, 30, 30, 30]);

        let receipt = set.debit(owner, 50, 2).unwrap();
        assert_eq!(receipt.steps, 1);
        assert_eq!(receipt.notes_spent, 2);
        assert_eq!(receipt.selected_total, 60);
        assert_eq!(receipt.change.unwrap().1, 10);

        // Remaining live notes: [30, 30, 10].
        assert_eq!(set.balance_of(&owner).unwrap(), 70);
        assert_eq!(set.live_note_count(&owner), 3);
    }

    #[test]
    fn debit_chains_steps_across_fragments() {
        // Six 10-value fragments, ceiling 2, debit 55: two Partial steps
        // (20 + 20) then a Covered step (20, change 5).
        let (mut set, owner) = funded(&[10, 10, 10, 10, 10, 10]);

        let receipt = set.debit(owner, 55, 2).unwrap();
        assert_eq!(receipt.steps, 3);
        assert_eq!(receipt.notes_spent, 6);
        assert_eq!(receipt.selected_total, 60);
        assert_eq!(receipt.change.unwrap().1, 5);

        assert_eq!(set.balance_of(&owner).unwrap(), 5);
        assert_eq!(set.live_note_count(&owner), 1);
    }

    #[test]
    fn debit_step_count_is_ceil_fragments_over_ceiling() {
        // k fragments, ceiling c, debiting everything: ceil(k / c) steps.
        for (k, c, expected_steps) in [(4usize, 2usize, 2usize), (5, 2, 3), (9, 4, 3), (3, 1, 3)] {
            let values: Vec<NoteValue> = vec![7; k];
            let (mut set, owner) = funded(&values);

            let total: NoteValue = 7 * k as NoteValue;
            let receipt = set.debit(owner, total, c).unwrap();
            assert_eq!(receipt.steps, expected_steps, "k={k} c={c}");
            assert_eq!(receipt.notes_spent, k);
            assert!(receipt.change.is_none());
        }
    }

    #[test]
    fn debit_insufficient_is_untouched() {
        // Total of 20 live, 25 requested: nothing may move.
        let (mut set, owner) = funded(&[10, 10]);

        let result = set.debit(owner, 25, 2);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance {
                available: 20,
                requested: 25,
            })
        ));

        // Both notes still live: the precheck fired before any mutation.
        assert_eq!(set.balance_of(&owner).unwrap(), 20);
        assert_eq!(set.live_note_count(&owner), 2);
    }

    #[test]
    fn debit_insufficient_even_when_fragments_exceed_ceiling() {
        let (mut set, owner) = funded(&[10, 10, 10, 10, 10]);

        let result = set.debit(owner, 51, 2);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance {
                available: 50,
                requested: 51,
            })
        ));
        assert_eq!(set.live_note_count(&owner), 5);
    }

    #[test]
    fn debit_exact_balance_leaves_nothing() {
        let (mut set, owner) = funded(&[40, 60]);

        let receipt = set.debit(owner, 100, 2).unwrap();
        assert!(receipt.change.is_none());
        assert_eq!(set.balance_of(&owner).unwrap(), 0);
        assert_eq!(set.live_note_count(&owner), 0);
    }

    #[test]
    fn debit_zero_rejected() {
        let (mut set, owner) = funded(&[10]);
        assert!(matches!(set.debit(owner, 0, 2), Err(LedgerError::ZeroAmount)));
    }

    #[test]
    fn debit_zero_ceiling_rejected() {
        let (mut set, owner) = funded(&[10]);
        assert!(matches!(
            set.debit(owner, 5, 0),
            Err(LedgerError::CeilingViolation { ceiling: 0 })
        ));
        assert_eq!(set.live_note_count(&owner), 1);
    }

    #[test]
    fn conservation_across_mixed_operations() {
        let (mut set, owner) = funded(&[]);
        let mut credited: NoteValue = 0;
        let mut debited: NoteValue = 0;

        for amount in [100u128, 250, 40, 900, 15] {
            set.credit(owner, amount).unwrap();
            credited += amount;
        }
        for amount in [70u128, 300, 5] {
            set.debit(owner, amount, 2).unwrap();
            debited += amount;
        }

        assert_eq!(set.balance_of(&owner).unwrap(), credited - debited);
    }

    #[test]
    fn change_is_respendable() {
        let (mut set, owner) = funded(&[100]);

        set.debit(owner, 60, 2).unwrap(); // leaves a 40 change note
        let receipt = set.debit(owner, 40, 2).unwrap();
        assert!(receipt.change.is_none());
        assert_eq!(set.balance_of(&owner).unwrap(), 0);
    }

    #[test]
    fn owners_do_not_cross_contaminate() {
        let (mut set, alice) = funded(&[100, 100]);
        let bob = ViewKey::generate().address();
        set.credit(bob, 30).unwrap();

        set.debit(alice, 150, 2).unwrap();
        assert_eq!(set.balance_of(&bob).unwrap(), 30);

        let result = set.debit(bob, 40, 2);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { available: 30, .. })
        ));
    }

    #[test]
    fn debit_step_reports_continuation() {
        let (mut set, owner) = funded(&[10, 10, 10, 10]);

        let outcome = set.debit_step(owner, 35, 2).unwrap();
        let StepOutcome::Partial {
            remaining,
            notes_spent,
            ..
        } = outcome
        else {
            panic!("expected Partial");
        };
        assert_eq!(remaining, 15);
        assert_eq!(notes_spent, 2);

        let outcome = set.debit_step(owner, remaining, 2).unwrap();
        assert!(matches!(outcome, StepOutcome::Covered { .. }));
        assert_eq!(set.balance_of(&owner).unwrap(), 5);
    }

    #[test]
    fn receipt_serialization_roundtrip() {
        let (mut set, owner) = funded(&[30, 30]);
        let receipt = set.debit(owner, 45, 2).unwrap();

        let json = serde_json::to_string(&receipt).expect("serialize");
        let recovered: DebitReceipt = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recovered.requested, 45);
        assert_eq!(recovered.selected_total, 60);
        assert_eq!(recovered.change.unwrap().1, 15);
    }
}
