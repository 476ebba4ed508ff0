//! # BoundedSelector — Ceiling-Constrained Note Selection
//!
//! The hard part of the engine. A debit must cover an arbitrary amount out
//! of a balance fragmented across an unbounded number of notes, but one
//! atomic operation may nullify at most `ceiling` notes, a hard capacity
//! limit of the proving environment, not a fee optimization. Selection is
//! therefore incremental and resumable: each step consumes up to `ceiling`
//! notes, and an uncovered remainder rolls into the next step.
//!
//! Implemented as an explicit plan-then-commit loop with an accumulator.
//! No language-level recursion: stack usage is constant and the
//! termination argument is a counter, not an induction.
//!
//! ## Step semantics
//!
//! One [`select_step`] call is one atomic unit:
//!
//! 1. **Plan** — walk the owner's live notes in store order, taking up to
//!    `ceiling` of them, and decide the outcome without touching state.
//!    If the walk proves the owner cannot cover the amount *and* has no
//!    further notes beyond the plan, the step fails before any mutation.
//! 2. **Commit** — nullify exactly the planned notes, then issue the
//!    change note if the selection overshot.
//!
//! A step that would commit zero notes while a remainder is outstanding is
//! a progress violation; [`super::balance::BalanceSet::debit`] aborts the
//! chain fatally rather than loop forever.

use tracing::debug;

use crate::address::Address;

use super::error::LedgerError;
use super::note::{NoteId, NoteValue};
use super::store::NoteStore;

/// Outcome of one bounded selection step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step's selection covered the requested amount.
    Covered {
        /// Sum of the notes nullified by this step.
        selected_total: NoteValue,
        /// Change note issued for the overshoot, if any. `None` exactly
        /// when the selection matched the amount to the unit.
        change: Option<(NoteId, NoteValue)>,
        /// Notes nullified by this step (≤ the ceiling).
        notes_spent: usize,
    },
    /// The ceiling was reached with live notes remaining; the caller must
    /// continue with the reported remainder.
    Partial {
        /// Sum of the notes nullified by this step.
        selected_total: NoteValue,
        /// Amount still uncovered after this step.
        remaining: NoteValue,
        /// Notes nullified by this step (exactly the ceiling).
        notes_spent: usize,
    },
}

impl StepOutcome {
    /// Notes processed by the step: the continuation signal callers use
    /// to decide whether another step is required.
    pub fn notes_spent(&self) -> usize {
        match self {
            StepOutcome::Covered { notes_spent, .. } => *notes_spent,
            StepOutcome::Partial { notes_spent, .. } => *notes_spent,
        }
    }
}

/// Executes one bounded selection step against `store`.
///
/// Nullifies at most `ceiling` of `owner`'s live notes (store order),
/// accumulating toward `amount`. See the module docs for the two-phase
/// structure. On [`LedgerError::InsufficientBalance`] no state has been
/// touched: insufficiency is decided during planning.
///
/// # Errors
///
/// - [`LedgerError::ZeroAmount`] — `amount` is zero.
/// - [`LedgerError::CeilingViolation`] — `ceiling` is zero.
/// - [`LedgerError::InsufficientBalance`] — the owner's remaining live
///   notes cannot cover `amount` even past this step.
/// - [`LedgerError::AlreadySpent`] — a planned nullifier was concurrently
///   recorded; fatal to the enclosing operation.
pub fn select_step(
    store: &mut NoteStore,
    owner: &Address,
    amount: NoteValue,
    ceiling: usize,
) -> Result<StepOutcome, LedgerError> {
    if amount == 0 {
        return Err(LedgerError::ZeroAmount);
    }
    if ceiling == 0 {
        return Err(LedgerError::CeilingViolation { ceiling });
    }

    // Phase 1: plan. Pure reads; nothing is nullified yet.
    let mut planned: Vec<(NoteId, NoteValue)> = Vec::with_capacity(ceiling);
    let mut selected_total: NoteValue = 0;
    let mut more_notes_remain = false;

    for note in store.live_notes_of(owner) {
        if planned.len() == ceiling {
            more_notes_remain = true;
            break;
        }
        selected_total = selected_total
            .checked_add(note.value)
            .ok_or(LedgerError::BalanceOverflow)?;
        planned.push((note.id, note.value));
        if selected_total >= amount {
            break;
        }
    }

    if selected_total < amount && !more_notes_remain {
        // The walk exhausted the owner's notes below the ceiling (or dead
        // on it) and still fell short: fail before committing anything.
        return Err(LedgerError::InsufficientBalance {
            available: selected_total,
            requested: amount,
        });
    }

    // Phase 2: commit. With the store held exclusively, the planned notes
    // are still live; a nullifier collision here means cross-ledger
    // corruption and aborts the operation.
    for (id, _) in &planned {
        store.nullify(id)?;
    }
    let notes_spent = planned.len();

    if selected_total >= amount {
        let excess = selected_total - amount;
        let change = if excess > 0 {
            let change_id = store.issue(*owner, excess)?;
            Some((change_id, excess))
        } else {
            None
        };
        debug!(
            owner = %owner,
            amount,
            selected_total,
            notes_spent,
            change = change.map(|(_, v)| v).unwrap_or(0),
            "selection step covered amount"
        );
        Ok(StepOutcome::Covered {
            selected_total,
            change,
            notes_spent,
        })
    } else {
        let remaining = amount - selected_total;
        debug!(
            owner = %owner,
            amount,
            selected_total,
            notes_spent,
            remaining,
            "selection step hit ceiling, continuation required"
        );
        Ok(StepOutcome::Partial {
            selected_total,
            remaining,
            notes_spent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ViewKey;
    use crate::notes::nullifier::NullifierSet;

    fn store_with_notes(values: &[NoteValue]) -> (NoteStore, Address) {
        let mut store = NoteStore::new(NullifierSet::shared());
        let owner = ViewKey::generate().address();
        for &v in values {
            store.issue(owner, v).unwrap();
        }
        (store, owner)
    }

    #[test]
    fn covers_within_ceiling() {
        let (mut store, owner) = store_with_notes(&[30, 30, 30, 30]);

        let outcome = select_step(&mut store, &owner, 50, 2).unwrap();
        match outcome {
            StepOutcome::Covered {
                selected_total,
                change,
                notes_spent,
            } => {
                assert_eq!(selected_total, 60);
                assert_eq!(notes_spent, 2);
                let (_, change_value) = change.expect("change note");
                assert_eq!(change_value, 10);
            }
            other => panic!("expected Covered, got {other:?}"),
        }

        // Two originals dead, two originals plus the change note live.
        assert_eq!(store.live_count(&owner), 3);
    }

    #[test]
    fn exact_cover_emits_no_change() {
        let (mut store, owner) = store_with_notes(&[25, 25]);

        let outcome = select_step(&mut store, &owner, 50, 2).unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::Covered {
                selected_total: 50,
                change: None,
                notes_spent: 2,
            }
        ));
        assert_eq!(store.live_count(&owner), 0);
    }

    #[test]
    fn stops_early_once_covered() {
        let (mut store, owner) = store_with_notes(&[100, 40, 40]);

        // The first note alone covers the amount; the ceiling allows two
        // but the step must not nullify more than it needs.
        let outcome = select_step(&mut store, &owner, 70, 2).unwrap();
        match outcome {
            StepOutcome::Covered {
                notes_spent,
                change,
                ..
            } => {
                assert_eq!(notes_spent, 1);
                assert_eq!(change.unwrap().1, 30);
            }
            other => panic!("expected Covered, got {other:?}"),
        }
        assert_eq!(store.live_count(&owner), 3);
    }

    #[test]
    fn partial_when_ceiling_hit_with_notes_remaining() {
        let (mut store, owner) = store_with_notes(&[10, 10, 10, 10]);

        let outcome = select_step(&mut store, &owner, 35, 2).unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Partial {
                selected_total: 20,
                remaining: 15,
                notes_spent: 2,
            }
        );
        assert_eq!(store.live_count(&owner), 2);
    }

    #[test]
    fn insufficient_leaves_notes_untouched() {
        let (mut store, owner) = store_with_notes(&[10, 10]);

        let result = select_step(&mut store, &owner, 25, 2);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance {
                available: 20,
                requested: 25,
            })
        ));
        // Both notes remain live: insufficiency is decided before commit.
        assert_eq!(store.live_count(&owner), 2);
    }

    #[test]
    fn insufficient_with_no_notes_at_all() {
        let (mut store, owner) = store_with_notes(&[]);

        let result = select_step(&mut store, &owner, 1, 2);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance {
                available: 0,
                requested: 1,
            })
        ));
    }

    #[test]
    fn zero_amount_rejected() {
        let (mut store, owner) = store_with_notes(&[10]);
        assert!(matches!(
            select_step(&mut store, &owner, 0, 2),
            Err(LedgerError::ZeroAmount)
        ));
    }

    #[test]
    fn zero_ceiling_rejected() {
        let (mut store, owner) = store_with_notes(&[10]);
        assert!(matches!(
            select_step(&mut store, &owner, 5, 0),
            Err(LedgerError::CeilingViolation { ceiling: 0 })
        ));
        assert_eq!(store.live_count(&owner), 1);
    }

    #[test]
    fn never_spends_more_than_ceiling() {
        for ceiling in 1..=4 {
            let (mut store, owner) = store_with_notes(&[5, 5, 5, 5, 5, 5]);
            let outcome = select_step(&mut store, &owner, 30, ceiling).unwrap();
            assert!(outcome.notes_spent() <= ceiling);
        }
    }
}
