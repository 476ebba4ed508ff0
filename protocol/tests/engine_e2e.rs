//! End-to-end tests for the note engine.
//!
//! These tests exercise the engine the way the contracts do: several
//! independent ledgers sharing one global nullifier set, balances
//! fragmented far past the note ceiling, debits chained across bounded
//! steps. They prove the properties the engine promises — conservation,
//! single-use notes, ceiling discipline, termination in `ceil(k/c)` steps,
//! and all-or-nothing failure.
//!
//! Each test stands alone with its own nullifier set and ledgers. No
//! shared state, no test ordering dependencies.

use umbra_protocol::{
    BalanceSet, LedgerError, NoteValue, NullifierSet, StepOutcome, ViewKey,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// A ledger funded with the given note values for a fresh owner.
fn funded_ledger(values: &[NoteValue]) -> (BalanceSet, ViewKey) {
    let mut ledger = BalanceSet::new(NullifierSet::shared());
    let owner = ViewKey::generate();
    for &v in values {
        ledger.credit(owner.address(), v).expect("credit");
    }
    (ledger, owner)
}

// ---------------------------------------------------------------------------
// Conservation
// ---------------------------------------------------------------------------

#[test]
fn conservation_holds_across_long_histories() {
    let (mut ledger, owner) = funded_ledger(&[]);
    let addr = owner.address();

    let credits: Vec<NoteValue> = vec![17, 3, 250, 42, 9_000, 1, 68, 500];
    let debits: Vec<NoteValue> = vec![20, 400, 8_000, 77];

    for &c in &credits {
        ledger.credit(addr, c).unwrap();
    }
    for &d in &debits {
        ledger.debit(addr, d, 2).unwrap();
    }

    let credited: NoteValue = credits.iter().sum();
    let debited: NoteValue = debits.iter().sum();
    assert_eq!(ledger.balance_of(&addr).unwrap(), credited - debited);
}

#[test]
fn change_notes_account_for_every_unit() {
    let (mut ledger, owner) = funded_ledger(&[30, 30, 30, 30]);
    let addr = owner.address();

    let receipt = ledger.debit(addr, 50, 2).unwrap();
    // selected_total - change == requested, always.
    let change = receipt.change.map(|(_, v)| v).unwrap_or(0);
    assert_eq!(receipt.selected_total - change, receipt.requested);
    assert_eq!(ledger.balance_of(&addr).unwrap(), 70);
}

// ---------------------------------------------------------------------------
// Ceiling & Termination
// ---------------------------------------------------------------------------

#[test]
fn no_step_exceeds_the_ceiling() {
    for ceiling in 1..=5usize {
        let values: Vec<NoteValue> = vec![3; 17];
        let (mut ledger, owner) = funded_ledger(&values);
        let addr = owner.address();

        // Drive the chain step by step and watch every report.
        let mut remaining: NoteValue = 40;
        loop {
            match ledger.debit_step(addr, remaining, ceiling).unwrap() {
                StepOutcome::Covered { notes_spent, .. } => {
                    assert!(notes_spent <= ceiling);
                    break;
                }
                StepOutcome::Partial {
                    notes_spent,
                    remaining: next,
                    ..
                } => {
                    assert_eq!(notes_spent, ceiling, "partial steps fill the ceiling");
                    remaining = next;
                }
            }
        }
    }
}

#[test]
fn termination_in_ceil_k_over_c_steps() {
    // 100 fragments, ceiling 2: a full-balance debit takes exactly 50
    // bounded steps and never loops.
    let values: Vec<NoteValue> = vec![1; 100];
    let (mut ledger, owner) = funded_ledger(&values);
    let addr = owner.address();

    let receipt = ledger.debit(addr, 100, 2).unwrap();
    assert_eq!(receipt.steps, 50);
    assert_eq!(receipt.notes_spent, 100);
    assert_eq!(ledger.balance_of(&addr).unwrap(), 0);
}

#[test]
fn heavily_fragmented_debit_with_change() {
    let values: Vec<NoteValue> = vec![7; 31];
    let (mut ledger, owner) = funded_ledger(&values);
    let addr = owner.address();

    let receipt = ledger.debit(addr, 200, 3).unwrap();
    // 29 notes * 7 = 203 >= 200; ceil(29 / 3) = 10 steps.
    assert_eq!(receipt.notes_spent, 29);
    assert_eq!(receipt.steps, 10);
    assert_eq!(receipt.change.unwrap().1, 3);
    assert_eq!(ledger.balance_of(&addr).unwrap(), 7 * 31 - 200);
}

// ---------------------------------------------------------------------------
// Failure Atomicity
// ---------------------------------------------------------------------------

#[test]
fn insufficient_debit_leaves_every_note_live() {
    let values: Vec<NoteValue> = vec![10; 9];
    let (mut ledger, owner) = funded_ledger(&values);
    let addr = owner.address();

    let before = ledger.scan(&owner).unwrap();
    let result = ledger.debit(addr, 91, 2);
    assert!(matches!(
        result,
        Err(LedgerError::InsufficientBalance {
            available: 90,
            requested: 91,
        })
    ));

    let after = ledger.scan(&owner).unwrap();
    assert_eq!(before, after, "failed debit must not touch any note");
}

#[test]
fn rejected_parameters_mutate_nothing() {
    let (mut ledger, owner) = funded_ledger(&[50]);
    let addr = owner.address();

    assert!(ledger.debit(addr, 0, 2).is_err());
    assert!(ledger.debit(addr, 10, 0).is_err());
    assert!(ledger.credit(addr, 0).is_err());
    assert_eq!(ledger.balance_of(&addr).unwrap(), 50);
    assert_eq!(ledger.live_note_count(&addr), 1);
}

// ---------------------------------------------------------------------------
// Multi-Ledger Composition
// ---------------------------------------------------------------------------

#[test]
fn ledgers_share_double_spend_protection_but_not_notes() {
    let nullifiers = NullifierSet::shared();
    let mut token_ledger = BalanceSet::new(std::sync::Arc::clone(&nullifiers));
    let mut vault_ledger = BalanceSet::new(std::sync::Arc::clone(&nullifiers));

    let owner = ViewKey::generate();
    let addr = owner.address();

    token_ledger.credit(addr, 100).unwrap();
    vault_ledger.credit(addr, 40).unwrap();

    // Balances are per-ledger.
    assert_eq!(token_ledger.balance_of(&addr).unwrap(), 100);
    assert_eq!(vault_ledger.balance_of(&addr).unwrap(), 40);

    // Spends in both land in the one nullifier set.
    token_ledger.debit(addr, 100, 2).unwrap();
    vault_ledger.debit(addr, 40, 2).unwrap();
    assert_eq!(nullifiers.len(), 2);
}

#[test]
fn withdraw_then_deposit_choreography() {
    // The router's settle shape, at engine level: debit one ledger, credit
    // another, totals conserved across both.
    let nullifiers = NullifierSet::shared();
    let mut wallet = BalanceSet::new(std::sync::Arc::clone(&nullifiers));
    let mut custody = BalanceSet::new(std::sync::Arc::clone(&nullifiers));

    let payer = ViewKey::generate().address();
    let payee = ViewKey::generate().address();

    wallet.credit(payer, 120).unwrap();
    for _ in 0..3 {
        let receipt = wallet.debit(payer, 25, 2).unwrap();
        custody
            .credit(payee, receipt.requested)
            .unwrap();
    }

    assert_eq!(wallet.balance_of(&payer).unwrap(), 45);
    assert_eq!(custody.balance_of(&payee).unwrap(), 75);
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

#[test]
fn only_the_owner_discovers_a_balance() {
    let (mut ledger, owner) = funded_ledger(&[]);
    let addr = owner.address();
    ledger.credit(addr, 1_000).unwrap();
    ledger.credit(addr, 2_000).unwrap();

    let own_view: NoteValue = ledger.scan(&owner).unwrap().iter().map(|(_, v)| v).sum();
    assert_eq!(own_view, 3_000);

    let stranger = ViewKey::generate();
    assert!(ledger.scan(&stranger).unwrap().is_empty());

    // The public projection carries sealed payloads only: no value field,
    // no owner field, nothing naming the address.
    let json = serde_json::to_string(&ledger.records()).unwrap();
    assert!(!json.contains("\"value\""));
    assert!(!json.contains("\"owner\""));
    assert!(!json.contains(&addr.to_hex()));
}
