//! # Custody Vault
//!
//! A single-owner ledger holding value the vault does not own outright:
//! everything in custody corresponds to tokens sitting at the vault's own
//! address in the token ledger. The vault never invents value — a custody
//! credit happens only after a successful token transfer in, and a custody
//! debit is immediately followed by a transfer out. The two halves commit
//! together or the operation fails as a whole.
//!
//! ## Two-Phase Discipline
//!
//! Both `deposit` and `withdraw` validate every fallible condition before
//! the first mutation. After validation, the remaining engine calls cannot
//! fail (amounts are known non-zero and balances known sufficient), which
//! is what makes the pairing all-or-nothing without a rollback mechanism.
//!
//! No asset/share conversion math lives here — custody is unit-for-unit,
//! and every sum is checked.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use umbra_protocol::{
    Address, BalanceSet, DebitReceipt, LedgerError, NoteId, NoteValue, NullifierSet, ViewKey,
};

use super::token::{ShieldedToken, TokenError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The custody ledger rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The paired token operation failed.
    #[error("token leg failed: {0}")]
    Token(#[from] TokenError),

    /// A withdrawal asked for more than the vault holds in custody.
    #[error("custody shortfall: held {held}, requested {requested}")]
    CustodyShortfall {
        /// Custody balance at the time of the request.
        held: u128,
        /// The amount that was requested.
        requested: u128,
    },

    /// The vault's token holdings no longer cover its custody balance.
    /// This cannot happen through this API; seeing it means external
    /// state was mutated out from under the vault.
    #[error("custody desync: token holdings {holdings} below custody {custody}")]
    CustodyDesync {
        /// Tokens held at the vault's address.
        holdings: u128,
        /// Recorded custody balance.
        custody: u128,
    },
}

// ---------------------------------------------------------------------------
// Vault State Snapshot
// ---------------------------------------------------------------------------

/// Public snapshot of the vault's books, for monitoring and audits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// The vault's ledger address.
    pub address: Address,
    /// Total value in custody.
    pub custody: u128,
    /// Live note fragments backing the custody balance.
    pub fragments: usize,
}

// ---------------------------------------------------------------------------
// CustodyVault
// ---------------------------------------------------------------------------

/// A custody ledger bound to one token, holding deposits at the vault's
/// own address.
pub struct CustodyVault {
    /// The vault's identity: its viewing key doubles as the proof it can
    /// read its own token holdings during pre-flight checks.
    key: ViewKey,
    /// The single-owner custody ledger.
    custody: BalanceSet,
    /// Per-step note ceiling for custody debits.
    note_ceiling: usize,
}

impl CustodyVault {
    /// Creates an empty vault wired to the shared global nullifier set.
    pub fn new(nullifiers: Arc<NullifierSet>, note_ceiling: usize) -> Self {
        Self {
            key: ViewKey::generate(),
            custody: BalanceSet::new(nullifiers),
            note_ceiling,
        }
    }

    /// The vault's ledger address — where deposited tokens sit.
    pub fn address(&self) -> Address {
        self.key.address()
    }

    /// Total value currently in custody.
    pub fn custody_balance(&self) -> Result<u128, VaultError> {
        Ok(self.custody.balance_of(&self.address())?)
    }

    /// Public snapshot of the books.
    pub fn snapshot(&self) -> Result<VaultSnapshot, VaultError> {
        Ok(VaultSnapshot {
            address: self.address(),
            custody: self.custody_balance()?,
            fragments: self.custody.live_note_count(&self.address()),
        })
    }

    // -----------------------------------------------------------------------
    // Deposit
    // -----------------------------------------------------------------------

    /// Deposits `amount` from `from` into custody.
    ///
    /// Phase 1 (fallible): transfer the tokens from the depositor to the
    /// vault's address. Phase 2 (infallible after phase 1): credit the
    /// custody ledger with the same amount.
    pub fn deposit(
        &mut self,
        token: &mut ShieldedToken,
        from: Address,
        amount: NoteValue,
    ) -> Result<NoteId, VaultError> {
        token.transfer(from, self.address(), amount)?;
        let note = self.custody.credit(self.address(), amount)?;

        info!(vault = %self.address(), amount, "deposit");
        Ok(note)
    }

    // -----------------------------------------------------------------------
    // Withdraw
    // -----------------------------------------------------------------------

    /// Withdraws `amount` from custody and transfers it to `to`.
    ///
    /// Pre-flight validates both legs — custody balance and the vault's
    /// actual token holdings — before any mutation; then the custody debit
    /// and the outbound transfer commit back-to-back.
    pub fn withdraw(
        &mut self,
        token: &mut ShieldedToken,
        to: Address,
        amount: NoteValue,
    ) -> Result<DebitReceipt, VaultError> {
        if amount == 0 {
            return Err(VaultError::Ledger(LedgerError::ZeroAmount));
        }

        let held = self.custody_balance()?;
        if held < amount {
            return Err(VaultError::CustodyShortfall {
                held,
                requested: amount,
            });
        }

        let holdings = token.private_balance(&self.key)?;
        if holdings < held {
            return Err(VaultError::CustodyDesync {
                holdings,
                custody: held,
            });
        }

        let receipt = self
            .custody
            .debit(self.address(), amount, self.note_ceiling)?;
        token.transfer(self.address(), to, amount)?;

        info!(vault = %self.address(), amount, "withdrawal");
        Ok(receipt)
    }
}

impl std::fmt::Debug for CustodyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodyVault")
            .field("address", &self.address())
            .finish()
    }
}
