//! # Shielded Token
//!
//! A fungible asset whose balances live in the note engine. Nothing in
//! public state maps an address to an amount: transfers nullify the
//! sender's notes and issue fresh ones to the recipient, and the only
//! public number is the total supply — maintained here, checked on every
//! mint and burn.
//!
//! ## Supply Invariant
//!
//! The sum of all live note values in this token's ledger equals the
//! public total supply at every commit point. The engine conserves value
//! through transfers and change issuance; mint and burn are the only
//! operations that move the counter, and they move it by exactly the
//! amount credited or debited.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use umbra_protocol::counter::CounterError;
use umbra_protocol::crypto::hash::tagged_hash;
use umbra_protocol::{
    Address, BalanceSet, DebitReceipt, LedgerError, NoteId, NoteValue, NullifierSet,
    PublicCounter, ViewKey,
};

/// Preimage tag for asset identifiers.
const ASSET_ID_DOMAIN: &[u8] = b"umbra.asset.v1";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during shielded token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The underlying note engine rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Minting would push total supply past `u128::MAX`.
    #[error("supply overflow: current {current}, tried to mint {minted}")]
    SupplyOverflow {
        /// Supply before the failed mint.
        current: u128,
        /// The amount that caused the overflow.
        minted: u128,
    },

    /// A public counter operation failed. Burning below zero supply would
    /// mean the ledger held more value than was ever minted — corruption.
    #[error("supply counter error: {0}")]
    Counter(#[from] CounterError),
}

// ---------------------------------------------------------------------------
// AssetId & Metadata
// ---------------------------------------------------------------------------

/// Content-addressed identifier for a token.
///
/// Derived from the token's canonical properties, so the same asset always
/// gets the same id — no registry, no coordination.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId([u8; 32]);

impl AssetId {
    /// Derives an id from the canonical token properties.
    pub fn derive(name: &str, symbol: &str, decimals: u8) -> Self {
        Self(tagged_hash(
            ASSET_ID_DOMAIN,
            &[name.as_bytes(), symbol.as_bytes(), &[decimals]],
        ))
    }

    /// Returns the hex-encoded id.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Canonical metadata for a shielded token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human-readable token name (e.g., "Umbra Credit").
    pub name: String,
    /// Ticker symbol (e.g., "UMC").
    pub symbol: String,
    /// Display decimal places. The ledger never divides — this is for UI
    /// rendering only.
    pub decimals: u8,
    /// When the token was instantiated.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ShieldedToken
// ---------------------------------------------------------------------------

/// A fungible token with note-based private balances and a public supply.
pub struct ShieldedToken {
    asset_id: AssetId,
    metadata: TokenMetadata,
    balances: BalanceSet,
    total_supply: PublicCounter,
    note_ceiling: usize,
}

impl ShieldedToken {
    /// Instantiates a token with zero supply, wired to the shared global
    /// nullifier set.
    ///
    /// `note_ceiling` is the per-step nullification bound every debit on
    /// this ledger runs under.
    pub fn new(
        name: &str,
        symbol: &str,
        decimals: u8,
        nullifiers: Arc<NullifierSet>,
        note_ceiling: usize,
    ) -> Self {
        Self {
            asset_id: AssetId::derive(name, symbol, decimals),
            metadata: TokenMetadata {
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals,
                created_at: Utc::now(),
            },
            balances: BalanceSet::new(nullifiers),
            total_supply: PublicCounter::new(),
            note_ceiling,
        }
    }

    /// The content-derived asset identifier.
    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    /// Token metadata.
    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    /// Current public total supply.
    pub fn total_supply(&self) -> u128 {
        self.total_supply.get()
    }

    /// The per-step note ceiling this ledger runs under.
    pub fn note_ceiling(&self) -> usize {
        self.note_ceiling
    }

    // -----------------------------------------------------------------------
    // Mint / Burn
    // -----------------------------------------------------------------------

    /// Mints `amount` to `owner` as a single private note and adds it to
    /// the public supply.
    ///
    /// Validate-then-commit: the new supply is computed (and overflow
    /// rejected) before the note is issued, so a failed mint leaves both
    /// the counter and the ledger untouched.
    pub fn mint(&mut self, owner: Address, amount: NoteValue) -> Result<NoteId, TokenError> {
        if amount == 0 {
            return Err(TokenError::Ledger(LedgerError::ZeroAmount));
        }
        let new_supply =
            self.total_supply
                .get()
                .checked_add(amount)
                .ok_or(TokenError::SupplyOverflow {
                    current: self.total_supply.get(),
                    minted: amount,
                })?;

        let note = self.balances.credit(owner, amount)?;
        self.total_supply = PublicCounter::with_value(new_supply);

        info!(asset = %self.metadata.symbol, amount, supply = new_supply, "mint");
        Ok(note)
    }

    /// Burns `amount` from `owner`'s private balance and subtracts it from
    /// the public supply.
    ///
    /// The debit runs the full bounded-selection chain; any overshoot comes
    /// back to `owner` as change, so supply drops by exactly `amount`.
    pub fn burn(&mut self, owner: Address, amount: NoteValue) -> Result<DebitReceipt, TokenError> {
        // A burn below zero supply would mean the ledger held more value
        // than was ever minted. Reject before touching any note.
        let mut new_supply = self.total_supply;
        new_supply.checked_sub(amount)?;

        let receipt = self.balances.debit(owner, amount, self.note_ceiling)?;
        self.total_supply = new_supply;

        info!(asset = %self.metadata.symbol, amount, supply = new_supply.get(), "burn");
        Ok(receipt)
    }

    // -----------------------------------------------------------------------
    // Transfer
    // -----------------------------------------------------------------------

    /// Moves `amount` from `from` to `to` privately. Supply is unchanged.
    ///
    /// The debit is the fallible half and runs first; once it commits, the
    /// paired credit cannot fail (the amount is known non-zero).
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: NoteValue,
    ) -> Result<DebitReceipt, TokenError> {
        let receipt = self.balances.debit(from, amount, self.note_ceiling)?;
        self.balances.credit(to, amount)?;

        info!(asset = %self.metadata.symbol, amount, "private transfer");
        Ok(receipt)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The balance visible to `key` — the owner-only discovery path.
    pub fn private_balance(&self, key: &ViewKey) -> Result<NoteValue, TokenError> {
        let mut total: NoteValue = 0;
        for (_, value) in self.balances.scan(key)? {
            total = total
                .checked_add(value)
                .ok_or(LedgerError::BalanceOverflow)?;
        }
        Ok(total)
    }

    /// Number of live note fragments `owner` holds. Callers watching this
    /// decide when to consolidate — the engine never does it for them.
    pub fn fragment_count(&self, owner: &Address) -> usize {
        self.balances.live_note_count(owner)
    }

    /// Checks the supply invariant for a set of known owners: their live
    /// value must never exceed the declared supply.
    pub fn holdings_within_supply(&self, owners: &[Address]) -> Result<bool, TokenError> {
        let mut held: NoteValue = 0;
        for owner in owners {
            held = held
                .checked_add(self.balances.balance_of(owner)?)
                .ok_or(LedgerError::BalanceOverflow)?;
        }
        Ok(held <= self.total_supply.get())
    }
}

impl fmt::Debug for ShieldedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShieldedToken")
            .field("symbol", &self.metadata.symbol)
            .field("total_supply", &self.total_supply.get())
            .finish()
    }
}
