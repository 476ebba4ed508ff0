//! # Payment Router
//!
//! Settles payments between parties without putting either party or any
//! amount into public state. Each payer pre-funds a router wallet (backed
//! by the note engine); a settlement debits that wallet, pays the payee
//! through the custody vault, bumps the public payment-sequence counter —
//! the only number an observer ever sees — and seals an auditable
//! `(payment_hash, amount)` receipt to a caller-chosen recipient.
//!
//! ## Receipt Privacy
//!
//! The outbox stores receipts as sealed payloads tagged with the recipient
//! address — the delivery tag is public, the contents are not. Only a
//! viewing key proving the recipient address convinces the router to open
//! one. Auditors get receipts by being named at settlement time, not by
//! trawling public state.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use tracing::info;

use umbra_protocol::config::PAYMENT_HASH_DOMAIN;
use umbra_protocol::counter::CounterError;
use umbra_protocol::crypto::hash::{derive_key, tagged_hash};
use umbra_protocol::crypto::seal::{self, SealError};
use umbra_protocol::{
    Address, BalanceSet, LedgerError, NoteValue, NullifierSet, PublicCounter, ViewKey,
};

use super::token::ShieldedToken;
use super::vault::{CustodyVault, VaultError};

/// Key-derivation context for receipt seal keys.
const RECEIPT_SEAL_DOMAIN: &str = "umbra.receipt.v1";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during router operations.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The wallet ledger rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The vault leg of a settlement or funding failed.
    #[error("vault leg failed: {0}")]
    Vault(#[from] VaultError),

    /// The payment sequence counter failed to advance.
    #[error("sequence counter error: {0}")]
    Counter(#[from] CounterError),

    /// Sealing or opening a receipt failed.
    #[error("receipt seal error: {0}")]
    Seal(#[from] SealError),

    /// Receipt payload did not decode after opening.
    #[error("receipt payload malformed")]
    MalformedReceipt,

    /// No receipt with this id exists in the outbox.
    #[error("receipt not found: {0}")]
    ReceiptNotFound(String),

    /// The presented key does not prove the receipt's recipient address.
    #[error("receipt access denied")]
    ReceiptDenied,
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// The private contents of a settlement receipt.
///
/// Exists in plaintext only inside the router and in the hands of the
/// chosen recipient after a successful [`PaymentRouter::open_receipt`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Receipt identifier (UUIDv4).
    pub receipt_id: String,
    /// Commitment to the payment: hash of payer, payee, amount, sequence.
    pub payment_hash: String,
    /// Settled amount in smallest units.
    pub amount: NoteValue,
    /// The paying party.
    pub payer: Address,
    /// The receiving party.
    pub payee: Address,
    /// Position in the global payment sequence.
    pub sequence: u128,
    /// When the settlement committed (UTC).
    pub settled_at: DateTime<Utc>,
}

/// A receipt as it sits in the outbox: sealed contents plus the delivery
/// tag. The tag says who may open it, not what is inside.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SealedReceipt {
    /// Receipt identifier (UUIDv4), matching the sealed contents.
    pub receipt_id: String,
    /// The address allowed to open this receipt.
    pub recipient: Address,
    /// AES-256-GCM sealed [`SettlementReceipt`].
    pub sealed: Vec<u8>,
}

/// What the caller gets back from a successful settlement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    /// Receipt identifier for later retrieval by the chosen recipient.
    pub receipt_id: String,
    /// Position in the global payment sequence.
    pub sequence: u128,
    /// Notes the wallet debit consumed (ceiling-bounded steps included).
    pub notes_spent: usize,
}

// ---------------------------------------------------------------------------
// PaymentRouter
// ---------------------------------------------------------------------------

/// Per-payer wallets plus the settle choreography across token and vault.
pub struct PaymentRouter {
    /// Wallet ledger: one logical balance per payer.
    wallets: BalanceSet,
    /// Public, monotonically increasing payment counter.
    sequence: PublicCounter,
    /// Sealed receipts awaiting pickup.
    outbox: Vec<SealedReceipt>,
    /// Routing secret sealing receipt payloads at rest.
    routing_secret: [u8; 32],
    /// Per-step note ceiling for wallet debits.
    note_ceiling: usize,
}

impl PaymentRouter {
    /// Creates a router wired to the shared global nullifier set.
    pub fn new(nullifiers: Arc<NullifierSet>, note_ceiling: usize) -> Self {
        let mut routing_secret = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut routing_secret);
        Self {
            wallets: BalanceSet::new(nullifiers),
            sequence: PublicCounter::new(),
            outbox: Vec::new(),
            routing_secret,
            note_ceiling,
        }
    }

    /// Number of payments settled so far — the only public trace of router
    /// activity.
    pub fn payments_settled(&self) -> u128 {
        self.sequence.get()
    }

    /// The balance visible to `key` in the wallet ledger.
    pub fn wallet_balance(&self, key: &ViewKey) -> Result<NoteValue, RouterError> {
        let mut total: NoteValue = 0;
        for (_, value) in self.wallets.scan(key)? {
            total = total
                .checked_add(value)
                .ok_or(LedgerError::BalanceOverflow)?;
        }
        Ok(total)
    }

    // -----------------------------------------------------------------------
    // Funding
    // -----------------------------------------------------------------------

    /// Funds `payer`'s router wallet with `amount`, backed one-for-one by
    /// a token deposit into the vault.
    ///
    /// The vault deposit is the fallible half and runs first; the wallet
    /// credit cannot fail once it commits.
    pub fn fund(
        &mut self,
        token: &mut ShieldedToken,
        vault: &mut CustodyVault,
        payer: Address,
        amount: NoteValue,
    ) -> Result<(), RouterError> {
        vault.deposit(token, payer, amount)?;
        self.wallets.credit(payer, amount)?;

        info!(payer = %payer, amount, "wallet funded");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------------

    /// Settles a payment of `amount` from `payer` to `payee`.
    ///
    /// Composition, in commit order:
    ///
    /// 1. debit `payer`'s wallet (bounded-selection chain),
    /// 2. withdraw `amount` from the vault to `payee` (custody debit plus
    ///    outbound token transfer),
    /// 3. advance the payment sequence counter,
    /// 4. seal a `(payment_hash, amount)` receipt to `receipt_recipient`.
    ///
    /// Everything fallible — wallet balance, custody coverage, the sealed
    /// payload itself — is validated or prepared before the first
    /// mutation, so the settlement is all-or-nothing.
    pub fn settle_payment(
        &mut self,
        token: &mut ShieldedToken,
        vault: &mut CustodyVault,
        payer: Address,
        payee: Address,
        amount: NoteValue,
        receipt_recipient: Address,
    ) -> Result<PaymentConfirmation, RouterError> {
        if amount == 0 {
            return Err(RouterError::Ledger(LedgerError::ZeroAmount));
        }

        // Pre-flight: the wallet must cover the amount...
        let funded = self.wallets.balance_of(&payer)?;
        if funded < amount {
            return Err(RouterError::Ledger(LedgerError::InsufficientBalance {
                available: funded,
                requested: amount,
            }));
        }

        // ...the sequence must be able to advance...
        let mut next_sequence = self.sequence;
        let sequence = next_sequence.increment()?;

        // ...and the receipt must seal. Prepared up front: after the first
        // mutation below, nothing is allowed to fail.
        let receipt_id = Uuid::new_v4().to_string();
        let receipt = SettlementReceipt {
            receipt_id: receipt_id.clone(),
            payment_hash: hex::encode(payment_hash(&payer, &payee, amount, sequence)),
            amount,
            payer,
            payee,
            sequence,
            settled_at: Utc::now(),
        };
        let plaintext = serde_json::to_vec(&receipt).map_err(|_| RouterError::MalformedReceipt)?;
        let sealed = seal::seal(&self.receipt_seal_key(&receipt_id), &plaintext)?;

        // Commit: vault first (it validates its own legs before mutating),
        // then the pre-checked wallet debit, then the public counter and
        // the outbox.
        vault.withdraw(token, payee, amount)?;
        let debit = self.wallets.debit(payer, amount, self.note_ceiling)?;
        self.sequence = next_sequence;
        self.outbox.push(SealedReceipt {
            receipt_id: receipt_id.clone(),
            recipient: receipt_recipient,
            sealed,
        });

        info!(sequence, notes_spent = debit.notes_spent, "payment settled");
        Ok(PaymentConfirmation {
            receipt_id,
            sequence,
            notes_spent: debit.notes_spent,
        })
    }

    // -----------------------------------------------------------------------
    // Receipt Delivery
    // -----------------------------------------------------------------------

    /// Sealed receipts addressed to `recipient`.
    pub fn receipts_for(&self, recipient: &Address) -> Vec<&SealedReceipt> {
        self.outbox
            .iter()
            .filter(|r| r.recipient == *recipient)
            .collect()
    }

    /// Opens a receipt for a key that proves its recipient address.
    pub fn open_receipt(
        &self,
        key: &ViewKey,
        receipt_id: &str,
    ) -> Result<SettlementReceipt, RouterError> {
        let sealed = self
            .outbox
            .iter()
            .find(|r| r.receipt_id == receipt_id)
            .ok_or_else(|| RouterError::ReceiptNotFound(receipt_id.to_string()))?;

        if !key.proves(&sealed.recipient) {
            return Err(RouterError::ReceiptDenied);
        }

        let plaintext = seal::open(&self.receipt_seal_key(receipt_id), &sealed.sealed)?;
        serde_json::from_slice(&plaintext).map_err(|_| RouterError::MalformedReceipt)
    }

    /// Derives the AES key sealing one receipt. Per-receipt keys, same
    /// discipline as note payloads.
    fn receipt_seal_key(&self, receipt_id: &str) -> [u8; 32] {
        let mut material = Vec::with_capacity(32 + receipt_id.len());
        material.extend_from_slice(&self.routing_secret);
        material.extend_from_slice(receipt_id.as_bytes());
        derive_key(RECEIPT_SEAL_DOMAIN, &material)
    }
}

impl fmt::Debug for PaymentRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Routing secret redacted.
        f.debug_struct("PaymentRouter")
            .field("payments_settled", &self.sequence.get())
            .field("outbox", &self.outbox.len())
            .finish()
    }
}

/// Commitment to one payment's parties and position.
fn payment_hash(payer: &Address, payee: &Address, amount: NoteValue, sequence: u128) -> [u8; 32] {
    tagged_hash(
        PAYMENT_HASH_DOMAIN,
        &[
            payer.as_bytes(),
            payee.as_bytes(),
            &amount.to_le_bytes(),
            &sequence.to_le_bytes(),
        ],
    )
}
