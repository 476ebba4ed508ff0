//! # Umbra Ledger Contracts
//!
//! The three contracts that put the note engine to work. Each one is a
//! policy wrapper around the same `umbra-protocol` balance machinery —
//! different rules, identical engine:
//!
//! - **Shielded Token** — private balances gating transfers, with a public
//!   total-supply counter updated on mint and burn.
//! - **Custody Vault** — a single-owner ledger that never invents value:
//!   every custody credit is paired with a token transfer in, every debit
//!   with a transfer out.
//! - **Payment Router** — per-payer wallets and a settlement choreography
//!   that debits the payer, pays out through the vault, bumps a public
//!   sequence counter, and seals an auditable receipt to a caller-chosen
//!   recipient.
//!
//! ## Design Principles
//!
//! 1. All monetary operations are checked — `checked_add`/`checked_sub`
//!    everywhere, because wrapping arithmetic and money do not mix.
//! 2. Validate everything, then commit: fallible work runs before the
//!    first mutation, so every operation is all-or-nothing.
//! 3. Authorization to act on an owner's behalf is verified by the caller
//!    before these contracts are invoked; viewing keys gate reads only.
//! 4. Every public type is serializable (serde) for wire transport and
//!    persistent storage.

pub mod router;
pub mod token;
pub mod vault;

pub use router::{PaymentConfirmation, PaymentRouter, RouterError, SealedReceipt, SettlementReceipt};
pub use token::{AssetId, ShieldedToken, TokenError, TokenMetadata};
pub use vault::{CustodyVault, VaultError, VaultSnapshot};
