//! Walks the full Umbra settlement flow on an in-memory deployment:
//! mint -> fund -> settle -> receipt pickup.
//!
//! Run with:
//!
//! ```text
//! RUST_LOG=debug cargo run --example settlement_demo
//! ```

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use umbra_contracts::{CustodyVault, PaymentRouter, ShieldedToken};
use umbra_protocol::config::DEFAULT_NOTE_CEILING;
use umbra_protocol::{NullifierSet, ViewKey};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // One global nullifier set, shared by every contract.
    let nullifiers = NullifierSet::shared();
    let mut token = ShieldedToken::new(
        "Umbra Credit",
        "UMC",
        6,
        Arc::clone(&nullifiers),
        DEFAULT_NOTE_CEILING,
    );
    let mut vault = CustodyVault::new(Arc::clone(&nullifiers), DEFAULT_NOTE_CEILING);
    let mut router = PaymentRouter::new(nullifiers, DEFAULT_NOTE_CEILING);

    let payer = ViewKey::generate();
    let payee = ViewKey::generate();
    let auditor = ViewKey::generate();

    // Mint working capital to the payer, deliberately fragmented so the
    // settlement has to chain bounded selection steps.
    for _ in 0..6 {
        token.mint(payer.address(), 250)?;
    }
    println!("minted: payer holds {} across {} notes", 1_500, 6);

    router.fund(&mut token, &mut vault, payer.address(), 1_200)?;
    println!(
        "funded: wallet={} custody={}",
        router.wallet_balance(&payer)?,
        vault.custody_balance()?
    );

    let confirmation = router.settle_payment(
        &mut token,
        &mut vault,
        payer.address(),
        payee.address(),
        900,
        auditor.address(),
    )?;
    println!(
        "settled: sequence={} notes_spent={}",
        confirmation.sequence, confirmation.notes_spent
    );

    println!(
        "payee now holds {} (visible only to the payee)",
        token.private_balance(&payee)?
    );

    let receipt = router.open_receipt(&auditor, &confirmation.receipt_id)?;
    println!(
        "auditor opened receipt: amount={} payment_hash={}",
        receipt.amount,
        &receipt.payment_hash[..12]
    );

    Ok(())
}
