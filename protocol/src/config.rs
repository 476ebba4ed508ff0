//! # Engine Configuration & Constants
//!
//! Every magic number in Umbra lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong.
//!
//! The note ceiling and domain tags are consensus-relevant: they shape the
//! identifiers and the step structure of every debit on the ledger. Changing
//! them after deployment invalidates continuation flows in flight, so treat
//! them as frozen once a network ships.

// ---------------------------------------------------------------------------
// Note Selection
// ---------------------------------------------------------------------------

/// Maximum notes a single atomic operation may nullify.
///
/// This is not a tuning knob — it mirrors the fixed cost-per-note model of
/// the proving environment, which can only absorb a bounded amount of work
/// per invocation. Debits that need more notes than this are chained as a
/// sequence of bounded steps.
pub const DEFAULT_NOTE_CEILING: usize = 2;

/// Hard upper bound on chained selection steps inside one `debit` call.
///
/// A debit over `k` live fragments with ceiling `c` needs exactly
/// `ceil(k / c)` steps, so this bound is only reachable for owners whose
/// balance is fragmented across `MAX_SELECTION_STEPS * ceiling` notes.
/// Keeping fragmentation below that is the caller's responsibility (the
/// engine never auto-consolidates). The bound exists so that a broken
/// store iterator can never turn a debit into an unbounded loop.
pub const MAX_SELECTION_STEPS: usize = 4096;

// ---------------------------------------------------------------------------
// Identifier Derivation (domain-separation tags)
// ---------------------------------------------------------------------------

/// Preimage tag for note identifiers: `BLAKE3(TAG || owner || value || tag)`.
pub const NOTE_ID_DOMAIN: &[u8] = b"umbra.note.v1";

/// Key-derivation context for nullifiers. A nullifier is the keyed BLAKE3
/// hash of the note id under this context key, which makes it a pure
/// function of note identity — the property the global set relies on.
pub const NULLIFIER_DOMAIN: &str = "umbra.nullifier.v1";

/// Preimage tag for owner addresses derived from viewing secrets.
pub const ADDRESS_DOMAIN: &[u8] = b"umbra.address.v1";

/// Key-derivation context for per-note payload encryption keys.
pub const SEAL_KEY_DOMAIN: &str = "umbra.seal.v1";

/// Preimage tag for settlement payment hashes.
pub const PAYMENT_HASH_DOMAIN: &[u8] = b"umbra.payment.v1";

// ---------------------------------------------------------------------------
// Sealed Payload Parameters
// ---------------------------------------------------------------------------

/// AES-256-GCM key length in bytes.
pub const SEAL_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes. 96 bits, the standard GCM nonce size.
pub const SEAL_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const SEAL_TAG_LENGTH: usize = 16;
