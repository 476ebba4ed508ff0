//! # NoteStore — Append-Only Note Collection with Nullification
//!
//! One store backs one ledger (a token's private balances, a vault's
//! custody balance, a router's wallets). Notes are appended at issuance and
//! never mutated or removed; spent-ness is decided solely by the global
//! [`NullifierSet`], which the store consults on every liveness check. This
//! split matters: the nullifier set is shared system-wide, while the note
//! collection is private to its ledger.
//!
//! ## Enumeration order
//!
//! `live_notes_of` yields an owner's live notes in issuance order — the
//! store assigns every note a monotonically increasing sequence number at
//! issue time and iterates by it. The ordering is not semantically
//! meaningful, but it is deterministic within a call, which makes bounded
//! selection reproducible for replay and testing.
//!
//! ## Read path
//!
//! Outside the ledger boundary a note is a [`NoteRecord`]: id plus sealed
//! payload, no owner, no value. The store is the custodian of the sealing
//! secret; [`scan`](NoteStore::scan) opens payloads only for a [`ViewKey`]
//! whose derived address matches the note's owner.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rand::RngCore;
use tracing::debug;

use crate::address::{Address, ViewKey};
use crate::config::{SEAL_KEY_DOMAIN, SEAL_KEY_LENGTH};
use crate::crypto::hash::derive_key;
use crate::crypto::seal;

use super::error::LedgerError;
use super::note::{Note, NoteId, NoteRecord, NoteValue, Nullifier};
use super::nullifier::NullifierSet;

/// Append-only, per-ledger collection of notes.
pub struct NoteStore {
    /// Sealing secret for payloads at rest. Drawn once at construction;
    /// never serialized, never exposed.
    ledger_secret: [u8; 32],

    /// Every note ever issued, keyed by issuance sequence number.
    notes: BTreeMap<u64, Note>,

    /// Note id -> issuance sequence number.
    index: HashMap<NoteId, u64>,

    /// Issuance sequence numbers per owner, in issuance order.
    by_owner: HashMap<Address, Vec<u64>>,

    /// Next issuance sequence number.
    next_seq: u64,

    /// The system-wide spent-note set, shared across all ledgers.
    nullifiers: Arc<NullifierSet>,
}

impl NoteStore {
    /// Creates an empty store wired to the given global nullifier set.
    pub fn new(nullifiers: Arc<NullifierSet>) -> Self {
        let mut ledger_secret = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut ledger_secret);
        Self {
            ledger_secret,
            notes: BTreeMap::new(),
            index: HashMap::new(),
            by_owner: HashMap::new(),
            next_seq: 0,
            nullifiers,
        }
    }

    /// A handle to the shared nullifier set.
    pub fn nullifier_set(&self) -> Arc<NullifierSet> {
        Arc::clone(&self.nullifiers)
    }

    // -----------------------------------------------------------------------
    // Issuance
    // -----------------------------------------------------------------------

    /// Issues a new live note to `owner` and returns its id.
    ///
    /// The uniqueness tag is drawn from the OS CSPRNG, so equal-value notes
    /// to the same owner get distinct ids (and therefore distinct
    /// nullifiers). The payload is sealed before the note is stored.
    pub fn issue(&mut self, owner: Address, value: NoteValue) -> Result<NoteId, LedgerError> {
        let mut tag = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut tag);

        let id = NoteId::derive(&owner, value, &tag);
        let sealed = seal::seal(&self.seal_key(&id), &value.to_le_bytes())?;

        let seq = self.next_seq;
        self.next_seq += 1;

        self.notes.insert(
            seq,
            Note {
                id,
                owner,
                value,
                tag,
                sealed,
            },
        );
        self.index.insert(id, seq);
        self.by_owner.entry(owner).or_default().push(seq);

        debug!(note = %id, seq, "note issued");
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Nullification
    // -----------------------------------------------------------------------

    /// Marks a note dead by recording its nullifier in the global set.
    ///
    /// Irreversible. Fails with [`LedgerError::UnknownNote`] if the note was
    /// never issued by this store, and with [`LedgerError::AlreadySpent`] if
    /// its nullifier already exists — the latter is fatal to the enclosing
    /// operation (double-spend attempt or stale read, never a silent retry).
    pub fn nullify(&mut self, id: &NoteId) -> Result<(), LedgerError> {
        let seq = *self.index.get(id).ok_or(LedgerError::UnknownNote(*id))?;
        let nullifier = self.notes[&seq].nullifier();

        self.nullifiers.record(nullifier)?;
        debug!(note = %id, "note nullified");
        Ok(())
    }

    /// Returns `true` if the note exists and its nullifier is unrecorded.
    pub fn is_live(&self, id: &NoteId) -> bool {
        self.index
            .get(id)
            .map(|seq| !self.nullifiers.contains(&self.notes[seq].nullifier()))
            .unwrap_or(false)
    }

    /// Whether a specific nullifier has been recorded.
    pub fn is_spent(&self, nullifier: &Nullifier) -> bool {
        self.nullifiers.contains(nullifier)
    }

    // -----------------------------------------------------------------------
    // Enumeration
    // -----------------------------------------------------------------------

    /// Iterates the owner's live notes in issuance order.
    ///
    /// Finite and restartable; the order is stable across calls as long as
    /// the store is not mutated in between, which is what makes chained
    /// selection steps reproducible.
    pub fn live_notes_of<'a>(&'a self, owner: &Address) -> impl Iterator<Item = &'a Note> + 'a {
        self.by_owner
            .get(owner)
            .into_iter()
            .flatten()
            .map(move |seq| &self.notes[seq])
            .filter(move |note| !self.nullifiers.contains(&note.nullifier()))
    }

    /// Number of live notes owned by `owner`.
    pub fn live_count(&self, owner: &Address) -> usize {
        self.live_notes_of(owner).count()
    }

    /// Looks up a note by id, live or dead.
    ///
    /// Ids stay addressable for the life of the store — consumers that
    /// recorded an id at issuance can always resolve it.
    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.index.get(id).map(|seq| &self.notes[seq])
    }

    // -----------------------------------------------------------------------
    // Public projections & the access-controlled read path
    // -----------------------------------------------------------------------

    /// The public projection of the whole store: ids and sealed payloads
    /// only. This is the shape persisted state and observers get.
    pub fn records(&self) -> Vec<NoteRecord> {
        self.notes.values().map(NoteRecord::from).collect()
    }

    /// Opens the live notes readable by `key` — the access-control
    /// predicate on the read path.
    ///
    /// Only notes whose owner the key proves are considered, and their
    /// values are recovered by opening the sealed payload, not by trusting
    /// ledger internals. A key proving an address with no notes yields an
    /// empty list.
    pub fn scan(&self, key: &ViewKey) -> Result<Vec<(NoteId, NoteValue)>, LedgerError> {
        // The address is derived from the key's secret, so enumerating by it
        // IS the ownership proof: a key cannot name an address it does not hold.
        let mut visible = Vec::new();
        for note in self.live_notes_of(&key.address()) {
            let plaintext = seal::open(&self.seal_key(&note.id), &note.sealed)?;
            if plaintext.len() != 16 {
                return Err(LedgerError::Seal(seal::SealError::OpenFailed));
            }
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(&plaintext);
            visible.push((note.id, NoteValue::from_le_bytes(bytes)));
        }
        Ok(visible)
    }

    /// Derives the AES key sealing one note's payload. Per-note keys: the
    /// note id is folded into the derivation so no two payloads ever share
    /// a key.
    fn seal_key(&self, id: &NoteId) -> [u8; SEAL_KEY_LENGTH] {
        let mut material = [0u8; 64];
        material[..32].copy_from_slice(&self.ledger_secret);
        material[32..].copy_from_slice(id.as_bytes());
        derive_key(SEAL_KEY_DOMAIN, &material)
    }
}

impl std::fmt::Debug for NoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Sealing secret redacted.
        f.debug_struct("NoteStore")
            .field("notes", &self.notes.len())
            .field("owners", &self.by_owner.len())
            .finish()
    }
}
