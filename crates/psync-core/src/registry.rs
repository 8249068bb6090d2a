//! Tracks each owned prefix's current sequence and most recent piggybacked
//! data block, and the reverse `hash -> prefix` mapping the digest diff
//! resolves against.

use crate::error::RegistryError;
use bytes::Bytes;
use psync_iblt::murmur3_32_str;
use psync_types::Name;
use std::collections::HashMap;

/// One per locally registered prefix. `seq == 0` means "registered but not
/// yet published"; `seq > 0` means the owner has published that sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixEntry {
    pub seq: u64,
    pub last_block: Option<Bytes>,
}

#[derive(Debug, Default)]
pub struct PrefixRegistry {
    entries: HashMap<Name, PrefixEntry>,
    hash_to_prefix: HashMap<u32, Name>,
}

/// Hashes `prefix ++ seq` the way the IBLT expects: `murmur3_32(name.toUri())`.
pub fn hash_name_at_seq(prefix: &Name, seq: u64) -> u32 {
    murmur3_32_str(&prefix.append_number(seq).to_uri(), super::digest::IBLT_HASH_SEED)
}

impl PrefixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent; does not touch the IBLT (seq stays 0 until a publish).
    pub fn add_prefix(&mut self, prefix: Name) {
        self.entries.entry(prefix).or_default();
    }

    pub fn contains(&self, prefix: &Name) -> bool {
        self.entries.contains_key(prefix)
    }

    pub fn current_seq(&self, prefix: &Name) -> Option<u64> {
        self.entries.get(prefix).map(|entry| entry.seq)
    }

    pub fn block_for(&self, prefix: &Name, seq: u64) -> Option<Bytes> {
        let entry = self.entries.get(prefix)?;
        if entry.seq == seq {
            entry.last_block.clone()
        } else {
            None
        }
    }

    pub fn prefix_of_hash(&self, hash: u32) -> Option<&Name> {
        self.hash_to_prefix.get(&hash)
    }

    /// `removeUserNode`: drops a registered prefix entirely. Returns the
    /// hash the caller must erase from the `DigestEngine`'s IBLT when the
    /// prefix had already published (`seq > 0`); `None` when the prefix was
    /// unregistered or never published, in which case there is nothing to
    /// erase from the digest.
    pub fn remove(&mut self, prefix: &Name) -> Option<u32> {
        let entry = self.entries.remove(prefix)?;
        if entry.seq == 0 {
            return None;
        }
        let hash = hash_name_at_seq(prefix, entry.seq);
        self.hash_to_prefix.remove(&hash);
        Some(hash)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Name, &PrefixEntry)> {
        self.entries.iter()
    }

    /// Advances `prefix` to `new_seq`, returning the two hashes the caller
    /// must erase/insert into the `DigestEngine`'s IBLT: `(old_hash,
    /// new_hash)`, where `old_hash` is `None` when `old_seq == 0` (nothing
    /// to erase: `erase(hash(prefix++old))`, skipped if `old == 0`, then
    /// `insert(hash(prefix++new))`).
    pub fn advance(
        &mut self,
        prefix: &Name,
        new_seq: u64,
        block: Option<Bytes>,
    ) -> Result<(Option<u32>, u32), RegistryError> {
        let entry = self
            .entries
            .get_mut(prefix)
            .ok_or_else(|| RegistryError::UnknownPrefix(prefix.to_uri()))?;

        let old_hash = if entry.seq > 0 {
            let old_hash = hash_name_at_seq(prefix, entry.seq);
            self.hash_to_prefix.remove(&old_hash);
            Some(old_hash)
        } else {
            None
        };

        entry.seq = new_seq;
        entry.last_block = block;

        let new_hash = hash_name_at_seq(prefix, new_seq);
        self.hash_to_prefix.insert(new_hash, prefix.clone());

        Ok((old_hash, new_hash))
    }
}
