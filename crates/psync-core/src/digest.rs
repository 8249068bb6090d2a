//! Wraps `psync_iblt::Iblt` with the name-hashing steps PSync's
//! `insertName`/`eraseName` use: hash `NameAtSeq::toUri()` down to a `u32`
//! element identity before touching the table; `diff` is subtraction
//! followed by peel-decoding.

use bytes::Bytes;
use psync_iblt::{murmur3_32_str, DiffResult, Iblt, IbltError};
use psync_types::Name;

/// Seed for the name-identity hash (`insertName`'s `murmur3_32(name.toUri())`).
/// Distinct from [`crate::engine::N_HASHCHECK`], which probes for a *specific*
/// future sequence rather than identifying an arbitrary element.
pub const IBLT_HASH_SEED: u32 = 0;

#[derive(Debug, Clone)]
pub struct DigestEngine {
    iblt: Iblt,
}

impl DigestEngine {
    pub fn new(expected_entries: usize) -> Self {
        Self {
            iblt: Iblt::new(expected_entries),
        }
    }

    pub fn hash_of(name_at_seq: &Name) -> u32 {
        murmur3_32_str(&name_at_seq.to_uri(), IBLT_HASH_SEED)
    }

    pub fn insert_hash(&mut self, hash: u32) {
        self.iblt.insert(hash);
    }

    pub fn erase_hash(&mut self, hash: u32) {
        self.iblt.erase(hash);
    }

    pub fn insert_name(&mut self, name_at_seq: &Name) {
        self.insert_hash(Self::hash_of(name_at_seq));
    }

    pub fn erase_name(&mut self, name_at_seq: &Name) {
        self.erase_hash(Self::hash_of(name_at_seq));
    }

    pub fn num_elements(&self) -> usize {
        self.iblt.num_elements()
    }

    pub fn serialize(&self) -> Bytes {
        self.iblt.to_name_component()
    }

    pub fn deserialize(expected_entries: usize, bytes: Bytes) -> Result<Iblt, IbltError> {
        Iblt::from_name_component(expected_entries, bytes)
    }

    /// `self - other`, peel-decoded into `{positive, negative, decoded}`.
    pub fn diff(&self, other: &Iblt) -> Result<DiffResult, IbltError> {
        Ok(self.iblt.subtract(other)?.list_entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_erase_returns_to_empty() {
        let mut engine = DigestEngine::new(20);
        let name = Name::from_uri("/a").append_number(1);
        engine.insert_name(&name);
        assert_eq!(engine.num_elements(), 1);
        engine.erase_name(&name);
        assert_eq!(engine.num_elements(), 0);
    }

    #[test]
    fn diff_against_empty_recovers_all_as_positive() {
        let mut engine = DigestEngine::new(20);
        let a = Name::from_uri("/a").append_number(1);
        let b = Name::from_uri("/b").append_number(1);
        engine.insert_name(&a);
        engine.insert_name(&b);

        let empty = Iblt::new(20);
        let diff = engine.diff(&empty).unwrap();
        assert!(diff.decoded);
        assert_eq!(diff.positive.len(), 2);
        assert!(diff.negative.is_empty());
    }
}
