use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use xxhash_rust::xxh3::Xxh3;

/// Hashing seam for keyed containers. Containers route keys through this
/// trait so callers can swap the hash (tests use deterministic hashers to
/// steer keys into specific buckets).
pub trait KeyHasher<K> {
    /// Returns the hash value of the given key.
    fn get_hash(&self, key: &K) -> u64;
}

/// Represents a hash function for a given key type.
pub struct HashFunction<K> {
    _marker: PhantomData<K>,
}

impl<K> HashFunction<K> {
    /// Creates a new `HashFunction`.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<K> Default for HashFunction<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> KeyHasher<K> for HashFunction<K>
where
    K: Hash,
{
    fn get_hash(&self, key: &K) -> u64 {
        let mut hasher = Xxh3::new();
        key.hash(&mut hasher);
        hasher.finish()
    }
}
