use crate::container::hash_function::{HashFunction, KeyHasher};
use log::debug;
use parking_lot::Mutex;

/// The directory stops doubling here; the routing mask cannot outgrow the
/// hash width.
const MAX_GLOBAL_DEPTH: usize = 64;

type BucketId = usize;

/// In-memory extendible hash table mapping keys to values, e.g. page ids to
/// frame ids inside the buffer pool. The directory doubles and buckets split
/// on demand; one coarse latch serialises all public operations.
///
/// Buckets live in an arena and the directory stores arena indices, so
/// several directory slots may alias one bucket without shared ownership.
pub struct ExtendibleHashTable<K, V, H = HashFunction<K>> {
    hash_fn: H,
    inner: Mutex<TableInner<K, V>>,
}

struct TableInner<K, V> {
    global_depth: usize,
    bucket_size: usize,
    num_buckets: usize,
    dir: Vec<BucketId>,
    buckets: Vec<Option<Bucket<K, V>>>,
    free_slots: Vec<BucketId>,
}

struct Bucket<K, V> {
    depth: usize,
    /// Low-bit pattern (width `depth`) shared by every key routed here.
    self_hash: u64,
    items: Vec<(K, V)>,
}

fn low_bits_mask(bits: usize) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

impl<K, V, H> ExtendibleHashTable<K, V, H>
where
    K: Eq,
    H: KeyHasher<K>,
{
    pub fn new(bucket_size: usize, hash_fn: H) -> Self {
        assert!(bucket_size > 0, "bucket size must be positive");
        Self {
            hash_fn,
            inner: Mutex::new(TableInner {
                global_depth: 0,
                bucket_size,
                num_buckets: 1,
                dir: vec![0],
                buckets: vec![Some(Bucket {
                    depth: 0,
                    self_hash: 0,
                    items: Vec::new(),
                })],
                free_slots: Vec::new(),
            }),
        }
    }

    /// Returns the value currently associated with `key`, if any.
    pub fn find(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let hash = self.hash_fn.get_hash(key);
        let inner = self.inner.lock();
        let bucket_id = inner.dir[inner.dir_index(hash)];
        inner
            .bucket(bucket_id)
            .items
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Removes the mapping for `key`; returns whether it existed.
    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hash_fn.get_hash(key);
        let mut inner = self.inner.lock();
        let bucket_id = inner.dir[inner.dir_index(hash)];
        let items = &mut inner.bucket_mut(bucket_id).items;
        match items.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                items.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Inserts `key -> value`, updating in place if the key is already
    /// present. Always succeeds: a full bucket is split, and a full bucket at
    /// global depth doubles the directory first.
    pub fn insert(&self, mut key: K, mut value: V) {
        let hash = self.hash_fn.get_hash(&key);
        let mut inner = self.inner.lock();
        loop {
            let bucket_id = inner.dir[inner.dir_index(hash)];
            match inner.insert_into(bucket_id, key, value) {
                None => return,
                Some(rejected) => {
                    key = rejected.0;
                    value = rejected.1;
                }
            }
            if self.split_bucket(&mut inner, bucket_id) {
                continue;
            }
            Self::expand_dirs(&mut inner);
        }
    }

    pub fn global_depth(&self) -> usize {
        self.inner.lock().global_depth
    }

    /// Local depth of the bucket behind directory slot `dir_index`, or `-1`
    /// if the slot is out of range.
    pub fn local_depth(&self, dir_index: usize) -> i32 {
        let inner = self.inner.lock();
        if dir_index >= inner.dir.len() {
            return -1;
        }
        inner.bucket(inner.dir[dir_index]).depth as i32
    }

    pub fn num_buckets(&self) -> usize {
        self.inner.lock().num_buckets
    }

    /// Splits a full bucket into two of local depth + 1 and rewires every
    /// directory slot that pointed at it. Fails only when the bucket already
    /// sits at global depth, in which case the directory must double first.
    fn split_bucket(&self, inner: &mut TableInner<K, V>, bucket_id: BucketId) -> bool {
        let (depth, self_hash) = {
            let bucket = inner.bucket(bucket_id);
            (bucket.depth, bucket.self_hash)
        };
        if depth == inner.global_depth {
            return false;
        }

        let items = std::mem::take(&mut inner.bucket_mut(bucket_id).items);
        inner.free_bucket(bucket_id);
        let bucket0 = inner.alloc_bucket(depth + 1, self_hash);
        let bucket1 = inner.alloc_bucket(depth + 1, (1u64 << depth) | self_hash);

        // Every slot matching the old self_hash pattern, 2^(gd - d) of them.
        for i in 0..(1usize << (inner.global_depth - depth)) {
            let idx = (i << depth) | self_hash as usize;
            inner.dir[idx] = if i & 1 == 0 { bucket0 } else { bucket1 };
        }
        inner.num_buckets += 1;
        debug!(
            "split bucket at pattern {:#b}/{} into depth {}",
            self_hash,
            depth,
            depth + 1
        );

        for (key, val) in items {
            let target = inner.dir[inner.dir_index(self.hash_fn.get_hash(&key))];
            let rejected = inner.insert_into(target, key, val);
            debug_assert!(
                rejected.is_none(),
                "redistributed entry must land in a fresh bucket"
            );
        }
        true
    }

    /// Doubles the directory; each new slot initially aliases the bucket of
    /// its low-bit image.
    fn expand_dirs(inner: &mut TableInner<K, V>) {
        assert!(
            inner.global_depth < MAX_GLOBAL_DEPTH,
            "extendible hash directory cannot grow beyond {} bits",
            MAX_GLOBAL_DEPTH
        );
        let mask = low_bits_mask(inner.global_depth) as usize;
        let mut new_dir = Vec::with_capacity(inner.dir.len() * 2);
        for i in 0..inner.dir.len() * 2 {
            new_dir.push(inner.dir[i & mask]);
        }
        inner.dir = new_dir;
        inner.global_depth += 1;
        debug!("doubled directory, global depth now {}", inner.global_depth);
    }
}

impl<K, V> TableInner<K, V>
where
    K: Eq,
{
    fn dir_index(&self, hash: u64) -> usize {
        (hash & low_bits_mask(self.global_depth)) as usize
    }

    fn bucket(&self, id: BucketId) -> &Bucket<K, V> {
        self.buckets[id].as_ref().expect("dangling bucket index")
    }

    fn bucket_mut(&mut self, id: BucketId) -> &mut Bucket<K, V> {
        self.buckets[id].as_mut().expect("dangling bucket index")
    }

    fn alloc_bucket(&mut self, depth: usize, self_hash: u64) -> BucketId {
        let bucket = Bucket {
            depth,
            self_hash,
            items: Vec::new(),
        };
        match self.free_slots.pop() {
            Some(id) => {
                self.buckets[id] = Some(bucket);
                id
            }
            None => {
                self.buckets.push(Some(bucket));
                self.buckets.len() - 1
            }
        }
    }

    fn free_bucket(&mut self, id: BucketId) {
        self.buckets[id] = None;
        self.free_slots.push(id);
    }

    /// Insert-or-update into one bucket. Returns the pair back when the
    /// bucket is full so the caller can retry after splitting.
    fn insert_into(&mut self, bucket_id: BucketId, key: K, value: V) -> Option<(K, V)> {
        let bucket_size = self.bucket_size;
        let bucket = self.bucket_mut(bucket_id);
        if let Some(entry) = bucket.items.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
            return None;
        }
        if bucket.items.len() >= bucket_size {
            return Some((key, value));
        }
        bucket.items.push((key, value));
        None
    }
}
