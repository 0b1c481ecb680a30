use crate::common::config::FrameId;
use log::trace;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

#[derive(Clone, Copy, Debug)]
pub enum AccessType {
    Unknown = 0,
    Lookup,
    Scan,
    Index,
}

#[derive(Debug)]
struct FrameRec {
    visit_count: usize,
    evictable: bool,
}

/// LRU-K replacement policy over buffer pool frames.
///
/// Frames with fewer than `k` recorded accesses are "cold" and sit in a
/// history list ordered by first access; they are evicted first, FIFO. Frames
/// with at least `k` accesses move to a buffer list ordered by most recent
/// access and are evicted LRU, least recent first. A cold frame is always
/// preferred as a victim over a warm one, no matter how recently it was
/// touched.
pub struct LRUKReplacer {
    inner: Mutex<ReplacerInner>,
    replacer_size: usize,
    k: usize,
}

struct ReplacerInner {
    rec_map: HashMap<FrameId, FrameRec>,
    /// Frames with `visit_count < k`, in order of first access.
    history_list: VecDeque<FrameId>,
    /// Frames with `visit_count >= k`, least recently accessed at the front.
    buffer_list: VecDeque<FrameId>,
    evictable_count: usize,
}

impl LRUKReplacer {
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k >= 1, "lru-k needs k >= 1");
        Self {
            inner: Mutex::new(ReplacerInner {
                rec_map: HashMap::new(),
                history_list: VecDeque::new(),
                buffer_list: VecDeque::new(),
                evictable_count: 0,
            }),
            replacer_size: num_frames,
            k,
        }
    }

    /// Registers one touch of `frame_id`. Unknown frames start cold and
    /// non-evictable; the k-th touch promotes a frame to the buffer list.
    pub fn record_access(&self, frame_id: FrameId, _access_type: AccessType) {
        assert!(
            (frame_id as usize) < self.replacer_size,
            "frame id {} out of range for replacer of {} frames",
            frame_id,
            self.replacer_size
        );
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if let Some(rec) = inner.rec_map.get_mut(&frame_id) {
            if rec.visit_count < self.k {
                rec.visit_count += 1;
                if rec.visit_count == self.k {
                    // Graduates from the FIFO history list to the LRU buffer
                    // list.
                    detach(&mut inner.history_list, frame_id);
                    inner.buffer_list.push_back(frame_id);
                }
            } else {
                detach(&mut inner.buffer_list, frame_id);
                inner.buffer_list.push_back(frame_id);
            }
            return;
        }
        // Newcomer. The pool only records frames it owns, so the tracked set
        // can never outgrow the pool.
        debug_assert!(
            inner.history_list.len() + inner.buffer_list.len() < self.replacer_size,
            "replacer already tracks every frame"
        );
        inner.rec_map.insert(
            frame_id,
            FrameRec {
                visit_count: 1,
                evictable: false,
            },
        );
        inner.history_list.push_back(frame_id);
    }

    /// Toggles eviction eligibility. A no-op for untracked frames or when the
    /// flag is unchanged.
    pub fn set_evictable(&self, frame_id: FrameId, set_evictable: bool) {
        let mut inner = self.inner.lock();
        let Some(rec) = inner.rec_map.get_mut(&frame_id) else {
            return;
        };
        if rec.evictable == set_evictable {
            return;
        }
        rec.evictable = set_evictable;
        if set_evictable {
            inner.evictable_count += 1;
        } else {
            inner.evictable_count -= 1;
        }
    }

    /// Picks, removes, and returns the best victim: the oldest evictable
    /// history frame first, then the least recently used evictable buffer
    /// frame.
    pub fn evict(&self) -> Option<FrameId> {
        let mut inner = self.inner.lock();
        if inner.evictable_count == 0 {
            return None;
        }
        let victim = Self::scan_evictable(&inner.history_list, &inner.rec_map)
            .or_else(|| Self::scan_evictable(&inner.buffer_list, &inner.rec_map))
            .unwrap_or_else(|| {
                panic!(
                    "lru-k replacer inconsistent: {} frames evictable but none found",
                    inner.evictable_count
                )
            });
        inner.drop_frame(victim);
        trace!("evicting frame {}", victim);
        Some(victim)
    }

    /// Force-forgets `frame_id`, e.g. when its page is deleted. The frame
    /// must be evictable.
    pub fn remove(&self, frame_id: FrameId) {
        let mut inner = self.inner.lock();
        let Some(rec) = inner.rec_map.get(&frame_id) else {
            return;
        };
        assert!(rec.evictable, "cannot remove a pinned frame {}", frame_id);
        inner.drop_frame(frame_id);
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.inner.lock().evictable_count
    }

    /// Number of tracked frames, evictable or not.
    pub fn total_frames(&self) -> usize {
        self.inner.lock().rec_map.len()
    }

    fn scan_evictable(
        list: &VecDeque<FrameId>,
        rec_map: &HashMap<FrameId, FrameRec>,
    ) -> Option<FrameId> {
        list.iter().copied().find(|id| rec_map[id].evictable)
    }
}

impl ReplacerInner {
    /// Removes `frame_id` from its list, the record map, and the evictable
    /// count.
    fn drop_frame(&mut self, frame_id: FrameId) {
        let rec = self
            .rec_map
            .remove(&frame_id)
            .expect("frame must be tracked");
        let k_reached = self.buffer_list.contains(&frame_id);
        debug_assert!(k_reached || self.history_list.contains(&frame_id));
        if k_reached {
            detach(&mut self.buffer_list, frame_id);
        } else {
            detach(&mut self.history_list, frame_id);
        }
        if rec.evictable {
            self.evictable_count -= 1;
        }
    }
}

fn detach(list: &mut VecDeque<FrameId>, frame_id: FrameId) {
    let pos = list
        .iter()
        .position(|&id| id == frame_id)
        .expect("frame must be in exactly one list");
    list.remove(pos);
}
