use crate::common::logger::initialize_logger;
use magnetite::buffer::lru_k_replacer::{AccessType, LRUKReplacer};
use std::sync::Arc;
use std::thread;

#[test]
fn basic_two_list_walk() {
    initialize_logger();
    let replacer = LRUKReplacer::new(7, 2);

    // Scenario: add six frames to the replacer. [1,2,3,4,5] are evictable,
    // frame 6 stays pinned.
    for i in 1..=6 {
        replacer.record_access(i, AccessType::Lookup);
    }
    for i in 1..=5 {
        replacer.set_evictable(i, true);
    }
    replacer.set_evictable(6, false);
    assert_eq!(replacer.size(), 5, "Size should be 5 when 5 frames are evictable");
    assert_eq!(replacer.total_frames(), 6, "Total frames should be 6 after adding all frames");

    // Scenario: a second access promotes frame 1 into the warm buffer list.
    replacer.record_access(1, AccessType::Lookup);

    // Scenario: cold frames go first, in order of first access: 2, 3, 4.
    assert_eq!(replacer.evict(), Some(2), "First evicted frame should be 2");
    assert_eq!(replacer.evict(), Some(3), "Second evicted frame should be 3");
    assert_eq!(replacer.evict(), Some(4), "Third evicted frame should be 4");
    assert_eq!(replacer.size(), 2, "Size should be 2 after three evictions");

    // Scenario: reinsert frames 3 and 4; a second touch on 5 promotes it.
    replacer.record_access(3, AccessType::Lookup);
    replacer.record_access(4, AccessType::Lookup);
    replacer.record_access(5, AccessType::Lookup);
    replacer.set_evictable(3, true);
    replacer.set_evictable(4, true);
    assert_eq!(replacer.size(), 4, "Size should be 4 after adding two more evictable frames");

    // Scenario: 3 is now the oldest evictable cold frame.
    assert_eq!(replacer.evict(), Some(3), "Fourth evicted frame should be 3");
    assert_eq!(replacer.size(), 3, "Size should be 3 after one more eviction");

    // Scenario: unpinning frame 6 makes it the oldest cold frame.
    replacer.set_evictable(6, true);
    assert_eq!(replacer.size(), 4, "Size should be 4 after making frame 6 evictable");
    assert_eq!(replacer.evict(), Some(6), "Fifth evicted frame should be 6");
    assert_eq!(replacer.size(), 3, "Size should be 3 after evicting frame 6");

    // Scenario: pin frame 1; the one remaining cold frame beats any warm one.
    replacer.set_evictable(1, false);
    assert_eq!(replacer.size(), 2, "Size should be 2 after making frame 1 non-evictable");
    assert_eq!(replacer.evict(), Some(4), "Sixth evicted frame should be 4");
    assert_eq!(replacer.size(), 1, "Size should be 1 after evicting frame 4");

    // Scenario: touch frame 1 again. The warm list is now [5, 1], so 5 is
    // the next victim.
    replacer.set_evictable(1, true);
    replacer.record_access(1, AccessType::Lookup);
    assert_eq!(replacer.size(), 2, "Size should be 2 after making frame 1 evictable again");
    assert_eq!(replacer.evict(), Some(5), "Seventh evicted frame should be 5");
    assert_eq!(replacer.evict(), Some(1), "Eighth evicted frame should be 1");
    assert_eq!(replacer.size(), 0, "Size should be 0 after all evictions");

    // Evicting from an empty replacer does not modify size.
    assert!(replacer.evict().is_none(), "Eviction from an empty replacer should return None");
    assert_eq!(replacer.size(), 0, "Size should remain 0 after attempting to evict from empty replacer");
}

#[test]
fn cold_frames_evict_before_warm() {
    initialize_logger();
    let replacer = LRUKReplacer::new(3, 2);

    replacer.record_access(0, AccessType::Lookup);
    replacer.record_access(1, AccessType::Lookup);
    replacer.record_access(2, AccessType::Lookup);
    replacer.set_evictable(0, true);
    replacer.set_evictable(1, true);
    replacer.set_evictable(2, true);

    // The second touch moves frame 1 into the warm list.
    replacer.record_access(1, AccessType::Lookup);

    // Frame 1 was touched most recently but has k accesses; the cold frames
    // 0 and 2 are evicted first, in first-access order.
    assert_eq!(replacer.evict(), Some(0), "Oldest cold frame goes first");
    assert_eq!(replacer.evict(), Some(2), "Remaining cold frame goes before any warm frame");
    assert_eq!(replacer.evict(), Some(1), "Warm frame goes last");
    assert!(replacer.evict().is_none());
}

#[test]
fn edge_cases() {
    initialize_logger();
    let replacer = LRUKReplacer::new(5, 2);

    // Edge case: evict from an empty replacer.
    assert!(replacer.evict().is_none(), "Eviction from an empty replacer should return None");
    assert_eq!(replacer.size(), 0);
    assert_eq!(replacer.total_frames(), 0);

    // Edge case: a newly recorded frame starts non-evictable.
    replacer.record_access(1, AccessType::Lookup);
    replacer.set_evictable(1, false);
    assert_eq!(replacer.size(), 0, "Size should remain 0 while the frame is non-evictable");
    assert_eq!(replacer.total_frames(), 1);
    assert!(replacer.evict().is_none(), "Eviction of a non-evictable frame should return None");

    // Edge case: set it back to evictable and evict.
    replacer.set_evictable(1, true);
    assert_eq!(replacer.size(), 1);
    assert_eq!(replacer.evict(), Some(1));
    assert_eq!(replacer.size(), 0);
    assert_eq!(replacer.total_frames(), 0);

    // Edge case: one evictable and one non-evictable frame.
    replacer.record_access(2, AccessType::Lookup);
    replacer.record_access(3, AccessType::Lookup);
    replacer.set_evictable(2, false);
    replacer.set_evictable(3, true);
    assert_eq!(replacer.size(), 1, "Size should be 1 when one frame is evictable");
    assert_eq!(replacer.total_frames(), 2);
    assert_eq!(replacer.evict(), Some(3), "Eviction should return frame 3");
    assert_eq!(replacer.size(), 0);
    assert_eq!(replacer.total_frames(), 1, "The non-evictable frame stays tracked");
}

#[test]
fn removal() {
    initialize_logger();
    let replacer = LRUKReplacer::new(6, 2);

    for i in 1..=5 {
        replacer.record_access(i, AccessType::Lookup);
        replacer.set_evictable(i, true);
    }

    // Remove some frames manually, e.g. because their pages were deleted.
    replacer.remove(3);
    replacer.remove(4);
    assert_eq!(replacer.size(), 3);

    // Removing an untracked frame is a no-op.
    replacer.remove(3);
    assert_eq!(replacer.size(), 3);

    for _ in 0..3 {
        let value = replacer.evict().expect("three frames remain");
        assert_ne!(value, 3);
        assert_ne!(value, 4);
    }
    assert!(replacer.evict().is_none());
}

#[test]
fn concurrent_access() {
    initialize_logger();
    let replacer = Arc::new(LRUKReplacer::new(10, 2));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let replacer = Arc::clone(&replacer);
            thread::spawn(move || {
                replacer.record_access(i, AccessType::Lookup);
                replacer.set_evictable(i, true);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Every frame was registered and is evictable.
    assert_eq!(replacer.size(), 10);
    for _ in 0..10 {
        assert!(replacer.evict().is_some());
    }
    assert_eq!(replacer.size(), 0);
}
