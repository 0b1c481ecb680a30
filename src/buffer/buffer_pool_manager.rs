use crate::buffer::lru_k_replacer::{AccessType, LRUKReplacer};
use crate::common::config::{FrameId, PageId, BUCKET_SIZE, INVALID_PAGE_ID};
use crate::container::extendible_hash_table::ExtendibleHashTable;
use crate::container::hash_function::HashFunction;
use crate::recovery::log_manager::LogManager;
use crate::storage::disk::disk_manager::DiskIO;
use crate::storage::page::page::Page;
use log::debug;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// BufferPoolManager mediates all access between higher layers and durable
/// page storage. It owns a fixed array of page frames, a free list, an
/// extendible-hash page table mapping page ids to frame ids, and an LRU-K
/// replacer that picks eviction victims among unpinned frames.
///
/// Latching: the free-list mutex doubles as the pool-wide latch and is held
/// for the full duration of every public operation. The page-table and
/// replacer latches are only ever acquired beneath it, and per-frame latches
/// beneath those. Disk I/O happens while the pool latch is held; throughput
/// is bounded by serial I/O.
pub struct BufferPoolManager {
    pool_size: usize,
    /// Monotonic page-id allocator, starting at 0.
    next_page_id: AtomicI32,
    pages: Vec<Arc<RwLock<Page>>>,
    page_table: ExtendibleHashTable<PageId, FrameId>,
    replacer: LRUKReplacer,
    free_list: Mutex<Vec<FrameId>>,
    disk_manager: Arc<dyn DiskIO>,
    log_manager: Option<Arc<LogManager>>,
}

impl BufferPoolManager {
    /// Creates a new BufferPoolManager.
    ///
    /// # Arguments
    ///
    /// * `pool_size`: the number of frames in the buffer pool
    /// * `disk_manager`: the backing page store
    /// * `replacer_k`: the lookback constant k for the LRU-K replacer
    /// * `log_manager`: stored for higher layers; unused by the pool itself
    pub fn new(
        pool_size: usize,
        disk_manager: Arc<dyn DiskIO>,
        replacer_k: usize,
        log_manager: Option<Arc<LogManager>>,
    ) -> Self {
        Self::with_bucket_size(pool_size, disk_manager, replacer_k, log_manager, BUCKET_SIZE)
    }

    /// As `new`, with an explicit bucket size for the page table.
    pub fn with_bucket_size(
        pool_size: usize,
        disk_manager: Arc<dyn DiskIO>,
        replacer_k: usize,
        log_manager: Option<Arc<LogManager>>,
        bucket_size: usize,
    ) -> Self {
        assert!(pool_size > 0, "buffer pool needs at least one frame");
        let pages = (0..pool_size)
            .map(|_| Arc::new(RwLock::new(Page::new())))
            .collect();
        // Initially, every frame is in the free list.
        let free_list: Vec<FrameId> = (0..pool_size as FrameId).collect();
        Self {
            pool_size,
            next_page_id: AtomicI32::new(0),
            pages,
            page_table: ExtendibleHashTable::new(bucket_size, HashFunction::new()),
            replacer: LRUKReplacer::new(pool_size, replacer_k),
            free_list: Mutex::new(free_list),
            disk_manager,
            log_manager,
        }
    }

    pub fn get_pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn log_manager(&self) -> Option<&Arc<LogManager>> {
        self.log_manager.as_ref()
    }

    /// Creates a new page in the buffer pool and returns it pinned, with its
    /// payload zeroed. Returns `None` only when every frame is occupied and
    /// none is evictable.
    pub fn new_page(&self) -> Option<Arc<RwLock<Page>>> {
        let mut free_list = self.free_list.lock();
        let frame_id = self.alloc_frame_id(&mut free_list)?;

        self.replacer.record_access(frame_id, AccessType::Lookup);
        self.replacer.set_evictable(frame_id, false);
        let page_id = self.allocate_page();
        self.page_table.insert(page_id, frame_id);

        let frame = &self.pages[frame_id as usize];
        {
            let mut page = frame.write();
            page.set_page_id(page_id);
            page.set_pin_count(1);
            page.set_dirty(false);
            page.reset_memory();
        }
        debug!("created page {} in frame {}", page_id, frame_id);
        Some(Arc::clone(frame))
    }

    /// Fetches the requested page, pinned. A resident page is returned
    /// directly; otherwise a frame is acquired (free list first, then
    /// eviction) and the page is read from disk. Returns `None` when the page
    /// is not resident and no frame can be obtained.
    pub fn fetch_page(&self, page_id: PageId) -> Option<Arc<RwLock<Page>>> {
        let mut free_list = self.free_list.lock();
        if let Some(frame_id) = self.page_table.find(&page_id) {
            self.replacer.record_access(frame_id, AccessType::Lookup);
            self.replacer.set_evictable(frame_id, false);
            let frame = &self.pages[frame_id as usize];
            frame.write().increment_pin_count();
            return Some(Arc::clone(frame));
        }

        let frame_id = self.alloc_frame_id(&mut free_list)?;
        self.replacer.record_access(frame_id, AccessType::Lookup);
        self.replacer.set_evictable(frame_id, false);
        self.page_table.insert(page_id, frame_id);

        let frame = &self.pages[frame_id as usize];
        {
            let mut page = frame.write();
            page.set_page_id(page_id);
            page.set_pin_count(1);
            page.set_dirty(false);
            self.disk_manager
                .read_page(page_id, page.data_mut())
                .expect("disk read failed while fetching page");
        }
        debug!("fetched page {} into frame {}", page_id, frame_id);
        Some(Arc::clone(frame))
    }

    /// Drops one pin on `page_id`, OR-ing `is_dirty` into the frame's dirty
    /// flag. The frame becomes evictable when its pin count reaches zero.
    /// Returns false when the page is not resident or already unpinned.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool, _access_type: AccessType) -> bool {
        let _free_list = self.free_list.lock();
        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let mut page = self.pages[frame_id as usize].write();
        if page.pin_count() == 0 {
            return false;
        }
        page.decrement_pin_count();
        if page.pin_count() == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        // Dirty is sticky until the page is flushed or the frame reused.
        let dirty = page.is_dirty() || is_dirty;
        page.set_dirty(dirty);
        true
    }

    /// Writes the page back to disk unconditionally and clears its dirty
    /// flag. Returns whether the page was resident.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        let _free_list = self.free_list.lock();
        assert!(
            page_id != INVALID_PAGE_ID,
            "page_id cannot be INVALID_PAGE_ID"
        );
        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let mut page = self.pages[frame_id as usize].write();
        self.disk_manager
            .write_page(page_id, page.data())
            .expect("disk write failed while flushing page");
        page.set_dirty(false);
        true
    }

    /// Writes every resident dirty page back to disk.
    pub fn flush_all_pages(&self) {
        let _free_list = self.free_list.lock();
        for frame in &self.pages {
            let mut page = frame.write();
            if page.page_id() != INVALID_PAGE_ID && page.is_dirty() {
                self.disk_manager
                    .write_page(page.page_id(), page.data())
                    .expect("disk write failed while flushing pages");
                page.set_dirty(false);
            }
        }
    }

    /// Deletes a page from the pool, returning its frame to the free list.
    /// Returns true when the page is not resident (nothing to do) and false
    /// when it is still pinned.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut free_list = self.free_list.lock();
        let Some(frame_id) = self.page_table.find(&page_id) else {
            return true;
        };
        let mut page = self.pages[frame_id as usize].write();
        if page.pin_count() > 0 {
            return false;
        }
        self.replacer.remove(frame_id);
        if page.is_dirty() {
            self.disk_manager
                .write_page(page_id, page.data())
                .expect("disk write failed while deleting page");
        }
        self.page_table.remove(&page_id);
        page.set_page_id(INVALID_PAGE_ID);
        page.set_pin_count(0);
        page.set_dirty(false);
        page.reset_memory();
        drop(page);

        free_list.push(frame_id);
        self.deallocate_page(page_id);
        debug!("deleted page {} from frame {}", page_id, frame_id);
        true
    }

    /// Secures a frame: the free-list tail first, then an eviction victim.
    /// A dirty victim is written back and its mapping removed before reuse.
    fn alloc_frame_id(&self, free_list: &mut Vec<FrameId>) -> Option<FrameId> {
        if free_list.is_empty() && self.replacer.size() == 0 {
            return None;
        }
        if let Some(frame_id) = free_list.pop() {
            return Some(frame_id);
        }
        let frame_id = self
            .replacer
            .evict()
            .expect("replacer should evict after reporting evictable frames");
        let evict_pid = {
            let mut page = self.pages[frame_id as usize].write();
            let evict_pid = page.page_id();
            if page.is_dirty() {
                assert!(
                    evict_pid != INVALID_PAGE_ID,
                    "dirty frame must hold a valid page"
                );
                self.disk_manager
                    .write_page(evict_pid, page.data())
                    .expect("disk write failed while evicting page");
                page.set_dirty(false);
            }
            evict_pid
        };
        let removed = self.page_table.remove(&evict_pid);
        assert!(removed, "evicted page must have been mapped");
        debug!("evicted page {} from frame {}", evict_pid, frame_id);
        Some(frame_id)
    }

    fn allocate_page(&self) -> PageId {
        self.next_page_id.fetch_add(1, Ordering::SeqCst)
    }

    fn deallocate_page(&self, _page_id: PageId) {
        // Page ids are never reused at this layer; the id space only grows.
    }
}
