use crate::common::config::{Lsn, PageId, DB_PAGE_SIZE, INVALID_PAGE_ID};
use crate::common::exception::PageError;
use log::error;

const OFFSET_LSN: usize = 4;

/// Page is the basic unit of storage within the database system. Page provides
/// a wrapper for actual data pages being held in main memory. Page also
/// contains book-keeping information that is used by the buffer pool manager,
/// e.g. pin count, dirty flag, page id, etc.
///
/// The buffer pool keeps each page behind a reader/writer latch; that latch
/// protects the payload and all three metadata fields.
#[derive(Debug)]
pub struct Page {
    /// The actual data that is stored within a page.
    data: Box<[u8; DB_PAGE_SIZE]>,
    /// The ID of this page, `INVALID_PAGE_ID` while the frame is free.
    page_id: PageId,
    /// The pin count of this page.
    pin_count: i32,
    /// True if the page is dirty.
    is_dirty: bool,
}

impl Page {
    /// Constructor. Zeros out the page data and leaves the frame free.
    pub fn new() -> Self {
        Page {
            data: Box::new([0; DB_PAGE_SIZE]),
            page_id: INVALID_PAGE_ID,
            pin_count: 0,
            is_dirty: false,
        }
    }

    /// Returns the page id of this page.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns true if the page is dirty.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// Returns the pin count of this page.
    pub fn pin_count(&self) -> i32 {
        self.pin_count
    }

    /// Returns an immutable reference to the page payload.
    pub fn data(&self) -> &[u8; DB_PAGE_SIZE] {
        &self.data
    }

    /// Returns a mutable reference to the page payload. The caller reports
    /// the write through `unpin_page(.., is_dirty = true, ..)`.
    pub fn data_mut(&mut self) -> &mut [u8; DB_PAGE_SIZE] {
        &mut self.data
    }

    /// Copies `new_data` into the payload at `offset`, bounds-checked.
    pub fn set_data(&mut self, offset: usize, new_data: &[u8]) -> Result<(), PageError> {
        if offset >= self.data.len() {
            return Err(PageError::InvalidOffset {
                offset,
                page_size: self.data.len(),
            });
        }
        let remaining_space = self.data.len() - offset;
        if new_data.len() > remaining_space {
            return Err(PageError::DataTooLarge {
                data_size: new_data.len(),
                remaining_space,
            });
        }
        self.data[offset..offset + new_data.len()].copy_from_slice(new_data);
        self.is_dirty = true;
        Ok(())
    }

    /// Returns the page LSN stored in the page header.
    pub fn lsn(&self) -> Lsn {
        let bytes = &self.data[OFFSET_LSN..OFFSET_LSN + 4];
        Lsn::from_ne_bytes(bytes.try_into().expect("lsn header slice is 4 bytes"))
    }

    /// Sets the page LSN in the page header.
    pub fn set_lsn(&mut self, lsn: Lsn) {
        self.data[OFFSET_LSN..OFFSET_LSN + 4].copy_from_slice(&lsn.to_ne_bytes());
    }

    /// Zeroes out the data that is held within the page.
    pub fn reset_memory(&mut self) {
        self.data.fill(0);
    }

    pub(crate) fn set_page_id(&mut self, page_id: PageId) {
        self.page_id = page_id;
    }

    pub(crate) fn set_dirty(&mut self, is_dirty: bool) {
        self.is_dirty = is_dirty;
    }

    pub(crate) fn set_pin_count(&mut self, pin_count: i32) {
        self.pin_count = pin_count;
    }

    pub(crate) fn increment_pin_count(&mut self) {
        self.pin_count += 1;
    }

    pub(crate) fn decrement_pin_count(&mut self) {
        if self.pin_count > 0 {
            self.pin_count -= 1;
        } else {
            error!(
                "Attempted to decrement pin count below 0 for Page ID {}",
                self.page_id
            );
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
