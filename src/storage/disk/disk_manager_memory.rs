use crate::common::config::{PageId, DB_PAGE_SIZE};
use crate::storage::disk::disk_manager::DiskIO;
use log::trace;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::{Error, ErrorKind, Result as IoResult};

/// DiskManagerMemory replicates the utility of DiskManager on memory. It is
/// primarily used for data structure performance testing.
pub struct DiskManagerMemory {
    memory: RwLock<Vec<u8>>,
}

impl DiskManagerMemory {
    pub fn new(num_pages: usize) -> Self {
        Self {
            memory: RwLock::new(vec![0; num_pages * DB_PAGE_SIZE]),
        }
    }
}

impl DiskIO for DiskManagerMemory {
    fn write_page(&self, page_id: PageId, page_data: &[u8; DB_PAGE_SIZE]) -> IoResult<()> {
        let offset = page_id as usize * DB_PAGE_SIZE;
        trace!("Writing page {} at offset {}", page_id, offset);

        let mut memory = self.memory.write();
        if offset + DB_PAGE_SIZE > memory.len() {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                "page exceeds preallocated memory",
            ));
        }
        memory[offset..offset + DB_PAGE_SIZE].copy_from_slice(page_data);
        Ok(())
    }

    fn read_page(&self, page_id: PageId, page_data: &mut [u8; DB_PAGE_SIZE]) -> IoResult<()> {
        let offset = page_id as usize * DB_PAGE_SIZE;
        trace!("Reading page {} at offset {}", page_id, offset);

        let memory = self.memory.read();
        if offset + DB_PAGE_SIZE > memory.len() {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                "page exceeds preallocated memory",
            ));
        }
        page_data.copy_from_slice(&memory[offset..offset + DB_PAGE_SIZE]);
        Ok(())
    }
}

/// DiskManagerUnlimitedMemory replicates the utility of DiskManager on
/// memory with no fixed capacity. Reading a page that was never written
/// yields zeroes, like a file read past EOF.
pub struct DiskManagerUnlimitedMemory {
    data: RwLock<HashMap<PageId, Box<[u8; DB_PAGE_SIZE]>>>,
}

impl DiskManagerUnlimitedMemory {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for DiskManagerUnlimitedMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskIO for DiskManagerUnlimitedMemory {
    fn write_page(&self, page_id: PageId, page_data: &[u8; DB_PAGE_SIZE]) -> IoResult<()> {
        let mut data = self.data.write();
        data.insert(page_id, Box::new(*page_data));
        Ok(())
    }

    fn read_page(&self, page_id: PageId, page_data: &mut [u8; DB_PAGE_SIZE]) -> IoResult<()> {
        let data = self.data.read();
        match data.get(&page_id) {
            Some(page) => page_data.copy_from_slice(&page[..]),
            None => page_data.fill(0),
        }
        Ok(())
    }
}
