use crate::common::config::{PageId, DB_PAGE_SIZE};
use log::{debug, trace, warn};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Result as IoResult;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};

/// The `DiskIO` trait defines the basic operations for interacting with disk
/// storage. Implementers of this trait must provide methods to write and read
/// pages.
pub trait DiskIO: Send + Sync {
    fn write_page(&self, page_id: PageId, page_data: &[u8; DB_PAGE_SIZE]) -> IoResult<()>;
    fn read_page(&self, page_id: PageId, page_data: &mut [u8; DB_PAGE_SIZE]) -> IoResult<()>;
}

/// The `FileDiskManager` is responsible for managing disk I/O operations,
/// including reading and writing pages and managing the log file.
pub struct FileDiskManager {
    file_name: String,
    log_name: String,
    db_io: Mutex<File>,
    log_io: Mutex<File>,
    num_flushes: AtomicI32,
    num_writes: AtomicI32,
}

impl FileDiskManager {
    /// Opens (creating if needed) the database file and the log file.
    pub fn new(db_file: impl Into<String>, log_file: impl Into<String>) -> IoResult<Self> {
        let db_file = db_file.into();
        let log_file = log_file.into();
        let db_io = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&db_file)?;
        let log_io = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&log_file)?;

        Ok(Self {
            file_name: db_file,
            log_name: log_file,
            db_io: Mutex::new(db_io),
            log_io: Mutex::new(log_io),
            num_flushes: AtomicI32::new(0),
            num_writes: AtomicI32::new(0),
        })
    }

    /// Flushes any pending writes before shutdown.
    pub fn shut_down(&self) -> IoResult<()> {
        self.db_io.lock().sync_all()?;
        self.log_io.lock().sync_all()?;
        debug!("Shutdown complete");
        Ok(())
    }

    /// Appends log data to the log file and flushes it to disk.
    pub fn write_log(&self, log_data: &[u8]) -> IoResult<()> {
        let mut log_io = self.log_io.lock();
        log_io.seek(SeekFrom::End(0))?;
        log_io.write_all(log_data)?;
        log_io.sync_all()?;
        self.num_flushes.fetch_add(1, Ordering::SeqCst);
        trace!("Log data written and flushed");
        Ok(())
    }

    /// Reads log data from the log file at a specified offset. A read past
    /// the end of the log zero-fills the tail of the buffer.
    pub fn read_log(&self, log_data: &mut [u8], offset: u64) -> IoResult<()> {
        let mut log_io = self.log_io.lock();
        log_io.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < log_data.len() {
            let n = log_io.read(&mut log_data[filled..])?;
            if n == 0 {
                log_data[filled..].fill(0);
                warn!("Log read at offset {} hit EOF, zero-filled tail", offset);
                break;
            }
            filled += n;
        }
        Ok(())
    }

    /// The number of times the log has been flushed to disk.
    pub fn get_num_flushes(&self) -> i32 {
        self.num_flushes.load(Ordering::SeqCst)
    }

    /// The number of page writes performed by the disk manager.
    pub fn get_num_writes(&self) -> i32 {
        self.num_writes.load(Ordering::SeqCst)
    }

    pub fn db_file_name(&self) -> &str {
        &self.file_name
    }

    pub fn log_file_name(&self) -> &str {
        &self.log_name
    }

    /// Retrieves the size of a specified file.
    pub fn get_file_size(file_name: &str) -> IoResult<u64> {
        let path = Path::new(file_name);
        Ok(path.metadata()?.len())
    }
}

impl DiskIO for FileDiskManager {
    fn write_page(&self, page_id: PageId, page_data: &[u8; DB_PAGE_SIZE]) -> IoResult<()> {
        let offset = page_id as u64 * DB_PAGE_SIZE as u64;
        trace!("Writing page {} at offset {}", page_id, offset);

        let mut db_io = self.db_io.lock();
        db_io.seek(SeekFrom::Start(offset))?;
        db_io.write_all(page_data)?;
        db_io.flush()?;
        self.num_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_page(&self, page_id: PageId, page_data: &mut [u8; DB_PAGE_SIZE]) -> IoResult<()> {
        let offset = page_id as u64 * DB_PAGE_SIZE as u64;
        trace!("Reading page {} at offset {}", page_id, offset);

        let mut db_io = self.db_io.lock();
        db_io.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < page_data.len() {
            let n = db_io.read(&mut page_data[filled..])?;
            if n == 0 {
                // Reading a page the file does not cover yet yields zeroes.
                page_data[filled..].fill(0);
                break;
            }
            filled += n;
        }
        Ok(())
    }
}
