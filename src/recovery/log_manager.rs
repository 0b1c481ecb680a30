use crate::common::config::{Lsn, INVALID_LSN, LOG_BUFFER_SIZE};
use crate::storage::disk::disk_manager::FileDiskManager;
use log::trace;
use parking_lot::Mutex;
use std::io::Result as IoResult;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// LogManager appends serialized log records into an in-memory buffer and
/// flushes that buffer through the disk manager's log file. The buffer pool
/// stores one but never drives it; recovery lives in higher layers.
pub struct LogManager {
    next_lsn: AtomicI32,
    persistent_lsn: AtomicI32,
    log_buffer: Mutex<LogBuffer>,
    disk_manager: Arc<FileDiskManager>,
}

struct LogBuffer {
    data: Vec<u8>,
    write_pos: usize,
}

impl LogBuffer {
    fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
            write_pos: 0,
        }
    }

    fn append(&mut self, bytes: &[u8]) -> bool {
        if self.write_pos + bytes.len() > self.data.len() {
            return false;
        }
        self.data[self.write_pos..self.write_pos + bytes.len()].copy_from_slice(bytes);
        self.write_pos += bytes.len();
        true
    }

    fn clear(&mut self) {
        self.write_pos = 0;
    }

    fn is_empty(&self) -> bool {
        self.write_pos == 0
    }
}

impl LogManager {
    pub fn new(disk_manager: Arc<FileDiskManager>) -> Self {
        Self {
            next_lsn: AtomicI32::new(0),
            persistent_lsn: AtomicI32::new(INVALID_LSN),
            log_buffer: Mutex::new(LogBuffer::new(LOG_BUFFER_SIZE)),
            disk_manager,
        }
    }

    /// Appends one serialized record, draining the buffer to disk first when
    /// it is full. Returns the record's assigned LSN.
    pub fn append_record(&self, record: &[u8]) -> IoResult<Lsn> {
        let lsn = self.next_lsn.fetch_add(1, Ordering::SeqCst);
        let mut buffer = self.log_buffer.lock();
        if !buffer.append(record) {
            Self::flush_buffer(&self.disk_manager, &mut buffer)?;
            assert!(
                buffer.append(record),
                "log record larger than the log buffer"
            );
        }
        trace!("appended log record {}", lsn);
        Ok(lsn)
    }

    /// Forces buffered records out to the log file.
    pub fn flush(&self) -> IoResult<()> {
        let mut buffer = self.log_buffer.lock();
        Self::flush_buffer(&self.disk_manager, &mut buffer)?;
        self.persistent_lsn
            .store(self.next_lsn.load(Ordering::SeqCst) - 1, Ordering::SeqCst);
        Ok(())
    }

    pub fn next_lsn(&self) -> Lsn {
        self.next_lsn.load(Ordering::SeqCst)
    }

    /// The highest LSN known to have reached the log file.
    pub fn persistent_lsn(&self) -> Lsn {
        self.persistent_lsn.load(Ordering::SeqCst)
    }

    fn flush_buffer(disk_manager: &FileDiskManager, buffer: &mut LogBuffer) -> IoResult<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        disk_manager.write_log(&buffer.data[..buffer.write_pos])?;
        buffer.clear();
        Ok(())
    }
}
