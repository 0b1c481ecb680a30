use crate::assert_ok;
use crate::common::logger::initialize_logger;
use chrono::Utc;
use magnetite::common::config::DB_PAGE_SIZE;
use magnetite::storage::disk::disk_manager::{DiskIO, FileDiskManager};
use magnetite::storage::disk::disk_manager_memory::{DiskManagerMemory, DiskManagerUnlimitedMemory};
use std::fs;

struct ScratchFiles {
    db_file: String,
    log_file: String,
}

impl ScratchFiles {
    fn new(test_name: &str) -> Self {
        initialize_logger();
        let timestamp = Utc::now().format("%Y%m%d%H%M%S%f").to_string();
        Self {
            db_file: format!("{}_{}.db", test_name, timestamp),
            log_file: format!("{}_{}.log", test_name, timestamp),
        }
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.db_file);
        let _ = fs::remove_file(&self.log_file);
    }
}

#[test]
fn file_page_round_trip() {
    let files = ScratchFiles::new("file_page_round_trip");
    let disk_manager = FileDiskManager::new(files.db_file.clone(), files.log_file.clone())
        .expect("Failed to open scratch files");

    let mut write_buf = [0u8; DB_PAGE_SIZE];
    write_buf[..11].copy_from_slice(b"hello world");
    write_buf[DB_PAGE_SIZE - 1] = 0xAB;
    assert_ok!(disk_manager.write_page(0, &write_buf));
    assert_ok!(disk_manager.write_page(3, &write_buf));
    assert_eq!(disk_manager.get_num_writes(), 2);

    let mut read_buf = [0u8; DB_PAGE_SIZE];
    assert_ok!(disk_manager.read_page(0, &mut read_buf));
    assert_eq!(read_buf, write_buf);
    assert_ok!(disk_manager.read_page(3, &mut read_buf));
    assert_eq!(read_buf, write_buf);

    // A page inside a file hole reads as zeroes.
    assert_ok!(disk_manager.read_page(1, &mut read_buf));
    assert_eq!(read_buf, [0u8; DB_PAGE_SIZE]);

    // So does a page past the end of the file.
    assert_ok!(disk_manager.read_page(10, &mut read_buf));
    assert_eq!(read_buf, [0u8; DB_PAGE_SIZE]);

    assert_ok!(disk_manager.shut_down());
}

#[test]
fn log_round_trip() {
    let files = ScratchFiles::new("log_round_trip");
    let disk_manager = FileDiskManager::new(files.db_file.clone(), files.log_file.clone())
        .expect("Failed to open scratch files");

    assert_eq!(disk_manager.get_num_flushes(), 0);
    assert_ok!(disk_manager.write_log(b"first record;"));
    assert_ok!(disk_manager.write_log(b"second record"));
    assert_eq!(disk_manager.get_num_flushes(), 2);

    let mut buf = [0u8; 26];
    assert_ok!(disk_manager.read_log(&mut buf, 0));
    assert_eq!(&buf, b"first record;second record");

    // Reads past the end of the log zero-fill the tail.
    let mut tail = [0xFFu8; 8];
    assert_ok!(disk_manager.read_log(&mut tail, 21));
    assert_eq!(&tail, b"ecord\0\0\0");

    let log_size =
        FileDiskManager::get_file_size(&files.log_file).expect("log file must exist");
    assert_eq!(log_size, 26);
}

#[test]
fn memory_disk_manager_bounds() {
    initialize_logger();
    let disk_manager = DiskManagerMemory::new(4);

    let mut write_buf = [0u8; DB_PAGE_SIZE];
    write_buf[0] = 7;
    assert_ok!(disk_manager.write_page(2, &write_buf));

    let mut read_buf = [0u8; DB_PAGE_SIZE];
    assert_ok!(disk_manager.read_page(2, &mut read_buf));
    assert_eq!(read_buf, write_buf);

    // The preallocated range is hard-bounded.
    assert!(disk_manager.write_page(4, &write_buf).is_err());
    assert!(disk_manager.read_page(4, &mut read_buf).is_err());
}

#[test]
fn unlimited_memory_disk_manager() {
    initialize_logger();
    let disk_manager = DiskManagerUnlimitedMemory::new();

    let mut write_buf = [0u8; DB_PAGE_SIZE];
    write_buf[..5].copy_from_slice(b"fives");
    assert_ok!(disk_manager.write_page(12345, &write_buf));

    let mut read_buf = [0u8; DB_PAGE_SIZE];
    assert_ok!(disk_manager.read_page(12345, &mut read_buf));
    assert_eq!(read_buf, write_buf);

    // Never-written pages read as zeroes.
    assert_ok!(disk_manager.read_page(99, &mut read_buf));
    assert_eq!(read_buf, [0u8; DB_PAGE_SIZE]);
}
