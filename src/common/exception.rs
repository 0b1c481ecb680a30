use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Attempt to write at offset {offset} outside a page of {page_size} bytes")]
    InvalidOffset { offset: usize, page_size: usize },
    #[error("Attempt to write {data_size} bytes with only {remaining_space} bytes left in the page")]
    DataTooLarge {
        data_size: usize,
        remaining_space: usize,
    },
}
