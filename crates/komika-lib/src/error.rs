use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("chapter id {0:?} is not a number")]
    InvalidChapterId(String),
    #[error("unknown reading status {0:?}, expected none, planning, reading or completed")]
    InvalidReadingStatus(String),
}
