use thiserror::Error;

#[derive(Error, Debug)]
pub enum KVError {
    #[error("storage error: {0}")]
    Storage(String),

    /// A counter key held something other than an 8-byte big-endian u64.
    #[error("corrupt counter at {0}")]
    CorruptCounter(String),
}
