//! Error type shared by every crate in the workspace.
//!
//! Cache misses, trie "no value", unknown dictionary words and empty lattices
//! are *not* errors; they are expressed with `Option`/sentinel values at the
//! call sites. This enum only covers conditions the caller did something
//! wrong about, or I/O failing underneath us.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed pinyin or code, non-ASCII text fed to an ASCII-only buffer,
    /// odd-length encoded pinyin, attempts to remove the user dictionary.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Truncated or version-mismatched binary data, text format violations.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Random access past the end of a buffer or lattice.
    #[error("out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Error::InvalidFormat(msg.into())
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Error::OutOfRange(msg.into())
    }
}
