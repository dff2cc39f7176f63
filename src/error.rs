use std::fmt;
use std::path::PathBuf;

use crate::models::{BookId, MemberId};

/// Result alias used by the record store, codec and library operations.
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Which kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Book(BookId),
    Member(MemberId),
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Book(id) => write!(f, "book {id}"),
            Record::Member(id) => write!(f, "member {id}"),
        }
    }
}

/// Failures surfaced by the library core.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// A persisted line did not have the expected shape.
    #[error("malformed line {line} in '{path}': {reason}")]
    Load {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Reading a data file failed.
    #[error("failed to {operation} '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Writing a data file failed.
    #[error("failed to save '{path}': {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} not found")]
    NotFound(Record),

    #[error("book {book_id} is already issued")]
    AlreadyIssued { book_id: BookId },

    /// Every id of this kind is taken; nothing can be added.
    #[error("no {0} ids left to assign")]
    IdsExhausted(&'static str),
}

impl LibraryError {
    /// True for outcomes of normal use that the operator can correct by
    /// re-issuing the command.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LibraryError::NotFound(_) | LibraryError::AlreadyIssued { .. }
        )
    }

    pub(crate) fn load(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        LibraryError::Load {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}
