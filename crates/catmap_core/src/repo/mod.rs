//! Repository layer: storage adapters for the taxonomy and rule documents.
//!
//! # Responsibility
//! - Define read contracts for the taxonomy master and per-group rules.
//! - Isolate SQLite and file/JSON details from the matcher.
//!
//! # Invariants
//! - Degrading entry points (`load_*`) never fail; they log and return empty
//!   structures when storage is missing or corrupt.
//! - Malformed rule entries are skipped one by one, never passed through.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod rule_repo;
pub mod taxonomy_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for storage reads/writes and document decoding.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidData(String),
    InvalidGroupName(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid rule document: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::InvalidGroupName(value) => write!(f, "group name is invalid: `{value}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::InvalidData(_) | Self::InvalidGroupName(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
