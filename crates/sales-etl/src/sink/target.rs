//! Connection-string parsing for the SQLite sink.

use crate::error::{EtlError, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;

/// Where the sink writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// A database file, created on first write.
    File(PathBuf),
    /// A private in-memory database; it disappears with the connection.
    Memory,
}

impl ConnectionTarget {
    /// Parse a SQLAlchemy-style SQLite URL or a bare path.
    ///
    /// ```text
    /// sqlite:///example.db      -> File("example.db")
    /// sqlite:////var/db/x.db    -> File("/var/db/x.db")
    /// sqlite://                 -> Memory
    /// sqlite:///:memory:        -> Memory
    /// data/sales.db             -> File("data/sales.db")
    /// ```
    ///
    /// Any other URL scheme is rejected.
    pub fn parse(connection: &str) -> Result<Self> {
        let connection = connection.trim();
        if connection.is_empty() {
            return Err(EtlError::UnsupportedTarget(
                "empty connection string".to_string(),
            ));
        }

        let Some((scheme, rest)) = connection.split_once("://") else {
            return Ok(Self::from_path(connection));
        };

        if scheme != "sqlite" && !scheme.starts_with("sqlite+") {
            return Err(EtlError::UnsupportedTarget(connection.to_string()));
        }

        // drop driver query options such as "?timeout=20"
        let rest = rest.split_once('?').map_or(rest, |(path, _)| path);

        if rest.is_empty() {
            return Ok(Self::Memory);
        }

        match rest.strip_prefix('/') {
            Some(path) if !path.is_empty() => Ok(Self::from_path(path)),
            Some(_) => Ok(Self::Memory),
            // a host part is meaningless for sqlite
            None => Err(EtlError::UnsupportedTarget(connection.to_string())),
        }
    }

    fn from_path(path: &str) -> Self {
        if path == ":memory:" {
            Self::Memory
        } else {
            Self::File(PathBuf::from(path))
        }
    }

    /// Open for writing, creating the database file if needed.
    pub fn open(&self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open(path),
            Self::Memory => Connection::open_in_memory(),
        }
    }

    /// Open an existing database without creating it.
    pub fn open_read_only(&self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            ),
            Self::Memory => Connection::open_in_memory(),
        }
    }
}
