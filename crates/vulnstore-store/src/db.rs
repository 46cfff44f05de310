//! Database connection management

use crate::config::StoreConfig;
use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Configure a connection for concurrent writers and readers.
///
/// WAL lets readers keep a consistent snapshot while a writer holds its
/// transaction open; the busy timeout makes competing writers queue instead
/// of failing immediately.
pub fn configure(conn: &Connection, config: &StoreConfig) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(from_rusqlite)?;

    // journal_mode returns a row, so it cannot go through execute
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .map_err(from_rusqlite)?;

    conn.busy_timeout(config.busy_timeout())
        .map_err(from_rusqlite)?;

    Ok(())
}

/// Open and configure a connection described by `config`
pub fn connect(config: &StoreConfig) -> Result<Connection> {
    let conn = open(&config.path)?;
    configure(&conn, config)?;
    Ok(conn)
}
