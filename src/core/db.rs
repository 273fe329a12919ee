use crate::core::error::ImportError;
use crate::core::schemas;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Open the legacy store read-only. Any failure here aborts the run.
pub fn legacy_connect(db_path: &Path) -> Result<Connection, ImportError> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| ImportError::ConnectionError(format!("{}: {}", db_path.display(), e)))?;
    // Opening is lazy; touch the schema so an unreadable file fails here.
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |_| Ok(()))
        .map_err(|e| ImportError::ConnectionError(format!("{}: {}", db_path.display(), e)))?;
    Ok(conn)
}

/// Open (and create if needed) the destination store.
pub fn destination_connect(db_path: &Path) -> Result<Connection, ImportError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(ImportError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(ImportError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(ImportError::RusqliteError)?;
    initialize_destination_db(&conn)?;
    Ok(conn)
}

pub fn initialize_destination_db(conn: &Connection) -> Result<(), ImportError> {
    for ddl in schemas::DEST_DB_SCHEMAS {
        conn.execute(ddl, [])?;
    }
    Ok(())
}

/// True when `table` exists in the connected database.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool, ImportError> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
