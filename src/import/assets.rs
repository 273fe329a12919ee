//! Destination asset records, keyed by URI.

use crate::core::error::ImportError;
use crate::core::schemas;
use crate::core::time;
use rusqlite::{Connection, OptionalExtension, params};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationAssetRecord {
    pub fid: i64,
    pub uri: String,
    pub permanent: bool,
}

pub fn find_by_uri(
    conn: &Connection,
    uri: &str,
) -> Result<Option<DestinationAssetRecord>, ImportError> {
    Ok(conn
        .query_row(
            "SELECT fid, uri, status FROM file_managed WHERE uri = ?1",
            params![uri],
            |row| {
                Ok(DestinationAssetRecord {
                    fid: row.get(0)?,
                    uri: row.get(1)?,
                    permanent: row.get::<_, i64>(2)? == schemas::FILE_STATUS_PERMANENT,
                })
            },
        )
        .optional()?)
}

/// Return the record for `uri`, creating a permanent one if none exists.
///
/// An existing record is returned untouched, even if it is temporary.
pub fn lookup_or_create(
    conn: &Connection,
    uri: &str,
) -> Result<DestinationAssetRecord, ImportError> {
    if uri.trim().is_empty() {
        return Err(ImportError::AssetCreationError {
            uri: uri.to_string(),
            reason: "empty URI".into(),
        });
    }
    if let Some(existing) = find_by_uri(conn, uri)? {
        return Ok(existing);
    }
    conn.execute(
        "INSERT INTO file_managed (uri, status, created) VALUES (?1, ?2, ?3)",
        params![uri, schemas::FILE_STATUS_PERMANENT, time::now_epoch_z()],
    )
    .map_err(|e| ImportError::AssetCreationError {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    Ok(DestinationAssetRecord {
        fid: conn.last_insert_rowid(),
        uri: uri.to_string(),
        permanent: true,
    })
}

/// Like [`lookup_or_create`], but a failure is logged and becomes `None` so
/// the caller can skip the asset and keep importing.
pub fn ensure_asset_record(conn: &Connection, uri: &str) -> Option<DestinationAssetRecord> {
    match lookup_or_create(conn, uri) {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!("File entity failed for {}: {}", uri, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::initialize_destination_db(&conn).unwrap();
        conn
    }

    fn file_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT count(*) FROM file_managed", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn ensure_is_idempotent_per_uri() {
        let conn = conn();
        let first = ensure_asset_record(&conn, "public://a.jpg").unwrap();
        let second = ensure_asset_record(&conn, "public://a.jpg").unwrap();
        assert_eq!(first.fid, second.fid);
        assert!(first.permanent);
        assert_eq!(file_count(&conn), 1);

        let other = ensure_asset_record(&conn, "public://b.jpg").unwrap();
        assert_ne!(other.fid, first.fid);
        assert_eq!(file_count(&conn), 2);
    }

    #[test]
    fn existing_temporary_record_is_not_mutated() {
        let conn = conn();
        conn.execute(
            "INSERT INTO file_managed (uri, status, created) VALUES ('public://t.png', 0, '1Z')",
            [],
        )
        .unwrap();
        let record = ensure_asset_record(&conn, "public://t.png").unwrap();
        assert!(!record.permanent);
        let status: i64 = conn
            .query_row("SELECT status FROM file_managed WHERE fid = ?1", [record.fid], |r| r.get(0))
            .unwrap();
        assert_eq!(status, 0);
    }

    #[test]
    fn creation_failure_resolves_to_none() {
        let conn = conn();
        assert!(ensure_asset_record(&conn, "  ").is_none());

        conn.execute_batch(
            "CREATE TRIGGER reject_files BEFORE INSERT ON file_managed
             BEGIN SELECT RAISE(ABORT, 'disk quota exceeded'); END;",
        )
        .unwrap();
        let err = lookup_or_create(&conn, "public://c.jpg").unwrap_err();
        assert!(err.to_string().contains("public://c.jpg"), "{err}");
        assert!(ensure_asset_record(&conn, "public://c.jpg").is_none());
        assert_eq!(file_count(&conn), 0);
    }
}
