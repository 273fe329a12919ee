//! Read-only access to the legacy store.

use crate::core::db;
use crate::core::error::ImportError;
use crate::core::schemas;
use crate::import::probe::FieldCandidates;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::LazyLock;

pub const DEFAULT_LIMIT: usize = 10;

static MACHINE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static regex"));

/// Snapshot of one published legacy node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub nid: i64,
    pub bundle: String,
    pub title: String,
    pub langcode: String,
    pub published: bool,
    pub created: i64,
    pub changed: i64,
    pub uid: i64,
}

/// A legacy asset reached through one of the record's image fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAssetRecord {
    pub field_name: String,
    pub fid: i64,
    pub uri: String,
}

/// Clamp the operator-supplied limit: absent or non-positive means the default.
pub fn effective_limit(limit: Option<i64>) -> usize {
    match limit {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(DEFAULT_LIMIT),
        _ => DEFAULT_LIMIT,
    }
}

pub fn is_machine_name(name: &str) -> bool {
    MACHINE_NAME.is_match(name)
}

fn field_table(field: &str) -> Result<String, ImportError> {
    if !is_machine_name(field) {
        return Err(ImportError::LookupMiss(format!(
            "'{}' is not a valid field name",
            field
        )));
    }
    Ok(format!("{}{}", schemas::LEGACY_FIELD_TABLE_PREFIX, field))
}

pub struct LegacyReader {
    conn: Connection,
}

impl LegacyReader {
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        Ok(Self {
            conn: db::legacy_connect(path)?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Published records, newest first, at most `limit`.
    pub fn fetch_published_records(&self, limit: usize) -> Result<Vec<SourceRecord>, ImportError> {
        let sql = format!(
            "SELECT nid, type, title, langcode, status, created, changed, uid
             FROM {}
             WHERE status = 1
             ORDER BY created DESC, nid DESC
             LIMIT ?1",
            schemas::LEGACY_NODE_TABLE
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(SourceRecord {
                nid: row.get(0)?,
                bundle: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                langcode: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                published: row.get::<_, i64>(4)? == 1,
                created: row.get::<_, Option<i64>>(5)?.unwrap_or_default(),
                changed: row.get::<_, Option<i64>>(6)?.unwrap_or_default(),
                uid: row.get::<_, Option<i64>>(7)?.unwrap_or_default(),
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// First non-blank value across `candidates`, in priority order.
    ///
    /// Only the lowest-delta value of each candidate is considered; a blank
    /// one moves the search to the next candidate. A candidate without a
    /// storage table (or value column) simply has no value. Returns an empty
    /// string when nothing is found.
    pub fn fetch_text_value(&self, nid: i64, candidates: &FieldCandidates) -> String {
        candidates
            .iter()
            .find_map(|field| match self.first_text_value(nid, field) {
                Ok(value) => value.filter(|v| !v.trim().is_empty()),
                Err(e) => {
                    log::debug!("nid {}: no text in '{}': {}", nid, field, e);
                    None
                }
            })
            .unwrap_or_default()
    }

    fn first_text_value(&self, nid: i64, field: &str) -> Result<Option<String>, ImportError> {
        let table = field_table(field)?;
        if !db::table_exists(&self.conn, &table)? {
            return Err(ImportError::LookupMiss(format!("table {} absent", table)));
        }
        let sql = format!(
            "SELECT {field}_value FROM {table} WHERE entity_id = ?1 ORDER BY delta ASC LIMIT 1"
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| ImportError::LookupMiss(e.to_string()))?;
        let value = stmt
            .query_row(params![nid], |row| row.get::<_, Option<String>>(0))
            .optional()?;
        Ok(value.flatten())
    }

    /// Asset references across all `candidates`, deduplicated by URI in first-seen order.
    pub fn fetch_asset_references(
        &self,
        nid: i64,
        candidates: &FieldCandidates,
    ) -> Vec<SourceAssetRecord> {
        let mut refs: Vec<SourceAssetRecord> = Vec::new();
        for field in candidates.iter() {
            let found = match self.asset_references(nid, field) {
                Ok(found) => found,
                Err(e) => {
                    log::debug!("nid {}: no assets in '{}': {}", nid, field, e);
                    continue;
                }
            };
            for asset in found {
                if asset.uri.is_empty() || refs.iter().any(|r| r.uri == asset.uri) {
                    continue;
                }
                refs.push(asset);
            }
        }
        refs
    }

    fn asset_references(
        &self,
        nid: i64,
        field: &str,
    ) -> Result<Vec<SourceAssetRecord>, ImportError> {
        let table = field_table(field)?;
        if !db::table_exists(&self.conn, &table)? {
            return Err(ImportError::LookupMiss(format!("table {} absent", table)));
        }
        let sql = format!(
            "SELECT t.{field}_target_id, fm.uri
             FROM {table} t
             JOIN {files} fm ON fm.fid = t.{field}_target_id
             WHERE t.entity_id = ?1
             ORDER BY t.delta ASC",
            files = schemas::LEGACY_FILE_TABLE
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| ImportError::LookupMiss(e.to_string()))?;
        let rows = stmt.query_map(params![nid], |row| {
            Ok(SourceAssetRecord {
                field_name: field.to_string(),
                fid: row.get(0)?,
                uri: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> LegacyReader {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE node_field_data (nid INTEGER, type TEXT, title TEXT, langcode TEXT,
                 status INTEGER, created INTEGER, changed INTEGER, uid INTEGER);
             INSERT INTO node_field_data VALUES (1, 'page', 'Old', 'en', 1, 100, 100, 3);
             INSERT INTO node_field_data VALUES (2, 'page', 'Draft', 'en', 0, 300, 300, 3);
             INSERT INTO node_field_data VALUES (3, 'article', NULL, NULL, 1, 200, 250, 4);
             CREATE TABLE node__body (entity_id INTEGER, delta INTEGER, body_value TEXT);
             INSERT INTO node__body VALUES (1, 0, '   ');
             INSERT INTO node__body VALUES (1, 1, 'Second delta');
             INSERT INTO node__body VALUES (3, 0, 'Lead paragraph');
             CREATE TABLE node__field_teaser (entity_id INTEGER, delta INTEGER, field_teaser_value TEXT);
             INSERT INTO node__field_teaser VALUES (1, 0, 'Teaser');
             CREATE TABLE node__field_summary (entity_id INTEGER, delta INTEGER, wrong_col TEXT);
             INSERT INTO node__field_summary VALUES (3, 0, 'ignored');
             CREATE TABLE file_managed (fid INTEGER, uri TEXT);
             INSERT INTO file_managed VALUES (10, 'public://a.jpg');
             INSERT INTO file_managed VALUES (11, 'public://b.jpg');
             CREATE TABLE node__field_image (entity_id INTEGER, delta INTEGER, field_image_target_id INTEGER);
             INSERT INTO node__field_image VALUES (1, 0, 10);
             CREATE TABLE node__field_images (entity_id INTEGER, delta INTEGER, field_images_target_id INTEGER);
             INSERT INTO node__field_images VALUES (1, 1, 10);
             INSERT INTO node__field_images VALUES (1, 0, 11);
             INSERT INTO node__field_images VALUES (1, 2, 99);",
        )
        .unwrap();
        LegacyReader::from_connection(conn)
    }

    #[test]
    fn effective_limit_defaults_non_positive() {
        assert_eq!(effective_limit(None), 10);
        assert_eq!(effective_limit(Some(0)), 10);
        assert_eq!(effective_limit(Some(-5)), 10);
        assert_eq!(effective_limit(Some(3)), 3);
    }

    #[test]
    fn published_records_newest_first() {
        let records = reader().fetch_published_records(10).unwrap();
        assert_eq!(records.iter().map(|r| r.nid).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(records[0].title, "");
        assert_eq!(records[0].uid, 4);
        assert!(records.iter().all(|r| r.published));
    }

    #[test]
    fn published_records_respect_limit() {
        let records = reader().fetch_published_records(1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].nid, 3);
    }

    #[test]
    fn text_value_skips_missing_tables() {
        let r = reader();
        let candidates = FieldCandidates::from_names(["field_missing", "body"]);
        assert_eq!(r.fetch_text_value(3, &candidates), "Lead paragraph");
    }

    #[test]
    fn blank_lowest_delta_moves_to_next_candidate() {
        let r = reader();
        let candidates = FieldCandidates::from_names(["body", "field_teaser"]);
        assert_eq!(r.fetch_text_value(1, &candidates), "Teaser");

        let body_only = FieldCandidates::from_names(["body"]);
        assert_eq!(r.fetch_text_value(1, &body_only), "");
    }

    #[test]
    fn text_value_treats_bad_column_as_no_value() {
        let r = reader();
        let candidates = FieldCandidates::from_names(["field_summary", "Bad Name;"]);
        assert_eq!(r.fetch_text_value(3, &candidates), "");
    }

    #[test]
    fn asset_references_union_and_dedupe_by_uri() {
        let r = reader();
        let candidates =
            FieldCandidates::from_names(["field_image", "field_images", "field_hero_image"]);
        let refs = r.fetch_asset_references(1, &candidates);
        let uris = refs.iter().map(|a| a.uri.as_str()).collect::<Vec<_>>();
        assert_eq!(uris, vec!["public://a.jpg", "public://b.jpg"]);
        assert_eq!(refs[0].field_name, "field_image");
        assert!(r.fetch_asset_references(3, &candidates).is_empty());
    }
}
