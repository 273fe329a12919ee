//! Table layouts for both sides of the import.
//!
//! The legacy side is read-only and only described by name constants; the
//! destination side is owned here and created idempotently on open.

// --- Legacy (read-only) ---
pub const LEGACY_NODE_TABLE: &str = "node_field_data";
pub const LEGACY_FIELD_CONFIG_TABLE: &str = "field_config";
pub const LEGACY_FILE_TABLE: &str = "file_managed";
/// Per-field value tables are named `node__<field_name>`.
pub const LEGACY_FIELD_TABLE_PREFIX: &str = "node__";

// --- Destination ---
pub const DEST_DB_SCHEMA_NODE_TYPE: &str = "
    CREATE TABLE IF NOT EXISTS node_type (
        type TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT ''
    )
";

/// `cardinality = -1` means unlimited.
pub const DEST_DB_SCHEMA_FIELD_CONFIG: &str = "
    CREATE TABLE IF NOT EXISTS field_config (
        bundle TEXT NOT NULL,
        field_name TEXT NOT NULL,
        type TEXT NOT NULL,
        cardinality INTEGER NOT NULL DEFAULT 1,
        PRIMARY KEY (bundle, field_name),
        FOREIGN KEY(bundle) REFERENCES node_type(type)
    )
";

pub const DEST_DB_SCHEMA_NODE: &str = "
    CREATE TABLE IF NOT EXISTS node (
        nid INTEGER PRIMARY KEY AUTOINCREMENT,
        type TEXT NOT NULL,
        title TEXT NOT NULL,
        langcode TEXT NOT NULL,
        status INTEGER NOT NULL,
        uid INTEGER NOT NULL,
        created INTEGER NOT NULL,
        changed INTEGER NOT NULL,
        FOREIGN KEY(type) REFERENCES node_type(type)
    )
";

pub const DEST_DB_SCHEMA_NODE_TEXT: &str = "
    CREATE TABLE IF NOT EXISTS node_text (
        nid INTEGER NOT NULL,
        field_name TEXT NOT NULL,
        value TEXT NOT NULL,
        format TEXT NOT NULL,
        PRIMARY KEY (nid, field_name),
        FOREIGN KEY(nid) REFERENCES node(nid)
    )
";

pub const DEST_DB_SCHEMA_NODE_FILE: &str = "
    CREATE TABLE IF NOT EXISTS node_file (
        nid INTEGER NOT NULL,
        field_name TEXT NOT NULL,
        delta INTEGER NOT NULL,
        fid INTEGER NOT NULL,
        PRIMARY KEY (nid, field_name, delta),
        FOREIGN KEY(nid) REFERENCES node(nid),
        FOREIGN KEY(fid) REFERENCES file_managed(fid)
    )
";

/// `status = 1` marks a permanent file, exempt from temporary-file cleanup.
pub const DEST_DB_SCHEMA_FILE_MANAGED: &str = "
    CREATE TABLE IF NOT EXISTS file_managed (
        fid INTEGER PRIMARY KEY AUTOINCREMENT,
        uri TEXT NOT NULL UNIQUE,
        status INTEGER NOT NULL DEFAULT 0,
        created TEXT NOT NULL
    )
";

pub const DEST_DB_SCHEMAS: &[&str] = &[
    DEST_DB_SCHEMA_NODE_TYPE,
    DEST_DB_SCHEMA_FIELD_CONFIG,
    DEST_DB_SCHEMA_FILE_MANAGED,
    DEST_DB_SCHEMA_NODE,
    DEST_DB_SCHEMA_NODE_TEXT,
    DEST_DB_SCHEMA_NODE_FILE,
];

pub const FILE_STATUS_PERMANENT: i64 = 1;
pub const NODE_STATUS_PUBLISHED: i64 = 1;
