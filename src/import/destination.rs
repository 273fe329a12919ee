//! Destination content store: bundles, cached field schemas, node construction
//! and the single commit per node.

use crate::core::db;
use crate::core::error::ImportError;
use crate::core::schemas;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Cardinality value for fields without an upper bound.
pub const CARDINALITY_UNLIMITED: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: String,
    pub cardinality: i64,
}

impl FieldDefinition {
    pub fn is_single_value(&self) -> bool {
        self.cardinality == 1
    }

    /// Cardinality is either unlimited or at least one value.
    pub fn has_valid_cardinality(&self) -> bool {
        self.cardinality == CARDINALITY_UNLIMITED || self.cardinality >= 1
    }

    /// Whether `count` values fit this field.
    pub fn accepts(&self, count: usize) -> bool {
        self.cardinality == CARDINALITY_UNLIMITED
            || usize::try_from(self.cardinality).is_ok_and(|max| count <= max)
    }
}

/// Field layout of one destination bundle, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSchema {
    pub bundle: String,
    pub fields: Vec<FieldDefinition>,
}

impl BundleSchema {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextValue {
    pub field_name: String,
    pub value: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetValue {
    pub field_name: String,
    pub fids: Vec<i64>,
}

/// Fully built node, ready for its single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationContentRecord {
    pub bundle: String,
    pub title: String,
    pub langcode: String,
    pub published: bool,
    pub uid: i64,
    pub created: i64,
    pub changed: i64,
    pub text: Option<TextValue>,
    pub assets: Option<AssetValue>,
}

/// Incremental construction of a [`DestinationContentRecord`].
///
/// Nothing touches storage until [`DestinationStore::persist`] receives the
/// result of [`NodeBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct NodeBuilder {
    bundle: String,
    title: Option<String>,
    langcode: Option<String>,
    published: bool,
    uid: Option<i64>,
    created: i64,
    changed: i64,
    text: Option<TextValue>,
    assets: Option<AssetValue>,
}

impl NodeBuilder {
    pub fn new(bundle: &str) -> Self {
        Self {
            bundle: bundle.to_string(),
            published: true,
            ..Self::default()
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn langcode(mut self, langcode: &str) -> Self {
        self.langcode = Some(langcode.to_string());
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    pub fn owner(mut self, uid: i64) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn timestamps(mut self, created: i64, changed: i64) -> Self {
        self.created = created;
        self.changed = changed;
        self
    }

    pub fn set_text(&mut self, field_name: &str, value: &str, format: &str) {
        self.text = Some(TextValue {
            field_name: field_name.to_string(),
            value: value.to_string(),
            format: format.to_string(),
        });
    }

    pub fn set_assets(&mut self, field_name: &str, fids: Vec<i64>) {
        self.assets = Some(AssetValue {
            field_name: field_name.to_string(),
            fids,
        });
    }

    pub fn build(self) -> Result<DestinationContentRecord, ImportError> {
        if self.bundle.trim().is_empty() {
            return Err(ImportError::ValidationError("node has no bundle".into()));
        }
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ImportError::ValidationError("node has no title".into()))?;
        let langcode = self
            .langcode
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| ImportError::ValidationError("node has no langcode".into()))?;
        let uid = self
            .uid
            .ok_or_else(|| ImportError::ValidationError("node has no owner".into()))?;
        if let Some(text) = &self.text {
            if text.value.trim().is_empty() {
                return Err(ImportError::ValidationError(format!(
                    "text field '{}' assigned an empty value",
                    text.field_name
                )));
            }
        }
        Ok(DestinationContentRecord {
            bundle: self.bundle,
            title,
            langcode,
            published: self.published,
            uid,
            created: self.created,
            changed: self.changed,
            text: self.text,
            assets: self.assets.filter(|a| !a.fids.is_empty()),
        })
    }
}

pub struct DestinationStore {
    conn: Connection,
    bundles: Option<HashSet<String>>,
    schemas: HashMap<String, BundleSchema>,
}

impl DestinationStore {
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        let conn = db::destination_connect(path)
            .map_err(|e| ImportError::DestinationError(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already initialised connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            bundles: None,
            schemas: HashMap::new(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bundle_exists(&mut self, bundle: &str) -> Result<bool, ImportError> {
        if self.bundles.is_none() {
            let mut stmt = self.conn.prepare("SELECT type FROM node_type")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let mut set = HashSet::new();
            for row in rows {
                set.insert(row?);
            }
            self.bundles = Some(set);
        }
        Ok(self
            .bundles
            .as_ref()
            .is_some_and(|set| set.contains(bundle)))
    }

    /// Field layout for `bundle`, read once and cached.
    pub fn bundle_schema(&mut self, bundle: &str) -> Result<&BundleSchema, ImportError> {
        if !self.schemas.contains_key(bundle) {
            let schema = load_bundle_schema(&self.conn, bundle)?;
            self.schemas.insert(bundle.to_string(), schema);
        }
        self.schemas
            .get(bundle)
            .ok_or_else(|| ImportError::DestinationError(format!("no schema for '{}'", bundle)))
    }

    /// Commit a node and all its field values in one transaction.
    pub fn persist(&mut self, node: &DestinationContentRecord) -> Result<i64, ImportError> {
        let schema = self.bundle_schema(&node.bundle)?.clone();
        validate_against_schema(node, &schema)?;

        let tx = self
            .conn
            .transaction()
            .map_err(|e| ImportError::PersistError(e.to_string()))?;
        let nid = write_node(&tx, node).map_err(|e| ImportError::PersistError(e.to_string()))?;
        tx.commit()
            .map_err(|e| ImportError::PersistError(e.to_string()))?;
        Ok(nid)
    }

    pub fn node_count(&self) -> Result<i64, ImportError> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM node", [], |row| row.get(0))?)
    }

    pub fn text_value(&self, nid: i64, field_name: &str) -> Result<Option<String>, ImportError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM node_text WHERE nid = ?1 AND field_name = ?2",
                params![nid, field_name],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn attached_fids(&self, nid: i64, field_name: &str) -> Result<Vec<i64>, ImportError> {
        let mut stmt = self.conn.prepare(
            "SELECT fid FROM node_file WHERE nid = ?1 AND field_name = ?2 ORDER BY delta",
        )?;
        let rows = stmt.query_map(params![nid, field_name], |row| row.get(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn load_bundle_schema(conn: &Connection, bundle: &str) -> Result<BundleSchema, ImportError> {
    let mut stmt = conn.prepare(
        "SELECT field_name, type, cardinality FROM field_config WHERE bundle = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![bundle], |row| {
        Ok(FieldDefinition {
            name: row.get(0)?,
            field_type: row.get(1)?,
            cardinality: row.get(2)?,
        })
    })?;
    let mut fields = Vec::new();
    for row in rows {
        fields.push(row?);
    }
    Ok(BundleSchema {
        bundle: bundle.to_string(),
        fields,
    })
}

fn validate_against_schema(
    node: &DestinationContentRecord,
    schema: &BundleSchema,
) -> Result<(), ImportError> {
    if let Some(text) = &node.text {
        if schema.field(&text.field_name).is_none() {
            return Err(ImportError::PersistError(format!(
                "field '{}' does not exist on bundle '{}'",
                text.field_name, schema.bundle
            )));
        }
    }
    if let Some(assets) = &node.assets {
        let def = schema.field(&assets.field_name).ok_or_else(|| {
            ImportError::PersistError(format!(
                "field '{}' does not exist on bundle '{}'",
                assets.field_name, schema.bundle
            ))
        })?;
        if !def.accepts(assets.fids.len()) {
            return Err(ImportError::PersistError(format!(
                "field '{}' accepts {} value(s), got {}",
                def.name,
                def.cardinality,
                assets.fids.len()
            )));
        }
    }
    Ok(())
}

fn write_node(conn: &Connection, node: &DestinationContentRecord) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO node (type, title, langcode, status, uid, created, changed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            node.bundle,
            node.title,
            node.langcode,
            if node.published {
                schemas::NODE_STATUS_PUBLISHED
            } else {
                0
            },
            node.uid,
            node.created,
            node.changed
        ],
    )?;
    let nid = conn.last_insert_rowid();

    if let Some(text) = &node.text {
        conn.execute(
            "INSERT INTO node_text (nid, field_name, value, format) VALUES (?1, ?2, ?3, ?4)",
            params![nid, text.field_name, text.value, text.format],
        )?;
    }
    if let Some(assets) = &node.assets {
        for (delta, fid) in assets.fids.iter().enumerate() {
            conn.execute(
                "INSERT INTO node_file (nid, field_name, delta, fid) VALUES (?1, ?2, ?3, ?4)",
                params![nid, assets.field_name, delta as i64, fid],
            )?;
        }
    }
    Ok(nid)
}
