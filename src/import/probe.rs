//! Legacy field discovery.
//!
//! Legacy field metadata is optional and often incomplete, so discovery is
//! advisory: whatever `field_config` yields is merged with conventional names
//! that legacy sites use without declaring them.

use crate::core::error::ImportError;
use crate::core::schemas;
use rusqlite::Connection;

const NODE_ENTITY_TYPE: &str = "node";

pub const TEXT_FIELD_TYPES: &[&str] = &["text_long", "text_with_summary"];
pub const IMAGE_FIELD_TYPES: &[&str] = &["image"];

/// Conventional rich-text field, prepended when not discovered.
pub const FALLBACK_TEXT_FIELD: &str = "body";
/// Conventional image fields, appended in this order when not discovered.
pub const FALLBACK_IMAGE_FIELDS: &[&str] = &["field_image", "field_images", "field_hero_image"];

/// Ordered, duplicate-free list of field names in priority order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCandidates {
    names: Vec<String>,
}

impl FieldCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new();
        for name in names {
            list.push_back(name);
        }
        list
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Append unless present. Returns whether the name was added.
    pub fn push_back(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() || self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    /// Insert at highest priority unless present.
    pub fn push_front(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() || self.contains(&name) {
            return false;
        }
        self.names.insert(0, name);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Rich-text field names for `bundle`, with `body` always first when not declared.
pub fn discover_text_fields(conn: &Connection, bundle: &str) -> FieldCandidates {
    let mut fields = FieldCandidates::from_names(declared_fields(conn, bundle, TEXT_FIELD_TYPES));
    fields.push_front(FALLBACK_TEXT_FIELD);
    fields
}

/// Image field names for `bundle`, with the conventional names appended.
pub fn discover_image_fields(conn: &Connection, bundle: &str) -> FieldCandidates {
    let mut fields = FieldCandidates::from_names(declared_fields(conn, bundle, IMAGE_FIELD_TYPES));
    for name in FALLBACK_IMAGE_FIELDS {
        fields.push_back(*name);
    }
    fields
}

fn declared_fields(conn: &Connection, bundle: &str, types: &[&str]) -> Vec<String> {
    match query_field_config(conn, bundle, types) {
        Ok(fields) => fields,
        Err(e) => {
            log::debug!("field discovery for bundle '{}' fell back to conventions: {}", bundle, e);
            Vec::new()
        }
    }
}

fn query_field_config(
    conn: &Connection,
    bundle: &str,
    types: &[&str],
) -> Result<Vec<String>, ImportError> {
    let placeholders = (0..types.len())
        .map(|i| format!("?{}", i + 3))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT field_name FROM {} WHERE entity_type = ?1 AND bundle = ?2 AND type IN ({}) ORDER BY rowid",
        schemas::LEGACY_FIELD_CONFIG_TABLE,
        placeholders
    );

    let mut params: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(types.len() + 2);
    params.push(&NODE_ENTITY_TYPE);
    params.push(&bundle);
    for t in types {
        params.push(t);
    }

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ImportError::IntrospectionError(e.to_string()))?;
    let rows = stmt
        .query_map(params.as_slice(), |row| row.get::<_, String>(0))
        .map_err(|e| ImportError::IntrospectionError(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| ImportError::IntrospectionError(e.to_string()))?);
    }
    Ok(out)
}
