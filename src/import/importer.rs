//! Per-record orchestration of the legacy import.
//!
//! Each source row runs to one terminal outcome before the next row is read.
//! Only reading the row list itself can fail the run; every per-record
//! problem becomes a reported outcome.

use crate::core::audit::AuditLog;
use crate::core::config::ImportConfig;
use crate::core::error::ImportError;
use crate::core::output;
use crate::import::assets;
use crate::import::destination::{DestinationStore, NodeBuilder};
use crate::import::legacy::{LegacyReader, SourceRecord};
use crate::import::mapper;
use crate::import::probe;
use std::io::Write;

pub const DEFAULT_LANGCODE: &str = "en";
pub const NO_ROWS_MESSAGE: &str = "No published rows in legacy node_field_data.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Imported {
        new_nid: i64,
        bundle: String,
        has_body: bool,
        image_count: usize,
        image_field: Option<String>,
    },
    SkippedNoBundle {
        bundle: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub fetched: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Importer {
    legacy: LegacyReader,
    dest: DestinationStore,
    config: ImportConfig,
    audit: Option<AuditLog>,
}

impl Importer {
    pub fn new(legacy: LegacyReader, dest: DestinationStore, config: ImportConfig) -> Self {
        let audit = config.audit_log.as_deref().map(AuditLog::new);
        Self {
            legacy,
            dest,
            config,
            audit,
        }
    }

    pub fn destination(&self) -> &DestinationStore {
        &self.dest
    }

    /// Import up to `limit` published records, writing the transcript to `out`.
    pub fn run(&mut self, limit: usize, out: &mut dyn Write) -> Result<ImportSummary, ImportError> {
        let records = self.legacy.fetch_published_records(limit)?;
        let mut summary = ImportSummary {
            fetched: records.len(),
            ..ImportSummary::default()
        };
        if records.is_empty() {
            writeln!(out, "{}", NO_ROWS_MESSAGE)?;
            return Ok(summary);
        }

        for record in &records {
            let outcome = self.import_record(record);
            let line = match &outcome {
                RecordOutcome::Imported {
                    new_nid,
                    bundle,
                    has_body,
                    image_count,
                    image_field,
                } => {
                    summary.created += 1;
                    output::imported_line(
                        record.nid,
                        *new_nid,
                        bundle,
                        *has_body,
                        *image_count,
                        image_field.as_deref(),
                    )
                }
                RecordOutcome::SkippedNoBundle { bundle } => {
                    summary.skipped += 1;
                    output::skipped_line(record.nid, bundle)
                }
                RecordOutcome::Failed { message } => {
                    summary.failed += 1;
                    output::failed_line(record.nid, message)
                }
            };
            writeln!(out, "{}", line)?;
            self.audit_outcome(record, &outcome);
        }

        writeln!(out, "{}", output::summary_line(summary.created))?;
        Ok(summary)
    }

    /// Run one record to its terminal outcome. Never fails the batch.
    pub fn import_record(&mut self, record: &SourceRecord) -> RecordOutcome {
        match self.try_import_record(record) {
            Ok(outcome) => outcome,
            Err(e) => RecordOutcome::Failed {
                message: e.to_string(),
            },
        }
    }

    /// Source bundle if the destination has it, else the default bundle if that exists.
    pub fn resolve_bundle(&mut self, source_bundle: &str) -> Result<Option<String>, ImportError> {
        if !source_bundle.is_empty() && self.dest.bundle_exists(source_bundle)? {
            return Ok(Some(source_bundle.to_string()));
        }
        let fallback = self.config.default_bundle.clone();
        if self.dest.bundle_exists(&fallback)? {
            Ok(Some(fallback))
        } else {
            Ok(None)
        }
    }

    fn try_import_record(&mut self, record: &SourceRecord) -> Result<RecordOutcome, ImportError> {
        let Some(bundle) = self.resolve_bundle(&record.bundle)? else {
            return Ok(RecordOutcome::SkippedNoBundle {
                bundle: self.config.default_bundle.clone(),
            });
        };

        let text_fields = probe::discover_text_fields(self.legacy.connection(), &record.bundle);
        let body = self.legacy.fetch_text_value(record.nid, &text_fields);

        let image_fields = probe::discover_image_fields(self.legacy.connection(), &record.bundle);
        let asset_refs = self.legacy.fetch_asset_references(record.nid, &image_fields);

        let title = if record.title.trim().is_empty() {
            format!("Imported {}", record.nid)
        } else {
            record.title.clone()
        };
        let langcode = if record.langcode.trim().is_empty() {
            DEFAULT_LANGCODE
        } else {
            record.langcode.as_str()
        };

        let mut node = NodeBuilder::new(&bundle)
            .title(&title)
            .langcode(langcode)
            .published(true)
            .owner(self.config.owner_id)
            .timestamps(record.created, record.changed);

        let schema = self.dest.bundle_schema(&bundle)?.clone();

        let mut has_body = false;
        if !body.is_empty() {
            match mapper::pick_body_field(&schema, text_fields.as_slice()) {
                Some(field) => {
                    node.set_text(field, &body, &self.config.text_format);
                    has_body = true;
                }
                None => log::warn!(
                    "nid {}: bundle '{}' has no text field, body dropped",
                    record.nid,
                    bundle
                ),
            }
        }

        let mut image_count = 0;
        let mut image_field = None;
        if !asset_refs.is_empty() {
            let image_def = mapper::pick_image_field(&schema, image_fields.as_slice())
                .and_then(|field| schema.field(field));
            if let Some(def) = image_def {
                if !def.has_valid_cardinality() {
                    log::warn!(
                        "nid {}: image field '{}' on bundle '{}' has invalid cardinality {}, {} asset(s) not attached",
                        record.nid,
                        def.name,
                        bundle,
                        def.cardinality,
                        asset_refs.len()
                    );
                } else {
                    let mut fids: Vec<i64> = asset_refs
                        .iter()
                        .filter_map(|r| assets::ensure_asset_record(self.dest.connection(), &r.uri))
                        .map(|a| a.fid)
                        .collect();
                    if let Ok(max) = usize::try_from(def.cardinality) {
                        fids.truncate(max);
                    }
                    if !fids.is_empty() {
                        image_count = fids.len();
                        image_field = Some(def.name.clone());
                        node.set_assets(&def.name, fids);
                    }
                }
            } else {
                log::warn!(
                    "nid {}: bundle '{}' has no image field, {} asset(s) not attached",
                    record.nid,
                    bundle,
                    asset_refs.len()
                );
            }
        }

        let node = node.build()?;
        let new_nid = self.dest.persist(&node)?;
        Ok(RecordOutcome::Imported {
            new_nid,
            bundle,
            has_body,
            image_count,
            image_field,
        })
    }

    fn audit_outcome(&self, record: &SourceRecord, outcome: &RecordOutcome) {
        let Some(audit) = &self.audit else {
            return;
        };
        let result = match outcome {
            RecordOutcome::Imported {
                new_nid, bundle, ..
            } => audit.record(record.nid, Some(*new_nid), bundle, "imported", None),
            RecordOutcome::SkippedNoBundle { bundle } => audit.record(
                record.nid,
                None,
                bundle,
                "skipped",
                Some("bundle not found in destination"),
            ),
            RecordOutcome::Failed { message } => {
                audit.record(record.nid, None, &record.bundle, "failed", Some(message))
            }
        };
        if let Err(e) = result {
            log::warn!("audit log write failed for nid {}: {}", record.nid, e);
        }
    }
}
