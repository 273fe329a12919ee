use crate::core::error::ImportError;
use crate::core::time;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only JSONL record of per-node import outcomes.
pub struct AuditLog {
    path: PathBuf,
    run_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImportEvent {
    pub ts: String,
    pub event_id: String,
    pub run_id: String,
    pub source_nid: i64,
    pub new_nid: Option<i64>,
    pub bundle: String,
    pub status: String,
    pub detail: Option<String>,
}

impl AuditLog {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            run_id: time::new_event_id(),
        }
    }

    pub fn record(
        &self,
        source_nid: i64,
        new_nid: Option<i64>,
        bundle: &str,
        status: &str,
        detail: Option<&str>,
    ) -> Result<(), ImportError> {
        let ev = ImportEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            run_id: self.run_id.clone(),
            source_nid,
            new_nid,
            bundle: bundle.to_string(),
            status: status.to_string(),
            detail: detail.map(|s| s.to_string()),
        };

        let line = serde_json::to_string(&ev)
            .map_err(|e| ImportError::ValidationError(format!("audit event: {e}")))?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(ImportError::IoError)?;
        writeln!(f, "{}", line).map_err(ImportError::IoError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn events_append_one_line_each() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("import.events.jsonl");
        let log = AuditLog::new(&path);
        log.record(101, Some(1), "page", "imported", None).unwrap();
        log.record(102, None, "story", "skipped", Some("no bundle")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let events: Vec<ImportEvent> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].new_nid, Some(1));
        assert_eq!(events[1].detail.as_deref(), Some("no bundle"));
        assert_eq!(events[0].run_id, events[1].run_id);
    }
}
