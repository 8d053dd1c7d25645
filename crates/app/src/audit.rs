use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const HEADER: [&str; 5] = ["timestamp", "operator", "operation", "file", "outcome"];

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One line of the usage log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub operator: String,
    pub operation: String,
    pub file: String,
    /// `ok` or `error: <message>`.
    pub outcome: String,
}

impl AuditRecord {
    pub fn new<T, E: std::fmt::Display>(
        operator: &str,
        operation: &str,
        file: &str,
        result: &Result<T, E>,
    ) -> Self {
        let outcome = match result {
            Ok(_) => "ok".to_string(),
            Err(e) => format!("error: {e}"),
        };
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            operator: operator.to_string(),
            operation: operation.to_string(),
            file: file.to_string(),
            outcome,
        }
    }
}

/// Append-only CSV of every operation run.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `record`, creating the file and its header on first use.
    pub fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let is_new = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
        }
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// All records in file order; a missing log reads as empty.
    pub fn read_all(&self) -> Result<Vec<AuditRecord>, AuditError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader.deserialize().collect::<Result<Vec<AuditRecord>, _>>()?;
        Ok(records)
    }

    /// Deletes the log. Returns whether there was anything to delete.
    pub fn clear(&self) -> Result<bool, AuditError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
