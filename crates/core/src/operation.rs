use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Failure of a whole operation run, carrying the underlying cause.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct OperationError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    pub fn from_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self { message: err.to_string(), source: Some(Box::new(err)) }
    }
}

/// Ordered, labelled results of a run, ready for display or serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub fields: Vec<(String, String)>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((label.into(), value.to_string()));
        self
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

/// A named document-processing operation the host shell can list and invoke.
pub trait Operation: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn run(&self, input: &Path, output_dir: &Path) -> Result<Report, OperationError>;
}
