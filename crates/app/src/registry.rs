use std::collections::BTreeMap;
use std::sync::Arc;

use folio_core::{ExtractionSettings, Operation};
use folio_extract::CardStatementOperation;

/// Operations the shell can run, by name.
#[derive(Default)]
pub struct Registry {
    operations: BTreeMap<String, Arc<dyn Operation>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything shipped with folio.
    pub fn with_builtin(settings: &ExtractionSettings) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CardStatementOperation::new(settings.clone())));
        registry
    }

    /// Adds `operation`, replacing and returning any previous one of the same name.
    pub fn register(&mut self, operation: Arc<dyn Operation>) -> Option<Arc<dyn Operation>> {
        self.operations.insert(operation.name().to_string(), operation)
    }

    /// Sorted.
    pub fn names(&self) -> Vec<&str> {
        self.operations.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.operations.get(name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Operation>> {
        self.operations.values()
    }
}
