use std::path::Path;

use anyhow::{Context, Result};
use folio_core::Report;
use tracing::{info, warn};

use crate::audit::{AuditLog, AuditRecord};
use crate::context::RequestContext;
use crate::registry::Registry;

/// Runs registered operations on behalf of a request context and records
/// every attempt in the audit log.
pub struct Runner {
    registry: Registry,
    audit: AuditLog,
}

impl Runner {
    pub fn new(registry: Registry, audit: AuditLog) -> Self {
        Self { registry, audit }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn run(
        &self,
        ctx: &RequestContext,
        name: &str,
        input: &Path,
        output_dir: &Path,
    ) -> Result<Report> {
        let operator = ctx.require()?;
        let operation = self
            .registry
            .get(name)
            .with_context(|| {
                format!(
                    "unknown operation `{name}` (available: {})",
                    self.registry.names().join(", ")
                )
            })?;

        info!(operator, operation = name, input = %input.display(), "running operation");
        let (input_owned, output_owned) = (input.to_path_buf(), output_dir.to_path_buf());
        let result = tokio::task::spawn_blocking(move || operation.run(&input_owned, &output_owned))
            .await
            .context("operation task failed")?;

        let file = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        if let Err(e) = self.audit.append(&AuditRecord::new(operator, name, &file, &result)) {
            warn!(error = %e, log = %self.audit.path().display(), "could not write audit record");
        }

        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AccessGate;
    use crate::registry::tests::Marker;
    use std::sync::Arc;

    fn runner(dir: &Path) -> Runner {
        let mut registry = Registry::new();
        registry.register(Arc::new(Marker("marker")));
        Runner::new(registry, AuditLog::new(dir.join("usage.csv")))
    }

    fn signed_in() -> RequestContext {
        AccessGate::new(Some("k".into())).authenticate("ana", Some("k"))
    }

    #[tokio::test]
    async fn successful_run_is_audited() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let out = dir.path().join("out");

        let report = runner
            .run(&signed_in(), "marker", Path::new("/tmp/march.pdf"), &out)
            .await
            .unwrap();
        assert_eq!(report.get("Input"), Some("/tmp/march.pdf"));
        assert!(out.join("marker.txt").exists());

        let records = AuditLog::new(dir.path().join("usage.csv")).read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operator, "ana");
        assert_eq!(records[0].operation, "marker");
        assert_eq!(records[0].file, "march.pdf");
        assert_eq!(records[0].outcome, "ok");
    }

    #[tokio::test]
    async fn failed_run_is_audited_and_returned() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());

        let err = runner
            .run(&signed_in(), "marker", Path::new("fail.pdf"), dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cannot read input"));

        let records = AuditLog::new(dir.path().join("usage.csv")).read_all().unwrap();
        assert_eq!(records[0].outcome, "error: cannot read input");
    }

    #[tokio::test]
    async fn unauthenticated_context_never_runs() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let out = dir.path().join("out");
        let ctx = AccessGate::new(None).authenticate("ana", Some("k"));

        assert!(runner.run(&ctx, "marker", Path::new("a.pdf"), &out).await.is_err());
        assert!(!out.exists());
        assert!(!dir.path().join("usage.csv").exists());
    }

    #[tokio::test]
    async fn unknown_operation_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner(dir.path())
            .run(&signed_in(), "payroll", Path::new("a.pdf"), dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown operation `payroll`"));
    }
}
