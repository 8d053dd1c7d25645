use std::fs;
use std::path::{Path, PathBuf};

use folio_core::{Amount, ExtractionSettings, Ledger};
use folio_pdf::{
    ArtifactError, DocumentOpenError, Highlighter, HighlightStyle, PageSource, PdfHighlighter,
    PdfSource,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span};

use crate::dedup::deduplicate;
use crate::export::{self, ExportError, ARTIFACT_DIR, LEDGER_FILE};
use crate::hash;
use crate::lines::reconstruct_lines;
use crate::recognize::recognize;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Open(#[from] DocumentOpenError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one statement run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub count: usize,
    pub total_charges: Amount,
    pub total_credits: Amount,
    pub balance: Amount,
    pub csv_path: PathBuf,
    pub artifact_dir: PathBuf,
    /// SHA-256 hex digest of the input document.
    pub source_sha256: String,
}

/// Orchestrates: load → lines → recognize → dedup → CSV → artifacts.
pub struct StatementPipeline<S: PageSource, H: Highlighter> {
    source: S,
    highlighter: H,
    settings: ExtractionSettings,
}

impl StatementPipeline<PdfSource, PdfHighlighter> {
    /// The lopdf-backed pipeline, highlighting in the configured style.
    pub fn pdf(settings: ExtractionSettings) -> Self {
        let highlighter = PdfHighlighter::new(HighlightStyle::from(&settings));
        Self::new(PdfSource, highlighter, settings)
    }
}

impl<S: PageSource, H: Highlighter> StatementPipeline<S, H> {
    pub fn new(source: S, highlighter: H, settings: ExtractionSettings) -> Self {
        Self { source, highlighter, settings }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Reads every page in order and returns the deduplicated transactions.
    pub fn extract(&self, input: &Path) -> Result<Ledger, DocumentOpenError> {
        let mut found = Vec::new();
        let mut pages = 0usize;
        for page in self.source.open(input)? {
            pages += 1;
            let before = found.len();
            for line in reconstruct_lines(page.tokens, self.settings.line_bin_height) {
                if let Some(tx) = recognize(&line, page.number) {
                    found.push(tx);
                }
            }
            debug!(page = page.number, recognized = found.len() - before, "page scanned");
        }

        let recognized = found.len();
        let kept = deduplicate(found, self.settings.dedup_decimals);
        info!(pages, recognized, retained = kept.len(), "statement extracted");
        Ok(Ledger::new(kept))
    }

    /// Full run: writes `operations.csv` and one artifact per transaction
    /// under `output_dir`, creating directories as needed.
    pub fn run(&self, input: &Path, output_dir: &Path) -> Result<RunSummary, PipelineError> {
        let span = info_span!("statement_run", input = %input.display());
        let _enter = span.enter();

        let ledger = self.extract(input)?;
        let source_sha256 = hash::source_digest(input)?;

        let artifact_dir = output_dir.join(ARTIFACT_DIR);
        fs::create_dir_all(&artifact_dir).map_err(ExportError::from)?;

        let csv_path = output_dir.join(LEDGER_FILE);
        export::write_ledger_csv(&csv_path, &ledger)?;

        for tx in ledger.transactions() {
            let name = export::artifact_file_name(tx, &self.settings, self.highlighter.extension());
            let dest = export::unique_path(&artifact_dir, &name);
            self.highlighter.highlight(input, tx.page, &tx.bbox, &dest)?;
        }

        let summary = RunSummary {
            count: ledger.len(),
            total_charges: ledger.total_charges(),
            total_credits: ledger.total_credits(),
            balance: ledger.balance(),
            csv_path,
            artifact_dir,
            source_sha256,
        };
        info!(
            count = summary.count,
            charges = %summary.total_charges,
            credits = %summary.total_credits,
            balance = %summary.balance,
            "statement run complete"
        );
        Ok(summary)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
