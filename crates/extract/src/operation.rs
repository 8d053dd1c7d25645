use std::path::Path;

use folio_core::{ExtractionSettings, Operation, OperationError, Report};
use folio_pdf::{PdfHighlighter, PdfSource};

use crate::pipeline::{RunSummary, StatementPipeline};

/// Card statement extraction exposed as a named operation.
pub struct CardStatementOperation {
    pipeline: StatementPipeline<PdfSource, PdfHighlighter>,
}

impl CardStatementOperation {
    pub const NAME: &'static str = "card-statement";

    pub fn new(settings: ExtractionSettings) -> Self {
        Self { pipeline: StatementPipeline::pdf(settings) }
    }
}

impl Default for CardStatementOperation {
    fn default() -> Self {
        Self::new(ExtractionSettings::default())
    }
}

impl Operation for CardStatementOperation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Extract itemized card transactions into operations.csv with one highlighted PDF each"
    }

    fn run(&self, input: &Path, output_dir: &Path) -> Result<Report, OperationError> {
        self.pipeline
            .run(input, output_dir)
            .map(|summary| Report::from(&summary))
            .map_err(OperationError::from_source)
    }
}

impl From<&RunSummary> for Report {
    fn from(summary: &RunSummary) -> Self {
        Report::new()
            .with("Transactions", summary.count)
            .with("Charges", summary.total_charges)
            .with("Credits", summary.total_credits)
            .with("Balance", summary.balance)
            .with("Ledger", summary.csv_path.display())
            .with("Documents", summary.artifact_dir.display())
            .with("Source SHA-256", &summary.source_sha256)
    }
}
