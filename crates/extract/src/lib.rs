//! Card statement extraction: lines, recognition, deduplication, export and
//! the pipeline tying them to a page source and a highlighter.

pub mod dedup;
pub mod export;
pub mod hash;
pub mod lines;
pub mod operation;
pub mod pipeline;
pub mod recognize;

pub use dedup::deduplicate;
pub use export::{ExportError, ARTIFACT_DIR, LEDGER_FILE};
pub use lines::{reconstruct_lines, Line};
pub use operation::CardStatementOperation;
pub use pipeline::{PipelineError, RunSummary, StatementPipeline};
pub use recognize::recognize;
