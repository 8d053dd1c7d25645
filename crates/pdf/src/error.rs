use std::path::PathBuf;
use thiserror::Error;

/// The source document could not be opened as a text-bearing PDF.
#[derive(Debug, Error)]
pub enum DocumentOpenError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Not a valid PDF ({path}): {source}")]
    Parse {
        path: PathBuf,
        source: lopdf::Error,
    },
    #[error("Encrypted PDFs are not supported: {0}")]
    Encrypted(PathBuf),
    #[error("PDF has no pages: {0}")]
    NoPages(PathBuf),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Page {0} not found in source document")]
    MissingPage(u32),
}
