//! PDF access for folio: positioned-text loading and highlight artifacts.

pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;
pub mod highlight;
pub mod loader;
pub(crate) mod encoding;
pub(crate) mod fonts;
pub(crate) mod objects;
pub(crate) mod text;

pub use error::{ArtifactError, DocumentOpenError};
pub use highlight::{HighlightStyle, Highlighter, MockHighlighter, PdfHighlighter};
pub use loader::{MockSource, Page, PageSource, PdfPages, PdfSource};
