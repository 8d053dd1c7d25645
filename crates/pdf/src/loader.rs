use std::collections::btree_map;
use std::path::{Path, PathBuf};

use folio_core::Token;
use lopdf::{Document, ObjectId};
use tracing::debug;

use crate::error::DocumentOpenError;
use crate::text;

/// The tokens of one page, in the document's native order.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-indexed.
    pub number: u32,
    pub tokens: Vec<Token>,
}

/// Abstraction over a positioned-text document reader.
pub trait PageSource {
    type Pages: Iterator<Item = Page>;

    fn open(&self, path: &Path) -> Result<Self::Pages, DocumentOpenError>;
}

// ── lopdf backend ─────────────────────────────────────────────────────────────

/// Reads text-bearing PDFs with lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfSource;

impl PageSource for PdfSource {
    type Pages = PdfPages;

    fn open(&self, path: &Path) -> Result<PdfPages, DocumentOpenError> {
        std::fs::metadata(path).map_err(|source| DocumentOpenError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut doc = Document::load(path).map_err(|source| DocumentOpenError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        // Owner-password-only files open with the empty user password.
        if doc.is_encrypted() {
            doc.decrypt("").map_err(|err| {
                debug!(path = %path.display(), error = %err, "Empty password rejected");
                DocumentOpenError::Encrypted(path.to_path_buf())
            })?;
        }

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(DocumentOpenError::NoPages(path.to_path_buf()));
        }
        debug!(path = %path.display(), pages = pages.len(), "Opened PDF");

        Ok(PdfPages {
            path: path.to_path_buf(),
            pages: pages.into_iter(),
            doc,
        })
    }
}

/// Page iterator that owns the open document; dropping it releases the
/// document whether or not every page was consumed.
#[derive(Debug)]
pub struct PdfPages {
    path: PathBuf,
    pages: btree_map::IntoIter<u32, ObjectId>,
    doc: Document,
}

impl PdfPages {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for PdfPages {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        let (number, page_id) = self.pages.next()?;
        let tokens = text::page_tokens(&self.doc, page_id, number);
        debug!(page = number, tokens = tokens.len(), "Extracted page tokens");
        Some(Page { number, tokens })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pages.size_hint()
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Serves pre-built pages regardless of the path it is asked to open.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    pub pages: Vec<Page>,
}

impl MockSource {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }
}

impl PageSource for MockSource {
    type Pages = std::vec::IntoIter<Page>;

    fn open(&self, _path: &Path) -> Result<Self::Pages, DocumentOpenError> {
        Ok(self.pages.clone().into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{self, TextRun};
    use lopdf::dictionary;

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfSource.open(&dir.path().join("absent.pdf")).unwrap_err();
        assert!(matches!(err, DocumentOpenError::Io { .. }));
    }

    #[test]
    fn non_pdf_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"just some text, no PDF here").unwrap();
        let err = PdfSource.open(&path).unwrap_err();
        assert!(matches!(err, DocumentOpenError::Parse { .. }));
    }

    #[test]
    fn pages_come_back_in_order_with_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.pdf");
        fixture::write(
            &path,
            &[
                vec![TextRun::new(40.0, 100.0, "first page")],
                vec![],
                vec![TextRun::new(40.0, 100.0, "third")],
            ],
        )
        .unwrap();

        let pages: Vec<Page> = PdfSource.open(&path).unwrap().collect();
        assert_eq!(pages.iter().map(|p| p.number).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(pages[0].tokens.len(), 2);
        assert!(pages[1].tokens.is_empty());
        assert_eq!(pages[2].tokens[0].text, "third");
        assert_eq!(pages[2].tokens[0].page, 3);
    }

    #[test]
    fn empty_user_password_is_opened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("protected.pdf");
        let mut doc = fixture::document(&[vec![TextRun::new(40.0, 100.0, "15/01/2024 COFFEE 3,50")]]);
        doc.compress();
        fixture::encrypt_for_empty_password(&mut doc);
        doc.save(&path).unwrap();

        let pages: Vec<Page> = PdfSource.open(&path).unwrap().collect();
        let texts: Vec<&str> = pages[0].tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["15/01/2024", "COFFEE", "3,50"]);
    }

    #[test]
    fn unsupported_encryption_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pdf");
        let mut doc = fixture::document(&[vec![TextRun::new(40.0, 100.0, "secret")]]);
        let encrypt_id = doc.add_object(lopdf::dictionary! {
            "Filter" => "Standard",
            "V" => 5,
            "R" => 6,
            "P" => -4,
        });
        doc.trailer.set("Encrypt", encrypt_id);
        doc.save(&path).unwrap();

        let err = PdfSource.open(&path).unwrap_err();
        assert!(matches!(err, DocumentOpenError::Encrypted(_)));
    }

    #[test]
    fn mock_ignores_path() {
        let page = Page { number: 1, tokens: vec![] };
        let source = MockSource::new(vec![page.clone()]);
        let pages: Vec<Page> = source.open(Path::new("/nowhere")).unwrap().collect();
        assert_eq!(pages, vec![page]);
    }
}
