use std::path::Path;
use std::sync::Mutex;

use folio_core::{BoundingBox, ExtractionSettings};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::ArtifactError;
use crate::objects::PageFrame;

/// Fill/stroke colour (RGB, 0.0–1.0) and opacity of a highlight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightStyle {
    pub color: [f32; 3],
    pub opacity: f32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self { color: [1.0, 1.0, 0.0], opacity: 0.35 }
    }
}

impl From<&ExtractionSettings> for HighlightStyle {
    fn from(s: &ExtractionSettings) -> Self {
        Self { color: s.highlight_color, opacity: s.highlight_opacity }
    }
}

/// Writes a copy of a source document with one region marked.
pub trait Highlighter {
    /// File extension of the produced artifacts, without the dot.
    fn extension(&self) -> &str;

    fn highlight(
        &self,
        source: &Path,
        page: u32,
        bbox: &BoundingBox,
        dest: &Path,
    ) -> Result<(), ArtifactError>;
}

// ── lopdf backend ─────────────────────────────────────────────────────────────

/// Adds a translucent `/Square` annotation to a fresh copy of the source PDF.
#[derive(Debug, Clone, Default)]
pub struct PdfHighlighter {
    style: HighlightStyle,
}

impl PdfHighlighter {
    pub fn new(style: HighlightStyle) -> Self {
        Self { style }
    }
}

impl Highlighter for PdfHighlighter {
    fn extension(&self) -> &str {
        "pdf"
    }

    fn highlight(
        &self,
        source: &Path,
        page: u32,
        bbox: &BoundingBox,
        dest: &Path,
    ) -> Result<(), ArtifactError> {
        let mut doc = Document::load(source)?;
        let page_id = *doc
            .get_pages()
            .get(&page)
            .ok_or(ArtifactError::MissingPage(page))?;

        let frame = PageFrame::of(&doc, page_id);
        let (llx, lly) = frame.to_pdf_space(bbox.x0, bbox.y1);
        let (urx, ury) = frame.to_pdf_space(bbox.x1, bbox.y0);
        let (width, height) = ((urx - llx) as f32, (ury - lly) as f32);

        let appearance_id = doc.add_object(appearance_stream(&self.style, width, height)?);
        let color = rgb(&self.style.color);
        let annotation_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Square",
            "Rect" => vec![
                Object::Real(llx as f32),
                Object::Real(lly as f32),
                Object::Real(urx as f32),
                Object::Real(ury as f32),
            ],
            "C" => color.clone(),
            "IC" => color,
            "CA" => Object::Real(self.style.opacity),
            "F" => Object::Integer(4),
            "P" => page_id,
            "BS" => dictionary! { "W" => Object::Integer(1) },
            "AP" => dictionary! { "N" => appearance_id },
        });

        attach_annotation(&mut doc, page_id, annotation_id)?;
        doc.compress();
        doc.save(dest)?;
        Ok(())
    }
}

fn rgb(color: &[f32; 3]) -> Vec<Object> {
    color.iter().map(|c| Object::Real(*c)).collect()
}

/// Form XObject drawing the filled and stroked rectangle at the style's
/// opacity, so viewers that ignore `/CA` still render it translucent.
fn appearance_stream(style: &HighlightStyle, width: f32, height: f32) -> Result<Stream, lopdf::Error> {
    let [r, g, b] = style.color;
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("gs", vec!["GS0".into()]),
            Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new("RG", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new("w", vec![Object::Integer(1)]),
            Operation::new(
                "re",
                vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width),
                    Object::Real(height),
                ],
            ),
            Operation::new("B", vec![]),
            Operation::new("Q", vec![]),
        ],
    };

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width),
            Object::Real(height),
        ],
        "Resources" => dictionary! {
            "ExtGState" => dictionary! {
                "GS0" => dictionary! {
                    "Type" => "ExtGState",
                    "CA" => Object::Real(style.opacity),
                    "ca" => Object::Real(style.opacity),
                },
            },
        },
    };
    Ok(Stream::new(dict, content.encode()?))
}

/// Appends to the page's `/Annots`, whether it is inline, indirect or absent.
fn attach_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    annotation_id: ObjectId,
) -> Result<(), ArtifactError> {
    let existing = doc.get_dictionary(page_id)?.get(b"Annots").ok().cloned();

    let annots = match existing {
        Some(Object::Reference(array_id)) => {
            if let Ok(Object::Array(items)) = doc.get_object_mut(array_id) {
                items.push(Object::Reference(annotation_id));
                return Ok(());
            }
            vec![Object::Reference(annotation_id)]
        }
        Some(Object::Array(mut items)) => {
            items.push(Object::Reference(annotation_id));
            items
        }
        _ => vec![Object::Reference(annotation_id)],
    };

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Annots", Object::Array(annots));
    Ok(())
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Writes a small text file per highlight and remembers each request.
#[derive(Debug, Default)]
pub struct MockHighlighter {
    calls: Mutex<Vec<(u32, BoundingBox)>>,
}

impl MockHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(u32, BoundingBox)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Highlighter for MockHighlighter {
    fn extension(&self) -> &str {
        "pdf"
    }

    fn highlight(
        &self,
        _source: &Path,
        page: u32,
        bbox: &BoundingBox,
        dest: &Path,
    ) -> Result<(), ArtifactError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((page, *bbox));
        }
        std::fs::write(dest, format!("page {page}: {bbox:?}\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{self, TextRun};

    fn annotations(doc: &Document, page: u32) -> Vec<ObjectId> {
        let page_id = doc.get_pages()[&page];
        let page_dict = doc.get_dictionary(page_id).unwrap();
        match page_dict.get(b"Annots") {
            Ok(Object::Array(items)) => items
                .iter()
                .filter_map(|o| match o {
                    Object::Reference(id) => Some(*id),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }

    fn real(obj: &Object) -> f64 {
        crate::objects::number(obj).unwrap()
    }

    #[test]
    fn square_annotation_covers_box_on_requested_page() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("statement.pdf");
        fixture::write(
            &source,
            &[
                vec![TextRun::new(40.0, 100.0, "page one")],
                vec![TextRun::new(40.0, 100.0, "page two")],
            ],
        )
        .unwrap();

        let dest = dir.path().join("out.pdf");
        let bbox = BoundingBox::new(40.0, 92.0, 100.0, 102.0);
        PdfHighlighter::default()
            .highlight(&source, 2, &bbox, &dest)
            .unwrap();

        let doc = Document::load(&dest).unwrap();
        assert!(annotations(&doc, 1).is_empty());
        let annots = annotations(&doc, 2);
        assert_eq!(annots.len(), 1);

        let annot = doc.get_dictionary(annots[0]).unwrap();
        assert_eq!(
            crate::objects::name(annot.get(b"Subtype").unwrap()),
            Some(b"Square".as_slice())
        );
        let rect: Vec<f64> = match annot.get(b"Rect").unwrap() {
            Object::Array(items) => items.iter().map(real).collect(),
            other => panic!("unexpected rect {other:?}"),
        };
        // Page is 842 tall: top-down y 92..102 becomes 740..750.
        assert_eq!(rect, vec![40.0, 740.0, 100.0, 750.0]);
        assert!((real(annot.get(b"CA").unwrap()) - 0.35).abs() < 1e-6);
        let fill: Vec<f64> = match annot.get(b"IC").unwrap() {
            Object::Array(items) => items.iter().map(real).collect(),
            other => panic!("unexpected colour {other:?}"),
        };
        assert_eq!(fill, vec![1.0, 1.0, 0.0]);

        // The source itself is untouched.
        let original = Document::load(&source).unwrap();
        assert!(annotations(&original, 2).is_empty());
    }

    #[test]
    fn existing_annotations_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        let source = dir.path().join("statement.pdf");
        fixture::write(&source, &[vec![TextRun::new(40.0, 100.0, "x")]]).unwrap();

        let bbox = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        let h = PdfHighlighter::default();
        h.highlight(&source, 1, &bbox, &first).unwrap();
        h.highlight(&first, 1, &bbox, &second).unwrap();

        let doc = Document::load(&second).unwrap();
        assert_eq!(annotations(&doc, 1).len(), 2);
    }

    #[test]
    fn missing_page_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("statement.pdf");
        fixture::write(&source, &[vec![]]).unwrap();
        let err = PdfHighlighter::default()
            .highlight(&source, 5, &BoundingBox::new(0.0, 0.0, 1.0, 1.0), &dir.path().join("x.pdf"))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::MissingPage(5)));
    }

    #[test]
    fn style_follows_settings() {
        let settings = ExtractionSettings {
            highlight_color: [0.0, 1.0, 0.0],
            highlight_opacity: 0.5,
            ..ExtractionSettings::default()
        };
        let style = HighlightStyle::from(&settings);
        assert_eq!(style.color, [0.0, 1.0, 0.0]);
        assert_eq!(style.opacity, 0.5);
    }

    #[test]
    fn mock_records_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.pdf");
        let h = MockHighlighter::new();
        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        h.highlight(Path::new("ignored.pdf"), 2, &bbox, &dest).unwrap();
        assert!(dest.exists());
        assert_eq!(h.calls(), vec![(2, bbox)]);
    }
}
