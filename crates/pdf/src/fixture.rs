//! Builds small text PDFs in memory. Used by tests across the workspace in
//! place of checked-in binary fixtures.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// A4 height; fixture coordinates are given top-down like token boxes.
pub const PAGE_HEIGHT: f64 = 842.0;
pub const FONT_SIZE: i64 = 10;

/// One string drawn in 10pt Courier with its baseline at `baseline`
/// (measured from the top of the page).
#[derive(Debug, Clone)]
pub struct TextRun {
    pub x: f64,
    pub baseline: f64,
    pub text: String,
}

impl TextRun {
    pub fn new(x: f64, baseline: f64, text: impl Into<String>) -> Self {
        Self { x, baseline, text: text.into() }
    }

    fn operations(&self) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    Object::Real(self.x as f32),
                    Object::Real((PAGE_HEIGHT - self.baseline) as f32),
                ],
            ),
            Operation::new("Tj", vec![Object::string_literal(self.text.as_str())]),
            Operation::new("ET", vec![]),
        ]
    }
}

/// Builds a document with one page per entry of `pages`.
pub fn document(pages: &[Vec<TextRun>]) -> Document {
    let per_page = pages
        .iter()
        .map(|runs| runs.iter().flat_map(TextRun::operations).collect())
        .collect();
    document_with_operations(per_page)
}

/// Builds a document from raw content operations, one list per page. Font
/// `/F1` is 10pt-capable Courier.
pub fn document_with_operations(pages: Vec<Vec<Operation>>) -> Document {
    let courier = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    };
    document_with_font(courier, pages)
}

/// Like [`document_with_operations`] with `font` installed as `/F1`.
pub fn document_with_font(font: Dictionary, pages: Vec<Vec<Operation>>) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(font);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let encoded = content.encode().unwrap_or_default();
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), (PAGE_HEIGHT as i64).into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Writes a document built by [`document`] to `path`.
pub fn write(path: &Path, pages: &[Vec<TextRun>]) -> std::io::Result<()> {
    let mut doc = document(pages);
    doc.compress();
    doc.save(path).map(|_| ()).map_err(std::io::Error::other)
}

#[cfg(test)]
pub(crate) fn single_page(runs: &[TextRun]) -> (Document, ObjectId) {
    let doc = document(&[runs.to_vec()]);
    let page_id = first_page(&doc);
    (doc, page_id)
}

#[cfg(test)]
pub(crate) fn single_page_with_operations(operations: Vec<Operation>) -> (Document, ObjectId) {
    let doc = document_with_operations(vec![operations]);
    let page_id = first_page(&doc);
    (doc, page_id)
}

#[cfg(test)]
pub(crate) fn single_page_with_font(font: Dictionary, operations: Vec<Operation>) -> (Document, ObjectId) {
    let doc = document_with_font(font, vec![operations]);
    let page_id = first_page(&doc);
    (doc, page_id)
}

#[cfg(test)]
fn first_page(doc: &Document) -> ObjectId {
    doc.get_pages().values().next().copied().unwrap_or((0, 0))
}

/// RC4 with a 40-bit key, revision 2 of the standard security handler: the
/// scheme an empty user password opens.
#[cfg(test)]
pub(crate) fn encrypt_for_empty_password(doc: &mut Document) {
    use lopdf::StringFormat::Hexadecimal;
    use md5::{Digest, Md5};

    const PAD: [u8; 32] = [
        0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08, 0x2E, 0x2E,
        0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
    ];
    let owner = vec![0x5A_u8; 32];
    let permissions: i64 = -4;
    let file_id = b"folio-fixture-01".to_vec();

    let mut seed = PAD.to_vec();
    seed.extend_from_slice(&owner);
    seed.extend_from_slice(&(permissions as u32).to_le_bytes());
    seed.extend_from_slice(&file_id);
    let key = Md5::digest(&seed)[..5].to_vec();

    for (&(number, generation), object) in doc.objects.iter_mut() {
        let mut seed = key.clone();
        seed.extend_from_slice(&number.to_le_bytes()[..3]);
        seed.extend_from_slice(&generation.to_le_bytes()[..2]);
        let object_key = &Md5::digest(&seed)[..10];
        match object {
            Object::Stream(stream) => {
                let content = rc4(object_key, &stream.content);
                stream.set_content(content);
            }
            Object::String(content, _) => *content = rc4(object_key, content),
            _ => {}
        }
    }

    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "O" => Object::String(owner, Hexadecimal),
        "U" => Object::String(rc4(&key, &PAD), Hexadecimal),
        "P" => permissions,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![Object::String(file_id.clone(), Hexadecimal), Object::String(file_id, Hexadecimal)],
    );
}

#[cfg(test)]
fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut state: [u8; 256] = std::array::from_fn(|i| i as u8);
    let mut j = 0_u8;
    for i in 0..256 {
        j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
        state.swap(i, j as usize);
    }
    let (mut i, mut j) = (0_u8, 0_u8);
    data.iter()
        .map(|byte| {
            i = i.wrapping_add(1);
            j = j.wrapping_add(state[i as usize]);
            state.swap(i as usize, j as usize);
            byte ^ state[state[i as usize].wrapping_add(state[j as usize]) as usize]
        })
        .collect()
}
