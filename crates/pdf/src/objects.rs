//! Small helpers for walking lopdf object graphs.

use lopdf::{Dictionary, Document, Object, ObjectId};

/// Follows indirect references (bounded, to survive reference cycles).
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    let mut current = obj;
    for _ in 0..8 {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(next) => current = next,
                Err(_) => return current,
            },
            _ => return current,
        }
    }
    current
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

pub(crate) fn dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj) {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

pub(crate) fn array<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Vec<Object>> {
    match resolve(doc, obj) {
        Object::Array(items) => Some(items),
        _ => None,
    }
}

pub(crate) fn get<'a>(doc: &'a Document, d: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    d.get(key).ok().map(|o| resolve(doc, o))
}

pub(crate) fn get_number(doc: &Document, d: &Dictionary, key: &[u8]) -> Option<f64> {
    get(doc, d, key).and_then(number)
}

pub(crate) fn get_dict<'a>(doc: &'a Document, d: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    d.get(key).ok().and_then(|o| dict(doc, o))
}

pub(crate) fn name(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::Name(n) => Some(n.as_slice()),
        _ => None,
    }
}

/// Looks up a page attribute, walking `/Parent` for inheritable keys
/// (`/Resources`, `/MediaBox`, `/CropBox`).
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Some(value) = get(doc, current, key) {
            return Some(value);
        }
        current = get_dict(doc, current, b"Parent")?;
    }
    None
}

/// Maps between PDF user space (origin bottom-left) and page space
/// (origin top-left of the visible box, y downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageFrame {
    pub left: f64,
    pub top: f64,
}

impl PageFrame {
    const LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

    pub fn of(doc: &Document, page_id: ObjectId) -> Self {
        let rect = inherited(doc, page_id, b"CropBox")
            .and_then(|o| rect(doc, o))
            .or_else(|| inherited(doc, page_id, b"MediaBox").and_then(|o| rect(doc, o)))
            .unwrap_or(Self::LETTER);
        PageFrame {
            left: rect[0].min(rect[2]),
            top: rect[1].max(rect[3]),
        }
    }

    pub fn to_page_space(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.left, self.top - y)
    }

    pub fn to_pdf_space(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.left, self.top - y)
    }
}

fn rect(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let items = array(doc, obj)?;
    if items.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = number(resolve(doc, item))?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn frame_round_trips_coordinates() {
        let frame = PageFrame { left: 10.0, top: 800.0 };
        let (x, y) = frame.to_page_space(110.0, 700.0);
        assert_eq!((x, y), (100.0, 100.0));
        assert_eq!(frame.to_pdf_space(x, y), (110.0, 700.0));
    }

    #[test]
    fn media_box_is_inherited_from_parent() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let frame = PageFrame::of(&doc, page_id);
        assert_eq!(frame, PageFrame { left: 0.0, top: 842.0 });
    }

    #[test]
    fn missing_media_box_defaults_to_letter() {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(dictionary! { "Type" => "Page" });
        assert_eq!(PageFrame::of(&doc, page_id).top, 792.0);
    }

    #[test]
    fn number_accepts_integer_and_real() {
        assert_eq!(number(&Object::Integer(3)), Some(3.0));
        assert_eq!(number(&Object::Real(1.5)), Some(1.5));
        assert_eq!(number(&Object::Null), None);
    }
}
