//! Content-stream interpretation: turns a page's show-text operators into
//! positioned word tokens.

use std::collections::HashMap;
use std::rc::Rc;

use folio_core::{BoundingBox, Token};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::warn;

use crate::fonts::FontInfo;
use crate::objects::{self, number, PageFrame};

const MAX_FORM_DEPTH: u8 = 8;
/// Horizontal pen jump (in em) that starts a new word.
const WORD_GAP_EM: f64 = 0.15;
const BASELINE_SHIFT_EM: f64 = 0.25;

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    fn from_operands(ops: &[Object]) -> Option<Self> {
        if ops.len() != 6 {
            return None;
        }
        let v: Vec<f64> = ops.iter().map(number).collect::<Option<_>>()?;
        Some(Matrix { a: v[0], b: v[1], c: v[2], d: v[3], e: v[4], f: v[5] })
    }

    fn translation(tx: f64, ty: f64) -> Self {
        Matrix { e: tx, f: ty, ..Matrix::IDENTITY }
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, o: &Matrix) -> Matrix {
        Matrix {
            a: self.a * o.a + self.b * o.c,
            b: self.a * o.b + self.b * o.d,
            c: self.c * o.a + self.d * o.c,
            d: self.c * o.b + self.d * o.d,
            e: self.e * o.a + self.f * o.c + o.e,
            f: self.e * o.b + self.f * o.d + o.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    fn vertical_scale(&self) -> f64 {
        self.c.hypot(self.d)
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font: Rc<FontInfo>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    h_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        TextState {
            font: Rc::new(FontInfo::fallback()),
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

struct Word {
    text: String,
    bbox: BoundingBox,
}

/// Extracts the word tokens of one page in content-stream order.
///
/// A page whose content cannot be decoded yields no tokens.
pub(crate) fn page_tokens(doc: &Document, page_id: ObjectId, page: u32) -> Vec<Token> {
    let content = match doc.get_page_content(page_id) {
        Ok(c) => c,
        Err(e) => {
            warn!(page, error = %e, "Unreadable page content, skipping page");
            return Vec::new();
        }
    };
    let resources = objects::inherited(doc, page_id, b"Resources")
        .and_then(|o| objects::dict(doc, o));

    let mut extractor = TextExtractor {
        doc,
        frame: PageFrame::of(doc, page_id),
        page,
        tokens: Vec::new(),
        word: None,
        pen: None,
        fonts: HashMap::new(),
    };
    let initial = GraphicsState { ctm: Matrix::IDENTITY, text: TextState::default() };
    if let Err(e) = extractor.run(&content, resources, initial, 0) {
        warn!(page, error = %e, "Undecodable page content, skipping page");
    }
    extractor.flush();
    extractor.tokens
}

struct TextExtractor<'a> {
    doc: &'a Document,
    frame: PageFrame,
    page: u32,
    tokens: Vec<Token>,
    word: Option<Word>,
    /// Device-space pen after the last visible glyph, with the em size there.
    pen: Option<(f64, f64, f64)>,
    fonts: HashMap<ObjectId, Rc<FontInfo>>,
}

impl<'a> TextExtractor<'a> {
    fn run(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        initial: GraphicsState,
        depth: u8,
    ) -> Result<(), lopdf::Error> {
        let content = Content::decode(content)?;
        let mut gs = initial;
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;

        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        gs.ctm = m.then(&gs.ctm);
                    }
                }
                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                }
                "ET" => self.flush(),
                "Tf" => {
                    if let [font, size] = operands {
                        if let Some(font) = objects::name(font) {
                            gs.text.font = self.font(resources, font);
                        }
                        gs.text.size = number(size).unwrap_or(gs.text.size);
                    }
                }
                "Tc" => set_number(operands, &mut gs.text.char_spacing),
                "Tw" => set_number(operands, &mut gs.text.word_spacing),
                "TL" => set_number(operands, &mut gs.text.leading),
                "Ts" => set_number(operands, &mut gs.text.rise),
                "Tz" => {
                    if let Some(pct) = operands.first().and_then(number) {
                        gs.text.h_scale = pct / 100.0;
                    }
                }
                "Td" | "TD" => {
                    if let [tx, ty] = operands {
                        if let (Some(tx), Some(ty)) = (number(tx), number(ty)) {
                            if op.operator == "TD" {
                                gs.text.leading = -ty;
                            }
                            tlm = Matrix::translation(tx, ty).then(&tlm);
                            tm = tlm;
                        }
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => {
                    tlm = Matrix::translation(0.0, -gs.text.leading).then(&tlm);
                    tm = tlm;
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes, &gs, &mut tm);
                    }
                }
                "'" | "\"" => {
                    if op.operator == "\"" {
                        if let [aw, ac, _] = operands {
                            gs.text.word_spacing = number(aw).unwrap_or(gs.text.word_spacing);
                            gs.text.char_spacing = number(ac).unwrap_or(gs.text.char_spacing);
                        }
                    }
                    tlm = Matrix::translation(0.0, -gs.text.leading).then(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.last() {
                        self.show(bytes, &gs, &mut tm);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.show(bytes, &gs, &mut tm),
                                other => {
                                    if let Some(adjust) = number(other) {
                                        let tx = -adjust / 1000.0 * gs.text.size * gs.text.h_scale;
                                        tm = Matrix::translation(tx, 0.0).then(&tm);
                                    }
                                }
                            }
                        }
                    }
                }
                "Do" if depth < MAX_FORM_DEPTH => {
                    if let Some(name) = operands.first().and_then(objects::name) {
                        if let Err(e) = self.form(resources, name, &gs, depth) {
                            warn!(page = self.page, error = %e, "Skipping undecodable form XObject");
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn font(&mut self, resources: Option<&'a Dictionary>, name: &[u8]) -> Rc<FontInfo> {
        let doc = self.doc;
        let entry = resources
            .and_then(|r| objects::get_dict(doc, r, b"Font"))
            .and_then(|fonts| fonts.get(name).ok());

        match entry {
            Some(Object::Reference(id)) => Rc::clone(self.fonts.entry(*id).or_insert_with(|| {
                Rc::new(
                    doc.get_dictionary(*id)
                        .map(|d| FontInfo::from_dict(doc, d))
                        .unwrap_or_else(|_| FontInfo::fallback()),
                )
            })),
            Some(inline) => Rc::new(
                objects::dict(doc, inline)
                    .map(|d| FontInfo::from_dict(doc, d))
                    .unwrap_or_else(FontInfo::fallback),
            ),
            None => Rc::new(FontInfo::fallback()),
        }
    }

    fn form(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        gs: &GraphicsState,
        depth: u8,
    ) -> Result<(), lopdf::Error> {
        let doc = self.doc;
        let Some(Object::Stream(stream)) = resources
            .and_then(|r| objects::get_dict(doc, r, b"XObject"))
            .and_then(|x| objects::get(doc, x, name))
        else {
            return Ok(());
        };
        if objects::get(doc, &stream.dict, b"Subtype").and_then(objects::name) != Some(b"Form".as_slice()) {
            return Ok(());
        }

        let matrix = objects::get(doc, &stream.dict, b"Matrix")
            .and_then(|o| objects::array(doc, o))
            .and_then(|a| Matrix::from_operands(a))
            .unwrap_or(Matrix::IDENTITY);
        let form_resources = objects::get_dict(doc, &stream.dict, b"Resources").or(resources);
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let inner = GraphicsState { ctm: matrix.then(&gs.ctm), text: gs.text.clone() };
        self.run(&content, form_resources, inner, depth + 1)
    }

    fn show(&mut self, bytes: &[u8], gs: &GraphicsState, tm: &mut Matrix) {
        let text = &gs.text;
        let font = Rc::clone(&text.font);

        for code in font.codes(bytes) {
            let glyph = font.decode(code);
            let advance = font.width(code) * text.size;
            let glyph_width = advance * text.h_scale;
            let trm = tm.then(&gs.ctm);

            if !glyph.is_empty() && glyph.chars().all(char::is_whitespace) {
                self.flush();
            } else if !glyph.is_empty() {
                let (sx, sy) = trm.apply(0.0, 0.0);
                let em = text.size.abs() * trm.vertical_scale();
                self.break_if_discontinuous(sx, sy, em);

                let y_lo = text.rise + font.descent * text.size;
                let y_hi = text.rise + font.ascent * text.size;
                let corners = [(0.0, y_lo), (glyph_width, y_lo), (0.0, y_hi), (glyph_width, y_hi)]
                    .map(|(x, y)| {
                        let (dx, dy) = trm.apply(x, y);
                        self.frame.to_page_space(dx, dy)
                    });
                let bbox = BoundingBox::new(
                    corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min),
                    corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min),
                    corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max),
                    corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max),
                );

                match self.word.as_mut() {
                    Some(word) => {
                        word.text.push_str(&glyph);
                        word.bbox = word.bbox.union(&bbox);
                    }
                    None => self.word = Some(Word { text: glyph, bbox }),
                }
                let (ex, ey) = trm.apply(glyph_width, 0.0);
                self.pen = Some((ex, ey, em));
            }

            let word_spacing = if code == 32 && !font.is_two_byte() { text.word_spacing } else { 0.0 };
            let tx = (advance + text.char_spacing + word_spacing) * text.h_scale;
            *tm = Matrix::translation(tx, 0.0).then(tm);
        }
    }

    fn break_if_discontinuous(&mut self, x: f64, y: f64, em: f64) {
        if let Some((px, py, pem)) = self.pen {
            let scale = pem.max(em).max(f64::EPSILON);
            if (x - px).abs() > WORD_GAP_EM * scale || (y - py).abs() > BASELINE_SHIFT_EM * scale {
                self.flush();
            }
        }
    }

    fn flush(&mut self) {
        if let Some(word) = self.word.take() {
            self.tokens.push(Token::new(word.text, word.bbox, self.page));
        }
        self.pen = None;
    }
}

fn set_number(operands: &[Object], slot: &mut f64) {
    if let Some(v) = operands.first().and_then(number) {
        *slot = v;
    }
}
