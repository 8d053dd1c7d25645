//! Just enough font handling to decode shown strings and measure glyphs.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};

use crate::encoding::{simple_font_table, BaseEncoding, CodeTable};
use crate::objects::{array, get, get_dict, get_number, name, number, resolve};

/// Glyph metrics and character mapping for one font resource.
#[derive(Debug, Clone)]
pub(crate) struct FontInfo {
    two_byte: bool,
    first_char: u32,
    /// Simple-font widths from `/Widths`, in glyph space (1/1000 em).
    widths: Vec<f64>,
    /// Composite-font widths from `/W`.
    cid_widths: HashMap<u32, f64>,
    default_width: f64,
    to_unicode: Option<HashMap<u32, String>>,
    /// Code to Unicode for simple fonts, from `/Encoding`.
    encoding: CodeTable,
    /// Fractions of an em above and below the baseline.
    pub ascent: f64,
    pub descent: f64,
}

impl FontInfo {
    /// Stand-in for a `Tf` naming a font that isn't in the resources.
    pub fn fallback() -> Self {
        FontInfo {
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: 500.0,
            to_unicode: None,
            encoding: *BaseEncoding::WinAnsi.table(),
            ascent: 0.8,
            descent: -0.2,
        }
    }

    pub fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let mut info = FontInfo::fallback();

        let subtype = get(doc, font, b"Subtype").and_then(name).unwrap_or_default();
        let base_font = get(doc, font, b"BaseFont").and_then(name).unwrap_or_default();
        if base_font.windows(7).any(|w| w.eq_ignore_ascii_case(b"courier")) {
            info.default_width = 600.0;
        }

        let descriptor_owner = if subtype == b"Type0" {
            info.two_byte = true;
            let descendant = get(doc, font, b"DescendantFonts")
                .and_then(|o| array(doc, o))
                .and_then(|a| a.first())
                .and_then(|o| crate::objects::dict(doc, o));
            if let Some(cid_font) = descendant {
                if let Some(dw) = get_number(doc, cid_font, b"DW") {
                    info.default_width = dw;
                } else {
                    info.default_width = 1000.0;
                }
                if let Some(w) = get(doc, cid_font, b"W").and_then(|o| array(doc, o)) {
                    info.cid_widths = parse_cid_widths(doc, w);
                }
            }
            descendant
        } else {
            info.first_char = get_number(doc, font, b"FirstChar").unwrap_or(0.0).max(0.0) as u32;
            if let Some(w) = get(doc, font, b"Widths").and_then(|o| array(doc, o)) {
                info.widths = w
                    .iter()
                    .map(|o| number(resolve(doc, o)).unwrap_or(0.0))
                    .collect();
            }
            info.encoding = simple_font_table(doc, font);
            Some(font)
        };

        if let Some(desc) = descriptor_owner.and_then(|d| get_dict(doc, d, b"FontDescriptor")) {
            if let Some(a) = get_number(doc, desc, b"Ascent").filter(|a| *a > 0.0) {
                info.ascent = a / 1000.0;
            }
            if let Some(d) = get_number(doc, desc, b"Descent").filter(|d| *d < 0.0) {
                info.descent = d / 1000.0;
            }
        }

        if let Some(Object::Stream(stream)) = font.get(b"ToUnicode").ok().map(|o| resolve(doc, o)) {
            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            let map = parse_to_unicode(&data);
            if !map.is_empty() {
                info.to_unicode = Some(map);
            }
        }

        info
    }

    /// Splits a shown string into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|c| c.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32))
                .collect()
        } else {
            bytes.iter().map(|b| *b as u32).collect()
        }
    }

    pub fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    pub fn decode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.get(&code)) {
            return text.clone();
        }
        if self.two_byte {
            // Without a ToUnicode map the CID carries no text meaning.
            return char::from_u32(code).map(String::from).unwrap_or_default();
        }
        self.encoding
            .get(code as usize)
            .copied()
            .flatten()
            .map(String::from)
            .unwrap_or_default()
    }

    /// Advance width of `code` in em.
    pub fn width(&self, code: u32) -> f64 {
        let glyph = if self.two_byte {
            self.cid_widths.get(&code).copied()
        } else {
            code.checked_sub(self.first_char)
                .and_then(|i| self.widths.get(i as usize))
                .copied()
                .filter(|w| *w > 0.0)
        };
        glyph.unwrap_or(self.default_width) / 1000.0
    }
}

// ── /W array ──────────────────────────────────────────────────────────────────

/// `/W` entries are either `c [w1 w2 ...]` or `c_first c_last w`.
fn parse_cid_widths(doc: &Document, w: &[Object]) -> HashMap<u32, f64> {
    let mut out = HashMap::new();
    let mut i = 0;
    while i < w.len() {
        let Some(first) = number(resolve(doc, &w[i])) else {
            break;
        };
        let first = first as u32;
        match w.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, item) in list.iter().enumerate() {
                    if let Some(width) = number(resolve(doc, item)) {
                        out.insert(first + offset as u32, width);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(width)) =
                    (number(last), w.get(i + 2).and_then(|o| number(resolve(doc, o))))
                else {
                    break;
                };
                for cid in first..=(last as u32).min(first.saturating_add(0xFFFF)) {
                    out.insert(cid, width);
                }
                i += 3;
            }
            None => break,
        }
    }
    out
}

// ── ToUnicode CMaps ───────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum CmapToken {
    Hex(Vec<u8>),
    Open,
    Close,
    Word(String),
}

fn tokenize_cmap(data: &[u8]) -> Vec<CmapToken> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'>' => i += 1,
            b'<' => {
                let end = data[i + 1..]
                    .iter()
                    .position(|b| *b == b'>')
                    .map_or(data.len(), |p| i + 1 + p);
                let digits: Vec<u8> = data[i + 1..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                tokens.push(CmapToken::Hex(hex_bytes(&digits)));
                i = end + 1;
            }
            b'[' => {
                tokens.push(CmapToken::Open);
                i += 1;
            }
            b']' => {
                tokens.push(CmapToken::Close);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'>' | b'[' | b']' | b'%')
                {
                    i += 1;
                }
                tokens.push(CmapToken::Word(String::from_utf8_lossy(&data[start..i]).into_owned()));
            }
        }
    }
    tokens
}

fn hex_bytes(digits: &[u8]) -> Vec<u8> {
    digits
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16).unwrap_or(0);
            let lo = pair.get(1).and_then(|c| (*c as char).to_digit(16)).unwrap_or(0);
            (hi * 16 + lo) as u8
        })
        .collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32)
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| ((c[0] as u16) << 8) | c.get(1).copied().unwrap_or(0) as u16)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Reads `bfchar` and `bfrange` sections of a ToUnicode CMap.
pub(crate) fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let tokens = tokenize_cmap(data);
    let mut map = HashMap::new();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            CmapToken::Word(w) if w == "beginbfchar" => {
                i += 1;
                while let (Some(CmapToken::Hex(src)), Some(CmapToken::Hex(dst))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    map.insert(code_of(src), utf16_text(dst));
                    i += 2;
                }
            }
            CmapToken::Word(w) if w == "beginbfrange" => {
                i += 1;
                while let (Some(CmapToken::Hex(lo)), Some(CmapToken::Hex(hi))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    let (lo, hi) = (code_of(lo), code_of(hi));
                    match tokens.get(i + 2) {
                        Some(CmapToken::Hex(dst)) => {
                            let base = utf16_text(dst);
                            let mut chars: Vec<char> = base.chars().collect();
                            for code in lo..=hi.min(lo.saturating_add(0xFFFF)) {
                                map.insert(code, chars.iter().collect());
                                if let Some(last) = chars.last_mut() {
                                    *last = char::from_u32(*last as u32 + 1).unwrap_or(*last);
                                }
                            }
                            i += 3;
                        }
                        Some(CmapToken::Open) => {
                            i += 3;
                            let mut code = lo;
                            while let Some(CmapToken::Hex(dst)) = tokens.get(i) {
                                if code <= hi {
                                    map.insert(code, utf16_text(dst));
                                }
                                code += 1;
                                i += 1;
                            }
                            if matches!(tokens.get(i), Some(CmapToken::Close)) {
                                i += 1;
                            }
                        }
                        _ => break,
                    }
                }
            }
            _ => i += 1,
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    const CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <00E9>
endbfchar
2 beginbfrange
<0024> <0026> <0041>
<0030> <0031> [<0078> <0079>]
endbfrange
endcmap";

    #[test]
    fn to_unicode_bfchar_and_bfrange() {
        let map = parse_to_unicode(CMAP);
        assert_eq!(map.get(&0x03).map(String::as_str), Some(" "));
        assert_eq!(map.get(&0x11).map(String::as_str), Some("é"));
        assert_eq!(map.get(&0x24).map(String::as_str), Some("A"));
        assert_eq!(map.get(&0x26).map(String::as_str), Some("C"));
        assert_eq!(map.get(&0x30).map(String::as_str), Some("x"));
        assert_eq!(map.get(&0x31).map(String::as_str), Some("y"));
    }

    #[test]
    fn simple_font_decodes_through_its_encoding() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "ABCDEF+Arial",
            "Encoding" => "MacRomanEncoding",
        };
        let info = FontInfo::from_dict(&doc, &font);
        assert_eq!(info.decode(0x8E), "é");
        assert_eq!(info.decode(b'7' as u32), "7");
        assert_eq!(FontInfo::fallback().decode(0x80), "€");
    }

    #[test]
    fn to_unicode_wins_over_encoding() {
        let mut info = FontInfo::fallback();
        info.to_unicode = Some(HashMap::from([(0x41, "Z".to_string())]));
        assert_eq!(info.decode(0x41), "Z");
        assert_eq!(info.decode(0x42), "B");
    }

    #[test]
    fn simple_font_widths_from_dictionary() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "FirstChar" => 65,
            "Widths" => vec![667.into(), 667.into()],
        };
        let info = FontInfo::from_dict(&doc, &font);
        assert_eq!(info.width(65), 0.667);
        // Outside the table falls back to the default.
        assert_eq!(info.width(90), 0.5);
        assert_eq!(info.decode(65), "A");
    }

    #[test]
    fn courier_without_widths_is_monospaced() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        };
        let info = FontInfo::from_dict(&doc, &font);
        assert_eq!(info.width(b'W' as u32), 0.6);
        assert_eq!(info.width(b'i' as u32), 0.6);
    }

    #[test]
    fn cid_widths_both_forms() {
        let doc = Document::with_version("1.5");
        let w = vec![
            1.into(),
            Object::Array(vec![500.into(), 600.into()]),
            10.into(),
            12.into(),
            250.into(),
        ];
        let map = parse_cid_widths(&doc, &w);
        assert_eq!(map.get(&1), Some(&500.0));
        assert_eq!(map.get(&2), Some(&600.0));
        assert_eq!(map.get(&11), Some(&250.0));
        assert_eq!(map.get(&13), None);
    }

    #[test]
    fn two_byte_codes() {
        let mut info = FontInfo::fallback();
        info.two_byte = true;
        assert_eq!(info.codes(&[0x00, 0x24, 0x01, 0x02]), vec![0x24, 0x0102]);
    }
}
