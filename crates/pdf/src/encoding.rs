//! Single-byte font encodings: a named base table plus `/Differences`.

use std::sync::OnceLock;

use lopdf::{Dictionary, Document, Object};

use crate::objects::{array, get, name, number, resolve};

/// Unicode for each of the 256 codes of a simple font; `None` when unmapped.
pub(crate) type CodeTable = [Option<char>; 256];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BaseEncoding {
    Standard,
    WinAnsi,
    MacRoman,
    MacExpert,
}

impl BaseEncoding {
    pub fn from_name(encoding: &[u8]) -> Option<Self> {
        match encoding {
            b"StandardEncoding" => Some(Self::Standard),
            b"WinAnsiEncoding" => Some(Self::WinAnsi),
            b"MacRomanEncoding" => Some(Self::MacRoman),
            b"MacExpertEncoding" => Some(Self::MacExpert),
            _ => None,
        }
    }

    fn lopdf_name(self) -> &'static str {
        match self {
            Self::Standard => "StandardEncoding",
            Self::WinAnsi => "WinAnsiEncoding",
            Self::MacRoman => "MacRomanEncoding",
            Self::MacExpert => "MacExpertEncoding",
        }
    }

    /// Built once per process from lopdf's tables.
    pub fn table(self) -> &'static CodeTable {
        static STANDARD: OnceLock<CodeTable> = OnceLock::new();
        static WIN_ANSI: OnceLock<CodeTable> = OnceLock::new();
        static MAC_ROMAN: OnceLock<CodeTable> = OnceLock::new();
        static MAC_EXPERT: OnceLock<CodeTable> = OnceLock::new();

        let cell = match self {
            Self::Standard => &STANDARD,
            Self::WinAnsi => &WIN_ANSI,
            Self::MacRoman => &MAC_ROMAN,
            Self::MacExpert => &MAC_EXPERT,
        };
        cell.get_or_init(|| {
            std::array::from_fn(|code| {
                Document::decode_text(Some(self.lopdf_name()), &[code as u8])
                    .chars()
                    .next()
            })
        })
    }
}

/// Resolves a simple font's `/Encoding`. Fonts without one, or with a base
/// encoding name we don't know, read as WinAnsi.
pub(crate) fn simple_font_table(doc: &Document, font: &Dictionary) -> CodeTable {
    let mut table = *BaseEncoding::WinAnsi.table();

    match get(doc, font, b"Encoding") {
        Some(Object::Name(encoding)) => {
            if let Some(base) = BaseEncoding::from_name(encoding) {
                table = *base.table();
            }
        }
        Some(Object::Dictionary(encoding)) => {
            if let Some(base) = get(doc, encoding, b"BaseEncoding")
                .and_then(name)
                .and_then(BaseEncoding::from_name)
            {
                table = *base.table();
            }
            if let Some(differences) = get(doc, encoding, b"Differences").and_then(|o| array(doc, o)) {
                apply_differences(doc, &mut table, differences);
            }
        }
        _ => {}
    }

    table
}

/// `[code /name /name ... code /name ...]`: each name takes the next code.
/// Names we can't map keep the base entry.
fn apply_differences(doc: &Document, table: &mut CodeTable, differences: &[Object]) {
    let mut code: Option<usize> = None;
    for item in differences {
        let item = resolve(doc, item);
        if let Some(n) = number(item) {
            code = Some(n.max(0.0) as usize);
        } else if let (Some(glyph), Some(at)) = (name(item), code) {
            if let Some(slot) = table.get_mut(at) {
                if let Some(c) = glyph_char(glyph) {
                    *slot = Some(c);
                }
            }
            code = Some(at + 1);
        }
    }
}

// ── Glyph names ──────────────────────────────────────────────────────────────

/// Names of U+00A0..=U+00FF in order.
const LATIN1_NAMES: [&str; 96] = [
    "nbspace", "exclamdown", "cent", "sterling", "currency", "yen", "brokenbar", "section",
    "dieresis", "copyright", "ordfeminine", "guillemotleft", "logicalnot", "sfthyphen",
    "registered", "macron", "degree", "plusminus", "twosuperior", "threesuperior", "acute", "mu",
    "paragraph", "periodcentered", "cedilla", "onesuperior", "ordmasculine", "guillemotright",
    "onequarter", "onehalf", "threequarters", "questiondown", "Agrave", "Aacute", "Acircumflex",
    "Atilde", "Adieresis", "Aring", "AE", "Ccedilla", "Egrave", "Eacute", "Ecircumflex",
    "Edieresis", "Igrave", "Iacute", "Icircumflex", "Idieresis", "Eth", "Ntilde", "Ograve",
    "Oacute", "Ocircumflex", "Otilde", "Odieresis", "multiply", "Oslash", "Ugrave", "Uacute",
    "Ucircumflex", "Udieresis", "Yacute", "Thorn", "germandbls", "agrave", "aacute",
    "acircumflex", "atilde", "adieresis", "aring", "ae", "ccedilla", "egrave", "eacute",
    "ecircumflex", "edieresis", "igrave", "iacute", "icircumflex", "idieresis", "eth", "ntilde",
    "ograve", "oacute", "ocircumflex", "otilde", "odieresis", "divide", "oslash", "ugrave",
    "uacute", "ucircumflex", "udieresis", "yacute", "thorn", "ydieresis",
];

const NAMED: &[(&str, char)] = &[
    ("space", ' '), ("exclam", '!'), ("quotedbl", '"'), ("numbersign", '#'),
    ("dollar", '$'), ("percent", '%'), ("ampersand", '&'), ("quotesingle", '\''),
    ("parenleft", '('), ("parenright", ')'), ("asterisk", '*'), ("plus", '+'),
    ("comma", ','), ("hyphen", '-'), ("period", '.'), ("slash", '/'),
    ("zero", '0'), ("one", '1'), ("two", '2'), ("three", '3'), ("four", '4'),
    ("five", '5'), ("six", '6'), ("seven", '7'), ("eight", '8'), ("nine", '9'),
    ("colon", ':'), ("semicolon", ';'), ("less", '<'), ("equal", '='), ("greater", '>'),
    ("question", '?'), ("at", '@'), ("bracketleft", '['), ("backslash", '\\'),
    ("bracketright", ']'), ("asciicircum", '^'), ("underscore", '_'), ("grave", '`'),
    ("braceleft", '{'), ("bar", '|'), ("braceright", '}'), ("asciitilde", '~'),
    ("nonbreakingspace", '\u{A0}'), ("Euro", '€'), ("quotesinglbase", '‚'), ("florin", 'ƒ'),
    ("quotedblbase", '„'), ("ellipsis", '…'), ("dagger", '†'), ("daggerdbl", '‡'),
    ("circumflex", 'ˆ'), ("perthousand", '‰'), ("Scaron", 'Š'), ("guilsinglleft", '‹'),
    ("OE", 'Œ'), ("Zcaron", 'Ž'), ("quoteleft", '‘'), ("quoteright", '’'),
    ("quotedblleft", '“'), ("quotedblright", '”'), ("bullet", '•'), ("endash", '–'),
    ("emdash", '—'), ("tilde", '˜'), ("trademark", '™'), ("scaron", 'š'),
    ("guilsinglright", '›'), ("oe", 'œ'), ("zcaron", 'ž'), ("Ydieresis", 'Ÿ'),
    ("minus", '−'), ("fraction", '⁄'), ("dotlessi", 'ı'), ("fi", 'ﬁ'), ("fl", 'ﬂ'),
];

/// Unicode for an Adobe glyph name: `uniXXXX`, `uXXXX[XX]`, single letters,
/// and the Latin names used by the standard encodings. A `.suffix` variant
/// (`zero.lf`, `a.sc`) maps like its base name.
pub(crate) fn glyph_char(glyph: &[u8]) -> Option<char> {
    let glyph = std::str::from_utf8(glyph).ok()?;
    let glyph = glyph.split('.').next().filter(|g| !g.is_empty())?;

    if let Some(hex) = glyph.strip_prefix("uni").filter(|h| h.len() >= 4) {
        return u32::from_str_radix(hex.get(..4)?, 16).ok().and_then(char::from_u32);
    }
    if let Some(hex) = glyph
        .strip_prefix('u')
        .filter(|h| (4..=6).contains(&h.len()) && h.chars().all(|c| c.is_ascii_hexdigit()))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }

    let mut chars = glyph.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c);
        }
    }

    NAMED
        .iter()
        .find(|(n, _)| *n == glyph)
        .map(|(_, c)| *c)
        .or_else(|| {
            LATIN1_NAMES
                .iter()
                .position(|n| *n == glyph)
                .and_then(|i| char::from_u32(0xA0 + i as u32))
        })
}
