//! Standard-14 font metrics and WinAnsi text encoding.
//!
//! Only the base fonts every PDF reader ships are used, so nothing is
//! embedded. Text is written as single-byte WinAnsiEncoding strings; the
//! same byte mapping drives width measurement, so layout and rendering
//! always agree on what a line looks like.

use crate::config::FontFamily;
use serde::{Deserialize, Serialize};

/// A concrete standard-14 face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PdfFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl PdfFont {
    /// Regular face for a form font.
    pub fn regular(family: FontFamily) -> Self {
        match family {
            FontFamily::Arial | FontFamily::Verdana => PdfFont::Helvetica,
            FontFamily::TimesNewRoman => PdfFont::TimesRoman,
            FontFamily::Courier => PdfFont::Courier,
        }
    }

    /// Bold face for a form font.
    pub fn bold(family: FontFamily) -> Self {
        match family {
            FontFamily::Arial | FontFamily::Verdana => PdfFont::HelveticaBold,
            FontFamily::TimesNewRoman => PdfFont::TimesBold,
            FontFamily::Courier => PdfFont::CourierBold,
        }
    }

    /// PostScript name written to `/BaseFont`.
    pub fn base_font(self) -> &'static [u8] {
        match self {
            PdfFont::Helvetica => b"Helvetica",
            PdfFont::HelveticaBold => b"Helvetica-Bold",
            PdfFont::TimesRoman => b"Times-Roman",
            PdfFont::TimesBold => b"Times-Bold",
            PdfFont::Courier => b"Courier",
            PdfFont::CourierBold => b"Courier-Bold",
        }
    }

    /// Name under which the font is registered in page resources.
    pub fn resource_name(self) -> &'static [u8] {
        match self {
            PdfFont::Helvetica => b"F1",
            PdfFont::HelveticaBold => b"F2",
            PdfFont::TimesRoman => b"F3",
            PdfFont::TimesBold => b"F4",
            PdfFont::Courier => b"F5",
            PdfFont::CourierBold => b"F6",
        }
    }

    /// Advance width of one encoded byte, in 1/1000 em.
    pub fn glyph_width(self, byte: u8) -> u16 {
        let table = match self {
            PdfFont::Courier | PdfFont::CourierBold => return 600,
            PdfFont::Helvetica => &HELVETICA,
            PdfFont::HelveticaBold => &HELVETICA_BOLD,
            PdfFont::TimesRoman => &TIMES_ROMAN,
            PdfFont::TimesBold => &TIMES_BOLD,
        };
        match byte {
            0x20..=0x7E => table[(byte - 0x20) as usize],
            _ => self.glyph_width(high_byte_stand_in(byte)),
        }
    }

    /// Width of already-encoded text at `size` points.
    pub fn measure_encoded(self, encoded: &[u8], size: f32) -> f32 {
        let units: u32 = encoded.iter().map(|&b| self.glyph_width(b) as u32).sum();
        units as f32 * size / 1000.0
    }

    /// Width of `text` at `size` points.
    pub fn measure(self, text: &str, size: f32) -> f32 {
        self.measure_encoded(&encode_win_ansi(text), size)
    }
}

/// An ASCII glyph of similar width for bytes outside 0x20–0x7E.
fn high_byte_stand_in(byte: u8) -> u8 {
    match byte {
        0x85 | 0x89 | 0x97 | 0x99 => b'M', // ellipsis, per mille, em dash, trademark
        0x91 | 0x92 | 0x82 | 0x8B | 0x9B => b'\'',
        0x93 | 0x94 | 0x84 => b'"',
        0x96 => b'n', // en dash
        0xC0..=0xC5 => b'A',
        0xC8..=0xCB => b'E',
        0xD2..=0xD6 | 0xD8 => b'O',
        0xD9..=0xDC => b'U',
        0xE0..=0xE5 => b'a',
        0xE8..=0xEB => b'e',
        0xEC..=0xEF => b'i',
        0xF2..=0xF6 | 0xF8 => b'o',
        0xF9..=0xFC => b'u',
        0xC7 => b'C',
        0xE7 => b'c',
        0xD1 => b'N',
        0xF1 => b'n',
        _ => b'o',
    }
}

/// Encode text as WinAnsiEncoding bytes.
///
/// Latin-1 maps straight through; typographic quotes, dashes and a few other
/// Windows-1252 extras map to their 0x80–0x9F slots. Tabs become spaces,
/// anything else unrepresentable becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\t' => b' ',
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => b'?',
    }
}

// Advance widths for 0x20..=0x7E, from the Adobe Core14 AFM files.

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
static TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
static TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];
