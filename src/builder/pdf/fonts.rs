//! Standard Type1 fonts, their metrics and WinAnsi encoding.

use crate::model::TextStyle;
use unicode_normalization::UnicodeNormalization;

/// Glyph widths (1/1000 em) of Helvetica for bytes 0x20..=0x7E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // sp - /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0 - 9
    278, 278, 584, 584, 584, 556, 1015, // : - @
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A - M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N - Z
    278, 278, 278, 469, 556, 333, // [ - `
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a - m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n - z
    334, 260, 334, 584, // { - ~
];

/// Glyph widths (1/1000 em) of Helvetica-Bold for bytes 0x20..=0x7E.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // sp - /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0 - 9
    333, 333, 584, 584, 584, 611, 975, // : - @
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A - M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N - Z
    333, 278, 333, 584, 556, 333, // [ - `
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a - m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n - z
    389, 280, 389, 584, // { - ~
];

/// Code points for WinAnsi bytes 0x80..=0x9F (0 = undefined).
const WIN_ANSI_HIGH: [u32; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, // 80 - 87
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0, 0x017D, 0, // 88 - 8F
    0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, // 90 - 97
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178, // 98 - 9F
];

/// The built-in fonts the PDF builder draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Font {
    Regular,
    Bold,
    Italic,
    BoldItalic,
    Mono,
}

impl Font {
    pub(crate) fn for_style(style: TextStyle) -> Self {
        match style {
            TextStyle::Normal => Font::Regular,
            TextStyle::Bold => Font::Bold,
            TextStyle::Italic => Font::Italic,
            TextStyle::BoldItalic => Font::BoldItalic,
            TextStyle::Monospace => Font::Mono,
        }
    }

    /// PostScript name of the standard font.
    pub(crate) fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Italic => "Helvetica-Oblique",
            Font::BoldItalic => "Helvetica-BoldOblique",
            Font::Mono => "Courier",
        }
    }

    /// Key in the page font resources.
    pub(crate) fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
            Font::BoldItalic => "F4",
            Font::Mono => "F5",
        }
    }

    /// Width of an encoded byte in 1/1000 em.
    fn byte_width(&self, byte: u8) -> u16 {
        let table = match self {
            Font::Mono => return 600,
            Font::Regular | Font::Italic => &HELVETICA_WIDTHS,
            Font::Bold | Font::BoldItalic => &HELVETICA_BOLD_WIDTHS,
        };
        match byte {
            0x20..=0x7E => table[(byte - 0x20) as usize],
            0x95 => 350,
            0xA0 => table[0],
            _ => 556,
        }
    }

    /// Width of text in points at the given size.
    pub(crate) fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = encode(text)
            .into_iter()
            .map(|b| self.byte_width(b) as u32)
            .sum();
        units as f32 * size / 1000.0
    }

    /// Break text into lines no wider than `max_width` points.
    ///
    /// Explicit newlines are kept. Words wider than a line are split
    /// between characters.
    pub(crate) fn wrap(&self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let paragraph = paragraph.replace('\t', "    ");
            let mut line = String::new();

            for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
                let candidate = if line.is_empty() {
                    word.to_string()
                } else {
                    format!("{} {}", line, word)
                };
                if self.text_width(&candidate, size) <= max_width {
                    line = candidate;
                    continue;
                }

                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                if self.text_width(word, size) <= max_width {
                    line = word.to_string();
                } else {
                    for piece in self.split_word(word, size, max_width) {
                        if !line.is_empty() {
                            lines.push(std::mem::take(&mut line));
                        }
                        line = piece;
                    }
                }
            }
            lines.push(line);
        }
        lines
    }

    fn split_word(&self, word: &str, size: f32, max_width: f32) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut piece = String::new();
        for c in word.chars() {
            piece.push(c);
            if piece.chars().count() > 1 && self.text_width(&piece, size) > max_width {
                piece.pop();
                pieces.push(std::mem::take(&mut piece));
                piece.push(c);
            }
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
        pieces
    }
}

/// Encode text as WinAnsi bytes. Characters outside the encoding fall back
/// to their base letter when one exists, else `?`.
pub(crate) fn encode(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

fn encode_char(c: char) -> u8 {
    if let Some(byte) = win_ansi_byte(c) {
        return byte;
    }
    c.to_string()
        .nfd()
        .next()
        .and_then(win_ansi_byte)
        .filter(|b| b.is_ascii_alphabetic())
        .unwrap_or(b'?')
}

fn win_ansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|&cp| cp != 0 && cp == code)
            .map(|i| 0x80 + i as u8),
    }
}
