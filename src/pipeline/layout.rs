//! Line breaking and justification.
//!
//! Greedy word wrap against a fixed width, measured with the same WinAnsi
//! bytes the renderer writes. Explicit newlines inside a paragraph are hard
//! breaks. A word wider than the whole line is split by characters so
//! nothing ever runs past the margin.

use crate::pipeline::fonts::{encode_win_ansi, PdfFont};
use serde::{Deserialize, Serialize};

/// One laid-out line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutLine {
    /// Line text without leading/trailing spaces; words joined by one space.
    pub text: String,
    /// Natural width in points, before justification.
    pub width: f32,
    /// Extra space added to every space character (the PDF `Tw` operator).
    /// Zero for lines that are not stretched.
    pub word_spacing: f32,
}

impl LayoutLine {
    fn plain(text: String, font: PdfFont, size: f32) -> Self {
        let width = font.measure(&text, size);
        Self {
            text,
            width,
            word_spacing: 0.0,
        }
    }

    /// Number of space characters the word spacing applies to.
    pub fn space_count(&self) -> usize {
        self.text.bytes().filter(|&b| b == b' ').count()
    }

    /// Width once word spacing is applied.
    pub fn justified_width(&self) -> f32 {
        self.width + self.word_spacing * self.space_count() as f32
    }
}

/// Text alignment within the line width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Justify,
}

/// Wrap `text` to `max_width` points.
///
/// With [`Align::Justify`], every line that was broken because it was full
/// is stretched to exactly `max_width`; the last line of each hard line stays
/// ragged.
pub fn wrap_text(text: &str, font: PdfFont, size: f32, max_width: f32, align: Align) -> Vec<LayoutLine> {
    let mut lines = Vec::new();
    for hard_line in text.split('\n') {
        wrap_hard_line(hard_line, font, size, max_width, align, &mut lines);
    }
    lines
}

fn wrap_hard_line(
    hard_line: &str,
    font: PdfFont,
    size: f32,
    max_width: f32,
    align: Align,
    out: &mut Vec<LayoutLine>,
) {
    let space = font.measure(" ", size);
    let mut current: Vec<String> = Vec::new();
    let mut current_width = 0.0f32;

    let mut words: Vec<String> = hard_line.split_whitespace().map(str::to_string).collect();
    words.reverse();

    while let Some(word) = words.pop() {
        let word_width = font.measure(&word, size);

        if word_width > max_width {
            // Flush what we have, then split the oversized word.
            if !current.is_empty() {
                out.push(full_line(&current, font, size, max_width, align));
                current.clear();
                current_width = 0.0;
            }
            let (head, tail) = split_to_width(&word, font, size, max_width);
            if !tail.is_empty() {
                words.push(tail);
            }
            current.push(head);
            current_width = font.measure(&current[0], size);
            if !words.is_empty() {
                out.push(LayoutLine::plain(current.join(" "), font, size));
                current.clear();
                current_width = 0.0;
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_width
        } else {
            current_width + space + word_width
        };
        if needed > max_width && !current.is_empty() {
            out.push(full_line(&current, font, size, max_width, align));
            current.clear();
            current_width = word_width;
        } else {
            current_width = needed;
        }
        current.push(word);
    }

    // Last line of the hard line: never stretched. An empty hard line still
    // takes up one line of height.
    out.push(LayoutLine::plain(current.join(" "), font, size));
}

fn full_line(words: &[String], font: PdfFont, size: f32, max_width: f32, align: Align) -> LayoutLine {
    let mut line = LayoutLine::plain(words.join(" "), font, size);
    let spaces = line.space_count();
    if align == Align::Justify && spaces > 0 && line.width < max_width {
        line.word_spacing = (max_width - line.width) / spaces as f32;
    }
    line
}

/// Longest prefix of `word` (at least one char) that fits in `max_width`.
fn split_to_width(word: &str, font: PdfFont, size: f32, max_width: f32) -> (String, String) {
    let mut width = 0.0f32;
    let mut split_at = word.len();
    for (i, c) in word.char_indices() {
        let w = font.measure_encoded(&encode_win_ansi(c.encode_utf8(&mut [0; 4])), size);
        if width + w > max_width && i > 0 {
            split_at = i;
            break;
        }
        width += w;
    }
    (word[..split_at].to_string(), word[split_at..].to_string())
}
