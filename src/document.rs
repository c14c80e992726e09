//! The laid-out document handed from the composer to the renderer.
//!
//! Coordinates are PDF points with the origin at the top-left corner of the
//! page and y growing downwards; the renderer flips them. Every block already
//! knows where it goes, so rendering is a straight walk over the pages.

use crate::config::FontFamily;
use crate::pipeline::encode::PreparedImage;
use crate::pipeline::fonts::PdfFont;
use crate::pipeline::layout::LayoutLine;
use crate::pipeline::theme::Rgb;

/// A4 portrait, in points.
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

/// Points per millimetre.
pub const MM: f32 = 72.0 / 25.4;

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedDocument {
    /// Document title as typed by the user (the page shows it upper-cased).
    pub title: String,
    pub font_family: FontFamily,
    pub page_width: f32,
    pub page_height: f32,
    pub pages: Vec<Page>,
}

impl ComposedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }

    pub fn paragraph_blocks(&self) -> impl Iterator<Item = &ParagraphBlock> {
        self.blocks().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    pub fn image_blocks(&self) -> impl Iterator<Item = &ImageBlock> {
        self.blocks().filter_map(|b| match b {
            Block::Image(i) => Some(i),
            _ => None,
        })
    }

    /// Distinct paragraph indices that made it onto a page, in order.
    pub fn rendered_paragraphs(&self) -> Vec<usize> {
        let mut seen: Vec<usize> = Vec::new();
        for p in self.paragraph_blocks() {
            if seen.last() != Some(&p.index) {
                seen.push(p.index);
            }
        }
        seen
    }
}

/// One page: a full-bleed background and the blocks drawn on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub background: Rgb,
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn new(background: Rgb) -> Self {
        Self {
            background,
            blocks: Vec::new(),
        }
    }

    /// Fonts used on this page, deduplicated and sorted.
    pub fn fonts(&self) -> Vec<PdfFont> {
        let mut fonts: Vec<PdfFont> = self
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Title(t) => Some(t.style.font),
                Block::Paragraph(p) => Some(p.style.font),
                Block::Image(_) => None,
            })
            .collect();
        fonts.sort();
        fonts.dedup();
        fonts
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(TitleBlock),
    Paragraph(ParagraphBlock),
    Image(ImageBlock),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: PdfFont,
    pub size: f32,
    pub color: Rgb,
}

/// Centred title lines.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleBlock {
    pub lines: Vec<LayoutLine>,
    pub style: TextStyle,
    /// Left edge and width of the area the lines are centred in.
    pub x: f32,
    pub width: f32,
    /// Top of the first line cell.
    pub y: f32,
    pub line_height: f32,
}

/// A run of consecutive lines from one paragraph on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphBlock {
    /// 0-based paragraph index in the article.
    pub index: usize,
    /// True when this fragment continues a paragraph from the previous page.
    pub continued: bool,
    pub style: TextStyle,
    /// Left edge of the text (cell padding already applied).
    pub x: f32,
    /// Top of the first line cell.
    pub y: f32,
    /// Width the lines were wrapped to.
    pub width: f32,
    pub line_height: f32,
    pub lines: Vec<LayoutLine>,
}

impl ParagraphBlock {
    pub fn height(&self) -> f32 {
        self.line_height * self.lines.len() as f32
    }
}

/// A placed image, scaled to fit; never cropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    /// Paragraph slot the image follows.
    pub slot: usize,
    pub url: String,
    pub image: PreparedImage,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}
