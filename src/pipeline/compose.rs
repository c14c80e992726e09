//! Page composition: article + images + theme → [`ComposedDocument`].
//!
//! Layout is a single top-to-bottom cursor. Text lines are placed while they
//! fit above the bottom break margin; when a page is full a fresh page with
//! the same background is started and the paragraph continues there. Images
//! are scaled to the fixed image width (and further down if taller than a
//! page) and move to a fresh page when they would overflow.
//!
//! Images are fetched one at a time, in slot order, right before they are
//! placed. A failed fetch or decode is recorded as a warning and the slot is
//! left without an image.

use crate::article::GeneratedArticle;
use crate::config::ComposeConfig;
use crate::document::{
    Block, ComposedDocument, ImageBlock, Page, ParagraphBlock, TextStyle, TitleBlock, A4_HEIGHT,
    A4_WIDTH, MM,
};
use crate::error::PipelineWarning;
use crate::pipeline::encode::{prepare_image, PreparedImage};
use crate::pipeline::fetch::ImageFetcher;
use crate::pipeline::fonts::PdfFont;
use crate::pipeline::layout::{wrap_text, Align, LayoutLine};
use crate::pipeline::theme::{Rgb, Theme};
use crate::progress::GenerationProgressCallback;
use tracing::{debug, warn};

/// Page size and fixed measurements, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Left, right and top margin.
    pub margin: f32,
    /// Distance from the bottom edge at which a page breaks.
    pub bottom_margin: f32,
    /// Horizontal padding inside a text cell.
    pub cell_padding: f32,
    pub title_size: f32,
    pub title_line_height: f32,
    /// Left/right inset of images.
    pub image_inset: f32,
    /// Body line height as a multiple of the font size.
    pub line_spacing: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margin: 10.0 * MM,
            bottom_margin: 20.0 * MM,
            cell_padding: 1.0 * MM,
            title_size: 16.0,
            title_line_height: 10.0 * MM,
            image_inset: 20.0 * MM,
            line_spacing: 1.2,
        }
    }
}

impl PageGeometry {
    pub fn top(&self) -> f32 {
        self.margin
    }

    /// Lowest y a line or image may reach.
    pub fn break_y(&self) -> f32 {
        self.height - self.bottom_margin
    }

    pub fn text_left(&self) -> f32 {
        self.margin + self.cell_padding
    }

    pub fn text_width(&self) -> f32 {
        self.width - 2.0 * (self.margin + self.cell_padding)
    }

    pub fn image_width(&self) -> f32 {
        self.width - 2.0 * self.image_inset
    }

    /// Tallest image that fits on an empty page.
    pub fn max_image_height(&self) -> f32 {
        self.break_y() - self.top()
    }

    pub fn body_line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_spacing
    }
}

/// Result of [`DocumentComposer::compose`].
#[derive(Debug, Clone)]
pub struct Composition {
    pub document: ComposedDocument,
    /// Non-fatal events, in the order they happened.
    pub warnings: Vec<PipelineWarning>,
}

/// Lays out an article onto themed pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentComposer {
    geometry: PageGeometry,
}

impl DocumentComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geometry(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Compose the document.
    ///
    /// Uses the first `config.paragraph_count` paragraphs. Image `i` follows
    /// paragraph `i` when `i < config.image_count` and `i < images.len()`.
    /// With `image_count == 0` the fetcher is never called. Every warning is
    /// also reported to `progress`.
    #[allow(clippy::too_many_arguments)]
    pub async fn compose<F: ImageFetcher>(
        &self,
        title: &str,
        article: &GeneratedArticle,
        images: &[String],
        theme: &Theme,
        config: &ComposeConfig,
        fetcher: &F,
        progress: &dyn GenerationProgressCallback,
    ) -> Composition {
        let mut warnings = Vec::new();
        let mut record = |w: PipelineWarning| {
            warn!("{}", w);
            progress.on_warning(&w);
            warnings.push(w);
        };

        let available = article.paragraphs.len();
        let used = config.paragraph_count.min(available);
        if available < config.paragraph_count {
            record(PipelineWarning::FewerParagraphs {
                requested: config.paragraph_count,
                available,
            });
        }
        let image_slots = config.image_count.min(used);
        if images.len() < image_slots {
            record(PipelineWarning::FewerImages {
                requested: config.image_count,
                available: images.len(),
            });
        }

        let g = self.geometry;
        let mut pages = Paginator::new(g, theme.background);

        let title_style = TextStyle {
            font: PdfFont::bold(config.font_family),
            size: g.title_size,
            color: theme.title_color,
        };
        pages.place_title(&title.to_uppercase(), title_style);

        let body_style = TextStyle {
            font: PdfFont::regular(config.font_family),
            size: config.font_size,
            color: theme.body_color,
        };
        let line_height = g.body_line_height(config.font_size);

        for (i, paragraph) in article.paragraphs.iter().take(used).enumerate() {
            let lines = wrap_text(
                paragraph,
                body_style.font,
                body_style.size,
                g.text_width(),
                Align::Justify,
            );
            pages.place_paragraph(i, lines, body_style, line_height);

            if i < image_slots {
                if let Some(url) = images.get(i) {
                    progress.on_image_fetch(i, url);
                    let prepared = fetcher
                        .fetch(url)
                        .await
                        .and_then(|bytes| prepare_image(url, &bytes));
                    match prepared {
                        Ok(image) => pages.place_image(i, url, image),
                        Err(error) => record(PipelineWarning::ImageSkipped { slot: i, error }),
                    }
                }
            }

            pages.spacer(line_height);
        }

        let document = ComposedDocument {
            title: title.to_string(),
            font_family: config.font_family,
            page_width: g.width,
            page_height: g.height,
            pages: pages.finish(),
        };
        debug!(
            "Composed {} page(s), {} paragraph(s), {} image(s)",
            document.page_count(),
            used,
            document.image_blocks().count()
        );
        Composition { document, warnings }
    }
}

/// Top-to-bottom placement cursor over a growing page list.
struct Paginator {
    geometry: PageGeometry,
    background: Rgb,
    pages: Vec<Page>,
    y: f32,
    // Nothing placed on the current page yet.
    fresh: bool,
}

impl Paginator {
    fn new(geometry: PageGeometry, background: Rgb) -> Self {
        Self {
            geometry,
            background,
            pages: vec![Page::new(background)],
            y: geometry.top(),
            fresh: true,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::new(self.background));
        self.y = self.geometry.top();
        self.fresh = true;
    }

    fn fits(&self, height: f32) -> bool {
        self.y + height <= self.geometry.break_y()
    }

    fn push(&mut self, block: Block) {
        // `pages` always holds at least one page.
        if let Some(page) = self.pages.last_mut() {
            page.blocks.push(block);
        }
        self.fresh = false;
    }

    fn place_title(&mut self, text: &str, style: TextStyle) {
        let g = self.geometry;
        let lines = wrap_text(text, style.font, style.size, g.text_width(), Align::Left);
        let line_height = g.title_line_height;
        let start = |y: f32| TitleBlock {
            style,
            x: g.text_left(),
            width: g.text_width(),
            y,
            line_height,
            lines: Vec::new(),
        };

        // Long topics wrap onto as many pages as they need, like paragraphs.
        let mut block = start(self.y);
        for line in lines {
            if !self.fits(line_height) && !self.fresh {
                if !block.lines.is_empty() {
                    self.push(Block::Title(block));
                }
                self.new_page();
                block = start(self.y);
            }
            block.lines.push(line);
            self.y += line_height;
            self.fresh = false;
        }
        if !block.lines.is_empty() {
            self.push(Block::Title(block));
        }
    }

    fn place_paragraph(
        &mut self,
        index: usize,
        lines: Vec<LayoutLine>,
        style: TextStyle,
        line_height: f32,
    ) {
        let g = self.geometry;
        let start = |y: f32, continued: bool| ParagraphBlock {
            index,
            continued,
            style,
            x: g.text_left(),
            y,
            width: g.text_width(),
            line_height,
            lines: Vec::new(),
        };

        let mut placed_any = false;
        let mut block = start(self.y, false);
        for line in lines {
            if !self.fits(line_height) && !self.fresh {
                if !block.lines.is_empty() {
                    self.push(Block::Paragraph(block));
                }
                self.new_page();
                block = start(self.y, placed_any);
            }
            block.lines.push(line);
            self.y += line_height;
            self.fresh = false;
            placed_any = true;
        }
        if !block.lines.is_empty() {
            self.push(Block::Paragraph(block));
        }
    }

    fn place_image(&mut self, slot: usize, url: &str, image: PreparedImage) {
        let g = self.geometry;
        let mut width = g.image_width();
        let mut height = width * image.aspect_ratio();
        if height > g.max_image_height() {
            height = g.max_image_height();
            width = height / image.aspect_ratio();
        }
        if !self.fits(height) && !self.fresh {
            self.new_page();
        }
        let x = g.image_inset + (g.image_width() - width) / 2.0;
        let block = ImageBlock {
            slot,
            url: url.to_string(),
            image,
            x,
            y: self.y,
            width,
            height,
        };
        self.y += height;
        self.push(Block::Image(block));
    }

    /// One blank line. Never starts a page; clamps at the break line.
    fn spacer(&mut self, line_height: f32) {
        self.y = (self.y + line_height).min(self.geometry.break_y());
    }

    fn finish(self) -> Vec<Page> {
        self.pages
    }
}
