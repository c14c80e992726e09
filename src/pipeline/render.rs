//! PDF serialisation of a [`ComposedDocument`] with `pdf-writer`.
//!
//! ## Object layout
//!
//! ```text
//! 1 catalog ─▶ 2 page tree ─▶ page, content stream (one pair per page)
//! 3 document info
//! fonts (one Type1 object per face used), images (one DCT XObject each)
//! ```
//!
//! Fonts are standard-14 faces with WinAnsiEncoding, so nothing is embedded
//! and text bytes are the ones [`crate::pipeline::fonts::encode_win_ansi`]
//! produced during layout. Justified lines carry their own `Tw` value.
//!
//! The composer works top-down; PDF user space is bottom-up. Every y is
//! flipped here and nowhere else.

use crate::document::{Block, ComposedDocument, ImageBlock, ParagraphBlock, TitleBlock};
use crate::error::ArticleError;
use crate::pipeline::fonts::{encode_win_ansi, PdfFont};
use crate::pipeline::layout::LayoutLine;
use crate::pipeline::theme::Rgb;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Written to the document info `/Producer` entry.
pub const PRODUCER: &str = concat!("edgequake-article2pdf ", env!("CARGO_PKG_VERSION"));

/// Render on the blocking pool; PDF assembly and image copying are CPU-bound.
pub async fn render_document(doc: ComposedDocument) -> Result<Vec<u8>, ArticleError> {
    tokio::task::spawn_blocking(move || render_pdf(&doc))
        .await
        .map_err(|e| ArticleError::Internal(format!("Render task panicked: {}", e)))?
}

/// Serialise `doc` to PDF bytes.
pub fn render_pdf(doc: &ComposedDocument) -> Result<Vec<u8>, ArticleError> {
    if doc.pages.is_empty() {
        return Err(ArticleError::Render("document has no pages".into()));
    }

    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let info_id = alloc.bump();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.document_info(info_id)
        .title(TextStr(&doc.title))
        .producer(TextStr(PRODUCER));

    // One font object per face, shared by every page.
    let mut fonts: BTreeMap<PdfFont, Ref> = BTreeMap::new();
    for page in &doc.pages {
        for font in page.fonts() {
            fonts.entry(font).or_insert_with(|| alloc.bump());
        }
    }
    for (font, id) in &fonts {
        pdf.type1_font(*id)
            .base_font(Name(font.base_font()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    let mut page_ids = Vec::with_capacity(doc.pages.len());
    let mut image_total = 0usize;

    for page in &doc.pages {
        let page_id = alloc.bump();
        let content_id = alloc.bump();
        page_ids.push(page_id);

        let mut content = Content::new();
        fill_background(&mut content, page.background, doc.page_width, doc.page_height);

        let mut images: Vec<(String, Ref, &ImageBlock)> = Vec::new();
        for block in &page.blocks {
            match block {
                Block::Title(title) => draw_title(&mut content, title, doc.page_height),
                Block::Paragraph(para) => draw_paragraph(&mut content, para, doc.page_height),
                Block::Image(image) => {
                    image_total += 1;
                    let name = format!("Im{}", image_total);
                    draw_image(&mut content, Name(name.as_bytes()), image, doc.page_height);
                    images.push((name, alloc.bump(), image));
                }
            }
        }

        for (_, id, block) in &images {
            let img = &block.image;
            let mut xobject = pdf.image_xobject(*id, &img.jpeg);
            xobject.filter(Filter::DctDecode);
            xobject.width(img.pixel_width as i32);
            xobject.height(img.pixel_height as i32);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
            xobject.finish();
        }

        let mut page_writer = pdf.page(page_id);
        page_writer
            .media_box(Rect::new(0.0, 0.0, doc.page_width, doc.page_height))
            .parent(page_tree_id)
            .contents(content_id);
        let mut resources = page_writer.resources();
        {
            let mut font_dict = resources.fonts();
            for font in page.fonts() {
                if let Some(id) = fonts.get(&font) {
                    font_dict.pair(Name(font.resource_name()), *id);
                }
            }
        }
        if !images.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, id, _) in &images {
                xobjects.pair(Name(name.as_bytes()), *id);
            }
        }
        resources.finish();
        page_writer.finish();

        pdf.stream(content_id, &content.finish());
    }

    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    let bytes = pdf.finish();
    info!(
        "Rendered {} page(s), {} image(s), {} bytes",
        doc.pages.len(),
        image_total,
        bytes.len()
    );
    Ok(bytes)
}

fn fill_background(content: &mut Content, color: Rgb, width: f32, height: f32) {
    let [r, g, b] = color.to_unit();
    content.save_state();
    content.set_fill_rgb(r, g, b);
    content.rect(0.0, 0.0, width, height);
    content.fill_nonzero();
    content.restore_state();
}

/// PDF baseline for line `k` of a block whose first cell starts at `top`.
/// Text sits in the middle of its cell, like a spreadsheet cell.
fn baseline(page_height: f32, top: f32, k: usize, line_height: f32, size: f32) -> f32 {
    page_height - (top + k as f32 * line_height + line_height / 2.0 + 0.3 * size)
}

fn draw_title(content: &mut Content, title: &TitleBlock, page_height: f32) {
    let style = title.style;
    let [r, g, b] = style.color.to_unit();
    content.begin_text();
    content.set_fill_rgb(r, g, b);
    content.set_font(Name(style.font.resource_name()), style.size);
    for (k, line) in title.lines.iter().enumerate() {
        let x = title.x + (title.width - line.width) / 2.0;
        let y = baseline(page_height, title.y, k, title.line_height, style.size);
        show_line(content, line, x, y);
    }
    content.end_text();
}

fn draw_paragraph(content: &mut Content, para: &ParagraphBlock, page_height: f32) {
    let style = para.style;
    let [r, g, b] = style.color.to_unit();
    content.begin_text();
    content.set_fill_rgb(r, g, b);
    content.set_font(Name(style.font.resource_name()), style.size);
    for (k, line) in para.lines.iter().enumerate() {
        let y = baseline(page_height, para.y, k, para.line_height, style.size);
        show_line(content, line, para.x, y);
    }
    content.end_text();
}

fn show_line(content: &mut Content, line: &LayoutLine, x: f32, y: f32) {
    if line.text.is_empty() {
        return;
    }
    content.set_word_spacing(line.word_spacing);
    content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
    content.show(Str(&encode_win_ansi(&line.text)));
}

fn draw_image(content: &mut Content, name: Name, image: &ImageBlock, page_height: f32) {
    debug!("Placing image {} at y={:.1}", image.url, image.y);
    content.save_state();
    content.transform([
        image.width,
        0.0,
        0.0,
        image.height,
        image.x,
        page_height - image.y - image.height,
    ]);
    content.x_object(name);
    content.restore_state();
}
