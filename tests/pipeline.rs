//! Pipeline integration tests with in-process providers.
//!
//! No network: text, search and image bytes come from the doubles below, so
//! these run everywhere. Live-provider runs live in `tests/e2e.rs`.

use edgequake_article2pdf::{
    ArticleError, ArticleGenerator, ArticleRequest, FetchError, GenerationError,
    GenerationProgressCallback, GeneratorConfig, ImageFetcher, ImageSearch, ImageSet,
    PipelineWarning, Rgb, SearchError, Stage, TextSource, ThemeStrategy,
};
use edgequake_article2pdf::pipeline::cached::{CachedImageSearch, CachedTextSource};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test doubles ─────────────────────────────────────────────────────────────
//
// Each double shares its call log through an `Arc`, so a test can keep a
// handle after moving the double into the generator.

#[derive(Clone)]
struct MockText {
    reply: Result<String, GenerationError>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockText {
    fn ok(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Arc::default(),
        }
    }

    fn failing(err: GenerationError) -> Self {
        Self {
            reply: Err(err),
            prompts: Arc::default(),
        }
    }
}

impl TextSource for MockText {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

#[derive(Clone)]
struct MockSearch {
    reply: Result<ImageSet, SearchError>,
    calls: Arc<AtomicUsize>,
}

impl MockSearch {
    fn urls(urls: &[&str]) -> Self {
        Self {
            reply: Ok(urls.iter().map(|u| u.to_string()).collect()),
            calls: Arc::default(),
        }
    }

    fn failing(err: SearchError) -> Self {
        Self {
            reply: Err(err),
            calls: Arc::default(),
        }
    }
}

impl ImageSearch for MockSearch {
    async fn search(&self, _query: &str, max_results: usize) -> Result<ImageSet, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map(|urls| urls.into_iter().take(max_results.min(2)).collect())
    }
}

/// Serves a small PNG for every URL, except URLs containing "broken".
#[derive(Clone, Default)]
struct MockFetcher {
    calls: Arc<AtomicUsize>,
}

impl ImageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("broken") {
            return Err(FetchError::Timeout {
                url: url.to_string(),
                secs: 30,
            });
        }
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 36, image::Rgb([180, 60, 20])))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        Ok(buf)
    }
}

#[derive(Default)]
struct Recorder {
    stages: Mutex<Vec<Stage>>,
    warnings: Mutex<Vec<PipelineWarning>>,
    completed: Mutex<Option<(usize, usize)>>,
}

impl GenerationProgressCallback for Recorder {
    fn on_stage_start(&self, stage: Stage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_warning(&self, warning: &PipelineWarning) {
        self.warnings.lock().unwrap().push(warning.clone());
    }

    fn on_run_complete(&self, page_count: usize, byte_len: usize) {
        *self.completed.lock().unwrap() = Some((page_count, byte_len));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const THREE_PARAGRAPHS: &str = "Para A text here.\n\nPara B text here.\n\nPara C text here.";

fn request(topic: &str, paragraphs: u8, images: u8) -> ArticleRequest {
    ArticleRequest::builder(topic)
        .paragraph_count(paragraphs)
        .image_count(images)
        .build()
        .expect("valid request")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn volcanoes_article_with_two_images() {
    let text = MockText::ok(THREE_PARAGRAPHS);
    let prompts = text.prompts.clone();
    let gen = ArticleGenerator::new(
        text,
        MockSearch::urls(&["http://img/1.jpg", "http://img/2.jpg"]),
        MockFetcher::default(),
        GeneratorConfig::default(),
    );
    let out = gen.run(&request("volcanoes", 3, 2)).await.expect("run");

    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    assert_eq!(out.paragraphs_rendered, 3);
    assert_eq!(out.images_rendered, 2);
    assert_eq!(out.page_count, 1);
    assert_eq!(out.theme.background, Rgb(202, 202, 202));
    assert_eq!(out.theme.body_color, Rgb::BLACK);

    let pdf = &out.pdf.bytes;
    assert!(pdf.starts_with(b"%PDF-"));
    assert!(contains(pdf, b"(VOLCANOES) Tj"));
    assert!(contains(pdf, b"(Para A text here.) Tj"));
    assert_eq!(count(pdf, b"/DCTDecode"), 2);
    assert_eq!(out.pdf.filename, "generated_article.pdf");
    assert_eq!(out.pdf.mime_type, "application/pdf");

    assert_eq!(
        *prompts.lock().unwrap(),
        vec!["Write a short article about volcanoes with 3 paragraphs:".to_string()]
    );
}

#[tokio::test]
async fn empty_image_set_degrades_to_text_only() {
    let gen = ArticleGenerator::new(
        MockText::ok(THREE_PARAGRAPHS),
        MockSearch::urls(&[]),
        MockFetcher::default(),
        GeneratorConfig::default(),
    );
    let out = gen.run(&request("tides", 3, 2)).await.expect("run");

    assert_eq!(out.images_rendered, 0);
    assert_eq!(out.paragraphs_rendered, 3);
    assert!(out.warnings.contains(&PipelineWarning::NoImagesFound {
        query: "tides".into()
    }));
    assert!(!contains(&out.pdf.bytes, b"/DCTDecode"));
}

#[tokio::test]
async fn search_failure_degrades_by_default() {
    let gen = ArticleGenerator::new(
        MockText::ok(THREE_PARAGRAPHS),
        MockSearch::failing(SearchError::Status {
            status: 401,
            body: "Unauthorized".into(),
        }),
        MockFetcher::default(),
        GeneratorConfig::default(),
    );
    let out = gen.run(&request("tides", 3, 2)).await.expect("run");

    assert_eq!(out.images_rendered, 0);
    match &out.warnings[0] {
        PipelineWarning::ImageSearchFailed { detail } => assert!(detail.contains("401")),
        other => panic!("expected ImageSearchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn search_failure_is_fatal_when_images_are_required() {
    let config = GeneratorConfig::builder()
        .require_images(true)
        .build()
        .unwrap();
    let gen = ArticleGenerator::new(
        MockText::ok(THREE_PARAGRAPHS),
        MockSearch::failing(SearchError::Status {
            status: 401,
            body: "Unauthorized".into(),
        }),
        MockFetcher::default(),
        config,
    );
    let err = gen.run(&request("tides", 3, 2)).await.unwrap_err();
    assert!(matches!(err, ArticleError::Search(SearchError::Status { status: 401, .. })));
}

#[tokio::test]
async fn empty_search_is_fatal_when_images_are_required() {
    let config = GeneratorConfig::builder()
        .require_images(true)
        .build()
        .unwrap();
    let gen = ArticleGenerator::new(
        MockText::ok(THREE_PARAGRAPHS),
        MockSearch::urls(&[]),
        MockFetcher::default(),
        config,
    );
    let err = gen.run(&request("tides", 3, 2)).await.unwrap_err();
    assert!(matches!(err, ArticleError::ImagesRequired { .. }));
}

#[tokio::test]
async fn zero_images_skips_search_and_fetch() {
    let search = MockSearch::urls(&["http://img/1.jpg"]);
    let search_calls = search.calls.clone();
    let fetcher = MockFetcher::default();
    let fetch_calls = fetcher.calls.clone();
    let config = GeneratorConfig::builder()
        .require_images(true)
        .build()
        .unwrap();
    let gen = ArticleGenerator::new(MockText::ok(THREE_PARAGRAPHS), search, fetcher, config);

    let out = gen.run(&request("tides", 3, 0)).await.expect("run");
    assert_eq!(search_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
    assert_eq!(out.images_rendered, 0);
    assert!(out.warnings.is_empty());
}

#[tokio::test]
async fn extra_paragraphs_are_truncated() {
    let gen = ArticleGenerator::new(
        MockText::ok("One.\n\nTwo.\n\nThree.\n\nFour.\n\nFive."),
        MockSearch::urls(&[]),
        MockFetcher::default(),
        GeneratorConfig::default(),
    );
    let out = gen.run(&request("tides", 2, 0)).await.expect("run");
    assert_eq!(out.paragraphs_rendered, 2);
    assert!(contains(&out.pdf.bytes, b"(Two.) Tj"));
    assert!(!contains(&out.pdf.bytes, b"(Three.) Tj"));
}

#[tokio::test]
async fn short_article_is_rendered_with_a_warning() {
    let gen = ArticleGenerator::new(
        MockText::ok("Only one paragraph."),
        MockSearch::urls(&[]),
        MockFetcher::default(),
        GeneratorConfig::default(),
    );
    let out = gen.run(&request("tides", 4, 0)).await.expect("run");
    assert_eq!(out.paragraphs_rendered, 1);
    assert_eq!(
        out.warnings,
        vec![PipelineWarning::FewerParagraphs {
            requested: 4,
            available: 1
        }]
    );
}

#[tokio::test]
async fn failed_download_skips_that_image_only() {
    let recorder = Arc::new(Recorder::default());
    let config = GeneratorConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let gen = ArticleGenerator::new(
        MockText::ok(THREE_PARAGRAPHS),
        MockSearch::urls(&["http://img/broken.jpg", "http://img/2.jpg"]),
        MockFetcher::default(),
        config,
    );
    let out = gen.run(&request("tides", 3, 2)).await.expect("run");

    assert_eq!(out.images_rendered, 1);
    assert_eq!(out.paragraphs_rendered, 3);
    assert!(matches!(
        out.warnings.as_slice(),
        [PipelineWarning::ImageSkipped { slot: 0, .. }]
    ));
    assert_eq!(*recorder.warnings.lock().unwrap(), out.warnings);
}

#[tokio::test]
async fn generation_failure_is_fatal() {
    let gen = ArticleGenerator::new(
        MockText::failing(GenerationError::Api {
            message: "quota exceeded".into(),
        }),
        MockSearch::urls(&["http://img/1.jpg"]),
        MockFetcher::default(),
        GeneratorConfig::default(),
    );
    let err = gen.run(&request("tides", 3, 2)).await.unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn blank_completion_is_an_empty_response() {
    let gen = ArticleGenerator::new(
        MockText::ok("  \n\n \n"),
        MockSearch::urls(&[]),
        MockFetcher::default(),
        GeneratorConfig::default(),
    );
    let err = gen.run(&request("tides", 3, 0)).await.unwrap_err();
    assert!(matches!(
        err,
        ArticleError::Generation(GenerationError::EmptyResponse)
    ));
}

#[tokio::test]
async fn long_article_spans_several_pages() {
    let paragraph = "Magma rises through cracks in the crust and pools beneath the surface. ".repeat(40);
    let text = vec![paragraph; 5].join("\n\n");
    let gen = ArticleGenerator::new(
        MockText::ok(&text),
        MockSearch::urls(&["http://img/1.jpg", "http://img/2.jpg"]),
        MockFetcher::default(),
        GeneratorConfig::default(),
    );
    let request = ArticleRequest::builder("volcanoes")
        .paragraph_count(5)
        .image_count(2)
        .font_size(16)
        .build()
        .unwrap();
    let out = gen.run(&request).await.expect("run");

    assert!(out.page_count >= 2, "got {} page(s)", out.page_count);
    assert_eq!(out.paragraphs_rendered, 5);
    assert!(contains(
        &out.pdf.bytes,
        format!("/Count {}", out.page_count).as_bytes()
    ));
}

#[tokio::test]
async fn same_inputs_give_same_document() {
    let run = || async {
        let gen = ArticleGenerator::new(
            MockText::ok(THREE_PARAGRAPHS),
            MockSearch::urls(&["http://img/1.jpg"]),
            MockFetcher::default(),
            GeneratorConfig::default(),
        );
        gen.run(&request("glaciers", 3, 1)).await.expect("run")
    };
    let a = run().await;
    let b = run().await;
    assert_eq!(a.theme, b.theme);
    assert_eq!(a.page_count, b.page_count);
    assert_eq!(a.pdf.bytes, b.pdf.bytes);
}

#[tokio::test]
async fn random_theme_keeps_white_text_on_dark_pages() {
    let config = GeneratorConfig::builder()
        .theme(ThemeStrategy::Randomized)
        .build()
        .unwrap();
    let gen = ArticleGenerator::new(
        MockText::ok(THREE_PARAGRAPHS),
        MockSearch::urls(&[]),
        MockFetcher::default(),
        config,
    );
    let out = gen.run(&request("tides", 3, 0)).await.expect("run");
    let Rgb(r, g, b) = out.theme.background;
    assert!(r <= 100 && g <= 100 && b <= 100);
    assert_eq!(out.theme.title_color, Rgb::WHITE);
    assert_eq!(out.theme.body_color, Rgb::WHITE);
}

#[tokio::test]
async fn progress_sees_every_stage_in_order() {
    let recorder = Arc::new(Recorder::default());
    let config = GeneratorConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let gen = ArticleGenerator::new(
        MockText::ok(THREE_PARAGRAPHS),
        MockSearch::urls(&["http://img/1.jpg"]),
        MockFetcher::default(),
        config,
    );
    let out = gen.run(&request("tides", 3, 1)).await.expect("run");

    assert_eq!(
        *recorder.stages.lock().unwrap(),
        vec![
            Stage::GenerateText,
            Stage::SearchImages,
            Stage::Compose,
            Stage::Render
        ]
    );
    assert_eq!(
        *recorder.completed.lock().unwrap(),
        Some((out.page_count, out.pdf.len()))
    );
}

#[tokio::test]
async fn json_summary_carries_counts_but_not_bytes() {
    let gen = ArticleGenerator::new(
        MockText::ok(THREE_PARAGRAPHS),
        MockSearch::urls(&["http://img/1.jpg"]),
        MockFetcher::default(),
        GeneratorConfig::default(),
    );
    let out = gen.run(&request("tides", 3, 1)).await.expect("run");
    let json: serde_json::Value = serde_json::to_value(&out).unwrap();
    assert_eq!(json["page_count"], 1);
    assert_eq!(json["images_rendered"], 1);
    assert_eq!(json["pdf"]["filename"], "generated_article.pdf");
    assert!(json["pdf"].get("bytes").is_none());
}

#[tokio::test]
async fn second_run_is_served_from_the_cache() {
    let text = MockText::ok(THREE_PARAGRAPHS);
    let prompts = text.prompts.clone();
    let search = MockSearch::urls(&["http://img/1.jpg"]);
    let search_calls = search.calls.clone();
    let ttl = Duration::from_secs(900);
    let gen = ArticleGenerator::new(
        CachedTextSource::new(text, ttl),
        CachedImageSearch::new(search, ttl),
        MockFetcher::default(),
        GeneratorConfig::default(),
    );

    let first = gen.run(&request("tides", 3, 1)).await.expect("first run");
    let second = gen.run(&request("tides", 3, 1)).await.expect("second run");

    assert_eq!(prompts.lock().unwrap().len(), 1);
    assert_eq!(search_calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.pdf.bytes, second.pdf.bytes);

    // A different topic misses.
    gen.run(&request("glaciers", 3, 1)).await.expect("third run");
    assert_eq!(prompts.lock().unwrap().len(), 2);
    assert_eq!(search_calls.load(Ordering::SeqCst), 2);
}
