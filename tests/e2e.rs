//! End-to-end integration tests for pdf2pics.
//!
//! These tests render real PDFs through pdfium. They are gated behind the
//! `E2E_ENABLED` environment variable so they do not run in CI unless a
//! pdfium library is available and the run is explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=./libpdfium.so cargo test --test e2e -- --nocapture

use pdf2pics::server::ConvertPdfArgs;
use pdf2pics::{
    BatchConfig, Converter, DocumentError, PageSelection, PdfiumBackend, RasterBackend,
    RasterDocument, ToolServer,
};
use pdfium_render::prelude::*;
use rmcp::handler::server::wrapper::Parameters;
use serde_json::json;
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A4 in points.
const A4: (f32, f32) = (595.0, 842.0);

macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let _ = tracing_subscriber::fmt()
            .with_env_filter("pdf2pics=debug")
            .with_test_writer()
            .try_init();
    }};
}

fn pdfium_lib() -> Option<PathBuf> {
    std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from)
}

fn bind() -> Pdfium {
    let bindings = match pdfium_lib() {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .expect("pdfium library");
    Pdfium::new(bindings)
}

/// Write a blank A4 PDF with `pages` pages.
fn make_pdf(path: &Path, pages: usize) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let pdfium = bind();
    let mut doc = pdfium.create_new_pdf().unwrap();
    for _ in 0..pages {
        doc.pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .unwrap();
    }
    doc.save_to_file(path).unwrap();
}

fn config(root: &Path, zoom: f32) -> BatchConfig {
    let mut builder = BatchConfig::builder()
        .pdf_root(root.join("pdfs"))
        .output_root(root.join("out"))
        .zoom(zoom);
    if let Some(lib) = pdfium_lib() {
        builder = builder.pdfium_lib_path(lib);
    }
    builder.build().unwrap()
}

fn assert_close(actual: u32, expected: f32, context: &str) {
    assert!(
        (actual as f32 - expected).abs() <= 1.0,
        "[{context}] expected ≈{expected}, got {actual}"
    );
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn renders_each_page_at_zoom() {
    e2e_skip_unless_enabled!();
    let tmp = tempfile::tempdir().unwrap();
    make_pdf(&tmp.path().join("pdfs/a/b/c.pdf"), 3);

    let converter = Converter::new(config(tmp.path(), 1.0)).unwrap();
    let mapping = converter.convert_directory("a", false).await.unwrap();
    assert_eq!(
        mapping["a/b/c.pdf"],
        vec!["a/b/c-1.png", "a/b/c-2.png", "a/b/c-3.png"]
    );

    for rel in &mapping["a/b/c.pdf"] {
        let img = image::open(tmp.path().join("out").join(rel)).unwrap();
        assert_close(img.width(), A4.0, rel);
        assert_close(img.height(), A4.1, rel);
    }
}

#[test]
fn pdfium_backend_lends_an_open_document() {
    e2e_skip_unless_enabled!();
    let tmp = tempfile::tempdir().unwrap();
    let pdf = tmp.path().join("three.pdf");
    make_pdf(&pdf, 3);

    let backend = PdfiumBackend::new(pdfium_lib()).unwrap();
    let (count, size, image) = backend
        .with_document(&pdf, |doc| {
            let size = doc.page_size(2).unwrap();
            let image = doc.render_page(0, 0.5).unwrap();
            Ok((doc.page_count(), size, image))
        })
        .unwrap();
    assert_eq!(count, 3);
    assert!((size.0 - A4.0).abs() < 1.0 && (size.1 - A4.1).abs() < 1.0, "{size:?}");
    assert_close(image.width(), A4.0 * 0.5, "page 1");

    // the same backend opens the next document after the first was released
    let err = backend
        .with_document(&tmp.path().join("missing.pdf"), |doc| Ok(doc.page_count()))
        .unwrap_err();
    assert!(matches!(err, DocumentError::Open { .. }), "got {err}");
    assert_eq!(backend.with_document(&pdf, |doc| Ok(doc.page_count())).unwrap(), 3);
}

#[tokio::test]
async fn default_zoom_is_four() {
    e2e_skip_unless_enabled!();
    let tmp = tempfile::tempdir().unwrap();
    make_pdf(&tmp.path().join("pdfs/one.pdf"), 1);

    let mut cfg = config(tmp.path(), 4.0);
    cfg.pages = PageSelection::Single(1);
    let converter = Converter::new(cfg).unwrap();
    let mapping = converter.convert_single("one.pdf", false).await.unwrap();

    let img = image::open(tmp.path().join("out").join(&mapping["one.pdf"][0])).unwrap();
    assert_close(img.width(), A4.0 * 4.0, "one.pdf");
    assert_close(img.height(), A4.1 * 4.0, "one.pdf");
}

#[tokio::test]
async fn repeated_conversion_is_byte_identical() {
    e2e_skip_unless_enabled!();
    let tmp = tempfile::tempdir().unwrap();
    make_pdf(&tmp.path().join("pdfs/doc.pdf"), 1);

    let converter = Converter::new(config(tmp.path(), 0.5)).unwrap();
    converter.convert_single("doc.pdf", false).await.unwrap();
    let first = std::fs::read(tmp.path().join("out/doc-1.png")).unwrap();
    converter.convert_single("doc.pdf", false).await.unwrap();
    let second = std::fs::read(tmp.path().join("out/doc-1.png")).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn corrupt_pdf_is_skipped_by_real_backend() {
    e2e_skip_unless_enabled!();
    let tmp = tempfile::tempdir().unwrap();
    make_pdf(&tmp.path().join("pdfs/ok1.pdf"), 1);
    make_pdf(&tmp.path().join("pdfs/ok2.pdf"), 1);
    make_pdf(&tmp.path().join("pdfs/ok3.pdf"), 2);
    std::fs::write(tmp.path().join("pdfs/broken.pdf"), b"%PDF-1.7 truncated").unwrap();

    let converter = Converter::new(config(tmp.path(), 0.25)).unwrap();
    let report = converter.convert_directory_report("", false).await.unwrap();
    assert_eq!(report.total(), 4);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.into_mapping().len(), 3);
}

#[test]
fn tool_server_over_real_backend() {
    e2e_skip_unless_enabled!();
    let tmp = tempfile::tempdir().unwrap();
    make_pdf(&tmp.path().join("pdfs/x/y.pdf"), 2);

    let backend = PdfiumBackend::new(pdfium_lib()).unwrap();
    let server = ToolServer::new(Converter::with_parts(
        config(tmp.path(), 0.5),
        std::sync::Arc::new(backend),
        pdf2pics::HttpStore::new(),
    ));

    let result = tokio_test::block_on(server.convert_pdf(Parameters(ConvertPdfArgs {
        pdf_name: "x/y.pdf".into(),
        return_pic_url: false,
    })))
    .unwrap();

    assert_eq!(
        serde_json::to_value(&result).unwrap()["structuredContent"],
        json!({ "x/y.pdf": ["x/y-1.png", "x/y-2.png"] })
    );
}
