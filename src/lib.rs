//! # pdfratio
//!
//! Text-to-image area analysis for PDF documents.
//!
//! Every page is read as a block → line → span tree with bounding boxes
//! plus a list of embedded raster images. The library sums the text-span
//! area and the image area per page and per document, derives a
//! text-to-image ratio and classifies it, and renders the result as an
//! HTML report or a JSON summary.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> pdfratio::Result<()> {
//!     let report = pdfratio::analyze("document.pdf")?;
//!     std::fs::write("report.html", report)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Ratio policy
//!
//! | text area | image area | ratio              |
//! |-----------|------------|--------------------|
//! | 0         | 0          | −2                 |
//! | 0         | > 0        | −1                 |
//! | > 0       | 0          | 0                  |
//! | > 0       | > 0        | text / image       |
//!
//! Ratios below 0.7 are red, above 1.3 green, anything in between orange.

pub mod detect;
pub mod error;
pub mod job;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use detect::{detect_format_from_bytes, detect_format_from_path, PdfFormat};
pub use error::{Error, Result};
pub use job::{JobId, JobQueue, JobStatus, QueueOptions};
pub use model::{
    AreaRatio, Block, BlockKind, BoundingBox, Classification, Document, Line, Page, ReportColor,
    Span,
};
pub use parser::{LopdfBackend, PdfBackend, TreeBackend};
pub use render::{AreaSummary, JsonFormat};

use std::path::Path;

/// Analyze a PDF file and return the full HTML report.
///
/// The report is the document fragment followed by every page fragment in
/// page order. The document is closed before returning.
///
/// # Example
///
/// ```no_run
/// let report = pdfratio::analyze("document.pdf").unwrap();
/// println!("{}", report);
/// ```
pub fn analyze<P: AsRef<Path>>(path: P) -> Result<String> {
    analyze_with_progress(path, |_, _| {})
}

/// Like [`analyze`], reporting `(pages_built, page_count)` after each page.
pub fn analyze_with_progress<P, F>(path: P, progress: F) -> Result<String>
where
    P: AsRef<Path>,
    F: FnMut(u32, u32),
{
    let doc = Document::open_with_progress(path, progress)?;
    Ok(finish(doc))
}

/// Analyze a PDF held in memory.
pub fn analyze_bytes(name: &str, data: &[u8]) -> Result<String> {
    let backend = LopdfBackend::from_bytes(name, data)?;
    analyze_backend(Box::new(backend))
}

/// Analyze whatever document a backend serves.
///
/// # Example
///
/// ```no_run
/// use pdfratio::TreeBackend;
///
/// let backend = TreeBackend::from_path("extracted.json")?;
/// let report = pdfratio::analyze_backend(Box::new(backend))?;
/// # Ok::<(), pdfratio::Error>(())
/// ```
pub fn analyze_backend(backend: Box<dyn PdfBackend>) -> Result<String> {
    let doc = Document::from_backend(backend)?;
    Ok(finish(doc))
}

/// Analyze a PDF file and return its area summary as JSON.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let mut doc = Document::open(path)?;
    let json = render::to_json(&doc, format);
    doc.close();
    json
}

/// Run [`analyze`] on tokio's blocking pool.
#[cfg(feature = "async")]
pub async fn analyze_async<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || analyze(path))
        .await
        .map_err(|e| Error::Job(format!("analysis task failed: {}", e)))?
}

fn finish(mut doc: Document) -> String {
    let report = doc.render_full_report();
    doc.close();
    log::info!(
        "Analyzed {}: {} pages, ratio {:.2}",
        doc.name(),
        doc.page_count(),
        doc.ratio()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DocumentDump, ImageInfo, PageDump};

    fn dump(pages: Vec<PageDump>) -> Box<dyn PdfBackend> {
        Box::new(TreeBackend::new(DocumentDump {
            name: "dump.pdf".to_string(),
            pages,
        }))
    }

    #[test]
    fn test_analyze_backend_concatenates_fragments() {
        let report = analyze_backend(dump(vec![
            PageDump::new(10.0, 10.0).with_image(ImageInfo::new(2, 2)),
            PageDump::new(10.0, 10.0),
        ]))
        .unwrap();

        assert!(report.starts_with("<section class=\"document\">"));
        assert_eq!(report.matches("<section class=\"page\">").count(), 2);
        assert!(report.find("Page 1").unwrap() < report.find("Page 2").unwrap());
        assert!(report.contains("images only, no text"));
        assert!(report.contains("no text or images"));
    }

    #[test]
    fn test_analyze_missing_file() {
        let err = analyze("/nonexistent/file.pdf").unwrap_err();
        assert!(err.is_open_error());
    }

    #[test]
    fn test_analyze_bytes_rejects_garbage() {
        let err = analyze_bytes("junk.pdf", b"not a pdf at all").unwrap_err();
        assert!(err.is_open_error());
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_analyze_async_missing_file() {
        let err = analyze_async("/nonexistent/file.pdf").await.unwrap_err();
        assert!(err.is_open_error());
    }
}
