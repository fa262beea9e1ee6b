//! Document-level types.

use std::fmt;
use std::path::Path;

use super::{sum_areas, AreaRatio, Classification, Page};
use crate::error::Result;
use crate::parser::{LopdfBackend, PdfBackend};
use crate::render;

/// An analyzed PDF document.
///
/// The document owns the backend it was built from until [`Document::close`]
/// is called or the document is dropped, whichever comes first.
pub struct Document {
    name: String,
    pages: Vec<Page>,
    text_area: f64,
    image_area: f64,
    ratio: AreaRatio,
    backend: Option<Box<dyn PdfBackend>>,
}

impl Document {
    /// Open and analyze a PDF file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pdfratio::Document;
    ///
    /// let mut doc = Document::open("document.pdf")?;
    /// println!("{} pages, ratio {}", doc.page_count(), doc.ratio());
    /// doc.close();
    /// # Ok::<(), pdfratio::Error>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_progress(path, |_, _| {})
    }

    /// Open and analyze a PDF file, reporting `(pages_built, page_count)`
    /// after each page.
    pub fn open_with_progress<P, F>(path: P, progress: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: FnMut(u32, u32),
    {
        let backend = LopdfBackend::open(path)?;
        Self::from_backend_with_progress(Box::new(backend), progress)
    }

    /// Analyze every page a backend serves.
    pub fn from_backend(backend: Box<dyn PdfBackend>) -> Result<Self> {
        Self::from_backend_with_progress(backend, |_, _| {})
    }

    /// Analyze every page a backend serves, with a progress callback.
    ///
    /// If any page fails, the backend is closed and the error returned;
    /// no partial document is produced.
    pub fn from_backend_with_progress<F>(
        mut backend: Box<dyn PdfBackend>,
        mut progress: F,
    ) -> Result<Self>
    where
        F: FnMut(u32, u32),
    {
        let pages = match build_pages(backend.as_ref(), &mut progress) {
            Ok(pages) => pages,
            Err(e) => {
                log::warn!("Analysis of {} failed: {}", backend.name(), e);
                backend.close();
                return Err(e);
            }
        };

        let text_area = sum_areas(pages.iter().map(Page::text_area));
        let image_area = sum_areas(pages.iter().map(Page::image_area));

        Ok(Self {
            name: backend.name().to_string(),
            pages,
            text_area,
            image_area,
            ratio: AreaRatio::compute(text_area, image_area),
            backend: Some(backend),
        })
    }

    /// Document name (the path it was opened from).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Get a page by 0-based index.
    pub fn page(&self, index: u32) -> Option<&Page> {
        self.pages.get(index as usize)
    }

    /// Sum of page text areas.
    pub fn text_area(&self) -> f64 {
        self.text_area
    }

    /// Sum of page image areas.
    pub fn image_area(&self) -> f64 {
        self.image_area
    }

    pub fn area_ratio(&self) -> AreaRatio {
        self.ratio
    }

    /// Numeric ratio: −2 (empty), −1 (no text), 0 (no images) or text / image.
    pub fn ratio(&self) -> f64 {
        self.ratio.value()
    }

    pub fn classification(&self) -> Classification {
        self.ratio.classify()
    }

    /// HTML report fragment for the document as a whole.
    pub fn render_report(&self) -> String {
        render::document_fragment(self)
    }

    /// Document fragment followed by every page fragment, in page order.
    pub fn render_full_report(&self) -> String {
        let mut report = self.render_report();
        for page in &self.pages {
            report.push_str(&page.render_report());
        }
        report
    }

    /// Release the underlying document handle. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.backend.is_none()
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        if !self.is_closed() {
            log::warn!("{} was not closed, closing on drop", self.name);
            self.close();
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("pages", &self.pages.len())
            .field("text_area", &self.text_area)
            .field("image_area", &self.image_area)
            .field("ratio", &self.ratio)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn build_pages<F>(backend: &dyn PdfBackend, progress: &mut F) -> Result<Vec<Page>>
where
    F: FnMut(u32, u32),
{
    let count = backend.page_count()?;
    let mut pages = Vec::with_capacity(count as usize);
    for index in 0..count {
        pages.push(Page::build(backend, index)?);
        progress(index + 1, count);
    }
    Ok(pages)
}
