//! Backend that replays a saved extraction dump.
//!
//! The dump is JSON of the form
//! `{"name": ..., "pages": [{"width", "height", "blocks", "images"}]}`,
//! i.e. exactly what an extractor hands over per page.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::backend::{PageHandle, PdfBackend};
use super::tree::{BlockRecord, ImageInfo, TextPage};
use crate::error::{Error, Result};

/// One page of an extraction dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDump {
    pub width: f64,
    pub height: f64,
    pub blocks: Vec<BlockRecord>,
    pub images: Vec<ImageInfo>,
}

impl PageDump {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            blocks: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn with_block(mut self, block: BlockRecord) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_image(mut self, image: ImageInfo) -> Self {
        self.images.push(image);
        self
    }
}

/// A whole-document extraction dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDump {
    pub name: String,
    pub pages: Vec<PageDump>,
}

/// [`PdfBackend`] serving pages from an in-memory [`DocumentDump`].
#[derive(Debug, Clone)]
pub struct TreeBackend {
    name: String,
    pages: Option<Vec<PageDump>>,
}

impl TreeBackend {
    pub fn new(dump: DocumentDump) -> Self {
        Self {
            name: dump.name,
            pages: Some(dump.pages),
        }
    }

    /// Read a JSON dump from disk.
    ///
    /// A missing, unreadable or syntactically broken file is a
    /// [`Error::DocumentOpen`]; JSON that lacks required fields is a
    /// [`Error::Structural`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::open(path, e))?;
        Self::parse(path, &json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::parse(Path::new("<memory>"), json)
    }

    fn parse(origin: &Path, json: &str) -> Result<Self> {
        let dump: DocumentDump = serde_json::from_str(json).map_err(|e| {
            if e.is_data() {
                Error::from(e)
            } else {
                Error::open(origin, e)
            }
        })?;
        Ok(Self::new(dump))
    }

    fn pages(&self) -> Result<&[PageDump]> {
        self.pages.as_deref().ok_or(Error::DocumentClosed)
    }

    fn page(&self, handle: &PageHandle) -> Result<&PageDump> {
        let pages = self.pages()?;
        pages
            .get(handle.index as usize)
            .ok_or(Error::PageOutOfRange(handle.index, pages.len() as u32))
    }
}

impl PdfBackend for TreeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> Result<u32> {
        Ok(self.pages()?.len() as u32)
    }

    fn load_page(&self, index: u32) -> Result<PageHandle> {
        let handle = PageHandle {
            index,
            id: (index, 0),
        };
        self.page(&handle)?;
        Ok(handle)
    }

    fn page_images(&self, page: &PageHandle) -> Result<Vec<ImageInfo>> {
        Ok(self.page(page)?.images.clone())
    }

    fn text_page(&self, page: &PageHandle) -> Result<TextPage> {
        let page = self.page(page)?;
        Ok(TextPage {
            width: page.width,
            height: page.height,
            blocks: page.blocks.clone(),
        })
    }

    fn close(&mut self) {
        self.pages = None;
    }

    fn is_closed(&self) -> bool {
        self.pages.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
        "name": "dump.pdf",
        "pages": [
            {
                "width": 100, "height": 200,
                "blocks": [
                    {"number": 0, "type": 0, "bbox": [0, 0, 10, 10], "lines": [
                        {"bbox": [0, 0, 10, 10], "spans": [{"bbox": [0, 0, 10, 10], "text": "hi"}]}
                    ]}
                ],
                "images": [{"width": 10, "height": 5}]
            }
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let backend = TreeBackend::from_json(DUMP).unwrap();
        assert_eq!(backend.name(), "dump.pdf");
        assert_eq!(backend.page_count().unwrap(), 1);

        let page = backend.load_page(0).unwrap();
        assert_eq!(backend.page_images(&page).unwrap(), vec![ImageInfo::new(10, 5)]);
        let tree = backend.text_page(&page).unwrap();
        assert_eq!(tree.width, 100.0);
        assert_eq!(tree.blocks[0].lines[0].spans[0].text, "hi");
    }

    #[test]
    fn test_missing_image_dimension() {
        let json = r#"{"name": "x", "pages": [
            {"width": 1, "height": 1, "blocks": [], "images": [{"width": 3}]}
        ]}"#;
        let err = TreeBackend::from_json(json).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_broken_json_is_open_error() {
        let err = TreeBackend::from_json("{\"name\": ").unwrap_err();
        assert!(err.is_open_error());
    }

    #[test]
    fn test_page_out_of_range() {
        let backend = TreeBackend::from_json(DUMP).unwrap();
        assert!(matches!(
            backend.load_page(3),
            Err(Error::PageOutOfRange(3, 1))
        ));
    }

    #[test]
    fn test_closed_backend() {
        let mut backend = TreeBackend::from_json(DUMP).unwrap();
        backend.close();
        backend.close();
        assert!(backend.is_closed());
        assert!(matches!(backend.page_count(), Err(Error::DocumentClosed)));
    }

    #[test]
    fn test_missing_file() {
        let err = TreeBackend::from_path("/nonexistent/dump.json").unwrap_err();
        assert!(err.is_open_error());
    }
}
