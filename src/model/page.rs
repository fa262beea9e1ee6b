//! Page-level types.

use serde::Serialize;

use super::{sum_areas, AreaRatio, Block, Classification};
use crate::error::Result;
use crate::parser::{ImageInfo, PdfBackend, TextPage};
use crate::render;

/// A single analyzed page.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Page index (0-based)
    index: u32,

    /// Page width in points
    width: f64,

    /// Page height in points
    height: f64,

    /// Blocks in extractor order
    blocks: Vec<Block>,

    /// Raster images embedded in the page
    images: Vec<ImageInfo>,

    text_area: f64,
    image_area: f64,
    #[serde(skip)]
    ratio: AreaRatio,
}

impl Page {
    /// Pull the page at `index` from a backend and analyze it.
    pub fn build(backend: &dyn PdfBackend, index: u32) -> Result<Self> {
        let handle = backend.load_page(index)?;
        let images = backend.page_images(&handle)?;
        let tree = backend.text_page(&handle)?;
        Self::from_parts(index, tree, images)
    }

    /// Analyze an already extracted page tree and image list.
    pub fn from_parts(index: u32, tree: TextPage, images: Vec<ImageInfo>) -> Result<Self> {
        let blocks = tree
            .blocks
            .iter()
            .map(Block::from_record)
            .collect::<Result<Vec<_>>>()?;

        let text_area = sum_areas(blocks.iter().map(Block::span_area));
        let image_area = sum_areas(images.iter().map(ImageInfo::area));
        let ratio = AreaRatio::compute(text_area, image_area);

        log::debug!(
            "Page {}: {} blocks, {} images, text area {:.2}, image area {:.2}",
            index + 1,
            blocks.len(),
            images.len(),
            text_area,
            image_area
        );

        Ok(Self {
            index,
            width: tree.width,
            height: tree.height,
            blocks,
            images,
            text_area,
            image_area,
            ratio,
        })
    }

    /// Page index (0-based).
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Page number for display (1-based).
    pub fn number(&self) -> u32 {
        self.index + 1
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Page area (width × height).
    pub fn page_area(&self) -> f64 {
        self.width * self.height
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn images(&self) -> &[ImageInfo] {
        &self.images
    }

    /// Sum of span areas over every line of every block.
    pub fn text_area(&self) -> f64 {
        self.text_area
    }

    /// Sum of width × height over every image.
    pub fn image_area(&self) -> f64 {
        self.image_area
    }

    /// Sum of block bounding box areas.
    pub fn block_area(&self) -> f64 {
        sum_areas(self.blocks.iter().map(Block::area))
    }

    /// Sum of line bounding box areas.
    pub fn line_area(&self) -> f64 {
        sum_areas(self.blocks.iter().map(Block::line_area))
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

    /// HTML report fragment for this page.
    pub fn render_report(&self) -> String {
        render::page_fragment(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReportColor;
    use crate::parser::{BlockRecord, LineRecord, SpanRecord};

    fn span(bbox: [f64; 4]) -> SpanRecord {
        SpanRecord {
            bbox,
            text: "x".to_string(),
        }
    }

    fn block(number: u32, lines: Vec<LineRecord>) -> BlockRecord {
        BlockRecord {
            number,
            kind: 0,
            bbox: [0.0, 0.0, 100.0, 100.0],
            lines,
        }
    }

    fn line(spans: Vec<SpanRecord>) -> LineRecord {
        LineRecord {
            bbox: [0.0, 0.0, 100.0, 10.0],
            spans,
        }
    }

    fn tree(blocks: Vec<BlockRecord>) -> TextPage {
        TextPage {
            width: 612.0,
            height: 792.0,
            blocks,
        }
    }

    #[test]
    fn test_text_area_visits_every_span() {
        let page = Page::from_parts(
            0,
            tree(vec![
                block(
                    0,
                    vec![
                        line(vec![span([0.0, 0.0, 10.0, 10.0]), span([0.0, 0.0, 2.0, 5.0])]),
                        line(vec![span([0.0, 0.0, 1.0, 1.0])]),
                    ],
                ),
                block(1, vec![line(vec![span([5.0, 5.0, 7.0, 8.0])])]),
            ]),
            vec![],
        )
        .unwrap();
        assert_eq!(page.text_area(), 100.0 + 10.0 + 1.0 + 6.0);
        assert_eq!(page.block_area(), 20000.0);
        assert_eq!(page.line_area(), 3000.0);
    }

    #[test]
    fn test_image_area_sums_every_image() {
        let page = Page::from_parts(
            2,
            tree(vec![]),
            vec![ImageInfo::new(10, 5), ImageInfo::new(3, 3), ImageInfo::new(0, 9)],
        )
        .unwrap();
        assert_eq!(page.image_area(), 59.0);
        assert_eq!(page.ratio(), -1.0);
        assert_eq!(page.classification().color, ReportColor::Red);
    }

    #[test]
    fn test_empty_page_areas_are_positive_zero() {
        let page = Page::from_parts(0, tree(vec![]), vec![]).unwrap();
        assert!(page.text_area().is_sign_positive());
        assert!(page.image_area().is_sign_positive());
        assert!(page.block_area().is_sign_positive());
        assert!(page.line_area().is_sign_positive());
        assert!(!page.render_report().contains("-0.00"));
    }

    #[test]
    fn test_page_numbering() {
        let page = Page::from_parts(4, tree(vec![]), vec![]).unwrap();
        assert_eq!(page.index(), 4);
        assert_eq!(page.number(), 5);
        assert_eq!(page.page_area(), 612.0 * 792.0);
    }

    #[test]
    fn test_text_and_image_ratio() {
        let page = Page::from_parts(
            0,
            tree(vec![block(0, vec![line(vec![span([0.0, 0.0, 10.0, 10.0])])])]),
            vec![ImageInfo::new(10, 5)],
        )
        .unwrap();
        assert_eq!(page.text_area(), 100.0);
        assert_eq!(page.image_area(), 50.0);
        assert_eq!(page.ratio(), 2.0);
        assert_eq!(page.classification().color, ReportColor::Green);
    }

    #[test]
    fn test_image_blocks_do_not_count_as_images() {
        let mut image_block = block(0, vec![]);
        image_block.kind = 1;
        let page = Page::from_parts(0, tree(vec![image_block]), vec![]).unwrap();
        assert_eq!(page.image_area(), 0.0);
        assert_eq!(page.ratio(), -2.0);
    }

    #[test]
    fn test_malformed_block_aborts_page() {
        let mut bad = block(0, vec![]);
        bad.kind = 5;
        let err = Page::from_parts(0, tree(vec![bad]), vec![]).unwrap_err();
        assert!(err.is_structural());
    }
}
