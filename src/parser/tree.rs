//! Structural tree records as supplied by an extraction backend.
//!
//! These mirror the dictionary output of a PDF text extractor: a page
//! holds blocks, blocks hold lines, lines hold spans, and every level
//! carries a `[x0, y0, x1, y1]` bounding box. Images are listed
//! separately with their pixel dimensions.

use serde::{Deserialize, Serialize};

/// Block type tag for text blocks.
pub const BLOCK_TYPE_TEXT: u8 = 0;
/// Block type tag for image blocks.
pub const BLOCK_TYPE_IMAGE: u8 = 1;

/// The structural tree of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPage {
    /// Page width in points
    pub width: f64,
    /// Page height in points
    pub height: f64,
    /// Blocks in extractor order
    pub blocks: Vec<BlockRecord>,
}

/// A block of lines (or, nominally, an image).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Sequential block number
    pub number: u32,
    /// 0 = text, 1 = image
    #[serde(rename = "type")]
    pub kind: u8,
    pub bbox: [f64; 4],
    /// Image blocks carry no lines.
    #[serde(default)]
    pub lines: Vec<LineRecord>,
}

/// A visual line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub bbox: [f64; 4],
    pub spans: Vec<SpanRecord>,
}

/// The smallest unit of extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanRecord {
    pub bbox: [f64; 4],
    pub text: String,
}

/// An image embedded in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel area (width × height).
    pub fn area(&self) -> f64 {
        f64::from(self.width) * f64::from(self.height)
    }
}

impl TextPage {
    /// An empty page of the given size.
    pub fn empty(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            blocks: Vec::new(),
        }
    }
}
