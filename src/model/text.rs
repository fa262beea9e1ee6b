//! Span, line and block types.

use serde::Serialize;

use super::{sum_areas, BoundingBox};
use crate::error::{Error, Result};
use crate::parser::{BlockRecord, LineRecord, SpanRecord, BLOCK_TYPE_IMAGE, BLOCK_TYPE_TEXT};

/// The smallest unit of extracted text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    bbox: BoundingBox,
    text: String,
}

impl Span {
    pub fn new(bbox: BoundingBox, text: impl Into<String>) -> Self {
        Self {
            bbox,
            text: text.into(),
        }
    }

    pub fn from_record(record: &SpanRecord) -> Self {
        Self::new(BoundingBox::from(record.bbox), record.text.clone())
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn area(&self) -> f64 {
        self.bbox.area()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A visual line of text composed of spans.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    bbox: BoundingBox,
    spans: Vec<Span>,
}

impl Line {
    pub fn new(bbox: BoundingBox, spans: Vec<Span>) -> Self {
        Self { bbox, spans }
    }

    pub fn from_record(record: &LineRecord) -> Self {
        Self::new(
            BoundingBox::from(record.bbox),
            record.spans.iter().map(Span::from_record).collect(),
        )
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Area of the line's own bounding box.
    ///
    /// This is not derived from the spans and can differ from
    /// [`Line::span_area`].
    pub fn area(&self) -> f64 {
        self.bbox.area()
    }

    /// Sum of the areas of the line's spans.
    pub fn span_area(&self) -> f64 {
        sum_areas(self.spans.iter().map(Span::area))
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Concatenated span text.
    pub fn text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }
}

/// Block classification as tagged by the extractor.
///
/// Extractors in practice only emit text blocks; image area is always
/// taken from the page's image list, never from this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    Image,
}

impl BlockKind {
    /// The extractor's numeric tag.
    pub fn tag(&self) -> u8 {
        match self {
            BlockKind::Text => BLOCK_TYPE_TEXT,
            BlockKind::Image => BLOCK_TYPE_IMAGE,
        }
    }
}

impl TryFrom<u8> for BlockKind {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            BLOCK_TYPE_TEXT => Ok(BlockKind::Text),
            BLOCK_TYPE_IMAGE => Ok(BlockKind::Image),
            other => Err(Error::Structural(format!("unknown block type {}", other))),
        }
    }
}

/// A structural grouping of lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    number: u32,
    kind: BlockKind,
    bbox: BoundingBox,
    lines: Vec<Line>,
}

impl Block {
    pub fn new(number: u32, kind: BlockKind, bbox: BoundingBox, lines: Vec<Line>) -> Self {
        Self {
            number,
            kind,
            bbox,
            lines,
        }
    }

    pub fn from_record(record: &BlockRecord) -> Result<Self> {
        Ok(Self::new(
            record.number,
            BlockKind::try_from(record.kind)?,
            BoundingBox::from(record.bbox),
            record.lines.iter().map(Line::from_record).collect(),
        ))
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Area of the block's own bounding box.
    pub fn area(&self) -> f64 {
        self.bbox.area()
    }

    /// Sum of the bounding box areas of the block's lines.
    pub fn line_area(&self) -> f64 {
        sum_areas(self.lines.iter().map(Line::area))
    }

    /// Sum of span areas over every line.
    pub fn span_area(&self) -> f64 {
        sum_areas(self.lines.iter().map(Line::span_area))
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
}
