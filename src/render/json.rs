//! JSON rendering of area summaries.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Document, Page, ReportColor};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Per-page figures as they appear in the JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    pub number: u32,
    pub width: f64,
    pub height: f64,
    pub blocks: usize,
    pub images: usize,
    pub text_area: f64,
    pub image_area: f64,
    pub block_area: f64,
    pub line_area: f64,
    pub ratio: f64,
    pub label: String,
    pub color: ReportColor,
}

impl From<&Page> for PageSummary {
    fn from(page: &Page) -> Self {
        let classification = page.classification();
        Self {
            number: page.number(),
            width: page.width(),
            height: page.height(),
            blocks: page.blocks().len(),
            images: page.images().len(),
            text_area: page.text_area(),
            image_area: page.image_area(),
            block_area: page.block_area(),
            line_area: page.line_area(),
            ratio: page.ratio(),
            label: classification.label,
            color: classification.color,
        }
    }
}

/// Document totals plus every page summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSummary {
    pub name: String,
    pub page_count: u32,
    pub text_area: f64,
    pub image_area: f64,
    pub ratio: f64,
    pub label: String,
    pub color: ReportColor,
    pub pages: Vec<PageSummary>,
}

impl From<&Document> for AreaSummary {
    fn from(doc: &Document) -> Self {
        let classification = doc.classification();
        Self {
            name: doc.name().to_string(),
            page_count: doc.page_count(),
            text_area: doc.text_area(),
            image_area: doc.image_area(),
            ratio: doc.ratio(),
            label: classification.label,
            color: classification.color,
            pages: doc.pages().iter().map(PageSummary::from).collect(),
        }
    }
}

/// Convert a document's area summary to JSON.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let summary = AreaSummary::from(doc);
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&summary),
        JsonFormat::Compact => serde_json::to_string(&summary),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
