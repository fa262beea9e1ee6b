//! Analysis model for PDF documents.
//!
//! Document → Page → Block → Line → Span, each entity carrying the
//! areas and ratios the reports are built from.

mod document;
mod geometry;
mod page;
mod ratio;
mod text;

pub use document::Document;
pub use geometry::BoundingBox;
pub(crate) use geometry::sum_areas;
pub use page::Page;
pub use ratio::{
    AreaRatio, Classification, ReportColor, GREEN_ABOVE, RATIO_EMPTY, RATIO_NO_IMAGES,
    RATIO_NO_TEXT, RED_BELOW,
};
pub use text::{Block, BlockKind, Line, Span};
