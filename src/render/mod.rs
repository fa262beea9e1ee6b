//! Rendering of analysis results as HTML reports and JSON summaries.

mod html;
mod json;

pub use html::{document_fragment, page_fragment, standalone};
pub use json::{to_json, AreaSummary, JsonFormat, PageSummary};
