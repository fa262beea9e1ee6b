//! Extraction backends and the structural tree they produce.

mod backend;
mod layout;
mod tree;
mod tree_backend;

pub use backend::{LopdfBackend, PageHandle, PageId, PdfBackend};
pub use layout::{
    build_text_page, collect_text_runs, collect_text_runs_with_forms, Form, FormSource, NoForms,
    PageFrame, TextRun, MAX_FORM_DEPTH,
};
pub use tree::{
    BlockRecord, ImageInfo, LineRecord, SpanRecord, TextPage, BLOCK_TYPE_IMAGE, BLOCK_TYPE_TEXT,
};
pub use tree_backend::{DocumentDump, PageDump, TreeBackend};
