//! Error types for pdfratio.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdfratio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while analyzing a document.
#[derive(Error, Debug)]
pub enum Error {
    /// The file is missing, unreadable, or not a document the parser accepts.
    #[error("Cannot open document {}: {reason}", path.display())]
    DocumentOpen {
        /// Path that was being opened
        path: PathBuf,
        /// Why opening failed
        reason: String,
    },

    /// A page's structural tree or image list is missing an expected field.
    #[error("Malformed page structure: {0}")]
    Structural(String),

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The underlying document handle has already been released.
    #[error("Document is closed")]
    DocumentClosed,

    /// Error while rendering a report.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Error in the background job queue.
    #[error("Job error: {0}")]
    Job(String),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Build a [`Error::DocumentOpen`] for `path`.
    pub fn open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::DocumentOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means the document could not be opened at all.
    pub fn is_open_error(&self) -> bool {
        matches!(self, Error::DocumentOpen { .. })
    }

    /// Whether this error came from a malformed page structure.
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Structural(_))
    }
}

impl From<lopdf::Error> for Error {
    // Load failures are mapped to `DocumentOpen` at the call site; anything
    // lopdf reports afterwards concerns page structure.
    fn from(err: lopdf::Error) -> Self {
        Error::Structural(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Structural(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DocumentClosed;
        assert_eq!(err.to_string(), "Document is closed");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );

        let err = Error::open("missing.pdf", "file not found");
        assert_eq!(
            err.to_string(),
            "Cannot open document missing.pdf: file not found"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert!(Error::open("a.pdf", "nope").is_open_error());
        assert!(!Error::open("a.pdf", "nope").is_structural());
        assert!(Error::Structural("no bbox".into()).is_structural());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_is_structural() {
        let err = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err: Error = err.into();
        assert!(err.is_structural());
    }
}
