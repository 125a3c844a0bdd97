//! Error types for pdftrans.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for pdftrans operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while translating a document.
///
/// The first group aborts the current document. The second group is
/// recovered inside the component that raised it and only ever reaches the
/// caller as a [`crate::report::Warning`].
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The CJK font asset is missing or unusable.
    #[error("Font asset error: {0}")]
    FontAsset(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The output document could not be written.
    #[error("Failed to write output: {0}")]
    Write(String),

    /// Processing was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// A page's content could not be read.
    #[error("Extraction error on page {page}: {message}")]
    Extraction { page: u32, message: String },

    /// An embedded image could not be decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// The translation engine failed.
    #[error("Translation error: {0}")]
    Translation(String),

    /// The translation engine did not answer in time.
    #[error("Translation timed out after {0:?}")]
    Timeout(Duration),

    /// A block could not be mapped onto the output document.
    #[error("Composition error: {0}")]
    Compose(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error aborts the whole document rather than a page or block.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Extraction { .. }
                | Error::Image(_)
                | Error::Translation(_)
                | Error::Timeout(_)
                | Error::Compose(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}
