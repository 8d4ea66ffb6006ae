//! Error types for the recognition pipeline and upload service

use thiserror::Error;

/// Failures surfaced by decoding, OCR and upload handling.
///
/// A plate that cannot be located is not an error; see
/// [`crate::vision::Recognition::NotFound`].
#[derive(Debug, Error)]
pub enum PlateError {
    /// Upload rejected by the extension allow-list before any processing
    #[error("File type not allowed: {0}")]
    UnsupportedFileType(String),

    /// Multipart body had no `file` part or the part had no filename
    #[error("No file uploaded")]
    MissingFile,

    /// Multipart body could not be read
    #[error("Malformed upload: {0}")]
    Multipart(String),

    /// Bytes could not be decoded as an image
    #[error("Could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// OCR engine failed to run or returned an error status
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// Filesystem failure while storing or reading an upload
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking recognition task panicked or was cancelled
    #[error("Recognition worker failed: {0}")]
    Worker(String),
}
