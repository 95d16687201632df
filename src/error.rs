//! Error types for the document assembly library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the document assembly library
#[derive(Error, Debug)]
pub enum Error {
    /// Source image could not be opened or decoded
    #[error("Cannot decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// PDF parsing or serialization error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Assembler invoked with zero images
    #[error("No images to assemble")]
    EmptyInput,

    /// Bad argument, detected before any I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// External DOCX to PDF conversion failed
    #[error("DOCX conversion failed: {0}")]
    DocxConversion(String),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),
}
