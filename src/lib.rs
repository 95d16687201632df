//! Document assembly library
//!
//! Converts batches of raster images into PDF documents and extends an
//! existing PDF/DOCX document with pages built from image and PDF
//! attachments. This library provides functionality to:
//! - Normalize images to 8-bit RGB (flattening transparency onto white)
//! - Serialize image sequences as multi-page PDFs
//! - Convert image batches to one combined PDF or one PDF per image,
//!   driving a collision-resolution protocol for existing output files
//! - Append image and PDF attachments to a base document, in order
//! - Allocate collision-free output paths
//!
//! # Example
//!
//! ```no_run
//! use pdf_appendix::convert::{convert_images, ConvertOptions};
//! use pdf_appendix::protocol::{AutoRename, NoopObserver};
//! use std::path::PathBuf;
//!
//! let images = vec![
//!     PathBuf::from("scan-01.png"),
//!     PathBuf::from("scan-02.png"),
//! ];
//!
//! let options = ConvertOptions::new("out");
//! let mut resolver = AutoRename;
//! let tally = convert_images(&images, &options, &mut resolver, &NoopObserver);
//! println!("converted {} / skipped {}", tally.converted, tally.skipped);
//! ```

pub mod convert;
pub mod docx;
pub mod error;
pub mod extend;
pub mod paths;
pub mod pdf;
pub mod protocol;
pub mod raster;

// Re-export commonly used items
pub use error::{Error, Result};
