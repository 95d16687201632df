//! PDF assembly and inspection

pub mod append;
pub mod assemble;
pub mod metadata;

// Re-export commonly used items
pub use append::PdfAppender;
pub use assemble::{assemble_images, CONVERT_RESOLUTION, EXTEND_RESOLUTION};
pub use metadata::{count_pages, extract_metadata, PdfMetadata};
