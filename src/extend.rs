//! Extending a base document with image and PDF attachments
//!
//! Unlike the converter, extension is all-or-nothing: the first failure
//! aborts the whole call and nothing is written, because the output document
//! only hits disk in the final save.

use std::collections::hash_map::DefaultHasher;
use std::ffi::OsStr;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::{debug, info};

use crate::docx::DocxConverter;
use crate::error::{Error, Result};
use crate::paths;
use crate::pdf::{self, PdfAppender};
use crate::raster;

/// Kind of base document being extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Pdf,
    Docx,
}

/// One ordered input to the extender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// A raster image; becomes one output page.
    Image(PathBuf),
    /// An existing PDF; contributes all of its pages.
    Pdf(PathBuf),
}

impl Attachment {
    /// Classify a path by extension: `.pdf` (any case) is a PDF, everything
    /// else is treated as an image.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            Attachment::Pdf(path)
        } else {
            Attachment::Image(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Attachment::Image(path) | Attachment::Pdf(path) => path,
        }
    }
}

/// Settings for one extend operation.
#[derive(Debug, Clone)]
pub struct ExtendOptions {
    /// Directory the output file lands in; created if absent.
    pub output_dir: PathBuf,
    /// Desired output file name; diverted to a unique sibling on collision.
    pub output_filename: String,
    /// Directory for intermediate PDFs; created if absent. Callers that
    /// want automatic cleanup pass a scoped temp directory.
    pub temp_dir: PathBuf,
    /// Move the base file aside to `{stem}_original{suffix}` before
    /// anything is written.
    pub rename_base_to_original: bool,
    /// Resolution for image attachments, pixels per inch.
    pub resolution: f32,
}

impl ExtendOptions {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        output_filename: impl Into<String>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            output_filename: output_filename.into(),
            temp_dir: temp_dir.into(),
            rename_base_to_original: true,
            resolution: pdf::EXTEND_RESOLUTION,
        }
    }
}

/// Outcome of a successful extend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendResult {
    /// Where the combined document was written.
    pub output_path: PathBuf,
    /// Where the base file moved, when renaming was requested.
    pub renamed_base: Option<PathBuf>,
    /// Pages contributed by the attachments; the base's own pages are not
    /// counted.
    pub pages_appended: usize,
}

/// Append `attachments` to the document at `base_path` and write the result
/// as one PDF.
///
/// Attachment order is preserved exactly: runs of consecutive images are
/// batched into one intermediate PDF per run, then interleaved with the PDF
/// attachments' pages. The output path is allocated from
/// `output_dir/output_filename` before any base rename, so extending a file
/// in place without renaming yields a `_1` sibling rather than clobbering
/// the base.
pub fn extend_document(
    base_path: &Path,
    base_type: BaseType,
    attachments: &[Attachment],
    options: &ExtendOptions,
    docx_converter: &dyn DocxConverter,
) -> Result<ExtendResult> {
    if attachments.is_empty() {
        return Err(Error::InvalidArgument(
            "no attachments provided".to_string(),
        ));
    }
    if !base_path.exists() {
        return Err(Error::FileNotFound(base_path.to_path_buf()));
    }

    fs::create_dir_all(&options.output_dir)?;
    let output_path = paths::allocate_unique(&options.output_dir.join(&options.output_filename));

    let (base_path, renamed_base) = if options.rename_base_to_original {
        let aside = paths::original_sibling(base_path);
        fs::rename(base_path, &aside)?;
        debug!(renamed = %aside.display(), "moved base aside");
        (aside.clone(), Some(aside))
    } else {
        (base_path.to_path_buf(), None)
    };

    let base_pdf = match base_type {
        BaseType::Pdf => base_path.clone(),
        BaseType::Docx => {
            fs::create_dir_all(&options.temp_dir)?;
            let mut file_name = base_path
                .file_stem()
                .unwrap_or_else(|| OsStr::new("base"))
                .to_os_string();
            file_name.push(".pdf");
            let converted = options.temp_dir.join(&file_name);
            docx_converter.convert(&base_path, &converted)?;
            converted
        }
    };

    let mut writer = PdfAppender::new();
    writer.append_file(&base_pdf)?;
    let base_pages = writer.page_count();

    fs::create_dir_all(&options.temp_dir)?;

    let mut buffered_images: Vec<PathBuf> = Vec::new();
    for attachment in attachments {
        match attachment {
            Attachment::Image(path) => buffered_images.push(path.clone()),
            Attachment::Pdf(path) => {
                flush_buffered_images(&mut writer, &mut buffered_images, options)?;
                writer.append_file(path)?;
            }
        }
    }
    flush_buffered_images(&mut writer, &mut buffered_images, options)?;

    let pages_appended = writer.page_count() - base_pages;
    writer.save(&output_path)?;

    info!(
        output = %output_path.display(),
        pages_appended,
        "document extended"
    );

    Ok(ExtendResult {
        output_path,
        renamed_base,
        pages_appended,
    })
}

/// Assemble a pending run of images into one intermediate PDF under the
/// temp directory and append its pages, then clear the buffer.
fn flush_buffered_images(
    writer: &mut PdfAppender,
    buffered: &mut Vec<PathBuf>,
    options: &ExtendOptions,
) -> Result<()> {
    if buffered.is_empty() {
        return Ok(());
    }

    let mut normalized: Vec<RgbImage> = Vec::with_capacity(buffered.len());
    for path in buffered.iter() {
        normalized.push(raster::load_normalized(path)?);
    }

    let intermediate = options
        .temp_dir
        .join(format!("images_{:016x}.pdf", digest(buffered)));
    pdf::assemble_images(&normalized, &intermediate, options.resolution)?;
    writer.append_file(&intermediate)?;

    debug!(
        intermediate = %intermediate.display(),
        images = buffered.len(),
        "flushed image buffer"
    );

    buffered.clear();
    Ok(())
}

/// Deterministic name component for one buffered run. Unique enough within
/// a call; not globally unique across processes.
fn digest(paths: &[PathBuf]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for path in paths {
        path.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::SofficeConverter;

    #[test]
    fn test_empty_attachments_rejected_before_io() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let base = dir.path().join("base.pdf");
        std::fs::write(&base, b"%PDF-1.5").expect("write base");
        let options = ExtendOptions::new(dir.path(), "out.pdf", dir.path().join("tmp"));

        let result = extend_document(
            &base,
            BaseType::Pdf,
            &[],
            &options,
            &SofficeConverter::default(),
        );

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        // The base was not touched.
        assert!(base.exists());
        assert!(!dir.path().join("tmp").exists());
    }

    #[test]
    fn test_missing_base_rejected() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let options = ExtendOptions::new(dir.path(), "out.pdf", dir.path().join("tmp"));

        let result = extend_document(
            &dir.path().join("gone.pdf"),
            BaseType::Pdf,
            &[Attachment::from_path(dir.path().join("a.png"))],
            &options,
            &SofficeConverter::default(),
        );

        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_attachment_classification() {
        assert_eq!(
            Attachment::from_path("scan.PDF"),
            Attachment::Pdf(PathBuf::from("scan.PDF"))
        );
        assert_eq!(
            Attachment::from_path("scan.png"),
            Attachment::Image(PathBuf::from("scan.png"))
        );
        assert_eq!(
            Attachment::from_path("no_extension"),
            Attachment::Image(PathBuf::from("no_extension"))
        );
    }

    // Full extend flows run in tests/integration.rs with generated
    // documents.
}
