//! Batch conversion of images to PDF files
//!
//! The converter never fails as a whole: every per-item problem (undecodable
//! image, declined collision, write failure) is absorbed into the returned
//! [`ConversionTally`] and the batch moves on.

use std::ffi::OsStr;
use std::path::PathBuf;

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::paths;
use crate::pdf;
use crate::protocol::{BatchObserver, CollisionResolver, Decision, ItemStatus};
use crate::raster;

/// Default file name for the combined PDF in single mode.
pub const DEFAULT_SINGLE_NAME: &str = "combined_images.pdf";

/// How a batch of images maps to output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One combined PDF containing every image as a page.
    Single,
    /// One single-page PDF per image.
    Separate,
}

/// Settings for one conversion batch.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Directory the output files land in. Must already exist; the
    /// converter does not create it.
    pub output_dir: PathBuf,
    pub mode: OutputMode,
    /// File name of the combined PDF in [`OutputMode::Single`].
    pub single_output_name: String,
    /// In single mode, divert a colliding combined path to a fresh unique
    /// name instead of consulting the resolver.
    pub auto_rename: bool,
    /// Output resolution in pixels per inch.
    pub resolution: f32,
}

impl ConvertOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            mode: OutputMode::Separate,
            single_output_name: DEFAULT_SINGLE_NAME.to_string(),
            auto_rename: false,
            resolution: pdf::CONVERT_RESOLUTION,
        }
    }
}

/// Converted/skipped counters accumulated over one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionTally {
    pub converted: usize,
    pub skipped: usize,
}

/// Convert `images` into PDFs under `options.output_dir`.
///
/// Never returns an error; consult the tally. Images are processed strictly
/// in input order.
pub fn convert_images(
    images: &[PathBuf],
    options: &ConvertOptions,
    resolver: &mut dyn CollisionResolver,
    observer: &dyn BatchObserver,
) -> ConversionTally {
    match options.mode {
        OutputMode::Single => convert_to_single(images, options, resolver, observer),
        OutputMode::Separate => convert_to_separate(images, options, resolver, observer),
    }
}

/// Single mode: normalize everything first, then write one combined PDF.
///
/// The combined artifact is all-or-nothing: if its path collision is
/// resolved as skip, or assembly fails, every image that normalized
/// successfully counts as skipped.
fn convert_to_single(
    images: &[PathBuf],
    options: &ConvertOptions,
    resolver: &mut dyn CollisionResolver,
    observer: &dyn BatchObserver,
) -> ConversionTally {
    let mut tally = ConversionTally::default();
    let total = images.len();

    let mut normalized: Vec<RgbImage> = Vec::with_capacity(total);
    for (index, path) in images.iter().enumerate() {
        observer.progress(
            &format!("Processing image {}/{} for combined PDF", index + 1, total),
            index + 1,
            total,
        );
        observer.item_status(path, ItemStatus::Processing);

        match raster::load_normalized(path) {
            Ok(image) => {
                normalized.push(image);
                observer.item_status(path, ItemStatus::Succeeded);
            }
            Err(err) => {
                warn!(source = %path.display(), error = %err, "skipping undecodable image");
                tally.skipped += 1;
                observer.item_status(path, ItemStatus::Failed);
            }
        }
    }

    if normalized.is_empty() {
        info!(skipped = tally.skipped, "no images survived normalization");
        return tally;
    }

    observer.progress("Writing combined PDF", total, total);

    let candidate = options.output_dir.join(&options.single_output_name);
    let target = if candidate.exists() {
        if options.auto_rename {
            paths::allocate_unique(&candidate)
        } else {
            match resolver.resolve(&images[0], &candidate) {
                Decision::Overwrite => candidate,
                Decision::RenameTo(renamed) => renamed,
                Decision::Skip => {
                    debug!(target = %candidate.display(), "combined PDF skipped on collision");
                    tally.skipped += normalized.len();
                    return tally;
                }
            }
        }
    } else {
        candidate
    };

    let survivors = normalized.len();
    match pdf::assemble_images(&normalized, &target, options.resolution) {
        Ok(()) => {
            tally.converted += survivors;
            info!(
                output = %target.display(),
                converted = tally.converted,
                skipped = tally.skipped,
                "combined conversion finished"
            );
        }
        Err(err) => {
            warn!(output = %target.display(), error = %err, "combined PDF could not be written");
            tally.skipped += survivors;
        }
    }

    tally
}

/// Separate mode: each image becomes its own single-page PDF, with the
/// collision protocol consulted per item before the image is even decoded.
fn convert_to_separate(
    images: &[PathBuf],
    options: &ConvertOptions,
    resolver: &mut dyn CollisionResolver,
    observer: &dyn BatchObserver,
) -> ConversionTally {
    let mut tally = ConversionTally::default();
    let total = images.len();

    for (index, path) in images.iter().enumerate() {
        observer.progress(
            &format!("Converting {}/{}", index + 1, total),
            index + 1,
            total,
        );
        observer.item_status(path, ItemStatus::Processing);

        let mut file_name = path
            .file_stem()
            .unwrap_or_else(|| OsStr::new("image"))
            .to_os_string();
        file_name.push(".pdf");
        let candidate = options.output_dir.join(&file_name);

        let target = if candidate.exists() {
            match resolver.resolve(path, &candidate) {
                Decision::Overwrite => candidate,
                Decision::RenameTo(renamed) => renamed,
                Decision::Skip => {
                    debug!(source = %path.display(), "skipped on collision");
                    tally.skipped += 1;
                    observer.item_status(path, ItemStatus::Skipped);
                    continue;
                }
            }
        } else {
            candidate
        };

        let image = match raster::load_normalized(path) {
            Ok(image) => image,
            Err(err) => {
                warn!(source = %path.display(), error = %err, "skipping undecodable image");
                tally.skipped += 1;
                observer.item_status(path, ItemStatus::Failed);
                continue;
            }
        };

        match pdf::assemble_images(std::slice::from_ref(&image), &target, options.resolution) {
            Ok(()) => {
                tally.converted += 1;
                observer.item_status(path, ItemStatus::Succeeded);
            }
            Err(err) => {
                warn!(target = %target.display(), error = %err, "PDF could not be written");
                tally.skipped += 1;
                observer.item_status(path, ItemStatus::Failed);
            }
        }
    }

    info!(
        converted = tally.converted,
        skipped = tally.skipped,
        "separate conversion finished"
    );

    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::NoopObserver;

    #[test]
    fn test_empty_batch_yields_empty_tally() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let options = ConvertOptions::new(dir.path());
        let mut resolver = crate::protocol::AlwaysOverwrite;

        let tally = convert_images(&[], &options, &mut resolver, &NoopObserver);

        assert_eq!(tally, ConversionTally::default());
    }

    #[test]
    fn test_single_mode_empty_batch_writes_nothing() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let mut options = ConvertOptions::new(dir.path());
        options.mode = OutputMode::Single;
        let mut resolver = crate::protocol::AlwaysOverwrite;

        let tally = convert_images(&[], &options, &mut resolver, &NoopObserver);

        assert_eq!(tally, ConversionTally::default());
        assert!(!dir.path().join(DEFAULT_SINGLE_NAME).exists());
    }

    // Batch behavior with real images is covered in tests/integration.rs.
}
