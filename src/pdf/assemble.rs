//! Serializing normalized images as multi-page PDF documents

use std::path::Path;

use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::debug;

use crate::error::{Error, Result};

/// Default output resolution for quick-preview conversions, pixels per inch.
pub const CONVERT_RESOLUTION: f32 = 100.0;

/// Default output resolution for print-quality attachments, pixels per inch.
pub const EXTEND_RESOLUTION: f32 = 300.0;

/// Write `images` as one PDF at `output_path`, one page per image in input
/// order.
///
/// Each page's MediaBox is the image's pixel size scaled to points at
/// `resolution` pixels per inch, so the image fills the page exactly. The
/// whole document is written in a single save; there is no incremental
/// append once assembly has begun.
///
/// Fails with [`Error::EmptyInput`] when `images` is empty.
pub fn assemble_images(images: &[RgbImage], output_path: &Path, resolution: f32) -> Result<()> {
    if images.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(images.len());
    for image in images {
        kids.push(add_image_page(&mut doc, pages_id, image, resolution)?);
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => count,
            "Kids" => kids,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", catalog_id);

    doc.compress();
    doc.save(output_path)?;

    debug!(
        output = %output_path.display(),
        pages = images.len(),
        resolution,
        "assembled image PDF"
    );

    Ok(())
}

/// Embed one image as an XObject and build the page that draws it.
fn add_image_page(
    doc: &mut Document,
    pages_id: lopdf::ObjectId,
    image: &RgbImage,
    resolution: f32,
) -> Result<Object> {
    let (width, height) = image.dimensions();
    let page_width = width as f32 * 72.0 / resolution;
    let page_height = height as f32 * 72.0 / resolution;

    // Raw RGB samples; compress() applies FlateDecode at save time.
    let xobject_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.as_raw().clone(),
    ));

    // Scale the unit-square image to the full page, origin at bottom left.
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page_width.into(),
                    0.into(),
                    0.into(),
                    page_height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![
            0.into(),
            0.into(),
            page_width.into(),
            page_height.into(),
        ],
        "Contents" => Object::Reference(content_id),
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => Object::Reference(xobject_id),
            },
        },
    });

    Ok(Object::Reference(page_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    #[test]
    fn test_empty_input_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let output = dir.path().join("empty.pdf");

        let result = assemble_images(&[], &output, CONVERT_RESOLUTION);

        assert!(matches!(result, Err(Error::EmptyInput)));
        assert!(!output.exists());
    }

    #[test]
    fn test_one_page_per_image() {
        let dir = TempDir::new().expect("temp dir");
        let output = dir.path().join("three.pdf");
        let images = vec![
            RgbImage::from_pixel(10, 10, Rgb([255, 0, 0])),
            RgbImage::from_pixel(20, 10, Rgb([0, 255, 0])),
            RgbImage::from_pixel(10, 20, Rgb([0, 0, 255])),
        ];

        assemble_images(&images, &output, CONVERT_RESOLUTION).expect("assemble");

        let doc = Document::load(&output).expect("load output");
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_page_size_follows_resolution() {
        let dir = TempDir::new().expect("temp dir");
        let output = dir.path().join("sized.pdf");
        // 300 px at 100 ppi is exactly 3 inches = 216 pt.
        let images = vec![RgbImage::from_pixel(300, 150, Rgb([1, 2, 3]))];

        assemble_images(&images, &output, 100.0).expect("assemble");

        let doc = Document::load(&output).expect("load output");
        let (_, page_id) = doc.get_pages().into_iter().next().expect("one page");
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .expect("page dict");
        let media_box = page
            .get(b"MediaBox")
            .and_then(Object::as_array)
            .expect("media box");

        let as_f32 = |obj: &Object| match obj {
            Object::Integer(n) => *n as f32,
            Object::Real(r) => *r,
            other => panic!("unexpected MediaBox entry {other:?}"),
        };
        assert_eq!(as_f32(&media_box[2]), 216.0);
        assert_eq!(as_f32(&media_box[3]), 108.0);
    }
}
