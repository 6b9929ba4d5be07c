//! Image encoding: `DynamicImage` → bytes in the requested [`OutputFormat`].
//!
//! PNG and lossless WebP preserve text crispness; JPEG trades it for size.
//! PDF output wraps the page as a JPEG (`DCTDecode`) image XObject on a
//! single page whose media box matches the pixel dimensions, so the result
//! opens at 1 pt per pixel.

use crate::config::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("PDF assembly failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("PDF serialisation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode a page image for writing to disk.
pub fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    let bytes = match format {
        OutputFormat::Png => {
            let mut buf = Vec::new();
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
            buf
        }
        OutputFormat::Jpg | OutputFormat::Jpeg => encode_jpeg(img, jpeg_quality)?,
        OutputFormat::Webp => {
            // The WebP encoder only accepts 8-bit RGB(A).
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            let mut buf = Vec::new();
            rgba.write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP)?;
            buf
        }
        OutputFormat::Pdf => encode_pdf(img, jpeg_quality)?,
    };

    debug!(
        "Encoded {}x{} image → {} bytes {}",
        img.width(),
        img.height(),
        bytes.len(),
        format
    );
    Ok(bytes)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;
    Ok(buf)
}

fn encode_pdf(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (i64::from(img.width()), i64::from(img.height()));
    let jpeg = encode_jpeg(img, quality)?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width),
            Object::Integer(height),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1_i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)?;
    Ok(buf)
}
