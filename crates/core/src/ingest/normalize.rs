//! Image normalization applied to every accepted upload.
//!
//! Two steps, both optional:
//! - flatten: alpha or palette color models become plain 8-bit RGB
//! - downscale: images beyond the configured bounds are resized with
//!   Lanczos3 (aspect ratio preserved) and re-encoded as JPEG
//!
//! An image that needs neither is left exactly as uploaded.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader, RgbImage};
use pf_protocol::config_models::NormalizeConfig;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// What normalization did to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// The file was left byte-for-byte as uploaded.
    Unchanged,

    /// Converted to RGB and rewritten at the same dimensions.
    Flattened,

    /// Resized to fit the bounds and rewritten as JPEG.
    Downscaled { width: u32, height: u32 },
}

/// Failure inside [`normalize_file`].
#[derive(Debug)]
pub enum NormalizeError {
    /// The file is not an image the decoder understands.
    Decode(ImageError),

    /// Re-encoding the normalized image failed.
    Encode(ImageError),
}

/// Decode the image at `path` and normalize it in place.
pub fn normalize_file(
    path: &Path,
    settings: &NormalizeConfig,
) -> Result<Normalization, NormalizeError> {
    let reader = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|e| NormalizeError::Decode(ImageError::IoError(e)))?;
    let format = reader.format();
    let img = reader.decode().map_err(NormalizeError::Decode)?;

    let indexed = is_indexed(path, format)
        .map_err(|e| NormalizeError::Decode(ImageError::IoError(e)))?;
    let needs_flatten = img.color().has_alpha() || indexed;
    let too_large = img.width() > settings.max_width || img.height() > settings.max_height;

    if !needs_flatten && !too_large {
        return Ok(Normalization::Unchanged);
    }

    if too_large {
        let resized = img.resize(settings.max_width, settings.max_height, FilterType::Lanczos3);
        let rgb = resized.to_rgb8();
        write_jpeg(path, &rgb, settings.jpeg_quality).map_err(NormalizeError::Encode)?;
        return Ok(Normalization::Downscaled {
            width: rgb.width(),
            height: rgb.height(),
        });
    }

    let rgb = img.to_rgb8();
    match format {
        // These encoders take plain RGB, so the file keeps its format.
        Some(fmt @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::WebP)) => {
            DynamicImage::ImageRgb8(rgb)
                .save_with_format(path, fmt)
                .map_err(NormalizeError::Encode)?;
        }
        _ => {
            write_jpeg(path, &rgb, settings.jpeg_quality).map_err(NormalizeError::Encode)?;
        }
    }

    Ok(Normalization::Flattened)
}

/// MIME type of the encoded image in `bytes`, judged by its magic number.
///
/// A flattened GIF holds JPEG data under its `.gif` name, so served files
/// are labelled by content rather than by extension.
pub fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|format| format.to_mime_type())
}

/// Whether the file stores palette-indexed color.
///
/// Decoders expand palettes to RGB(A), so PNG is checked by its IHDR
/// color type. GIF is always indexed.
fn is_indexed(path: &Path, format: Option<ImageFormat>) -> std::io::Result<bool> {
    match format {
        Some(ImageFormat::Gif) => Ok(true),
        Some(ImageFormat::Png) => {
            let mut header = Vec::with_capacity(26);
            File::open(path)?.take(26).read_to_end(&mut header)?;
            Ok(header.get(PNG_COLOR_TYPE_OFFSET) == Some(&PNG_INDEXED))
        }
        _ => Ok(false),
    }
}

/// Signature (8) + chunk length (4) + "IHDR" (4) + width, height (8) + bit depth (1).
const PNG_COLOR_TYPE_OFFSET: usize = 25;
const PNG_INDEXED: u8 = 3;

/// Overwrite `path` with a baseline JPEG.
fn write_jpeg(path: &Path, img: &RgbImage, quality: u8) -> Result<(), ImageError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    encoder.encode_image(img)?;
    writer.flush()?;
    Ok(())
}
