use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};

use crate::config::OcrConfig;
use crate::error::{Result, SnaptextError};

/// Every normalized image is re-encoded to this type.
pub const NORMALIZED_MIME_TYPE: &str = "image/jpeg";

/// Re-encoded upload, ready for base64 transmission to a provider.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Normalize an uploaded image for transmission to a vision model.
///
/// 1. Rejects anything that is not PNG, JPEG, GIF, or WebP by signature.
/// 2. Decodes; undecodable bytes are a client error.
/// 3. Converts exotic color modes to RGB (8-bit grayscale is kept as-is).
/// 4. Downscales with Lanczos3 so the larger dimension equals the configured
///    maximum. Never upscales.
/// 5. Re-encodes as JPEG at the configured quality.
///
/// Deterministic for identical input bytes and configuration; no side
/// effects beyond transient allocation.
pub fn normalize_image(bytes: &[u8], config: &OcrConfig) -> Result<NormalizedImage> {
    // Signature sniff catches uploads whose extension lied about the content
    // (e.g. a PDF renamed to .png) before any decode work.
    if let Some(kind) = infer::get(bytes) {
        if !matches!(
            kind.mime_type(),
            "image/png" | "image/jpeg" | "image/gif" | "image/webp"
        ) {
            return Err(SnaptextError::UnsupportedFormat);
        }
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| SnaptextError::Decode(format!("Failed to read image: {e}")))?;

    let format = reader.format().ok_or(SnaptextError::UnsupportedFormat)?;
    if !matches!(
        format,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP
    ) {
        return Err(SnaptextError::UnsupportedFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| SnaptextError::Decode(format!("Failed to decode image: {e}")))?;

    let (width, height) = img.dimensions();
    tracing::debug!(width, height, format = ?format, "decoded upload");

    let img = to_encodable_color(img);
    let img = resize_if_needed(img, config.max_image_dimension);

    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut output, config.jpeg_quality);
    img.write_with_encoder(encoder)
        .map_err(|e| SnaptextError::Internal(format!("Failed to encode image: {e}")))?;

    tracing::debug!(
        original_size = bytes.len(),
        normalized_size = output.len(),
        "image normalized"
    );

    Ok(NormalizedImage {
        bytes: output,
        mime_type: NORMALIZED_MIME_TYPE,
    })
}

/// Convert color modes the JPEG encoder cannot take directly.
///
/// RGB and 8-bit grayscale pass through; everything else (alpha channels,
/// 16-bit depths, palettes already expanded by the decoder) becomes RGB.
fn to_encodable_color(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Downscale so the larger dimension equals `max_dim`, preserving aspect
/// ratio. Images already within bounds are returned untouched.
fn resize_if_needed(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();

    if width <= max_dim && height <= max_dim {
        return img;
    }

    let (new_width, new_height) = if width >= height {
        let scaled = (height as f32 * (max_dim as f32 / width as f32)).round() as u32;
        (max_dim, scaled.max(1))
    } else {
        let scaled = (width as f32 * (max_dim as f32 / height as f32)).round() as u32;
        (scaled.max(1), max_dim)
    };

    tracing::debug!(
        from = %format!("{width}x{height}"),
        to = %format!("{new_width}x{new_height}"),
        "downscaling image"
    );

    img.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
}
