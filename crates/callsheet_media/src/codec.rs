use std::io::Cursor;

use callsheet_core::assets::{ImageAsset, ImageCodec};
use callsheet_core::config::CompressionSettings;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::{MediaError, Result};

/// Reference-image codec: bounds the longest edge and re-encodes as JPEG.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec;

/// Formats this build can decode.
fn detect(raw: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(raw).ok()? {
        f @ (ImageFormat::Png
        | ImageFormat::Jpeg
        | ImageFormat::Gif
        | ImageFormat::WebP
        | ImageFormat::Bmp) => Some(f),
        _ => None,
    }
}

/// Target size that fits `(width, height)` inside a `max` square, keeping the
/// aspect ratio. Never upscales.
pub fn bounded_size(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max || max == 0 {
        return (width, height);
    }
    let (max, longest) = (u64::from(max), u64::from(longest));
    let scale = |side: u32| ((u64::from(side) * max + longest / 2) / longest).max(1) as u32;
    (scale(width), scale(height))
}

impl JpegCodec {
    pub fn encode(&self, raw: &[u8], settings: &CompressionSettings) -> Result<ImageAsset> {
        if raw.is_empty() {
            return Err(MediaError::EmptyInput);
        }
        let format = detect(raw).ok_or_else(|| MediaError::Unsupported("unknown signature".into()))?;
        let decoded = image::load_from_memory_with_format(raw, format)?;

        let (width, height) = decoded.dimensions();
        let (target_w, target_h) = bounded_size(width, height, settings.max_dimension);
        let resized = if (target_w, target_h) == (width, height) {
            decoded
        } else {
            decoded.resize_exact(target_w, target_h, FilterType::Triangle)
        };

        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
        let mut out = Cursor::new(Vec::new());
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, settings.quality.clamp(1, 100)))?;
        let bytes = out.into_inner();

        tracing::debug!(
            ?format,
            from = ?(width, height),
            to = ?(target_w, target_h),
            bytes = bytes.len(),
            "re-encoded image"
        );
        Ok(ImageAsset {
            mime: ImageFormat::Jpeg.to_mime_type().to_string(),
            dimensions: Some((target_w, target_h)),
            compressed: true,
            bytes: bytes.into(),
        })
    }
}

impl ImageCodec for JpegCodec {
    fn sniff(&self, raw: &[u8]) -> Option<String> {
        detect(raw).map(|f| f.to_mime_type().to_string())
    }

    fn compress(&self, raw: &[u8], settings: &CompressionSettings) -> anyhow::Result<ImageAsset> {
        Ok(self.encode(raw, settings)?)
    }
}
