//! Pure image operations behind the derived files.
//!
//! Everything here works on decoded [`RgbaImage`]s or raw bytes and has no access to
//! the cache or the icon folder. Decoding and encoding errors come back as
//! [`image::ImageError`]; the caller attaches the filename it was producing.

use crate::error::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageResult, RgbaImage};
use std::io::Cursor;

/// Edge length of every icon variant.
pub const ICON_SIZE: u32 = 64;

/// Edge length of the tech badge pasted into the top-left corner.
pub const OVERLAY_SIZE: u32 = 16;

/// Decode any supported image and convert it to RGBA.
pub fn decode(bytes: &[u8]) -> ImageResult<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Resample to `size`×`size` with a Lanczos filter.
pub fn resize_to(img: &RgbaImage, size: u32) -> RgbaImage {
    if img.dimensions() == (size, size) {
        return img.clone();
    }
    imageops::resize(img, size, size, FilterType::Lanczos3)
}

/// Alpha-composite `overlay` onto `base` at `(x, y)`, using the overlay's own alpha.
pub fn paste_over(base: &mut RgbaImage, overlay: &RgbaImage, x: i64, y: i64) {
    imageops::overlay(base, overlay, x, y);
}

/// Add `overlay` onto `base`, weighting the added color by the overlay's opacity.
///
/// Per pixel: `rgb = base.rgb + overlay.rgb * overlay.a / 255` and
/// `a = base.a + overlay.a * (1 - base.a)` in normalized units, both clamped to
/// `0..=255` and truncated. Only the region both images cover is touched.
pub fn additive_blend(base: &RgbaImage, overlay: &RgbaImage) -> RgbaImage {
    let mut out = base.clone();
    let width = base.width().min(overlay.width());
    let height = base.height().min(overlay.height());

    for y in 0..height {
        for x in 0..width {
            let over = overlay.get_pixel(x, y);
            let px = out.get_pixel_mut(x, y);

            let over_alpha = over[3] as f64 / 255.0;
            for c in 0..3 {
                let value = px[c] as f64 + over[c] as f64 * over_alpha;
                px[c] = value.clamp(0.0, 255.0) as u8;
            }

            let base_alpha = px[3] as f64 / 255.0;
            let alpha = base_alpha + over_alpha * (1.0 - base_alpha);
            px[3] = (alpha * 255.0).clamp(0.0, 255.0) as u8;
        }
    }

    out
}

/// Icon resized to 64 with a 16px tech badge in the top-left corner.
pub fn composite_tech(icon: &RgbaImage, tech: &RgbaImage) -> RgbaImage {
    let mut out = resize_to(icon, ICON_SIZE);
    paste_over(&mut out, &resize_to(tech, OVERLAY_SIZE), 0, 0);
    out
}

/// Icon layered on a background, tinted with an additive overlay, optional badge.
pub fn composite_blueprint(
    background: &RgbaImage,
    overlay: &RgbaImage,
    icon: &RgbaImage,
    tech: Option<&RgbaImage>,
) -> RgbaImage {
    let mut layered = background.clone();
    paste_over(&mut layered, &resize_to(icon, ICON_SIZE), 0, 0);

    let mut out = additive_blend(&layered, overlay);
    if let Some(tech) = tech {
        paste_over(&mut out, &resize_to(tech, OVERLAY_SIZE), 0, 0);
    }
    out
}

/// Encode an RGBA image as PNG.
pub fn encode_png(img: &RgbaImage) -> ImageResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Encode an image as JPEG. JPEG has no alpha, so the image is flattened to RGB.
pub fn encode_jpeg(img: &DynamicImage) -> ImageResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut buffer, ImageFormat::Jpeg)?;
    Ok(buffer.into_inner())
}

/// Bytes for `target` made from a source resource.
///
/// If the resource already has the target's extension the bytes pass through
/// untouched, otherwise the image is decoded and re-encoded.
pub fn copy_or_convert(source: Vec<u8>, resource: &str, target: &str) -> Result<Vec<u8>> {
    let extension = target
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if resource.to_ascii_lowercase().ends_with(&format!(".{extension}")) {
        return Ok(source);
    }

    let composition = |source| Error::Composition {
        filename: target.to_string(),
        source,
    };

    match extension.as_str() {
        "png" => {
            let img = decode(&source).map_err(composition)?;
            encode_png(&img).map_err(composition)
        }
        "jpg" | "jpeg" => {
            let img = image::load_from_memory(&source).map_err(composition)?;
            encode_jpeg(&img).map_err(composition)
        }
        other => Err(Error::UnsupportedExtension(other.to_string())),
    }
}
