use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::{
    assets::PreparedImage,
    foundation::core::Canvas,
    foundation::error::{EneftyError, EneftyResult},
    stack::variant::VariantSource,
};

/// Load the encoded bytes behind a variant source (file contents or an embedded data URL).
pub(crate) fn read_source(source: &VariantSource) -> EneftyResult<Vec<u8>> {
    match source {
        VariantSource::Path(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("read variant image '{}'", path.display()))?;
            Ok(bytes)
        }
        VariantSource::Embedded(url) => parse_data_url(url),
    }
}

/// Decode the payload of a `data:<mime>;base64,<payload>` URL.
pub(crate) fn parse_data_url(url: &str) -> EneftyResult<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| EneftyError::validation("embedded source must start with 'data:'"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| EneftyError::validation("data URL is missing a ',' separator"))?;
    if !meta.ends_with(";base64") {
        return Err(EneftyError::validation(
            "only base64-encoded data URLs are supported",
        ));
    }
    BASE64
        .decode(payload.trim())
        .map_err(|e| EneftyError::validation(format!("data URL payload is not base64: {e}")))
}

/// Wrap PNG bytes in a `data:image/png;base64,` URL.
pub(crate) fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

/// Decode encoded image bytes, stretch them to `canvas`, and convert to premultiplied RGBA8.
///
/// Variants are drawn over the full export area regardless of their native size.
pub(crate) fn decode_image_fitted(bytes: &[u8], canvas: Canvas) -> EneftyResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = if dyn_img.width() == canvas.width && dyn_img.height() == canvas.height {
        dyn_img.to_rgba8()
    } else {
        image::imageops::resize(
            &dyn_img.to_rgba8(),
            canvas.width,
            canvas.height,
            image::imageops::FilterType::Triangle,
        )
    };
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Encode premultiplied RGBA8 pixels as a straight-alpha PNG.
pub(crate) fn encode_png_premul(width: u32, height: u32, premul: &[u8]) -> EneftyResult<Vec<u8>> {
    let mut straight = premul.to_vec();
    unpremultiply_rgba8_in_place(&mut straight);
    let img = image::RgbaImage::from_raw(width, height, straight)
        .ok_or_else(|| EneftyError::render("pixel buffer does not match image dimensions"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
