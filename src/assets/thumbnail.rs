use std::io::Cursor;

use anyhow::Context;

use crate::assets::decode::png_data_url;
use crate::foundation::error::EneftyResult;

/// Edge length of the square layer-panel preview, in pixels.
pub(crate) const THUMB_SIZE: u32 = 40;

/// Build the small preview stored alongside a variant, as a PNG data URL.
pub(crate) fn make_thumbnail(bytes: &[u8]) -> EneftyResult<String> {
    let dyn_img = image::load_from_memory(bytes).context("decode image for thumbnail")?;
    let thumb = dyn_img.resize_exact(
        THUMB_SIZE,
        THUMB_SIZE,
        image::imageops::FilterType::Triangle,
    );

    let mut buf = Vec::new();
    thumb
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode thumbnail png")?;
    Ok(png_data_url(&buf))
}
