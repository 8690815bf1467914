use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::assets::PreparedImage;
use crate::assets::decode::{decode_image_fitted, encode_png_premul, read_source};
use crate::foundation::core::Canvas;
use crate::foundation::error::{EneftyError, EneftyResult};
use crate::render::backend::{CompositionRenderer, RenderSettings};
use crate::render::composite::{fill_straight, over_in_place};
use crate::stack::layer_stack::Composition;
use crate::stack::variant::VariantSource;

type CacheKey = (VariantSource, Canvas);

/// CPU renderer: stretches every selected variant to the canvas and composites them bottom to
/// front with source-over, then encodes a PNG.
///
/// Decoded variants are cached per source and canvas size, so a bulk run decodes each image once.
/// A variant that cannot be loaded is left out of the image (with a warning) rather than failing
/// the whole render.
pub struct CpuCompositor {
    settings: RenderSettings,
    cache: HashMap<CacheKey, PreparedImage>,
}

impl CpuCompositor {
    /// Create a compositor.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            cache: HashMap::new(),
        }
    }

    /// Number of decoded variants currently cached.
    pub fn cached_images(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached decodes (e.g. after a project reload).
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for CpuCompositor {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

struct ComposeOutput {
    png: Vec<u8>,
    decoded: Vec<(VariantSource, PreparedImage)>,
}

fn compose(
    layers: Vec<(VariantSource, Option<PreparedImage>)>,
    canvas: Canvas,
    clear_rgba: Option<[u8; 4]>,
) -> EneftyResult<ComposeOutput> {
    let mut target = vec![0u8; canvas.rgba_len()];
    if let Some(c) = clear_rgba {
        fill_straight(&mut target, c);
    }

    let row_bytes = canvas.width as usize * 4;
    let mut decoded = Vec::new();
    for (source, cached) in layers {
        let img = match cached {
            Some(img) => img,
            None => {
                let loaded =
                    read_source(&source).and_then(|bytes| decode_image_fitted(&bytes, canvas));
                match loaded {
                    Ok(img) => {
                        decoded.push((source.clone(), img.clone()));
                        img
                    }
                    Err(e) => {
                        warn!(source = %source.to_reference(), error = %e, "variant skipped");
                        continue;
                    }
                }
            }
        };
        if (img.width, img.height) != (canvas.width, canvas.height) {
            return Err(EneftyError::render(format!(
                "'{}' was prepared at {}x{}, expected {}x{}",
                source.to_reference(),
                img.width,
                img.height,
                canvas.width,
                canvas.height
            )));
        }
        over_in_place(&mut target, &img.rgba8_premul, row_bytes)?;
    }

    let png = encode_png_premul(canvas.width, canvas.height, &target)?;
    Ok(ComposeOutput { png, decoded })
}

#[async_trait]
impl CompositionRenderer for CpuCompositor {
    async fn render(&mut self, composition: &Composition, canvas: Canvas) -> EneftyResult<Vec<u8>> {
        let layers: Vec<_> = composition
            .entries
            .iter()
            .map(|e| {
                let hit = self.cache.get(&(e.source.clone(), canvas)).cloned();
                (e.source.clone(), hit)
            })
            .collect();
        let clear = self.settings.clear_rgba;

        let out = tokio::task::spawn_blocking(move || compose(layers, canvas, clear))
            .await
            .map_err(|e| EneftyError::render(format!("compositor task failed: {e}")))??;

        debug!(
            layers = composition.entries.len(),
            newly_decoded = out.decoded.len(),
            "composited"
        );
        for (source, img) in out.decoded {
            self.cache.insert((source, canvas), img);
        }
        Ok(out.png)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
