use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::foundation::core::Canvas;
use crate::foundation::error::{EneftyError, EneftyResult};
use crate::render::backend::CompositionRenderer;
use crate::stack::handle::StackHandle;

/// Render whatever the stack currently shows and write it to `out` as a single image.
pub async fn export_current<R>(
    stack: &StackHandle,
    renderer: &mut R,
    canvas: Canvas,
    out: &Path,
) -> EneftyResult<()>
where
    R: CompositionRenderer + ?Sized,
{
    let composition = stack.read(|s| s.composition());
    let bytes = renderer.render(&composition, canvas).await?;
    if bytes.is_empty() {
        return Err(EneftyError::render("renderer returned no data"));
    }

    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    tokio::fs::write(out, &bytes)
        .await
        .with_context(|| format!("write image '{}'", out.display()))?;

    info!(path = %out.display(), layers = composition.entries.len(), "exported");
    Ok(())
}
