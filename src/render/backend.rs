use async_trait::async_trait;

use crate::foundation::core::Canvas;
use crate::foundation::error::EneftyResult;
use crate::stack::layer_stack::Composition;

/// Rasterizes a composition into an encoded image (PNG bytes).
///
/// The bulk engine never calls `render` concurrently with itself: at most one call is
/// outstanding per generator. A call may take arbitrary wall-clock time.
#[async_trait]
pub trait CompositionRenderer: Send {
    /// Render `composition` at exactly `canvas` size.
    ///
    /// An error, or an empty buffer, makes the engine skip the current item.
    async fn render(&mut self, composition: &Composition, canvas: Canvas) -> EneftyResult<Vec<u8>>;
}

#[async_trait]
impl<T: CompositionRenderer + ?Sized> CompositionRenderer for Box<T> {
    async fn render(&mut self, composition: &Composition, canvas: Canvas) -> EneftyResult<Vec<u8>> {
        (**self).render(composition, canvas).await
    }
}

/// Backend-agnostic render settings.
#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// If set, the target is cleared to this straight-alpha RGBA8 color before drawing.
    pub clear_rgba: Option<[u8; 4]>,
}
