use std::sync::Arc;

pub(crate) mod decode;
pub(crate) mod thumbnail;

/// Decoded variant pixels, already fitted to an output canvas.
#[derive(Clone, Debug)]
pub(crate) struct PreparedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub(crate) rgba8_premul: Arc<Vec<u8>>,
}
