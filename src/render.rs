/// Renderer contract consumed by the bulk engine.
pub mod backend;
/// Premultiplied source-over compositing.
pub(crate) mod composite;
/// Built-in CPU compositor.
pub mod cpu;
/// One-shot export of the current selection.
pub mod export;
