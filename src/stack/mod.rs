//! Ordered layer stack with per-layer variant selection.

/// Shared, lockable handle to a live stack.
pub mod handle;
/// A single layer and its variants.
pub mod layer;
/// Stack-level operations (add/remove/reorder/select).
pub mod layer_stack;
/// Variant images and their source references.
pub mod variant;
