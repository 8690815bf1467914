//! Output adapters: where generated images go.

/// Destination folder selection.
pub mod picker;
/// Persisting rendered bytes.
pub mod sink;
