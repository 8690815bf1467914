//! Enefty composes images from ordered layers of interchangeable variants and bulk-generates one
//! image per variant combination.
//!
//! - Edit a [`LayerStack`] (through a shared [`StackHandle`])
//! - Render the current selection with a [`CompositionRenderer`] such as [`CpuCompositor`]
//! - Enumerate every combination in odometer order with a [`BulkGenerator`], persisting each
//!   image through an [`OutputSink`], pausable and cancellable via [`BulkControl`]
//! - Save and restore stacks as `.enefty` project files
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

/// Bulk generation engine.
pub mod bulk;
/// Cartesian enumeration of variant combinations.
pub mod combo;
/// Output sinks and destination pickers.
pub mod output;
pub mod project;
/// Composition renderers.
pub mod render;
/// Layers, variants and the live stack.
pub mod stack;

pub use crate::foundation::core::{Canvas, LayerId};
pub use crate::foundation::error::{EneftyError, EneftyResult};

pub use crate::bulk::control::{BulkControl, BulkState, BulkStatus};
pub use crate::bulk::engine::{BulkGenerator, BulkOutcome, StepOutcome};
pub use crate::bulk::naming::{DEFAULT_PREFIX, Progress, output_filename, pad_width};
pub use crate::bulk::session::{BulkOpts, BulkRequest, GenerationSession};
pub use crate::combo::odometer::{Combination, CombinationSpace, Odometer, enumerate};
pub use crate::output::picker::{FixedFolder, FolderPicker};
pub use crate::output::sink::{FolderSink, InMemorySink, OutputSink};
pub use crate::project::{load_project, load_project_file, save_project};
pub use crate::render::backend::{CompositionRenderer, RenderSettings};
pub use crate::render::cpu::CpuCompositor;
pub use crate::render::export::export_current;
pub use crate::stack::handle::StackHandle;
pub use crate::stack::layer::Layer;
pub use crate::stack::layer_stack::{Composition, CompositionEntry, LayerParts, LayerStack};
pub use crate::stack::variant::{Variant, VariantSource};
