//! `.enefty` project documents.
//!
//! A project is a pretty-printed JSON array of layers, bottom-most first:
//!
//! ```json
//! [
//!   {
//!     "name": "Background",
//!     "images": [{ "path": "/art/bg.png", "name": "bg.png", "thumb": "data:image/png;base64,..." }],
//!     "selected": 0
//!   }
//! ]
//! ```
//!
//! `path` is either a filesystem path or an inline `data:` URL.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::foundation::error::{EneftyError, EneftyResult};
use crate::stack::handle::StackHandle;
use crate::stack::layer_stack::{LayerParts, LayerStack};
use crate::stack::variant::{Variant, VariantSource};

/// File extension used for project documents.
pub const PROJECT_EXTENSION: &str = "enefty";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ProjectImage {
    path: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    thumb: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ProjectLayer {
    #[serde(default)]
    name: String,
    #[serde(default)]
    images: Vec<ProjectImage>,
    #[serde(default)]
    selected: Option<usize>,
}

fn to_document(stack: &LayerStack) -> Vec<ProjectLayer> {
    stack
        .layers()
        .iter()
        .map(|l| ProjectLayer {
            name: l.name().to_string(),
            images: l
                .variants()
                .iter()
                .map(|v| ProjectImage {
                    path: v.source().to_reference(),
                    name: v.name().to_string(),
                    thumb: v.thumb().to_string(),
                })
                .collect(),
            selected: l.selected(),
        })
        .collect()
}

fn from_document(doc: Vec<ProjectLayer>) -> EneftyResult<LayerStack> {
    let parts = doc
        .into_iter()
        .map(|l| LayerParts {
            name: l.name,
            variants: l
                .images
                .into_iter()
                .map(|img| Variant::new(VariantSource::parse(&img.path), img.name, img.thumb))
                .collect(),
            selected: l.selected,
        })
        .collect();
    LayerStack::from_parts(parts)
}

/// Parse a project from a JSON reader.
pub fn read_project<R: std::io::Read>(r: R) -> EneftyResult<LayerStack> {
    let doc: Vec<ProjectLayer> = serde_json::from_reader(r)
        .map_err(|e| EneftyError::serde(format!("parse project JSON: {e}")))?;
    from_document(doc)
}

/// Serialize a stack as pretty-printed project JSON.
pub fn write_project<W: std::io::Write>(stack: &LayerStack, w: W) -> EneftyResult<()> {
    serde_json::to_writer_pretty(w, &to_document(stack))
        .map_err(|e| EneftyError::serde(format!("write project JSON: {e}")))
}

/// Load a project file into a fresh stack.
pub fn load_project_file(path: impl AsRef<Path>) -> EneftyResult<LayerStack> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    read_project(BufReader::new(f))
}

/// Load a project file and replace the live stack with it.
///
/// The live stack is untouched when the file cannot be read or parsed.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_project(stack: &StackHandle, path: impl AsRef<Path>) -> EneftyResult<()> {
    let loaded = load_project_file(path)?;
    info!(layers = loaded.len(), "project loaded");
    stack.replace(loaded);
    Ok(())
}

/// Write the live stack to a project file.
pub fn save_project(stack: &StackHandle, path: impl AsRef<Path>) -> EneftyResult<()> {
    let path = path.as_ref();
    let snapshot = stack.snapshot();
    let f = File::create(path).with_context(|| format!("create project '{}'", path.display()))?;
    let mut w = BufWriter::new(f);
    write_project(&snapshot, &mut w)?;
    w.flush()
        .with_context(|| format!("write project '{}'", path.display()))?;
    info!(path = %path.display(), layers = snapshot.len(), "project saved");
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/project.rs"]
mod tests;
