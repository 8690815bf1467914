use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use crate::foundation::error::{EneftyError, EneftyResult};

/// Stores one rendered image under `folder/filename`.
///
/// A failure is reported per item; the bulk engine logs it and moves on.
#[async_trait]
pub trait OutputSink: Send {
    /// Persist `bytes` as `folder/filename`.
    async fn persist(&mut self, folder: &Path, filename: &str, bytes: &[u8]) -> EneftyResult<()>;
}

#[async_trait]
impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    async fn persist(&mut self, folder: &Path, filename: &str, bytes: &[u8]) -> EneftyResult<()> {
        (**self).persist(folder, filename, bytes).await
    }
}

/// Writes files to the local filesystem.
///
/// Each file is first written under a `.part` name and then renamed, so an interrupted write
/// never leaves a truncated image under the final name.
#[derive(Clone, Debug)]
pub struct FolderSink {
    create_dirs: bool,
}

impl FolderSink {
    /// Create a sink. With `create_dirs`, missing destination folders are created.
    pub fn new(create_dirs: bool) -> Self {
        Self { create_dirs }
    }
}

impl Default for FolderSink {
    fn default() -> Self {
        Self::new(true)
    }
}

fn check_file_name(filename: &str) -> EneftyResult<()> {
    let p = Path::new(filename);
    if filename.is_empty() || p.components().count() != 1 || p.file_name().is_none() {
        return Err(EneftyError::persist(format!(
            "'{filename}' is not a plain file name"
        )));
    }
    Ok(())
}

#[async_trait]
impl OutputSink for FolderSink {
    async fn persist(&mut self, folder: &Path, filename: &str, bytes: &[u8]) -> EneftyResult<()> {
        check_file_name(filename)?;
        if self.create_dirs {
            tokio::fs::create_dir_all(folder)
                .await
                .with_context(|| format!("create output dir '{}'", folder.display()))?;
        }
        let dest = folder.join(filename);
        let part = folder.join(format!("{filename}.part"));
        tokio::fs::write(&part, bytes)
            .await
            .with_context(|| format!("write '{}'", part.display()))?;
        tokio::fs::rename(&part, &dest)
            .await
            .with_context(|| format!("move '{}' into place", dest.display()))?;
        Ok(())
    }
}

/// Records every write in memory, in order. Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemorySink {
    writes: Vec<(PathBuf, Vec<u8>)>,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the recorded `(path, bytes)` pairs.
    pub fn writes(&self) -> &[(PathBuf, Vec<u8>)] {
        &self.writes
    }

    /// File names of the recorded writes, in write order.
    pub fn file_names(&self) -> Vec<String> {
        self.writes
            .iter()
            .filter_map(|(p, _)| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect()
    }
}

#[async_trait]
impl OutputSink for InMemorySink {
    async fn persist(&mut self, folder: &Path, filename: &str, bytes: &[u8]) -> EneftyResult<()> {
        check_file_name(filename)?;
        self.writes.push((folder.join(filename), bytes.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/sink.rs"]
mod tests;
