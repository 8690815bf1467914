use std::path::PathBuf;

use async_trait::async_trait;

/// Asks the user (or a script) for a destination folder.
#[async_trait]
pub trait FolderPicker: Send {
    /// Resolve to the chosen folder, or `None` when the user backs out.
    async fn pick_folder(&mut self) -> Option<PathBuf>;
}

/// Picker that always answers with a preset folder. Used by the CLI and tests.
#[derive(Clone, Debug, Default)]
pub struct FixedFolder(pub Option<PathBuf>);

impl FixedFolder {
    /// Preset the answer.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self(Some(folder.into()))
    }
}

#[async_trait]
impl FolderPicker for FixedFolder {
    async fn pick_folder(&mut self) -> Option<PathBuf> {
        self.0.clone()
    }
}
