use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bulk::naming::{DEFAULT_PREFIX, Progress};
use crate::combo::odometer::CombinationSpace;
use crate::foundation::core::{Canvas, LayerId};

/// Shortest pause the run loop takes between steps, whatever `step_delay` says.
pub const MIN_STEP_DELAY: Duration = Duration::from_millis(1);

/// Options controlling bulk generation.
#[derive(Clone, Debug)]
pub struct BulkOpts {
    /// Export dimensions for every generated image.
    pub canvas: Canvas,
    /// Pause between steps so pending draw work and control signals get a turn. Values below
    /// [`MIN_STEP_DELAY`] are raised to it.
    pub step_delay: Duration,
    /// Optional limit per adapter call; expiry counts as a failed item. `None` waits forever.
    pub step_timeout: Option<Duration>,
}

impl Default for BulkOpts {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            step_delay: Duration::from_millis(10),
            step_timeout: None,
        }
    }
}

/// User inputs for a run. Kept by the generator across runs for convenience.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkRequest {
    /// Destination folder.
    pub folder: PathBuf,
    /// File name prefix.
    pub prefix: String,
}

impl BulkRequest {
    /// Create a request.
    pub fn new(folder: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            prefix: prefix.into(),
        }
    }
}

impl Default for BulkRequest {
    fn default() -> Self {
        Self {
            folder: PathBuf::new(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Snapshot taken when a run starts.
///
/// The participant list is frozen: layers added later are ignored and layers removed later are
/// skipped at apply time. The layers themselves stay live in the stack.
#[derive(Clone, Debug)]
pub struct GenerationSession {
    pub(crate) participants: Vec<LayerId>,
    pub(crate) space: CombinationSpace,
    pub(crate) cursor: u64,
    pub(crate) folder: PathBuf,
    pub(crate) prefix: String,
    pub(crate) written: u64,
    pub(crate) skipped: u64,
}

impl GenerationSession {
    pub(crate) fn new(
        participants: Vec<LayerId>,
        space: CombinationSpace,
        folder: PathBuf,
        prefix: String,
    ) -> Self {
        Self {
            participants,
            space,
            cursor: 0,
            folder,
            prefix,
            written: 0,
            skipped: 0,
        }
    }

    /// Layers taking part, in stack order at start time.
    pub fn participants(&self) -> &[LayerId] {
        &self.participants
    }

    /// The enumerated combinations.
    pub fn space(&self) -> &CombinationSpace {
        &self.space
    }

    /// Index of the next combination to generate.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Destination folder.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// File name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Images stored so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Steps whose render or persist failed.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Steps done out of the total.
    pub fn progress(&self) -> Progress {
        Progress::new(self.cursor, self.space.total())
    }
}
