use std::sync::Arc;

use tokio::sync::watch;

use crate::bulk::naming::Progress;

/// Requested run mode, checked by the generation loop at step boundaries only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ControlSignal {
    Run,
    Pause,
    Cancel,
}

/// Lifecycle of a bulk generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BulkState {
    /// No run in progress.
    #[default]
    Idle,
    /// Steps are executing.
    Running,
    /// Waiting for resume or cancel; the cursor is preserved.
    Paused,
    /// Every combination was processed.
    Completed,
    /// Stopped early at the user's request.
    Cancelled,
}

impl BulkState {
    /// Return `true` for `Completed` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Observable snapshot published after every transition and step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BulkStatus {
    /// Current state.
    pub state: BulkState,
    /// Steps done out of the total.
    pub progress: Progress,
    /// Images stored.
    pub written: u64,
    /// Steps skipped after a render/persist failure.
    pub skipped: u64,
}

/// Cloneable remote control for a run.
///
/// Requests are cooperative: a step already in flight always finishes (and its file is written)
/// before a pause or cancel takes effect. Cancel is sticky for the run it was issued against.
/// Every clone drives the same generator, including clones taken before [`start`].
///
/// [`start`]: crate::BulkGenerator::start
#[derive(Clone, Debug)]
pub struct BulkControl {
    tx: Arc<watch::Sender<ControlSignal>>,
}

impl BulkControl {
    pub(crate) fn channel() -> (Self, watch::Receiver<ControlSignal>) {
        let (tx, rx) = watch::channel(ControlSignal::Run);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Clear any pending request so a fresh run starts in `Run`.
    pub(crate) fn rearm(&self) {
        self.tx.send_replace(ControlSignal::Run);
    }

    /// Ask the run to pause before its next step.
    pub fn pause(&self) {
        self.tx.send_if_modified(|s| {
            if *s == ControlSignal::Run {
                *s = ControlSignal::Pause;
                true
            } else {
                false
            }
        });
    }

    /// Let a paused run continue from its cursor.
    pub fn resume(&self) {
        self.tx.send_if_modified(|s| {
            if *s == ControlSignal::Pause {
                *s = ControlSignal::Run;
                true
            } else {
                false
            }
        });
    }

    /// Ask the run to stop before its next step.
    pub fn cancel(&self) {
        self.tx.send_if_modified(|s| {
            if *s == ControlSignal::Cancel {
                false
            } else {
                *s = ControlSignal::Cancel;
                true
            }
        });
    }

    /// Return `true` once cancel was requested.
    pub fn is_cancel_requested(&self) -> bool {
        *self.tx.borrow() == ControlSignal::Cancel
    }

    /// Return `true` while a pause is requested.
    pub fn is_pause_requested(&self) -> bool {
        *self.tx.borrow() == ControlSignal::Pause
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bulk/control.rs"]
mod tests;
