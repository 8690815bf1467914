use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::bulk::control::{BulkControl, BulkState, BulkStatus, ControlSignal};
use crate::bulk::naming::{normalize_prefix, output_filename};
use crate::bulk::session::{BulkOpts, BulkRequest, GenerationSession, MIN_STEP_DELAY};
use crate::combo::odometer::CombinationSpace;
use crate::foundation::error::{EneftyError, EneftyResult};
use crate::output::picker::FolderPicker;
use crate::output::sink::OutputSink;
use crate::render::backend::CompositionRenderer;
use crate::stack::handle::StackHandle;

/// Terminal report of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BulkOutcome {
    /// Every combination was processed.
    Completed {
        /// Images stored.
        written: u64,
        /// Combinations whose render or persist failed.
        skipped: u64,
        /// Combinations in the run.
        total: u64,
        /// Destination folder.
        folder: PathBuf,
    },
    /// The user stopped the run early.
    Cancelled {
        /// Combinations processed before the cancel took effect (the cursor).
        processed: u64,
        /// Images stored.
        written: u64,
        /// Combinations whose render or persist failed.
        skipped: u64,
        /// Combinations in the run.
        total: u64,
        /// Destination folder.
        folder: PathBuf,
    },
}

impl BulkOutcome {
    /// Images stored by the run.
    pub fn written(&self) -> u64 {
        match self {
            Self::Completed { written, .. } | Self::Cancelled { written, .. } => *written,
        }
    }
}

impl std::fmt::Display for BulkOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed {
                written,
                skipped,
                total,
                folder,
            } => {
                write!(
                    f,
                    "Generated {written} of {total} images in {}",
                    folder.display()
                )?;
                if *skipped > 0 {
                    write!(f, " ({skipped} skipped after errors)")?;
                }
                Ok(())
            }
            Self::Cancelled {
                processed,
                written,
                total,
                folder,
                ..
            } => write!(
                f,
                "Cancelled after {processed} of {total} combinations; {written} images written to {}",
                folder.display()
            ),
        }
    }
}

/// Result of a single step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The image was rendered and stored.
    Written {
        /// 1-based step number.
        step: u64,
        /// Output file name.
        filename: String,
    },
    /// Render or persist failed; the combination was skipped.
    Skipped {
        /// 1-based step number.
        step: u64,
        /// Output file name that was not written.
        filename: String,
        /// Human-readable failure.
        reason: String,
    },
    /// Nothing left to do.
    Finished,
}

/// Drives bulk generation over the live layer stack.
///
/// One generator runs at most one session at a time; steps execute strictly in odometer order,
/// and the renderer and sink are never called concurrently. Hosts either await [`Self::run`]
/// (controlling it through a [`BulkControl`]) or call [`Self::step`] themselves.
pub struct BulkGenerator<R, S> {
    stack: StackHandle,
    renderer: R,
    sink: S,
    opts: BulkOpts,

    state: BulkState,
    session: Option<GenerationSession>,
    inputs: BulkRequest,

    control: BulkControl,
    control_rx: watch::Receiver<ControlSignal>,
    status_tx: watch::Sender<BulkStatus>,
}

async fn bounded<T>(
    limit: Option<Duration>,
    fut: impl Future<Output = EneftyResult<T>>,
) -> Result<EneftyResult<T>, Duration> {
    match limit {
        None => Ok(fut.await),
        Some(d) => tokio::time::timeout(d, fut).await.map_err(|_| d),
    }
}

impl<R, S> BulkGenerator<R, S>
where
    R: CompositionRenderer,
    S: OutputSink,
{
    /// Create an idle generator bound to a stack.
    pub fn new(stack: StackHandle, renderer: R, sink: S, opts: BulkOpts) -> Self {
        let (control, control_rx) = BulkControl::channel();
        let (status_tx, _) = watch::channel(BulkStatus::default());
        Self {
            stack,
            renderer,
            sink,
            opts,
            state: BulkState::Idle,
            session: None,
            inputs: BulkRequest::default(),
            control,
            control_rx,
            status_tx,
        }
    }

    /// Current state.
    pub fn state(&self) -> BulkState {
        self.state
    }

    /// Latest published status.
    pub fn status(&self) -> BulkStatus {
        *self.status_tx.borrow()
    }

    /// Watch status updates (published after every step and transition).
    pub fn subscribe(&self) -> watch::Receiver<BulkStatus> {
        self.status_tx.subscribe()
    }

    /// Remote control for the current (or next) run. The same channel serves every run of
    /// this generator; `start` clears requests left over from an earlier run.
    pub fn control(&self) -> BulkControl {
        self.control.clone()
    }

    /// The active session, if a run has started and not been acknowledged.
    pub fn session(&self) -> Option<&GenerationSession> {
        self.session.as_ref()
    }

    /// Folder and prefix of the last start, kept for the next one.
    pub fn inputs(&self) -> &BulkRequest {
        &self.inputs
    }

    /// Generation options.
    pub fn opts(&self) -> &BulkOpts {
        &self.opts
    }

    /// Borrow the renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Take the adapters back.
    pub fn into_parts(self) -> (R, S) {
        (self.renderer, self.sink)
    }

    /// Ask `picker` for a destination and remember it as the folder input.
    ///
    /// Returns `false` (keeping the previous folder) when the picker yields nothing.
    pub async fn choose_destination(&mut self, picker: &mut dyn FolderPicker) -> bool {
        match picker.pick_folder().await {
            Some(folder) => {
                self.inputs.folder = folder;
                true
            }
            None => false,
        }
    }

    fn publish(&self) {
        let status = match &self.session {
            Some(s) => BulkStatus {
                state: self.state,
                progress: s.progress(),
                written: s.written,
                skipped: s.skipped,
            },
            None => BulkStatus {
                state: self.state,
                ..BulkStatus::default()
            },
        };
        self.status_tx.send_replace(status);
    }

    fn set_state(&mut self, state: BulkState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "bulk state");
        }
        self.state = state;
        self.publish();
    }

    /// Snapshot the stack and enter `Running`.
    ///
    /// Rejected (state stays `Idle`) when a run is already active, the folder is empty, or no
    /// layer has a variant. Layers without variants are left out of the combination space.
    #[tracing::instrument(skip(self), fields(folder = %request.folder.display()))]
    pub fn start(&mut self, request: BulkRequest) -> EneftyResult<BulkControl> {
        if self.state != BulkState::Idle {
            return Err(EneftyError::precondition(format!(
                "a generation is already {:?}",
                self.state
            )));
        }
        let prefix = normalize_prefix(&request.prefix);
        self.inputs = BulkRequest {
            folder: request.folder.clone(),
            prefix: prefix.clone(),
        };
        if request.folder.as_os_str().is_empty() {
            return Err(EneftyError::precondition(
                "please select a destination folder",
            ));
        }

        let participating = self.stack.read(|s| s.participating());
        if participating.is_empty() {
            return Err(EneftyError::precondition(
                "at least one layer needs an image",
            ));
        }
        let (participants, counts): (Vec<_>, Vec<_>) = participating.into_iter().unzip();
        let space = CombinationSpace::new(counts).map_err(|e| match e {
            EneftyError::Validation(msg) => EneftyError::precondition(msg),
            other => other,
        })?;

        info!(
            layers = participants.len(),
            total = space.total(),
            prefix = %prefix,
            "bulk generation started"
        );
        self.session = Some(GenerationSession::new(
            participants,
            space,
            request.folder,
            prefix,
        ));
        self.control.rearm();
        self.set_state(BulkState::Running);
        Ok(self.control.clone())
    }

    /// Execute exactly one combination: apply, render, name, persist, advance.
    ///
    /// Only valid while `Running`. Reaching the last combination moves the state to `Completed`.
    pub async fn step(&mut self) -> EneftyResult<StepOutcome> {
        if self.state != BulkState::Running {
            return Err(EneftyError::precondition(format!(
                "cannot step while {:?}",
                self.state
            )));
        }
        let Some(session) = self.session.as_mut() else {
            return Err(EneftyError::precondition("no generation session"));
        };
        let Some(combo) = session.space.nth(session.cursor) else {
            self.set_state(BulkState::Completed);
            return Ok(StepOutcome::Finished);
        };

        let total = session.space.total();
        let step = session.cursor + 1;
        let filename = output_filename(&session.prefix, step, total);

        // Layers deleted since start no longer resolve; their assignment is skipped.
        let participants = &session.participants;
        let composition = self.stack.update(|stack| {
            for (&id, &variant) in participants.iter().zip(combo.indices()) {
                if let Err(e) = stack.select_by_id(id, variant) {
                    warn!(step, layer = %id, error = %e, "layer assignment skipped");
                }
            }
            stack.composition()
        });

        let limit = self.opts.step_timeout;
        let rendered = match bounded(limit, self.renderer.render(&composition, self.opts.canvas))
            .await
        {
            Ok(Ok(bytes)) if bytes.is_empty() => {
                Err(EneftyError::render("renderer returned no data"))
            }
            Ok(res) => res,
            Err(d) => Err(EneftyError::render(format!("no response within {d:?}"))),
        };
        let stored = match rendered {
            Ok(bytes) => {
                match bounded(limit, self.sink.persist(&session.folder, &filename, &bytes)).await {
                    Ok(res) => res,
                    Err(d) => Err(EneftyError::persist(format!("no response within {d:?}"))),
                }
            }
            Err(e) => Err(e),
        };

        let outcome = match stored {
            Ok(()) => {
                session.written += 1;
                StepOutcome::Written {
                    step,
                    filename: filename.clone(),
                }
            }
            Err(e) => {
                warn!(step, filename = %filename, error = %e, "combination skipped");
                session.skipped += 1;
                StepOutcome::Skipped {
                    step,
                    filename: filename.clone(),
                    reason: e.to_string(),
                }
            }
        };
        session.cursor += 1;
        let done = session.cursor >= total;

        debug!(step, total, filename = %filename, "step done");
        if done {
            self.set_state(BulkState::Completed);
        } else {
            self.publish();
        }
        Ok(outcome)
    }

    /// Drive the active session until it completes or is cancelled.
    ///
    /// Pause and cancel requests from [`BulkControl`] are honoured between steps. While paused
    /// the loop waits on the control channel instead of polling. Between steps the loop sleeps
    /// for `opts.step_delay`, never less than [`MIN_STEP_DELAY`].
    #[tracing::instrument(skip(self))]
    pub async fn run(&mut self) -> EneftyResult<BulkOutcome> {
        if !matches!(self.state, BulkState::Running | BulkState::Paused) {
            if let Some(outcome) = self.outcome() {
                return Ok(outcome);
            }
            return Err(EneftyError::precondition(
                "start a generation before running it",
            ));
        }

        loop {
            let signal = *self.control_rx.borrow_and_update();
            match signal {
                ControlSignal::Cancel => {
                    self.set_state(BulkState::Cancelled);
                    break;
                }
                ControlSignal::Pause => {
                    if self.state != BulkState::Paused {
                        info!(
                            cursor = self.session.as_ref().map_or(0, |s| s.cursor),
                            "bulk generation paused"
                        );
                        self.set_state(BulkState::Paused);
                    }
                    // We hold a sender ourselves, so the channel cannot close.
                    let _ = self.control_rx.changed().await;
                }
                ControlSignal::Run => {
                    if self.state == BulkState::Paused {
                        info!("bulk generation resumed");
                        self.set_state(BulkState::Running);
                    }
                    self.step().await?;
                    if self.state == BulkState::Completed {
                        break;
                    }
                    tokio::time::sleep(self.opts.step_delay.max(MIN_STEP_DELAY)).await;
                }
            }
        }

        let outcome = self
            .outcome()
            .ok_or_else(|| EneftyError::precondition("run ended without an outcome"))?;
        info!(%outcome, "bulk generation finished");
        Ok(outcome)
    }

    /// Pause a step-driven run. No effect unless `Running`.
    pub fn pause(&mut self) {
        self.control.pause();
        if self.state == BulkState::Running {
            self.set_state(BulkState::Paused);
        }
    }

    /// Resume a step-driven run. No effect unless `Paused`.
    pub fn resume(&mut self) {
        self.control.resume();
        if self.state == BulkState::Paused {
            self.set_state(BulkState::Running);
        }
    }

    /// Cancel immediately (no step can be in flight while the caller holds `&mut self`).
    ///
    /// Returns the cancellation report, or `None` when no run is active.
    pub fn cancel(&mut self) -> Option<BulkOutcome> {
        if !matches!(self.state, BulkState::Running | BulkState::Paused) {
            return None;
        }
        self.control.cancel();
        self.set_state(BulkState::Cancelled);
        self.outcome()
    }

    /// Report for a terminal state, `None` otherwise.
    pub fn outcome(&self) -> Option<BulkOutcome> {
        let s = self.session.as_ref()?;
        let total = s.space.total();
        match self.state {
            BulkState::Completed => Some(BulkOutcome::Completed {
                written: s.written,
                skipped: s.skipped,
                total,
                folder: s.folder.clone(),
            }),
            BulkState::Cancelled => Some(BulkOutcome::Cancelled {
                processed: s.cursor,
                written: s.written,
                skipped: s.skipped,
                total,
                folder: s.folder.clone(),
            }),
            _ => None,
        }
    }

    /// Return to `Idle` after a terminal state, dropping the session. Folder and prefix inputs
    /// are kept. Calling this while idle is a no-op; while a run is active it is rejected.
    pub fn acknowledge(&mut self) -> EneftyResult<()> {
        match self.state {
            BulkState::Running | BulkState::Paused => Err(EneftyError::precondition(
                "cancel the running generation first",
            )),
            BulkState::Idle | BulkState::Completed | BulkState::Cancelled => {
                self.session = None;
                self.set_state(BulkState::Idle);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bulk/engine.rs"]
mod tests;
