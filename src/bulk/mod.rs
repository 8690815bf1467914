//! Resumable, pausable, cancellable bulk generation over every variant combination.

/// Pause/resume/cancel signalling and observable status.
pub mod control;
/// The generation state machine.
pub mod engine;
/// Output file naming and progress accounting.
pub mod naming;
/// Start-time snapshot of a generation run.
pub mod session;
