use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::*;
use crate::foundation::core::{Canvas, LayerId};
use crate::output::picker::FixedFolder;
use crate::output::sink::InMemorySink;
use crate::stack::layer_stack::{Composition, LayerParts, LayerStack};
use crate::stack::variant::{Variant, VariantSource};

fn variant(name: &str) -> Variant {
    Variant::new(VariantSource::Path(format!("{name}.png").into()), name, "")
}

/// Layer A with two variants below layer B with three.
fn two_layer_stack() -> (StackHandle, LayerId, LayerId) {
    let mut stack = LayerStack::new();
    let a = stack.add_layer();
    stack.add_variant(0, variant("a0")).unwrap();
    stack.add_variant(0, variant("a1")).unwrap();
    let b = stack.add_layer();
    for n in ["b0", "b1", "b2"] {
        stack.add_variant(1, variant(n)).unwrap();
    }
    (StackHandle::new(stack), a, b)
}

fn fast_opts() -> BulkOpts {
    BulkOpts {
        step_delay: Duration::ZERO,
        ..BulkOpts::default()
    }
}

type Picks = Vec<(LayerId, usize)>;

#[derive(Default)]
struct Recorder {
    calls: Vec<Picks>,
    fail_on: Option<usize>,
    stall_on: Option<usize>,
    edit: Option<(usize, StackHandle, fn(&mut LayerStack))>,
}

#[async_trait]
impl CompositionRenderer for Recorder {
    async fn render(&mut self, composition: &Composition, _canvas: Canvas) -> EneftyResult<Vec<u8>> {
        let picks: Picks = composition
            .entries
            .iter()
            .map(|e| (e.layer, e.variant))
            .collect();
        self.calls.push(picks.clone());
        let call = self.calls.len();
        if let Some((n, handle, edit)) = &self.edit
            && *n == call
        {
            handle.update(*edit);
        }
        if self.stall_on == Some(call) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.fail_on == Some(call) {
            return Err(EneftyError::render("boom"));
        }
        Ok(format!("{picks:?}").into_bytes())
    }
}

enum Action {
    Pause,
    Cancel,
}

/// In-memory sink that triggers a control action right after its n-th write.
struct ScriptedSink {
    inner: InMemorySink,
    after: usize,
    action: Action,
    control: Arc<Mutex<Option<BulkControl>>>,
}

impl ScriptedSink {
    fn new(after: usize, action: Action) -> (Self, Arc<Mutex<Option<BulkControl>>>) {
        let slot = Arc::new(Mutex::new(None));
        let sink = Self {
            inner: InMemorySink::new(),
            after,
            action,
            control: slot.clone(),
        };
        (sink, slot)
    }
}

#[async_trait]
impl OutputSink for ScriptedSink {
    async fn persist(
        &mut self,
        folder: &std::path::Path,
        filename: &str,
        bytes: &[u8],
    ) -> EneftyResult<()> {
        self.inner.persist(folder, filename, bytes).await?;
        if self.inner.writes().len() == self.after
            && let Some(control) = self.control.lock().unwrap().as_ref()
        {
            match self.action {
                Action::Pause => control.pause(),
                Action::Cancel => control.cancel(),
            }
        }
        Ok(())
    }
}

fn drop_bottom_layer(stack: &mut LayerStack) {
    stack.remove_layer(0).unwrap();
}

fn add_top_layer(stack: &mut LayerStack) {
    stack.add_layer();
    let top = stack.len() - 1;
    stack.add_variant(top, variant("c0")).unwrap();
    stack.add_variant(top, variant("c1")).unwrap();
}

/// Swap the whole stack for a freshly loaded one-layer project.
fn reload_project(stack: &mut LayerStack) {
    *stack = LayerStack::from_parts(vec![LayerParts {
        name: "X".into(),
        variants: vec![variant("x0"), variant("x1"), variant("x2")],
        selected: Some(2),
    }])
    .unwrap();
}

fn names(prefix: &str, steps: impl IntoIterator<Item = u64>) -> Vec<String> {
    steps
        .into_iter()
        .map(|s| format!("{prefix}-{s:05}.png"))
        .collect()
}

#[tokio::test]
async fn run_writes_every_combination_in_odometer_order() {
    let (stack, a, b) = two_layer_stack();
    let mut generator =
        BulkGenerator::new(stack, Recorder::default(), InMemorySink::new(), fast_opts());
    generator.start(BulkRequest::new("/out", "v")).unwrap();
    let outcome = generator.run().await.unwrap();

    assert_eq!(
        outcome,
        BulkOutcome::Completed {
            written: 6,
            skipped: 0,
            total: 6,
            folder: "/out".into(),
        }
    );
    assert_eq!(generator.state(), BulkState::Completed);
    assert_eq!(generator.sink().file_names(), names("v", 1..=6));
    assert!(
        generator
            .sink()
            .writes()
            .iter()
            .all(|(p, _)| p.starts_with("/out"))
    );

    let expected: Vec<Picks> = [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        .into_iter()
        .map(|(x, y)| vec![(a, x), (b, y)])
        .collect();
    assert_eq!(generator.renderer().calls, expected);

    let status = generator.status();
    assert_eq!(status.state, BulkState::Completed);
    assert_eq!(status.progress.current, 6);
    assert_eq!(status.progress.total, 6);
    assert_eq!(status.written, 6);
}

#[tokio::test]
async fn start_rejects_missing_inputs_and_stays_idle() {
    let (stack, _, _) = two_layer_stack();
    let mut generator =
        BulkGenerator::new(stack, Recorder::default(), InMemorySink::new(), fast_opts());
    let err = generator.start(BulkRequest::new("", "v")).unwrap_err();
    assert!(matches!(err, EneftyError::Precondition(_)));
    assert_eq!(generator.state(), BulkState::Idle);
    assert!(generator.session().is_none());

    let mut stack = LayerStack::new();
    stack.add_layer();
    let mut empty = BulkGenerator::new(
        StackHandle::new(stack),
        Recorder::default(),
        InMemorySink::new(),
        fast_opts(),
    );
    let err = empty.start(BulkRequest::new("/out", "v")).unwrap_err();
    assert!(matches!(err, EneftyError::Precondition(_)));
    assert_eq!(empty.state(), BulkState::Idle);
}

#[tokio::test]
async fn start_while_running_is_rejected() {
    let (stack, _, _) = two_layer_stack();
    let mut generator =
        BulkGenerator::new(stack, Recorder::default(), InMemorySink::new(), fast_opts());
    generator.start(BulkRequest::new("/out", "v")).unwrap();
    let err = generator.start(BulkRequest::new("/other", "w")).unwrap_err();
    assert!(matches!(err, EneftyError::Precondition(_)));
    assert_eq!(generator.state(), BulkState::Running);
    assert_eq!(generator.session().unwrap().folder(), std::path::Path::new("/out"));
}

#[tokio::test]
async fn layers_without_variants_do_not_participate() {
    let mut stack = LayerStack::new();
    let a = stack.add_layer();
    stack.add_variant(0, variant("a0")).unwrap();
    stack.add_variant(0, variant("a1")).unwrap();
    stack.add_layer();
    let c = stack.add_layer();
    stack.add_variant(2, variant("c0")).unwrap();
    stack.add_variant(2, variant("c1")).unwrap();

    let mut generator = BulkGenerator::new(
        StackHandle::new(stack),
        Recorder::default(),
        InMemorySink::new(),
        fast_opts(),
    );
    generator.start(BulkRequest::new("/out", "")).unwrap();
    let session = generator.session().unwrap();
    assert_eq!(session.participants(), &[a, c]);
    assert_eq!(session.space().total(), 4);
    assert_eq!(session.prefix(), "variation");

    let outcome = generator.run().await.unwrap();
    assert_eq!(outcome.written(), 4);
    assert_eq!(generator.sink().file_names(), names("variation", 1..=4));
}

#[tokio::test]
async fn pause_waits_and_resume_continues_from_cursor() {
    let (stack, _, _) = two_layer_stack();
    let (sink, slot) = ScriptedSink::new(2, Action::Pause);
    let mut generator = BulkGenerator::new(stack, Recorder::default(), sink, fast_opts());
    let control = generator.start(BulkRequest::new("/out", "v")).unwrap();
    *slot.lock().unwrap() = Some(control.clone());
    let mut status = generator.subscribe();

    let (outcome, paused) = tokio::join!(generator.run(), async move {
        let paused = *status
            .wait_for(|s| s.state == BulkState::Paused)
            .await
            .unwrap();
        control.resume();
        paused
    });

    assert_eq!(paused.progress.current, 2);
    assert_eq!(paused.written, 2);
    assert_eq!(outcome.unwrap().written(), 6);
    assert_eq!(generator.sink().inner.file_names(), names("v", 1..=6));
}

#[tokio::test]
async fn cancel_stops_after_the_in_flight_step() {
    let (stack, _, _) = two_layer_stack();
    let (sink, slot) = ScriptedSink::new(3, Action::Cancel);
    let mut generator = BulkGenerator::new(stack, Recorder::default(), sink, fast_opts());
    let control = generator.start(BulkRequest::new("/out", "v")).unwrap();
    *slot.lock().unwrap() = Some(control);

    let outcome = generator.run().await.unwrap();
    assert_eq!(
        outcome,
        BulkOutcome::Cancelled {
            processed: 3,
            written: 3,
            skipped: 0,
            total: 6,
            folder: "/out".into(),
        }
    );
    assert_eq!(generator.state(), BulkState::Cancelled);
    assert_eq!(generator.sink().inner.file_names(), names("v", 1..=3));
    assert!(outcome.to_string().contains("3 of 6"));

    generator.acknowledge().unwrap();
    assert_eq!(generator.state(), BulkState::Idle);
    assert!(generator.session().is_none());
    assert_eq!(generator.inputs(), &BulkRequest::new("/out", "v"));
}

#[tokio::test]
async fn removed_layer_is_skipped_for_remaining_steps() {
    let (stack, _, b) = two_layer_stack();
    let renderer = Recorder {
        edit: Some((1, stack.clone(), drop_bottom_layer as fn(&mut LayerStack))),
        ..Recorder::default()
    };
    let mut generator = BulkGenerator::new(stack, renderer, InMemorySink::new(), fast_opts());
    generator.start(BulkRequest::new("/out", "v")).unwrap();
    let outcome = generator.run().await.unwrap();

    assert_eq!(outcome.written(), 6);
    let calls = &generator.renderer().calls;
    assert_eq!(calls.len(), 6);
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[1], vec![(b, 1)]);
    assert_eq!(calls[5], vec![(b, 2)]);
}

#[tokio::test]
async fn layer_added_mid_run_does_not_grow_the_run() {
    let (stack, a, b) = two_layer_stack();
    let renderer = Recorder {
        edit: Some((2, stack.clone(), add_top_layer as fn(&mut LayerStack))),
        ..Recorder::default()
    };
    let mut generator = BulkGenerator::new(stack.clone(), renderer, InMemorySink::new(), fast_opts());
    generator.start(BulkRequest::new("/out", "v")).unwrap();
    let outcome = generator.run().await.unwrap();

    assert_eq!(outcome.written(), 6);
    assert_eq!(generator.session().unwrap().participants(), &[a, b]);
    let c = stack.read(|s| s.layer(2).unwrap().id());
    // The new layer shows at its own selection but is never enumerated.
    assert_eq!(generator.renderer().calls[5], vec![(a, 1), (b, 2), (c, 0)]);
}

#[tokio::test]
async fn project_reloaded_mid_run_keeps_its_own_selections() {
    let (stack, a, b) = two_layer_stack();
    let renderer = Recorder {
        edit: Some((1, stack.clone(), reload_project as fn(&mut LayerStack))),
        ..Recorder::default()
    };
    let mut generator = BulkGenerator::new(stack.clone(), renderer, InMemorySink::new(), fast_opts());
    generator.start(BulkRequest::new("/out", "v")).unwrap();
    let outcome = generator.run().await.unwrap();

    assert_eq!(outcome.written(), 6);
    let x = stack.read(|s| s.layer(0).unwrap().id());
    assert!(!generator.session().unwrap().participants().contains(&x));
    let calls = &generator.renderer().calls;
    assert_eq!(calls[0], vec![(a, 0), (b, 0)]);
    assert!(calls[1..].iter().all(|c| c == &vec![(x, 2)]));
    assert_eq!(stack.read(|s| s.layer(0).unwrap().selected()), Some(2));
}

#[tokio::test]
async fn render_failure_skips_one_file_and_continues() {
    let (stack, _, _) = two_layer_stack();
    let renderer = Recorder {
        fail_on: Some(2),
        ..Recorder::default()
    };
    let mut generator = BulkGenerator::new(stack, renderer, InMemorySink::new(), fast_opts());
    generator.start(BulkRequest::new("/out", "v")).unwrap();
    let outcome = generator.run().await.unwrap();

    assert_eq!(
        outcome,
        BulkOutcome::Completed {
            written: 5,
            skipped: 1,
            total: 6,
            folder: "/out".into(),
        }
    );
    assert_eq!(
        generator.sink().file_names(),
        names("v", [1, 3, 4, 5, 6])
    );
}

#[tokio::test(start_paused = true)]
async fn step_timeout_counts_as_skip() {
    let (stack, _, _) = two_layer_stack();
    let renderer = Recorder {
        stall_on: Some(1),
        ..Recorder::default()
    };
    let opts = BulkOpts {
        step_timeout: Some(Duration::from_secs(1)),
        ..fast_opts()
    };
    let mut generator = BulkGenerator::new(stack, renderer, InMemorySink::new(), opts);
    generator.start(BulkRequest::new("/out", "v")).unwrap();

    let first = generator.step().await.unwrap();
    match first {
        StepOutcome::Skipped {
            step,
            filename,
            reason,
        } => {
            assert_eq!(step, 1);
            assert_eq!(filename, "v-00001.png");
            assert!(reason.contains("no response"));
        }
        other => panic!("expected a skip, got {other:?}"),
    }
    let outcome = generator.run().await.unwrap();
    assert_eq!(outcome.written(), 5);
}

#[tokio::test]
async fn step_driven_host_can_pause_cancel_and_acknowledge() {
    let (stack, _, _) = two_layer_stack();
    let mut generator =
        BulkGenerator::new(stack, Recorder::default(), InMemorySink::new(), fast_opts());
    assert!(generator.step().await.is_err());
    assert!(generator.cancel().is_none());

    generator.start(BulkRequest::new("/out", "v")).unwrap();
    assert_eq!(
        generator.step().await.unwrap(),
        StepOutcome::Written {
            step: 1,
            filename: "v-00001.png".to_string(),
        }
    );

    generator.pause();
    assert_eq!(generator.state(), BulkState::Paused);
    assert!(generator.step().await.is_err());
    assert!(generator.acknowledge().is_err());

    generator.resume();
    assert_eq!(generator.state(), BulkState::Running);
    generator.step().await.unwrap();

    let report = generator.cancel().unwrap();
    assert!(matches!(
        report,
        BulkOutcome::Cancelled {
            processed: 2,
            written: 2,
            ..
        }
    ));
    assert!(generator.step().await.is_err());
    assert_eq!(generator.run().await.unwrap(), report);

    generator.acknowledge().unwrap();
    generator.acknowledge().unwrap();
    assert_eq!(generator.state(), BulkState::Idle);
    assert_eq!(generator.inputs().prefix, "v");

    // A fresh run after acknowledge starts from the first combination.
    let again = generator.inputs().clone();
    generator.start(again).unwrap();
    assert_eq!(generator.session().unwrap().cursor(), 0);
    assert_eq!(generator.run().await.unwrap().written(), 6);
}

#[tokio::test]
async fn control_taken_before_start_reaches_the_run() {
    let (stack, _, _) = two_layer_stack();
    let mut generator =
        BulkGenerator::new(stack, Recorder::default(), InMemorySink::new(), fast_opts());
    let early = generator.control();
    generator.start(BulkRequest::new("/out", "v")).unwrap();
    early.cancel();
    let outcome = generator.run().await.unwrap();
    assert!(matches!(
        outcome,
        BulkOutcome::Cancelled {
            processed: 0,
            written: 0,
            ..
        }
    ));
    assert!(generator.sink().writes().is_empty());

    // The cancel belongs to that run only.
    generator.acknowledge().unwrap();
    let again = generator.inputs().clone();
    generator.start(again).unwrap();
    assert_eq!(generator.run().await.unwrap().written(), 6);
}

#[tokio::test(start_paused = true)]
async fn zero_step_delay_still_pauses_between_steps() {
    let (stack, _, _) = two_layer_stack();
    let mut generator =
        BulkGenerator::new(stack, Recorder::default(), InMemorySink::new(), fast_opts());
    generator.start(BulkRequest::new("/out", "v")).unwrap();
    let began = tokio::time::Instant::now();
    assert_eq!(generator.run().await.unwrap().written(), 6);
    assert!(began.elapsed() >= MIN_STEP_DELAY * 5);
}

#[tokio::test]
async fn choose_destination_keeps_previous_folder_on_dismiss() {
    let (stack, _, _) = two_layer_stack();
    let mut generator =
        BulkGenerator::new(stack, Recorder::default(), InMemorySink::new(), fast_opts());
    assert!(
        generator
            .choose_destination(&mut FixedFolder::new("/picked"))
            .await
    );
    assert_eq!(generator.inputs().folder, std::path::PathBuf::from("/picked"));
    assert!(!generator.choose_destination(&mut FixedFolder(None)).await);
    assert_eq!(generator.inputs().folder, std::path::PathBuf::from("/picked"));
}
