//! Timer-driven execution of a run's scheduled steps.

use super::plan::schedule_run;
use super::{RunId, RunState, ScheduledStep, StepKey, Timeline, TriggerEvent, TriggerOutcome};
use crate::cancellation::CancellationToken;
use crate::config::TrackerConfig;
use crate::core::TrackerEvent;
use crate::errors::ConfigError;
use crate::events::{EventSink, NoOpEventSink};
use crate::graph::{reference_pipeline, GraphReader, GraphSnapshot, SharedStageGraph, StageGraph};
use crate::observability::RunSpanAttributes;
use crate::render::VisualAdapter;
use crate::utils::fractional_millis;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, Instrument};

/// Drives a stage graph through its scripted timeline once per trigger.
///
/// The driver is the graph's only writer. A trigger received while idle starts
/// a run: steps due at the trigger instant are applied before
/// [`SimulationDriver::trigger`] returns, and the rest are applied by a tokio
/// task at their offsets. Any other trigger is ignored until
/// [`SimulationDriver::reset`] installs a fresh graph instance.
///
/// Dropping the driver cancels whatever is still pending.
pub struct SimulationDriver {
    template: StageGraph,
    graph: RwLock<SharedStageGraph>,
    timeline: Timeline,
    adapters: Vec<Arc<dyn VisualAdapter>>,
    sink: Arc<dyn EventSink>,
    state: Arc<watch::Sender<RunState>>,
    current: Mutex<Option<ActiveRun>>,
}

struct ActiveRun {
    run: Arc<Run>,
    handle: Option<JoinHandle<()>>,
}

impl SimulationDriver {
    /// Creates a driver whose timeline comes from `config`.
    #[must_use]
    pub fn new(graph: StageGraph, config: &TrackerConfig) -> Self {
        let timeline = Timeline::from_config(config, graph.transition_count());
        Self::assemble(graph, timeline)
    }

    /// Creates a driver with an explicit timeline.
    ///
    /// # Errors
    ///
    /// Returns an error unless the timeline has exactly one offset per step.
    pub fn with_timeline(graph: StageGraph, timeline: Timeline) -> Result<Self, ConfigError> {
        let expected = graph.transition_count();
        if timeline.len() != expected {
            return Err(ConfigError::invalid(
                "timeline",
                format!("expected {expected} offsets, got {}", timeline.len()),
            ));
        }
        Ok(Self::assemble(graph, timeline))
    }

    /// Creates a driver for the reference pipeline on the reference timeline.
    #[must_use]
    pub fn reference() -> Self {
        Self::assemble(reference_pipeline(), Timeline::reference())
    }

    fn assemble(graph: StageGraph, timeline: Timeline) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            graph: RwLock::new(SharedStageGraph::new(graph.clone())),
            template: graph,
            timeline,
            adapters: Vec::new(),
            sink: Arc::new(NoOpEventSink),
            state: Arc::new(state),
            current: Mutex::new(None),
        }
    }

    /// Adds a visual adapter.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn VisualAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the timeline.
    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Returns a read-only view of the current graph instance.
    ///
    /// Only the driver writes to its graph.
    #[must_use]
    pub fn graph(&self) -> GraphReader {
        self.graph.read().reader()
    }

    /// Takes a snapshot of the current graph instance.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.read().snapshot()
    }

    /// Returns the current run state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state.borrow().clone()
    }

    /// Subscribes to run state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Returns the keys of steps not yet applied, in firing order.
    #[must_use]
    pub fn pending_steps(&self) -> Vec<StepKey> {
        self.current
            .lock()
            .as_ref()
            .map(|active| active.run.pending.lock().iter().map(|s| s.key).collect())
            .unwrap_or_default()
    }

    /// Returns the keys of steps already applied, in firing order.
    #[must_use]
    pub fn applied_steps(&self) -> Vec<StepKey> {
        self.current
            .lock()
            .as_ref()
            .map(|active| active.run.applied.lock().clone())
            .unwrap_or_default()
    }

    /// Starts a run if the driver is idle.
    ///
    /// Must be called from within a tokio runtime. Adapters are rendered after
    /// the driver's bookkeeping lock is released, so they may call back into
    /// the driver.
    pub fn trigger(&self, event: TriggerEvent) -> TriggerOutcome {
        let (run, span) = {
            let mut current = self.current.lock();

            let state = self.state();
            if state != RunState::Idle {
                info!(state = %state, source = %event.source, "Ignoring trigger; driver is not idle");
                self.sink.try_emit(TrackerEvent::trigger_ignored(state.name()));
                return TriggerOutcome::Ignored(state);
            }

            let run_id = RunId::new();
            let graph = self.graph.read().clone();
            let steps = graph.read(|g| schedule_run(run_id, g, &self.timeline));
            let graph_name = graph.read(|g| g.name().to_string());

            let run = Arc::new(Run {
                id: run_id,
                graph_name,
                graph,
                token: CancellationToken::new(),
                pending: Mutex::new(steps.into()),
                applied: Mutex::new(Vec::new()),
                adapters: self.adapters.clone(),
                sink: self.sink.clone(),
                state: self.state.clone(),
                started: Instant::now(),
            });
            let span = RunSpanAttributes::for_run(run_id, &run.graph_name, &event).span();

            self.state.send_replace(RunState::Running { run_id });
            let step_count = run.pending.lock().len();
            info!(
                parent: &span,
                run_id = %run_id,
                graph = %run.graph_name,
                steps = step_count,
                source = %event.source,
                reference = ?event.reference,
                "Run started"
            );
            self.sink
                .try_emit(TrackerEvent::run_started(&run_id.to_string(), &run.graph_name, step_count));

            *current = Some(ActiveRun {
                run: run.clone(),
                handle: None,
            });
            (run, span)
        };

        let _entered = span.enter();
        run.render(&run.graph.snapshot());
        run.apply_due(Duration::ZERO);
        run.complete_if_exhausted();

        if run.next_offset().is_some() {
            let handle = tokio::spawn(drive(run.clone()).instrument(span.clone()));
            let abort = handle.abort_handle();
            run.token.on_cancel(move |_| abort.abort());

            let mut current = self.current.lock();
            match current.as_mut() {
                Some(active) if Arc::ptr_eq(&active.run, &run) => active.handle = Some(handle),
                _ => handle.abort(),
            }
        }

        TriggerOutcome::Started(run.id)
    }

    /// Cancels the current run, dropping its pending steps.
    ///
    /// Returns true if a running run was cancelled.
    pub fn cancel(&self, reason: &str) -> bool {
        let run = self.current.lock().as_ref().map(|active| active.run.clone());
        run.is_some_and(|run| run.cancel(reason))
    }

    /// Discards the current run and graph instance and returns to idle.
    pub fn reset(&self) {
        let outgoing = self.current.lock().take();
        if let Some(active) = outgoing {
            active.shutdown("reset");
        }

        let _current = self.current.lock();
        *self.graph.write() = SharedStageGraph::new(self.template.clone());
        self.state.send_replace(RunState::Idle);
        debug!("Driver reset with a fresh graph instance");
    }

    /// Waits until the current run stops running and returns its final state.
    ///
    /// Returns immediately when no run is in progress.
    pub async fn wait(&self) -> RunState {
        let mut rx = self.state.subscribe();
        let result = rx.wait_for(|s| !s.is_running()).await.map(|s| (*s).clone());
        result.unwrap_or_else(|_| self.state())
    }
}

impl Drop for SimulationDriver {
    fn drop(&mut self) {
        if let Some(active) = self.current.get_mut().take() {
            active.shutdown("session closed");
        }
    }
}

impl std::fmt::Debug for SimulationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationDriver")
            .field("graph", &self.template.name())
            .field("timeline", &self.timeline)
            .field("state", &self.state())
            .field("adapters", &self.adapters.len())
            .finish_non_exhaustive()
    }
}

impl ActiveRun {
    fn shutdown(self, reason: &str) {
        self.run.cancel(reason);
        if let Some(handle) = self.handle {
            handle.abort();
        }
    }
}

/// Shared state of one run, owned jointly by the driver and the run task.
struct Run {
    id: RunId,
    graph_name: String,
    graph: SharedStageGraph,
    token: CancellationToken,
    pending: Mutex<VecDeque<ScheduledStep>>,
    applied: Mutex<Vec<StepKey>>,
    adapters: Vec<Arc<dyn VisualAdapter>>,
    sink: Arc<dyn EventSink>,
    state: Arc<watch::Sender<RunState>>,
    started: Instant,
}

/// What a single step attempt produced.
enum StepOutcome {
    Applied {
        step: ScheduledStep,
        snapshot: GraphSnapshot,
        completed: bool,
    },
    Failed(String),
    Stopped,
}

impl Run {
    fn next_offset(&self) -> Option<Duration> {
        self.pending.lock().front().map(|s| s.key.offset)
    }

    fn is_current(&self, state: &RunState) -> bool {
        *state == RunState::Running { run_id: self.id }
    }

    /// Moves the shared state out of `Running` if it still belongs to this run.
    fn transition(&self, next: RunState) -> bool {
        self.state.send_if_modified(|state| {
            if self.is_current(state) {
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// Applies every pending step whose offset is at most `elapsed`.
    fn apply_due(&self, elapsed: Duration) {
        while self.next_offset().is_some_and(|offset| offset <= elapsed) {
            if !self.apply_next() {
                return;
            }
        }
    }

    /// Applies the next pending step. Returns false once the run has stopped.
    ///
    /// The cancellation check, the write and the completion transition all
    /// happen under the graph's write lock, the same lock [`Run::cancel`]
    /// takes, so a step can never land after a cancel has returned.
    fn apply_next(&self) -> bool {
        let outcome = self.graph.write(|graph| self.step_locked(graph));
        self.report(outcome)
    }

    /// Pops and applies the next step. The caller holds the graph lock.
    fn step_locked(&self, graph: &mut StageGraph) -> StepOutcome {
        if self.token.is_cancelled() {
            return StepOutcome::Stopped;
        }
        let Some(step) = self.pending.lock().pop_front() else {
            return StepOutcome::Stopped;
        };
        match graph.apply(&step.mutations) {
            Ok(()) => {
                self.applied.lock().push(step.key);
                let completed = self.pending.lock().is_empty()
                    && self.transition(RunState::Done { run_id: self.id });
                StepOutcome::Applied {
                    step,
                    snapshot: graph.snapshot(),
                    completed,
                }
            }
            Err(e) => {
                let message = e.to_string();
                self.pending.lock().clear();
                self.token.cancel(message.clone());
                self.transition(RunState::Failed {
                    run_id: self.id,
                    error: message.clone(),
                });
                StepOutcome::Failed(message)
            }
        }
    }

    /// Publishes a step outcome once the graph lock is released. Returns true
    /// while the run can continue.
    fn report(&self, outcome: StepOutcome) -> bool {
        match outcome {
            StepOutcome::Applied {
                step,
                snapshot,
                completed,
            } => {
                debug!(
                    run_id = %self.id,
                    step = step.index(),
                    offset_ms = step.offset_ms(),
                    revision = snapshot.revision,
                    "Step applied"
                );
                self.render(&snapshot);
                self.sink.try_emit(TrackerEvent::step_applied(
                    &self.id.to_string(),
                    step.index(),
                    step.offset_ms(),
                    snapshot.revision,
                ));
                if completed {
                    self.report_completed();
                }
                !completed
            }
            StepOutcome::Failed(message) => {
                error!(run_id = %self.id, error = %message, "Run aborted by unresolvable step");
                self.sink
                    .try_emit(TrackerEvent::run_failed(&self.id.to_string(), &message));
                false
            }
            StepOutcome::Stopped => false,
        }
    }

    /// Marks a run with nothing left to apply as done.
    fn complete_if_exhausted(&self) {
        let completed = self.graph.write(|_| {
            !self.token.is_cancelled()
                && self.pending.lock().is_empty()
                && self.transition(RunState::Done { run_id: self.id })
        });
        if completed {
            self.report_completed();
        }
    }

    fn report_completed(&self) {
        let duration_ms = fractional_millis(self.started.elapsed());
        info!(run_id = %self.id, graph = %self.graph_name, duration_ms, "Run completed");
        self.sink
            .try_emit(TrackerEvent::run_completed(&self.id.to_string(), duration_ms));
    }

    /// Cancels the run if it is still running. Returns true if it was.
    ///
    /// Steps whose offset has already passed are applied first, whether or not
    /// the timer task has got to them yet. Only steps still in the future are
    /// dropped.
    fn cancel(&self, reason: &str) -> bool {
        let (due, dropped) = self.graph.write(|graph| {
            let mut due = Vec::new();
            if !self.is_current(&self.state.borrow()) {
                return (due, None);
            }
            let elapsed = self.started.elapsed();
            while self.next_offset().is_some_and(|offset| offset <= elapsed) {
                let outcome = self.step_locked(graph);
                let settled = !matches!(outcome, StepOutcome::Applied { completed: false, .. });
                due.push(outcome);
                if settled {
                    break;
                }
            }
            if !self.is_current(&self.state.borrow()) {
                return (due, None);
            }

            self.token.cancel(reason);
            let dropped = std::mem::take(&mut *self.pending.lock()).len();
            self.transition(RunState::Cancelled {
                run_id: self.id,
                reason: reason.to_string(),
            });
            (due, Some(dropped))
        });

        for outcome in due {
            self.report(outcome);
        }
        let Some(dropped) = dropped else {
            return false;
        };
        info!(run_id = %self.id, reason, dropped_steps = dropped, "Run cancelled");
        self.sink
            .try_emit(TrackerEvent::run_cancelled(&self.id.to_string(), reason, dropped));
        true
    }

    fn render(&self, snapshot: &GraphSnapshot) {
        for adapter in &self.adapters {
            adapter.render(snapshot);
        }
    }
}

/// Sleeps until each pending step's deadline and applies it.
async fn drive(run: Arc<Run>) {
    while let Some(offset) = run.next_offset() {
        tokio::select! {
            biased;
            () = run.token.cancelled() => return,
            () = tokio::time::sleep_until(run.started + offset) => {}
        }
        if !run.apply_next() {
            return;
        }
    }
}
