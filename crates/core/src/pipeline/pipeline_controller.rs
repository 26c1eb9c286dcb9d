use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::config::config_error::ConfigError;
use crate::detection::binding_adapter::{Binding, DetectionBindingAdapter};
use crate::detection::domain::detection_unit::DetectionUnit;
use crate::detection::domain::execution_device::ExecutionDevice;
use crate::detection::domain::object_kind::ObjectKind;
use crate::pipeline::execution_slot::{ExecutionSlot, SlotGuard};
use crate::pipeline::metrics_recorder::{MetricsRecorder, Stage};
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_stats::{PipelineStats, StatsCounters};
use crate::pipeline::presentation_sink::{ExecutionState, Indicator, PresentationSink};
use crate::pipeline::result_filter::{ResultFilter, SelectionState};
use crate::shared::cancel_token::CancelToken;
use crate::shared::constants::NO_DEVICES_MESSAGE;
use crate::shared::frame::Frame;

/// Initial configuration of a [`PipelineController`].
#[derive(Clone, Debug, Default)]
pub struct ControllerConfig {
    /// Index into the unit's enumerated devices; `None` uses its default.
    pub device_index: Option<usize>,
    /// Accepted categories; `None` accepts every selectable kind.
    pub categories: Option<Vec<ObjectKind>>,
}

/// Outcome of offering a frame to the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Dropped,
}

/// State guarded by the reconfiguration lock. A run holds the lock from bind
/// through filtering; device, filter and source changes take it too.
struct PipelineState {
    binding: Binding,
}

struct RunJob {
    frame: Frame,
    cancel: CancelToken,
    _slot: SlotGuard,
}

struct Shared {
    adapter: DetectionBindingAdapter,
    state: Mutex<PipelineState>,
    filter: ResultFilter,
    metrics: MetricsRecorder,
    sink: Arc<dyn PresentationSink>,
    stats: StatsCounters,
}

/// Feeds frames through bind → evaluate → filter → render, one run at a time.
///
/// Layout: `on_frame_arrived → [slot] → run worker [bind, evaluate, filter] → sink`
///
/// Admission is drop-on-busy: a frame that arrives while a run holds the
/// execution slot is discarded, never queued. Admitted frames are handed to a
/// dedicated worker thread, so the caller (a source's delivery thread) never
/// waits on inference.
pub struct PipelineController {
    shared: Arc<Shared>,
    slot: ExecutionSlot,
    job_tx: Option<Sender<RunJob>>,
    worker: Option<JoinHandle<()>>,
}

impl PipelineController {
    /// Enumerates devices, creates the initial binding and starts the run
    /// worker. Fails with [`ConfigError::NoDevices`] when the unit cannot run
    /// on this machine.
    pub fn new(
        unit: Arc<dyn DetectionUnit>,
        sink: Arc<dyn PresentationSink>,
        config: ControllerConfig,
    ) -> Result<Self, ConfigError> {
        sink.update_indicator(Indicator::Initialization, ExecutionState::Start);
        sink.notify_status("Initializing skill...");

        let shared = match initialize(unit, sink.clone(), config) {
            Ok(shared) => Arc::new(shared),
            Err(e) => {
                if matches!(e, ConfigError::NoDevices) {
                    sink.notify_status(NO_DEVICES_MESSAGE);
                } else {
                    sink.notify_status(&e.to_string());
                }
                sink.update_indicator(Indicator::Initialization, ExecutionState::Error);
                return Err(e);
            }
        };

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<RunJob>();
        let worker = spawn_worker(shared.clone(), job_rx);

        sink.notify_status("Skill initialized. Select a media source to begin.");
        sink.update_indicator(Indicator::Initialization, ExecutionState::End);

        Ok(Self {
            shared,
            slot: ExecutionSlot::new(),
            job_tx: Some(job_tx),
            worker: Some(worker),
        })
    }

    /// Offers a frame from the active source. Never blocks on inference.
    ///
    /// Frames from a cancelled source and frames arriving while a run is in
    /// flight are dropped silently. If the run worker has stopped, the frame
    /// is counted as lost and the first loss is reported as a status.
    pub fn on_frame_arrived(&self, frame: Frame, cancel: &CancelToken) -> Admission {
        if cancel.is_cancelled() {
            self.shared.stats.dropped();
            return Admission::Dropped;
        }

        let Some(slot) = self.slot.try_acquire() else {
            log::trace!("Dropping frame {}: run in flight", frame.index());
            self.shared.stats.dropped();
            return Admission::Dropped;
        };

        let Some(job_tx) = self.job_tx.as_ref() else {
            self.shared.worker_lost(frame.index());
            return Admission::Dropped;
        };

        let index = frame.index();
        let job = RunJob {
            frame,
            cancel: cancel.clone(),
            _slot: slot,
        };
        if job_tx.send(job).is_err() {
            // The job (and its slot guard) came back and dropped.
            self.shared.worker_lost(index);
            return Admission::Dropped;
        }

        log::trace!("Admitted frame {index}");
        self.shared.stats.admitted();
        Admission::Admitted
    }

    /// Switches to the device at `index` in [`devices`](Self::devices).
    ///
    /// Waits for an in-flight run to finish before replacing the binding. On
    /// error the current binding stays active.
    pub fn set_device(&self, index: usize) -> Result<(), ConfigError> {
        let device = self.shared.adapter.device_at(index)?.clone();
        let mut state = self.shared.lock_state();
        let binding = self.shared.adapter.create_binding(Some(&device))?;
        log::info!("Execution device changed to {device}");
        state.binding = binding;
        Ok(())
    }

    /// Replaces the accepted category set. Waits for an in-flight run so the
    /// run that is filtering never sees a partial update.
    pub fn set_categories(&self, categories: impl IntoIterator<Item = ObjectKind>) -> SelectionState {
        let _state = self.shared.lock_state();
        self.shared.filter.set_categories(categories);
        self.shared.filter.selection_state()
    }

    /// Replaces the live binding with a fresh one on the current device.
    ///
    /// Called after a source swap so no source-specific state leaks into the
    /// next source's runs. Waits for an in-flight run; on error the previous
    /// binding stays live.
    pub fn rebind(&self) -> Result<(), ConfigError> {
        let mut state = self.shared.lock_state();
        let device = state.binding.device().clone();
        let fresh = self.shared.adapter.create_binding(Some(&device))?;
        let stale = std::mem::replace(&mut state.binding, fresh);
        log::debug!(
            "Replaced binding #{} with #{}",
            stale.id(),
            state.binding.id()
        );
        Ok(())
    }

    pub fn devices(&self) -> &[ExecutionDevice] {
        self.shared.adapter.devices()
    }

    pub fn current_device(&self) -> ExecutionDevice {
        self.shared.lock_state().binding.device().clone()
    }

    pub fn current_device_index(&self) -> Option<usize> {
        let device = self.current_device();
        self.shared.adapter.index_of(&device)
    }

    pub fn binding_id(&self) -> u64 {
        self.shared.lock_state().binding.id()
    }

    pub fn categories(&self) -> Vec<ObjectKind> {
        self.shared.filter.categories()
    }

    pub fn selection_state(&self) -> SelectionState {
        self.shared.filter.selection_state()
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.shared.metrics
    }

    pub fn stats(&self) -> PipelineStats {
        self.shared.stats.snapshot()
    }

    /// True while a run holds the execution slot.
    pub fn is_running(&self) -> bool {
        self.slot.is_held()
    }

    pub fn status(&self, message: &str) {
        self.shared.sink.notify_status(message);
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop after any in-flight run.
        self.job_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Run worker panicked");
            }
        }
    }
}

fn initialize(
    unit: Arc<dyn DetectionUnit>,
    sink: Arc<dyn PresentationSink>,
    config: ControllerConfig,
) -> Result<Shared, ConfigError> {
    let adapter = DetectionBindingAdapter::new(unit)?;
    let device = match config.device_index {
        Some(index) => Some(adapter.device_at(index)?.clone()),
        None => None,
    };
    let binding = adapter.create_binding(device.as_ref())?;
    log::info!("Detection binding created on {}", binding.device());

    let filter = match config.categories {
        Some(categories) => ResultFilter::new(categories),
        None => ResultFilter::accepting_all(),
    };

    Ok(Shared {
        adapter,
        state: Mutex::new(PipelineState { binding }),
        filter,
        metrics: MetricsRecorder::new(),
        sink,
        stats: StatsCounters::default(),
    })
}

fn spawn_worker(shared: Arc<Shared>, jobs: Receiver<RunJob>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for job in jobs {
            let RunJob {
                frame,
                cancel,
                _slot,
            } = job;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| shared.execute_run(frame, &cancel)))
                .unwrap_or_else(|payload| Err(PipelineError::Panicked(panic_message(&*payload))));
            // Reporting calls into the sink too; a panic there must not end the loop.
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| shared.finish_run(outcome))) {
                log::error!(
                    "Presentation sink panicked while reporting a run: {}",
                    panic_message(&*payload)
                );
            }
            // `_slot` drops here, after the outcome is reported.
        }
        log::debug!("Run worker stopped");
    })
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn execute_run(&self, frame: Frame, cancel: &CancelToken) -> Result<(), PipelineError> {
        for indicator in [Indicator::Binding, Indicator::Evaluating, Indicator::Done] {
            self.sink.update_indicator(indicator, ExecutionState::Reset);
        }

        let detections = {
            let mut state = self.lock_state();
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            self.sink.update_indicator(Indicator::Binding, ExecutionState::Start);
            self.sink.notify_status("Binding input image...");
            let started = Instant::now();
            let input = self.adapter.bind(&mut state.binding, &frame, cancel)?;
            self.metrics.record(Stage::Bind, started.elapsed());
            self.sink.update_indicator(Indicator::Binding, ExecutionState::End);

            self.sink
                .notify_status("Running skill over your binding object...");
            self.sink.update_indicator(Indicator::Evaluating, ExecutionState::Start);
            let started = Instant::now();
            let raw = self.adapter.evaluate(&mut state.binding, input, cancel)?;
            self.metrics.record(Stage::Evaluate, started.elapsed());
            self.sink.update_indicator(Indicator::Evaluating, ExecutionState::End);

            self.filter.apply(&raw)
        };

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.sink.notify_status("Displaying result...");
        self.sink.render(&frame, &detections)?;
        self.sink.update_timing_text(&self.metrics.summary());
        Ok(())
    }

    /// Counts a frame that could not reach the run worker and reports the
    /// dead pipeline the first time it happens.
    fn worker_lost(&self, index: usize) {
        log::error!("Run worker unavailable, dropping frame {index}");
        if self.stats.lost() == 1 {
            self.sink
                .notify_status("Pipeline stopped: frames can no longer be processed");
        }
    }

    fn finish_run(&self, outcome: Result<(), PipelineError>) {
        match outcome {
            Ok(()) => {
                self.stats.completed();
                self.sink.update_indicator(Indicator::Done, ExecutionState::End);
            }
            Err(e) if e.is_cancellation() => {
                log::debug!("Run cancelled by source teardown");
                self.stats.cancelled();
            }
            Err(e) => {
                log::warn!("Run failed: {e}");
                self.stats.failed();
                self.sink.notify_status(&e.to_string());
                self.sink.update_indicator(Indicator::Done, ExecutionState::Error);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
