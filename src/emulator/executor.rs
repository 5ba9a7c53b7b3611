use super::basics::Address;
use super::engine::StepEngine;
use super::framebuffer::{FrameSlot, Framebuffer};
use super::machine::LoadError;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use std::{
    ops::Range,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

const WORKER_NAME: &str = "corn64-step";
const JOIN_POLL: Duration = Duration::from_millis(1);

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum LifecycleState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Status notifications from the worker. Consumers poll for them; nothing
/// in the worker ever waits on a reader.
#[derive(PartialEq, Clone, Debug)]
pub enum EngineEvent {
    Started,
    Stopped,
    Faulted(String),
}

/// Lifecycle plus the generation of the worker that owns it. Only the
/// current generation may move the lifecycle or report events.
struct Control {
    state: LifecycleState,
    generation: u64,
}

struct Shared {
    engine: Mutex<StepEngine>,
    frames: Arc<FrameSlot>,
    control: Mutex<Control>,
    loaded: AtomicBool,
    events: Sender<EngineEvent>,
    tick_interval: Duration,
}

struct Worker {
    handle: JoinHandle<()>,
    stop: Sender<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Runs a `StepEngine` on a dedicated thread at a fixed tick rate and
/// exposes the lifecycle to the UI. At most one worker is in its loop at any
/// time; a replaced worker only finishes the step it is in and then exits
/// without touching the lifecycle.
pub struct Executor {
    shared: Arc<Shared>,
    worker: Option<Worker>,
    retired: Vec<JoinHandle<()>>,
    events: Receiver<EngineEvent>,
    shutdown_timeout: Duration,
}

impl Executor {
    pub fn new(engine: StepEngine, tick_interval: Duration, shutdown_timeout: Duration) -> Executor {
        let (events_tx, events_rx) = channel::unbounded();
        let frames = engine.frames();
        let loaded = engine.is_loaded();
        Executor {
            shared: Arc::new(Shared {
                engine: Mutex::new(engine),
                frames,
                control: Mutex::new(Control {
                    state: LifecycleState::Idle,
                    generation: 0,
                }),
                loaded: AtomicBool::new(loaded),
                events: events_tx,
                tick_interval,
            }),
            worker: None,
            retired: Vec::new(),
            events: events_rx,
            shutdown_timeout,
        }
    }

    pub fn lifecycle(&self) -> LifecycleState {
        lock(&self.shared.control).state
    }

    pub fn load_image(&self, image: &[u8]) -> Result<(), LoadError> {
        lock(&self.shared.engine).load_image(image)?;
        self.shared.loaded.store(true, Ordering::Release);
        Ok(())
    }

    /// Whether an image was loaded. Never waits for a step in progress.
    pub fn is_loaded(&self) -> bool {
        self.shared.loaded.load(Ordering::Acquire)
    }

    pub fn program_counter(&self) -> Address {
        lock(&self.shared.engine).program_counter()
    }

    pub fn steps(&self) -> u64 {
        lock(&self.shared.engine).steps()
    }

    pub fn read_memory(&self, range: Range<usize>) -> Option<Vec<u8>> {
        lock(&self.shared.engine).machine().read_memory(range)
    }

    /// Latest published frame. Never waits for a step in progress.
    pub fn snapshot_framebuffer(&self) -> Arc<Framebuffer> {
        self.shared.frames.snapshot()
    }

    /// Takes all pending worker events without blocking.
    pub fn drain_events(&self) -> Vec<EngineEvent> {
        self.events.try_iter().collect()
    }

    /// Starts the worker loop. Returns `false` without doing anything if the
    /// loop is already running. Never waits for a previous worker: one that
    /// is still winding down is retired and exits after the step it is in.
    pub fn start(&mut self) -> bool {
        let (stop_tx, stop_rx) = channel::bounded(1);
        let generation = {
            let mut control = lock(&self.shared.control);
            if control.state == LifecycleState::Running {
                return false;
            }
            control.state = LifecycleState::Running;
            control.generation += 1;
            control.generation
        };
        self.retire_worker();
        self.reap_retired();

        let _ = self.shared.events.send(EngineEvent::Started);
        let shared = self.shared.clone();
        let spawned = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || run(shared, generation, stop_rx));
        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker {
                    handle,
                    stop: stop_tx,
                });
                info!("Worker {} started", generation);
                true
            }
            Err(e) => {
                error!("Could not spawn worker thread: {}", e);
                lock(&self.shared.control).state = LifecycleState::Stopped;
                let _ = self
                    .shared
                    .events
                    .send(EngineEvent::Faulted(format!("could not spawn worker: {}", e)));
                false
            }
        }
    }

    /// Asks the worker to leave its loop and returns immediately. Does
    /// nothing unless the loop is running.
    pub fn stop(&mut self) {
        {
            let mut control = lock(&self.shared.control);
            if control.state != LifecycleState::Running {
                return;
            }
            control.state = LifecycleState::Stopping;
        }
        if let Some(worker) = &self.worker {
            // wakes the worker if it is between ticks
            let _ = worker.stop.try_send(());
        }
        info!("Worker stop requested");
    }

    /// Stops the worker and waits up to `timeout` for every worker thread to
    /// exit. Threads that do not make it in time are abandoned. Returns
    /// whether all of them were joined.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        self.stop();
        self.retire_worker();
        let deadline = Instant::now() + timeout;
        loop {
            self.reap_retired();
            if self.retired.is_empty() {
                return true;
            }
            if Instant::now() >= deadline {
                warn!(
                    "{} worker(s) did not exit within {:?}, abandoning them",
                    self.retired.len(),
                    timeout
                );
                return false;
            }
            thread::sleep(JOIN_POLL);
        }
    }

    fn retire_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop.try_send(());
            self.retired.push(worker.handle);
        }
    }

    /// Joins retired workers that have already exited; never blocks.
    fn reap_retired(&mut self) {
        let (finished, running): (Vec<_>, Vec<_>) = self
            .retired
            .drain(..)
            .partition(|handle| handle.is_finished());
        self.retired = running;
        for handle in finished {
            join(handle);
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        let timeout = self.shutdown_timeout;
        self.shutdown(timeout);
    }
}

fn join(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        error!("Worker thread panicked");
    }
}

/// Marks the loop as stopped however the worker leaves it, unwinding
/// included. A worker that has been replaced leaves no trace.
struct ExitGuard {
    shared: Arc<Shared>,
    generation: u64,
    fault: Option<String>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        let mut control = lock(&self.shared.control);
        if control.generation != self.generation {
            debug!("Retired worker {} exiting", self.generation);
            return;
        }
        let event = if thread::panicking() {
            EngineEvent::Faulted(String::from("worker panicked"))
        } else if let Some(fault) = self.fault.take() {
            EngineEvent::Faulted(fault)
        } else {
            EngineEvent::Stopped
        };
        // queued before Stopped can be observed
        let _ = self.shared.events.send(event);
        control.state = LifecycleState::Stopped;
    }
}

fn is_current(shared: &Shared, generation: u64) -> bool {
    let control = lock(&shared.control);
    control.generation == generation && control.state == LifecycleState::Running
}

/// The worker loop: step, then wait out the tick interval, until the
/// lifecycle leaves `Running`, the worker is replaced, or the stop channel
/// fires.
fn run(shared: Arc<Shared>, generation: u64, stop: Receiver<()>) {
    let mut guard = ExitGuard {
        shared: shared.clone(),
        generation,
        fault: None,
    };
    loop {
        if !is_current(&shared, generation) {
            break;
        }
        let result = lock(&shared.engine).step();
        if let Err(e) = result {
            error!("Step failed, stopping worker: {}", e);
            guard.fault = Some(e.to_string());
            break;
        }
        match stop.recv_timeout(shared.tick_interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    info!("Worker {} exiting", generation);
}
