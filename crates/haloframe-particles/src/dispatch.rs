//! Worker pool, pass coordination and completion events.
//!
//! A dispatch is a [`Plan`]: an ordered list of passes. A coordinator thread
//! splits each pass into chunks, sends them to the persistent worker pool
//! through a crossbeam task channel, and waits for every chunk's reply before
//! starting the next pass. The caller holds an [`Event`] for the whole plan.
//!
//! Worker panics are caught, reported through the reply channel, and
//! re-raised on the thread that waits on the event. Workers survive them.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use haloframe_core::{ExchangeType, SupercellCoord};
use haloframe_heap::HeapError;

use crate::buffer::ParticlesBuffer;
use crate::config::ConfigError;
use crate::error::ParticleError;
use crate::kernels::{guard, KernelOp, SupercellKernel};
use crate::metrics::{DispatchReport, KernelCounts, KernelKind};

// ── Tasks ──────────────────────────────────────────────────────────

/// A work item plus where to send its result.
pub(crate) struct KernelTask {
    op: KernelOp,
    reply: Sender<TaskResult>,
}

/// Why a work item did not complete.
#[derive(Debug)]
pub(crate) enum TaskFailure {
    Heap(HeapError),
    Panic(String),
}

pub(crate) type TaskResult = Result<KernelCounts, TaskFailure>;

/// What a dispatch runs.
pub(crate) enum Plan {
    /// Per-supercell kernel over strictly sequential passes.
    Passes {
        kernel: SupercellKernel,
        passes: Vec<Vec<SupercellCoord>>,
    },
    /// Drain and insert the incoming stage of one exchange buffer.
    Insert(ExchangeType),
}

impl Plan {
    fn kind(&self) -> KernelKind {
        match self {
            Self::Passes { kernel, .. } => kernel.kind(),
            Self::Insert(_) => KernelKind::Insert,
        }
    }

    fn direction(&self) -> Option<ExchangeType> {
        match self {
            Self::Passes { kernel, .. } => kernel.direction(),
            Self::Insert(d) => Some(*d),
        }
    }
}

/// How a plan ended, before it reaches the caller.
enum Failure {
    Error(ParticleError),
    Panic(String),
}

type Outcome = Result<DispatchReport, Failure>;

// ── WorkerPool ─────────────────────────────────────────────────────

/// Persistent kernel threads fed from one task channel.
///
/// Dropping the pool closes the channel and joins every worker.
pub(crate) struct WorkerPool {
    tasks: Option<Sender<KernelTask>>,
    threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(buffer: &Arc<ParticlesBuffer>, workers: usize) -> Result<Self, ConfigError> {
        let (task_tx, task_rx) = crossbeam_channel::unbounded();
        let mut threads = Vec::with_capacity(workers);
        for i in 0..workers {
            let rx = task_rx.clone();
            let buffer = Arc::clone(buffer);
            let handle = thread::Builder::new()
                .name(format!("haloframe-worker-{i}"))
                .spawn(move || worker_loop(rx, buffer))
                .map_err(|e| ConfigError::ThreadSpawnFailed {
                    reason: format!("worker {i}: {e}"),
                })?;
            threads.push(handle);
        }
        Ok(Self {
            tasks: Some(task_tx),
            threads,
        })
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn sender(&self) -> Option<Sender<KernelTask>> {
        self.tasks.clone()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.tasks = None;
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Runs until every task sender is dropped.
fn worker_loop(tasks: Receiver<KernelTask>, buffer: Arc<ParticlesBuffer>) {
    while let Ok(KernelTask { op, reply }) = tasks.recv() {
        let result = match panic::catch_unwind(AssertUnwindSafe(|| op.execute(&buffer))) {
            Ok(Ok(counts)) => Ok(counts),
            Ok(Err(e)) => Err(TaskFailure::Heap(e)),
            Err(payload) => Err(TaskFailure::Panic(panic_message(payload.as_ref()))),
        };
        let _ = reply.send(result);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ── Dispatcher ─────────────────────────────────────────────────────

/// Everything a coordinator thread needs. Holds a task sender only while a
/// plan runs, so dropping the pool never waits on an abandoned event.
pub(crate) struct Dispatcher {
    tasks: Sender<KernelTask>,
    workers: usize,
    buffer: Arc<ParticlesBuffer>,
}

impl Dispatcher {
    pub fn new(tasks: Sender<KernelTask>, workers: usize, buffer: Arc<ParticlesBuffer>) -> Self {
        Self {
            tasks,
            workers,
            buffer,
        }
    }

    /// Start `plan` on a coordinator thread.
    ///
    /// # Panics
    ///
    /// Panics if a previous event of the same buffer is still outstanding.
    pub fn submit(self, plan: Plan) -> Event {
        let buffer = Arc::clone(&self.buffer);
        assert!(
            buffer.begin_dispatch(),
            "dispatch issued while a previous event is still outstanding; wait on it first"
        );
        if buffer.is_poisoned() {
            buffer.end_dispatch();
            return Event::ready(Err(ParticleError::Poisoned));
        }
        log::debug!(
            "dispatch {}{}",
            plan.kind(),
            plan.direction().map(|d| format!("[{d}]")).unwrap_or_default()
        );
        match thread::Builder::new()
            .name("haloframe-dispatch".into())
            .spawn(move || self.run(plan))
        {
            Ok(handle) => Event {
                state: Some(EventState::Running(handle)),
                buffer: Some(buffer),
            },
            Err(e) => {
                buffer.end_dispatch();
                Event::ready(Err(ParticleError::DispatchFailed {
                    reason: e.to_string(),
                }))
            }
        }
    }

    fn run(&self, plan: Plan) -> Outcome {
        let start = Instant::now();
        let mut report = DispatchReport::new(plan.kind(), plan.direction());
        match plan {
            Plan::Passes { kernel, passes } => {
                for (n, pass) in passes.into_iter().enumerate() {
                    if pass.is_empty() {
                        continue;
                    }
                    log::trace!("{} pass {n}: {} supercells", kernel.kind(), pass.len());
                    let ops = chunks(pass, self.workers)
                        .map(|chunk| kernel.op(chunk))
                        .collect();
                    self.run_pass(ops, &mut report)?;
                }
            }
            Plan::Insert(direction) => {
                let groups = guard::stage_inserts(&self.buffer, direction);
                if !groups.is_empty() {
                    log::trace!("insert[{direction}]: {} supercells", groups.len());
                    let ops = chunks(groups, self.workers)
                        .map(|chunk| KernelOp::Insert(direction, chunk))
                        .collect();
                    self.run_pass(ops, &mut report)?;
                }
            }
        }
        report.elapsed_us = start.elapsed().as_micros() as u64;
        log::debug!("{report}");
        Ok(report)
    }

    fn run_pass(&self, ops: Vec<KernelOp>, report: &mut DispatchReport) -> Result<(), Failure> {
        let (reply_tx, reply_rx) = crossbeam_channel::unbounded();
        let sent = ops.len();
        for op in ops {
            let task = KernelTask {
                op,
                reply: reply_tx.clone(),
            };
            if self.tasks.send(task).is_err() {
                return Err(Failure::Error(ParticleError::WorkerLost));
            }
        }
        drop(reply_tx);

        let mut heap_error = None;
        let mut panicked = None;
        for _ in 0..sent {
            match reply_rx.recv() {
                Ok(Ok(counts)) => report.absorb(&counts),
                Ok(Err(TaskFailure::Heap(e))) => {
                    heap_error.get_or_insert(e);
                }
                Ok(Err(TaskFailure::Panic(msg))) => {
                    panicked.get_or_insert(msg);
                }
                Err(_) => return Err(Failure::Error(ParticleError::WorkerLost)),
            }
        }
        report.passes += 1;

        if let Some(msg) = panicked {
            return Err(Failure::Panic(msg));
        }
        if let Some(e) = heap_error {
            if self.buffer.poison() {
                log::warn!("{} aborted, particle buffer poisoned: {e}", report.kernel);
            }
            return Err(Failure::Error(ParticleError::Heap(e)));
        }
        Ok(())
    }
}

/// Split a pass into roughly `4 * workers` chunks.
fn chunks<T>(items: Vec<T>, workers: usize) -> impl Iterator<Item = Vec<T>> {
    let size = (items.len() / (workers.max(1) * 4)).max(1);
    let mut items = items.into_iter().peekable();
    std::iter::from_fn(move || {
        items.peek()?;
        Some(items.by_ref().take(size).collect())
    })
}

// ── Event ──────────────────────────────────────────────────────────

enum EventState {
    Ready(Result<DispatchReport, ParticleError>),
    Running(JoinHandle<Outcome>),
}

/// Completion handle of one dispatch.
///
/// [`wait`](Self::wait) is the only blocking point. Dropping an event
/// without waiting blocks until the dispatch completes and discards its
/// result. A panic inside a kernel is re-raised by `wait` (or by drop).
#[must_use = "dispatches run asynchronously; wait on the event"]
pub struct Event {
    state: Option<EventState>,
    buffer: Option<Arc<ParticlesBuffer>>,
}

impl Event {
    pub(crate) fn ready(result: Result<DispatchReport, ParticleError>) -> Self {
        Self {
            state: Some(EventState::Ready(result)),
            buffer: None,
        }
    }

    /// Whether `wait` would return without blocking.
    pub fn is_complete(&self) -> bool {
        match &self.state {
            Some(EventState::Running(handle)) => handle.is_finished(),
            _ => true,
        }
    }

    /// Block until the dispatch completes.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from a kernel or from the coordinator.
    pub fn wait(mut self) -> Result<DispatchReport, ParticleError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<DispatchReport, ParticleError> {
        let outcome = match self.state.take() {
            None => return Err(ParticleError::WorkerLost),
            Some(EventState::Ready(result)) => return result,
            Some(EventState::Running(handle)) => handle.join(),
        };
        self.release();
        match outcome {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(Failure::Error(e))) => Err(e),
            Ok(Err(Failure::Panic(msg))) => panic!("kernel panicked: {msg}"),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.end_dispatch();
        }
    }
}

impl Drop for Event {
    fn drop(&mut self) {
        if self.state.is_none() {
            return;
        }
        if thread::panicking() {
            if let Some(EventState::Running(handle)) = self.state.take() {
                let _ = handle.join();
            }
            self.release();
            return;
        }
        if let Err(e) = self.finish() {
            log::warn!("dropped event completed with error: {e}");
        }
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("complete", &self.is_complete())
            .finish()
    }
}
