//! Command Queue
//!
//! Bounded FIFO between the CPU submission path and the GPU, which runs one
//! job at a time.
//!
//! # Contexts
//! - Submission threads call [`CommandQueue::submit_async`] and
//!   [`CommandQueue::submit_sync`].
//! - The event context (interrupt thread) calls
//!   [`CommandQueue::handle_event`] whenever the GPU raises an event.
//!
//! Both touch the ring only under one lock, and only for the bounded
//! enqueue or pop-and-redispatch step. Callbacks and barrier releases run
//! after the lock is dropped, so a callback may submit more work. Blocking
//! waits go through a condition variable and never hold the lock.
//!
//! # Capacity
//! The ring holds [`QUEUE_CAPACITY`] entries. Submitting into a full ring is
//! a contract violation by the command-list builder and takes the fatal path.

use super::backend::GpuBackend;
use super::barrier::Barrier;
use super::command::{Command, GpuEvent};
use crate::fatal;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Maximum number of asynchronous commands in flight.
pub const QUEUE_CAPACITY: usize = 16;

/// Invoked once, after the command's completion event, outside the lock.
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

struct CommandEntry {
    command: Command,
    callback: Option<CompletionCallback>,
    barrier: Option<Arc<Barrier>>,
}

/// Fixed ring of entries. `head` is the entry currently on the GPU.
struct Ring {
    entries: [Option<CommandEntry>; QUEUE_CAPACITY],
    head: usize,
    pending: usize,
}

impl Ring {
    fn new() -> Self {
        Self {
            entries: std::array::from_fn(|_| None),
            head: 0,
            pending: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.pending == 0
    }

    fn is_full(&self) -> bool {
        self.pending == QUEUE_CAPACITY
    }

    fn push(&mut self, entry: CommandEntry) {
        debug_assert!(!self.is_full());
        let tail = (self.head + self.pending) % QUEUE_CAPACITY;
        self.entries[tail] = Some(entry);
        self.pending += 1;
    }

    fn head(&self) -> Option<&CommandEntry> {
        if self.is_empty() {
            return None;
        }
        self.entries[self.head].as_ref()
    }

    fn pop(&mut self) -> Option<CommandEntry> {
        if self.is_empty() {
            return None;
        }
        let entry = self.entries[self.head].take();
        self.head = (self.head + 1) % QUEUE_CAPACITY;
        self.pending -= 1;
        entry
    }
}

struct QueueState {
    ring: Ring,
    /// Event a synchronous submitter is waiting for.
    sync_event: Option<GpuEvent>,
    /// Bumped every time a synchronous command completes.
    sync_generation: u64,
}

impl QueueState {
    fn gpu_busy(&self) -> bool {
        !self.ring.is_empty() || self.sync_event.is_some()
    }
}

/// The GPU command queue. Construct once per context and share via `Arc`.
pub struct CommandQueue {
    backend: Arc<dyn GpuBackend>,
    state: Mutex<QueueState>,
    progress: Condvar,
}

impl CommandQueue {
    pub fn new(backend: Arc<dyn GpuBackend>) -> Arc<Self> {
        Arc::new(Self {
            backend,
            state: Mutex::new(QueueState {
                ring: Ring::new(),
                sync_event: None,
                sync_generation: 0,
            }),
            progress: Condvar::new(),
        })
    }

    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state
            .lock()
            .unwrap_or_else(|_| fatal!("command queue lock poisoned"))
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, QueueState>) -> MutexGuard<'a, QueueState> {
        self.progress
            .wait(guard)
            .unwrap_or_else(|_| fatal!("command queue lock poisoned"))
    }

    // Called with the lock held.
    fn dispatch(&self, command: &Command) {
        log::debug!("dispatching {}", command.name());
        if let Err(err) = self.backend.dispatch(command) {
            fatal!("GPU dispatch of {} failed: {}", command.name(), err);
        }
    }

    /// Run `command` and block until its completion event.
    ///
    /// Waits for queued asynchronous work to drain first. Must not be called
    /// from a completion callback, and the command's event must eventually
    /// fire: there is no timeout.
    pub fn submit_sync(&self, command: Command) {
        let event = command.completion_event();
        let mut state = self.lock();
        while state.gpu_busy() {
            state = self.wait(state);
        }

        state.sync_event = Some(event);
        let generation = state.sync_generation;
        self.dispatch(&command);

        while state.sync_generation == generation {
            state = self.wait(state);
        }
        log::trace!("{} completed synchronously", command.name());
    }

    /// Queue `command` and return immediately.
    ///
    /// If the GPU is idle the command starts right away. `callback` runs and
    /// `barrier` is released once its completion event arrives.
    pub fn submit_async(
        &self,
        command: Command,
        callback: Option<CompletionCallback>,
        barrier: Option<Arc<Barrier>>,
    ) {
        let mut state = self.lock();
        if state.ring.is_full() {
            drop(state);
            fatal!(
                "command queue overflow: {} commands already pending",
                QUEUE_CAPACITY
            );
        }
        if let Some(barrier) = &barrier {
            barrier.acquire();
        }

        if !state.gpu_busy() {
            self.dispatch(&command);
        }
        log::debug!(
            "queued {} ({} pending)",
            command.name(),
            state.ring.pending + 1
        );
        state.ring.push(CommandEntry {
            command,
            callback,
            barrier,
        });
    }

    /// Completion handler, called from the event context.
    ///
    /// VBlank events are ignored. Events that match nothing in flight are
    /// logged and dropped.
    pub fn handle_event(&self, event: GpuEvent) {
        if event.is_vblank() {
            return;
        }

        let completed = {
            let mut state = self.lock();
            if state.sync_event == Some(event) {
                state.sync_event = None;
                state.sync_generation += 1;
                if let Some(next) = state.ring.head() {
                    self.dispatch(&next.command);
                }
                self.progress.notify_all();
                return;
            }

            match state.ring.head() {
                Some(head) if head.command.completion_event() == event => {}
                Some(head) => {
                    log::warn!(
                        "ignoring {:?} while {} is in flight",
                        event,
                        head.command.name()
                    );
                    return;
                }
                None => {
                    log::warn!("spurious GPU event {:?} with an empty queue", event);
                    return;
                }
            }

            let entry = state.ring.pop();
            if let Some(next) = state.ring.head() {
                self.dispatch(&next.command);
            }
            self.progress.notify_all();
            entry
        };

        if let Some(entry) = completed {
            log::trace!("{} completed", entry.command.name());
            if let Some(barrier) = entry.barrier {
                barrier.release();
            }
            if let Some(callback) = entry.callback {
                callback();
            }
        }
    }

    /// Number of asynchronous entries not yet completed.
    pub fn pending(&self) -> usize {
        self.lock().ring.pending
    }

    pub fn is_idle(&self) -> bool {
        !self.lock().gpu_busy()
    }

    /// Block until every queued and synchronous command has completed.
    pub fn wait_idle(&self) {
        let mut state = self.lock();
        while state.gpu_busy() {
            state = self.wait(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HalError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        started: Mutex<Vec<&'static str>>,
    }

    impl GpuBackend for Recorder {
        fn dispatch(&self, command: &Command) -> Result<(), HalError> {
            self.started.lock().unwrap().push(command.name());
            Ok(())
        }
    }

    struct Rejecting;

    impl GpuBackend for Rejecting {
        fn dispatch(&self, command: &Command) -> Result<(), HalError> {
            Err(HalError::DispatchRejected {
                command: command.name(),
                reason: "busy".into(),
            })
        }
    }

    fn list() -> Command {
        Command::process_list(vec![0u32; 2], false)
    }

    #[test]
    fn ring_wraps_around() {
        let mut ring = Ring::new();
        for round in 0..3 {
            for _ in 0..QUEUE_CAPACITY {
                ring.push(CommandEntry {
                    command: list(),
                    callback: None,
                    barrier: None,
                });
            }
            assert!(ring.is_full(), "round {}", round);
            while ring.pop().is_some() {}
            assert!(ring.is_empty());
        }
    }

    #[test]
    fn first_submission_dispatches_immediately() {
        let backend = Arc::new(Recorder::default());
        let queue = CommandQueue::new(backend.clone());
        queue.submit_async(list(), None, None);
        queue.submit_async(list(), None, None);
        assert_eq!(backend.started.lock().unwrap().len(), 1);
        assert_eq!(queue.pending(), 2);

        queue.handle_event(GpuEvent::P3d);
        assert_eq!(backend.started.lock().unwrap().len(), 2);
        queue.handle_event(GpuEvent::P3d);
        assert!(queue.is_idle());
    }

    #[test]
    fn vblank_and_mismatched_events_change_nothing() {
        let backend = Arc::new(Recorder::default());
        let queue = CommandQueue::new(backend);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        queue.submit_async(
            list(),
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
            None,
        );

        queue.handle_event(GpuEvent::VBlank0);
        queue.handle_event(GpuEvent::VBlank1);
        queue.handle_event(GpuEvent::Ppf);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(queue.pending(), 1);

        queue.handle_event(GpuEvent::P3d);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        queue.handle_event(GpuEvent::P3d);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "command queue overflow")]
    fn overflow_is_fatal() {
        let queue = CommandQueue::new(Arc::new(Recorder::default()));
        for _ in 0..=QUEUE_CAPACITY {
            queue.submit_async(list(), None, None);
        }
    }

    #[test]
    #[should_panic(expected = "GPU dispatch of process-command-list failed")]
    fn rejected_dispatch_is_fatal() {
        let queue = CommandQueue::new(Arc::new(Rejecting));
        queue.submit_async(list(), None, None);
    }
}
