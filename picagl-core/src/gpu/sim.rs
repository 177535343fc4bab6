// Software model of the GPU.
//
// Stands in for the hardware on development hosts: commands are executed
// against the shared memory domains on a worker thread, and the matching
// completion event is delivered to the attached queue afterwards, the same
// way the interrupt thread does on the device.

use super::backend::GpuBackend;
use super::command::{Command, FillWidth, GpuEvent, TransferFlags, TransferParams};
use super::queue::CommandQueue;
use crate::error::HalError;
use crate::memory::{lock_memory, DomainPtr, SharedMemory};
use crate::texture::tiling::{flip_rows, swizzle, Direction};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

enum Job {
    Execute(Command),
    Raise(GpuEvent),
}

type QueueLink = Arc<OnceLock<Weak<CommandQueue>>>;

/// Simulated GPU backend.
///
/// [`SimulatedGpu::manual`] only records what was dispatched; the test
/// drives completions with [`CommandQueue::handle_event`].
/// [`SimulatedGpu::spawn`] runs a worker thread that executes each command,
/// waits `latency` and then delivers its completion event.
pub struct SimulatedGpu {
    log: Mutex<Vec<Command>>,
    link: QueueLink,
    jobs: Mutex<Option<Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    cache_flushes: AtomicUsize,
    cache_invalidations: AtomicUsize,
}

impl SimulatedGpu {
    fn with_worker(jobs: Option<Sender<Job>>, worker: Option<JoinHandle<()>>, link: QueueLink) -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            link,
            jobs: Mutex::new(jobs),
            worker: Mutex::new(worker),
            cache_flushes: AtomicUsize::new(0),
            cache_invalidations: AtomicUsize::new(0),
        }
    }

    /// Recording-only backend with no worker thread.
    pub fn manual() -> Arc<Self> {
        Arc::new(Self::with_worker(None, None, Arc::new(OnceLock::new())))
    }

    /// Backend with a worker thread. When `memory` is given, fills,
    /// transfers and copies are carried out on it.
    pub fn spawn(memory: Option<SharedMemory>, latency: Duration) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel();
        let link: QueueLink = Arc::new(OnceLock::new());
        let worker_link = Arc::clone(&link);
        let worker = thread::Builder::new()
            .name("picagl-gpu".into())
            .spawn(move || run_worker(receiver, memory, latency, worker_link));
        match worker {
            Ok(handle) => Arc::new(Self::with_worker(Some(sender), Some(handle), link)),
            Err(err) => {
                log::error!("could not start GPU worker thread: {}", err);
                Arc::new(Self::with_worker(None, None, link))
            }
        }
    }

    /// Route completion events to `queue`.
    pub fn attach(&self, queue: &Arc<CommandQueue>) {
        if self.link.set(Arc::downgrade(queue)).is_err() {
            log::warn!("simulated GPU is already attached to a queue");
        }
    }

    /// Inject an event as if the hardware raised it.
    ///
    /// With a worker it is delivered after jobs already dispatched; without
    /// one it is handled on the calling thread.
    pub fn raise(&self, event: GpuEvent) {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        match jobs.as_ref() {
            Some(sender) => {
                if sender.send(Job::Raise(event)).is_err() {
                    log::warn!("GPU worker stopped, dropping {:?}", event);
                }
            }
            None => {
                drop(jobs);
                deliver(&self.link, event);
            }
        }
    }

    /// Every command dispatched so far, in dispatch order.
    pub fn dispatched(&self) -> Vec<Command> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cache_flushes(&self) -> usize {
        self.cache_flushes.load(Ordering::Relaxed)
    }

    pub fn cache_invalidations(&self) -> usize {
        self.cache_invalidations.load(Ordering::Relaxed)
    }
}

impl GpuBackend for SimulatedGpu {
    fn dispatch(&self, command: &Command) -> Result<(), HalError> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.clone());

        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = jobs.as_ref() {
            sender
                .send(Job::Execute(command.clone()))
                .map_err(|_| HalError::DispatchRejected {
                    command: command.name(),
                    reason: "GPU worker has stopped".into(),
                })?;
        }
        Ok(())
    }

    fn flush_data_cache(&self, _ptr: DomainPtr, _len: usize) -> bool {
        self.cache_flushes.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn invalidate_data_cache(&self, _ptr: DomainPtr, _len: usize) -> bool {
        self.cache_invalidations.fetch_add(1, Ordering::Relaxed);
        true
    }
}

impl Drop for SimulatedGpu {
    fn drop(&mut self) {
        // Closing the channel stops the worker.
        self.jobs
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let worker = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = worker {
            // The last queue reference can be released on the worker itself.
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                log::error!("GPU worker thread panicked");
            }
        }
    }
}

fn deliver(link: &QueueLink, event: GpuEvent) {
    match link.get().and_then(Weak::upgrade) {
        Some(queue) => queue.handle_event(event),
        None => log::warn!("no queue attached, dropping {:?}", event),
    }
}

fn run_worker(jobs: Receiver<Job>, memory: Option<SharedMemory>, latency: Duration, link: QueueLink) {
    log::debug!("GPU worker started");
    while let Ok(job) = jobs.recv() {
        match job {
            Job::Execute(command) => {
                if let Some(memory) = &memory {
                    execute(memory, &command);
                }
                if !latency.is_zero() {
                    thread::sleep(latency);
                }
                deliver(&link, command.completion_event());
            }
            Job::Raise(event) => deliver(&link, event),
        }
    }
    log::debug!("GPU worker stopped");
}

fn execute(memory: &SharedMemory, command: &Command) {
    let mut memory = lock_memory(memory);
    match command {
        Command::ProcessCommandList { list, flush } => {
            log::trace!("command list of {} words (flush: {})", list.len(), flush);
        }
        Command::MemoryFill {
            buffer,
            len,
            value,
            width,
            ..
        } => match memory
            .device_bytes_mut(*buffer)
            .and_then(|b| b.get_mut(..*len as usize))
        {
            Some(bytes) => fill(bytes, *value, *width),
            None => log::warn!("memory fill of {} bytes at {} out of range", len, buffer),
        },
        Command::DisplayTransfer(params) => {
            let src = memory
                .device_bytes(params.src)
                .and_then(|b| b.get(..params.surface_bytes()))
                .map(<[u8]>::to_vec);
            let result = src.and_then(|src| {
                let dst = memory
                    .device_bytes_mut(params.dst)?
                    .get_mut(..params.surface_bytes())?;
                transfer(params, &src, dst);
                Some(())
            });
            if result.is_none() {
                log::warn!("display transfer {} -> {} out of range", params.src, params.dst);
            }
        }
        Command::TextureCopy { src, dst, len } => {
            if !memory.device_copy(*src, *dst, *len as usize) {
                log::warn!("texture copy {} -> {} out of range", src, dst);
            }
        }
    }
}

fn fill(bytes: &mut [u8], value: u32, width: FillWidth) {
    let pattern = value.to_le_bytes();
    let pattern = &pattern[..width.bytes()];
    for chunk in bytes.chunks_mut(pattern.len()) {
        chunk.copy_from_slice(&pattern[..chunk.len()]);
    }
}

fn transfer(params: &TransferParams, src: &[u8], dst: &mut [u8]) {
    let flip = params.flags.contains(TransferFlags::FLIP_VERTICAL);
    let bpp = params.format.bytes_per_pixel();
    let (w, h) = (params.width, params.height);

    if params.flags.contains(TransferFlags::RAW_COPY) {
        dst.copy_from_slice(src);
        if flip {
            flip_rows(dst, w, h, bpp);
        }
        return;
    }

    // Flips happen on the row-major side.
    let result = if params.flags.contains(TransferFlags::OUT_TILED) {
        let mut linear = src.to_vec();
        if flip {
            flip_rows(&mut linear, w, h, bpp);
        }
        swizzle(&linear, dst, w, h, bpp, Direction::ToTiled)
    } else {
        swizzle(src, dst, w, h, bpp, Direction::ToLinear).map(|()| {
            if flip {
                flip_rows(dst, w, h, bpp);
            }
        })
    };
    if let Err(err) = result {
        log::warn!("display transfer rejected: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_repeats_pattern_and_truncates_tail() {
        let mut bytes = [0u8; 7];
        fill(&mut bytes, 0x00CC_BBAA, FillWidth::Bits24);
        assert_eq!(bytes, [0xAA, 0xBB, 0xCC, 0xAA, 0xBB, 0xCC, 0xAA]);
        fill(&mut bytes, 0x2211, FillWidth::Bits16);
        assert_eq!(bytes, [0x11, 0x22, 0x11, 0x22, 0x11, 0x22, 0x11]);
    }

    #[test]
    fn manual_backend_records_dispatches() {
        let gpu = SimulatedGpu::manual();
        gpu.dispatch(&Command::process_list(vec![1u32, 2], true))
            .unwrap();
        let log = gpu.dispatched();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].name(), "process-command-list");
    }
}
