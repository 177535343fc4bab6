//! Test Utilities
//!
//! Shared setup for the queue and tiling scenarios.

#![allow(dead_code)]

use picagl_core::gpu::{Command, CommandQueue, CompletionCallback, SimulatedGpu};
use picagl_core::memory::{lock_memory, Domain, DomainPtr, MemoryConfig, MemorySystem, SharedMemory};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Queue wired to a recording-only GPU. Completions are driven by hand.
pub fn manual_queue() -> (Arc<CommandQueue>, Arc<SimulatedGpu>) {
    let gpu = SimulatedGpu::manual();
    let queue = CommandQueue::new(gpu.clone());
    gpu.attach(&queue);
    (queue, gpu)
}

/// Queue wired to a threaded GPU executing against fresh memory.
pub fn simulated_queue(latency: Duration) -> (Arc<CommandQueue>, Arc<SimulatedGpu>, SharedMemory) {
    let memory = MemorySystem::new(&MemoryConfig::default()).into_shared();
    let gpu = SimulatedGpu::spawn(Some(Arc::clone(&memory)), latency);
    let queue = CommandQueue::new(gpu.clone());
    gpu.attach(&queue);
    (queue, gpu, memory)
}

pub fn list(tag: u32) -> Command {
    Command::process_list(vec![tag, 0, 0, 0], false)
}

/// Callback appending `id` to `log`.
pub fn record(log: &Arc<Mutex<Vec<u32>>>, id: u32) -> Option<CompletionCallback> {
    let log = Arc::clone(log);
    Some(Box::new(move || log.lock().unwrap().push(id)))
}

/// Allocate `bytes.len()` bytes in a CPU-visible domain and fill them.
pub fn upload(memory: &SharedMemory, domain: Domain, bytes: &[u8]) -> DomainPtr {
    let mut memory = lock_memory(memory);
    let ptr = memory.alloc(domain, bytes.len()).expect("allocation failed");
    memory.cpu_bytes_mut(ptr).expect("not CPU visible")[..bytes.len()].copy_from_slice(bytes);
    ptr
}

/// Deterministic pixel data.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 13) as u8).collect()
}
