//! picagl-core
//!
//! Hardware abstraction layer for a fixed-function handheld GPU that runs one
//! command buffer at a time.
//!
//! # Modules
//! - [`memory`]: the heap, linear and VRAM allocation domains behind tagged
//!   [`memory::DomainPtr`] handles.
//! - [`gpu`]: the bounded command queue, completion barriers, the backend
//!   trait and a simulated GPU that executes commands on its own thread.
//! - [`texture`]: pixel formats and the 8x8 Z-order tiling engine.
//!
//! # Example
//!
//! ```rust,no_run
//! use picagl_core::gpu::{Command, CommandQueue, SimulatedGpu};
//! use picagl_core::memory::{MemoryConfig, MemorySystem};
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//!
//! let memory = Arc::new(Mutex::new(MemorySystem::new(&MemoryConfig::default())));
//! let gpu = SimulatedGpu::spawn(Some(memory), Duration::ZERO);
//! let queue = CommandQueue::new(gpu.clone());
//! gpu.attach(&queue);
//!
//! queue.submit_sync(Command::process_list(vec![0u32; 4], true));
//! ```

pub mod error;
pub mod fatal;
pub mod gpu;
pub mod memory;
pub mod texture;

pub use error::{HalError, TilingError};
