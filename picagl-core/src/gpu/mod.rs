//! GPU submission.
//!
//! [`CommandQueue`] serializes command buffers onto a [`GpuBackend`];
//! [`Barrier`] tracks groups of in-flight commands; [`SimulatedGpu`] is the
//! backend used off-device.

pub mod backend;
pub mod barrier;
pub mod command;
pub mod queue;
pub mod sim;

pub use backend::GpuBackend;
pub use barrier::Barrier;
pub use command::{Command, FillTarget, FillWidth, GpuEvent, TransferFlags, TransferParams};
pub use queue::{CommandQueue, CompletionCallback, QUEUE_CAPACITY};
pub use sim::SimulatedGpu;
