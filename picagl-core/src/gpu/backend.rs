// Hardware backend seam.

use super::command::Command;
use crate::error::HalError;
use crate::memory::DomainPtr;

/// Something that can start GPU jobs.
///
/// `dispatch` only starts a command; completion is reported later by
/// calling [`super::CommandQueue::handle_event`] from the event context.
/// It is invoked with the queue lock held and must not block or call back
/// into the queue.
pub trait GpuBackend: Send + Sync {
    fn dispatch(&self, command: &Command) -> Result<(), HalError>;

    /// Write back CPU cache lines covering the range. Soft failure.
    fn flush_data_cache(&self, _ptr: DomainPtr, _len: usize) -> bool {
        true
    }

    /// Drop CPU cache lines covering the range. Soft failure.
    fn invalidate_data_cache(&self, _ptr: DomainPtr, _len: usize) -> bool {
        true
    }
}
