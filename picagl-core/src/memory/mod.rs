//! Memory domains.
//!
//! The handheld has a general heap, a physically contiguous linear pool and
//! two banks of VRAM. Each domain owns its allocations independently and is
//! served by a replaceable [`DomainAllocator`].

pub mod allocator;
pub mod arena;
pub mod domain;
pub mod system;

pub use allocator::{move_allocation, ArenaAllocator, DomainAllocator};
pub use arena::Arena;
pub use domain::{Domain, DomainPtr, VramBank};
pub use system::{lock_memory, MemoryConfig, MemorySystem, SharedMemory};
