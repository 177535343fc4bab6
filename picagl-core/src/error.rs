//! Recoverable error types for the hardware abstraction layer.
//!
//! Fatal conditions do not appear here; they go through [`crate::fatal!`].

use crate::memory::DomainPtr;
use thiserror::Error;

/// Errors reported by a [`crate::gpu::GpuBackend`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HalError {
    /// The backend refused to start a command.
    #[error("backend rejected {command}: {reason}")]
    DispatchRejected {
        command: &'static str,
        reason: String,
    },

    /// A command referenced memory that no domain maps.
    #[error("{ptr} is not mapped by any memory domain")]
    Unmapped { ptr: DomainPtr },
}

/// Errors reported by the tiling engine for malformed requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TilingError {
    /// Width or height is zero or not a multiple of the 8 pixel tile edge.
    #[error("surface {width}x{height} is not a whole number of 8x8 tiles")]
    UnalignedDimensions { width: u32, height: u32 },

    /// One of the buffers cannot hold the whole surface.
    #[error("{which} buffer holds {available} bytes, surface needs {required}")]
    BufferTooSmall {
        which: &'static str,
        required: usize,
        available: usize,
    },

    /// The GL format/type pair has no texel layout.
    #[error("unsupported pixel format 0x{format:04X} with type 0x{pixel_type:04X}")]
    UnsupportedFormat { format: u32, pixel_type: u32 },

    /// The pointer is not a live allocation in its domain.
    #[error("{ptr} is not a live allocation")]
    InvalidPointer { ptr: DomainPtr },
}
