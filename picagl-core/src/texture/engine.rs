// Texture tiling engine: picks the transfer hardware or the software
// swizzle for a conversion between row-major and tiled layout.

use super::format::TexelFormat;
use super::tiling::{check_dimensions, swizzle, Direction};
use crate::error::TilingError;
use crate::fatal;
use crate::gpu::{Command, CommandQueue, TransferFlags, TransferParams};
use crate::memory::{lock_memory, DomainPtr, MemorySystem, SharedMemory};
use std::sync::Arc;

/// One conversion between two allocations of equal surface size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilingRequest {
    pub src: DomainPtr,
    pub dst: DomainPtr,
    pub width: u32,
    pub height: u32,
    /// GL pixel format token.
    pub format: u32,
    /// GL pixel type token.
    pub pixel_type: u32,
    pub direction: Direction,
}

/// Which path carried out a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TilePath {
    Hardware,
    Software,
}

pub struct TilingEngine {
    queue: Arc<CommandQueue>,
    memory: SharedMemory,
}

impl TilingEngine {
    pub fn new(queue: Arc<CommandQueue>, memory: SharedMemory) -> Self {
        Self { queue, memory }
    }

    pub fn queue(&self) -> &Arc<CommandQueue> {
        &self.queue
    }

    /// Convert `request.src` into `request.dst`.
    ///
    /// Formats the transfer engine understands run as a synchronous display
    /// transfer and may target VRAM. Others are swizzled on the CPU, which
    /// cannot reach VRAM; handing such a request a VRAM buffer is fatal.
    pub fn tile(&self, request: &TilingRequest) -> Result<TilePath, TilingError> {
        let format = TexelFormat::from_gl(request.format, request.pixel_type).ok_or(
            TilingError::UnsupportedFormat {
                format: request.format,
                pixel_type: request.pixel_type,
            },
        )?;
        check_dimensions(request.width, request.height)?;
        let required = format.surface_size(request.width, request.height);

        if format.hardware_transfer() {
            {
                let memory = lock_memory(&self.memory);
                check_capacity(&memory, request.src, "source", required)?;
                check_capacity(&memory, request.dst, "destination", required)?;
            }
            // The memory lock must be released before waiting on the queue:
            // the GPU worker needs it to carry out the transfer.
            self.hardware(request, format, required);
            Ok(TilePath::Hardware)
        } else {
            self.software(request, format, required)?;
            Ok(TilePath::Software)
        }
    }

    fn hardware(&self, request: &TilingRequest, format: TexelFormat, len: usize) {
        let backend = self.queue.backend();
        if !backend.flush_data_cache(request.src, len) {
            log::warn!("data cache flush of {} failed", request.src);
        }

        let flags = match request.direction {
            Direction::ToTiled => TransferFlags::OUT_TILED,
            Direction::ToLinear => TransferFlags::empty(),
        };
        log::debug!(
            "tiling {}x{} {} via display transfer ({:?})",
            request.width,
            request.height,
            format,
            request.direction
        );
        self.queue
            .submit_sync(Command::DisplayTransfer(TransferParams {
                src: request.src,
                dst: request.dst,
                width: request.width,
                height: request.height,
                format,
                flags,
            }));

        if request.dst.domain().is_cpu_addressable()
            && !backend.invalidate_data_cache(request.dst, len)
        {
            log::warn!("data cache invalidate of {} failed", request.dst);
        }
    }

    fn software(
        &self,
        request: &TilingRequest,
        format: TexelFormat,
        len: usize,
    ) -> Result<(), TilingError> {
        for ptr in [request.src, request.dst] {
            if !ptr.domain().is_cpu_addressable() {
                fatal!(
                    "software tiling of {} cannot reach {}",
                    format,
                    ptr
                );
            }
        }

        let mut memory = lock_memory(&self.memory);
        check_capacity(&memory, request.src, "source", len)?;
        check_capacity(&memory, request.dst, "destination", len)?;
        let src = memory
            .cpu_bytes(request.src)
            .ok_or(TilingError::InvalidPointer { ptr: request.src })?[..len]
            .to_vec();
        let dst = memory
            .cpu_bytes_mut(request.dst)
            .ok_or(TilingError::InvalidPointer { ptr: request.dst })?;

        log::debug!(
            "tiling {}x{} {} in software ({:?})",
            request.width,
            request.height,
            format,
            request.direction
        );
        swizzle(
            &src,
            dst,
            request.width,
            request.height,
            format.bytes_per_pixel(),
            request.direction,
        )
    }
}

fn check_capacity(
    memory: &MemorySystem,
    ptr: DomainPtr,
    which: &'static str,
    required: usize,
) -> Result<(), TilingError> {
    let available = memory
        .device_bytes(ptr)
        .map(<[u8]>::len)
        .ok_or(TilingError::InvalidPointer { ptr })?;
    if available < required {
        return Err(TilingError::BufferTooSmall {
            which,
            required,
            available,
        });
    }
    Ok(())
}
