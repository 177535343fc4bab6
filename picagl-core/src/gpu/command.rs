// GPU commands and the completion events they raise.

use crate::memory::DomainPtr;
use crate::texture::TexelFormat;
use bitflags::bitflags;
use std::sync::Arc;

/// Completion and timing events raised by the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuEvent {
    /// Memory fill on the primary fill unit finished.
    Psc0,
    /// Memory fill on the secondary fill unit finished.
    Psc1,
    VBlank0,
    VBlank1,
    /// Display transfer or texture copy finished.
    Ppf,
    /// Command list finished.
    P3d,
    Dma,
}

impl GpuEvent {
    /// VBlank events never complete a command.
    pub const fn is_vblank(self) -> bool {
        matches!(self, GpuEvent::VBlank0 | GpuEvent::VBlank1)
    }
}

/// Which of the two fill units runs a memory fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillTarget {
    Primary,
    Secondary,
}

/// Width of the pattern a memory fill repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillWidth {
    Bits16,
    Bits24,
    Bits32,
}

impl FillWidth {
    pub const fn bytes(self) -> usize {
        match self {
            FillWidth::Bits16 => 2,
            FillWidth::Bits24 => 3,
            FillWidth::Bits32 => 4,
        }
    }
}

bitflags! {
    /// Display transfer options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TransferFlags: u32 {
        /// Mirror rows while copying.
        const FLIP_VERTICAL = 1 << 0;
        /// Input is row-major, output is tiled. Without it the input is
        /// tiled and the output row-major.
        const OUT_TILED = 1 << 1;
        /// Copy bytes unchanged, no layout conversion.
        const RAW_COPY = 1 << 3;
    }
}

/// Parameters of a display transfer between two surfaces of equal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    pub src: DomainPtr,
    pub dst: DomainPtr,
    pub width: u32,
    pub height: u32,
    pub format: TexelFormat,
    pub flags: TransferFlags,
}

impl TransferParams {
    /// Bytes covered on each side.
    pub fn surface_bytes(&self) -> usize {
        self.format.surface_size(self.width, self.height)
    }
}

/// One hardware job.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Run an encoded command list. `flush` asks the GPU to flush its
    /// caches before starting.
    ProcessCommandList { list: Arc<[u32]>, flush: bool },
    /// Fill `len` bytes at `buffer` with a repeated pattern.
    MemoryFill {
        target: FillTarget,
        buffer: DomainPtr,
        len: u32,
        value: u32,
        width: FillWidth,
    },
    DisplayTransfer(TransferParams),
    /// Raw copy of `len` bytes through the transfer engine.
    TextureCopy {
        src: DomainPtr,
        dst: DomainPtr,
        len: u32,
    },
}

impl Command {
    pub fn process_list(words: impl Into<Arc<[u32]>>, flush: bool) -> Self {
        Command::ProcessCommandList {
            list: words.into(),
            flush,
        }
    }

    /// The event the GPU raises when this command finishes.
    pub fn completion_event(&self) -> GpuEvent {
        match self {
            Command::ProcessCommandList { .. } => GpuEvent::P3d,
            Command::MemoryFill {
                target: FillTarget::Primary,
                ..
            } => GpuEvent::Psc0,
            Command::MemoryFill {
                target: FillTarget::Secondary,
                ..
            } => GpuEvent::Psc1,
            Command::DisplayTransfer(_) | Command::TextureCopy { .. } => GpuEvent::Ppf,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::ProcessCommandList { .. } => "process-command-list",
            Command::MemoryFill { .. } => "memory-fill",
            Command::DisplayTransfer(_) => "display-transfer",
            Command::TextureCopy { .. } => "texture-copy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Domain;

    #[test]
    fn each_category_maps_to_its_event() {
        let ptr = DomainPtr::new(Domain::Linear, 0x1400_0000);
        let fill = |target| Command::MemoryFill {
            target,
            buffer: ptr,
            len: 16,
            value: 0,
            width: FillWidth::Bits32,
        };
        let transfer = Command::DisplayTransfer(TransferParams {
            src: ptr,
            dst: ptr,
            width: 8,
            height: 8,
            format: TexelFormat::Rgba8,
            flags: TransferFlags::OUT_TILED,
        });
        let copy = Command::TextureCopy {
            src: ptr,
            dst: ptr,
            len: 4,
        };

        assert_eq!(Command::process_list(vec![0u32], false).completion_event(), GpuEvent::P3d);
        assert_eq!(fill(FillTarget::Primary).completion_event(), GpuEvent::Psc0);
        assert_eq!(fill(FillTarget::Secondary).completion_event(), GpuEvent::Psc1);
        assert_eq!(transfer.completion_event(), GpuEvent::Ppf);
        assert_eq!(copy.completion_event(), GpuEvent::Ppf);
    }

    #[test]
    fn only_vblanks_are_timing_events() {
        assert!(GpuEvent::VBlank0.is_vblank());
        assert!(GpuEvent::VBlank1.is_vblank());
        assert!(!GpuEvent::P3d.is_vblank());
        assert!(!GpuEvent::Ppf.is_vblank());
    }
}
