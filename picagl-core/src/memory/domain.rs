// Memory domains and tagged pointers.
//
// The handheld exposes several disjoint address spaces. Instead of guessing a
// pointer's domain from its address window, every allocation carries the
// domain it came from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two VRAM banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VramBank {
    A,
    B,
}

/// An allocation domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// General purpose heap. Allocations are zero-filled.
    Heap,
    /// Physically contiguous pool the GPU can read and write.
    Linear,
    /// GPU-local memory, not byte-addressable by the CPU.
    Vram(VramBank),
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Heap,
        Domain::Linear,
        Domain::Vram(VramBank::A),
        Domain::Vram(VramBank::B),
    ];

    /// Default base address of the domain's window.
    pub const fn default_base(self) -> u32 {
        match self {
            Domain::Heap => 0x0800_0000,
            Domain::Linear => 0x1400_0000,
            Domain::Vram(VramBank::A) => 0x1F00_0000,
            Domain::Vram(VramBank::B) => 0x1F30_0000,
        }
    }

    /// Allocation alignment inside the domain.
    pub const fn alignment(self) -> u32 {
        match self {
            Domain::Heap => 16,
            Domain::Linear | Domain::Vram(_) => 0x80,
        }
    }

    /// Whether the CPU may read and write the domain's bytes directly.
    pub const fn is_cpu_addressable(self) -> bool {
        !matches!(self, Domain::Vram(_))
    }

    /// Whether fresh allocations are guaranteed to read as zero.
    pub const fn zero_fills(self) -> bool {
        matches!(self, Domain::Heap)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Domain::Heap => "heap",
            Domain::Linear => "linear",
            Domain::Vram(VramBank::A) => "vram-a",
            Domain::Vram(VramBank::B) => "vram-b",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Address tagged with the domain that handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainPtr {
    domain: Domain,
    addr: u32,
}

impl DomainPtr {
    pub const fn new(domain: Domain, addr: u32) -> Self {
        Self { domain, addr }
    }

    pub const fn domain(self) -> Domain {
        self.domain
    }

    pub const fn addr(self) -> u32 {
        self.addr
    }

    /// Pointer `bytes` past this one, in the same domain.
    pub const fn offset(self, bytes: u32) -> Self {
        Self {
            domain: self.domain,
            addr: self.addr.wrapping_add(bytes),
        }
    }
}

impl fmt::Display for DomainPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:0x{:08X}", self.domain, self.addr)
    }
}
