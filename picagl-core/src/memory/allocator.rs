// Per-domain allocator strategy.

use super::arena::Arena;
use super::domain::{Domain, DomainPtr, VramBank};

/// Allocation strategy for one memory domain.
///
/// `MemorySystem` holds one boxed implementation per domain and routes every
/// call by the pointer's domain tag, so a host can replace a single domain
/// (for example to carve VRAM out of its own arena) without touching the
/// others. `owns` and `realloc` have default implementations built on the
/// required methods.
pub trait DomainAllocator: Send {
    /// Domain whose pointers this allocator hands out.
    fn domain(&self) -> Domain;

    /// Reserve `size` bytes. `None` when the domain is exhausted or `size` is 0.
    fn alloc(&mut self, size: usize) -> Option<DomainPtr>;

    /// Release an allocation previously returned by `alloc`/`realloc`.
    fn free(&mut self, ptr: DomainPtr);

    /// Size requested for the allocation starting at `ptr`, 0 if none.
    fn size(&self, ptr: DomainPtr) -> usize;

    /// Device view of the bytes from `ptr` to the end of its allocation.
    fn memory(&self, ptr: DomainPtr) -> Option<&[u8]>;

    fn memory_mut(&mut self, ptr: DomainPtr) -> Option<&mut [u8]>;

    /// Whether `ptr` points into a live allocation of this domain.
    fn owns(&self, ptr: DomainPtr) -> bool {
        ptr.domain() == self.domain() && self.memory(ptr).is_some()
    }

    /// Resize an allocation.
    ///
    /// `None` behaves as `alloc`. The first `min(old, new)` bytes are kept.
    /// A size of 0 frees `ptr` and returns `None`. On failure the original
    /// allocation is left untouched.
    fn realloc(&mut self, ptr: Option<DomainPtr>, new_size: usize) -> Option<DomainPtr> {
        match ptr {
            None => self.alloc(new_size),
            Some(old) => move_allocation(self, old, new_size),
        }
    }
}

/// Allocate-copy-free fallback shared by `realloc` implementations.
pub fn move_allocation<A>(allocator: &mut A, old: DomainPtr, new_size: usize) -> Option<DomainPtr>
where
    A: DomainAllocator + ?Sized,
{
    if new_size == 0 {
        allocator.free(old);
        return None;
    }
    let preserved = {
        let bytes = allocator.memory(old)?;
        bytes[..bytes.len().min(new_size)].to_vec()
    };
    let new = allocator.alloc(new_size)?;
    if let Some(dst) = allocator.memory_mut(new) {
        dst[..preserved.len()].copy_from_slice(&preserved);
    }
    allocator.free(old);
    Some(new)
}

/// Default allocator for every domain: a first-fit arena over the domain's
/// window. Heap allocations are zero-filled, linear and VRAM ones are not.
#[derive(Debug)]
pub struct ArenaAllocator {
    domain: Domain,
    arena: Arena,
}

impl ArenaAllocator {
    pub fn new(domain: Domain, size: u32) -> Self {
        Self {
            domain,
            arena: Arena::new(domain.default_base(), size, domain.alignment()),
        }
    }

    pub fn heap(size: u32) -> Self {
        Self::new(Domain::Heap, size)
    }

    pub fn linear(size: u32) -> Self {
        Self::new(Domain::Linear, size)
    }

    pub fn vram(bank: VramBank, size: u32) -> Self {
        Self::new(Domain::Vram(bank), size)
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    fn accepts(&self, ptr: DomainPtr) -> bool {
        if ptr.domain() == self.domain {
            true
        } else {
            log::warn!("{} allocator handed foreign pointer {}", self.domain, ptr);
            false
        }
    }
}

impl DomainAllocator for ArenaAllocator {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn alloc(&mut self, size: usize) -> Option<DomainPtr> {
        let addr = self.arena.alloc(size)?;
        let ptr = DomainPtr::new(self.domain, addr);
        if self.domain.zero_fills() {
            if let Some(bytes) = self.arena.bytes_mut(addr) {
                bytes.fill(0);
            }
        }
        Some(ptr)
    }

    fn free(&mut self, ptr: DomainPtr) {
        if self.accepts(ptr) && !self.arena.free(ptr.addr()) {
            log::warn!("{}: free of unknown block {}", self.domain, ptr);
        }
    }

    fn size(&self, ptr: DomainPtr) -> usize {
        if ptr.domain() != self.domain {
            return 0;
        }
        self.arena.size(ptr.addr())
    }

    fn memory(&self, ptr: DomainPtr) -> Option<&[u8]> {
        if ptr.domain() != self.domain {
            return None;
        }
        self.arena.bytes(ptr.addr())
    }

    fn memory_mut(&mut self, ptr: DomainPtr) -> Option<&mut [u8]> {
        if ptr.domain() != self.domain {
            return None;
        }
        self.arena.bytes_mut(ptr.addr())
    }

    // Grows or shrinks in place when the neighbouring gap allows it.
    fn realloc(&mut self, ptr: Option<DomainPtr>, new_size: usize) -> Option<DomainPtr> {
        let Some(old) = ptr else {
            return self.alloc(new_size);
        };
        if !self.accepts(old) {
            return None;
        }
        let old_size = self.arena.size(old.addr());
        if old_size != 0 && self.arena.resize_in_place(old.addr(), new_size) {
            if self.domain.zero_fills() && new_size > old_size {
                if let Some(bytes) = self.arena.bytes_mut(old.addr()) {
                    bytes[old_size..].fill(0);
                }
            }
            return Some(old);
        }
        move_allocation(self, old, new_size)
    }
}
