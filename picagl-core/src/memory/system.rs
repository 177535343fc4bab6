// Memory system: one allocator per domain, routed by pointer tag.

use super::allocator::{ArenaAllocator, DomainAllocator};
use super::domain::{Domain, DomainPtr, VramBank};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Sizes of the memory domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub heap_size: u32,
    pub linear_size: u32,
    /// Size of each of the two VRAM banks.
    pub vram_bank_size: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            heap_size: 8 * 1024 * 1024,
            linear_size: 16 * 1024 * 1024,
            vram_bank_size: 3 * 1024 * 1024,
        }
    }
}

/// Memory system shared between the CPU side and the GPU backend.
pub type SharedMemory = Arc<Mutex<MemorySystem>>;

/// Lock a shared memory system. A panic on another thread does not leave the
/// allocators half-updated, so a poisoned lock is recovered.
pub fn lock_memory(memory: &Mutex<MemorySystem>) -> MutexGuard<'_, MemorySystem> {
    memory.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The four allocation domains behind one facade.
///
/// Every call is routed to the allocator of the pointer's domain. There is no
/// internal locking; callers that share it across threads wrap it in a
/// [`SharedMemory`].
pub struct MemorySystem {
    heap: Box<dyn DomainAllocator>,
    linear: Box<dyn DomainAllocator>,
    vram_a: Box<dyn DomainAllocator>,
    vram_b: Box<dyn DomainAllocator>,
}

impl MemorySystem {
    /// Build the default arena allocators sized by `config`.
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            heap: Box::new(ArenaAllocator::heap(config.heap_size)),
            linear: Box::new(ArenaAllocator::linear(config.linear_size)),
            vram_a: Box::new(ArenaAllocator::vram(VramBank::A, config.vram_bank_size)),
            vram_b: Box::new(ArenaAllocator::vram(VramBank::B, config.vram_bank_size)),
        }
    }

    /// Replace the allocator of the domain `allocator` reports.
    pub fn with_allocator(mut self, allocator: Box<dyn DomainAllocator>) -> Self {
        let domain = allocator.domain();
        log::debug!("installing custom {} allocator", domain);
        *self.slot_mut(domain) = allocator;
        self
    }

    pub fn into_shared(self) -> SharedMemory {
        Arc::new(Mutex::new(self))
    }

    fn slot(&self, domain: Domain) -> &dyn DomainAllocator {
        match domain {
            Domain::Heap => self.heap.as_ref(),
            Domain::Linear => self.linear.as_ref(),
            Domain::Vram(VramBank::A) => self.vram_a.as_ref(),
            Domain::Vram(VramBank::B) => self.vram_b.as_ref(),
        }
    }

    fn slot_mut(&mut self, domain: Domain) -> &mut Box<dyn DomainAllocator> {
        match domain {
            Domain::Heap => &mut self.heap,
            Domain::Linear => &mut self.linear,
            Domain::Vram(VramBank::A) => &mut self.vram_a,
            Domain::Vram(VramBank::B) => &mut self.vram_b,
        }
    }

    pub fn alloc(&mut self, domain: Domain, size: usize) -> Option<DomainPtr> {
        let ptr = self.slot_mut(domain).alloc(size);
        match ptr {
            Some(p) => log::trace!("alloc {} bytes -> {}", size, p),
            None => log::warn!("{}: allocation of {} bytes failed", domain, size),
        }
        ptr
    }

    /// Allocate from VRAM bank A, falling back to bank B.
    pub fn alloc_vram(&mut self, size: usize) -> Option<DomainPtr> {
        self.slot_mut(Domain::Vram(VramBank::A))
            .alloc(size)
            .or_else(|| self.alloc(Domain::Vram(VramBank::B), size))
    }

    pub fn free(&mut self, ptr: DomainPtr) {
        self.slot_mut(ptr.domain()).free(ptr);
    }

    /// Resize within `domain`. `ptr` of another domain is refused.
    pub fn realloc(
        &mut self,
        domain: Domain,
        ptr: Option<DomainPtr>,
        size: usize,
    ) -> Option<DomainPtr> {
        if let Some(p) = ptr {
            if p.domain() != domain {
                log::warn!("realloc of {} requested in {}", p, domain);
                return None;
            }
        }
        self.slot_mut(domain).realloc(ptr, size)
    }

    pub fn size(&self, ptr: DomainPtr) -> usize {
        self.slot(ptr.domain()).size(ptr)
    }

    /// Membership test against one domain.
    pub fn owns(&self, domain: Domain, ptr: DomainPtr) -> bool {
        self.slot(domain).owns(ptr)
    }

    /// The domain holding `ptr`, if it is live.
    pub fn domain_of(&self, ptr: DomainPtr) -> Option<Domain> {
        let domain = ptr.domain();
        self.owns(domain, ptr).then_some(domain)
    }

    /// CPU view of an allocation. VRAM has none.
    pub fn cpu_bytes(&self, ptr: DomainPtr) -> Option<&[u8]> {
        if !ptr.domain().is_cpu_addressable() {
            return None;
        }
        self.slot(ptr.domain()).memory(ptr)
    }

    pub fn cpu_bytes_mut(&mut self, ptr: DomainPtr) -> Option<&mut [u8]> {
        if !ptr.domain().is_cpu_addressable() {
            return None;
        }
        self.slot_mut(ptr.domain()).memory_mut(ptr)
    }

    /// GPU view of an allocation, available for every domain.
    pub fn device_bytes(&self, ptr: DomainPtr) -> Option<&[u8]> {
        self.slot(ptr.domain()).memory(ptr)
    }

    pub fn device_bytes_mut(&mut self, ptr: DomainPtr) -> Option<&mut [u8]> {
        self.slot_mut(ptr.domain()).memory_mut(ptr)
    }

    /// Device-side copy of `len` bytes. Returns false if either range is
    /// not fully inside a live allocation.
    pub fn device_copy(&mut self, src: DomainPtr, dst: DomainPtr, len: usize) -> bool {
        let staged = match self.device_bytes(src).and_then(|b| b.get(..len)) {
            Some(bytes) => bytes.to_vec(),
            None => return false,
        };
        match self.device_bytes_mut(dst).and_then(|b| b.get_mut(..len)) {
            Some(out) => {
                out.copy_from_slice(&staged);
                true
            }
            None => false,
        }
    }
}

impl Default for MemorySystem {
    fn default() -> Self {
        Self::new(&MemoryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> MemorySystem {
        MemorySystem::new(&MemoryConfig {
            heap_size: 0x1000,
            linear_size: 0x1000,
            vram_bank_size: 0x400,
        })
    }

    #[test]
    fn pointers_carry_their_domain() {
        let mut mem = small();
        let h = mem.alloc(Domain::Heap, 8).unwrap();
        let l = mem.alloc(Domain::Linear, 8).unwrap();
        assert_eq!(mem.domain_of(h), Some(Domain::Heap));
        assert_eq!(mem.domain_of(l), Some(Domain::Linear));
        assert!(!mem.owns(Domain::Linear, h));
        mem.free(h);
        assert_eq!(mem.domain_of(h), None);
    }

    #[test]
    fn vram_falls_back_to_second_bank() {
        let mut mem = small();
        let a = mem.alloc_vram(0x400).unwrap();
        let b = mem.alloc_vram(0x100).unwrap();
        assert_eq!(a.domain(), Domain::Vram(VramBank::A));
        assert_eq!(b.domain(), Domain::Vram(VramBank::B));
        assert!(mem.alloc_vram(0x400).is_none());
    }

    #[test]
    fn vram_is_device_only() {
        let mut mem = small();
        let v = mem.alloc_vram(0x80).unwrap();
        assert!(mem.cpu_bytes(v).is_none());
        assert!(mem.cpu_bytes_mut(v).is_none());
        assert_eq!(mem.device_bytes(v).map(<[u8]>::len), Some(0x80));
    }

    #[test]
    fn realloc_refuses_cross_domain() {
        let mut mem = small();
        let h = mem.alloc(Domain::Heap, 8).unwrap();
        assert!(mem.realloc(Domain::Linear, Some(h), 16).is_none());
        assert_eq!(mem.size(h), 8);
    }

    #[test]
    fn device_copy_moves_bytes_between_domains() {
        let mut mem = small();
        let src = mem.alloc(Domain::Linear, 16).unwrap();
        let dst = mem.alloc_vram(16).unwrap();
        mem.cpu_bytes_mut(src).unwrap().copy_from_slice(&[9u8; 16]);
        assert!(mem.device_copy(src, dst, 16));
        assert_eq!(mem.device_bytes(dst).unwrap(), &[9u8; 16]);
        assert!(!mem.device_copy(src, dst, 17));
    }

    // Only the required methods; owns/realloc come from the trait.
    struct PassthroughVram {
        inner: ArenaAllocator,
    }

    impl DomainAllocator for PassthroughVram {
        fn domain(&self) -> Domain {
            self.inner.domain()
        }
        fn alloc(&mut self, size: usize) -> Option<DomainPtr> {
            self.inner.alloc(size)
        }
        fn free(&mut self, ptr: DomainPtr) {
            self.inner.free(ptr)
        }
        fn size(&self, ptr: DomainPtr) -> usize {
            self.inner.size(ptr)
        }
        fn memory(&self, ptr: DomainPtr) -> Option<&[u8]> {
            self.inner.memory(ptr)
        }
        fn memory_mut(&mut self, ptr: DomainPtr) -> Option<&mut [u8]> {
            self.inner.memory_mut(ptr)
        }
    }

    #[test]
    fn custom_allocator_replaces_one_domain() {
        let custom = PassthroughVram {
            inner: ArenaAllocator::vram(VramBank::A, 0x200),
        };
        let mut mem = small().with_allocator(Box::new(custom));
        let v = mem.alloc_vram(0x80).unwrap();
        assert_eq!(v.domain(), Domain::Vram(VramBank::A));
        let grown = mem
            .realloc(Domain::Vram(VramBank::A), Some(v), 0x100)
            .unwrap();
        assert_eq!(mem.size(grown), 0x100);
        let h = mem.alloc(Domain::Heap, 4).unwrap();
        assert_eq!(h.domain(), Domain::Heap);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = MemoryConfig {
            heap_size: 1,
            linear_size: 2,
            vram_bank_size: 3,
        };
        let text = serde_json::to_string(&config).unwrap();
        let back: MemoryConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(config, back);
        let partial: MemoryConfig = serde_json::from_str(r#"{"heap_size": 64}"#).unwrap();
        assert_eq!(partial.heap_size, 64);
        assert_eq!(partial.linear_size, MemoryConfig::default().linear_size);
    }
}
