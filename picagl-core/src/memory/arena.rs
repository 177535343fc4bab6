// Address-window arena shared by the default domain allocators.
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    /// Reserved bytes (multiple of the alignment).
    reserved: u32,
    /// Bytes the caller asked for.
    requested: u32,
}

/// First-fit arena over a fixed address window.
///
/// Backing bytes live in a `Vec<u8>`; addresses handed out are
/// `base + offset`. Blocks are aligned to the arena alignment and rounded up
/// to it, so every free gap is aligned too. Freed space is reused.
#[derive(Debug)]
pub struct Arena {
    base: u32,
    align: u32,
    data: Vec<u8>,
    /// Live blocks keyed by offset from `base`.
    blocks: BTreeMap<u32, Block>,
}

impl Arena {
    /// Create an arena covering `base..base + size`.
    ///
    /// `align` must be a power of two and `base` must be aligned to it. A
    /// window that would run past the end of the 32-bit address space is cut
    /// short at 4 GiB.
    pub fn new(base: u32, size: u32, align: u32) -> Self {
        debug_assert!(align.is_power_of_two());
        debug_assert_eq!(base & (align - 1), 0);
        let room = (1u64 << 32) - u64::from(base);
        let size = if u64::from(size) > room {
            log::warn!(
                "arena at 0x{:08X}: size 0x{:X} truncated to 0x{:X}",
                base,
                size,
                room
            );
            room as usize
        } else {
            size as usize
        };
        Self {
            base,
            align,
            data: vec![0; size],
            blocks: BTreeMap::new(),
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes currently reserved by live blocks.
    pub fn used(&self) -> usize {
        self.blocks.values().map(|b| b.reserved as usize).sum()
    }

    pub fn live_blocks(&self) -> usize {
        self.blocks.len()
    }

    fn round_up(&self, size: usize) -> Option<u32> {
        let size = u32::try_from(size).ok()?;
        size.checked_add(self.align - 1).map(|s| s & !(self.align - 1))
    }

    /// Reserve `size` bytes. Returns the address, or `None` when no gap fits.
    pub fn alloc(&mut self, size: usize) -> Option<u32> {
        if size == 0 {
            return None;
        }
        let reserved = self.round_up(size)?;
        let capacity = u32::try_from(self.capacity()).unwrap_or(u32::MAX);

        let mut cursor = 0u32;
        let mut found = None;
        for (&offset, block) in &self.blocks {
            if offset - cursor >= reserved {
                found = Some(cursor);
                break;
            }
            cursor = offset + block.reserved;
        }
        let offset = match found {
            Some(offset) => offset,
            None if capacity - cursor >= reserved => cursor,
            None => return None,
        };
        let addr = self.base.checked_add(offset)?;

        self.blocks.insert(
            offset,
            Block {
                reserved,
                requested: size as u32,
            },
        );
        Some(addr)
    }

    /// Release the block starting at `addr`. Returns false if there is none.
    pub fn free(&mut self, addr: u32) -> bool {
        match addr.checked_sub(self.base) {
            Some(offset) => self.blocks.remove(&offset).is_some(),
            None => false,
        }
    }

    /// Change the size of the block at `addr` without moving it.
    ///
    /// Shrinking always succeeds; growing succeeds when the following gap is
    /// large enough.
    pub fn resize_in_place(&mut self, addr: u32, size: usize) -> bool {
        let Some(offset) = addr.checked_sub(self.base) else {
            return false;
        };
        let Some(reserved) = self.round_up(size) else {
            return false;
        };
        if size == 0 || !self.blocks.contains_key(&offset) {
            return false;
        }
        let limit = self
            .blocks
            .range(offset + 1..)
            .next()
            .map(|(&next, _)| next)
            .unwrap_or_else(|| u32::try_from(self.capacity()).unwrap_or(u32::MAX));
        if offset.checked_add(reserved).map_or(true, |end| end > limit) {
            return false;
        }
        self.blocks.insert(
            offset,
            Block {
                reserved,
                requested: size as u32,
            },
        );
        true
    }

    /// Locate the block containing `addr`: its start address and caller size.
    fn find(&self, addr: u32) -> Option<(u32, u32)> {
        let offset = addr.checked_sub(self.base)?;
        let (&start, block) = self.blocks.range(..=offset).next_back()?;
        (offset < start + block.requested).then_some((start, block.requested))
    }

    /// Requested size of the block starting exactly at `addr`, else 0.
    pub fn size(&self, addr: u32) -> usize {
        addr.checked_sub(self.base)
            .and_then(|offset| self.blocks.get(&offset))
            .map_or(0, |b| b.requested as usize)
    }

    pub fn contains(&self, addr: u32) -> bool {
        self.find(addr).is_some()
    }

    /// Bytes from `addr` to the end of its block.
    pub fn bytes(&self, addr: u32) -> Option<&[u8]> {
        let (start, requested) = self.find(addr)?;
        let from = (addr - self.base) as usize;
        let to = (start + requested) as usize;
        self.data.get(from..to)
    }

    pub fn bytes_mut(&mut self, addr: u32) -> Option<&mut [u8]> {
        let (start, requested) = self.find(addr)?;
        let from = (addr - self.base) as usize;
        let to = (start + requested) as usize;
        self.data.get_mut(from..to)
    }

    /// Drop every block. Backing bytes are left as they are.
    pub fn reset(&mut self) {
        self.blocks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_is_aligned_and_sequential() {
        let mut arena = Arena::new(0x1400_0000, 0x1000, 0x80);
        let a = arena.alloc(10).unwrap();
        let b = arena.alloc(0x90).unwrap();
        assert_eq!(a, 0x1400_0000);
        assert_eq!(b, 0x1400_0080);
        assert_eq!(arena.used(), 0x80 + 0x100);
        assert_eq!(arena.size(a), 10);
    }

    #[test]
    fn freed_gap_is_reused_first_fit() {
        let mut arena = Arena::new(0, 0x400, 0x80);
        let a = arena.alloc(0x80).unwrap();
        let _b = arena.alloc(0x80).unwrap();
        assert!(arena.free(a));
        assert_eq!(arena.alloc(0x40), Some(a));
    }

    #[test]
    fn exhaustion_returns_none() {
        let mut arena = Arena::new(0, 0x100, 0x80);
        assert!(arena.alloc(0x100).is_some());
        assert!(arena.alloc(1).is_none());
        assert!(arena.alloc(0).is_none());
    }

    #[test]
    fn interior_addresses_resolve_to_their_block() {
        let mut arena = Arena::new(0x100, 0x400, 0x10);
        let a = arena.alloc(0x20).unwrap();
        assert!(arena.contains(a + 0x1F));
        assert!(!arena.contains(a + 0x20));
        assert_eq!(arena.bytes(a + 0x10).unwrap().len(), 0x10);
        assert_eq!(arena.size(a + 0x10), 0);
    }

    #[test]
    fn resize_in_place_respects_neighbours() {
        let mut arena = Arena::new(0, 0x400, 0x80);
        let a = arena.alloc(0x80).unwrap();
        let _b = arena.alloc(0x80).unwrap();
        assert!(arena.resize_in_place(a, 0x40));
        assert_eq!(arena.size(a), 0x40);
        assert!(!arena.resize_in_place(a, 0x81));
        assert!(arena.resize_in_place(a, 0x80));
    }

    #[test]
    fn oversized_resize_fails_without_touching_the_block() {
        let mut arena = Arena::new(0, 0x1000, 0x10);
        let _a = arena.alloc(16).unwrap();
        let b = arena.alloc(16).unwrap();
        assert!(!arena.resize_in_place(b, 0xFFFF_FFF0));
        assert_eq!(arena.size(b), 16);
        assert_eq!(arena.used(), 0x20);
        assert_eq!(arena.alloc(16), Some(0x20));
    }

    #[test]
    fn window_is_clamped_to_the_address_space() {
        let mut arena = Arena::new(0xFFFF_F000, 0x2000, 0x10);
        assert_eq!(arena.capacity(), 0x1000);
        assert_eq!(arena.alloc(0x1000), Some(0xFFFF_F000));
        assert!(arena.alloc(1).is_none());
        assert_eq!(arena.bytes(0xFFFF_FFFF).map(<[u8]>::len), Some(1));
    }

    #[test]
    fn double_free_is_reported() {
        let mut arena = Arena::new(0, 0x100, 0x10);
        let a = arena.alloc(4).unwrap();
        assert!(arena.free(a));
        assert!(!arena.free(a));
    }
}
