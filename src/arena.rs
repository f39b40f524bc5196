//! Fixed-capacity bump allocator for [`Octant`]s, grounded on
//! `barnes-hut/arena.h`'s slot arena. Backed by a lazily-committed anonymous
//! mapping so a multi-GiB capacity costs nothing until touched.

use memmap2::MmapMut;

use crate::error::Error;
use crate::octant::Octant;

/// Reserved handle distinct from any legal slot.
pub const NONE_INDEX: u32 = u32::MAX;

/// Opaque index into an [`Arena`]'s slots. Stable until the arena's next
/// [`Arena::reset`]; never dereferenced directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle(u32);

impl Handle {
    pub const NONE: Handle = Handle(NONE_INDEX);

    pub fn is_none(self) -> bool {
        self.0 == NONE_INDEX
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

impl Default for Handle {
    fn default() -> Self {
        Handle::NONE
    }
}

/// A contiguous region partitioned into fixed-size octant slots, bump
/// allocated and reset wholesale between steps. No destructors run on
/// discarded nodes; they are trivially overwritten by the next build.
pub struct Arena {
    mmap: MmapMut,
    capacity: u32,
    cursor: u32,
}

impl Arena {
    /// Maps `capacity_bytes` worth of zero-fill-on-demand anonymous memory
    /// and carves it into `size_of::<Octant>()` slots.
    pub fn with_capacity(capacity_bytes: usize) -> Result<Self, Error> {
        let slot_size = std::mem::size_of::<Octant>();
        let capacity = (capacity_bytes / slot_size) as u32;
        let mmap = MmapMut::map_anon(capacity_bytes).map_err(|_| Error::OutOfMemory)?;
        Ok(Self {
            mmap,
            capacity,
            cursor: 0,
        })
    }

    /// Rewinds the bump cursor to zero. O(1): every handle issued before
    /// this call becomes semantically invalid, with no diagnostic.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> u32 {
        self.cursor
    }

    /// Writes `octant` into the next free slot and returns its handle.
    pub fn alloc(&mut self, octant: Octant) -> Result<Handle, Error> {
        if self.cursor >= self.capacity {
            return Err(Error::OutOfMemory);
        }
        let index = self.cursor;
        self.cursor += 1;

        let slot_size = std::mem::size_of::<Octant>();
        let byte_offset = index as usize * slot_size;
        // SAFETY: byte_offset + slot_size <= capacity_bytes by the cursor
        // check above, and the destination is exclusively ours: no other
        // handle aliases this slot until the next reset.
        unsafe {
            let ptr = self.mmap.as_mut_ptr().add(byte_offset) as *mut Octant;
            ptr.write(octant);
        }
        Ok(Handle(index))
    }

    pub fn get(&self, handle: Handle) -> &Octant {
        debug_assert!(handle.is_some());
        debug_assert!(handle.0 < self.cursor);
        let slot_size = std::mem::size_of::<Octant>();
        let byte_offset = handle.0 as usize * slot_size;
        // SAFETY: handle was issued by `alloc` on this arena since the last
        // reset, so byte_offset falls within a previously initialized slot.
        unsafe { &*(self.mmap.as_ptr().add(byte_offset) as *const Octant) }
    }

    pub fn get_mut(&mut self, handle: Handle) -> &mut Octant {
        debug_assert!(handle.is_some());
        debug_assert!(handle.0 < self.cursor);
        let slot_size = std::mem::size_of::<Octant>();
        let byte_offset = handle.0 as usize * slot_size;
        // SAFETY: see `get`; `&mut self` guarantees exclusive access.
        unsafe { &mut *(self.mmap.as_mut_ptr().add(byte_offset) as *mut Octant) }
    }
}
