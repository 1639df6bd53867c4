use crate::codec::Codec;
use crate::error::{Error, Result};
use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};
use std::ptr::{self, NonNull};
use tracing::{debug, trace};

/// Which allocator produced a buffer's memory, and therefore which one frees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Allocated by this process through the global allocator.
    Host,
    /// Allocated inside the codec; returned through its own free routine.
    Codec,
}

enum Owner {
    Host,
    Codec(Codec),
}

/// Sole owner of one live memory region.
///
/// The region is freed exactly once, either by [`Allocation::release`] or on
/// drop, with the deallocator matching where it came from.
pub(crate) struct Allocation {
    ptr: Option<NonNull<u8>>,
    len: usize,
    owner: Owner,
    kind: &'static str,
}

fn host_layout(len: usize) -> Layout {
    // SAFETY: align 1 is a power of two, and every caller derives `len` from
    // an existing slice, so it never exceeds isize::MAX.
    unsafe { Layout::from_size_align_unchecked(len, 1) }
}

impl Allocation {
    /// Copy `bytes` into a fresh host allocation.
    pub(crate) fn copy_from_host(kind: &'static str, bytes: &[u8]) -> Self {
        let len = bytes.len();
        let ptr = if len == 0 {
            NonNull::dangling()
        } else {
            let layout = host_layout(len);
            // SAFETY: layout has non-zero size.
            let raw = unsafe { alloc(layout) };
            let Some(ptr) = NonNull::new(raw) else {
                handle_alloc_error(layout)
            };
            // SAFETY: both regions are valid for `len` bytes and cannot overlap.
            unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), len) };
            ptr
        };
        trace!(kind, len, origin = ?Origin::Host, "allocated buffer");
        Self {
            ptr: Some(ptr),
            len,
            owner: Owner::Host,
            kind,
        }
    }

    /// Take ownership of a region the codec allocated.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `codec`, be valid for `len` bytes, and not be
    /// owned by anything else.
    pub(crate) unsafe fn from_codec(
        kind: &'static str,
        codec: Codec,
        ptr: NonNull<u8>,
        len: usize,
    ) -> Self {
        trace!(kind, len, origin = ?Origin::Codec, "wrapped codec buffer");
        Self {
            ptr: Some(ptr),
            len,
            owner: Owner::Codec(codec),
            kind,
        }
    }

    pub(crate) fn origin(&self) -> Origin {
        match self.owner {
            Owner::Host => Origin::Host,
            Owner::Codec(_) => Origin::Codec,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_released(&self) -> bool {
        self.ptr.is_none()
    }

    pub(crate) fn as_slice(&self) -> Result<&[u8]> {
        let ptr = self.ptr.ok_or(Error::Disposed(self.kind))?;
        // SAFETY: live allocations are valid for `len` bytes and owned by self.
        Ok(unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.len) })
    }

    pub(crate) fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        let ptr = self.ptr.ok_or(Error::Disposed(self.kind))?;
        // SAFETY: as above; `&mut self` guarantees exclusive access.
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), self.len) })
    }

    /// Free the region. Returns false if it was already released.
    pub(crate) fn release(&mut self) -> bool {
        let Some(ptr) = self.ptr.take() else {
            return false;
        };
        trace!(kind = self.kind, len = self.len, origin = ?self.origin(), "releasing buffer");
        match &self.owner {
            Owner::Host => {
                if self.len != 0 {
                    // SAFETY: allocated in `copy_from_host` with this exact layout.
                    unsafe { dealloc(ptr.as_ptr(), host_layout(self.len)) };
                }
            }
            // SAFETY: the codec handed us this pointer and we have not freed it.
            Owner::Codec(codec) => unsafe { codec.release_codec_allocated(ptr) },
        }
        true
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        if !self.is_released() {
            debug!(kind = self.kind, len = self.len, "buffer released on drop");
            self.release();
        }
    }
}
