use crate::alloc::{Allocation, Origin};
use crate::codec::Codec;
use crate::error::Result;
use crate::raw::RawImageBuffer;
use crate::sys;
use std::path::Path;
use std::ptr::NonNull;

const KIND: &str = "EncodedImageBuffer";

/// A compressed ("fried") byte stream.
///
/// Ownership follows the same rules as [`RawImageBuffer`]: host memory for
/// buffers built from bytes, codec memory for encoder output.
pub struct EncodedImageBuffer {
    alloc: Allocation,
    codec: Codec,
}

impl EncodedImageBuffer {
    /// Copy an existing stream into host memory.
    pub fn from_bytes(codec: &Codec, bytes: &[u8]) -> Self {
        Self {
            alloc: Allocation::copy_from_host(KIND, bytes),
            codec: codec.clone(),
        }
    }

    /// Wrap encoder output without copying.
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by `codec`, be valid for `len` bytes and
    /// not be owned elsewhere.
    pub(crate) unsafe fn from_codec_output(codec: &Codec, ptr: NonNull<u8>, len: usize) -> Self {
        Self {
            // SAFETY: forwarded from the caller.
            alloc: unsafe { Allocation::from_codec(KIND, codec.clone(), ptr, len) },
            codec: codec.clone(),
        }
    }

    /// Decode this stream into a new, independently owned raw image.
    pub fn decompress(&self) -> Result<RawImageBuffer> {
        self.codec.decode(self.view()?)
    }

    /// Whether the stream starts with the `FRIED002` signature.
    pub fn has_signature(&self) -> Result<bool> {
        Ok(self.view()?.starts_with(sys::FRIED_FILE_VERSION))
    }

    /// Write the stream to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.view()?)?;
        Ok(())
    }

    pub fn view(&self) -> Result<&[u8]> {
        self.alloc.as_slice()
    }

    pub fn view_mut(&mut self) -> Result<&mut [u8]> {
        self.alloc.as_mut_slice()
    }

    pub fn release(&mut self) {
        self.alloc.release();
    }

    pub fn is_released(&self) -> bool {
        self.alloc.is_released()
    }

    pub fn origin(&self) -> Origin {
        self.alloc.origin()
    }

    pub fn len(&self) -> usize {
        self.alloc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alloc.len() == 0
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }
}

impl std::fmt::Debug for EncodedImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImageBuffer")
            .field("len", &self.len())
            .field("origin", &self.origin())
            .field("released", &self.is_released())
            .finish()
    }
}
