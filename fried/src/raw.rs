use crate::alloc::{Allocation, Origin};
use crate::codec::Codec;
use crate::encoded::EncodedImageBuffer;
use crate::error::{Error, Result};
use crate::types::{Dimensions, FriedFlags};
use std::ptr::NonNull;

const KIND: &str = "RawImageBuffer";

/// Uncompressed pixel data plus, once known, its dimensions.
///
/// Buffers built from bytes live in host memory. Buffers returned by
/// [`EncodedImageBuffer::decompress`] live in codec memory and go back to the
/// codec when released. Either way the memory is freed exactly once, by
/// [`release`](Self::release) or on drop.
pub struct RawImageBuffer {
    dims: Option<Dimensions>,
    alloc: Allocation,
    codec: Codec,
}

impl RawImageBuffer {
    /// Copy `bytes` into host memory. Dimensions stay unknown.
    pub fn from_bytes(codec: &Codec, bytes: &[u8]) -> Self {
        Self {
            dims: None,
            alloc: Allocation::copy_from_host(KIND, bytes),
            codec: codec.clone(),
        }
    }

    /// Copy packed RGBA8 pixels of a `width` x `height` image into host memory.
    pub fn from_pixels(codec: &Codec, bytes: &[u8], width: u32, height: u32) -> Result<Self> {
        let dims = Dimensions::new(width, height)?;
        dims.check_fits(bytes.len())?;
        Ok(Self {
            dims: Some(dims),
            alloc: Allocation::copy_from_host(KIND, bytes),
            codec: codec.clone(),
        })
    }

    /// Wrap decoder output without copying.
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by `codec`, be valid for `len` bytes and
    /// not be owned elsewhere.
    pub(crate) unsafe fn from_codec_output(
        codec: &Codec,
        dims: Option<Dimensions>,
        ptr: NonNull<u8>,
        len: usize,
    ) -> Self {
        Self {
            dims,
            // SAFETY: forwarded from the caller.
            alloc: unsafe { Allocation::from_codec(KIND, codec.clone(), ptr, len) },
            codec: codec.clone(),
        }
    }

    pub(crate) fn with_known_dimensions(mut self, dims: Dimensions) -> Self {
        self.dims = Some(dims);
        self
    }

    /// Declare the dimensions of a buffer built from bytes.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Result<Self> {
        let dims = Dimensions::new(width, height)?;
        dims.check_fits(self.alloc.len())?;
        self.dims = Some(dims);
        Ok(self)
    }

    /// `None` until the image went through a decode or dimensions were set.
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dims
    }

    pub fn width(&self) -> Option<u32> {
        self.dims.map(|d| d.width)
    }

    pub fn height(&self) -> Option<u32> {
        self.dims.map(|d| d.height)
    }

    /// Encode this image; the result is a new, independently owned buffer.
    pub fn compress(&self, flags: FriedFlags, quality: u8) -> Result<EncodedImageBuffer> {
        let data = self.view()?;
        let dims = self.dims.ok_or(Error::UnknownDimensions)?;
        self.codec.encode(data, dims, flags, quality)
    }

    pub fn view(&self) -> Result<&[u8]> {
        self.alloc.as_slice()
    }

    pub fn view_mut(&mut self) -> Result<&mut [u8]> {
        self.alloc.as_mut_slice()
    }

    /// Free the pixel memory. Later calls do nothing.
    pub fn release(&mut self) {
        self.alloc.release();
    }

    pub fn is_released(&self) -> bool {
        self.alloc.is_released()
    }

    pub fn origin(&self) -> Origin {
        self.alloc.origin()
    }

    /// Size of the region in bytes, as allocated.
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

impl std::fmt::Debug for RawImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawImageBuffer")
            .field("dims", &self.dims)
            .field("len", &self.len())
            .field("origin", &self.origin())
            .field("released", &self.is_released())
            .finish()
    }
}
