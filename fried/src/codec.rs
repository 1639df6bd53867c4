use crate::config::CodecConfig;
use crate::encoded::EncodedImageBuffer;
use crate::error::{Error, Result};
use crate::raw::RawImageBuffer;
use crate::sys;
use crate::types::{Dimensions, FriedFlags};
use std::ffi::{CStr, CString};
use std::fmt;
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Arc;
use tracing::{debug, warn};

/// The raw operations of a FRIED codec implementation.
///
/// [`NativeBackend`] forwards to the shared library. Other implementations
/// exist mainly to instrument allocation in tests.
///
/// # Safety
///
/// Implementors must uphold the native contract: pointers returned by `load`
/// and `save` are valid for the reported size, exclusively owned by the
/// caller, and accepted exactly once by `free`.
pub unsafe trait Backend: Send + Sync {
    /// Format identifier of the streams this codec reads and writes.
    fn supported_file_version(&self) -> Option<&CStr>;

    /// Decode `size` bytes at `data` into a codec-allocated image.
    ///
    /// The output is RGBA8 for colour streams and two bytes per pixel (gray
    /// and alpha) for grayscale streams.
    ///
    /// # Safety
    ///
    /// `data` must be valid for reads of `size` bytes.
    unsafe fn load(
        &self,
        data: *const u8,
        size: i32,
        xout: &mut i32,
        yout: &mut i32,
        out_size: &mut i32,
        dataout: &mut *mut u8,
    ) -> bool;

    /// Encode an RGBA8 image into a codec-allocated stream.
    ///
    /// # Safety
    ///
    /// `image` must be valid for reads of `xsize * ysize * 4` bytes.
    unsafe fn save(
        &self,
        image: *const u8,
        xsize: i32,
        ysize: i32,
        flags: i32,
        quality: u8,
        out_size: &mut i32,
    ) -> *mut u8;

    /// Free memory returned by `load` or `save`.
    ///
    /// # Safety
    ///
    /// `allocated` must come from this backend and not have been freed.
    unsafe fn free(&self, allocated: *mut u8);

    fn encode_file(&self, input: &CStr, output: &CStr, quality: u8) -> bool;

    fn decode_file(&self, input: &CStr, output: &CStr) -> bool;
}

/// [`Backend`] over a dynamically loaded `fried_shared` library.
pub struct NativeBackend {
    lib: sys::FriedLibrary,
}

impl NativeBackend {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        // SAFETY: the library is trusted to export the FRIED C ABI.
        let lib = unsafe { sys::FriedLibrary::new(path.as_os_str()) }?;
        debug!(path = %path.display(), "loaded FRIED library");
        Ok(Self { lib })
    }
}

unsafe impl Backend for NativeBackend {
    fn supported_file_version(&self) -> Option<&CStr> {
        let ptr = unsafe { (self.lib.getSupportedFileVersion)() };
        if ptr.is_null() {
            None
        } else {
            // SAFETY: the library returns a static, null-terminated string.
            Some(unsafe { CStr::from_ptr(ptr) })
        }
    }

    unsafe fn load(
        &self,
        data: *const u8,
        size: i32,
        xout: &mut i32,
        yout: &mut i32,
        out_size: &mut i32,
        dataout: &mut *mut u8,
    ) -> bool {
        unsafe { (self.lib.LoadFRIED)(data, size, xout, yout, out_size, dataout) }
    }

    unsafe fn save(
        &self,
        image: *const u8,
        xsize: i32,
        ysize: i32,
        flags: i32,
        quality: u8,
        out_size: &mut i32,
    ) -> *mut u8 {
        unsafe { (self.lib.SaveFRIED)(image, xsize, ysize, flags, quality, out_size) }
    }

    unsafe fn free(&self, allocated: *mut u8) {
        unsafe { (self.lib.FreeFRIED)(allocated) }
    }

    fn encode_file(&self, input: &CStr, output: &CStr, quality: u8) -> bool {
        unsafe { (self.lib.fried_encode)(input.as_ptr(), output.as_ptr(), quality) }
    }

    fn decode_file(&self, input: &CStr, output: &CStr) -> bool {
        unsafe { (self.lib.fried_decode)(input.as_ptr(), output.as_ptr()) }
    }
}

/// Handle to a FRIED codec; the only path from this crate into native code.
///
/// Cloning is cheap and every clone shares the same backend. Buffers produced
/// by the codec keep a clone so they can hand their memory back to it.
#[derive(Clone)]
pub struct Codec {
    backend: Arc<dyn Backend>,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("backend", &Arc::as_ptr(&self.backend))
            .finish()
    }
}

impl Codec {
    /// Load the shared library at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_backend(NativeBackend::load(path)?))
    }

    pub fn from_config(config: &CodecConfig) -> Result<Self> {
        Self::load(config.library_path())
    }

    /// Load the library named by `FRIED_LIBRARY`, or the default one.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&CodecConfig::from_env())
    }

    pub fn with_backend<B: Backend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Version tag of the supported stream format, e.g. `FRIED002`.
    pub fn probe_supported_version(&self) -> Result<String> {
        let version = self
            .backend
            .supported_file_version()
            .ok_or_else(|| Error::Version("null version string".to_string()))?;
        version
            .to_str()
            .map(str::to_owned)
            .map_err(|e| Error::Version(e.to_string()))
    }

    /// Decode a FRIED stream into a codec-allocated raw image.
    pub(crate) fn decode(&self, data: &[u8]) -> Result<RawImageBuffer> {
        let size = i32::try_from(data.len())
            .map_err(|_| Error::invalid_param("stream larger than i32::MAX bytes"))?;
        let (mut xout, mut yout, mut out_size) = (0i32, 0i32, 0i32);
        let mut dataout: *mut u8 = ptr::null_mut();
        // SAFETY: `data` is valid for `size` bytes and the out-params are locals.
        let ok = unsafe {
            self.backend
                .load(data.as_ptr(), size, &mut xout, &mut yout, &mut out_size, &mut dataout)
        };
        if !ok {
            // Outputs are unspecified on failure and are left untouched.
            warn!(size, "codec rejected FRIED stream");
            return Err(Error::decode("codec rejected the stream"));
        }
        let Some(ptr) = NonNull::new(dataout) else {
            warn!(size, "codec reported success with a null image");
            return Err(Error::decode("codec returned a null image"));
        };
        // Take ownership first, so the region is freed on every exit below.
        let len = usize::try_from(out_size).unwrap_or(0);
        // SAFETY: the pointer was just produced by this codec's decode.
        let image = unsafe { RawImageBuffer::from_codec_output(self, None, ptr, len) };
        if out_size <= 0 {
            warn!(out_size, "codec returned an empty image");
            return Err(Error::decode(format!("codec returned invalid size {out_size}")));
        }
        let Some(dims) = Dimensions::from_ffi(xout, yout) else {
            return Err(Error::decode(format!(
                "codec returned invalid dimensions {xout}x{yout}"
            )));
        };
        if !dims.holds_decoded(len) {
            warn!(width = dims.width, height = dims.height, len, "decoded image too small");
            return Err(Error::decode(format!(
                "codec returned {len} bytes for a {xout}x{yout} image"
            )));
        }
        debug!(width = dims.width, height = dims.height, len, "decoded FRIED stream");
        Ok(image.with_known_dimensions(dims))
    }

    /// Encode a packed RGBA8 image into a codec-allocated stream.
    pub(crate) fn encode(
        &self,
        image: &[u8],
        dims: Dimensions,
        flags: FriedFlags,
        quality: u8,
    ) -> Result<EncodedImageBuffer> {
        dims.check_fits(image.len())?;
        let (xsize, ysize) = dims.to_ffi()?;
        let mut out_size = 0i32;
        // SAFETY: `image` holds at least xsize * ysize * 4 bytes (checked above).
        let out = unsafe {
            self.backend
                .save(image.as_ptr(), xsize, ysize, flags.bits(), quality, &mut out_size)
        };
        let Some(ptr) = NonNull::new(out) else {
            warn!(xsize, ysize, quality, "codec failed to encode image");
            return Err(Error::encode("codec returned a null stream"));
        };
        let len = usize::try_from(out_size).unwrap_or(0);
        // SAFETY: the pointer was just produced by this codec's encode.
        let stream = unsafe { EncodedImageBuffer::from_codec_output(self, ptr, len) };
        if out_size <= 0 {
            warn!(out_size, "codec returned an empty stream");
            return Err(Error::encode(format!("codec returned invalid size {out_size}")));
        }
        debug!(xsize, ysize, flags = flags.bits(), quality, len, "encoded FRIED stream");
        Ok(stream)
    }

    /// Return memory to the codec that allocated it.
    ///
    /// # Safety
    ///
    /// `ptr` must have been produced by this codec and not freed yet.
    pub(crate) unsafe fn release_codec_allocated(&self, ptr: NonNull<u8>) {
        unsafe { self.backend.free(ptr.as_ptr()) }
    }

    /// Encode an image file into a FRIED file entirely on the native side.
    pub fn encode_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        quality: u8,
    ) -> bool {
        let Some((input, output)) = c_paths(input.as_ref(), output.as_ref()) else {
            return false;
        };
        self.backend.encode_file(&input, &output, quality)
    }

    /// Decode a FRIED file into an image file entirely on the native side.
    pub fn decode_file(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> bool {
        let Some((input, output)) = c_paths(input.as_ref(), output.as_ref()) else {
            return false;
        };
        self.backend.decode_file(&input, &output)
    }

    /// Read a file's bytes into a host-allocated raw buffer with unknown dimensions.
    pub fn load_raw_image(&self, path: impl AsRef<Path>) -> Result<RawImageBuffer> {
        let bytes = std::fs::read(path)?;
        Ok(RawImageBuffer::from_bytes(self, &bytes))
    }

    /// Read a FRIED file into a host-allocated encoded buffer.
    pub fn load_encoded_image(&self, path: impl AsRef<Path>) -> Result<EncodedImageBuffer> {
        let bytes = std::fs::read(path)?;
        Ok(EncodedImageBuffer::from_bytes(self, &bytes))
    }
}

fn c_paths(input: &Path, output: &Path) -> Option<(CString, CString)> {
    let paths = path_to_cstring(input).zip(path_to_cstring(output));
    if paths.is_none() {
        warn!(input = %input.display(), output = %output.display(), "path not representable as a C string");
    }
    paths
}

fn path_to_cstring(path: &Path) -> Option<CString> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        CString::new(path.as_os_str().as_bytes()).ok()
    }
    #[cfg(not(unix))]
    {
        path.to_str().and_then(|s| CString::new(s).ok())
    }
}
