//! Raw FFI bindings to the FRIED image codec.
//!
//! The codec ships as a separate shared library (`fried_shared`), so the
//! symbols are resolved at runtime through [`FriedLibrary`] rather than linked.
//! Everything in this crate is `unsafe` to call; see the `fried` crate for the
//! safe wrappers.
#![allow(non_snake_case, non_camel_case_types)]

use std::ffi::{OsStr, c_char};

pub use libloading;

pub const FRIED_DEFAULT: i32 = 0x0000;
pub const FRIED_GRAYSCALE: i32 = 0x0001;
pub const FRIED_SAVEALPHA: i32 = 0x0002;

/// Signature written at the start of every FRIED stream.
pub const FRIED_FILE_VERSION: &[u8; 8] = b"FRIED002";

/// File stem of the shared library, without platform prefix or suffix.
pub const FRIED_LIBRARY_NAME: &str = "fried_shared";

/// Directory holding the library built by the `vendored` feature, if any.
pub const FRIED_VENDORED_LIB_DIR: Option<&str> = option_env!("FRIED_VENDORED_LIB_DIR");

pub type getSupportedFileVersion_t = unsafe extern "C" fn() -> *const c_char;

/// `LoadFRIED`. The trailing out-parameters are C++ references on the native
/// side and must point to valid storage.
pub type LoadFRIED_t = unsafe extern "C" fn(
    data: *const u8,
    size: i32,
    xout: *mut i32,
    yout: *mut i32,
    out_size: *mut i32,
    dataout: *mut *mut u8,
) -> bool;

/// `SaveFRIED`. `outsize` is read and written by the codec.
pub type SaveFRIED_t = unsafe extern "C" fn(
    image: *const u8,
    xsize: i32,
    ysize: i32,
    flags: i32,
    quality: u8,
    outsize: *mut i32,
) -> *mut u8;

pub type FreeFRIED_t = unsafe extern "C" fn(allocated: *const u8);

pub type fried_encode_t =
    unsafe extern "C" fn(input_path: *const c_char, output_path: *const c_char, quality: u8) -> bool;

pub type fried_decode_t =
    unsafe extern "C" fn(input_path: *const c_char, output_path: *const c_char) -> bool;

/// Function table resolved from an opened FRIED shared library.
///
/// The [`libloading::Library`] is kept alongside the pointers, so they remain
/// valid for as long as this value lives.
pub struct FriedLibrary {
    __library: libloading::Library,
    pub getSupportedFileVersion: getSupportedFileVersion_t,
    pub LoadFRIED: LoadFRIED_t,
    pub SaveFRIED: SaveFRIED_t,
    pub FreeFRIED: FreeFRIED_t,
    pub fried_encode: fried_encode_t,
    pub fried_decode: fried_decode_t,
}

impl FriedLibrary {
    /// Open the library at `path` and resolve every exported symbol.
    ///
    /// # Safety
    ///
    /// Loading runs the library's initialisers, and the resolved symbols are
    /// trusted to have the signatures declared above.
    pub unsafe fn new<P: AsRef<OsStr>>(path: P) -> Result<Self, libloading::Error> {
        let library = unsafe { libloading::Library::new(path) }?;
        unsafe { Self::from_library(library) }
    }

    /// Resolve the symbols from an already opened library.
    ///
    /// # Safety
    ///
    /// Same contract as [`FriedLibrary::new`].
    pub unsafe fn from_library(library: libloading::Library) -> Result<Self, libloading::Error> {
        unsafe {
            let getSupportedFileVersion: getSupportedFileVersion_t = *library.get(b"getSupportedFileVersion\0")?;
            let LoadFRIED: LoadFRIED_t = *library.get(b"LoadFRIED\0")?;
            let SaveFRIED: SaveFRIED_t = *library.get(b"SaveFRIED\0")?;
            let FreeFRIED: FreeFRIED_t = *library.get(b"FreeFRIED\0")?;
            let fried_encode: fried_encode_t = *library.get(b"fried_encode\0")?;
            let fried_decode: fried_decode_t = *library.get(b"fried_decode\0")?;
            Ok(Self {
                __library: library,
                getSupportedFileVersion,
                LoadFRIED,
                SaveFRIED,
                FreeFRIED,
                fried_encode,
                fried_decode,
            })
        }
    }
}

/// Platform file name of the shared library, e.g. `libfried_shared.so`.
pub fn library_filename() -> std::ffi::OsString {
    libloading::library_filename(FRIED_LIBRARY_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_match_header() {
        assert_eq!(FRIED_DEFAULT | FRIED_SAVEALPHA, 2);
        assert_eq!(FRIED_GRAYSCALE & FRIED_SAVEALPHA, 0);
    }

    #[test]
    fn library_filename_contains_stem() {
        let name = library_filename();
        assert!(name.to_string_lossy().contains(FRIED_LIBRARY_NAME));
    }

    #[test]
    fn missing_library_fails_to_load() {
        let res = unsafe { FriedLibrary::new("/nonexistent/libfried_shared_missing.so") };
        assert!(res.is_err());
    }
}
