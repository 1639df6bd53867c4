//! Safe Rust ownership layer for the FRIED image codec.
//!
//! The codec itself is a separate native library reached through a small C
//! ABI. This crate does not compress anything; it holds the buffers that
//! cross that boundary and frees each one exactly once, with the allocator
//! that produced it:
//! - [`RawImageBuffer`] holds pixels and, once known, their dimensions. The
//!   encoder takes RGBA8; decoded grayscale streams use two bytes per pixel.
//! - [`EncodedImageBuffer`] holds a compressed FRIED stream.
//! - [`Codec`] is the only way into native code, and the only way to obtain
//!   buffers whose memory belongs to the codec.
//!
//! ```no_run
//! use fried::{Codec, FriedFlags};
//!
//! # fn main() -> fried::Result<()> {
//! let codec = Codec::from_env()?;
//! let fried = codec.load_encoded_image("photo.fried")?;
//! let image = fried.decompress()?;
//! let again = image.compress(FriedFlags::DEFAULT | FriedFlags::SAVEALPHA, 32)?;
//! again.save("photo-again.fried")?;
//! # Ok(())
//! # }
//! ```
//!
//! Buffers are neither `Send` nor `Sync`; share a [`Codec`] across threads
//! instead and build buffers where they are used.

/// Low-level bindings to the FRIED library. Most users should favor the safe
/// wrappers re-exported from this crate.
pub use fried_sys as sys;

mod alloc;
mod codec;
mod config;
mod encoded;
mod error;
mod raw;
mod types;

pub use alloc::Origin;
pub use codec::{Backend, Codec, NativeBackend};
pub use config::{CodecConfig, LIBRARY_ENV};
pub use encoded::EncodedImageBuffer;
pub use error::{Error, Result};
pub use raw::RawImageBuffer;
pub use types::{BYTES_PER_PIXEL, Dimensions, FriedFlags, GRAY_BYTES_PER_PIXEL};

use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

static DEFAULT_CODEC: OnceLock<Codec> = OnceLock::new();

/// Process-wide codec loaded from the environment on first use.
pub fn default_codec() -> Result<&'static Codec> {
    if let Some(codec) = DEFAULT_CODEC.get() {
        return Ok(codec);
    }
    let codec = Codec::from_env()?;
    Ok(DEFAULT_CODEC.get_or_init(|| codec))
}

/// See [`Codec::probe_supported_version`].
pub fn supported_file_version() -> Result<String> {
    default_codec()?.probe_supported_version()
}

/// See [`Codec::encode_file`]. Also false when no codec can be loaded.
pub fn encode_file(input: impl AsRef<Path>, output: impl AsRef<Path>, quality: u8) -> bool {
    match default_codec() {
        Ok(codec) => codec.encode_file(input, output, quality),
        Err(err) => {
            warn!(%err, "no FRIED codec available");
            false
        }
    }
}

/// See [`Codec::decode_file`]. Also false when no codec can be loaded.
pub fn decode_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> bool {
    match default_codec() {
        Ok(codec) => codec.decode_file(input, output),
        Err(err) => {
            warn!(%err, "no FRIED codec available");
            false
        }
    }
}

/// See [`Codec::load_raw_image`].
pub fn load_raw_image(path: impl AsRef<Path>) -> Result<RawImageBuffer> {
    default_codec()?.load_raw_image(path)
}

/// See [`Codec::load_encoded_image`].
pub fn load_encoded_image(path: impl AsRef<Path>) -> Result<EncodedImageBuffer> {
    default_codec()?.load_encoded_image(path)
}
