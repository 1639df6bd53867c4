use std::io;

/// Error produced by the safe wrappers around the FRIED codec.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Data access on a buffer whose memory has already been released.
    #[error("{0} has been released")]
    Disposed(&'static str),
    /// The codec reported a failed decode, or produced unusable output.
    #[error("FRIED decode failed: {0}")]
    Decode(String),
    /// The codec reported a failed encode, or produced unusable output.
    #[error("FRIED encode failed: {0}")]
    Encode(String),
    /// Compression needs width and height, which bytes alone do not carry.
    #[error("image dimensions are unknown; decode the image or set them explicitly")]
    UnknownDimensions,
    #[error("invalid parameter: {0}")]
    InvalidParam(String),
    /// The library's version string was null or not UTF-8.
    #[error("unreadable codec version: {0}")]
    Version(String),
    /// Opening the shared library or resolving a symbol failed.
    #[error("failed to load FRIED library: {0}")]
    Load(#[from] fried_sys::libloading::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_param(msg: impl Into<String>) -> Self {
        Self::InvalidParam(msg.into())
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub(crate) fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// True for the use-after-release condition.
    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed(_))
    }
}
