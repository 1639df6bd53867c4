use crate::sys;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the FRIED shared library to load.
pub const LIBRARY_ENV: &str = "FRIED_LIBRARY";

/// Where to find the native codec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecConfig {
    /// Explicit path to the shared library. Takes precedence over everything else.
    pub library: Option<PathBuf>,
}

impl CodecConfig {
    /// Read [`LIBRARY_ENV`]; an empty value counts as unset.
    pub fn from_env() -> Self {
        Self {
            library: env::var_os(LIBRARY_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library = Some(path.into());
        self
    }

    /// Resolve the path handed to the loader.
    ///
    /// Falls back to the `vendored` build output, then to the bare platform
    /// file name so the system loader search path applies.
    pub fn library_path(&self) -> PathBuf {
        if let Some(path) = &self.library {
            return path.clone();
        }
        if let Some(dir) = sys::FRIED_VENDORED_LIB_DIR {
            let candidate = Path::new(dir).join(sys::library_filename());
            if candidate.is_file() {
                return candidate;
            }
        }
        PathBuf::from(sys::library_filename())
    }
}
