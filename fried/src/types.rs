use crate::error::{Error, Result};
use crate::sys;
use std::ops::{BitOr, BitOrAssign};

/// Bytes per pixel of the images the encoder consumes (RGBA8).
///
/// Decoded colour streams come back in the same layout. Grayscale streams
/// decode to [`GRAY_BYTES_PER_PIXEL`] instead, so such an image must be
/// expanded to RGBA8 before it can be compressed again.
pub const BYTES_PER_PIXEL: usize = 4;

/// Bytes per pixel of a decoded grayscale stream (gray and alpha).
pub const GRAY_BYTES_PER_PIXEL: usize = 2;

/// Save options passed to the encoder.
///
/// Bits beyond the named constants are codec-defined and forwarded untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FriedFlags(i32);

impl FriedFlags {
    pub const DEFAULT: Self = Self(sys::FRIED_DEFAULT);
    pub const GRAYSCALE: Self = Self(sys::FRIED_GRAYSCALE);
    pub const SAVEALPHA: Self = Self(sys::FRIED_SAVEALPHA);

    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> i32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FriedFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FriedFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Width and height of a raw image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_param("width and height must be non-zero"));
        }
        Ok(Self { width, height })
    }

    /// Size of a packed RGBA8 buffer with these dimensions.
    pub fn rgba_len(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| Error::invalid_param("buffer size overflow"))
    }

    pub(crate) fn to_ffi(self) -> Result<(i32, i32)> {
        let w = i32::try_from(self.width).map_err(|_| Error::invalid_param("width exceeds i32"))?;
        let h =
            i32::try_from(self.height).map_err(|_| Error::invalid_param("height exceeds i32"))?;
        Ok((w, h))
    }

    pub(crate) fn from_ffi(width: i32, height: i32) -> Option<Self> {
        let width = u32::try_from(width).ok()?;
        let height = u32::try_from(height).ok()?;
        Self::new(width, height).ok()
    }

    /// Reject `len` if it cannot hold a full RGBA8 image of these dimensions.
    pub(crate) fn check_fits(&self, len: usize) -> Result<()> {
        let expected = self.rgba_len()?;
        if len < expected {
            return Err(Error::invalid_param(format!(
                "buffer of {len} bytes smaller than {}x{}x{BYTES_PER_PIXEL} (RGBA8)",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Whether `len` bytes can hold a decoded image of these dimensions in
    /// its smallest layout.
    pub(crate) fn holds_decoded(&self, len: usize) -> bool {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(GRAY_BYTES_PER_PIXEL))
            .is_some_and(|min| len >= min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine_with_or() {
        let flags = FriedFlags::DEFAULT | FriedFlags::SAVEALPHA;
        assert_eq!(flags.bits(), 0x2);
        assert!(flags.contains(FriedFlags::SAVEALPHA));
        assert!(!flags.contains(FriedFlags::GRAYSCALE));

        let mut more = flags;
        more |= FriedFlags::from_bits(0x40);
        assert_eq!(more.bits(), 0x42);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(Dimensions::new(0, 4).is_err());
        assert!(Dimensions::new(4, 0).is_err());
        assert!(Dimensions::from_ffi(-1, 4).is_none());
    }

    #[test]
    fn rgba_len_checks_overflow() {
        let dims = Dimensions::new(3, 2).unwrap();
        assert_eq!(dims.rgba_len().unwrap(), 24);
        assert!(dims.check_fits(24).is_ok());
        assert!(dims.check_fits(23).is_err());

        let huge = Dimensions::new(u32::MAX, u32::MAX).unwrap();
        assert!(huge.rgba_len().is_err());
        assert!(huge.to_ffi().is_err());
    }

    #[test]
    fn decoded_len_allows_grayscale_layout() {
        let dims = Dimensions::new(4, 4).unwrap();
        assert!(dims.holds_decoded(64));
        assert!(dims.holds_decoded(32));
        assert!(!dims.holds_decoded(31));
        assert!(!dims.holds_decoded(0));
        assert!(dims.check_fits(32).is_err());
    }
}
