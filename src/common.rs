//! Common types shared between the codec and the row allocator.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rows::RowTable;

/// Describes how a pixel is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ColorType {
    /// 1 grayscale sample.
    Grayscale = 0,
    /// 1 red sample, 1 green sample, 1 blue sample.
    Rgb = 2,
    /// 1 sample for the palette index.
    Indexed = 3,
    /// 1 grayscale sample, then 1 alpha sample.
    GrayscaleAlpha = 4,
    /// 1 red sample, 1 green sample, 1 blue sample, and finally, 1 alpha sample.
    Rgba = 6,
}

impl ColorType {
    /// Returns the number of samples used per pixel encoded in this way.
    pub fn samples(self) -> usize {
        self.samples_u8().into()
    }

    pub(crate) fn samples_u8(self) -> u8 {
        use self::ColorType::*;
        match self {
            Grayscale | Indexed => 1,
            Rgb => 3,
            GrayscaleAlpha => 2,
            Rgba => 4,
        }
    }

    /// u8 -> Self. Temporary solution until Rust provides a canonical one.
    pub fn from_u8(n: u8) -> Option<ColorType> {
        match n {
            0 => Some(ColorType::Grayscale),
            2 => Some(ColorType::Rgb),
            3 => Some(ColorType::Indexed),
            4 => Some(ColorType::GrayscaleAlpha),
            6 => Some(ColorType::Rgba),
            _ => None,
        }
    }
}

/// Bit depth of the image.
/// Specifies the number of bits per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum BitDepth {
    /// 1 bit per sample.
    One = 1,
    /// 2 bits per sample.
    Two = 2,
    /// 4 bits per sample.
    Four = 4,
    /// 8 bits per sample.
    Eight = 8,
    /// 16 bits per sample.
    Sixteen = 16,
}

impl BitDepth {
    /// u8 -> Self. Temporary solution until Rust provides a canonical one.
    pub fn from_u8(n: u8) -> Option<BitDepth> {
        match n {
            1 => Some(BitDepth::One),
            2 => Some(BitDepth::Two),
            4 => Some(BitDepth::Four),
            8 => Some(BitDepth::Eight),
            16 => Some(BitDepth::Sixteen),
            _ => None,
        }
    }

    pub(crate) fn into_u8(self) -> u8 {
        self as u8
    }
}

/// Image header information together with the registered row storage.
///
/// Plays the role of the decoding context: it supplies the dimensions the
/// allocator works from and owns the row table once one has been registered
/// through [`set_rows`](Self::set_rows). Dropping the info drops the rows.
#[derive(Debug)]
pub struct ImageInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels, which is the number of rows.
    pub height: u32,
    /// Bits per sample.
    pub bit_depth: BitDepth,
    /// How pixel samples are laid out.
    pub color_type: ColorType,
    rows: Option<RowTable>,
}

impl Default for ImageInfo {
    fn default() -> ImageInfo {
        ImageInfo {
            width: 0,
            height: 0,
            bit_depth: BitDepth::Eight,
            color_type: ColorType::Grayscale,
            rows: None,
        }
    }
}

impl ImageInfo {
    /// A utility constructor for a default info with width and height.
    pub fn with_size(width: u32, height: u32) -> Self {
        ImageInfo {
            width,
            height,
            ..Default::default()
        }
    }

    /// Size of the image, width then height.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the number of bits per pixel.
    pub fn bits_per_pixel(&self) -> usize {
        self.color_type.samples() * self.bit_depth as usize
    }

    /// Returns the number of bytes per pixel, with sub-byte depths rounded up.
    pub fn bytes_per_pixel(&self) -> usize {
        self.color_type.samples() * ((self.bit_depth as usize + 7) >> 3)
    }

    /// Returns the number of bytes needed to store one row's pixel data, or
    /// `None` when that count does not fit the address space.
    ///
    /// A zero width yields `Some(0)`; the allocator treats both outcomes as
    /// unrepresentable.
    pub fn checked_row_bytes(&self) -> Option<usize> {
        // No overflow can occur in 64 bits, we multiply 32-bit with 5 more bits.
        let bits = u64::from(self.width)
            * u64::from(self.color_type.samples_u8())
            * u64::from(self.bit_depth.into_u8());
        usize::try_from((bits + 7) / 8).ok()
    }

    /// Borrows the registered row table, if any.
    pub fn rows(&self) -> Option<&RowTable> {
        self.rows.as_ref()
    }

    /// Mutably borrows the registered row table, if any.
    pub fn rows_mut(&mut self) -> Option<&mut RowTable> {
        self.rows.as_mut()
    }

    /// Registers `rows` as this image's row storage, replacing and dropping
    /// any table registered earlier.
    pub fn set_rows(&mut self, rows: RowTable) {
        self.rows = Some(rows);
    }

    /// Removes and returns the registered row table.
    pub fn take_rows(&mut self) -> Option<RowTable> {
        self.rows.take()
    }
}
