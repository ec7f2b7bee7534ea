//! CPU-side images handed to the GPU as input textures.
//!
//! A [`Raster`] is a row-major grid of samples in one of four pixel types:
//! 8-bit, 16-bit and 32-bit float grayscale, or 8-bit RGBA. It knows the
//! exact byte layout it is uploaded with, so texture creation stays a
//! straight forwarding call.

use crate::error::ProcessorError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Pixel type of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    /// 8-bit grayscale.
    Uint8,
    /// 16-bit grayscale.
    Uint16,
    /// 32-bit float grayscale.
    Float32,
    /// 8-bit RGBA colour.
    Rgba,
}

impl PixelType {
    /// Number of samples per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelType::Rgba => 4,
            _ => 1,
        }
    }

    /// Name used in options and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            PixelType::Uint8 => "uint8",
            PixelType::Uint16 => "uint16",
            PixelType::Float32 => "float32",
            PixelType::Rgba => "rgba",
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixelType {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uint8" => Ok(PixelType::Uint8),
            "uint16" => Ok(PixelType::Uint16),
            "float32" => Ok(PixelType::Float32),
            "rgba" => Ok(PixelType::Rgba),
            other => Err(ProcessorError::unknown_option("pixel type", other)),
        }
    }
}

/// Owned sample storage for a [`Raster`].
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl PixelData {
    /// Number of samples stored.
    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(v) => v.len(),
            PixelData::U16(v) => v.len(),
            PixelData::F32(v) => v.len(),
        }
    }

    /// Returns `true` if no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matches(&self, pixel_type: PixelType) -> bool {
        matches!(
            (self, pixel_type),
            (PixelData::U8(_), PixelType::Uint8 | PixelType::Rgba)
                | (PixelData::U16(_), PixelType::Uint16)
                | (PixelData::F32(_), PixelType::Float32)
        )
    }
}

/// A validated image ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixel_type: PixelType,
    data: PixelData,
}

impl Raster {
    /// Creates a raster, checking that `data` holds exactly
    /// `width * height * channels` samples of the right type.
    ///
    /// Dimensions must be non-zero and fit a GL `i32` size.
    pub fn new(
        width: u32,
        height: u32,
        pixel_type: PixelType,
        data: PixelData,
    ) -> Result<Self, ProcessorError> {
        let expected = sample_count(width, height, pixel_type)?;
        if !data.matches(pixel_type) {
            return Err(ProcessorError::PixelDataType(pixel_type.to_string()));
        }
        if data.len() != expected {
            return Err(ProcessorError::PixelDataLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixel_type,
            data,
        })
    }

    /// 8-bit grayscale raster.
    pub fn gray8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ProcessorError> {
        Self::new(width, height, PixelType::Uint8, PixelData::U8(data))
    }

    /// 16-bit grayscale raster.
    pub fn gray16(width: u32, height: u32, data: Vec<u16>) -> Result<Self, ProcessorError> {
        Self::new(width, height, PixelType::Uint16, PixelData::U16(data))
    }

    /// 32-bit float grayscale raster.
    pub fn float32(width: u32, height: u32, data: Vec<f32>) -> Result<Self, ProcessorError> {
        Self::new(width, height, PixelType::Float32, PixelData::F32(data))
    }

    /// 8-bit RGBA raster, four bytes per pixel.
    pub fn rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ProcessorError> {
        Self::new(width, height, PixelType::Rgba, PixelData::U8(data))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    /// Bytes handed to `tex_image_2d`.
    ///
    /// Gray rasters sample as `(v, v, v, 1)` in a shader. 8-bit data is
    /// passed through and uploaded as `LUMINANCE`. WebGL2 has no float
    /// luminance format, so float gray is expanded to RGBA floats; 16-bit
    /// gray is first normalized to `[0, 1]`.
    pub fn upload_bytes(&self) -> Cow<'_, [u8]> {
        match &self.data {
            PixelData::U8(v) => Cow::Borrowed(v.as_slice()),
            PixelData::F32(v) => Cow::Owned(gray_to_rgba_bytes(v.iter().copied())),
            PixelData::U16(v) => Cow::Owned(gray_to_rgba_bytes(
                v.iter().map(|&s| f32::from(s) / f32::from(u16::MAX)),
            )),
        }
    }
}

fn gray_to_rgba_bytes(samples: impl Iterator<Item = f32>) -> Vec<u8> {
    let rgba: Vec<f32> = samples.flat_map(|v| [v, v, v, 1.0]).collect();
    bytemuck::cast_slice(&rgba).to_vec()
}

fn sample_count(width: u32, height: u32, pixel_type: PixelType) -> Result<usize, ProcessorError> {
    if width == 0 || height == 0 {
        return Err(ProcessorError::InvalidDimensions);
    }
    if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
        return Err(ProcessorError::InvalidDimensions);
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(pixel_type.channels()))
        .ok_or(ProcessorError::InvalidDimensions)
}
