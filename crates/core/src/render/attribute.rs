//! Vertex attribute layout.

use crate::error::ProcessorError;
use std::mem::size_of;

const FLOAT_BYTES: u32 = size_of::<f32>() as u32;

/// How one named shader input is read from the interleaved vertex buffer.
///
/// `stride` and `offset` count `f32`s, not bytes. A constructed attribute
/// always has 1 to 4 components and byte values that fit a GL `i32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    components: u32,
    stride: u32,
    offset: u32,
}

impl Attribute {
    /// # Errors
    ///
    /// Returns `InvalidAttribute` if `components` is outside `1..=4`, or
    /// if `stride` or `offset` overflows an `i32` once converted to bytes.
    pub fn new(name: &str, components: u32, stride: u32, offset: u32) -> Result<Self, ProcessorError> {
        if !(1..=4).contains(&components) {
            return Err(ProcessorError::InvalidAttribute {
                name: name.to_string(),
                reason: format!("{components} components, expected 1 to 4"),
            });
        }
        float_bytes(name, "stride", stride)?;
        float_bytes(name, "offset", offset)?;
        Ok(Self {
            name: name.to_string(),
            components,
            stride,
            offset,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> u32 {
        self.components
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Component count as `vertex_attrib_pointer` expects.
    pub fn size(&self) -> i32 {
        // 1..=4, checked in `new`.
        self.components as i32
    }

    /// Stride in bytes, as `vertex_attrib_pointer` expects.
    pub fn stride_bytes(&self) -> i32 {
        (self.stride * FLOAT_BYTES) as i32
    }

    /// Offset in bytes, as `vertex_attrib_pointer` expects.
    pub fn offset_bytes(&self) -> i32 {
        (self.offset * FLOAT_BYTES) as i32
    }
}

fn float_bytes(name: &str, field: &str, floats: u32) -> Result<i32, ProcessorError> {
    floats
        .checked_mul(FLOAT_BYTES)
        .and_then(|bytes| i32::try_from(bytes).ok())
        .ok_or_else(|| ProcessorError::InvalidAttribute {
            name: name.to_string(),
            reason: format!("{field} of {floats} floats does not fit a GL byte offset"),
        })
}
