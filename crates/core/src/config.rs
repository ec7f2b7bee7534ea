//! Processor configuration.

use crate::error::ProcessorError;
use crate::params::{param_f32_array, param_u32};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Colour used by [`Processor::clear`](crate::Processor::clear) unless
/// configured otherwise.
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

/// Size of the processor's output and its default clear colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],
}

fn default_clear_color() -> [f32; 4] {
    DEFAULT_CLEAR_COLOR
}

impl ProcessorConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            clear_color: DEFAULT_CLEAR_COLOR,
        }
    }

    /// Reads `width`, `height` and `clear_color` leniently, then validates.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` if either dimension is missing or zero.
    pub fn from_json(params: &Value) -> Result<Self, ProcessorError> {
        let config = Self {
            width: param_u32(params, "width", 0),
            height: param_u32(params, "height", 0),
            clear_color: param_f32_array(params, "clear_color", DEFAULT_CLEAR_COLOR),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that both dimensions are non-zero and fit a GL `i32`.
    pub fn validate(&self) -> Result<(), ProcessorError> {
        validate_size(self.width, self.height)
    }
}

pub(crate) fn validate_size(width: u32, height: u32) -> Result<(), ProcessorError> {
    if width == 0 || height == 0 {
        return Err(ProcessorError::InvalidDimensions);
    }
    if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
        return Err(ProcessorError::InvalidDimensions);
    }
    Ok(())
}
