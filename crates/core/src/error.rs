//! Error types for shaderpass.

use crate::render::shader::ShaderError;
use thiserror::Error;

/// Errors produced while building or running a processing pass.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Width or height was zero, or `width * height` overflowed.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// Raster pixel data did not match `width * height * channels`.
    #[error("pixel data length mismatch: expected {expected} samples, got {got}")]
    PixelDataLength { expected: usize, got: usize },

    /// Raster pixel data variant did not match the declared pixel type.
    #[error("pixel data does not match pixel type '{0}'")]
    PixelDataType(String),

    /// An attribute registered on the processor is not active in the program.
    #[error("attribute not found in shader program: {0}")]
    UnknownAttribute(String),

    /// An attribute layout GL cannot express: components outside 1 to 4,
    /// or a stride or offset too large in bytes.
    #[error("invalid attribute '{name}': {reason}")]
    InvalidAttribute { name: String, reason: String },

    /// A uniform name is not active in the packed program.
    #[error("uniform not found in shader program: {0}")]
    UnknownUniform(String),

    /// A uniform value did not match the uniform's declared GLSL type.
    #[error("uniform type mismatch for '{name}': expected {expected}, got {got}")]
    UniformTypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    /// A uniform has a GLSL type the processor cannot set.
    #[error("unsupported uniform type 0x{gl_type:04X} for '{name}'")]
    UnsupportedUniform { name: String, gl_type: u32 },

    /// `pack_with` was called before `geometry`.
    #[error("no geometry: call geometry() before pack_with()")]
    MissingGeometry,

    /// An operation needed a packed shader program.
    #[error("no shader program: call pack_with() first")]
    MissingShader,

    /// A named framebuffer does not exist on this processor.
    #[error("framebuffer not found: {0}")]
    UnknownFramebuffer(String),

    /// A texture unit samples the render target being drawn into.
    #[error("texture unit {unit} samples framebuffer '{framebuffer}' while rendering into it")]
    FeedbackLoop { unit: u32, framebuffer: String },

    /// A textual option (wrap mode, filter, primitive...) was not recognized.
    #[error("unknown {kind}: '{value}'")]
    UnknownOption { kind: &'static str, value: String },

    /// The GPU lacks a capability needed for the requested format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Shader compilation or linking failed.
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// The graphics context failed to create an object or a framebuffer
    /// was incomplete.
    #[error("gpu error: {0}")]
    Gpu(String),
}

impl ProcessorError {
    pub(crate) fn unknown_option(kind: &'static str, value: &str) -> Self {
        ProcessorError::UnknownOption {
            kind,
            value: value.to_string(),
        }
    }
}
