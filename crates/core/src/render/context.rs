//! GPU capability detection.
//!
//! Float render targets and linear filtering of float textures are
//! optional in WebGL2 / GL ES 3.0. `Capabilities` queries the relevant
//! extensions once so passes can fail fast or pick a fallback.

use super::backend::GraphicsContext;

/// Extension enabling `RGBA32F` color attachments.
pub const EXT_COLOR_BUFFER_FLOAT: &str = "EXT_color_buffer_float";
/// Extension enabling `LINEAR` filtering of 32-bit float textures.
pub const OES_TEXTURE_FLOAT_LINEAR: &str = "OES_texture_float_linear";

/// Optional GPU features detected on a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Float textures can be rendered into.
    pub color_buffer_float: bool,
    /// Float textures can be sampled with `LINEAR` filtering.
    pub float_linear: bool,
}

impl Capabilities {
    /// Queries the context's extension list.
    pub fn detect<C: GraphicsContext>(gl: &C) -> Self {
        let caps = Self {
            color_buffer_float: gl.supports_extension(EXT_COLOR_BUFFER_FLOAT),
            float_linear: gl.supports_extension(OES_TEXTURE_FLOAT_LINEAR),
        };
        log::debug!("detected GPU capabilities: {caps:?}");
        caps
    }
}
