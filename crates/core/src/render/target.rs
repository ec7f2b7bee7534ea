//! Render target (FBO + texture) for off-screen passes.
//!
//! A `RenderTarget` pairs a framebuffer object with a colour texture. A
//! processor redirects its draw into a named target; the target's texture
//! can then be sampled by the next pass through a [`FramebufferOutput`].

use super::backend::GraphicsContext;
use super::context::Capabilities;
use super::texture::{create_texture, gl_size, TexelFormat, TextureConfig};
use crate::error::ProcessorError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Highest colour attachment index GL defines (`COLOR_ATTACHMENT15`).
const MAX_ATTACHMENT: u32 = 15;

/// Storage format of a render target's colour texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FramebufferFormat {
    /// `RGBA8`, always renderable.
    #[default]
    Uint8,
    /// `RGBA32F`, needs `EXT_color_buffer_float`.
    Float32,
}

impl FramebufferFormat {
    /// Texel format for this target, checked against the GPU's capabilities.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` for float targets without float render
    /// target support.
    pub fn texel_format(self, caps: &Capabilities) -> Result<TexelFormat, ProcessorError> {
        match self {
            FramebufferFormat::Uint8 => Ok(TexelFormat::RGBA8),
            FramebufferFormat::Float32 if caps.color_buffer_float => Ok(TexelFormat::RGBA32F),
            FramebufferFormat::Float32 => Err(ProcessorError::UnsupportedFormat(
                "float framebuffers need EXT_color_buffer_float".to_string(),
            )),
        }
    }
}

impl FromStr for FramebufferFormat {
    type Err = ProcessorError;

    /// `uint16` has no renderable integer-normalized format and maps to
    /// `Float32`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uint8" | "rgba" => Ok(FramebufferFormat::Uint8),
            "uint16" | "float32" => Ok(FramebufferFormat::Float32),
            other => Err(ProcessorError::unknown_option("framebuffer format", other)),
        }
    }
}

/// A copyable view of a render target's result, for sampling in another pass.
///
/// This is a snapshot of the target's texture. Resizing the target deletes
/// that texture, so take a new output after the producing pass changes
/// size. Within one processor, [`Processor::texture_from`] looks the
/// target up at draw time instead.
///
/// [`Processor::texture_from`]: crate::Processor::texture_from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferOutput<T> {
    pub texture: T,
    pub width: u32,
    pub height: u32,
}

/// An off-screen render target: a framebuffer with one colour attachment.
pub struct RenderTarget<C: GraphicsContext> {
    fbo: C::Framebuffer,
    texture: C::Texture,
    format: TexelFormat,
    attachment: u32,
    width: u32,
    height: u32,
}

impl<C: GraphicsContext> std::fmt::Debug for RenderTarget<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTarget")
            .field("fbo", &self.fbo)
            .field("texture", &self.texture)
            .field("attachment", &self.attachment)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl<C: GraphicsContext> RenderTarget<C> {
    /// Creates a framebuffer with a new texture at
    /// `COLOR_ATTACHMENT0 + attachment` and verifies completeness.
    ///
    /// For a non-zero attachment the framebuffer's draw buffers route
    /// fragment output `layout(location = attachment)` to it; lower slots
    /// are `NONE`.
    ///
    /// # Errors
    ///
    /// Returns an error if the framebuffer or texture cannot be created,
    /// if the attachment index is out of range, or if the framebuffer is
    /// not complete.
    pub fn new(
        gl: &C,
        width: u32,
        height: u32,
        format: TexelFormat,
        attachment: u32,
    ) -> Result<Self, ProcessorError> {
        if attachment > MAX_ATTACHMENT {
            return Err(ProcessorError::UnsupportedFormat(format!(
                "color attachment {attachment} out of range"
            )));
        }
        let texture = create_texture(gl, &TextureConfig::target(width, height, format), None)?;
        let fbo = match gl.create_framebuffer() {
            Ok(fbo) => fbo,
            Err(e) => {
                gl.delete_texture(texture);
                return Err(ProcessorError::Gpu(e));
            }
        };

        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
        gl.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            glow::COLOR_ATTACHMENT0 + attachment,
            glow::TEXTURE_2D,
            Some(texture),
            0,
        );
        if attachment > 0 {
            gl.draw_buffers(&draw_buffer_list(attachment));
        }

        let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);

        if status != glow::FRAMEBUFFER_COMPLETE {
            gl.delete_framebuffer(fbo);
            gl.delete_texture(texture);
            return Err(ProcessorError::Gpu(format!(
                "framebuffer incomplete: status 0x{status:04X}"
            )));
        }

        log::debug!("created {width}x{height} render target {fbo:?}");

        Ok(Self {
            fbo,
            texture,
            format,
            attachment,
            width,
            height,
        })
    }

    /// Binds this target as the draw framebuffer and sets the viewport to
    /// its size.
    pub fn bind(&self, gl: &C) {
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
        // Dimensions were validated by create_texture.
        gl.viewport(0, 0, self.width as i32, self.height as i32);
    }

    pub fn texture(&self) -> C::Texture {
        self.texture
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The texel format of the colour attachment.
    pub fn format(&self) -> TexelFormat {
        self.format
    }

    /// A handle for sampling this target in another pass.
    pub fn output(&self) -> FramebufferOutput<C::Texture> {
        FramebufferOutput {
            texture: self.texture,
            width: self.width,
            height: self.height,
        }
    }

    /// Recreates the texture at a new size, keeping the same framebuffer.
    ///
    /// The old texture is deleted only after the new one is attached and
    /// the framebuffer is complete; on failure the old texture is
    /// re-attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the new texture cannot be created or the
    /// framebuffer becomes incomplete.
    pub fn resize(&mut self, gl: &C, width: u32, height: u32) -> Result<(), ProcessorError> {
        gl_size(width)?;
        gl_size(height)?;
        let config = TextureConfig::target(width, height, self.format);
        let new_texture = create_texture(gl, &config, None)?;
        let attachment = glow::COLOR_ATTACHMENT0 + self.attachment;

        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
        gl.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            attachment,
            glow::TEXTURE_2D,
            Some(new_texture),
            0,
        );
        let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);

        if status != glow::FRAMEBUFFER_COMPLETE {
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                attachment,
                glow::TEXTURE_2D,
                Some(self.texture),
                0,
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.delete_texture(new_texture);
            return Err(ProcessorError::Gpu(format!(
                "framebuffer incomplete after resize: status 0x{status:04X}"
            )));
        }

        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        gl.delete_texture(self.texture);

        self.texture = new_texture;
        self.width = width;
        self.height = height;

        Ok(())
    }

    /// Deletes the framebuffer and texture.
    pub fn destroy(&self, gl: &C) {
        gl.delete_framebuffer(self.fbo);
        gl.delete_texture(self.texture);
    }
}

/// `[NONE, .., NONE, COLOR_ATTACHMENTn]`: GL ES requires slot `i` to name
/// `COLOR_ATTACHMENTi` or `NONE`.
fn draw_buffer_list(attachment: u32) -> Vec<u32> {
    (0..=attachment)
        .map(|i| {
            if i == attachment {
                glow::COLOR_ATTACHMENT0 + i
            } else {
                glow::NONE
            }
        })
        .collect()
}
