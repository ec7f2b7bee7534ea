//! GPU plumbing behind the [`Processor`](crate::Processor).
//!
//! Everything here is generic over [`GraphicsContext`], the thin seam over
//! the GL entry points the processor uses. `glow::Context` implements it
//! for real drawing; tests use a recording double.
//!
//! # Module overview
//!
//! - [`backend`] -- The `GraphicsContext` trait and its `glow` implementation.
//! - [`context`] -- Optional GPU capability detection.
//! - [`shader`] -- Shader compilation, linking, and program introspection.
//! - [`uniform`] -- Uniform kinds, values, and typed uploads.
//! - [`attribute`] -- Vertex attribute layout.
//! - [`geometry`] -- Vertex data and primitive modes.
//! - [`texture`] -- Texture options, formats, and creation.
//! - [`target`] -- FBO + texture render targets.
//! - [`fullscreen`] -- Stock quad vertex and copy fragment shaders.

pub mod attribute;
pub mod backend;
pub mod context;
pub mod fullscreen;
pub mod geometry;
pub mod shader;
pub mod target;
pub mod texture;
pub mod uniform;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at the render module level for convenience.
pub use attribute::Attribute;
pub use backend::{ActiveVariable, GraphicsContext};
pub use context::Capabilities;
pub use fullscreen::{COPY_FRAGMENT_SHADER, QUAD_VERTEX_SHADER};
pub use geometry::{Geometry, Primitive};
pub use shader::{
    compile_program, compile_shader, format_shader_error, link_program, ShaderError, ShaderProgram,
};
pub use target::{FramebufferFormat, FramebufferOutput, RenderTarget};
pub use texture::{create_texture, Filter, TexelFormat, TextureConfig, TextureOptions, WrapMode};
pub use uniform::{UniformKind, UniformValue};
