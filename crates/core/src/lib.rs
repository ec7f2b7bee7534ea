#![deny(unsafe_code)]
//! Core of the shaderpass GPU image processing library.
//!
//! Provides the chainable [`Processor`] that runs one shader pass over
//! rasters and render targets, the [`Raster`] input type, the
//! [`GraphicsContext`] seam over GL, and parameter helpers.

pub mod config;
pub mod error;
pub mod params;
pub mod processor;
pub mod raster;
pub mod render;

pub use config::{ProcessorConfig, DEFAULT_CLEAR_COLOR};
pub use error::ProcessorError;
pub use processor::Processor;
pub use raster::{PixelData, PixelType, Raster};
pub use render::{
    FramebufferFormat, FramebufferOutput, Geometry, GraphicsContext, Primitive, ShaderProgram,
    TextureOptions, UniformValue,
};
