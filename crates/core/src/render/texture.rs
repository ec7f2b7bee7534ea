//! Texture creation helpers.
//!
//! Provides the sampling options (`WrapMode`, `Filter`, `TextureOptions`),
//! the upload format for each raster pixel type (`TexelFormat`), and
//! `create_texture` for allocating or uploading a 2D texture.

use super::backend::GraphicsContext;
use crate::error::ProcessorError;
use crate::params::param_string;
use crate::raster::PixelType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Texture coordinate wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
    Mirror,
}

impl WrapMode {
    pub fn gl(self) -> u32 {
        match self {
            WrapMode::Clamp => glow::CLAMP_TO_EDGE,
            WrapMode::Repeat => glow::REPEAT,
            WrapMode::Mirror => glow::MIRRORED_REPEAT,
        }
    }
}

impl FromStr for WrapMode {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clamp" => Ok(WrapMode::Clamp),
            "repeat" => Ok(WrapMode::Repeat),
            "mirror" => Ok(WrapMode::Mirror),
            other => Err(ProcessorError::unknown_option("wrap mode", other)),
        }
    }
}

/// Texture minification / magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    Nearest,
    Linear,
}

impl Filter {
    pub fn gl(self) -> u32 {
        match self {
            Filter::Nearest => glow::NEAREST,
            Filter::Linear => glow::LINEAR,
        }
    }
}

impl FromStr for Filter {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Filter::Nearest),
            "linear" => Ok(Filter::Linear),
            other => Err(ProcessorError::unknown_option("filter", other)),
        }
    }
}

/// Sampling options for an input texture. Defaults to clamp / nearest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureOptions {
    pub wrap: WrapMode,
    pub min_filter: Filter,
    pub mag_filter: Filter,
}

impl TextureOptions {
    /// Reads `wrap`, `min` and `mag` names from a JSON object.
    ///
    /// Missing keys use the defaults; unrecognized names are errors.
    pub fn from_json(params: &Value) -> Result<Self, ProcessorError> {
        Ok(Self {
            wrap: param_string(params, "wrap", "clamp").parse()?,
            min_filter: param_string(params, "min", "nearest").parse()?,
            mag_filter: param_string(params, "mag", "nearest").parse()?,
        })
    }

    /// Replaces `Linear` with `Nearest` on both filters.
    pub fn nearest_only(self) -> Self {
        Self {
            min_filter: Filter::Nearest,
            mag_filter: Filter::Nearest,
            ..self
        }
    }

    fn is_linear(&self) -> bool {
        self.min_filter == Filter::Linear || self.mag_filter == Filter::Linear
    }
}

/// GL internal format, client format and client type of a texture upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexelFormat {
    pub internal_format: u32,
    pub format: u32,
    pub pixel_type: u32,
}

impl TexelFormat {
    /// 8-bit luminance, sampled as `(v, v, v, 1)`.
    pub const LUMINANCE8: Self = Self {
        internal_format: glow::LUMINANCE,
        format: glow::LUMINANCE,
        pixel_type: glow::UNSIGNED_BYTE,
    };
    /// Four-channel 8-bit normalized.
    pub const RGBA8: Self = Self {
        internal_format: glow::RGBA8,
        format: glow::RGBA,
        pixel_type: glow::UNSIGNED_BYTE,
    };
    /// Four-channel 32-bit float.
    pub const RGBA32F: Self = Self {
        internal_format: glow::RGBA32F,
        format: glow::RGBA,
        pixel_type: glow::FLOAT,
    };

    /// Upload format for a raster's pixel type. Float and 16-bit gray are
    /// uploaded as gray RGBA floats (see [`crate::Raster::upload_bytes`]).
    pub fn for_raster(pixel_type: PixelType) -> Self {
        match pixel_type {
            PixelType::Uint8 => Self::LUMINANCE8,
            PixelType::Uint16 | PixelType::Float32 => Self::RGBA32F,
            PixelType::Rgba => Self::RGBA8,
        }
    }

    /// Whether samples are 32-bit floats.
    pub fn is_float(&self) -> bool {
        self.pixel_type == glow::FLOAT
    }
}

/// Everything needed to create a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    pub width: u32,
    pub height: u32,
    pub format: TexelFormat,
    pub options: TextureOptions,
}

impl TextureConfig {
    /// Config for a render target attachment: nearest sampling, clamped.
    pub fn target(width: u32, height: u32, format: TexelFormat) -> Self {
        Self {
            width,
            height,
            format,
            options: TextureOptions::default(),
        }
    }

    /// Drops linear filtering when the format is float and the GPU cannot
    /// filter float textures.
    pub fn for_capabilities(self, float_linear: bool) -> Self {
        if self.format.is_float() && self.options.is_linear() && !float_linear {
            log::warn!("linear filtering of float textures is unsupported; using nearest");
            Self {
                options: self.options.nearest_only(),
                ..self
            }
        } else {
            self
        }
    }
}

/// Converts a pixel dimension to the `i32` GL expects.
pub(crate) fn gl_size(v: u32) -> Result<i32, ProcessorError> {
    i32::try_from(v).map_err(|_| ProcessorError::InvalidDimensions)
}

/// Creates a 2D texture, uploading `pixels` or allocating storage when
/// `pixels` is `None`, and leaves `TEXTURE_2D` unbound.
///
/// Row unpack alignment is set to 1 so single-channel rows of any width
/// upload correctly.
///
/// # Errors
///
/// Returns `ProcessorError::Gpu` if the context fails to create the texture,
/// or `InvalidDimensions` if a dimension exceeds `i32::MAX`.
pub fn create_texture<C: GraphicsContext>(
    gl: &C,
    config: &TextureConfig,
    pixels: Option<&[u8]>,
) -> Result<C::Texture, ProcessorError> {
    let width = gl_size(config.width)?;
    let height = gl_size(config.height)?;
    let texture = gl.create_texture().map_err(ProcessorError::Gpu)?;

    let wrap = config.options.wrap.gl() as i32;
    gl.bind_texture(glow::TEXTURE_2D, Some(texture));
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap);
    gl.tex_parameter_i32(
        glow::TEXTURE_2D,
        glow::TEXTURE_MIN_FILTER,
        config.options.min_filter.gl() as i32,
    );
    gl.tex_parameter_i32(
        glow::TEXTURE_2D,
        glow::TEXTURE_MAG_FILTER,
        config.options.mag_filter.gl() as i32,
    );
    gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
    gl.tex_image_2d(
        glow::TEXTURE_2D,
        0,
        config.format.internal_format as i32,
        width,
        height,
        config.format.format,
        config.format.pixel_type,
        pixels,
    );
    gl.bind_texture(glow::TEXTURE_2D, None);

    log::debug!(
        "created {}x{} texture {texture:?} (internal format 0x{:04X})",
        config.width,
        config.height,
        config.format.internal_format
    );

    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{Call, RecordingContext};
    use serde_json::json;

    #[test]
    fn options_default_to_clamp_nearest() {
        let opts = TextureOptions::default();
        assert_eq!(opts.wrap, WrapMode::Clamp);
        assert_eq!(opts.min_filter, Filter::Nearest);
        assert_eq!(opts.mag_filter, Filter::Nearest);
    }

    #[test]
    fn wrap_modes_map_to_gl() {
        assert_eq!("clamp".parse::<WrapMode>().unwrap().gl(), glow::CLAMP_TO_EDGE);
        assert_eq!("repeat".parse::<WrapMode>().unwrap().gl(), glow::REPEAT);
        assert_eq!("mirror".parse::<WrapMode>().unwrap().gl(), glow::MIRRORED_REPEAT);
        assert!("wrap".parse::<WrapMode>().is_err());
    }

    #[test]
    fn filters_map_to_gl() {
        assert_eq!("nearest".parse::<Filter>().unwrap().gl(), glow::NEAREST);
        assert_eq!("linear".parse::<Filter>().unwrap().gl(), glow::LINEAR);
        assert!("cubic".parse::<Filter>().is_err());
    }

    #[test]
    fn options_from_json_reads_names() {
        let opts = TextureOptions::from_json(&json!({"wrap": "repeat", "mag": "linear"})).unwrap();
        assert_eq!(opts.wrap, WrapMode::Repeat);
        assert_eq!(opts.min_filter, Filter::Nearest);
        assert_eq!(opts.mag_filter, Filter::Linear);
    }

    #[test]
    fn options_from_json_rejects_unknown_name() {
        let err = TextureOptions::from_json(&json!({"min": "bicubic"})).unwrap_err();
        assert!(err.to_string().contains("bicubic"), "got: {err}");
    }

    #[test]
    fn options_deserialize_with_serde_defaults() {
        let opts: TextureOptions = serde_json::from_str(r#"{"wrap": "mirror"}"#).unwrap();
        assert_eq!(opts.wrap, WrapMode::Mirror);
        assert_eq!(opts.min_filter, Filter::Nearest);
    }

    #[test]
    fn texel_format_for_each_pixel_type() {
        assert_eq!(TexelFormat::for_raster(PixelType::Uint8), TexelFormat::LUMINANCE8);
        assert_eq!(TexelFormat::for_raster(PixelType::Uint16), TexelFormat::RGBA32F);
        assert_eq!(TexelFormat::for_raster(PixelType::Float32), TexelFormat::RGBA32F);
        assert_eq!(TexelFormat::for_raster(PixelType::Rgba), TexelFormat::RGBA8);
    }

    #[test]
    fn gray_formats_sample_the_same_value_on_every_channel() {
        // LUMINANCE replicates into rgb; RED-based formats would not.
        let gray8 = TexelFormat::for_raster(PixelType::Uint8);
        assert_eq!(gray8.format, glow::LUMINANCE);
        assert_ne!(gray8.format, glow::RED);
        for pixel_type in [PixelType::Uint16, PixelType::Float32] {
            let format = TexelFormat::for_raster(pixel_type);
            assert_eq!(format.format, glow::RGBA, "{pixel_type}");
            assert!(format.is_float(), "{pixel_type}");
        }
    }

    #[test]
    fn float_linear_falls_back_to_nearest_without_support() {
        let config = TextureConfig {
            width: 4,
            height: 4,
            format: TexelFormat::RGBA32F,
            options: TextureOptions {
                min_filter: Filter::Linear,
                ..TextureOptions::default()
            },
        };
        assert_eq!(
            config.for_capabilities(false).options.min_filter,
            Filter::Nearest
        );
        assert_eq!(
            config.for_capabilities(true).options.min_filter,
            Filter::Linear
        );
    }

    #[test]
    fn byte_formats_keep_linear_filtering() {
        let config = TextureConfig {
            width: 4,
            height: 4,
            format: TexelFormat::RGBA8,
            options: TextureOptions {
                mag_filter: Filter::Linear,
                ..TextureOptions::default()
            },
        };
        assert_eq!(config.for_capabilities(false), config);
    }

    #[test]
    fn create_texture_sets_parameters_and_uploads() {
        let gl = RecordingContext::new();
        let config = TextureConfig {
            width: 3,
            height: 2,
            format: TexelFormat::LUMINANCE8,
            options: TextureOptions {
                wrap: WrapMode::Repeat,
                min_filter: Filter::Linear,
                mag_filter: Filter::Nearest,
            },
        };

        let tex = create_texture(&gl, &config, Some(&[0u8; 6])).unwrap();

        assert_eq!(
            gl.calls(),
            vec![
                Call::CreateTexture(tex),
                Call::BindTexture(glow::TEXTURE_2D, Some(tex)),
                Call::TexParameter(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32),
                Call::TexParameter(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32),
                Call::TexParameter(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32),
                Call::TexParameter(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32),
                Call::PixelStore(glow::UNPACK_ALIGNMENT, 1),
                Call::TexImage2d {
                    internal_format: glow::LUMINANCE as i32,
                    width: 3,
                    height: 2,
                    format: glow::LUMINANCE,
                    pixel_type: glow::UNSIGNED_BYTE,
                    len: Some(6),
                },
                Call::BindTexture(glow::TEXTURE_2D, None),
            ]
        );
    }

    #[test]
    fn create_texture_without_pixels_allocates_storage() {
        let gl = RecordingContext::new();
        let config = TextureConfig::target(8, 8, TexelFormat::RGBA32F);
        create_texture(&gl, &config, None).unwrap();
        assert!(gl.calls().iter().any(|c| matches!(
            c,
            Call::TexImage2d { len: None, pixel_type, .. } if *pixel_type == glow::FLOAT
        )));
    }
}
