//! The image processing pass builder.
//!
//! A [`Processor`] owns the GPU resources of one pass: a vertex buffer, the
//! vertex array that binds it to a shader's attributes, input textures and
//! named render targets. Calls chain:
//!
//! ```text
//! processor
//!     .attribute("a_vertex", 2, 4, 0)?
//!     .attribute("a_texCoord", 2, 4, 2)?
//!     .geometry(Geometry::quad())?
//!     .pack_with(&program)?
//!     .texture(&raster, 0, TextureOptions::default())?
//!     .redirect_to("blur", FramebufferFormat::Uint8, 0)?
//!     .use_program()?
//!     .uniform("u_image", 0)?
//!     .run()?;
//! ```

use crate::config::{validate_size, ProcessorConfig};
use crate::error::ProcessorError;
use crate::raster::Raster;
use crate::render::attribute::Attribute;
use crate::render::backend::GraphicsContext;
use crate::render::context::Capabilities;
use crate::render::geometry::{Geometry, Primitive};
use crate::render::shader::ShaderProgram;
use crate::render::target::{FramebufferFormat, FramebufferOutput, RenderTarget};
use crate::render::texture::{create_texture, TexelFormat, TextureConfig, TextureOptions};
use crate::render::uniform::{UniformKind, UniformValue};
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Vertex buffer uploaded by [`Processor::geometry`].
struct VertexBuffer<B> {
    buffer: B,
    primitive: Primitive,
    count: u32,
}

/// Where a texture unit's texture comes from.
enum TextureSource<T> {
    /// Uploaded by this processor and deleted with it.
    Owned(T),
    /// Another pass's output.
    Shared(T),
    /// One of this processor's render targets, looked up at draw time.
    Target(String),
}

/// A texture sampled on `unit` during [`Processor::run`].
struct TextureBinding<T> {
    unit: u32,
    source: TextureSource<T>,
}

/// A single GPU pass over a shared graphics context.
pub struct Processor<C: GraphicsContext> {
    gl: Rc<C>,
    caps: Capabilities,
    width: u32,
    height: u32,
    /// Default framebuffer size, used by `clear_canvas`.
    canvas_width: u32,
    canvas_height: u32,
    clear_color: [f32; 4],
    attributes: Vec<Attribute>,
    vertices: Option<VertexBuffer<C::Buffer>>,
    textures: Vec<TextureBinding<C::Texture>>,
    framebuffers: HashMap<String, RenderTarget<C>>,
    program: Option<ShaderProgram<C>>,
    vao: Option<C::VertexArray>,
    /// Render target the next `run` draws into.
    target: Option<String>,
}

impl<C: GraphicsContext> Processor<C> {
    /// Creates a processor of the given output size.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` if either dimension is zero.
    pub fn new(gl: Rc<C>, width: u32, height: u32) -> Result<Self, ProcessorError> {
        Self::with_config(gl, &ProcessorConfig::new(width, height))
    }

    pub fn with_config(gl: Rc<C>, config: &ProcessorConfig) -> Result<Self, ProcessorError> {
        config.validate()?;
        let caps = Capabilities::detect(&*gl);
        Ok(Self {
            gl,
            caps,
            width: config.width,
            height: config.height,
            canvas_width: config.width,
            canvas_height: config.height,
            clear_color: config.clear_color,
            attributes: Vec::new(),
            vertices: None,
            textures: Vec::new(),
            framebuffers: HashMap::new(),
            program: None,
            vao: None,
            target: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of the default framebuffer, set at construction and by
    /// [`size`](Self::size).
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// The shared graphics context.
    pub fn context(&self) -> &Rc<C> {
        &self.gl
    }

    /// The program set by the last [`pack_with`](Self::pack_with).
    pub fn program(&self) -> Option<&ShaderProgram<C>> {
        self.program.as_ref()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Declares how the shader input `name` reads the vertex buffer.
    ///
    /// An attribute with the same name is replaced. Takes effect at the
    /// next [`pack_with`](Self::pack_with).
    ///
    /// # Errors
    ///
    /// Returns `InvalidAttribute` if `components` is outside `1..=4` or
    /// the byte stride or offset overflows. Declared attributes are
    /// unchanged on error.
    pub fn attribute(
        &mut self,
        name: &str,
        components: u32,
        stride: u32,
        offset: u32,
    ) -> Result<&mut Self, ProcessorError> {
        let attribute = Attribute::new(name, components, stride, offset)?;
        match self.attributes.iter_mut().find(|a| a.name() == name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
        Ok(self)
    }

    /// Clears the bound framebuffer with `color` over the canvas size.
    pub fn clear_canvas(&mut self, color: [f32; 4]) -> &mut Self {
        let [r, g, b, a] = color;
        // Dimensions were validated when set.
        self.gl
            .viewport(0, 0, self.canvas_width as i32, self.canvas_height as i32);
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(glow::COLOR_BUFFER_BIT);
        self
    }

    /// [`clear_canvas`](Self::clear_canvas) with the configured clear
    /// colour (default [`DEFAULT_CLEAR_COLOR`](crate::DEFAULT_CLEAR_COLOR)).
    pub fn clear(&mut self) -> &mut Self {
        let color = self.clear_color;
        self.clear_canvas(color)
    }

    /// Uploads `geometry` into a new `STATIC_DRAW` array buffer.
    ///
    /// The previous buffer is deleted. If a program is already packed its
    /// vertex array is rebuilt over the new buffer.
    ///
    /// # Errors
    ///
    /// Returns `Gpu` if the buffer or vertex array cannot be created, and
    /// `UnknownAttribute` if re-packing fails. The processor is unchanged
    /// on error.
    pub fn geometry(&mut self, geometry: Geometry) -> Result<&mut Self, ProcessorError> {
        let gl = &*self.gl;
        let buffer = gl.create_buffer().map_err(ProcessorError::Gpu)?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
        gl.buffer_data_f32(glow::ARRAY_BUFFER, &geometry.vertices, glow::STATIC_DRAW);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);

        let rebuilt = match &self.program {
            Some(program) => match self.build_vertex_array(program, buffer) {
                Ok(vao) => Some(vao),
                Err(e) => {
                    gl.delete_buffer(buffer);
                    return Err(e);
                }
            },
            None => None,
        };
        if let Some(vao) = rebuilt {
            if let Some(old) = self.vao.replace(vao) {
                gl.delete_vertex_array(old);
            }
        }

        let uploaded = VertexBuffer {
            buffer,
            primitive: geometry.primitive,
            count: geometry.count,
        };
        if let Some(old) = self.vertices.replace(uploaded) {
            gl.delete_buffer(old.buffer);
        }
        log::debug!(
            "uploaded {} vertices ({} floats) to buffer {buffer:?}",
            geometry.count,
            geometry.vertices.len()
        );
        Ok(self)
    }

    /// Binds the vertex buffer to `program`'s attributes in a new vertex
    /// array and makes `program` the one drawn by [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// Returns `MissingGeometry` before [`geometry`](Self::geometry),
    /// `UnknownAttribute` if a declared attribute is not active in
    /// `program`, or `Gpu` if the vertex array cannot be created.
    pub fn pack_with(&mut self, program: &ShaderProgram<C>) -> Result<&mut Self, ProcessorError> {
        let buffer = self
            .vertices
            .as_ref()
            .ok_or(ProcessorError::MissingGeometry)?
            .buffer;
        let vao = self.build_vertex_array(program, buffer)?;
        if let Some(old) = self.vao.replace(vao) {
            self.gl.delete_vertex_array(old);
        }
        self.program = Some(program.clone());
        Ok(self)
    }

    fn build_vertex_array(
        &self,
        program: &ShaderProgram<C>,
        buffer: C::Buffer,
    ) -> Result<C::VertexArray, ProcessorError> {
        let locations = self
            .attributes
            .iter()
            .map(|attr| {
                program
                    .attribute(attr.name())
                    .map(|info| (info.location, attr))
                    .ok_or_else(|| ProcessorError::UnknownAttribute(attr.name().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let gl = &*self.gl;
        let vao = gl.create_vertex_array().map_err(ProcessorError::Gpu)?;
        gl.bind_vertex_array(Some(vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
        for (location, attr) in locations {
            gl.enable_vertex_attrib_array(location);
            gl.vertex_attrib_pointer_f32(
                location,
                attr.size(),
                glow::FLOAT,
                false,
                attr.stride_bytes(),
                attr.offset_bytes(),
            );
        }
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_vertex_array(None);

        log::debug!(
            "packed {} attributes into vertex array {vao:?}",
            self.attributes.len()
        );
        Ok(vao)
    }

    /// Binds the render target `name` so the next [`run`](Self::run) draws
    /// into it.
    ///
    /// The target is created at the processor size on first use. Later
    /// calls rebind it, resizing it when the processor size changed;
    /// `format` and `attachment` only apply at creation.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` for float targets the GPU cannot render
    /// into, or `Gpu` if the framebuffer is incomplete.
    pub fn redirect_to(
        &mut self,
        name: &str,
        format: FramebufferFormat,
        attachment: u32,
    ) -> Result<&mut Self, ProcessorError> {
        let gl = &*self.gl;
        let (width, height) = (self.width, self.height);
        match self.framebuffers.get_mut(name) {
            Some(target) => {
                if target.width() != width || target.height() != height {
                    log::debug!("resizing framebuffer '{name}' to {width}x{height}");
                    target.resize(gl, width, height)?;
                }
                target.bind(gl);
            }
            None => {
                let texel = format.texel_format(&self.caps)?;
                let target = RenderTarget::new(gl, width, height, texel, attachment)?;
                target.bind(gl);
                log::debug!("created framebuffer '{name}' ({format:?}, attachment {attachment})");
                self.framebuffers.insert(name.to_string(), target);
            }
        }
        self.target = Some(name.to_string());
        Ok(self)
    }

    /// Sets the pass size used by new render targets and the canvas size
    /// used by [`clear_canvas`](Self::clear_canvas).
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` if either dimension is zero.
    pub fn size(&mut self, width: u32, height: u32) -> Result<&mut Self, ProcessorError> {
        validate_size(width, height)?;
        self.width = width;
        self.height = height;
        self.canvas_width = width;
        self.canvas_height = height;
        Ok(self)
    }

    /// Records a default framebuffer resized outside this processor,
    /// leaving the pass size alone.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimensions` if either dimension is zero.
    pub fn set_canvas_size(&mut self, width: u32, height: u32) -> Result<&mut Self, ProcessorError> {
        validate_size(width, height)?;
        self.canvas_width = width;
        self.canvas_height = height;
        Ok(self)
    }

    /// Uploads `raster` as a texture sampled on `unit` and adopts its size
    /// as the pass size. The canvas size is unchanged.
    ///
    /// A texture this processor uploaded earlier for the same unit is
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns `Gpu` if the texture cannot be created.
    pub fn texture(
        &mut self,
        raster: &Raster,
        unit: u32,
        options: TextureOptions,
    ) -> Result<&mut Self, ProcessorError> {
        let config = TextureConfig {
            width: raster.width(),
            height: raster.height(),
            format: TexelFormat::for_raster(raster.pixel_type()),
            options,
        }
        .for_capabilities(self.caps.float_linear);
        let bytes = raster.upload_bytes();
        let texture = create_texture(&*self.gl, &config, Some(&*bytes))?;
        self.width = raster.width();
        self.height = raster.height();
        self.bind_unit(unit, TextureSource::Owned(texture));
        Ok(self)
    }

    /// Samples another pass's output on `unit`. The texture stays owned by
    /// the processor that rendered it.
    pub fn framebuffer_texture(
        &mut self,
        output: FramebufferOutput<C::Texture>,
        unit: u32,
    ) -> &mut Self {
        self.bind_unit(unit, TextureSource::Shared(output.texture));
        self
    }

    /// Samples this processor's own render target `name` on `unit`.
    ///
    /// The target is looked up when [`run`](Self::run) draws, so the unit
    /// follows it through a resize.
    ///
    /// # Errors
    ///
    /// Returns `UnknownFramebuffer` if no such target was created.
    pub fn texture_from(&mut self, name: &str, unit: u32) -> Result<&mut Self, ProcessorError> {
        if !self.framebuffers.contains_key(name) {
            return Err(ProcessorError::UnknownFramebuffer(name.to_string()));
        }
        self.bind_unit(unit, TextureSource::Target(name.to_string()));
        Ok(self)
    }

    fn bind_unit(&mut self, unit: u32, source: TextureSource<C::Texture>) {
        let binding = TextureBinding { unit, source };
        match self.textures.iter_mut().find(|b| b.unit == unit) {
            Some(existing) => {
                if let TextureSource::Owned(old) = &existing.source {
                    self.gl.delete_texture(*old);
                }
                *existing = binding;
            }
            None => self.textures.push(binding),
        }
    }

    fn resolve(&self, source: &TextureSource<C::Texture>) -> Result<C::Texture, ProcessorError> {
        match source {
            TextureSource::Owned(texture) | TextureSource::Shared(texture) => Ok(*texture),
            TextureSource::Target(name) => self
                .framebuffers
                .get(name)
                .map(RenderTarget::texture)
                .ok_or_else(|| ProcessorError::UnknownFramebuffer(name.clone())),
        }
    }

    pub fn framebuffer(&self, name: &str) -> Option<&RenderTarget<C>> {
        self.framebuffers.get(name)
    }

    /// Output handle of render target `name`, for another pass to sample.
    ///
    /// # Errors
    ///
    /// Returns `UnknownFramebuffer` if no such target was created.
    pub fn output(&self, name: &str) -> Result<FramebufferOutput<C::Texture>, ProcessorError> {
        self.framebuffers
            .get(name)
            .map(RenderTarget::output)
            .ok_or_else(|| ProcessorError::UnknownFramebuffer(name.to_string()))
    }

    fn packed(&self) -> Result<(&ShaderProgram<C>, C::VertexArray), ProcessorError> {
        match (&self.program, self.vao) {
            (Some(program), Some(vao)) => Ok((program, vao)),
            _ => Err(ProcessorError::MissingShader),
        }
    }

    /// Makes the packed program current.
    ///
    /// # Errors
    ///
    /// Returns `MissingShader` before [`pack_with`](Self::pack_with).
    pub fn use_program(&mut self) -> Result<&mut Self, ProcessorError> {
        let (program, _) = self.packed()?;
        self.gl.use_program(Some(program.program()));
        Ok(self)
    }

    /// Alias of [`use_program`](Self::use_program).
    pub fn preprocess(&mut self) -> Result<&mut Self, ProcessorError> {
        self.use_program()
    }

    /// Sets uniform `name` of the packed program.
    ///
    /// The program is made current first, since several processors may
    /// share one context. Sampler uniforms take the texture unit as an
    /// `i32`.
    ///
    /// # Errors
    ///
    /// Returns `MissingShader` before [`pack_with`](Self::pack_with),
    /// `UnknownUniform` if `name` is not active, `UnsupportedUniform` for
    /// GLSL types without a setter, and `UniformTypeMismatch` if `value`
    /// does not fit the declared type.
    pub fn uniform(
        &mut self,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<&mut Self, ProcessorError> {
        let value = value.into();
        let (program, _) = self.packed()?;
        let info = program
            .uniform(name)
            .ok_or_else(|| ProcessorError::UnknownUniform(name.to_string()))?;
        if let UniformKind::Other(gl_type) = info.kind {
            return Err(ProcessorError::UnsupportedUniform {
                name: name.to_string(),
                gl_type,
            });
        }
        if !value.is_compatible(info.kind) {
            return Err(ProcessorError::UniformTypeMismatch {
                name: name.to_string(),
                expected: info.kind.to_string(),
                got: value.type_name().to_string(),
            });
        }
        self.gl.use_program(Some(program.program()));
        value.upload(&*self.gl, &info.location);
        Ok(self)
    }

    /// Sets uniform `name` from JSON, interpreted by the uniform's declared
    /// type (see [`UniformValue::from_json`]).
    ///
    /// # Errors
    ///
    /// As [`uniform`](Self::uniform).
    pub fn uniform_json(&mut self, name: &str, value: &Value) -> Result<&mut Self, ProcessorError> {
        let (program, _) = self.packed()?;
        let kind = program
            .uniform(name)
            .ok_or_else(|| ProcessorError::UnknownUniform(name.to_string()))?
            .kind;
        let value = UniformValue::from_json_for(name, kind, value)?;
        self.uniform(name, value)
    }

    /// Draws the geometry with the packed program into the redirected
    /// target, or the default framebuffer when none is bound.
    ///
    /// Texture units, the vertex array and the framebuffer are unbound
    /// afterwards, so the next pass starts from the default framebuffer.
    ///
    /// # Errors
    ///
    /// Returns `MissingShader` before [`pack_with`](Self::pack_with), and
    /// `FeedbackLoop`, without drawing, if a texture unit samples the
    /// target being rendered into.
    pub fn run(&mut self) -> Result<&mut Self, ProcessorError> {
        let (program, vao) = self.packed()?;
        let vertices = self
            .vertices
            .as_ref()
            .ok_or(ProcessorError::MissingGeometry)?;
        let count = i32::try_from(vertices.count)
            .map_err(|_| ProcessorError::Gpu(format!("vertex count {} too large", vertices.count)))?;

        let current = self
            .target
            .as_deref()
            .and_then(|name| self.framebuffers.get(name).map(|t| (name, t.texture())));
        let mut bound = Vec::with_capacity(self.textures.len());
        for binding in &self.textures {
            let texture = self.resolve(&binding.source)?;
            if let Some((name, target)) = current {
                if target == texture {
                    return Err(ProcessorError::FeedbackLoop {
                        unit: binding.unit,
                        framebuffer: name.to_string(),
                    });
                }
            }
            bound.push((binding.unit, texture));
        }

        let gl = &*self.gl;
        gl.use_program(Some(program.program()));
        gl.bind_vertex_array(Some(vao));
        for &(unit, texture) in &bound {
            gl.active_texture(glow::TEXTURE0 + unit);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        }

        log::debug!(
            "drawing {count} vertices into {}",
            self.target.as_deref().unwrap_or("default framebuffer")
        );
        gl.draw_arrays(vertices.primitive.gl(), 0, count);

        for &(unit, _) in &bound {
            gl.active_texture(glow::TEXTURE0 + unit);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
        if !bound.is_empty() {
            gl.active_texture(glow::TEXTURE0);
        }
        gl.bind_vertex_array(None);
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);

        self.target = None;
        Ok(self)
    }

    /// Alias of [`run`](Self::run).
    pub fn process(&mut self) -> Result<&mut Self, ProcessorError> {
        self.run()
    }
}

impl<C: GraphicsContext> Drop for Processor<C> {
    fn drop(&mut self) {
        let gl = &*self.gl;
        if let Some(vao) = self.vao.take() {
            gl.delete_vertex_array(vao);
        }
        if let Some(vertices) = self.vertices.take() {
            gl.delete_buffer(vertices.buffer);
        }
        for binding in self.textures.drain(..) {
            if let TextureSource::Owned(texture) = binding.source {
                gl.delete_texture(texture);
            }
        }
        for (_, target) in self.framebuffers.drain() {
            target.destroy(gl);
        }
    }
}

impl<C: GraphicsContext> std::fmt::Debug for Processor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("canvas", &self.canvas_size())
            .field("attributes", &self.attributes)
            .field("program", &self.program)
            .field("framebuffers", &self.framebuffers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
