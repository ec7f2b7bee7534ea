//! Recording test double for [`GraphicsContext`].
//!
//! Hands out sequential `u32` handles, records every call in order, and
//! reports a configurable set of active attributes and uniforms for each
//! linked program. Compile, link and framebuffer failures can be forced.

use super::backend::{ActiveVariable, GraphicsContext};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// Base value for uniform locations so they never collide with attribute
/// locations in assertions.
pub const UNIFORM_LOCATION_BASE: u32 = 100;

/// A typed uniform upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformCall {
    F1(f32),
    I1(i32),
    U1(u32),
    I1v(Vec<i32>),
    F1v(Vec<f32>),
    F2v(Vec<f32>),
    F3v(Vec<f32>),
    F4v(Vec<f32>),
    Mat2 { transpose: bool, v: Vec<f32> },
    Mat3 { transpose: bool, v: Vec<f32> },
    Mat4 { transpose: bool, v: Vec<f32> },
}

/// One recorded GL call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader { id: u32, shader_type: u32 },
    ShaderSource(u32),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader(u32, u32),
    DetachShader(u32, u32),
    LinkProgram(u32),
    UseProgram(Option<u32>),
    DeleteProgram(u32),
    CreateBuffer(u32),
    BindBuffer(u32, Option<u32>),
    BufferData { target: u32, data: Vec<f32>, usage: u32 },
    DeleteBuffer(u32),
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    EnableVertexAttribArray(u32),
    VertexAttribPointer {
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    },
    CreateTexture(u32),
    BindTexture(u32, Option<u32>),
    ActiveTexture(u32),
    TexParameter(u32, u32, i32),
    PixelStore(u32, i32),
    TexImage2d {
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        pixel_type: u32,
        len: Option<usize>,
    },
    DeleteTexture(u32),
    CreateFramebuffer(u32),
    BindFramebuffer(u32, Option<u32>),
    FramebufferTexture2d { attachment: u32, texture: Option<u32> },
    DrawBuffers(Vec<u32>),
    DeleteFramebuffer(u32),
    Viewport(i32, i32, i32, i32),
    ClearColor([f32; 4]),
    Clear(u32),
    DrawArrays { mode: u32, first: i32, count: i32 },
    Uniform(u32, UniformCall),
}

/// In-memory [`GraphicsContext`] that records calls instead of drawing.
pub struct RecordingContext {
    calls: RefCell<Vec<Call>>,
    next_id: Cell<u32>,
    extensions: HashSet<String>,
    attributes: Vec<ActiveVariable>,
    uniforms: Vec<ActiveVariable>,
    shader_types: RefCell<HashMap<u32, u32>>,
    failing_stage: Cell<Option<u32>>,
    failing_link: Cell<bool>,
    framebuffer_status: Cell<u32>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::with_extensions(&[])
    }

    pub fn with_extensions(extensions: &[&str]) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            attributes: Vec::new(),
            uniforms: Vec::new(),
            shader_types: RefCell::new(HashMap::new()),
            failing_stage: Cell::new(None),
            failing_link: Cell::new(false),
            framebuffer_status: Cell::new(glow::FRAMEBUFFER_COMPLETE),
        }
    }

    /// Every linked program reports these active variables. Attribute
    /// locations follow list order; uniform locations start at
    /// [`UNIFORM_LOCATION_BASE`].
    pub fn with_program_variables(
        mut self,
        attributes: Vec<ActiveVariable>,
        uniforms: Vec<ActiveVariable>,
    ) -> Self {
        self.attributes = attributes;
        self.uniforms = uniforms;
        self
    }

    pub fn fail_compile(&self, shader_type: u32) {
        self.failing_stage.set(Some(shader_type));
    }

    pub fn fail_link(&self) {
        self.failing_link.set(true);
    }

    pub fn set_framebuffer_status(&self, status: u32) {
        self.framebuffer_status.set(status);
    }

    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Drains recorded calls.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn next(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for an active variable.
pub fn var(name: &str, gl_type: u32) -> ActiveVariable {
    ActiveVariable {
        name: name.to_string(),
        size: 1,
        gl_type,
    }
}

/// Shorthand for an active array uniform, reported with a `[0]` suffix.
pub fn array_var(name: &str, gl_type: u32, size: i32) -> ActiveVariable {
    ActiveVariable {
        name: format!("{name}[0]"),
        size,
        gl_type,
    }
}

impl GraphicsContext for RecordingContext {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type Texture = u32;
    type Framebuffer = u32;
    type UniformLocation = u32;

    fn supports_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    fn create_shader(&self, shader_type: u32) -> Result<u32, String> {
        let id = self.next();
        self.shader_types.borrow_mut().insert(id, shader_type);
        self.record(Call::CreateShader { id, shader_type });
        Ok(id)
    }

    fn shader_source(&self, shader: u32, _source: &str) {
        self.record(Call::ShaderSource(shader));
    }

    fn compile_shader(&self, shader: u32) {
        self.record(Call::CompileShader(shader));
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        let stage = self.shader_types.borrow().get(&shader).copied();
        stage != self.failing_stage.get() || stage.is_none()
    }

    fn shader_info_log(&self, _shader: u32) -> String {
        "ERROR: 0:2: syntax error".to_string()
    }

    fn delete_shader(&self, shader: u32) {
        self.record(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<u32, String> {
        let id = self.next();
        self.record(Call::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record(Call::AttachShader(program, shader));
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record(Call::DetachShader(program, shader));
    }

    fn link_program(&self, program: u32) {
        self.record(Call::LinkProgram(program));
    }

    fn program_link_status(&self, _program: u32) -> bool {
        !self.failing_link.get()
    }

    fn program_info_log(&self, _program: u32) -> String {
        "varying v_texCoord not written".to_string()
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
    }

    fn delete_program(&self, program: u32) {
        self.record(Call::DeleteProgram(program));
    }

    fn active_attributes(&self, _program: u32) -> Vec<ActiveVariable> {
        self.attributes.clone()
    }

    fn active_uniforms(&self, _program: u32) -> Vec<ActiveVariable> {
        self.uniforms.clone()
    }

    fn attrib_location(&self, _program: u32, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .position(|a| a.name == name)
            .map(|i| i as u32)
    }

    fn uniform_location(&self, _program: u32, name: &str) -> Option<u32> {
        self.uniforms
            .iter()
            .position(|u| u.name == name || u.name.strip_suffix("[0]") == Some(name))
            .map(|i| UNIFORM_LOCATION_BASE + i as u32)
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let id = self.next();
        self.record(Call::CreateBuffer(id));
        Ok(id)
    }

    fn bind_buffer(&self, target: u32, buffer: Option<u32>) {
        self.record(Call::BindBuffer(target, buffer));
    }

    fn buffer_data_f32(&self, target: u32, data: &[f32], usage: u32) {
        self.record(Call::BufferData {
            target,
            data: data.to_vec(),
            usage,
        });
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(Call::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let id = self.next();
        self.record(Call::CreateVertexArray(id));
        Ok(id)
    }

    fn bind_vertex_array(&self, vao: Option<u32>) {
        self.record(Call::BindVertexArray(vao));
    }

    fn delete_vertex_array(&self, vao: u32) {
        self.record(Call::DeleteVertexArray(vao));
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(Call::EnableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.record(Call::VertexAttribPointer {
            index,
            size,
            data_type,
            normalized,
            stride,
            offset,
        });
    }

    fn create_texture(&self) -> Result<u32, String> {
        let id = self.next();
        self.record(Call::CreateTexture(id));
        Ok(id)
    }

    fn bind_texture(&self, target: u32, texture: Option<u32>) {
        self.record(Call::BindTexture(target, texture));
    }

    fn active_texture(&self, unit: u32) {
        self.record(Call::ActiveTexture(unit));
    }

    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        self.record(Call::TexParameter(target, parameter, value));
    }

    fn pixel_store_i32(&self, parameter: u32, value: i32) {
        self.record(Call::PixelStore(parameter, value));
    }

    fn tex_image_2d(
        &self,
        _target: u32,
        _level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        pixel_type: u32,
        pixels: Option<&[u8]>,
    ) {
        self.record(Call::TexImage2d {
            internal_format,
            width,
            height,
            format,
            pixel_type,
            len: pixels.map(<[u8]>::len),
        });
    }

    fn delete_texture(&self, texture: u32) {
        self.record(Call::DeleteTexture(texture));
    }

    fn create_framebuffer(&self) -> Result<u32, String> {
        let id = self.next();
        self.record(Call::CreateFramebuffer(id));
        Ok(id)
    }

    fn bind_framebuffer(&self, target: u32, framebuffer: Option<u32>) {
        self.record(Call::BindFramebuffer(target, framebuffer));
    }

    fn framebuffer_texture_2d(
        &self,
        _target: u32,
        attachment: u32,
        _texture_target: u32,
        texture: Option<u32>,
        _level: i32,
    ) {
        self.record(Call::FramebufferTexture2d {
            attachment,
            texture,
        });
    }

    fn check_framebuffer_status(&self, _target: u32) -> u32 {
        self.framebuffer_status.get()
    }

    fn draw_buffers(&self, buffers: &[u32]) {
        self.record(Call::DrawBuffers(buffers.to_vec()));
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        self.record(Call::DeleteFramebuffer(framebuffer));
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(Call::ClearColor([r, g, b, a]));
    }

    fn clear(&self, mask: u32) {
        self.record(Call::Clear(mask));
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        self.record(Call::DrawArrays { mode, first, count });
    }

    fn uniform_1_f32(&self, location: Option<&u32>, x: f32) {
        self.record_uniform(location, UniformCall::F1(x));
    }

    fn uniform_1_i32(&self, location: Option<&u32>, x: i32) {
        self.record_uniform(location, UniformCall::I1(x));
    }

    fn uniform_1_u32(&self, location: Option<&u32>, x: u32) {
        self.record_uniform(location, UniformCall::U1(x));
    }

    fn uniform_1_i32_slice(&self, location: Option<&u32>, v: &[i32]) {
        self.record_uniform(location, UniformCall::I1v(v.to_vec()));
    }

    fn uniform_1_f32_slice(&self, location: Option<&u32>, v: &[f32]) {
        self.record_uniform(location, UniformCall::F1v(v.to_vec()));
    }

    fn uniform_2_f32_slice(&self, location: Option<&u32>, v: &[f32]) {
        self.record_uniform(location, UniformCall::F2v(v.to_vec()));
    }

    fn uniform_3_f32_slice(&self, location: Option<&u32>, v: &[f32]) {
        self.record_uniform(location, UniformCall::F3v(v.to_vec()));
    }

    fn uniform_4_f32_slice(&self, location: Option<&u32>, v: &[f32]) {
        self.record_uniform(location, UniformCall::F4v(v.to_vec()));
    }

    fn uniform_matrix_2_f32_slice(&self, location: Option<&u32>, transpose: bool, v: &[f32]) {
        self.record_uniform(
            location,
            UniformCall::Mat2 {
                transpose,
                v: v.to_vec(),
            },
        );
    }

    fn uniform_matrix_3_f32_slice(&self, location: Option<&u32>, transpose: bool, v: &[f32]) {
        self.record_uniform(
            location,
            UniformCall::Mat3 {
                transpose,
                v: v.to_vec(),
            },
        );
    }

    fn uniform_matrix_4_f32_slice(&self, location: Option<&u32>, transpose: bool, v: &[f32]) {
        self.record_uniform(
            location,
            UniformCall::Mat4 {
                transpose,
                v: v.to_vec(),
            },
        );
    }
}

impl RecordingContext {
    fn record_uniform(&self, location: Option<&u32>, call: UniformCall) {
        self.record(Call::Uniform(location.copied().unwrap_or(u32::MAX), call));
    }
}
