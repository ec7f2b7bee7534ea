//! The graphics context seam.
//!
//! [`GraphicsContext`] mirrors the subset of the WebGL2 / GL ES 3.0 API the
//! processor drives, one method per GL entry point. Enum arguments are raw
//! GL constants (`glow::TEXTURE_2D`, ...). Methods are safe: the `glow`
//! implementation owns the `unsafe` blocks, and a recording double can stand
//! in for the GPU in tests.

use std::fmt::Debug;

/// An active attribute or uniform reported by a linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVariable {
    pub name: String,
    /// Array length (1 for non-arrays).
    pub size: i32,
    /// GL type constant, e.g. `glow::FLOAT_VEC2`.
    pub gl_type: u32,
}

/// One-to-one forwarding surface over a GL context.
pub trait GraphicsContext {
    type Shader: Copy + Debug;
    type Program: Copy + Debug;
    type Buffer: Copy + Debug;
    type VertexArray: Copy + Debug;
    type Texture: Copy + Debug + PartialEq;
    type Framebuffer: Copy + Debug;
    type UniformLocation: Clone + Debug;

    fn supports_extension(&self, name: &str) -> bool;

    // Shaders and programs.
    fn create_shader(&self, shader_type: u32) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);
    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&self, program: Option<Self::Program>);
    fn delete_program(&self, program: Self::Program);
    fn active_attributes(&self, program: Self::Program) -> Vec<ActiveVariable>;
    fn active_uniforms(&self, program: Self::Program) -> Vec<ActiveVariable>;
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    // Buffers and vertex arrays.
    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>);
    fn buffer_data_f32(&self, target: u32, data: &[f32], usage: u32);
    fn delete_buffer(&self, buffer: Self::Buffer);
    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vao: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vao: Self::VertexArray);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    // Textures.
    fn create_texture(&self) -> Result<Self::Texture, String>;
    fn bind_texture(&self, target: u32, texture: Option<Self::Texture>);
    fn active_texture(&self, unit: u32);
    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32);
    fn pixel_store_i32(&self, parameter: u32, value: i32);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        pixel_type: u32,
        pixels: Option<&[u8]>,
    );
    fn delete_texture(&self, texture: Self::Texture);

    // Framebuffers.
    fn create_framebuffer(&self) -> Result<Self::Framebuffer, String>;
    fn bind_framebuffer(&self, target: u32, framebuffer: Option<Self::Framebuffer>);
    fn framebuffer_texture_2d(
        &self,
        target: u32,
        attachment: u32,
        texture_target: u32,
        texture: Option<Self::Texture>,
        level: i32,
    );
    fn check_framebuffer_status(&self, target: u32) -> u32;
    fn draw_buffers(&self, buffers: &[u32]);
    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer);

    // Drawing.
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, mask: u32);
    fn draw_arrays(&self, mode: u32, first: i32, count: i32);

    // Uniforms on the current program.
    fn uniform_1_f32(&self, location: Option<&Self::UniformLocation>, x: f32);
    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, x: i32);
    fn uniform_1_u32(&self, location: Option<&Self::UniformLocation>, x: u32);
    fn uniform_1_i32_slice(&self, location: Option<&Self::UniformLocation>, v: &[i32]);
    fn uniform_1_f32_slice(&self, location: Option<&Self::UniformLocation>, v: &[f32]);
    fn uniform_2_f32_slice(&self, location: Option<&Self::UniformLocation>, v: &[f32]);
    fn uniform_3_f32_slice(&self, location: Option<&Self::UniformLocation>, v: &[f32]);
    fn uniform_4_f32_slice(&self, location: Option<&Self::UniformLocation>, v: &[f32]);
    fn uniform_matrix_2_f32_slice(
        &self,
        location: Option<&Self::UniformLocation>,
        transpose: bool,
        v: &[f32],
    );
    fn uniform_matrix_3_f32_slice(
        &self,
        location: Option<&Self::UniformLocation>,
        transpose: bool,
        v: &[f32],
    );
    fn uniform_matrix_4_f32_slice(
        &self,
        location: Option<&Self::UniformLocation>,
        transpose: bool,
        v: &[f32],
    );
}

// SAFETY (whole impl): glow marks every GL entry point unsafe because the
// driver trusts its arguments. Every handle passed here was produced by the
// same context through this trait, and slices carry their own lengths.
#[allow(unsafe_code)]
impl GraphicsContext for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type VertexArray = glow::VertexArray;
    type Texture = glow::Texture;
    type Framebuffer = glow::Framebuffer;
    type UniformLocation = glow::UniformLocation;

    fn supports_extension(&self, name: &str) -> bool {
        use glow::HasContext;
        self.supported_extensions().contains(name)
    }

    fn create_shader(&self, shader_type: u32) -> Result<Self::Shader, String> {
        unsafe { glow::HasContext::create_shader(self, shader_type) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { glow::HasContext::shader_source(self, shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { glow::HasContext::compile_shader(self, shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { glow::HasContext::get_shader_compile_status(self, shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { glow::HasContext::get_shader_info_log(self, shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { glow::HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { glow::HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { glow::HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { glow::HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { glow::HasContext::link_program(self, program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { glow::HasContext::get_program_link_status(self, program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { glow::HasContext::get_program_info_log(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { glow::HasContext::use_program(self, program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { glow::HasContext::delete_program(self, program) }
    }

    fn active_attributes(&self, program: Self::Program) -> Vec<ActiveVariable> {
        use glow::HasContext;
        unsafe {
            let count = self.get_active_attributes(program);
            (0..count)
                .filter_map(|i| self.get_active_attribute(program, i))
                .map(|a| ActiveVariable {
                    name: a.name,
                    size: a.size,
                    gl_type: a.atype,
                })
                .collect()
        }
    }

    fn active_uniforms(&self, program: Self::Program) -> Vec<ActiveVariable> {
        use glow::HasContext;
        unsafe {
            let count = self.get_active_uniforms(program);
            (0..count)
                .filter_map(|i| self.get_active_uniform(program, i))
                .map(|u| ActiveVariable {
                    name: u.name,
                    size: u.size,
                    gl_type: u.utype,
                })
                .collect()
        }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { glow::HasContext::get_attrib_location(self, program, name) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { glow::HasContext::get_uniform_location(self, program, name) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { glow::HasContext::create_buffer(self) }
    }

    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>) {
        unsafe { glow::HasContext::bind_buffer(self, target, buffer) }
    }

    fn buffer_data_f32(&self, target: u32, data: &[f32], usage: u32) {
        unsafe {
            glow::HasContext::buffer_data_u8_slice(self, target, bytemuck::cast_slice(data), usage)
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { glow::HasContext::delete_buffer(self, buffer) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { glow::HasContext::create_vertex_array(self) }
    }

    fn bind_vertex_array(&self, vao: Option<Self::VertexArray>) {
        unsafe { glow::HasContext::bind_vertex_array(self, vao) }
    }

    fn delete_vertex_array(&self, vao: Self::VertexArray) {
        unsafe { glow::HasContext::delete_vertex_array(self, vao) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { glow::HasContext::enable_vertex_attrib_array(self, index) }
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
        unsafe {
            glow::HasContext::vertex_attrib_pointer_f32(
                self, index, size, data_type, normalized, stride, offset,
            )
        }
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        unsafe { glow::HasContext::create_texture(self) }
    }

    fn bind_texture(&self, target: u32, texture: Option<Self::Texture>) {
        unsafe { glow::HasContext::bind_texture(self, target, texture) }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { glow::HasContext::active_texture(self, unit) }
    }

    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        unsafe { glow::HasContext::tex_parameter_i32(self, target, parameter, value) }
    }

    fn pixel_store_i32(&self, parameter: u32, value: i32) {
        unsafe { glow::HasContext::pixel_store_i32(self, parameter, value) }
    }

    fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        pixel_type: u32,
        pixels: Option<&[u8]>,
    ) {
        unsafe {
            glow::HasContext::tex_image_2d(
                self,
                target,
                level,
                internal_format,
                width,
                height,
                0,
                format,
                pixel_type,
                glow::PixelUnpackData::Slice(pixels),
            )
        }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { glow::HasContext::delete_texture(self, texture) }
    }

    fn create_framebuffer(&self) -> Result<Self::Framebuffer, String> {
        unsafe { glow::HasContext::create_framebuffer(self) }
    }

    fn bind_framebuffer(&self, target: u32, framebuffer: Option<Self::Framebuffer>) {
        unsafe { glow::HasContext::bind_framebuffer(self, target, framebuffer) }
    }

    fn framebuffer_texture_2d(
        &self,
        target: u32,
        attachment: u32,
        texture_target: u32,
        texture: Option<Self::Texture>,
        level: i32,
    ) {
        unsafe {
            glow::HasContext::framebuffer_texture_2d(
                self,
                target,
                attachment,
                texture_target,
                texture,
                level,
            )
        }
    }

    fn check_framebuffer_status(&self, target: u32) -> u32 {
        unsafe { glow::HasContext::check_framebuffer_status(self, target) }
    }

    fn draw_buffers(&self, buffers: &[u32]) {
        unsafe { glow::HasContext::draw_buffers(self, buffers) }
    }

    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer) {
        unsafe { glow::HasContext::delete_framebuffer(self, framebuffer) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { glow::HasContext::viewport(self, x, y, width, height) }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { glow::HasContext::clear_color(self, r, g, b, a) }
    }

    fn clear(&self, mask: u32) {
        unsafe { glow::HasContext::clear(self, mask) }
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        unsafe { glow::HasContext::draw_arrays(self, mode, first, count) }
    }

    fn uniform_1_f32(&self, location: Option<&Self::UniformLocation>, x: f32) {
        unsafe { glow::HasContext::uniform_1_f32(self, location, x) }
    }

    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, x: i32) {
        unsafe { glow::HasContext::uniform_1_i32(self, location, x) }
    }

    fn uniform_1_u32(&self, location: Option<&Self::UniformLocation>, x: u32) {
        unsafe { glow::HasContext::uniform_1_u32(self, location, x) }
    }

    fn uniform_1_i32_slice(&self, location: Option<&Self::UniformLocation>, v: &[i32]) {
        unsafe { glow::HasContext::uniform_1_i32_slice(self, location, v) }
    }

    fn uniform_1_f32_slice(&self, location: Option<&Self::UniformLocation>, v: &[f32]) {
        unsafe { glow::HasContext::uniform_1_f32_slice(self, location, v) }
    }

    fn uniform_2_f32_slice(&self, location: Option<&Self::UniformLocation>, v: &[f32]) {
        unsafe { glow::HasContext::uniform_2_f32_slice(self, location, v) }
    }

    fn uniform_3_f32_slice(&self, location: Option<&Self::UniformLocation>, v: &[f32]) {
        unsafe { glow::HasContext::uniform_3_f32_slice(self, location, v) }
    }

    fn uniform_4_f32_slice(&self, location: Option<&Self::UniformLocation>, v: &[f32]) {
        unsafe { glow::HasContext::uniform_4_f32_slice(self, location, v) }
    }

    fn uniform_matrix_2_f32_slice(
        &self,
        location: Option<&Self::UniformLocation>,
        transpose: bool,
        v: &[f32],
    ) {
        unsafe { glow::HasContext::uniform_matrix_2_f32_slice(self, location, transpose, v) }
    }

    fn uniform_matrix_3_f32_slice(
        &self,
        location: Option<&Self::UniformLocation>,
        transpose: bool,
        v: &[f32],
    ) {
        unsafe { glow::HasContext::uniform_matrix_3_f32_slice(self, location, transpose, v) }
    }

    fn uniform_matrix_4_f32_slice(
        &self,
        location: Option<&Self::UniformLocation>,
        transpose: bool,
        v: &[f32],
    ) {
        unsafe { glow::HasContext::uniform_matrix_4_f32_slice(self, location, transpose, v) }
    }
}
