//! Shader compilation, linking and program introspection.
//!
//! Provides error types, source formatting for debugging, functions to
//! compile individual shader stages and link them into programs, and
//! [`ShaderProgram`], which records the locations and types of a linked
//! program's active attributes and uniforms so a processor can bind them
//! by name.

use super::backend::GraphicsContext;
use super::uniform::UniformKind;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during shader compilation or program linking.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    /// A shader stage failed to compile.
    #[error("shader compile error ({stage}):\n{log}")]
    CompileError {
        /// The shader stage that failed (e.g. "vertex", "fragment").
        stage: String,
        /// The driver's info log describing the error.
        log: String,
    },
    /// A program failed to link.
    #[error("shader link error:\n{0}")]
    LinkError(String),
}

/// Formats a shader compilation error for human-readable debugging.
///
/// Prepends right-aligned line numbers to each line of `source`, then
/// appends the driver's error `log`.
pub fn format_shader_error(source: &str, log: &str) -> String {
    let source_lines: Vec<&str> = source.lines().collect();
    let width = source_lines.len().max(1).to_string().len();

    let numbered: String = source_lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {line}", i + 1, width = width))
        .collect::<Vec<_>>()
        .join("\n");

    match (numbered.is_empty(), log.is_empty()) {
        (true, true) => String::new(),
        (true, false) => log.to_string(),
        (false, true) => numbered,
        (false, false) => format!("{numbered}\n\n{log}"),
    }
}

fn stage_name(shader_type: u32) -> &'static str {
    match shader_type {
        glow::VERTEX_SHADER => "vertex",
        glow::FRAGMENT_SHADER => "fragment",
        _ => "unknown",
    }
}

/// Compiles a single shader stage.
///
/// # Errors
///
/// Returns `ShaderError::CompileError` if the GLSL source fails to compile.
/// The failed shader object is deleted.
pub fn compile_shader<C: GraphicsContext>(
    gl: &C,
    shader_type: u32,
    source: &str,
) -> Result<C::Shader, ShaderError> {
    let stage = stage_name(shader_type);
    let shader = gl
        .create_shader(shader_type)
        .map_err(|e| ShaderError::CompileError {
            stage: stage.to_string(),
            log: e,
        })?;

    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if gl.shader_compile_status(shader) {
        Ok(shader)
    } else {
        let info_log = gl.shader_info_log(shader);
        gl.delete_shader(shader);
        Err(ShaderError::CompileError {
            stage: stage.to_string(),
            log: format_shader_error(source, &info_log),
        })
    }
}

/// Links a vertex and fragment shader into a program.
///
/// Both shaders are detached after linking whatever the outcome.
///
/// # Errors
///
/// Returns `ShaderError::LinkError` if linking fails.
pub fn link_program<C: GraphicsContext>(
    gl: &C,
    vertex: C::Shader,
    fragment: C::Shader,
) -> Result<C::Program, ShaderError> {
    let program = gl.create_program().map_err(ShaderError::LinkError)?;

    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    gl.link_program(program);
    gl.detach_shader(program, vertex);
    gl.detach_shader(program, fragment);

    if gl.program_link_status(program) {
        Ok(program)
    } else {
        let info_log = gl.program_info_log(program);
        gl.delete_program(program);
        Err(ShaderError::LinkError(info_log))
    }
}

/// Compiles vertex and fragment sources and links them into a program.
///
/// Shader objects are deleted afterwards regardless of the outcome.
///
/// # Errors
///
/// Returns `ShaderError::CompileError` if either shader fails to compile,
/// or `ShaderError::LinkError` if linking fails.
pub fn compile_program<C: GraphicsContext>(
    gl: &C,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<C::Program, ShaderError> {
    let vert = compile_shader(gl, glow::VERTEX_SHADER, vertex_src)?;
    let frag = match compile_shader(gl, glow::FRAGMENT_SHADER, fragment_src) {
        Ok(f) => f,
        Err(e) => {
            gl.delete_shader(vert);
            return Err(e);
        }
    };

    let result = link_program(gl, vert, frag);

    gl.delete_shader(vert);
    gl.delete_shader(frag);

    result
}

/// Location and GL type of an active vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeInfo {
    pub location: u32,
    pub gl_type: u32,
}

/// Location and kind of an active uniform.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformInfo<L> {
    pub location: L,
    pub kind: UniformKind,
}

/// A linked program together with its active attributes and uniforms.
///
/// Array uniforms are keyed without their `[0]` suffix. Built-in
/// attributes (`gl_*`) are skipped.
pub struct ShaderProgram<C: GraphicsContext> {
    program: C::Program,
    attributes: HashMap<String, AttributeInfo>,
    uniforms: HashMap<String, UniformInfo<C::UniformLocation>>,
}

impl<C: GraphicsContext> Clone for ShaderProgram<C> {
    fn clone(&self) -> Self {
        Self {
            program: self.program,
            attributes: self.attributes.clone(),
            uniforms: self.uniforms.clone(),
        }
    }
}

impl<C: GraphicsContext> std::fmt::Debug for ShaderProgram<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program", &self.program)
            .field("attributes", &self.attributes)
            .field("uniforms", &self.uniforms)
            .finish()
    }
}

impl<C: GraphicsContext> ShaderProgram<C> {
    /// Compiles, links and introspects a program.
    ///
    /// # Errors
    ///
    /// Propagates compile and link failures from [`compile_program`].
    pub fn new(gl: &C, vertex_src: &str, fragment_src: &str) -> Result<Self, ShaderError> {
        let program = compile_program(gl, vertex_src, fragment_src)?;
        Ok(Self::from_program(gl, program))
    }

    /// Introspects an already linked program.
    pub fn from_program(gl: &C, program: C::Program) -> Self {
        let attributes: HashMap<String, AttributeInfo> = gl
            .active_attributes(program)
            .into_iter()
            .filter(|a| !a.name.starts_with("gl_"))
            .filter_map(|a| {
                let location = gl.attrib_location(program, &a.name)?;
                Some((
                    a.name,
                    AttributeInfo {
                        location,
                        gl_type: a.gl_type,
                    },
                ))
            })
            .collect();

        let uniforms: HashMap<String, UniformInfo<C::UniformLocation>> = gl
            .active_uniforms(program)
            .into_iter()
            .filter_map(|u| {
                let location = gl.uniform_location(program, &u.name)?;
                let name = u
                    .name
                    .strip_suffix("[0]")
                    .unwrap_or(&u.name)
                    .to_string();
                Some((
                    name,
                    UniformInfo {
                        location,
                        kind: UniformKind::from_gl(u.gl_type, u.size),
                    },
                ))
            })
            .collect();

        log::debug!(
            "linked program {program:?}: {} attributes, {} uniforms",
            attributes.len(),
            uniforms.len()
        );

        Self {
            program,
            attributes,
            uniforms,
        }
    }

    /// The GL program handle.
    pub fn program(&self) -> C::Program {
        self.program
    }

    /// Looks up an active attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.get(name)
    }

    /// Looks up an active uniform by name.
    pub fn uniform(&self, name: &str) -> Option<&UniformInfo<C::UniformLocation>> {
        self.uniforms.get(name)
    }

    /// Names of all active attributes, in no particular order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Names of all active uniforms, in no particular order.
    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }

    /// Deletes the program.
    pub fn destroy(&self, gl: &C) {
        gl.delete_program(self.program);
    }
}
