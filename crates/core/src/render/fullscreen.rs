//! Pass-through vertex shader for image passes.
//!
//! Image processing happens in the fragment shader; the vertex stage only
//! has to cover the target with [`Geometry::quad`](super::geometry::Geometry::quad)
//! and hand texture coordinates on.

/// GLSL ES 3.0 vertex shader matching the interleaved layout of
/// [`Geometry::quad`](super::geometry::Geometry::quad).
///
/// Reads `a_vertex` (clip-space xy) and `a_texCoord` (uv), writes
/// `v_texCoord`. Register the attributes with:
///
/// ```text
/// processor
///     .attribute("a_vertex", 2, 4, 0)?
///     .attribute("a_texCoord", 2, 4, 2)?
/// ```
pub const QUAD_VERTEX_SHADER: &str = r#"#version 300 es
in vec2 a_vertex;
in vec2 a_texCoord;
out vec2 v_texCoord;
void main() {
    v_texCoord = a_texCoord;
    gl_Position = vec4(a_vertex, 0.0, 1.0);
}
"#;

/// Fragment shader that copies `u_image` unchanged. Useful as a first
/// pass or to blit a render target to the canvas.
pub const COPY_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;
uniform sampler2D u_image;
in vec2 v_texCoord;
out vec4 outColor;
void main() {
    outColor = texture(u_image, v_texCoord);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_vertex_shader_contains_version_directive() {
        assert!(
            QUAD_VERTEX_SHADER.starts_with("#version 300 es"),
            "expected GLSL ES 3.0 version directive first in:\n{QUAD_VERTEX_SHADER}"
        );
    }

    #[test]
    fn quad_vertex_shader_declares_quad_attributes() {
        assert!(QUAD_VERTEX_SHADER.contains("in vec2 a_vertex"));
        assert!(QUAD_VERTEX_SHADER.contains("in vec2 a_texCoord"));
    }

    #[test]
    fn quad_vertex_shader_outputs_tex_coord_varying() {
        assert!(
            QUAD_VERTEX_SHADER.contains("out vec2 v_texCoord"),
            "expected v_texCoord output in:\n{QUAD_VERTEX_SHADER}"
        );
        assert!(QUAD_VERTEX_SHADER.contains("gl_Position"));
    }

    #[test]
    fn copy_fragment_shader_reads_matching_varying() {
        assert!(COPY_FRAGMENT_SHADER.starts_with("#version 300 es"));
        assert!(COPY_FRAGMENT_SHADER.contains("in vec2 v_texCoord"));
        assert!(COPY_FRAGMENT_SHADER.contains("uniform sampler2D u_image"));
    }
}
