//! Vertex geometry drawn by a pass.

use crate::error::ProcessorError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Primitive assembly mode for `draw_arrays`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Primitive {
    #[default]
    TriangleStrip,
    Triangles,
    Points,
    Lines,
}

impl Primitive {
    pub fn gl(self) -> u32 {
        match self {
            Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
            Primitive::Triangles => glow::TRIANGLES,
            Primitive::Points => glow::POINTS,
            Primitive::Lines => glow::LINES,
        }
    }
}

impl FromStr for Primitive {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRIANGLE_STRIP" => Ok(Primitive::TriangleStrip),
            "TRIANGLES" => Ok(Primitive::Triangles),
            "POINTS" => Ok(Primitive::Points),
            "LINES" => Ok(Primitive::Lines),
            other => Err(ProcessorError::unknown_option("primitive", other)),
        }
    }
}

/// Interleaved `f32` vertex data and how to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub primitive: Primitive,
    pub vertices: Vec<f32>,
    /// Number of vertices passed to `draw_arrays`.
    pub count: u32,
}

impl Geometry {
    pub fn new(primitive: Primitive, vertices: Vec<f32>, count: u32) -> Self {
        Self {
            primitive,
            vertices,
            count,
        }
    }

    /// A triangle strip covering clip space, interleaved as `x, y, u, v`
    /// with `(u, v) = (0, 0)` at the bottom-left corner.
    pub fn quad() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            -1.0, -1.0, 0.0, 0.0,
             1.0, -1.0, 1.0, 0.0,
            -1.0,  1.0, 0.0, 1.0,
             1.0,  1.0, 1.0, 1.0,
        ];
        Self::new(Primitive::TriangleStrip, vertices, 4)
    }
}
