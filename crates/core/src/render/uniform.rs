//! Uniform types and values.
//!
//! [`UniformKind`] is what a linked program declares; [`UniformValue`] is
//! what the caller supplies. The processor checks one against the other
//! before picking the typed `uniform*` entry point.

use super::backend::GraphicsContext;
use crate::error::ProcessorError;
use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use serde_json::Value;
use std::fmt;

/// GLSL type of an active uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    Uint,
    IntArray,
    FloatArray,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
    /// A type the processor cannot set, with its GL constant.
    Other(u32),
}

impl UniformKind {
    /// Maps a GL type constant and array size to a kind.
    ///
    /// Scalar `float` and `int` arrays become `FloatArray` / `IntArray`;
    /// arrays of other types keep their element kind.
    pub fn from_gl(gl_type: u32, size: i32) -> Self {
        match (gl_type, size > 1) {
            (glow::FLOAT, false) => UniformKind::Float,
            (glow::FLOAT, true) => UniformKind::FloatArray,
            (glow::INT, false) => UniformKind::Int,
            (glow::INT, true) => UniformKind::IntArray,
            (glow::UNSIGNED_INT, _) => UniformKind::Uint,
            (glow::FLOAT_VEC2, _) => UniformKind::Vec2,
            (glow::FLOAT_VEC3, _) => UniformKind::Vec3,
            (glow::FLOAT_VEC4, _) => UniformKind::Vec4,
            (glow::FLOAT_MAT2, _) => UniformKind::Mat2,
            (glow::FLOAT_MAT3, _) => UniformKind::Mat3,
            (glow::FLOAT_MAT4, _) => UniformKind::Mat4,
            (glow::SAMPLER_2D, _) => UniformKind::Sampler2D,
            (other, _) => UniformKind::Other(other),
        }
    }

    /// GLSL spelling, used in error messages.
    pub fn glsl_name(self) -> &'static str {
        match self {
            UniformKind::Float => "float",
            UniformKind::Int => "int",
            UniformKind::Uint => "uint",
            UniformKind::IntArray => "int[]",
            UniformKind::FloatArray => "float[]",
            UniformKind::Vec2 => "vec2",
            UniformKind::Vec3 => "vec3",
            UniformKind::Vec4 => "vec4",
            UniformKind::Mat2 => "mat2",
            UniformKind::Mat3 => "mat3",
            UniformKind::Mat4 => "mat4",
            UniformKind::Sampler2D => "sampler2D",
            UniformKind::Other(_) => "unsupported",
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl_name())
    }
}

/// A value to upload to a uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Uint(u32),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    /// Short type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Int(_) => "int",
            UniformValue::Uint(_) => "uint",
            UniformValue::IntArray(_) => "int[]",
            UniformValue::FloatArray(_) => "float[]",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Mat2(_) => "mat2",
            UniformValue::Mat3(_) => "mat3",
            UniformValue::Mat4(_) => "mat4",
        }
    }

    /// Whether this value can be uploaded to a uniform of `kind`.
    ///
    /// Samplers take the texture unit as an `int`.
    pub fn is_compatible(&self, kind: UniformKind) -> bool {
        matches!(
            (self, kind),
            (UniformValue::Float(_), UniformKind::Float)
                | (UniformValue::Int(_), UniformKind::Int | UniformKind::Sampler2D)
                | (UniformValue::Uint(_), UniformKind::Uint)
                | (UniformValue::IntArray(_), UniformKind::IntArray)
                | (UniformValue::FloatArray(_), UniformKind::FloatArray)
                | (UniformValue::Vec2(_), UniformKind::Vec2)
                | (UniformValue::Vec3(_), UniformKind::Vec3)
                | (UniformValue::Vec4(_), UniformKind::Vec4)
                | (UniformValue::Mat2(_), UniformKind::Mat2)
                | (UniformValue::Mat3(_), UniformKind::Mat3)
                | (UniformValue::Mat4(_), UniformKind::Mat4)
        )
    }

    /// Builds a value of `kind` from JSON.
    ///
    /// Scalars take a number, arrays and vectors take an array of numbers,
    /// matrices take a flat column-major array. Returns `None` if the JSON
    /// does not fit the kind.
    pub fn from_json(kind: UniformKind, value: &Value) -> Option<Self> {
        match kind {
            UniformKind::Float => value.as_f64().map(|v| UniformValue::Float(v as f32)),
            UniformKind::Int | UniformKind::Sampler2D => value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(UniformValue::Int),
            UniformKind::Uint => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(UniformValue::Uint),
            UniformKind::IntArray => value
                .as_array()?
                .iter()
                .map(|v| v.as_i64().and_then(|v| i32::try_from(v).ok()))
                .collect::<Option<Vec<_>>>()
                .map(UniformValue::IntArray),
            UniformKind::FloatArray => floats(value).map(UniformValue::FloatArray),
            UniformKind::Vec2 => fixed::<2>(value).map(|a| UniformValue::Vec2(Vec2::from_array(a))),
            UniformKind::Vec3 => fixed::<3>(value).map(|a| UniformValue::Vec3(Vec3::from_array(a))),
            UniformKind::Vec4 => fixed::<4>(value).map(|a| UniformValue::Vec4(Vec4::from_array(a))),
            UniformKind::Mat2 => {
                fixed::<4>(value).map(|a| UniformValue::Mat2(Mat2::from_cols_array(&a)))
            }
            UniformKind::Mat3 => {
                fixed::<9>(value).map(|a| UniformValue::Mat3(Mat3::from_cols_array(&a)))
            }
            UniformKind::Mat4 => {
                fixed::<16>(value).map(|a| UniformValue::Mat4(Mat4::from_cols_array(&a)))
            }
            UniformKind::Other(_) => None,
        }
    }

    /// Like [`UniformValue::from_json`], reporting a mismatch for `name`.
    pub fn from_json_for(
        name: &str,
        kind: UniformKind,
        value: &Value,
    ) -> Result<Self, ProcessorError> {
        if let UniformKind::Other(gl_type) = kind {
            return Err(ProcessorError::UnsupportedUniform {
                name: name.to_string(),
                gl_type,
            });
        }
        Self::from_json(kind, value).ok_or_else(|| ProcessorError::UniformTypeMismatch {
            name: name.to_string(),
            expected: kind.to_string(),
            got: value.to_string(),
        })
    }
}

impl UniformValue {
    /// Forwards the value to the typed setter for `location` on the
    /// currently used program. Matrices are column-major and sent
    /// untransposed.
    pub fn upload<C: GraphicsContext>(&self, gl: &C, location: &C::UniformLocation) {
        let loc = Some(location);
        match self {
            UniformValue::Float(v) => gl.uniform_1_f32(loc, *v),
            UniformValue::Int(v) => gl.uniform_1_i32(loc, *v),
            UniformValue::Uint(v) => gl.uniform_1_u32(loc, *v),
            UniformValue::IntArray(v) => gl.uniform_1_i32_slice(loc, v),
            UniformValue::FloatArray(v) => gl.uniform_1_f32_slice(loc, v),
            UniformValue::Vec2(v) => gl.uniform_2_f32_slice(loc, &v.to_array()),
            UniformValue::Vec3(v) => gl.uniform_3_f32_slice(loc, &v.to_array()),
            UniformValue::Vec4(v) => gl.uniform_4_f32_slice(loc, &v.to_array()),
            UniformValue::Mat2(m) => gl.uniform_matrix_2_f32_slice(loc, false, &m.to_cols_array()),
            UniformValue::Mat3(m) => gl.uniform_matrix_3_f32_slice(loc, false, &m.to_cols_array()),
            UniformValue::Mat4(m) => gl.uniform_matrix_4_f32_slice(loc, false, &m.to_cols_array()),
        }
    }
}

fn floats(value: &Value) -> Option<Vec<f32>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map(|v| v as f32))
        .collect()
}

fn fixed<const N: usize>(value: &Value) -> Option<[f32; N]> {
    floats(value)?.try_into().ok()
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::Uint(v)
    }
}

impl From<Vec<i32>> for UniformValue {
    fn from(v: Vec<i32>) -> Self {
        UniformValue::IntArray(v)
    }
}

impl From<Vec<f32>> for UniformValue {
    fn from(v: Vec<f32>) -> Self {
        UniformValue::FloatArray(v)
    }
}

impl From<&[f32]> for UniformValue {
    fn from(v: &[f32]) -> Self {
        UniformValue::FloatArray(v.to_vec())
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(Vec2::from_array(v))
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(Vec3::from_array(v))
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(Vec4::from_array(v))
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat2> for UniformValue {
    fn from(v: Mat2) -> Self {
        UniformValue::Mat2(v)
    }
}

impl From<Mat3> for UniformValue {
    fn from(v: Mat3) -> Self {
        UniformValue::Mat3(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_gl_maps_scalar_and_array_types() {
        assert_eq!(UniformKind::from_gl(glow::FLOAT, 1), UniformKind::Float);
        assert_eq!(UniformKind::from_gl(glow::FLOAT, 9), UniformKind::FloatArray);
        assert_eq!(UniformKind::from_gl(glow::INT, 1), UniformKind::Int);
        assert_eq!(UniformKind::from_gl(glow::INT, 4), UniformKind::IntArray);
        assert_eq!(UniformKind::from_gl(glow::UNSIGNED_INT, 1), UniformKind::Uint);
    }

    #[test]
    fn from_gl_maps_vectors_matrices_and_samplers() {
        assert_eq!(UniformKind::from_gl(glow::FLOAT_VEC2, 1), UniformKind::Vec2);
        assert_eq!(UniformKind::from_gl(glow::FLOAT_VEC3, 1), UniformKind::Vec3);
        assert_eq!(UniformKind::from_gl(glow::FLOAT_VEC4, 1), UniformKind::Vec4);
        assert_eq!(UniformKind::from_gl(glow::FLOAT_MAT2, 1), UniformKind::Mat2);
        assert_eq!(UniformKind::from_gl(glow::FLOAT_MAT3, 1), UniformKind::Mat3);
        assert_eq!(UniformKind::from_gl(glow::FLOAT_MAT4, 1), UniformKind::Mat4);
        assert_eq!(UniformKind::from_gl(glow::SAMPLER_2D, 1), UniformKind::Sampler2D);
    }

    #[test]
    fn from_gl_keeps_unknown_constant() {
        assert_eq!(
            UniformKind::from_gl(glow::SAMPLER_CUBE, 1),
            UniformKind::Other(glow::SAMPLER_CUBE)
        );
    }

    #[test]
    fn sampler_accepts_int_unit() {
        assert!(UniformValue::Int(1).is_compatible(UniformKind::Sampler2D));
        assert!(!UniformValue::Float(1.0).is_compatible(UniformKind::Sampler2D));
    }

    #[test]
    fn mismatched_kinds_are_incompatible() {
        assert!(!UniformValue::Vec3(Vec3::ONE).is_compatible(UniformKind::Vec4));
        assert!(!UniformValue::Float(0.5).is_compatible(UniformKind::FloatArray));
        assert!(!UniformValue::Mat3(Mat3::IDENTITY).is_compatible(UniformKind::Mat4));
        assert!(!UniformValue::Int(3).is_compatible(UniformKind::Other(0)));
    }

    #[test]
    fn from_conversions_pick_expected_variants() {
        assert_eq!(UniformValue::from(0.5f32), UniformValue::Float(0.5));
        assert_eq!(UniformValue::from(2i32), UniformValue::Int(2));
        assert_eq!(UniformValue::from(2u32), UniformValue::Uint(2));
        assert_eq!(
            UniformValue::from([1.0, 2.0]),
            UniformValue::Vec2(Vec2::new(1.0, 2.0))
        );
        assert_eq!(
            UniformValue::from(vec![1.0f32, 2.0, 3.0]),
            UniformValue::FloatArray(vec![1.0, 2.0, 3.0])
        );
        assert_eq!(
            UniformValue::from(Mat4::IDENTITY),
            UniformValue::Mat4(Mat4::IDENTITY)
        );
    }

    #[test]
    fn from_json_reads_scalars() {
        assert_eq!(
            UniformValue::from_json(UniformKind::Float, &json!(0.25)),
            Some(UniformValue::Float(0.25))
        );
        assert_eq!(
            UniformValue::from_json(UniformKind::Sampler2D, &json!(2)),
            Some(UniformValue::Int(2))
        );
        assert_eq!(UniformValue::from_json(UniformKind::Uint, &json!(-1)), None);
    }

    #[test]
    fn from_json_reads_vectors_and_arrays() {
        assert_eq!(
            UniformValue::from_json(UniformKind::Vec3, &json!([1, 2, 3])),
            Some(UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0)))
        );
        assert_eq!(
            UniformValue::from_json(UniformKind::Vec3, &json!([1, 2])),
            None
        );
        assert_eq!(
            UniformValue::from_json(UniformKind::IntArray, &json!([1, -2, 3])),
            Some(UniformValue::IntArray(vec![1, -2, 3]))
        );
    }

    #[test]
    fn from_json_reads_matrices_column_major() {
        let value = UniformValue::from_json(
            UniformKind::Mat2,
            &json!([1.0, 2.0, 3.0, 4.0]),
        )
        .unwrap();
        let UniformValue::Mat2(m) = value else {
            panic!("expected mat2, got {value:?}");
        };
        assert_eq!(m.x_axis, Vec2::new(1.0, 2.0));
        assert_eq!(m.y_axis, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn from_json_for_reports_mismatch_with_name() {
        let err = UniformValue::from_json_for("u_offset", UniformKind::Vec2, &json!("left"))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("u_offset"), "missing name in: {msg}");
        assert!(msg.contains("vec2"), "missing kind in: {msg}");
    }

    #[test]
    fn from_json_for_rejects_unsupported_kind() {
        let err = UniformValue::from_json_for("u_cube", UniformKind::Other(0x8B60), &json!(0))
            .unwrap_err();
        assert!(matches!(err, ProcessorError::UnsupportedUniform { gl_type: 0x8B60, .. }));
    }

    #[test]
    fn upload_sends_matrices_column_major_untransposed() {
        use crate::render::testing::{Call, RecordingContext, UniformCall};

        let gl = RecordingContext::new();
        let m = Mat2::from_cols_array(&[1.0, 2.0, 3.0, 4.0]);
        UniformValue::Mat2(m).upload(&gl, &7);
        assert_eq!(
            gl.calls(),
            vec![Call::Uniform(
                7,
                UniformCall::Mat2 {
                    transpose: false,
                    v: vec![1.0, 2.0, 3.0, 4.0]
                }
            )]
        );
    }

    #[test]
    fn upload_picks_typed_setter() {
        use crate::render::testing::{Call, RecordingContext, UniformCall};

        let gl = RecordingContext::new();
        UniformValue::Int(2).upload(&gl, &1);
        UniformValue::Vec3(Vec3::new(0.5, 0.25, 1.0)).upload(&gl, &2);
        UniformValue::FloatArray(vec![1.0; 3]).upload(&gl, &3);
        assert_eq!(
            gl.calls(),
            vec![
                Call::Uniform(1, UniformCall::I1(2)),
                Call::Uniform(2, UniformCall::F3v(vec![0.5, 0.25, 1.0])),
                Call::Uniform(3, UniformCall::F1v(vec![1.0, 1.0, 1.0])),
            ]
        );
    }
}
