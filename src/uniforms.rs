use gfx_maths::{Mat4, Vec2, Vec3, Vec4};
use crate::backend::ShaderBackend;

/// 2x2 matrix, column-major.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mat2 {
    pub values: [f32; 4],
}

/// 3x3 matrix, column-major.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mat3 {
    pub values: [f32; 9],
}

impl Mat2 {
    pub fn identity() -> Mat2 {
        Mat2 { values: [1.0, 0.0, 0.0, 1.0] }
    }

    pub fn from_cols(c0: Vec2, c1: Vec2) -> Mat2 {
        Mat2 { values: [c0.x, c0.y, c1.x, c1.y] }
    }
}

impl Mat3 {
    pub fn identity() -> Mat3 {
        Mat3 { values: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0] }
    }

    pub fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Mat3 {
        Mat3 { values: [c0.x, c0.y, c0.z, c1.x, c1.y, c1.z, c2.x, c2.y, c2.z] }
    }

    /// upper-left 3x3 of a 4x4, e.g. for a normal matrix
    pub fn from_mat4(m: &Mat4) -> Mat3 {
        let v = &m.values;
        Mat3 { values: [v[0], v[1], v[2], v[4], v[5], v[6], v[8], v[9], v[10]] }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            UniformValue::Bool(_) => "bool",
            UniformValue::Int(_) => "int",
            UniformValue::Float(_) => "float",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Mat2(_) => "mat2",
            UniformValue::Mat3(_) => "mat3",
            UniformValue::Mat4(_) => "mat4",
        }
    }

    /// Uploads the value to `location` of whatever program is currently bound.
    /// Matrices are sent column-major and never transposed.
    pub fn upload<B: ShaderBackend>(&self, backend: &B, location: Option<&B::UniformLocation>) {
        match *self {
            UniformValue::Bool(v) => backend.uniform_1_i32(location, v as i32),
            UniformValue::Int(v) => backend.uniform_1_i32(location, v),
            UniformValue::Float(v) => backend.uniform_1_f32(location, v),
            UniformValue::Vec2(v) => backend.uniform_2_f32(location, v.x, v.y),
            UniformValue::Vec3(v) => backend.uniform_3_f32(location, v.x, v.y, v.z),
            UniformValue::Vec4(v) => backend.uniform_4_f32(location, v.x, v.y, v.z, v.w),
            UniformValue::Mat2(m) => backend.uniform_matrix_2_f32_slice(location, false, &m.values),
            UniformValue::Mat3(m) => backend.uniform_matrix_3_f32_slice(location, false, &m.values),
            UniformValue::Mat4(m) => backend.uniform_matrix_4_f32_slice(location, false, &m.values),
        }
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Bool(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<(f32, f32)> for UniformValue {
    fn from((x, y): (f32, f32)) -> Self {
        UniformValue::Vec2(Vec2::new(x, y))
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<(f32, f32, f32)> for UniformValue {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        UniformValue::Vec3(Vec3::new(x, y, z))
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<(f32, f32, f32, f32)> for UniformValue {
    fn from((x, y, z, w): (f32, f32, f32, f32)) -> Self {
        UniformValue::Vec4(Vec4::new(x, y, z, w))
    }
}

impl From<Mat2> for UniformValue {
    fn from(m: Mat2) -> Self {
        UniformValue::Mat2(m)
    }
}

impl From<Mat3> for UniformValue {
    fn from(m: Mat3) -> Self {
        UniformValue::Mat3(m)
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_tuples_become_vectors() {
        assert_eq!(UniformValue::from((1.0f32, 2.0f32)), UniformValue::Vec2(Vec2::new(1.0, 2.0)));
        assert_eq!(UniformValue::from((1.0f32, 2.0f32, 3.0f32, 4.0f32)), UniformValue::Vec4(Vec4::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(UniformValue::from((1.0f32, 2.0f32, 3.0f32)).type_name(), "vec3");
    }

    #[test]
    fn from_cols_is_column_major() {
        let m = Mat2::from_cols(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0));
        assert_eq!(m.values, [1.0, 2.0, 3.0, 4.0]);
        let m = Mat3::from_cols(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0), Vec3::new(7.0, 8.0, 9.0));
        assert_eq!(m.values[3], 4.0);
    }

    #[test]
    fn mat3_from_identity_mat4() {
        assert_eq!(Mat3::from_mat4(&Mat4::identity()), Mat3::identity());
    }
}
