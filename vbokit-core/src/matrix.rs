//! Row-major 3x3 and 4x4 matrices.
//!
//! Vectors are rows and are multiplied on the left (`v' = v * M`), DirectX
//! style, so a chain reads in application order:
//!
//! ```text
//! clip = vec4 * Model * View * Projection
//! ```
//!
//! Storage is row-major:
//!
//! ```text
//! | 0  1  2  3|
//! | 4  5  6  7|
//! | 8  9 10 11|
//! |12 13 14 15|
//! ```
//!
//! Translation lives in row 3. A column-major consumer that multiplies
//! `M * v` can take [`Mat4::to_column_major`] unchanged; one that wants the
//! same memory as ours must be told the matrix is transposed.

use std::ops::Mul;

use nalgebra::{Matrix3, Matrix4};

use crate::error::{Error, Result};
use crate::vector::{Vec3, Vec4};

const TO_RADIANS: f32 = std::f32::consts::PI / 180.0;

/// Row-major 3x3 matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub m: [f32; 9],
}

impl Mat3 {
    pub const fn new(m: [f32; 9]) -> Self {
        Self { m }
    }

    pub const fn identity() -> Self {
        Self::new([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }

    pub fn from_slice(values: &[f32]) -> Result<Self> {
        let m: [f32; 9] = values
            .try_into()
            .map_err(|_| Error::arity("Mat3", 9, values.len()))?;
        Ok(Self::new(m))
    }

    pub fn from_rows(r0: Vec3, r1: Vec3, r2: Vec3) -> Self {
        Self::new([r0.x, r0.y, r0.z, r1.x, r1.y, r1.z, r2.x, r2.y, r2.z])
    }

    /// Row `n` (0..3)
    pub fn row(&self, n: usize) -> Vec3 {
        Vec3::new(self.m[n * 3], self.m[n * 3 + 1], self.m[n * 3 + 2])
    }

    /// Column `n` (0..3)
    pub fn col(&self, n: usize) -> Vec3 {
        Vec3::new(self.m[n], self.m[n + 3], self.m[n + 6])
    }

    /// `v * self`
    pub fn apply(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.col(0)), v.dot(self.col(1)), v.dot(self.col(2)))
    }

    pub fn transposed(&self) -> Self {
        Self::from_rows(self.col(0), self.col(1), self.col(2))
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul<Mat3> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: Mat3) -> Vec3 {
        rhs.apply(self)
    }
}

impl From<Mat3> for Matrix3<f32> {
    /// Column-vector equivalent: `Matrix3::from(m) * v == v * m`
    fn from(m: Mat3) -> Self {
        Matrix3::from_column_slice(&m.m)
    }
}

/// Row-major 4x4 matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [f32; 16],
}

impl Mat4 {
    pub const fn new(m: [f32; 16]) -> Self {
        Self { m }
    }

    pub const fn identity() -> Self {
        Self::new([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn from_slice(values: &[f32]) -> Result<Self> {
        let m: [f32; 16] = values
            .try_into()
            .map_err(|_| Error::arity("Mat4", 16, values.len()))?;
        Ok(Self::new(m))
    }

    pub fn from_rows(r0: Vec4, r1: Vec4, r2: Vec4, r3: Vec4) -> Self {
        let mut m = [0.0; 16];
        for (i, r) in [r0, r1, r2, r3].into_iter().enumerate() {
            m[i * 4..i * 4 + 4].copy_from_slice(&r.to_array());
        }
        Self::new(m)
    }

    pub fn row(&self, n: usize) -> Vec4 {
        Vec4::new(
            self.m[n * 4],
            self.m[n * 4 + 1],
            self.m[n * 4 + 2],
            self.m[n * 4 + 3],
        )
    }

    pub fn col(&self, n: usize) -> Vec4 {
        Vec4::new(self.m[n], self.m[n + 4], self.m[n + 8], self.m[n + 12])
    }

    /// Rotation/scale block
    pub fn upper_left3(&self) -> Mat3 {
        Mat3::from_rows(self.row(0).xyz(), self.row(1).xyz(), self.row(2).xyz())
    }

    pub fn transposed(&self) -> Self {
        Self::from_rows(self.col(0), self.col(1), self.col(2), self.col(3))
    }

    /// Same matrix laid out column by column
    pub fn to_column_major(&self) -> [f32; 16] {
        self.transposed().m
    }

    /// `v * self` with an implicit `w = 1`; the resulting w is dropped
    pub fn apply(&self, v: Vec3) -> Vec3 {
        self.apply4(Vec4::from_vec3(v, 1.0)).xyz()
    }

    /// `v * self`
    pub fn apply4(&self, v: Vec4) -> Vec4 {
        Vec4::new(
            v.dot(self.col(0)),
            v.dot(self.col(1)),
            v.dot(self.col(2)),
            v.dot(self.col(3)),
        )
    }

    /// Orthographic projection mapping the box to `[-1, 1]^3`
    pub fn orthographic(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Self {
        Self::new([
            2.0 / (r - l), 0.0, 0.0, 0.0, //
            0.0, 2.0 / (t - b), 0.0, 0.0, //
            0.0, 0.0, 2.0 / (f - n), 0.0, //
            -(r + l) / (r - l), -(t + b) / (t - b), -(n + f) / (f - n), 1.0,
        ])
    }

    /// Pinhole projection looking down +Z (w = z).
    ///
    /// `fovy` is the vertical field of view in degrees. The focal length is
    /// `1 / tan(fovy / 2)`, not `1 / atan(..)`, and the depth row is built
    /// from `near` and `far` only: clip z runs linearly from -1 at `near` to
    /// +1 at `far`, before the divide by w.
    pub fn pinhole(fovy: f32, aspect: f32, near: f32, far: f32) -> Self {
        let focal = focal_length(fovy);
        Self::new([
            focal / aspect, 0.0, 0.0, 0.0, //
            0.0, focal, 0.0, 0.0, //
            0.0, 0.0, 2.0 / (far - near), 1.0, //
            0.0, 0.0, -(near + far) / (far - near), 0.0,
        ])
    }

    /// Right-handed perspective looking down -Z; near maps to -1, far to +1.
    ///
    /// `fovy` is in degrees.
    pub fn perspective_rh(fovy: f32, aspect: f32, near: f32, far: f32) -> Self {
        let focal = focal_length(fovy);
        Self::new([
            focal / aspect, 0.0, 0.0, 0.0, //
            0.0, focal, 0.0, 0.0, //
            0.0, 0.0, (far + near) / (near - far), -1.0, //
            0.0, 0.0, 2.0 * far * near / (near - far), 0.0,
        ])
    }

    /// Left-handed counterpart of [`Mat4::perspective_rh`] with the depth
    /// terms negated; near maps to +1, far to -1.
    ///
    /// `fovy` is in degrees.
    pub fn perspective_lh(fovy: f32, aspect: f32, near: f32, far: f32) -> Self {
        let focal = focal_length(fovy);
        Self::new([
            focal / aspect, 0.0, 0.0, 0.0, //
            0.0, focal, 0.0, 0.0, //
            0.0, 0.0, (far + near) / (far - near), -1.0, //
            0.0, 0.0, 2.0 * far * near / (far - near), 0.0,
        ])
    }

    pub fn translate(x: f32, y: f32, z: f32) -> Self {
        Self::new([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            x, y, z, 1.0,
        ])
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        Self::new([
            x, 0.0, 0.0, 0.0, //
            0.0, y, 0.0, 0.0, //
            0.0, 0.0, z, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Rotation about X. Angle in **degrees**.
    pub fn rotate_x_degrees(degrees: f32) -> Self {
        let (s, c) = (degrees * TO_RADIANS).sin_cos();
        Self::new([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, s, 0.0, //
            0.0, -s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Rotation about Y. Angle in **degrees**.
    pub fn rotate_y_degrees(degrees: f32) -> Self {
        let (s, c) = (degrees * TO_RADIANS).sin_cos();
        Self::new([
            c, 0.0, -s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Rotation about Z. Angle in **radians**, unlike the X/Y helpers.
    pub fn rotate_z_radians(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new([
            c, s, 0.0, 0.0, //
            -s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }
}

/// `1 / tan(fovy / 2)` for all perspective variants
fn focal_length(fovy_degrees: f32) -> f32 {
    1.0 / (fovy_degrees * TO_RADIANS / 2.0).tan()
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    /// `v * (self * rhs) == (v * self) * rhs`
    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut m = [0.0; 16];
        for i in 0..4 {
            let row = self.row(i);
            for j in 0..4 {
                m[i * 4 + j] = row.dot(rhs.col(j));
            }
        }
        Mat4::new(m)
    }
}

impl Mul<Mat4> for Vec4 {
    type Output = Vec4;

    fn mul(self, rhs: Mat4) -> Vec4 {
        rhs.apply4(self)
    }
}

impl Mul<Mat4> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: Mat4) -> Vec3 {
        rhs.apply(self)
    }
}

impl From<Mat4> for Matrix4<f32> {
    /// Column-vector equivalent: `Matrix4::from(m) * v == v * m`
    fn from(m: Mat4) -> Self {
        Matrix4::from_column_slice(&m.m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Vector3, Vector4};

    fn assert_vec3_eq(a: Vec3, b: Vec3) {
        assert!((a - b).norm() < 1e-4, "{:?} != {:?}", a, b);
    }

    fn assert_mat_eq(a: &Mat4, b: &Mat4) {
        for (x, y) in a.m.iter().zip(b.m.iter()) {
            assert!((x - y).abs() < 1e-5, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_identity_apply() {
        let v = Vec3::new(1.5, -2.0, 3.25);
        assert_eq!(Mat4::identity().apply(v), v);
        let v4 = Vec4::new(1.5, -2.0, 3.25, 0.5);
        assert_eq!(Mat4::identity().apply4(v4), v4);
    }

    #[test]
    fn test_row_col_extraction() {
        let m = Mat4::from_slice(&(0..16).map(|i| i as f32).collect::<Vec<_>>()).unwrap();
        assert_eq!(m.row(1), Vec4::new(4.0, 5.0, 6.0, 7.0));
        assert_eq!(m.col(2), Vec4::new(2.0, 6.0, 10.0, 14.0));
        assert_eq!(m.transposed().row(2), m.col(2));
    }

    #[test]
    fn test_from_slice_arity() {
        assert!(matches!(
            Mat4::from_slice(&[0.0; 15]),
            Err(Error::InvalidArgument { expected: 16, got: 15, .. })
        ));
        assert!(matches!(
            Mat3::from_slice(&[0.0; 10]),
            Err(Error::InvalidArgument { expected: 9, got: 10, .. })
        ));
    }

    #[test]
    fn test_multiply_applies_left_to_right() {
        let a = Mat4::rotate_z_radians(0.7) * Mat4::translate(1.0, 2.0, 3.0);
        let b = Mat4::rotate_x_degrees(35.0) * Mat4::scale(2.0, 0.5, 1.0);
        let v = Vec3::new(0.3, -1.2, 2.0);
        assert_vec3_eq(v * (a * b), (v * a) * b);
    }

    #[test]
    fn test_identity_is_neutral() {
        let a = Mat4::rotate_y_degrees(20.0) * Mat4::translate(1.0, 0.0, -4.0);
        assert_mat_eq(&(a * Mat4::identity()), &a);
        assert_mat_eq(&(Mat4::identity() * a), &a);
    }

    #[test]
    fn test_translate_then_inverse() {
        let m = Mat4::translate(1.0, -2.0, 3.0) * Mat4::translate(-1.0, 2.0, -3.0);
        assert_mat_eq(&m, &Mat4::identity());
        let r = Mat4::rotate_x_degrees(30.0) * Mat4::rotate_x_degrees(-30.0);
        assert_mat_eq(&r, &Mat4::identity());
    }

    #[test]
    fn test_translation_lives_in_row_three() {
        let m = Mat4::translate(4.0, 5.0, 6.0);
        assert_eq!(m.row(3), Vec4::new(4.0, 5.0, 6.0, 1.0));
        assert_eq!(m.apply(Vec3::zero()), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(m.apply4(Vec4::new(1.0, 0.0, 0.0, 0.0)), Vec4::new(1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_axis_rotation_units() {
        assert_vec3_eq(
            Mat4::rotate_x_degrees(90.0).apply(Vec3::new(0.0, 1.0, 0.0)),
            Vec3::new(0.0, 0.0, 1.0),
        );
        assert_vec3_eq(
            Mat4::rotate_y_degrees(90.0).apply(Vec3::new(0.0, 0.0, 1.0)),
            Vec3::new(1.0, 0.0, 0.0),
        );
        assert_vec3_eq(
            Mat4::rotate_z_radians(std::f32::consts::FRAC_PI_2).apply(Vec3::new(1.0, 0.0, 0.0)),
            Vec3::new(0.0, 1.0, 0.0),
        );
    }

    #[test]
    fn test_rotations_match_nalgebra() {
        let v = Vec3::new(0.4, 1.0, -2.0);
        let cases = [
            (Mat4::rotate_x_degrees(40.0), Vector3::x_axis(), 40.0f32.to_radians()),
            (Mat4::rotate_y_degrees(-75.0), Vector3::y_axis(), (-75.0f32).to_radians()),
            (Mat4::rotate_z_radians(1.3), Vector3::z_axis(), 1.3),
        ];
        for (m, axis, angle) in cases {
            let expected = Rotation3::from_axis_angle(&axis, angle) * Vector3::from(v);
            assert_vec3_eq(m.apply(v), Vec3::from(expected));
        }
    }

    #[test]
    fn test_nalgebra_conversion_is_column_vector_equivalent() {
        let m = Mat4::rotate_y_degrees(33.0) * Mat4::translate(1.0, 2.0, 3.0);
        let v = Vec4::new(0.5, -1.0, 2.0, 1.0);
        let expected = m.apply4(v);
        let got = Matrix4::from(m) * Vector4::from(v);
        assert!((got - Vector4::from(expected)).norm() < 1e-5);
        assert_eq!(m.to_column_major(), m.transposed().m);
    }

    #[test]
    fn test_upper_left3() {
        let m = Mat4::rotate_z_radians(0.5) * Mat4::translate(9.0, 9.0, 9.0);
        let r = m.upper_left3();
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_vec3_eq(r.apply(v), Mat4::rotate_z_radians(0.5).apply(v));
    }

    #[test]
    fn test_orthographic_maps_box_to_unit_cube() {
        let m = Mat4::orthographic(-2.0, 2.0, -1.0, 1.0, 0.0, 4.0);
        assert_vec3_eq(m.apply(Vec3::new(-2.0, -1.0, 0.0)), Vec3::new(-1.0, -1.0, -1.0));
        assert_vec3_eq(m.apply(Vec3::new(2.0, 1.0, 4.0)), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_perspective_rh_depth_range() {
        let m = Mat4::perspective_rh(60.0, 1.5, 1.0, 50.0);
        let near = m.apply4(Vec4::new(0.0, 0.0, -1.0, 1.0)).perspective_divide();
        let far = m.apply4(Vec4::new(0.0, 0.0, -50.0, 1.0)).perspective_divide();
        assert!((near.z + 1.0).abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_perspective_lh_depth_range() {
        let m = Mat4::perspective_lh(60.0, 1.5, 1.0, 50.0);
        let near = m.apply4(Vec4::new(0.0, 0.0, -1.0, 1.0)).perspective_divide();
        let far = m.apply4(Vec4::new(0.0, 0.0, -50.0, 1.0)).perspective_divide();
        assert!((near.z - 1.0).abs() < 1e-5);
        assert!((far.z + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_pinhole_field_of_view() {
        let m = Mat4::pinhole(30.0, 2.0, 1.0, 40.0);
        let z = 10.0;
        let edge = z * 15.0f32.to_radians().tan();
        let clip = m.apply4(Vec4::new(0.0, edge, z, 1.0));
        assert!((clip.w - z).abs() < 1e-5);
        assert!((clip.perspective_divide().y - 1.0).abs() < 1e-5);

        let side = m.apply4(Vec4::new(2.0 * edge, 0.0, z, 1.0)).perspective_divide();
        assert!((side.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_pinhole_depth_terms() {
        let m = Mat4::pinhole(30.0, 1.0, 1.0, 40.0);
        assert!((m.m[5] - 1.0 / 15.0f32.to_radians().tan()).abs() < 1e-5);
        assert!((m.m[10] - 2.0 / 39.0).abs() < 1e-6);
        assert!((m.m[14] + 41.0 / 39.0).abs() < 1e-6);

        let near = m.apply4(Vec4::new(0.0, 0.0, 1.0, 1.0));
        let far = m.apply4(Vec4::new(0.0, 0.0, 40.0, 1.0));
        assert!((near.z + 1.0).abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-5);
        assert!((far.w - 40.0).abs() < 1e-5);
    }

    #[test]
    fn test_perspective_matches_nalgebra() {
        let ours = Mat4::perspective_rh(45.0, 4.0 / 3.0, 0.1, 100.0);
        let theirs = Matrix4::new_perspective(4.0 / 3.0, 45.0f32.to_radians(), 0.1, 100.0);
        let converted = Matrix4::from(ours);
        assert!((converted - theirs).norm() < 1e-4);
    }
}
