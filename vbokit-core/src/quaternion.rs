/// Rotation quaternion
use crate::matrix::Mat3;
use crate::vector::Vec3;

/// Unit quaternion `(x, y, z, w)`.
///
/// Conversions assume unit length; nothing renormalizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// Below this `sqrt(1 - w^2)` the axis is returned unscaled
const AXIS_EPSILON: f32 = 1e-3;

impl Quaternion {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `angle` radians around `axis`. The axis must be normalized.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (s, c) = (angle / 2.0).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Axis and angle (radians).
    ///
    /// For near-zero rotations the raw `(x, y, z)` is returned as the axis
    /// instead of dividing by a vanishing sine.
    pub fn axis_angle(&self) -> (Vec3, f32) {
        let angle = 2.0 * self.w.acos();
        let s = (1.0 - self.w * self.w).sqrt();
        let axis = if s < AXIS_EPSILON {
            Vec3::new(self.x, self.y, self.z)
        } else {
            Vec3::new(self.x / s, self.y / s, self.z / s)
        };
        (axis, angle)
    }

    /// Rotation matrix for the row-vector convention (`v' = v * M`)
    pub fn to_mat3(&self) -> Mat3 {
        let Self { x, y, z, w } = *self;
        Mat3::new([
            1.0 - 2.0 * y * y - 2.0 * z * z,
            2.0 * x * y + 2.0 * w * z,
            2.0 * x * z - 2.0 * w * y,
            //
            2.0 * x * y - 2.0 * w * z,
            1.0 - 2.0 * x * x - 2.0 * z * z,
            2.0 * y * z + 2.0 * w * x,
            //
            2.0 * x * z + 2.0 * w * y,
            2.0 * y * z - 2.0 * w * x,
            1.0 - 2.0 * x * x - 2.0 * y * y,
        ])
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!((a - b).norm() < 1e-4, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_identity_matrix() {
        let m = Quaternion::identity().to_mat3();
        assert_eq!(m, Mat3::identity());
    }

    #[test]
    fn test_axis_is_fixed_point() {
        let axes = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 2.0, 3.0).normalized(),
            Vec3::new(-0.5, 0.25, 1.0).normalized(),
        ];
        for axis in axes {
            for angle in [0.1f32, 1.0, 2.5, -0.7, 3.0] {
                let m = Quaternion::from_axis_angle(axis, angle).to_mat3();
                assert_vec_eq(m.apply(axis), axis);
            }
        }
    }

    #[test]
    fn test_rotate_basis_about_z() {
        let m = Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2).to_mat3();
        assert_vec_eq(m.apply(Vec3::new(1.0, 0.0, 0.0)), Vec3::new(0.0, 1.0, 0.0));
        assert_vec_eq(m.apply(Vec3::new(0.0, 1.0, 0.0)), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotate_basis_about_x() {
        let m = Quaternion::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), FRAC_PI_2).to_mat3();
        assert_vec_eq(m.apply(Vec3::new(0.0, 1.0, 0.0)), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_axis_angle_round_trip() {
        let axis = Vec3::new(0.0, 0.6, 0.8);
        let (a, angle) = Quaternion::from_axis_angle(axis, 1.2).axis_angle();
        assert_vec_eq(a, axis);
        assert!((angle - 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_axis_angle_near_zero_returns_raw_components() {
        let q = Quaternion::identity();
        let (axis, angle) = q.axis_angle();
        assert_eq!(axis, Vec3::zero());
        assert_eq!(angle, 0.0);
    }
}
