/// Model-space transforms for scene nodes
use crate::matrix::Mat4;
use crate::quaternion::Quaternion;
use crate::vector::{Vec3, Vec4};

/// Position and rotation of a node. Fields are set directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quaternion,
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }

    /// Rotation in the upper-left 3x3, position in row 3
    pub fn to_mat4(&self) -> Mat4 {
        let r = self.rotation.to_mat3();
        Mat4::from_rows(
            Vec4::from_vec3(r.row(0), 0.0),
            Vec4::from_vec3(r.row(1), 0.0),
            Vec4::from_vec3(r.row(2), 0.0),
            Vec4::from_vec3(self.position, 1.0),
        )
    }

    /// Create a model-view-projection matrix (row-vector order)
    pub fn mvp_matrix(model: &Mat4, view: &Mat4, projection: &Mat4) -> Mat4 {
        *model * *view * *projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        assert_eq!(Transform::identity().to_mat4(), Mat4::identity());
    }

    #[test]
    fn test_translation_row() {
        let t = Transform::new(Vec3::new(1.0, 2.0, 3.0), Quaternion::identity());
        let m = t.to_mat4();
        assert_eq!(m.row(3), Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(m.col(3), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_rotates_then_translates() {
        let rotation =
            Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), std::f32::consts::FRAC_PI_2);
        let t = Transform::new(Vec3::new(10.0, 0.0, 0.0), rotation);
        let p = t.to_mat4().apply(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(10.0, 1.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_mvp_order() {
        let model = Mat4::translate(0.0, 0.0, 1.0);
        let view = Mat4::translate(0.0, 0.0, 4.0);
        let projection = Mat4::scale(0.5, 0.5, 0.5);
        let mvp = Transform::mvp_matrix(&model, &view, &projection);
        assert_eq!(mvp.apply(Vec3::zero()), Vec3::new(0.0, 0.0, 2.5));
    }
}
