//! Component-form placement of quads and meshes.
//!
//! The renderer contract accepts draws either as a [`Transform`] or as a
//! precomputed [`Mat4`]. Every component-form draw reduces to the matrix form
//! through [`Transform::matrix`], so there is exactly one place where
//! position, scale and rotation are combined.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position, scale and Euler rotation (radians, applied X then Y then Z).
///
/// For quads, `scale` is the quad size: a unit quad spans `0..1` on X and Y,
/// so `scale.x`/`scale.y` are width and height and `scale.z` is depth.
///
/// # Example
///
/// ```
/// use lamina::{Transform, Vec3};
///
/// let t = Transform::new()
///     .position(Vec3::new(10.0, 20.0, 0.0))
///     .scale(Vec3::new(64.0, 32.0, 1.0));
/// let m = t.matrix();
/// assert_eq!(m.transform_point3(Vec3::new(1.0, 1.0, 0.0)), Vec3::new(74.0, 52.0, 0.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation.
    pub position: Vec3,
    /// Per-axis scale (quad size for quads).
    pub scale: Vec3,
    /// Euler angles in radians.
    pub rotation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
        }
    }
}

impl Transform {
    /// Identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Position, then size, then rotation, as flat components.
    #[allow(clippy::too_many_arguments)]
    pub fn from_components(
        x: f32,
        y: f32,
        z: f32,
        width: f32,
        height: f32,
        depth: f32,
        rotation_x: f32,
        rotation_y: f32,
        rotation_z: f32,
    ) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            scale: Vec3::new(width, height, depth),
            rotation: Vec3::new(rotation_x, rotation_y, rotation_z),
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Rotation as a quaternion.
    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}
