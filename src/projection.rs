//! Perspective projection math.

use glam::Mat4;

use crate::error::ConfigError;

/// Validated near/far clip distances (`far > near > 0`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipPlanes {
    near: f32,
    far: f32,
}

impl ClipPlanes {
    pub fn new(near: f32, far: f32) -> Result<Self, ConfigError> {
        // written so NaN fails too
        if !(near > 0.0 && far > near) {
            return Err(ConfigError::InvalidClipPlanes { near, far });
        }
        Ok(Self { near, far })
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }
}

impl Default for ClipPlanes {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// A right-handed OpenGL-style perspective matrix.
///
/// Storage is column-major (`m[column][row]`, same as glam). Only the six
/// derived entries are ever non-zero, and they can only change by
/// re-deriving them from fov, aspect ratio and the clip planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionMatrix {
    m: [[f32; 4]; 4],
}

impl ProjectionMatrix {
    /// `fov` is the vertical field of view in degrees.
    pub fn new(fov: f32, aspect_ratio: f32, clip: ClipPlanes) -> Self {
        let mut matrix = Self { m: [[0.0; 4]; 4] };
        matrix.set_fov_and_aspect_ratio(fov, aspect_ratio);

        let (near, far) = (clip.near, clip.far);
        let range = far - near;
        matrix.m[2][2] = -(far + near) / range;
        matrix.m[2][3] = -1.0;
        matrix.m[3][2] = -(2.0 * far * near) / range;
        matrix.m[3][3] = 0.0;
        matrix
    }

    /// Validates the raw clip distances before building the matrix.
    pub fn perspective(
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(fov, aspect_ratio, ClipPlanes::new(near, far)?))
    }

    /// Re-derives the two entries that depend on fov and aspect ratio.
    pub fn set_fov_and_aspect_ratio(&mut self, fov: f32, aspect_ratio: f32) {
        let tan_half_fov = (fov.to_radians() / 2.0).tan();
        self.m[0][0] = 1.0 / (aspect_ratio * tan_half_fov);
        self.m[1][1] = 1.0 / tan_half_fov;
    }

    /// Entry at `column`, `row`.
    pub fn get(&self, column: usize, row: usize) -> f32 {
        self.m[column][row]
    }

    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        self.m
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.m)
    }
}

impl From<ProjectionMatrix> for Mat4 {
    fn from(value: ProjectionMatrix) -> Self {
        value.to_mat4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-4 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn fixed_entries_hold_for_many_inputs() {
        for &fov in &[30.0_f32, 60.0, 70.0, 90.0, 120.0] {
            for &aspect in &[0.5_f32, 1.0, 16.0 / 9.0, 3.2] {
                for &(near, far) in &[(0.01_f32, 10.0_f32), (0.1, 1000.0), (1.0, 2.0)] {
                    let p = ProjectionMatrix::perspective(fov, aspect, near, far).unwrap();
                    assert_eq!(p.get(2, 3), -1.0);
                    assert_eq!(p.get(3, 3), 0.0);
                    assert!(approx(p.get(0, 0) * aspect, p.get(1, 1)));
                }
            }
        }
    }

    #[test]
    fn off_diagonal_entries_are_zero() {
        let p = ProjectionMatrix::perspective(70.0, 1.5, 0.1, 100.0).unwrap();
        let derived = [(0, 0), (1, 1), (2, 2), (2, 3), (3, 2)];
        for c in 0..4 {
            for r in 0..4 {
                if !derived.contains(&(c, r)) {
                    assert_eq!(p.get(c, r), 0.0, "m[{c}][{r}]");
                }
            }
        }
    }

    #[test]
    fn matches_glam_perspective() {
        let p = ProjectionMatrix::perspective(70.0, 16.0 / 9.0, 0.1, 1000.0).unwrap();
        let expected = Mat4::perspective_rh_gl(70f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0);
        let (a, b) = (p.to_mat4().to_cols_array(), expected.to_cols_array());
        for i in 0..16 {
            assert!(approx(a[i], b[i]), "index {i}: {} vs {}", a[i], b[i]);
        }
    }

    #[test]
    fn aspect_change_only_touches_x_scale() {
        let mut p = ProjectionMatrix::perspective(70.0, 1.0, 0.1, 100.0).unwrap();
        let before = p;
        p.set_fov_and_aspect_ratio(70.0, 2.0);
        assert!(approx(p.get(0, 0), before.get(0, 0) / 2.0));
        assert_eq!(p.get(1, 1), before.get(1, 1));
        assert_eq!(p.get(2, 2), before.get(2, 2));
        assert_eq!(p.get(3, 2), before.get(3, 2));
    }

    #[test]
    fn rejects_bad_clip_planes() {
        assert!(matches!(
            ClipPlanes::new(1.0, 1.0),
            Err(ConfigError::InvalidClipPlanes { .. })
        ));
        assert!(ClipPlanes::new(10.0, 1.0).is_err());
        assert!(ClipPlanes::new(0.0, 1.0).is_err());
        assert!(ProjectionMatrix::perspective(70.0, 1.0, f32::NAN, 1.0).is_err());
    }
}
