use crate::Mat4;

/// Perspective projection shared by the preview window and the capture
/// target (right-handed, depth 0..1). The view matrix comes from the
/// rotation sample, not from the camera.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Camera {
    pub fn new(fov_y_rad: f32, z_near: f32, z_far: f32, aspect: f32) -> Self {
        Self {
            fov_y_rad,
            z_near,
            z_far,
            aspect,
        }
    }

    #[inline]
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_rad,
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }

    #[inline]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }
}

impl Default for Camera {
    /// The demo camera: 60 degree vertical FOV, near 0.1, far 10.
    fn default() -> Self {
        Self::new(60f32.to_radians(), 0.1, 10.0, 1.0)
    }
}
