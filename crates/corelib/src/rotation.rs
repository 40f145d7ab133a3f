//! Rotation-grid enumeration for posing the camera.
//!
//! The capture driver walks an immutable sequence of orientation samples
//! computed once at startup; the current sample is passed explicitly into
//! each render call.

use crate::{Mat4, Vec3};

/// One (x, y, z) orientation from the enumerated viewpoint grid, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RotationSample {
    pub x_deg: i32,
    pub y_deg: i32,
    pub z_deg: i32,
}

impl RotationSample {
    pub const ZERO: Self = Self {
        x_deg: 0,
        y_deg: 0,
        z_deg: 0,
    };

    pub fn new(x_deg: i32, y_deg: i32, z_deg: i32) -> Self {
        Self {
            x_deg,
            y_deg,
            z_deg,
        }
    }

    /// Orbit view matrix: pull the camera back by `distance` along Z, then
    /// rotate around X, Y and Z in that order.
    pub fn view_matrix(&self, distance: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -distance))
            * Mat4::from_rotation_x((self.x_deg as f32).to_radians())
            * Mat4::from_rotation_y((self.y_deg as f32).to_radians())
            * Mat4::from_rotation_z((self.z_deg as f32).to_radians())
    }
}

/// Per-axis subdivision counts for the rotation grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSteps {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridSteps {
    pub fn uniform(steps: u32) -> Self {
        Self {
            x: steps,
            y: steps,
            z: steps,
        }
    }
}

/// Enumerate the full grid, x-major then y then z, each axis sweeping
/// 0..360 by its integer step size.
pub fn enumerate(steps: GridSteps) -> Vec<RotationSample> {
    let step = |n: u32| (360 / n.max(1)).max(1) as usize;
    let mut samples = Vec::new();
    for x in (0..360).step_by(step(steps.x)) {
        for y in (0..360).step_by(step(steps.y)) {
            for z in (0..360).step_by(step(steps.z)) {
                samples.push(RotationSample::new(x, y, z));
            }
        }
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_grid_has_cubed_sample_count() {
        let samples = enumerate(GridSteps::uniform(8));
        assert_eq!(samples.len(), 8 * 8 * 8);
        assert_eq!(samples[0], RotationSample::ZERO);
    }

    #[test]
    fn grid_is_x_major_with_even_spacing() {
        let samples = enumerate(GridSteps::uniform(8));
        // Innermost axis advances first, by 360/8 degrees.
        assert_eq!(samples[1], RotationSample::new(0, 0, 45));
        assert_eq!(samples[8], RotationSample::new(0, 45, 0));
        assert_eq!(samples[64], RotationSample::new(45, 0, 0));
    }

    #[test]
    fn per_axis_steps_are_independent() {
        let samples = enumerate(GridSteps { x: 2, y: 1, z: 4 });
        assert_eq!(samples.len(), 2 * 1 * 4);
        assert_eq!(samples.last().copied(), Some(RotationSample::new(180, 0, 270)));
    }

    #[test]
    fn zero_sample_view_places_eye_at_distance() {
        let view = RotationSample::ZERO.view_matrix(0.5);
        let origin = view.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(0.0, 0.0, -0.5)).length() < 1e-6);
    }

    #[test]
    fn view_matrix_is_finite_for_all_grid_samples() {
        for sample in enumerate(GridSteps::uniform(4)) {
            let m = sample.view_matrix(0.2).to_cols_array();
            assert!(m.iter().all(|f| f.is_finite()), "sample {sample:?}");
        }
    }
}
