//! Poses along the road and the chase camera that follows them.

use crate::geom::{CurveSample, Point3, Transform, Vec3, compute_frame};

use super::surface::RoadSurface;

/// Loop duration of the fly-through animation in milliseconds.
pub const DEFAULT_LOOP_MS: f64 = 20_000.0;

/// Position and orientation at one curve parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub parameter: f64,
    pub position: Point3,
    /// Unit tangent.
    pub forward: Vec3,
    /// Horizontal lateral axis of the road frame.
    pub lateral: Vec3,
    /// Vertical axis of the road frame (the mesh shading vector).
    pub up: Vec3,
}

impl Pose {
    #[must_use]
    pub fn from_sample(sample: CurveSample, reference_up: Vec3) -> Self {
        let (frame, _) = compute_frame(sample.tangent, reference_up, None);
        Self {
            parameter: sample.parameter,
            position: sample.position,
            forward: frame.tangent,
            lateral: frame.lateral_axis,
            up: frame.vertical_axis,
        }
    }
}

/// Maps wall-clock time onto `[0, 1)` for an animation that repeats every
/// `loop_ms` milliseconds. Negative times wrap around; a non-positive or
/// non-finite loop length yields 0.
#[must_use]
pub fn loop_parameter(elapsed_ms: f64, loop_ms: f64) -> f64 {
    if !(loop_ms > 0.0) || !loop_ms.is_finite() || !elapsed_ms.is_finite() {
        return 0.0;
    }
    let t = elapsed_ms.rem_euclid(loop_ms) / loop_ms;
    // rem_euclid can round up to loop_ms for tiny negative inputs.
    if t >= 1.0 { 0.0 } else { t }
}

/// Eye and target of a chase camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPlacement {
    pub eye: Point3,
    pub target: Point3,
    pub up: Vec3,
}

impl CameraPlacement {
    /// Camera-to-world transform looking from `eye` at `target`.
    #[must_use]
    pub fn view_transform(&self) -> Option<Transform> {
        Transform::look_at(self.eye, self.target, self.up)
    }
}

/// Chase camera riding along the road at uniform speed.
///
/// The eye sits `eye_lift` above the road at fraction `u` of its length and
/// looks at the point `look_ahead` further along, raised by `target_lift`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowCamera {
    pub look_ahead: f64,
    pub eye_lift: f64,
    pub target_lift: f64,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            look_ahead: 0.005,
            eye_lift: 0.3,
            target_lift: 0.03,
        }
    }
}

impl FollowCamera {
    #[must_use]
    pub fn place(&self, surface: &RoadSurface, u: f64) -> CameraPlacement {
        let pose = surface.pose_at_arc(u);
        let ahead_u = (pose_fraction(u) + self.look_ahead).min(1.0);
        let ahead = surface.curve().point_at_arc(ahead_u);
        CameraPlacement {
            eye: pose.position + pose.up * self.eye_lift,
            target: ahead + pose.up * self.target_lift,
            up: pose.up,
        }
    }

    #[must_use]
    pub fn place_at_time(&self, surface: &RoadSurface, elapsed_ms: f64, loop_ms: f64) -> CameraPlacement {
        self.place(surface, loop_parameter(elapsed_ms, loop_ms))
    }
}

fn pose_fraction(u: f64) -> f64 {
    if u.is_nan() { 0.0 } else { u.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_parameter_wraps() {
        assert_eq!(loop_parameter(0.0, DEFAULT_LOOP_MS), 0.0);
        assert_eq!(loop_parameter(5_000.0, DEFAULT_LOOP_MS), 0.25);
        assert_eq!(loop_parameter(25_000.0, DEFAULT_LOOP_MS), 0.25);
        assert_eq!(loop_parameter(-5_000.0, DEFAULT_LOOP_MS), 0.75);
        assert_eq!(loop_parameter(1.0, 0.0), 0.0);
        assert_eq!(loop_parameter(f64::NAN, DEFAULT_LOOP_MS), 0.0);
    }

    #[test]
    fn test_pose_from_sample() {
        let sample = CurveSample {
            parameter: 0.5,
            position: Point3::new(1.0, 2.0, 3.0),
            tangent: Vec3::Z,
        };
        let pose = Pose::from_sample(sample, Vec3::Y);
        assert_eq!(pose.parameter, 0.5);
        assert_eq!(pose.forward, Vec3::Z);
        assert_eq!(pose.lateral, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(pose.up, Vec3::Y);
    }
}
