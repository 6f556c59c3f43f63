//! Orthonormal road frames along a centre line.
//!
//! A road frame is built from the curve tangent and a fixed reference up
//! direction. The lateral axis is always flattened into the plane
//! perpendicular to up, so the cross-section stays level however steeply the
//! road climbs; banking is not modelled.

use super::core::{Tolerance, Vec3};
use super::diagnostics::DegenerateEvent;

/// Local frame at one curve sample.
///
/// `lateral_axis` is perpendicular to the reference up direction.
/// `vertical_axis = normalize(lateral_axis × tangent)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadFrame {
    pub tangent: Vec3,
    pub lateral_axis: Vec3,
    pub vertical_axis: Vec3,
}

/// Which fallbacks were taken while building a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFallbacks {
    pub alternate_reference: bool,
    pub held_lateral: bool,
}

impl FrameFallbacks {
    #[must_use]
    pub const fn is_degenerate(self) -> bool {
        self.alternate_reference || self.held_lateral
    }

    pub fn events(self) -> impl Iterator<Item = DegenerateEvent> {
        [
            self.alternate_reference.then_some(DegenerateEvent::ParallelToUp),
            self.held_lateral.then_some(DegenerateEvent::HeldLateral),
        ]
        .into_iter()
        .flatten()
    }
}

/// Axis used in place of `up` when the tangent runs parallel to it.
#[must_use]
pub fn alternate_reference(up: Vec3) -> Vec3 {
    if up.dot(Vec3::X).abs() < 0.9 { Vec3::X } else { Vec3::Z }
}

/// Builds the frame for a unit `tangent`.
///
/// 1. `lateral = tangent × up`, or `tangent × alternate` when
///    `|tangent · up| > 1 - 1e-6`.
/// 2. The lateral axis is flattened (its component along `up` removed) and
///    normalised. If it collapses, `previous_lateral` is reused, or a fixed
///    horizontal axis when there is none. A unit tangent never reaches this
///    branch for any `reference_up`: the cross product is already
///    perpendicular to `up`, and the parallel check in step 1 switches axes
///    before it can shrink. Only a zero or near-zero tangent collapses it.
/// 3. `vertical = normalize(lateral × tangent)`.
#[must_use]
pub fn compute_frame(
    tangent: Vec3,
    reference_up: Vec3,
    previous_lateral: Option<Vec3>,
) -> (RoadFrame, FrameFallbacks) {
    let up = reference_up.normalized().unwrap_or(Vec3::Y);
    let mut fallbacks = FrameFallbacks::default();

    let reference = if tangent.dot(up).abs() > 1.0 - Tolerance::PARALLEL.eps {
        fallbacks.alternate_reference = true;
        alternate_reference(up)
    } else {
        up
    };

    let flattened = tangent.cross(reference).reject_from(up);
    let lateral_axis = match flattened.normalized_above(Tolerance::LATERAL.eps) {
        Some(lateral) => lateral,
        None => {
            fallbacks.held_lateral = true;
            previous_lateral
                .and_then(|prev| prev.reject_from(up).normalized())
                .or_else(|| alternate_reference(up).reject_from(up).normalized())
                .unwrap_or(Vec3::X)
        }
    };

    let vertical_axis = lateral_axis.cross(tangent).normalized().unwrap_or(up);

    (
        RoadFrame {
            tangent,
            lateral_axis,
            vertical_axis,
        },
        fallbacks,
    )
}

/// Walks frames along a curve, carrying the previous lateral axis forward.
#[derive(Debug, Clone)]
pub struct FrameComputer {
    reference_up: Vec3,
    previous_lateral: Option<Vec3>,
}

impl FrameComputer {
    #[must_use]
    pub fn new(reference_up: Vec3) -> Self {
        Self {
            reference_up,
            previous_lateral: None,
        }
    }

    #[must_use]
    pub const fn reference_up(&self) -> Vec3 {
        self.reference_up
    }

    pub fn next_frame(&mut self, tangent: Vec3) -> (RoadFrame, FrameFallbacks) {
        let (frame, fallbacks) = compute_frame(tangent, self.reference_up, self.previous_lateral);
        self.previous_lateral = Some(frame.lateral_axis);
        (frame, fallbacks)
    }

    pub fn reset(&mut self) {
        self.previous_lateral = None;
    }
}
