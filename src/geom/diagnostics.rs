//! Diagnostics reported alongside every ribbon mesh.
//!
//! Degenerate situations along the centre line (coincident control points, a
//! tangent running parallel to the reference up direction, a collapsed lateral
//! axis) are resolved by deterministic fallbacks. Each fallback is counted here
//! so callers can tell a clean build from one that had to improvise.
//!
//! ```ignore
//! let (mesh, diagnostics) = build_ribbon_mesh(&curve, &profile, options)?;
//! if !diagnostics.is_clean() {
//!     for warning in &diagnostics.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//! }
//! ```

use std::fmt;

/// Kinds of fallback taken while building frames along the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DegenerateEvent {
    /// Zero-length curve derivative; a substitute tangent was used.
    ZeroTangent,
    /// Tangent nearly parallel to the reference up; an alternate reference axis was used.
    ParallelToUp,
    /// Lateral axis collapsed after flattening; the previous lateral axis was reused.
    HeldLateral,
}

impl DegenerateEvent {
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::ZeroTangent => "zero-length tangent replaced",
            Self::ParallelToUp => "tangent parallel to up, alternate reference used",
            Self::HeldLateral => "lateral axis collapsed, previous lateral reused",
        }
    }
}

/// Upper bound on stored warning strings. Counters keep counting past it.
const MAX_WARNINGS: usize = 16;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RoadMeshDiagnostics {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub group_count: usize,

    /// Samples whose tangent came from a fallback.
    pub zero_tangent_count: usize,
    /// Samples where the alternate reference axis replaced the up direction.
    pub parallel_frame_count: usize,
    /// Samples that reused the previous lateral axis.
    pub held_lateral_count: usize,

    /// Total curve length used for the UV `u` coordinate.
    pub curve_length: f64,
    /// Set when the curve has zero length and every `u` collapsed to 0.
    pub zero_length_curve: bool,

    /// Only populated with the `road_metrics` feature on native targets.
    pub timing: Option<super::metrics::GeomTimingReport>,

    pub warnings: Vec<String>,
}

impl RoadMeshDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts `event` at curve parameter `t` and keeps a bounded warning trail.
    pub fn record(&mut self, event: DegenerateEvent, t: f64) {
        match event {
            DegenerateEvent::ZeroTangent => self.zero_tangent_count += 1,
            DegenerateEvent::ParallelToUp => self.parallel_frame_count += 1,
            DegenerateEvent::HeldLateral => self.held_lateral_count += 1,
        }
        if self.warnings.len() < MAX_WARNINGS {
            self.warnings.push(format!("t={t:.6}: {}", event.describe()));
        }
    }

    #[must_use]
    pub fn degenerate_event_count(&self) -> usize {
        self.zero_tangent_count + self.parallel_frame_count + self.held_lateral_count
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// `true` when no fallback was taken and nothing was flagged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.degenerate_event_count() == 0 && !self.zero_length_curve && self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Short one-line summary for logs: `"V:{vertices} T:{triangles} G:{groups} [issues...]"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "V:{} T:{} G:{}",
            self.vertex_count, self.triangle_count, self.group_count
        )];
        if self.zero_tangent_count > 0 {
            parts.push(format!("zero-tangent:{}", self.zero_tangent_count));
        }
        if self.parallel_frame_count > 0 {
            parts.push(format!("parallel-up:{}", self.parallel_frame_count));
        }
        if self.held_lateral_count > 0 {
            parts.push(format!("held-lateral:{}", self.held_lateral_count));
        }
        if self.zero_length_curve {
            parts.push("zero-length".to_string());
        }
        parts.join(" ")
    }
}

impl fmt::Display for RoadMeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Road Mesh Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(f, "  Groups: {}", self.group_count)?;
        writeln!(f, "  Curve length: {:.6}", self.curve_length)?;

        if self.degenerate_event_count() > 0 {
            writeln!(f, "  Fallbacks:")?;
            if self.zero_tangent_count > 0 {
                writeln!(f, "    - Zero tangents: {}", self.zero_tangent_count)?;
            }
            if self.parallel_frame_count > 0 {
                writeln!(f, "    - Parallel to up: {}", self.parallel_frame_count)?;
            }
            if self.held_lateral_count > 0 {
                writeln!(f, "    - Held lateral: {}", self.held_lateral_count)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        let status = if self.is_clean() { "CLEAN" } else { "FALLBACKS USED" };
        writeln!(f, "  Status: {status}")
    }
}
