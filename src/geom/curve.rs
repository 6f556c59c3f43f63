//! Catmull-Rom curve evaluation for road centre lines.
//!
//! [`CatmullRomCurve3`] interpolates an ordered list of control points with
//! centripetal, chordal or uniform Catmull-Rom segments and answers three kinds
//! of queries:
//!
//! - raw-parameter queries (`point_at`, `tangent_at`) where `t` is spread evenly
//!   over the control-point segments,
//! - arc-length tables (`sample_lengths`, `length`) used for UV mapping,
//! - uniform-speed queries (`point_at_arc`, `tangent_at_arc`) that map a
//!   fraction of the total length back onto a raw parameter.
//!
//! Open curves only: the phantom neighbours at both ends are extrapolated by
//! mirroring the second point through the first (and the second-to-last
//! through the last).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::core::{Point3, Tolerance, Vec3};

/// Minimum number of control points for a curve.
pub const MIN_CONTROL_POINTS: usize = 4;

/// Internal resolution used by [`CatmullRomCurve3::length`].
pub const DEFAULT_ARC_LENGTH_DIVISIONS: usize = 200;

/// Default tension for [`CurveType::Uniform`].
pub const DEFAULT_TENSION: f64 = 0.5;

/// Parameter step used when probing backwards for a usable tangent.
const TANGENT_BACKSTEP: f64 = 1e-3;
const TANGENT_BACKSTEP_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    #[error("curve requires at least {min} control points, got {found}")]
    TooFewControlPoints { min: usize, found: usize },
    #[error("control point {index} is not finite")]
    NonFiniteControlPoint { index: usize },
    #[error("curve tension must be finite, got {0}")]
    NonFiniteTension(f64),
    #[error("arc length divisions must be positive")]
    ZeroArcLengthDivisions,
    #[error("unknown curve type `{0}` (expected centripetal, chordal or uniform)")]
    UnknownCurveType(String),
}

/// Knot parameterisation of the Catmull-Rom segments.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CurveType {
    /// Knot spacing `|p_{k+1} - p_k|^0.5`. Avoids cusps and self-intersections.
    #[default]
    Centripetal,
    /// Knot spacing `|p_{k+1} - p_k|`.
    Chordal,
    /// Equal knot spacing with tangents scaled by `tension`.
    Uniform { tension: f64 },
}

impl CurveType {
    /// Parses the names used in road configuration files.
    pub fn parse(name: &str, tension: Option<f64>) -> Result<Self, CurveError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "centripetal" => Ok(Self::Centripetal),
            "chordal" => Ok(Self::Chordal),
            "uniform" | "catmullrom" => Ok(Self::Uniform {
                tension: tension.unwrap_or(DEFAULT_TENSION),
            }),
            other => Err(CurveError::UnknownCurveType(other.to_string())),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Centripetal => "centripetal",
            Self::Chordal => "chordal",
            Self::Uniform { .. } => "uniform",
        }
    }

    /// Exponent applied to the squared chord length to get the knot spacing.
    const fn knot_exponent(self) -> Option<f64> {
        match self {
            Self::Centripetal => Some(0.25),
            Self::Chordal => Some(0.5),
            Self::Uniform { .. } => None,
        }
    }
}

/// Minimal curve interface shared by the sampling helpers.
pub trait Curve3 {
    /// Position at parameter `t` in `[0, 1]`. Out-of-range values are clamped.
    fn point_at(&self, t: f64) -> Point3;

    /// First derivative with respect to `t`.
    ///
    /// The default is a central difference clamped to the domain.
    #[must_use]
    fn derivative_at(&self, t: f64) -> Vec3 {
        let h = 1e-6;
        let t0 = (t - h).max(0.0);
        let t1 = (t + h).min(1.0);
        if t1 <= t0 {
            return Vec3::ZERO;
        }
        (self.point_at(t1) - self.point_at(t0)) / (t1 - t0)
    }
}

/// Position and unit tangent at a parameter. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub parameter: f64,
    pub position: Point3,
    pub tangent: Vec3,
}

/// Result of a tangent query that may have needed a fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentSample {
    /// Unit tangent (always finite).
    pub tangent: Vec3,
    /// `true` when the raw derivative was zero-length and a substitute was used.
    pub degenerate: bool,
}

/// Cumulative chord lengths at `segments + 1` uniform parameter steps.
///
/// `lengths[0] == 0`, values never decrease, and the last entry approximates the
/// total curve length.
#[derive(Debug, Clone, PartialEq)]
pub struct LengthTable {
    lengths: Vec<f64>,
}

impl LengthTable {
    /// Number of parameter steps (entries minus one).
    #[must_use]
    pub fn segments(&self) -> usize {
        self.lengths.len() - 1
    }

    /// Cumulative length at the last step.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.lengths
    }

    /// Cumulative length at step `j`. Steps beyond the table return the total.
    #[must_use]
    pub fn length_at(&self, j: usize) -> f64 {
        self.lengths.get(j).copied().unwrap_or_else(|| self.total())
    }

    /// Maps a fraction `u` of the total length back to a raw parameter by
    /// binary search and linear interpolation between table entries.
    #[must_use]
    pub fn parameter_at_fraction(&self, u: f64) -> f64 {
        let u = clamp_unit(u);
        let total = self.total();
        let segments = self.segments();
        if segments == 0 || !(total > 0.0) {
            return u;
        }

        let target = u * total;
        let hi = self.lengths.partition_point(|&len| len < target);
        if hi == 0 {
            return 0.0;
        }
        if hi > segments {
            return 1.0;
        }

        let lo = hi - 1;
        let before = self.lengths[lo];
        let span = self.lengths[hi] - before;
        let fraction = if span > 0.0 { (target - before) / span } else { 0.0 };
        (lo as f64 + fraction) / segments as f64
    }
}

/// Sums chord distances between `point_at(j / segments)` for `j = 0..=segments`.
#[must_use]
pub fn sample_lengths<C: Curve3 + ?Sized>(curve: &C, segments: usize) -> LengthTable {
    let segments = segments.max(1);
    let mut lengths = Vec::with_capacity(segments + 1);
    lengths.push(0.0);

    let mut total = 0.0;
    let mut prev = curve.point_at(0.0);
    for j in 1..=segments {
        let curr = curve.point_at(j as f64 / segments as f64);
        total += curr.distance_to(prev);
        lengths.push(total);
        prev = curr;
    }

    LengthTable { lengths }
}

/// Cubic `c0 + c1 s + c2 s^2 + c3 s^3` for one curve segment.
#[derive(Debug, Clone, Copy)]
struct SegmentCubic {
    c0: Vec3,
    c1: Vec3,
    c2: Vec3,
    c3: Vec3,
}

impl SegmentCubic {
    /// Hermite form between `x0` and `x1` with end tangents `t0` and `t1`.
    fn hermite(x0: Vec3, x1: Vec3, t0: Vec3, t1: Vec3) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: x0 * -3.0 + x1 * 3.0 - t0 * 2.0 - t1,
            c3: x0 * 2.0 - x1 * 2.0 + t0 + t1,
        }
    }

    fn non_uniform(x: [Vec3; 4], dt0: f64, dt1: f64, dt2: f64) -> Self {
        let [x0, x1, x2, x3] = x;
        let t1 = (x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1;
        let t2 = (x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2;
        Self::hermite(x1, x2, t1 * dt1, t2 * dt1)
    }

    fn eval(&self, s: f64) -> Vec3 {
        self.c0 + self.c1 * s + self.c2 * (s * s) + self.c3 * (s * s * s)
    }

    fn derivative(&self, s: f64) -> Vec3 {
        self.c1 + self.c2 * (2.0 * s) + self.c3 * (3.0 * s * s)
    }
}

/// Options for the procedural sine-walk curve.
///
/// Starting at `origin`, each step advances
/// `x += sin(30 f) * 20 + 20`, `y += sin(50 f) * 2`, `z += sin(30 f + 10) * 10 + 10`
/// and then `f += frequency_step`. With a `seed`, the starting frequency is
/// offset by a uniform draw in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProceduralCurveOptions {
    pub origin: Point3,
    pub count: usize,
    pub frequency: f64,
    pub frequency_step: f64,
    pub seed: Option<u64>,
    pub curve_type: CurveType,
}

impl Default for ProceduralCurveOptions {
    fn default() -> Self {
        Self {
            origin: Point3::new(0.0, 0.0, -30.0),
            count: 10,
            frequency: 0.0,
            frequency_step: 0.1,
            seed: None,
            curve_type: CurveType::Centripetal,
        }
    }
}

/// Generates the control points of the procedural sine walk.
#[must_use]
pub fn procedural_control_points(options: &ProceduralCurveOptions) -> Vec<Point3> {
    let mut frequency = options.frequency;
    if let Some(seed) = options.seed {
        let mut rng = StdRng::seed_from_u64(seed);
        frequency += rng.random::<f64>();
    }

    let Point3 { mut x, mut y, mut z } = options.origin;
    let mut points = Vec::with_capacity(options.count);
    for _ in 0..options.count {
        x += (frequency * 30.0).sin() * 20.0 + 20.0;
        y += (frequency * 50.0).sin() * 2.0;
        z += (frequency * 30.0 + 10.0).sin() * 10.0 + 10.0;
        points.push(Point3::new(x, y, z));
        frequency += options.frequency_step;
    }
    points
}

/// Open Catmull-Rom spline through an immutable list of control points.
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRomCurve3 {
    points: Vec<Point3>,
    curve_type: CurveType,
    arc_lengths: LengthTable,
}

impl CatmullRomCurve3 {
    /// Builds a curve through explicit control points.
    pub fn new(points: Vec<Point3>, curve_type: CurveType) -> Result<Self, CurveError> {
        if points.len() < MIN_CONTROL_POINTS {
            return Err(CurveError::TooFewControlPoints {
                min: MIN_CONTROL_POINTS,
                found: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(CurveError::NonFiniteControlPoint { index });
        }
        if let CurveType::Uniform { tension } = curve_type {
            if !tension.is_finite() {
                return Err(CurveError::NonFiniteTension(tension));
            }
        }

        let mut curve = Self {
            points,
            curve_type,
            arc_lengths: LengthTable { lengths: vec![0.0] },
        };
        curve.arc_lengths = sample_lengths(&curve, DEFAULT_ARC_LENGTH_DIVISIONS);
        Ok(curve)
    }

    /// Centripetal curve through explicit control points.
    pub fn centripetal(points: Vec<Point3>) -> Result<Self, CurveError> {
        Self::new(points, CurveType::Centripetal)
    }

    /// Builds a curve through the procedural sine walk.
    pub fn procedural(options: &ProceduralCurveOptions) -> Result<Self, CurveError> {
        Self::new(procedural_control_points(options), options.curve_type)
    }

    /// Rebuilds the internal arc-length table at a different resolution.
    pub fn with_arc_length_divisions(mut self, divisions: usize) -> Result<Self, CurveError> {
        if divisions == 0 {
            return Err(CurveError::ZeroArcLengthDivisions);
        }
        self.arc_lengths = sample_lengths(&self, divisions);
        Ok(self)
    }

    #[must_use]
    pub fn control_points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub const fn curve_type(&self) -> CurveType {
        self.curve_type
    }

    #[must_use]
    pub fn arc_length_divisions(&self) -> usize {
        self.arc_lengths.segments()
    }

    /// Cumulative lengths at `segments + 1` uniform parameter steps.
    #[must_use]
    pub fn sample_lengths(&self, segments: usize) -> LengthTable {
        sample_lengths(self, segments)
    }

    /// Total length at the curve's internal resolution.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.arc_lengths.total()
    }

    /// The precomputed table behind [`length`](Self::length).
    #[must_use]
    pub fn arc_length_table(&self) -> &LengthTable {
        &self.arc_lengths
    }

    /// Unit tangent at `t`. Zero-length derivatives are replaced as described
    /// on [`tangent_sample`](Self::tangent_sample), with no previous tangent.
    #[must_use]
    pub fn tangent_at(&self, t: f64) -> Vec3 {
        self.tangent_sample(t, None).tangent
    }

    /// Unit tangent at `t` with explicit fallback bookkeeping.
    ///
    /// When the derivative is zero-length (coincident control points) the
    /// substitute is, in order: `previous` if given, the tangent at the nearest
    /// earlier parameter within a few small steps, the chord towards the next
    /// distinct control point, the chord from the previous distinct control
    /// point, and finally `+X`.
    #[must_use]
    pub fn tangent_sample(&self, t: f64, previous: Option<Vec3>) -> TangentSample {
        let t = clamp_unit(t);
        if let Some(tangent) = self.unit_derivative(t) {
            return TangentSample { tangent, degenerate: false };
        }

        let tangent = previous
            .and_then(Vec3::normalized)
            .or_else(|| self.step_back_tangent(t))
            .or_else(|| self.chord_fallback(t))
            .unwrap_or(Vec3::X);
        TangentSample { tangent, degenerate: true }
    }

    #[must_use]
    pub fn sample_at(&self, t: f64) -> CurveSample {
        let parameter = clamp_unit(t);
        CurveSample {
            parameter,
            position: self.point_at(parameter),
            tangent: self.tangent_at(parameter),
        }
    }

    /// Raw parameter reached after travelling fraction `u` of the total length.
    #[must_use]
    pub fn parameter_at_arc_fraction(&self, u: f64) -> f64 {
        self.arc_lengths.parameter_at_fraction(u)
    }

    /// Position at fraction `u` of the total length (uniform speed).
    #[must_use]
    pub fn point_at_arc(&self, u: f64) -> Point3 {
        self.point_at(self.parameter_at_arc_fraction(u))
    }

    /// Unit tangent at fraction `u` of the total length (uniform speed).
    #[must_use]
    pub fn tangent_at_arc(&self, u: f64) -> Vec3 {
        self.tangent_at(self.parameter_at_arc_fraction(u))
    }

    fn unit_derivative(&self, t: f64) -> Option<Vec3> {
        self.derivative_at(t)
            .normalized_above(Tolerance::ZERO_LENGTH.eps)
    }

    fn step_back_tangent(&self, t: f64) -> Option<Vec3> {
        (1..=TANGENT_BACKSTEP_COUNT)
            .map(|step| t - step as f64 * TANGENT_BACKSTEP)
            .take_while(|s| *s >= 0.0)
            .find_map(|s| self.unit_derivative(s))
    }

    fn chord_fallback(&self, t: f64) -> Option<Vec3> {
        let here = self.point_at(t);
        let (segment, _) = self.locate(t);
        let min_len = Tolerance::DEFAULT.eps;

        let ahead = self.points[segment + 1..]
            .iter()
            .find_map(|p| (*p - here).normalized_above(min_len));
        ahead.or_else(|| {
            self.points[..=segment]
                .iter()
                .rev()
                .find_map(|p| (here - *p).normalized_above(min_len))
        })
    }

    /// Segment index and local weight for parameter `t`.
    fn locate(&self, t: f64) -> (usize, f64) {
        let last_segment = self.points.len() - 2;
        let scaled = (self.points.len() - 1) as f64 * clamp_unit(t);
        let index = scaled.floor() as usize;
        if index > last_segment {
            (last_segment, 1.0)
        } else {
            (index, scaled - index as f64)
        }
    }

    fn segment_cubic(&self, segment: usize) -> SegmentCubic {
        let n = self.points.len();
        let p1 = self.points[segment];
        let p2 = self.points[segment + 1];
        let p0 = if segment > 0 {
            self.points[segment - 1]
        } else {
            p1.mirror_away_from(p2)
        };
        let p3 = if segment + 2 < n {
            self.points[segment + 2]
        } else {
            p2.mirror_away_from(p1)
        };

        let x = [p0.to_vec3(), p1.to_vec3(), p2.to_vec3(), p3.to_vec3()];
        match self.curve_type.knot_exponent() {
            Some(exponent) => {
                let mut dt0 = p0.distance_squared_to(p1).powf(exponent);
                let mut dt1 = p1.distance_squared_to(p2).powf(exponent);
                let mut dt2 = p2.distance_squared_to(p3).powf(exponent);

                let min_knot = Tolerance::KNOT.eps;
                if dt1 < min_knot {
                    dt1 = 1.0;
                }
                if dt0 < min_knot {
                    dt0 = dt1;
                }
                if dt2 < min_knot {
                    dt2 = dt1;
                }
                SegmentCubic::non_uniform(x, dt0, dt1, dt2)
            }
            None => {
                let tension = match self.curve_type {
                    CurveType::Uniform { tension } => tension,
                    _ => DEFAULT_TENSION,
                };
                SegmentCubic::hermite(x[1], x[2], (x[2] - x[0]) * tension, (x[3] - x[1]) * tension)
            }
        }
    }
}

impl Curve3 for CatmullRomCurve3 {
    fn point_at(&self, t: f64) -> Point3 {
        let (segment, weight) = self.locate(t);
        let v = self.segment_cubic(segment).eval(weight);
        Point3::new(v.x, v.y, v.z)
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let (segment, weight) = self.locate(t);
        let scale = (self.points.len() - 1) as f64;
        self.segment_cubic(segment).derivative(weight) * scale
    }
}

/// Clamps to `[0, 1]`, mapping NaN to 0.
fn clamp_unit(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_type_parse() {
        assert_eq!(CurveType::parse("Centripetal", None).unwrap(), CurveType::Centripetal);
        assert_eq!(
            CurveType::parse("catmullrom", Some(0.25)).unwrap(),
            CurveType::Uniform { tension: 0.25 }
        );
        assert!(matches!(
            CurveType::parse("bezier", None),
            Err(CurveError::UnknownCurveType(_))
        ));
    }

    #[test]
    fn test_hermite_endpoints() {
        let cubic = SegmentCubic::hermite(Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z);
        assert_eq!(cubic.eval(0.0), Vec3::ZERO);
        assert!(Tolerance::DEFAULT.approx_eq_vec3(cubic.eval(1.0), Vec3::X));
        assert_eq!(cubic.derivative(0.0), Vec3::Y);
        assert!(Tolerance::DEFAULT.approx_eq_vec3(cubic.derivative(1.0), Vec3::Z));
    }

    #[test]
    fn test_length_table_fraction_lookup() {
        let table = LengthTable { lengths: vec![0.0, 1.0, 3.0, 4.0] };
        assert_eq!(table.segments(), 3);
        assert_eq!(table.parameter_at_fraction(0.0), 0.0);
        assert_eq!(table.parameter_at_fraction(1.0), 1.0);
        // Half the length (2.0) sits halfway through the second step.
        assert!((table.parameter_at_fraction(0.5) - 0.5).abs() < 1e-12);
        assert!((table.parameter_at_fraction(0.25) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_procedural_points_are_deterministic() {
        let options = ProceduralCurveOptions::default();
        let a = procedural_control_points(&options);
        let b = procedural_control_points(&options);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        // f = 0 on the first step: x += 20, y += 0, z += sin(10) * 10 + 10.
        assert!((a[0].x - 20.0).abs() < 1e-12);
        assert!(a[0].y.abs() < 1e-12);
        assert!((a[0].z - (-30.0 + 10.0_f64.sin() * 10.0 + 10.0)).abs() < 1e-12);

        let seeded = ProceduralCurveOptions { seed: Some(7), ..options };
        assert_eq!(procedural_control_points(&seeded), procedural_control_points(&seeded));
        assert_ne!(procedural_control_points(&seeded), a);
    }
}
