//! Ribbon meshes swept along a road centre line.
//!
//! The curve is sampled at `segments + 1` uniform parameter steps. At each
//! step a [`RoadFrame`](super::frame::RoadFrame) is built and one vertex is
//! emitted per profile offset, so the vertex grid has `segments + 1` rows of
//! `tracks + 1` vertices. Vertex `(j, i)` lives at index `j * (tracks + 1) + i`.
//!
//! Each quad between rows `j` and `j + 1` and columns `i` and `i + 1` is split
//! into two triangles and gets its own material group with slot `i`.

use super::core::Vec3;
use super::curve::{CatmullRomCurve3, Curve3};
use super::diagnostics::{DegenerateEvent, RoadMeshDiagnostics};
use super::frame::FrameComputer;
use super::mesh::{MaterialGroup, RoadMesh};
use super::metrics::{GeomMetrics, TimingBucket};
use super::profile::CrossSectionProfile;

/// Default number of curve steps.
pub const DEFAULT_SEGMENTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonOptions {
    pub segments: usize,
    pub tracks: usize,
    pub reference_up: Vec3,
}

impl Default for RibbonOptions {
    fn default() -> Self {
        Self {
            segments: DEFAULT_SEGMENTS,
            tracks: 3,
            reference_up: Vec3::Y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RibbonError {
    #[error("ribbon requires at least one segment")]
    ZeroSegments,
    #[error("ribbon requires at least one track")]
    ZeroTracks,
    #[error("profile has {offsets} offsets but {tracks} tracks need {}", .tracks + 1)]
    ProfileMismatch { tracks: usize, offsets: usize },
    #[error("ribbon with {vertices} vertices exceeds the 32-bit index range")]
    TooManyVertices { vertices: usize },
    #[error("reference up direction must be finite and non-zero")]
    InvalidReferenceUp,
}

/// Checks options against a profile before any sampling happens.
pub fn validate_ribbon_inputs(
    profile: &CrossSectionProfile,
    options: &RibbonOptions,
) -> Result<(), RibbonError> {
    if options.segments == 0 {
        return Err(RibbonError::ZeroSegments);
    }
    if options.tracks == 0 {
        return Err(RibbonError::ZeroTracks);
    }
    if profile.offsets().len() != options.tracks + 1 {
        return Err(RibbonError::ProfileMismatch {
            tracks: options.tracks,
            offsets: profile.offsets().len(),
        });
    }
    if options.reference_up.normalized().is_none() {
        return Err(RibbonError::InvalidReferenceUp);
    }
    ribbon_vertex_count(options.segments, options.tracks).map(|_| ())
}

/// `(segments + 1) * (tracks + 1)`, checked against the `u32` index range.
pub fn ribbon_vertex_count(segments: usize, tracks: usize) -> Result<usize, RibbonError> {
    let vertices = segments
        .checked_add(1)
        .zip(tracks.checked_add(1))
        .and_then(|(rows, cols)| rows.checked_mul(cols))
        .ok_or(RibbonError::TooManyVertices { vertices: usize::MAX })?;
    // Group offsets are u32 as well, so the index buffer has to fit too.
    let fits = u32::try_from(vertices).is_ok()
        && segments
            .checked_mul(tracks)
            .and_then(|quads| quads.checked_mul(6))
            .is_some_and(|indices| u32::try_from(indices).is_ok());
    if fits {
        Ok(vertices)
    } else {
        Err(RibbonError::TooManyVertices { vertices })
    }
}

/// Index of vertex `(j, i)` in the ribbon grid.
#[inline]
#[must_use]
pub const fn grid_index(tracks: usize, j: usize, i: usize) -> usize {
    j * (tracks + 1) + i
}

/// Triangle indices and one material group per quad.
///
/// For quad `(j, i)` with `a = (j, i)`, `b1 = (j+1, i)`, `c1 = b2 = (j+1, i+1)`
/// and `c2 = (j, i+1)` the triangles are `(a, c1, b1)` and `(a, c2, b2)`.
///
/// Callers must have checked the sizes with [`ribbon_vertex_count`].
#[must_use]
pub fn ribbon_indices(segments: usize, tracks: usize) -> (Vec<u32>, Vec<MaterialGroup>) {
    let quads = segments * tracks;
    let mut indices = Vec::with_capacity(quads * 6);
    let mut groups = Vec::with_capacity(quads);

    for j in 0..segments {
        for i in 0..tracks {
            let a = grid_index(tracks, j, i) as u32;
            let b1 = grid_index(tracks, j + 1, i) as u32;
            let c1 = grid_index(tracks, j + 1, i + 1) as u32;
            let b2 = c1;
            let c2 = grid_index(tracks, j, i + 1) as u32;

            groups.push(MaterialGroup {
                start: indices.len() as u32,
                count: 6,
                material_slot: i as u32,
            });
            indices.extend_from_slice(&[a, c1, b1, a, c2, b2]);
        }
    }

    (indices, groups)
}

/// Builds the ribbon mesh for `curve` and `profile`.
pub fn build_ribbon_mesh(
    curve: &CatmullRomCurve3,
    profile: &CrossSectionProfile,
    options: RibbonOptions,
) -> Result<(RoadMesh, RoadMeshDiagnostics), RibbonError> {
    let mut metrics = GeomMetrics::default();
    build_ribbon_mesh_with_metrics(curve, profile, options, &mut metrics)
}

pub fn build_ribbon_mesh_with_metrics(
    curve: &CatmullRomCurve3,
    profile: &CrossSectionProfile,
    options: RibbonOptions,
    metrics: &mut GeomMetrics,
) -> Result<(RoadMesh, RoadMeshDiagnostics), RibbonError> {
    validate_ribbon_inputs(profile, &options)?;
    let RibbonOptions { segments, tracks, reference_up } = options;
    let vertex_count = ribbon_vertex_count(segments, tracks)?;

    metrics.begin();
    let mut diagnostics = RoadMeshDiagnostics::new();

    let lengths = metrics.time(TimingBucket::CurveSampling, || curve.sample_lengths(segments));
    let total_length = curve.length();
    diagnostics.curve_length = total_length;

    let uv_length = if total_length > 0.0 && total_length.is_finite() {
        Some(total_length)
    } else {
        diagnostics.zero_length_curve = true;
        diagnostics.add_warning("curve has zero length, uv.x collapsed to 0");
        log::warn!("ribbon curve has zero length; all uv.x set to 0");
        None
    };

    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);

    metrics.time(TimingBucket::VertexGrid, || {
        let mut frames = FrameComputer::new(reference_up);
        let mut previous_tangent = None;

        for j in 0..=segments {
            let t = j as f64 / segments as f64;

            let sample = curve.tangent_sample(t, previous_tangent);
            if sample.degenerate {
                diagnostics.record(DegenerateEvent::ZeroTangent, t);
            } else {
                previous_tangent = Some(sample.tangent);
            }

            let (frame, fallbacks) = frames.next_frame(sample.tangent);
            for event in fallbacks.events() {
                diagnostics.record(event, t);
            }

            let center = curve.point_at(t);
            let u = uv_length.map_or(0.0, |len| lengths.length_at(j) / len);
            for (i, &offset) in profile.offsets().iter().enumerate() {
                positions.push((center + frame.lateral_axis * offset).to_array());
                normals.push(frame.vertical_axis.to_array());
                uvs.push([u, i as f64 / tracks as f64]);
            }
        }
    });

    let (indices, groups) = metrics.time(TimingBucket::Indexing, || ribbon_indices(segments, tracks));

    let mesh = RoadMesh {
        positions,
        normals,
        uvs,
        indices,
        groups,
    };

    diagnostics.vertex_count = mesh.vertex_count();
    diagnostics.triangle_count = mesh.triangle_count();
    diagnostics.group_count = mesh.group_count();
    diagnostics.timing = metrics.end();

    log::debug!(
        "ribbon mesh built: segments={segments} tracks={tracks} {}",
        diagnostics.summary()
    );
    if diagnostics.degenerate_event_count() > 0 {
        log::warn!(
            "ribbon mesh used {} frame fallbacks",
            diagnostics.degenerate_event_count()
        );
    }

    Ok((mesh, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ribbon_indices_single_quad() {
        let (indices, groups) = ribbon_indices(1, 1);
        // a=0, c2=1, b1=2, c1=b2=3
        assert_eq!(indices, vec![0, 3, 2, 0, 1, 3]);
        assert_eq!(groups, vec![MaterialGroup { start: 0, count: 6, material_slot: 0 }]);
    }

    #[test]
    fn test_vertex_count_overflow() {
        assert_eq!(ribbon_vertex_count(4, 2), Ok(15));
        assert!(matches!(
            ribbon_vertex_count(usize::MAX, 1),
            Err(RibbonError::TooManyVertices { .. })
        ));
        assert!(matches!(
            ribbon_vertex_count(1 << 31, 3),
            Err(RibbonError::TooManyVertices { .. })
        ));
    }

    #[test]
    fn test_validate_inputs() {
        let profile = CrossSectionProfile::default();
        let ok = RibbonOptions::default();
        assert!(validate_ribbon_inputs(&profile, &ok).is_ok());

        let zero_segments = RibbonOptions { segments: 0, ..ok };
        assert_eq!(validate_ribbon_inputs(&profile, &zero_segments), Err(RibbonError::ZeroSegments));

        let mismatch = RibbonOptions { tracks: 2, ..ok };
        assert_eq!(
            validate_ribbon_inputs(&profile, &mismatch),
            Err(RibbonError::ProfileMismatch { tracks: 2, offsets: 4 })
        );

        let bad_up = RibbonOptions { reference_up: Vec3::ZERO, ..ok };
        assert_eq!(validate_ribbon_inputs(&profile, &bad_up), Err(RibbonError::InvalidReferenceUp));
    }
}
