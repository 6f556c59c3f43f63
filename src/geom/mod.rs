mod cache;
mod core;
mod curve;
mod diagnostics;
mod frame;
mod mesh;
mod metrics;
mod profile;
mod ribbon;

pub use cache::{MeshCache, MeshCacheKey, MeshCacheStats, SharedMesh};
pub use core::{BBox, Point3, Tolerance, Transform, Vec3};
pub use curve::{
    CatmullRomCurve3, Curve3, CurveError, CurveSample, CurveType, LengthTable,
    ProceduralCurveOptions, TangentSample,
    DEFAULT_ARC_LENGTH_DIVISIONS, DEFAULT_TENSION, MIN_CONTROL_POINTS,
    procedural_control_points, sample_lengths,
};
pub use diagnostics::{DegenerateEvent, RoadMeshDiagnostics};
pub use frame::{FrameComputer, FrameFallbacks, RoadFrame, alternate_reference, compute_frame};
pub use mesh::{MaterialGroup, RoadMesh};
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use profile::{CrossSectionProfile, DEFAULT_OFFSETS, ProfileError};
pub use ribbon::{
    DEFAULT_SEGMENTS, RibbonError, RibbonOptions,
    build_ribbon_mesh, build_ribbon_mesh_with_metrics, grid_index, ribbon_indices,
    ribbon_vertex_count, validate_ribbon_inputs,
};

#[cfg(test)]
mod tests;
