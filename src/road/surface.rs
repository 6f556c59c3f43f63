use std::sync::Arc;

use crate::geom::{
    CatmullRomCurve3, CrossSectionProfile, CurveError, MeshCache, MeshCacheKey, MeshCacheStats,
    Point3, ProfileError, RibbonError, RibbonOptions, RoadMesh, RoadMeshDiagnostics, SharedMesh,
    Vec3, build_ribbon_mesh, validate_ribbon_inputs,
};

use super::pose::Pose;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoadError {
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Ribbon(#[from] RibbonError),
}

/// A road: centre line, cross-section and sampling resolution.
///
/// The mesh is built lazily by [`mesh`](Self::mesh) and reused until one of
/// the inputs changes through a setter. Setters take `&mut self`, so a
/// rebuild can never race a read of the same surface.
#[derive(Debug)]
pub struct RoadSurface {
    curve: CatmullRomCurve3,
    profile: CrossSectionProfile,
    segments: usize,
    reference_up: Vec3,
    revision: u64,
    cache: MeshCache,
}

impl RoadSurface {
    pub fn new(
        curve: CatmullRomCurve3,
        profile: CrossSectionProfile,
        segments: usize,
    ) -> Result<Self, RoadError> {
        let surface = Self {
            curve,
            profile,
            segments,
            reference_up: Vec3::Y,
            revision: 0,
            cache: MeshCache::new(),
        };
        validate_ribbon_inputs(&surface.profile, &surface.options())?;
        Ok(surface)
    }

    /// Centripetal curve through `points` with the given lateral `offsets`.
    pub fn from_points(
        points: Vec<Point3>,
        offsets: Vec<f64>,
        segments: usize,
    ) -> Result<Self, RoadError> {
        let curve = CatmullRomCurve3::centripetal(points)?;
        let profile = CrossSectionProfile::new(offsets)?;
        Self::new(curve, profile, segments)
    }

    #[must_use]
    pub fn curve(&self) -> &CatmullRomCurve3 {
        &self.curve
    }

    #[must_use]
    pub fn profile(&self) -> &CrossSectionProfile {
        &self.profile
    }

    #[must_use]
    pub const fn segments(&self) -> usize {
        self.segments
    }

    #[must_use]
    pub fn tracks(&self) -> usize {
        self.profile.tracks()
    }

    #[must_use]
    pub const fn reference_up(&self) -> Vec3 {
        self.reference_up
    }

    /// Bumped on every input change.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn options(&self) -> RibbonOptions {
        RibbonOptions {
            segments: self.segments,
            tracks: self.profile.tracks(),
            reference_up: self.reference_up,
        }
    }

    /// The ribbon mesh, built on first use and cached afterwards.
    pub fn mesh(&mut self) -> Result<Arc<RoadMesh>, RoadError> {
        self.mesh_with_diagnostics().map(|(mesh, _)| mesh)
    }

    pub fn diagnostics(&mut self) -> Result<Arc<RoadMeshDiagnostics>, RoadError> {
        self.mesh_with_diagnostics().map(|(_, diagnostics)| diagnostics)
    }

    pub fn mesh_with_diagnostics(&mut self) -> Result<SharedMesh, RoadError> {
        let key = self.cache_key();
        let options = self.options();
        let shared = self.cache.get_or_try_insert_with(key, || {
            log::debug!(
                "building road mesh: revision={} segments={} tracks={}",
                key.revision,
                key.segments,
                key.tracks
            );
            build_ribbon_mesh(&self.curve, &self.profile, options)
        })?;
        Ok(shared)
    }

    /// The cached mesh if it is current, without building.
    #[must_use]
    pub fn cached_mesh(&self) -> Option<Arc<RoadMesh>> {
        self.cache.peek(self.cache_key()).map(|(mesh, _)| mesh)
    }

    #[must_use]
    pub fn cache_stats(&self) -> MeshCacheStats {
        self.cache.stats()
    }

    pub fn set_segments(&mut self, segments: usize) -> Result<(), RoadError> {
        if segments == self.segments {
            return Ok(());
        }
        validate_ribbon_inputs(&self.profile, &RibbonOptions { segments, ..self.options() })?;
        self.segments = segments;
        self.touch();
        Ok(())
    }

    /// Replaces the cross-section. The track count follows the new profile.
    pub fn set_profile(&mut self, profile: CrossSectionProfile) -> Result<(), RoadError> {
        if profile == self.profile {
            return Ok(());
        }
        let options = RibbonOptions {
            tracks: profile.tracks(),
            ..self.options()
        };
        validate_ribbon_inputs(&profile, &options)?;
        self.profile = profile;
        self.touch();
        Ok(())
    }

    pub fn set_curve(&mut self, curve: CatmullRomCurve3) {
        if curve == self.curve {
            return;
        }
        self.curve = curve;
        self.touch();
    }

    pub fn set_reference_up(&mut self, reference_up: Vec3) -> Result<(), RoadError> {
        if reference_up == self.reference_up {
            return Ok(());
        }
        validate_ribbon_inputs(&self.profile, &RibbonOptions { reference_up, ..self.options() })?;
        self.reference_up = reference_up;
        self.touch();
        Ok(())
    }

    /// Pose at raw curve parameter `t`.
    #[must_use]
    pub fn pose_at(&self, t: f64) -> Pose {
        Pose::from_sample(self.curve.sample_at(t), self.reference_up)
    }

    /// Pose after travelling fraction `u` of the road length.
    #[must_use]
    pub fn pose_at_arc(&self, u: f64) -> Pose {
        self.pose_at(self.curve.parameter_at_arc_fraction(u))
    }

    fn cache_key(&self) -> MeshCacheKey {
        MeshCacheKey {
            revision: self.revision,
            segments: self.segments,
            tracks: self.profile.tracks(),
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        self.cache.invalidate();
        log::debug!("road surface changed, revision {}", self.revision);
    }
}
