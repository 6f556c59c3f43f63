//! Memoisation of built road meshes.
//!
//! A road surface rebuilds its mesh only when one of its inputs changes. The
//! cache holds the most recent result behind an [`Arc`] so repeated requests
//! hand out the same buffers without cloning, and it keeps hit/miss counters
//! for diagnostics.
//!
//! ```ignore
//! let mut cache = MeshCache::new();
//! let key = MeshCacheKey { revision: 0, segments: 1000, tracks: 3 };
//! let (mesh, _diag) = cache.get_or_try_insert_with(key, || build_ribbon_mesh(&curve, &profile, options))?;
//! ```

use std::sync::Arc;

use super::diagnostics::RoadMeshDiagnostics;
use super::mesh::RoadMesh;

/// Identity of a mesh build.
///
/// `revision` changes whenever the curve, profile or reference up direction
/// changes; `segments` and `tracks` are kept alongside for readability in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshCacheKey {
    pub revision: u64,
    pub segments: usize,
    pub tracks: usize,
}

/// Shared handles to a cached build.
pub type SharedMesh = (Arc<RoadMesh>, Arc<RoadMeshDiagnostics>);

#[derive(Debug, Clone)]
struct CachedMesh {
    key: MeshCacheKey,
    mesh: Arc<RoadMesh>,
    diagnostics: Arc<RoadMeshDiagnostics>,
}

/// Single-entry mesh cache.
#[derive(Debug, Default)]
pub struct MeshCache {
    entry: Option<CachedMesh>,
    hits: usize,
    misses: usize,
    invalidations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshCacheStats {
    /// 1 when a mesh is cached, 0 otherwise.
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    pub invalidations: usize,
    /// Estimated memory held by the cached buffers in bytes.
    pub estimated_memory_bytes: usize,
}

impl MeshCacheStats {
    /// Hit rate in `[0, 1]`, or 0 before the first access.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl MeshCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stats(&self) -> MeshCacheStats {
        MeshCacheStats {
            entries: usize::from(self.entry.is_some()),
            hits: self.hits,
            misses: self.misses,
            invalidations: self.invalidations,
            estimated_memory_bytes: self.estimate_memory_usage(),
        }
    }

    /// Returns the cached build for `key` without computing anything.
    #[must_use]
    pub fn peek(&self, key: MeshCacheKey) -> Option<SharedMesh> {
        self.entry
            .as_ref()
            .filter(|cached| cached.key == key)
            .map(|cached| (Arc::clone(&cached.mesh), Arc::clone(&cached.diagnostics)))
    }

    /// Returns the cached build for `key`, or runs `build` and caches its result.
    ///
    /// A failed build leaves the cache empty so a stale mesh is never served
    /// for the new key.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: MeshCacheKey,
        build: impl FnOnce() -> Result<(RoadMesh, RoadMeshDiagnostics), E>,
    ) -> Result<SharedMesh, E> {
        if let Some(shared) = self.peek(key) {
            self.hits += 1;
            return Ok(shared);
        }

        self.misses += 1;
        self.entry = None;
        let (mesh, diagnostics) = build()?;
        let cached = CachedMesh {
            key,
            mesh: Arc::new(mesh),
            diagnostics: Arc::new(diagnostics),
        };
        let shared = (Arc::clone(&cached.mesh), Arc::clone(&cached.diagnostics));
        self.entry = Some(cached);
        Ok(shared)
    }

    /// Drops the cached build. Outstanding `Arc` handles stay valid.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            self.invalidations += 1;
        }
    }

    #[must_use]
    pub fn estimate_memory_usage(&self) -> usize {
        self.entry
            .as_ref()
            .map_or(0, |cached| cached.mesh.estimated_memory_bytes())
    }
}
