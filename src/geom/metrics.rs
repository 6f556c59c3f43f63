//! Opt-in timing hooks for road mesh generation.
//!
//! Timing is only collected when the `road_metrics` feature is enabled and the
//! target is not `wasm32` (where `std::time::Instant` is unavailable). In every
//! other build the calls compile down to plain closure invocations.
//!
//! ```ignore
//! use road_engine::geom::{GeomMetrics, TimingBucket};
//!
//! let mut metrics = GeomMetrics::default();
//! metrics.begin();
//! let table = metrics.time(TimingBucket::CurveSampling, || curve.sample_lengths(1000));
//! if let Some(report) = metrics.end() {
//!     println!("sampling: {} ns", report.curve_sampling_ns);
//! }
//! ```

/// Phases of ribbon mesh generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Arc-length table sampling along the centre line.
    CurveSampling,
    /// Per-sample frame construction and vertex emission.
    VertexGrid,
    /// Triangle index and material group generation.
    Indexing,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeomTimingReport {
    pub curve_sampling_ns: u64,
    pub vertex_grid_ns: u64,
    pub indexing_ns: u64,
}

impl GeomTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.curve_sampling_ns
            .saturating_add(self.vertex_grid_ns)
            .saturating_add(self.indexing_ns)
    }

    /// Total time in milliseconds, for display.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for timing mesh generation phases.
///
/// Call [`begin`](Self::begin) to reset, wrap work in [`time`](Self::time) and
/// read the report with [`end`](Self::end). Without the `road_metrics` feature
/// (or on wasm) every method is a no-op and `end` returns `None`.
#[derive(Debug, Default)]
pub struct GeomMetrics {
    #[cfg(all(feature = "road_metrics", not(target_arch = "wasm32")))]
    report: GeomTimingReport,
}

impl GeomMetrics {
    pub fn begin(&mut self) {
        #[cfg(all(feature = "road_metrics", not(target_arch = "wasm32")))]
        {
            self.report = GeomTimingReport::default();
        }
    }

    #[must_use]
    pub fn end(&self) -> Option<GeomTimingReport> {
        #[cfg(all(feature = "road_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "road_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f` and adds its elapsed time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "road_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "road_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "road_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::CurveSampling => &mut self.report.curve_sampling_ns,
            TimingBucket::VertexGrid => &mut self.report.vertex_grid_ns,
            TimingBucket::Indexing => &mut self.report.indexing_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}
