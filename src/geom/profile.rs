//! Cross-section profiles.
//!
//! A profile is an ordered list of signed lateral offsets (negative values lie
//! on the `-lateral` side). `n` offsets describe `n - 1` tracks; track `i`
//! spans `offsets[i]..offsets[i + 1]` and is rendered with material slot `i`.
//!
//! The default profile is a road of width 1 with thin kerbs on both sides:
//! `[-0.52, -0.5, 0.5, 0.52]` (kerb, carriageway, kerb).

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("profile requires at least 2 offsets, got {found}")]
    TooFewOffsets { found: usize },
    #[error("profile offset {index} is not finite")]
    NonFiniteOffset { index: usize },
    #[error("profile has {found} offsets but {tracks} tracks need {}", .tracks + 1)]
    TrackCountMismatch { tracks: usize, found: usize },
    #[error("uniform profile requires a positive track count and a finite width")]
    InvalidUniform,
}

/// Offsets of the default kerb/carriageway/kerb profile.
pub const DEFAULT_OFFSETS: [f64; 4] = [-0.52, -0.5, 0.5, 0.52];

#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionProfile {
    offsets: Vec<f64>,
}

impl CrossSectionProfile {
    pub fn new(offsets: Vec<f64>) -> Result<Self, ProfileError> {
        if offsets.len() < 2 {
            return Err(ProfileError::TooFewOffsets { found: offsets.len() });
        }
        if let Some(index) = offsets.iter().position(|d| !d.is_finite()) {
            return Err(ProfileError::NonFiniteOffset { index });
        }
        Ok(Self { offsets })
    }

    /// Like [`new`](Self::new) but also checks `offsets.len() == tracks + 1`.
    pub fn with_tracks(tracks: usize, offsets: Vec<f64>) -> Result<Self, ProfileError> {
        if offsets.len() != tracks + 1 {
            return Err(ProfileError::TrackCountMismatch {
                tracks,
                found: offsets.len(),
            });
        }
        Self::new(offsets)
    }

    /// `tracks` equal-width lanes centred on the curve.
    pub fn uniform(tracks: usize, width: f64) -> Result<Self, ProfileError> {
        if tracks == 0 || !width.is_finite() {
            return Err(ProfileError::InvalidUniform);
        }
        let step = width / tracks as f64;
        let half = width * 0.5;
        Self::new((0..=tracks).map(|i| i as f64 * step - half).collect())
    }

    #[must_use]
    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    #[must_use]
    pub fn tracks(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Distance between the outermost offsets.
    #[must_use]
    pub fn width(&self) -> f64 {
        let (min, max) = self
            .offsets
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &d| (lo.min(d), hi.max(d)));
        max - min
    }
}

impl Default for CrossSectionProfile {
    fn default() -> Self {
        Self {
            offsets: DEFAULT_OFFSETS.to_vec(),
        }
    }
}
