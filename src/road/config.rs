//! XML configuration for a road scene.
//!
//! ```xml
//! <road segments="1000" loop-ms="20000" arc-divisions="200">
//!   <curve type="centripetal">
//!     <point x="-25" y="0" z="-25"/>
//!     <point x="-4" y="2" z="-9"/>
//!     <!-- ... at least four points -->
//!   </curve>
//!   <profile>
//!     <offset>-0.52</offset>
//!     <offset>-0.5</offset>
//!     <offset>0.5</offset>
//!     <offset>0.52</offset>
//!   </profile>
//!   <camera look-ahead="0.005" eye-lift="0.3" target-lift="0.03"/>
//! </road>
//! ```
//!
//! `<curve>` may be replaced by a procedural sine walk:
//!
//! ```xml
//! <procedural count="10" frequency="0" step="0.1" seed="7">
//!   <origin x="0" y="0" z="-30"/>
//! </procedural>
//! ```
//!
//! Every element and attribute is optional; missing values fall back to the
//! default road.

use quick_xml::de::from_str;
use serde::Deserialize;
use thiserror::Error;

use crate::geom::{
    CatmullRomCurve3, CrossSectionProfile, CurveError, CurveType, DEFAULT_ARC_LENGTH_DIVISIONS,
    DEFAULT_OFFSETS, DEFAULT_SEGMENTS, Point3, ProceduralCurveOptions,
};

use super::pose::{DEFAULT_LOOP_MS, FollowCamera};
use super::surface::{RoadError, RoadSurface};

/// Control points of the default road.
pub const DEFAULT_CONTROL_POINTS: [[f64; 3]; 11] = [
    [-25.0, 0.0, -25.0],
    [-4.0, 2.0, -9.0],
    [4.0, 1.0, -6.0],
    [6.0, 0.0, 0.0],
    [-3.0, 1.0, 1.0],
    [-11.0, 0.0, 6.0],
    [-12.0, 1.0, 1.0],
    [-7.0, 1.0, -3.0],
    [7.0, 8.0, -9.0],
    [13.0, 2.0, -12.0],
    [10.0, 1.0, -20.0],
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error("road config cannot contain both <curve> and <procedural>")]
    ConflictingCurves,
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Where the centre line comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveConfig {
    Explicit {
        points: Vec<Point3>,
        curve_type: CurveType,
    },
    Procedural(ProceduralCurveOptions),
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self::Explicit {
            points: DEFAULT_CONTROL_POINTS.iter().copied().map(Point3::from_array).collect(),
            curve_type: CurveType::Centripetal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadConfig {
    pub curve: CurveConfig,
    pub arc_length_divisions: usize,
    pub segments: usize,
    pub offsets: Vec<f64>,
    pub loop_ms: f64,
    pub camera: FollowCamera,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            curve: CurveConfig::default(),
            arc_length_divisions: DEFAULT_ARC_LENGTH_DIVISIONS,
            segments: DEFAULT_SEGMENTS,
            offsets: DEFAULT_OFFSETS.to_vec(),
            loop_ms: DEFAULT_LOOP_MS,
            camera: FollowCamera::default(),
        }
    }
}

impl RoadConfig {
    /// Parses and validates an XML road description.
    pub fn from_xml_str(input: &str) -> Result<Self, ConfigError> {
        log::debug!("parsing road config ({} bytes)", input.len());
        let document: RoadXml = from_str(input)?;
        let config = document.into_config()?;
        config.validate()?;
        log::debug!(
            "road config: segments={} tracks={} loop={}ms",
            config.segments,
            config.tracks(),
            config.loop_ms
        );
        Ok(config)
    }

    #[must_use]
    pub fn tracks(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Checks the scalar settings. Curve and profile validity is checked when
    /// they are built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segments == 0 {
            return Err(invalid("segments", "must be positive"));
        }
        if self.arc_length_divisions == 0 {
            return Err(invalid("arc-divisions", "must be positive"));
        }
        if !(self.loop_ms > 0.0) || !self.loop_ms.is_finite() {
            return Err(invalid("loop-ms", format!("must be a positive number, got {}", self.loop_ms)));
        }
        let FollowCamera { look_ahead, eye_lift, target_lift } = self.camera;
        if !(look_ahead.is_finite() && eye_lift.is_finite() && target_lift.is_finite()) {
            return Err(invalid("camera", "values must be finite"));
        }
        if look_ahead < 0.0 {
            return Err(invalid("look-ahead", "must not be negative"));
        }
        Ok(())
    }

    pub fn build_curve(&self) -> Result<CatmullRomCurve3, CurveError> {
        let curve = match &self.curve {
            CurveConfig::Explicit { points, curve_type } => {
                CatmullRomCurve3::new(points.clone(), *curve_type)?
            }
            CurveConfig::Procedural(options) => CatmullRomCurve3::procedural(options)?,
        };
        if self.arc_length_divisions == DEFAULT_ARC_LENGTH_DIVISIONS {
            Ok(curve)
        } else {
            curve.with_arc_length_divisions(self.arc_length_divisions)
        }
    }

    pub fn build_surface(&self) -> Result<RoadSurface, RoadError> {
        let curve = self.build_curve()?;
        let profile = CrossSectionProfile::new(self.offsets.clone())?;
        RoadSurface::new(curve, profile, self.segments)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct RoadXml {
    #[serde(default, rename = "@segments")]
    segments: Option<usize>,
    #[serde(default, rename = "@loop-ms")]
    loop_ms: Option<f64>,
    #[serde(default, rename = "@arc-divisions")]
    arc_divisions: Option<usize>,
    #[serde(default)]
    curve: Option<CurveXml>,
    #[serde(default)]
    procedural: Option<ProceduralXml>,
    #[serde(default)]
    profile: Option<ProfileXml>,
    #[serde(default)]
    camera: Option<CameraXml>,
}

#[derive(Debug, Deserialize)]
struct CurveXml {
    #[serde(default, rename = "@type")]
    kind: Option<String>,
    #[serde(default, rename = "@tension")]
    tension: Option<f64>,
    #[serde(default, rename = "point")]
    points: Vec<PointXml>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct PointXml {
    #[serde(rename = "@x")]
    x: f64,
    #[serde(rename = "@y")]
    y: f64,
    #[serde(rename = "@z")]
    z: f64,
}

impl From<PointXml> for Point3 {
    fn from(p: PointXml) -> Self {
        Point3::new(p.x, p.y, p.z)
    }
}

#[derive(Debug, Deserialize)]
struct ProceduralXml {
    #[serde(default, rename = "@count")]
    count: Option<usize>,
    #[serde(default, rename = "@frequency")]
    frequency: Option<f64>,
    #[serde(default, rename = "@step")]
    step: Option<f64>,
    #[serde(default, rename = "@seed")]
    seed: Option<u64>,
    #[serde(default, rename = "@type")]
    kind: Option<String>,
    #[serde(default, rename = "@tension")]
    tension: Option<f64>,
    #[serde(default)]
    origin: Option<PointXml>,
}

#[derive(Debug, Deserialize)]
struct ProfileXml {
    #[serde(default, rename = "offset")]
    offsets: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct CameraXml {
    #[serde(default, rename = "@look-ahead")]
    look_ahead: Option<f64>,
    #[serde(default, rename = "@eye-lift")]
    eye_lift: Option<f64>,
    #[serde(default, rename = "@target-lift")]
    target_lift: Option<f64>,
}

fn parse_curve_type(kind: Option<&str>, tension: Option<f64>) -> Result<CurveType, CurveError> {
    match kind {
        Some(name) => CurveType::parse(name, tension),
        None => Ok(CurveType::Centripetal),
    }
}

impl RoadXml {
    fn into_config(self) -> Result<RoadConfig, ConfigError> {
        let defaults = RoadConfig::default();

        let curve = match (self.curve, self.procedural) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingCurves),
            (Some(curve), None) => CurveConfig::Explicit {
                curve_type: parse_curve_type(curve.kind.as_deref(), curve.tension)?,
                points: curve.points.into_iter().map(Point3::from).collect(),
            },
            (None, Some(procedural)) => {
                let base = ProceduralCurveOptions::default();
                CurveConfig::Procedural(ProceduralCurveOptions {
                    origin: procedural.origin.map_or(base.origin, Point3::from),
                    count: procedural.count.unwrap_or(base.count),
                    frequency: procedural.frequency.unwrap_or(base.frequency),
                    frequency_step: procedural.step.unwrap_or(base.frequency_step),
                    seed: procedural.seed,
                    curve_type: parse_curve_type(procedural.kind.as_deref(), procedural.tension)?,
                })
            }
            (None, None) => defaults.curve,
        };

        let camera = match self.camera {
            Some(camera) => FollowCamera {
                look_ahead: camera.look_ahead.unwrap_or(defaults.camera.look_ahead),
                eye_lift: camera.eye_lift.unwrap_or(defaults.camera.eye_lift),
                target_lift: camera.target_lift.unwrap_or(defaults.camera.target_lift),
            },
            None => defaults.camera,
        };

        Ok(RoadConfig {
            curve,
            arc_length_divisions: self.arc_divisions.unwrap_or(defaults.arc_length_divisions),
            segments: self.segments.unwrap_or(defaults.segments),
            offsets: self.profile.map_or(defaults.offsets, |p| p.offsets),
            loop_ms: self.loop_ms.unwrap_or(defaults.loop_ms),
            camera,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_the_default_road() {
        let config = RoadConfig::default();
        assert_eq!(config.segments, 1000);
        assert_eq!(config.tracks(), 3);
        assert_eq!(config.loop_ms, 20_000.0);
        let CurveConfig::Explicit { points, curve_type } = &config.curve else {
            panic!("default curve should be explicit");
        };
        assert_eq!(points.len(), 11);
        assert_eq!(points[8], Point3::new(7.0, 8.0, -9.0));
        assert_eq!(*curve_type, CurveType::Centripetal);
    }

    #[test]
    fn test_parse_full_document() {
        let xml = r#"
            <road segments="64" loop-ms="5000" arc-divisions="100">
              <curve type="uniform" tension="0.25">
                <point x="0" y="0" z="0"/>
                <point x="1" y="0" z="0"/>
                <point x="2" y="1" z="0"/>
                <point x="3" y="1" z="-1.5"/>
              </curve>
              <profile>
                <offset>-1</offset>
                <offset>0</offset>
                <offset>1</offset>
              </profile>
              <camera look-ahead="0.01" eye-lift="0.5"/>
            </road>
        "#;
        let config = RoadConfig::from_xml_str(xml).unwrap();
        assert_eq!(config.segments, 64);
        assert_eq!(config.loop_ms, 5000.0);
        assert_eq!(config.arc_length_divisions, 100);
        assert_eq!(config.offsets, vec![-1.0, 0.0, 1.0]);
        assert_eq!(config.camera.look_ahead, 0.01);
        assert_eq!(config.camera.eye_lift, 0.5);
        assert_eq!(config.camera.target_lift, 0.03);

        let CurveConfig::Explicit { points, curve_type } = &config.curve else {
            panic!("expected explicit curve");
        };
        assert_eq!(points[3], Point3::new(3.0, 1.0, -1.5));
        assert_eq!(*curve_type, CurveType::Uniform { tension: 0.25 });

        let curve = config.build_curve().unwrap();
        assert_eq!(curve.arc_length_divisions(), 100);
    }

    #[test]
    fn test_parse_procedural() {
        let xml = r#"<road><procedural count="6" seed="3"><origin x="1" y="2" z="3"/></procedural></road>"#;
        let config = RoadConfig::from_xml_str(xml).unwrap();
        let CurveConfig::Procedural(options) = config.curve else {
            panic!("expected procedural curve");
        };
        assert_eq!(options.count, 6);
        assert_eq!(options.seed, Some(3));
        assert_eq!(options.origin, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(options.frequency_step, 0.1);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = RoadConfig::from_xml_str("<road/>").unwrap();
        assert_eq!(config, RoadConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            RoadConfig::from_xml_str(r#"<road segments="0"/>"#),
            Err(ConfigError::InvalidValue { field: "segments", .. })
        ));
        assert!(matches!(
            RoadConfig::from_xml_str(r#"<road loop-ms="-1"/>"#),
            Err(ConfigError::InvalidValue { field: "loop-ms", .. })
        ));
        assert!(matches!(
            RoadConfig::from_xml_str(r#"<road><curve type="bezier"/></road>"#),
            Err(ConfigError::Curve(CurveError::UnknownCurveType(_)))
        ));
        assert!(matches!(
            RoadConfig::from_xml_str(r#"<road><curve/><procedural/></road>"#),
            Err(ConfigError::ConflictingCurves)
        ));
        assert!(matches!(
            RoadConfig::from_xml_str(r#"<road segments="many"/>"#),
            Err(ConfigError::Xml(_))
        ));
    }
}
