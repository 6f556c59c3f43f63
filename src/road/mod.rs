//! Road-level API built on the geometry kernel.
//!
//! [`RoadSurface`] owns a centre-line curve and a cross-section profile,
//! memoises the ribbon mesh and answers pose queries. [`FollowCamera`] turns
//! those poses into a chase-camera placement, and [`RoadConfig`] loads the
//! whole setup from XML.

pub mod config;
pub mod pose;
pub mod surface;

pub use config::{ConfigError, CurveConfig, RoadConfig};
pub use pose::{CameraPlacement, DEFAULT_LOOP_MS, FollowCamera, Pose, loop_parameter};
pub use surface::{RoadError, RoadSurface};
