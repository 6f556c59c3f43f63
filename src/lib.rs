#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;
pub mod road;

use std::fmt;
use std::sync::Arc;

use geom::{CrossSectionProfile, MaterialGroup, RoadMesh};
use road::{CameraPlacement, Pose, RoadConfig, RoadError, RoadSurface, loop_parameter};
use serde::Serialize;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[derive(Debug, Serialize)]
struct GroupExport {
    start: u32,
    count: u32,
    material_index: u32,
}

impl From<&MaterialGroup> for GroupExport {
    fn from(group: &MaterialGroup) -> Self {
        Self {
            start: group.start,
            count: group.count,
            material_index: group.material_slot,
        }
    }
}

#[derive(Debug, Serialize)]
struct PoseExport {
    parameter: f64,
    position: [f64; 3],
    forward: [f64; 3],
    lateral: [f64; 3],
    up: [f64; 3],
}

impl From<Pose> for PoseExport {
    fn from(pose: Pose) -> Self {
        Self {
            parameter: pose.parameter,
            position: pose.position.to_array(),
            forward: pose.forward.to_array(),
            lateral: pose.lateral.to_array(),
            up: pose.up.to_array(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CameraExport {
    eye: [f64; 3],
    target: [f64; 3],
    up: [f64; 3],
    /// Column-major camera-to-world matrix.
    #[serde(skip_serializing_if = "Option::is_none")]
    matrix: Option<[f64; 16]>,
}

impl From<CameraPlacement> for CameraExport {
    fn from(camera: CameraPlacement) -> Self {
        Self {
            eye: camera.eye.to_array(),
            target: camera.target.to_array(),
            up: camera.up.to_array(),
            matrix: camera.view_transform().map(|view| view.to_column_major()),
        }
    }
}

/// Public entry point for JS consumers.
///
/// Holds one road built from a [`RoadConfig`]. Mesh buffers are built on the
/// first request and served from cache until a setter changes the road.
#[wasm_bindgen]
pub struct RoadEngine {
    config: RoadConfig,
    surface: RoadSurface,
}

#[wasm_bindgen]
impl RoadEngine {
    /// Engine with the default road.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<RoadEngine, JsValue> {
        Self::from_config(RoadConfig::default()).map_err(to_js_error)
    }

    /// Replaces the road with one described by an XML document.
    #[wasm_bindgen]
    pub fn load_config(&mut self, xml: &str) -> Result<(), JsValue> {
        let config = RoadConfig::from_xml_str(xml).map_err(to_js_error)?;
        *self = Self::from_config(config).map_err(to_js_error)?;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn segments(&self) -> usize {
        self.surface.segments()
    }

    #[wasm_bindgen]
    pub fn tracks(&self) -> usize {
        self.surface.tracks()
    }

    #[wasm_bindgen]
    pub fn curve_length(&self) -> f64 {
        self.surface.curve().length()
    }

    #[wasm_bindgen]
    pub fn loop_ms(&self) -> f64 {
        self.config.loop_ms
    }

    #[wasm_bindgen]
    pub fn set_segments(&mut self, segments: usize) -> Result<(), JsValue> {
        self.surface.set_segments(segments).map_err(to_js_error)?;
        self.config.segments = segments;
        Ok(())
    }

    /// Replaces the cross-section offsets; the track count follows.
    #[wasm_bindgen]
    pub fn set_offsets(&mut self, offsets: Vec<f64>) -> Result<(), JsValue> {
        let profile = CrossSectionProfile::new(offsets).map_err(to_js_error)?;
        self.surface.set_profile(profile.clone()).map_err(to_js_error)?;
        self.config.offsets = profile.offsets().to_vec();
        Ok(())
    }

    /// Flat `[x, y, z, ...]` vertex positions.
    #[wasm_bindgen]
    pub fn positions(&mut self) -> Result<Vec<f32>, JsValue> {
        Ok(self.mesh().map_err(to_js_error)?.positions_f32())
    }

    /// Flat per-vertex shading vectors.
    #[wasm_bindgen]
    pub fn normals(&mut self) -> Result<Vec<f32>, JsValue> {
        Ok(self.mesh().map_err(to_js_error)?.normals_f32())
    }

    #[wasm_bindgen]
    pub fn uvs(&mut self) -> Result<Vec<f32>, JsValue> {
        Ok(self.mesh().map_err(to_js_error)?.uvs_f32())
    }

    #[wasm_bindgen]
    pub fn indices(&mut self) -> Result<Vec<u32>, JsValue> {
        Ok(self.mesh().map_err(to_js_error)?.indices.clone())
    }

    /// `[{ start, count, material_index }, ...]`, one entry per quad.
    #[wasm_bindgen]
    pub fn groups(&mut self) -> Result<JsValue, JsValue> {
        let mesh = self.mesh().map_err(to_js_error)?;
        let groups: Vec<GroupExport> = mesh.groups.iter().map(GroupExport::from).collect();
        serde_wasm_bindgen::to_value(&groups).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn diagnostics_summary(&mut self) -> Result<String, JsValue> {
        let diagnostics = self.surface.diagnostics().map_err(to_js_error)?;
        Ok(diagnostics.summary())
    }

    /// `{ parameter, position, forward, lateral, up }` at raw parameter `t`.
    #[wasm_bindgen]
    pub fn pose_at(&self, t: f64) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&PoseExport::from(self.surface.pose_at(t))).map_err(to_js_error)
    }

    /// `{ eye, target, up, matrix }` for the chase camera at `elapsed_ms`.
    #[wasm_bindgen]
    pub fn camera_at_time(&self, elapsed_ms: f64) -> Result<JsValue, JsValue> {
        let camera = self.camera_placement_at_time(elapsed_ms);
        serde_wasm_bindgen::to_value(&CameraExport::from(camera)).map_err(to_js_error)
    }
}

impl RoadEngine {
    pub fn from_config(config: RoadConfig) -> Result<Self, RoadError> {
        let surface = config.build_surface()?;
        log::debug!(
            "road engine ready: segments={} tracks={} length={:.3}",
            surface.segments(),
            surface.tracks(),
            surface.curve().length()
        );
        Ok(Self { config, surface })
    }

    #[must_use]
    pub fn config(&self) -> &RoadConfig {
        &self.config
    }

    #[must_use]
    pub fn surface(&self) -> &RoadSurface {
        &self.surface
    }

    pub fn mesh(&mut self) -> Result<Arc<RoadMesh>, RoadError> {
        self.surface.mesh()
    }

    #[must_use]
    pub fn camera_placement_at_time(&self, elapsed_ms: f64) -> CameraPlacement {
        let u = loop_parameter(elapsed_ms, self.config.loop_ms);
        self.config.camera.place(&self.surface, u)
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen::JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        log::error!("{message}");
        JsValue::NULL
    }
}
