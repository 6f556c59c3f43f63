#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("road_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use road_engine::geom::{Point3, ProceduralCurveOptions, RoadMesh, RoadMeshDiagnostics};
    use road_engine::road::{CurveConfig, RoadConfig, RoadSurface};
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"road_cli (road-engine)

USAGE:
  road_cli list
  road_cli run <scenario|all> [options]
  road_cli pose <u> [--config <file.xml>]

SCENARIOS:
  default_road
  sample_four_point
  procedural_road
  coincident_points

OPTIONS (run):
  --out-dir <dir>      Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>         Write OBJ (single scenario only)
  --snap <path>        Write snapshot (single scenario only)
  --config <file.xml>  Build the road from an XML config instead of a scenario (use `config` as name)
  --no-obj             Skip OBJ when using --out-dir
  --no-snap            Skip snapshot when using --out-dir
  --overwrite          Overwrite existing output files
  -h, --help           Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "pose" => cmd_pose(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut config_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--config" => config_path = Some(PathBuf::from(args.value("--config")?)),
                "--overwrite" => overwrite = true,
                "--no-obj" => write_obj = false,
                "--no-snap" => write_snap = false,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`")),
            }
        }

        let jobs: Vec<(String, RoadConfig)> = if let Some(path) = config_path.as_deref() {
            vec![(scenario_name.clone(), read_config(path)?)]
        } else if scenario_name == "all" {
            Scenario::ALL
                .iter()
                .map(|s| (s.name().to_string(), s.config()))
                .collect()
        } else {
            let scenario = Scenario::from_str(&scenario_name)
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            vec![(scenario.name().to_string(), scenario.config())]
        };

        if jobs.len() > 1 && (obj_path.is_some() || snap_path.is_some()) {
            return Err("--obj/--snap only work with a single scenario; use --out-dir".to_string());
        }
        if jobs.len() > 1 && out_dir.is_none() {
            return Err("`run all` requires --out-dir".to_string());
        }

        for (name, config) in jobs {
            let output = run_config(&name, &config)?;

            let obj_target = obj_path
                .clone()
                .or_else(|| out_dir.as_ref().filter(|_| write_obj).map(|d| d.join(format!("{name}.obj"))));
            let snap_target = snap_path
                .clone()
                .or_else(|| out_dir.as_ref().filter(|_| write_snap).map(|d| d.join(format!("{name}.snap"))));

            if obj_target.is_none() && snap_target.is_none() {
                print!("{}", output.snapshot);
            }
            if let Some(path) = obj_target {
                write_obj_file(&path, &name, &output.mesh, overwrite)?;
                println!("wrote {}", path.display());
            }
            if let Some(path) = snap_target {
                write_text_file(&path, &output.snapshot, overwrite)?;
                println!("wrote {}", path.display());
            }
            if !output.diagnostics.is_clean() {
                eprintln!("{name}: {}", output.diagnostics);
            }
        }

        Ok(())
    }

    fn cmd_pose(args: &mut Args) -> Result<(), String> {
        let raw = args.next().ok_or("missing arc fraction")?;
        let u: f64 = raw
            .parse()
            .map_err(|e| format!("invalid arc fraction `{raw}`: {e}"))?;

        let mut config_path: Option<PathBuf> = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => config_path = Some(PathBuf::from(args.value("--config")?)),
                other => return Err(format!("unknown option `{other}`")),
            }
        }

        let config = match config_path {
            Some(path) => read_config(&path)?,
            None => RoadConfig::default(),
        };
        let surface = config.build_surface().map_err(|e| e.to_string())?;
        let pose = surface.pose_at_arc(u);
        let camera = config.camera.place(&surface, u);

        let mut out = String::new();
        let _ = writeln!(out, "parameter {:.6}", pose.parameter);
        write_vec3_line(&mut out, "position", pose.position.to_array());
        write_vec3_line(&mut out, "forward", pose.forward.to_array());
        write_vec3_line(&mut out, "lateral", pose.lateral.to_array());
        write_vec3_line(&mut out, "up", pose.up.to_array());
        write_vec3_line(&mut out, "camera.eye", camera.eye.to_array());
        write_vec3_line(&mut out, "camera.target", camera.target.to_array());
        print!("{out}");
        Ok(())
    }

    fn read_config(path: &Path) -> Result<RoadConfig, String> {
        let xml = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        RoadConfig::from_xml_str(&xml).map_err(|e| format!("{}: {e}", path.display()))
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = format!("unknown scenario `{name}`\n\nAvailable:\n");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn ensure_writable(path: &Path, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "{} already exists (pass --overwrite to replace it)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        Ok(())
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        ensure_writable(path, overwrite)?;
        fs::write(path, text).map_err(|e| format!("write {}: {e}", path.display()))
    }

    /// Emits `usemtl lane_<slot>` whenever the material slot changes.
    fn write_obj_file(path: &Path, name: &str, mesh: &RoadMesh, overwrite: bool) -> Result<(), String> {
        ensure_writable(path, overwrite)?;

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);
        let err = |e: std::io::Error| format!("write obj: {e}");

        writeln!(w, "# road-engine road_cli").map_err(err)?;
        writeln!(w, "o {name}").map_err(err)?;

        for p in &mesh.positions {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(err)?;
        }
        for uv in &mesh.uvs {
            writeln!(w, "vt {} {}", uv[0], uv[1]).map_err(err)?;
        }
        for n in &mesh.normals {
            writeln!(w, "vn {} {} {}", n[0], n[1], n[2]).map_err(err)?;
        }

        let mut current_slot: Option<u32> = None;
        for group in &mesh.groups {
            if current_slot != Some(group.material_slot) {
                writeln!(w, "usemtl lane_{}", group.material_slot).map_err(err)?;
                current_slot = Some(group.material_slot);
            }
            let start = group.start as usize;
            let end = start + group.count as usize;
            for tri in mesh.indices[start..end].chunks_exact(3) {
                let a = tri[0] + 1;
                let b = tri[1] + 1;
                let c = tri[2] + 1;
                writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}").map_err(err)?;
            }
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let value = if value == -0.0 { 0.0 } else { value };
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == -0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_vec3_line(out: &mut String, prefix: &str, v: [f64; 3]) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v[0]);
        out.push(' ');
        write_f64(out, v[1]);
        out.push(' ');
        write_f64(out, v[2]);
        out.push('\n');
    }

    fn write_vec2_line(out: &mut String, prefix: &str, v: [f64; 2]) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v[0]);
        out.push(' ');
        write_f64(out, v[1]);
        out.push('\n');
    }

    fn write_diagnostics(out: &mut String, diag: &RoadMeshDiagnostics) {
        let _ = writeln!(out, "diag.vertex_count {}", diag.vertex_count);
        let _ = writeln!(out, "diag.triangle_count {}", diag.triangle_count);
        let _ = writeln!(out, "diag.group_count {}", diag.group_count);
        let _ = writeln!(out, "diag.zero_tangent_count {}", diag.zero_tangent_count);
        let _ = writeln!(out, "diag.parallel_frame_count {}", diag.parallel_frame_count);
        let _ = writeln!(out, "diag.held_lateral_count {}", diag.held_lateral_count);
        let _ = write!(out, "diag.curve_length ");
        write_f64(out, diag.curve_length);
        out.push('\n');
        let _ = writeln!(out, "diag.zero_length_curve {}", diag.zero_length_curve);
        let _ = writeln!(out, "diag.warning_count {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "diag.warning.{idx} {warning}");
        }
    }

    fn write_mesh(out: &mut String, mesh: &RoadMesh) {
        let _ = writeln!(out, "mesh.vertex_count {}", mesh.vertex_count());
        for (idx, p) in mesh.positions.iter().copied().enumerate() {
            write_vec3_line(out, &format!("v.{idx}"), p);
        }
        for (idx, n) in mesh.normals.iter().copied().enumerate() {
            write_vec3_line(out, &format!("vn.{idx}"), n);
        }
        for (idx, uv) in mesh.uvs.iter().copied().enumerate() {
            write_vec2_line(out, &format!("vt.{idx}"), uv);
        }
        let _ = writeln!(out, "mesh.index_count {}", mesh.indices.len());
        for (idx, tri) in mesh.indices.chunks_exact(3).enumerate() {
            let _ = writeln!(out, "f.{idx} {} {} {}", tri[0], tri[1], tri[2]);
        }
        let _ = writeln!(out, "mesh.group_count {}", mesh.groups.len());
        for (idx, group) in mesh.groups.iter().enumerate() {
            let _ = writeln!(
                out,
                "g.{idx} {} {} {}",
                group.start, group.count, group.material_slot
            );
        }
    }

    fn snapshot(name: &str, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# road-engine snapshot v1");
        let _ = writeln!(out, "road {name}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        DefaultRoad,
        SampleFourPoint,
        ProceduralRoad,
        CoincidentPoints,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::DefaultRoad,
            Scenario::SampleFourPoint,
            Scenario::ProceduralRoad,
            Scenario::CoincidentPoints,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::DefaultRoad => "default_road",
                Scenario::SampleFourPoint => "sample_four_point",
                Scenario::ProceduralRoad => "procedural_road",
                Scenario::CoincidentPoints => "coincident_points",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            match name {
                "default_road" => Some(Scenario::DefaultRoad),
                "sample_four_point" => Some(Scenario::SampleFourPoint),
                "procedural_road" => Some(Scenario::ProceduralRoad),
                "coincident_points" => Some(Scenario::CoincidentPoints),
                _ => None,
            }
        }

        fn config(self) -> RoadConfig {
            let explicit = |points: &[[f64; 3]]| CurveConfig::Explicit {
                points: points.iter().copied().map(Point3::from_array).collect(),
                curve_type: Default::default(),
            };
            match self {
                Scenario::DefaultRoad => RoadConfig::default(),
                Scenario::SampleFourPoint => RoadConfig {
                    curve: explicit(&[
                        [-25.0, 0.0, -25.0],
                        [-4.0, 2.0, -9.0],
                        [4.0, 1.0, -6.0],
                        [6.0, 0.0, 0.0],
                    ]),
                    segments: 4,
                    offsets: vec![-0.5, 0.0, 0.5],
                    ..RoadConfig::default()
                },
                Scenario::ProceduralRoad => RoadConfig {
                    curve: CurveConfig::Procedural(ProceduralCurveOptions {
                        seed: Some(7),
                        ..ProceduralCurveOptions::default()
                    }),
                    segments: 200,
                    ..RoadConfig::default()
                },
                Scenario::CoincidentPoints => RoadConfig {
                    curve: explicit(&[
                        [0.0, 0.0, 0.0],
                        [0.0, 0.0, 0.0],
                        [4.0, 0.0, 0.0],
                        [8.0, 0.0, 0.0],
                    ]),
                    segments: 6,
                    offsets: vec![-0.5, 0.0, 0.5],
                    ..RoadConfig::default()
                },
            }
        }
    }

    struct RoadOutput {
        mesh: RoadMesh,
        diagnostics: RoadMeshDiagnostics,
        snapshot: String,
    }

    fn run_config(name: &str, config: &RoadConfig) -> Result<RoadOutput, String> {
        config.validate().map_err(|e| format!("{name}: {e}"))?;
        let mut surface: RoadSurface = config.build_surface().map_err(|e| format!("{name}: {e}"))?;
        let (mesh, diagnostics) = surface
            .mesh_with_diagnostics()
            .map_err(|e| format!("{name}: {e}"))?;
        mesh.validate().map_err(|e| format!("{name}: invalid mesh: {e}"))?;

        let snapshot = snapshot(name, |out| {
            let _ = writeln!(out, "segments {}", surface.segments());
            let _ = writeln!(out, "tracks {}", surface.tracks());
            write_diagnostics(out, &diagnostics);
            write_mesh(out, &mesh);
        });

        Ok(RoadOutput {
            mesh: (*mesh).clone(),
            diagnostics: (*diagnostics).clone(),
            snapshot,
        })
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
