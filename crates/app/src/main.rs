//! Entry point for orbitsnap.
//!
//! Default mode enumerates the rotation grid and captures one snapshot per
//! orientation, headlessly. `--preview` opens the interactive window
//! instead.

use std::path::PathBuf;

use anyhow::{Result, bail};

use asset::snapshot::SnapshotWriter;
use asset::texture::TextureData;
use corelib::camera::Camera;
use corelib::rotation::{self, GridSteps};
use corelib::transform::Transform;
use renderer::{GpuContext, Mesh, ShadingMode, SnapshotRenderer};

struct Config {
    obj: PathBuf,
    texture: Option<PathBuf>,
    width: u32,
    height: u32,
    steps: GridSteps,
    distance: f32,
    out_dir: PathBuf,
    prefix: String,
    depth: bool,
    depth_dir: PathBuf,
    depth_prefix: String,
    backends: wgpu::Backends,
    preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            obj: PathBuf::new(),
            texture: None,
            width: 512,
            height: 512,
            steps: GridSteps::uniform(8),
            distance: 0.5,
            out_dir: PathBuf::from("snapshots"),
            prefix: "snap".to_string(),
            depth: false,
            depth_dir: PathBuf::from("depthMaps"),
            depth_prefix: "depth_snap".to_string(),
            backends: wgpu::Backends::all(),
            preview: false,
        }
    }
}

fn parse_backend(val: &str) -> wgpu::Backends {
    // Accept: auto|vulkan|dx12|metal|gl
    match val.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        other => {
            eprintln!("[warn] Unknown backend '{}', falling back to auto.", other);
            wgpu::Backends::all()
        }
    }
}

fn parse_steps(val: &str) -> Result<GridSteps> {
    // Accept: --steps=N or --steps=X,Y,Z
    let parts: Vec<&str> = val.split(',').collect();
    let parse = |s: &str| -> Result<u32> {
        let n = s.trim().parse::<u32>()?;
        if n == 0 {
            bail!("step count must be positive");
        }
        Ok(n)
    };
    match parts.as_slice() {
        [n] => Ok(GridSteps::uniform(parse(n)?)),
        [x, y, z] => Ok(GridSteps {
            x: parse(x)?,
            y: parse(y)?,
            z: parse(z)?,
        }),
        _ => bail!("expected --steps=N or --steps=X,Y,Z, got '{val}'"),
    }
}

fn parse_on_off(val: &str) -> bool {
    matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes")
}

fn parse_args() -> Result<Config> {
    let mut config = Config::default();
    let mut obj: Option<PathBuf> = None;

    for arg in std::env::args().skip(1) {
        if let Some(val) = arg.strip_prefix("--obj=") {
            obj = Some(PathBuf::from(val));
        } else if let Some(val) = arg.strip_prefix("--texture=") {
            config.texture = Some(PathBuf::from(val));
        } else if let Some(val) = arg.strip_prefix("--size=") {
            if let Some((w, h)) = val.split_once('x').or_else(|| val.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (w.parse::<u32>(), h.parse::<u32>()) {
                    config.width = pw.max(1);
                    config.height = ph.max(1);
                }
            }
        } else if let Some(val) = arg.strip_prefix("--width=") {
            if let Ok(pw) = val.parse::<u32>() {
                config.width = pw.max(1);
            }
        } else if let Some(val) = arg.strip_prefix("--height=") {
            if let Ok(ph) = val.parse::<u32>() {
                config.height = ph.max(1);
            }
        } else if let Some(val) = arg.strip_prefix("--steps=") {
            config.steps = parse_steps(val)?;
        } else if let Some(val) = arg.strip_prefix("--distance=") {
            config.distance = val.parse::<f32>()?;
        } else if let Some(val) = arg.strip_prefix("--out=") {
            config.out_dir = PathBuf::from(val);
        } else if let Some(val) = arg.strip_prefix("--prefix=") {
            config.prefix = val.to_string();
        } else if arg == "--depth" {
            config.depth = true;
        } else if let Some(val) = arg.strip_prefix("--depth=") {
            config.depth = parse_on_off(val);
        } else if let Some(val) = arg.strip_prefix("--depth-out=") {
            config.depth_dir = PathBuf::from(val);
        } else if let Some(val) = arg.strip_prefix("--depth-prefix=") {
            config.depth_prefix = val.to_string();
        } else if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            config.backends = parse_backend(val);
        } else if arg == "--preview" {
            config.preview = true;
        } else {
            bail!("unknown argument '{arg}'");
        }
    }

    match obj {
        Some(path) => config.obj = path,
        None => bail!("missing required --obj=PATH argument"),
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = parse_args()?;
    log::info!(
        "Starting orbitsnap. obj={}, size={}x{}, steps={:?}, distance={}, depth={}, preview={}",
        config.obj.display(),
        config.width,
        config.height,
        config.steps,
        config.distance,
        config.depth,
        config.preview
    );

    if config.preview {
        let mode = if config.depth {
            ShadingMode::DepthView
        } else {
            ShadingMode::Diffuse
        };
        return platform::run_preview(platform::PreviewConfig {
            obj: config.obj,
            texture: config.texture,
            width: config.width,
            height: config.height,
            distance: config.distance,
            mode,
            backends: config.backends,
        });
    }

    run_capture(config)
}

/// Render every rotation sample and write the numbered snapshots.
fn run_capture(config: Config) -> Result<()> {
    let texture = match &config.texture {
        Some(path) => TextureData::from_path(path)?,
        None => {
            log::info!("no texture given, using the checkerboard fallback");
            TextureData::checkerboard(64)
        }
    };

    let ctx = GpuContext::headless(config.backends)?;
    let mut snapshots = SnapshotRenderer::new(ctx, &texture, Camera::default());
    let mesh = Mesh::from_obj_path(snapshots.context(), &config.obj)?;

    let writer = SnapshotWriter::new(&config.out_dir, &config.prefix)?;
    let depth_writer = config
        .depth
        .then(|| SnapshotWriter::new(&config.depth_dir, &config.depth_prefix))
        .transpose()?;

    let samples = rotation::enumerate(config.steps);
    log::info!("{} rotation samples to capture", samples.len());

    let model = Transform::identity().matrix();
    for (id, sample) in samples.iter().enumerate() {
        let id = id as u32;
        let view = sample.view_matrix(config.distance);
        snapshots.render_and_capture(
            &mesh,
            view,
            model,
            config.width,
            config.height,
            ShadingMode::Diffuse,
            &writer,
            id,
        )?;
        if let Some(depth_writer) = &depth_writer {
            snapshots.render_and_capture(
                &mesh,
                view,
                model,
                config.width,
                config.height,
                ShadingMode::DepthView,
                depth_writer,
                id,
            )?;
        }
        if (id + 1) % 100 == 0 {
            log::info!("captured {}/{}", id + 1, samples.len());
        }
    }

    log::info!(
        "Done: {} snapshot(s) in {}",
        samples.len(),
        config.out_dir.display()
    );
    Ok(())
}
