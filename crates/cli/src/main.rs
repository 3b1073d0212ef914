#![deny(unsafe_code)]
//! CLI binary for the progressive path tracer.
//!
//! Subcommands:
//! - `basis` prints the camera basis and orbit position for a pair of angles
//! - `simulate` dry-runs the render loop against the recording backend

mod error;
mod logging;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use error::CliError;
use logging::{init_logging, LoggingConfig};
use pathtrace_core::render::headless::HeadlessSurface;
use pathtrace_core::render::quad::{
    ACCUMULATE_FRAGMENT_SHADER, DISPLAY_FRAGMENT_SHADER, QUAD_VERTEX_SHADER,
};
use pathtrace_core::{CameraBasis, MouseAngles, RenderLoop, ShaderKind, TracerConfig};

#[derive(Parser)]
#[command(name = "pathtrace", about = "Progressive path tracer CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Viewer configuration JSON file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the camera basis for an azimuth/polar pair.
    Basis {
        /// Azimuth in radians.
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        phi: f32,

        /// Polar angle in radians, within [0, π].
        #[arg(long, default_value_t = std::f32::consts::FRAC_PI_2)]
        theta: f32,
    },
    /// Run the render loop for N frames without a GPU and report the passes.
    Simulate {
        /// Number of frames to draw.
        #[arg(short, long, default_value_t = 3)]
        frames: u32,

        /// Vertex shader file (defaults to the built-in quad shader).
        #[arg(long)]
        vertex: Option<PathBuf>,

        /// Accumulation fragment shader file.
        #[arg(long)]
        fragment: Option<PathBuf>,

        /// Display fragment shader file.
        #[arg(long)]
        post: Option<PathBuf>,

        /// Pointer drag applied before a frame, as FRAME:DX:DY in pixels.
        #[arg(long = "drag", value_parser = parse_drag, allow_hyphen_values = true)]
        drags: Vec<Drag>,
    },
}

/// A simulated pointer drag.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    before_frame: u32,
    dx: f32,
    dy: f32,
}

fn parse_drag(text: &str) -> Result<Drag, String> {
    let parts: Vec<&str> = text.split(':').collect();
    let [frame, dx, dy] = parts.as_slice() else {
        return Err(format!("expected FRAME:DX:DY, got '{text}'"));
    };
    let before_frame = frame
        .parse()
        .map_err(|e| format!("bad frame '{frame}': {e}"))?;
    let dx = dx.parse().map_err(|e| format!("bad dx '{dx}': {e}"))?;
    let dy = dy.parse().map_err(|e| format!("bad dy '{dy}': {e}"))?;
    Ok(Drag {
        before_frame,
        dx,
        dy,
    })
}

fn load_config(path: Option<&Path>) -> Result<TracerConfig, CliError> {
    let Some(path) = path else {
        return Ok(TracerConfig::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("cannot read config {}: {e}", path.display())))?;
    Ok(TracerConfig::from_json_str(&text)?)
}

fn load_source(path: Option<&Path>, fallback: &str) -> Result<String, CliError> {
    match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| CliError::Io(format!("cannot read shader {}: {e}", path.display()))),
        None => Ok(fallback.to_string()),
    }
}

fn basis_angles(phi: f32, theta: f32) -> Result<MouseAngles, CliError> {
    if !phi.is_finite() {
        return Err(CliError::Input(format!("--phi must be finite, got {phi}")));
    }
    if !(0.0..=std::f32::consts::PI).contains(&theta) {
        return Err(CliError::Input(format!(
            "--theta must be within [0, π], got {theta}"
        )));
    }
    Ok(MouseAngles::new(phi, theta))
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Basis { phi, theta } => {
            let angles = basis_angles(phi, theta)?;
            let basis = CameraBasis::from_angles(angles);
            let position = basis.orbit_position(config.anchor(), config.orbit_distance);
            if cli.json {
                let info = serde_json::json!({
                    "phi": phi,
                    "theta": theta,
                    "right": basis.right.to_array(),
                    "up": basis.up.to_array(),
                    "front": basis.front.to_array(),
                    "camera_position": position.to_array(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("right    {:>9.5?}", basis.right.to_array());
                println!("up       {:>9.5?}", basis.up.to_array());
                println!("front    {:>9.5?}", basis.front.to_array());
                println!("position {:>9.5?}", position.to_array());
            }
        }
        Command::Simulate {
            frames,
            vertex,
            fragment,
            post,
            drags,
        } => {
            let sources = [
                (
                    ShaderKind::Vertex,
                    load_source(vertex.as_deref(), QUAD_VERTEX_SHADER)?,
                ),
                (
                    ShaderKind::RenderFragment,
                    load_source(fragment.as_deref(), ACCUMULATE_FRAGMENT_SHADER)?,
                ),
                (
                    ShaderKind::PostFragment,
                    load_source(post.as_deref(), DISPLAY_FRAGMENT_SHADER)?,
                ),
            ];

            let surface = HeadlessSurface::new(config.width, config.height);
            let gpu = surface.gpu().clone();
            let mut render_loop = RenderLoop::new(surface, &config);
            for (kind, text) in sources {
                render_loop.deliver(kind, text)?;
            }

            let mut records = Vec::with_capacity(frames as usize);
            for frame in 0..frames {
                for drag in drags.iter().filter(|d| d.before_frame == frame) {
                    render_loop.pointer_moved(0.0, 0.0, true);
                    render_loop.pointer_moved(drag.dx, drag.dy, true);
                    render_loop.pointer_left();
                    log::info!("drag ({}, {}) before frame {frame}", drag.dx, drag.dy);
                }
                let frame_index = render_loop.input().frame_index();
                let write_slot = render_loop
                    .engine()
                    .map(|engine| engine.swapchain().current().other());
                render_loop.frame()?;
                records.push((frame, frame_index, write_slot));
            }

            let draw_calls = gpu.draws().len();
            if cli.json {
                let per_frame: Vec<_> = records
                    .iter()
                    .map(|(frame, frame_index, slot)| {
                        serde_json::json!({
                            "frame": frame,
                            "frame_counter": frame_index,
                            "write_target": slot.map(|s| s.to_string()),
                        })
                    })
                    .collect();
                let angles = render_loop.input().angles();
                let info = serde_json::json!({
                    "width": config.width,
                    "height": config.height,
                    "frames": render_loop.frames_drawn(),
                    "draw_calls": draw_calls,
                    "final_angles": [angles.azimuth, angles.polar],
                    "per_frame": per_frame,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                for (frame, frame_index, slot) in &records {
                    let target = slot.map_or_else(|| "-".to_string(), |s| s.to_string());
                    println!("frame {frame:>4}  counter {frame_index:>4}  wrote {target}");
                }
                eprintln!(
                    "simulated {} frames at {}x{} ({draw_calls} draw calls)",
                    render_loop.frames_drawn(),
                    config.width,
                    config.height
                );
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose));
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
