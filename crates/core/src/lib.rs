#![deny(unsafe_code)]
//! Core of the progressive path tracer.
//!
//! Renders a scene by running an accumulation shader into one of two
//! ping-pong textures each frame, then displaying the newest one through a
//! post-processing pass. Provides the camera basis (`CameraBasis`), the
//! per-frame input (`DrawInfo`, `EngineInputState`), the render loop
//! controller (`RenderLoop`), viewer configuration (`TracerConfig`), and the
//! GPU side in [`render`].

pub mod camera;
pub mod config;
pub mod controller;
pub mod error;
pub mod frame;
pub mod input;
pub mod render;

pub use camera::CameraBasis;
pub use config::TracerConfig;
pub use controller::{FrameStatus, PendingSources, RenderLoop};
pub use error::{ErrorKind, Resource, TracerError};
pub use frame::{DrawInfo, MouseAngles};
pub use input::EngineInputState;
pub use render::{DrawingSurface, PathTracerEngine, ShaderKind, ShaderSources};
