//! GPU side of the accumulation renderer.
//!
//! Everything here talks to the GPU through the [`GpuBackend`] trait. The
//! `glow` implementation needs the `render` feature; the recording
//! [`HeadlessGpu`] is always available.
//!
//! # Module overview
//!
//! - [`backend`] -- The `GpuBackend` seam, shader stages, uniform values.
//! - [`shader`] -- Shader compilation, program linking, source annotation.
//! - [`quad`] -- Full-screen quad geometry and pass-through shader sources.
//! - [`texture`] -- Accumulation texture configuration.
//! - [`swapchain`] -- Ping-pong accumulation targets.
//! - [`uniforms`] -- Uniform names and resolved locations.
//! - [`engine`] -- `PathTracerEngine` and the `DrawingSurface` trait.
//! - [`headless`] -- Recording backend for tests and dry runs.

pub mod backend;
pub mod engine;
#[cfg(feature = "render")]
pub mod glow_backend;
pub mod headless;
pub mod quad;
pub mod shader;
pub mod swapchain;
pub mod texture;
pub mod uniforms;

pub use backend::{GpuBackend, ShaderStage, UniformValue};
pub use engine::{DrawingSurface, PathTracerEngine};
pub use headless::{HeadlessGpu, HeadlessSurface};
pub use quad::FullscreenQuad;
pub use shader::{
    annotate_source, compile_shader, link_program, ProgramPair, ShaderKind, ShaderSources,
};
pub use swapchain::{AccumulationSwapchain, Slot};
pub use texture::{TextureConfig, TextureFilter, TextureFormat};
pub use uniforms::UniformBindings;
