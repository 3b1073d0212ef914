//! The accumulation engine: owns the context and every GPU object, and
//! issues the two passes of each frame.

use glam::Vec2;

use super::backend::{GpuBackend, UniformValue};
use super::quad::FullscreenQuad;
use super::shader::{ProgramPair, ShaderSources};
use super::swapchain::AccumulationSwapchain;
use super::texture::TextureConfig;
use super::uniforms::UniformBindings;
use crate::camera::CameraBasis;
use crate::error::{Resource, TracerError};
use crate::frame::DrawInfo;

/// A fixed-size pixel surface that can hand out one rendering context.
pub trait DrawingSurface {
    type Backend: GpuBackend;

    /// Pixel dimensions at the time of the call.
    fn size(&self) -> (u32, u32);

    /// The surface's hardware context, or `None` if it has none to give.
    fn create_context(&self) -> Option<Self::Backend>;
}

/// Progressive path-tracing engine.
///
/// Exists only fully built: [`initialize`](Self::initialize) either returns a
/// ready engine or an error, never a half-built one. Dropping the engine
/// deletes every GPU object it owns.
///
/// Not thread-safe; drive it from the thread that created its context.
pub struct PathTracerEngine<G: GpuBackend> {
    gl: G,
    programs: ProgramPair<G::Program>,
    quad: FullscreenQuad<G::Buffer, G::VertexArray>,
    swapchain: AccumulationSwapchain<G::Texture, G::Framebuffer>,
    uniforms: UniformBindings<G::UniformLocation>,
    resolution: (u32, u32),
}

impl<G: GpuBackend> PathTracerEngine<G> {
    /// Builds every GPU object, in order: context, programs, quad,
    /// swapchain, uniform locations. Then sets the viewport and writes
    /// `resolution` once.
    ///
    /// # Errors
    ///
    /// The first failing step's error, unchanged. Objects created by earlier
    /// steps are deleted; later steps never run.
    pub fn initialize<S>(surface: &S, sources: &ShaderSources) -> Result<Self, TracerError>
    where
        S: DrawingSurface<Backend = G>,
    {
        let (width, height) = surface.size();
        if width == 0 || height == 0 {
            return Err(TracerError::InvalidConfig(format!(
                "surface size {width}x{height} has a zero dimension"
            )));
        }

        let gl = surface
            .create_context()
            .ok_or(TracerError::ResourceCreation(Resource::Context))?;

        let programs = ProgramPair::build(&gl, sources)?;
        let quad = FullscreenQuad::build(&gl).inspect_err(|_| programs.release(&gl))?;
        let swapchain = AccumulationSwapchain::build(&gl, TextureConfig::rgba8(width, height))
            .inspect_err(|_| {
                quad.release(&gl);
                programs.release(&gl);
            })?;
        let uniforms = UniformBindings::resolve(&gl, programs.render).inspect_err(|_| {
            swapchain.release(&gl);
            quad.release(&gl);
            programs.release(&gl);
        })?;

        gl.viewport(width, height);
        gl.use_program(Some(programs.render));
        gl.set_uniform(
            &uniforms.resolution,
            UniformValue::Vec2(Vec2::new(width as f32, height as f32)),
        );

        log::info!("path tracer ready at {width}x{height}");
        Ok(Self {
            gl,
            programs,
            quad,
            swapchain,
            uniforms,
            resolution: (width, height),
        })
    }

    /// Renders one accumulation step and displays it.
    ///
    /// The render pass samples the read target and writes the write target;
    /// the post pass samples the write target and draws to the surface; then
    /// the roles swap. Returns once commands are submitted, without waiting
    /// for the GPU.
    ///
    /// # Errors
    ///
    /// `InvalidDrawInfo` if `info` breaks its invariants; no command is
    /// issued and the swapchain does not swap.
    pub fn draw(&mut self, info: &DrawInfo) -> Result<(), TracerError> {
        info.validate()?;

        let basis = CameraBasis::from_angles(info.mouse_angles);
        let position = basis.orbit_position(info.camera_anchor, info.orbit_distance);
        let gl = &self.gl;

        gl.use_program(Some(self.programs.render));
        gl.set_uniform(
            &self.uniforms.fov_tangent,
            UniformValue::Float(info.fov_tangent()),
        );
        gl.set_uniform(&self.uniforms.camera_position, UniformValue::Vec3(position));
        gl.set_uniform(&self.uniforms.view_basis, UniformValue::Mat3(basis.to_mat3()));
        gl.set_uniform(
            &self.uniforms.frame_counter,
            UniformValue::Uint(info.frame_index),
        );

        self.swapchain.begin_render_pass(gl);
        self.quad.draw(gl);
        self.swapchain.end_render_pass(gl);

        gl.use_program(Some(self.programs.post));
        self.swapchain.bind_latest(gl);
        self.quad.draw(gl);

        log::trace!(
            "frame {} accumulated into texture {}",
            info.frame_index,
            self.swapchain.current().other()
        );
        self.swapchain.swap();
        Ok(())
    }

    pub fn swapchain(&self) -> &AccumulationSwapchain<G::Texture, G::Framebuffer> {
        &self.swapchain
    }

    /// Pixel size of the accumulation textures.
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn context(&self) -> &G {
        &self.gl
    }
}

impl<G: GpuBackend> Drop for PathTracerEngine<G> {
    fn drop(&mut self) {
        let gl = &self.gl;
        gl.use_program(None);
        gl.bind_vertex_array(None);
        gl.bind_sampled_texture(super::swapchain::SAMPLER_UNIT, None);
        self.swapchain.release(gl);
        self.quad.release(gl);
        self.programs.release(gl);
        log::debug!("path tracer released its GPU objects");
    }
}
