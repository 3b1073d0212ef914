//! Double-buffered accumulation targets.
//!
//! Two equally sized textures live in a two-slot array; a [`Slot`] selector
//! marks the `current` one. The current slot is the read target (the last
//! finished frame), the other is the write target (the frame being
//! rendered). One framebuffer is re-pointed at the write target before each
//! render pass. `swap()` flips the selector and is the only thing that does.

use std::fmt;

use super::backend::GpuBackend;
use super::texture::TextureConfig;
use crate::error::{Resource, TracerError};

/// Texture unit the render pass reads the previous frame from, and the post
/// pass reads the finished frame from.
pub const SAMPLER_UNIT: u32 = 0;

/// One of the two accumulation slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    /// The other slot.
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => write!(f, "A"),
            Slot::B => write!(f, "B"),
        }
    }
}

/// Two textures, one framebuffer, and the read/write selector.
#[derive(Debug, Clone)]
pub struct AccumulationSwapchain<T, F> {
    textures: [T; 2],
    framebuffer: F,
    current: Slot,
    config: TextureConfig,
}

impl<T: Copy + PartialEq + fmt::Debug, F: Copy + fmt::Debug> AccumulationSwapchain<T, F> {
    /// Wraps already created objects. Slot A starts as the read target.
    pub fn new(textures: [T; 2], framebuffer: F, config: TextureConfig) -> Self {
        Self {
            textures,
            framebuffer,
            current: Slot::A,
            config,
        }
    }

    /// Creates texture A, texture B, then the framebuffer, and checks that
    /// the framebuffer is complete with the first write target attached.
    ///
    /// # Errors
    ///
    /// `ResourceCreation` naming the object that came back absent, or
    /// `FramebufferIncomplete`. Objects this call already created are deleted.
    pub fn build<G>(gl: &G, config: TextureConfig) -> Result<Self, TracerError>
    where
        G: GpuBackend<Texture = T, Framebuffer = F>,
    {
        let a = gl
            .create_texture()
            .ok_or(TracerError::ResourceCreation(Resource::Texture(Slot::A)))?;
        gl.allocate_texture(a, &config);

        let Some(b) = gl.create_texture() else {
            gl.delete_texture(a);
            return Err(TracerError::ResourceCreation(Resource::Texture(Slot::B)));
        };
        gl.allocate_texture(b, &config);

        let Some(framebuffer) = gl.create_framebuffer() else {
            gl.delete_texture(a);
            gl.delete_texture(b);
            return Err(TracerError::ResourceCreation(Resource::Framebuffer));
        };

        let chain = Self::new([a, b], framebuffer, config);
        gl.bind_framebuffer(Some(framebuffer));
        gl.attach_color_texture(chain.write_target());
        let status = gl.framebuffer_status();
        gl.bind_framebuffer(None);

        if let Err(status) = status {
            chain.release(gl);
            return Err(TracerError::FramebufferIncomplete(status));
        }

        log::debug!(
            "accumulation swapchain {}x{} ready (A={a:?}, B={b:?}, fbo={framebuffer:?})",
            config.width,
            config.height
        );
        Ok(chain)
    }

    /// The slot currently holding the last finished frame.
    pub fn current(&self) -> Slot {
        self.current
    }

    pub fn current_is_a(&self) -> bool {
        self.current == Slot::A
    }

    /// Texture sampled as the previous frame.
    pub fn read_target(&self) -> T {
        self.textures[self.current.index()]
    }

    /// Texture attached to the framebuffer for the next render pass.
    pub fn write_target(&self) -> T {
        self.textures[self.current.other().index()]
    }

    /// Exchanges the read and write roles.
    pub fn swap(&mut self) {
        self.current = self.current.other();
    }

    pub fn framebuffer(&self) -> F {
        self.framebuffer
    }

    pub fn config(&self) -> &TextureConfig {
        &self.config
    }

    /// Points the framebuffer at the write target and samples the read
    /// target on [`SAMPLER_UNIT`], leaving the framebuffer bound.
    pub fn begin_render_pass<G>(&self, gl: &G)
    where
        G: GpuBackend<Texture = T, Framebuffer = F>,
    {
        debug_assert!(self.read_target() != self.write_target());
        gl.bind_sampled_texture(SAMPLER_UNIT, Some(self.read_target()));
        gl.bind_framebuffer(Some(self.framebuffer));
        gl.attach_color_texture(self.write_target());
    }

    /// Restores the default surface as the draw target.
    pub fn end_render_pass<G>(&self, gl: &G)
    where
        G: GpuBackend<Texture = T, Framebuffer = F>,
    {
        gl.bind_framebuffer(None);
    }

    /// Samples the just-written target on [`SAMPLER_UNIT`]. Call between
    /// [`end_render_pass`](Self::end_render_pass) and [`swap`](Self::swap).
    pub fn bind_latest<G>(&self, gl: &G)
    where
        G: GpuBackend<Texture = T, Framebuffer = F>,
    {
        gl.bind_sampled_texture(SAMPLER_UNIT, Some(self.write_target()));
    }

    /// Deletes the framebuffer and both textures.
    pub fn release<G>(&self, gl: &G)
    where
        G: GpuBackend<Texture = T, Framebuffer = F>,
    {
        gl.delete_framebuffer(self.framebuffer);
        for texture in self.textures {
            gl.delete_texture(texture);
        }
    }
}
