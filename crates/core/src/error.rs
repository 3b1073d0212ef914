//! Error types for the path-tracer core.
//!
//! Every failure is a variant of [`TracerError`]. Construction failures are
//! fatal to the engine being built; nothing here is retried internally.

use std::fmt;

use thiserror::Error;

use crate::render::shader::ShaderKind;
use crate::render::swapchain::Slot;

/// A GPU object (or binding) whose creation can fail.
///
/// Carried by [`TracerError::ResourceCreation`] so the report names exactly
/// which step of engine construction came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The rendering context of the drawing surface.
    Context,
    /// A shader object for one of the three shader texts.
    Shader(ShaderKind),
    /// A program object.
    Program,
    /// The full-screen quad vertex buffer.
    VertexBuffer,
    /// The full-screen quad vertex array.
    VertexArray,
    /// One of the two accumulation textures.
    Texture(Slot),
    /// The accumulation framebuffer.
    Framebuffer,
    /// A uniform location in the render program.
    Uniform(&'static str),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Context => write!(f, "context"),
            Resource::Shader(kind) => write!(f, "{kind} shader"),
            Resource::Program => write!(f, "program"),
            Resource::VertexBuffer => write!(f, "vertex buffer"),
            Resource::VertexArray => write!(f, "vertex array"),
            Resource::Texture(slot) => write!(f, "texture {slot}"),
            Resource::Framebuffer => write!(f, "framebuffer"),
            Resource::Uniform(name) => write!(f, "uniform '{name}'"),
        }
    }
}

/// Errors produced by engine construction, drawing, and the render loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TracerError {
    /// The context handed back an absent handle, or a required uniform
    /// could not be resolved.
    #[error("failed to create {0}")]
    ResourceCreation(Resource),

    /// The driver rejected a shader's source.
    #[error("{kind} shader failed to compile:\n{log}")]
    ShaderCompile {
        /// Which shader text was rejected.
        kind: ShaderKind,
        /// Driver info log, or a fixed fallback when the driver gave none.
        log: String,
    },

    /// The driver refused to link a program.
    #[error("program failed to link:\n{0}")]
    ProgramLink(String),

    /// The accumulation framebuffer is not complete with its color attachment.
    #[error("framebuffer incomplete: status 0x{0:04X}")]
    FramebufferIncomplete(u32),

    /// A `DrawInfo` violated its invariants.
    #[error("invalid draw info: {0}")]
    InvalidDrawInfo(String),

    /// A frame was requested before the engine finished construction.
    #[error("engine not ready: {0}")]
    NotReady(String),

    /// A configuration value was out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Fieldless category of a [`TracerError`], for callers that only branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ResourceCreation,
    ShaderCompile,
    ProgramLink,
    FramebufferIncomplete,
    InvalidDrawInfo,
    NotReady,
    InvalidConfig,
}

impl TracerError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TracerError::ResourceCreation(_) => ErrorKind::ResourceCreation,
            TracerError::ShaderCompile { .. } => ErrorKind::ShaderCompile,
            TracerError::ProgramLink(_) => ErrorKind::ProgramLink,
            TracerError::FramebufferIncomplete(_) => ErrorKind::FramebufferIncomplete,
            TracerError::InvalidDrawInfo(_) => ErrorKind::InvalidDrawInfo,
            TracerError::NotReady(_) => ErrorKind::NotReady,
            TracerError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// Whether this error came from the GPU toolchain rejecting supplied source.
    pub fn is_shader_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::ShaderCompile | ErrorKind::ProgramLink)
    }
}
