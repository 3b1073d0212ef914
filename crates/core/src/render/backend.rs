//! The GPU command seam used by the engine.
//!
//! `GpuBackend` is a safe, narrow view of the GL calls the accumulation
//! pipeline needs. Creation methods return `None` for an absent handle, the
//! way a lost or exhausted WebGL2 context does; callers turn that into a
//! [`TracerError::ResourceCreation`](crate::TracerError::ResourceCreation).
//!
//! Two implementations exist: `glow::Context` (feature `render`) and the
//! recording [`HeadlessGpu`](super::headless::HeadlessGpu).

use std::fmt;

use glam::{Mat3, Vec2, Vec3};

use super::texture::TextureConfig;

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// A value written to a uniform location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Uint(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    /// Uploaded column-major, untransposed.
    Mat3(Mat3),
}

/// GL operations required by the compiler, swapchain, quad and engine.
///
/// All methods take `&self`: GL contexts are internally mutable and bound to
/// the thread that created them.
pub trait GpuBackend {
    type Shader: Copy + PartialEq + fmt::Debug;
    type Program: Copy + PartialEq + fmt::Debug;
    type Buffer: Copy + PartialEq + fmt::Debug;
    type VertexArray: Copy + PartialEq + fmt::Debug;
    type Texture: Copy + PartialEq + fmt::Debug;
    type Framebuffer: Copy + PartialEq + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    // -- shaders and programs --

    fn create_shader(&self, stage: ShaderStage) -> Option<Self::Shader>;

    /// Uploads `source`, compiles it, and returns the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;

    fn shader_info_log(&self, shader: Self::Shader) -> String;

    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Option<Self::Program>;

    /// Binds a vertex attribute name to a fixed location. Takes effect at the next link.
    fn bind_attribute_location(&self, program: Self::Program, location: u32, name: &str);

    /// Attaches `shaders`, links, detaches them again, and returns the link status.
    fn link_program(&self, program: Self::Program, shaders: &[Self::Shader]) -> bool;

    fn program_info_log(&self, program: Self::Program) -> String;

    fn delete_program(&self, program: Self::Program);

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;

    fn use_program(&self, program: Option<Self::Program>);

    /// Writes to a uniform of the program currently in use.
    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue);

    // -- geometry --

    fn create_buffer(&self) -> Option<Self::Buffer>;

    /// Uploads static vertex data into `buffer` as the array buffer.
    fn upload_vertices(&self, buffer: Self::Buffer, vertices: &[f32]);

    fn delete_buffer(&self, buffer: Self::Buffer);

    fn create_vertex_array(&self) -> Option<Self::VertexArray>;

    /// Records in `vertex_array` that attribute `location` reads tightly
    /// packed `components`-wide floats from `buffer`.
    fn configure_float_attribute(
        &self,
        vertex_array: Self::VertexArray,
        buffer: Self::Buffer,
        location: u32,
        components: i32,
    );

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    // -- textures and framebuffers --

    fn create_texture(&self) -> Option<Self::Texture>;

    /// Allocates immutable storage and sets sampling parameters.
    fn allocate_texture(&self, texture: Self::Texture, config: &TextureConfig);

    /// Binds `texture` for sampling on texture unit `unit`.
    fn bind_sampled_texture(&self, unit: u32, texture: Option<Self::Texture>);

    fn delete_texture(&self, texture: Self::Texture);

    fn create_framebuffer(&self) -> Option<Self::Framebuffer>;

    /// Binds `framebuffer` as the draw target; `None` restores the default surface.
    fn bind_framebuffer(&self, framebuffer: Option<Self::Framebuffer>);

    /// Attaches `texture` as color attachment 0 of the bound framebuffer.
    fn attach_color_texture(&self, texture: Self::Texture);

    /// Completeness status of the bound framebuffer, `Err` carrying the raw status.
    fn framebuffer_status(&self) -> Result<(), u32>;

    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer);

    // -- drawing --

    fn viewport(&self, width: u32, height: u32);

    /// Draws `count` vertices from the bound vertex array as a triangle strip.
    fn draw_triangle_strip(&self, count: i32);
}
