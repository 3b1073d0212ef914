//! [`GpuBackend`] for a live `glow` context (WebGL2 or desktop GL 3.3+).
//!
//! Only available with the `render` feature. Each method is a thin wrapper
//! over the matching `glow::HasContext` call; creation failures are logged
//! with the driver's message and reported as `None`.

use glow::HasContext;

use super::backend::{GpuBackend, ShaderStage, UniformValue};
use super::texture::TextureConfig;

fn gl_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn created<T>(what: &str, result: Result<T, String>) -> Option<T> {
    result
        .inspect_err(|e| log::warn!("gl failed to create {what}: {e}"))
        .ok()
}

// SAFETY (applies to every unsafe block below): glow marks raw GL entry
// points unsafe. All handles passed in were produced by this same context,
// and all enum arguments are valid GL constants.
#[allow(unsafe_code)]
impl GpuBackend for glow::Context {
    type Shader = <glow::Context as HasContext>::Shader;
    type Program = <glow::Context as HasContext>::Program;
    type Buffer = <glow::Context as HasContext>::Buffer;
    type VertexArray = <glow::Context as HasContext>::VertexArray;
    type Texture = <glow::Context as HasContext>::Texture;
    type Framebuffer = <glow::Context as HasContext>::Framebuffer;
    type UniformLocation = <glow::Context as HasContext>::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Option<Self::Shader> {
        created("shader", unsafe { HasContext::create_shader(self, gl_stage(stage)) })
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        unsafe {
            self.shader_source(shader, source);
            HasContext::compile_shader(self, shader);
            self.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Option<Self::Program> {
        created("program", unsafe { HasContext::create_program(self) })
    }

    fn bind_attribute_location(&self, program: Self::Program, location: u32, name: &str) {
        unsafe { self.bind_attrib_location(program, location, name) }
    }

    fn link_program(&self, program: Self::Program, shaders: &[Self::Shader]) -> bool {
        unsafe {
            for &shader in shaders {
                self.attach_shader(program, shader);
            }
            HasContext::link_program(self, program);
            for &shader in shaders {
                self.detach_shader(program, shader);
            }
            self.get_program_link_status(program)
        }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue) {
        let location = Some(location);
        unsafe {
            match value {
                UniformValue::Float(x) => self.uniform_1_f32(location, x),
                UniformValue::Uint(x) => self.uniform_1_u32(location, x),
                UniformValue::Vec2(v) => self.uniform_2_f32(location, v.x, v.y),
                UniformValue::Vec3(v) => self.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Mat3(m) => {
                    self.uniform_matrix_3_f32_slice(location, false, &m.to_cols_array())
                }
            }
        }
    }

    fn create_buffer(&self) -> Option<Self::Buffer> {
        created("buffer", unsafe { HasContext::create_buffer(self) })
    }

    fn upload_vertices(&self, buffer: Self::Buffer, vertices: &[f32]) {
        unsafe {
            self.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices),
                glow::STATIC_DRAW,
            );
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn create_vertex_array(&self) -> Option<Self::VertexArray> {
        created("vertex array", unsafe { HasContext::create_vertex_array(self) })
    }

    fn configure_float_attribute(
        &self,
        vertex_array: Self::VertexArray,
        buffer: Self::Buffer,
        location: u32,
        components: i32,
    ) {
        unsafe {
            HasContext::bind_vertex_array(self, Some(vertex_array));
            self.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.enable_vertex_attrib_array(location);
            self.vertex_attrib_pointer_f32(location, components, glow::FLOAT, false, 0, 0);
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn create_texture(&self) -> Option<Self::Texture> {
        created("texture", unsafe { HasContext::create_texture(self) })
    }

    fn allocate_texture(&self, texture: Self::Texture, config: &TextureConfig) {
        let filter = config.filter.gl_filter() as i32;
        unsafe {
            self.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.tex_storage_2d(
                glow::TEXTURE_2D,
                1,
                config.format.gl_internal_format(),
                config.width as i32,
                config.height as i32,
            );
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter);
            self.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn bind_sampled_texture(&self, unit: u32, texture: Option<Self::Texture>) {
        unsafe {
            self.active_texture(glow::TEXTURE0 + unit);
            self.bind_texture(glow::TEXTURE_2D, texture);
        }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { HasContext::delete_texture(self, texture) }
    }

    fn create_framebuffer(&self) -> Option<Self::Framebuffer> {
        created("framebuffer", unsafe { HasContext::create_framebuffer(self) })
    }

    fn bind_framebuffer(&self, framebuffer: Option<Self::Framebuffer>) {
        unsafe { HasContext::bind_framebuffer(self, glow::FRAMEBUFFER, framebuffer) }
    }

    fn attach_color_texture(&self, texture: Self::Texture) {
        unsafe {
            self.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );
        }
    }

    fn framebuffer_status(&self) -> Result<(), u32> {
        let status = unsafe { self.check_framebuffer_status(glow::FRAMEBUFFER) };
        if status == glow::FRAMEBUFFER_COMPLETE {
            Ok(())
        } else {
            Err(status)
        }
    }

    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer) {
        unsafe { HasContext::delete_framebuffer(self, framebuffer) }
    }

    fn viewport(&self, width: u32, height: u32) {
        unsafe { HasContext::viewport(self, 0, 0, width as i32, height as i32) }
    }

    fn draw_triangle_strip(&self, count: i32) {
        unsafe { self.draw_arrays(glow::TRIANGLE_STRIP, 0, count) }
    }
}
