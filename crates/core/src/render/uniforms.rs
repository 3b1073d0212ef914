//! Uniform names shared with the render shader, and their resolved locations.

use super::backend::GpuBackend;
use crate::error::{Resource, TracerError};

pub const RESOLUTION: &str = "resolution";
pub const FOV_TANGENT: &str = "fovTangent";
pub const CAMERA_POSITION: &str = "cameraPosition";
pub const VIEW_BASIS: &str = "viewBasis";
pub const FRAME_COUNTER: &str = "frameCounter";

/// Every uniform the render program must expose, in resolution order.
pub const RENDER_UNIFORMS: [&str; 5] = [
    RESOLUTION,
    FOV_TANGENT,
    CAMERA_POSITION,
    VIEW_BASIS,
    FRAME_COUNTER,
];

/// Render-program uniform locations, resolved once at build time.
#[derive(Debug, Clone)]
pub struct UniformBindings<L> {
    pub resolution: L,
    pub fov_tangent: L,
    pub camera_position: L,
    pub view_basis: L,
    pub frame_counter: L,
}

impl<L: Clone> UniformBindings<L> {
    /// Looks up every name in [`RENDER_UNIFORMS`] on `program`.
    ///
    /// # Errors
    ///
    /// `ResourceCreation(Uniform(name))` for the first name with no location.
    /// A driver drops uniforms the shader never reads, so this also catches
    /// a shader that ignores one of its inputs.
    pub fn resolve<G>(gl: &G, program: G::Program) -> Result<Self, TracerError>
    where
        G: GpuBackend<UniformLocation = L>,
    {
        let find = |name: &'static str| {
            gl.uniform_location(program, name)
                .ok_or(TracerError::ResourceCreation(Resource::Uniform(name)))
        };
        Ok(Self {
            resolution: find(RESOLUTION)?,
            fov_tangent: find(FOV_TANGENT)?,
            camera_position: find(CAMERA_POSITION)?,
            view_basis: find(VIEW_BASIS)?,
            frame_counter: find(FRAME_COUNTER)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessGpu;
    use crate::render::quad::{ACCUMULATE_FRAGMENT_SHADER, QUAD_VERTEX_SHADER};
    use crate::render::shader::{compile_shader, link_program, ShaderKind};

    fn linked(gpu: &HeadlessGpu, fragment: &str) -> u32 {
        let vs = compile_shader(gpu, ShaderKind::Vertex, QUAD_VERTEX_SHADER).unwrap();
        let fs = compile_shader(gpu, ShaderKind::RenderFragment, fragment).unwrap();
        link_program(gpu, &[vs, fs]).unwrap()
    }

    #[test]
    fn resolves_all_locations_from_accumulate_shader() {
        let gpu = HeadlessGpu::new();
        let program = linked(&gpu, ACCUMULATE_FRAGMENT_SHADER);
        let bindings = UniformBindings::resolve(&gpu, program).unwrap();
        assert_eq!(bindings.resolution.name, RESOLUTION);
        assert_eq!(bindings.fov_tangent.name, FOV_TANGENT);
        assert_eq!(bindings.camera_position.name, CAMERA_POSITION);
        assert_eq!(bindings.view_basis.name, VIEW_BASIS);
        assert_eq!(bindings.frame_counter.name, FRAME_COUNTER);
    }

    #[test]
    fn missing_uniform_is_named_in_error() {
        let gpu = HeadlessGpu::new();
        let fragment = ACCUMULATE_FRAGMENT_SHADER.replace("uniform mat3 viewBasis;", "");
        let program = linked(&gpu, &fragment);
        let err = UniformBindings::resolve(&gpu, program).unwrap_err();
        assert_eq!(err, TracerError::ResourceCreation(Resource::Uniform(VIEW_BASIS)));
    }

    #[test]
    fn renamed_uniform_breaks_the_contract() {
        let gpu = HeadlessGpu::new();
        let fragment = ACCUMULATE_FRAGMENT_SHADER.replace("uniform uint frameCounter;", "uniform uint uTime;");
        let program = linked(&gpu, &fragment);
        let err = UniformBindings::resolve(&gpu, program).unwrap_err();
        assert!(err.to_string().contains(FRAME_COUNTER), "got: {err}");
    }
}
