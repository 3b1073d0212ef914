//! Full-screen quad geometry and the pass-through shader set.
//!
//! Both passes draw the same four-vertex triangle strip spanning normalized
//! device coordinates, so the fragment stage runs once per pixel.

use super::backend::GpuBackend;
use crate::error::{Resource, TracerError};

/// Location and name of the vertex position attribute.
pub const POSITION_ATTRIBUTE: (u32, &str) = (0, "pos");

/// Corners of the normalized device rectangle in triangle-strip order.
pub const QUAD_VERTICES: [f32; 8] = [
    -1.0, -1.0, //
    1.0, -1.0, //
    -1.0, 1.0, //
    1.0, 1.0,
];

/// Vertices per draw.
pub const QUAD_VERTEX_COUNT: i32 = 4;

/// GLSL ES 3.0 vertex shader for the quad. Emits `v_uv` in [0, 1].
pub const QUAD_VERTEX_SHADER: &str = r#"#version 300 es
in vec2 pos;
out vec2 v_uv;
void main() {
    v_uv = pos * 0.5 + 0.5;
    gl_Position = vec4(pos, 0.0, 1.0);
}
"#;

/// Minimal accumulation pass: casts one ray per pixel from the camera at a
/// unit sphere on the origin, shades hits by normal and misses by direction,
/// and blends into the previous frame with weight `1 / (frameCounter + 1)`.
pub const ACCUMULATE_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;
uniform vec2 resolution;
uniform float fovTangent;
uniform vec3 cameraPosition;
uniform mat3 viewBasis;
uniform uint frameCounter;
uniform sampler2D previousFrame;
in vec2 v_uv;
out vec4 color;
void main() {
    vec2 ndc = (2.0 * gl_FragCoord.xy - resolution) / resolution.y;
    vec3 direction = normalize(viewBasis * vec3(ndc * fovTangent, -1.0));
    vec3 shade = 0.5 + 0.5 * direction;
    float b = dot(cameraPosition, direction);
    float h = b * b - dot(cameraPosition, cameraPosition) + 1.0;
    if (h > 0.0) {
        float t = -b - sqrt(h);
        if (t > 0.0) {
            shade = 0.5 + 0.5 * normalize(cameraPosition + t * direction);
        }
    }
    vec3 previous = texture(previousFrame, v_uv).rgb;
    float weight = 1.0 / float(frameCounter + 1u);
    color = vec4(mix(previous, shade, weight), 1.0);
}
"#;

/// Display pass: copies the accumulated texture to the surface.
pub const DISPLAY_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;
uniform sampler2D accumulated;
in vec2 v_uv;
out vec4 color;
void main() {
    color = texture(accumulated, v_uv);
}
"#;

/// The quad's vertex buffer and vertex array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullscreenQuad<B, V> {
    buffer: B,
    vertex_array: V,
}

impl<B: Copy, V: Copy> FullscreenQuad<B, V> {
    /// Uploads [`QUAD_VERTICES`] and records them as attribute
    /// [`POSITION_ATTRIBUTE`] in a new vertex array.
    ///
    /// # Errors
    ///
    /// `ResourceCreation(VertexBuffer | VertexArray)` on an absent handle.
    /// A buffer created before a vertex-array failure is deleted.
    pub fn build<G>(gl: &G) -> Result<Self, TracerError>
    where
        G: GpuBackend<Buffer = B, VertexArray = V>,
    {
        let buffer = gl
            .create_buffer()
            .ok_or(TracerError::ResourceCreation(Resource::VertexBuffer))?;
        gl.upload_vertices(buffer, &QUAD_VERTICES);

        let Some(vertex_array) = gl.create_vertex_array() else {
            gl.delete_buffer(buffer);
            return Err(TracerError::ResourceCreation(Resource::VertexArray));
        };
        gl.configure_float_attribute(vertex_array, buffer, POSITION_ATTRIBUTE.0, 2);

        Ok(Self {
            buffer,
            vertex_array,
        })
    }

    pub fn vertex_array(&self) -> V {
        self.vertex_array
    }

    /// Binds the vertex array and draws the strip into whatever target is bound.
    pub fn draw<G>(&self, gl: &G)
    where
        G: GpuBackend<Buffer = B, VertexArray = V>,
    {
        gl.bind_vertex_array(Some(self.vertex_array));
        gl.draw_triangle_strip(QUAD_VERTEX_COUNT);
    }

    pub fn release<G>(&self, gl: &G)
    where
        G: GpuBackend<Buffer = B, VertexArray = V>,
    {
        gl.delete_vertex_array(self.vertex_array);
        gl.delete_buffer(self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::{Command, HeadlessGpu, ObjectKind};

    #[test]
    fn quad_vertices_span_ndc_rectangle() {
        let corners: Vec<(f32, f32)> = QUAD_VERTICES.chunks(2).map(|c| (c[0], c[1])).collect();
        assert_eq!(corners.len() as i32, QUAD_VERTEX_COUNT);
        for corner in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
            assert!(corners.contains(&corner), "missing corner {corner:?}");
        }
    }

    #[test]
    fn strip_order_forms_two_triangles_covering_the_rectangle() {
        // Triangles (0,1,2) and (1,2,3): the shared edge is the diagonal 1-2.
        let v: Vec<(f32, f32)> = QUAD_VERTICES.chunks(2).map(|c| (c[0], c[1])).collect();
        assert_eq!(v[1].0, -v[2].0);
        assert_eq!(v[1].1, -v[2].1);
    }

    #[test]
    fn vertex_shader_declares_position_attribute() {
        let decl = format!("in vec2 {};", POSITION_ATTRIBUTE.1);
        assert!(QUAD_VERTEX_SHADER.contains(&decl), "got:\n{QUAD_VERTEX_SHADER}");
        assert!(QUAD_VERTEX_SHADER.contains("#version 300 es"));
    }

    #[test]
    fn accumulate_shader_declares_every_engine_uniform() {
        for name in crate::render::uniforms::RENDER_UNIFORMS {
            assert!(
                ACCUMULATE_FRAGMENT_SHADER.contains(&format!(" {name};")),
                "accumulate shader does not declare {name}"
            );
        }
    }

    #[test]
    fn accumulate_shader_reads_every_engine_uniform() {
        let (_, body) = ACCUMULATE_FRAGMENT_SHADER
            .split_once("void main()")
            .unwrap();
        for name in crate::render::uniforms::RENDER_UNIFORMS {
            assert!(body.contains(name), "{name} is declared but never read");
        }
        assert!(!body.contains("0.0 *"), "uniform read is folded away");
    }

    #[test]
    fn build_uploads_vertices_and_configures_attribute() {
        let gpu = HeadlessGpu::new();
        let quad = FullscreenQuad::build(&gpu).unwrap();
        let commands = gpu.commands();
        assert!(commands.iter().any(|c| matches!(
            c,
            Command::UploadVertices { vertices, .. } if vertices.as_slice() == QUAD_VERTICES
        )));
        assert!(commands.contains(&Command::ConfigureAttribute {
            vertex_array: quad.vertex_array(),
            buffer: quad.buffer,
            location: 0,
            components: 2,
        }));
    }

    #[test]
    fn draw_issues_four_vertex_strip() {
        let gpu = HeadlessGpu::new();
        let quad = FullscreenQuad::build(&gpu).unwrap();
        quad.draw(&gpu);
        let draws = gpu.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].count, 4);
    }

    #[test]
    fn vertex_array_failure_releases_buffer() {
        let gpu = HeadlessGpu::new();
        gpu.fail_creation(ObjectKind::VertexArray);
        let err = FullscreenQuad::build(&gpu).unwrap_err();
        assert_eq!(err, TracerError::ResourceCreation(Resource::VertexArray));
        assert!(gpu.live_objects().is_empty());
    }

    #[test]
    fn release_deletes_both_objects() {
        let gpu = HeadlessGpu::new();
        let quad = FullscreenQuad::build(&gpu).unwrap();
        quad.release(&gpu);
        assert!(gpu.live_objects().is_empty());
    }
}
