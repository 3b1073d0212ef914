//! Shader compilation and program linking.
//!
//! Compiles shader source text into linked programs and fails fast with
//! typed errors. Every object created on a failure path is deleted before
//! the error propagates.

use std::fmt;

use super::backend::{GpuBackend, ShaderStage};
use super::quad::POSITION_ATTRIBUTE;
use crate::error::{Resource, TracerError};

/// Reported when a shader fails to compile and the driver gives no log.
pub const NO_SHADER_LOG: &str = "no shader info log available";
/// Reported when a program fails to link and the driver gives no log.
pub const NO_PROGRAM_LOG: &str = "no program info log available";

/// The three shader texts the engine is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    /// Shared by both programs.
    pub vertex: String,
    /// Accumulation pass, rendered into the swapchain.
    pub render_fragment: String,
    /// Display pass, rendered to the surface.
    pub post_fragment: String,
}

/// Which of the three shader texts a shader object is compiled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    RenderFragment,
    PostFragment,
}

impl ShaderKind {
    pub fn stage(self) -> ShaderStage {
        match self {
            ShaderKind::Vertex => ShaderStage::Vertex,
            ShaderKind::RenderFragment | ShaderKind::PostFragment => ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vertex => write!(f, "vertex"),
            ShaderKind::RenderFragment => write!(f, "render fragment"),
            ShaderKind::PostFragment => write!(f, "post fragment"),
        }
    }
}

/// Line numbers referenced by a driver log in the common
/// `ERROR: <source>:<line>: ...` form.
fn referenced_lines(log: &str) -> Vec<usize> {
    log.lines()
        .filter_map(|line| {
            let mut parts = line.split(':').map(str::trim);
            parts.find(|p| p.parse::<usize>().is_ok())?;
            parts.next()?.parse().ok()
        })
        .collect()
}

/// Numbers each source line and marks the ones the driver log points at
/// with `>`, then appends the log.
pub fn annotate_source(source: &str, log: &str) -> String {
    let marked = referenced_lines(log);
    let lines: Vec<&str> = source.lines().collect();
    let width = lines.len().max(1).to_string().len();

    let mut out: String = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let n = i + 1;
            let mark = if marked.contains(&n) { '>' } else { ' ' };
            format!("{mark}{n:>width$}: {line}\n")
        })
        .collect();
    if !log.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(log);
    }
    out
}

/// Compiles one of the shader texts at its stage.
///
/// # Errors
///
/// `ResourceCreation(Shader(kind))` if no shader object could be created,
/// `ShaderCompile` carrying the driver log if compilation fails.
pub fn compile_shader<G: GpuBackend>(
    gl: &G,
    kind: ShaderKind,
    source: &str,
) -> Result<G::Shader, TracerError> {
    let shader = gl
        .create_shader(kind.stage())
        .ok_or(TracerError::ResourceCreation(Resource::Shader(kind)))?;

    if gl.compile_shader(shader, source) {
        log::debug!("compiled {kind} shader {shader:?}");
        return Ok(shader);
    }

    let driver_log = gl.shader_info_log(shader);
    gl.delete_shader(shader);
    log::error!(
        "{kind} shader failed to compile:\n{}",
        annotate_source(source, &driver_log)
    );
    let log = if driver_log.trim().is_empty() {
        NO_SHADER_LOG.to_string()
    } else {
        driver_log
    };
    Err(TracerError::ShaderCompile { kind, log })
}

/// Links compiled shaders into a program.
///
/// The quad position attribute is bound to its fixed location first so every
/// program built here agrees with the one vertex array.
///
/// # Errors
///
/// `ResourceCreation(Program)` if no program object could be created,
/// `ProgramLink` carrying the driver log if linking fails.
pub fn link_program<G: GpuBackend>(
    gl: &G,
    shaders: &[G::Shader],
) -> Result<G::Program, TracerError> {
    let program = gl
        .create_program()
        .ok_or(TracerError::ResourceCreation(Resource::Program))?;

    gl.bind_attribute_location(program, POSITION_ATTRIBUTE.0, POSITION_ATTRIBUTE.1);
    if gl.link_program(program, shaders) {
        log::debug!("linked program {program:?}");
        return Ok(program);
    }

    let driver_log = gl.program_info_log(program);
    gl.delete_program(program);
    log::error!("program failed to link:\n{driver_log}");
    if driver_log.trim().is_empty() {
        Err(TracerError::ProgramLink(NO_PROGRAM_LOG.to_string()))
    } else {
        Err(TracerError::ProgramLink(driver_log))
    }
}

/// The render (accumulation) and post (display) programs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramPair<P> {
    pub render: P,
    pub post: P,
}

impl<P: Copy> ProgramPair<P> {
    /// Compiles all three stages and links both programs.
    ///
    /// The vertex shader is compiled once and linked into both programs.
    /// Shader objects are deleted before returning, on every path.
    ///
    /// # Errors
    ///
    /// The first compile, link, or creation error encountered.
    pub fn build<G>(gl: &G, sources: &ShaderSources) -> Result<Self, TracerError>
    where
        G: GpuBackend<Program = P>,
    {
        let mut shaders = Vec::with_capacity(3);
        let result = Self::compile_and_link(gl, sources, &mut shaders);
        for shader in shaders {
            gl.delete_shader(shader);
        }
        result
    }

    fn compile_and_link<G>(
        gl: &G,
        sources: &ShaderSources,
        shaders: &mut Vec<G::Shader>,
    ) -> Result<Self, TracerError>
    where
        G: GpuBackend<Program = P>,
    {
        let vertex = compile_shader(gl, ShaderKind::Vertex, &sources.vertex)?;
        shaders.push(vertex);
        let render_fragment =
            compile_shader(gl, ShaderKind::RenderFragment, &sources.render_fragment)?;
        shaders.push(render_fragment);
        let post_fragment = compile_shader(gl, ShaderKind::PostFragment, &sources.post_fragment)?;
        shaders.push(post_fragment);

        let render = link_program(gl, &[vertex, render_fragment])?;
        let post = match link_program(gl, &[vertex, post_fragment]) {
            Ok(post) => post,
            Err(e) => {
                gl.delete_program(render);
                return Err(e);
            }
        };
        Ok(Self { render, post })
    }

    /// Deletes both programs.
    pub fn release<G>(&self, gl: &G)
    where
        G: GpuBackend<Program = P>,
    {
        gl.delete_program(self.render);
        gl.delete_program(self.post);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::render::headless::{Command, HeadlessGpu, ObjectKind};
    use crate::render::quad::{
        ACCUMULATE_FRAGMENT_SHADER, DISPLAY_FRAGMENT_SHADER, QUAD_VERTEX_SHADER,
    };

    fn passthrough() -> ShaderSources {
        ShaderSources {
            vertex: QUAD_VERTEX_SHADER.to_string(),
            render_fragment: ACCUMULATE_FRAGMENT_SHADER.to_string(),
            post_fragment: DISPLAY_FRAGMENT_SHADER.to_string(),
        }
    }

    // --- annotate_source ---

    #[test]
    fn annotate_source_numbers_lines_and_appends_log() {
        let out = annotate_source("#version 300 es\nvoid main() {\n}", "ERROR: 0:2: syntax error");
        assert!(out.contains(" 1: #version 300 es"), "got:\n{out}");
        assert!(out.contains(">2: void main() {"), "line 2 should be marked, got:\n{out}");
        assert!(out.contains(" 3: }"), "got:\n{out}");
        assert!(out.ends_with("ERROR: 0:2: syntax error"), "got:\n{out}");
    }

    #[test]
    fn annotate_source_right_aligns_line_numbers() {
        let source = (1..=12)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let out = annotate_source(&source, "");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "  1: line 1");
        assert_eq!(lines[9], " 10: line 10");
    }

    #[test]
    fn annotate_source_handles_empty_inputs() {
        assert!(annotate_source("", "").is_empty());
        assert_eq!(annotate_source("", "oops"), "oops");
    }

    #[test]
    fn referenced_lines_parses_driver_format() {
        let log = "ERROR: 0:7: 'x' : undeclared identifier\nERROR: 0:12: syntax error\n";
        assert_eq!(referenced_lines(log), vec![7, 12]);
        assert!(referenced_lines("link failed").is_empty());
    }

    // --- compile_shader ---

    #[test]
    fn compile_shader_returns_handle_for_valid_source() {
        let gpu = HeadlessGpu::new();
        let shader = compile_shader(&gpu, ShaderKind::Vertex, QUAD_VERTEX_SHADER);
        assert!(shader.is_ok());
        assert_eq!(gpu.live_count(ObjectKind::Shader), 1);
    }

    #[test]
    fn compile_error_carries_driver_log_and_releases_shader() {
        let gpu = HeadlessGpu::new();
        let err = compile_shader(&gpu, ShaderKind::RenderFragment, "not glsl at all").unwrap_err();
        match err {
            TracerError::ShaderCompile { kind, log } => {
                assert_eq!(kind, ShaderKind::RenderFragment);
                assert_eq!(log, gpu_log_for_invalid_source());
            }
            other => panic!("expected ShaderCompile, got {other:?}"),
        }
        assert_eq!(gpu.live_count(ObjectKind::Shader), 0, "shader leaked");
    }

    fn gpu_log_for_invalid_source() -> String {
        let gpu = HeadlessGpu::new();
        let shader = gpu.create_shader(ShaderStage::Fragment).unwrap();
        gpu.compile_shader(shader, "not glsl at all");
        gpu.shader_info_log(shader)
    }

    #[test]
    fn compile_error_without_driver_log_uses_fallback() {
        let gpu = HeadlessGpu::new();
        gpu.suppress_info_log();
        let err = compile_shader(&gpu, ShaderKind::Vertex, "garbage").unwrap_err();
        assert_eq!(
            err,
            TracerError::ShaderCompile {
                kind: ShaderKind::Vertex,
                log: NO_SHADER_LOG.to_string(),
            }
        );
    }

    #[test]
    fn absent_shader_handle_is_resource_error() {
        let gpu = HeadlessGpu::new();
        gpu.fail_creation(ObjectKind::Shader);
        let err = compile_shader(&gpu, ShaderKind::Vertex, QUAD_VERTEX_SHADER).unwrap_err();
        assert_eq!(
            err,
            TracerError::ResourceCreation(Resource::Shader(ShaderKind::Vertex))
        );
    }

    #[test]
    fn fragment_kinds_share_the_fragment_stage() {
        assert_eq!(ShaderKind::Vertex.stage(), ShaderStage::Vertex);
        assert_eq!(ShaderKind::RenderFragment.stage(), ShaderStage::Fragment);
        assert_eq!(ShaderKind::PostFragment.stage(), ShaderStage::Fragment);
        assert_eq!(ShaderKind::RenderFragment.to_string(), "render fragment");
    }

    #[test]
    fn program_pair_names_rejected_render_fragment() {
        let gpu = HeadlessGpu::new();
        let mut sources = passthrough();
        sources.render_fragment = "broken".into();
        let err = ProgramPair::build(&gpu, &sources).unwrap_err();
        assert!(
            err.to_string().starts_with("render fragment shader failed to compile"),
            "got: {err}"
        );
    }

    // --- link_program ---

    #[test]
    fn link_binds_position_attribute_before_linking() {
        let gpu = HeadlessGpu::new();
        let vs = compile_shader(&gpu, ShaderKind::Vertex, QUAD_VERTEX_SHADER).unwrap();
        let fs = compile_shader(&gpu, ShaderKind::PostFragment, DISPLAY_FRAGMENT_SHADER).unwrap();
        let program = link_program(&gpu, &[vs, fs]).unwrap();

        let commands = gpu.commands();
        let bind = commands
            .iter()
            .position(|c| {
                *c == Command::BindAttributeLocation {
                    program,
                    location: POSITION_ATTRIBUTE.0,
                    name: POSITION_ATTRIBUTE.1.to_string(),
                }
            })
            .expect("attribute binding recorded");
        let link = commands
            .iter()
            .position(|c| matches!(c, Command::LinkProgram { ok: true, .. }))
            .expect("link recorded");
        assert!(bind < link);
    }

    #[test]
    fn link_error_carries_driver_log_and_releases_program() {
        let gpu = HeadlessGpu::new();
        let vs = compile_shader(&gpu, ShaderKind::Vertex, QUAD_VERTEX_SHADER).unwrap();
        let fs = compile_shader(&gpu, ShaderKind::PostFragment, DISPLAY_FRAGMENT_SHADER).unwrap();
        gpu.fail_link("varying v_uv mismatch");

        let err = link_program(&gpu, &[vs, fs]).unwrap_err();
        assert_eq!(err, TracerError::ProgramLink("varying v_uv mismatch".into()));
        assert_eq!(gpu.live_count(ObjectKind::Program), 0, "program leaked");
    }

    #[test]
    fn link_error_without_driver_log_uses_fallback() {
        let gpu = HeadlessGpu::new();
        let vs = compile_shader(&gpu, ShaderKind::Vertex, QUAD_VERTEX_SHADER).unwrap();
        let fs = compile_shader(&gpu, ShaderKind::PostFragment, DISPLAY_FRAGMENT_SHADER).unwrap();
        gpu.fail_link("");
        let err = link_program(&gpu, &[vs, fs]).unwrap_err();
        assert_eq!(err, TracerError::ProgramLink(NO_PROGRAM_LOG.into()));
    }

    // --- ProgramPair ---

    #[test]
    fn program_pair_shares_vertex_shader_and_frees_all_shaders() {
        let gpu = HeadlessGpu::new();
        let pair = ProgramPair::build(&gpu, &passthrough()).unwrap();
        assert_ne!(pair.render, pair.post);
        assert_eq!(gpu.created_count(ObjectKind::Shader), 3);
        assert_eq!(gpu.live_count(ObjectKind::Shader), 0);
        assert_eq!(gpu.live_count(ObjectKind::Program), 2);

        pair.release(&gpu);
        assert_eq!(gpu.live_count(ObjectKind::Program), 0);
    }

    #[test]
    fn program_pair_compile_failure_leaves_nothing_alive() {
        let gpu = HeadlessGpu::new();
        let mut sources = passthrough();
        sources.post_fragment = "broken".into();
        let err = ProgramPair::build(&gpu, &sources).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShaderCompile);
        assert!(matches!(
            err,
            TracerError::ShaderCompile {
                kind: ShaderKind::PostFragment,
                ..
            }
        ));
        assert!(gpu.live_objects().is_empty(), "leaked: {:?}", gpu.live_objects());
        assert_eq!(gpu.created_count(ObjectKind::Program), 0);
    }

    #[test]
    fn program_pair_second_program_failure_releases_first() {
        let gpu = HeadlessGpu::new();
        gpu.fail_creation_after(ObjectKind::Program, 1);
        let err = ProgramPair::build(&gpu, &passthrough()).unwrap_err();
        assert_eq!(err, TracerError::ResourceCreation(Resource::Program));
        assert!(gpu.live_objects().is_empty(), "leaked: {:?}", gpu.live_objects());
    }
}
