//! A recording [`GpuBackend`] with no GPU behind it.
//!
//! `HeadlessGpu` hands out integer handles, journals every command, tracks
//! which objects are alive, and snapshots the bound state at each draw call.
//! Creation and link failures can be injected. It backs the engine tests and
//! the CLI's dry-run mode.
//!
//! Shader "compilation" is structural: a source compiles if it defines
//! `void main`. A uniform resolves if one of the program's sources declares
//! it on a `uniform` line.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::backend::{GpuBackend, ShaderStage, UniformValue};
use super::engine::DrawingSurface;
use super::texture::TextureConfig;

/// GL status for an attachment that is missing or unallocated.
pub const STATUS_INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;
/// GL status for a framebuffer with nothing attached.
pub const STATUS_MISSING_ATTACHMENT: u32 = 0x8CD7;
/// GL status for an attachment combination the driver does not support.
pub const STATUS_UNSUPPORTED: u32 = 0x8CDD;

const COMPILE_LOG: &str = "ERROR: 0:1: 'main' : function not defined\n";
const STAGE_LOG: &str = "ERROR: program requires exactly one vertex and one fragment shader\n";

/// Kind of a live GPU object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Shader,
    Program,
    Buffer,
    VertexArray,
    Texture,
    Framebuffer,
}

/// Uniform location handed out by [`HeadlessGpu`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessUniform {
    pub program: u32,
    pub name: String,
}

/// State captured at a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub program: Option<u32>,
    /// Bound framebuffer; `None` is the default surface.
    pub framebuffer: Option<u32>,
    /// Color attachment 0 of the bound framebuffer, if any.
    pub color_attachment: Option<u32>,
    /// Texture bound for sampling on unit 0.
    pub sampled: Option<u32>,
    pub count: i32,
}

/// One journaled command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create(ObjectKind, u32),
    Delete(ObjectKind, u32),
    CompileShader { shader: u32, stage: ShaderStage, ok: bool },
    BindAttributeLocation { program: u32, location: u32, name: String },
    LinkProgram { program: u32, shaders: Vec<u32>, ok: bool },
    UseProgram(Option<u32>),
    SetUniform { name: String, value: UniformValue },
    UploadVertices { buffer: u32, vertices: Vec<f32> },
    ConfigureAttribute { vertex_array: u32, buffer: u32, location: u32, components: i32 },
    BindVertexArray(Option<u32>),
    AllocateTexture { texture: u32, config: TextureConfig },
    BindSampledTexture { unit: u32, texture: Option<u32> },
    BindFramebuffer(Option<u32>),
    AttachColor { framebuffer: u32, texture: u32 },
    Viewport { width: u32, height: u32 },
    Draw(DrawCall),
}

#[derive(Debug, Default)]
struct Journal {
    next_id: u32,
    commands: Vec<Command>,
    live: BTreeMap<u32, ObjectKind>,
    created: HashMap<ObjectKind, usize>,
    /// Remaining successful creations per kind before creation starts failing.
    creation_budget: HashMap<ObjectKind, usize>,
    shaders: HashMap<u32, (ShaderStage, String, bool)>,
    linked_sources: HashMap<u32, Vec<String>>,
    allocated: HashMap<u32, TextureConfig>,
    attachments: HashMap<u32, u32>,
    sampled: HashMap<u32, u32>,
    program: Option<u32>,
    framebuffer: Option<u32>,
    link_failure: Option<String>,
    framebuffer_failure: Option<u32>,
    uniform_lookups: Vec<String>,
    suppress_info_log: bool,
}

impl Journal {
    fn create(&mut self, kind: ObjectKind) -> Option<u32> {
        if let Some(budget) = self.creation_budget.get_mut(&kind) {
            if *budget == 0 {
                return None;
            }
            *budget -= 1;
        }
        self.next_id += 1;
        let id = self.next_id;
        self.live.insert(id, kind);
        *self.created.entry(kind).or_default() += 1;
        self.commands.push(Command::Create(kind, id));
        Some(id)
    }

    fn delete(&mut self, kind: ObjectKind, id: u32) {
        if self.live.get(&id) == Some(&kind) {
            self.live.remove(&id);
        }
        self.commands.push(Command::Delete(kind, id));
    }
}

/// Recording backend. Clones share one journal, so a test can keep a clone
/// and inspect what an engine that owns the other clone did.
#[derive(Debug, Clone, Default)]
pub struct HeadlessGpu {
    journal: Rc<RefCell<Journal>>,
}

impl HeadlessGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every creation of `kind` from now on returns an absent handle.
    pub fn fail_creation(&self, kind: ObjectKind) {
        self.fail_creation_after(kind, 0);
    }

    /// Lets `successes` more creations of `kind` through, then fails the rest.
    pub fn fail_creation_after(&self, kind: ObjectKind, successes: usize) {
        self.journal
            .borrow_mut()
            .creation_budget
            .insert(kind, successes);
    }

    /// Every link from now on fails with `log` as the driver info log.
    pub fn fail_link(&self, log: &str) {
        self.journal.borrow_mut().link_failure = Some(log.to_string());
    }

    /// Every completeness check from now on reports `status`.
    pub fn fail_framebuffer_status(&self, status: u32) {
        self.journal.borrow_mut().framebuffer_failure = Some(status);
    }

    /// Names passed to `uniform_location`, in order.
    pub fn uniform_lookups(&self) -> Vec<String> {
        self.journal.borrow().uniform_lookups.clone()
    }

    /// Makes compile and link failures report an empty info log.
    pub fn suppress_info_log(&self) {
        self.journal.borrow_mut().suppress_info_log = true;
    }

    /// All commands journaled so far.
    pub fn commands(&self) -> Vec<Command> {
        self.journal.borrow().commands.clone()
    }

    /// Forgets the journaled commands; object and binding state is kept.
    pub fn clear_commands(&self) {
        self.journal.borrow_mut().commands.clear();
    }

    /// Draw calls journaled so far, in order.
    pub fn draws(&self) -> Vec<DrawCall> {
        self.journal
            .borrow()
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::Draw(call) => Some(*call),
                _ => None,
            })
            .collect()
    }

    /// Values written to the uniform called `name`, in order.
    pub fn uniform_writes(&self, name: &str) -> Vec<UniformValue> {
        self.journal
            .borrow()
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::SetUniform { name: n, value } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Objects created and not yet deleted.
    pub fn live_objects(&self) -> Vec<(u32, ObjectKind)> {
        self.journal
            .borrow()
            .live
            .iter()
            .map(|(&id, &kind)| (id, kind))
            .collect()
    }

    pub fn live_count(&self, kind: ObjectKind) -> usize {
        self.journal
            .borrow()
            .live
            .values()
            .filter(|&&k| k == kind)
            .count()
    }

    /// Number of objects of `kind` ever created.
    pub fn created_count(&self, kind: ObjectKind) -> usize {
        self.journal
            .borrow()
            .created
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, command: Command) {
        self.journal.borrow_mut().commands.push(command);
    }
}

fn declares_uniform(source: &str, name: &str) -> bool {
    source.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("uniform")
            && line
                .split(|c: char| c.is_whitespace() || c == ';' || c == ',' || c == '[')
                .any(|token| token == name)
    })
}

impl GpuBackend for HeadlessGpu {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type Texture = u32;
    type Framebuffer = u32;
    type UniformLocation = HeadlessUniform;

    fn create_shader(&self, stage: ShaderStage) -> Option<u32> {
        let mut journal = self.journal.borrow_mut();
        let id = journal.create(ObjectKind::Shader)?;
        journal.shaders.insert(id, (stage, String::new(), false));
        Some(id)
    }

    fn compile_shader(&self, shader: u32, source: &str) -> bool {
        let mut journal = self.journal.borrow_mut();
        let ok = source.contains("void main");
        let stage = match journal.shaders.get_mut(&shader) {
            Some(entry) => {
                *entry = (entry.0, source.to_string(), ok);
                entry.0
            }
            None => return false,
        };
        journal
            .commands
            .push(Command::CompileShader { shader, stage, ok });
        ok
    }

    fn shader_info_log(&self, shader: u32) -> String {
        let journal = self.journal.borrow();
        match journal.shaders.get(&shader) {
            Some((_, _, false)) if !journal.suppress_info_log => COMPILE_LOG.to_string(),
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: u32) {
        let mut journal = self.journal.borrow_mut();
        journal.shaders.remove(&shader);
        journal.delete(ObjectKind::Shader, shader);
    }

    fn create_program(&self) -> Option<u32> {
        self.journal.borrow_mut().create(ObjectKind::Program)
    }

    fn bind_attribute_location(&self, program: u32, location: u32, name: &str) {
        self.record(Command::BindAttributeLocation {
            program,
            location,
            name: name.to_string(),
        });
    }

    fn link_program(&self, program: u32, shaders: &[u32]) -> bool {
        let mut journal = self.journal.borrow_mut();
        let stages: Vec<_> = shaders
            .iter()
            .filter_map(|id| journal.shaders.get(id))
            .filter(|(_, _, compiled)| *compiled)
            .map(|(stage, source, _)| (*stage, source.clone()))
            .collect();
        let vertex = stages.iter().filter(|(s, _)| *s == ShaderStage::Vertex).count();
        let fragment = stages.iter().filter(|(s, _)| *s == ShaderStage::Fragment).count();
        let ok = journal.link_failure.is_none()
            && stages.len() == shaders.len()
            && vertex == 1
            && fragment == 1;
        if ok {
            let sources = stages.into_iter().map(|(_, source)| source).collect();
            journal.linked_sources.insert(program, sources);
        }
        journal.commands.push(Command::LinkProgram {
            program,
            shaders: shaders.to_vec(),
            ok,
        });
        ok
    }

    fn program_info_log(&self, program: u32) -> String {
        let journal = self.journal.borrow();
        if journal.suppress_info_log || journal.linked_sources.contains_key(&program) {
            return String::new();
        }
        journal
            .link_failure
            .clone()
            .unwrap_or_else(|| STAGE_LOG.to_string())
    }

    fn delete_program(&self, program: u32) {
        let mut journal = self.journal.borrow_mut();
        journal.linked_sources.remove(&program);
        journal.delete(ObjectKind::Program, program);
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<HeadlessUniform> {
        let mut journal = self.journal.borrow_mut();
        journal.uniform_lookups.push(name.to_string());
        let sources = journal.linked_sources.get(&program)?;
        sources
            .iter()
            .any(|source| declares_uniform(source, name))
            .then(|| HeadlessUniform {
                program,
                name: name.to_string(),
            })
    }

    fn use_program(&self, program: Option<u32>) {
        let mut journal = self.journal.borrow_mut();
        journal.program = program;
        journal.commands.push(Command::UseProgram(program));
    }

    fn set_uniform(&self, location: &HeadlessUniform, value: UniformValue) {
        self.record(Command::SetUniform {
            name: location.name.clone(),
            value,
        });
    }

    fn create_buffer(&self) -> Option<u32> {
        self.journal.borrow_mut().create(ObjectKind::Buffer)
    }

    fn upload_vertices(&self, buffer: u32, vertices: &[f32]) {
        self.record(Command::UploadVertices {
            buffer,
            vertices: vertices.to_vec(),
        });
    }

    fn delete_buffer(&self, buffer: u32) {
        self.journal.borrow_mut().delete(ObjectKind::Buffer, buffer);
    }

    fn create_vertex_array(&self) -> Option<u32> {
        self.journal.borrow_mut().create(ObjectKind::VertexArray)
    }

    fn configure_float_attribute(
        &self,
        vertex_array: u32,
        buffer: u32,
        location: u32,
        components: i32,
    ) {
        self.record(Command::ConfigureAttribute {
            vertex_array,
            buffer,
            location,
            components,
        });
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record(Command::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        self.journal
            .borrow_mut()
            .delete(ObjectKind::VertexArray, vertex_array);
    }

    fn create_texture(&self) -> Option<u32> {
        self.journal.borrow_mut().create(ObjectKind::Texture)
    }

    fn allocate_texture(&self, texture: u32, config: &TextureConfig) {
        let mut journal = self.journal.borrow_mut();
        journal.allocated.insert(texture, *config);
        journal.commands.push(Command::AllocateTexture {
            texture,
            config: *config,
        });
    }

    fn bind_sampled_texture(&self, unit: u32, texture: Option<u32>) {
        let mut journal = self.journal.borrow_mut();
        match texture {
            Some(t) => journal.sampled.insert(unit, t),
            None => journal.sampled.remove(&unit),
        };
        journal
            .commands
            .push(Command::BindSampledTexture { unit, texture });
    }

    fn delete_texture(&self, texture: u32) {
        let mut journal = self.journal.borrow_mut();
        journal.allocated.remove(&texture);
        journal.delete(ObjectKind::Texture, texture);
    }

    fn create_framebuffer(&self) -> Option<u32> {
        self.journal.borrow_mut().create(ObjectKind::Framebuffer)
    }

    fn bind_framebuffer(&self, framebuffer: Option<u32>) {
        let mut journal = self.journal.borrow_mut();
        journal.framebuffer = framebuffer;
        journal.commands.push(Command::BindFramebuffer(framebuffer));
    }

    fn attach_color_texture(&self, texture: u32) {
        let mut journal = self.journal.borrow_mut();
        // Attaching with the default surface bound is a GL error; nothing changes.
        if let Some(framebuffer) = journal.framebuffer {
            journal.attachments.insert(framebuffer, texture);
            journal.commands.push(Command::AttachColor {
                framebuffer,
                texture,
            });
        }
    }

    fn framebuffer_status(&self) -> Result<(), u32> {
        let journal = self.journal.borrow();
        let Some(framebuffer) = journal.framebuffer else {
            return Ok(());
        };
        if let Some(status) = journal.framebuffer_failure {
            return Err(status);
        }
        match journal.attachments.get(&framebuffer) {
            None => Err(STATUS_MISSING_ATTACHMENT),
            Some(texture) if !journal.allocated.contains_key(texture) => {
                Err(STATUS_INCOMPLETE_ATTACHMENT)
            }
            Some(_) => Ok(()),
        }
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        let mut journal = self.journal.borrow_mut();
        journal.attachments.remove(&framebuffer);
        if journal.framebuffer == Some(framebuffer) {
            journal.framebuffer = None;
        }
        journal.delete(ObjectKind::Framebuffer, framebuffer);
    }

    fn viewport(&self, width: u32, height: u32) {
        self.record(Command::Viewport { width, height });
    }

    fn draw_triangle_strip(&self, count: i32) {
        let mut journal = self.journal.borrow_mut();
        let call = DrawCall {
            program: journal.program,
            framebuffer: journal.framebuffer,
            color_attachment: journal
                .framebuffer
                .and_then(|fb| journal.attachments.get(&fb).copied()),
            sampled: journal.sampled.get(&0).copied(),
            count,
        };
        journal.commands.push(Command::Draw(call));
    }
}

/// A fixed-size drawing surface backed by a [`HeadlessGpu`].
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    gpu: HeadlessGpu,
    context_available: bool,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_gpu(width, height, HeadlessGpu::new())
    }

    /// A surface whose context is the given (shared) recorder.
    pub fn with_gpu(width: u32, height: u32, gpu: HeadlessGpu) -> Self {
        Self {
            width,
            height,
            gpu,
            context_available: true,
        }
    }

    /// A surface that refuses to hand out a context.
    pub fn without_context(width: u32, height: u32) -> Self {
        Self {
            context_available: false,
            ..Self::new(width, height)
        }
    }

    /// The recorder this surface hands out.
    pub fn gpu(&self) -> &HeadlessGpu {
        &self.gpu
    }
}

impl DrawingSurface for HeadlessSurface {
    type Backend = HeadlessGpu;

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_context(&self) -> Option<HeadlessGpu> {
        self.context_available.then(|| self.gpu.clone())
    }
}
