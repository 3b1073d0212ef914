//! The render loop: the callbacks a host (browser, window, CLI) forwards.
//!
//! A host delivers the three shader texts as they finish loading, forwards
//! pointer moves, and calls [`RenderLoop::frame`] once per display refresh,
//! re-arming its scheduler while `frame` answers
//! [`FrameStatus::Continue`]. Everything runs on one thread.

use crate::config::TracerConfig;
use crate::error::TracerError;
use crate::input::EngineInputState;
use crate::render::engine::{DrawingSurface, PathTracerEngine};
use crate::render::shader::{ShaderKind, ShaderSources};

/// Shader texts received so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSources {
    vertex: Option<String>,
    render_fragment: Option<String>,
    post_fragment: Option<String>,
}

impl PendingSources {
    /// Stores (or replaces) one text.
    pub fn set(&mut self, kind: ShaderKind, text: String) {
        let slot = match kind {
            ShaderKind::Vertex => &mut self.vertex,
            ShaderKind::RenderFragment => &mut self.render_fragment,
            ShaderKind::PostFragment => &mut self.post_fragment,
        };
        *slot = Some(text);
    }

    /// Kinds not yet delivered.
    pub fn missing(&self) -> Vec<ShaderKind> {
        [
            (ShaderKind::Vertex, self.vertex.is_none()),
            (ShaderKind::RenderFragment, self.render_fragment.is_none()),
            (ShaderKind::PostFragment, self.post_fragment.is_none()),
        ]
        .into_iter()
        .filter_map(|(kind, missing)| missing.then_some(kind))
        .collect()
    }

    /// All three texts, once every one has arrived.
    pub fn complete(&self) -> Option<ShaderSources> {
        Some(ShaderSources {
            vertex: self.vertex.clone()?,
            render_fragment: self.render_fragment.clone()?,
            post_fragment: self.post_fragment.clone()?,
        })
    }
}

/// Whether the host should schedule another frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Stopped,
}

/// Owns the surface, the input state, and (once built) the engine.
pub struct RenderLoop<S: DrawingSurface> {
    surface: S,
    pending: PendingSources,
    engine: Option<PathTracerEngine<S::Backend>>,
    input: EngineInputState,
    running: bool,
    frames_drawn: u64,
}

impl<S: DrawingSurface> RenderLoop<S> {
    pub fn new(surface: S, config: &TracerConfig) -> Self {
        Self {
            surface,
            pending: PendingSources::default(),
            engine: None,
            input: EngineInputState::new(config),
            running: true,
            frames_drawn: 0,
        }
    }

    /// Accepts one shader text. When all three are present and no engine
    /// exists yet, builds the engine. Returns whether an engine is ready.
    ///
    /// A text delivered while an engine exists replaces the stored one and
    /// takes effect at the next [`rebuild`](Self::rebuild).
    ///
    /// # Errors
    ///
    /// The construction error when the build fails. The loop stays without
    /// an engine; delivering a corrected text tries again.
    pub fn deliver(&mut self, kind: ShaderKind, text: String) -> Result<bool, TracerError> {
        self.pending.set(kind, text);
        if self.engine.is_some() {
            log::warn!("{kind} shader delivered after the engine was built; used on rebuild");
            return Ok(true);
        }
        self.rebuild()
    }

    /// Builds the engine from the stored texts if none exists. Returns
    /// whether an engine is ready.
    ///
    /// # Errors
    ///
    /// The construction error when the build fails.
    pub fn rebuild(&mut self) -> Result<bool, TracerError> {
        if self.engine.is_some() {
            return Ok(true);
        }
        let Some(sources) = self.pending.complete() else {
            log::debug!("waiting for shader sources {:?}", self.pending.missing());
            return Ok(false);
        };

        match PathTracerEngine::initialize(&self.surface, &sources) {
            Ok(engine) => {
                self.engine = Some(engine);
                self.input.reset_accumulation();
                Ok(true)
            }
            Err(e) => {
                log::warn!("engine construction failed: {e}");
                Err(e)
            }
        }
    }

    /// Frame callback: draws once and counts the frame.
    ///
    /// # Errors
    ///
    /// `NotReady` while the engine has not been built, or the draw error.
    pub fn frame(&mut self) -> Result<FrameStatus, TracerError> {
        if !self.running {
            return Ok(FrameStatus::Stopped);
        }
        let Some(engine) = self.engine.as_mut() else {
            let missing = self.pending.missing();
            let reason = if missing.is_empty() {
                "engine released, awaiting rebuild".to_string()
            } else {
                format!("missing shader sources {missing:?}")
            };
            return Err(TracerError::NotReady(reason));
        };
        engine.draw(&self.input.draw_info())?;
        self.input.advance_frame();
        self.frames_drawn += 1;
        Ok(FrameStatus::Continue)
    }

    /// Pointer callback. Returns whether the camera moved.
    pub fn pointer_moved(&mut self, x: f32, y: f32, primary_down: bool) -> bool {
        self.input.pointer_moved(x, y, primary_down)
    }

    pub fn pointer_left(&mut self) {
        self.input.pointer_left();
    }

    /// Stops the loop; the next `frame` reports `Stopped`.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Drops the engine, releasing its GPU objects, e.g. before rebuilding
    /// at a new surface size. Delivered texts are kept for [`rebuild`](Self::rebuild).
    pub fn reset(&mut self) {
        self.engine = None;
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn engine(&self) -> Option<&PathTracerEngine<S::Backend>> {
        self.engine.as_ref()
    }

    pub fn input(&self) -> &EngineInputState {
        &self.input
    }

    /// Frames drawn since the loop was created.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Resource};
    use crate::render::headless::{HeadlessSurface, ObjectKind};
    use crate::render::quad::{
        ACCUMULATE_FRAGMENT_SHADER, DISPLAY_FRAGMENT_SHADER, QUAD_VERTEX_SHADER,
    };

    fn headless_loop() -> RenderLoop<HeadlessSurface> {
        RenderLoop::new(HeadlessSurface::new(4, 4), &TracerConfig::default())
    }

    fn deliver_all(rl: &mut RenderLoop<HeadlessSurface>) -> Result<bool, TracerError> {
        rl.deliver(ShaderKind::Vertex, QUAD_VERTEX_SHADER.into())?;
        rl.deliver(ShaderKind::PostFragment, DISPLAY_FRAGMENT_SHADER.into())?;
        rl.deliver(ShaderKind::RenderFragment, ACCUMULATE_FRAGMENT_SHADER.into())
    }

    #[test]
    fn pending_sources_reports_missing_kinds() {
        let mut pending = PendingSources::default();
        assert_eq!(pending.missing().len(), 3);
        pending.set(ShaderKind::RenderFragment, "x".into());
        assert_eq!(
            pending.missing(),
            vec![ShaderKind::Vertex, ShaderKind::PostFragment]
        );
        assert!(pending.complete().is_none());
    }

    #[test]
    fn frame_before_sources_is_not_ready() {
        let mut rl = headless_loop();
        let err = rl.frame().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotReady);
        assert!(err.to_string().contains("Vertex"), "got: {err}");
    }

    #[test]
    fn engine_is_built_only_when_third_source_arrives() {
        let mut rl = headless_loop();
        assert!(!rl.deliver(ShaderKind::Vertex, QUAD_VERTEX_SHADER.into()).unwrap());
        assert!(!rl
            .deliver(ShaderKind::PostFragment, DISPLAY_FRAGMENT_SHADER.into())
            .unwrap());
        assert_eq!(rl.surface().gpu().created_count(ObjectKind::Program), 0);
        assert!(rl
            .deliver(ShaderKind::RenderFragment, ACCUMULATE_FRAGMENT_SHADER.into())
            .unwrap());
        assert!(rl.is_ready());
    }

    #[test]
    fn frames_advance_counter_and_alternate_slots() {
        let mut rl = headless_loop();
        deliver_all(&mut rl).unwrap();
        for expected in 1..=3 {
            assert_eq!(rl.frame().unwrap(), FrameStatus::Continue);
            assert_eq!(rl.input().frame_index(), expected);
        }
        assert_eq!(rl.frames_drawn(), 3);
        let engine = rl.engine().unwrap();
        assert!(!engine.swapchain().current_is_a());
    }

    #[test]
    fn drag_resets_accumulation_between_frames() {
        let mut rl = headless_loop();
        deliver_all(&mut rl).unwrap();
        rl.frame().unwrap();
        rl.frame().unwrap();
        rl.pointer_moved(0.0, 0.0, true);
        assert!(rl.pointer_moved(10.0, 0.0, true));
        assert_eq!(rl.input().frame_index(), 0);
        rl.frame().unwrap();
        assert_eq!(rl.input().frame_index(), 1);
    }

    #[test]
    fn stop_ends_the_sequence() {
        let mut rl = headless_loop();
        deliver_all(&mut rl).unwrap();
        rl.stop();
        assert!(!rl.is_running());
        assert_eq!(rl.frame().unwrap(), FrameStatus::Stopped);
        assert_eq!(rl.frames_drawn(), 0);
    }

    #[test]
    fn failed_construction_can_be_retried_with_new_source() {
        let mut rl = headless_loop();
        rl.deliver(ShaderKind::Vertex, QUAD_VERTEX_SHADER.into()).unwrap();
        rl.deliver(ShaderKind::PostFragment, DISPLAY_FRAGMENT_SHADER.into()).unwrap();
        let err = rl
            .deliver(ShaderKind::RenderFragment, "void main() {}".into())
            .unwrap_err();
        assert_eq!(
            err,
            TracerError::ResourceCreation(Resource::Uniform(crate::render::uniforms::RESOLUTION))
        );
        assert!(!rl.is_ready());
        assert!(rl.surface().gpu().live_objects().is_empty());

        assert!(rl
            .deliver(ShaderKind::RenderFragment, ACCUMULATE_FRAGMENT_SHADER.into())
            .unwrap());
    }

    #[test]
    fn reset_releases_engine_and_keeps_sources() {
        let mut rl = headless_loop();
        deliver_all(&mut rl).unwrap();
        rl.reset();
        assert!(!rl.is_ready());
        assert!(rl.surface().gpu().live_objects().is_empty());
        let err = rl.frame().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotReady);
        assert!(err.to_string().contains("awaiting rebuild"), "got: {err}");

        assert!(rl.rebuild().unwrap());
        assert_eq!(rl.frame().unwrap(), FrameStatus::Continue);
    }

    #[test]
    fn text_delivered_while_running_is_used_on_rebuild() {
        let mut rl = headless_loop();
        deliver_all(&mut rl).unwrap();
        assert!(rl
            .deliver(ShaderKind::RenderFragment, "void main() {}".into())
            .unwrap());
        assert_eq!(rl.frame().unwrap(), FrameStatus::Continue);

        rl.reset();
        let err = rl.rebuild().unwrap_err();
        assert_eq!(
            err,
            TracerError::ResourceCreation(Resource::Uniform(crate::render::uniforms::RESOLUTION))
        );
        assert!(!rl.is_ready());
    }

    #[test]
    fn rebuild_without_all_sources_waits() {
        let mut rl = headless_loop();
        rl.deliver(ShaderKind::Vertex, QUAD_VERTEX_SHADER.into()).unwrap();
        assert!(!rl.rebuild().unwrap());
        assert_eq!(rl.surface().gpu().created_count(ObjectKind::Program), 0);
    }
}
