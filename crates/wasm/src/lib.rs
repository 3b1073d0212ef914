//! Browser bindings for the progressive path tracer.
//!
//! JavaScript fetches the three shader texts, hands each to a `WebTracer`
//! as it arrives, forwards `pointermove`/`pointerleave`, and calls `frame`
//! from `requestAnimationFrame` until it returns `false`. Core log records
//! go to the browser console, at `info` unless `setLogLevel` says otherwise.

pub mod console;

use pathtrace_core::{TracerConfig, TracerError};

/// Bit of `PointerEvent.buttons` set while the primary button is held.
pub const PRIMARY_BUTTON: u16 = 1;

/// Whether a `PointerEvent.buttons` mask includes the primary button.
pub fn primary_button_down(buttons: u16) -> bool {
    buttons & PRIMARY_BUTTON != 0
}

/// Parses the optional JSON config passed from JavaScript.
///
/// # Errors
///
/// `InvalidConfig` for malformed or out-of-range JSON.
pub fn parse_config(json: Option<&str>) -> Result<TracerConfig, TracerError> {
    match json {
        Some(text) if !text.trim().is_empty() => TracerConfig::from_json_str(text),
        _ => Ok(TracerConfig::default()),
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use pathtrace_core::{DrawingSurface, FrameStatus, RenderLoop, ShaderKind, TracerError};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{HtmlCanvasElement, WebGl2RenderingContext};

    use super::console::{ensure_console_logging, init_console_logging, parse_level};
    use super::{parse_config, primary_button_down};

    fn js_error(e: TracerError) -> JsError {
        JsError::new(&e.to_string())
    }

    /// Sets the console log level ("off", "error", ..., "trace").
    #[wasm_bindgen(js_name = setLogLevel)]
    pub fn set_log_level(level: &str) -> Result<(), JsError> {
        init_console_logging(parse_level(level).map_err(js_error)?);
        Ok(())
    }

    /// A canvas element as a drawing surface.
    pub struct CanvasSurface {
        canvas: HtmlCanvasElement,
    }

    impl DrawingSurface for CanvasSurface {
        type Backend = glow::Context;

        fn size(&self) -> (u32, u32) {
            (self.canvas.width(), self.canvas.height())
        }

        fn create_context(&self) -> Option<glow::Context> {
            let context = self
                .canvas
                .get_context("webgl2")
                .inspect_err(|e| log::warn!("getContext(\"webgl2\") threw: {e:?}"))
                .ok()
                .flatten()?
                .dyn_into::<WebGl2RenderingContext>()
                .ok()?;
            Some(glow::Context::from_webgl2_context(context))
        }
    }

    /// The render loop bound to one canvas.
    #[wasm_bindgen]
    pub struct WebTracer {
        inner: RenderLoop<CanvasSurface>,
    }

    #[wasm_bindgen]
    impl WebTracer {
        /// Sizes the canvas from the config and waits for shader sources.
        #[wasm_bindgen(constructor)]
        pub fn new(
            canvas: HtmlCanvasElement,
            config_json: Option<String>,
        ) -> Result<WebTracer, JsError> {
            ensure_console_logging();
            let config = parse_config(config_json.as_deref()).map_err(js_error)?;
            canvas.set_width(config.width);
            canvas.set_height(config.height);
            Ok(Self {
                inner: RenderLoop::new(CanvasSurface { canvas }, &config),
            })
        }

        /// Returns whether the engine is ready after this delivery.
        #[wasm_bindgen(js_name = setVertexSource)]
        pub fn set_vertex_source(&mut self, text: String) -> Result<bool, JsError> {
            self.inner.deliver(ShaderKind::Vertex, text).map_err(js_error)
        }

        #[wasm_bindgen(js_name = setRenderSource)]
        pub fn set_render_source(&mut self, text: String) -> Result<bool, JsError> {
            self.inner
                .deliver(ShaderKind::RenderFragment, text)
                .map_err(js_error)
        }

        #[wasm_bindgen(js_name = setPostSource)]
        pub fn set_post_source(&mut self, text: String) -> Result<bool, JsError> {
            self.inner
                .deliver(ShaderKind::PostFragment, text)
                .map_err(js_error)
        }

        #[wasm_bindgen(js_name = pointerMove)]
        pub fn pointer_move(&mut self, x: f32, y: f32, buttons: u16) -> bool {
            self.inner.pointer_moved(x, y, primary_button_down(buttons))
        }

        #[wasm_bindgen(js_name = pointerLeave)]
        pub fn pointer_leave(&mut self) {
            self.inner.pointer_left();
        }

        /// Draws one frame. `false` means stop scheduling frames.
        pub fn frame(&mut self) -> Result<bool, JsError> {
            let status = self.inner.frame().map_err(js_error)?;
            Ok(status == FrameStatus::Continue)
        }

        pub fn stop(&mut self) {
            self.inner.stop();
        }

        #[wasm_bindgen(getter, js_name = frameIndex)]
        pub fn frame_index(&self) -> u32 {
            self.inner.input().frame_index()
        }

        #[wasm_bindgen(getter)]
        pub fn ready(&self) -> bool {
            self.inner.is_ready()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::{set_log_level, CanvasSurface, WebTracer};
