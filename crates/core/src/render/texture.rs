//! Texture configuration for the accumulation buffers.
//!
//! `TextureConfig` describes size, storage format, and filtering in
//! backend-neutral terms; each [`GpuBackend`](super::backend::GpuBackend)
//! maps it onto its own constants.

/// Sized internal storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit unsigned normalized RGBA.
    Rgba8,
    /// Half-float RGBA. Rendering into it needs `EXT_color_buffer_float`.
    Rgba16F,
}

/// Minification and magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Configuration for one accumulation texture.
///
/// Storage is a single mip level with clamp-to-edge wrapping on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    pub format: TextureFormat,
    pub filter: TextureFilter,
}

impl TextureConfig {
    /// RGBA8 storage with nearest filtering, so the displayed image stays
    /// pixel-exact when the canvas is scaled up.
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgba8,
            filter: TextureFilter::Nearest,
        }
    }

    /// Returns `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(feature = "render")]
impl TextureFormat {
    /// The GL sized internal format constant.
    pub fn gl_internal_format(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => glow::RGBA8,
            TextureFormat::Rgba16F => glow::RGBA16F,
        }
    }
}

#[cfg(feature = "render")]
impl TextureFilter {
    /// The GL filter constant.
    pub fn gl_filter(self) -> u32 {
        match self {
            TextureFilter::Nearest => glow::NEAREST,
            TextureFilter::Linear => glow::LINEAR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_sets_dimensions() {
        let config = TextureConfig::rgba8(384, 216);
        assert_eq!(config.width, 384);
        assert_eq!(config.height, 216);
        assert_eq!(config.size(), (384, 216));
    }

    #[test]
    fn rgba8_uses_nearest_filter() {
        let config = TextureConfig::rgba8(4, 4);
        assert_eq!(config.format, TextureFormat::Rgba8);
        assert_eq!(config.filter, TextureFilter::Nearest);
    }

    #[test]
    fn texture_config_debug_format_is_readable() {
        let config = TextureConfig::rgba8(100, 200);
        let debug = format!("{config:?}");
        assert!(debug.contains("100"), "missing width in debug: {debug}");
        assert!(debug.contains("200"), "missing height in debug: {debug}");
    }

    #[cfg(feature = "render")]
    #[test]
    fn gl_constants_match_formats() {
        assert_eq!(TextureFormat::Rgba8.gl_internal_format(), glow::RGBA8);
        assert_eq!(TextureFormat::Rgba16F.gl_internal_format(), glow::RGBA16F);
        assert_eq!(TextureFilter::Nearest.gl_filter(), glow::NEAREST);
        assert_eq!(TextureFilter::Linear.gl_filter(), glow::LINEAR);
    }
}
