//! Per-frame renderer settings.

use super::light::{Light, LightBatch};

/// Which raw G-buffer channel the debug view shows.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GBufferView {
    Albedo,
    Normals,
    Specular,
    Position,
    Depth,
}

impl GBufferView {
    pub const ALL: [GBufferView; 5] = [
        GBufferView::Albedo,
        GBufferView::Normals,
        GBufferView::Specular,
        GBufferView::Position,
        GBufferView::Depth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GBufferView::Albedo => "albedo",
            GBufferView::Normals => "normals",
            GBufferView::Specular => "specular",
            GBufferView::Position => "position",
            GBufferView::Depth => "depth",
        }
    }

    /// Selector value read by the debug shader.
    #[inline]
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Cycles through [`ALL`](Self::ALL).
    pub fn next(self) -> Self {
        Self::ALL[(self.index() as usize + 1) % Self::ALL.len()]
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.label().eq_ignore_ascii_case(label.trim()))
    }
}

/// What the lighting stage writes to the output.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShadingView {
    /// Additive light-volume accumulation.
    Lit,
    /// One full-screen pass showing a raw G-buffer channel.
    Debug(GBufferView),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderSettings {
    pub view: ShadingView,
    /// Only the first `max_lights` scene lights are drawn.
    pub max_lights: usize,
    /// Animation clock forwarded to the shaders. Its rate is up to the caller.
    pub time: f32,
    /// Draws a small cross at every active point light in the lit view.
    pub light_markers: bool,
}

impl RenderSettings {
    /// Value of `FrameUniforms::debug_view` for these settings.
    #[inline]
    pub fn debug_selector(&self) -> u32 {
        match self.view {
            ShadingView::Lit => 0,
            ShadingView::Debug(v) => v.index(),
        }
    }

    /// Lights drawn by the lighting stage. The debug view draws none.
    pub fn light_batch(&self, lights: &[Light]) -> LightBatch {
        match self.view {
            ShadingView::Lit => LightBatch::build(lights, self.max_lights),
            ShadingView::Debug(_) => LightBatch::default(),
        }
    }

    /// Switches between the lit view and the given debug channel.
    pub fn toggle_debug(&mut self, channel: GBufferView) {
        self.view = match self.view {
            ShadingView::Lit => ShadingView::Debug(channel),
            ShadingView::Debug(_) => ShadingView::Lit,
        };
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            view: ShadingView::Lit,
            max_lights: usize::MAX,
            time: 0.0,
            light_markers: false,
        }
    }
}
