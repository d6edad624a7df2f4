use lucent_engine::core::{App, AppControl, FrameCtx};
use lucent_engine::input::{InputFrame, InputState, Key, MouseButton};
use lucent_engine::render::{
    Camera, DeferredRenderer, GBufferView, RenderSettings, Scene, ShadingView, StereoRenderer,
    ViewParams,
};

use crate::scene::{animate_lights, ANIMATION_RATE};

/// Lights added or removed per PageUp/PageDown.
const LIGHT_STEP: usize = 32;
/// Orbit speed for the arrow keys, radians per second.
const ORBIT_KEY_SPEED: f32 = 1.5;
/// Orbit per dragged physical pixel, radians.
const ORBIT_DRAG_SPEED: f32 = 0.005;
const DOLLY_PER_LINE: f32 = 0.5;
const TITLE_INTERVAL: f32 = 0.5;

/// Demo options that outlive startup.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub settings: RenderSettings,
    pub stereo: bool,
}

pub struct DemoApp {
    scene: Scene,
    camera: Camera,
    settings: RenderSettings,
    /// Channel shown when the debug view is toggled on.
    debug_channel: GBufferView,
    stereo_enabled: bool,
    paused: bool,
    anim_time: f32,

    deferred: DeferredRenderer,
    stereo: StereoRenderer,

    fps: FpsCounter,
}

impl DemoApp {
    pub fn new(scene: Scene, config: DemoConfig) -> Self {
        let max_lights = config.settings.max_lights.min(scene.lights.len());
        let debug_channel = match config.settings.view {
            ShadingView::Debug(channel) => channel,
            ShadingView::Lit => GBufferView::Albedo,
        };
        Self {
            scene,
            camera: Camera::default(),
            settings: RenderSettings {
                max_lights,
                ..config.settings
            },
            debug_channel,
            stereo_enabled: config.stereo,
            paused: false,
            anim_time: 0.0,
            deferred: DeferredRenderer::new(),
            stereo: StereoRenderer::default(),
            fps: FpsCounter::default(),
        }
    }

    /// Applies this frame's key presses.
    fn handle_keys(&mut self, frame: &InputFrame) -> AppControl {
        if frame.pressed(Key::Escape) {
            log::info!("escape pressed; exiting");
            return AppControl::Exit;
        }

        if frame.pressed(Key::G) {
            self.settings.toggle_debug(self.debug_channel);
            log::info!("view: {}", self.view_label());
        }
        if frame.pressed(Key::Tab) {
            self.select_channel(self.debug_channel.next());
        }
        let digits = [Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4, Key::Digit5];
        for (key, channel) in digits.into_iter().zip(GBufferView::ALL) {
            if frame.pressed(key) {
                self.select_channel(channel);
            }
        }

        if frame.pressed(Key::PageUp) {
            self.settings.max_lights =
                (self.settings.max_lights + LIGHT_STEP).min(self.scene.lights.len());
            log::info!("drawing {} lights", self.settings.max_lights);
        }
        if frame.pressed(Key::PageDown) {
            self.settings.max_lights = self.settings.max_lights.saturating_sub(LIGHT_STEP);
            log::info!("drawing {} lights", self.settings.max_lights);
        }

        if frame.pressed(Key::Space) {
            self.paused = !self.paused;
            log::info!("animation {}", if self.paused { "paused" } else { "resumed" });
        }
        if frame.pressed(Key::L) {
            self.settings.light_markers = !self.settings.light_markers;
            log::info!("light markers {}", if self.settings.light_markers { "on" } else { "off" });
        }
        if frame.pressed(Key::V) {
            self.stereo_enabled = !self.stereo_enabled;
            log::info!("stereo {}", if self.stereo_enabled { "on" } else { "off" });
        }

        AppControl::Continue
    }

    fn select_channel(&mut self, channel: GBufferView) {
        self.debug_channel = channel;
        self.settings.view = ShadingView::Debug(channel);
        log::info!("view: {}", self.view_label());
    }

    fn handle_camera(&mut self, input: &InputState, frame: &InputFrame, dt: f32) {
        let axis = |neg: Key, pos: Key| {
            (input.is_down(pos) as i32 - input.is_down(neg) as i32) as f32
        };
        let mut yaw = axis(Key::ArrowLeft, Key::ArrowRight) * ORBIT_KEY_SPEED * dt;
        let mut pitch = axis(Key::ArrowDown, Key::ArrowUp) * ORBIT_KEY_SPEED * dt;

        if input.is_button_down(MouseButton::Left) {
            yaw -= frame.pointer_delta.0 * ORBIT_DRAG_SPEED;
            pitch += frame.pointer_delta.1 * ORBIT_DRAG_SPEED;
        }
        if yaw != 0.0 || pitch != 0.0 {
            self.camera.orbit(yaw, pitch);
        }
        if frame.wheel_lines != 0.0 {
            self.camera.dolly(frame.wheel_lines * DOLLY_PER_LINE);
        }
    }

    fn advance_animation(&mut self, dt: f32) {
        if !self.paused {
            self.anim_time += dt * ANIMATION_RATE;
            animate_lights(&mut self.scene.lights, self.anim_time);
        }
        self.settings.time = self.anim_time;
    }

    fn view_label(&self) -> &'static str {
        match self.settings.view {
            ShadingView::Lit => "lit",
            ShadingView::Debug(channel) => channel.label(),
        }
    }

    fn title(&self, fps: f32) -> String {
        format!(
            "lucent · {}{} · {} lights · {fps:.0} fps",
            self.view_label(),
            if self.stereo_enabled { " · stereo" } else { "" },
            self.settings.max_lights,
        )
    }
}

impl App for DemoApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.handle_keys(ctx.input_frame) == AppControl::Exit {
            return AppControl::Exit;
        }
        let dt = ctx.time.dt;
        self.handle_camera(ctx.input, ctx.input_frame, dt);
        self.advance_animation(dt);

        if let Some(fps) = self.fps.tick(dt) {
            ctx.window.set_title(&self.title(fps));
        }

        let stereo_enabled = self.stereo_enabled;
        ctx.render(|rctx, target| {
            if stereo_enabled {
                self.stereo.render(
                    rctx,
                    target,
                    &mut self.deferred,
                    &self.scene,
                    &self.camera,
                    &self.settings,
                );
            } else {
                let view = ViewParams {
                    view: self.camera.view(),
                    projection: self.camera.projection(target.aspect()),
                };
                self.deferred
                    .render(rctx, target, 0, &self.scene, &view, &self.settings);
            }
        })
    }
}

/// Frames per second averaged over [`TITLE_INTERVAL`].
#[derive(Debug, Default)]
struct FpsCounter {
    frames: u32,
    elapsed: f32,
}

impl FpsCounter {
    /// Returns a fresh average once per interval.
    fn tick(&mut self, dt: f32) -> Option<f32> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < TITLE_INTERVAL {
            return None;
        }
        let fps = self.frames as f32 / self.elapsed;
        self.frames = 0;
        self.elapsed = 0.0;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{build_scene, SceneOptions};

    fn app() -> DemoApp {
        DemoApp::new(
            build_scene(&SceneOptions::default()),
            DemoConfig {
                settings: RenderSettings::default(),
                stereo: false,
            },
        )
    }

    fn press(keys: &[Key]) -> InputFrame {
        let mut frame = InputFrame::default();
        frame.keys_pressed.extend(keys.iter().copied());
        frame
    }

    #[test]
    fn light_limit_clamps_to_scene() {
        let mut app = app();
        let total = app.scene.lights.len();
        assert_eq!(app.settings.max_lights, total);

        app.handle_keys(&press(&[Key::PageUp]));
        assert_eq!(app.settings.max_lights, total);

        app.handle_keys(&press(&[Key::PageDown]));
        assert_eq!(app.settings.max_lights, total - LIGHT_STEP);

        for _ in 0..100 {
            app.handle_keys(&press(&[Key::PageDown]));
        }
        assert_eq!(app.settings.max_lights, 0);
    }

    #[test]
    fn g_toggles_last_channel() {
        let mut app = app();
        app.handle_keys(&press(&[Key::Digit3]));
        assert_eq!(app.settings.view, ShadingView::Debug(GBufferView::Specular));

        app.handle_keys(&press(&[Key::G]));
        assert_eq!(app.settings.view, ShadingView::Lit);

        app.handle_keys(&press(&[Key::G]));
        assert_eq!(app.settings.view, ShadingView::Debug(GBufferView::Specular));
    }

    #[test]
    fn tab_cycles_channels() {
        let mut app = app();
        app.handle_keys(&press(&[Key::Tab]));
        assert_eq!(app.settings.view, ShadingView::Debug(GBufferView::Normals));
        app.handle_keys(&press(&[Key::Tab]));
        assert_eq!(app.settings.view, ShadingView::Debug(GBufferView::Specular));
    }

    #[test]
    fn escape_exits_and_v_toggles_stereo() {
        let mut app = app();
        assert_eq!(app.handle_keys(&press(&[Key::V])), AppControl::Continue);
        assert!(app.stereo_enabled);
        assert_eq!(app.handle_keys(&press(&[Key::Escape])), AppControl::Exit);
    }

    #[test]
    fn pause_freezes_animation() {
        let mut app = app();
        app.advance_animation(1.0);
        let t = app.anim_time;
        assert!((t - ANIMATION_RATE).abs() < 1e-6);

        app.handle_keys(&press(&[Key::Space]));
        app.advance_animation(1.0);
        assert_eq!(app.anim_time, t);
        assert_eq!(app.settings.time, t);
    }

    #[test]
    fn l_toggles_light_markers() {
        let mut app = app();
        assert!(!app.settings.light_markers);
        app.handle_keys(&press(&[Key::L]));
        assert!(app.settings.light_markers);
        app.handle_keys(&press(&[Key::L]));
        assert!(!app.settings.light_markers);
    }

    #[test]
    fn fps_reported_once_per_interval() {
        let mut fps = FpsCounter::default();
        assert_eq!(fps.tick(0.1), None);
        let avg = (0..5).find_map(|_| fps.tick(0.1));
        assert!(avg.is_some_and(|v| (v - 10.0).abs() < 1e-3));
    }

    #[test]
    fn title_mentions_mode() {
        let mut app = app();
        app.handle_keys(&press(&[Key::Digit5, Key::V]));
        let title = app.title(60.0);
        assert!(title.contains("depth"));
        assert!(title.contains("stereo"));
        assert!(title.contains("60 fps"));
    }
}
