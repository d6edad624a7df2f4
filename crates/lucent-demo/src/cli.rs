//! Command-line options.

use std::path::PathBuf;

use clap::Parser;
use lucent_engine::device::GpuInit;
use lucent_engine::logging::LoggingConfig;
use lucent_engine::render::{GBufferView, RenderSettings, ShadingView};
use lucent_engine::window::{LogicalSize, RuntimeConfig};

use crate::app::DemoConfig;
use crate::scene::SceneOptions;

#[derive(Debug, Parser)]
#[command(name = "lucent-demo", version, about = "Deferred shading with light volumes and stereo eye buffers")]
pub struct Args {
    /// Window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Start with stereo eye buffers mirrored side by side.
    #[arg(long)]
    pub stereo: bool,

    /// Start in the G-buffer debug view (albedo, normals, specular, position, depth).
    #[arg(long, value_name = "VIEW", value_parser = parse_view)]
    pub debug: Option<GBufferView>,

    /// Number of lights drawn at startup (default: all).
    #[arg(long)]
    pub lights: Option<usize>,

    /// Mark every point light with a small cross.
    #[arg(long)]
    pub light_markers: bool,

    /// OBJ model used for the fruit row instead of the built-in sphere.
    #[arg(long, value_name = "OBJ")]
    pub model: Option<PathBuf>,

    /// Uniform scale applied to `--model`.
    #[arg(long, default_value_t = 1.0)]
    pub model_scale: f32,

    /// Albedo image for the fruit row.
    #[arg(long, value_name = "IMAGE")]
    pub model_texture: Option<PathBuf>,

    /// Present without waiting for vblank.
    #[arg(long)]
    pub no_vsync: bool,

    /// Log filter in `env_logger` syntax; overrides RUST_LOG.
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,
}

fn parse_view(s: &str) -> Result<GBufferView, String> {
    GBufferView::from_label(s).ok_or_else(|| {
        let names: Vec<&str> = GBufferView::ALL.iter().map(|v| v.label()).collect();
        format!("unknown view '{s}' (expected one of: {})", names.join(", "))
    })
}

impl Args {
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log.clone(),
            ..Default::default()
        }
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: "lucent".to_string(),
            initial_size: LogicalSize::new(self.width.max(1) as f64, self.height.max(1) as f64),
        }
    }

    pub fn gpu(&self) -> GpuInit {
        if self.no_vsync {
            GpuInit::default().without_vsync()
        } else {
            GpuInit::default()
        }
    }

    pub fn scene(&self) -> SceneOptions {
        SceneOptions {
            model: self.model.clone(),
            model_scale: self.model_scale,
            model_texture: self.model_texture.clone(),
        }
    }

    pub fn demo(&self) -> DemoConfig {
        DemoConfig {
            settings: RenderSettings {
                view: self.debug.map_or(ShadingView::Lit, ShadingView::Debug),
                max_lights: self.lights.unwrap_or(usize::MAX),
                light_markers: self.light_markers,
                ..Default::default()
            },
            stereo: self.stereo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["lucent-demo"]).unwrap();
        assert_eq!((args.width, args.height), (1280, 720));
        let demo = args.demo();
        assert_eq!(demo.settings.view, ShadingView::Lit);
        assert_eq!(demo.settings.max_lights, usize::MAX);
        assert!(!demo.stereo);
        assert!(!demo.settings.light_markers);
        assert_eq!(args.gpu().present_mode, GpuInit::default().present_mode);
    }

    #[test]
    fn debug_view_and_lights() {
        let args = Args::try_parse_from([
            "lucent-demo",
            "--debug",
            "normals",
            "--lights",
            "64",
            "--stereo",
            "--light-markers",
        ])
        .unwrap();
        let demo = args.demo();
        assert!(demo.settings.light_markers);
        assert_eq!(demo.settings.view, ShadingView::Debug(GBufferView::Normals));
        assert_eq!(demo.settings.max_lights, 64);
        assert!(demo.stereo);
    }

    #[test]
    fn unknown_view_is_rejected() {
        let err = Args::try_parse_from(["lucent-demo", "--debug", "albido"]).unwrap_err();
        assert!(err.to_string().contains("albedo"));
    }

    #[test]
    fn model_options_reach_scene() {
        let args = Args::try_parse_from([
            "lucent-demo",
            "--model",
            "apple.obj",
            "--model-scale",
            "0.01",
            "--model-texture",
            "apple.png",
            "--log",
            "debug",
        ])
        .unwrap();
        let scene = args.scene();
        assert_eq!(scene.model.as_deref(), Some(std::path::Path::new("apple.obj")));
        assert_eq!(scene.model_scale, 0.01);
        assert_eq!(args.logging().env_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn no_vsync_changes_present_mode() {
        let args = Args::try_parse_from(["lucent-demo", "--no-vsync"]).unwrap();
        assert_eq!(
            args.gpu().present_mode,
            GpuInit::default().without_vsync().present_mode
        );
        assert_ne!(args.gpu().present_mode, GpuInit::default().present_mode);
    }
}
