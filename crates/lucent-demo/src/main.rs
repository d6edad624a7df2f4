//! Deferred shading demo.
//!
//! Draws a small scene into a G-buffer, then accumulates a directional light
//! and a 24x24 grid of animated point lights with additive light volumes.
//! See `--help` for options; keys are listed in the startup log.

mod app;
mod cli;
mod scene;

use anyhow::Result;
use clap::Parser;
use lucent_engine::logging::init_logging;
use lucent_engine::window::Runtime;

use app::DemoApp;
use cli::Args;
use scene::build_scene;

const KEY_HELP: &str = "keys: G debug view, Tab/1-5 debug channel, PageUp/PageDown lights, \
Space pause, L light markers, V stereo, arrows/left-drag orbit, wheel zoom, Esc quit";

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.logging());
    log::info!("{KEY_HELP}");

    let scene = build_scene(&args.scene());
    let app = DemoApp::new(scene, args.demo());

    Runtime::run(args.runtime(), args.gpu(), app)
}
