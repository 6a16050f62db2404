mod app;
mod camera;
mod components;
mod config;
mod engine;
mod error;
mod renderer;
mod scene;

use anyhow::Context;
use clap::Parser;

use app::DemoApp;
use config::{Args, RenderConfig};
use engine::window::GameWindow;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = RenderConfig::from(&args);
    log::debug!("{config:?}");

    let sdl = sdl2::init()
        .map_err(anyhow::Error::msg)
        .context("failed to initialize SDL2")?;
    let window = GameWindow::new(&sdl, "penumbra", config.window_width, config.window_height)
        .context("failed to open the main window")?;

    let mut app = DemoApp::new(&config).context("failed to set up the renderer")?;
    app.run(&sdl, &window)?;
    Ok(())
}
