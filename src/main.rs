mod app;
mod background;
mod clock;
mod config;
mod currency;
mod video;
mod weather;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use app::WeatherscapeApp;
use config::Config;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let app = WeatherscapeApp::new(config)?;

    let native_options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(800.0, 600.0)),
        ..Default::default()
    };
    eframe::run_native(
        "Weatherscape",
        native_options,
        Box::new(|_cc| Box::new(app)),
    )
    .map_err(|err| anyhow!("failed to run the UI: {err}"))
}
