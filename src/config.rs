use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dotenv::dotenv;
use tracing::debug;

const WEATHER_KEY_VAR: &str = "OPENWEATHERMAP_API_KEY";
const CURRENCY_KEY_VAR: &str = "EXCHANGERATE_API_KEY";
const BACKGROUND_DIR_VAR: &str = "WEATHERSCAPE_BACKGROUND_DIR";

/// Runtime settings, taken from the environment. API keys are never
/// embedded in the source.
#[derive(Debug, Clone)]
pub struct Config {
    pub weather_api_key: String,
    pub currency_api_key: String,
    pub background_dir: PathBuf,
}

impl Config {
    /// Load settings from the environment, reading a `.env` file first if
    /// one exists next to the executable or in the working directory.
    pub fn load() -> Result<Self> {
        load_env_file();
        let weather_api_key = env::var(WEATHER_KEY_VAR)
            .with_context(|| format!("{WEATHER_KEY_VAR} is not set"))?;
        let currency_api_key = env::var(CURRENCY_KEY_VAR)
            .with_context(|| format!("{CURRENCY_KEY_VAR} is not set"))?;
        let background_dir = env::var_os(BACKGROUND_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("backgrounds"));
        Ok(Config {
            weather_api_key,
            currency_api_key,
            background_dir,
        })
    }
}

fn load_env_file() {
    // A .env next to the executable wins over one in the working directory.
    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let candidate = exe_dir.join(".env");
            if candidate.exists() {
                if dotenv::from_path(&candidate).is_ok() {
                    debug!("loaded environment from {}", candidate.display());
                    return;
                }
            }
        }
    }
    if dotenv().is_ok() {
        debug!("loaded environment from ./.env");
    }
}
