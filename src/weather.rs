use std::time::Duration;

use anyhow::{Context, Result};
use image::RgbaImage;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

const API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const ICON_URL_BASE: &str = "https://openweathermap.org/img/wn";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Provider response structs
#[derive(Debug, Deserialize)]
struct WeatherResponse {
    /// UTC offset of the city in seconds. Not present for some locations.
    #[serde(default)]
    timezone: i32,
    weather: Vec<Condition>,
    main: Main,
    name: String,
    sys: Sys,
}

#[derive(Debug, Deserialize)]
struct Condition {
    icon: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct Main {
    /// Temperature in Kelvin.
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Sys {
    country: String,
}

/// Current weather for one city, reduced to what the UI displays.
#[derive(Debug, Clone)]
pub struct WeatherReport {
    pub icon_url: String,
    pub temperature_celsius: f64,
    pub description: String,
    pub city: String,
    pub country_code: String,
    pub utc_offset_seconds: i32,
}

impl WeatherReport {
    fn from_response(response: WeatherResponse) -> Result<Self> {
        let condition = response
            .weather
            .into_iter()
            .next()
            .context("weather response has no conditions")?;
        Ok(WeatherReport {
            icon_url: format!("{ICON_URL_BASE}/{}@2x.png", condition.icon),
            temperature_celsius: kelvin_to_celsius(response.main.temp),
            description: condition.description,
            city: response.name,
            country_code: response.sys.country,
            utc_offset_seconds: response.timezone,
        })
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - 273.15
}

/// Fetch current weather for `city`. Returns `None` when the provider does
/// not know the city (404); any other failure is an error.
pub async fn fetch_weather(
    client: &Client,
    api_key: &str,
    city: &str,
) -> Result<Option<WeatherReport>> {
    debug!(city, "requesting current weather");
    let response = client
        .get(API_URL)
        .query(&[("q", city), ("appid", api_key)])
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .context("weather request failed")?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let response = response
        .error_for_status()
        .context("weather provider returned an error")?;
    let parsed: WeatherResponse = response
        .json()
        .await
        .context("failed to parse weather response")?;
    WeatherReport::from_response(parsed).map(Some)
}

/// Fetch and decode the weather icon PNG. The caller treats failure as
/// non-fatal and keeps whatever icon is already displayed.
pub async fn fetch_icon(client: &Client, icon_url: &str) -> Result<RgbaImage> {
    let response = client
        .get(icon_url)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .context("icon request failed")?
        .error_for_status()
        .context("icon fetch returned an error")?;
    let bytes = response.bytes().await.context("failed to read icon bytes")?;
    let image = image::load_from_memory(&bytes).context("failed to decode icon")?;
    Ok(image.to_rgba8())
}
