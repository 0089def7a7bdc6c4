use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use anyhow::Result;
use eframe::{egui, App, Frame};
use image::RgbaImage;
use reqwest::Client;
use tracing::{info, warn};

use crate::background::{select_background, WeatherBackground};
use crate::clock::CityClock;
use crate::config::Config;
use crate::currency::{self, TARGET_CURRENCY};
use crate::video::BackgroundPlayer;
use crate::weather::{self, WeatherReport};

/// Everything the read-only widgets render. Mutated only by the search
/// transition, on the UI thread.
struct DisplayState {
    location: String,
    temperature: String,
    description: String,
    currency: String,
    background: WeatherBackground,
}

/// Result of one search, assembled on the worker thread.
struct SearchData {
    report: WeatherReport,
    currency_code: &'static str,
    rate: Option<f64>,
    icon: Option<RgbaImage>,
}

enum SearchOutcome {
    NotFound,
    /// Transport or parse failure. Displayed like an unknown city rather
    /// than crashing the UI.
    Failed(String),
    Found(Box<SearchData>),
}

/// What the search transition does to the icon display.
enum IconUpdate {
    /// A fresh icon was fetched.
    Set(RgbaImage),
    /// The icon fetch failed on an otherwise successful search; the
    /// previous icon stays on screen.
    Keep,
    /// The search failed; no icon belongs to what is displayed.
    Clear,
}

impl DisplayState {
    fn new() -> Self {
        DisplayState {
            location: String::new(),
            temperature: String::new(),
            description: String::new(),
            currency: String::new(),
            background: WeatherBackground::Default,
        }
    }

    /// The search transition.
    fn apply(&mut self, outcome: SearchOutcome, clock: &mut CityClock) -> IconUpdate {
        match outcome {
            SearchOutcome::NotFound => {
                self.enter_not_found(clock);
                IconUpdate::Clear
            }
            SearchOutcome::Failed(reason) => {
                warn!("search failed: {reason}");
                self.enter_not_found(clock);
                IconUpdate::Clear
            }
            SearchOutcome::Found(data) => {
                let report = &data.report;
                self.location = format!("{}, {}", report.city, report.country_code);
                self.temperature =
                    format!("Temperature: {:.2}\u{2103}", report.temperature_celsius);
                self.description = format!("Description: {}", report.description);
                self.currency = currency::rate_caption(data.currency_code, data.rate);
                self.background = select_background(&report.description);
                clock.set_offset_seconds(report.utc_offset_seconds);
                match data.icon {
                    Some(icon) => IconUpdate::Set(icon),
                    None => IconUpdate::Keep,
                }
            }
        }
    }

    fn enter_not_found(&mut self, clock: &mut CityClock) {
        self.location = String::from("City not found");
        self.temperature.clear();
        self.description.clear();
        self.currency.clear();
        self.background = WeatherBackground::Default;
        clock.reset_to_utc();
    }
}

pub struct WeatherscapeApp {
    config: Config,
    display: DisplayState,
    clock: CityClock,
    player: BackgroundPlayer,
    city_input: String,
    /// Set while a search worker is running; a search submitted in the
    /// meantime is ignored.
    search_in_flight: Arc<Mutex<bool>>,
    search_result: Arc<Mutex<Option<SearchOutcome>>>,
    background_texture: Option<egui::TextureHandle>,
    icon_texture: Option<egui::TextureHandle>,
}

impl WeatherscapeApp {
    pub fn new(config: Config) -> Result<Self> {
        let player = BackgroundPlayer::new(config.background_dir.clone())?;
        Ok(WeatherscapeApp {
            config,
            display: DisplayState::new(),
            clock: CityClock::new(),
            player,
            city_input: String::new(),
            search_in_flight: Arc::new(Mutex::new(false)),
            search_result: Arc::new(Mutex::new(None)),
            background_texture: None,
            icon_texture: None,
        })
    }

    fn begin_search(&mut self, ctx: &egui::Context) {
        {
            let mut in_flight = self.search_in_flight.lock().unwrap();
            if *in_flight {
                return;
            }
            *in_flight = true;
        }
        let config = self.config.clone();
        let city = self.city_input.trim().to_string();
        let result_slot = Arc::clone(&self.search_result);
        let in_flight = Arc::clone(&self.search_in_flight);
        let ctx = ctx.clone();

        // Network I/O happens off the UI thread; the outcome is handed
        // back through the result slot and applied on the next frame.
        thread::spawn(move || {
            info!(city = %city, "searching");
            let outcome = run_search(&config, &city);
            *result_slot.lock().unwrap() = Some(outcome);
            *in_flight.lock().unwrap() = false;
            ctx.request_repaint();
        });
    }

    fn take_search_result(&mut self, ctx: &egui::Context) {
        let outcome = self.search_result.lock().unwrap().take();
        if let Some(outcome) = outcome {
            match self.display.apply(outcome, &mut self.clock) {
                IconUpdate::Set(icon) => {
                    self.icon_texture = Some(ctx.load_texture(
                        "weather-icon",
                        to_color_image(&icon),
                        egui::TextureOptions::LINEAR,
                    ));
                }
                IconUpdate::Keep => {}
                IconUpdate::Clear => self.icon_texture = None,
            }
            self.player.set_background(self.display.background);
        }
    }

    fn paint_background(&mut self, ctx: &egui::Context) {
        let (frame, next_in) = self.player.poll(Instant::now());
        if let Some(frame) = frame {
            let image = to_color_image(&frame);
            match &mut self.background_texture {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => {
                    self.background_texture =
                        Some(ctx.load_texture("background", image, egui::TextureOptions::LINEAR))
                }
            }
        }
        ctx.request_repaint_after(next_in);

        // Stretched edge to edge; resizing the window re-fits it.
        if let Some(texture) = &self.background_texture {
            let painter = ctx.layer_painter(egui::LayerId::background());
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            painter.image(texture.id(), ctx.screen_rect(), uv, egui::Color32::WHITE);
        }
    }

    fn panel_label(&self, ui: &mut egui::Ui, text: &str, size: f32) {
        if text.is_empty() {
            return;
        }
        egui::Frame::none()
            .fill(egui::Color32::from_black_alpha(128))
            .rounding(10.0)
            .inner_margin(egui::Margin::symmetric(12.0, 6.0))
            .show(ui, |ui| {
                ui.label(
                    egui::RichText::new(text)
                        .size(size)
                        .color(egui::Color32::WHITE),
                );
            });
    }
}

impl App for WeatherscapeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.take_search_result(ctx);
        self.paint_background(ctx);

        let clock_next = self.clock.tick(Instant::now());
        ctx.request_repaint_after(clock_next);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(8.0);
                    self.panel_label(ui, "Weatherscape", 28.0);
                    ui.add_space(8.0);

                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.city_input)
                            .hint_text("Enter City Name")
                            .font(egui::TextStyle::Heading),
                    );
                    let submitted =
                        response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                    ui.add_space(4.0);
                    let clicked = ui
                        .add(egui::Button::new(egui::RichText::new("Search").size(18.0)))
                        .clicked();
                    if clicked || submitted {
                        self.begin_search(ctx);
                    }
                    if *self.search_in_flight.lock().unwrap() {
                        ui.spinner();
                    }

                    ui.add_space(8.0);
                    self.panel_label(ui, &self.display.location, 25.0);
                    if let Some(icon) = &self.icon_texture {
                        ui.image(icon.id(), icon.size_vec2());
                    }
                    self.panel_label(ui, &self.display.temperature, 20.0);
                    self.panel_label(ui, &self.display.currency, 20.0);

                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        self.panel_label(ui, &self.display.description, 20.0);
                        self.panel_label(ui, self.clock.text(), 18.0);
                    });
                });
            });
    }
}

/// One complete search: weather, then currency and icon. Runs on the
/// worker thread on a small single-threaded runtime.
fn run_search(config: &Config, city: &str) -> SearchOutcome {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => return SearchOutcome::Failed(format!("failed to start I/O runtime: {err}")),
    };
    runtime.block_on(async {
        let client = Client::new();
        let report = match weather::fetch_weather(&client, &config.weather_api_key, city).await {
            Ok(Some(report)) => report,
            Ok(None) => return SearchOutcome::NotFound,
            Err(err) => return SearchOutcome::Failed(format!("{err:#}")),
        };

        let currency_code = currency::currency_for_country(&report.country_code);
        let rate = match currency::fetch_exchange_rate(
            &client,
            &config.currency_api_key,
            currency_code,
            TARGET_CURRENCY,
        )
        .await
        {
            Ok(rate) => rate,
            Err(err) => {
                warn!("exchange rate lookup failed: {err:#}");
                None
            }
        };

        // Icon failure is not fatal; the previous icon stays on screen.
        let icon = match weather::fetch_icon(&client, &report.icon_url).await {
            Ok(icon) => Some(icon),
            Err(err) => {
                warn!("icon fetch failed: {err:#}");
                None
            }
        };

        SearchOutcome::Found(Box::new(SearchData {
            report,
            currency_code,
            rate,
            icon,
        }))
    })
}

fn to_color_image(image: &RgbaImage) -> egui::ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn london_report() -> WeatherReport {
        WeatherReport {
            icon_url: "https://openweathermap.org/img/wn/10d@2x.png".to_string(),
            temperature_celsius: 26.85,
            description: "light rain".to_string(),
            city: "London".to_string(),
            country_code: "GB".to_string(),
            utc_offset_seconds: 3600,
        }
    }

    fn found(report: WeatherReport, rate: Option<f64>) -> SearchOutcome {
        let currency_code = currency::currency_for_country(&report.country_code);
        SearchOutcome::Found(Box::new(SearchData {
            report,
            currency_code,
            rate,
            icon: None,
        }))
    }

    #[test]
    fn successful_search_populates_the_display() {
        let mut display = DisplayState::new();
        let mut clock = CityClock::new();

        display.apply(found(london_report(), Some(73.456)), &mut clock);

        assert_eq!(display.location, "London, GB");
        assert_eq!(display.temperature, "Temperature: 26.85℃");
        assert_eq!(display.description, "Description: light rain");
        assert_eq!(display.currency, "1 GBP = 73.46 PHP");
        assert_eq!(display.background, WeatherBackground::LightRain);
        assert_eq!(clock.zone(), FixedOffset::east_opt(3600).unwrap());
    }

    #[test]
    fn missing_rate_is_reported_inline() {
        let mut display = DisplayState::new();
        let mut clock = CityClock::new();

        display.apply(found(london_report(), None), &mut clock);

        assert_eq!(display.currency, "Currency rate not available");
        // Weather data still displays.
        assert_eq!(display.location, "London, GB");
    }

    #[test]
    fn not_found_clears_dependent_fields() {
        let mut display = DisplayState::new();
        let mut clock = CityClock::new();
        display.apply(found(london_report(), Some(73.0)), &mut clock);

        let icon = display.apply(SearchOutcome::NotFound, &mut clock);

        assert!(matches!(icon, IconUpdate::Clear));
        assert_eq!(display.location, "City not found");
        assert_eq!(display.temperature, "");
        assert_eq!(display.description, "");
        assert_eq!(display.currency, "");
        assert_eq!(display.background, WeatherBackground::Default);
        assert_eq!(clock.zone(), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    fn transport_failure_is_treated_like_not_found() {
        let mut display = DisplayState::new();
        let mut clock = CityClock::new();

        let icon = display.apply(
            SearchOutcome::Failed("connection refused".to_string()),
            &mut clock,
        );

        assert!(matches!(icon, IconUpdate::Clear));
        assert_eq!(display.location, "City not found");
        assert_eq!(display.background, WeatherBackground::Default);
    }

    #[test]
    fn icon_is_set_on_success_and_kept_on_fetch_failure() {
        let mut display = DisplayState::new();
        let mut clock = CityClock::new();

        let mut with_icon = found(london_report(), Some(73.0));
        if let SearchOutcome::Found(data) = &mut with_icon {
            data.icon = Some(RgbaImage::new(2, 2));
        }
        assert!(matches!(
            display.apply(with_icon, &mut clock),
            IconUpdate::Set(_)
        ));

        // A failed icon fetch on a successful search keeps the old icon.
        assert!(matches!(
            display.apply(found(london_report(), Some(73.0)), &mut clock),
            IconUpdate::Keep
        ));
    }

    #[test]
    fn unknown_country_converts_from_usd() {
        let mut report = london_report();
        report.country_code = "XX".to_string();
        let mut display = DisplayState::new();
        let mut clock = CityClock::new();

        display.apply(found(report, Some(56.2)), &mut clock);

        assert_eq!(display.currency, "1 USD = 56.20 PHP");
    }
}
