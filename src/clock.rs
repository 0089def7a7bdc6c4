use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Utc};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).expect("zero offset is always valid")
}

/// Whole-hour zone for a provider UTC offset in seconds. Sub-hour
/// remainders are truncated; out-of-range offsets fall back to UTC.
pub fn zone_from_offset_seconds(offset_seconds: i32) -> FixedOffset {
    let hours = offset_seconds / 3600;
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(utc)
}

/// Live clock for the searched city.
///
/// Self-rescheduling: each tick arms the next one a second after it
/// completes, so ticks drift slightly rather than running at a fixed rate.
/// A zone change shows up on the next tick, not immediately.
pub struct CityClock {
    zone: FixedOffset,
    next_tick: Instant,
    text: String,
}

impl CityClock {
    pub fn new() -> Self {
        CityClock {
            zone: utc(),
            next_tick: Instant::now(),
            text: String::from("Time: Loading..."),
        }
    }

    pub fn set_offset_seconds(&mut self, offset_seconds: i32) {
        self.zone = zone_from_offset_seconds(offset_seconds);
    }

    pub fn reset_to_utc(&mut self) {
        self.zone = utc();
    }

    /// Re-render the clock text if the tick is due. Returns how long until
    /// the next tick, so the caller can schedule a repaint.
    pub fn tick(&mut self, now: Instant) -> Duration {
        if now >= self.next_tick {
            self.text = render_time(Utc::now().with_timezone(&self.zone));
            self.next_tick = Instant::now() + TICK_INTERVAL;
        }
        self.next_tick.saturating_duration_since(now)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    pub(crate) fn zone(&self) -> FixedOffset {
        self.zone
    }
}

fn render_time(now: DateTime<FixedOffset>) -> String {
    format!(
        "Date: {}\nTime: {}",
        now.format("%Y-%m-%d"),
        now.format("%H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn negative_offset_is_behind_utc() {
        assert_eq!(
            zone_from_offset_seconds(-18000),
            FixedOffset::west_opt(5 * 3600).unwrap()
        );
    }

    #[test]
    fn positive_offset_is_ahead_of_utc() {
        assert_eq!(
            zone_from_offset_seconds(32400),
            FixedOffset::east_opt(9 * 3600).unwrap()
        );
    }

    #[test]
    fn sub_hour_offsets_truncate() {
        assert_eq!(
            zone_from_offset_seconds(5400),
            FixedOffset::east_opt(3600).unwrap()
        );
        assert_eq!(zone_from_offset_seconds(1800), utc());
    }

    #[test]
    fn time_renders_as_two_lines() {
        let zone = FixedOffset::east_opt(9 * 3600).unwrap();
        let moment = zone.with_ymd_and_hms(2024, 3, 9, 21, 5, 30).unwrap();
        assert_eq!(render_time(moment), "Date: 2024-03-09\nTime: 21:05:30");
    }

    #[test]
    fn zone_change_applies_on_next_tick() {
        let mut clock = CityClock::new();
        clock.tick(Instant::now());
        let before = clock.text().to_string();
        clock.set_offset_seconds(32400);
        // The next tick is not due for about a second.
        clock.tick(Instant::now());
        assert_eq!(clock.text(), before);
    }
}
