/// Background animation chosen from the weather description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeatherBackground {
    LightRain,
    Rainy,
    Cloudy,
    Clear,
    Snow,
    Mist,
    Fog,
    Default,
}

impl WeatherBackground {
    /// File name of the animation for this background, relative to the
    /// background directory.
    pub fn file_name(self) -> &'static str {
        match self {
            WeatherBackground::LightRain => "light_rain.gif",
            WeatherBackground::Rainy => "rainy.gif",
            WeatherBackground::Cloudy => "cloudy.gif",
            WeatherBackground::Clear => "clear.gif",
            WeatherBackground::Snow => "snow.gif",
            WeatherBackground::Mist => "mist.gif",
            WeatherBackground::Fog => "fog.gif",
            WeatherBackground::Default => "default.gif",
        }
    }
}

/// Map a free-text weather description to a background.
///
/// Substring tests are case-insensitive and ordered: "light rain" must be
/// checked before "rain", and "rain" before "cloud", so a description like
/// "light rain and clouds" picks the most specific animation.
pub fn select_background(description: &str) -> WeatherBackground {
    let desc = description.to_lowercase();
    if desc.contains("light rain") {
        WeatherBackground::LightRain
    } else if desc.contains("rain") {
        WeatherBackground::Rainy
    } else if desc.contains("cloud") {
        WeatherBackground::Cloudy
    } else if desc.contains("clear") {
        WeatherBackground::Clear
    } else if desc.contains("snow") {
        WeatherBackground::Snow
    } else if desc.contains("mist") {
        WeatherBackground::Mist
    } else if desc.contains("fog") {
        WeatherBackground::Fog
    } else {
        WeatherBackground::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_rain_wins_over_rain_and_cloud() {
        assert_eq!(
            select_background("light rain and cloud"),
            WeatherBackground::LightRain
        );
    }

    #[test]
    fn rain_wins_over_cloud() {
        assert_eq!(
            select_background("Cloudy with rain"),
            WeatherBackground::Rainy
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(select_background("partly Cloudy"), WeatherBackground::Cloudy);
        assert_eq!(select_background("CLEAR SKY"), WeatherBackground::Clear);
    }

    #[test]
    fn mist_before_fog() {
        assert_eq!(select_background("overcast mist"), WeatherBackground::Mist);
        assert_eq!(select_background("freezing fog"), WeatherBackground::Fog);
    }

    #[test]
    fn unknown_description_falls_back_to_default() {
        assert_eq!(select_background("sandstorm"), WeatherBackground::Default);
        assert_eq!(select_background(""), WeatherBackground::Default);
    }

    #[test]
    fn snow_is_detected() {
        assert_eq!(select_background("heavy snow"), WeatherBackground::Snow);
    }
}
