//! How a weather description is presented: an icon and a background color.
//!
//! Matching is by substring, checked in a fixed order, so mixed descriptions
//! like "多云转阴" resolve to the first matching category (cloudy here).

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIcon {
    Sunny,
    Cloudy,
    Overcast,
    Rain,
    Snow,
    Unknown,
}

impl WeatherIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherIcon::Sunny => "sunny",
            WeatherIcon::Cloudy => "cloudy",
            WeatherIcon::Overcast => "overcast",
            WeatherIcon::Rain => "rain",
            WeatherIcon::Snow => "snow",
            WeatherIcon::Unknown => "unknown",
        }
    }

    /// Background color for cards showing this icon.
    pub fn color(&self) -> Rgb {
        match self {
            WeatherIcon::Sunny => Rgb(0xFF_D7_00),
            WeatherIcon::Cloudy => Rgb(0x87_CE_EB),
            WeatherIcon::Overcast => Rgb(0x77_88_99),
            WeatherIcon::Rain => Rgb(0x46_82_B4),
            WeatherIcon::Snow => Rgb(0xF0_F8_FF),
            WeatherIcon::Unknown => DEFAULT_COLOR,
        }
    }
}

impl fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 24-bit color, displayed as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb(pub u32);

pub const DEFAULT_COLOR: Rgb = Rgb(0x21_96_F3);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0 & 0xFF_FF_FF)
    }
}

const KEYWORDS: &[(WeatherIcon, &[&str])] = &[
    (WeatherIcon::Sunny, &["晴", "sun", "clear"]),
    (WeatherIcon::Cloudy, &["多云", "cloud"]),
    (WeatherIcon::Overcast, &["阴", "overcast"]),
    (WeatherIcon::Rain, &["雨", "rain", "shower", "drizzle"]),
    (WeatherIcon::Snow, &["雪", "snow", "sleet"]),
];

/// Icon for a description; [`WeatherIcon::Unknown`] when nothing matches.
pub fn icon_for(description: &str) -> WeatherIcon {
    let lower = description.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|word| lower.contains(word)))
        .map(|(icon, _)| *icon)
        .unwrap_or(WeatherIcon::Unknown)
}

pub fn color_for(description: &str) -> Rgb {
    icon_for(description).color()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chinese_descriptions_map_to_icons() {
        assert_eq!(icon_for("晴"), WeatherIcon::Sunny);
        assert_eq!(icon_for("多云"), WeatherIcon::Cloudy);
        assert_eq!(icon_for("阴"), WeatherIcon::Overcast);
        assert_eq!(icon_for("小雨"), WeatherIcon::Rain);
        assert_eq!(icon_for("大雪"), WeatherIcon::Snow);
    }

    #[test]
    fn earlier_category_wins_for_mixed_descriptions() {
        assert_eq!(icon_for("多云转阴"), WeatherIcon::Cloudy);
        assert_eq!(icon_for("阴转多云"), WeatherIcon::Cloudy);
        assert_eq!(icon_for("雨夹雪"), WeatherIcon::Rain);
        assert_eq!(icon_for("晴转多云"), WeatherIcon::Sunny);
    }

    #[test]
    fn english_matching_ignores_case() {
        assert_eq!(icon_for("Partly Cloudy"), WeatherIcon::Cloudy);
        assert_eq!(icon_for("LIGHT RAIN"), WeatherIcon::Rain);
        assert_eq!(icon_for("Clear sky"), WeatherIcon::Sunny);
    }

    #[test]
    fn unmatched_input_gets_the_default() {
        assert_eq!(icon_for("雾"), WeatherIcon::Unknown);
        assert_eq!(icon_for(""), WeatherIcon::Unknown);
        assert_eq!(color_for("霾"), DEFAULT_COLOR);
        assert_eq!(DEFAULT_COLOR.to_string(), "#2196F3");
    }

    #[test]
    fn colors_render_as_hex() {
        assert_eq!(color_for("晴").to_string(), "#FFD700");
        assert_eq!(color_for("阴").to_string(), "#778899");
        assert_eq!(color_for("snow").to_string(), "#F0F8FF");
    }
}
