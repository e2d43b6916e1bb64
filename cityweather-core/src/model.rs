use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{error::FetchError, favorites::FavoriteCities};

/// A city name as the user typed it, minus surrounding whitespace.
///
/// Never empty. Case is preserved and no other normalization happens, so
/// `"Paris"` and `"paris"` are different cities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct City(String);

impl City {
    /// Trim `raw` and wrap it, or `None` when nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for City {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        City::parse(&value).ok_or_else(|| anyhow::anyhow!("City name must not be blank"))
    }
}

impl From<City> for String {
    fn from(city: City) -> Self {
        city.0
    }
}

/// Current conditions as reported by the weather source.
///
/// Values are kept as the source's display strings ("25", "3级", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeWeather {
    pub temperature: String,
    pub humidity: String,
    pub description: String,
    pub icon_id: String,
    pub wind_direction: String,
    pub wind_power: String,
    pub air_quality_index: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// `YYYY-MM-DD`
    pub date: String,
    pub temperature_range: String,
    pub weather_description: String,
    pub day_icon_id: String,
    pub night_icon_id: String,
    pub wind_direction: String,
}

impl ForecastDay {
    /// `MM/DD` for compact cards; the raw date if it isn't `YYYY-MM-DD`.
    pub fn short_date(&self) -> String {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map(|date| date.format("%m/%d").to_string())
            .unwrap_or_else(|_| self.date.clone())
    }
}

/// One successfully fetched weather payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: City,
    pub realtime: RealtimeWeather,
    /// In the order the source returned them.
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Idle => "idle",
            FetchStatus::Loading => "loading",
            FetchStatus::Success => "success",
            FetchStatus::Failed => "failed",
        }
    }

    /// `Success` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchStatus::Success | FetchStatus::Failed)
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the UI can observe.
///
/// `error_message` is `Some` exactly when `status` is [`FetchStatus::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppState {
    pub current_city: City,
    pub snapshot: Option<WeatherSnapshot>,
    pub status: FetchStatus,
    pub error_message: Option<String>,
    pub favorite_cities: FavoriteCities,
}

impl AppState {
    pub fn new(initial_city: City) -> Self {
        Self {
            current_city: initial_city,
            snapshot: None,
            status: FetchStatus::Idle,
            error_message: None,
            favorite_cities: FavoriteCities::default(),
        }
    }
}

/// Result code the weather source uses for "ok".
pub const RESULT_CODE_OK: i64 = 0;

/// What a weather source answered, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherEnvelope {
    pub result_code: i64,
    pub reason: String,
    pub payload: Option<WeatherSnapshot>,
}

impl WeatherEnvelope {
    pub fn ok(snapshot: WeatherSnapshot) -> Self {
        Self {
            result_code: RESULT_CODE_OK,
            reason: "success".to_string(),
            payload: Some(snapshot),
        }
    }

    pub fn failed(result_code: i64, reason: impl Into<String>) -> Self {
        Self {
            result_code,
            reason: reason.into(),
            payload: None,
        }
    }

    /// Map the envelope onto the fetch outcome taxonomy.
    pub fn into_outcome(self) -> Result<WeatherSnapshot, FetchError> {
        if self.result_code != RESULT_CODE_OK {
            let reason = if self.reason.trim().is_empty() {
                format!("Request failed with result code {}", self.result_code)
            } else {
                self.reason
            };
            return Err(FetchError::Application(reason));
        }

        self.payload.ok_or_else(|| {
            FetchError::Transport("response reported success but carried no weather data".into())
        })
    }
}
