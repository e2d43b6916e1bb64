use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::model::{City, ForecastDay, RealtimeWeather, WeatherEnvelope, WeatherSnapshot};

use super::WeatherProvider;

pub const DEFAULT_ENDPOINT: &str = "http://apis.juhe.cn/simpleWeather/query";

/// Juhe "simpleWeather" API: realtime conditions plus a short daily forecast.
#[derive(Debug, Clone)]
pub struct JuheProvider {
    api_key: String,
    endpoint: String,
    http: Client,
}

impl JuheProvider {
    pub fn new(api_key: String, endpoint: String) -> Self {
        Self {
            api_key,
            endpoint,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl WeatherProvider for JuheProvider {
    async fn get_weather(&self, city: &City) -> Result<WeatherEnvelope> {
        let res = self
            .http
            .get(&self.endpoint)
            .query(&[("city", city.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await
            // The URL carries the API key.
            .map_err(reqwest::Error::without_url)
            .context("Failed to send request to Juhe simpleWeather")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read Juhe simpleWeather response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Juhe simpleWeather request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let envelope = parse_envelope(&body, city)?;
        debug!(city = %city, result_code = envelope.result_code, "juhe response parsed");
        Ok(envelope)
    }
}

/// Parse a response body into an envelope.
///
/// An empty `result.city` falls back to the requested city.
pub fn parse_envelope(body: &str, requested: &City) -> Result<WeatherEnvelope> {
    let parsed: JhResponse = serde_json::from_str(body)
        .with_context(|| format!("Failed to parse Juhe JSON: {}", truncate_body(body)))?;

    let payload = parsed.result.map(|result| {
        let city = City::parse(&result.city).unwrap_or_else(|| requested.clone());
        WeatherSnapshot {
            city,
            realtime: RealtimeWeather {
                temperature: result.realtime.temperature,
                humidity: result.realtime.humidity,
                description: result.realtime.info,
                icon_id: result.realtime.wid,
                wind_direction: result.realtime.direct,
                wind_power: result.realtime.power,
                air_quality_index: result.realtime.aqi,
            },
            forecast: result
                .future
                .into_iter()
                .map(|day| ForecastDay {
                    date: day.date,
                    temperature_range: day.temperature,
                    weather_description: day.weather,
                    day_icon_id: day.wid.day,
                    night_icon_id: day.wid.night,
                    wind_direction: day.direct,
                })
                .collect(),
        }
    });

    Ok(WeatherEnvelope {
        result_code: parsed.error_code,
        reason: parsed.reason,
        payload,
    })
}

#[derive(Debug, Deserialize)]
struct JhResponse {
    #[serde(default)]
    reason: String,
    result: Option<JhResult>,
    error_code: i64,
}

#[derive(Debug, Deserialize)]
struct JhResult {
    city: String,
    realtime: JhRealtime,
    #[serde(default)]
    future: Vec<JhFuture>,
}

#[derive(Debug, Deserialize)]
struct JhRealtime {
    temperature: String,
    humidity: String,
    info: String,
    #[serde(default)]
    wid: String,
    direct: String,
    power: String,
    // Missing for some smaller cities.
    #[serde(default)]
    aqi: String,
}

#[derive(Debug, Deserialize)]
struct JhFuture {
    date: String,
    temperature: String,
    weather: String,
    wid: JhWid,
    direct: String,
}

#[derive(Debug, Deserialize)]
struct JhWid {
    day: String,
    night: String,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::FetchError, model::RESULT_CODE_OK};

    const OK_BODY: &str = r#"{
        "reason": "查询成功!",
        "result": {
            "city": "苏州",
            "realtime": {
                "temperature": "4",
                "humidity": "82",
                "info": "阴",
                "wid": "02",
                "direct": "西北风",
                "power": "3级",
                "aqi": "80"
            },
            "future": [
                {
                    "date": "2019-02-22",
                    "temperature": "1/7℃",
                    "weather": "小雨转多云",
                    "wid": {"day": "07", "night": "01"},
                    "direct": "北风转西北风"
                },
                {
                    "date": "2019-02-23",
                    "temperature": "2/11℃",
                    "weather": "多云转阴",
                    "wid": {"day": "01", "night": "02"},
                    "direct": "北风转东北风"
                }
            ]
        },
        "error_code": 0
    }"#;

    fn city(name: &str) -> City {
        City::parse(name).unwrap()
    }

    #[test]
    fn parses_successful_response() {
        let envelope = parse_envelope(OK_BODY, &city("苏州")).expect("valid body");
        assert_eq!(envelope.result_code, RESULT_CODE_OK);

        let snapshot = envelope.payload.expect("payload present");
        assert_eq!(snapshot.city.as_str(), "苏州");
        assert_eq!(snapshot.realtime.description, "阴");
        assert_eq!(snapshot.realtime.wind_power, "3级");
        assert_eq!(snapshot.realtime.air_quality_index, "80");

        let dates: Vec<_> = snapshot.forecast.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, ["2019-02-22", "2019-02-23"]);
        assert_eq!(snapshot.forecast[0].day_icon_id, "07");
        assert_eq!(snapshot.forecast[0].night_icon_id, "01");
    }

    #[test]
    fn parses_application_error_with_null_result() {
        let body = r#"{"reason":"暂不支持该城市","result":null,"error_code":207301}"#;
        let envelope = parse_envelope(body, &city("Atlantis")).expect("valid body");

        assert_eq!(envelope.result_code, 207301);
        assert!(envelope.payload.is_none());
        assert_eq!(
            envelope.into_outcome().unwrap_err(),
            FetchError::Application("暂不支持该城市".into())
        );
    }

    #[test]
    fn missing_aqi_and_forecast_default_to_empty() {
        let body = r#"{
            "reason": "查询成功!",
            "result": {
                "city": "昆山",
                "realtime": {
                    "temperature": "5",
                    "humidity": "70",
                    "info": "多云",
                    "direct": "东风",
                    "power": "2级"
                }
            },
            "error_code": 0
        }"#;
        let snapshot = parse_envelope(body, &city("昆山")).unwrap().payload.unwrap();
        assert_eq!(snapshot.realtime.air_quality_index, "");
        assert_eq!(snapshot.realtime.icon_id, "");
        assert!(snapshot.forecast.is_empty());
    }

    #[test]
    fn blank_result_city_falls_back_to_request() {
        let body = OK_BODY.replace(r#""city": "苏州""#, r#""city": "  ""#);
        let envelope = parse_envelope(&body, &city("Suzhou")).expect("valid body");
        assert_eq!(envelope.payload.unwrap().city.as_str(), "Suzhou");
    }

    #[test]
    fn malformed_body_is_an_error() {
        let err = parse_envelope("<html>502 Bad Gateway</html>", &city("苏州")).unwrap_err();
        assert!(err.to_string().contains("Failed to parse Juhe JSON"));
    }

    #[tokio::test]
    async fn transport_error_does_not_reveal_the_api_key() {
        // Nothing listens on port 1.
        let provider = JuheProvider::new(
            "SECRET_KEY_123".to_string(),
            "http://127.0.0.1:1/simpleWeather/query".to_string(),
        );

        let err = provider.get_weather(&city("北京")).await.unwrap_err();
        let message = FetchError::transport(&err).to_string();

        assert!(message.contains("Failed to send request to Juhe simpleWeather"));
        assert!(!message.contains("SECRET_KEY_123"), "{message}");
        assert!(!format!("{err:?}").contains("SECRET_KEY_123"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "晴".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
