use cityweather_core::{AppState, FetchStatus, WeatherSnapshot, appearance};
use std::fmt::Write;

/// Human-readable view of the whole state.
pub fn state(state: &AppState) -> String {
    let mut out = String::new();

    let status = match state.status {
        FetchStatus::Loading => " (updating...)",
        _ => "",
    };
    let _ = writeln!(out, "== {}{status} ==", state.current_city);

    if let Some(message) = &state.error_message {
        let _ = writeln!(out, "Request failed: {message}");
    }

    match &state.snapshot {
        Some(snapshot) => snapshot_into(&mut out, snapshot),
        None if state.status == FetchStatus::Loading => {
            let _ = writeln!(out, "Loading...");
        }
        None => {
            let _ = writeln!(out, "No weather data yet.");
        }
    }

    if !state.favorite_cities.is_empty() {
        let names: Vec<&str> = state.favorite_cities.iter().map(|c| c.as_str()).collect();
        let _ = writeln!(out, "Favorites: {}", names.join(", "));
    }

    out
}

fn snapshot_into(out: &mut String, snapshot: &WeatherSnapshot) {
    let now = &snapshot.realtime;
    let icon = appearance::icon_for(&now.description);

    let _ = writeln!(
        out,
        "{}  {}°C  {}  [{icon} {}]",
        snapshot.city,
        now.temperature,
        now.description,
        icon.color()
    );
    let _ = writeln!(
        out,
        "Humidity: {}% | Wind: {} {} | AQI: {}",
        now.humidity,
        now.wind_direction,
        now.wind_power,
        if now.air_quality_index.is_empty() { "-" } else { now.air_quality_index.as_str() },
    );

    if snapshot.forecast.is_empty() {
        return;
    }

    let _ = writeln!(out, "Forecast:");
    for day in &snapshot.forecast {
        let _ = writeln!(
            out,
            "  {}  {:<10}  {:<12}  {}  [{}]",
            day.short_date(),
            day.temperature_range,
            day.weather_description,
            day.wind_direction,
            appearance::icon_for(&day.weather_description),
        );
    }
}
