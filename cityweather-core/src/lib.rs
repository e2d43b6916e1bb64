//! Core library for the `cityweather` client.
//!
//! This crate defines:
//! - The observable weather state and the store that owns it
//! - Fetch orchestration against a pluggable weather provider
//! - Configuration handling
//! - Presentation helpers shared by front ends (icons, colors)
//!
//! It is used by `cityweather-cli`, but any other front end can drive the
//! same [`WeatherStateStore`].

pub mod appearance;
pub mod config;
pub mod error;
pub mod favorites;
pub mod fetch;
pub mod model;
pub mod provider;
pub mod store;

pub use config::Config;
pub use error::{FetchError, FetchOutcome};
pub use favorites::FavoriteCities;
pub use fetch::FetchOrchestrator;
pub use model::{
    AppState, City, FetchStatus, ForecastDay, RealtimeWeather, WeatherEnvelope, WeatherSnapshot,
};
pub use provider::{WeatherProvider, provider_from_config};
pub use store::{StaleResultPolicy, StoreSettings, Subscription, WeatherStateStore};
