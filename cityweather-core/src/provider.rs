use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    model::{City, WeatherEnvelope},
    provider::juhe::JuheProvider,
};

pub mod juhe;

/// The external weather source.
///
/// `Ok` means the source answered, whatever its result code says. `Err` is
/// reserved for transport-level trouble: unreachable host, bad HTTP status,
/// a body that doesn't parse.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, city: &City) -> anyhow::Result<WeatherEnvelope>;
}

/// Construct the weather provider described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;

    Ok(Arc::new(JuheProvider::new(
        api_key.to_owned(),
        config.endpoint.clone(),
    )))
}
