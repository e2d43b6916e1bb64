use std::sync::Arc;
use tokio::runtime::Handle;

use crate::{
    error::{FetchError, FetchOutcome},
    model::City,
    provider::WeatherProvider,
    store::FetchGuard,
};

/// Runs one collaborator call per trigger and hands the outcome to the store.
///
/// There is no retry, timeout or cancellation: a started fetch always runs to
/// completion.
#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
    provider: Arc<dyn WeatherProvider>,
}

impl FetchOrchestrator {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Call the weather source once for `city` and classify the answer.
    ///
    /// Never fails: every problem becomes a [`FetchError`].
    pub async fn resolve(&self, city: &City) -> FetchOutcome {
        match self.provider.get_weather(city).await {
            Ok(envelope) => envelope.into_outcome(),
            Err(err) => Err(FetchError::transport(&err)),
        }
    }

    /// Finish an already stamped fetch in the background.
    pub(crate) fn start(&self, runtime: &Handle, guard: FetchGuard) {
        let this = self.clone();

        runtime.spawn(async move {
            let outcome = this.resolve(guard.city()).await;
            guard.complete(outcome);
        });
    }
}
