use thiserror::Error;

use crate::model::WeatherSnapshot;

/// Why a fetch did not produce a snapshot.
///
/// The `Display` text is what ends up in `AppState::error_message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The weather source answered with a non-ok result code.
    #[error("{0}")]
    Application(String),

    /// The call itself failed: network, HTTP status, or an unreadable body.
    #[error("Network request failed: {0}")]
    Transport(String),
}

impl FetchError {
    /// Build a transport failure from a collaborator error, keeping its context chain.
    pub fn transport(err: &anyhow::Error) -> Self {
        FetchError::Transport(format!("{err:#}"))
    }
}

/// Outcome of exactly one fetch.
pub type FetchOutcome = Result<WeatherSnapshot, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn application_error_shows_reason_verbatim() {
        let err = FetchError::Application("超过每日可允许请求次数!".into());
        assert_eq!(err.to_string(), "超过每日可允许请求次数!");
    }

    #[test]
    fn transport_error_embeds_the_whole_chain() {
        let source: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused"));
        let err = source.context("Failed to send request").unwrap_err();

        let msg = FetchError::transport(&err).to_string();
        assert!(msg.starts_with("Network request failed: "));
        assert!(msg.contains("Failed to send request"));
        assert!(msg.contains("connection refused"));
    }
}
