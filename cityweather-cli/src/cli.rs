use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use cityweather_core::{
    City, Config, FetchStatus, StaleResultPolicy, WeatherStateStore, provider_from_config,
};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use tracing::debug;

use crate::{logging, render, session};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "City weather in your terminal")]
pub struct Cli {
    /// More log output (-v debug, -vv trace). `RUST_LOG` overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, startup city and stale-result policy.
    Configure,

    /// Fetch weather for one city and print it.
    Show {
        /// City name; defaults to the configured startup city.
        city: Option<String>,

        /// Print the full state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Browse cities and manage favorites.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        logging::init(&config.log_level, self.verbose);

        match self.command {
            Command::Configure => configure(config),
            Command::Show { city, json } => show(config, city, json).await,
            Command::Interactive => session::run(config).await,
        }
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("Weather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let city = Text::new("Startup city:")
        .with_default(&config.initial_city)
        .prompt()
        .context("Failed to read startup city")?;

    let cursor = StaleResultPolicy::all()
        .iter()
        .position(|policy| *policy == config.stale_results)
        .unwrap_or(0);
    let stale_results = Select::new(
        "When an older fetch finishes after a newer one:",
        StaleResultPolicy::all().to_vec(),
    )
    .with_help_message("discard: keep the latest selection, apply: last reply wins")
    .with_starting_cursor(cursor)
    .prompt()
    .context("Failed to read stale-result policy")?;

    config.set_api_key(api_key);
    config.initial_city = city.trim().to_string();
    config.stale_results = stale_results;
    // Validate before writing anything.
    config.store_settings()?;
    config.save()?;

    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

/// Point the startup city at the `show` argument, if one was given.
fn apply_city_argument(config: &mut Config, city: Option<&str>) -> anyhow::Result<()> {
    if let Some(raw) = city {
        let city = City::parse(raw).ok_or_else(|| anyhow!("CITY argument must not be blank"))?;
        config.initial_city = city.to_string();
    }
    Ok(())
}

async fn show(mut config: Config, city: Option<String>, json: bool) -> anyhow::Result<()> {
    apply_city_argument(&mut config, city.as_deref())?;

    debug!(city = %config.initial_city, json, "show");
    let provider = provider_from_config(&config)?;
    let store = WeatherStateStore::new(config.store_settings()?, provider)?;
    store.settle().await;

    let state = store.current_state();
    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print!("{}", render::state(&state));
    }

    if state.status == FetchStatus::Failed {
        bail!(
            "{}",
            state.error_message.as_deref().unwrap_or("weather fetch failed")
        );
    }
    Ok(())
}
