use anyhow::Result;
use cityweather_core::{
    AppState, Config, FetchStatus, WeatherStateStore, provider_from_config,
};
use inquire::{InquireError, Select, Text};
use std::fmt;

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    SelectCity,
    OpenFavorite,
    AddFavorite,
    RemoveOldestFavorite,
    DismissError,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuItem::SelectCity => "Select a city",
            MenuItem::OpenFavorite => "Open a favorite",
            MenuItem::AddFavorite => "Add a favorite",
            MenuItem::RemoveOldestFavorite => "Remove the oldest favorite",
            MenuItem::DismissError => "Dismiss the error",
            MenuItem::Quit => "Quit",
        })
    }
}

fn menu_for(state: &AppState) -> Vec<MenuItem> {
    let mut items = vec![MenuItem::SelectCity];
    if !state.favorite_cities.is_empty() {
        items.push(MenuItem::OpenFavorite);
    }
    items.push(MenuItem::AddFavorite);
    if !state.favorite_cities.is_empty() {
        items.push(MenuItem::RemoveOldestFavorite);
    }
    if state.status == FetchStatus::Failed {
        items.insert(0, MenuItem::DismissError);
    }
    items.push(MenuItem::Quit);
    items
}

enum Flow {
    Continue,
    Quit,
}

/// Interactive loop: render, ask, forward the answer to the store, repeat.
pub async fn run(config: Config) -> Result<()> {
    let provider = provider_from_config(&config)?;
    let store = WeatherStateStore::new(config.store_settings()?, provider)?;

    let subscription = store.subscribe(|state| {
        if state.status == FetchStatus::Loading {
            eprintln!("Fetching weather for {}...", state.current_city);
        }
    });

    loop {
        store.settle().await;
        print!("\n{}", render::state(&store.current_state()));

        // Prompts block, so they run off the async worker.
        let handle = store.clone();
        let flow = tokio::task::spawn_blocking(move || prompt(&handle)).await??;
        if let Flow::Quit = flow {
            break;
        }
    }

    store.unsubscribe(subscription);
    Ok(())
}

fn prompt(store: &WeatherStateStore) -> Result<Flow> {
    let state = store.current_state();

    let choice = match Select::new("What next?", menu_for(&state)).prompt() {
        Ok(choice) => choice,
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            return Ok(Flow::Quit);
        }
        Err(err) => return Err(err.into()),
    };

    match choice {
        MenuItem::SelectCity => {
            let name = Text::new("City:").prompt()?;
            if !store.select_city(&name) {
                println!("Nothing to do: \"{}\" is blank or already shown.", name.trim());
            }
        }
        MenuItem::OpenFavorite => {
            let names: Vec<String> = state
                .favorite_cities
                .iter()
                .map(|city| city.to_string())
                .collect();
            let name = Select::new("Favorite:", names).prompt()?;
            store.select_city(&name);
        }
        MenuItem::AddFavorite => {
            let name = Text::new("Favorite city:")
                .with_default(state.current_city.as_str())
                .prompt()?;
            if !store.add_favorite(&name) {
                println!("Nothing to do: \"{}\" is blank or already a favorite.", name.trim());
            }
        }
        MenuItem::RemoveOldestFavorite => {
            if let Some(city) = store.remove_oldest_favorite() {
                println!("Removed {city} from favorites.");
            }
        }
        MenuItem::DismissError => {
            store.dismiss_error();
        }
        MenuItem::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}
