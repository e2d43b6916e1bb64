//! The single owner of [`AppState`].
//!
//! Every mutation goes through [`WeatherStateStore`]. Mutations are short
//! synchronous critical sections; the only asynchronous work is the fetch
//! that [`FetchOrchestrator`] runs on the captured Tokio runtime.

use anyhow::Context;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tokio::{
    runtime::Handle,
    sync::{Notify, watch},
};
use tracing::{debug, info, warn};

use crate::{
    error::{FetchError, FetchOutcome},
    fetch::FetchOrchestrator,
    model::{AppState, City, FetchStatus},
    provider::WeatherProvider,
};

/// What to do with a result whose fetch was superseded by a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleResultPolicy {
    /// Only the most recently triggered fetch may write its result.
    #[default]
    Discard,
    /// Every fetch writes its result; whichever finishes last wins.
    Apply,
}

impl StaleResultPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaleResultPolicy::Discard => "discard",
            StaleResultPolicy::Apply => "apply",
        }
    }

    pub const fn all() -> &'static [StaleResultPolicy] {
        &[StaleResultPolicy::Discard, StaleResultPolicy::Apply]
    }
}

impl fmt::Display for StaleResultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub initial_city: City,
    pub stale_results: StaleResultPolicy,
}

/// Token returned by [`WeatherStateStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listener = Arc<dyn Fn(&AppState) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

struct Inner {
    state: AppState,
    latest_generation: u64,
    in_flight: usize,
}

pub(crate) struct Shared {
    inner: Mutex<Inner>,
    listeners: Mutex<Listeners>,
    watch_tx: watch::Sender<AppState>,
    settled: Notify,
    stale_results: StaleResultPolicy,
}

/// A fetch that has been stamped and moved to `Loading`.
#[derive(Debug, Clone)]
pub(crate) struct FetchTicket {
    pub(crate) generation: u64,
    pub(crate) city: City,
}

impl Shared {
    /// Apply `mutate` under the lock and notify if it reports a change.
    fn update(&self, mutate: impl FnOnce(&mut AppState) -> bool) -> bool {
        let published = {
            let mut inner = self.inner.lock();
            if !mutate(&mut inner.state) {
                return false;
            }
            self.publish_locked(&inner)
        };
        self.notify(&published);
        true
    }

    // The watch channel is fed under the lock so it never goes backwards.
    fn publish_locked(&self, inner: &Inner) -> AppState {
        let state = inner.state.clone();
        self.watch_tx.send_replace(state.clone());
        state
    }

    fn notify(&self, state: &AppState) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(state);
        }
    }

    fn stamp_locked(inner: &mut Inner, city: City) -> FetchTicket {
        inner.latest_generation += 1;
        inner.in_flight += 1;
        inner.state.status = FetchStatus::Loading;
        inner.state.error_message = None;

        FetchTicket {
            generation: inner.latest_generation,
            city,
        }
    }

    /// Stamp a fetch for the current city and move to `Loading`.
    pub(crate) fn begin_fetch(&self, city: City) -> (FetchTicket, AppState) {
        let mut inner = self.inner.lock();
        let ticket = Self::stamp_locked(&mut inner, city);
        (ticket, self.publish_locked(&inner))
    }

    /// Switch to `city` and stamp its fetch in the same critical section, so
    /// the newest selection always holds the newest generation.
    pub(crate) fn select_and_begin(&self, city: City) -> Option<(FetchTicket, AppState)> {
        let mut inner = self.inner.lock();
        if inner.state.current_city == city {
            return None;
        }
        inner.state.current_city = city.clone();
        let ticket = Self::stamp_locked(&mut inner, city);
        Some((ticket, self.publish_locked(&inner)))
    }

    pub(crate) fn finish_fetch(&self, ticket: FetchTicket, outcome: FetchOutcome) {
        let published = {
            let mut inner = self.inner.lock();

            if self.stale_results == StaleResultPolicy::Discard
                && ticket.generation != inner.latest_generation
            {
                debug!(
                    city = %ticket.city,
                    generation = ticket.generation,
                    latest = inner.latest_generation,
                    "discarding result of superseded weather fetch"
                );
                return;
            }

            match outcome {
                Ok(snapshot) => {
                    info!(
                        city = %ticket.city,
                        forecast_days = snapshot.forecast.len(),
                        "weather fetch succeeded"
                    );
                    inner.state.snapshot = Some(snapshot);
                    inner.state.status = FetchStatus::Success;
                    inner.state.error_message = None;
                }
                Err(err) => {
                    warn!(city = %ticket.city, error = %err, "weather fetch failed");
                    inner.state.status = FetchStatus::Failed;
                    inner.state.error_message = Some(err.to_string());
                }
            }
            self.publish_locked(&inner)
        };

        self.notify(&published);
    }

    fn fetch_settled(&self) {
        let mut inner = self.inner.lock();
        inner.in_flight -= 1;
        if inner.in_flight == 0 {
            self.settled.notify_waiters();
        }
    }
}

/// Keeps the in-flight count honest and guarantees a terminal write, even if
/// the fetch task unwinds before it produced an outcome.
pub(crate) struct FetchGuard {
    shared: Arc<Shared>,
    city: City,
    ticket: Option<FetchTicket>,
}

impl FetchGuard {
    fn new(shared: Arc<Shared>, ticket: FetchTicket) -> Self {
        Self {
            shared,
            city: ticket.city.clone(),
            ticket: Some(ticket),
        }
    }

    pub(crate) fn city(&self) -> &City {
        &self.city
    }

    pub(crate) fn complete(mut self, outcome: FetchOutcome) {
        if let Some(ticket) = self.ticket.take() {
            self.shared.finish_fetch(ticket, outcome);
        }
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.shared.finish_fetch(
                ticket,
                Err(FetchError::Transport(
                    "fetch task ended without a result".to_string(),
                )),
            );
        }
        self.shared.fetch_settled();
    }
}

/// Observable weather state plus the entry points that change it.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct WeatherStateStore {
    shared: Arc<Shared>,
    orchestrator: FetchOrchestrator,
    runtime: Handle,
}

impl fmt::Debug for WeatherStateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherStateStore")
            .field("state", &self.current_state())
            .field("stale_results", &self.shared.stale_results)
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl WeatherStateStore {
    /// Create the store and immediately start fetching the initial city.
    ///
    /// Must be called from within a Tokio runtime; fetches are spawned onto
    /// it, so the mutation methods themselves can be called from any thread.
    pub fn new(
        settings: StoreSettings,
        provider: Arc<dyn WeatherProvider>,
    ) -> anyhow::Result<Self> {
        let runtime = Handle::try_current()
            .context("WeatherStateStore must be created inside a Tokio runtime")?;

        let state = AppState::new(settings.initial_city.clone());
        let (watch_tx, _) = watch::channel(state.clone());

        let store = Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state,
                    latest_generation: 0,
                    in_flight: 0,
                }),
                listeners: Mutex::new(Listeners::default()),
                watch_tx,
                settled: Notify::new(),
                stale_results: settings.stale_results,
            }),
            orchestrator: FetchOrchestrator::new(provider),
            runtime,
        };

        info!(
            city = %settings.initial_city,
            stale_results = ?settings.stale_results,
            "weather store created"
        );
        let (ticket, published) = store.shared.begin_fetch(settings.initial_city);
        store.launch(ticket, published);

        Ok(store)
    }

    fn launch(&self, ticket: FetchTicket, published: AppState) {
        debug!(city = %ticket.city, generation = ticket.generation, "weather fetch started");
        let guard = FetchGuard::new(Arc::clone(&self.shared), ticket);
        self.shared.notify(&published);
        self.orchestrator.start(&self.runtime, guard);
    }

    /// Switch to `name` and fetch its weather in the background.
    ///
    /// Returns `false` without doing anything if `name` is blank or already
    /// the current city.
    pub fn select_city(&self, name: &str) -> bool {
        let Some(city) = City::parse(name) else {
            return false;
        };

        let Some((ticket, published)) = self.shared.select_and_begin(city) else {
            return false;
        };

        info!(city = %ticket.city, "city selected");
        self.launch(ticket, published);
        true
    }

    /// Put `name` at the front of the favorites unless it is blank or already there.
    pub fn add_favorite(&self, name: &str) -> bool {
        let Some(city) = City::parse(name) else {
            return false;
        };

        let added = self
            .shared
            .update(|state| state.favorite_cities.add(city.clone()));
        if added {
            debug!(city = %city, "favorite added");
        }
        added
    }

    /// Drop the oldest favorite (the last in the list).
    pub fn remove_oldest_favorite(&self) -> Option<City> {
        let mut removed = None;
        self.shared.update(|state| {
            removed = state.favorite_cities.remove_oldest();
            removed.is_some()
        });
        if let Some(city) = &removed {
            debug!(city = %city, "favorite removed");
        }
        removed
    }

    /// Acknowledge a failed fetch: `Failed` becomes `Idle` and the message goes away.
    pub fn dismiss_error(&self) -> bool {
        self.shared.update(|state| {
            if state.status != FetchStatus::Failed {
                return false;
            }
            state.status = FetchStatus::Idle;
            state.error_message = None;
            true
        })
    }

    pub fn current_state(&self) -> AppState {
        self.shared.inner.lock().state.clone()
    }

    /// Call `listener` with the new state after every change.
    ///
    /// Listeners run on whichever thread made the change, after the store's
    /// lock is released, so they may read the store but should stay quick.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AppState) + Send + Sync + 'static,
    {
        let mut listeners = self.shared.listeners.lock();
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.entries.push((id, Arc::new(listener)));
        Subscription(id)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.shared.listeners.lock();
        let before = listeners.entries.len();
        listeners.entries.retain(|(id, _)| *id != subscription.0);
        listeners.entries.len() != before
    }

    /// A receiver that always holds the latest state.
    pub fn watch(&self) -> watch::Receiver<AppState> {
        self.shared.watch_tx.subscribe()
    }

    /// Wait until no fetch is in flight.
    pub async fn settle(&self) {
        loop {
            let settled = self.shared.settled.notified();
            if self.shared.inner.lock().in_flight == 0 {
                return;
            }
            settled.await;
        }
    }
}
