//! Runtime services and shared state for the rsvp-bot.

use std::time::Duration;

use tracing::{error, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    service::{
        chat::ChatClient,
        health::{self, HealthState},
        source::SourceClient,
        store::StateStore,
    },
    tracker::Tracker,
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the state store, source client, chat client, and
/// configuration. It is designed to be trivially cloneable, allowing it to be
/// passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The tracking engine.
    pub tracker: Tracker,
    /// The chat client instance.
    pub chat: ChatClient,
    /// Liveness state for the health endpoint.
    pub health: HealthState,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the state store and load the persisted document.
        let store = StateStore::json(&config);
        let document = store.load().await?;

        // Initialize the event source client.
        let source = SourceClient::meetup(&config)?;

        // Initialize the tracker.
        let tracker = Tracker::new(store, source, document);

        // Initialize the liveness state and the slack client.
        let health = HealthState::new();
        let chat = ChatClient::slack(&config, tracker.clone(), health.connected_handle()).await?;

        Ok(Self { config, tracker, chat, health })
    }

    /// Starts the background tasks and blocks on the chat listener.
    pub async fn start(&self) -> Void {
        self.spawn_warm_up_timer();
        self.spawn_health_server();
        self.spawn_scheduler();

        self.chat.start().await
    }

    /// Flips the warm-up flag once after the configured grace period.
    fn spawn_warm_up_timer(&self) {
        let tracker = self.tracker.clone();
        let grace = Duration::from_secs(self.config.warm_up_secs);

        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            tracker.complete_warm_up();
        });
    }

    fn spawn_health_server(&self) {
        let port = self.config.health_port;
        let state = self.health.clone();

        tokio::spawn(async move {
            if let Err(err) = health::serve(port, state).await {
                error!("Health check server failed: {err:#}");
            }
        });
    }

    /// Runs both polling cadences on a single timeline.
    ///
    /// One loop owns both intervals, so a discovery pass and a reconcile pass
    /// can never interleave; operator refreshes serialize behind the same
    /// state mutex the passes use. Both tick immediately at startup.
    fn spawn_scheduler(&self) {
        let tracker = self.tracker.clone();
        let chat = self.chat.clone();
        let poll = Duration::from_secs(self.config.poll_interval_secs);
        let discovery = Duration::from_secs(self.config.discovery_interval_secs);

        tokio::spawn(async move {
            let mut reconcile_tick = tokio::time::interval(poll);
            let mut discovery_tick = tokio::time::interval(discovery);

            info!("Polling for RSVP updates every {}s and for new events every {}s.", poll.as_secs(), discovery.as_secs());

            loop {
                tokio::select! {
                    biased;

                    _ = discovery_tick.tick() => {
                        if let Err(err) = tracker.discover(&chat).await {
                            error!("Error finding upcoming events: {err:#}");
                        }
                    }
                    _ = reconcile_tick.tick() => {
                        if let Err(err) = tracker.reconcile_all(&chat).await {
                            error!("Error updating tracked events: {err:#}");
                        }
                    }
                }
            }
        });
    }
}
