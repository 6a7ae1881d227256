//! Slack implementation of the chat client.
//!
//! Runs a socket-mode listener for the operator slash commands and posts or
//! edits messages in the configured RSVP channel over the Web API.

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    tracker::{Tracker, command::Command},
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tracing::{error, info, instrument, warn};

use std::{
    ops::Deref,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub async fn slack(config: &Config, tracker: Tracker, connected: Arc<AtomicBool>) -> Res<Self> {
        let client = SlackChatClient::new(config, tracker, connected).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    tracker: Tracker,
    chat: ChatClient,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    app_token: SlackApiToken,
    bot_token: SlackApiToken,
    channel: SlackChannelId,
    client: Arc<FullClient>,
    tracker: Tracker,
    connected: Arc<AtomicBool>,
}

impl Deref for SlackChatClient {
    type Target = FullClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config, tracker: Tracker, connected: Arc<AtomicBool>) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Verify the bot token before any scheduled work starts.

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await?;

        info!("Slack bot user ID: {}", bot_user.user_id.0);

        connected.store(true, Ordering::SeqCst);

        Ok(Self {
            app_token,
            bot_token,
            channel: SlackChannelId(config.rsvp_channel_id.clone()),
            client,
            tracker,
            connected,
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    async fn start(&self) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new().with_command_events(handle_command_event);

        // Initialize the socket mode listener environment.

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState {
            tracker: self.tracker.clone(),
            chat: ChatClient::from(self.clone()),
        }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events,
        socket_mode_listener.listen_for(&self.app_token).await?;

        // Start WS connections calling Slack API to get WS url for the token,
        // and wait for Ctrl-C to shutdown.
        socket_mode_listener.serve().await;

        self.connected.store(false, Ordering::SeqCst);

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn post_message(&self, text: &str) -> Res<String> {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(self.channel.clone(), message).with_as_user(true).with_link_names(true);

        let session = self.client.open_session(&self.bot_token);

        let response = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to post message: {}", e))?;

        Ok(response.ts.0)
    }

    #[instrument(skip(self, text))]
    async fn update_message(&self, message_id: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatUpdateRequest::new(self.channel.clone(), message, SlackTs(message_id.to_string()));

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_update(&request).await.map_err(|e| anyhow::anyhow!("Failed to update message `{message_id}`: {}", e))?;

        Ok(())
    }
}

// Socket mode listener callbacks for Slack.

/// Handles slash command events from Slack.
#[instrument(skip_all)]
async fn handle_command_event(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    let name = event.command.0.as_str();
    let text = event.text.as_deref().unwrap_or_default();

    let Some(command) = Command::parse(name, text) else {
        warn!("Received unknown or malformed command `{name}`.");
        return Ok(SlackCommandEventResponse::new(
            SlackMessageContent::new().with_text("Unknown command. Try /watchgroup, /unwatchgroup, /listgroups, or /refresh.".into()),
        ));
    };

    let reply = match user_state.tracker.handle_command(command, &user_state.chat).await {
        Ok(reply) => reply,
        Err(err) => {
            error!("Error while handling command `{name}`: {err:#}");
            "An error occurred while processing your command.".to_string()
        }
    };

    Ok(SlackCommandEventResponse::new(SlackMessageContent::new().with_text(reply)))
}
