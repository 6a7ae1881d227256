pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{Res, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for publishing into the single
/// output channel the bot is configured with. Implementing this trait allows
/// different chat services to be used with the rsvp-bot.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Start the chat client listener.
    ///
    /// This sets up the operator command surface and blocks while the
    /// connection to the chat platform is live.
    async fn start(&self) -> Void;

    /// Post a new message to the output channel.
    ///
    /// Returns the platform message id, which is what standing-message refs
    /// store for later edits.
    async fn post_message(&self, text: &str) -> Res<String>;

    /// Edit an existing message in the output channel.
    ///
    /// Fails when the message no longer exists; callers use that failure to
    /// recreate the standing message.
    async fn update_message(&self, message_id: &str, text: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
