//! Webhook message payload.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::validation::validate_url;
use crate::{Embed, Text};

/// Mention categories that may be parsed from message content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AllowedMentionType {
    Roles,
    Users,
    Everyone,
}

/// Controls which mentions in the content notify their targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedMentions {
    pub parse: Vec<AllowedMentionType>,
    pub roles: Vec<String>,
    pub users: Vec<String>,
    pub replied_user: bool,
}

impl AllowedMentions {
    /// Suppresses every mention.
    pub fn none() -> Self {
        Self::default()
    }
}

/// A webhook message.
///
/// A message must carry content or at least one embed to be deliverable, see
/// [`Message::is_empty`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_mentions: Option<AllowedMentions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_name: Option<String>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<Text>) -> Self {
        self.content = Some(content.into().to_string());
        self
    }

    /// Overrides the webhook's display name.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Overrides the webhook's avatar. Invalid URLs clear the override.
    #[must_use]
    pub fn with_avatar_url(mut self, avatar_url: &str) -> Self {
        self.avatar_url = validate_url(avatar_url);
        self
    }

    #[must_use]
    pub fn with_tts(mut self, tts: bool) -> Self {
        self.tts = Some(tts);
        self
    }

    #[must_use]
    pub fn with_embeds(mut self, embeds: impl IntoIterator<Item = Embed>) -> Self {
        self.embeds = Some(embeds.into_iter().collect());
        self
    }

    #[must_use]
    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.get_or_insert_with(Vec::new).push(embed);
        self
    }

    #[must_use]
    pub fn with_allowed_mentions(mut self, allowed_mentions: AllowedMentions) -> Self {
        self.allowed_mentions = Some(allowed_mentions);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: u64) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Names the thread created by a message sent to a forum channel.
    #[must_use]
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = Some(thread_name.into());
        self
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn embeds(&self) -> &[Embed] {
        self.embeds.as_deref().unwrap_or_default()
    }

    /// Returns true if the message has neither content nor embeds.
    ///
    /// An explicitly empty embed list still counts as embeds.
    pub fn is_empty(&self) -> bool {
        self.content.as_deref().is_none_or(str::is_empty) && self.embeds.is_none()
    }
}

impl From<&str> for Message {
    fn from(content: &str) -> Self {
        Self::new().with_content(content)
    }
}

impl From<String> for Message {
    fn from(content: String) -> Self {
        Self::new().with_content(content)
    }
}

impl From<Text> for Message {
    fn from(content: Text) -> Self {
        Self::new().with_content(content)
    }
}

impl From<Embed> for Message {
    fn from(embed: Embed) -> Self {
        Self::new().with_embeds([embed])
    }
}
