//! CLI configuration.
//!
//! ```text
//! Cli
//! ├── webhook: WebhookConfig   # Endpoint, error policy, retry, fallback image
//! ├── http: ReqwestConfig      # Timeout, user agent
//! └── message: MessageArgs     # What to send
//! ```
//!
//! Every option can also be given through its environment variable.

use clap::{Args, Parser};
use hookline_message::{Embed, EmbedColor, Message};
use hookline_webhook::reqwest::ReqwestConfig;
use hookline_webhook::{Webhook, WebhookConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TRACING_TARGET_CONFIG;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "hookline")]
#[command(about = "Send a message to a chat webhook")]
#[command(version)]
pub struct Cli {
    /// Webhook endpoint and delivery policy.
    #[clap(flatten)]
    pub webhook: WebhookConfig,

    /// HTTP client configuration.
    #[clap(flatten)]
    pub http: ReqwestConfig,

    /// Message to send.
    #[clap(flatten)]
    pub message: MessageArgs,

    /// Seconds to wait for a throttled message to be redelivered
    #[arg(long = "max-wait", env = "HOOKLINE_MAX_WAIT", default_value = "300")]
    pub max_wait: u64,
}

impl Cli {
    /// Loads `.env` (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Logs the effective configuration.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            url = %self.webhook.url,
            propagate_errors = self.webhook.propagate_errors,
            retry_on_limit = self.webhook.retry_on_limit,
            fallback_image = self.webhook.fallback_image_url.is_some(),
            http_timeout_secs = self.http.http_timeout,
            max_wait_secs = self.max_wait,
            "configuration"
        );
    }
}

/// Message content and an optional embed.
///
/// An embed is attached when any of the embed options is given.
#[derive(Debug, Clone, Default, Args)]
pub struct MessageArgs {
    /// Message text
    #[arg(short = 'c', long)]
    pub content: Option<String>,

    /// Override the webhook's display name
    #[arg(long)]
    pub username: Option<String>,

    /// Override the webhook's avatar
    #[arg(long)]
    pub avatar_url: Option<String>,

    /// Read the message aloud
    #[arg(long)]
    pub tts: bool,

    /// Embed title
    #[arg(short = 't', long)]
    pub title: Option<String>,

    /// Embed description
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Link on the embed title
    #[arg(long)]
    pub embed_url: Option<String>,

    /// Embed color: success, error or warning
    #[arg(long)]
    pub color: Option<EmbedColor>,

    /// Embed image URL
    #[arg(long)]
    pub image: Option<String>,

    /// Embed thumbnail URL
    #[arg(long)]
    pub thumbnail: Option<String>,

    /// Embed footer text
    #[arg(long)]
    pub footer: Option<String>,

    /// Stamp the embed with the current time
    #[arg(long)]
    pub timestamp: bool,

    /// Embed field as NAME=VALUE, repeatable
    #[arg(short = 'f', long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// JSON object whose entries become embed fields
    #[arg(long, value_parser = parse_json_object)]
    pub json: Option<serde_json::Value>,
}

fn parse_field(value: &str) -> Result<(String, String), String> {
    let (name, value) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{value}`"))?;
    Ok((name.trim().to_owned(), value.to_owned()))
}

fn parse_json_object(value: &str) -> Result<serde_json::Value, String> {
    let parsed: serde_json::Value = serde_json::from_str(value).map_err(|e| e.to_string())?;
    if parsed.is_object() {
        Ok(parsed)
    } else {
        Err("expected a JSON object".to_owned())
    }
}

impl MessageArgs {
    fn has_embed(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.embed_url.is_some()
            || self.color.is_some()
            || self.image.is_some()
            || self.thumbnail.is_some()
            || self.footer.is_some()
            || self.timestamp
            || !self.fields.is_empty()
            || self.json.is_some()
    }

    fn to_embed(&self, webhook: &Webhook) -> Embed {
        let mut embed = webhook.embed();

        if let Some(title) = &self.title {
            embed = embed.with_title(title.as_str());
        }
        if let Some(description) = &self.description {
            embed = embed.with_description(description.as_str());
        }
        if let Some(url) = &self.embed_url {
            embed = embed.with_url(url);
        }
        if let Some(color) = self.color {
            embed = embed.with_preset_color(color);
        }
        if let Some(image) = &self.image {
            embed = embed.with_image(image);
        }
        if let Some(thumbnail) = &self.thumbnail {
            embed = embed.with_thumbnail(thumbnail);
        }
        if let Some(footer) = &self.footer {
            embed = embed.with_footer(footer.as_str(), None);
        }
        if self.timestamp {
            embed = embed.with_timestamp(jiff::Timestamp::now());
        }
        for (name, value) in &self.fields {
            embed = embed.add_field(name.as_str(), value.as_str(), None);
        }
        if let Some(json) = &self.json {
            embed = embed.add_json_fields(json);
        }

        embed
    }

    /// Builds the message to send.
    pub fn to_message(&self, webhook: &Webhook) -> Message {
        let mut message = Message::new();

        if let Some(content) = &self.content {
            message = message.with_content(content.as_str());
        }
        if let Some(username) = &self.username {
            message = message.with_username(username.as_str());
        }
        if let Some(avatar_url) = &self.avatar_url {
            message = message.with_avatar_url(avatar_url);
        }
        if self.tts {
            message = message.with_tts(true);
        }
        if self.has_embed() {
            message = message.add_embed(self.to_embed(webhook));
        }

        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("version=1.4.2"),
            Ok(("version".to_owned(), "1.4.2".to_owned()))
        );
        assert_eq!(
            parse_field("query=a=b"),
            Ok(("query".to_owned(), "a=b".to_owned()))
        );
        assert!(parse_field("missing").is_err());
    }

    #[test]
    fn test_parse_json_object() {
        assert!(parse_json_object(r#"{"a": 1}"#).is_ok());
        assert!(parse_json_object("[1, 2]").is_err());
        assert!(parse_json_object("{").is_err());
    }

    #[test]
    fn test_cli_parses_message() {
        let cli = Cli::try_parse_from([
            "hookline",
            "--webhook-url",
            "https://example.com/api/webhooks/1/abc",
            "--content",
            "hello",
            "--color",
            "success",
            "--field",
            "region=eu",
            "--retry-on-limit",
            "false",
        ])
        .unwrap();

        assert!(cli.webhook.propagate_errors);
        assert!(!cli.webhook.retry_on_limit);
        assert_eq!(cli.message.content.as_deref(), Some("hello"));
        assert_eq!(cli.message.color, Some(EmbedColor::Success));
        assert!(cli.message.has_embed());
    }

    #[test]
    fn test_content_only_has_no_embed() {
        let args = MessageArgs {
            content: Some("hello".to_owned()),
            ..MessageArgs::default()
        };
        assert!(!args.has_embed());
    }

    #[test]
    fn test_to_message_builds_embed() {
        let config = WebhookConfig::parse("https://example.com/api/webhooks/1/abc").unwrap();
        let webhook = Webhook::new(config, hookline_webhook::mock::MockProvider::new());
        let args = MessageArgs {
            content: Some("deployed".to_owned()),
            title: Some("api".to_owned()),
            color: Some(EmbedColor::Success),
            fields: vec![("version".to_owned(), "1.4.2".to_owned())],
            ..MessageArgs::default()
        };

        let payload = serde_json::to_value(args.to_message(&webhook)).unwrap();

        assert_eq!(payload["content"], "deployed");
        assert_eq!(payload["embeds"][0]["title"], "api");
        assert_eq!(payload["embeds"][0]["color"], 0x00ff00);
        assert_eq!(payload["embeds"][0]["fields"][0]["name"], "version");
        assert!(payload.get("tts").is_none());
    }
}
