#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod embed;
mod message;
mod text;
mod validation;

pub use embed::{Author, Embed, EmbedColor, Field, Footer, Media};
pub use message::{AllowedMentionType, AllowedMentions, Message};
pub use text::Text;
pub use validation::{validate_timestamp, validate_url};

/// Tracing target for payload building.
pub const TRACING_TARGET: &str = "hookline_message";

/// Shorthand for [`Text::new`].
pub fn text(value: impl std::fmt::Display) -> Text {
    Text::new(value)
}
