//! Embed card builder.

use jiff::Timestamp;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::validation::{validate_timestamp, validate_url};
use crate::{TRACING_TARGET, Text};

/// Preset embed colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EmbedColor {
    /// Green.
    Success,
    /// Red.
    Error,
    /// Amber.
    Warning,
}

impl EmbedColor {
    /// Returns the RGB value of this color.
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::Success => 0x00ff00,
            Self::Error => 0xff0000,
            Self::Warning => 0xffcc00,
        }
    }
}

/// An image or thumbnail reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Media {
    pub url: String,
}

/// Embed footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Footer {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Embed author line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// A name/value pair shown in the embed body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
}

/// A rich embed card.
///
/// Setters never fail: invalid URLs and dates leave the field unset. Image
/// URLs (footer icon, image, thumbnail, author icon) fall back to the image
/// given to [`Embed::with_fallback_image`] when the supplied URL is invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<Footer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<Author>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<Field>,

    #[serde(skip)]
    fallback_image_url: Option<String>,
}

impl Embed {
    /// Creates an empty embed without an image fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the image used in place of invalid image URLs.
    #[must_use]
    pub fn with_fallback_image(mut self, url: Option<impl AsRef<str>>) -> Self {
        self.fallback_image_url = url.and_then(|url| validate_url(url.as_ref()));
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<Text>) -> Self {
        self.title = Some(title.into().to_string());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<Text>) -> Self {
        self.description = Some(description.into().to_string());
        self
    }

    /// Sets the title link. Invalid URLs are ignored.
    #[must_use]
    pub fn with_url(mut self, url: &str) -> Self {
        if let Some(url) = validate_url(url) {
            self.url = Some(url);
        }
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Parses and sets the timestamp. Unparseable input is ignored.
    #[must_use]
    pub fn with_timestamp_str(mut self, timestamp: &str) -> Self {
        match validate_timestamp(timestamp) {
            Some(timestamp) => self.timestamp = Some(timestamp),
            None => tracing::debug!(
                target: TRACING_TARGET,
                timestamp,
                "Ignoring invalid embed timestamp"
            ),
        }
        self
    }

    /// Sets the timestamp from milliseconds since the Unix epoch.
    #[must_use]
    pub fn with_timestamp_millis(mut self, millis: i64) -> Self {
        if let Ok(timestamp) = Timestamp::from_millisecond(millis) {
            self.timestamp = Some(timestamp);
        }
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn with_preset_color(self, color: EmbedColor) -> Self {
        self.with_color(color.value())
    }

    #[must_use]
    pub fn success(self) -> Self {
        self.with_preset_color(EmbedColor::Success)
    }

    #[must_use]
    pub fn error(self) -> Self {
        self.with_preset_color(EmbedColor::Error)
    }

    #[must_use]
    pub fn warning(self) -> Self {
        self.with_preset_color(EmbedColor::Warning)
    }

    /// Sets the footer. Empty text leaves the footer unset.
    ///
    /// The fallback image is only consulted when an icon is given.
    #[must_use]
    pub fn with_footer(mut self, text: impl Into<Text>, icon_url: Option<&str>) -> Self {
        let text = text.into().to_string();
        if !text.is_empty() {
            self.footer = Some(Footer {
                text,
                icon_url: icon_url.and_then(|url| self.image_or_fallback(url)),
            });
        }
        self
    }

    #[must_use]
    pub fn with_image(mut self, url: &str) -> Self {
        if let Some(url) = self.image_or_fallback(url) {
            self.image = Some(Media { url });
        }
        self
    }

    #[must_use]
    pub fn with_thumbnail(mut self, url: &str) -> Self {
        if let Some(url) = self.image_or_fallback(url) {
            self.thumbnail = Some(Media { url });
        }
        self
    }

    /// Sets the author line. An empty name leaves the author unset.
    #[must_use]
    pub fn with_author(
        mut self,
        name: impl Into<Text>,
        url: Option<&str>,
        icon_url: Option<&str>,
    ) -> Self {
        let name = name.into().to_string();
        if !name.is_empty() {
            self.author = Some(Author {
                name,
                url: url.and_then(validate_url),
                icon_url: icon_url.and_then(|url| self.image_or_fallback(url)),
            });
        }
        self
    }

    #[must_use]
    pub fn add_field(
        mut self,
        name: impl Into<Text>,
        value: impl Into<Text>,
        inline: Option<bool>,
    ) -> Self {
        self.fields.push(Field {
            name: name.into().to_string(),
            value: value.into().to_string(),
            inline,
        });
        self
    }

    /// Adds one field per pair, rendering values as multiline text.
    #[must_use]
    pub fn add_fields<I, K, V>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Text>,
        V: Into<Text>,
    {
        fields.into_iter().fold(self, |embed, (name, value)| {
            embed.add_field(name, value.into().force_multiline(true), None)
        })
    }

    /// Adds one field per entry of a JSON object.
    ///
    /// Strings and scalars are shown as-is, nested arrays and objects as
    /// pretty-printed JSON blocks. Non-object values add nothing.
    #[must_use]
    pub fn add_json_fields(self, object: &serde_json::Value) -> Self {
        let Some(object) = object.as_object() else {
            return self;
        };

        let fields = object.iter().map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(value) => Text::new(value),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => Text::json(value),
                scalar => Text::new(scalar),
            };
            (key.as_str(), value)
        });

        self.add_fields(fields)
    }

    /// Returns the configured fallback image, if any.
    pub fn fallback_image_url(&self) -> Option<&str> {
        self.fallback_image_url.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn image_or_fallback(&self, url: &str) -> Option<String> {
        validate_url(url).or_else(|| self.fallback_image_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const IMAGE_URL: &str = "https://picsum.photos/200";

    fn to_json(embed: &Embed) -> serde_json::Value {
        serde_json::to_value(embed).unwrap()
    }

    #[test]
    fn test_title_from_non_text_value() {
        let embed = Embed::new().with_title(Text::new(123));
        assert_eq!(to_json(&embed), json!({ "title": "123" }));
    }

    #[test]
    fn test_description_from_json_value() {
        let object = json!({ "foo": "bar", "test": 123 });
        let embed = Embed::new().with_description(Text::json(&object));

        let expected = format!(
            "```\n{}\n```",
            serde_json::to_string_pretty(&object).unwrap()
        );
        assert_eq!(to_json(&embed), json!({ "description": expected }));
    }

    #[test]
    fn test_invalid_url_is_ignored() {
        let embed = Embed::new().with_url("not a url");
        assert_eq!(to_json(&embed), json!({}));
    }

    #[test]
    fn test_timestamp_from_millis() {
        let embed = Embed::new().with_timestamp_millis(1_709_296_200_000);
        assert_eq!(to_json(&embed), json!({ "timestamp": "2024-03-01T12:30:00Z" }));
    }

    #[test]
    fn test_invalid_timestamp_is_ignored() {
        let embed = Embed::new().with_timestamp_str("not a date");
        assert_eq!(to_json(&embed), json!({}));
    }

    #[test]
    fn test_preset_colors() {
        assert_eq!(Embed::new().success().color, Some(0x00ff00));
        assert_eq!(Embed::new().error().color, Some(0xff0000));
        assert_eq!(Embed::new().warning().color, Some(0xffcc00));
        assert_eq!("warning".parse::<EmbedColor>().unwrap(), EmbedColor::Warning);
    }

    #[test]
    fn test_footer_with_invalid_icon() {
        let embed = Embed::new().with_footer("test", Some("not a url"));
        assert_eq!(to_json(&embed), json!({ "footer": { "text": "test" } }));
    }

    #[test]
    fn test_footer_without_icon_does_not_use_fallback() {
        let embed = Embed::new()
            .with_fallback_image(Some(IMAGE_URL))
            .with_footer("test", None);
        assert_eq!(to_json(&embed), json!({ "footer": { "text": "test" } }));
    }

    #[test]
    fn test_footer_invalid_icon_uses_fallback() {
        let embed = Embed::new()
            .with_fallback_image(Some(IMAGE_URL))
            .with_footer("test", Some("not a url"));
        assert_eq!(
            to_json(&embed),
            json!({ "footer": { "text": "test", "icon_url": IMAGE_URL } })
        );
    }

    #[test]
    fn test_empty_footer_is_ignored() {
        let embed = Embed::new().with_footer("", Some(IMAGE_URL));
        assert_eq!(to_json(&embed), json!({}));
    }

    #[test]
    fn test_invalid_image_without_fallback() {
        let embed = Embed::new().with_image("not a url");
        assert_eq!(to_json(&embed), json!({}));
    }

    #[test]
    fn test_invalid_image_uses_fallback() {
        let embed = Embed::new()
            .with_fallback_image(Some(IMAGE_URL))
            .with_image("not a url")
            .with_thumbnail("not a url");
        assert_eq!(
            to_json(&embed),
            json!({ "image": { "url": IMAGE_URL }, "thumbnail": { "url": IMAGE_URL } })
        );
    }

    #[test]
    fn test_invalid_fallback_is_discarded() {
        let embed = Embed::new().with_fallback_image(Some("not a url"));
        assert!(embed.fallback_image_url().is_none());
    }

    #[test]
    fn test_author_drops_invalid_urls() {
        let embed = Embed::new().with_author("test", Some("not a url"), None);
        assert_eq!(to_json(&embed), json!({ "author": { "name": "test" } }));

        let embed = Embed::new().with_author("test", Some("https://example.com"), Some("not a url"));
        assert_eq!(
            to_json(&embed),
            json!({ "author": { "name": "test", "url": "https://example.com" } })
        );
    }

    #[test]
    fn test_author_icon_uses_fallback() {
        let embed = Embed::new()
            .with_fallback_image(Some(IMAGE_URL))
            .with_author("test", None, Some("not a url"));
        assert_eq!(
            to_json(&embed),
            json!({ "author": { "name": "test", "icon_url": IMAGE_URL } })
        );
    }

    #[test]
    fn test_fields() {
        let embed = Embed::new()
            .add_field(Text::new(123), Text::new("value"), None)
            .add_field("inline", "yes", Some(true));
        assert_eq!(
            to_json(&embed),
            json!({ "fields": [
                { "name": "123", "value": "value" },
                { "name": "inline", "value": "yes", "inline": true },
            ] })
        );
    }

    #[test]
    fn test_fields_from_json_object() {
        let embed = Embed::new().add_json_fields(&json!({ "a": "test", "b": 123 }));
        assert_eq!(
            to_json(&embed),
            json!({ "fields": [
                { "name": "a", "value": "test" },
                { "name": "b", "value": "123" },
            ] })
        );
    }

    #[test]
    fn test_nested_json_field_is_code_block() {
        let embed = Embed::new().add_json_fields(&json!({ "nested": { "foo": "bar" } }));
        assert_eq!(embed.fields()[0].value, "```\n{\n  \"foo\": \"bar\"\n}\n```");
    }
}
