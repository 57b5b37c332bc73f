//! Markdown decoration of arbitrary values.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::TRACING_TARGET;

/// Text that renders as chat markdown.
///
/// The wrapped value is captured as a string when the `Text` is created.
/// Decorations are applied at render time, innermost first: italic, bold,
/// underline, strikethrough, then quote and code blocks.
///
/// ```rust,ignore
/// use hookline_message::Text;
///
/// let text = Text::new("Hello").bold(true).italic(true);
/// assert_eq!(text.to_string(), "***Hello***");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    value: String,
    bold: bool,
    italic: bool,
    underline: bool,
    strikethrough: bool,
    code: bool,
    quote: bool,
    multiline: Option<bool>,
}

impl Text {
    /// Creates text from any displayable value, rendered verbatim.
    pub fn new(value: impl fmt::Display) -> Self {
        Self {
            value: value.to_string(),
            ..Default::default()
        }
    }

    /// Creates text from a serializable value as pretty-printed JSON in a code block.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        let value = serde_json::to_string_pretty(value).unwrap_or_else(|error| {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %error,
                "Failed to render value as json"
            );
            String::new()
        });

        Self {
            value,
            code: true,
            ..Default::default()
        }
    }

    /// Creates text from the alternate debug representation of a value, in a code block.
    pub fn debug<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        Self {
            value: format!("{value:#?}"),
            code: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    #[must_use]
    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    #[must_use]
    pub fn underline(mut self, underline: bool) -> Self {
        self.underline = underline;
        self
    }

    #[must_use]
    pub fn strikethrough(mut self, strikethrough: bool) -> Self {
        self.strikethrough = strikethrough;
        self
    }

    /// Wraps the text in inline code, or a fenced block when multiline.
    #[must_use]
    pub fn code(mut self, code: bool) -> Self {
        self.code = code;
        self
    }

    /// Prefixes the text with a quote marker, `>>>` when multiline.
    #[must_use]
    pub fn quote(mut self, quote: bool) -> Self {
        self.quote = quote;
        self
    }

    /// Overrides newline detection for quote and code rendering.
    #[must_use]
    pub fn force_multiline(mut self, multiline: bool) -> Self {
        self.multiline = Some(multiline);
        self
    }

    /// Restores newline detection for quote and code rendering.
    #[must_use]
    pub fn auto_multiline(mut self) -> Self {
        self.multiline = None;
        self
    }

    /// Returns true if the rendered text would be empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && !self.code && !self.quote
    }

    fn render(&self) -> String {
        let mut rendered = self.value.clone();

        if self.italic {
            rendered = format!("*{rendered}*");
        }
        if self.bold {
            rendered = format!("**{rendered}**");
        }
        if self.underline {
            rendered = format!("__{rendered}__");
        }
        if self.strikethrough {
            rendered = format!("~~{rendered}~~");
        }

        let multiline = self.multiline.unwrap_or_else(|| rendered.contains('\n'));
        if self.quote {
            rendered = if multiline {
                format!(">>> {rendered}")
            } else {
                format!("> {rendered}")
            };
        }
        if self.code {
            rendered = if multiline {
                format!("```\n{rendered}\n```")
            } else {
                format!("`{rendered}`")
            };
        }

        rendered
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }
}

impl From<&String> for Text {
    fn from(value: &String) -> Self {
        Self::new(value)
    }
}
