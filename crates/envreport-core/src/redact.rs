//! Masking of values whose keys look sensitive.

use regex::{Regex, RegexBuilder};

/// Replacement for redacted values.
pub const MASK: &str = "********";

/// Keys containing any of these fragments are redacted unless configured otherwise.
pub const DEFAULT_PATTERN: &str = "password|passwd|secret|token|credential|key";

/// Decides which values are masked, by key.
///
/// Matching is a case-insensitive, unanchored search against the key. Keys
/// themselves are never altered.
#[derive(Debug, Clone)]
pub struct Redactor {
    pattern: Option<Regex>,
}

impl Redactor {
    /// Compiles `pattern`. An empty pattern never redacts.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        if pattern.is_empty() {
            return Ok(Self::disabled());
        }
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            pattern: Some(regex),
        })
    }

    /// A redactor that never masks anything.
    pub fn disabled() -> Self {
        Self { pattern: None }
    }

    /// Returns true if values of `key` must be masked.
    pub fn should_redact(&self, key: &str) -> bool {
        self.pattern.as_ref().is_some_and(|re| re.is_match(key))
    }

    /// Returns `value`, or [`MASK`] if `key` is sensitive.
    pub fn render<'a>(&self, key: &str, value: &'a str) -> &'a str {
        if self.should_redact(key) { MASK } else { value }
    }

    /// Renders one command-line argument.
    ///
    /// `-D<key>=<value>` and `--<key>=<value>` have their value masked when
    /// the key is sensitive; anything else is returned unchanged.
    pub fn render_argument(&self, arg: &str) -> String {
        let body = arg
            .strip_prefix("--")
            .map(|b| ("--", b))
            .or_else(|| arg.strip_prefix("-D").map(|b| ("-D", b)));
        if let Some((prefix, body)) = body
            && let Some((key, value)) = body.split_once('=')
        {
            return format!("{}{}={}", prefix, key, self.render(key, value));
        }
        arg.to_string()
    }
}

impl Default for Redactor {
    fn default() -> Self {
        // The default pattern is a literal alternation and always compiles.
        Self::new(DEFAULT_PATTERN).unwrap_or_else(|_| Self::disabled())
    }
}
