//! Registration options for the built-in visualizer.

use super::illegal_array::{ILLEGAL_ARRAY_CATEGORY, ILLEGAL_ARRAY_PATTERN};

/// Where and how the IllegalArray formatters are registered
///
/// The defaults reproduce the stock registration: the
/// `^cmn::IllegalArray<.+>$` pattern under the `trex_illegal_array` category,
/// enabled immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig
{
    /// Regular expression matched against canonical type names
    pub pattern: String,
    /// Category the summary and synthetic providers are grouped under
    pub category: String,
    /// Enable the category right after registering
    pub enable: bool,
}

impl Default for FormatterConfig
{
    fn default() -> Self
    {
        Self {
            pattern: ILLEGAL_ARRAY_PATTERN.to_string(),
            category: ILLEGAL_ARRAY_CATEGORY.to_string(),
            enable: true,
        }
    }
}

impl FormatterConfig
{
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self
    {
        self.pattern = pattern.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self
    {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn enabled(mut self, enable: bool) -> Self
    {
        self.enable = enable;
        self
    }
}
