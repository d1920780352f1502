//! # Formatter Registry
//!
//! Maps type-name patterns to formatters, the way a debugger routes a value
//! to its visualizer at display time.
//!
//! Formatters are grouped into named categories. A category is created by
//! the first registration that names it and starts out disabled; lookups
//! only see formatters whose category is enabled. This lets a user switch
//! one integration off without touching the others.
//!
//! ## Usage
//!
//! ```rust
//! use arrayscope_core::formatters::{FormatterConfig, FormatterRegistry};
//!
//! let mut registry = FormatterRegistry::new();
//! registry.install_illegal_array(&FormatterConfig::default())?;
//! assert_eq!(registry.is_category_enabled("trex_illegal_array"), Some(true));
//!
//! registry.disable_category("trex_illegal_array")?;
//! assert_eq!(registry.is_category_enabled("trex_illegal_array"), Some(false));
//! # Ok::<(), arrayscope_core::error::ScopeError>(())
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use super::illegal_array::{illegal_array_summary, IllegalArraySyntheticProvider};
use super::{FormatterConfig, SummaryProvider, SyntheticChildrenProvider};
use crate::error::{ScopeError, ScopeResult};
use crate::value::ValueObject;

/// Builds a synthetic children provider for a value
pub type SyntheticFactory = Arc<dyn Fn(&ValueObject) -> Box<dyn SyntheticChildrenProvider> + Send + Sync>;

/// What a registered formatter produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterKind
{
    Summary,
    Synthetic,
}

impl fmt::Display for FormatterKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            FormatterKind::Summary => f.pad("summary"),
            FormatterKind::Synthetic => f.pad("synthetic"),
        }
    }
}

/// Description of one registration, for listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterInfo
{
    pub category: String,
    pub enabled: bool,
    pub pattern: String,
    pub kind: FormatterKind,
}

#[derive(Clone)]
enum Formatter
{
    Summary(Arc<dyn SummaryProvider>),
    Synthetic(SyntheticFactory),
}

impl Formatter
{
    fn kind(&self) -> FormatterKind
    {
        match self {
            Formatter::Summary(_) => FormatterKind::Summary,
            Formatter::Synthetic(_) => FormatterKind::Synthetic,
        }
    }
}

struct Registration
{
    category: String,
    pattern: Regex,
    formatter: Formatter,
}

#[derive(Debug)]
struct Category
{
    name: String,
    enabled: bool,
}

/// Type-name pattern to formatter mapping
///
/// ## Thread Safety
///
/// The registry itself is plain data. Share it behind a lock (as
/// [`global_registry`] does); providers it creates are not shared.
#[derive(Default)]
pub struct FormatterRegistry
{
    registrations: Vec<Registration>,
    categories: Vec<Category>,
}

impl FormatterRegistry
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Register a summary provider for types matching `pattern`
    ///
    /// ## Errors
    ///
    /// `Pattern` if `pattern` is not a valid regular expression.
    pub fn add_summary<S>(&mut self, category: &str, pattern: &str, provider: S) -> ScopeResult<()>
    where
        S: SummaryProvider + 'static,
    {
        self.register(category, pattern, Formatter::Summary(Arc::new(provider)))
    }

    /// Register a synthetic children factory for types matching `pattern`
    ///
    /// ## Errors
    ///
    /// `Pattern` if `pattern` is not a valid regular expression.
    pub fn add_synthetic<F>(&mut self, category: &str, pattern: &str, factory: F) -> ScopeResult<()>
    where
        F: Fn(&ValueObject) -> Box<dyn SyntheticChildrenProvider> + Send + Sync + 'static,
    {
        self.register(category, pattern, Formatter::Synthetic(Arc::new(factory)))
    }

    fn register(&mut self, category: &str, pattern: &str, formatter: Formatter) -> ScopeResult<()>
    {
        let compiled = Regex::new(pattern).map_err(|source| ScopeError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        if !self.categories.iter().any(|c| c.name == category) {
            self.categories.push(Category {
                name: category.to_string(),
                enabled: false,
            });
        }
        debug!(category, pattern, kind = %formatter.kind(), "formatter registered");
        self.registrations.push(Registration {
            category: category.to_string(),
            pattern: compiled,
            formatter,
        });
        Ok(())
    }

    /// Register the IllegalArray summary and synthetic providers
    ///
    /// Both formatters go under `config.category` for `config.pattern`; the
    /// category is enabled when `config.enable` is set.
    ///
    /// ## Errors
    ///
    /// `Pattern` if the configured pattern does not compile.
    pub fn install_illegal_array(&mut self, config: &FormatterConfig) -> ScopeResult<()>
    {
        self.add_summary(&config.category, &config.pattern, illegal_array_summary)?;
        self.add_synthetic(&config.category, &config.pattern, |value| {
            Box::new(IllegalArraySyntheticProvider::new(value)) as Box<dyn SyntheticChildrenProvider>
        })?;
        if config.enable {
            self.enable_category(&config.category)?;
        }
        info!(category = %config.category, pattern = %config.pattern, "IllegalArray formatters loaded");
        Ok(())
    }

    /// Turn a category on
    ///
    /// ## Errors
    ///
    /// `UnknownCategory` if nothing was registered under `name`.
    pub fn enable_category(&mut self, name: &str) -> ScopeResult<()>
    {
        self.set_category(name, true)
    }

    /// Turn a category off
    ///
    /// ## Errors
    ///
    /// `UnknownCategory` if nothing was registered under `name`.
    pub fn disable_category(&mut self, name: &str) -> ScopeResult<()>
    {
        self.set_category(name, false)
    }

    fn set_category(&mut self, name: &str, enabled: bool) -> ScopeResult<()>
    {
        let category = self
            .categories
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| ScopeError::UnknownCategory(name.to_string()))?;
        category.enabled = enabled;
        debug!(category = name, enabled, "category toggled");
        Ok(())
    }

    /// `Some(enabled)` for a known category, `None` otherwise
    pub fn is_category_enabled(&self, name: &str) -> Option<bool>
    {
        self.categories.iter().find(|c| c.name == name).map(|c| c.enabled)
    }

    /// Known categories in registration order
    pub fn categories(&self) -> impl Iterator<Item = (&str, bool)>
    {
        self.categories.iter().map(|c| (c.name.as_str(), c.enabled))
    }

    /// Every registration, oldest first
    pub fn describe(&self) -> Vec<FormatterInfo>
    {
        self.registrations
            .iter()
            .map(|r| FormatterInfo {
                category: r.category.clone(),
                enabled: self.is_category_enabled(&r.category).unwrap_or(false),
                pattern: r.pattern.as_str().to_string(),
                kind: r.formatter.kind(),
            })
            .collect()
    }

    /// Summary provider for `value`, if an enabled one matches its type
    pub fn summary_for(&self, value: &ValueObject) -> Option<Arc<dyn SummaryProvider>>
    {
        self.lookup(value, FormatterKind::Summary).and_then(|formatter| match formatter {
            Formatter::Summary(provider) => Some(provider.clone()),
            Formatter::Synthetic(_) => None,
        })
    }

    /// Summary line for `value`, if an enabled summary provider matches
    pub fn summarize(&self, value: &ValueObject) -> Option<String>
    {
        self.summary_for(value).map(|provider| provider.summarize(value))
    }

    /// A fresh, already updated synthetic provider for `value`
    pub fn synthetic_for(&self, value: &ValueObject) -> Option<Box<dyn SyntheticChildrenProvider>>
    {
        self.lookup(value, FormatterKind::Synthetic).and_then(|formatter| match formatter {
            Formatter::Synthetic(factory) => Some((factory.as_ref())(value)),
            Formatter::Summary(_) => None,
        })
    }

    /// Most recent enabled registration of `kind` matching the value's type
    ///
    /// The canonical type name is tried first, then the declared name, so a
    /// typedef of a container is still recognized.
    fn lookup(&self, value: &ValueObject, kind: FormatterKind) -> Option<&Formatter>
    {
        let ty = value.value_type()?;
        let names = [ty.canonical().name.as_str(), ty.name.as_str()];
        self.registrations
            .iter()
            .rev()
            .filter(|r| r.formatter.kind() == kind)
            .filter(|r| self.is_category_enabled(&r.category).unwrap_or(false))
            .find(|r| names.iter().any(|name| r.pattern.is_match(name)))
            .map(|r| &r.formatter)
    }
}

impl fmt::Debug for FormatterRegistry
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("FormatterRegistry")
            .field("formatters", &self.describe())
            .field("categories", &self.categories)
            .finish()
    }
}

static GLOBAL_REGISTRY: Lazy<RwLock<FormatterRegistry>> = Lazy::new(|| RwLock::new(FormatterRegistry::new()));

/// The process-wide registry
///
/// Empty until [`initialize_session`] runs.
pub fn global_registry() -> &'static RwLock<FormatterRegistry>
{
    &GLOBAL_REGISTRY
}

/// Reset the process-wide registry and load the built-in formatters
///
/// Safe to call again for each new debugging session; previous
/// registrations and category states are discarded.
///
/// ## Errors
///
/// `Pattern` if `config.pattern` does not compile. The registry is left
/// empty in that case.
pub fn initialize_session(config: &FormatterConfig) -> ScopeResult<()>
{
    let mut registry = global_registry().write().unwrap_or_else(PoisonError::into_inner);
    *registry = FormatterRegistry::new();
    registry.install_illegal_array(config)
}
