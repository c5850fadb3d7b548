//! Strategy catalog: typed element descriptions grouped under one named element.

use crate::result::ProbeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default per-attempt timeout for a named locator (5 seconds)
pub const DEFAULT_LOCATOR_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// STRATEGY KIND
// =============================================================================

/// The closed set of ways an element can be described
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// XPath-style structural path
    #[serde(rename = "xpath")]
    StructuralPath,
    /// CSS selector
    #[serde(rename = "css")]
    StyleSelector,
    /// Rendered text content
    #[serde(rename = "text")]
    VisibleText,
    /// ARIA role, optionally filtered by accessible name (`role[name=X]`)
    #[serde(rename = "role")]
    SemanticRole,
    /// `data-testid` attribute
    #[serde(rename = "test_id")]
    TestIdentifier,
    /// Associated form label or `aria-label`
    #[serde(rename = "label")]
    FormLabel,
    /// `placeholder` attribute
    #[serde(rename = "placeholder")]
    PlaceholderText,
    /// `alt` attribute
    #[serde(rename = "alt_text")]
    AltText,
}

impl StrategyKind {
    /// Every supported kind, in declaration order
    pub const ALL: [Self; 8] = [
        Self::StructuralPath,
        Self::StyleSelector,
        Self::VisibleText,
        Self::SemanticRole,
        Self::TestIdentifier,
        Self::FormLabel,
        Self::PlaceholderText,
        Self::AltText,
    ];

    /// Short tag used in logs, config files and the CLI
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::StructuralPath => "xpath",
            Self::StyleSelector => "css",
            Self::VisibleText => "text",
            Self::SemanticRole => "role",
            Self::TestIdentifier => "test_id",
            Self::FormLabel => "label",
            Self::PlaceholderText => "placeholder",
            Self::AltText => "alt_text",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for StrategyKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == normalized)
            .ok_or_else(|| ProbeError::UnsupportedStrategyKind {
                kind: s.to_string(),
            })
    }
}

// =============================================================================
// LOCATOR STRATEGY
// =============================================================================

/// One concrete way to query an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorStrategy {
    kind: StrategyKind,
    value: String,
    #[serde(default)]
    description: String,
}

impl LocatorStrategy {
    /// Create a new strategy
    #[must_use]
    pub fn new(
        kind: StrategyKind,
        value: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            value: value.into(),
            description: description.into(),
        }
    }

    /// Strategy kind
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        self.kind
    }

    /// Raw selector/text/role payload
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Human label, never used for matching
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}='{}'", self.kind, self.value)
    }
}

// =============================================================================
// NAMED LOCATOR
// =============================================================================

/// A human-named bundle of ordered fallback strategies.
///
/// Priority is list order: the first strategy added is tried first. A
/// locator is built once, usually when a page object is constructed, and is
/// not mutated afterwards; short existence probes pass their timeout by
/// value to the resolver instead of editing the locator.
///
/// ```
/// use smartprobe::NamedLocator;
///
/// let search = NamedLocator::new("Search Input")
///     .add_xpath("//input[@id='gh-ac']", "XPath - ID based")
///     .add_css("input[type='text'][name='_nkw']", "CSS - attribute selector");
/// assert_eq!(search.strategies().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedLocator {
    name: String,
    #[serde(default)]
    strategies: Vec<LocatorStrategy>,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
}

const fn default_timeout_ms() -> u64 {
    DEFAULT_LOCATOR_TIMEOUT_MS
}

impl NamedLocator {
    /// Create an empty locator with the default timeout
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategies: Vec::new(),
            timeout_ms: DEFAULT_LOCATOR_TIMEOUT_MS,
        }
    }

    /// Build the common two-XPath, CSS, text combination.
    ///
    /// Empty optional payloads are skipped.
    #[must_use]
    pub fn smart(
        name: impl Into<String>,
        primary_xpath: impl Into<String>,
        secondary_xpath: Option<&str>,
        css: Option<&str>,
        text: Option<&str>,
    ) -> Self {
        let mut locator = Self::new(name).add_xpath(primary_xpath, "Primary XPath");
        if let Some(xpath) = secondary_xpath.filter(|s| !s.is_empty()) {
            locator = locator.add_xpath(xpath, "Secondary XPath");
        }
        if let Some(css) = css.filter(|s| !s.is_empty()) {
            locator = locator.add_css(css, "CSS Selector");
        }
        if let Some(text) = text.filter(|s| !s.is_empty()) {
            locator = locator.add_text(text, "Text Content");
        }
        locator
    }

    /// Human-readable identity used in logs and errors
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Strategies in priority order
    #[must_use]
    pub fn strategies(&self) -> &[LocatorStrategy] {
        &self.strategies
    }

    /// Per-attempt wait bound in milliseconds
    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Append a strategy at the lowest priority
    #[must_use]
    pub fn add_strategy(mut self, strategy: LocatorStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    fn add(
        self,
        kind: StrategyKind,
        value: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.add_strategy(LocatorStrategy::new(kind, value, description))
    }

    /// Add an XPath strategy
    #[must_use]
    pub fn add_xpath(self, xpath: impl Into<String>, description: impl Into<String>) -> Self {
        self.add(StrategyKind::StructuralPath, xpath, description)
    }

    /// Add a CSS selector strategy
    #[must_use]
    pub fn add_css(self, css: impl Into<String>, description: impl Into<String>) -> Self {
        self.add(StrategyKind::StyleSelector, css, description)
    }

    /// Add a visible text strategy
    #[must_use]
    pub fn add_text(self, text: impl Into<String>, description: impl Into<String>) -> Self {
        self.add(StrategyKind::VisibleText, text, description)
    }

    /// Add a role strategy, e.g. `button` or `button[name=Search]`
    #[must_use]
    pub fn add_role(self, role: impl Into<String>, description: impl Into<String>) -> Self {
        self.add(StrategyKind::SemanticRole, role, description)
    }

    /// Add a `data-testid` strategy
    #[must_use]
    pub fn add_test_id(self, test_id: impl Into<String>, description: impl Into<String>) -> Self {
        self.add(StrategyKind::TestIdentifier, test_id, description)
    }

    /// Add a form label strategy
    #[must_use]
    pub fn add_label(self, label: impl Into<String>, description: impl Into<String>) -> Self {
        self.add(StrategyKind::FormLabel, label, description)
    }

    /// Add a placeholder strategy
    #[must_use]
    pub fn add_placeholder(
        self,
        placeholder: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.add(StrategyKind::PlaceholderText, placeholder, description)
    }

    /// Add an alt text strategy
    #[must_use]
    pub fn add_alt_text(self, alt: impl Into<String>, description: impl Into<String>) -> Self {
        self.add(StrategyKind::AltText, alt, description)
    }
}

impl fmt::Display for NamedLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} strategies)", self.name, self.strategies.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod strategy_kind_tests {
        use super::*;

        #[test]
        fn test_tags_round_trip_through_from_str() {
            for kind in StrategyKind::ALL {
                assert_eq!(kind.tag().parse::<StrategyKind>().unwrap(), kind);
            }
        }

        #[test]
        fn test_from_str_is_lenient_on_case_and_dashes() {
            assert_eq!("XPath".parse::<StrategyKind>().unwrap(), StrategyKind::StructuralPath);
            assert_eq!("test-id".parse::<StrategyKind>().unwrap(), StrategyKind::TestIdentifier);
        }

        #[test]
        fn test_unknown_tag_is_unsupported() {
            let err = "shadow".parse::<StrategyKind>().unwrap_err();
            assert!(
                matches!(err, ProbeError::UnsupportedStrategyKind { ref kind } if kind == "shadow")
            );
        }

        #[test]
        fn test_serde_uses_tags() {
            let json = serde_json::to_string(&StrategyKind::PlaceholderText).unwrap();
            assert_eq!(json, "\"placeholder\"");
        }
    }

    mod named_locator_tests {
        use super::*;

        #[test]
        fn test_new_uses_default_timeout() {
            let locator = NamedLocator::new("Logo");
            assert_eq!(locator.timeout_ms(), DEFAULT_LOCATOR_TIMEOUT_MS);
            assert!(locator.strategies().is_empty());
        }

        #[test]
        fn test_builders_preserve_insertion_order() {
            let locator = NamedLocator::new("Everything")
                .add_xpath("//a", "x")
                .add_css("a", "c")
                .add_text("Home", "t")
                .add_role("link[name=Home]", "r")
                .add_test_id("home", "i")
                .add_label("Home", "l")
                .add_placeholder("Search", "p")
                .add_alt_text("eBay", "a");
            let kinds: Vec<_> = locator.strategies().iter().map(LocatorStrategy::kind).collect();
            assert_eq!(kinds, StrategyKind::ALL.to_vec());
        }

        #[test]
        fn test_smart_factory_skips_missing_parts() {
            let locator =
                NamedLocator::smart("Buy", "//button", None, Some("button.buy"), Some(""));
            assert_eq!(locator.strategies().len(), 2);
            assert_eq!(locator.strategies()[0].description(), "Primary XPath");
            assert_eq!(locator.strategies()[1].description(), "CSS Selector");
        }

        #[test]
        fn test_smart_factory_full() {
            let locator = NamedLocator::smart(
                "Buy",
                "//button",
                Some("//a[@role='button']"),
                Some("button.buy"),
                Some("Buy It Now"),
            );
            let descriptions: Vec<_> =
                locator.strategies().iter().map(LocatorStrategy::description).collect();
            assert_eq!(
                descriptions,
                ["Primary XPath", "Secondary XPath", "CSS Selector", "Text Content"]
            );
        }

        #[test]
        fn test_display() {
            let locator = NamedLocator::new("Cart Icon").add_css("a[href*='cart']", "href");
            assert_eq!(locator.to_string(), "Cart Icon (1 strategies)");
            assert_eq!(locator.strategies()[0].to_string(), "css='a[href*='cart']'");
        }

        #[test]
        fn test_yaml_catalog_uses_default_timeout() {
            let yaml = "name: Search Input\nstrategies:\n  - kind: xpath\n    value: //input[@id='gh-ac']\n  - kind: placeholder\n    value: Search for anything\n";
            let locator: NamedLocator = serde_yaml_ng::from_str(yaml).unwrap();
            assert_eq!(locator.timeout_ms(), DEFAULT_LOCATOR_TIMEOUT_MS);
            assert_eq!(locator.strategies()[1].kind(), StrategyKind::PlaceholderText);
            assert_eq!(locator.strategies()[1].description(), "");
        }

        #[test]
        fn test_unknown_kind_in_catalog_is_rejected() {
            let yaml = "name: Broken\nstrategies:\n  - kind: shadow\n    value: x\n";
            assert!(serde_yaml_ng::from_str::<NamedLocator>(yaml).is_err());
        }
    }
}
