//! Strategy-to-handle adapter.
//!
//! Turns one [`LocatorStrategy`] into an [`ElementQuery`]: a description the
//! driver can wait on, count and act on. Building a query never touches the
//! page; zero matches only surface once the resolver waits on it.

use super::strategy::{LocatorStrategy, StrategyKind};
use crate::result::{ProbeError, ProbeResult};
use std::fmt;

/// Engine-level query primitive, one per strategy kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryTarget {
    /// XPath expression
    XPath(String),
    /// CSS selector
    Css(String),
    /// Elements whose own text contains the value
    Text(String),
    /// ARIA role with optional accessible name
    Role {
        /// Role name
        role: String,
        /// Accessible name filter
        name: Option<String>,
    },
    /// `data-testid` attribute
    TestId(String),
    /// Label text
    Label(String),
    /// Placeholder text
    Placeholder(String),
    /// Alt text
    AltText(String),
}

/// A live-page query, optionally rooted at another query's first match
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementQuery {
    target: QueryTarget,
    scope: Option<Box<ElementQuery>>,
    index: Option<usize>,
}

/// Translate a strategy into a document-rooted query
pub fn to_query(strategy: &LocatorStrategy) -> ProbeResult<ElementQuery> {
    let value = strategy.value().trim();
    if value.is_empty() {
        return Err(ProbeError::invalid_selector(
            strategy.value(),
            format!("empty {} payload", strategy.kind()),
        ));
    }

    let target = match strategy.kind() {
        StrategyKind::StructuralPath => QueryTarget::XPath(value.to_string()),
        StrategyKind::StyleSelector => QueryTarget::Css(value.to_string()),
        StrategyKind::VisibleText => QueryTarget::Text(value.to_string()),
        StrategyKind::SemanticRole => parse_role(value)?,
        StrategyKind::TestIdentifier => QueryTarget::TestId(value.to_string()),
        StrategyKind::FormLabel => QueryTarget::Label(value.to_string()),
        StrategyKind::PlaceholderText => QueryTarget::Placeholder(value.to_string()),
        StrategyKind::AltText => QueryTarget::AltText(value.to_string()),
    };

    Ok(ElementQuery::new(target))
}

/// Translate a strategy into a query rooted at `scope`
pub fn to_scoped_query(
    strategy: &LocatorStrategy,
    scope: &ElementQuery,
) -> ProbeResult<ElementQuery> {
    Ok(to_query(strategy)?.within(scope.clone()))
}

/// Parse `role` or `role[name=X]`
fn parse_role(value: &str) -> ProbeResult<QueryTarget> {
    let Some((role, rest)) = value.split_once('[') else {
        return Ok(QueryTarget::Role {
            role: value.to_string(),
            name: None,
        });
    };

    let role = role.trim();
    if role.is_empty() {
        return Err(ProbeError::invalid_selector(value, "missing role name"));
    }
    let Some(filter) = rest.trim_end().strip_suffix(']') else {
        return Err(ProbeError::invalid_selector(value, "unterminated '[' in role filter"));
    };
    let Some((key, name)) = filter.split_once('=') else {
        return Err(ProbeError::invalid_selector(value, "role filter must be name=<value>"));
    };
    if key.trim() != "name" {
        return Err(ProbeError::invalid_selector(
            value,
            format!("unsupported role filter '{}'", key.trim()),
        ));
    }

    let name = name.trim().trim_matches(|c| c == '"' || c == '\'');
    Ok(QueryTarget::Role {
        role: role.to_string(),
        name: Some(name.to_string()),
    })
}

/// Encode a Rust string as a JavaScript string literal
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

impl ElementQuery {
    /// Create a document-rooted query
    #[must_use]
    pub const fn new(target: QueryTarget) -> Self {
        Self {
            target,
            scope: None,
            index: None,
        }
    }

    /// Shorthand for a CSS query
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(QueryTarget::Css(selector.into()))
    }

    /// Shorthand for an XPath query
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::new(QueryTarget::XPath(expression.into()))
    }

    /// Root this query at the first match of `scope`
    #[must_use]
    pub fn within(mut self, scope: Self) -> Self {
        self.scope = Some(Box::new(scope));
        self
    }

    /// Narrow this query to its `index`-th match
    #[must_use]
    pub fn nth(&self, index: usize) -> Self {
        Self {
            target: self.target.clone(),
            scope: self.scope.clone(),
            index: Some(index),
        }
    }

    /// The same query without its index narrowing
    #[must_use]
    pub fn unindexed(&self) -> Self {
        Self {
            target: self.target.clone(),
            scope: self.scope.clone(),
            index: None,
        }
    }

    /// Query primitive
    #[must_use]
    pub const fn target(&self) -> &QueryTarget {
        &self.target
    }

    /// Parent scope, if any
    #[must_use]
    pub fn scope(&self) -> Option<&Self> {
        self.scope.as_deref()
    }

    /// Match index, if narrowed
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    /// JavaScript expression evaluating to an array of matching elements
    #[must_use]
    pub fn to_js(&self) -> String {
        let collect = match &self.scope {
            None => self.target.collect_js("document"),
            Some(scope) => format!(
                "((root) => root ? {} : [])(({})[0])",
                self.target.collect_js("root"),
                scope.to_js()
            ),
        };
        match self.index {
            Some(i) => format!("[({collect})[{i}]].filter(Boolean)"),
            None => collect,
        }
    }
}

impl QueryTarget {
    fn collect_js(&self, root: &str) -> String {
        match self {
            Self::XPath(x) => format!(
                "((r) => {{ const out = []; for (let i = 0; i < r.snapshotLength; i++) \
                 out.push(r.snapshotItem(i)); return out; }})(document.evaluate({}, {root}, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null))",
                js_str(x)
            ),
            Self::Css(s) => format!("Array.from({root}.querySelectorAll({}))", js_str(s)),
            Self::Text(t) => format!(
                "Array.from({root}.querySelectorAll('*')).filter(el => \
                 el.textContent.includes({t}) && !Array.from(el.children).some(c => \
                 c.textContent.includes({t})))",
                t = js_str(t)
            ),
            Self::Role { role, name } => {
                let name_filter = name.as_ref().map_or_else(String::new, |n| {
                    format!(
                        ".filter(el => ((el.getAttribute('aria-label') || el.textContent || \
                         el.getAttribute('alt') || el.getAttribute('title') || \
                         '').trim()).includes({}))",
                        js_str(n)
                    )
                });
                format!(
                    "Array.from({root}.querySelectorAll('[role=' + JSON.stringify({r}) + '],' + \
                     ({{button: 'button,input[type=button],input[type=submit]', link: 'a[href]', \
                     textbox: \
                     'input:not([type]),input[type=text],input[type=search],input[type=email],textarea', \
                     checkbox: 'input[type=checkbox]', radio: 'input[type=radio]', combobox: \
                     'select', heading: 'h1,h2,h3,h4,h5,h6', img: 'img[alt]', list: 'ul,ol', \
                     listitem: 'li', navigation: 'nav', search: 'form[role=search]'}}[{r}] || \
                     '[role=' + JSON.stringify({r}) + ']'))){name_filter}",
                    r = js_str(role)
                )
            }
            Self::TestId(id) => format!(
                "Array.from({root}.querySelectorAll('[data-testid=' + JSON.stringify({}) + ']'))",
                js_str(id)
            ),
            Self::Label(l) => format!(
                "Array.from({root}.querySelectorAll('label')).filter(l => \
                 l.textContent.includes({l})).map(l => l.control || (l.htmlFor ? \
                 document.getElementById(l.htmlFor) : \
                 l.querySelector('input,select,textarea'))).filter(Boolean).concat(Array.from({root}.querySelectorAll('[aria-label]')).filter(el \
                 => el.getAttribute('aria-label').includes({l})))",
                l = js_str(l)
            ),
            Self::Placeholder(p) => format!(
                "Array.from({root}.querySelectorAll('[placeholder]')).filter(el => \
                 el.getAttribute('placeholder').includes({}))",
                js_str(p)
            ),
            Self::AltText(a) => format!(
                "Array.from({root}.querySelectorAll('img[alt],area[alt],input[alt]')).filter(el \
                 => el.getAttribute('alt').includes({}))",
                js_str(a)
            ),
        }
    }
}

impl fmt::Display for QueryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XPath(x) => write!(f, "xpath={x}"),
            Self::Css(s) => write!(f, "css={s}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::Role { role, name: None } => write!(f, "role={role}"),
            Self::Role {
                role,
                name: Some(name),
            } => write!(f, "role={role}[name=\"{name}\"]"),
            Self::TestId(id) => write!(f, "test_id={id}"),
            Self::Label(l) => write!(f, "label={l}"),
            Self::Placeholder(p) => write!(f, "placeholder={p}"),
            Self::AltText(a) => write!(f, "alt={a}"),
        }
    }
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.scope {
            write!(f, "{scope} >> ")?;
        }
        write!(f, "{}", self.target)?;
        if let Some(i) = self.index {
            write!(f, " >> nth={i}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn strategy(kind: StrategyKind, value: &str) -> LocatorStrategy {
        LocatorStrategy::new(kind, value, "")
    }

    mod adapter_tests {
        use super::*;

        #[test]
        fn test_each_kind_maps_to_its_primitive() {
            let cases = [
                (StrategyKind::StructuralPath, "//a", "xpath=//a"),
                (StrategyKind::StyleSelector, "a.cart", "css=a.cart"),
                (StrategyKind::VisibleText, "Add to cart", "text=Add to cart"),
                (StrategyKind::SemanticRole, "button", "role=button"),
                (StrategyKind::TestIdentifier, "atc", "test_id=atc"),
                (StrategyKind::FormLabel, "Quantity", "label=Quantity"),
                (StrategyKind::PlaceholderText, "Min", "placeholder=Min"),
                (StrategyKind::AltText, "eBay Home", "alt=eBay Home"),
            ];
            for (kind, value, expected) in cases {
                assert_eq!(to_query(&strategy(kind, value)).unwrap().to_string(), expected);
            }
        }

        #[test]
        fn test_role_with_name_filter() {
            let q = to_query(&strategy(StrategyKind::SemanticRole, "button[name=Search]")).unwrap();
            assert_eq!(
                q.target(),
                &QueryTarget::Role {
                    role: "button".to_string(),
                    name: Some("Search".to_string())
                }
            );
        }

        #[test]
        fn test_role_name_quotes_are_stripped() {
            let q =
                to_query(&strategy(StrategyKind::SemanticRole, "link[name='My eBay']")).unwrap();
            assert_eq!(q.to_string(), "role=link[name=\"My eBay\"]");
        }

        #[test]
        fn test_malformed_role_is_invalid_selector() {
            for bad in ["button[name=Search", "[name=x]", "button[Search]", "button[label=x]"] {
                let err = to_query(&strategy(StrategyKind::SemanticRole, bad)).unwrap_err();
                assert!(matches!(err, ProbeError::InvalidSelector { .. }), "{bad}");
            }
        }

        #[test]
        fn test_empty_payload_is_invalid_selector() {
            let err = to_query(&strategy(StrategyKind::StyleSelector, "   ")).unwrap_err();
            assert!(matches!(err, ProbeError::InvalidSelector { .. }));
        }

        #[test]
        fn test_payload_is_trimmed() {
            let q = to_query(&strategy(StrategyKind::StyleSelector, "  a.cart ")).unwrap();
            assert_eq!(q.target(), &QueryTarget::Css("a.cart".to_string()));
        }

        #[test]
        fn test_scoped_query() {
            let row = ElementQuery::xpath("//li[contains(@class, 's-item')]").nth(2);
            let price =
                to_scoped_query(&strategy(StrategyKind::StructuralPath, ".//span"), &row).unwrap();
            assert_eq!(
                price.to_string(),
                "xpath=//li[contains(@class, 's-item')] >> nth=2 >> xpath=.//span"
            );
            assert_eq!(price.scope(), Some(&row));
        }
    }

    mod js_tests {
        use super::*;

        #[test]
        fn test_css_js_is_escaped() {
            let js = ElementQuery::css("input[name=\"_nkw\"]").to_js();
            assert_eq!(js, r#"Array.from(document.querySelectorAll("input[name=\"_nkw\"]"))"#);
        }

        #[test]
        fn test_xpath_js_uses_snapshot() {
            let js = ElementQuery::xpath("//a[@id='gh-la']").to_js();
            assert!(js.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
            assert!(js.contains("\"//a[@id='gh-la']\", document"));
        }

        #[test]
        fn test_scoped_js_roots_at_first_scope_match() {
            let js = ElementQuery::css("span").within(ElementQuery::css("li")).to_js();
            assert!(
                js.starts_with("((root) => root ? Array.from(root.querySelectorAll(\"span\"))")
            );
            assert!(js.ends_with("(Array.from(document.querySelectorAll(\"li\")))[0])"));
        }

        #[test]
        fn test_nth_js() {
            let js = ElementQuery::css("li").nth(1).to_js();
            assert!(js.starts_with("[("));
            assert!(js.ends_with(")[1]].filter(Boolean)"));
        }

        #[test]
        fn test_role_js_includes_name_filter() {
            let js = to_query(&strategy(StrategyKind::SemanticRole, "button[name=Search]"))
                .unwrap()
                .to_js();
            assert!(js.contains("\"button\""));
            assert!(js.contains(".includes(\"Search\")"));
        }
    }
}
