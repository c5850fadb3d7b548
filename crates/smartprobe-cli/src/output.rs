//! Output formatting

use console::{style, Term};
use smartprobe::{ResolutionResult, StrategyKind};
use smartprobe_shop::FlowReport;

/// Status line printer on stderr
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    fn line(&self, prefix: String, message: &str) {
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        self.line(prefix, message);
    }

    /// Print a failure message, even when quiet
    pub fn failure(&self, message: &str) {
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        self.line(prefix, message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        self.line(prefix, message);
    }
}

/// Example payload per kind, for `strategies`
const fn example(kind: StrategyKind) -> &'static str {
    match kind {
        StrategyKind::StructuralPath => "//input[@id='gh-ac']",
        StrategyKind::StyleSelector => "a[href*='cart']",
        StrategyKind::VisibleText => "Add to cart",
        StrategyKind::SemanticRole => "button[name=Search]",
        StrategyKind::TestIdentifier => "ux-call-to-action-atc",
        StrategyKind::FormLabel => "Quantity",
        StrategyKind::PlaceholderText => "Search for anything",
        StrategyKind::AltText => "eBay Home",
    }
}

/// One line per strategy kind: tag and an example payload
#[must_use]
pub fn render_strategies() -> String {
    let mut out = String::new();
    for kind in StrategyKind::ALL {
        out.push_str(&format!("{:<12} {}\n", kind.tag(), example(kind)));
    }
    out
}

/// Attempt trace as pretty JSON
pub fn render_trace(result: &ResolutionResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

/// Human summary of a flow run
#[must_use]
pub fn render_report(report: &FlowReport, use_color: bool) -> String {
    let mut out = format!(
        "Run {} - '{}' under ${} (limit {})\n",
        report.run_id,
        report.scenario.search_query,
        report.scenario.max_price,
        report.scenario.limit
    );
    for step in &report.steps {
        let mark = match (step.passed, use_color) {
            (true, true) => style("✓").green().to_string(),
            (false, true) => style("✗").red().to_string(),
            (true, false) => "PASS".to_string(),
            (false, false) => "FAIL".to_string(),
        };
        out.push_str(&format!("  {mark} {:<15} {}\n", step.step.as_str(), step.detail));
    }
    if let Some(cart) = &report.cart {
        let total = cart
            .actual_total
            .map_or_else(|| "unknown".to_string(), |t| format!("${t:.2}"));
        out.push_str(&format!(
            "  cart total {total}, allowed ${:.2}\n",
            cart.expected_max_total
        ));
    }
    out.push_str(if report.passed { "PASSED\n" } else { "FAILED\n" });
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_strategies_lists_every_tag() {
        let out = render_strategies();
        assert_eq!(out.lines().count(), StrategyKind::ALL.len());
        for tag in ["xpath", "css", "text", "role", "test_id", "label", "placeholder", "alt_text"] {
            assert!(out.lines().any(|l| l.starts_with(tag)), "missing {tag}");
        }
    }

    #[test]
    fn test_reporter_quiet_flag() {
        let reporter = Reporter::new(false, true);
        assert!(reporter.quiet);
        assert!(!reporter.use_color);
    }
}
