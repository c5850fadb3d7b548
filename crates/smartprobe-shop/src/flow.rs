//! End-to-end shopping flow: identify, search, add to cart, check the budget

use crate::cart::{CartAssertion, CartPage};
use crate::home::HomePage;
use crate::product::{AddToCartSummary, ProductPage};
use crate::search::SearchResultsPage;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use smartprobe::{BrowserSession, DataLoader, PageObject, ProbeResult};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Default scenario file inside the data directory
pub const SCENARIO_FILE: &str = "test_data.yaml";

/// One search-and-buy scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingScenario {
    pub search_query: String,
    /// Budget per item
    pub max_price: f64,
    /// Most items to collect
    pub limit: usize,
}

/// Load the scenario list under `test_data`
pub fn load_scenarios(loader: &DataLoader, file: &str) -> ProbeResult<Vec<ShoppingScenario>> {
    loader.load_records(file, None)
}

/// Flow step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    Identification,
    Search,
    AddToCart,
    CartAssertion,
}

impl FlowStep {
    /// 1-based position, used to number step screenshots
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::Identification => 1,
            Self::Search => 2,
            Self::AddToCart => 3,
            Self::CartAssertion => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identification => "identification",
            Self::Search => "search",
            Self::AddToCart => "add_to_cart",
            Self::CartAssertion => "cart_assertion",
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: FlowStep,
    pub passed: bool,
    pub detail: String,
}

/// Everything a flow run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub scenario: ShoppingScenario,
    pub steps: Vec<StepReport>,
    /// Item URLs found by the search step
    pub urls: Vec<String>,
    pub summary: AddToCartSummary,
    pub cart: Option<CartAssertion>,
    pub passed: bool,
}

impl FlowReport {
    fn new(scenario: ShoppingScenario) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Local::now(),
            scenario,
            steps: Vec::new(),
            urls: Vec::new(),
            summary: AddToCartSummary::default(),
            cart: None,
            passed: false,
        }
    }

    /// First step that did not pass
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| !s.passed)
    }
}

/// Runs [`ShoppingScenario`]s against one session
#[derive(Debug, Clone)]
pub struct ShoppingFlow {
    session: Arc<BrowserSession>,
}

impl ShoppingFlow {
    #[must_use]
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self { session }
    }

    /// Run the four steps, stopping at the first one that fails
    pub async fn run(&self, scenario: &ShoppingScenario) -> FlowReport {
        info!(
            query = %scenario.search_query,
            max_price = scenario.max_price,
            limit = scenario.limit,
            session = self.session.id(),
            "Starting shopping flow"
        );
        let mut report = FlowReport::new(scenario.clone());
        report.passed = self.run_steps(scenario, &mut report).await;
        if report.passed {
            info!(run_id = %report.run_id, "Shopping flow passed");
        } else if let Some(step) = report.failed_step() {
            error!(
                run_id = %report.run_id,
                step = %step.step,
                "Shopping flow failed: {}",
                step.detail
            );
        }
        report
    }

    async fn run_steps(&self, scenario: &ShoppingScenario, report: &mut FlowReport) -> bool {
        let home = HomePage::new(&self.session);
        if let Err(e) = home.base().navigate(None).await {
            warn!("Initial navigation failed: {e}");
        }
        let identified = home.identification().await;
        let detail = if identified {
            "Home page verified".to_string()
        } else {
            "Home page identification failed".to_string()
        };
        if !self.record(report, FlowStep::Identification, identified, detail).await {
            return false;
        }

        let urls = self.search(&home, scenario).await;
        let found = !urls.is_empty() && urls.len() <= scenario.limit;
        let detail = format!(
            "Found {} items for '{}' under ${} (limit {})",
            urls.len(),
            scenario.search_query,
            scenario.max_price,
            scenario.limit
        );
        report.urls = urls;
        if !self.record(report, FlowStep::Search, found, detail).await {
            return false;
        }

        let product = ProductPage::new(&self.session);
        report.summary = product.add_items_to_cart(&report.urls).await;
        let added = !report.summary.successful.is_empty();
        let detail = format!(
            "{} added, {} failed",
            report.summary.successful.len(),
            report.summary.failed.len()
        );
        if !self.record(report, FlowStep::AddToCart, added, detail).await {
            return false;
        }

        let cart = CartPage::new(&self.session);
        let assertion = cart
            .assert_cart_total_not_exceeds(scenario.max_price, report.summary.successful.len())
            .await;
        let within = assertion.assertion_passed;
        let detail = assertion.reason.clone();
        report.cart = Some(assertion);
        self.record(report, FlowStep::CartAssertion, within, detail).await
    }

    async fn search(&self, home: &HomePage, scenario: &ShoppingScenario) -> Vec<String> {
        if let Err(e) = home.search(&scenario.search_query).await {
            warn!("Search from home page failed: {e}");
        }
        SearchResultsPage::new(&self.session)
            .search_items_by_name_under_price(
                &scenario.search_query,
                scenario.max_price,
                scenario.limit,
            )
            .await
    }

    /// Append the step, screenshot it and return `passed`
    async fn record(
        &self,
        report: &mut FlowReport,
        step: FlowStep,
        passed: bool,
        detail: String,
    ) -> bool {
        if passed {
            info!(step = %step, "{detail}");
        } else {
            error!(step = %step, "{detail}");
        }
        if let Err(e) = self
            .session
            .screenshots()
            .capture_step(self.session.driver().as_ref(), step.number(), step.as_str())
            .await
        {
            warn!(step = %step, "Step screenshot failed: {e}");
        }
        report.steps.push(StepReport { step, passed, detail });
        passed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod scenario_tests {
        use super::*;

        #[test]
        fn test_load_bundled_scenarios() {
            let loader = DataLoader::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"));
            let scenarios = load_scenarios(&loader, SCENARIO_FILE).unwrap();
            assert_eq!(scenarios.len(), 3);
            assert_eq!(scenarios[0].search_query, "shoes");
            assert_eq!(scenarios[0].max_price, 220.0);
            assert_eq!(scenarios[0].limit, 5);
        }

        #[test]
        fn test_scenarios_from_json() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(
                dir.path().join("runs.json"),
                r#"{"test_data": [{"search_query": "mug", "max_price": 12.5, "limit": 2}]}"#,
            )
            .unwrap();
            let scenarios = load_scenarios(&DataLoader::new(dir.path()), "runs.json").unwrap();
            assert_eq!(
                scenarios,
                vec![ShoppingScenario {
                    search_query: "mug".to_string(),
                    max_price: 12.5,
                    limit: 2,
                }]
            );
        }
    }

    mod step_tests {
        use super::*;

        #[test]
        fn test_step_numbers_follow_order() {
            let steps = [
                FlowStep::Identification,
                FlowStep::Search,
                FlowStep::AddToCart,
                FlowStep::CartAssertion,
            ];
            let numbers: Vec<u32> = steps.iter().map(|s| s.number()).collect();
            assert_eq!(numbers, vec![1, 2, 3, 4]);
        }

        #[test]
        fn test_step_serializes_snake_case() {
            let json = serde_json::to_string(&FlowStep::AddToCart).unwrap();
            assert_eq!(json, "\"add_to_cart\"");
            assert_eq!(FlowStep::CartAssertion.to_string(), "cart_assertion");
        }

        #[test]
        fn test_failed_step_is_first_failure() {
            let mut report = FlowReport::new(ShoppingScenario {
                search_query: "x".to_string(),
                max_price: 1.0,
                limit: 1,
            });
            report.steps.push(StepReport {
                step: FlowStep::Identification,
                passed: true,
                detail: String::new(),
            });
            report.steps.push(StepReport {
                step: FlowStep::Search,
                passed: false,
                detail: "none".to_string(),
            });
            assert_eq!(report.failed_step().map(|s| s.step), Some(FlowStep::Search));
        }
    }
}
