//! Cart page: totals, item counts and the budget assertion

use crate::adhoc::{self, Candidate};
use crate::price::{parse_count, parse_price};
use serde::{Deserialize, Serialize};
use smartprobe::{BasePage, BrowserSession, NamedLocator, PageObject, ProbeResult, StrategyKind};
use tracing::{debug, error, info, warn};

/// Page name used in logs and screenshots
pub const CART_PAGE_NAME: &str = "CartPage";

/// Cart addresses tried in order
pub const CART_URLS: [&str; 3] = [
    "https://cart.ebay.com",
    "https://www.ebay.com/sc/atc",
    "https://www.ebay.com/atc/myatc",
];

const EMPTY_PROBE_MS: u64 = 2_000;
const TOTAL_PROBE_MS: u64 = 3_000;
const COUNT_PROBE_MS: u64 = 2_000;

/// Header links that lead to the cart, tried when no cart URL works
const CART_LINKS: [Candidate; 4] = [
    (StrategyKind::StructuralPath, "//a[@id='gh-cart-n']"),
    (StrategyKind::StructuralPath, "//a[contains(@href, 'cart')]"),
    (StrategyKind::StyleSelector, "#gh-cart-n"),
    (StrategyKind::StyleSelector, "a[href*='cart']"),
];

/// Any price-looking text in the order summary
const SUMMARY_PRICES: [Candidate; 3] = [
    (
        StrategyKind::StructuralPath,
        "//*[contains(@class, 'subtotal')]//span[contains(text(), '$')]",
    ),
    (
        StrategyKind::StructuralPath,
        "//*[contains(@class, 'total')]//span[contains(text(), '$')]",
    ),
    (
        StrategyKind::StructuralPath,
        "//span[contains(text(), '$') and ancestor::div[contains(@class, 'summary')]]",
    ),
];

/// Item rows, counted when the header shows no count
const ITEM_ROWS: [Candidate; 3] = [
    (StrategyKind::StructuralPath, "//div[contains(@class, 'cart-item')]"),
    (StrategyKind::StructuralPath, "//*[@data-test-id='CART_ITEM']"),
    (StrategyKind::StyleSelector, "div.cart-item"),
];

const REMOVE_ROW: Candidate = (
    StrategyKind::StructuralPath,
    "//div[contains(@class, 'cart-item')]",
);
const REMOVE_BUTTON: Candidate = (
    StrategyKind::StructuralPath,
    ".//button[contains(text(), 'Remove')]",
);

/// Result of checking the cart total against a per-item budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartAssertion {
    pub assertion_passed: bool,
    pub reason: String,
    /// `budget_per_item * items_count`
    pub expected_max_total: f64,
    /// `None` when no total could be read
    pub actual_total: Option<f64>,
    /// `expected_max_total - actual_total`
    pub difference: Option<f64>,
    /// Items the cart reports
    pub items_count: u64,
    pub budget_per_item: f64,
    pub cart_url: String,
}

impl CartAssertion {
    /// Judge `actual_total` against the budget
    #[must_use]
    pub fn evaluate(
        budget_per_item: f64,
        items_count: usize,
        actual_total: Option<f64>,
        cart_items: u64,
        cart_url: impl Into<String>,
    ) -> Self {
        let expected_max_total = budget_per_item * items_count as f64;
        let cart_url = cart_url.into();
        let Some(total) = actual_total else {
            return Self {
                assertion_passed: false,
                reason: "Could not retrieve cart total".to_string(),
                expected_max_total,
                actual_total: None,
                difference: None,
                items_count: cart_items,
                budget_per_item,
                cart_url,
            };
        };

        let assertion_passed = total <= expected_max_total;
        let reason = if assertion_passed {
            "Cart total is within budget".to_string()
        } else {
            format!("Cart total exceeds budget by ${:.2}", total - expected_max_total)
        };
        Self {
            assertion_passed,
            reason,
            expected_max_total,
            actual_total: Some(total),
            difference: Some(expected_max_total - total),
            items_count: cart_items,
            budget_per_item,
            cart_url,
        }
    }

    /// Failed assertion for an empty cart
    #[must_use]
    pub fn empty(budget_per_item: f64, items_count: usize, cart_url: impl Into<String>) -> Self {
        Self {
            assertion_passed: false,
            reason: "Cart is empty".to_string(),
            expected_max_total: budget_per_item * items_count as f64,
            actual_total: Some(0.0),
            difference: None,
            items_count: 0,
            budget_per_item,
            cart_url: cart_url.into(),
        }
    }
}

/// Shopping cart page
#[derive(Debug, Clone)]
pub struct CartPage {
    base: BasePage,
    pub cart_subtotal: NamedLocator,
    pub cart_total: NamedLocator,
    pub item_count: NamedLocator,
    pub cart_items: NamedLocator,
    pub item_price: NamedLocator,
    pub item_title: NamedLocator,
    pub remove_item_button: NamedLocator,
    pub empty_cart: NamedLocator,
    pub checkout_button: NamedLocator,
    pub continue_shopping: NamedLocator,
    pub quantity_selector: NamedLocator,
}

impl PageObject for CartPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl CartPage {
    /// Cart page bound to a session
    #[must_use]
    pub fn new(session: &BrowserSession) -> Self {
        Self::with_base(BasePage::new(session, CART_PAGE_NAME, CART_URLS[0]))
    }

    /// Cart page over an existing base
    #[must_use]
    pub fn with_base(base: BasePage) -> Self {
        Self {
            cart_subtotal: base
                .locator("Cart Subtotal")
                .add_xpath("//span[@data-test-id='SUBTOTAL']", "XPath - data-test-id SUBTOTAL")
                .add_xpath(
                    "//span[contains(@class, 'subtotal')]//span[contains(text(), '$')]",
                    "XPath - subtotal class with $",
                ),
            cart_total: base
                .locator("Cart Total")
                .add_xpath("//span[@data-test-id='TOTAL']", "XPath - data-test-id TOTAL")
                .add_xpath(
                    "//div[contains(@class, 'order-total')]//span[contains(text(), '$')]",
                    "XPath - order-total class",
                ),
            item_count: base
                .locator("Item Count")
                .add_xpath("//span[@data-test-id='ITEM_COUNT']", "XPath - data-test-id ITEM_COUNT")
                .add_xpath("//span[contains(@class, 'item-count')]", "XPath - item-count class")
                .add_xpath(
                    "//*[contains(text(), 'item') and contains(text(), '(')]",
                    "XPath - text with item and (",
                )
                .add_xpath(
                    "//h1[contains(@class, 'cart-header')]//span",
                    "XPath - cart-header span",
                )
                .add_css("span[data-test-id='ITEM_COUNT']", "CSS - data-test-id")
                .add_css("span.item-count", "CSS - item-count class"),
            cart_items: base
                .locator("Cart Items")
                .add_xpath("//*[@data-test-id='CART_ITEM']", "XPath - data-test-id CART_ITEM")
                .add_xpath("//div[contains(@class, 'cart-item')]", "XPath - cart-item class")
                .add_xpath(
                    "//li[contains(@class, 'item')]//div[contains(@class, 'item-details')]",
                    "XPath - item with details",
                )
                .add_xpath(
                    "//div[contains(@class, 'cart-bucket')]//div[contains(@class, 'item')]",
                    "XPath - cart-bucket item",
                )
                .add_css("[data-test-id='CART_ITEM']", "CSS - data-test-id")
                .add_css("div.cart-item", "CSS - cart-item class"),
            item_price: base
                .locator("Item Price")
                .add_xpath(".//span[@data-test-id='ITEM_PRICE']", "XPath - data-test-id ITEM_PRICE")
                .add_xpath(
                    ".//span[contains(@class, 'item-price')]//span[contains(text(), '$')]",
                    "XPath - item-price class",
                )
                .add_xpath(
                    ".//span[starts-with(normalize-space(text()), '$')]",
                    "XPath - starts with $",
                )
                .add_css("span[data-test-id='ITEM_PRICE']", "CSS - data-test-id")
                .add_css("span.item-price span", "CSS - item-price span"),
            item_title: base
                .locator("Item Title")
                .add_xpath(".//span[@data-test-id='ITEM_TITLE']", "XPath - data-test-id ITEM_TITLE")
                .add_xpath(".//span[contains(@class, 'item-title')]", "XPath - item-title class")
                .add_xpath(".//a[contains(@class, 'item-title')]", "XPath - item-title link")
                .add_css("span[data-test-id='ITEM_TITLE']", "CSS - data-test-id")
                .add_css("span.item-title", "CSS - item-title class"),
            remove_item_button: base
                .locator("Remove Item Button")
                .add_xpath(".//button[@data-test-id='REMOVE']", "XPath - data-test-id REMOVE")
                .add_xpath(".//button[contains(text(), 'Remove')]", "XPath - text Remove")
                .add_xpath(".//button[@aria-label='Remove']", "XPath - aria-label")
                .add_xpath(".//button[contains(@class, 'remove')]", "XPath - remove class")
                .add_css("button[data-test-id='REMOVE']", "CSS - data-test-id")
                .add_css("button[aria-label='Remove']", "CSS - aria-label"),
            empty_cart: base
                .locator("Empty Cart Message")
                .add_xpath(
                    "//*[contains(text(), 'empty') or contains(text(), 'Empty')]",
                    "XPath - text empty",
                )
                .add_xpath("//div[contains(@class, 'empty-cart')]", "XPath - empty-cart class")
                .add_xpath(
                    "//*[contains(text(), 'no items') or contains(text(), 'No items')]",
                    "XPath - no items text",
                )
                .add_xpath("//*[@data-test-id='EMPTY_CART']", "XPath - data-test-id")
                .add_css("div.empty-cart", "CSS - empty-cart class")
                .add_css("[data-test-id='EMPTY_CART']", "CSS - data-test-id"),
            checkout_button: base
                .locator("Checkout Button")
                .add_xpath("//button[@data-test-id='CHECKOUT_BUTTON']", "XPath - data-test-id")
                .add_xpath(
                    "//button[contains(text(), 'Checkout') or contains(text(), 'checkout')]",
                    "XPath - text Checkout",
                )
                .add_xpath("//a[contains(@href, 'checkout')]", "XPath - href checkout")
                .add_xpath("//button[contains(@class, 'checkout')]", "XPath - checkout class")
                .add_xpath(
                    "//button[contains(@class, 'call-to-action')]",
                    "XPath - call-to-action class",
                )
                .add_css("button[data-test-id='CHECKOUT_BUTTON']", "CSS - data-test-id")
                .add_css("a[href*='checkout']", "CSS - href checkout")
                .add_css("button.checkout-btn", "CSS - checkout-btn class"),
            continue_shopping: base
                .locator("Continue Shopping")
                .add_xpath("//a[contains(text(), 'Continue shopping')]", "XPath - text content")
                .add_xpath(
                    "//a[contains(@href, 'ebay.com') and not(contains(@href, 'cart'))]",
                    "XPath - homepage href",
                )
                .add_css("a[href*='ebay.com']:not([href*='cart'])", "CSS - homepage link"),
            quantity_selector: base
                .locator("Quantity Selector")
                .add_xpath(".//select[@data-test-id='QTY_SELECT']", "XPath - data-test-id")
                .add_xpath(".//select[@name='quantity']", "XPath - name quantity")
                .add_xpath(".//select[@aria-label='Quantity']", "XPath - aria-label")
                .add_xpath(".//select[contains(@class, 'qty')]", "XPath - qty class")
                .add_css("select[data-test-id='QTY_SELECT']", "CSS - data-test-id")
                .add_css("select[name='quantity']", "CSS - name attribute"),
            base,
        }
    }

    async fn on_cart(&self) -> ProbeResult<bool> {
        let url = self.base.current_url().await?.to_lowercase();
        Ok(url.contains("cart") || url.contains("atc"))
    }

    /// Reach the cart: known URLs first, then a header cart link.
    /// Returns whether a cart page was reached.
    pub async fn navigate_to_cart(&self) -> bool {
        self.base.log_action("Navigation", "Going to shopping cart");
        for url in CART_URLS {
            match self.base.navigate(Some(url)).await {
                Ok(()) => {
                    if self.on_cart().await.unwrap_or(false) {
                        info!("Successfully navigated to cart: {url}");
                        return true;
                    }
                }
                Err(e) => debug!("Failed to navigate to {url}: {e}"),
            }
        }

        if let Some(link) = adhoc::first_visible(&self.base, None, &CART_LINKS).await {
            let clicked = async {
                link.click().await?;
                self.base.wait_for_page_load(None).await?;
                ProbeResult::Ok(())
            }
            .await;
            match clicked {
                Ok(()) => {
                    info!("Navigated to cart via cart icon");
                    return true;
                }
                Err(e) => error!("Failed to navigate to cart: {e}"),
            }
        }
        false
    }

    /// An empty-cart message is present
    pub async fn is_cart_empty(&self) -> bool {
        self.base
            .is_element_present(&self.empty_cart, Some(EMPTY_PROBE_MS))
            .await
    }

    async fn read_price(&self, locator: &NamedLocator) -> Option<f64> {
        if !self.base.is_element_present(locator, Some(TOTAL_PROBE_MS)).await {
            return None;
        }
        let text = self.base.get_text(locator).await.ok()?;
        parse_price(&text)
    }

    /// Subtotal, then total, then any positive price in the order summary
    pub async fn get_cart_subtotal(&self) -> Option<f64> {
        if let Some(subtotal) = self.read_price(&self.cart_subtotal).await {
            info!("Cart subtotal: ${subtotal}");
            return Some(subtotal);
        }
        if let Some(total) = self.read_price(&self.cart_total).await {
            info!("Cart total: ${total}");
            return Some(total);
        }

        for candidate in SUMMARY_PRICES {
            let Ok(handle) = adhoc::element(&self.base, candidate) else { continue };
            let Ok(elements) = handle.all().await else { continue };
            for element in elements {
                let Ok(Some(text)) = element.text_content().await else { continue };
                if !text.contains('$') {
                    continue;
                }
                if let Some(price) = parse_price(&text).filter(|p| *p > 0.0) {
                    info!("Found price via fallback: ${price}");
                    return Some(price);
                }
            }
        }
        warn!("Could not find cart subtotal/total");
        None
    }

    /// Count from the cart header, else the number of item rows
    pub async fn get_cart_item_count(&self) -> u64 {
        if self
            .base
            .is_element_present(&self.item_count, Some(COUNT_PROBE_MS))
            .await
        {
            let text = self.base.get_text(&self.item_count).await.ok();
            if let Some(count) = text.as_deref().and_then(parse_count) {
                return count;
            }
        }
        for candidate in ITEM_ROWS {
            let Ok(handle) = adhoc::element(&self.base, candidate) else { continue };
            match handle.count().await {
                Ok(count) if count > 0 => return count as u64,
                _ => {}
            }
        }
        0
    }

    /// Remove the `index`-th item; `false` if there is no such item or no
    /// visible remove button
    pub async fn remove_item(&self, index: usize) -> bool {
        let removed = async {
            let rows = adhoc::element(&self.base, REMOVE_ROW)?;
            if index >= rows.count().await? {
                return Ok(false);
            }
            let button = adhoc::scoped(&rows.nth(index), REMOVE_BUTTON)?.first();
            if !button.is_visible().await? {
                return Ok(false);
            }
            button.click().await?;
            self.base.wait_for_page_load(None).await?;
            ProbeResult::Ok(true)
        }
        .await;
        removed.unwrap_or_else(|e| {
            error!("Failed to remove item: {e}");
            false
        })
    }

    /// Open the cart and check its total does not exceed
    /// `budget_per_item * items_count`
    pub async fn assert_cart_total_not_exceeds(
        &self,
        budget_per_item: f64,
        items_count: usize,
    ) -> CartAssertion {
        self.base.log_action(
            "assertCartTotalNotExceeds",
            &format!("Budget per item: ${budget_per_item}, Items: {items_count}"),
        );

        self.navigate_to_cart().await;
        if let Err(e) = self.base.wait_for_network_idle(None).await {
            debug!("Network did not settle on cart page: {e}");
        }
        self.base.capture_screenshot("cart_page_before_assertion").await;
        let cart_url = self.base.current_url().await.unwrap_or_default();

        if self.is_cart_empty().await {
            error!("Cart is empty!");
            self.base.capture_screenshot("cart_empty").await;
            return CartAssertion::empty(budget_per_item, items_count, cart_url);
        }

        let total = self.get_cart_subtotal().await;
        let cart_items = self.get_cart_item_count().await;
        let assertion =
            CartAssertion::evaluate(budget_per_item, items_count, total, cart_items, cart_url);
        info!(
            "Cart Total: {:?}, Maximum Allowed: ${} (${budget_per_item} x {items_count}), Cart \
             Item Count: {cart_items}",
            assertion.actual_total, assertion.expected_max_total
        );

        match assertion.actual_total {
            None => {
                error!("Could not retrieve cart total!");
                self.base.capture_screenshot("cart_total_not_found").await;
            }
            Some(total) if assertion.assertion_passed => {
                info!(
                    "ASSERTION PASSED: Cart total ${total} <= Max allowed ${}",
                    assertion.expected_max_total
                );
                self.base.capture_screenshot("assertion_passed").await;
            }
            Some(total) => {
                error!(
                    "ASSERTION FAILED: Cart total ${total} > Max allowed ${}",
                    assertion.expected_max_total
                );
                self.base.capture_screenshot("assertion_failed").await;
            }
        }
        if assertion.actual_total.is_some() {
            self.base.capture_screenshot("cart_page_final").await;
        }
        assertion
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod assertion_tests {
        use super::*;

        #[test]
        fn test_within_budget() {
            let a = CartAssertion::evaluate(220.0, 3, Some(540.5), 3, "https://cart.ebay.com");
            assert!(a.assertion_passed);
            assert_eq!(a.reason, "Cart total is within budget");
            assert_eq!(a.expected_max_total, 660.0);
            assert_eq!(a.difference, Some(119.5));
        }

        #[test]
        fn test_exactly_at_budget_passes() {
            let a = CartAssertion::evaluate(100.0, 2, Some(200.0), 2, "");
            assert!(a.assertion_passed);
            assert_eq!(a.difference, Some(0.0));
        }

        #[test]
        fn test_over_budget_reason() {
            let a = CartAssertion::evaluate(100.0, 2, Some(212.345), 2, "");
            assert!(!a.assertion_passed);
            assert_eq!(a.reason, "Cart total exceeds budget by $12.35");
        }

        #[test]
        fn test_missing_total() {
            let a = CartAssertion::evaluate(100.0, 2, None, 2, "");
            assert!(!a.assertion_passed);
            assert_eq!(a.reason, "Could not retrieve cart total");
            assert_eq!(a.actual_total, None);
            assert_eq!(a.difference, None);
        }

        #[test]
        fn test_empty_cart() {
            let a = CartAssertion::empty(220.0, 5, "https://cart.ebay.com");
            assert!(!a.assertion_passed);
            assert_eq!(a.reason, "Cart is empty");
            assert_eq!(a.expected_max_total, 1100.0);
            assert_eq!(a.actual_total, Some(0.0));
            assert_eq!(a.items_count, 0);
        }

        #[test]
        fn test_serializes_for_reports() {
            let a = CartAssertion::evaluate(50.0, 1, Some(20.0), 1, "u");
            let json = serde_json::to_value(&a).unwrap();
            assert_eq!(json["assertion_passed"], true);
            assert_eq!(json["budget_per_item"], 50.0);
        }
    }
}
