//! Product page: variant selection and add-to-cart

use crate::adhoc::{self, Candidate};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smartprobe::{
    BasePage, BrowserSession, CartVerificationPolicy, Element, NamedLocator, PageObject,
    ProbeResult, SelectBy, StrategyKind,
};
use std::time::Duration;
use tracing::{error, info, warn};

/// Page name used in logs and screenshots
pub const PRODUCT_PAGE_NAME: &str = "ProductPage";

/// Texts that confirm an item landed in the cart
pub const CONFIRMATION_TEXTS: [&str; 4] = [
    "Added to cart",
    "added to cart",
    "Added to your cart",
    "Item added",
];

const VARIANT_PROBE_MS: u64 = 2_000;
const VARIANT_PICK_PROBE_MS: u64 = 1_000;
const ADD_BUTTON_PROBE_MS: u64 = 5_000;
const VARIANT_ERROR_PROBE_MS: u64 = 1_000;

/// Pause before looking for variant controls
const VARIANT_SETTLE: Duration = Duration::from_millis(1_000);
/// Pause after picking a variant (price/availability refresh)
const VARIANT_REFRESH: Duration = Duration::from_millis(500);
/// Pause for the cart overlay to appear
const CONFIRMATION_SETTLE: Duration = Duration::from_millis(2_000);

const SIZE_RADIOS: Candidate = (
    StrategyKind::StructuralPath,
    "//div[contains(@class, 'x-msku__box-cont')]//input[@type='radio']",
);
const SWATCH_BUTTONS: Candidate = (
    StrategyKind::StructuralPath,
    "//ul[contains(@class, 'x-msku__swatch-list')]//button",
);
const DROPDOWN_OPTION: Candidate = (StrategyKind::StyleSelector, "option");

/// Outcome of one add-to-cart run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddToCartSummary {
    /// URLs whose items were added
    pub successful: Vec<String>,
    /// URLs that could not be added
    pub failed: Vec<String>,
}

impl AddToCartSummary {
    /// Total URLs processed
    #[must_use]
    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len()
    }
}

/// Product detail page
#[derive(Debug, Clone)]
pub struct ProductPage {
    base: BasePage,
    policy: CartVerificationPolicy,
    pub add_to_cart_button: NamedLocator,
    pub buy_now_button: NamedLocator,
    pub size_selector: NamedLocator,
    pub size_options: NamedLocator,
    pub color_selector: NamedLocator,
    pub color_options: NamedLocator,
    pub quantity_input: NamedLocator,
    pub product_title: NamedLocator,
    pub product_price: NamedLocator,
    pub cart_confirmation: NamedLocator,
    pub variant_error: NamedLocator,
    pub product_image: NamedLocator,
}

impl PageObject for ProductPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl ProductPage {
    /// Product page bound to a session
    #[must_use]
    pub fn new(session: &BrowserSession) -> Self {
        Self::with_base(BasePage::new(session, PRODUCT_PAGE_NAME, ""))
    }

    /// Product page over an existing base; the cart policy comes from its
    /// settings
    #[must_use]
    pub fn with_base(base: BasePage) -> Self {
        Self {
            policy: base.settings().cart.verification,
            add_to_cart_button: base
                .locator("Add to Cart Button")
                .add_xpath(
                    "//a[contains(@class, 'ux-call-to-action') and contains(., 'Add to cart')]",
                    "XPath - class and text",
                )
                .add_xpath(
                    "//span[contains(text(), 'Add to cart')]/ancestor::a",
                    "XPath - text with ancestor",
                )
                .add_css("[data-testid='ux-call-to-action-atc']", "CSS - data-testid"),
            buy_now_button: base
                .locator("Buy It Now Button")
                .add_xpath("//a[@id='binBtn_btn_1']", "XPath - ID binBtn_btn_1"),
            size_selector: base
                .locator("Size Selector")
                .add_xpath(
                    "//div[contains(@class, 'x-msku__select-box')]//select",
                    "XPath - msku select",
                )
                .add_xpath("//select[@aria-label='Size']", "XPath - aria-label"),
            size_options: base
                .locator("Size Options")
                .add_xpath(
                    "//ul[contains(@class, 'x-msku__swatch-list')]//button",
                    "XPath - swatch list button",
                )
                .add_xpath(
                    "//div[contains(@class, 'x-msku__box-cont') and \
                     .//span[contains(text(),'Size')]]//input",
                    "XPath - msku with size text",
                )
                .add_css("div.x-msku__box-cont input[type='radio']", "CSS - container and radio"),
            color_selector: base
                .locator("Color Selector")
                .add_css("select[id*='Color'], select[id*='color']", "CSS - ID contains"),
            color_options: base
                .locator("Color Options")
                .add_xpath(
                    "//ul[contains(@class, 'x-msku__swatch-list')]//button",
                    "XPath - swatch list button",
                ),
            quantity_input: base
                .locator("Quantity Input")
                .add_xpath("//input[@id='qtyTextBox']", "XPath - ID qtyTextBox")
                .add_xpath(
                    "//input[contains(@class, 'x-quantity__input')]",
                    "XPath - x-quantity class",
                ),
            product_title: base
                .locator("Product Title")
                .add_xpath("//h1[contains(@class, 'x-item-title')]", "XPath - x-item-title class")
                .add_xpath("//h1[@itemprop='name']", "XPath - itemprop name")
                .add_xpath(
                    "//div[contains(@class, 'x-item-title')]//span[@class='ux-textspans']",
                    "XPath - span in title div",
                )
                .add_xpath("//*[@data-testid='x-item-title']", "XPath - data-testid"),
            product_price: base
                .locator("Product Price")
                .add_xpath(
                    "//div[contains(@class, 'x-price-primary')]//span[@itemprop='price']",
                    "XPath - itemprop price",
                )
                .add_xpath(
                    "//div[contains(@class, 'x-price-primary')]//span[contains(@class, \
                     'ux-textspans')]",
                    "XPath - ux-textspans in price",
                )
                .add_xpath("//*[@data-testid='x-price-primary']//span", "XPath - data-testid"),
            cart_confirmation: base
                .locator("Cart Confirmation")
                .add_xpath(
                    "//div[contains(@class, 'ux-overlay')]//span[contains(text(), 'Added to \
                     cart')]",
                    "XPath - overlay with text",
                )
                .add_xpath(
                    "//*[contains(text(), 'Added to cart') or contains(text(), 'added to cart')]",
                    "XPath - text content",
                )
                .add_xpath(
                    "//div[contains(@class, 'atc-confirmation')]",
                    "XPath - atc-confirmation class",
                ),
            variant_error: base
                .locator("Variant Error")
                .add_xpath("//*[contains(text(), 'Please select')]", "XPath - text Please select")
                .add_xpath(
                    "//span[contains(@class, 'ux-textspans--NEGATIVE')]",
                    "XPath - negative textspans",
                ),
            product_image: base
                .locator("Product Image")
                .add_xpath("//img[@id='icImg']", "XPath - ID icImg"),
            base,
        }
    }

    /// Override the cart verification policy
    #[must_use]
    pub const fn with_policy(mut self, policy: CartVerificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active cart verification policy
    #[must_use]
    pub const fn policy(&self) -> CartVerificationPolicy {
        self.policy
    }

    /// Product title, or "Unknown Product"
    pub async fn get_product_title(&self) -> String {
        self.base
            .get_text(&self.product_title)
            .await
            .unwrap_or_else(|_| "Unknown Product".to_string())
    }

    /// Product price text, or "Unknown Price"
    pub async fn get_product_price(&self) -> String {
        self.base
            .get_text(&self.product_price)
            .await
            .unwrap_or_else(|_| "Unknown Price".to_string())
    }

    async fn present(&self, locator: &NamedLocator, timeout_ms: u64) -> bool {
        self.base.is_element_present(locator, Some(timeout_ms)).await
    }

    async fn has_size_selection(&self) -> bool {
        self.present(&self.size_selector, VARIANT_PROBE_MS).await
            || self.present(&self.size_options, VARIANT_PROBE_MS).await
    }

    async fn has_color_selection(&self) -> bool {
        self.present(&self.color_selector, VARIANT_PROBE_MS).await
            || self.present(&self.color_options, VARIANT_PROBE_MS).await
    }

    /// Pick a random option after the placeholder; `None` if the dropdown has
    /// no real options
    async fn pick_from_dropdown(&self, dropdown: &NamedLocator) -> ProbeResult<Option<String>> {
        let select = self.base.find_element(dropdown, false).await?;
        let options = adhoc::scoped(&select, DROPDOWN_OPTION)?.count().await?;
        if options <= 1 {
            return Ok(None);
        }
        let index = rand::thread_rng().gen_range(1..options);
        let value = select.select_option(&SelectBy::Index(index)).await?;
        Ok(Some(value))
    }

    /// Click a random enabled swatch among the first group that has any
    async fn pick_from_swatches(&self, groups: &[Candidate]) -> ProbeResult<bool> {
        for &group in groups {
            let mut enabled: Vec<Element> = Vec::new();
            for option in adhoc::element(&self.base, group)?.all().await? {
                if option.is_enabled().await.unwrap_or(false) {
                    enabled.push(option);
                }
            }
            let choice = enabled.choose(&mut rand::thread_rng()).cloned();
            if let Some(option) = choice {
                option.click().await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn select_random_variant(
        &self,
        kind: &str,
        dropdown: &NamedLocator,
        swatches: &NamedLocator,
        groups: &[Candidate],
    ) -> bool {
        let picked: ProbeResult<bool> = async {
            if self.present(dropdown, VARIANT_PICK_PROBE_MS).await {
                let details = format!("Selecting random {kind} from dropdown");
                self.base.log_action("Variant Selection", &details);
                if let Some(value) = self.pick_from_dropdown(dropdown).await? {
                    info!("Selected {kind}: {value}");
                    return Ok(true);
                }
            }
            if self.present(swatches, VARIANT_PICK_PROBE_MS).await {
                let details = format!("Selecting random {kind} from options");
                self.base.log_action("Variant Selection", &details);
                if self.pick_from_swatches(groups).await? {
                    info!("Selected random {kind} option");
                    return Ok(true);
                }
            }
            Ok(false)
        }
        .await;
        picked.unwrap_or_else(|e| {
            warn!("Failed to select {kind}: {e}");
            false
        })
    }

    /// Choose random size and color variants when the listing has them
    pub async fn handle_variant_selection(&self) {
        self.base
            .log_action("Variant Selection", "Checking for required variants");
        tokio::time::sleep(VARIANT_SETTLE).await;

        if self.has_size_selection().await {
            self.select_random_variant(
                "size",
                &self.size_selector,
                &self.size_options,
                &[SIZE_RADIOS, SWATCH_BUTTONS],
            )
            .await;
            tokio::time::sleep(VARIANT_REFRESH).await;
        }
        if self.has_color_selection().await {
            self.select_random_variant(
                "color",
                &self.color_selector,
                &self.color_options,
                &[SWATCH_BUTTONS],
            )
            .await;
            tokio::time::sleep(VARIANT_REFRESH).await;
        }
    }

    async fn click_add_to_cart(&self) -> ProbeResult<bool> {
        self.base.log_action("Add to Cart", "Clicking Add to Cart button");
        if !self.present(&self.add_to_cart_button, ADD_BUTTON_PROBE_MS).await {
            warn!("Add to Cart button not found");
            return Ok(false);
        }
        self.base.click(&self.add_to_cart_button).await?;
        Ok(true)
    }

    /// Whether the last add-to-cart took effect.
    ///
    /// A visible variant error always fails. Otherwise a confirmation text or
    /// a cart URL passes, and with neither the policy decides.
    pub async fn verify_added_to_cart(&self) -> ProbeResult<bool> {
        tokio::time::sleep(CONFIRMATION_SETTLE).await;

        if self
            .base
            .is_element_visible(&self.variant_error, Some(VARIANT_ERROR_PROBE_MS))
            .await
        {
            error!("Variant error shown after Add to Cart");
            return Ok(false);
        }

        for text in CONFIRMATION_TEXTS {
            if adhoc::element(&self.base, (StrategyKind::VisibleText, text))?.count().await? > 0 {
                info!("Cart confirmation found: '{text}'");
                return Ok(true);
            }
        }

        if self.base.current_url().await?.to_lowercase().contains("cart") {
            info!("Redirected to cart page - item added");
            return Ok(true);
        }

        match self.policy {
            CartVerificationPolicy::AssumeSuccess => {
                warn!("Could not verify item was added to cart, assuming success");
                Ok(true)
            }
            CartVerificationPolicy::RequireConfirmation => {
                error!("Could not verify item was added to cart");
                Ok(false)
            }
        }
    }

    /// Open `url`, pick variants, add the item and verify
    pub async fn add_to_cart(&self, url: &str) -> bool {
        self.base
            .log_action("Add to Cart", &format!("Processing: {}", preview(url, 80)));
        match self.try_add_to_cart(url).await {
            Ok(added) => added,
            Err(e) => {
                error!("Failed to add item to cart: {e}");
                self.base.capture_screenshot("add_to_cart_error").await;
                false
            }
        }
    }

    async fn try_add_to_cart(&self, url: &str) -> ProbeResult<bool> {
        self.base.navigate(Some(url)).await?;
        self.base.wait_for_network_idle(None).await?;

        let title = self.get_product_title().await;
        let price = self.get_product_price().await;
        info!("Product: {} - {price}", preview(&title, 50));

        self.handle_variant_selection().await;

        if !self.click_add_to_cart().await? {
            self.base.capture_screenshot("add_to_cart_failed").await;
            return Ok(false);
        }

        let added = self.verify_added_to_cart().await?;
        if added {
            info!("Successfully added to cart: {}", preview(&title, 50));
            let name = preview(&title, 20).replace(' ', "_");
            self.base.capture_screenshot(&format!("added_to_cart_{name}")).await;
        }
        Ok(added)
    }

    /// Add every URL in turn, recording which ones made it
    pub async fn add_items_to_cart(&self, urls: &[String]) -> AddToCartSummary {
        info!("addItemsToCart: Processing {} items", urls.len());
        let mut summary = AddToCartSummary::default();
        for (index, url) in urls.iter().enumerate() {
            info!("Processing item {}/{}", index + 1, urls.len());
            if self.add_to_cart(url).await {
                info!("Item {} added successfully", index + 1);
                summary.successful.push(url.clone());
            } else {
                warn!("Item {} failed to add", index + 1);
                summary.failed.push(url.clone());
            }
        }
        info!(
            "addItemsToCart completed: {} successful, {} failed",
            summary.successful.len(),
            summary.failed.len()
        );
        summary
    }
}

/// First `max` characters of `text`
fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_counts_chars() {
        assert_eq!(preview("Running Shoes Size 10", 7), "Running");
        assert_eq!(preview("ñandú", 3), "ñan");
        assert_eq!(preview("ok", 10), "ok");
    }

    #[test]
    fn test_summary_total() {
        let summary = AddToCartSummary {
            successful: vec!["a".into(), "b".into()],
            failed: vec!["c".into()],
        };
        assert_eq!(summary.total(), 3);
    }
}
