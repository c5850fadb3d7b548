//! Search results: price filtering, paging and item collection

use crate::adhoc::{self, Candidate};
use crate::home::HomePage;
use crate::price::{parse_count, parse_price};
use smartprobe::{
    BasePage, BrowserSession, Element, NamedLocator, PageObject, ProbeResult, StrategyKind,
};
use tracing::{debug, error, info, warn};

/// Page name used in logs and screenshots
pub const SEARCH_RESULTS_PAGE_NAME: &str = "SearchResultsPage";

/// Path segment of result pages
pub const RESULTS_PATH_MARKER: &str = "/sch/";

/// Pages scanned before giving up on `limit`
pub const MAX_RESULT_PAGES: usize = 5;

const FILTER_PROBE_MS: u64 = 3_000;
const NEXT_PAGE_PROBE_MS: u64 = 3_000;
const NO_RESULTS_PROBE_MS: u64 = 2_000;

/// One listing row
const RESULT_ROW: Candidate = (StrategyKind::StructuralPath, "//li[contains(@class, 's-item')]");

/// Price inside a row, in fallback order
const ROW_PRICE: [Candidate; 3] = [
    (StrategyKind::StructuralPath, ".//span[contains(@class, 's-item__price')]"),
    (StrategyKind::StructuralPath, ".//span[@class='s-item__price']"),
    (StrategyKind::StyleSelector, "span.s-item__price"),
];

/// Item link inside a row, in fallback order
const ROW_LINK: [Candidate; 4] = [
    (StrategyKind::StructuralPath, ".//a[contains(@class, 's-item__link')]"),
    (StrategyKind::StructuralPath, ".//a[contains(@href, '/itm/')]"),
    (StrategyKind::StyleSelector, "a.s-item__link"),
    (StrategyKind::StyleSelector, "a[href*='/itm/']"),
];

/// Search results page
#[derive(Debug, Clone)]
pub struct SearchResultsPage {
    base: BasePage,
    pub price_min_input: NamedLocator,
    pub price_max_input: NamedLocator,
    pub price_filter_submit: NamedLocator,
    pub results_container: NamedLocator,
    pub next_page_button: NamedLocator,
    pub prev_page_button: NamedLocator,
    pub results_count: NamedLocator,
    pub sort_dropdown: NamedLocator,
    pub no_results: NamedLocator,
}

impl PageObject for SearchResultsPage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl SearchResultsPage {
    /// Results page bound to a session
    #[must_use]
    pub fn new(session: &BrowserSession) -> Self {
        Self::with_base(BasePage::new(session, SEARCH_RESULTS_PAGE_NAME, ""))
    }

    /// Results page over an existing base
    #[must_use]
    pub fn with_base(base: BasePage) -> Self {
        Self {
            price_min_input: base
                .locator("Price Min Input")
                .add_xpath("//input[@aria-label='Minimum value in $']", "aria-label")
                .add_xpath("//input[contains(@class, 'x-price-range__input--min')]", "class")
                .add_xpath("//input[@placeholder='Min']", "placeholder"),
            price_max_input: base
                .locator("Price Max Input")
                .add_css("input.x-price-range__input--max", "class")
                .add_css("input[aria-label='Maximum value in $']", "aria-label")
                .add_css("input[name='_udhi']", "name"),
            price_filter_submit: base
                .locator("Price Filter Submit")
                .add_xpath("//button[@aria-label='Submit price range']", "aria-label"),
            results_container: base
                .locator("Results Container")
                .add_xpath("//ul[@id='srp-river-results']", "id")
                .add_xpath("//ul[@data-view='list']", "data-view"),
            next_page_button: base
                .locator("Next Page Button")
                .add_xpath("//a[contains(@class, 'pagination__next')]", "class"),
            prev_page_button: base
                .locator("Previous Page Button")
                .add_xpath("//a[@type='prev']", "type")
                .add_css("a.pagination__prev", "class"),
            results_count: base
                .locator("Results Count")
                .add_xpath("//span[contains(@class, 'srp-controls__count')]", "class")
                .add_xpath("//h1[contains(text(), 'results')]", "text")
                .add_css(".srp-controls__count-heading", "class"),
            sort_dropdown: base
                .locator("Sort Dropdown")
                .add_xpath(
                    "//button[@aria-label='Sort selector. Best Match selected.']",
                    "aria-label",
                )
                .add_css("button.srp-controls__sort", "class"),
            no_results: base
                .locator("No Results Message")
                .add_xpath("//div[contains(@class, 'srp-no-results')]", "class")
                .add_xpath("//*[contains(text(), 'No exact matches found')]", "text")
                .add_xpath("//h3[contains(text(), 'No results')]", "text"),
            base,
        }
    }

    async fn is_price_filter_available(&self) -> bool {
        self.base
            .is_element_present(&self.price_max_input, Some(FILTER_PROBE_MS))
            .await
    }

    /// Apply a price range when the filter is shown; `false` if it is not
    pub async fn apply_price_filter(&self, max_price: f64, min_price: f64) -> bool {
        self.base.log_action(
            "Price Filter",
            &format!("Attempting to apply price filter: ${min_price} - ${max_price}"),
        );
        if !self.is_price_filter_available().await {
            info!("Price filter not available on this page");
            return false;
        }
        match self.fill_price_filter(max_price, min_price).await {
            Ok(()) => {
                info!("Price filter applied: ${min_price} - ${max_price}");
                true
            }
            Err(e) => {
                warn!("Failed to apply price filter: {e}");
                false
            }
        }
    }

    async fn fill_price_filter(&self, max_price: f64, min_price: f64) -> ProbeResult<()> {
        if min_price > 0.0 {
            self.base
                .fill(&self.price_min_input, &(min_price.trunc() as i64).to_string())
                .await?;
        }
        self.base
            .fill(&self.price_max_input, &(max_price.trunc() as i64).to_string())
            .await?;
        self.base.click(&self.price_filter_submit).await?;
        self.base.wait_for_page_load(None).await?;
        self.base.wait_for_network_idle(None).await?;
        Ok(())
    }

    async fn is_next_page_available(&self) -> bool {
        self.base
            .is_element_present(&self.next_page_button, Some(NEXT_PAGE_PROBE_MS))
            .await
    }

    /// Follow the pagination link; `false` when there is no next page
    pub async fn go_to_next_page(&self) -> bool {
        if !self.is_next_page_available().await {
            info!("No next page available");
            return false;
        }
        self.base.log_action("Pagination", "Navigating to next page");
        let moved = async {
            self.base.click(&self.next_page_button).await?;
            self.base.wait_for_page_load(None).await?;
            self.base.wait_for_network_idle(None).await?;
            ProbeResult::Ok(())
        }
        .await;
        match moved {
            Ok(()) => {
                info!("Successfully navigated to next page");
                true
            }
            Err(e) => {
                warn!("Failed to navigate to next page: {e}");
                false
            }
        }
    }

    /// Item URLs on the current page priced at or under `max_price`, skipping
    /// anything already in `collected`, until `limit` is reached overall
    pub async fn extract_items_from_current_page(
        &self,
        max_price: f64,
        limit: usize,
        collected: &[String],
    ) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        let remaining = limit.saturating_sub(collected.len());
        if remaining == 0 {
            return urls;
        }

        let rows = match self.result_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Error extracting items: {e}");
                return urls;
            }
        };
        info!("Found {} items on current page, need {remaining} more", rows.len());

        for row in &rows {
            if urls.len() + collected.len() >= limit {
                break;
            }
            match self.row_item(row, max_price).await {
                Ok(Some(href)) if !collected.contains(&href) && !urls.contains(&href) => {
                    info!("Collected item: {href}");
                    urls.push(href);
                }
                Ok(_) => {}
                Err(e) => debug!("Error processing item: {e}"),
            }
        }
        urls
    }

    async fn result_rows(&self) -> ProbeResult<Vec<Element>> {
        adhoc::element(&self.base, RESULT_ROW)?.all().await
    }

    /// Link of a row whose price parses and fits the budget
    async fn row_item(&self, row: &Element, max_price: f64) -> ProbeResult<Option<String>> {
        let Some(price_element) = adhoc::first_visible(&self.base, Some(row), &ROW_PRICE).await
        else {
            return Ok(None);
        };
        let text = price_element.text_content().await?.unwrap_or_default();
        let Some(price) = parse_price(&text) else {
            debug!("Could not parse price: {text}");
            return Ok(None);
        };
        if price > max_price {
            debug!("Price ${price} exceeds max ${max_price}, skipping");
            return Ok(None);
        }

        for candidate in ROW_LINK {
            let link = adhoc::scoped(row, candidate)?.first();
            if let Ok(Some(href)) = link.attribute("href").await {
                if !href.is_empty() {
                    return Ok(Some(href));
                }
            }
        }
        Ok(None)
    }

    /// Collect up to `limit` item URLs matching `query` priced at or under
    /// `max_price`.
    ///
    /// Starts a search from the home page unless already on a results page,
    /// tries the price filter, then scans up to [`MAX_RESULT_PAGES`] pages.
    /// Whatever was collected before an error is returned.
    pub async fn search_items_by_name_under_price(
        &self,
        query: &str,
        max_price: f64,
        limit: usize,
    ) -> Vec<String> {
        self.base.log_action(
            "searchItemsByNameUnderPrice",
            &format!("Query: '{query}', Max Price: ${max_price}, Limit: {limit}"),
        );
        let mut collected = Vec::new();
        if let Err(e) = self.collect(query, max_price, limit, &mut collected).await {
            error!("searchItemsByNameUnderPrice failed: {e}");
            self.base.capture_screenshot("search_error").await;
        }
        collected
    }

    async fn collect(
        &self,
        query: &str,
        max_price: f64,
        limit: usize,
        collected: &mut Vec<String>,
    ) -> ProbeResult<()> {
        if !self.base.current_url().await?.contains(RESULTS_PATH_MARKER) {
            let home = HomePage::with_base(self.sibling_home());
            home.base().navigate(None).await?;
            home.identification().await;
            home.search(query).await?;
        }
        self.base.wait_for_page_load(None).await?;
        self.base.wait_for_network_idle(None).await?;

        if self.apply_price_filter(max_price, 0.0).await {
            info!("Price filter was applied successfully");
        } else {
            info!("Price filter not available, will filter manually");
        }
        self.base.capture_screenshot(&format!("search_results_{query}")).await;

        let first = self
            .extract_items_from_current_page(max_price, limit, collected.as_slice())
            .await;
        collected.extend(first);
        info!("Collected {} items from first page", collected.len());

        let mut page_count = 1;
        while collected.len() < limit && page_count < MAX_RESULT_PAGES {
            if !self.go_to_next_page().await {
                info!("No more pages available");
                break;
            }
            page_count += 1;
            info!("Processing page {page_count}");
            let more = self
                .extract_items_from_current_page(max_price, limit, collected.as_slice())
                .await;
            collected.extend(more);
            info!("Total collected: {} items after page {page_count}", collected.len());
        }

        info!(
            "searchItemsByNameUnderPrice completed: Found {} items for '{query}' under \
             ${max_price}",
            collected.len()
        );
        self.base.capture_screenshot(&format!("search_complete_{query}")).await;
        Ok(())
    }

    fn sibling_home(&self) -> BasePage {
        BasePage::with_parts(
            self.base.driver().clone(),
            self.base.settings().clone(),
            self.base.screenshots().clone(),
            crate::home::HOME_PAGE_NAME,
            self.base.settings().base_url.clone(),
        )
    }

    /// Total result count from the header, if shown
    pub async fn get_results_count(&self) -> Option<u64> {
        if !self.base.is_element_visible(&self.results_count, None).await {
            return None;
        }
        let text = self.base.get_text(&self.results_count).await.ok()?;
        parse_count(&text)
    }

    /// No "no results" banner within two seconds
    pub async fn has_results(&self) -> bool {
        !self
            .base
            .is_element_present(&self.no_results, Some(NO_RESULTS_PROBE_MS))
            .await
    }
}
