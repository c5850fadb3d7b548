//! Home page: search entry point and header navigation

use smartprobe::{BasePage, BrowserSession, NamedLocator, PageObject, ProbeResult, SelectBy};
use tracing::{error, info, warn};

/// Page name used in logs and screenshots
pub const HOME_PAGE_NAME: &str = "HomePage";

/// Marker every page of the target site carries in its URL
pub const SITE_MARKER: &str = "ebay.com";

/// Sign-in probe used to detect a logged-in user
const SIGN_IN_PROBE_MS: u64 = 2_000;

/// Home page of the shop
#[derive(Debug, Clone)]
pub struct HomePage {
    base: BasePage,
    pub search_input: NamedLocator,
    pub search_button: NamedLocator,
    pub logo: NamedLocator,
    pub cart_icon: NamedLocator,
    pub category_dropdown: NamedLocator,
    pub my_account_link: NamedLocator,
    pub sign_in_link: NamedLocator,
}

impl PageObject for HomePage {
    fn base(&self) -> &BasePage {
        &self.base
    }
}

impl HomePage {
    /// Home page at the configured base URL
    #[must_use]
    pub fn new(session: &BrowserSession) -> Self {
        let url = session.settings().base_url.clone();
        Self::with_base(BasePage::new(session, HOME_PAGE_NAME, url))
    }

    /// Home page over an existing base
    #[must_use]
    pub fn with_base(base: BasePage) -> Self {
        Self {
            search_input: base
                .locator("Search Input")
                .add_xpath("//input[@id='gh-ac']", "XPath - ID based")
                .add_xpath("//input[@placeholder='Search for anything']", "XPath - placeholder")
                .add_css("input[type='text'][name='_nkw']", "CSS - attribute selector"),
            search_button: base
                .locator("Search Button")
                .add_xpath("//button[text()='Search']", "text")
                .add_xpath("//button[contains(@aria-label, 'Search')]", "aria-label")
                .add_css("button[type='submit']", "type")
                .add_xpath("//button[contains(@class, 'btn')]", "class")
                .add_xpath("//form[@role='search']//button", "form button"),
            logo: base
                .locator("eBay Logo")
                .add_xpath("//a[@id='gh-la']", "ID")
                .add_xpath("//a[contains(@class, 'gh-logo')]", "class")
                .add_css("a#gh-la", "CSS ID")
                .add_xpath("//a[@aria-label='eBay Home']", "aria-label")
                .add_xpath("//a[contains(@href, 'ebay.com')][@class]", "href"),
            cart_icon: base
                .locator("Cart Icon")
                .add_xpath("//a[contains(@href, 'cart')]", "href")
                .add_xpath("//a[contains(@aria-label, 'cart')]", "aria-label")
                .add_css("a[href*='cart']", "CSS href")
                .add_xpath("//a[contains(@title, 'cart')]", "title")
                .add_xpath("//a[contains(., 'cart') or contains(@class, 'cart')]", "any cart"),
            category_dropdown: base
                .locator("Category Dropdown")
                .add_xpath("//select[@id='gh-cat']", "XPath - ID based")
                .add_css("#gh-cat", "CSS - ID selector")
                .add_css("select.gh-cat__sel", "CSS - class selector"),
            my_account_link: base
                .locator("My eBay Link")
                .add_xpath("//a[@id='gh-eb-My']", "XPath - ID based"),
            sign_in_link: base
                .locator("Sign In Link")
                .add_xpath("//a[contains(@href, 'signin')]", "XPath - href contains")
                .add_xpath("//span[contains(@class, 'gh-eb-u')]/a", "XPath - parent class"),
            base,
        }
    }

    /// Confirm the home page is up.
    ///
    /// Passes when the search input and button are visible and the URL
    /// belongs to the site. A missing logo or cart icon only warns.
    pub async fn identification(&self) -> bool {
        self.base.log_action("Identification", "Verifying home page");
        match self.identify().await {
            Ok(passed) => {
                let shot = if passed {
                    "identification_success"
                } else {
                    "identification_failure"
                };
                self.base.capture_screenshot(shot).await;
                passed
            }
            Err(e) => {
                error!("Identification failed with error: {e}");
                self.base.capture_screenshot("identification_error").await;
                false
            }
        }
    }

    async fn identify(&self) -> ProbeResult<bool> {
        if !self.on_site().await? {
            self.base.navigate(None).await?;
        }
        self.base.wait_for_page_load(None).await?;

        let logo = self.base.is_element_visible(&self.logo, None).await;
        let search_input = self.base.is_element_visible(&self.search_input, None).await;
        let search_button = self.base.is_element_visible(&self.search_button, None).await;
        let cart_icon = self.base.is_element_visible(&self.cart_icon, None).await;
        for (name, found) in [
            ("eBay Logo", logo),
            ("Search Input", search_input),
            ("Search Button", search_button),
            ("Cart Icon", cart_icon),
        ] {
            info!("Identification check - {name}: {}", if found { "FOUND" } else { "NOT FOUND" });
        }

        let url = self.base.current_url().await?;
        let on_site = url.to_lowercase().contains(SITE_MARKER);
        info!("URL verification: {url} - {}", if on_site { "VALID" } else { "INVALID" });

        if !logo {
            warn!("Optional element 'eBay Logo' not found - continuing anyway");
        }
        if !cart_icon {
            warn!("Optional element 'Cart Icon' not found - continuing anyway");
        }

        let passed = search_input && search_button && on_site;
        if passed {
            info!("Identification: SUCCESS - home page verified");
        } else {
            error!("Identification: FAILED - some elements not found");
        }
        Ok(passed)
    }

    async fn on_site(&self) -> ProbeResult<bool> {
        Ok(self.base.current_url().await?.to_lowercase().contains(SITE_MARKER))
    }

    /// Type a query and submit it
    pub async fn search(&self, query: &str) -> ProbeResult<()> {
        self.base.log_action("Search", &format!("Searching for: {query}"));
        self.base.fill(&self.search_input, query).await?;
        self.base.click(&self.search_button).await?;
        self.base.wait_for_page_load(None).await?;
        self.base.wait_for_network_idle(None).await?;
        info!("Search completed for: {query}");
        Ok(())
    }

    /// Pick a category (when the dropdown is shown) and search
    pub async fn search_with_category(&self, query: &str, category: &str) -> ProbeResult<()> {
        self.base
            .log_action("Search with Category", &format!("Query: {query}, Category: {category}"));
        if self.base.is_element_visible(&self.category_dropdown, None).await {
            self.base
                .select_option(&self.category_dropdown, &SelectBy::Label(category.to_string()))
                .await?;
        }
        self.base.fill(&self.search_input, query).await?;
        self.base.click(&self.search_button).await?;
        self.base.wait_for_page_load(None).await?;
        self.base.wait_for_network_idle(None).await?;
        Ok(())
    }

    /// Open the cart from the header
    pub async fn go_to_cart(&self) -> ProbeResult<()> {
        self.base.log_action("Navigation", "Going to cart");
        self.base.click(&self.cart_icon).await?;
        self.base.wait_for_page_load(None).await?;
        Ok(())
    }

    /// Open the account area from the header
    pub async fn go_to_my_ebay(&self) -> ProbeResult<()> {
        self.base.log_action("Navigation", "Going to My eBay");
        self.base.click(&self.my_account_link).await?;
        self.base.wait_for_page_load(None).await?;
        Ok(())
    }

    /// A visible sign-in link means nobody is logged in
    pub async fn is_user_logged_in(&self) -> bool {
        !self
            .base
            .is_element_visible(&self.sign_in_link, Some(SIGN_IN_PROBE_MS))
            .await
    }
}
