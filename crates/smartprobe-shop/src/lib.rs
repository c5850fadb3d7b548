//! Page objects and shopping flows for an eBay-style storefront.
//!
//! Every page embeds a [`smartprobe::BasePage`] and describes its elements
//! as [`smartprobe::NamedLocator`]s with ordered fallbacks, so markup
//! changes on the site degrade to a later strategy instead of a failure.
//!
//! ```text
//! HomePage ──search──▶ SearchResultsPage ──urls──▶ ProductPage ──▶ CartPage
//!     └──────────────────── ShoppingFlow ───────────────────────────────┘
//! ```
//!
//! ```no_run
//! use smartprobe::{SessionFactory, Settings, MockLauncher};
//! use smartprobe_shop::{ShoppingFlow, ShoppingScenario};
//! use std::sync::Arc;
//!
//! # async fn demo() -> smartprobe::ProbeResult<()> {
//! let factory = SessionFactory::new(Arc::new(MockLauncher::new()), Settings::default());
//! let session = factory.create().await?;
//! let report = ShoppingFlow::new(session)
//!     .run(&ShoppingScenario { search_query: "shoes".into(), max_price: 220.0, limit: 5 })
//!     .await;
//! println!("passed: {}", report.passed);
//! # Ok(())
//! # }
//! ```

mod adhoc;
pub mod cart;
pub mod flow;
pub mod home;
pub mod price;
pub mod product;
pub mod search;

pub use cart::{CartAssertion, CartPage, CART_URLS};
pub use flow::{
    load_scenarios, FlowReport, FlowStep, ShoppingFlow, ShoppingScenario, StepReport, SCENARIO_FILE,
};
pub use home::HomePage;
pub use price::{parse_count, parse_price};
pub use product::{AddToCartSummary, ProductPage};
pub use search::SearchResultsPage;
