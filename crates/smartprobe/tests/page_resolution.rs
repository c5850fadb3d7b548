//! End-to-end resolution through sessions and page objects on a mock page

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use smartprobe::{
    BasePage, LoadState, MockElement, MockLauncher, MockPage, NamedLocator, ProbeError,
    SessionFactory, Settings, StrategyKind,
};
use std::sync::Arc;
use tempfile::TempDir;

const HOME: &str = "https://shop.test/";

fn cart_icon() -> NamedLocator {
    NamedLocator::new("Cart Icon")
        .add_xpath("//a[@id='gh-cart-old']", "Legacy id")
        .add_css("a.gh-cart", "Header cart link")
        .add_role("link[name=Cart]", "Cart link by role")
        .with_timeout(1_000)
}

fn setup(tmp: &TempDir) -> (Arc<MockLauncher>, SessionFactory) {
    let launcher = Arc::new(MockLauncher::new().with_setup(|driver| {
        driver.register_page(
            MockPage::new(HOME)
                .with_title("Shop home")
                .with_element("css=a.gh-cart", MockElement::visible().with_text(" Cart "))
                .with_element("role=link[name=\"Cart\"]", MockElement::visible()),
        );
    }));
    let settings = Settings::new()
        .with_base_url(HOME)
        .with_screenshots_dir(tmp.path().join("shots"))
        .with_max_locator_retries(3);
    let factory = SessionFactory::new(launcher.clone(), settings);
    (launcher, factory)
}

// ============================================================================
// Fallback
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_page_falls_back_to_second_strategy() {
    let tmp = TempDir::new().unwrap();
    let (_launcher, factory) = setup(&tmp);
    let session = factory.create().await.unwrap();
    let page = BasePage::new(&session, "HomePage", HOME);
    page.navigate(None).await.unwrap();

    let result = page.resolve_locator(&cart_icon(), true).await;

    assert!(result.succeeded);
    assert_eq!(result.attempt_count, 2);
    assert!(!result.attempts[0].succeeded);
    assert!(result.attempts[0]
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("Timeout"));
    let winner = result.winning_strategy.as_ref().unwrap();
    assert_eq!(winner.kind(), StrategyKind::StyleSelector);
    assert_eq!(page.get_text(&cart_icon()).await.unwrap(), "Cart");
    factory.close_all().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unresolvable_locator_leaves_failure_screenshot() {
    let tmp = TempDir::new().unwrap();
    let (_launcher, factory) = setup(&tmp);
    let session = factory.create().await.unwrap();
    let page = BasePage::new(&session, "HomePage", HOME);
    page.navigate(None).await.unwrap();

    let missing = NamedLocator::new("Checkout Button")
        .add_css("button.checkout", "Checkout class")
        .add_text("Go to checkout", "Checkout text")
        .with_timeout(500);
    let err = page.find_element(&missing, true).await.unwrap_err();

    match err {
        ProbeError::ElementNotFound { name, attempts, artifact } => {
            assert_eq!(name, "Checkout Button");
            assert_eq!(attempts, 2);
            let artifact = artifact.expect("failure screenshot");
            assert!(artifact.starts_with(tmp.path().join("shots")));
            assert!(artifact.exists());
        }
        other => panic!("unexpected error: {other}"),
    }
    factory.close_all().await.unwrap();
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_with_session_closes_driver() {
    let tmp = TempDir::new().unwrap();
    let (launcher, factory) = setup(&tmp);

    let title = factory
        .with_session(|session| async move {
            let page = BasePage::new(&session, "HomePage", HOME);
            page.navigate(None).await?;
            page.title().await
        })
        .await
        .unwrap();

    assert_eq!(title, "Shop home");
    assert_eq!(factory.active_count(), 0);
    let drivers = launcher.launched();
    assert_eq!(drivers.len(), 1);
    assert!(drivers[0].is_closed());
    assert!(drivers[0].was_called(&format!("wait_for_load_state:{}", LoadState::Load)));
}

#[tokio::test]
async fn test_parallel_sessions_are_isolated() {
    let tmp = TempDir::new().unwrap();
    let (launcher, factory) = setup(&tmp);

    let sessions = factory.create_parallel(3).await.unwrap();
    assert_eq!(sessions.len(), 3);
    assert_eq!(factory.active_count(), 3);

    BasePage::new(&sessions[0], "HomePage", HOME)
        .navigate(None)
        .await
        .unwrap();
    let navigated = launcher
        .launched()
        .iter()
        .filter(|d| d.was_called("goto:"))
        .count();
    assert_eq!(navigated, 1);

    assert_eq!(factory.close_all().await.unwrap(), 3);
    assert!(launcher.launched().iter().all(|d| d.is_closed()));
}
