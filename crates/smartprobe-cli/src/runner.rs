//! Command handlers shared by the binary and its tests

use crate::commands::{ProbeArgs, RunArgs};
use crate::error::{CliError, CliResult};
use smartprobe::{
    BasePage, DataLoader, Launcher, LocatorStrategy, NamedLocator, ResolutionResult, SessionFactory,
    Settings, StrategyKind,
};
use smartprobe_shop::{load_scenarios, FlowReport, ShoppingFlow, ShoppingScenario, SCENARIO_FILE};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Settings from `path`, else defaults with `SMARTPROBE_*` overrides;
/// validated either way
pub fn load_settings(path: Option<&Path>) -> CliResult<Settings> {
    let settings = match path {
        Some(path) => Settings::load(path)?,
        None => Settings::from_env()?,
    };
    settings.validate()?;
    Ok(settings)
}

/// Named locator from the probe flags
pub fn probe_locator(args: &ProbeArgs, default_timeout_ms: u64) -> CliResult<NamedLocator> {
    let groups = [
        (StrategyKind::StructuralPath, &args.xpath),
        (StrategyKind::StyleSelector, &args.css),
        (StrategyKind::VisibleText, &args.text),
        (StrategyKind::SemanticRole, &args.role),
        (StrategyKind::TestIdentifier, &args.test_id),
    ];
    let mut locator = NamedLocator::new(args.name.clone())
        .with_timeout(args.timeout.unwrap_or(default_timeout_ms));
    for (kind, values) in groups {
        for value in values {
            let description = format!("--{kind} flag");
            locator = locator.add_strategy(LocatorStrategy::new(kind, value.clone(), description));
        }
    }
    if locator.strategies().is_empty() {
        return Err(CliError::invalid_argument(
            "probe needs at least one of --xpath, --css, --text, --role, --test-id",
        ));
    }
    Ok(locator)
}

/// Launcher for live commands
#[cfg(feature = "browser")]
pub fn live_launcher(_command: &str) -> CliResult<Arc<dyn Launcher>> {
    Ok(Arc::new(smartprobe::ChromiumLauncher))
}

/// Launcher for live commands
#[cfg(not(feature = "browser"))]
pub fn live_launcher(command: &str) -> CliResult<Arc<dyn Launcher>> {
    Err(CliError::browser_unavailable(command))
}

/// Open `args.url` in a fresh session and resolve the probe locator
pub async fn probe(factory: &SessionFactory, args: &ProbeArgs) -> CliResult<ResolutionResult> {
    let locator = probe_locator(args, factory.settings().locator.locator_timeout_ms)?;
    info!(locator = %locator, url = %args.url, "Probing");
    let visible = args.visible;
    let url = args.url.clone();
    let result = factory
        .with_session(move |session| async move {
            let page = BasePage::new(&session, "Probe", url);
            page.navigate(None).await?;
            Ok(page.resolve_locator(&locator, visible).await)
        })
        .await?;
    Ok(result)
}

/// Scenario `args.scenario` (1-based) from the data file
pub fn scenario(settings: &Settings, args: &RunArgs) -> CliResult<ShoppingScenario> {
    let (dir, file) = match &args.data {
        Some(path) => {
            let file = path
                .file_name()
                .and_then(|f| f.to_str())
                .ok_or_else(|| {
                    CliError::invalid_argument(format!("not a file: {}", path.display()))
                })?;
            let dir = path.parent().map_or_else(|| Path::new(".").to_path_buf(), Path::to_path_buf);
            (dir, file.to_string())
        }
        None => (settings.paths.data_dir.clone(), SCENARIO_FILE.to_string()),
    };
    let scenarios = load_scenarios(&DataLoader::new(dir), &file)?;
    let count = scenarios.len();
    args.scenario
        .checked_sub(1)
        .and_then(|i| scenarios.into_iter().nth(i))
        .ok_or_else(|| {
            CliError::invalid_argument(format!(
                "scenario {} out of range (file has {count})",
                args.scenario
            ))
        })
}

/// Run the shopping flow in a fresh session
pub async fn run_flow(
    factory: &SessionFactory,
    scenario: ShoppingScenario,
) -> CliResult<FlowReport> {
    let report = factory
        .with_session(move |session| async move {
            Ok(ShoppingFlow::new(session).run(&scenario).await)
        })
        .await?;
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use smartprobe::{MockElement, MockLauncher, MockPage};

    fn args(url: &str) -> ProbeArgs {
        ProbeArgs {
            url: url.to_string(),
            name: "Cart Icon".to_string(),
            ..ProbeArgs::default()
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_kinds_in_fixed_order() {
            let mut a = args("https://www.ebay.com");
            a.css = vec!["a.cart".to_string()];
            a.xpath = vec!["//a[1]".to_string(), "//a[2]".to_string()];
            a.role = vec!["link[name=Cart]".to_string()];
            let locator = probe_locator(&a, 5_000).unwrap();
            let kinds: Vec<StrategyKind> = locator.strategies().iter().map(|s| s.kind()).collect();
            assert_eq!(
                kinds,
                vec![
                    StrategyKind::StructuralPath,
                    StrategyKind::StructuralPath,
                    StrategyKind::StyleSelector,
                    StrategyKind::SemanticRole
                ]
            );
            assert_eq!(locator.strategies()[1].value(), "//a[2]");
            assert_eq!(locator.timeout_ms(), 5_000);
        }

        #[test]
        fn test_timeout_flag_wins() {
            let mut a = args("u");
            a.text = vec!["Cart".to_string()];
            a.timeout = Some(750);
            assert_eq!(probe_locator(&a, 5_000).unwrap().timeout_ms(), 750);
        }

        #[test]
        fn test_no_strategies_rejected() {
            let err = probe_locator(&args("u"), 5_000).unwrap_err();
            assert!(matches!(err, CliError::InvalidArgument { .. }));
        }
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn test_load_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settings.yaml");
            std::fs::write(&path, "base_url: https://shop.test\n").unwrap();
            let settings = load_settings(Some(&path)).unwrap();
            assert_eq!(settings.base_url, "https://shop.test");
        }

        #[test]
        fn test_invalid_file_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settings.yaml");
            std::fs::write(&path, "locator:\n  max_locator_retries: 0\n").unwrap();
            assert!(matches!(load_settings(Some(&path)), Err(CliError::Probe(_))));
        }

        #[cfg(not(feature = "browser"))]
        #[test]
        fn test_live_launcher_needs_feature() {
            let err = live_launcher("run").err().unwrap();
            assert!(err.to_string().contains("--features browser"));
        }
    }

    mod scenario_tests {
        use super::*;

        fn data_file() -> (tempfile::TempDir, std::path::PathBuf) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("runs.yaml");
            std::fs::write(
                &path,
                "test_data:\n  - search_query: shoes\n    max_price: 220.0\n    limit: 5\n  - search_query: laptop\n    max_price: 500.0\n    limit: 3\n",
            )
            .unwrap();
            (dir, path)
        }

        #[test]
        fn test_picks_one_based_scenario() {
            let (_dir, path) = data_file();
            let run = RunArgs {
                scenario: 2,
                data: Some(path),
                json: false,
            };
            let scenario = scenario(&Settings::default(), &run).unwrap();
            assert_eq!(scenario.search_query, "laptop");
            assert_eq!(scenario.limit, 3);
        }

        #[test]
        fn test_out_of_range_scenario() {
            let (_dir, path) = data_file();
            for index in [0, 3] {
                let run = RunArgs {
                    scenario: index,
                    data: Some(path.clone()),
                    json: false,
                };
                let err = scenario(&Settings::default(), &run).unwrap_err();
                assert!(err.to_string().contains("out of range"), "{err}");
            }
        }
    }

    mod probe_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_probe_reports_fallback_trace() {
            let launcher = Arc::new(MockLauncher::new().with_setup(|driver| {
                driver.register_page(
                    MockPage::new("https://shop.test")
                        .with_element("css=a.gh-cart", MockElement::visible()),
                );
            }));
            let factory = SessionFactory::new(launcher.clone(), Settings::default());
            let mut a = args("https://shop.test");
            a.xpath = vec!["//a[@id='gone']".to_string()];
            a.css = vec!["a.gh-cart".to_string()];
            a.timeout = Some(200);

            let result = probe(&factory, &a).await.unwrap();

            assert!(result.succeeded);
            assert_eq!(result.attempt_count, 2);
            let json = crate::output::render_trace(&result).unwrap();
            assert!(json.contains("\"locator_name\": \"Cart Icon\""));
            assert!(launcher.launched()[0].is_closed());
            assert_eq!(factory.active_count(), 0);
        }
    }
}
