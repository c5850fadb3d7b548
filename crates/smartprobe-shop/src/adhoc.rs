//! Single-strategy handles for row scans and quick checks where a full
//! named-locator resolution (with its waits) would be too slow

use smartprobe::locator::to_query;
use smartprobe::{BasePage, Element, LocatorStrategy, ProbeResult, StrategyKind};

/// Candidate strategy as `(kind, value)`
pub(crate) type Candidate = (StrategyKind, &'static str);

fn strategy((kind, value): Candidate) -> LocatorStrategy {
    LocatorStrategy::new(kind, value, "")
}

/// Page-level handle for one strategy
pub(crate) fn element(base: &BasePage, candidate: Candidate) -> ProbeResult<Element> {
    Ok(Element::new(base.driver().clone(), to_query(&strategy(candidate))?))
}

/// Handle for one strategy rooted at `scope`
pub(crate) fn scoped(scope: &Element, candidate: Candidate) -> ProbeResult<Element> {
    scope.locator(&strategy(candidate))
}

/// First candidate whose first match is visible now, without waiting
pub(crate) async fn first_visible(
    base: &BasePage,
    scope: Option<&Element>,
    candidates: &[Candidate],
) -> Option<Element> {
    for &candidate in candidates {
        let handle = match scope {
            Some(scope) => scoped(scope, candidate),
            None => element(base, candidate),
        };
        let Ok(handle) = handle else { continue };
        let first = handle.first();
        if first.is_visible().await.unwrap_or(false) {
            return Some(first);
        }
    }
    None
}
