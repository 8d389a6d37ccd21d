// ABOUTME: Pre-compiled CSS selector cache shared by every extraction call.
// ABOUTME: Eliminates repeated parsing of the fixed rule selectors in hot paths.

//! Selector caching for efficient repeated DOM queries.
//!
//! The rule table references a few dozen selectors that are reused on every
//! request. This module compiles each string once and hands out clones of the
//! compiled [`Selector`]. Invalid selectors are cached as `None` so they are
//! reported once and then behave like a selector that never matches.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use scraper::Selector;

/// Thread-safe cache of compiled CSS selectors.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `Some(Selector)` if the selector is valid, `None` if invalid.
pub fn get_or_compile(css: &str) -> Option<Selector> {
    {
        let cache = SELECTOR_CACHE.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = compile(css);
    let mut cache = SELECTOR_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    // Another thread may have inserted while we compiled
    if let Some(cached) = cache.get(css) {
        return cached.clone();
    }
    cache.insert(css.to_string(), compiled.clone());
    compiled
}

/// Precompiles a batch of selectors into the cache.
///
/// Called once when a client is built so that extraction never takes the
/// write lock on the request path.
pub fn precompile_selectors<I, S>(selectors: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cache = SELECTOR_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    for css in selectors {
        let css = css.as_ref();
        if !cache.contains_key(css) {
            cache.insert(css.to_string(), compile(css));
        }
    }
}

fn compile(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(err) => {
            tracing::warn!(selector = css, error = %err, "invalid selector in extraction rules");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_selector_is_cached() {
        let matcher = get_or_compile("article.movie-preview");
        assert!(matcher.is_some());

        let matcher2 = get_or_compile("article.movie-preview");
        assert!(matcher2.is_some());
    }

    #[test]
    fn test_invalid_selector_returns_none() {
        let matcher = get_or_compile("[[[invalid");
        assert!(matcher.is_none());

        // Invalid selectors are also cached (as None)
        let matcher2 = get_or_compile("[[[invalid");
        assert!(matcher2.is_none());
    }

    #[test]
    fn test_precompile_selectors() {
        let selectors = vec!["span.icon-hd", "img.keremiya-image", "a[href*='/2/']"];
        precompile_selectors(selectors);

        assert!(get_or_compile("span.icon-hd").is_some());
        assert!(get_or_compile("img.keremiya-image").is_some());
        assert!(get_or_compile("a[href*='/2/']").is_some());
    }
}
