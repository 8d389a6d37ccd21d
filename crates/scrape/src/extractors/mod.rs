// ABOUTME: Declarative field extraction for the site's page layouts.
// ABOUTME: Rule data, the embedded rule table, a selector cache and the record extractor.

//! Field extraction module.
//!
//! Submodules:
//! - `rules`: rule data models and the registry keyed by record kind.
//! - `loader`: the embedded rule table.
//! - `compiled`: process-wide compiled selector cache.
//! - `select`: applies a rule set to a parsed document.

pub mod compiled;
pub mod loader;
pub mod rules;
pub mod select;
