// ABOUTME: Loader for the embedded extraction rule table.
// ABOUTME: Provides load_builtin_rules() to initialize the default RuleRegistry.

//! Rule registry loader.
//!
//! The site's page layouts are described by a JSON rule table compiled into
//! the binary. This module parses it into a [`RuleRegistry`] keyed by
//! [`RecordKind`](crate::extractors::rules::RecordKind).

use crate::extractors::rules::{RecordRules, RuleRegistry};

/// Embedded JSON containing one rule set per record kind.
const BUILTIN_RULES_JSON: &str = include_str!("../../data/rules.json");

/// Loads the builtin rule registry from embedded JSON.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed or cannot be deserialized.
pub fn load_builtin_rules() -> RuleRegistry {
    let rules: Vec<RecordRules> =
        serde_json::from_str(BUILTIN_RULES_JSON).expect("failed to parse builtin rules");

    let mut registry = RuleRegistry::new();
    for set in rules {
        registry.register(set);
    }
    registry
}
