// ABOUTME: Declarative extraction rule data models and the registry keyed by record kind.
// ABOUTME: Defines container, section, per-field selectors and result caps for each record family.

//! Extraction rule definitions.
//!
//! Every record kind the site exposes is described by a [`RecordRules`]
//! value: where its records live in the page (an optional section filter and
//! an optional container selector), how each named field is located inside a
//! record, and an optional hard cap on the number of records. The rules are
//! data, so the extractor itself stays identical across record kinds.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Specifies how to select a value from the DOM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SelectorSpec {
    /// A CSS selector whose text is extracted, e.g. "span.movie-title a".
    /// An empty string addresses the record container itself.
    Css(String),
    /// A CSS selector with attribute extraction, e.g. ["img", "src"]
    CssAttr(Vec<String>),
}

impl Default for SelectorSpec {
    fn default() -> Self {
        SelectorSpec::Css(String::new())
    }
}

/// Configuration for extracting a single named field from a record.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FieldExtractor {
    /// List of selectors to try in order
    #[serde(default)]
    pub selectors: Vec<SelectorSpec>,
    /// Whether multiple matches are kept
    #[serde(default)]
    pub allow_multiple: bool,
}

/// Restricts containers to page sections carrying a given heading.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SectionRule {
    /// Selector for the section element, e.g. "div.film-content"
    pub container: String,
    /// Selector for the heading inside the section
    pub heading: String,
    /// Heading text the section must carry (compared after trimming)
    pub title: String,
}

/// Record families the extractor knows how to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Ongoing-drama category listing
    Ongoing,
    /// Full drama/movie list page
    MovieList,
    /// Search results page
    Search,
    /// Release schedule built from the ongoing listing
    Schedule,
    /// Home page "Drama Populer" section
    TopRanked,
    /// Home page "Ongoing Drama" section
    NewEpisode,
    /// Home page "Film Korea" section
    HomeMovie,
    /// Recommendation widget on a detail page
    Recommendation,
    /// Detail page header block
    Detail,
    /// Episode list on a detail page
    DetailEpisode,
    /// Episode playback page header block
    EpisodePage,
    /// Sibling episode links on a playback page
    SiblingEpisode,
}

impl RecordKind {
    /// All kinds, in declaration order.
    pub const ALL: [RecordKind; 12] = [
        RecordKind::Ongoing,
        RecordKind::MovieList,
        RecordKind::Search,
        RecordKind::Schedule,
        RecordKind::TopRanked,
        RecordKind::NewEpisode,
        RecordKind::HomeMovie,
        RecordKind::Recommendation,
        RecordKind::Detail,
        RecordKind::DetailEpisode,
        RecordKind::EpisodePage,
        RecordKind::SiblingEpisode,
    ];

    /// The snake_case name used in the rule data.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Ongoing => "ongoing",
            RecordKind::MovieList => "movie_list",
            RecordKind::Search => "search",
            RecordKind::Schedule => "schedule",
            RecordKind::TopRanked => "top_ranked",
            RecordKind::NewEpisode => "new_episode",
            RecordKind::HomeMovie => "home_movie",
            RecordKind::Recommendation => "recommendation",
            RecordKind::Detail => "detail",
            RecordKind::DetailEpisode => "detail_episode",
            RecordKind::EpisodePage => "episode_page",
            RecordKind::SiblingEpisode => "sibling_episode",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The complete rule set for one record kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRules {
    pub kind: RecordKind,
    /// Only containers inside a matching section are considered
    #[serde(default)]
    pub section: Option<SectionRule>,
    /// Selector for one record; absent means the whole document is one record
    #[serde(default)]
    pub container: Option<String>,
    /// Named field locators
    #[serde(default)]
    pub fields: HashMap<String, FieldExtractor>,
    /// Hard cap applied in document order
    #[serde(default)]
    pub limit: Option<usize>,
}

impl RecordRules {
    /// Every CSS selector string this rule set references.
    pub fn selector_strings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(section) = &self.section {
            out.push(section.container.clone());
            out.push(section.heading.clone());
        }
        if let Some(container) = &self.container {
            out.push(container.clone());
        }
        for fe in self.fields.values() {
            for spec in &fe.selectors {
                let (css, _) = parse_selector(spec);
                if !css.is_empty() {
                    out.push(css);
                }
            }
        }
        out
    }
}

/// Registry for looking up rule sets by record kind.
#[derive(Debug, Default, Clone)]
pub struct RuleRegistry {
    map: HashMap<RecordKind, RecordRules>,
}

impl RuleRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule set, replacing any previous one for the same kind.
    pub fn register(&mut self, rules: RecordRules) {
        self.map.insert(rules.kind, rules);
    }

    /// Looks up the rules for a kind.
    pub fn get(&self, kind: RecordKind) -> Option<&RecordRules> {
        self.map.get(&kind)
    }

    /// Returns the number of registered kinds.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over all registered rule sets.
    pub fn iter(&self) -> impl Iterator<Item = &RecordRules> {
        self.map.values()
    }
}

/// Parses a selector spec into a CSS selector string and optional attribute name.
///
/// Returns (css_selector, optional_attribute).
pub fn parse_selector(selector: &SelectorSpec) -> (String, Option<String>) {
    match selector {
        SelectorSpec::Css(css) => (css.clone(), None),
        SelectorSpec::CssAttr(parts) => {
            if parts.len() >= 2 {
                (parts[0].clone(), Some(parts[1].clone()))
            } else if parts.len() == 1 {
                (parts[0].clone(), None)
            } else {
                (String::new(), None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_deserialize_from_json() {
        let json = r#"{
            "kind": "top_ranked",
            "section": {
                "container": "div.film-content",
                "heading": "h2.title span",
                "title": "Drama Populer"
            },
            "container": "article.movie-preview",
            "fields": {
                "title": { "selectors": [".movie-title a"] },
                "url": { "selectors": [["a", "href"]] },
                "genres": { "selectors": [".genre a"], "allow_multiple": true }
            },
            "limit": 10
        }"#;

        let rules: RecordRules = serde_json::from_str(json).expect("deserialize");
        assert_eq!(rules.kind, RecordKind::TopRanked);
        assert_eq!(rules.limit, Some(10));
        assert_eq!(rules.section.as_ref().unwrap().title, "Drama Populer");
        assert_eq!(
            rules.fields["url"].selectors[0],
            SelectorSpec::CssAttr(vec!["a".to_string(), "href".to_string()])
        );
        assert!(rules.fields["genres"].allow_multiple);
        assert!(!rules.fields["title"].allow_multiple);
    }

    #[test]
    fn test_document_level_rules_have_no_container() {
        let json = r#"{ "kind": "detail", "fields": {} }"#;
        let rules: RecordRules = serde_json::from_str(json).expect("deserialize");
        assert!(rules.container.is_none());
        assert!(rules.section.is_none());
        assert!(rules.limit.is_none());
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = RuleRegistry::new();
        assert!(registry.is_empty());

        registry.register(RecordRules {
            kind: RecordKind::Ongoing,
            section: None,
            container: Some("article".to_string()),
            fields: HashMap::new(),
            limit: None,
        });

        assert_eq!(registry.len(), 1);
        assert!(registry.get(RecordKind::Ongoing).is_some());
        assert!(registry.get(RecordKind::Search).is_none());
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let mut registry = RuleRegistry::new();
        for container in ["article", "li"] {
            registry.register(RecordRules {
                kind: RecordKind::Search,
                section: None,
                container: Some(container.to_string()),
                fields: HashMap::new(),
                limit: None,
            });
        }
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(RecordKind::Search).unwrap().container.as_deref(),
            Some("li")
        );
    }

    #[test]
    fn test_kind_names_match_serde() {
        for kind in RecordKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_selector_strings_skip_self_selector() {
        let mut fields = HashMap::new();
        fields.insert(
            "url".to_string(),
            FieldExtractor {
                selectors: vec![SelectorSpec::CssAttr(vec![
                    String::new(),
                    "href".to_string(),
                ])],
                allow_multiple: false,
            },
        );
        let rules = RecordRules {
            kind: RecordKind::SiblingEpisode,
            section: None,
            container: Some("a.post-page-numbers".to_string()),
            fields,
            limit: None,
        };
        assert_eq!(rules.selector_strings(), vec!["a.post-page-numbers"]);
    }

    #[test]
    fn test_parse_selector_css_attr() {
        let selector = SelectorSpec::CssAttr(vec!["img.hero".to_string(), "src".to_string()]);
        let (css, attr) = parse_selector(&selector);
        assert_eq!(css, "img.hero");
        assert_eq!(attr, Some("src".to_string()));
    }

    #[test]
    fn test_parse_selector_css_attr_single() {
        let selector = SelectorSpec::CssAttr(vec!["img".to_string()]);
        let (css, attr) = parse_selector(&selector);
        assert_eq!(css, "img");
        assert!(attr.is_none());
    }

    #[test]
    fn test_parse_selector_css_attr_empty() {
        let selector = SelectorSpec::CssAttr(vec![]);
        let (css, attr) = parse_selector(&selector);
        assert_eq!(css, "");
        assert!(attr.is_none());
    }

    #[test]
    fn test_selector_spec_default() {
        let s: SelectorSpec = Default::default();
        assert!(matches!(s, SelectorSpec::Css(ref css) if css.is_empty()));
    }
}
