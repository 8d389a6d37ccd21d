// ABOUTME: Selector-based record extraction that applies a RecordRules set to a parsed document.
// ABOUTME: Supports section filters, containers, text or attribute fields, allow_multiple, and result caps.

//! Selector-based record extraction.
//!
//! Key behaviors:
//! - Containers are visited in document order; `limit` truncates after that.
//! - For each field, selectors are tried in order; the first selector yielding
//!   a non-empty value wins.
//! - Text extraction joins inner text with spaces and normalizes whitespace.
//! - Attribute extraction returns the attribute value trimmed.
//! - `allow_multiple`: when true, returns all matches from the winning
//!   selector; when false, returns only the first match.
//! - Nothing here fails: absent nodes and invalid selectors yield no value.

use std::collections::HashMap;

use scraper::{ElementRef, Html};

use crate::extractors::compiled::get_or_compile;
use crate::extractors::rules::{parse_selector, FieldExtractor, RecordRules, SectionRule, SelectorSpec};

/// One candidate record: named fields, each holding zero or more values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: HashMap<String, Vec<String>>,
}

impl RawRecord {
    /// Values extracted for a field, if any selector matched.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// The first value of a field, or an empty string when absent.
    pub fn text(&self, name: &str) -> String {
        self.get(name)
            .and_then(|values| values.first())
            .cloned()
            .unwrap_or_default()
    }

    /// All values of a field, or an empty list when absent.
    pub fn list(&self, name: &str) -> Vec<String> {
        self.get(name).map(<[String]>::to_vec).unwrap_or_default()
    }

    /// Returns true if no field produced a value.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Normalizes whitespace in a string by collapsing runs of whitespace into single spaces.
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Applies a rule set to a document, returning records in document order.
pub fn extract_records(doc: &Html, rules: &RecordRules) -> Vec<RawRecord> {
    let limit = rules.limit.unwrap_or(usize::MAX);
    locate_containers(doc, rules)
        .into_iter()
        .take(limit)
        .map(|container| extract_record(container, rules))
        .collect()
}

/// Extracts every field of a rule set from one container element.
pub fn extract_record(container: ElementRef<'_>, rules: &RecordRules) -> RawRecord {
    let mut fields = HashMap::new();
    for (name, fe) in &rules.fields {
        if let Some(values) = extract_field_text(container, fe) {
            fields.insert(name.clone(), values);
        }
    }
    RawRecord { fields }
}

fn locate_containers<'a>(doc: &'a Html, rules: &RecordRules) -> Vec<ElementRef<'a>> {
    let scopes = match &rules.section {
        Some(section) => matching_sections(doc, section),
        None => vec![doc.root_element()],
    };

    let Some(container) = &rules.container else {
        return scopes;
    };
    let Some(selector) = get_or_compile(container) else {
        return Vec::new();
    };

    scopes
        .into_iter()
        .flat_map(|scope| scope.select(&selector).collect::<Vec<_>>())
        .collect()
}

fn matching_sections<'a>(doc: &'a Html, section: &SectionRule) -> Vec<ElementRef<'a>> {
    let Some(container) = get_or_compile(&section.container) else {
        return Vec::new();
    };
    let heading = SelectorSpec::Css(section.heading.clone());
    let wanted = section.title.trim();

    doc.select(&container)
        .filter(|el| {
            extract_from_spec(*el, &heading)
                .first()
                .is_some_and(|text| text == wanted)
        })
        .collect()
}

/// Extracts text or attribute values from an element based on a `FieldExtractor`.
///
/// Returns values from the first selector that yields at least one non-empty
/// match. If no selector yields matches, returns `None`.
pub fn extract_field_text(scope: ElementRef<'_>, fe: &FieldExtractor) -> Option<Vec<String>> {
    for spec in &fe.selectors {
        let mut results = extract_from_spec(scope, spec);
        if !results.is_empty() {
            if !fe.allow_multiple {
                results.truncate(1);
            }
            return Some(results);
        }
    }
    None
}

/// Extracts values from a single selector spec.
fn extract_from_spec(scope: ElementRef<'_>, spec: &SelectorSpec) -> Vec<String> {
    let (css, attr) = parse_selector(spec);

    let nodes: Vec<ElementRef<'_>> = if css.is_empty() {
        vec![scope]
    } else {
        match get_or_compile(&css) {
            Some(selector) => scope.select(&selector).collect(),
            None => return Vec::new(),
        }
    };

    match attr {
        Some(attr) => nodes
            .iter()
            .filter_map(|el| el.value().attr(&attr))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
        None => nodes
            .iter()
            .map(|el| normalize_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
            .filter(|v| !v.is_empty())
            .collect(),
    }
}
