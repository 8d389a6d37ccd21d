// ABOUTME: Builders for the ongoing listing, the drama list and search result pages.
// ABOUTME: Fills family-specific attributes and the fixed placeholders the site never exposes.

use scraper::Html;
use url::Url;

use crate::extractors::rules::{RecordKind, RuleRegistry};
use crate::model::ListingEntry;
use crate::normalize::{
    digits_only, placeholder_genres, DEFAULT_UPLOADER, LISTING_GENRES, MOVIE_LIST_GENRES,
    NO_SCORE, SEARCH_VIEWERS, UNKNOWN,
};
use crate::records::{base_entry, raw_records};

/// Entries of the ongoing-drama category page.
pub fn ongoing(rules: &RuleRegistry, html: &str, page: &Url) -> Vec<ListingEntry> {
    let doc = Html::parse_document(html);
    raw_records(rules, RecordKind::Ongoing, &doc)
        .iter()
        .map(|raw| {
            let mut entry = base_entry(RecordKind::Ongoing, raw, page);
            entry.episode = Some(raw.text("episode"));
            entry.uploader = Some(DEFAULT_UPLOADER.to_string());
            entry.release = Some(UNKNOWN.to_string());
            entry
        })
        .collect()
}

/// Entries of the drama list page.
pub fn movie_list(rules: &RuleRegistry, html: &str, page: &Url) -> Vec<ListingEntry> {
    let doc = Html::parse_document(html);
    raw_records(rules, RecordKind::MovieList, &doc)
        .iter()
        .map(|raw| {
            let mut entry = base_entry(RecordKind::MovieList, raw, page);
            entry.status = Some("Completed".to_string());
            entry.score = Some(NO_SCORE.to_string());
            entry.synopsis = Some(raw.text("synopsis"));
            entry.views = Some(digits_only(&raw.text("views")));
            entry.genres = Some(placeholder_genres(&MOVIE_LIST_GENRES));
            entry.date = Some(raw.text("date"));
            entry
        })
        .collect()
}

/// Entries of a search result page.
///
/// Series pages live under `/nonton-...` paths; an episode badge marks a
/// title that is still airing.
pub fn search(rules: &RuleRegistry, html: &str, page: &Url) -> Vec<ListingEntry> {
    let doc = Html::parse_document(html);
    raw_records(rules, RecordKind::Search, &doc)
        .iter()
        .map(|raw| {
            let mut entry = base_entry(RecordKind::Search, raw, page);
            let label = if entry.url.contains("/nonton-") {
                "Series"
            } else {
                "Movie"
            };
            let status = if raw.text("episode").is_empty() {
                "Completed"
            } else {
                "Ongoing"
            };
            entry.kind_label = Some(label.to_string());
            entry.status = Some(status.to_string());
            entry.score = Some(NO_SCORE.to_string());
            entry.viewers = Some(SEARCH_VIEWERS.to_string());
            entry.synopsis = Some(raw.text("synopsis"));
            entry.genres = Some(placeholder_genres(&LISTING_GENRES));
            entry
        })
        .collect()
}
