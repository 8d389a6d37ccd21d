// ABOUTME: Builds the weekly release schedule from the ongoing listing page.
// ABOUTME: Each title lands on a weekday derived from its cleaned title, so per-day lookups agree with the full map.

use scraper::Html;
use url::Url;

use crate::extractors::rules::{RecordKind, RuleRegistry};
use crate::model::{ListingEntry, ScheduleMap, Weekday};
use crate::normalize::{placeholder_genres, NO_SCORE, SCHEDULE_GENRES, SCHEDULE_TYPE, UNKNOWN};
use crate::records::{base_entry, raw_records};

/// Every ongoing title placed on its release day.
pub fn schedule(rules: &RuleRegistry, html: &str, page: &Url) -> ScheduleMap {
    let doc = Html::parse_document(html);
    let mut map = ScheduleMap::new();
    for raw in raw_records(rules, RecordKind::Schedule, &doc) {
        let mut entry = base_entry(RecordKind::Schedule, &raw, page);
        entry.kind_label = Some(SCHEDULE_TYPE.to_string());
        entry.score = Some(NO_SCORE.to_string());
        entry.genres = Some(placeholder_genres(&SCHEDULE_GENRES));
        entry.release_time = Some(UNKNOWN.to_string());
        map.push(Weekday::for_title(&entry.title), entry);
    }
    map
}

/// The titles released on one day.
pub fn schedule_for_day(
    rules: &RuleRegistry,
    html: &str,
    page: &Url,
    day: Weekday,
) -> Vec<ListingEntry> {
    schedule(rules, html, page).into_day(day)
}
