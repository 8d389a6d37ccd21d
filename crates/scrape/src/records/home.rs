// ABOUTME: Builds the home page aggregate from the main page and the ongoing listing.
// ABOUTME: Section filters pick the top-ranked, new-episode and movie lists out of the main page.

use scraper::Html;
use url::Url;

use crate::extractors::rules::{RecordKind, RuleRegistry};
use crate::model::HomePage;
use crate::normalize::{
    placeholder_genres, LISTING_GENRES, NO_SCORE, TOP_RANKED_GENRES, UNKNOWN,
};
use crate::records::schedule::schedule;
use crate::records::{base_entry, raw_records};

/// Home aggregate. The schedule comes from the ongoing listing page.
pub fn home(
    rules: &RuleRegistry,
    main_html: &str,
    main_page: &Url,
    ongoing_html: &str,
    ongoing_page: &Url,
) -> HomePage {
    let mut page = HomePage::default();
    {
        let doc = Html::parse_document(main_html);

        page.top_ranked = raw_records(rules, RecordKind::TopRanked, &doc)
            .iter()
            .map(|raw| {
                let mut entry = base_entry(RecordKind::TopRanked, raw, main_page);
                let rating = raw.text("rating");
                entry.rating = Some(if rating.is_empty() {
                    NO_SCORE.to_string()
                } else {
                    rating
                });
                entry.genres = Some(placeholder_genres(&TOP_RANKED_GENRES));
                entry
            })
            .collect();

        page.new_episodes = raw_records(rules, RecordKind::NewEpisode, &doc)
            .iter()
            .map(|raw| {
                let mut entry = base_entry(RecordKind::NewEpisode, raw, main_page);
                entry.episode = Some(raw.text("episode"));
                entry.release = Some(UNKNOWN.to_string());
                entry
            })
            .collect();

        page.movies = raw_records(rules, RecordKind::HomeMovie, &doc)
            .iter()
            .map(|raw| {
                let mut entry = base_entry(RecordKind::HomeMovie, raw, main_page);
                entry.date = Some(UNKNOWN.to_string());
                entry.genres = Some(placeholder_genres(&LISTING_GENRES));
                entry
            })
            .collect();
    }

    page.schedule = schedule(rules, ongoing_html, ongoing_page);
    page
}
