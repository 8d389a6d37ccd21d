// ABOUTME: Builds a title's detail record: header block, episode list, recommendations and rating.
// ABOUTME: The details sub-object is mostly fixed defaults since the site does not publish those facts.

use scraper::Html;
use url::Url;

use crate::extractors::rules::{RecordKind, RuleRegistry};
use crate::model::{DetailRecord, Details, EpisodeItem, Rating};
use crate::normalize::{
    absolutize, clean_title, episode_slug, slug_from_url, DETAIL_VIEWERS, NO_SCORE, UNKNOWN,
};
use crate::records::{base_entry, page_record, raw_records};

/// Detail record of the title page at `page`.
pub fn detail(rules: &RuleRegistry, html: &str, page: &Url) -> DetailRecord {
    let doc = Html::parse_document(html);
    let header = page_record(rules, RecordKind::Detail, &doc);

    let url = page.to_string();
    let slug = slug_from_url(&url);
    let title = clean_title(&header.text("title"));
    let genres = header.list("genres");
    let status = title_status(&genres);
    let score = header.text("score");
    let users = header.text("users");

    let episodes: Vec<EpisodeItem> = raw_records(rules, RecordKind::DetailEpisode, &doc)
        .iter()
        .filter_map(|raw| {
            let number = raw.text("number");
            if number.is_empty() {
                return None;
            }
            // The current episode is rendered as a plain span without a link.
            let href = raw.text("url");
            let url = if href.is_empty() {
                page.to_string()
            } else {
                absolutize(page, &href)
            };
            Some(EpisodeItem {
                title: format!("Episode {}", number),
                url,
                episode_slug: episode_slug(&slug, &number),
                release_date: UNKNOWN.to_string(),
                episode: number,
            })
        })
        .collect();

    let recommendations = raw_records(rules, RecordKind::Recommendation, &doc)
        .iter()
        .map(|raw| {
            let mut entry = base_entry(RecordKind::Recommendation, raw, page);
            entry.rating = Some(NO_SCORE.to_string());
            entry.episode = Some(UNKNOWN.to_string());
            entry
        })
        .collect();

    let kind_label = "Series".to_string();
    let details = Details {
        japanese: title.clone(),
        english: title.clone(),
        status: status.clone(),
        kind_label: kind_label.clone(),
        source: "Original".to_string(),
        duration: "~60 min per episode".to_string(),
        total_episodes: episodes.len().to_string(),
        season: UNKNOWN.to_string(),
        studio: "Unknown Studio".to_string(),
        producers: "Unknown Producer".to_string(),
        released: UNKNOWN.to_string(),
    };

    DetailRecord {
        cover: absolutize(page, &header.text("cover")),
        synopsis: header.text("synopsis"),
        rating: Rating {
            score: score.clone(),
            users: if users.is_empty() {
                String::new()
            } else {
                format!("{} users", users)
            },
        },
        title,
        url,
        slug,
        genres,
        status,
        kind_label,
        score,
        viewers: DETAIL_VIEWERS.to_string(),
        episodes,
        recommendations,
        details,
    }
}

/// "Completed" when the site tags the title as complete, "Ongoing" otherwise.
/// Without any category tags the status is unknown and left empty.
fn title_status(genres: &[String]) -> String {
    if genres.is_empty() {
        String::new()
    } else if genres.iter().any(|g| g.eq_ignore_ascii_case("complete")) {
        "Completed".to_string()
    } else {
        "Ongoing".to_string()
    }
}
