// ABOUTME: Record builders turning raw extracted fields into typed, normalized records per page family.
// ABOUTME: Each builder takes page HTML and its URL, so every operation can also run offline.

//! Record builders.
//!
//! Builders are synchronous: they parse the HTML, extract raw records with the
//! rule registry, normalize them and drop the parsed document before
//! returning. Nothing here performs I/O.

pub mod detail;
pub mod episode;
pub mod home;
pub mod listing;
pub mod schedule;

use scraper::Html;
use url::Url;

use crate::extractors::rules::{RecordKind, RuleRegistry};
use crate::extractors::select::{extract_records, RawRecord};
use crate::model::ListingEntry;
use crate::normalize::{absolutize, clean_title, slug_from_url};

/// Extracts the raw records of one kind; a kind without rules yields nothing.
pub(crate) fn raw_records(rules: &RuleRegistry, kind: RecordKind, doc: &Html) -> Vec<RawRecord> {
    let Some(set) = rules.get(kind) else {
        tracing::warn!(%kind, "no extraction rules registered");
        return Vec::new();
    };
    let records = extract_records(doc, set);
    tracing::debug!(%kind, count = records.len(), "extracted records");
    records
}

/// Extracts the single page-level record of a document-level kind.
pub(crate) fn page_record(rules: &RuleRegistry, kind: RecordKind, doc: &Html) -> RawRecord {
    raw_records(rules, kind, doc)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Builds the common fields shared by every listing family.
pub(crate) fn base_entry(kind: RecordKind, raw: &RawRecord, page: &Url) -> ListingEntry {
    let url = absolutize(page, &raw.text("url"));
    let slug = slug_from_url(&url);
    ListingEntry::new(
        kind,
        clean_title(&raw.text("title")),
        url,
        slug,
        absolutize(page, &raw.text("cover")),
    )
}

#[cfg(test)]
pub(crate) mod fixtures {
    use once_cell::sync::Lazy;
    use url::Url;

    use crate::extractors::loader::load_builtin_rules;
    use crate::extractors::rules::RuleRegistry;

    pub static RULES: Lazy<RuleRegistry> = Lazy::new(load_builtin_rules);

    pub fn page(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    /// One `article.movie-preview` card as the listing pages render it.
    pub fn card(title: &str, href: &str, cover: &str, episode: &str) -> String {
        let episode = if episode.is_empty() {
            String::new()
        } else {
            format!(r#"<span class="icon-hd">{episode}</span>"#)
        };
        format!(
            r#"<article class="movie-preview">
                <div class="movie-poster"><a href="{href}"><img class="keremiya-image" src="{cover}"></a>{episode}</div>
                <span class="movie-title"><a href="{href}">{title}</a></span>
                <p class="story">Story of {title}</p>
                <span class="movie-release">2024</span>
                <span class="views">1,234 views</span>
            </article>"#
        )
    }

    pub fn listing_page(cards: &[String]) -> String {
        format!(
            "<html><body><div id=\"content\">{}</div></body></html>",
            cards.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn base_entry_normalizes_common_fields() {
        let html = listing_page(&[card(
            "Nonton Queen of Tears Subtitle Indonesia",
            "/nonton-queen-of-tears/",
            "/img/qot.jpg",
            "",
        )]);
        let doc = Html::parse_document(&html);
        let raws = raw_records(&RULES, RecordKind::Ongoing, &doc);
        let entry = base_entry(RecordKind::Ongoing, &raws[0], &page("https://dramaqu.ad/"));

        assert_eq!(entry.title, "Queen of Tears");
        assert_eq!(entry.url, "https://dramaqu.ad/nonton-queen-of-tears/");
        assert_eq!(entry.slug, "nonton-queen-of-tears");
        assert_eq!(entry.cover, "https://dramaqu.ad/img/qot.jpg");
    }

    #[test]
    fn missing_kind_yields_no_records() {
        let doc = Html::parse_document("<html></html>");
        let empty = RuleRegistry::new();
        assert!(raw_records(&empty, RecordKind::Ongoing, &doc).is_empty());
        assert!(page_record(&empty, RecordKind::Detail, &doc).is_empty());
    }
}
