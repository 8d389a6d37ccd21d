// ABOUTME: Builds the episode playback record from the primary episode page.
// ABOUTME: Computes navigation from the episode URL and collects the raw player parameters for the secondary fetch.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use url::Url;

use crate::extractors::rules::{RecordKind, RuleRegistry};
use crate::model::{AnimeInfo, EpisodePlayback, Navigation, OtherEpisode};
use crate::normalize::{absolutize, clean_title, UNKNOWN};
use crate::records::{page_record, raw_records};

static EPISODE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?://[^/]+/[^/]+)/(\d+)/?$").expect("valid episode url regex"));
static SERIES_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?://[^/]+/[^/]+)/?$").expect("valid series url regex"));
static TITLE_WITH_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.*)\s+\(Episode\s+\d+\)").expect("valid title regex"));
static EPISODE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+Episode\s+\d+.*").expect("valid suffix regex"));

/// Raw player parameters found on the page; decoding happens later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerParams {
    /// `id` of the player container
    pub player_id: Option<String>,
    /// `src` of the player script, a base64 data URI
    pub script_src: Option<String>,
}

/// The playback record before any streaming link is merged in.
#[derive(Debug, Clone)]
pub struct EpisodePage {
    pub playback: EpisodePlayback,
    pub player: PlayerParams,
}

/// Builds the playback record of the episode page at `page`.
pub fn episode_page(
    rules: &RuleRegistry,
    html: &str,
    page: &Url,
    now: DateTime<Utc>,
) -> EpisodePage {
    let doc = Html::parse_document(html);
    let raw = page_record(rules, RecordKind::EpisodePage, &doc);

    let title = [raw.text("title"), raw.text("release")]
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    let thumbnail = absolutize(page, &raw.text("thumbnail"));

    let other_episodes = raw_records(rules, RecordKind::SiblingEpisode, &doc)
        .iter()
        .map(|sibling| OtherEpisode {
            title: format!("Episode {}", sibling.text("number")),
            url: absolutize(page, &sibling.text("url")),
            thumbnail: thumbnail.clone(),
            release_date: UNKNOWN.to_string(),
        })
        .collect();

    let playback = EpisodePlayback {
        navigation: navigation(page.as_str(), &raw.list("page_links")),
        anime_info: AnimeInfo {
            title: series_title(&title),
            thumbnail: thumbnail.clone(),
            synopsis: raw.text("synopsis"),
            genres: raw.list("genres"),
        },
        release_info: now.format("Released on %B %Y").to_string(),
        title,
        thumbnail,
        other_episodes,
        ..Default::default()
    };

    let optional = |v: String| if v.is_empty() { None } else { Some(v) };
    let player = PlayerParams {
        player_id: optional(raw.text("player_id")),
        script_src: optional(raw.text("player_script")),
    };

    EpisodePage { playback, player }
}

/// Previous, all-episodes and next links derived from the episode URL.
///
/// `.../{series}/{n}/` is episode `n`; `.../{series}/` is episode 1. The next
/// link is only offered when the page links to episode `n + 1`. A number too
/// wide for `u64` leaves the URL unrecognized.
pub fn navigation(episode_url: &str, page_links: &[String]) -> Navigation {
    let (base, number) = if let Some(caps) = EPISODE_URL.captures(episode_url) {
        let Ok(number) = caps[2].parse::<u64>() else {
            return Navigation::default();
        };
        (caps[1].to_string(), number)
    } else if let Some(caps) = SERIES_URL.captures(episode_url) {
        (caps[1].trim_end_matches('/').to_string(), 1)
    } else {
        return Navigation::default();
    };

    let previous = match number {
        0 | 1 => None,
        2 => Some(format!("{}/", base)),
        n => Some(format!("{}/{}/", base, n - 1)),
    };

    let next = number.checked_add(1).and_then(|following| {
        let marker = format!("/{}/", following);
        page_links
            .iter()
            .any(|href| href.contains(&marker))
            .then(|| format!("{}/{}/", base, following))
    });

    Navigation {
        previous,
        all_episodes: format!("{}/", base),
        next,
    }
}

/// Series title from an episode title such as "Show (Episode 3)" or "Show Episode 3".
pub fn series_title(episode_title: &str) -> String {
    if let Some(caps) = TITLE_WITH_EPISODE.captures(episode_title) {
        return clean_title(&caps[1]);
    }
    EPISODE_SUFFIX
        .replace(&clean_title(episode_title), "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::fixtures::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn links(hrefs: &[&str]) -> Vec<String> {
        hrefs.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn navigation_middle_episode() {
        let nav = navigation(
            "https://dramaqu.ad/nonton-show/3/",
            &links(&["https://dramaqu.ad/nonton-show/4/"]),
        );
        assert_eq!(nav.previous.as_deref(), Some("https://dramaqu.ad/nonton-show/2/"));
        assert_eq!(nav.all_episodes, "https://dramaqu.ad/nonton-show/");
        assert_eq!(nav.next.as_deref(), Some("https://dramaqu.ad/nonton-show/4/"));
    }

    #[test]
    fn navigation_second_episode_points_back_to_series() {
        let nav = navigation("https://dramaqu.ad/nonton-show/2", &[]);
        assert_eq!(nav.previous.as_deref(), Some("https://dramaqu.ad/nonton-show/"));
        assert!(nav.next.is_none());
    }

    #[test]
    fn navigation_first_episode() {
        let nav = navigation(
            "https://dramaqu.ad/nonton-show/",
            &links(&["https://dramaqu.ad/nonton-show/2/"]),
        );
        assert!(nav.previous.is_none());
        assert_eq!(nav.all_episodes, "https://dramaqu.ad/nonton-show/");
        assert_eq!(nav.next.as_deref(), Some("https://dramaqu.ad/nonton-show/2/"));
    }

    #[test]
    fn navigation_unrecognized_url() {
        let nav = navigation("https://dramaqu.ad/a/b/c/d/", &[]);
        assert_eq!(nav, Navigation::default());
    }

    #[test]
    fn navigation_last_representable_episode_has_no_next() {
        let nav = navigation(
            "https://dramaqu.ad/nonton-show/18446744073709551615/",
            &links(&["https://dramaqu.ad/nonton-show/0/"]),
        );
        assert_eq!(
            nav.previous.as_deref(),
            Some("https://dramaqu.ad/nonton-show/18446744073709551614/")
        );
        assert_eq!(nav.all_episodes, "https://dramaqu.ad/nonton-show/");
        assert!(nav.next.is_none());
    }

    #[test]
    fn navigation_wide_episode_numbers() {
        let nav = navigation(
            "https://dramaqu.ad/nonton-show/4294967295/",
            &links(&["https://dramaqu.ad/nonton-show/4294967296/"]),
        );
        assert_eq!(
            nav.previous.as_deref(),
            Some("https://dramaqu.ad/nonton-show/4294967294/")
        );
        assert_eq!(
            nav.next.as_deref(),
            Some("https://dramaqu.ad/nonton-show/4294967296/")
        );

        let nav = navigation("https://dramaqu.ad/nonton-show/99999999999999999999999/", &[]);
        assert_eq!(nav, Navigation::default());
    }

    #[test]
    fn series_title_variants() {
        assert_eq!(series_title("Queen of Tears (Episode 3)"), "Queen of Tears");
        assert_eq!(series_title("Queen of Tears Episode 3 Sub Indo"), "Queen of Tears");
        assert_eq!(series_title("Nonton Lovely Runner Episode 12"), "Lovely Runner");
        assert_eq!(series_title("Standalone"), "Standalone");
    }

    #[test]
    fn episode_page_collects_fields_and_player_params() {
        let html = r#"<html><body>
            <div class="single-content movie">
                <div class="poster"><img src="https://img.example/show.jpg"></div>
                <div class="title"><span>Show</span></div>
                <div class="release">(Episode 2)</div>
                <div class="excerpt">Plot.</div>
                <div class="categories"><a>Drama</a><a>Romance</a></div>
            </div>
            <div class="apicodes-container" id="player-77"></div>
            <script id="dramagu-player-js-extra" src="data:text/javascript;base64,e30="></script>
            <div id="action-parts">
                <a class="post-page-numbers" href="https://dramaqu.ad/nonton-show/"><span>1</span></a>
                <a class="post-page-numbers" href="https://dramaqu.ad/nonton-show/3/"><span>3</span></a>
            </div>
        </body></html>"#;
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let built = episode_page(&RULES, html, &page("https://dramaqu.ad/nonton-show/2/"), now);
        let p = &built.playback;

        assert_eq!(p.title, "Show (Episode 2)");
        assert_eq!(p.thumbnail, "https://img.example/show.jpg");
        assert_eq!(p.release_info, "Released on March 2024");
        assert_eq!(p.anime_info.title, "Show");
        assert_eq!(p.anime_info.genres, vec!["Drama", "Romance"]);
        assert_eq!(p.navigation.previous.as_deref(), Some("https://dramaqu.ad/nonton-show/"));
        assert_eq!(p.navigation.next.as_deref(), Some("https://dramaqu.ad/nonton-show/3/"));
        assert_eq!(p.other_episodes.len(), 2);
        assert_eq!(p.other_episodes[1].title, "Episode 3");
        assert!(p.streaming_servers.is_empty());

        assert_eq!(built.player.player_id.as_deref(), Some("player-77"));
        assert_eq!(
            built.player.script_src.as_deref(),
            Some("data:text/javascript;base64,e30=")
        );
    }

    #[test]
    fn episode_page_without_player() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let built = episode_page(&RULES, "<html></html>", &page("https://dramaqu.ad/s/4/"), now);
        assert_eq!(built.player, PlayerParams::default());
        assert!(built.playback.title.is_empty());
        assert_eq!(built.playback.navigation.all_episodes, "https://dramaqu.ad/s/");
    }
}
