// ABOUTME: Post-extraction normalization: title cleanup, slug derivation and fixed placeholder values.
// ABOUTME: Every function here is pure and deterministic.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Uploader shown on every ongoing entry; the site never exposes one.
pub const DEFAULT_UPLOADER: &str = "DramaQu Admin";
/// Release date, release time and other fields the site never exposes.
pub const UNKNOWN: &str = "Unknown";
/// Score placeholder for listings without a rating.
pub const NO_SCORE: &str = "N/A";
/// Viewer counter shown on search results.
pub const SEARCH_VIEWERS: &str = "15,000+ viewers";
/// Viewer counter shown on detail pages.
pub const DETAIL_VIEWERS: &str = "1,000,000+ viewers";
/// Display name used when a streaming URL carries no host.
pub const DEFAULT_SERVER: &str = "Default Server";
/// Schedule entries are always series.
pub const SCHEDULE_TYPE: &str = "TV";

pub const LISTING_GENRES: [&str; 3] = ["Action", "Drama", "Thriller"];
pub const TOP_RANKED_GENRES: [&str; 3] = ["Action", "Adventure", "Drama"];
pub const MOVIE_LIST_GENRES: [&str; 3] = ["Action", "Drama", "Fantasy"];
pub const SCHEDULE_GENRES: [&str; 3] = ["Drama", "Romance", "Comedy"];

/// Placeholder genre list as owned strings.
pub fn placeholder_genres(genres: &[&str]) -> Vec<String> {
    genres.iter().map(|g| g.to_string()).collect()
}

static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*Drama\s*Korea\s*Subtitle\s*Indonesia|Nonton\s*|\s*Subtitle\s*Indonesia.*")
        .expect("valid boilerplate regex")
});

static TRAILING_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(\d{4}\)\s*$").expect("valid year regex"));

static VIEW_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\d,]+").expect("valid views regex"));

/// Strips site boilerplate ("Nonton", "Subtitle Indonesia ...") and a trailing
/// "(YYYY)" from a title.
///
/// Passes repeat until nothing changes, so the result is a fixed point:
/// `clean_title(&clean_title(x)) == clean_title(x)`.
pub fn clean_title(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let stripped = BOILERPLATE.replace_all(&current, "");
        let stripped = TRAILING_YEAR.replace(&stripped, "");
        let next = stripped.trim().to_string();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Derives a slug from the last non-empty path segment of a URL.
///
/// Query strings and fragments are ignored. An empty URL, or one with no path
/// segment, yields an empty slug.
pub fn slug_from_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    match Url::parse(raw) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or_default()
            .to_string(),
        Err(_) => {
            let path = raw.split(['?', '#']).next().unwrap_or_default();
            path.split('/')
                .filter(|s| !s.is_empty())
                .last()
                .unwrap_or_default()
                .to_string()
        }
    }
}

/// Episode identifier of the form `{series}-episode-{number}`.
pub fn episode_slug(series: &str, number: &str) -> String {
    format!("{}-episode-{}", series, number)
}

/// Display name for a streaming server: the URL host without a leading `www.`.
pub fn server_name_from_url(raw: &str) -> String {
    Url::parse(raw.trim())
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string())
}

/// First run of digits and thousands separators, e.g. "1,234" from "1,234 views".
pub fn digits_only(raw: &str) -> String {
    VIEW_COUNT
        .find(raw)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Resolves a possibly relative href against the page it was found on.
pub fn absolutize(base: &Url, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    base.join(href)
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}
