// ABOUTME: The main Client struct that fetches dramaqu pages and turns them into scored records.
// ABOUTME: Each public operation validates its input, fetches, builds records and wraps them in a confidence envelope.

use std::str::FromStr;

use chrono::Utc;
use url::Url;

use crate::error::ScrapeError;
use crate::extractors::compiled::precompile_selectors;
use crate::extractors::loader::load_builtin_rules;
use crate::extractors::rules::RuleRegistry;
use crate::model::{DetailRecord, EpisodePlayback, HomePage, ListingEntry, ScheduleMap, Scored, Weekday};
use crate::options::{ClientBuilder, Options};
use crate::playback::Orchestrator;
use crate::records::{detail, home, listing, schedule};
use crate::resource::{check_target, fetch, is_allowed_host, FetchOptions};
use crate::score::{score_home, score_record, score_records, score_schedule};

/// Listing path of the ongoing drama category.
pub const ONGOING_PATH: &str = "category/ongoing-drama/";
/// Listing path of the full drama list.
pub const DRAMA_LIST_PATH: &str = "drama-list/";

/// The dramaqu scrape client.
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
    rules: RuleRegistry,
    primary: FetchOptions,
    secondary: FetchOptions,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Self {
        let allowed = opts.effective_domains();

        let http_client = opts.http_client.clone().unwrap_or_else(|| {
            let redirect_allowed = allowed.clone();
            let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
                if attempt.previous().len() >= 10 {
                    return attempt.error("too many redirects");
                }
                let host = attempt.url().host_str().unwrap_or_default().to_string();
                if !is_allowed_host(&host, &redirect_allowed) {
                    return attempt.error("redirect to a domain outside the allow-list");
                }
                attempt.follow()
            });

            reqwest::Client::builder()
                .redirect(redirect_policy)
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .cookie_store(true)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .expect("failed to build HTTP client")
        });

        let rules = opts.rules.clone().unwrap_or_else(load_builtin_rules);
        precompile_selectors(rules.iter().flat_map(|set| set.selector_strings()));

        let primary = FetchOptions {
            headers: opts.headers.clone(),
            allowed_domains: allowed.clone(),
            timeout: Some(opts.timeout),
        };
        let secondary = FetchOptions {
            headers: opts.headers.clone(),
            allowed_domains: allowed,
            timeout: Some(opts.secondary_timeout),
        };

        Self {
            opts,
            http_client,
            rules,
            primary,
            secondary,
        }
    }

    /// The options this client was built with.
    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Ongoing drama listing, one page of cards.
    pub async fn listing(&self, page: u32) -> Result<Scored<Vec<ListingEntry>>, ScrapeError> {
        let url = self.paged(ONGOING_PATH, page, "Listing")?;
        let (html, url) = self.get(url).await?;
        let entries = listing::ongoing(&self.rules, &html, &url);
        tracing::info!(page, count = entries.len(), "ongoing listing");
        Ok(self.scored(entries))
    }

    /// Full drama list, one page of cards.
    pub async fn movie_list(&self, page: u32) -> Result<Scored<Vec<ListingEntry>>, ScrapeError> {
        let url = self.paged(DRAMA_LIST_PATH, page, "MovieList")?;
        let (html, url) = self.get(url).await?;
        let entries = listing::movie_list(&self.rules, &html, &url);
        tracing::info!(page, count = entries.len(), "drama list");
        Ok(self.scored(entries))
    }

    /// Search results for `query`.
    pub async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Scored<Vec<ListingEntry>>, ScrapeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScrapeError::invalid_argument(
                query,
                "Search",
                Some(anyhow::anyhow!("search query is empty")),
            ));
        }
        check_page(page, "Search")?;
        let path = if page == 1 {
            String::new()
        } else {
            format!("page/{}/", page)
        };
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let url = self.join(&format!("{}?s={}", path, encoded), "Search")?;

        let (html, url) = self.get(url).await?;
        let entries = listing::search(&self.rules, &html, &url);
        tracing::info!(query, page, count = entries.len(), "search results");
        Ok(self.scored(entries))
    }

    /// Detail record of one title. Accepts a slug, a site path or an absolute URL.
    pub async fn detail(&self, slug_or_url: &str) -> Result<Scored<DetailRecord>, ScrapeError> {
        let target = slug_or_url.trim();
        if target.is_empty() {
            return Err(ScrapeError::invalid_argument(
                slug_or_url,
                "Detail",
                Some(anyhow::anyhow!("slug is empty")),
            ));
        }
        let url = if target.starts_with("http://") || target.starts_with("https://") {
            check_target(target, "Detail", &self.primary.allowed_domains)?
        } else if target.starts_with('/') {
            self.join(target, "Detail")?
        } else {
            self.join(&format!("{}/", target.trim_end_matches('/')), "Detail")?
        };

        let (html, url) = self.get(url).await?;
        let record = detail::detail(&self.rules, &html, &url);
        let confidence = score_record(&record);
        tracing::info!(slug = %record.slug, episodes = record.episodes.len(), score = confidence.score, "detail");
        Ok(Scored::new(record, confidence, self.source()))
    }

    /// Playback record of one episode, with its streaming link when the player
    /// endpoint cooperates.
    pub async fn episode_playback(
        &self,
        episode_url: &str,
    ) -> Result<Scored<EpisodePlayback>, ScrapeError> {
        // A broken base URL leaves the allow-list empty, which admits any host.
        self.base("Episode")?;
        let url = check_target(episode_url.trim(), "Episode", &self.primary.allowed_domains)?;
        let outcome = Orchestrator::new(&self.http_client, &self.rules, &self.primary, &self.secondary)
            .run(&url, Utc::now())
            .await?;
        let confidence = score_record(&outcome.playback);
        tracing::info!(url = %url, state = %outcome.state, score = confidence.score, "episode playback");
        Ok(Scored::new(outcome.playback, confidence, self.source()))
    }

    /// Weekly schedule of the ongoing titles.
    pub async fn schedule(&self) -> Result<Scored<ScheduleMap>, ScrapeError> {
        let url = self.join(ONGOING_PATH, "Schedule")?;
        let (html, url) = self.get(url).await?;
        let map = schedule::schedule(&self.rules, &html, &url);
        let confidence = score_schedule(&map);
        tracing::info!(count = map.len(), "schedule");
        Ok(Scored::new(map, confidence, self.source()))
    }

    /// Titles released on `day`, a case-insensitive weekday name.
    pub async fn schedule_for_day(
        &self,
        day: &str,
    ) -> Result<Scored<Vec<ListingEntry>>, ScrapeError> {
        let day = Weekday::from_str(day)?;
        let url = self.join(ONGOING_PATH, "Schedule")?;
        let (html, url) = self.get(url).await?;
        let entries = schedule::schedule_for_day(&self.rules, &html, &url, day);
        tracing::info!(%day, count = entries.len(), "schedule day");
        Ok(self.scored(entries))
    }

    /// Home aggregate. The main page and the ongoing listing are fetched concurrently.
    pub async fn home(&self) -> Result<Scored<HomePage>, ScrapeError> {
        let main_url = self.join("", "Home")?;
        let ongoing_url = self.join(ONGOING_PATH, "Home")?;
        let ((main_html, main_url), (ongoing_html, ongoing_url)) =
            futures::try_join!(self.get(main_url), self.get(ongoing_url))?;

        let page = home::home(&self.rules, &main_html, &main_url, &ongoing_html, &ongoing_url);
        let confidence = score_home(&page);
        tracing::info!(
            top_ranked = page.top_ranked.len(),
            new_episodes = page.new_episodes.len(),
            movies = page.movies.len(),
            schedule = page.schedule.len(),
            "home"
        );
        Ok(Scored::new(page, confidence, self.source()))
    }

    /// Fetches a page and returns its decoded body with the URL it was served from.
    async fn get(&self, url: Url) -> Result<(String, Url), ScrapeError> {
        let result = fetch(&self.http_client, url.as_str(), &self.primary).await?;
        let served = Url::parse(&result.final_url).unwrap_or(url);
        Ok((result.text(), served))
    }

    fn base(&self, op: &str) -> Result<Url, ScrapeError> {
        let raw = self.opts.base_url.trim();
        let with_slash = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{}/", raw)
        };
        Url::parse(&with_slash).map_err(|e| {
            ScrapeError::invalid_argument(raw, op, Some(anyhow::anyhow!("invalid base URL: {}", e)))
        })
    }

    fn join(&self, path: &str, op: &str) -> Result<Url, ScrapeError> {
        let base = self.base(op)?;
        base.join(path).map_err(|e| {
            ScrapeError::invalid_argument(path, op, Some(anyhow::anyhow!("invalid path: {}", e)))
        })
    }

    fn paged(&self, listing_path: &str, page: u32, op: &str) -> Result<Url, ScrapeError> {
        check_page(page, op)?;
        if page == 1 {
            self.join(listing_path, op)
        } else {
            self.join(&format!("{}page/{}/", listing_path, page), op)
        }
    }

    fn source(&self) -> String {
        Url::parse(&self.opts.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }

    fn scored(&self, entries: Vec<ListingEntry>) -> Scored<Vec<ListingEntry>> {
        let confidence = score_records(&entries);
        Scored::new(entries, confidence, self.source())
    }
}

fn check_page(page: u32, op: &str) -> Result<(), ScrapeError> {
    if page == 0 {
        return Err(ScrapeError::invalid_argument(
            page.to_string(),
            op,
            Some(anyhow::anyhow!("page numbers start at 1")),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(base: &str) -> Client {
        Client::builder().base_url(base).build()
    }

    #[test]
    fn paged_urls() {
        let c = client("https://dramaqu.ad");
        assert_eq!(
            c.paged(ONGOING_PATH, 1, "Listing").unwrap().as_str(),
            "https://dramaqu.ad/category/ongoing-drama/"
        );
        assert_eq!(
            c.paged(ONGOING_PATH, 3, "Listing").unwrap().as_str(),
            "https://dramaqu.ad/category/ongoing-drama/page/3/"
        );
        assert_eq!(
            c.paged(DRAMA_LIST_PATH, 2, "MovieList").unwrap().as_str(),
            "https://dramaqu.ad/drama-list/page/2/"
        );
        assert!(c.paged(ONGOING_PATH, 0, "Listing").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn base_url_with_path_keeps_prefix() {
        let c = client("http://127.0.0.1:8080/mirror");
        assert_eq!(
            c.join(DRAMA_LIST_PATH, "MovieList").unwrap().as_str(),
            "http://127.0.0.1:8080/mirror/drama-list/"
        );
    }

    #[test]
    fn source_is_base_host() {
        assert_eq!(client("https://dramaqu.ad").source(), "dramaqu.ad");
    }

    #[test]
    fn invalid_base_url_is_invalid_argument() {
        let c = client("::nope::");
        assert!(c.join("", "Home").unwrap_err().is_invalid_argument());
    }

    #[tokio::test]
    async fn episode_playback_rejects_invalid_base_url() {
        let c = client("::nope::");
        assert!(c.options().effective_domains().is_empty());
        let err = c
            .episode_playback("http://127.0.0.1:9/nonton-show/2/")
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn input_is_validated_before_fetching() {
        // Port 9 is never served; any request would fail as a fetch error.
        let c = client("http://127.0.0.1:9");
        assert!(c.listing(0).await.unwrap_err().is_invalid_argument());
        assert!(c.search("   ", 1).await.unwrap_err().is_invalid_argument());
        assert!(c.search("q", 0).await.unwrap_err().is_invalid_argument());
        assert!(c.detail("").await.unwrap_err().is_invalid_argument());
        assert!(c.schedule_for_day("Funday").await.unwrap_err().is_invalid_argument());
        assert!(c.episode_playback("not a url").await.unwrap_err().is_invalid_argument());
        assert!(c
            .episode_playback("https://elsewhere.example/show/2/")
            .await
            .unwrap_err()
            .is_forbidden_domain());
    }
}
