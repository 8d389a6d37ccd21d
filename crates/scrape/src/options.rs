// ABOUTME: Configuration options for the scrape client including Options and ClientBuilder.
// ABOUTME: ClientBuilder provides a fluent API for constructing Client instances with custom settings.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::Client;
use crate::extractors::rules::RuleRegistry;

/// Site scraped when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://dramaqu.ad";

/// Browser user agent sent by default; the site serves bots a different layout.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

/// Configuration options for the scrape client.
#[derive(Debug, Clone)]
pub struct Options {
    /// Site root; listing and detail paths are joined onto it.
    pub base_url: String,
    /// Hosts requests may target. Empty means the base URL host only.
    pub allowed_domains: Vec<String>,
    /// Bound for each primary page fetch.
    pub timeout: Duration,
    /// Bound for the dependent streaming-link request.
    pub secondary_timeout: Duration,
    pub user_agent: String,
    pub http_client: Option<reqwest::Client>,
    pub headers: HashMap<String, String>,
    pub rules: Option<RuleRegistry>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            allowed_domains: Vec::new(),
            timeout: Duration::from_secs(30),
            secondary_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_client: None,
            headers: HashMap::new(),
            rules: None,
        }
    }
}

impl Options {
    /// The allow-list in effect: the configured domains, or the base URL host.
    pub fn effective_domains(&self) -> Vec<String> {
        if !self.allowed_domains.is_empty() {
            return self.allowed_domains.clone();
        }
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .into_iter()
            .collect()
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the site root.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.opts.base_url = base_url.into();
        self
    }

    /// Allow requests to one more domain (and its subdomains).
    pub fn allowed_domain(mut self, domain: impl Into<String>) -> Self {
        self.opts.allowed_domains.push(domain.into());
        self
    }

    /// Set the primary page timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the streaming-link request timeout.
    pub fn secondary_timeout(mut self, timeout: Duration) -> Self {
        self.opts.secondary_timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Replace the builtin extraction rules.
    pub fn rules(mut self, rules: RuleRegistry) -> Self {
        self.opts.rules = Some(rules);
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
