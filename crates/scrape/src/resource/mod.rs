// ABOUTME: Resource handling module for fetching pages from the allowed site domains.
// ABOUTME: Handles GET and form POST requests with domain allow-listing, timeouts, size limits, and charset decoding.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use crate::error::ScrapeError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Options for fetching a resource.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
    /// Hosts a request may target; subdomains of an entry are accepted too.
    /// An empty list accepts every host.
    pub allowed_domains: Vec<String>,
    /// Per-request bound overriding the client's own timeout.
    pub timeout: Option<Duration>,
}

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as text, using the charset from the content-type header or detection.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Returns true if the host is an allowed domain or one of its subdomains.
pub fn is_allowed_host(host: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let host = host.to_ascii_lowercase();
    allowed.iter().any(|domain| {
        let domain = domain.trim().to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{}", domain))
    })
}

/// Parses an absolute http(s) URL and checks it against the allow-list.
pub fn check_target(url: &str, op: &str, allowed: &[String]) -> Result<Url, ScrapeError> {
    let parsed = Url::parse(url).map_err(|e| {
        ScrapeError::invalid_argument(url, op, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ScrapeError::invalid_argument(
            url,
            op,
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    let host = parsed.host_str().unwrap_or_default();
    if host.is_empty() || !is_allowed_host(host, allowed) {
        return Err(ScrapeError::forbidden_domain(
            url,
            op,
            Some(anyhow::anyhow!("host {:?} is not an allowed domain", host)),
        ));
    }
    Ok(parsed)
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

fn transport_error(url: &str, what: &str, err: reqwest::Error) -> ScrapeError {
    if err.is_timeout() {
        ScrapeError::timeout(url, "Fetch", Some(anyhow::anyhow!("{}: {}", what, err)))
    } else {
        ScrapeError::fetch(url, "Fetch", Some(anyhow::anyhow!("{}: {}", what, err)))
    }
}

/// Fetch a page with GET.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, ScrapeError> {
    if url.is_empty() {
        return Err(ScrapeError::invalid_argument(url, "Fetch", None));
    }
    check_target(url, "Fetch", &opts.allowed_domains)?;

    tracing::debug!(url, "fetching page");
    let request = client.get(url);
    send(request, url, opts).await
}

/// Submit a urlencoded form with POST.
pub async fn post_form(
    client: &reqwest::Client,
    url: &str,
    form: &[(&str, &str)],
    opts: &FetchOptions,
) -> Result<FetchResult, ScrapeError> {
    check_target(url, "Fetch", &opts.allowed_domains)?;

    tracing::debug!(url, fields = form.len(), "posting form");
    let request = client.post(url).form(form);
    send(request, url, opts).await
}

async fn send(
    mut request: reqwest::RequestBuilder,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, ScrapeError> {
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }
    if let Some(timeout) = opts.timeout {
        request = request.timeout(timeout);
    }

    let response = request
        .send()
        .await
        .map_err(|e| transport_error(url, "request failed", e))?;

    // Redirects must stay on the allow-list too
    let final_host = response.url().host_str().unwrap_or_default().to_string();
    if !is_allowed_host(&final_host, &opts.allowed_domains) {
        return Err(ScrapeError::forbidden_domain(
            url,
            "Fetch",
            Some(anyhow::anyhow!("redirected to {:?}", final_host)),
        ));
    }

    let content_length = response.content_length().or_else(|| {
        response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
    });

    if let Some(len) = content_length {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(ScrapeError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(url, "failed to read body", e))?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(ScrapeError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    if status != 200 {
        return Err(ScrapeError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("HTTP status {}", status)),
        ));
    }

    tracing::debug!(url, status, bytes = body.len(), "fetched");
    Ok(FetchResult {
        status,
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}
