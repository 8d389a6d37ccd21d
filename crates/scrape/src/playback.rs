// ABOUTME: Episode playback orchestration: primary page, embedded player token, dependent streaming-link request.
// ABOUTME: Every failure after the primary page is an abandon reason that is logged, never returned as an error.

//! Secondary-fetch orchestration.
//!
//! The flow runs `Init -> PrimaryParsed -> TokenExtracted -> SecondaryRequested`
//! and ends in `Merged` or `Abandoned`. Only a failed primary fetch is an
//! error; anything that goes wrong afterwards leaves the record without a
//! streaming server.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::error::ScrapeError;
use crate::extractors::rules::RuleRegistry;
use crate::model::{DownloadProvider, EpisodePlayback, StreamingServer};
use crate::normalize::server_name_from_url;
use crate::records::episode::{episode_page, PlayerParams};
use crate::resource::{fetch, post_form, FetchOptions};

/// Path of the site's AJAX endpoint, resolved against the episode page origin.
pub const AJAX_PATH: &str = "/wp-admin/admin-ajax.php";
/// Form action that returns the player iframe URL.
pub const PLAYER_ACTION: &str = "get_player_url";

static NONCE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""nonce":"(\w+)""#).expect("valid nonce regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Init,
    PrimaryParsed,
    TokenExtracted,
    SecondaryRequested,
    Merged,
    Abandoned,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlaybackState::Init => "init",
            PlaybackState::PrimaryParsed => "primary_parsed",
            PlaybackState::TokenExtracted => "token_extracted",
            PlaybackState::SecondaryRequested => "secondary_requested",
            PlaybackState::Merged => "merged",
            PlaybackState::Abandoned => "abandoned",
        };
        write!(f, "{}", s)
    }
}

/// Why the streaming link could not be obtained.
#[derive(Debug, thiserror::Error)]
pub enum AbandonReason {
    #[error("player container not found")]
    MissingPlayerId,
    #[error("player script not found")]
    MissingScript,
    #[error("player script is not a data URI")]
    MalformedDataUri,
    #[error("player script payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("nonce not found in player script")]
    MissingNonce,
    #[error("cannot resolve AJAX endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("secondary request failed: {0}")]
    Request(#[source] ScrapeError),
    #[error("secondary reply is not valid JSON: {0}")]
    Reply(#[from] serde_json::Error),
    #[error("secondary reply reported failure")]
    Unsuccessful,
    #[error("secondary reply carried no player URL")]
    EmptyUrl,
}

/// Credentials for the player request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerToken {
    pub player_id: String,
    pub nonce: String,
}

#[derive(Debug, Default, Deserialize)]
struct PlayerReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: serde_json::Value,
}

/// Final record and the state the flow ended in.
#[derive(Debug, Clone)]
pub struct PlaybackOutcome {
    pub playback: EpisodePlayback,
    pub state: PlaybackState,
}

/// Extracts the nonce from a base64 `data:` URI.
pub fn decode_nonce(script_src: &str) -> Result<String, AbandonReason> {
    let (_, payload) = script_src
        .split_once(',')
        .ok_or(AbandonReason::MalformedDataUri)?;
    let decoded = STANDARD.decode(payload.trim())?;
    let text = String::from_utf8_lossy(&decoded);
    NONCE
        .captures(&text)
        .map(|caps| caps[1].to_string())
        .ok_or(AbandonReason::MissingNonce)
}

pub fn extract_token(params: &PlayerParams) -> Result<PlayerToken, AbandonReason> {
    let player_id = params
        .player_id
        .clone()
        .ok_or(AbandonReason::MissingPlayerId)?;
    let script = params
        .script_src
        .as_deref()
        .ok_or(AbandonReason::MissingScript)?;
    Ok(PlayerToken {
        player_id,
        nonce: decode_nonce(script)?,
    })
}

/// Reads the iframe URL out of the AJAX reply.
pub fn parse_reply(body: &str) -> Result<String, AbandonReason> {
    let reply: PlayerReply = serde_json::from_str(body)?;
    if !reply.success {
        return Err(AbandonReason::Unsuccessful);
    }
    let url = reply
        .data
        .get("iframe_url")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if url.is_empty() {
        return Err(AbandonReason::EmptyUrl);
    }
    Ok(url.to_string())
}

/// Appends one streaming server and its MKV 720p download entry.
pub fn merge_stream(playback: &mut EpisodePlayback, stream_url: &str) {
    let name = server_name_from_url(stream_url);
    playback.streaming_servers.push(StreamingServer {
        name: name.clone(),
        url: stream_url.to_string(),
    });
    playback.download_links.set(
        "MKV",
        "720p",
        vec![DownloadProvider {
            provider: name,
            url: stream_url.to_string(),
        }],
    );
}

/// Runs the playback flow for one episode URL.
pub struct Orchestrator<'a> {
    http: &'a reqwest::Client,
    rules: &'a RuleRegistry,
    primary: &'a FetchOptions,
    secondary: &'a FetchOptions,
    state: PlaybackState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        http: &'a reqwest::Client,
        rules: &'a RuleRegistry,
        primary: &'a FetchOptions,
        secondary: &'a FetchOptions,
    ) -> Self {
        Self {
            http,
            rules,
            primary,
            secondary,
            state: PlaybackState::Init,
        }
    }

    fn advance(&mut self, next: PlaybackState) {
        tracing::debug!(from = %self.state, to = %next, "playback state");
        self.state = next;
    }

    /// Fetches the episode page and tries to attach its streaming link.
    ///
    /// Fails only when the primary page cannot be retrieved.
    pub async fn run(
        mut self,
        episode_url: &Url,
        now: DateTime<Utc>,
    ) -> Result<PlaybackOutcome, ScrapeError> {
        let fetched = fetch(self.http, episode_url.as_str(), self.primary).await?;
        let page = episode_page(self.rules, &fetched.text(), episode_url, now);
        self.advance(PlaybackState::PrimaryParsed);

        let mut playback = page.playback;
        match self.request_stream(&page.player, episode_url).await {
            Ok(stream_url) => {
                merge_stream(&mut playback, &stream_url);
                self.advance(PlaybackState::Merged);
            }
            Err(reason) => {
                tracing::warn!(url = %episode_url, %reason, "streaming link abandoned");
                self.advance(PlaybackState::Abandoned);
            }
        }

        Ok(PlaybackOutcome {
            playback,
            state: self.state,
        })
    }

    async fn request_stream(
        &mut self,
        params: &PlayerParams,
        page_url: &Url,
    ) -> Result<String, AbandonReason> {
        let token = extract_token(params)?;
        self.advance(PlaybackState::TokenExtracted);

        let endpoint = page_url.join(AJAX_PATH)?;
        let form = [
            ("action", PLAYER_ACTION),
            ("player_id", token.player_id.as_str()),
            ("nonce", token.nonce.as_str()),
        ];
        self.advance(PlaybackState::SecondaryRequested);
        let reply = post_form(self.http, endpoint.as_str(), &form, self.secondary)
            .await
            .map_err(AbandonReason::Request)?;
        parse_reply(&reply.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn data_uri(script: &str) -> String {
        format!("data:text/javascript;base64,{}", STANDARD.encode(script))
    }

    #[test]
    fn decode_nonce_from_data_uri() {
        let src = data_uri(r#"var dramagu_player = {"ajax_url":"x","nonce":"a1b2c3"};"#);
        assert_eq!(decode_nonce(&src).unwrap(), "a1b2c3");
    }

    #[test]
    fn decode_nonce_failures() {
        assert!(matches!(
            decode_nonce("no comma here"),
            Err(AbandonReason::MalformedDataUri)
        ));
        assert!(matches!(
            decode_nonce("data:text/javascript;base64,@@not-base64@@"),
            Err(AbandonReason::Base64(_))
        ));
        assert!(matches!(
            decode_nonce(&data_uri(r#"{"other":"x"}"#)),
            Err(AbandonReason::MissingNonce)
        ));
    }

    #[test]
    fn extract_token_needs_both_parts() {
        let script = data_uri(r#"{"nonce":"n0"}"#);
        let missing_id = PlayerParams {
            player_id: None,
            script_src: Some(script.clone()),
        };
        assert!(matches!(
            extract_token(&missing_id),
            Err(AbandonReason::MissingPlayerId)
        ));

        let missing_script = PlayerParams {
            player_id: Some("p1".to_string()),
            script_src: None,
        };
        assert!(matches!(
            extract_token(&missing_script),
            Err(AbandonReason::MissingScript)
        ));

        let full = PlayerParams {
            player_id: Some("p1".to_string()),
            script_src: Some(script),
        };
        assert_eq!(
            extract_token(&full).unwrap(),
            PlayerToken {
                player_id: "p1".to_string(),
                nonce: "n0".to_string()
            }
        );
    }

    #[test]
    fn parse_reply_variants() {
        assert_eq!(
            parse_reply(r#"{"success":true,"data":{"iframe_url":"https://www.player.example/e/9"}}"#)
                .unwrap(),
            "https://www.player.example/e/9"
        );
        assert!(matches!(
            parse_reply(r#"{"success":false,"data":"bad nonce"}"#),
            Err(AbandonReason::Unsuccessful)
        ));
        assert!(matches!(
            parse_reply(r#"{"success":true,"data":{"iframe_url":""}}"#),
            Err(AbandonReason::EmptyUrl)
        ));
        assert!(matches!(parse_reply("<html>"), Err(AbandonReason::Reply(_))));
    }

    #[test]
    fn merge_adds_one_server_and_download() {
        let mut playback = EpisodePlayback::default();
        merge_stream(&mut playback, "https://www.player.example/e/9");

        assert_eq!(
            playback.streaming_servers,
            vec![StreamingServer {
                name: "player.example".to_string(),
                url: "https://www.player.example/e/9".to_string(),
            }]
        );
        let providers = playback.download_links.get("MKV", "720p").unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].provider, "player.example");
        assert!(playback.download_links.get("MP4", "720p").is_none());
    }

    #[test]
    fn state_names() {
        assert_eq!(PlaybackState::SecondaryRequested.to_string(), "secondary_requested");
        assert_eq!(PlaybackState::Abandoned.to_string(), "abandoned");
    }
}
