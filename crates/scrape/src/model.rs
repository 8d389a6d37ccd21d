// ABOUTME: Typed records produced by the pipeline and the scored response envelope.
// ABOUTME: Listing entries, detail and playback records, the weekday schedule map and the home aggregate.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::ScrapeError;
use crate::extractors::rules::RecordKind;
use crate::score::Confidence;

/// Response envelope carried by every operation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Scored<T> {
    pub confidence_score: f64,
    pub message: String,
    pub source: String,
    pub data: T,
}

impl<T> Scored<T> {
    pub fn new(data: T, confidence: Confidence, source: impl Into<String>) -> Self {
        Self {
            confidence_score: confidence.score,
            message: confidence.message,
            source: source.into(),
            data,
        }
    }
}

/// One item of a listing page, search result, schedule or home sub-list.
///
/// Attributes a family never fills stay `None` and are left out of the JSON.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListingEntry {
    #[serde(skip)]
    pub kind: RecordKind,
    pub title: String,
    pub url: String,
    pub slug: String,
    pub cover: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
}

impl ListingEntry {
    /// An entry carrying only the common fields.
    pub fn new(kind: RecordKind, title: String, url: String, slug: String, cover: String) -> Self {
        Self {
            kind,
            title,
            url,
            slug,
            cover,
            episode: None,
            uploader: None,
            release: None,
            status: None,
            kind_label: None,
            score: None,
            viewers: None,
            views: None,
            synopsis: None,
            genres: None,
            date: None,
            release_time: None,
            rating: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EpisodeItem {
    pub episode: String,
    pub title: String,
    pub url: String,
    pub episode_slug: String,
    pub release_date: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Rating {
    pub score: String,
    pub users: String,
}

/// Secondary facts about a title; the site exposes almost none of them.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Details {
    pub japanese: String,
    pub english: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind_label: String,
    pub source: String,
    pub duration: String,
    pub total_episodes: String,
    pub season: String,
    pub studio: String,
    pub producers: String,
    pub released: String,
}

impl Details {
    pub(crate) fn is_complete(&self) -> bool {
        [
            &self.japanese,
            &self.english,
            &self.status,
            &self.kind_label,
            &self.source,
            &self.duration,
            &self.total_episodes,
            &self.season,
            &self.studio,
            &self.producers,
            &self.released,
        ]
        .iter()
        .all(|v| !v.trim().is_empty())
    }
}

/// Full metadata for one title.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetailRecord {
    pub title: String,
    pub url: String,
    pub slug: String,
    pub cover: String,
    pub synopsis: String,
    pub genres: Vec<String>,
    pub status: String,
    #[serde(rename = "type")]
    pub kind_label: String,
    pub score: String,
    pub viewers: String,
    pub episodes: Vec<EpisodeItem>,
    pub recommendations: Vec<ListingEntry>,
    pub rating: Rating,
    pub details: Details,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StreamingServer {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DownloadProvider {
    pub provider: String,
    pub url: String,
}

/// Download formats always present in the output.
pub const DOWNLOAD_FORMATS: [&str; 3] = ["MKV", "MP4", "x265"];

/// Download links keyed by container format, then by quality label.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DownloadLinks(BTreeMap<String, BTreeMap<String, Vec<DownloadProvider>>>);

impl Default for DownloadLinks {
    fn default() -> Self {
        Self(
            DOWNLOAD_FORMATS
                .iter()
                .map(|f| (f.to_string(), BTreeMap::new()))
                .collect(),
        )
    }
}

impl DownloadLinks {
    /// Replaces the providers listed for one format and quality.
    pub fn set(&mut self, format: &str, quality: &str, providers: Vec<DownloadProvider>) {
        self.0
            .entry(format.to_string())
            .or_default()
            .insert(quality.to_string(), providers);
    }

    pub fn get(&self, format: &str, quality: &str) -> Option<&[DownloadProvider]> {
        self.0
            .get(format)
            .and_then(|q| q.get(quality))
            .map(Vec::as_slice)
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns true if no format lists any provider.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|q| q.values().all(Vec::is_empty))
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Navigation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    pub all_episodes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AnimeInfo {
    pub title: String,
    pub thumbnail: String,
    pub synopsis: String,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OtherEpisode {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub release_date: String,
}

/// Playable data for one episode.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct EpisodePlayback {
    pub title: String,
    pub thumbnail: String,
    pub streaming_servers: Vec<StreamingServer>,
    pub release_info: String,
    pub download_links: DownloadLinks,
    pub navigation: Navigation,
    pub anime_info: AnimeInfo,
    pub other_episodes: Vec<OtherEpisode>,
}

/// Day of the week, in calendar order starting Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Week order used for serialization.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Order used for day assignment, where index 0 is Sunday.
    const FROM_SUNDAY: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Release day for a title: sum of the title's code points modulo 7,
    /// counted from Sunday. Callers pass the cleaned title.
    pub fn for_title(title: &str) -> Weekday {
        let sum: u64 = title.chars().map(|c| u64::from(u32::from(c))).sum();
        Self::FROM_SUNDAY[(sum % 7) as usize]
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Weekday::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ScrapeError::invalid_argument(
                    s,
                    "Schedule",
                    Some(anyhow::anyhow!("unrecognized weekday name")),
                )
            })
    }
}

/// Weekday to ordered entries. All seven days are always serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleMap {
    days: [Vec<ListingEntry>; 7],
}

impl ScheduleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, day: Weekday, entry: ListingEntry) {
        self.days[day.index()].push(entry);
    }

    pub fn day(&self, day: Weekday) -> &[ListingEntry] {
        &self.days[day.index()]
    }

    pub fn into_day(self, day: Weekday) -> Vec<ListingEntry> {
        let [mon, tue, wed, thu, fri, sat, sun] = self.days;
        match day {
            Weekday::Monday => mon,
            Weekday::Tuesday => tue,
            Weekday::Wednesday => wed,
            Weekday::Thursday => thu,
            Weekday::Friday => fri,
            Weekday::Saturday => sat,
            Weekday::Sunday => sun,
        }
    }

    /// Every entry in week order.
    pub fn entries(&self) -> impl Iterator<Item = &ListingEntry> {
        self.days.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.days.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for ScheduleMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Weekday::ALL.len()))?;
        for day in Weekday::ALL {
            map.serialize_entry(day.as_str(), self.day(day))?;
        }
        map.end()
    }
}

/// The home page aggregate.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct HomePage {
    pub top_ranked: Vec<ListingEntry>,
    pub new_episodes: Vec<ListingEntry>,
    pub movies: Vec<ListingEntry>,
    pub schedule: ScheduleMap,
}
