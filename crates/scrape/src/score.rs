// ABOUTME: Two-tier completeness scoring of records and the request-level confidence aggregate.
// ABOUTME: Required fields gate a record, optional fields decide full or half credit.

//! Confidence scoring.
//!
//! Each record contributes `0.0` when a required field is empty, `1.0` when
//! every optional field is present and `0.5` otherwise. The request score is
//! the mean contribution truncated to hundredths, mapped onto a message band.
//! Placeholder values filled by the normalizer count as present.

use crate::extractors::rules::RecordKind;
use crate::model::{DetailRecord, EpisodePlayback, HomePage, ListingEntry, ScheduleMap};

/// A field value as seen by the scorer.
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    Text(&'a str),
    Opt(Option<&'a str>),
    List(usize),
    Flag(bool),
}

impl Field<'_> {
    /// Text is present when non-empty after trimming; lists when non-empty.
    pub fn is_present(&self) -> bool {
        match self {
            Field::Text(s) => !s.trim().is_empty(),
            Field::Opt(s) => s.is_some_and(|s| !s.trim().is_empty()),
            Field::List(n) => *n > 0,
            Field::Flag(b) => *b,
        }
    }
}

/// Required and optional field sets of one record.
pub trait Completeness {
    fn required(&self) -> Vec<Field<'_>>;
    fn optional(&self) -> Vec<Field<'_>>;

    fn contribution(&self) -> f64 {
        if !self.required().iter().all(Field::is_present) {
            0.0
        } else if self.optional().iter().all(Field::is_present) {
            1.0
        } else {
            0.5
        }
    }
}

/// Message bands for the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Incomplete,
    Low,
    Medium,
    Perfect,
}

impl Band {
    pub fn from_score(score: f64) -> Self {
        if score <= 0.0 {
            Band::Incomplete
        } else if score < 0.5 {
            Band::Low
        } else if score < 1.0 {
            Band::Medium
        } else {
            Band::Perfect
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Band::Incomplete => "incomplete, required fields missing",
            Band::Low => "low completeness",
            Band::Medium => "medium completeness",
            Band::Perfect => "perfect completeness",
        }
    }
}

/// Aggregate score plus its message.
#[derive(Debug, Clone, PartialEq)]
pub struct Confidence {
    pub score: f64,
    pub message: String,
}

impl Confidence {
    pub fn from_score(score: f64) -> Self {
        Self {
            score,
            message: Band::from_score(score).message().to_string(),
        }
    }

    /// Mean of per-record contributions, truncated to hundredths.
    pub fn from_contributions<I>(contributions: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let (sum, count) = contributions
            .into_iter()
            .fold((0.0_f64, 0_usize), |(sum, count), c| (sum + c, count + 1));
        if count == 0 {
            return Self::from_score(0.0);
        }
        Self::from_score(truncate_hundredths(sum / count as f64))
    }
}

/// Floors a value at hundredths; the epsilon absorbs binary representation error
/// (0.29 * 100 is 28.999999999999996).
pub fn truncate_hundredths(value: f64) -> f64 {
    let truncated = (value * 100.0 + 1e-9).floor() / 100.0;
    truncated.clamp(0.0, 1.0)
}

/// Scores a homogeneous list of records.
pub fn score_records<'a, T, I>(records: I) -> Confidence
where
    T: Completeness + 'a,
    I: IntoIterator<Item = &'a T>,
{
    Confidence::from_contributions(records.into_iter().map(|r| r.contribution()))
}

/// Scores a single record.
pub fn score_record<T: Completeness>(record: &T) -> Confidence {
    Confidence::from_contributions(std::iter::once(record.contribution()))
}

/// Scores every entry of a schedule as one pool.
pub fn score_schedule(schedule: &ScheduleMap) -> Confidence {
    score_records(schedule.entries())
}

/// Pools every home sub-list item, including each schedule entry, into one denominator.
pub fn score_home(home: &HomePage) -> Confidence {
    score_records(
        home.top_ranked
            .iter()
            .chain(&home.new_episodes)
            .chain(&home.movies)
            .chain(home.schedule.entries()),
    )
}

fn opt(value: &Option<String>) -> Field<'_> {
    Field::Opt(value.as_deref())
}

impl Completeness for ListingEntry {
    fn required(&self) -> Vec<Field<'_>> {
        vec![
            Field::Text(&self.title),
            Field::Text(&self.url),
            Field::Text(&self.slug),
            Field::Text(&self.cover),
        ]
    }

    fn optional(&self) -> Vec<Field<'_>> {
        let genres = Field::List(self.genres.as_ref().map_or(0, Vec::len));
        match self.kind {
            RecordKind::Ongoing => vec![
                opt(&self.episode),
                opt(&self.uploader),
                opt(&self.release),
            ],
            RecordKind::MovieList => vec![
                opt(&self.status),
                opt(&self.score),
                opt(&self.synopsis),
                opt(&self.views),
                genres,
                opt(&self.date),
            ],
            RecordKind::Search => vec![
                opt(&self.status),
                opt(&self.kind_label),
                opt(&self.score),
                opt(&self.viewers),
                opt(&self.synopsis),
                genres,
            ],
            RecordKind::Schedule => vec![
                opt(&self.kind_label),
                opt(&self.score),
                genres,
                opt(&self.release_time),
            ],
            RecordKind::TopRanked => vec![opt(&self.rating), genres],
            RecordKind::NewEpisode => vec![opt(&self.episode), opt(&self.release)],
            RecordKind::HomeMovie => vec![opt(&self.date), genres],
            RecordKind::Recommendation => vec![opt(&self.rating), opt(&self.episode)],
            // Entries are never built for the page-level kinds.
            RecordKind::Detail
            | RecordKind::DetailEpisode
            | RecordKind::EpisodePage
            | RecordKind::SiblingEpisode => Vec::new(),
        }
    }
}

impl Completeness for DetailRecord {
    fn required(&self) -> Vec<Field<'_>> {
        vec![
            Field::Text(&self.title),
            Field::Text(&self.url),
            Field::Text(&self.slug),
            Field::Text(&self.cover),
        ]
    }

    fn optional(&self) -> Vec<Field<'_>> {
        vec![
            Field::Text(&self.status),
            Field::Text(&self.kind_label),
            Field::Text(&self.score),
            Field::Text(&self.viewers),
            Field::Text(&self.synopsis),
            Field::List(self.genres.len()),
            Field::List(self.episodes.len()),
            Field::List(self.recommendations.len()),
            Field::Text(&self.rating.score),
            Field::Text(&self.rating.users),
            Field::Flag(self.details.is_complete()),
        ]
    }
}

impl Completeness for EpisodePlayback {
    fn required(&self) -> Vec<Field<'_>> {
        vec![
            Field::Text(&self.title),
            Field::Text(&self.thumbnail),
            Field::Text(&self.navigation.all_episodes),
            Field::List(self.streaming_servers.len()),
        ]
    }

    fn optional(&self) -> Vec<Field<'_>> {
        vec![
            Field::Text(&self.release_info),
            Field::Flag(!self.download_links.is_empty()),
            Field::Opt(self.navigation.previous.as_deref()),
            Field::Opt(self.navigation.next.as_deref()),
            Field::Text(&self.anime_info.title),
            Field::Text(&self.anime_info.synopsis),
            Field::List(self.anime_info.genres.len()),
            Field::List(self.other_episodes.len()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StreamingServer, Weekday};
    use pretty_assertions::assert_eq;

    fn ongoing(title: &str, cover: &str, episode: Option<&str>) -> ListingEntry {
        let mut e = ListingEntry::new(
            RecordKind::Ongoing,
            title.to_string(),
            "https://dramaqu.ad/show/".to_string(),
            "show".to_string(),
            cover.to_string(),
        );
        e.episode = episode.map(str::to_string);
        e.uploader = Some("DramaQu Admin".to_string());
        e.release = Some("Unknown".to_string());
        e
    }

    #[test]
    fn zero_records_score_exactly_zero() {
        let c = score_records::<ListingEntry, _>(&[]);
        assert_eq!(c.score, 0.0);
        assert_eq!(c.message, "incomplete, required fields missing");
    }

    #[test]
    fn complete_records_score_one() {
        let records = vec![ongoing("A", "a.jpg", Some("Ep 1")), ongoing("B", "b.jpg", Some("Ep 2"))];
        let c = score_records(&records);
        assert_eq!(c.score, 1.0);
        assert_eq!(c.message, "perfect completeness");
    }

    #[test]
    fn missing_required_field_contributes_zero() {
        let record = ongoing("A", "  ", Some("Ep 1"));
        assert_eq!(record.contribution(), 0.0);
    }

    #[test]
    fn partial_optional_contributes_half() {
        // 2 of 3 optional fields present
        let record = ongoing("A", "a.jpg", None);
        assert_eq!(record.contribution(), 0.5);
        let c = score_records(std::slice::from_ref(&record));
        assert_eq!(c.score, 0.5);
        assert_eq!(c.message, "medium completeness");
    }

    #[test]
    fn aggregate_truncates_instead_of_rounding() {
        // (1 + 0 + 0) / 3 = 0.333.. -> 0.33
        let c = Confidence::from_contributions([1.0, 0.0, 0.0]);
        assert_eq!(c.score, 0.33);
        assert_eq!(c.message, "low completeness");

        // (1 + 1 + 0.5) / 3 = 0.8333.. -> 0.83
        assert_eq!(Confidence::from_contributions([1.0, 1.0, 0.5]).score, 0.83);

        // (1 + 0.5 + 0.5 + 0.5 + 0.5 + 0.5 + 0.5) / 7 = 0.5714.. -> 0.57
        let c = Confidence::from_contributions([1.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5]);
        assert_eq!(c.score, 0.57);
    }

    #[test]
    fn truncation_guards_binary_error() {
        assert_eq!(truncate_hundredths(0.29), 0.29);
        assert_eq!(truncate_hundredths(0.57), 0.57);
        assert_eq!(truncate_hundredths(0.999), 0.99);
        assert_eq!(truncate_hundredths(1.0), 1.0);
    }

    #[test]
    fn bands_cover_boundaries() {
        assert_eq!(Band::from_score(0.0), Band::Incomplete);
        assert_eq!(Band::from_score(0.01), Band::Low);
        assert_eq!(Band::from_score(0.49), Band::Low);
        assert_eq!(Band::from_score(0.5), Band::Medium);
        assert_eq!(Band::from_score(0.99), Band::Medium);
        assert_eq!(Band::from_score(1.0), Band::Perfect);
    }

    #[test]
    fn placeholder_values_count_as_present() {
        let mut e = ListingEntry::new(
            RecordKind::Schedule,
            "T".to_string(),
            "https://dramaqu.ad/t/".to_string(),
            "t".to_string(),
            "t.jpg".to_string(),
        );
        e.kind_label = Some("TV".to_string());
        e.score = Some("N/A".to_string());
        e.genres = Some(vec!["Drama".to_string()]);
        e.release_time = Some("Unknown".to_string());
        assert_eq!(e.contribution(), 1.0);
    }

    #[test]
    fn playback_without_server_scores_zero() {
        let mut playback = EpisodePlayback {
            title: "Show Episode 2".to_string(),
            thumbnail: "t.jpg".to_string(),
            ..Default::default()
        };
        playback.navigation.all_episodes = "https://dramaqu.ad/show/".to_string();
        assert_eq!(score_record(&playback).score, 0.0);

        playback.streaming_servers.push(StreamingServer {
            name: "player.example".to_string(),
            url: "https://player.example/e/1".to_string(),
        });
        assert_eq!(score_record(&playback).score, 0.5);
    }

    #[test]
    fn home_pools_schedule_items() {
        let mut home = HomePage::default();
        home.top_ranked.push({
            let mut e = ongoing("Top", "t.jpg", None);
            e.kind = RecordKind::TopRanked;
            e.uploader = None;
            e.release = None;
            e.rating = Some("8.5".to_string());
            e.genres = Some(vec!["Drama".to_string()]);
            e
        });
        // A schedule entry with no cover drags the pooled score down.
        home.schedule.push(Weekday::Monday, {
            let mut e = ongoing("Sched", "", None);
            e.kind = RecordKind::Schedule;
            e
        });
        let c = score_home(&home);
        assert_eq!(c.score, 0.5);
        assert_eq!(c.message, "medium completeness");
    }
}
