// ABOUTME: Main library entry point for the dramaqu scrape pipeline.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, Options, the record types, Scored and ScrapeError.

//! dramaqu-scrape - turns dramaqu.ad pages into typed records with a
//! confidence score describing how complete each extraction was.
//!
//! Every fetching operation on [`Client`] has an offline counterpart in
//! [`records`] that works on HTML you already have.
//!
//! # Example
//!
//! ```no_run
//! use dramaqu_scrape::{Client, ScrapeError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ScrapeError> {
//!     let client = Client::builder().build();
//!     let listing = client.listing(1).await?;
//!     println!("{} titles, {}", listing.data.len(), listing.message);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod extractors;
pub mod model;
pub mod normalize;
pub mod options;
pub mod playback;
pub mod records;
pub mod resource;
pub mod score;

pub use crate::client::Client;
pub use crate::error::{ErrorCode, ScrapeError};
pub use crate::extractors::loader::load_builtin_rules;
pub use crate::extractors::rules::{
    FieldExtractor, RecordKind, RecordRules, RuleRegistry, SectionRule, SelectorSpec,
};
pub use crate::model::{
    DetailRecord, EpisodePlayback, HomePage, ListingEntry, ScheduleMap, Scored, Weekday,
};
pub use crate::options::{ClientBuilder, Options};
pub use crate::playback::{PlaybackOutcome, PlaybackState};
pub use crate::score::{Band, Confidence};

/// Result type alias for scrape operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;
