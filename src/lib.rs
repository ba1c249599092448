//! Fetch Twitter widget timelines (a profile, a user's likes, or a list) and
//! render them as HTML into an output target, or hand them to a callback.
//!
//! ```no_run
//! use tweetfetch::{DirectorySink, FetchConfig, SyndicationSource, TwitterFetcher};
//! use std::time::Duration;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let source = SyndicationSource::new(
//!     "https://syndication.twitter.com",
//!     Duration::from_secs(20),
//!     "tweetfetch",
//! );
//! let fetcher = TwitterFetcher::new(source);
//! let sink = DirectorySink::new("tweets");
//!
//! let mut config = FetchConfig::profile("jason_mayes").with_dom_id("example1");
//! config.max_tweets = 1;
//! fetcher.fetch(config, &sink).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod feeds;
pub mod fetcher;
pub mod render;
pub mod sink;
pub mod timeline_parser;
pub mod tweet;

pub use config::{Config, DisplayOptions, FetchConfig, MaxTweetsPolicy, Selector, Settings};
pub use error::{ConfigurationError, FetchError, RetrievalError};
pub use feeds::fixture::FixtureSource;
pub use feeds::syndication::SyndicationSource;
pub use feeds::{SourceQuery, TweetSource};
pub use fetcher::{
    CustomCallback, DeliveredTo, FetchReport, FetchRequest, FetchResults, PreparedFetch,
    TwitterFetcher,
};
pub use render::DateFunction;
pub use sink::{DirectorySink, MemorySink, OutputSink};
pub use tweet::{Author, TweetLink, TweetRecord};
