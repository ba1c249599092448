//! Validates a fetch request, retrieves the timeline and delivers it either
//! into an output target or to the caller's callback.

use crate::config::{DisplayOptions, FetchConfig, MaxTweetsPolicy};
use crate::error::{ConfigurationError, FetchError, RetrievalError};
use crate::feeds::{SourceQuery, TweetSource};
use crate::render::{empty_state, wrap_list, DateFunction, Renderer};
use crate::sink::OutputSink;
use crate::tweet::TweetRecord;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a custom callback receives.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResults {
    /// One rendered fragment per tweet
    Html(Vec<String>),
    /// The records themselves (`dataOnly`)
    Data(Vec<TweetRecord>),
}

impl FetchResults {
    pub fn len(&self) -> usize {
        match self {
            FetchResults::Html(fragments) => fragments.len(),
            FetchResults::Data(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receives the result set instead of the default rendering. Once set, the
/// caller owns presentation.
pub type CustomCallback = Box<dyn FnOnce(FetchResults) + Send>;

/// A [`FetchConfig`] plus the caller's injected functions.
pub struct FetchRequest {
    pub config: FetchConfig,
    pub date_function: Option<DateFunction>,
    pub custom_callback: Option<CustomCallback>,
}

impl FetchRequest {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            date_function: None,
            custom_callback: None,
        }
    }

    pub fn date_function<F>(mut self, f: F) -> Self
    where
        F: Fn(&chrono::DateTime<chrono::FixedOffset>, &str) -> String + Send + Sync + 'static,
    {
        self.date_function = Some(Arc::new(f));
        self
    }

    pub fn custom_callback<F>(mut self, f: F) -> Self
    where
        F: FnOnce(FetchResults) + Send + 'static,
    {
        self.custom_callback = Some(Box::new(f));
        self
    }
}

impl From<FetchConfig> for FetchRequest {
    fn from(config: FetchConfig) -> Self {
        Self::new(config)
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("config", &self.config)
            .field("date_function", &self.date_function.is_some())
            .field("custom_callback", &self.custom_callback.is_some())
            .finish()
    }
}

enum Delivery {
    Target(String),
    Callback {
        callback: CustomCallback,
        data_only: bool,
    },
}

/// A request that passed validation. Nothing has been retrieved yet.
pub struct PreparedFetch {
    query: SourceQuery,
    display: DisplayOptions,
    date_function: Option<DateFunction>,
    delivery: Delivery,
}

impl PreparedFetch {
    pub fn query(&self) -> &SourceQuery {
        &self.query
    }
}

/// Where the results of a fetch went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveredTo {
    Target(String),
    Callback,
}

#[derive(Debug)]
pub struct FetchReport {
    pub delivered_to: DeliveredTo,
    /// Number of tweets delivered
    pub count: usize,
    /// Set when retrieval failed and an empty result was delivered instead
    pub retrieval_error: Option<RetrievalError>,
}

pub struct TwitterFetcher<S> {
    source: S,
    policy: MaxTweetsPolicy,
}

impl<S: TweetSource> TwitterFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            policy: MaxTweetsPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MaxTweetsPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Normalize and validate a request without touching the network.
    pub fn prepare(
        &self,
        request: FetchRequest,
        sink: &dyn OutputSink,
    ) -> Result<PreparedFetch, ConfigurationError> {
        let FetchRequest {
            config,
            date_function,
            custom_callback,
        } = request;

        let selector = config.selector()?;
        let max_tweets = self.policy.apply(config.max_tweets)?;

        let delivery = match custom_callback {
            Some(callback) => Delivery::Callback {
                callback,
                data_only: config.data_only,
            },
            None => {
                let dom_id = config
                    .dom_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .ok_or(ConfigurationError::MissingOutputTarget)?;
                if !sink.has_target(dom_id) {
                    return Err(ConfigurationError::UnknownOutputTarget(dom_id.to_string()));
                }
                Delivery::Target(dom_id.to_string())
            }
        };

        let lang = match config.lang.trim() {
            "" => "en".to_string(),
            lang => lang.to_string(),
        };

        Ok(PreparedFetch {
            query: SourceQuery {
                selector,
                max_tweets: max_tweets as usize,
                lang,
                include_retweets: config.show_retweet,
            },
            display: config.display_options(),
            date_function,
            delivery,
        })
    }

    /// Retrieve and deliver a prepared request. Invokes the callback or
    /// replaces the target exactly once.
    pub async fn execute(
        &self,
        prepared: PreparedFetch,
        sink: &dyn OutputSink,
    ) -> Result<FetchReport, FetchError> {
        let PreparedFetch {
            query,
            display,
            date_function,
            delivery,
        } = prepared;

        debug!(selector = %query.selector, max_tweets = query.max_tweets, "fetching timeline");

        let (tweets, retrieval_error) = match self.source.fetch(&query).await {
            // sources are not trusted to honor the bound
            Ok(tweets) => (query.bound(tweets), None),
            Err(e) => {
                warn!(selector = %query.selector, error = %e, "timeline retrieval failed");
                (Vec::new(), Some(e))
            }
        };
        let count = tweets.len();
        let renderer = Renderer::new(display, date_function.as_ref());

        let delivered_to = match delivery {
            Delivery::Callback {
                callback,
                data_only,
            } => {
                let results = if data_only {
                    FetchResults::Data(tweets)
                } else {
                    FetchResults::Html(renderer.render_all(&tweets))
                };
                callback(results);
                DeliveredTo::Callback
            }
            Delivery::Target(dom_id) => {
                let html = if retrieval_error.is_some() {
                    empty_state()
                } else {
                    wrap_list(&renderer.render_all(&tweets))
                };
                sink.replace(&dom_id, &html)
                    .map_err(|source| FetchError::Output {
                        dom_id: dom_id.clone(),
                        source,
                    })?;
                DeliveredTo::Target(dom_id)
            }
        };

        info!(selector = %query.selector, count, ?delivered_to, "timeline delivered");

        Ok(FetchReport {
            delivered_to,
            count,
            retrieval_error,
        })
    }

    /// Validate, retrieve and deliver. Configuration errors come back before
    /// any retrieval is attempted; retrieval errors never come back as `Err`.
    pub async fn fetch(
        &self,
        request: impl Into<FetchRequest>,
        sink: &dyn OutputSink,
    ) -> Result<FetchReport, FetchError> {
        let prepared = self.prepare(request.into(), sink)?;
        self.execute(prepared, sink).await
    }
}
