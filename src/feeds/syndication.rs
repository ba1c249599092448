use super::{SourceQuery, TweetSource};
use crate::config::{Selector, Settings};
use crate::error::RetrievalError;
use crate::timeline_parser::parse_timeline;
use crate::tweet::TweetRecord;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Reads timelines from the widget syndication endpoint.
pub struct SyndicationSource {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    body: Option<String>,
}

impl SyndicationSource {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.base_url,
            Duration::from_secs(settings.timeout_secs),
            &settings.user_agent,
        )
    }

    /// Endpoint URL and query parameters for a selector.
    fn request_parts(&self, query: &SourceQuery) -> (String, Vec<(&'static str, String)>) {
        let mut params = vec![("dnt", "false".to_string())];
        let path = match &query.selector {
            Selector::Profile { screen_name } => {
                params.push(("screen_name", screen_name.clone()));
                "profile"
            }
            Selector::Likes { screen_name } => {
                params.push(("screen_name", screen_name.clone()));
                "likes"
            }
            Selector::List {
                screen_name,
                list_slug,
            } => {
                params.push(("list_slug", list_slug.clone()));
                params.push(("screen_name", screen_name.clone()));
                "list"
            }
        };
        params.push(("suppress_response_codes", "true".to_string()));
        params.push(("lang", query.lang.clone()));

        (format!("{}/timeline/{}", self.base_url, path), params)
    }
}

#[async_trait]
impl TweetSource for SyndicationSource {
    #[instrument(skip(self, query), fields(selector = %query.selector))]
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<TweetRecord>, RetrievalError> {
        let (url, params) = self.request_parts(query);
        debug!(%url, "requesting timeline");

        let response = self.client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response text".to_string());
            return Err(RetrievalError::Status { status, message });
        }

        let text = response.text().await?;
        let payload: TimelineResponse = serde_json::from_str(&text)?;
        let body = payload.body.ok_or_else(|| {
            RetrievalError::Malformed("response has no timeline body".to_string())
        })?;

        let tweets = parse_timeline(&body)?;
        debug!(parsed = tweets.len(), "timeline parsed");
        Ok(query.bound(tweets))
    }
}
