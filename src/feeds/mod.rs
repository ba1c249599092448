pub mod fixture;
pub mod syndication;

use crate::config::Selector;
use crate::error::RetrievalError;
use crate::tweet::TweetRecord;
use async_trait::async_trait;

/// What a [`TweetSource`] is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    pub selector: Selector,
    pub max_tweets: usize,
    pub lang: String,
    pub include_retweets: bool,
}

impl SourceQuery {
    /// Drop retweets if excluded, then keep at most `max_tweets`, in order.
    pub fn bound(&self, tweets: Vec<TweetRecord>) -> Vec<TweetRecord> {
        tweets
            .into_iter()
            .filter(|t| self.include_retweets || !t.is_retweet)
            .take(self.max_tweets)
            .collect()
    }
}

/// The remote data collaborator: returns an ordered list of at most
/// `max_tweets` records, or why it could not.
#[async_trait]
pub trait TweetSource: Send + Sync {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<TweetRecord>, RetrievalError>;
}

#[async_trait]
impl<T: TweetSource + ?Sized> TweetSource for std::sync::Arc<T> {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<TweetRecord>, RetrievalError> {
        (**self).fetch(query).await
    }
}

#[async_trait]
impl<T: TweetSource + ?Sized> TweetSource for Box<T> {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<TweetRecord>, RetrievalError> {
        (**self).fetch(query).await
    }
}
