use super::{SourceQuery, TweetSource};
use crate::error::RetrievalError;
use crate::tweet::TweetRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Serves timelines from a JSON file instead of the network.
///
/// The file maps selector keys (`profile:NAME`, `likes:NAME`,
/// `list:NAME/SLUG`) to arrays of records. It is re-read on every fetch so
/// edits show up without restarting.
pub struct FixtureSource {
    path: PathBuf,
}

impl FixtureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TweetSource for FixtureSource {
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<TweetRecord>, RetrievalError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let mut timelines: HashMap<String, Vec<TweetRecord>> = serde_json::from_str(&content)?;

        let key = query.selector.to_string();
        let tweets = timelines
            .remove(&key)
            .ok_or(RetrievalError::NotFound(key))?;

        Ok(query.bound(tweets))
    }
}
