use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    pub screen_name: String,
    pub profile_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

/// An anchor from the tweet's own markup: the text shown and where it points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetLink {
    pub text: String,
    pub url: String,
}

/// One retrieved tweet, as handed to the renderer or to a data-only callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetRecord {
    pub tweet_id: String,
    pub author: Author,
    /// Plain tweet text
    pub tweet: String,
    pub timestamp: DateTime<FixedOffset>,
    /// The source's own display string for `timestamp`
    pub time: String,
    #[serde(rename = "permalinkURL")]
    pub permalink_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub is_retweet: bool,
    /// Links found in the tweet text, in order of appearance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<TweetLink>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_widget_field_names() {
        let record = TweetRecord {
            tweet_id: "1".to_string(),
            author: Author {
                name: "Jason Mayes".to_string(),
                screen_name: "jason_mayes".to_string(),
                profile_url: "https://twitter.com/jason_mayes".to_string(),
                profile_image: None,
            },
            tweet: "hello".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2018-03-04T12:00:00+00:00").unwrap(),
            time: "Mar 4, 2018".to_string(),
            permalink_url: "https://twitter.com/jason_mayes/status/1".to_string(),
            image: None,
            is_retweet: false,
            links: Vec::new(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["permalinkURL"], "https://twitter.com/jason_mayes/status/1");
        assert_eq!(json["author"]["screenName"], "jason_mayes");
        assert_eq!(json["isRetweet"], false);
        assert!(json.get("image").is_none());
        assert!(json.get("links").is_none());
    }
}
