use crate::error::ConfigurationError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const MIN_TWEETS: u8 = 1;
pub const MAX_TWEETS: u8 = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default, rename = "fetch")]
    pub fetches: Vec<FetchConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub max_tweets_policy: MaxTweetsPolicy,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Serve timelines from this JSON file instead of the network
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_tweets_policy: MaxTweetsPolicy::default(),
            output_dir: default_output_dir(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            fixture: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("tweets")
}

fn default_base_url() -> String {
    "https://syndication.twitter.com".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_user_agent() -> String {
    format!("tweetfetch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

fn default_max_tweets() -> i64 {
    MAX_TWEETS as i64
}

fn default_lang() -> String {
    "en".to_string()
}

/// What to do with a `maxTweets` outside [1, 20].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxTweetsPolicy {
    #[default]
    Clamp,
    Reject,
}

impl MaxTweetsPolicy {
    pub fn apply(self, requested: i64) -> Result<u8, ConfigurationError> {
        let (min, max) = (MIN_TWEETS as i64, MAX_TWEETS as i64);
        match self {
            MaxTweetsPolicy::Clamp => Ok(requested.clamp(min, max) as u8),
            MaxTweetsPolicy::Reject if (min..=max).contains(&requested) => Ok(requested as u8),
            MaxTweetsPolicy::Reject => Err(ConfigurationError::MaxTweetsOutOfRange(requested)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenNameRef {
    pub screen_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRef {
    pub list_slug: String,
    pub screen_name: String,
}

/// The data half of a fetch request, in the widget's camelCase keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ScreenNameRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<ScreenNameRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_id: Option<String>,
    #[serde(default = "default_max_tweets")]
    pub max_tweets: i64,
    #[serde(default = "default_true")]
    pub enable_links: bool,
    #[serde(default = "default_true")]
    pub show_user: bool,
    #[serde(default = "default_true")]
    pub show_time: bool,
    #[serde(default = "default_true")]
    pub show_retweet: bool,
    #[serde(default = "default_true")]
    pub show_interaction: bool,
    #[serde(default)]
    pub show_images: bool,
    #[serde(default = "default_true")]
    pub links_in_new_window: bool,
    #[serde(default = "default_true")]
    pub show_permalinks: bool,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default)]
    pub data_only: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            profile: None,
            likes: None,
            list: None,
            dom_id: None,
            max_tweets: default_max_tweets(),
            enable_links: true,
            show_user: true,
            show_time: true,
            show_retweet: true,
            show_interaction: true,
            show_images: false,
            links_in_new_window: true,
            show_permalinks: true,
            lang: default_lang(),
            data_only: false,
        }
    }
}

impl FetchConfig {
    pub fn profile(screen_name: impl Into<String>) -> Self {
        Self {
            profile: Some(ScreenNameRef {
                screen_name: screen_name.into(),
            }),
            ..Self::default()
        }
    }

    pub fn likes(screen_name: impl Into<String>) -> Self {
        Self {
            likes: Some(ScreenNameRef {
                screen_name: screen_name.into(),
            }),
            ..Self::default()
        }
    }

    pub fn list(screen_name: impl Into<String>, list_slug: impl Into<String>) -> Self {
        Self {
            list: Some(ListRef {
                list_slug: list_slug.into(),
                screen_name: screen_name.into(),
            }),
            ..Self::default()
        }
    }

    pub fn with_dom_id(mut self, dom_id: impl Into<String>) -> Self {
        self.dom_id = Some(dom_id.into());
        self
    }

    /// Resolves the three optional selector fields into exactly one [`Selector`].
    pub fn selector(&self) -> Result<Selector, ConfigurationError> {
        let mut present = Vec::new();
        if self.profile.is_some() {
            present.push("profile");
        }
        if self.likes.is_some() {
            present.push("likes");
        }
        if self.list.is_some() {
            present.push("list");
        }
        if present.len() > 1 {
            return Err(ConfigurationError::MultipleSelectors(present));
        }

        let selector = if let Some(profile) = &self.profile {
            Selector::Profile {
                screen_name: non_empty("profile", "screenName", &profile.screen_name)?,
            }
        } else if let Some(likes) = &self.likes {
            Selector::Likes {
                screen_name: non_empty("likes", "screenName", &likes.screen_name)?,
            }
        } else if let Some(list) = &self.list {
            Selector::List {
                screen_name: non_empty("list", "screenName", &list.screen_name)?,
                list_slug: non_empty("list", "listSlug", &list.list_slug)?,
            }
        } else {
            return Err(ConfigurationError::MissingSelector);
        };
        Ok(selector)
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            enable_links: self.enable_links,
            show_user: self.show_user,
            show_time: self.show_time,
            show_interaction: self.show_interaction,
            show_images: self.show_images,
            links_in_new_window: self.links_in_new_window,
            show_permalinks: self.show_permalinks,
        }
    }
}

fn non_empty(
    selector: &'static str,
    field: &'static str,
    value: &str,
) -> Result<String, ConfigurationError> {
    let value = value.trim().trim_start_matches('@');
    if value.is_empty() {
        Err(ConfigurationError::EmptyField { selector, field })
    } else {
        Ok(value.to_string())
    }
}

/// What remote content to retrieve.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Profile { screen_name: String },
    Likes { screen_name: String },
    List { screen_name: String, list_slug: String },
}

impl Selector {
    pub fn kind(&self) -> &'static str {
        match self {
            Selector::Profile { .. } => "profile",
            Selector::Likes { .. } => "likes",
            Selector::List { .. } => "list",
        }
    }

    pub fn screen_name(&self) -> &str {
        match self {
            Selector::Profile { screen_name }
            | Selector::Likes { screen_name }
            | Selector::List { screen_name, .. } => screen_name,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Profile { screen_name } => write!(f, "profile:{}", screen_name),
            Selector::Likes { screen_name } => write!(f, "likes:{}", screen_name),
            Selector::List {
                screen_name,
                list_slug,
            } => write!(f, "list:{}/{}", screen_name, list_slug),
        }
    }
}

/// Flags that only affect how a record is turned into HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub enable_links: bool,
    pub show_user: bool,
    pub show_time: bool,
    pub show_interaction: bool,
    pub show_images: bool,
    pub links_in_new_window: bool,
    pub show_permalinks: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        FetchConfig::default().display_options()
    }
}

impl Config {
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path,
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !config_path.exists() {
            tracing::info!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        Self::from_file(&config_path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tweetfetch").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_widget_documentation() {
        let config: FetchConfig = toml::from_str(
            r#"
            domId = "example2"
            likes = { screenName = "jason_mayes" }
            "#,
        )
        .unwrap();

        assert_eq!(config.max_tweets, 20);
        assert_eq!(config.lang, "en");
        assert!(config.enable_links);
        assert!(config.show_retweet);
        assert!(config.links_in_new_window);
        assert!(!config.show_images);
        assert!(!config.data_only);
        assert_eq!(config.dom_id.as_deref(), Some("example2"));
    }

    #[test]
    fn test_selector_profile() {
        let config = FetchConfig::profile("jason_mayes");
        assert_eq!(
            config.selector(),
            Ok(Selector::Profile {
                screen_name: "jason_mayes".to_string()
            })
        );
    }

    #[test]
    fn test_selector_strips_at_sign() {
        let config = FetchConfig::likes("@jason_mayes");
        assert_eq!(config.selector().unwrap().screen_name(), "jason_mayes");
    }

    #[test]
    fn test_selector_missing() {
        let config = FetchConfig::default();
        assert_eq!(config.selector(), Err(ConfigurationError::MissingSelector));
    }

    #[test]
    fn test_selector_multiple() {
        let mut config = FetchConfig::profile("jason_mayes");
        config.likes = Some(ScreenNameRef {
            screen_name: "jason_mayes".to_string(),
        });
        assert_eq!(
            config.selector(),
            Err(ConfigurationError::MultipleSelectors(vec![
                "profile", "likes"
            ]))
        );
    }

    #[test]
    fn test_selector_empty_list_slug() {
        let config = FetchConfig::list("jason_mayes", "  ");
        assert_eq!(
            config.selector(),
            Err(ConfigurationError::EmptyField {
                selector: "list",
                field: "listSlug"
            })
        );
    }

    #[test]
    fn test_selector_display() {
        let selector = FetchConfig::list("jason_mayes", "inspiration")
            .selector()
            .unwrap();
        assert_eq!(selector.to_string(), "list:jason_mayes/inspiration");
        assert_eq!(selector.kind(), "list");
    }

    #[test]
    fn test_clamp_policy() {
        let policy = MaxTweetsPolicy::Clamp;
        assert_eq!(policy.apply(0), Ok(1));
        assert_eq!(policy.apply(-5), Ok(1));
        assert_eq!(policy.apply(7), Ok(7));
        assert_eq!(policy.apply(50), Ok(20));
    }

    #[test]
    fn test_reject_policy() {
        let policy = MaxTweetsPolicy::Reject;
        assert_eq!(policy.apply(1), Ok(1));
        assert_eq!(policy.apply(20), Ok(20));
        assert_eq!(
            policy.apply(0),
            Err(ConfigurationError::MaxTweetsOutOfRange(0))
        );
        assert_eq!(
            policy.apply(50),
            Err(ConfigurationError::MaxTweetsOutOfRange(50))
        );
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [settings]
            max_tweets_policy = "reject"
            output_dir = "public/tweets"
            timeout_secs = 5

            [[fetch]]
            domId = "example1"
            maxTweets = 1
            showUser = false
            showRetweet = false
            profile = { screenName = "jason_mayes" }

            [[fetch]]
            dataOnly = true
            list = { listSlug = "inspiration", screenName = "jason_mayes" }
            "#,
        )
        .unwrap();

        assert_eq!(config.settings.max_tweets_policy, MaxTweetsPolicy::Reject);
        assert_eq!(config.settings.output_dir, PathBuf::from("public/tweets"));
        assert_eq!(config.settings.timeout_secs, 5);
        assert_eq!(config.settings.base_url, "https://syndication.twitter.com");
        assert_eq!(config.fetches.len(), 2);
        assert_eq!(config.fetches[0].max_tweets, 1);
        assert!(!config.fetches[0].show_user);
        assert!(config.fetches[1].data_only);
        assert_eq!(config.fetches[1].dom_id, None);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("absent.toml"))).unwrap();
        assert!(config.fetches.is_empty());
        assert_eq!(config.settings.max_tweets_policy, MaxTweetsPolicy::Clamp);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[[fetch]]\nmaxTweets = \"many\"\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
