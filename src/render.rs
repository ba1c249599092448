//! Turns [`TweetRecord`]s into the widget's HTML fragments.

use crate::config::DisplayOptions;
use crate::tweet::{TweetLink, TweetRecord};
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

const TWITTER_BASE: &str = "https://twitter.com";

/// Maps a tweet timestamp (plus the source's display string) to the text shown.
pub type DateFunction = Arc<dyn Fn(&DateTime<FixedOffset>, &str) -> String + Send + Sync>;

/// Formatter used when there is neither a [`DateFunction`] nor a display
/// string from the source.
pub fn default_date_format(timestamp: &DateTime<FixedOffset>) -> String {
    format!("Posted on {}", timestamp.format("%b %-d, %Y"))
}

pub struct Renderer<'a> {
    options: DisplayOptions,
    date_function: Option<&'a DateFunction>,
}

impl<'a> Renderer<'a> {
    pub fn new(options: DisplayOptions, date_function: Option<&'a DateFunction>) -> Self {
        Self {
            options,
            date_function,
        }
    }

    /// Render a single record as one fragment.
    pub fn render_tweet(&self, record: &TweetRecord) -> String {
        let mut html = String::new();

        if self.options.show_user && !record.author.screen_name.is_empty() {
            html.push_str(&self.render_user(record));
        }

        html.push_str("<p class=\"tweet\">");
        if self.options.enable_links {
            html.push_str(&link_text(
                &record.tweet,
                &record.links,
                self.target_attr(),
            ));
        } else {
            html.push_str(&escape_html(&record.tweet));
        }
        html.push_str("</p>");

        if self.options.show_time {
            html.push_str(&self.render_time(record));
        }

        if self.options.show_interaction {
            html.push_str(&self.render_interaction(record));
        }

        if self.options.show_images {
            if let Some(image) = &record.image {
                html.push_str(&format!(
                    "<div class=\"media\"><img src=\"{}\" alt=\"Image from tweet\" /></div>",
                    escape_html(image)
                ));
            }
        }

        html
    }

    pub fn render_all(&self, records: &[TweetRecord]) -> Vec<String> {
        records.iter().map(|r| self.render_tweet(r)).collect()
    }

    fn target_attr(&self) -> &'static str {
        if self.options.links_in_new_window {
            " target=\"_blank\" rel=\"noopener\""
        } else {
            ""
        }
    }

    fn render_user(&self, record: &TweetRecord) -> String {
        let author = &record.author;
        let avatar = author
            .profile_image
            .as_deref()
            .map(|src| format!("<img src=\"{}\" alt=\"\" />", escape_html(src)))
            .unwrap_or_default();
        format!(
            "<div class=\"user\"><a href=\"{}\"{}>{}<span class=\"name\">{}</span><span class=\"screen-name\">@{}</span></a></div>",
            escape_html(&author.profile_url),
            self.target_attr(),
            avatar,
            escape_html(&author.name),
            escape_html(&author.screen_name),
        )
    }

    fn render_time(&self, record: &TweetRecord) -> String {
        let text = match self.date_function {
            Some(date_function) => date_function(&record.timestamp, &record.time),
            // the source's string is already in the requested language
            None if !record.time.trim().is_empty() => record.time.clone(),
            None => default_date_format(&record.timestamp),
        };
        let text = escape_html(&text);

        if self.options.show_permalinks {
            format!(
                "<p class=\"timePosted\"><a href=\"{}\"{}>{}</a></p>",
                escape_html(&record.permalink_url),
                self.target_attr(),
                text
            )
        } else {
            format!("<p class=\"timePosted\">{}</p>", text)
        }
    }

    fn render_interaction(&self, record: &TweetRecord) -> String {
        let id = urlencoding::encode(&record.tweet_id);
        let target = self.target_attr();
        format!(
            "<p class=\"interact\">\
             <a href=\"{base}/intent/tweet?in_reply_to={id}\" class=\"twitter_reply_icon\"{target}>Reply</a>\
             <a href=\"{base}/intent/retweet?tweet_id={id}\" class=\"twitter_retweet_icon\"{target}>Retweet</a>\
             <a href=\"{base}/intent/favorite?tweet_id={id}\" class=\"twitter_fav_icon\"{target}>Favorite</a>\
             </p>",
            base = TWITTER_BASE,
        )
    }
}

/// Wrap rendered fragments the way the widget writes them into its element.
pub fn wrap_list(fragments: &[String]) -> String {
    let mut html = String::from("<ul>");
    for fragment in fragments {
        html.push_str("<li>");
        html.push_str(fragment);
        html.push_str("</li>");
    }
    html.push_str("</ul>");
    html
}

/// Written in place of the list when the timeline could not be retrieved.
pub fn empty_state() -> String {
    "<p class=\"tweets-unavailable\">Tweets are unavailable right now.</p>".to_string()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Like [`linkify`], but first restores the anchors the tweet carried in its
/// own markup, matched by their text in order.
pub fn link_text(text: &str, links: &[TweetLink], target_attr: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut rest = text;

    for link in links {
        if link.text.is_empty() || link.url.is_empty() {
            continue;
        }
        let Some(pos) = rest.find(&link.text) else {
            continue;
        };
        out.push_str(&linkify(&rest[..pos], target_attr));
        out.push_str(&format!(
            "<a href=\"{}\"{}>{}</a>",
            escape_html(&link.url),
            target_attr,
            escape_html(&link.text)
        ));
        rest = &rest[pos + link.text.len()..];
    }
    out.push_str(&linkify(rest, target_attr));

    out
}

/// Escape `text` and turn URLs, #hashtags and @mentions into anchors.
pub fn linkify(text: &str, target_attr: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut word_start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                out.push_str(&link_word(&text[start..i], target_attr));
            }
            out.push(c);
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(start) = word_start {
        out.push_str(&link_word(&text[start..], target_attr));
    }

    out
}

fn link_word(word: &str, target_attr: &str) -> String {
    if word.starts_with("http://") || word.starts_with("https://") {
        let url = word.trim_end_matches(|c: char| ".,;:!?)\"'".contains(c));
        let rest = &word[url.len()..];
        return format!(
            "<a href=\"{}\"{}>{}</a>{}",
            escape_html(url),
            target_attr,
            escape_html(url),
            escape_html(rest)
        );
    }

    if let Some((prefix, tag)) = word.split_at_checked(1) {
        let tag_len = tag
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(tag.len());
        if tag_len > 0 {
            let (name, rest) = tag.split_at(tag_len);
            let href = match prefix {
                "#" => Some(format!(
                    "{}/hashtag/{}?src=hash",
                    TWITTER_BASE,
                    urlencoding::encode(name)
                )),
                "@" if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                    Some(format!("{}/{}", TWITTER_BASE, name))
                }
                _ => None,
            };
            if let Some(href) = href {
                return format!(
                    "<a href=\"{}\"{}>{}{}</a>{}",
                    escape_html(&href),
                    target_attr,
                    prefix,
                    escape_html(name),
                    escape_html(rest)
                );
            }
        }
    }

    escape_html(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tweet::Author;

    fn record() -> TweetRecord {
        TweetRecord {
            tweet_id: "42".to_string(),
            author: Author {
                name: "Jason Mayes".to_string(),
                screen_name: "jason_mayes".to_string(),
                profile_url: "https://twitter.com/jason_mayes".to_string(),
                profile_image: Some("https://pbs.twimg.com/a.jpg".to_string()),
            },
            tweet: "New demo at https://example.com/demo. #webgl by @someone <3".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2018-03-04T12:00:00+00:00").unwrap(),
            time: "Mar 4, 2018".to_string(),
            permalink_url: "https://twitter.com/jason_mayes/status/42".to_string(),
            image: Some("https://pbs.twimg.com/media/x.jpg".to_string()),
            is_retweet: false,
            links: Vec::new(),
        }
    }

    #[test]
    fn test_default_date_format() {
        let ts = DateTime::parse_from_rfc3339("2018-03-04T12:00:00+00:00").unwrap();
        assert_eq!(default_date_format(&ts), "Posted on Mar 4, 2018");
    }

    #[test]
    fn test_render_with_defaults() {
        let html = Renderer::new(DisplayOptions::default(), None).render_tweet(&record());

        assert!(html.starts_with("<div class=\"user\">"));
        assert!(html.contains("<span class=\"screen-name\">@jason_mayes</span>"));
        assert!(html.contains(
            "<a href=\"https://example.com/demo\" target=\"_blank\" rel=\"noopener\">https://example.com/demo</a>."
        ));
        assert!(html.contains("href=\"https://twitter.com/hashtag/webgl?src=hash\""));
        assert!(html.contains("href=\"https://twitter.com/someone\""));
        assert!(html.contains("&lt;3"));
        assert!(html.contains(
            "<p class=\"timePosted\"><a href=\"https://twitter.com/jason_mayes/status/42\" target=\"_blank\" rel=\"noopener\">Mar 4, 2018</a></p>"
        ));
        assert!(html.contains("intent/tweet?in_reply_to=42"));
        // images are opt-in
        assert!(!html.contains("class=\"media\""));
    }

    #[test]
    fn test_render_with_everything_off() {
        let options = DisplayOptions {
            enable_links: false,
            show_user: false,
            show_time: false,
            show_interaction: false,
            show_images: false,
            links_in_new_window: false,
            show_permalinks: false,
        };
        let html = Renderer::new(options, None).render_tweet(&record());
        assert_eq!(
            html,
            "<p class=\"tweet\">New demo at https://example.com/demo. #webgl by @someone &lt;3</p>"
        );
    }

    #[test]
    fn test_time_without_permalink_uses_date_function() {
        let options = DisplayOptions {
            show_permalinks: false,
            ..DisplayOptions::default()
        };
        let date_fn: DateFunction =
            Arc::new(|ts: &DateTime<FixedOffset>, raw: &str| {
                format!("{} ({})", ts.format("%Y-%m-%d"), raw)
            });
        let html = Renderer::new(options, Some(&date_fn)).render_tweet(&record());
        assert!(html.contains("<p class=\"timePosted\">2018-03-04 (Mar 4, 2018)</p>"));
    }

    #[test]
    fn test_same_window_links_have_no_target() {
        let options = DisplayOptions {
            links_in_new_window: false,
            ..DisplayOptions::default()
        };
        let html = Renderer::new(options, None).render_tweet(&record());
        assert!(!html.contains("_blank"));
    }

    #[test]
    fn test_images_when_enabled() {
        let options = DisplayOptions {
            show_images: true,
            ..DisplayOptions::default()
        };
        let html = Renderer::new(options, None).render_tweet(&record());
        assert!(html.ends_with(
            "<div class=\"media\"><img src=\"https://pbs.twimg.com/media/x.jpg\" alt=\"Image from tweet\" /></div>"
        ));
    }

    #[test]
    fn test_localized_time_string_is_kept() {
        let mut tweet = record();
        tweet.time = "4 mars 2018".to_string();
        let html = Renderer::new(DisplayOptions::default(), None).render_tweet(&tweet);
        assert!(html.contains("rel=\"noopener\">4 mars 2018</a></p>"));
        assert!(!html.contains("Posted on"));
    }

    #[test]
    fn test_empty_time_string_falls_back_to_default_format() {
        let mut tweet = record();
        tweet.time = String::new();
        let html = Renderer::new(DisplayOptions::default(), None).render_tweet(&tweet);
        assert!(html.contains(">Posted on Mar 4, 2018</a></p>"));
    }

    #[test]
    fn test_user_block_omitted_without_screen_name() {
        let mut tweet = record();
        tweet.author.screen_name = String::new();
        let html = Renderer::new(DisplayOptions::default(), None).render_tweet(&tweet);
        assert!(!html.contains("class=\"user\""));
    }

    #[test]
    fn test_source_links_are_restored() {
        let links = vec![
            TweetLink {
                text: "example.com/post".to_string(),
                url: "https://example.com/post".to_string(),
            },
            TweetLink {
                text: "pic.twitter.com/xyz".to_string(),
                url: "https://twitter.com/a/status/1/photo/1".to_string(),
            },
        ];
        let html = link_text(
            "Read example.com/post now #rust pic.twitter.com/xyz",
            &links,
            "",
        );
        assert_eq!(
            html,
            "Read <a href=\"https://example.com/post\">example.com/post</a> now \
             <a href=\"https://twitter.com/hashtag/rust?src=hash\">#rust</a> \
             <a href=\"https://twitter.com/a/status/1/photo/1\">pic.twitter.com/xyz</a>"
        );
    }

    #[test]
    fn test_unmatched_link_is_ignored() {
        let links = vec![TweetLink {
            text: "gone.example".to_string(),
            url: "https://gone.example".to_string(),
        }];
        assert_eq!(link_text("a & b", &links, ""), "a &amp; b");
    }

    #[test]
    fn test_linkify_leaves_bare_symbols() {
        assert_eq!(linkify("# @ a&b", ""), "# @ a&amp;b");
    }

    #[test]
    fn test_linkify_mention_with_trailing_punctuation() {
        assert_eq!(
            linkify("thanks @jason_mayes!", ""),
            "thanks <a href=\"https://twitter.com/jason_mayes\">@jason_mayes</a>!"
        );
    }

    #[test]
    fn test_wrap_list() {
        let html = wrap_list(&["a".to_string(), "b".to_string()]);
        assert_eq!(html, "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(wrap_list(&[]), "<ul></ul>");
    }
}
