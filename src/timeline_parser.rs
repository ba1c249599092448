use crate::error::RetrievalError;
use crate::tweet::{Author, TweetLink, TweetRecord};
use chrono::{DateTime, FixedOffset};
use scraper::{ElementRef, Html, Selector};

const TWITTER_BASE: &str = "https://twitter.com";

/// Parse the timeline HTML the syndication endpoint embeds in its `body`.
///
/// Expected layout (one block per tweet):
/// ```text
/// <li class="timeline-TweetList-tweet">
///   <div class="timeline-Tweet" data-tweet-id="..">
///     <div class="timeline-Tweet-retweetCredit">..</div>          (retweets only)
///     <a class="TweetAuthor-link" href=".."><img class="Avatar" src="..">
///       <span class="TweetAuthor-name">..</span>
///       <span class="TweetAuthor-screenName">@..</span></a>
///     <p class="timeline-Tweet-text">..</p>
///     <div class="timeline-Tweet-media"><img data-image=".." src=".."></div>
///     <a class="timeline-Tweet-timestamp" href="permalink">
///       <time class="dt-updated" datetime="2018-03-04T12:00:00+0000">Mar 4, 2018</time></a>
/// ```
/// Tweets missing an id, timestamp, permalink or author screen name are
/// skipped. A body with no
/// timeline container at all is malformed.
pub fn parse_timeline(body: &str) -> Result<Vec<TweetRecord>, RetrievalError> {
    let document = Html::parse_document(body);

    let tweet_selector = selector(".timeline-Tweet")?;
    let container_selector = selector(".timeline-TweetList, .timeline-Tweet, .timeline-Body")?;

    if document.select(&container_selector).next().is_none() {
        return Err(RetrievalError::Malformed(
            "response body contains no timeline".to_string(),
        ));
    }

    let mut tweets = Vec::new();
    for element in document.select(&tweet_selector) {
        match parse_tweet(element)? {
            Some(tweet) => tweets.push(tweet),
            None => tracing::debug!("skipping incomplete tweet block"),
        }
    }

    Ok(tweets)
}

fn parse_tweet(element: ElementRef<'_>) -> Result<Option<TweetRecord>, RetrievalError> {
    let Some(tweet_id) = element
        .value()
        .attr("data-tweet-id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        return Ok(None);
    };

    let time_el = first(element, "time.dt-updated, time")?;
    let Some(timestamp) = time_el
        .and_then(|t| t.value().attr("datetime"))
        .and_then(parse_timestamp)
    else {
        return Ok(None);
    };
    let time = time_el.map(element_text).unwrap_or_default();

    let Some(permalink_url) = first(element, "a.timeline-Tweet-timestamp")?
        .and_then(|a| a.value().attr("href"))
        .map(absolute_url)
    else {
        return Ok(None);
    };

    let screen_name = first(element, ".TweetAuthor-screenName")?
        .map(element_text)
        .map(|s| s.trim_start_matches('@').to_string())
        .unwrap_or_default();
    if screen_name.is_empty() {
        return Ok(None);
    }
    let name = first(element, ".TweetAuthor-name")?
        .map(element_text)
        .unwrap_or_else(|| screen_name.clone());
    let profile_url = first(element, "a.TweetAuthor-link")?
        .and_then(|a| a.value().attr("href"))
        .map(absolute_url)
        .unwrap_or_else(|| format!("{}/{}", TWITTER_BASE, screen_name));
    let profile_image = first(element, "img.Avatar")?
        .and_then(|img| img.value().attr("data-src-1x").or(img.value().attr("src")))
        .map(str::to_string);

    let text_el = first(element, ".timeline-Tweet-text")?;
    let tweet = text_el.map(element_text).unwrap_or_default();
    let links = match text_el {
        Some(text_el) => tweet_links(text_el)?,
        None => Vec::new(),
    };

    let image = first(element, ".timeline-Tweet-media img")?.and_then(|img| {
        img.value()
            .attr("data-image")
            .map(|base| format!("{}?format=jpg&name=small", base))
            .or_else(|| img.value().attr("src").map(str::to_string))
    });

    let is_retweet = first(element, ".timeline-Tweet-retweetCredit")?.is_some();

    Ok(Some(TweetRecord {
        tweet_id: tweet_id.to_string(),
        author: Author {
            name,
            screen_name,
            profile_url,
            profile_image,
        },
        tweet,
        timestamp,
        time,
        permalink_url,
        image,
        is_retweet,
        links,
    }))
}

/// Anchors inside the tweet text. Shortened `t.co` hrefs are replaced by
/// `data-expanded-url` when the markup carries it.
fn tweet_links(text_el: ElementRef<'_>) -> Result<Vec<TweetLink>, RetrievalError> {
    let anchor = selector("a[href]")?;
    let links = text_el
        .select(&anchor)
        .filter_map(|a| {
            let url = a
                .value()
                .attr("data-expanded-url")
                .or_else(|| a.value().attr("href"))
                .map(str::trim)
                .filter(|url| !url.is_empty())?;
            let text = element_text(a);
            if text.is_empty() {
                return None;
            }
            Some(TweetLink {
                text,
                url: absolute_url(url),
            })
        })
        .collect();
    Ok(links)
}

fn selector(css: &str) -> Result<Selector, RetrievalError> {
    Selector::parse(css)
        .map_err(|e| RetrievalError::Malformed(format!("bad selector {}: {:?}", css, e)))
}

fn first<'a>(
    element: ElementRef<'a>,
    css: &str,
) -> Result<Option<ElementRef<'a>>, RetrievalError> {
    Ok(element.select(&selector(css)?).next())
}

/// Inner text with runs of whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}

fn absolute_url(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        format!("{}/{}", TWITTER_BASE, href.trim_start_matches('/'))
    }
}
