//! Embeddable timeline: a JSON envelope around an HTML fragment.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use super::Page;
use crate::tweet::{Photo, Tweet};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SyndicationPage {
    body: String,
}

impl SyndicationPage {
    /// Tweets in document order. The cursor is the last id minus one, as
    /// `max_position` is inclusive.
    pub fn parse_tweets(&self) -> Page<Tweet> {
        static TWEET_SELECTOR: Lazy<Selector> =
            Lazy::new(|| Selector::parse(".timeline-Tweet").unwrap());

        let document = Html::parse_fragment(&self.body);
        let items: Vec<Tweet> = document
            .select(&TWEET_SELECTOR)
            .filter_map(|element| parse_tweet(&element))
            .collect();

        let cursor = items
            .last()
            .and_then(|t| t.id.parse::<u64>().ok())
            .map(|id| id.saturating_sub(1).to_string())
            .unwrap_or_default();

        Page { items, cursor }
    }
}

fn parse_tweet(element: &ElementRef) -> Option<Tweet> {
    let id = element.value().attr("data-tweet-id")?.to_owned();
    let username = parse_tweet_screen_name(element);
    let (text, html) = parse_tweet_body(element);
    let time_parsed = parse_tweet_time(element);

    Some(Tweet {
        permanent_url: format!("https://twitter.com/{username}/status/{id}"),
        conversation_id: id.clone(),
        id,
        name: parse_tweet_author_name(element),
        username,
        text,
        html,
        timestamp: time_parsed.map(|t| t.unix_timestamp()).unwrap_or_default(),
        time_parsed,
        is_retweet: parse_tweet_retweet(element),
        hashtags: parse_tweet_hashtags(element),
        urls: parse_tweet_urls(element),
        photos: parse_tweet_photos(element),
        ..Default::default()
    })
}

fn parse_tweet_screen_name(element: &ElementRef) -> String {
    static SCREEN_NAME_SELECTOR: Lazy<Selector> =
        Lazy::new(|| Selector::parse(".TweetAuthor-screenName").unwrap());

    element
        .select(&SCREEN_NAME_SELECTOR)
        .next()
        .and_then(|e| e.value().attr("title"))
        .map(|s| s.trim_start_matches('@').to_owned())
        .unwrap_or_default()
}

fn parse_tweet_author_name(element: &ElementRef) -> String {
    static NAME_SELECTOR: Lazy<Selector> =
        Lazy::new(|| Selector::parse(".TweetAuthor-name").unwrap());

    element
        .select(&NAME_SELECTOR)
        .next()
        .and_then(|e| e.value().attr("title"))
        .unwrap_or_default()
        .to_owned()
}

/// Plain text and the markup it came from.
fn parse_tweet_body(element: &ElementRef) -> (String, String) {
    static TWEET_BODY_SELECTOR: Lazy<Selector> =
        Lazy::new(|| Selector::parse(".timeline-Tweet-text").unwrap());

    match element.select(&TWEET_BODY_SELECTOR).next() {
        Some(body) => (body.text().collect(), body.inner_html()),
        None => Default::default(),
    }
}

fn parse_tweet_time(element: &ElementRef) -> Option<OffsetDateTime> {
    static TWEET_DATE_SELECTOR: Lazy<Selector> =
        Lazy::new(|| Selector::parse(".timeline-Tweet-metadata > a > time").unwrap());
    static TIME_FORMAT_DESCRIPTION: &[FormatItem<'_>] = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]"
    );

    let time_str = element
        .select(&TWEET_DATE_SELECTOR)
        .next()?
        .value()
        .attr("datetime")?;
    OffsetDateTime::parse(time_str, TIME_FORMAT_DESCRIPTION)
        .ok()
        .map(|t| t.to_offset(UtcOffset::UTC))
}

fn parse_tweet_retweet(element: &ElementRef) -> bool {
    static RETWEET_SELECTOR: Lazy<Selector> =
        Lazy::new(|| Selector::parse(".timeline-Tweet-retweetCredit").unwrap());

    element.select(&RETWEET_SELECTOR).next().is_some()
}

fn parse_tweet_hashtags(element: &ElementRef) -> Vec<String> {
    static HASHTAG_SELECTOR: Lazy<Selector> =
        Lazy::new(|| Selector::parse(".hashtag > span.PrettyLink-value").unwrap());

    element
        .select(&HASHTAG_SELECTOR)
        .map(|e| e.text().collect())
        .collect()
}

fn parse_tweet_urls(element: &ElementRef) -> Vec<String> {
    static LINK_SELECTOR: Lazy<Selector> =
        Lazy::new(|| Selector::parse("a.link:not(.u-hidden)").unwrap());

    element
        .select(&LINK_SELECTOR)
        .filter_map(|e| e.value().attr("data-expanded-url"))
        .map(str::to_owned)
        .collect()
}

fn parse_tweet_photos(element: &ElementRef) -> Vec<Photo> {
    static IMAGES_SELECTOR: Lazy<Selector> =
        Lazy::new(|| Selector::parse(".NaturalImage-image").unwrap());

    element
        .select(&IMAGES_SELECTOR)
        .filter_map(|e| e.value().attr("data-image"))
        .map(|image| Photo {
            id: image.rsplit('/').next().unwrap_or_default().to_owned(),
            url: format!("{image}?format=jpg&name=large"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r##"
        <ol class="timeline-TweetList">
          <li class="timeline-TweetList-tweet">
            <div class="timeline-Tweet" data-tweet-id="1700000000000000001">
              <div class="timeline-Tweet-retweetCredit">Retweeted by alice</div>
              <div class="TweetAuthor">
                <span class="TweetAuthor-name" title="Bob">Bob</span>
                <span class="TweetAuthor-screenName" title="@bob">@bob</span>
              </div>
              <p class="timeline-Tweet-text">new <a class="hashtag"><span class="PrettyLink-value">release</span></a>
                <a class="link" data-expanded-url="https://example.com/notes">example.com</a>
                <a class="link u-hidden" data-expanded-url="https://twitter.com/hidden">hidden</a></p>
              <div class="NaturalImage"><img class="NaturalImage-image" data-image="https://pbs.twimg.com/media/F1abc"></div>
              <div class="timeline-Tweet-metadata"><a href="#"><time datetime="2023-09-14T10:00:00+0200">Sep 14</time></a></div>
            </div>
          </li>
          <li class="timeline-TweetList-tweet">
            <div class="timeline-Tweet" data-tweet-id="1700000000000000000">
              <span class="TweetAuthor-screenName" title="@alice">@alice</span>
              <p class="timeline-Tweet-text">hello</p>
            </div>
          </li>
        </ol>"##;

    #[test]
    fn parses_embedded_timeline() {
        let page = SyndicationPage {
            body: BODY.to_owned(),
        }
        .parse_tweets();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.cursor, "1699999999999999999");

        let first = &page.items[0];
        assert_eq!(first.id, "1700000000000000001");
        assert_eq!(first.username, "bob");
        assert_eq!(first.name, "Bob");
        assert!(first.is_retweet);
        assert_eq!(first.hashtags, vec!["release".to_owned()]);
        assert_eq!(first.urls, vec!["https://example.com/notes".to_owned()]);
        assert_eq!(first.photos[0].id, "F1abc");
        assert_eq!(
            first.photos[0].url,
            "https://pbs.twimg.com/media/F1abc?format=jpg&name=large"
        );
        assert_eq!(first.timestamp, 1694678400);
        assert_eq!(
            first.permanent_url,
            "https://twitter.com/bob/status/1700000000000000001"
        );

        let second = &page.items[1];
        assert_eq!(second.text, "hello");
        assert!(second.time_parsed.is_none());
        assert!(!second.is_retweet);
    }

    #[test]
    fn empty_body_has_no_cursor() {
        let page: SyndicationPage = serde_json::from_str(r#"{"body": ""}"#).unwrap();
        let page = page.parse_tweets();
        assert!(page.items.is_empty());
        assert!(page.cursor.is_empty());
    }
}
