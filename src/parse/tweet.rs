use std::borrow::Cow;

use once_cell::sync::Lazy;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use super::markup::{render_html, AttachedMedia};
use super::raw::{RawMedia, RawResult, RawTweet, RawUser, RawVariant};
use crate::tweet::{Gif, Mention, Photo, Tweet, Video};

/// Depth limit for quoted, replied-to and retweeted tweets resolved inline.
pub(crate) const MAX_NESTING: usize = 3;

/// Stand-in author when a payload omits the user object.
pub(crate) static NO_USER: Lazy<RawUser> = Lazy::new(RawUser::default);

static CREATED_AT_FORMAT: &[FormatItem<'_>] = format_description!(
    "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
);

/// Parse `Mon Jan 02 15:04:05 -0700 2006` into UTC.
pub(crate) fn parse_created_at(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s, CREATED_AT_FORMAT)
        .ok()
        .map(|t| t.to_offset(UtcOffset::UTC))
}

/// Turn a legacy tweet object and its author into a [`Tweet`]. Retweets
/// embedding a GraphQL result are resolved up to [`MAX_NESTING`].
pub(crate) fn resolve_tweet(user: &RawUser, raw: &RawTweet, depth: usize) -> Tweet {
    let user_id = if raw.user_id_str.is_empty() {
        user.id_str.clone()
    } else {
        raw.user_id_str.clone()
    };
    let mut tweet = Tweet {
        id: raw.id_str.clone(),
        conversation_id: raw.conversation_id_str.clone(),
        user_id,
        username: user.screen_name.clone(),
        name: user.name.clone(),
        text: raw.full_text.clone(),
        permanent_url: format!(
            "https://twitter.com/{}/status/{}",
            user.screen_name, raw.id_str
        ),
        likes: raw.favorite_count,
        replies: raw.reply_count,
        retweets: raw.retweet_count,
        views: raw.ext_views.count.parse().unwrap_or(0),
        is_pin: !raw.id_str.is_empty() && user.pinned_tweet_ids_str.contains(&raw.id_str),
        place: raw.place.clone().filter(|p| !p.id.is_empty()),
        ..Default::default()
    };

    if let Some(time) = parse_created_at(&raw.created_at) {
        tweet.time_parsed = Some(time);
        tweet.timestamp = time.unix_timestamp();
    }

    if !raw.quoted_status_id_str.is_empty() {
        tweet.is_quoted = true;
        tweet.quoted_status_id = raw.quoted_status_id_str.clone();
    }
    if !raw.in_reply_to_status_id_str.is_empty() {
        tweet.is_reply = true;
        tweet.in_reply_to_status_id = raw.in_reply_to_status_id_str.clone();
    }

    let embedded = raw.retweeted_status_result.result.as_deref();
    if !raw.retweeted_status_id_str.is_empty() || embedded.is_some() {
        tweet.is_retweet = true;
        tweet.retweeted_status_id = raw.retweeted_status_id_str.clone();
        if depth < MAX_NESTING {
            if let Some(retweeted) = embedded.and_then(|r| resolve_result(r, depth + 1)) {
                if !retweeted.id.is_empty() {
                    tweet.retweeted_status_id = retweeted.id.clone();
                }
                tweet.retweeted_status = Some(Box::new(retweeted));
            }
        }
    }

    tweet.hashtags = raw
        .entities
        .hashtags
        .iter()
        .map(|h| h.text.clone())
        .collect();
    tweet.mentions = raw
        .entities
        .user_mentions
        .iter()
        .map(|m| Mention {
            id: m.id_str.clone(),
            username: m.screen_name.clone(),
            name: m.name.clone(),
        })
        .collect();
    tweet.urls = raw
        .entities
        .urls
        .iter()
        .map(|u| u.expanded_url.clone())
        .collect();

    let media = if raw.extended_entities.media.is_empty() {
        &raw.entities.media
    } else {
        &raw.extended_entities.media
    };
    attach_media(&mut tweet, media);

    tweet.html = render_html(
        &tweet.text,
        &raw.entities.urls,
        media,
        AttachedMedia {
            photos: &tweet.photos,
            videos: &tweet.videos,
            gifs: &tweet.gifs,
        },
    );

    tweet
}

fn attach_media(tweet: &mut Tweet, media: &[RawMedia]) {
    for m in media {
        match m.kind.as_str() {
            "photo" => tweet.photos.push(Photo {
                id: m.id_str.clone(),
                url: m.media_url_https.clone(),
            }),
            "video" => tweet.videos.push(Video {
                id: m.id_str.clone(),
                preview: m.media_url_https.clone(),
                url: best_variant(&m.video_info.variants, false)
                    .trim_end_matches("?tag=10")
                    .to_owned(),
            }),
            "animated_gif" => tweet.gifs.push(Gif {
                id: m.id_str.clone(),
                preview: m.media_url_https.clone(),
                url: best_variant(&m.video_info.variants, true).to_owned(),
            }),
            _ => {}
        }

        let warning = &m.ext_sensitive_media_warning;
        if warning.adult_content || warning.graphic_violence || warning.other {
            tweet.sensitive_content = true;
        }
    }
}

/// Highest-bitrate variant. GIF variants all report zero, so ties win there.
fn best_variant(variants: &[RawVariant], ties_win: bool) -> &str {
    let mut best = "";
    let mut max = 0;
    for variant in variants {
        let better = if ties_win {
            variant.bitrate >= max
        } else {
            variant.bitrate > max
        };
        if better {
            best = &variant.url;
            max = variant.bitrate;
        }
    }
    best
}

/// Resolve a GraphQL tweet result. Tombstones and unavailable tweets yield
/// `None`.
pub(crate) fn resolve_result(result: &RawResult, depth: usize) -> Option<Tweet> {
    let result = match (result.typename.as_str(), result.tweet.as_deref()) {
        ("TweetWithVisibilityResults", Some(inner)) => inner,
        _ => result,
    };
    if !matches!(result.typename.as_str(), "Tweet" | "") {
        return None;
    }

    let note = &result.note_tweet.note_tweet_results.result.text;
    let mut legacy = Cow::Borrowed(&result.legacy);
    if !note.is_empty() {
        legacy.to_mut().full_text = note.clone();
    }
    if legacy.id_str.is_empty() {
        if result.rest_id.is_empty() {
            return None;
        }
        legacy.to_mut().id_str = result.rest_id.clone();
    }

    let author = result.core.user_results.result.as_ref();
    let user = author.map(|u| &u.legacy).unwrap_or(&*NO_USER);
    let mut tweet = resolve_tweet(user, &legacy, depth);

    if tweet.user_id.is_empty() {
        if let Some(author) = author {
            tweet.user_id = author.rest_id.clone();
        }
    }
    if tweet.views == 0 {
        tweet.views = result.views.count.parse().unwrap_or(0);
    }

    if depth < MAX_NESTING {
        let quoted = result
            .quoted_status_result
            .result
            .as_deref()
            .and_then(|q| resolve_result(q, depth + 1));
        if let Some(quoted) = quoted {
            tweet.is_quoted = true;
            if tweet.quoted_status_id.is_empty() {
                tweet.quoted_status_id = quoted.id.clone();
            }
            tweet.quoted_status = Some(Box::new(quoted));
        }
    }

    Some(tweet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    fn author() -> RawUser {
        raw(json!({
            "id_str": "42",
            "screen_name": "alice",
            "name": "Alice",
            "pinned_tweet_ids_str": ["100"]
        }))
    }

    #[test]
    fn parses_created_at_to_utc() {
        let time = parse_created_at("Mon Jan 02 15:04:05 -0700 2006").unwrap();
        assert_eq!(time.offset(), UtcOffset::UTC);
        assert_eq!(time.unix_timestamp(), 1136239445);
        assert!(parse_created_at("yesterday").is_none());
    }

    #[test]
    fn resolves_basic_fields() {
        let tweet: RawTweet = raw(json!({
            "id_str": "100",
            "conversation_id_str": "100",
            "created_at": "Mon Jan 02 15:04:05 +0000 2006",
            "full_text": "hello #rust",
            "favorite_count": 3,
            "reply_count": 1,
            "retweet_count": 2,
            "ext_views": { "count": "77" },
            "entities": { "hashtags": [{ "text": "rust" }] }
        }));
        let tweet = resolve_tweet(&author(), &tweet, 0);
        assert_eq!(tweet.id, "100");
        assert_eq!(tweet.user_id, "42");
        assert_eq!(tweet.username, "alice");
        assert_eq!(tweet.permanent_url, "https://twitter.com/alice/status/100");
        assert_eq!(tweet.hashtags, vec!["rust".to_owned()]);
        assert_eq!(tweet.views, 77);
        assert_eq!(tweet.timestamp, 1136214245);
        assert!(tweet.is_pin);
        assert!(!tweet.is_retweet);
    }

    #[test]
    fn resolving_twice_gives_equal_tweets() {
        let tweet: RawTweet = raw(json!({
            "id_str": "7",
            "full_text": "@bob look https://t.co/AAAAAAAAAA",
            "entities": {
                "urls": [{ "url": "https://t.co/AAAAAAAAAA", "expanded_url": "https://x.org" }],
                "user_mentions": [{ "id_str": "9", "screen_name": "bob", "name": "Bob" }]
            }
        }));
        assert_eq!(
            resolve_tweet(&author(), &tweet, 0),
            resolve_tweet(&author(), &tweet, 0)
        );
    }

    #[test]
    fn video_picks_highest_bitrate_and_drops_tag() {
        let tweet: RawTweet = raw(json!({
            "id_str": "5",
            "extended_entities": { "media": [{
                "id_str": "m1",
                "type": "video",
                "media_url_https": "https://pbs.twimg.com/thumb.jpg",
                "ext_sensitive_media_warning": { "graphic_violence": true },
                "video_info": { "variants": [
                    { "url": "https://video.twimg.com/pl.m3u8" },
                    { "bitrate": 256000, "url": "https://video.twimg.com/low.mp4?tag=10" },
                    { "bitrate": 832000, "url": "https://video.twimg.com/high.mp4?tag=10" }
                ]}
            }]},
            "entities": { "media": [{ "id_str": "ignored", "type": "photo" }] }
        }));
        let tweet = resolve_tweet(&author(), &tweet, 0);
        assert!(tweet.photos.is_empty());
        assert_eq!(tweet.videos.len(), 1);
        assert_eq!(tweet.videos[0].url, "https://video.twimg.com/high.mp4");
        assert!(tweet.sensitive_content);
    }

    #[test]
    fn gif_takes_last_variant_on_equal_bitrate() {
        let variants = vec![
            RawVariant {
                bitrate: 0,
                url: "a.mp4".into(),
            },
            RawVariant {
                bitrate: 0,
                url: "b.mp4".into(),
            },
        ];
        assert_eq!(best_variant(&variants, true), "b.mp4");
        assert_eq!(best_variant(&variants, false), "");
    }

    #[test]
    fn retweet_prefers_embedded_result_id() {
        let tweet: RawTweet = raw(json!({
            "id_str": "300",
            "full_text": "RT @carol: original",
            "retweeted_status_id_str": "199",
            "retweeted_status_result": { "result": {
                "__typename": "Tweet",
                "rest_id": "200",
                "core": { "user_results": { "result": {
                    "rest_id": "8",
                    "legacy": { "screen_name": "carol", "name": "Carol" }
                }}},
                "legacy": { "id_str": "200", "full_text": "original" }
            }}
        }));
        let tweet = resolve_tweet(&author(), &tweet, 0);
        assert!(tweet.is_retweet);
        assert_eq!(tweet.retweeted_status_id, "200");
        let retweeted = tweet.retweeted_status.unwrap();
        assert_eq!(retweeted.username, "carol");
        assert_eq!(retweeted.user_id, "8");
    }

    #[test]
    fn result_unwraps_visibility_wrapper_and_note_text() {
        let result: RawResult = raw(json!({
            "__typename": "TweetWithVisibilityResults",
            "tweet": {
                "rest_id": "11",
                "views": { "count": "5" },
                "note_tweet": { "note_tweet_results": { "result": { "text": "a long note" } } },
                "legacy": { "full_text": "a long…" }
            }
        }));
        let tweet = resolve_result(&result, 0).unwrap();
        assert_eq!(tweet.id, "11");
        assert_eq!(tweet.text, "a long note");
        assert_eq!(tweet.views, 5);
    }

    #[test]
    fn tombstone_is_dropped() {
        let result: RawResult = raw(json!({ "__typename": "TweetTombstone" }));
        assert!(resolve_result(&result, 0).is_none());
    }

    #[test]
    fn quote_chain_stops_at_nesting_limit() {
        fn quoting(id: u32, inner: serde_json::Value) -> serde_json::Value {
            json!({
                "__typename": "Tweet",
                "rest_id": id.to_string(),
                "legacy": { "id_str": id.to_string(), "quoted_status_id_str": (id + 1).to_string() },
                "quoted_status_result": { "result": inner }
            })
        }
        let mut chain = json!({ "__typename": "Tweet", "rest_id": "9", "legacy": { "id_str": "9" } });
        for id in (1..9).rev() {
            chain = quoting(id, chain);
        }
        let result: RawResult = raw(chain);
        let mut tweet = resolve_result(&result, 0).unwrap();
        let mut depth = 0;
        while let Some(quoted) = tweet.quoted_status.take() {
            tweet = *quoted;
            depth += 1;
        }
        assert_eq!(depth, MAX_NESTING);
    }
}
