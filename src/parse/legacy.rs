//! REST timelines: tweets and users live in lookup maps, instructions only
//! carry ids and cursors.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::Deserialize;

use super::profile::parse_profile;
use super::raw::{nullable, RawTweet, RawUser};
use super::tweet::{resolve_tweet, MAX_NESTING, NO_USER};
use super::Page;
use crate::tweet::{Profile, Tweet};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LegacyTimeline {
    #[serde(rename = "globalObjects", deserialize_with = "nullable")]
    global_objects: GlobalObjects,
    #[serde(deserialize_with = "nullable")]
    timeline: Instructions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GlobalObjects {
    #[serde(deserialize_with = "nullable")]
    tweets: HashMap<String, RawTweet>,
    #[serde(deserialize_with = "nullable")]
    users: HashMap<String, RawUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Instructions {
    #[serde(deserialize_with = "nullable")]
    instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Instruction {
    add_entries: Option<AddEntries>,
    pin_entry: Option<SingleEntry>,
    replace_entry: Option<SingleEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AddEntries {
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SingleEntry {
    entry: Entry,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Entry {
    content: EntryContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EntryContent {
    item: Item,
    operation: Operation,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Item {
    content: ItemContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ItemContent {
    tweet: IdRef,
    user: IdRef,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct IdRef {
    id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Operation {
    cursor: Cursor,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Cursor {
    value: String,
    cursor_type: String,
}

impl Entry {
    fn bottom_cursor(&self) -> Option<&str> {
        let cursor = &self.content.operation.cursor;
        (cursor.cursor_type == "Bottom" && !cursor.value.is_empty()).then_some(cursor.value.as_str())
    }
}

impl LegacyTimeline {
    /// Tweets in entry order, the pinned tweet first.
    pub fn parse_tweets(&self) -> Page<Tweet> {
        let mut cursor = String::new();
        let mut pinned = None;
        let mut ids: Vec<&str> = Vec::new();

        for instruction in &self.timeline.instructions {
            if let Some(add) = &instruction.add_entries {
                for entry in &add.entries {
                    let id = &entry.content.item.content.tweet.id;
                    if !id.is_empty() {
                        ids.push(id);
                    }
                    if let Some(c) = entry.bottom_cursor() {
                        cursor = c.to_owned();
                    }
                }
            }
            if let Some(pin) = &instruction.pin_entry {
                let id = &pin.entry.content.item.content.tweet.id;
                if !id.is_empty() {
                    pinned = Some(id.as_str());
                }
            }
            if let Some(replace) = &instruction.replace_entry {
                if let Some(c) = replace.entry.bottom_cursor() {
                    cursor = c.to_owned();
                }
            }
        }

        if let Some(id) = pinned {
            ids.retain(|i| *i != id);
        }
        let mut items: Vec<Tweet> = ids.into_iter().filter_map(|id| self.tweet(id, 0)).collect();
        // A page holding nothing but the pin is the end of the timeline.
        if let Some(id) = pinned.filter(|_| !items.is_empty()) {
            if let Some(mut tweet) = self.tweet(id, 0) {
                tweet.is_pin = true;
                items.insert(0, tweet);
            }
        }

        Page { items, cursor }
    }

    /// Users referenced by entries, for people searches.
    pub fn parse_profiles(&self) -> Page<Profile> {
        let mut cursor = String::new();
        let mut items = Vec::new();

        for instruction in &self.timeline.instructions {
            if let Some(add) = &instruction.add_entries {
                for entry in &add.entries {
                    let id = &entry.content.item.content.user.id;
                    if let Some(user) = self.global_objects.users.get(id) {
                        let mut profile = parse_profile(user);
                        if profile.user_id.is_empty() {
                            profile.user_id = id.clone();
                        }
                        items.push(profile);
                    }
                    if let Some(c) = entry.bottom_cursor() {
                        cursor = c.to_owned();
                    }
                }
            }
            if let Some(replace) = &instruction.replace_entry {
                if let Some(c) = replace.entry.bottom_cursor() {
                    cursor = c.to_owned();
                }
            }
        }

        Page { items, cursor }
    }

    fn tweet(&self, id: &str, depth: usize) -> Option<Tweet> {
        let raw = self.global_objects.tweets.get(id)?;
        let user = self
            .global_objects
            .users
            .get(&raw.user_id_str)
            .unwrap_or(&*NO_USER);

        let mut raw = Cow::Borrowed(raw);
        if raw.id_str.is_empty() {
            raw.to_mut().id_str = id.to_owned();
        }
        let mut tweet = resolve_tweet(user, &raw, depth);

        if depth < MAX_NESTING {
            if tweet.is_quoted {
                tweet.quoted_status = self.tweet(&tweet.quoted_status_id, depth + 1).map(Box::new);
            }
            if tweet.is_reply {
                tweet.in_reply_to_status = self
                    .tweet(&tweet.in_reply_to_status_id, depth + 1)
                    .map(Box::new);
            }
            if tweet.is_retweet && tweet.retweeted_status.is_none() {
                if let Some(retweeted) = self.tweet(&tweet.retweeted_status_id, depth + 1) {
                    tweet.retweeted_status = Some(Box::new(retweeted));
                }
            }
        }

        Some(tweet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn timeline(value: serde_json::Value) -> LegacyTimeline {
        serde_json::from_value(value).unwrap()
    }

    fn entry_tweet(id: &str) -> serde_json::Value {
        json!({ "content": { "item": { "content": { "tweet": { "id": id } } } } })
    }

    fn entry_cursor(kind: &str, value: &str) -> serde_json::Value {
        json!({ "content": { "operation": { "cursor": { "cursorType": kind, "value": value } } } })
    }

    #[test]
    fn resolves_quotes_from_lookup_maps() {
        let timeline = timeline(json!({
            "globalObjects": {
                "tweets": {
                    "1": { "id_str": "1", "user_id_str": "u1", "full_text": "look", "quoted_status_id_str": "2" },
                    "2": { "id_str": "2", "user_id_str": "u2", "full_text": "quoted" }
                },
                "users": {
                    "u1": { "id_str": "u1", "screen_name": "alice" },
                    "u2": { "id_str": "u2", "screen_name": "bob" }
                }
            },
            "timeline": { "instructions": [
                { "addEntries": { "entries": [entry_tweet("1"), entry_cursor("Bottom", "C1")] } }
            ]}
        }));
        let page = timeline.parse_tweets();
        assert_eq!(page.cursor, "C1");
        assert_eq!(page.items.len(), 1);
        let tweet = &page.items[0];
        assert_eq!(tweet.username, "alice");
        assert!(tweet.is_quoted);
        let quoted = tweet.quoted_status.as_ref().unwrap();
        assert_eq!(quoted.id, "2");
        assert_eq!(quoted.username, "bob");
    }

    #[test]
    fn pinned_tweet_comes_first_once() {
        let timeline = timeline(json!({
            "globalObjects": {
                "tweets": {
                    "1": { "id_str": "1" },
                    "2": { "id_str": "2" },
                    "3": { "id_str": "3" }
                }
            },
            "timeline": { "instructions": [
                { "addEntries": { "entries": [entry_tweet("1"), entry_tweet("2"), entry_tweet("3")] } },
                { "pinEntry": { "entry": entry_tweet("3") } }
            ]}
        }));
        let ids: Vec<_> = timeline
            .parse_tweets()
            .items
            .into_iter()
            .map(|t| (t.id, t.is_pin))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("3".to_owned(), true),
                ("1".to_owned(), false),
                ("2".to_owned(), false)
            ]
        );
    }

    fn pin_only_page(cursor: &str) -> LegacyTimeline {
        timeline(json!({
            "globalObjects": { "tweets": { "7": { "id_str": "7" } } },
            "timeline": { "instructions": [
                { "addEntries": { "entries": [entry_cursor("Bottom", cursor)] } },
                { "pinEntry": { "entry": entry_tweet("7") } }
            ]}
        }))
    }

    #[test]
    fn pin_alone_is_an_empty_page() {
        let page = pin_only_page("C2").parse_tweets();
        assert!(page.items.is_empty());
        assert_eq!(page.cursor, "C2");
    }

    #[tokio::test]
    async fn stream_ends_on_pin_only_page() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        use futures_util::StreamExt;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let stream = crate::stream::stream("q", 10, move |_, _, cursor: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            let page = pin_only_page(&format!("{cursor}x")).parse_tweets();
            async move { Ok::<_, crate::Error>(page.into_parts()) }
        });
        let results: Vec<_> = stream.collect().await;
        assert!(results.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn replace_entry_overrides_cursor() {
        let timeline = timeline(json!({
            "timeline": { "instructions": [
                { "addEntries": { "entries": [entry_cursor("Top", "T"), entry_cursor("Bottom", "B1")] } },
                { "replaceEntry": { "entry": entry_cursor("Bottom", "B2") } }
            ]}
        }));
        let page = timeline.parse_tweets();
        assert!(page.items.is_empty());
        assert_eq!(page.cursor, "B2");
    }

    #[test]
    fn missing_tweets_are_skipped() {
        let timeline = timeline(json!({
            "globalObjects": { "tweets": null, "users": null },
            "timeline": { "instructions": [{ "addEntries": { "entries": [entry_tweet("404")] } }] }
        }));
        assert!(timeline.parse_tweets().items.is_empty());
    }

    #[test]
    fn user_entries_become_profiles() {
        let timeline = timeline(json!({
            "globalObjects": { "users": { "9": { "screen_name": "carol" } } },
            "timeline": { "instructions": [{ "addEntries": { "entries": [
                { "content": { "item": { "content": { "user": { "id": "9" } } } } }
            ]}}]}
        }));
        let page = timeline.parse_profiles();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].user_id, "9");
        assert_eq!(page.items[0].username, "carol");
    }
}
