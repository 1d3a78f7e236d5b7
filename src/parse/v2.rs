//! GraphQL timelines: a list of instructions whose entries embed full tweet
//! and user results.

use serde::Deserialize;

use super::profile::parse_user_result;
use super::raw::{nullable, RawResultHolder, RawUserResultHolder};
use super::tweet::resolve_result;
use super::Page;
use crate::tweet::{Profile, Tweet};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct V2Timeline {
    #[serde(deserialize_with = "nullable")]
    instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Instruction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(deserialize_with = "nullable")]
    entries: Vec<Entry>,
    entry: Option<Entry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Entry {
    #[serde(rename = "entryId")]
    entry_id: String,
    #[serde(deserialize_with = "nullable")]
    content: EntryContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EntryContent {
    #[serde(rename = "cursorType")]
    cursor_type: String,
    value: String,
    #[serde(deserialize_with = "nullable")]
    items: Vec<ModuleItem>,
    #[serde(rename = "itemContent", deserialize_with = "nullable")]
    item_content: ItemContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ModuleItem {
    item: ModuleItemBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ModuleItemBody {
    #[serde(rename = "itemContent", deserialize_with = "nullable")]
    item_content: ItemContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ItemContent {
    #[serde(rename = "tweetDisplayType")]
    tweet_display_type: String,
    #[serde(deserialize_with = "nullable")]
    tweet_results: RawResultHolder,
    #[serde(rename = "userDisplayType")]
    user_display_type: String,
    #[serde(deserialize_with = "nullable")]
    user_results: RawUserResultHolder,
}

impl Entry {
    fn is_promoted(&self) -> bool {
        self.entry_id.starts_with("promoted")
    }

    /// The entry's own item followed by any module items.
    fn item_contents(&self) -> impl Iterator<Item = &ItemContent> {
        std::iter::once(&self.content.item_content)
            .chain(self.content.items.iter().map(|i| &i.item.item_content))
    }
}

impl Instruction {
    fn all_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().chain(self.entry.iter())
    }
}

impl V2Timeline {
    fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.instructions.iter().flat_map(Instruction::all_entries)
    }

    fn bottom_cursor(&self) -> String {
        self.entries()
            .filter(|e| e.content.cursor_type == "Bottom" && !e.content.value.is_empty())
            .last()
            .map(|e| e.content.value.clone())
            .unwrap_or_default()
    }

    /// Tweets in entry order. A pinned entry is placed first.
    pub fn parse_tweets(&self) -> Page<Tweet> {
        let pinned = self
            .instructions
            .iter()
            .filter(|i| i.kind == "TimelinePinEntry")
            .flat_map(Instruction::all_entries);
        let rest = self
            .instructions
            .iter()
            .filter(|i| i.kind != "TimelinePinEntry")
            .flat_map(Instruction::all_entries);

        let mut items: Vec<Tweet> = Vec::new();
        for entry in pinned.chain(rest).filter(|e| !e.is_promoted()) {
            for content in entry.item_contents() {
                let Some(result) = content.tweet_results.result.as_deref() else {
                    continue;
                };
                if let Some(tweet) = resolve_result(result, 0) {
                    if !items.iter().any(|t| t.id == tweet.id) {
                        items.push(tweet);
                    }
                }
            }
        }

        Page {
            items,
            cursor: self.bottom_cursor(),
        }
    }

    /// User entries, as returned by people searches.
    pub fn parse_profiles(&self) -> Page<Profile> {
        let items = self
            .entries()
            .flat_map(Entry::item_contents)
            .filter(|c| matches!(c.user_display_type.as_str(), "User" | ""))
            .filter_map(|c| c.user_results.result.as_ref())
            .filter(|r| matches!(r.typename.as_str(), "User" | ""))
            .map(parse_user_result)
            .filter(|p| !p.user_id.is_empty())
            .collect();

        Page {
            items,
            cursor: self.bottom_cursor(),
        }
    }

    /// Tweets of a conversation with replies and self-threads linked.
    pub fn parse_conversation(&self) -> Page<Tweet> {
        let mut tweets: Vec<Tweet> = Vec::new();
        for content in self.entries().flat_map(Entry::item_contents) {
            let Some(result) = content.tweet_results.result.as_deref() else {
                continue;
            };
            if let Some(mut tweet) = resolve_result(result, 0) {
                tweet.is_self_thread = content.tweet_display_type == "SelfThread";
                if !tweets.iter().any(|t| t.id == tweet.id) {
                    tweets.push(tweet);
                }
            }
        }

        Page {
            items: link_conversation(tweets),
            cursor: self.bottom_cursor(),
        }
    }
}

/// Links are clones of the unlinked siblings, so no tweet refers back into
/// the list it came from.
fn link_conversation(tweets: Vec<Tweet>) -> Vec<Tweet> {
    let siblings = tweets.clone();
    tweets
        .into_iter()
        .map(|mut tweet| {
            if tweet.in_reply_to_status.is_none() && !tweet.in_reply_to_status_id.is_empty() {
                tweet.in_reply_to_status = siblings
                    .iter()
                    .find(|p| p.id == tweet.in_reply_to_status_id)
                    .cloned()
                    .map(Box::new);
            }
            if tweet.is_self_thread && tweet.id == tweet.conversation_id {
                tweet.thread = siblings
                    .iter()
                    .filter(|s| s.is_self_thread && s.id != tweet.id)
                    .cloned()
                    .collect();
                if tweet.thread.is_empty() {
                    tweet.is_self_thread = false;
                }
            }
            tweet
        })
        .collect()
}

/// `UserTweets` response body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UserTweetsResponse {
    data: UserTweetsData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserTweetsData {
    user: UserTweetsUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserTweetsUser {
    result: UserTweetsResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserTweetsResult {
    #[serde(alias = "timeline")]
    timeline_v2: TimelineHolder,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TimelineHolder {
    timeline: V2Timeline,
}

impl UserTweetsResponse {
    pub(crate) fn into_timeline(self) -> V2Timeline {
        self.data.user.result.timeline_v2.timeline
    }
}

/// `SearchTimeline` response body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SearchResponse {
    data: SearchData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchData {
    search_by_raw_query: SearchByRawQuery,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchByRawQuery {
    search_timeline: TimelineHolder,
}

impl SearchResponse {
    pub(crate) fn into_timeline(self) -> V2Timeline {
        self.data.search_by_raw_query.search_timeline.timeline
    }
}

/// `TweetDetail` response body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ConversationResponse {
    data: ConversationData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConversationData {
    threaded_conversation_with_injections_v2: V2Timeline,
}

impl ConversationResponse {
    pub(crate) fn into_timeline(self) -> V2Timeline {
        self.data.threaded_conversation_with_injections_v2
    }
}
