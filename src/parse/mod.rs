//! Turns raw timeline payloads into [`Tweet`]s and [`Profile`]s plus the
//! cursor for the next page. Nothing here performs I/O.

mod html;
mod legacy;
mod markup;
mod profile;
pub(crate) mod raw;
mod tweet;
mod v2;

pub use html::SyndicationPage;
pub use legacy::LegacyTimeline;
pub use v2::V2Timeline;

pub(crate) use profile::parse_user_result;
use v2::{ConversationResponse, SearchResponse, UserTweetsResponse};

use crate::error::Result;
use crate::tweet::{Profile, Tweet};

/// One page of results. An empty cursor means there is nothing after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: String,
}

impl<T> Page<T> {
    pub fn into_parts(self) -> (Vec<T>, String) {
        (self.items, self.cursor)
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: String::new(),
        }
    }
}

/// A decoded response in one of the supported timeline schemas.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Embeddable timeline HTML.
    Html(SyndicationPage),
    /// REST `globalObjects` timeline.
    Legacy(LegacyTimeline),
    /// GraphQL instruction list.
    V2(V2Timeline),
}

impl Payload {
    pub fn from_syndication_json(body: &[u8]) -> Result<Self> {
        Ok(Self::Html(serde_json::from_slice(body)?))
    }

    pub fn from_legacy_json(body: &[u8]) -> Result<Self> {
        Ok(Self::Legacy(serde_json::from_slice(body)?))
    }

    /// A `UserTweets` response body.
    pub fn from_user_tweets_json(body: &[u8]) -> Result<Self> {
        let response: UserTweetsResponse = serde_json::from_slice(body)?;
        Ok(Self::V2(response.into_timeline()))
    }

    /// A `SearchTimeline` response body.
    pub fn from_search_json(body: &[u8]) -> Result<Self> {
        let response: SearchResponse = serde_json::from_slice(body)?;
        Ok(Self::V2(response.into_timeline()))
    }

    /// A `TweetDetail` response body.
    pub fn from_conversation_json(body: &[u8]) -> Result<Self> {
        let response: ConversationResponse = serde_json::from_slice(body)?;
        Ok(Self::V2(response.into_timeline()))
    }

    pub fn parse_tweets(&self) -> Page<Tweet> {
        match self {
            Self::Html(page) => page.parse_tweets(),
            Self::Legacy(timeline) => timeline.parse_tweets(),
            Self::V2(timeline) => timeline.parse_tweets(),
        }
    }

    /// Replies and self-threads linked among the tweets of the page. Only
    /// the GraphQL schema carries conversations; the others parse as plain
    /// timelines.
    pub fn parse_conversation(&self) -> Page<Tweet> {
        match self {
            Self::V2(timeline) => timeline.parse_conversation(),
            _ => self.parse_tweets(),
        }
    }

    /// The HTML schema carries no users.
    pub fn parse_profiles(&self) -> Page<Profile> {
        match self {
            Self::Html(_) => Page::default(),
            Self::Legacy(timeline) => timeline.parse_profiles(),
            Self::V2(timeline) => timeline.parse_profiles(),
        }
    }
}
