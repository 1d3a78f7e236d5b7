use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tweet {
    pub id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub username: String,
    pub name: String,
    pub text: String,
    pub html: String,
    pub permanent_url: String,
    pub likes: i64,
    pub replies: i64,
    pub retweets: i64,
    pub views: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub time_parsed: Option<OffsetDateTime>,
    /// Unix seconds, zero when the creation time could not be parsed.
    pub timestamp: i64,
    pub place: Option<Place>,
    pub photos: Vec<Photo>,
    pub videos: Vec<Video>,
    pub gifs: Vec<Gif>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<Mention>,
    pub urls: Vec<String>,
    pub sensitive_content: bool,
    pub is_quoted: bool,
    pub is_reply: bool,
    pub is_retweet: bool,
    pub is_pin: bool,
    pub is_self_thread: bool,
    pub quoted_status_id: String,
    pub retweeted_status_id: String,
    pub in_reply_to_status_id: String,
    pub quoted_status: Option<Box<Tweet>>,
    pub retweeted_status: Option<Box<Tweet>>,
    /// Only set when the parent tweet was part of the same response.
    pub in_reply_to_status: Option<Box<Tweet>>,
    pub thread: Vec<Tweet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Mention {
    pub id: String,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Photo {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Video {
    pub id: String,
    pub preview: String,
    /// Highest-bitrate variant.
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Gif {
    pub id: String,
    pub preview: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Place {
    pub id: String,
    pub place_type: String,
    pub name: String,
    pub full_name: String,
    pub country_code: String,
    pub country: String,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profile {
    pub user_id: String,
    pub username: String,
    pub name: String,
    pub biography: String,
    pub location: String,
    pub avatar: String,
    pub banner: String,
    pub website: String,
    pub url: String,
    pub is_private: bool,
    pub is_verified: bool,
    pub is_blue_verified: bool,
    pub followers_count: i64,
    pub following_count: i64,
    pub tweets_count: i64,
    pub likes_count: i64,
    pub listed_count: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub joined: Option<OffsetDateTime>,
    pub pinned_tweet_ids: Vec<String>,
}
