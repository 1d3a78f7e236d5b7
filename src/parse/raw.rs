//! Wire shapes shared by the JSON schemas. Every field is optional in
//! practice, so structs default missing fields and treat `null` as default.

use serde::{Deserialize, Deserializer};

use crate::tweet::Place;

pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `legacy` tweet object, used verbatim by the REST schema and nested
/// inside GraphQL results.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawTweet {
    #[serde(deserialize_with = "nullable")]
    pub id_str: String,
    #[serde(deserialize_with = "nullable")]
    pub conversation_id_str: String,
    #[serde(deserialize_with = "nullable")]
    pub created_at: String,
    #[serde(deserialize_with = "nullable")]
    pub full_text: String,
    #[serde(deserialize_with = "nullable")]
    pub user_id_str: String,
    #[serde(deserialize_with = "nullable")]
    pub favorite_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub reply_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub retweet_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub in_reply_to_status_id_str: String,
    #[serde(deserialize_with = "nullable")]
    pub quoted_status_id_str: String,
    #[serde(deserialize_with = "nullable")]
    pub retweeted_status_id_str: String,
    #[serde(deserialize_with = "nullable")]
    pub retweeted_status_result: RawResultHolder,
    #[serde(deserialize_with = "nullable")]
    pub place: Option<Place>,
    #[serde(deserialize_with = "nullable")]
    pub entities: RawEntities,
    #[serde(deserialize_with = "nullable")]
    pub extended_entities: RawExtendedEntities,
    #[serde(deserialize_with = "nullable")]
    pub ext_views: RawViews,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawEntities {
    #[serde(deserialize_with = "nullable")]
    pub hashtags: Vec<RawHashtag>,
    #[serde(deserialize_with = "nullable")]
    pub media: Vec<RawMedia>,
    #[serde(deserialize_with = "nullable")]
    pub urls: Vec<RawUrl>,
    #[serde(deserialize_with = "nullable")]
    pub user_mentions: Vec<RawMention>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawExtendedEntities {
    #[serde(deserialize_with = "nullable")]
    pub media: Vec<RawMedia>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawHashtag {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawUrl {
    pub url: String,
    #[serde(deserialize_with = "nullable")]
    pub expanded_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawMention {
    pub id_str: String,
    pub name: String,
    pub screen_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawMedia {
    pub id_str: String,
    pub media_url_https: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Short link the media replaces in the tweet text.
    pub url: String,
    #[serde(deserialize_with = "nullable")]
    pub ext_sensitive_media_warning: RawSensitiveWarning,
    #[serde(deserialize_with = "nullable")]
    pub video_info: RawVideoInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawSensitiveWarning {
    pub adult_content: bool,
    pub graphic_violence: bool,
    pub other: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawVideoInfo {
    pub variants: Vec<RawVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawVariant {
    /// Absent for streaming playlists, always zero for GIFs.
    #[serde(deserialize_with = "nullable")]
    pub bitrate: i64,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawViews {
    #[serde(deserialize_with = "nullable")]
    pub count: String,
}

/// The `legacy` user object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawUser {
    #[serde(deserialize_with = "nullable")]
    pub id_str: String,
    #[serde(deserialize_with = "nullable")]
    pub screen_name: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub location: String,
    #[serde(deserialize_with = "nullable")]
    pub created_at: String,
    #[serde(deserialize_with = "nullable")]
    pub profile_image_url_https: String,
    #[serde(deserialize_with = "nullable")]
    pub profile_banner_url: String,
    #[serde(deserialize_with = "nullable")]
    pub protected: bool,
    #[serde(deserialize_with = "nullable")]
    pub verified: bool,
    #[serde(deserialize_with = "nullable")]
    pub followers_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub friends_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub statuses_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub favourites_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub listed_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub pinned_tweet_ids_str: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub entities: RawUserEntities,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawUserEntities {
    #[serde(deserialize_with = "nullable")]
    pub url: RawUserUrlEntity,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawUserUrlEntity {
    #[serde(deserialize_with = "nullable")]
    pub urls: Vec<RawUrl>,
}

/// A GraphQL tweet result. Retweets embed one inside their legacy object,
/// so the type lives here rather than in the GraphQL module.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawResult {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub rest_id: String,
    #[serde(deserialize_with = "nullable")]
    pub core: RawCore,
    #[serde(deserialize_with = "nullable")]
    pub views: RawViews,
    #[serde(deserialize_with = "nullable")]
    pub note_tweet: RawNoteTweet,
    #[serde(deserialize_with = "nullable")]
    pub quoted_status_result: RawResultHolder,
    #[serde(deserialize_with = "nullable")]
    pub legacy: RawTweet,
    /// Present on `TweetWithVisibilityResults` wrappers.
    pub tweet: Option<Box<RawResult>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawResultHolder {
    pub result: Option<Box<RawResult>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawCore {
    pub user_results: RawUserResultHolder,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawUserResultHolder {
    pub result: Option<RawUserResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawUserResult {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub rest_id: String,
    pub is_blue_verified: bool,
    /// Set on `UserUnavailable` results, e.g. `Suspended`.
    pub reason: String,
    pub legacy: RawUser,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawNoteTweet {
    pub note_tweet_results: RawNoteTweetResults,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawNoteTweetResults {
    pub result: RawNoteTweetResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawNoteTweetResult {
    pub text: String,
}
