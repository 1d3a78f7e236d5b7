use super::raw::{RawUser, RawUserResult};
use super::tweet::parse_created_at;
use crate::tweet::Profile;

pub(crate) fn parse_profile(user: &RawUser) -> Profile {
    Profile {
        user_id: user.id_str.clone(),
        username: user.screen_name.clone(),
        name: user.name.clone(),
        biography: user.description.clone(),
        location: user.location.clone(),
        // Full-size avatar instead of the 48px thumbnail.
        avatar: user.profile_image_url_https.replacen("_normal.", ".", 1),
        banner: user.profile_banner_url.clone(),
        website: user
            .entities
            .url
            .urls
            .first()
            .map(|u| u.expanded_url.clone())
            .unwrap_or_default(),
        url: format!("https://twitter.com/{}", user.screen_name),
        is_private: user.protected,
        is_verified: user.verified,
        is_blue_verified: false,
        followers_count: user.followers_count,
        following_count: user.friends_count,
        tweets_count: user.statuses_count,
        likes_count: user.favourites_count,
        listed_count: user.listed_count,
        joined: parse_created_at(&user.created_at),
        pinned_tweet_ids: user.pinned_tweet_ids_str.clone(),
    }
}

/// GraphQL user results carry the id and blue check outside `legacy`.
pub(crate) fn parse_user_result(result: &RawUserResult) -> Profile {
    let mut profile = parse_profile(&result.legacy);
    if profile.user_id.is_empty() {
        profile.user_id = result.rest_id.clone();
    }
    profile.is_blue_verified = result.is_blue_verified;
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_user_fields() {
        let result: RawUserResult = serde_json::from_value(json!({
            "__typename": "User",
            "rest_id": "42",
            "is_blue_verified": true,
            "legacy": {
                "screen_name": "alice",
                "name": "Alice",
                "description": "bio",
                "created_at": "Mon Jan 02 15:04:05 +0000 2006",
                "profile_image_url_https": "https://pbs.twimg.com/profile_images/1/a_normal.jpg",
                "followers_count": 10,
                "friends_count": 4,
                "protected": null,
                "entities": { "url": { "urls": [{ "url": "https://t.co/x", "expanded_url": "https://alice.dev" }] } },
                "pinned_tweet_ids_str": ["100"]
            }
        }))
        .unwrap();
        let profile = parse_user_result(&result);
        assert_eq!(profile.user_id, "42");
        assert_eq!(profile.url, "https://twitter.com/alice");
        assert_eq!(profile.avatar, "https://pbs.twimg.com/profile_images/1/a.jpg");
        assert_eq!(profile.website, "https://alice.dev");
        assert_eq!(profile.following_count, 4);
        assert!(profile.is_blue_verified);
        assert!(!profile.is_private);
        assert_eq!(profile.joined.map(|t| t.unix_timestamp()), Some(1136214245));
        assert_eq!(profile.pinned_tweet_ids, vec!["100".to_owned()]);
    }
}
