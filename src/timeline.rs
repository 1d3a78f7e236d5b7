use reqwest::header::{HeaderValue, REFERER};
use reqwest::{Method, StatusCode, Url};
use serde_json::json;
use tracing::debug;

use crate::api::ApiRequest;
use crate::config::TimelineSource;
use crate::error::{Error, Result};
use crate::parse::{Page, Payload};
use crate::stream::{stream, TimelineStream};
use crate::transport::HttpRequest;
use crate::tweet::Tweet;
use crate::Scraper;

const USER_TWEETS: &str = "V7H0Ap3_Hh2FyS75OCDO3Q/UserTweets";
const USER_TWEETS_AND_REPLIES: &str = "E4wA5vo2sjVyvpliUffSCw/UserTweetsAndReplies";

/// Largest page the user timeline endpoints serve.
const MAX_TIMELINE_PAGE: usize = 200;

impl Scraper {
    /// Stream up to `max_tweets` tweets of `username`, newest first.
    pub fn get_tweets(&self, username: &str, max_tweets: usize) -> TimelineStream<Tweet> {
        let scraper = self.clone();
        stream(username, max_tweets, move |username, count, cursor| {
            let scraper = scraper.clone();
            async move {
                let page = scraper.fetch_tweets(&username, count, &cursor).await?;
                Ok::<_, Error>(page.into_parts())
            }
        })
    }

    /// One page of a user timeline from the configured source.
    pub async fn fetch_tweets(
        &self,
        username: &str,
        max_tweets: usize,
        cursor: &str,
    ) -> Result<Page<Tweet>> {
        let count = max_tweets.min(MAX_TIMELINE_PAGE);
        match self.inner.config.timeline_source {
            TimelineSource::GraphQl => {
                let user_id = self.get_user_id_by_screen_name(username).await?;
                self.fetch_user_tweets(&user_id, count, cursor).await
            }
            TimelineSource::Legacy => {
                let user_id = self.get_user_id_by_screen_name(username).await?;
                self.fetch_legacy_timeline(&user_id, count, cursor).await
            }
            TimelineSource::Syndication => self.fetch_syndication_timeline(username, cursor).await,
        }
    }

    async fn fetch_user_tweets(
        &self,
        user_id: &str,
        count: usize,
        cursor: &str,
    ) -> Result<Page<Tweet>> {
        let mut variables = json!({
            "userId": user_id,
            "count": count,
            "includePromotedContent": false,
            "withQuickPromoteEligibilityTweetFields": false,
            "withVoice": true,
            "withV2Timeline": true,
        });
        if !cursor.is_empty() {
            variables["cursor"] = json!(cursor);
        }
        let operation = if self.inner.config.include_replies {
            USER_TWEETS_AND_REPLIES
        } else {
            USER_TWEETS
        };
        let url = self.graphql_url(operation, &variables, None)?;

        let response = self.send_api(ApiRequest::get(url)).await?;
        Ok(Payload::from_user_tweets_json(&response.body)?.parse_tweets())
    }

    async fn fetch_legacy_timeline(
        &self,
        user_id: &str,
        count: usize,
        cursor: &str,
    ) -> Result<Page<Tweet>> {
        let mut url = self.inner.config.endpoints.legacy_profile_timeline(user_id)?;
        append_legacy_params(&mut url, self.inner.config.include_replies);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("count", &count.to_string());
            if !cursor.is_empty() {
                query.append_pair("cursor", cursor);
            }
        }

        let response = self.send_api(ApiRequest::get(url)).await?;
        Ok(Payload::from_legacy_json(&response.body)?.parse_tweets())
    }

    /// The embeddable timeline needs neither a guest token nor a bearer.
    async fn fetch_syndication_timeline(
        &self,
        username: &str,
        cursor: &str,
    ) -> Result<Page<Tweet>> {
        let mut url = self.inner.config.endpoints.syndication_timeline()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("screen_name", username);
            query.append_pair(
                "with_replies",
                if self.inner.config.include_replies {
                    "true"
                } else {
                    "false"
                },
            );
            if !cursor.is_empty() {
                query.append_pair("max_position", cursor);
            }
        }

        let mut http = HttpRequest::new(Method::GET, url.clone());
        http.headers
            .insert(REFERER, HeaderValue::from_static("https://publish.twitter.com/"));
        self.pace().await;
        debug!(%url, "syndication request");
        let response = self.send(http).await?;
        if response.status != StatusCode::OK {
            return Err(Error::Status {
                status: response.status,
                body: response.text(),
            });
        }
        Ok(Payload::from_syndication_json(&response.body)?.parse_tweets())
    }
}

/// Flags the REST endpoints need to return full tweet objects.
pub(crate) fn append_legacy_params(url: &mut Url, include_replies: bool) {
    let mut query = url.query_pairs_mut();
    for (key, value) in [
        ("include_profile_interstitial_type", "1"),
        ("include_blocking", "1"),
        ("include_blocked_by", "1"),
        ("include_followed_by", "1"),
        ("include_want_retweets", "1"),
        ("include_mute_edge", "1"),
        ("include_can_dm", "1"),
        ("include_can_media_tag", "1"),
        ("skip_status", "1"),
        ("cards_platform", "Web-12"),
        ("include_cards", "1"),
        ("include_ext_alt_text", "true"),
        ("include_quote_count", "true"),
        ("include_reply_count", "1"),
        ("tweet_mode", "extended"),
        ("include_entities", "true"),
        ("include_user_entities", "true"),
        ("include_ext_media_color", "true"),
        ("include_ext_media_availability", "true"),
        ("send_error_codes", "true"),
        ("simple_quoted_tweet", "true"),
        ("ext", "mediaStats,highlightedLabel"),
    ] {
        query.append_pair(key, value);
    }
    query.append_pair(
        "include_tweet_replies",
        if include_replies { "true" } else { "false" },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_params_request_extended_tweets() {
        let mut url = Url::parse("https://api.twitter.com/2/timeline/profile/1.json").unwrap();
        append_legacy_params(&mut url, true);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("tweet_mode".to_owned(), "extended".to_owned())));
        assert!(pairs.contains(&("include_tweet_replies".to_owned(), "true".to_owned())));
        assert!(url.as_str().contains("ext=mediaStats%2ChighlightedLabel"));
    }
}
