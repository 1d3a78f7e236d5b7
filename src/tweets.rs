use serde_json::json;

use crate::api::ApiRequest;
use crate::error::{Error, Result};
use crate::parse::Payload;
use crate::tweet::Tweet;
use crate::Scraper;

const TWEET_DETAIL: &str = "xOhkmRac04YFZmOzU9PJHg/TweetDetail";

impl Scraper {
    /// Fetch a single tweet by id, with its reply parent and self-thread
    /// linked when they are part of the conversation.
    pub async fn get_tweet(&self, id: &str) -> Result<Tweet> {
        self.get_conversation(id)
            .await?
            .into_iter()
            .find(|tweet| tweet.id == id)
            .ok_or_else(|| Error::NotFound(id.to_owned()))
    }

    /// Every tweet of the conversation around `id`, in timeline order.
    pub async fn get_conversation(&self, id: &str) -> Result<Vec<Tweet>> {
        let variables = json!({
            "focalTweetId": id,
            "with_rux_injections": false,
            "includePromotedContent": true,
            "withCommunity": true,
            "withQuickPromoteEligibilityTweetFields": true,
            "withBirdwatchNotes": true,
            "withVoice": true,
            "withV2Timeline": true,
        });
        let field_toggles = json!({ "withArticleRichContentState": false });
        let url = self.graphql_url(TWEET_DETAIL, &variables, Some(&field_toggles))?;

        let response = self.send_api(ApiRequest::get(url)).await?;
        Ok(Payload::from_conversation_json(&response.body)?
            .parse_conversation()
            .items)
    }
}
