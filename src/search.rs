use serde_json::json;

use crate::api::ApiRequest;
use crate::config::SearchMode;
use crate::error::{Error, Result};
use crate::parse::{Page, Payload};
use crate::stream::{stream, TimelineStream};
use crate::tweet::{Profile, Tweet};
use crate::Scraper;

const SEARCH_TIMELINE: &str = "nK1dw4oV3k4w5TdtcAdSww/SearchTimeline";

/// The search endpoint refuses larger pages.
const MAX_SEARCH_PAGE: usize = 50;

impl Scraper {
    /// Stream tweets matching `query` in the configured [`SearchMode`].
    /// Requires a logged-in session.
    pub fn search_tweets(&self, query: &str, max_tweets: usize) -> TimelineStream<Tweet> {
        let scraper = self.clone();
        stream(query, max_tweets, move |query, count, cursor| {
            let scraper = scraper.clone();
            async move {
                let page = scraper.fetch_search_tweets(&query, count, &cursor).await?;
                Ok::<_, Error>(page.into_parts())
            }
        })
    }

    /// Stream accounts matching `query`. Requires a logged-in session.
    pub fn search_profiles(&self, query: &str, max_profiles: usize) -> TimelineStream<Profile> {
        let scraper = self.clone();
        stream(query, max_profiles, move |query, count, cursor| {
            let scraper = scraper.clone();
            async move {
                let page = scraper.fetch_search_profiles(&query, count, &cursor).await?;
                Ok::<_, Error>(page.into_parts())
            }
        })
    }

    pub async fn fetch_search_tweets(
        &self,
        query: &str,
        max_tweets: usize,
        cursor: &str,
    ) -> Result<Page<Tweet>> {
        let mode = self.inner.config.search_mode;
        let payload = self.search_timeline(query, max_tweets, mode, cursor).await?;
        Ok(payload.parse_tweets())
    }

    /// Profile search always uses the people tab, whatever the configured mode.
    pub async fn fetch_search_profiles(
        &self,
        query: &str,
        max_profiles: usize,
        cursor: &str,
    ) -> Result<Page<Profile>> {
        let payload = self
            .search_timeline(query, max_profiles, SearchMode::Users, cursor)
            .await?;
        Ok(payload.parse_profiles())
    }

    async fn search_timeline(
        &self,
        query: &str,
        max_count: usize,
        mode: SearchMode,
        cursor: &str,
    ) -> Result<Payload> {
        let mut variables = json!({
            "rawQuery": query,
            "count": max_count.min(MAX_SEARCH_PAGE),
            "querySource": "typed_query",
            "product": mode.product(),
        });
        if !cursor.is_empty() {
            variables["cursor"] = json!(cursor);
        }
        let field_toggles = json!({ "withArticleRichContentState": false });
        let url = self.graphql_url(SEARCH_TIMELINE, &variables, Some(&field_toggles))?;

        let response = self
            .send_api(ApiRequest::get(url).login_required())
            .await?;
        Payload::from_search_json(&response.body)
    }
}
