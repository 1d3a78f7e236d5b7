use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::api::{ApiErrorItem, ApiRequest};
use crate::error::{Error, Result};
use crate::parse::parse_user_result;
use crate::parse::raw::RawUserResultHolder;
use crate::tweet::Profile;
use crate::Scraper;

const USER_BY_SCREEN_NAME: &str = "G3KGOASz96M-Qu0nwmGXNg/UserByScreenName";

const USER_NOT_FOUND: i64 = 50;
const USER_SUSPENDED: i64 = 63;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserByScreenName {
    errors: Vec<ApiErrorItem>,
    data: UserData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserData {
    user: RawUserResultHolder,
}

impl Scraper {
    /// Look up a profile by screen name. The id is remembered in the
    /// user-id cache.
    pub async fn get_profile(&self, username: &str) -> Result<Profile> {
        let variables = json!({
            "screen_name": username,
            "withSafetyModeUserFields": true,
        });
        let field_toggles = json!({ "withAuxiliaryUserLabels": false });
        let url = self.graphql_url(USER_BY_SCREEN_NAME, &variables, Some(&field_toggles))?;

        let response: UserByScreenName = self
            .execute(ApiRequest::get(url).profile_lookup())
            .await?;
        let profile = profile_from_response(username, response)?;
        self.inner
            .config
            .user_ids
            .insert(username, &profile.user_id);
        Ok(profile)
    }

    /// Resolve a screen name to its user id, from the cache when possible.
    pub async fn get_user_id_by_screen_name(&self, username: &str) -> Result<String> {
        if let Some(id) = self.inner.config.user_ids.get(username) {
            debug!(%username, "user id cache hit");
            return Ok(id);
        }
        Ok(self.get_profile(username).await?.user_id)
    }
}

fn profile_from_response(username: &str, response: UserByScreenName) -> Result<Profile> {
    match response.data.user.result {
        Some(result) if result.typename == "UserUnavailable" => {
            debug!(%username, reason = %result.reason, "user unavailable");
            Err(Error::Suspended(username.to_owned()))
        }
        Some(result) if !result.rest_id.is_empty() => Ok(parse_user_result(&result)),
        _ => Err(match response.errors.into_iter().next() {
            Some(e) if e.code == USER_NOT_FOUND => Error::NotFound(username.to_owned()),
            Some(e) if e.code == USER_SUSPENDED => Error::Suspended(username.to_owned()),
            Some(e) => Error::Api {
                code: e.code,
                message: e.message,
            },
            None => Error::NotFound(username.to_owned()),
        }),
    }
}
