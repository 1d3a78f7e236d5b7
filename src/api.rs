//! Request executor: guest-token lifecycle, auth headers, rate-limit signal
//! and JSON decoding for every front-end API call.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::oauth;
use crate::session::Session;
use crate::transport::{HttpRequest, HttpResponse};
use crate::Scraper;

const RATE_LIMIT_REMAINING: &str = "x-rate-limit-remaining";
const GUEST_TOKEN: &str = "x-guest-token";
const CSRF_TOKEN: &str = "x-csrf-token";

/// One call to the front-end API.
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    url: Url,
    login_required: bool,
    profile_lookup: bool,
}

impl ApiRequest {
    pub(crate) fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub(crate) fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            login_required: false,
            profile_lookup: false,
        }
    }

    /// Fail with [`Error::NotLoggedIn`] instead of sending anonymously.
    pub(crate) fn login_required(mut self) -> Self {
        self.login_required = true;
        self
    }

    /// Private profiles answer 403 with a usable body.
    pub(crate) fn profile_lookup(mut self) -> Self {
        self.profile_lookup = true;
        self
    }
}

/// Error object embedded in many API bodies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiErrorItem {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GuestTokenResponse {
    guest_token: Option<String>,
}

impl Scraper {
    /// Send `request` and decode the JSON body into `T`.
    pub(crate) async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send_api(request).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    pub(crate) async fn send_api(&self, request: ApiRequest) -> Result<HttpResponse> {
        self.pace().await;

        let (authorization, guest_token) = {
            let mut session = self.inner.session.lock().await;
            if request.login_required && !session.is_authenticated() {
                return Err(Error::NotLoggedIn);
            }
            if !session.is_authenticated() && session.needs_guest_token(OffsetDateTime::now_utc())
            {
                self.issue_guest_token(&mut session).await?;
            }
            let authorization = match session.open_account() {
                Some(account) if session.is_authenticated() => {
                    oauth::authorization_header(&request.method, &request.url, account)?
                }
                _ => format!("Bearer {}", session.bearer_token()),
            };
            let guest_token =
                (!session.is_authenticated()).then(|| session.guest_token().to_owned());
            (authorization, guest_token)
        };

        let mut http = HttpRequest::new(request.method.clone(), request.url.clone());
        http.headers.insert(AUTHORIZATION, header_value(&authorization)?);
        if let Some(token) = &guest_token {
            http.headers
                .insert(HeaderName::from_static(GUEST_TOKEN), header_value(token)?);
        } else {
            http.headers.insert(
                HeaderName::from_static("x-twitter-auth-type"),
                HeaderValue::from_static("OAuth2Session"),
            );
        }
        self.attach_cookies(&mut http.headers, &request.url)?;

        debug!(method = %request.method, url = %request.url, anonymous = guest_token.is_some(), "api request");
        let response = self.send(http).await?;

        if response
            .headers
            .get(RATE_LIMIT_REMAINING)
            .is_some_and(|v| v.as_bytes() == b"0")
        {
            if let Some(used) = &guest_token {
                let mut session = self.inner.session.lock().await;
                // Only drop the token this request used; another task may
                // already have replaced it.
                if session.guest_token() == used {
                    session.invalidate_guest_token();
                    warn!(url = %request.url, "rate limit exhausted, guest token invalidated");
                }
            }
        }

        match response.status {
            StatusCode::OK => Ok(response),
            StatusCode::FORBIDDEN if request.profile_lookup => Ok(response),
            status => {
                debug!(%status, url = %request.url, "api request failed");
                Err(Error::Status {
                    status,
                    body: response.text(),
                })
            }
        }
    }

    /// Ask for a new guest token now, whatever the age of the current one.
    pub async fn refresh_guest_token(&self) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        self.issue_guest_token(&mut session).await
    }

    /// Runs with the session lock held so concurrent callers wait for the
    /// fresh token instead of each issuing their own.
    pub(crate) async fn issue_guest_token(&self, session: &mut Session) -> Result<()> {
        let url = self.inner.config.endpoints.guest_activate()?;
        let mut http = HttpRequest::new(Method::POST, url);
        http.headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", session.bearer_token()))?,
        );

        let response = self.send(http).await?;
        if response.status != StatusCode::OK {
            return Err(Error::Status {
                status: response.status,
                body: response.text(),
            });
        }
        let token = serde_json::from_slice::<GuestTokenResponse>(&response.body)?
            .guest_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Parse("guest_token not found".to_owned()))?;

        info!("issued new guest token");
        session.set_guest_token(token, OffsetDateTime::now_utc());
        Ok(())
    }

    /// Transport call that keeps the cookie jar in sync.
    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        let response = self.inner.transport.send(request).await?;
        self.inner
            .cookies
            .store_response_cookies(&url, &response.headers);
        Ok(response)
    }

    /// Session cookies plus the CSRF header the backend expects to mirror `ct0`.
    pub(crate) fn attach_cookies(&self, headers: &mut HeaderMap, url: &Url) -> Result<()> {
        if let Some(cookie) = self.inner.cookies.header_value(url) {
            headers.insert(COOKIE, header_value(&cookie)?);
        }
        if let Some(csrf) = self.inner.cookies.value(url, "ct0") {
            headers.insert(HeaderName::from_static(CSRF_TOKEN), header_value(&csrf)?);
        }
        Ok(())
    }

    /// Hold back until the configured delay has passed since the last call.
    pub(crate) async fn pace(&self) {
        let Some(delay) = self.inner.config.delay else {
            return;
        };
        let mut last = self.inner.last_request.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + delay).await;
        }
        *last = Some(tokio::time::Instant::now());
    }

    /// GraphQL GET URL with JSON-encoded `variables`, `features` and optional
    /// `fieldToggles` query parameters.
    pub(crate) fn graphql_url(
        &self,
        operation: &str,
        variables: &Value,
        field_toggles: Option<&Value>,
    ) -> Result<Url> {
        let mut url = self.inner.config.endpoints.graphql(operation)?;
        let mut query = format!(
            "variables={}&features={}",
            urlencoding::encode(&variables.to_string()),
            urlencoding::encode(&graphql_features().to_string()),
        );
        if let Some(toggles) = field_toggles {
            query.push_str("&fieldToggles=");
            query.push_str(&urlencoding::encode(&toggles.to_string()));
        }
        url.set_query(Some(&query));
        Ok(url)
    }
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Config(format!("invalid header value: {e}")))
}

fn graphql_features() -> Value {
    json!({
        "rweb_lists_timeline_redesign_enabled": true,
        "responsive_web_graphql_exclude_directive_enabled": true,
        "verified_phone_label_enabled": false,
        "creator_subscriptions_tweet_preview_api_enabled": true,
        "responsive_web_graphql_timeline_navigation_enabled": true,
        "responsive_web_graphql_skip_user_profile_image_extensions_enabled": false,
        "tweetypie_unmention_optimization_enabled": true,
        "responsive_web_edit_tweet_api_enabled": true,
        "graphql_is_translatable_rweb_tweet_is_translatable_enabled": true,
        "view_counts_everywhere_api_enabled": true,
        "longform_notetweets_consumption_enabled": true,
        "responsive_web_twitter_article_tweet_consumption_enabled": false,
        "tweet_awards_web_tipping_enabled": false,
        "freedom_of_speech_not_reach_fetch_enabled": true,
        "standardized_nudges_misinfo": true,
        "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled": true,
        "longform_notetweets_rich_text_read_enabled": true,
        "longform_notetweets_inline_media_enabled": true,
        "responsive_web_media_download_video_enabled": false,
        "responsive_web_enhance_cards_enabled": false,
        "hidden_profile_likes_enabled": false,
        "hidden_profile_subscriptions_enabled": false,
        "highlights_tweets_tab_ui_enabled": true,
        "subscriptions_verification_info_verified_since_enabled": true,
    })
}
