//! Login flows against the onboarding task endpoint, plus session cookie
//! import and export.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use cookie::Cookie;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::api::{header_value, ApiErrorItem, ApiRequest};
use crate::error::{Error, Result};
use crate::oauth::{APP_CONSUMER_KEY, APP_CONSUMER_SECRET};
use crate::session::{OpenAccount, AUTH_BEARER_TOKEN};
use crate::transport::HttpRequest;
use crate::Scraper;

const FLOW_USER_AGENT: &str = "TwitterAndroid/99";

/// Subtasks after which the flow cannot continue on its own.
const TERMINAL_SUBTASKS: [&str; 4] = [
    "LoginEnterAlternateIdentifierSubtask",
    "LoginAcid",
    "LoginTwoFactorAuthChallenge",
    "DenyLoginSubtask",
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FlowResponse {
    errors: Vec<ApiErrorItem>,
    flow_token: String,
    status: String,
    subtasks: Vec<Subtask>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Subtask {
    subtask_id: String,
    open_account: Option<OpenAccount>,
}

impl FlowResponse {
    /// A structured error, or the id of a subtask that blocks the flow.
    fn error(&self) -> Option<Error> {
        if let Some(e) = self.errors.first() {
            return Some(Error::Auth {
                code: e.code,
                message: e.message.clone(),
            });
        }
        let subtask = &self.subtasks.first()?.subtask_id;
        TERMINAL_SUBTASKS
            .contains(&subtask.as_str())
            .then(|| Error::Auth {
                code: 0,
                message: subtask.clone(),
            })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VerifyCredentials {
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AccessToken {
    access_token: String,
}

/// One request of the password login flow.
#[derive(Debug, Clone, Copy)]
enum LoginStep<'a> {
    Start,
    JsInstrumentation,
    EnterIdentifier(&'a str),
    EnterPassword(&'a str),
    DuplicationCheck,
    Confirmation { subtask: &'a str, text: &'a str },
}

impl LoginStep<'_> {
    fn payload(&self, flow_token: &str) -> Value {
        let input = match *self {
            Self::Start => return start_payload("login"),
            Self::JsInstrumentation => json!({
                "subtask_id": "LoginJsInstrumentationSubtask",
                "js_instrumentation": { "response": "{}", "link": "next_link" }
            }),
            Self::EnterIdentifier(username) => json!({
                "subtask_id": "LoginEnterUserIdentifierSSO",
                "settings_list": {
                    "setting_responses": [{
                        "key": "user_identifier",
                        "response_data": { "text_data": { "result": username } }
                    }],
                    "link": "next_link"
                }
            }),
            Self::EnterPassword(password) => json!({
                "subtask_id": "LoginEnterPassword",
                "enter_password": { "password": password, "link": "next_link" }
            }),
            Self::DuplicationCheck => json!({
                "subtask_id": "AccountDuplicationCheck",
                "check_logged_in_account": { "link": "AccountDuplicationCheck_false" }
            }),
            Self::Confirmation { subtask, text } => json!({
                "subtask_id": subtask,
                "enter_text": { "text": text, "link": "next_link" }
            }),
        };
        continue_payload(flow_token, input)
    }
}

fn start_payload(flow_name: &str) -> Value {
    json!({
        "flow_name": flow_name,
        "input_flow_data": {
            "flow_context": {
                "debug_overrides": {},
                "start_location": { "location": "splash_screen" }
            }
        }
    })
}

fn continue_payload(flow_token: &str, input: Value) -> Value {
    json!({ "flow_token": flow_token, "subtask_inputs": [input] })
}

/// Which confirmation challenge an auth error asks for, if any.
///
/// Matches on the subtask name inside the error text. The backend renames
/// these from time to time, so this is the one place to update.
pub(crate) fn confirmation_subtask(message: &str) -> Option<&'static str> {
    ["LoginAcid", "LoginTwoFactorAuthChallenge"]
        .into_iter()
        .find(|subtask| message.contains(subtask))
}

impl Scraper {
    /// Log in with a password. `confirmation` answers an email, phone or
    /// two-factor challenge if the backend asks for one.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        confirmation: Option<&str>,
    ) -> Result<()> {
        if username.is_empty() || password.is_empty() {
            return Err(Error::InvalidCredentials);
        }

        let result = self.run_login(username, password, confirmation).await;
        let mut session = self.inner.session.lock().await;
        match result {
            Ok(()) => {
                session.set_authenticated(true);
                info!(%username, "logged in");
                Ok(())
            }
            Err(e) => {
                session.reset();
                warn!(%username, error = %e, "login failed");
                Err(e)
            }
        }
    }

    async fn run_login(
        &self,
        username: &str,
        password: &str,
        confirmation: Option<&str>,
    ) -> Result<()> {
        {
            let mut session = self.inner.session.lock().await;
            session.set_authenticated(false);
            session.set_open_account(None);
            session.set_bearer_token(AUTH_BEARER_TOKEN);
            self.issue_guest_token(&mut session).await?;
        }

        let mut token = self.flow_step(&LoginStep::Start.payload("")).await?;
        for step in [
            LoginStep::JsInstrumentation,
            LoginStep::EnterIdentifier(username),
            LoginStep::EnterPassword(password),
        ] {
            token = self.flow_step(&step.payload(&token)).await?;
        }

        let check = self
            .flow(&LoginStep::DuplicationCheck.payload(&token))
            .await?;
        let Some(err) = check.error() else {
            return Ok(());
        };
        let Some(subtask) = confirmation_subtask(&err.to_string()) else {
            return Err(err);
        };
        let Some(text) = confirmation else {
            return Err(Error::ConfirmationRequired(subtask.to_owned()));
        };
        debug!(subtask, "answering login challenge");
        self.flow_step(&LoginStep::Confirmation { subtask, text }.payload(&check.flow_token))
            .await?;
        Ok(())
    }

    /// Obtain an OAuth1 token pair without credentials. Requests made
    /// afterwards are signed with it.
    pub async fn login_open_account(&self) -> Result<OpenAccount> {
        let result = self.run_open_account().await;
        let mut session = self.inner.session.lock().await;
        match result {
            Ok(account) => {
                session.set_open_account(Some(account.clone()));
                session.set_authenticated(true);
                info!("open account session established");
                Ok(account)
            }
            Err(e) => {
                session.reset();
                warn!(error = %e, "open account login failed");
                Err(e)
            }
        }
    }

    async fn run_open_account(&self) -> Result<OpenAccount> {
        let access_token = self.client_credentials_token().await?;
        {
            let mut session = self.inner.session.lock().await;
            session.set_authenticated(false);
            session.set_open_account(None);
            session.set_bearer_token(&access_token);
            self.issue_guest_token(&mut session).await?;
        }

        let token = self.flow_step(&start_payload("welcome")).await?;
        let flow = self
            .flow(&continue_payload(
                &token,
                json!({ "subtask_id": "NextTaskOpenLink" }),
            ))
            .await?;
        if let Some(err) = flow.error() {
            return Err(err);
        }

        flow.subtasks
            .into_iter()
            .next()
            .filter(|s| s.subtask_id == "OpenAccount")
            .and_then(|s| s.open_account)
            .filter(|a| !a.oauth_token.is_empty() && !a.oauth_token_secret.is_empty())
            .ok_or_else(|| Error::Auth {
                code: 0,
                message: "OpenAccount subtask missing from flow".to_owned(),
            })
    }

    async fn client_credentials_token(&self) -> Result<String> {
        let url = self.inner.config.endpoints.oauth2_token()?;
        let credentials = BASE64.encode(format!("{APP_CONSUMER_KEY}:{APP_CONSUMER_SECRET}"));

        let mut http = HttpRequest::new(Method::POST, url);
        http.headers
            .insert(AUTHORIZATION, header_value(&format!("Basic {credentials}"))?);
        http.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        http.body = Some(b"grant_type=client_credentials".to_vec());

        self.pace().await;
        let response = self.send(http).await?;
        if response.status != StatusCode::OK {
            return Err(Error::Status {
                status: response.status,
                body: response.text(),
            });
        }
        let token: AccessToken = serde_json::from_slice(&response.body)?;
        if token.access_token.is_empty() {
            return Err(Error::Parse("access_token not found".to_owned()));
        }
        Ok(token.access_token)
    }

    /// Post a flow payload and return the next flow token, failing on any
    /// error the step reports.
    async fn flow_step(&self, payload: &Value) -> Result<String> {
        let flow = self.flow(payload).await?;
        match flow.error() {
            Some(err) => Err(err),
            None => Ok(flow.flow_token),
        }
    }

    async fn flow(&self, payload: &Value) -> Result<FlowResponse> {
        let url = self.inner.config.endpoints.onboarding_task()?;
        let (bearer, guest_token) = {
            let session = self.inner.session.lock().await;
            (
                session.bearer_token().to_owned(),
                session.guest_token().to_owned(),
            )
        };

        let mut http = HttpRequest::new(Method::POST, url.clone());
        let headers = &mut http.headers;
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {bearer}"))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(FLOW_USER_AGENT));
        headers.insert(
            HeaderName::from_static("x-guest-token"),
            header_value(&guest_token)?,
        );
        headers.insert(
            HeaderName::from_static("x-twitter-auth-type"),
            HeaderValue::from_static("OAuth2Client"),
        );
        headers.insert(
            HeaderName::from_static("x-twitter-active-user"),
            HeaderValue::from_static("yes"),
        );
        headers.insert(
            HeaderName::from_static("x-twitter-client-language"),
            HeaderValue::from_static("en"),
        );
        self.attach_cookies(&mut http.headers, &url)?;
        http.body = Some(serde_json::to_vec(payload)?);

        self.pace().await;
        let response = self.send(http).await?;
        match serde_json::from_slice::<FlowResponse>(&response.body) {
            Ok(flow) => {
                debug!(status = %flow.status, subtasks = flow.subtasks.len(), "flow step");
                Ok(flow)
            }
            Err(_) if response.status != StatusCode::OK => Err(Error::Status {
                status: response.status,
                body: response.text(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Check the session against the backend. A session that fails the
    /// check is rolled back to anonymous.
    pub async fn is_logged_in(&self) -> bool {
        {
            let mut session = self.inner.session.lock().await;
            session.set_authenticated(true);
            if session.open_account().is_none() {
                session.set_bearer_token(AUTH_BEARER_TOKEN);
            }
        }

        let verified = match self.inner.config.endpoints.verify_credentials() {
            Ok(url) => {
                self.execute::<VerifyCredentials>(ApiRequest::get(url))
                    .await
            }
            Err(e) => Err(e),
        };
        match verified {
            Ok(body) if body.errors.is_empty() => true,
            outcome => {
                if let Err(e) = outcome {
                    debug!(error = %e, "credential check failed");
                }
                self.inner.session.lock().await.reset();
                false
            }
        }
    }

    /// End the session server side, then forget every credential and cookie.
    pub async fn logout(&self) -> Result<()> {
        let authenticated = self.inner.session.lock().await.is_authenticated();
        if authenticated {
            let url = self.inner.config.endpoints.logout()?;
            self.send_api(ApiRequest::post(url)).await?;
        }
        self.inner.session.lock().await.reset();
        self.inner.cookies.clear();
        info!("logged out");
        Ok(())
    }

    /// Session cookies for persisting a login. Guest-scoped cookies are left
    /// out.
    pub fn cookies(&self) -> Vec<Cookie<'static>> {
        self.inner
            .cookies
            .all()
            .into_iter()
            .filter(|c| !c.name().contains("guest"))
            .collect()
    }

    /// Restore cookies saved with [`Scraper::cookies`]. Follow up with
    /// [`Scraper::is_logged_in`] to resume the session.
    pub fn set_cookies<I>(&self, cookies: I) -> Result<()>
    where
        I: IntoIterator<Item = Cookie<'static>>,
    {
        let url = self.inner.config.endpoints.cookie_url()?;
        self.inner.cookies.set_cookies(&url, cookies);
        Ok(())
    }

    pub fn clear_cookies(&self) {
        self.inner.cookies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(value: Value) -> FlowResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn start_payload_names_flow() {
        let payload = LoginStep::Start.payload("ignored");
        assert_eq!(payload["flow_name"], "login");
        assert_eq!(
            payload["input_flow_data"]["flow_context"]["start_location"]["location"],
            "splash_screen"
        );
        assert!(payload.get("flow_token").is_none());
    }

    #[test]
    fn steps_carry_flow_token_and_input() {
        let payload = LoginStep::EnterIdentifier("alice").payload("t1");
        assert_eq!(payload["flow_token"], "t1");
        let input = &payload["subtask_inputs"][0];
        assert_eq!(input["subtask_id"], "LoginEnterUserIdentifierSSO");
        assert_eq!(
            input["settings_list"]["setting_responses"][0]["response_data"]["text_data"]["result"],
            "alice"
        );

        let payload = LoginStep::Confirmation {
            subtask: "LoginAcid",
            text: "a@example.com",
        }
        .payload("t5");
        let input = &payload["subtask_inputs"][0];
        assert_eq!(input["subtask_id"], "LoginAcid");
        assert_eq!(input["enter_text"]["text"], "a@example.com");
    }

    #[test]
    fn duplication_check_declines_existing_account() {
        let payload = LoginStep::DuplicationCheck.payload("t4");
        assert_eq!(
            payload["subtask_inputs"][0]["check_logged_in_account"]["link"],
            "AccountDuplicationCheck_false"
        );
    }

    #[test]
    fn flow_error_prefers_structured_errors() {
        let response = flow(json!({
            "errors": [{ "code": 399, "message": "Wrong password" }],
            "subtasks": [{ "subtask_id": "LoginAcid" }]
        }));
        assert!(matches!(
            response.error(),
            Some(Error::Auth { code: 399, .. })
        ));
    }

    #[test]
    fn terminal_subtask_is_an_error() {
        let response = flow(json!({
            "flow_token": "t",
            "subtasks": [{ "subtask_id": "LoginTwoFactorAuthChallenge" }]
        }));
        let err = response.error().unwrap();
        assert_eq!(
            confirmation_subtask(&err.to_string()),
            Some("LoginTwoFactorAuthChallenge")
        );

        let ok = flow(json!({ "subtasks": [{ "subtask_id": "LoginSuccessSubtask" }] }));
        assert!(ok.error().is_none());
    }

    #[test]
    fn deny_login_needs_no_confirmation() {
        assert_eq!(confirmation_subtask("auth error (0): DenyLoginSubtask"), None);
        assert_eq!(
            confirmation_subtask("auth error (0): LoginAcid"),
            Some("LoginAcid")
        );
    }

    #[test]
    fn open_account_subtask_decodes_token_pair() {
        let response = flow(json!({ "subtasks": [{
            "subtask_id": "OpenAccount",
            "open_account": { "oauth_token": "k", "oauth_token_secret": "s" }
        }]}));
        let account = response.subtasks[0].open_account.as_ref().unwrap();
        assert_eq!(account.oauth_token, "k");
        assert_eq!(account.oauth_token_secret, "s");
    }
}
