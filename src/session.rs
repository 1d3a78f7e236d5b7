//! Credential state shared by every request a [`crate::Scraper`] makes.
//!
//! Nothing here performs I/O. The request executor owns the only
//! [`Session`] behind an async mutex and is the single writer.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Bearer token used by the public web client for anonymous access.
pub const PUBLIC_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAAPYXBAAAAAAACLXUNDekMxqa8h%2F40K4moUkGsoc%3DTYfbDKbT3jJPCEVnMYqilB28NHfOPqkca3qaAxGfsyKCs0wRbw";

/// Bearer token the login flow and authenticated requests run under.
pub const AUTH_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

/// Guest tokens older than this are reissued before use.
pub const GUEST_TOKEN_TTL: Duration = Duration::hours(3);

/// OAuth1 token pair handed out by the open-account flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAccount {
    pub oauth_token: String,
    pub oauth_token_secret: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    bearer_token: String,
    guest_token: String,
    guest_issued_at: Option<OffsetDateTime>,
    authenticated: bool,
    open_account: Option<OpenAccount>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            bearer_token: PUBLIC_BEARER_TOKEN.to_owned(),
            guest_token: String::new(),
            guest_issued_at: None,
            authenticated: false,
            open_account: None,
        }
    }
}

impl Session {
    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    /// Guest tokens are scoped to the bearer token that issued them, so
    /// switching bearer always drops the current guest token.
    pub fn set_bearer_token(&mut self, token: &str) {
        self.bearer_token = token.to_owned();
        self.invalidate_guest_token();
    }

    /// Empty when no guest token is held.
    pub fn guest_token(&self) -> &str {
        &self.guest_token
    }

    pub fn guest_issued_at(&self) -> Option<OffsetDateTime> {
        self.guest_issued_at
    }

    pub fn set_guest_token(&mut self, token: impl Into<String>, issued_at: OffsetDateTime) {
        self.guest_token = token.into();
        self.guest_issued_at = Some(issued_at);
    }

    pub fn invalidate_guest_token(&mut self) {
        self.guest_token.clear();
        self.guest_issued_at = None;
    }

    /// True when an anonymous request at `now` must first obtain a guest token.
    pub fn needs_guest_token(&self, now: OffsetDateTime) -> bool {
        if self.guest_token.is_empty() {
            return true;
        }
        match self.guest_issued_at {
            Some(issued_at) => now - issued_at > GUEST_TOKEN_TTL,
            None => true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    pub fn open_account(&self) -> Option<&OpenAccount> {
        self.open_account.as_ref()
    }

    pub fn set_open_account(&mut self, account: Option<OpenAccount>) {
        self.open_account = account;
    }

    /// Back to a fresh anonymous session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
