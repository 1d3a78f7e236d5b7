//! Client for the Twitter/X web front-end API.
//!
//! A [`Scraper`] owns the credential state, the cookie jar and the HTTP
//! transport. Every query goes through it, and paginated queries come back as
//! a [`TimelineStream`].
//!
//! ```no_run
//! # async fn run() -> twitter_scraper::Result<()> {
//! use futures_util::StreamExt;
//! use twitter_scraper::{Scraper, ScraperConfig};
//!
//! let scraper = Scraper::new(ScraperConfig::default())?;
//! let mut tweets = scraper.get_tweets("jack", 20);
//! while let Some(tweet) = tweets.next().await {
//!     println!("{}", tweet?.text);
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod auth;
mod cache;
mod config;
mod cookies;
mod error;
mod oauth;
pub mod parse;
mod profile;
mod search;
mod session;
mod stream;
mod timeline;
mod transport;
mod tweet;
mod tweets;

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;

pub use cache::UserIdCache;
pub use config::{Endpoints, ScraperConfig, SearchMode, TimelineSource};
pub use cookie::Cookie;
pub use cookies::CookieJar;
pub use error::{Error, ErrorKind, Result};
pub use parse::{Page, Payload};
pub use session::{OpenAccount, Session, AUTH_BEARER_TOKEN, PUBLIC_BEARER_TOKEN};
pub use stream::{stream, Paginated, TimelineStream};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use tweet::{BoundingBox, Gif, Mention, Photo, Place, Profile, Tweet, Video};

/// Handle to one scraping session. Clones share the same session, cookies
/// and transport.
#[derive(Clone)]
pub struct Scraper {
    inner: Arc<Inner>,
}

struct Inner {
    config: ScraperConfig,
    transport: Arc<dyn Transport>,
    cookies: CookieJar,
    session: Mutex<Session>,
    last_request: Mutex<Option<Instant>>,
}

impl Scraper {
    /// Scraper backed by a `reqwest` client built from the config's timeout
    /// and proxy.
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout, config.proxy.as_deref())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: ScraperConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                cookies: CookieJar::new(),
                session: Mutex::new(Session::default()),
                last_request: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.inner.config
    }

    pub fn user_ids(&self) -> &UserIdCache {
        &self.inner.config.user_ids
    }

    /// Copy of the current credential state.
    pub async fn session(&self) -> Session {
        self.inner.session.lock().await.clone()
    }

    /// Use a guest token obtained elsewhere instead of activating one.
    pub async fn set_guest_token(&self, token: impl Into<String>) {
        self.inner
            .session
            .lock()
            .await
            .set_guest_token(token, time::OffsetDateTime::now_utc());
    }

    /// Whether requests currently run as a logged-in user.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.session.lock().await.is_authenticated()
    }
}

impl std::fmt::Debug for Scraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scraper")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
