use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use typed_builder::TypedBuilder;

use crate::cache::UserIdCache;
use crate::error::{Error, Result};

#[derive(TypedBuilder, Debug, Clone)]
pub struct ScraperConfig {
    #[builder(default = Duration::from_secs(10))]
    pub timeout: Duration,

    /// `http://`, `https://` or `socks5://` proxy URL.
    #[builder(setter(into, strip_option), default)]
    pub proxy: Option<String>,

    /// Minimum pause between two API calls.
    #[builder(setter(strip_option), default)]
    pub delay: Option<Duration>,

    #[builder(default)]
    pub search_mode: SearchMode,

    #[builder(default)]
    pub timeline_source: TimelineSource,

    #[builder(default)]
    pub include_replies: bool,

    #[builder(default)]
    pub endpoints: Endpoints,

    #[builder(default)]
    pub user_ids: Arc<UserIdCache>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SearchMode {
    #[default]
    Top,
    Latest,
    Photos,
    Videos,
    Users,
}

impl SearchMode {
    pub(crate) fn product(self) -> &'static str {
        match self {
            Self::Top => "Top",
            Self::Latest => "Latest",
            Self::Photos => "Photos",
            Self::Videos => "Videos",
            Self::Users => "People",
        }
    }
}

/// Which backend serves user timelines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TimelineSource {
    /// GraphQL `UserTweets`.
    #[default]
    #[value(name = "graphql")]
    GraphQl,
    /// REST `globalObjects` timeline.
    Legacy,
    /// Embeddable HTML timeline.
    Syndication,
}

/// Base URLs of the hosts the scraper talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api: String,
    pub web: String,
    pub syndication: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api: "https://api.twitter.com".to_owned(),
            web: "https://twitter.com".to_owned(),
            syndication: "https://syndication.twitter.com".to_owned(),
        }
    }
}

impl Endpoints {
    /// Point every host at one base URL, typically a local mock server.
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            api: base.clone(),
            web: base.clone(),
            syndication: base,
        }
    }

    pub(crate) fn guest_activate(&self) -> Result<Url> {
        join(&self.api, "/1.1/guest/activate.json")
    }

    pub(crate) fn onboarding_task(&self) -> Result<Url> {
        join(&self.api, "/1.1/onboarding/task.json")
    }

    pub(crate) fn oauth2_token(&self) -> Result<Url> {
        join(&self.api, "/oauth2/token")
    }

    pub(crate) fn verify_credentials(&self) -> Result<Url> {
        join(&self.api, "/1.1/account/verify_credentials.json")
    }

    pub(crate) fn logout(&self) -> Result<Url> {
        join(&self.api, "/1.1/account/logout.json")
    }

    pub(crate) fn legacy_profile_timeline(&self, user_id: &str) -> Result<Url> {
        join(&self.api, &format!("/2/timeline/profile/{user_id}.json"))
    }

    pub(crate) fn graphql(&self, operation: &str) -> Result<Url> {
        join(&self.web, &format!("/i/api/graphql/{operation}"))
    }

    pub(crate) fn syndication_timeline(&self) -> Result<Url> {
        join(&self.syndication, "/timeline/profile")
    }

    /// Cookies are read against this URL when exporting a session.
    pub(crate) fn cookie_url(&self) -> Result<Url> {
        join(&self.web, "/")
    }
}

fn join(base: &str, path: &str) -> Result<Url> {
    let url = format!("{}{}", base.trim_end_matches('/'), path);
    Url::parse(&url).map_err(|e| Error::Config(format!("invalid url {url:?}: {e}")))
}
