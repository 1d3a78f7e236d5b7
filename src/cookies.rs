use cookie::Cookie;
use dashmap::DashMap;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::Url;
use tracing::debug;

/// Session cookies keyed by domain and name.
///
/// A cookie stored for `twitter.com` is also sent to `api.twitter.com`.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: DashMap<(String, String), Cookie<'static>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cookies_for(&self, url: &Url) -> Vec<Cookie<'static>> {
        let Some(host) = url.host_str() else {
            return Vec::new();
        };
        self.cookies
            .iter()
            .filter(|entry| domain_matches(host, &entry.key().0))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Cookies without an explicit domain are scoped to the host of `url`.
    pub fn set_cookies<I>(&self, url: &Url, cookies: I)
    where
        I: IntoIterator<Item = Cookie<'static>>,
    {
        let host = url.host_str().unwrap_or_default();
        for cookie in cookies {
            let domain = cookie
                .domain()
                .map(|d| d.trim_start_matches('.').to_ascii_lowercase())
                .unwrap_or_else(|| host.to_ascii_lowercase());
            let key = (domain, cookie.name().to_owned());
            if cookie.value().is_empty() {
                self.cookies.remove(&key);
            } else {
                self.cookies.insert(key, cookie);
            }
        }
    }

    pub fn clear(&self) {
        self.cookies.clear();
    }

    /// Every stored cookie with its domain filled in.
    pub(crate) fn all(&self) -> Vec<Cookie<'static>> {
        self.cookies
            .iter()
            .map(|entry| {
                let mut cookie = entry.value().clone();
                cookie.set_domain(entry.key().0.clone());
                cookie
            })
            .collect()
    }

    /// Store every `Set-Cookie` header of a response. Malformed headers are
    /// skipped.
    pub(crate) fn store_response_cookies(&self, url: &Url, headers: &HeaderMap) {
        let parsed = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| match Cookie::parse(value.to_owned()) {
                Ok(cookie) => Some(cookie),
                Err(e) => {
                    debug!(error = %e, "skipping malformed Set-Cookie header");
                    None
                }
            })
            .collect::<Vec<_>>();
        if !parsed.is_empty() {
            self.set_cookies(url, parsed);
        }
    }

    /// Value for a `Cookie` request header, if any cookie applies.
    pub(crate) fn header_value(&self, url: &Url) -> Option<String> {
        let cookies = self.cookies_for(url);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|c| format!("{}={}", c.name(), c.value()))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub(crate) fn value(&self, url: &Url, name: &str) -> Option<String> {
        self.cookies_for(url)
            .into_iter()
            .find(|c| c.name() == name)
            .map(|c| c.value().to_owned())
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn parent_domain_cookies_reach_subdomains() {
        let jar = CookieJar::new();
        let mut cookie = Cookie::new("ct0", "csrf");
        cookie.set_domain(".twitter.com");
        jar.set_cookies(&url("https://twitter.com/"), [cookie]);

        assert_eq!(
            jar.value(&url("https://api.twitter.com/1.1/x.json"), "ct0")
                .as_deref(),
            Some("csrf")
        );
        assert!(jar.cookies_for(&url("https://example.com/")).is_empty());
        assert!(jar.cookies_for(&url("https://nottwitter.com/")).is_empty());
    }

    #[test]
    fn response_cookies_are_stored_and_replaced() {
        let jar = CookieJar::new();
        let target = url("https://api.twitter.com/1.1/onboarding/task.json");
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("auth_token=a1; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("ct0=c1; Secure"));
        jar.store_response_cookies(&target, &headers);

        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("ct0=c2"));
        jar.store_response_cookies(&target, &headers);

        assert_eq!(jar.value(&target, "ct0").as_deref(), Some("c2"));
        let header = jar.header_value(&target).unwrap();
        assert!(header.contains("auth_token=a1"));
        assert!(header.contains("ct0=c2"));
    }

    #[test]
    fn empty_value_deletes_and_clear_empties() {
        let jar = CookieJar::new();
        let target = url("https://twitter.com/");
        jar.set_cookies(&target, [Cookie::new("a", "1"), Cookie::new("b", "2")]);
        jar.set_cookies(&target, [Cookie::new("a", "")]);
        assert_eq!(jar.cookies_for(&target).len(), 1);

        let all = jar.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].domain(), Some("twitter.com"));

        jar.clear();
        assert!(jar.header_value(&target).is_none());
    }
}
