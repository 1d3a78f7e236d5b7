//! OAuth 1.0a request signing for open-account sessions.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Method, Url};
use sha1::Sha1;
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::session::OpenAccount;

/// Consumer credentials of the official Android app.
pub(crate) const APP_CONSUMER_KEY: &str = "3nVuSoBZnx6U4vzUxf5w";
pub(crate) const APP_CONSUMER_SECRET: &str = "Bcs59EFbbsdF6Sl9Ng71smgStWEGwXXKSjYvPVt7qys";

/// RFC 3986 unreserved characters stay as they are.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Build the `Authorization` header for `method url`, signing query
/// parameters together with the OAuth ones.
pub(crate) fn authorization_header(
    method: &Method,
    url: &Url,
    account: &OpenAccount,
) -> Result<String> {
    let now = OffsetDateTime::now_utc();
    sign(
        method,
        url,
        account,
        &now.unix_timestamp().to_string(),
        &format!("{:x}", now.unix_timestamp_nanos()),
    )
}

fn sign(
    method: &Method,
    url: &Url,
    account: &OpenAccount,
    timestamp: &str,
    nonce: &str,
) -> Result<String> {
    let mut oauth_params = vec![
        ("oauth_consumer_key".to_owned(), APP_CONSUMER_KEY.to_owned()),
        ("oauth_nonce".to_owned(), nonce.to_owned()),
        ("oauth_signature_method".to_owned(), "HMAC-SHA1".to_owned()),
        ("oauth_timestamp".to_owned(), timestamp.to_owned()),
        ("oauth_token".to_owned(), account.oauth_token.clone()),
        ("oauth_version".to_owned(), "1.0".to_owned()),
    ];

    let mut all_params = oauth_params.clone();
    all_params.extend(
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned())),
    );
    let mut encoded = all_params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect::<Vec<_>>();
    encoded.sort();
    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut base_url = url.clone();
    base_url.set_query(None);
    base_url.set_fragment(None);
    let base_string = format!(
        "{}&{}&{}",
        method.as_str().to_uppercase(),
        encode(base_url.as_str()),
        encode(&param_string)
    );
    let signing_key = format!(
        "{}&{}",
        encode(APP_CONSUMER_SECRET),
        encode(&account.oauth_token_secret)
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(signing_key.as_bytes())
        .map_err(|e| Error::Config(format!("oauth signing key: {e}")))?;
    mac.update(base_string.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());
    oauth_params.push(("oauth_signature".to_owned(), signature));

    let header = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {header}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> OpenAccount {
        OpenAccount {
            oauth_token: "token".into(),
            oauth_token_secret: "secret".into(),
        }
    }

    #[test]
    fn encodes_reserved_characters_only() {
        assert_eq!(encode("a b=c&d"), "a%20b%3Dc%26d");
        assert_eq!(encode("safe-._~"), "safe-._~");
    }

    #[test]
    fn signature_is_deterministic_for_fixed_nonce() {
        let url = Url::parse("https://api.twitter.com/graphql/x?variables=%7B%7D").unwrap();
        let a = sign(&Method::GET, &url, &account(), "1700000000", "abc").unwrap();
        let b = sign(&Method::GET, &url, &account(), "1700000000", "abc").unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("OAuth "));
        assert!(a.contains("oauth_token=\"token\""));
        assert!(a.contains("oauth_signature=\""));

        let other = sign(&Method::POST, &url, &account(), "1700000000", "abc").unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn live_header_has_all_oauth_fields() {
        let url = Url::parse("https://api.twitter.com/1.1/account/verify_credentials.json").unwrap();
        let header = authorization_header(&Method::GET, &url, &account()).unwrap();
        for field in [
            "oauth_consumer_key",
            "oauth_nonce",
            "oauth_signature_method",
            "oauth_timestamp",
            "oauth_version",
        ] {
            assert!(header.contains(field), "{field} missing from {header}");
        }
    }
}
