use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::raw::{RawMedia, RawUrl};
use crate::tweet::{Gif, Photo, Video};

static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\B#\S+\b").unwrap());
static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\B@\S{1,15}\b").unwrap());
static SHORT_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https://t\.co/[A-Za-z0-9]{10}").unwrap());

/// Media already attached to the tweet, used to append images that no short
/// link in the text points at.
pub(crate) struct AttachedMedia<'a> {
    pub photos: &'a [Photo],
    pub videos: &'a [Video],
    pub gifs: &'a [Gif],
}

/// Render tweet text as HTML.
///
/// Short links are substituted after hashtags and mentions so their anchor
/// text is never linked a second time.
pub(crate) fn render_html(
    text: &str,
    urls: &[RawUrl],
    media: &[RawMedia],
    attached: AttachedMedia<'_>,
) -> String {
    let html = HASHTAG_RE.replace_all(text, |caps: &Captures| {
        let tag = &caps[0];
        format!(
            r#"<a href="https://twitter.com/hashtag/{}">{}</a>"#,
            tag.trim_start_matches('#'),
            tag
        )
    });
    let html = USERNAME_RE.replace_all(&html, |caps: &Captures| {
        let mention = &caps[0];
        format!(
            r#"<a href="https://twitter.com/{}">{}</a>"#,
            mention.trim_start_matches('@'),
            mention
        )
    });

    let mut emitted: Vec<&str> = Vec::new();
    let mut html = SHORT_LINK_RE
        .replace_all(&html, |caps: &Captures| {
            let short = &caps[0];
            if let Some(entity) = urls.iter().find(|u| u.url == short) {
                return format!(r#"<a href="{}">{}</a>"#, entity.expanded_url, short);
            }
            if let Some(entity) = media.iter().find(|m| m.url == short) {
                emitted.push(&entity.media_url_https);
                return format!(
                    r#"<br><a href="{}"><img src="{}"/></a>"#,
                    short, entity.media_url_https
                );
            }
            short.to_owned()
        })
        .into_owned();

    let previews = attached
        .photos
        .iter()
        .map(|p| p.url.as_str())
        .chain(attached.videos.iter().map(|v| v.preview.as_str()))
        .chain(attached.gifs.iter().map(|g| g.preview.as_str()));
    for url in previews {
        if !emitted.contains(&url) {
            html.push_str(&format!(r#"<br><img src="{url}"/>"#));
        }
    }

    html.replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_media() -> AttachedMedia<'static> {
        AttachedMedia {
            photos: &[],
            videos: &[],
            gifs: &[],
        }
    }

    #[test]
    fn links_hashtags_and_mentions() {
        let html = render_html("hi @jack see #rust", &[], &[], no_media());
        assert_eq!(
            html,
            r#"hi <a href="https://twitter.com/jack">@jack</a> see <a href="https://twitter.com/hashtag/rust">#rust</a>"#
        );
    }

    #[test]
    fn short_links_expand_to_url_or_media() {
        let urls = vec![RawUrl {
            url: "https://t.co/AAAAAAAAAA".into(),
            expanded_url: "https://example.com/page".into(),
        }];
        let media = vec![RawMedia {
            url: "https://t.co/BBBBBBBBBB".into(),
            media_url_https: "https://pbs.twimg.com/media/x.jpg".into(),
            kind: "photo".into(),
            ..Default::default()
        }];
        let photos = vec![Photo {
            id: "1".into(),
            url: "https://pbs.twimg.com/media/x.jpg".into(),
        }];
        let html = render_html(
            "read https://t.co/AAAAAAAAAA\nhttps://t.co/BBBBBBBBBB",
            &urls,
            &media,
            AttachedMedia {
                photos: &photos,
                videos: &[],
                gifs: &[],
            },
        );
        assert_eq!(
            html,
            concat!(
                r#"read <a href="https://example.com/page">https://t.co/AAAAAAAAAA</a><br>"#,
                r#"<br><a href="https://t.co/BBBBBBBBBB"><img src="https://pbs.twimg.com/media/x.jpg"/></a>"#
            )
        );
    }

    #[test]
    fn media_without_short_link_is_appended() {
        let videos = vec![Video {
            id: "9".into(),
            preview: "https://pbs.twimg.com/thumb.jpg".into(),
            url: "https://video.twimg.com/v.mp4".into(),
        }];
        let html = render_html(
            "clip",
            &[],
            &[],
            AttachedMedia {
                photos: &[],
                videos: &videos,
                gifs: &[],
            },
        );
        assert_eq!(html, r#"clip<br><img src="https://pbs.twimg.com/thumb.jpg"/>"#);
    }

    #[test]
    fn unknown_short_link_is_left_alone() {
        let html = render_html("https://t.co/CCCCCCCCCC", &[], &[], no_media());
        assert_eq!(html, "https://t.co/CCCCCCCCCC");
    }
}
