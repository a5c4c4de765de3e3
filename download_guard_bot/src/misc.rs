use teloxide::types::{Message, User};
use url::Url;

/// Try to parse a string as a [`Url`] the way Telegram does when it makes links
/// clickable: an `https://` prefix is implied, and `@username` means a `t.me` link.
///
/// # Errors
/// Errors if it fails to parse either way.
pub fn parse_url_like_telegram(string: &str) -> Result<Url, url::ParseError> {
    if let Some(username) = string.strip_prefix('@') {
        return Url::parse(&format!("https://t.me/{username}"));
    }

    match Url::parse(string) {
        Err(e @ url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{string}")).map_err(|_| e)
        }
        other => other,
    }
}

/// Is this an `http://` or `https://` URL with a host?
pub fn is_web_url(string: &str) -> bool {
    Url::parse(string.trim())
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
}

/// Lowercase host of the URL, or an empty string.
pub fn host_of(string: &str) -> String {
    parse_url_like_telegram(string.trim())
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}

/// Shorten a URL for display, keeping its start.
#[must_use]
pub fn shorten_url(url: &str, max_chars: usize) -> String {
    if url.chars().count() <= max_chars {
        return url.to_owned();
    }

    let mut short: String = url.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}

/// `@username`, or the full name linking to the user.
#[must_use]
pub fn user_name_prettyprint(user: &User) -> String {
    if let Some(username) = &user.username {
        return format!("@{username}");
    }

    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user.id,
        html_escape::encode_text(&user.full_name())
    )
}

/// Name of whoever sent this message, see [`user_name_prettyprint`].
#[must_use]
pub fn sender_name_prettyprint(message: &Message) -> String {
    if let Some(user) = &message.from {
        user_name_prettyprint(user)
    } else if let Some(chat) = &message.sender_chat {
        chat.title()
            .map(|x| html_escape::encode_text(x).into_owned())
            .unwrap_or_else(|| "someone".to_owned())
    } else {
        "someone".to_owned()
    }
}

/// A bar of `cells` cells, filled in proportion to `fraction`.
#[must_use]
pub fn progress_bar(fraction: f64, cells: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * cells as f64).round() as usize).min(cells);
    "█".repeat(filled) + &"░".repeat(cells - filled)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn telegram_like_parsing() {
        assert_eq!(
            parse_url_like_telegram("example.com/a").unwrap().as_str(),
            "https://example.com/a"
        );
        assert_eq!(
            parse_url_like_telegram("@someone").unwrap().as_str(),
            "https://t.me/someone"
        );
        assert_eq!(
            parse_url_like_telegram("http://example.com/").unwrap().scheme(),
            "http"
        );
        assert!(parse_url_like_telegram("").is_err());
        assert!(parse_url_like_telegram("exa mple.com").is_err());
    }

    #[test]
    fn web_urls() {
        assert!(is_web_url("https://example.com/"));
        assert!(is_web_url(" http://example.com/a?b "));
        assert!(!is_web_url("example.com"));
        assert!(!is_web_url("ftp://example.com/"));
        assert!(!is_web_url("magnet:?xt=urn:btih:abc"));
    }

    #[test]
    fn hosts() {
        assert_eq!(host_of("https://WWW.Example.com/a"), "www.example.com");
        assert_eq!(host_of("example.com"), "example.com");
        assert_eq!(host_of("magnet:?xt=urn:btih:abc"), "");
    }

    #[test]
    fn shortening() {
        assert_eq!(shorten_url("https://a.example/", 50), "https://a.example/");
        assert_eq!(shorten_url("https://a.example/abcdef", 10), "https://a…");
    }

    #[test]
    fn bars() {
        assert_eq!(progress_bar(0.0, 10), "░░░░░░░░░░");
        assert_eq!(progress_bar(0.5, 10), "█████░░░░░");
        assert_eq!(progress_bar(2.6, 10), "██████████");
    }
}
