use reqwest::Url;
use tracing::debug;

const TOKEN_PARAM: &str = "token";

/// Read the `token` query parameter from a page URL.
///
/// Accepts absolute URLs and site-relative ones such as
/// `/admin-login?token=...`. Absent, empty or unparseable all give `None`.
pub fn token_from_url(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).or_else(|_| {
        Url::parse("http://localhost/").and_then(|base| base.join(page_url))
    });

    let url = match parsed {
        Ok(url) => url,
        Err(e) => {
            debug!("Unable to parse page URL '{}': {}", page_url, e);
            return None;
        }
    };

    url.query_pairs()
        .find(|(key, _)| key == TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_absolute_url() {
        assert_eq!(
            token_from_url("https://app.example.com/admin-login?token=abc123&x=1"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_token_from_relative_url_is_decoded() {
        assert_eq!(
            token_from_url("/direct-login?token=a%2Bb.c"),
            Some("a+b.c".to_string())
        );
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert_eq!(token_from_url("https://app.example.com/admin-login"), None);
        assert_eq!(token_from_url("/admin-login?token="), None);
        assert_eq!(token_from_url("/admin-login?tokens=abc"), None);
    }

    #[test]
    fn test_first_token_wins() {
        assert_eq!(token_from_url("/x?token=one&token=two"), Some("one".to_string()));
    }
}
