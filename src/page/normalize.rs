// src/page/normalize.rs
// =============================================================================
// URL normalization.
//
// Two spellings of the same page must map to the same string, otherwise the
// dedup filter lets duplicates through. The rules:
// - drop the fragment (#section)
// - drop every query parameter except page, lang and id
// - lower-case scheme and host
// - an empty path becomes "/"
// =============================================================================

use std::borrow::Cow;
use url::Url;

use crate::error::NormalizeError;

/// Query parameters that select different content and must survive.
const KEPT_QUERY_PARAMS: [&str; 3] = ["page", "lang", "id"];

/// Returns the canonical form of `raw`.
///
/// Example:
///   "HTTP://Example.com/path#frag?utm_source=x&page=2"
///   -> "http://example.com/path?page=2"
pub fn normalize_url(raw: &str) -> Result<String, NormalizeError> {
    let raw = raw.trim();
    let candidate = recover_query_from_fragment(raw);

    let mut url = Url::parse(&candidate).map_err(|source| NormalizeError::Malformed {
        url: raw.to_string(),
        source,
    })?;

    let host = match url.host_str() {
        Some(host) => host.to_string(),
        None => return Err(NormalizeError::MissingHost(raw.to_string())),
    };

    url.set_fragment(None);

    // Kept pairs are sorted by key so parameter order never creates a
    // second spelling of the same page.
    let mut kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| KEPT_QUERY_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    kept.sort_by(|a, b| a.0.cmp(&b.0));

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept.iter())
            .finish();
        url.set_query(Some(&query));
    }

    // The url crate already lower-cases special schemes (http, https, ...)
    // and their hosts; opaque hosts keep their case unless we do it here.
    let lowered = host.to_lowercase();
    if lowered != host && url.set_host(Some(&lowered)).is_err() {
        return Err(NormalizeError::MissingHost(raw.to_string()));
    }

    if url.path().is_empty() {
        url.set_path("/");
    }

    Ok(url.into())
}

// A '?' after the '#' is almost always a query that was pasted behind an
// anchor. The fragment itself is dropped, but its query part is folded back
// into the real query so allow-listed parameters are not lost.
fn recover_query_from_fragment(raw: &str) -> Cow<'_, str> {
    let Some((head, fragment)) = raw.split_once('#') else {
        return Cow::Borrowed(raw);
    };

    match fragment.split_once('?') {
        Some((_, query)) if !query.is_empty() => {
            let separator = if head.contains('?') { '&' } else { '?' };
            Cow::Owned(format!("{head}{separator}{query}"))
        }
        _ => Cow::Borrowed(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_fragment_and_unlisted_params() {
        let normalized = normalize_url("HTTP://Example.com/path#frag?utm_source=x&page=2").unwrap();
        assert_eq!(normalized, "http://example.com/path?page=2");
    }

    #[test]
    fn test_empty_path_defaults_to_slash() {
        assert_eq!(normalize_url("http://example.com").unwrap(), "http://example.com/");
    }

    #[test]
    fn test_plain_fragment_is_stripped() {
        assert_eq!(
            normalize_url("https://example.com/docs#install").unwrap(),
            "https://example.com/docs"
        );
    }

    #[test]
    fn test_keeps_allow_listed_params_sorted() {
        let normalized =
            normalize_url("https://example.com/a?page=3&utm_medium=mail&id=7&lang=en").unwrap();
        assert_eq!(normalized, "https://example.com/a?id=7&lang=en&page=3");
    }

    #[test]
    fn test_removes_query_when_nothing_is_kept() {
        assert_eq!(
            normalize_url("https://example.com/a?utm_source=x&ref=y").unwrap(),
            "https://example.com/a"
        );
    }

    #[test]
    fn test_is_idempotent() {
        let once = normalize_url("HTTPS://WWW.Example.COM/Path?lang=de&x=1#top").unwrap();
        let twice = normalize_url(&once).unwrap();
        assert_eq!(once, twice);
        // Path case is significant and left alone
        assert_eq!(once, "https://www.example.com/Path?lang=de");
    }

    #[test]
    fn test_malformed_url_fails() {
        assert!(matches!(
            normalize_url("not a url"),
            Err(NormalizeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_url_without_host_fails() {
        assert!(matches!(
            normalize_url("mailto:someone@example.com"),
            Err(NormalizeError::MissingHost(_))
        ));
    }
}
