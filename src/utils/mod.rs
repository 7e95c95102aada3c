//! Utility functions and helpers.

pub mod html;
pub mod http;
pub mod time;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Last non-empty path segment of an href, e.g. the code in `/view-dept/114/1/300`.
pub fn last_path_segment(href: &str) -> &str {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(href)
}

/// Value of a string made only of decimal digits.
///
/// ASCII and full-width (`０`-`９`) digits are accepted. Empty input, any
/// other character and overflow give `None`.
pub fn parse_decimal(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    text.chars().try_fold(0u64, |acc, c| {
        let digit = match c {
            '0'..='9' => c as u32 - '0' as u32,
            '\u{ff10}'..='\u{ff19}' => c as u32 - 0xff10,
            _ => return None,
        };
        acc.checked_mul(10)?.checked_add(u64::from(digit))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/path/").unwrap();
        assert_eq!(
            resolve_url(&base, "page.html"),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            resolve_url(&base, "/root.html"),
            "https://example.com/root.html"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("30"), Some(30));
        assert_eq!(parse_decimal("３０"), Some(30));
        assert_eq!(parse_decimal("1２3"), Some(123));
        assert_eq!(parse_decimal("5000000000"), Some(5_000_000_000));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("40%"), None);
        assert_eq!(parse_decimal("99999999999999999999999"), None);
    }

    #[test]
    fn test_last_path_segment() {
        assert_eq!(last_path_segment("/view-dept/114/1/300"), "300");
        assert_eq!(last_path_segment("/view-dept/114/1/everything/"), "everything");
        assert_eq!(last_path_segment("plain"), "plain");
    }
}
