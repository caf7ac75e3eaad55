//! Version tag ordering.
//!
//! Tags are compared as plain strings once an optional leading `v`/`V` is
//! stripped. The comparison is lexicographic, not per-segment numeric, so
//! `"10.0.0"` sorts before `"2.0.0"`. Callers rely on this exact ordering;
//! do not replace it with semver ordering without changing every call site.

use std::cmp::Ordering;

/// Strips one leading `v` or `V`.
pub fn normalize(tag: &str) -> &str {
    tag.strip_prefix(['v', 'V']).unwrap_or(tag)
}

/// Orders two possibly-missing tags. A missing tag compares as the empty string.
pub fn compare_tags(a: Option<&str>, b: Option<&str>) -> Ordering {
    normalize(a.unwrap_or("")).cmp(normalize(b.unwrap_or("")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_single_prefix() {
        assert_eq!(normalize("v1.0.0"), "1.0.0");
        assert_eq!(normalize("V1.0.0"), "1.0.0");
        assert_eq!(normalize("1.0.0"), "1.0.0");
        assert_eq!(normalize("vv1"), "v1");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_prefix_does_not_affect_order() {
        assert_eq!(compare_tags(Some("v1.2.0"), Some("1.2.0")), Ordering::Equal);
        assert_eq!(compare_tags(Some("V1.3.0"), Some("v1.2.0")), Ordering::Greater);
    }

    #[test]
    fn test_order_is_lexicographic() {
        assert_eq!(compare_tags(Some("10.0.0"), Some("2.0.0")), Ordering::Less);
        assert_eq!(compare_tags(Some("v1.10.0"), Some("v1.9.0")), Ordering::Less);
    }

    #[test]
    fn test_missing_tag_sorts_first() {
        assert_eq!(compare_tags(None, Some("0.0.1")), Ordering::Less);
        assert_eq!(compare_tags(None, Some("")), Ordering::Equal);
        assert_eq!(compare_tags(None, Some("v")), Ordering::Equal);
    }
}
