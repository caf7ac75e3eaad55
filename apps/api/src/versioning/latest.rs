use std::cmp::Ordering;

use crate::models::version::Version;
use crate::versioning::tag::compare_tags;

/// Returns the tag judged latest by `compare_tags`, or `None` when the list is
/// empty or no version carries a tag. Among equal tags the last one wins.
pub fn resolve_latest(versions: &[Version]) -> Option<String> {
    versions
        .iter()
        .filter_map(Version::tag)
        .fold(None, |best: Option<&str>, tag| match best {
            Some(b) if compare_tags(Some(tag), Some(b)) == Ordering::Less => Some(b),
            _ => Some(tag),
        })
        .map(str::to_string)
}

/// Returns the versions sorted newest first, by the same ordering.
pub fn sorted_newest_first(versions: &[Version]) -> Vec<Version> {
    let mut sorted = versions.to_vec();
    sorted.sort_by(|a, b| compare_tags(b.tag(), a.tag()));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::marketplace::MarketplaceStatus;

    fn v(tag: Option<&str>) -> Version {
        Version {
            version_tag: tag.map(str::to_string),
            text: Some("body".into()),
            change_message: None,
            language_code: None,
            created_at: None,
            is_active: None,
            marketplace_status: MarketplaceStatus::NotPublished,
        }
    }

    #[test]
    fn test_empty_list_has_no_latest() {
        assert_eq!(resolve_latest(&[]), None);
    }

    #[test]
    fn test_untagged_versions_have_no_latest() {
        assert_eq!(resolve_latest(&[v(None), v(None)]), None);
    }

    #[test]
    fn test_lexicographic_latest() {
        let versions = [v(Some("v1.0.0")), v(Some("v2.0.0")), v(Some("v10.0.0"))];
        assert_eq!(resolve_latest(&versions).as_deref(), Some("v2.0.0"));
    }

    #[test]
    fn test_untagged_versions_are_skipped() {
        let versions = [v(None), v(Some("1.0.0")), v(None)];
        assert_eq!(resolve_latest(&versions).as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_ties_keep_last_spelling() {
        let versions = [v(Some("1.0.0")), v(Some("v1.0.0"))];
        assert_eq!(resolve_latest(&versions).as_deref(), Some("v1.0.0"));
    }

    #[test]
    fn test_new_tag_becomes_latest() {
        let mut versions = vec![v(Some("1.0.0"))];
        versions.push(v(Some("1.0.1")));
        assert_eq!(resolve_latest(&versions).as_deref(), Some("1.0.1"));
    }

    #[test]
    fn test_sorted_newest_first() {
        let versions = [v(Some("1.0.0")), v(Some("1.2.0")), v(Some("1.1.0"))];
        let tags: Vec<_> = sorted_newest_first(&versions)
            .iter()
            .map(|v| v.tag().unwrap().to_string())
            .collect();
        assert_eq!(tags, vec!["1.2.0", "1.1.0", "1.0.0"]);
    }
}
