use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::version::Version;
use crate::versioning::reference::{Reference, LATEST};
use crate::versioning::tag::normalize;

static PROMPT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("prompt name pattern is valid"));
static ASSET_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("asset key pattern is valid"));
static LANGUAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2}(-[A-Z]{2})?$").expect("language pattern is valid"));

const MAX_PROMPT_NAME_LEN: usize = 100;

/// Words that name fixed routes next to `.../versions/:tag`. A version with
/// one of these tags could not be addressed by its tag.
const RESERVED_TAGS: [&str; 3] = [LATEST, "compare", "selection"];

/// Characters that would break a reference token if they appeared in a field.
fn has_token_delimiters(s: &str) -> bool {
    s.contains([':', '{', '}'])
}

/// Validates a new tag against the parent's existing versions.
/// Tags are compared after stripping the `v` prefix, so `v1.0.0` and `1.0.0`
/// count as duplicates.
pub fn validate_new_tag(tag: &str, existing: &[Version]) -> Result<(), String> {
    if tag.trim().is_empty() {
        return Err("Version tag is required".to_string());
    }
    if tag.chars().any(char::is_whitespace) {
        return Err(format!("Version tag '{tag}' must not contain whitespace"));
    }
    if has_token_delimiters(tag) {
        return Err(format!(
            "Version tag '{tag}' must not contain ':', '{{' or '}}'"
        ));
    }
    if let Some(word) = RESERVED_TAGS.iter().find(|w| tag.eq_ignore_ascii_case(w)) {
        return Err(format!("'{word}' is reserved and cannot be used as a tag"));
    }
    let wanted = normalize(tag);
    if existing
        .iter()
        .filter_map(Version::tag)
        .any(|t| normalize(t) == wanted)
    {
        return Err(format!("Version tag '{tag}' already exists"));
    }
    Ok(())
}

pub fn validate_text(text: &str, what: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err(format!("{what} is required"));
    }
    Ok(())
}

pub fn validate_prompt_name(name: &str) -> Result<(), String> {
    if name.len() > MAX_PROMPT_NAME_LEN {
        return Err(format!(
            "Prompt name must be at most {MAX_PROMPT_NAME_LEN} characters"
        ));
    }
    if !PROMPT_NAME_RE.is_match(name) {
        return Err(
            "Prompt name must start with a letter and contain only letters, digits, '_' or '-'"
                .to_string(),
        );
    }
    Ok(())
}

pub fn validate_asset_key<'a>(
    key: &str,
    existing: impl IntoIterator<Item = &'a str>,
) -> Result<(), String> {
    if !ASSET_KEY_RE.is_match(key) {
        return Err("Asset key may only contain letters, digits and '_'".to_string());
    }
    if existing.into_iter().any(|k| k == key) {
        return Err(format!("Asset key '{key}' already exists in this project"));
    }
    Ok(())
}

pub fn validate_language_code(code: &str) -> Result<(), String> {
    if !LANGUAGE_RE.is_match(code) {
        return Err(format!(
            "Language code '{code}' must look like 'es' or 'es-ES'"
        ));
    }
    Ok(())
}

/// Rejects references whose fields would produce a malformed token.
pub fn validate_reference(reference: &Reference) -> Result<(), String> {
    for field in reference.fields() {
        if field.trim().is_empty() {
            return Err("Reference fields must not be empty".to_string());
        }
        if has_token_delimiters(field) {
            return Err(format!(
                "Reference field '{field}' must not contain ':', '{{' or '}}'"
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::marketplace::MarketplaceStatus;
    use crate::versioning::reference::VersionSelector;

    fn v(tag: &str) -> Version {
        Version {
            version_tag: Some(tag.to_string()),
            text: None,
            change_message: None,
            language_code: None,
            created_at: None,
            is_active: None,
            marketplace_status: MarketplaceStatus::NotPublished,
        }
    }

    #[test]
    fn test_new_tag_ok() {
        assert!(validate_new_tag("1.0.1", &[v("1.0.0")]).is_ok());
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        assert!(validate_new_tag("1.0.0", &[v("1.0.0")]).is_err());
        assert!(validate_new_tag("v1.0.0", &[v("1.0.0")]).is_err());
    }

    #[test]
    fn test_bad_tags_rejected() {
        assert!(validate_new_tag("", &[]).is_err());
        assert!(validate_new_tag("   ", &[]).is_err());
        assert!(validate_new_tag("1.0 beta", &[]).is_err());
        assert!(validate_new_tag("1:0", &[]).is_err());
        assert!(validate_new_tag("Latest", &[]).is_err());
    }

    #[test]
    fn test_route_words_reserved() {
        for tag in ["latest", "compare", "selection", "Compare", "SELECTION"] {
            let err = validate_new_tag(tag, &[]).unwrap_err();
            assert!(err.contains("reserved"), "{tag}: {err}");
        }
        assert!(validate_new_tag("selection-2", &[]).is_ok());
        assert!(validate_new_tag("compare.1", &[]).is_ok());
    }

    #[test]
    fn test_prompt_names() {
        assert!(validate_prompt_name("welcome_email").is_ok());
        assert!(validate_prompt_name("Support-Bot2").is_ok());
        assert!(validate_prompt_name("2fast").is_err());
        assert!(validate_prompt_name("has space").is_err());
        assert!(validate_prompt_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_asset_keys() {
        assert!(validate_asset_key("greeting_key", ["other"]).is_ok());
        assert!(validate_asset_key("greeting_key", ["greeting_key"]).is_err());
        assert!(validate_asset_key("greeting-key", [] as [&str; 0]).is_err());
    }

    #[test]
    fn test_language_codes() {
        assert!(validate_language_code("es").is_ok());
        assert!(validate_language_code("es-ES").is_ok());
        assert!(validate_language_code("ES").is_err());
        assert!(validate_language_code("spanish").is_err());
    }

    #[test]
    fn test_reference_fields() {
        let ok = Reference::Prompt {
            prompt_id: "p1".into(),
            version: VersionSelector::Latest,
            language_code: None,
        };
        assert!(validate_reference(&ok).is_ok());

        let bad = Reference::Asset { key: "a:b".into() };
        assert!(validate_reference(&bad).is_err());

        let empty = Reference::Prompt {
            prompt_id: "".into(),
            version: VersionSelector::Tag("1.0.0".into()),
            language_code: None,
        };
        assert!(validate_reference(&empty).is_err());
    }
}
