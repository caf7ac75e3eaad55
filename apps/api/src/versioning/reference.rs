//! Reference tokens let one prompt or asset body embed another entity:
//!
//! ```text
//! {{prompt:<promptId>:<versionSelector>}}
//! {{prompt:<promptId>:<versionSelector>:<languageCode>}}
//! {{asset:<assetKey>}}
//! ```
//!
//! The upstream server resolves tokens when a prompt is served. This side
//! builds them and splices them into text being edited; `parse_references`
//! exists for previews and is not used to rewrite text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::version::Version;

pub const LATEST: &str = "latest";

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{(prompt|asset):([^:}]+)(?::([^:}]+))?(?::([^:}]+))?\}\}")
        .expect("reference token pattern is valid")
});

/// Which version of a prompt a token points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VersionSelector {
    Latest,
    Tag(String),
}

impl VersionSelector {
    /// Picks the selector for a prompt reference. A prompt without versions,
    /// or an explicit choice of "latest", always yields `Latest`.
    pub fn choose(chosen: Option<&str>, versions: &[Version]) -> Self {
        match chosen {
            _ if versions.is_empty() => VersionSelector::Latest,
            None => VersionSelector::Latest,
            Some(tag) => VersionSelector::from(tag.to_string()),
        }
    }
}

impl From<String> for VersionSelector {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case(LATEST) {
            VersionSelector::Latest
        } else {
            VersionSelector::Tag(s)
        }
    }
}

impl From<VersionSelector> for String {
    fn from(s: VersionSelector) -> Self {
        s.to_string()
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => f.write_str(LATEST),
            VersionSelector::Tag(tag) => f.write_str(tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reference {
    #[serde(rename_all = "camelCase")]
    Prompt {
        prompt_id: String,
        version: VersionSelector,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language_code: Option<String>,
    },
    Asset { key: String },
}

impl Reference {
    /// The text fields that end up between the token delimiters.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Reference::Prompt {
                prompt_id,
                version,
                language_code,
            } => {
                let mut fields = vec![prompt_id.as_str()];
                if let VersionSelector::Tag(tag) = version {
                    fields.push(tag);
                }
                if let Some(lang) = language_code {
                    fields.push(lang);
                }
                fields
            }
            Reference::Asset { key } => vec![key.as_str()],
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Reference::Prompt {
                prompt_id,
                version,
                language_code,
            } => encode_prompt_ref(prompt_id, &version.to_string(), language_code.as_deref()),
            Reference::Asset { key } => encode_asset_ref(key),
        };
        f.write_str(&token)
    }
}

/// Assets never carry a version or language; the server serves the active value.
pub fn encode_asset_ref(key: &str) -> String {
    format!("{{{{asset:{key}}}}}")
}

/// `version` is a tag or `latest` in any case; `latest` is written lowercase.
pub fn encode_prompt_ref(prompt_id: &str, version: &str, language_code: Option<&str>) -> String {
    let version = VersionSelector::from(version.to_string());
    match language_code {
        Some(lang) => format!("{{{{prompt:{prompt_id}:{version}:{lang}}}}}"),
        None => format!("{{{{prompt:{prompt_id}:{version}}}}}"),
    }
}

/// Result of splicing a token into edited text. `caret` is a character offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Splice {
    pub text: String,
    pub caret: usize,
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Replaces the selected range `[start, end)` (character offsets) with `token`
/// and puts the caret right after it. A reversed range is normalised and
/// offsets past the end clamp to the end.
pub fn insert_at_selection(text: &str, start: usize, end: usize, token: &str) -> Splice {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let from = byte_offset(text, start);
    let to = byte_offset(text, end);

    let mut spliced = String::with_capacity(text.len() + token.len());
    spliced.push_str(&text[..from]);
    spliced.push_str(token);
    spliced.push_str(&text[to..]);

    Splice {
        caret: text[..from].chars().count() + token.chars().count(),
        text: spliced,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundReference {
    pub reference: Reference,
    pub token: String,
    /// Character offsets of the token within the scanned text.
    pub start: usize,
    pub end: usize,
}

/// Finds well-formed reference tokens in `text`. Malformed tokens, including
/// prompt tokens without a version and asset tokens with extra fields, are
/// left alone.
pub fn parse_references(text: &str) -> Vec<FoundReference> {
    TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id = caps.get(2)?.as_str().to_string();
            let second = caps.get(3).map(|m| m.as_str().to_string());
            let third = caps.get(4).map(|m| m.as_str().to_string());

            let reference = match (&caps[1], second, third) {
                ("asset", None, None) => Reference::Asset { key: id },
                ("prompt", Some(version), language_code) => Reference::Prompt {
                    prompt_id: id,
                    version: VersionSelector::from(version),
                    language_code,
                },
                _ => return None,
            };

            let start = text[..whole.start()].chars().count();
            Some(FoundReference {
                reference,
                token: whole.as_str().to_string(),
                start,
                end: start + whole.as_str().chars().count(),
            })
        })
        .collect()
}
