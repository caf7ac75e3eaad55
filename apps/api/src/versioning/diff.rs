use serde::Serialize;
use similar::{Algorithm, ChangeTag, TextDiff};
use thiserror::Error;

use crate::models::version::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Unchanged,
    Added,
    Removed,
}

impl From<ChangeTag> for DiffKind {
    fn from(tag: ChangeTag) -> Self {
        match tag {
            ChangeTag::Equal => DiffKind::Unchanged,
            ChangeTag::Insert => DiffKind::Added,
            ChangeTag::Delete => DiffKind::Removed,
        }
    }
}

/// A contiguous run of lines sharing one change kind.
/// Lines keep their terminators so blocks concatenate back to the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffBlock {
    pub kind: DiffKind,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub blocks: Vec<DiffBlock>,
    pub lines_added: usize,
    pub lines_removed: usize,
}

impl DiffResult {
    pub fn is_identical(&self) -> bool {
        self.lines_added == 0 && self.lines_removed == 0
    }
}

#[cfg(test)]
impl DiffResult {
    fn collect(&self, keep: DiffKind) -> String {
        self.blocks
            .iter()
            .filter(|b| b.kind == DiffKind::Unchanged || b.kind == keep)
            .flat_map(|b| b.lines.iter().map(String::as_str))
            .collect()
    }

    /// Reassembles the old text from unchanged and removed blocks.
    pub fn old_text(&self) -> String {
        self.collect(DiffKind::Removed)
    }

    /// Reassembles the new text from unchanged and added blocks.
    pub fn new_text(&self) -> String {
        self.collect(DiffKind::Added)
    }
}

/// Line-level Myers diff of two texts, in display order from old to new.
pub fn diff_lines(old: &str, new: &str) -> DiffResult {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);

    let mut blocks: Vec<DiffBlock> = Vec::new();
    let mut lines_added = 0;
    let mut lines_removed = 0;

    for change in diff.iter_all_changes() {
        let kind = DiffKind::from(change.tag());
        match kind {
            DiffKind::Added => lines_added += 1,
            DiffKind::Removed => lines_removed += 1,
            DiffKind::Unchanged => {}
        }

        let line = change.value().to_string();
        match blocks.last_mut() {
            Some(block) if block.kind == kind => block.lines.push(line),
            _ => blocks.push(DiffBlock {
                kind,
                lines: vec![line],
            }),
        }
    }

    DiffResult {
        blocks,
        lines_added,
        lines_removed,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Version {tag} has no text to compare")]
pub struct MissingText {
    pub tag: String,
}

/// Diffs the bodies of two versions. Refuses when either body is missing
/// instead of diffing against an empty string.
pub fn compare_versions(base: &Version, target: &Version) -> Result<DiffResult, MissingText> {
    let text_of = |v: &Version| {
        v.text.clone().ok_or_else(|| MissingText {
            tag: v.tag().unwrap_or("(untagged)").to_string(),
        })
    };
    let old = text_of(base)?;
    let new = text_of(target)?;
    Ok(diff_lines(&old, &new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::marketplace::MarketplaceStatus;

    fn version(tag: &str, text: Option<&str>) -> Version {
        Version {
            version_tag: Some(tag.to_string()),
            text: text.map(str::to_string),
            change_message: None,
            language_code: None,
            created_at: None,
            is_active: None,
            marketplace_status: MarketplaceStatus::NotPublished,
        }
    }

    #[test]
    fn test_identical_texts_are_all_unchanged() {
        let text = "You are a helpful assistant.\nAnswer briefly.\n";
        let d = diff_lines(text, text);
        assert!(d.is_identical());
        assert_eq!(d.blocks.len(), 1);
        assert_eq!(d.blocks[0].kind, DiffKind::Unchanged);
        assert_eq!(d.blocks[0].lines.len(), 2);
    }

    #[test]
    fn test_changed_line_is_removed_then_added() {
        let d = diff_lines("a\nb\nc\n", "a\nB\nc\n");
        let kinds: Vec<_> = d.blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiffKind::Unchanged,
                DiffKind::Removed,
                DiffKind::Added,
                DiffKind::Unchanged
            ]
        );
        assert_eq!(d.lines_added, 1);
        assert_eq!(d.lines_removed, 1);
    }

    #[test]
    fn test_round_trip_reconstructs_both_sides() {
        let cases = [
            ("", ""),
            ("", "new\n"),
            ("old\n", ""),
            ("one\ntwo\nthree", "one\n2\nthree\nfour"),
            ("no trailing newline", "no trailing newline\n"),
            ("x\n\n\ny\n", "\ny\nx\n"),
        ];
        for (old, new) in cases {
            let d = diff_lines(old, new);
            assert_eq!(d.old_text(), old, "old side of {old:?} -> {new:?}");
            assert_eq!(d.new_text(), new, "new side of {old:?} -> {new:?}");
        }
    }

    #[test]
    fn test_consecutive_lines_share_a_block() {
        let d = diff_lines("keep\n", "keep\nadd 1\nadd 2\n");
        assert_eq!(d.blocks.len(), 2);
        assert_eq!(d.blocks[1].kind, DiffKind::Added);
        assert_eq!(d.blocks[1].lines, vec!["add 1\n", "add 2\n"]);
    }

    #[test]
    fn test_compare_versions_refuses_missing_text() {
        let err = compare_versions(&version("1.0.0", None), &version("1.0.1", Some("x")))
            .unwrap_err();
        assert_eq!(err.tag, "1.0.0");
        assert!(compare_versions(&version("1.0.0", Some("x")), &version("1.0.1", None)).is_err());
    }

    #[test]
    fn test_compare_versions_with_empty_text() {
        let d = compare_versions(&version("1.0.0", Some("")), &version("1.0.1", Some("hi\n")))
            .unwrap();
        assert_eq!(d.lines_added, 1);
        assert_eq!(d.lines_removed, 0);
    }
}
