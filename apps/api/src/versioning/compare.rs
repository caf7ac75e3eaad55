use serde::Serialize;
use thiserror::Error;

/// Maximum number of versions that can be compared at once.
pub const MAX_SELECTED: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("You can only compare two versions at a time; deselect one first")]
    Full,

    #[error("Select exactly two versions to compare")]
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Selected,
    Deselected,
}

/// The versions picked for a side-by-side diff, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompareSelection {
    tags: Vec<String>,
}

impl CompareSelection {
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Toggles a tag. Selecting a third tag is rejected and leaves the
    /// selection untouched rather than evicting an earlier pick.
    pub fn toggle(&mut self, tag: &str) -> Result<Toggle, SelectionError> {
        if self.remove(tag) {
            return Ok(Toggle::Deselected);
        }
        if self.tags.len() >= MAX_SELECTED {
            return Err(SelectionError::Full);
        }
        self.tags.push(tag.to_string());
        Ok(Toggle::Selected)
    }

    /// Drops a tag if it is selected. Returns whether it was.
    pub fn remove(&mut self, tag: &str) -> bool {
        match self.tags.iter().position(|t| t == tag) {
            Some(pos) => {
                self.tags.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// The (base, target) pair once two versions are selected.
    pub fn pair(&self) -> Result<(&str, &str), SelectionError> {
        match self.tags.as_slice() {
            [base, target] => Ok((base.as_str(), target.as_str())),
            _ => Err(SelectionError::Incomplete),
        }
    }
}
