use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Publication state of a version in the shared marketplace.
/// `Rejected` is only ever set by the server's moderation process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketplaceStatus {
    #[default]
    NotPublished,
    PendingApproval,
    Published,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketplaceAction {
    RequestPublish,
    Unpublish,
}

impl fmt::Display for MarketplaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarketplaceStatus::NotPublished => "NOT_PUBLISHED",
            MarketplaceStatus::PendingApproval => "PENDING_APPROVAL",
            MarketplaceStatus::Published => "PUBLISHED",
            MarketplaceStatus::Rejected => "REJECTED",
        })
    }
}

impl fmt::Display for MarketplaceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarketplaceAction::RequestPublish => "request_publish",
            MarketplaceAction::Unpublish => "unpublish",
        })
    }
}

impl MarketplaceAction {
    pub fn path_segment(self) -> &'static str {
        match self {
            MarketplaceAction::RequestPublish => "publish",
            MarketplaceAction::Unpublish => "unpublish",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Cannot {action} a version whose marketplace status is {from}")]
pub struct TransitionError {
    pub from: MarketplaceStatus,
    pub action: MarketplaceAction,
}

impl MarketplaceStatus {
    pub fn apply(self, action: MarketplaceAction) -> Result<MarketplaceStatus, TransitionError> {
        use MarketplaceAction::*;
        use MarketplaceStatus::*;

        match (self, action) {
            (NotPublished | Rejected, RequestPublish) => Ok(PendingApproval),
            (PendingApproval | Published, Unpublish) => Ok(NotPublished),
            (from, action) => Err(TransitionError { from, action }),
        }
    }

    /// Actions the dashboard offers in this state.
    pub fn available_actions(self) -> Vec<MarketplaceAction> {
        [MarketplaceAction::RequestPublish, MarketplaceAction::Unpublish]
            .into_iter()
            .filter(|a| self.apply(*a).is_ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::MarketplaceAction::*;
    use super::MarketplaceStatus::*;
    use super::*;

    #[test]
    fn test_request_publish_transitions() {
        assert_eq!(NotPublished.apply(RequestPublish), Ok(PendingApproval));
        assert_eq!(Rejected.apply(RequestPublish), Ok(PendingApproval));
        assert!(PendingApproval.apply(RequestPublish).is_err());
        assert_eq!(
            Published.apply(RequestPublish),
            Err(TransitionError {
                from: Published,
                action: RequestPublish
            })
        );
    }

    #[test]
    fn test_unpublish_transitions() {
        assert_eq!(PendingApproval.apply(Unpublish), Ok(NotPublished));
        assert_eq!(Published.apply(Unpublish), Ok(NotPublished));
        assert!(NotPublished.apply(Unpublish).is_err());
        assert!(Rejected.apply(Unpublish).is_err());
    }

    #[test]
    fn test_no_action_reaches_rejected() {
        for from in [NotPublished, PendingApproval, Published, Rejected] {
            for action in [RequestPublish, Unpublish] {
                assert_ne!(from.apply(action), Ok(Rejected));
            }
        }
    }

    #[test]
    fn test_available_actions() {
        assert_eq!(NotPublished.available_actions(), vec![RequestPublish]);
        assert_eq!(Rejected.available_actions(), vec![RequestPublish]);
        assert_eq!(PendingApproval.available_actions(), vec![Unpublish]);
        assert_eq!(Published.available_actions(), vec![Unpublish]);
    }

    #[test]
    fn test_transition_error_uses_wire_names() {
        let err = Published.apply(RequestPublish).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot request_publish a version whose marketplace status is PUBLISHED"
        );
        assert_eq!(NotPublished.to_string(), "NOT_PUBLISHED");
        assert_eq!(
            serde_json::to_string(&Unpublish).unwrap(),
            format!("\"{}\"", Unpublish)
        );
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PendingApproval).unwrap(),
            "\"PENDING_APPROVAL\""
        );
        let s: MarketplaceStatus = serde_json::from_str("\"NOT_PUBLISHED\"").unwrap();
        assert_eq!(s, NotPublished);
    }
}
