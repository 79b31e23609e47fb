//! Review status transitions.
//!
//! ```text
//! create ──low band──▶ pending ──approve──▶ approved
//!    │                    └─────reject───▶ rejected
//!    └──high band──▶ published
//! edit into low band (or new proof) ──▶ pending
//! ```

use crate::models::review::{ModerationAction, Rating, ReviewStatus};
use crate::review::proof::requires_proof;

impl ReviewStatus {
    pub fn initial(rating: Rating) -> ReviewStatus {
        if requires_proof(rating) {
            ReviewStatus::Pending
        } else {
            ReviewStatus::Published
        }
    }

    /// Status after the author edits a review.
    ///
    /// Entering the low band, or replacing proof while in it, sends the review back
    /// to moderation. Leaving the low band releases a pending review; a rejection
    /// stands until a moderator changes it.
    pub fn after_edit(self, old_rating: Rating, new_rating: Rating, proof_changed: bool) -> ReviewStatus {
        if requires_proof(new_rating) {
            if !requires_proof(old_rating) || proof_changed {
                ReviewStatus::Pending
            } else {
                self
            }
        } else {
            match self {
                ReviewStatus::Pending => ReviewStatus::Published,
                other => other,
            }
        }
    }

    /// Moderation is idempotent: the target status depends only on the action.
    pub fn after_moderation(self, action: ModerationAction) -> ReviewStatus {
        match action {
            ModerationAction::Approve => ReviewStatus::Approved,
            ModerationAction::Reject => ReviewStatus::Rejected,
        }
    }

    pub fn is_public(self) -> bool {
        match self {
            ReviewStatus::Approved | ReviewStatus::Published => true,
            ReviewStatus::Pending | ReviewStatus::Rejected => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "Pending review",
            ReviewStatus::Approved => "Approved",
            ReviewStatus::Rejected => "Rejected",
            ReviewStatus::Published => "Published",
        }
    }

    pub fn badge_class(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "badge badge-pending",
            ReviewStatus::Approved => "badge badge-approved",
            ReviewStatus::Rejected => "badge badge-rejected",
            ReviewStatus::Published => "badge badge-published",
        }
    }
}

/// Status selector of the moderation queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    All,
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl StatusFilter {
    pub const OPTIONS: [StatusFilter; 4] =
        [StatusFilter::All, StatusFilter::Pending, StatusFilter::Approved, StatusFilter::Rejected];

    pub fn status(self) -> Option<ReviewStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Pending => Some(ReviewStatus::Pending),
            StatusFilter::Approved => Some(ReviewStatus::Approved),
            StatusFilter::Rejected => Some(ReviewStatus::Rejected),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Approved => "approved",
            StatusFilter::Rejected => "rejected",
        }
    }

    pub fn from_key(key: &str) -> StatusFilter {
        match key {
            "pending" => StatusFilter::Pending,
            "approved" => StatusFilter::Approved,
            "rejected" => StatusFilter::Rejected,
            _ => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Pending => "Pending",
            StatusFilter::Approved => "Approved",
            StatusFilter::Rejected => "Rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(v: u8) -> Rating {
        Rating::new(v).unwrap()
    }

    #[test]
    fn initial_status_follows_rating_band() {
        assert_eq!(ReviewStatus::initial(r(2)), ReviewStatus::Pending);
        assert_eq!(ReviewStatus::initial(r(3)), ReviewStatus::Pending);
        assert_eq!(ReviewStatus::initial(r(4)), ReviewStatus::Published);
    }

    #[test]
    fn editing_into_low_band_discards_approval() {
        assert_eq!(ReviewStatus::Published.after_edit(r(5), r(2), true), ReviewStatus::Pending);
        assert_eq!(ReviewStatus::Approved.after_edit(r(3), r(2), true), ReviewStatus::Pending);
        // comment-only edit inside the low band keeps the moderator's decision
        assert_eq!(ReviewStatus::Approved.after_edit(r(2), r(2), false), ReviewStatus::Approved);
    }

    #[test]
    fn leaving_low_band_releases_pending_reviews() {
        assert_eq!(ReviewStatus::Pending.after_edit(r(2), r(5), false), ReviewStatus::Published);
        assert_eq!(ReviewStatus::Rejected.after_edit(r(2), r(5), false), ReviewStatus::Rejected);
        assert_eq!(ReviewStatus::Published.after_edit(r(4), r(5), false), ReviewStatus::Published);
    }

    #[test]
    fn moderation_is_idempotent() {
        let once = ReviewStatus::Pending.after_moderation(ModerationAction::Approve);
        let twice = once.after_moderation(ModerationAction::Approve);
        assert_eq!(once, ReviewStatus::Approved);
        assert_eq!(twice, ReviewStatus::Approved);
        assert_eq!(twice.after_moderation(ModerationAction::Reject), ReviewStatus::Rejected);
    }

    #[test]
    fn only_moderated_or_published_reviews_are_public() {
        assert!(ReviewStatus::Approved.is_public());
        assert!(ReviewStatus::Published.is_public());
        assert!(!ReviewStatus::Pending.is_public());
        assert!(!ReviewStatus::Rejected.is_public());
    }

    #[test]
    fn filter_keys_round_trip() {
        for filter in StatusFilter::OPTIONS {
            assert_eq!(StatusFilter::from_key(filter.key()), filter);
        }
        assert_eq!(StatusFilter::All.status(), None);
    }
}
