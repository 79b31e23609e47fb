use crate::error::ValidationError;
use crate::models::review::{NewReview, Rating, Review, ReviewStatus, ReviewUpdate};
use crate::review::proof;

/// Editable state behind the submission form and the edit dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub rating: u8,
    pub comment: String,
    pub proof_order_number: String,
    pub proof_photos: Vec<String>,
}

impl Default for ReviewDraft {
    fn default() -> Self {
        ReviewDraft {
            rating: Rating::MAX,
            comment: String::new(),
            proof_order_number: String::new(),
            proof_photos: Vec::new(),
        }
    }
}

impl ReviewDraft {
    pub fn for_edit(review: &Review) -> Self {
        ReviewDraft {
            rating: review.rating.get(),
            comment: review.comment.clone(),
            proof_order_number: review.proof_order_number.clone().unwrap_or_default(),
            proof_photos: review.proof_photos.clone(),
        }
    }

    /// Whether the form should show the proof section for the current rating.
    pub fn needs_proof(&self) -> bool {
        Rating::new(self.rating).is_ok_and(proof::requires_proof)
    }

    fn order_number(&self) -> Option<&str> {
        let trimmed = self.proof_order_number.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Validates the current form state. Runs before any request is made.
    pub fn validate(&self) -> Result<Rating, ValidationError> {
        let rating = Rating::new(self.rating)?;
        proof::validate_review(rating, &self.comment, self.order_number(), &self.proof_photos)?;
        Ok(rating)
    }

    pub fn to_new_review(&self, shop_id: &str) -> Result<NewReview, ValidationError> {
        let rating = self.validate()?;
        let low = proof::requires_proof(rating);
        Ok(NewReview {
            shop_id: shop_id.to_string(),
            rating,
            comment: self.comment.trim().to_string(),
            proof_photos: if low { self.proof_photos.clone() } else { Vec::new() },
            proof_order_number: if low { self.order_number().map(str::to_string) } else { None },
        })
    }

    /// Proof fields are sent only while the edited rating is in the low band.
    pub fn to_update(&self) -> Result<ReviewUpdate, ValidationError> {
        let rating = self.validate()?;
        let low = proof::requires_proof(rating);
        Ok(ReviewUpdate {
            rating: Some(rating),
            comment: Some(self.comment.trim().to_string()),
            proof_photos: low.then(|| self.proof_photos.clone()),
            proof_order_number: if low { self.order_number().map(str::to_string) } else { None },
        })
    }

    pub fn reset(&mut self) {
        *self = ReviewDraft::default();
    }
}

/// Confirmation shown after a successful submit or edit.
pub fn confirmation_message(status: ReviewStatus, edited: bool) -> &'static str {
    match (status, edited) {
        (ReviewStatus::Pending, false) => {
            "Thank you! Your review will be published after a moderator has checked your proof."
        }
        (ReviewStatus::Pending, true) => "Your review was updated and is waiting for another moderator review.",
        (ReviewStatus::Rejected, _) => "Your review was saved but remains rejected.",
        (ReviewStatus::Approved | ReviewStatus::Published, false) => {
            "Thank you! Your review has been published."
        }
        (ReviewStatus::Approved | ReviewStatus::Published, true) => "Your review was updated.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::review::ReviewType;
    use crate::review::proof::fixtures::png_photo;
    use chrono::Utc;

    fn stored(rating: u8, with_proof: bool) -> Review {
        Review {
            id: "r1".into(),
            shop_id: "s1".into(),
            shop_name: "Gadget Hub".into(),
            shop_category: None,
            user_id: "u1".into(),
            user_name: "Sarah K.".into(),
            rating: Rating::new(rating).unwrap(),
            comment: "Great service, fast shipping!".into(),
            proof_order_number: with_proof.then(|| "ORD-1".to_string()),
            proof_photos: if with_proof { vec![png_photo()] } else { vec![] },
            proof_chat_history: None,
            status: ReviewStatus::initial(Rating::new(rating).unwrap()),
            review_type: ReviewType::Verified,
            admin_notes: None,
            response: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn edit_prefills_from_stored_review() {
        let draft = ReviewDraft::for_edit(&stored(2, true));
        assert_eq!(draft.rating, 2);
        assert_eq!(draft.proof_order_number, "ORD-1");
        assert_eq!(draft.proof_photos.len(), 1);
    }

    #[test]
    fn lowering_rating_without_proof_is_rejected() {
        let mut draft = ReviewDraft::for_edit(&stored(5, false));
        draft.rating = 2;
        assert!(draft.needs_proof());
        assert_eq!(draft.to_update(), Err(ValidationError::MissingOrderNumber));
    }

    #[test]
    fn raising_rating_drops_proof_requirement() {
        let mut draft = ReviewDraft::for_edit(&stored(2, true));
        draft.rating = 5;
        draft.proof_order_number.clear();
        draft.proof_photos.clear();
        let update = draft.to_update().unwrap();
        assert_eq!(update.rating.map(Rating::get), Some(5));
        assert_eq!(update.proof_photos, None);
        assert_eq!(update.proof_order_number, None);
    }

    #[test]
    fn high_rating_submission_strips_proof_fields() {
        let draft = ReviewDraft {
            rating: 5,
            comment: "Great service, fast shipping!".into(),
            proof_order_number: "ORD-9".into(),
            proof_photos: vec![png_photo()],
        };
        let body = draft.to_new_review("s1").unwrap();
        assert!(body.proof_photos.is_empty());
        assert_eq!(body.proof_order_number, None);
    }

    #[test]
    fn order_number_is_trimmed() {
        let draft = ReviewDraft {
            rating: 1,
            comment: "Never arrived at all".into(),
            proof_order_number: "  ORD-1 ".into(),
            proof_photos: vec![png_photo()],
        };
        assert_eq!(draft.to_new_review("s1").unwrap().proof_order_number.as_deref(), Some("ORD-1"));
    }

    #[test]
    fn comment_is_checked_and_sent_trimmed() {
        let padded = ReviewDraft { rating: 5, comment: "  123456789".into(), ..ReviewDraft::default() };
        assert_eq!(padded.validate(), Err(ValidationError::CommentTooShort { min: 10 }));

        let draft = ReviewDraft { rating: 5, comment: "  Great service, fast shipping!\n".into(), ..ReviewDraft::default() };
        assert_eq!(draft.to_new_review("s1").unwrap().comment, "Great service, fast shipping!");
        assert_eq!(draft.to_update().unwrap().comment.as_deref(), Some("Great service, fast shipping!"));
    }

    #[test]
    fn confirmation_depends_on_status() {
        assert!(confirmation_message(ReviewStatus::Pending, false).contains("moderator"));
        assert!(confirmation_message(ReviewStatus::Published, false).contains("published"));
    }
}
