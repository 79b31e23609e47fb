//! User-initiated review operations. Each one validates locally first, then
//! issues exactly one request through a [`ReviewBackend`].

use crate::client::ReviewBackend;
use crate::error::{ApiError, ValidationError};
use crate::models::review::{
    AdminReviewAction, AdminReviewQuery, ModerationAction, NewReviewResponse, ProofUpload, Review, ReviewStatus,
};
use crate::review::draft::{confirmation_message, ReviewDraft};
use crate::review::lifecycle::StatusFilter;
use crate::review::proof;
use leptos::logging::log;

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub review: Review,
    pub message: &'static str,
}

pub async fn submit_review<B: ReviewBackend>(
    backend: &B,
    shop_id: &str,
    draft: &ReviewDraft,
) -> Result<SubmitOutcome, ApiError> {
    let body = draft.to_new_review(shop_id)?;
    let review = backend.create_review(&body).await?;
    log!("[REVIEW] Created review {} with status {}", review.id, review.status.as_str());
    let message = confirmation_message(review.status, false);
    Ok(SubmitOutcome { review, message })
}

pub async fn edit_review<B: ReviewBackend>(
    backend: &B,
    review_id: &str,
    draft: &ReviewDraft,
) -> Result<SubmitOutcome, ApiError> {
    let update = draft.to_update()?;
    let review = backend.update_review(review_id, &update).await?;
    log!("[REVIEW] Updated review {} -> {}", review.id, review.status.as_str());
    let message = confirmation_message(review.status, true);
    Ok(SubmitOutcome { review, message })
}

/// First step of deleting a review. Nothing is sent until [`PendingDeletion::confirm`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDeletion {
    pub review_id: String,
    pub shop_name: String,
}

impl PendingDeletion {
    pub fn request(review: &Review) -> Self {
        PendingDeletion { review_id: review.id.clone(), shop_name: review.shop_name.clone() }
    }

    pub async fn confirm<B: ReviewBackend>(&self, backend: &B) -> Result<(), ApiError> {
        backend.delete_review(&self.review_id).await?;
        log!("[REVIEW] Deleted review {}", self.review_id);
        Ok(())
    }

    /// Drops the deleted review from the current list instead of refetching.
    pub fn remove_from(&self, local: &mut Vec<Review>) {
        local.retain(|r| r.id != self.review_id);
    }
}

/// Sends new evidence for a pending low-rating review and returns the review as
/// it now stands. Runs the same checks as the server first.
pub async fn upload_proof<B: ReviewBackend>(
    backend: &B,
    review: &Review,
    order_number: &str,
    photos: &[String],
    chat_history: Option<&str>,
) -> Result<Review, ApiError> {
    let order_number = order_number.trim();
    proof::validate_proof(review.rating, Some(order_number).filter(|n| !n.is_empty()), photos)?;
    let body = ProofUpload {
        proof_order_number: order_number.to_string(),
        proof_photos: photos.to_vec(),
        proof_chat_history: proof::clean_chat_history(chat_history)?,
    };
    backend.upload_proof(&review.id, &body).await?;
    log!("[REVIEW] Proof uploaded for review {}", review.id);

    let mut updated = review.clone();
    updated.proof_order_number = Some(body.proof_order_number);
    updated.proof_photos = body.proof_photos;
    updated.proof_chat_history = body.proof_chat_history;
    Ok(updated)
}

/// Moderator decision awaiting confirmation in the modal.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingModeration {
    pub review_id: String,
    pub action: ModerationAction,
    pub notes: String,
}

impl PendingModeration {
    pub fn new(review_id: impl Into<String>, action: ModerationAction) -> Self {
        PendingModeration { review_id: review_id.into(), action, notes: String::new() }
    }

    pub fn to_request(&self) -> AdminReviewAction {
        let notes = self.notes.trim();
        AdminReviewAction {
            action: self.action,
            admin_notes: (!notes.is_empty()).then(|| notes.to_string()),
        }
    }

    /// Sends the decision. Callers refetch the queue afterwards instead of
    /// patching local state.
    pub async fn confirm<B: ReviewBackend>(self, backend: &B) -> Result<ReviewStatus, ApiError> {
        let outcome = backend.review_action(&self.review_id, &self.to_request()).await?;
        log!("[QUEUE] Review {} {}", self.review_id, self.action.past_tense());
        Ok(outcome.new_status)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueSnapshot {
    pub reviews: Vec<Review>,
    pub total: u64,
    pub pages: u32,
    pub pending_total: u64,
}

/// Loads the filtered listing and the pending count side by side. The pending
/// count never depends on the active filter.
pub async fn load_queue<B: ReviewBackend>(
    backend: &B,
    filter: StatusFilter,
    search: &str,
    page: u32,
) -> Result<QueueSnapshot, ApiError> {
    let query = AdminReviewQuery {
        status_filter: filter.status(),
        search: Some(search.trim().to_string()).filter(|s| !s.is_empty()),
        page: Some(page.max(1)),
        ..AdminReviewQuery::default()
    };
    let (listing, pending) = futures::join!(backend.admin_reviews(&query), backend.pending_reviews());
    let listing = listing?;
    let pending = pending?;
    Ok(QueueSnapshot {
        reviews: listing.data,
        total: listing.total,
        pages: listing.pages,
        pending_total: pending.total,
    })
}

pub async fn respond_to_review<B: ReviewBackend>(
    backend: &B,
    review_id: &str,
    text: &str,
) -> Result<(), ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyResponse.into());
    }
    let body = NewReviewResponse { review_id: review_id.to_string(), response: text.to_string() };
    backend.respond_to_review(&body).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::models::review::{
        ActionOutcome, NewReview, Paginated, Rating, ReviewQuery, ReviewResponse, ReviewType, ReviewUpdate,
    };
    use chrono::Utc;
    use std::cell::RefCell;

    /// In-memory backend that records every call.
    #[derive(Default)]
    pub struct MockBackend {
        pub reviews: RefCell<Vec<Review>>,
        pub calls: RefCell<Vec<String>>,
        pub fail_with: RefCell<Option<ApiError>>,
    }

    impl MockBackend {
        fn record(&self, call: impl Into<String>) -> Result<(), ApiError> {
            self.calls.borrow_mut().push(call.into());
            match self.fail_with.borrow().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        pub fn status_of(&self, id: &str) -> Option<ReviewStatus> {
            self.reviews.borrow().iter().find(|r| r.id == id).map(|r| r.status)
        }
    }

    pub fn review(id: &str, rating: u8, status: ReviewStatus) -> Review {
        Review {
            id: id.into(),
            shop_id: "s1".into(),
            shop_name: "Gadget Hub".into(),
            shop_category: None,
            user_id: "u1".into(),
            user_name: "Sarah K.".into(),
            rating: Rating::new(rating).unwrap(),
            comment: "Item arrived broken and late".into(),
            proof_order_number: None,
            proof_photos: vec![],
            proof_chat_history: None,
            status,
            review_type: ReviewType::Verified,
            admin_notes: None,
            response: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    impl ReviewBackend for MockBackend {
        async fn list_reviews(&self, _query: &ReviewQuery) -> Result<Paginated<Review>, ApiError> {
            self.record("list")?;
            let data = self.reviews.borrow().clone();
            let total = data.len() as u64;
            Ok(Paginated::new(data, total, 1, 10))
        }

        async fn create_review(&self, body: &NewReview) -> Result<Review, ApiError> {
            self.record("create")?;
            let mut created = review("new", body.rating.get(), ReviewStatus::initial(body.rating));
            created.comment = body.comment.clone();
            self.reviews.borrow_mut().push(created.clone());
            Ok(created)
        }

        async fn update_review(&self, id: &str, update: &ReviewUpdate) -> Result<Review, ApiError> {
            self.record(format!("update {id}"))?;
            let mut reviews = self.reviews.borrow_mut();
            let stored = reviews.iter_mut().find(|r| r.id == id).ok_or(ApiError::NotFound)?;
            let new_rating = update.rating.unwrap_or(stored.rating);
            stored.status = stored.status.after_edit(stored.rating, new_rating, update.touches_proof());
            stored.rating = new_rating;
            Ok(stored.clone())
        }

        async fn delete_review(&self, id: &str) -> Result<(), ApiError> {
            self.record(format!("delete {id}"))?;
            self.reviews.borrow_mut().retain(|r| r.id != id);
            Ok(())
        }

        async fn upload_proof(&self, id: &str, body: &ProofUpload) -> Result<ActionOutcome, ApiError> {
            self.record(format!("proof {id}"))?;
            let mut reviews = self.reviews.borrow_mut();
            let stored = reviews.iter_mut().find(|r| r.id == id).ok_or(ApiError::NotFound)?;
            stored.proof_order_number = Some(body.proof_order_number.clone());
            stored.proof_photos = body.proof_photos.clone();
            stored.proof_chat_history = body.proof_chat_history.clone();
            Ok(ActionOutcome { success: true, message: "Proof uploaded".into(), new_status: stored.status })
        }

        async fn admin_reviews(&self, query: &AdminReviewQuery) -> Result<Paginated<Review>, ApiError> {
            self.record("admin_list")?;
            let data: Vec<Review> = self
                .reviews
                .borrow()
                .iter()
                .filter(|r| query.status_filter.map_or(true, |s| r.status == s))
                .cloned()
                .collect();
            let total = data.len() as u64;
            Ok(Paginated::new(data, total, 1, 20))
        }

        async fn pending_reviews(&self) -> Result<Paginated<Review>, ApiError> {
            self.record("pending")?;
            let data: Vec<Review> =
                self.reviews.borrow().iter().filter(|r| r.status == ReviewStatus::Pending).cloned().collect();
            let total = data.len() as u64;
            Ok(Paginated::new(data, total, 1, 20))
        }

        async fn review_action(&self, id: &str, action: &AdminReviewAction) -> Result<ActionOutcome, ApiError> {
            self.record(format!("action {id}"))?;
            let mut reviews = self.reviews.borrow_mut();
            let stored = reviews.iter_mut().find(|r| r.id == id).ok_or(ApiError::NotFound)?;
            stored.status = stored.status.after_moderation(action.action);
            if let Some(notes) = &action.admin_notes {
                stored.admin_notes = Some(notes.clone());
            }
            Ok(ActionOutcome {
                success: true,
                message: format!("Review {}", action.action.past_tense()),
                new_status: stored.status,
            })
        }

        async fn respond_to_review(&self, body: &NewReviewResponse) -> Result<ReviewResponse, ApiError> {
            self.record(format!("respond {}", body.review_id))?;
            Ok(ReviewResponse {
                id: "resp".into(),
                review_id: body.review_id.clone(),
                shop_id: "s1".into(),
                responder_id: "owner".into(),
                response: body.response.clone(),
                created_at: Utc::now(),
            })
        }
    }
}
