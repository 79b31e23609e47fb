use crate::error::{UnknownVariant, ValidationError};
use crate::models::user::{Role, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Star rating, always within 1..=5.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(ValidationError::RatingOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    Published,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Published => "published",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            "published" => Ok(ReviewStatus::Published),
            other => Err(UnknownVariant { kind: "review status", value: other.to_string() }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewType {
    #[default]
    Verified,
    Imported,
    Unverified,
}

impl ReviewType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewType::Verified => "verified",
            ReviewType::Imported => "imported",
            ReviewType::Unverified => "unverified",
        }
    }
}

impl FromStr for ReviewType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verified" => Ok(ReviewType::Verified),
            "imported" => Ok(ReviewType::Imported),
            "unverified" => Ok(ReviewType::Unverified),
            other => Err(UnknownVariant { kind: "review type", value: other.to_string() }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Review {
    pub id: String,
    pub shop_id: String,
    pub shop_name: String,
    pub shop_category: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub rating: Rating,
    pub comment: String,
    pub proof_order_number: Option<String>,
    #[serde(default)]
    pub proof_photos: Vec<String>,
    pub proof_chat_history: Option<String>,
    pub status: ReviewStatus,
    pub review_type: ReviewType,
    pub admin_notes: Option<String>,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn has_proof(&self) -> bool {
        !self.proof_photos.is_empty()
            || self.proof_order_number.as_deref().is_some_and(|n| !n.trim().is_empty())
            || self.proof_chat_history.is_some()
    }

    /// Strips what the viewer may not see. Admins see everything; the author sees
    /// proof and sees moderator notes only on rejection; everyone else sees neither.
    pub fn redact_for(mut self, viewer: Option<&User>) -> Review {
        match viewer {
            Some(user) if user.role == Role::Admin => self,
            Some(user) if user.id == self.user_id => {
                if self.status != ReviewStatus::Rejected {
                    self.admin_notes = None;
                }
                self
            }
            _ => {
                self.admin_notes = None;
                self.proof_order_number = None;
                self.proof_photos.clear();
                self.proof_chat_history = None;
                self
            }
        }
    }
}

/// Body of `POST /api/reviews`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewReview {
    pub shop_id: String,
    pub rating: Rating,
    pub comment: String,
    #[serde(default)]
    pub proof_photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_order_number: Option<String>,
}

/// Body of `PUT /api/reviews/{id}`. Absent fields keep their stored value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ReviewUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_photos: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_order_number: Option<String>,
}

impl ReviewUpdate {
    pub fn touches_proof(&self) -> bool {
        self.proof_photos.is_some() || self.proof_order_number.is_some()
    }
}

/// Body of `POST /api/reviews/{id}/upload-proof`. Replaces the proof of a
/// pending low-rating review.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ProofUpload {
    pub proof_order_number: String,
    pub proof_photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_chat_history: Option<String>,
}

/// Evidence attached to a review, as returned by `GET /api/reviews/{id}/proof`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReviewProof {
    pub review_id: String,
    pub rating: Rating,
    pub status: ReviewStatus,
    pub proof_order_number: Option<String>,
    pub proof_photos: Vec<String>,
    pub proof_chat_history: Option<String>,
    pub admin_notes: Option<String>,
}

impl From<Review> for ReviewProof {
    fn from(review: Review) -> Self {
        ReviewProof {
            review_id: review.id,
            rating: review.rating,
            status: review.status,
            proof_order_number: review.proof_order_number,
            proof_photos: review.proof_photos,
            proof_chat_history: review.proof_chat_history,
            admin_notes: review.admin_notes,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
}

impl ModerationAction {
    pub fn past_tense(self) -> &'static str {
        match self {
            ModerationAction::Approve => "approved",
            ModerationAction::Reject => "rejected",
        }
    }
}

/// Body of `POST /api/admin/reviews/{id}/action`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdminReviewAction {
    pub action: ModerationAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    pub new_status: ReviewStatus,
}

/// Pagination envelope shared by every listing endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let pages = if total == 0 { 1 } else { total.div_ceil(u64::from(limit.max(1))) as u32 };
        Paginated { data, total, page, pages }
    }

    pub fn empty() -> Self {
        Paginated { data: Vec::new(), total: 0, page: 1, pages: 1 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ReviewQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AdminReviewQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_filter: Option<ReviewStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_type: Option<ReviewType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Body of `POST /api/review-responses`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewReviewResponse {
    pub review_id: String,
    pub response: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReviewResponse {
    pub id: String,
    pub review_id: String,
    pub shop_id: String,
    pub responder_id: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}
