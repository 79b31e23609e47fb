//! REST handlers mounted under `/api`. Every mutation re-runs the review rules
//! and ownership checks; nothing the client validated is trusted.
use crate::db::{is_unique_violation, Database, ReviewFilter};
use crate::error::{ServiceError, ValidationError};
use crate::models::review::{
    ActionOutcome, AdminReviewAction, AdminReviewQuery, NewReview, NewReviewResponse, ProofUpload, Review,
    ReviewProof, ReviewQuery, ReviewResponse, ReviewStatus, ReviewType, ReviewUpdate,
};
use crate::models::user::{display_name, User};
use crate::review::{content_filter, proof};
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use chrono::Utc;
use leptos::logging::log;
use uuid::Uuid;

type ApiResult = Result<HttpResponse, ServiceError>;

const PUBLIC_PAGE_SIZE: u32 = 10;
const ADMIN_PAGE_SIZE: u32 = 20;

/// Registers the API on a scope. Bodies may carry several base64 photos, so the
/// JSON limit is derived from the photo caps instead of actix's 2 MiB default.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(proof::MAX_REQUEST_BODY_BYTES))
        .route("/auth/me", web::get().to(me))
        .route("/shops/{id}", web::get().to(get_shop))
        .route("/reviews", web::get().to(list_reviews))
        .route("/reviews", web::post().to(create_review))
        .route("/reviews/{id}", web::put().to(update_review))
        .route("/reviews/{id}", web::delete().to(delete_review))
        .route("/reviews/{id}/upload-proof", web::post().to(upload_proof))
        .route("/reviews/{id}/proof", web::get().to(review_proof))
        // `pending` must be matched before the `{id}` routes
        .route("/admin/reviews/pending", web::get().to(pending_reviews))
        .route("/admin/reviews", web::get().to(admin_reviews))
        .route("/admin/reviews/{id}/action", web::post().to(review_action))
        .route("/admin/reviews/{id}", web::delete().to(admin_delete_review))
        .route("/review-responses", web::post().to(create_response))
        .route("/review-responses/review/{review_id}", web::get().to(response_for_review))
        .route("/review-responses/{id}", web::delete().to(delete_response));
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// `Ok(None)` without a token; a token that resolves to nobody is a 401.
async fn viewer(req: &HttpRequest, db: &Database) -> Result<Option<User>, ServiceError> {
    match bearer_token(req) {
        None => Ok(None),
        Some(token) => match db.user_for_token(token).await? {
            Some(user) => Ok(Some(user)),
            None => Err(ServiceError::Unauthorized),
        },
    }
}

async fn require_user(req: &HttpRequest, db: &Database) -> Result<User, ServiceError> {
    viewer(req, db).await?.ok_or(ServiceError::Unauthorized)
}

async fn require_admin(req: &HttpRequest, db: &Database) -> Result<User, ServiceError> {
    let user = require_user(req, db).await?;
    if !user.is_admin() {
        log!("[API] Non-admin {} denied admin route {}", user.id, req.path());
        return Err(ServiceError::Forbidden);
    }
    Ok(user)
}

async fn owned_review(db: &Database, review_id: &str, user: &User) -> Result<Review, ServiceError> {
    let review = db.get_review(review_id).await?.ok_or(ServiceError::NotFound("review"))?;
    if review.user_id != user.id {
        log!("[API] User {} denied access to review {}", user.id, review_id);
        return Err(ServiceError::Forbidden);
    }
    Ok(review)
}

fn already_reviewed() -> ServiceError {
    ServiceError::BadRequest("You have already reviewed this shop".to_string())
}

fn moderated_meanwhile() -> ServiceError {
    ServiceError::Conflict("This review was just moderated. Reload it and try again.".to_string())
}

fn clean_order_number(order_number: Option<String>) -> Option<String> {
    order_number.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Rules shared by create and update: comment bounds, proof for the low band, content filter.
fn check_review_content(review: &Review) -> Result<(), ValidationError> {
    proof::validate_review(
        review.rating,
        &review.comment,
        review.proof_order_number.as_deref(),
        &review.proof_photos,
    )?;
    content_filter::ensure_clean(&review.comment, review.shop_category.as_deref())
}

async fn me(req: HttpRequest, db: web::Data<Database>) -> ApiResult {
    let user = require_user(&req, &db).await?;
    Ok(HttpResponse::Ok().json(user))
}

async fn get_shop(db: web::Data<Database>, path: web::Path<String>) -> ApiResult {
    let shop = db.get_shop(&path).await?.ok_or(ServiceError::NotFound("shop"))?;
    Ok(HttpResponse::Ok().json(shop))
}

async fn list_reviews(req: HttpRequest, db: web::Data<Database>, query: web::Query<ReviewQuery>) -> ApiResult {
    let viewer = viewer(&req, &db).await?;
    let query = query.into_inner();
    let own_listing = match (&viewer, &query.user_id) {
        (Some(user), Some(user_id)) => &user.id == user_id,
        _ => false,
    };
    let filter = ReviewFilter {
        shop_id: query.shop_id,
        user_id: query.user_id,
        public_only: !own_listing,
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(PUBLIC_PAGE_SIZE),
        ..ReviewFilter::default()
    };
    let mut page = db.query_reviews(&filter).await?;
    page.data = page.data.into_iter().map(|r| r.redact_for(viewer.as_ref())).collect();
    Ok(HttpResponse::Ok().json(page))
}

async fn create_review(req: HttpRequest, db: web::Data<Database>, body: web::Json<NewReview>) -> ApiResult {
    let user = require_user(&req, &db).await?;
    let body = body.into_inner();
    log!("[API] Create review for shop {} by {} ({} stars)", body.shop_id, user.id, body.rating);

    let shop = db.get_shop(&body.shop_id).await?.ok_or(ServiceError::NotFound("shop"))?;
    if db.user_has_reviewed_shop(&user.id, &shop.id).await? {
        return Err(already_reviewed());
    }

    let low = proof::requires_proof(body.rating);
    let now = Utc::now();
    let review = Review {
        id: Uuid::new_v4().to_string(),
        shop_id: shop.id.clone(),
        shop_name: shop.name,
        shop_category: shop.category,
        user_id: user.id.clone(),
        user_name: display_name(&user.full_name),
        rating: body.rating,
        comment: body.comment.trim().to_string(),
        proof_order_number: if low { clean_order_number(body.proof_order_number) } else { None },
        proof_photos: if low { body.proof_photos } else { Vec::new() },
        proof_chat_history: None,
        status: ReviewStatus::initial(body.rating),
        review_type: ReviewType::Verified,
        admin_notes: None,
        response: None,
        created_at: now,
        updated_at: now,
    };
    check_review_content(&review)?;

    // the unique index settles two creates that both passed the check above
    match db.insert_review(&review).await {
        Err(err) if is_unique_violation(&err) => return Err(already_reviewed()),
        result => result?,
    }
    db.recompute_shop_rating(&review.shop_id).await?;
    log!("[API] Review {} created as {}", review.id, review.status.as_str());
    Ok(HttpResponse::Created().json(review.redact_for(Some(&user))))
}

async fn update_review(
    req: HttpRequest,
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<ReviewUpdate>,
) -> ApiResult {
    let user = require_user(&req, &db).await?;
    let stored = owned_review(&db, &path, &user).await?;
    let update = body.into_inner();

    let rating = update.rating.unwrap_or(stored.rating);
    let mut edited = stored.clone();
    edited.rating = rating;
    if let Some(comment) = update.comment {
        edited.comment = comment.trim().to_string();
    }
    if proof::requires_proof(rating) {
        if let Some(order_number) = update.proof_order_number {
            edited.proof_order_number = clean_order_number(Some(order_number));
        }
        if let Some(photos) = update.proof_photos {
            edited.proof_photos = photos;
        }
    } else {
        edited.proof_order_number = None;
        edited.proof_photos.clear();
        edited.proof_chat_history = None;
    }
    check_review_content(&edited)?;

    let proof_changed = edited.proof_order_number != stored.proof_order_number
        || edited.proof_photos != stored.proof_photos;
    edited.status = stored.status.after_edit(stored.rating, rating, proof_changed);
    // a fresh moderation round starts without the previous verdict
    let restart_moderation = edited.status == ReviewStatus::Pending && stored.status != ReviewStatus::Pending;
    if restart_moderation {
        edited.admin_notes = None;
    }
    edited.updated_at = Utc::now();

    if !db.update_review(&edited, stored.status, restart_moderation).await? {
        return Err(moderated_meanwhile());
    }
    db.recompute_shop_rating(&edited.shop_id).await?;
    log!("[API] Review {} edited: {} -> {}", edited.id, stored.status.as_str(), edited.status.as_str());
    Ok(HttpResponse::Ok().json(edited.redact_for(Some(&user))))
}

async fn delete_review(req: HttpRequest, db: web::Data<Database>, path: web::Path<String>) -> ApiResult {
    let user = require_user(&req, &db).await?;
    let review = owned_review(&db, &path, &user).await?;
    db.delete_review(&review.id).await?;
    db.recompute_shop_rating(&review.shop_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Replaces the evidence of the caller's own pending low-rating review.
async fn upload_proof(
    req: HttpRequest,
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<ProofUpload>,
) -> ApiResult {
    let user = require_user(&req, &db).await?;
    let review = owned_review(&db, &path, &user).await?;
    if !proof::requires_proof(review.rating) {
        return Err(ServiceError::BadRequest(format!(
            "Proof is only needed for ratings of {} stars or fewer",
            proof::LOW_RATING_MAX
        )));
    }
    if review.status != ReviewStatus::Pending {
        return Err(ServiceError::BadRequest("Proof can only be added while the review is pending".to_string()));
    }

    let body = body.into_inner();
    let order_number = clean_order_number(Some(body.proof_order_number));
    proof::validate_proof(review.rating, order_number.as_deref(), &body.proof_photos)?;
    let chat_history = proof::clean_chat_history(body.proof_chat_history.as_deref())?;

    let attached = db
        .attach_proof(&review.id, order_number.as_deref().unwrap_or_default(), &body.proof_photos, chat_history.as_deref())
        .await?;
    if !attached {
        return Err(moderated_meanwhile());
    }
    log!("[API] User {} attached proof to review {}", user.id, review.id);
    Ok(HttpResponse::Ok().json(ActionOutcome {
        success: true,
        message: "Proof uploaded. A moderator will check your review.".to_string(),
        new_status: ReviewStatus::Pending,
    }))
}

/// Evidence of a review, for its author or an admin.
async fn review_proof(req: HttpRequest, db: web::Data<Database>, path: web::Path<String>) -> ApiResult {
    let user = require_user(&req, &db).await?;
    let review = db.get_review(&path).await?.ok_or(ServiceError::NotFound("review"))?;
    if review.user_id != user.id && !user.is_admin() {
        log!("[API] User {} denied proof of review {}", user.id, review.id);
        return Err(ServiceError::Forbidden);
    }
    Ok(HttpResponse::Ok().json(ReviewProof::from(review.redact_for(Some(&user)))))
}

async fn admin_reviews(req: HttpRequest, db: web::Data<Database>, query: web::Query<AdminReviewQuery>) -> ApiResult {
    require_admin(&req, &db).await?;
    let query = query.into_inner();
    let filter = ReviewFilter {
        shop_id: query.shop_id,
        status: query.status_filter,
        review_type: query.review_type,
        search: query.search,
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(ADMIN_PAGE_SIZE),
        ..ReviewFilter::default()
    };
    Ok(HttpResponse::Ok().json(db.query_reviews(&filter).await?))
}

async fn pending_reviews(req: HttpRequest, db: web::Data<Database>) -> ApiResult {
    require_admin(&req, &db).await?;
    let filter = ReviewFilter {
        status: Some(ReviewStatus::Pending),
        page: 1,
        limit: ADMIN_PAGE_SIZE,
        ..ReviewFilter::default()
    };
    Ok(HttpResponse::Ok().json(db.query_reviews(&filter).await?))
}

async fn review_action(
    req: HttpRequest,
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<AdminReviewAction>,
) -> ApiResult {
    let admin = require_admin(&req, &db).await?;
    let body = body.into_inner();
    let review = db.get_review(&path).await?.ok_or(ServiceError::NotFound("review"))?;
    let notes = body.admin_notes.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let new_status = db
        .apply_moderation(&review.id, body.action, notes, &admin.id)
        .await?
        .ok_or(ServiceError::NotFound("review"))?;
    db.recompute_shop_rating(&review.shop_id).await?;
    log!("[API] Admin {} {} review {}", admin.id, body.action.past_tense(), review.id);
    Ok(HttpResponse::Ok().json(ActionOutcome {
        success: true,
        message: format!("Review {}", body.action.past_tense()),
        new_status,
    }))
}

async fn admin_delete_review(req: HttpRequest, db: web::Data<Database>, path: web::Path<String>) -> ApiResult {
    let admin = require_admin(&req, &db).await?;
    let review = db.get_review(&path).await?.ok_or(ServiceError::NotFound("review"))?;
    db.delete_review(&review.id).await?;
    db.recompute_shop_rating(&review.shop_id).await?;
    log!("[API] Admin {} deleted review {}", admin.id, review.id);
    Ok(HttpResponse::NoContent().finish())
}

async fn create_response(
    req: HttpRequest,
    db: web::Data<Database>,
    body: web::Json<NewReviewResponse>,
) -> ApiResult {
    let user = require_user(&req, &db).await?;
    let body = body.into_inner();
    let text = body.response.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyResponse.into());
    }

    let review = db.get_review(&body.review_id).await?.ok_or(ServiceError::NotFound("review"))?;
    let shop = db.get_shop(&review.shop_id).await?.ok_or(ServiceError::NotFound("shop"))?;
    let is_shop_owner = shop.owner_id.as_deref() == Some(user.id.as_str());
    if !is_shop_owner && !user.is_admin() {
        return Err(ServiceError::Forbidden);
    }
    if db.response_for_review(&review.id).await?.is_some() {
        return Err(ServiceError::Conflict("This review already has a response".to_string()));
    }

    let response = ReviewResponse {
        id: Uuid::new_v4().to_string(),
        review_id: review.id,
        shop_id: shop.id,
        responder_id: user.id,
        response: text.to_string(),
        created_at: Utc::now(),
    };
    db.insert_response(&response).await?;
    log!("[API] Response {} added to review {}", response.id, response.review_id);
    Ok(HttpResponse::Created().json(response))
}

async fn response_for_review(db: web::Data<Database>, path: web::Path<String>) -> ApiResult {
    Ok(HttpResponse::Ok().json(db.response_for_review(&path).await?))
}

async fn delete_response(req: HttpRequest, db: web::Data<Database>, path: web::Path<String>) -> ApiResult {
    let user = require_user(&req, &db).await?;
    let response = db.get_response(&path).await?.ok_or(ServiceError::NotFound("response"))?;
    if response.responder_id != user.id && !user.is_admin() {
        return Err(ServiceError::Forbidden);
    }
    db.delete_response(&response.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn reads_bearer_tokens() {
        let req = TestRequest::default().insert_header((header::AUTHORIZATION, "Bearer abc ")).to_http_request();
        assert_eq!(bearer_token(&req), Some("abc"));

        let req = TestRequest::default().insert_header((header::AUTHORIZATION, "Basic abc")).to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default().insert_header((header::AUTHORIZATION, "Bearer ")).to_http_request();
        assert_eq!(bearer_token(&req), None);
        assert_eq!(bearer_token(&TestRequest::default().to_http_request()), None);
    }

    #[test]
    fn blank_order_numbers_are_dropped() {
        assert_eq!(clean_order_number(Some("  ".into())), None);
        assert_eq!(clean_order_number(Some(" ORD-1 ".into())).as_deref(), Some("ORD-1"));
    }
}
