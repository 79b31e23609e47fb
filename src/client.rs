//! Typed REST client for the `/api` routes.
use crate::error::ApiError;
use crate::models::review::{
    ActionOutcome, AdminReviewAction, AdminReviewQuery, NewReview, NewReviewResponse, Paginated, ProofUpload,
    Review, ReviewQuery, ReviewResponse, ReviewUpdate,
};
use crate::models::shop::Shop;
use crate::models::user::User;
use gloo_net::http::{Request, RequestBuilder, Response};
use leptos::logging::{error, log};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Backend base URL baked in at build time; empty means same origin.
pub fn backend_url() -> &'static str {
    option_env!("TRUSTSHOP_BACKEND_URL").unwrap_or("")
}

/// Review operations the UI depends on. `ApiClient` talks HTTP; tests substitute
/// an in-memory implementation.
#[allow(async_fn_in_trait)]
pub trait ReviewBackend {
    async fn list_reviews(&self, query: &ReviewQuery) -> Result<Paginated<Review>, ApiError>;
    async fn create_review(&self, review: &NewReview) -> Result<Review, ApiError>;
    async fn update_review(&self, id: &str, update: &ReviewUpdate) -> Result<Review, ApiError>;
    async fn delete_review(&self, id: &str) -> Result<(), ApiError>;
    async fn upload_proof(&self, id: &str, proof: &ProofUpload) -> Result<ActionOutcome, ApiError>;
    async fn admin_reviews(&self, query: &AdminReviewQuery) -> Result<Paginated<Review>, ApiError>;
    async fn pending_reviews(&self) -> Result<Paginated<Review>, ApiError>;
    async fn review_action(&self, id: &str, action: &AdminReviewAction) -> Result<ActionOutcome, ApiError>;
    async fn respond_to_review(&self, response: &NewReviewResponse) -> Result<ReviewResponse, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        ApiClient { base_url: base_url.into().trim_end_matches('/').to_string(), token }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", &format!("Bearer {token}")),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.authorize(Request::get(&self.url(path))).send().await.map_err(transport)?;
        decode(response).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.authorize(builder).json(body).map_err(transport)?;
        let response = request.send().await.map_err(transport)?;
        decode(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.authorize(Request::delete(&self.url(path))).send().await.map_err(transport)?;
        check(response).await.map(|_| ())
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.get("/auth/me").await
    }

    pub async fn shop(&self, id: &str) -> Result<Shop, ApiError> {
        self.get(&format!("/shops/{}", urlencoding::encode(id))).await
    }

    pub async fn review_response(&self, review_id: &str) -> Result<Option<ReviewResponse>, ApiError> {
        self.get(&format!("/review-responses/review/{}", urlencoding::encode(review_id))).await
    }

    pub async fn admin_delete_review(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/admin/reviews/{}", urlencoding::encode(id))).await
    }
}

impl ReviewBackend for ApiClient {
    async fn list_reviews(&self, query: &ReviewQuery) -> Result<Paginated<Review>, ApiError> {
        let mut params = Vec::new();
        push_param(&mut params, "shop_id", query.shop_id.as_deref());
        push_param(&mut params, "user_id", query.user_id.as_deref());
        push_param(&mut params, "page", query.page.map(|p| p.to_string()).as_deref());
        push_param(&mut params, "limit", query.limit.map(|l| l.to_string()).as_deref());
        self.get(&format!("/reviews{}", query_string(&params))).await
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review, ApiError> {
        log!("[CLIENT] Creating review for shop {}", review.shop_id);
        self.send_json(Request::post(&self.url("/reviews")), review).await
    }

    async fn update_review(&self, id: &str, update: &ReviewUpdate) -> Result<Review, ApiError> {
        let url = self.url(&format!("/reviews/{}", urlencoding::encode(id)));
        self.send_json(Request::put(&url), update).await
    }

    async fn delete_review(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/reviews/{}", urlencoding::encode(id))).await
    }

    async fn upload_proof(&self, id: &str, proof: &ProofUpload) -> Result<ActionOutcome, ApiError> {
        log!("[CLIENT] Uploading {} proof photos for review {}", proof.proof_photos.len(), id);
        let url = self.url(&format!("/reviews/{}/upload-proof", urlencoding::encode(id)));
        self.send_json(Request::post(&url), proof).await
    }

    async fn admin_reviews(&self, query: &AdminReviewQuery) -> Result<Paginated<Review>, ApiError> {
        let mut params = Vec::new();
        push_param(&mut params, "status_filter", query.status_filter.map(|s| s.as_str()));
        push_param(&mut params, "review_type", query.review_type.map(|t| t.as_str()));
        push_param(&mut params, "shop_id", query.shop_id.as_deref());
        push_param(&mut params, "search", query.search.as_deref().filter(|s| !s.trim().is_empty()));
        push_param(&mut params, "page", query.page.map(|p| p.to_string()).as_deref());
        push_param(&mut params, "limit", query.limit.map(|l| l.to_string()).as_deref());
        self.get(&format!("/admin/reviews{}", query_string(&params))).await
    }

    async fn pending_reviews(&self) -> Result<Paginated<Review>, ApiError> {
        self.get("/admin/reviews/pending").await
    }

    async fn review_action(&self, id: &str, action: &AdminReviewAction) -> Result<ActionOutcome, ApiError> {
        let url = self.url(&format!("/admin/reviews/{}/action", urlencoding::encode(id)));
        self.send_json(Request::post(&url), action).await
    }

    async fn respond_to_review(&self, response: &NewReviewResponse) -> Result<ReviewResponse, ApiError> {
        self.send_json(Request::post(&self.url("/review-responses")), response).await
    }
}

fn transport(err: gloo_net::Error) -> ApiError {
    error!("[CLIENT] Transport error: {:?}", err);
    ApiError::Transport(err.to_string())
}

async fn check(response: Response) -> Result<Response, ApiError> {
    if response.ok() {
        return Ok(response);
    }
    let status = response.status();
    let detail = response.json::<ErrorBody>().await.ok().map(|b| b.detail);
    log!("[CLIENT] Request to {} failed with {}", response.url(), status);
    Err(ApiError::from_status(status, detail))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check(response).await?;
    response.json::<T>().await.map_err(transport)
}

fn push_param(params: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        params.push((key, value.to_string()));
    }
}

fn query_string(params: &[(&'static str, String)]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let joined = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("?{joined}")
}
