#![cfg(feature = "ssr")]

use actix_web::{test, web, App};
use base64::{engine::general_purpose::STANDARD, Engine};
use leptos::logging::log;
use serde_json::{json, Value};
use trustshop::api;
use trustshop::db::Database;
use trustshop::models::review::{ActionOutcome, Paginated, Review, ReviewProof, ReviewResponse, ReviewStatus};
use trustshop::models::shop::Shop;
use trustshop::models::user::{Role, User};

const PNG_PHOTO: &str = "data:image/png;base64,iVBORw0KGgo=";
const SHOP_ID: &str = "shop-1";

struct Tokens {
    shopper: String,
    other: String,
    owner: String,
    admin: String,
}

// Helper function to set up an in-memory store with one shop and four accounts
async fn setup_test_environment() -> (Database, Tokens) {
    log!("[TEST] Setting up review workflow environment");
    let db = Database::new(":memory:").unwrap();
    db.create_schema().await.unwrap();

    let mut tokens = Vec::new();
    for (id, name, role) in [
        ("u-shopper", "Sarah Klein", Role::Shopper),
        ("u-other", "Tom Berger", Role::Shopper),
        ("u-owner", "Otto Owner", Role::ShopOwner),
        ("u-admin", "Ada Admin", Role::Admin),
    ] {
        let user = User { id: id.into(), email: format!("{id}@example.com"), full_name: name.into(), role };
        db.insert_user(&user).await.unwrap();
        tokens.push(db.create_session(id).await.unwrap());
    }
    db.insert_shop(&Shop {
        id: SHOP_ID.into(),
        name: "Gadget Hub".into(),
        category: Some("electronics".into()),
        website: None,
        owner_id: Some("u-owner".into()),
        rating: 0.0,
        review_count: 0,
        trust_grade: None,
    })
    .await
    .unwrap();

    let mut tokens = tokens.into_iter();
    let mut next = || tokens.next().unwrap();
    let tokens = Tokens { shopper: next(), other: next(), owner: next(), admin: next() };
    (db, tokens)
}

macro_rules! service {
    ($db:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($db.clone()))
                .service(web::scope("/api").configure(api::configure)),
        )
        .await
    };
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// A PNG-signed photo of `len` bytes, as the browser would encode it.
fn png_photo_of(len: usize) -> String {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(len, 0);
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

fn low_review_body() -> Value {
    json!({
        "shop_id": SHOP_ID,
        "rating": 2,
        "comment": "Item arrived broken and late",
        "proof_order_number": "ORD-4711",
        "proof_photos": [PNG_PHOTO],
    })
}

#[actix_web::test]
async fn high_rating_is_published_immediately() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"shop_id": SHOP_ID, "rating": 5, "comment": "Great service, fast shipping!"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: Review = test::read_body_json(resp).await;
    assert_eq!(created.status, ReviewStatus::Published);
    assert_eq!(created.user_name, "Sarah K.");

    let req = test::TestRequest::get().uri(&format!("/api/reviews?shop_id={SHOP_ID}")).to_request();
    let listing: Paginated<Review> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing.total, 1);
    assert_eq!(listing.data[0].id, created.id);

    let req = test::TestRequest::get().uri(&format!("/api/shops/{SHOP_ID}")).to_request();
    let shop: Shop = test::call_and_read_body_json(&app, req).await;
    assert_eq!(shop.review_count, 1);
    assert_eq!(shop.trust_grade.as_deref(), Some("A"));
}

#[actix_web::test]
async fn server_enforces_proof_on_direct_calls() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    for body in [
        json!({"shop_id": SHOP_ID, "rating": 1, "comment": "Never arrived, no refund"}),
        json!({"shop_id": SHOP_ID, "rating": 3, "comment": "Never arrived, no refund", "proof_order_number": "ORD-1"}),
        json!({"shop_id": SHOP_ID, "rating": 2, "comment": "Never arrived, no refund",
               "proof_order_number": "ORD-1", "proof_photos": ["data:text/plain;base64,aGk="]}),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/reviews")
            .insert_header(bearer(&tokens.shopper))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let error: Value = test::read_body_json(resp).await;
        assert!(error["detail"].is_string());
    }

    let listing = db
        .query_reviews(&trustshop::db::ReviewFilter { limit: 10, ..Default::default() })
        .await
        .unwrap();
    assert_eq!(listing.total, 0);
}

#[actix_web::test]
async fn low_rating_goes_through_moderation() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.shopper))
        .set_json(low_review_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: Review = test::read_body_json(resp).await;
    assert_eq!(created.status, ReviewStatus::Pending);
    assert_eq!(created.proof_photos.len(), 1);

    // pending reviews stay out of the public listing
    let req = test::TestRequest::get().uri(&format!("/api/reviews?shop_id={SHOP_ID}")).to_request();
    let public: Paginated<Review> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(public.total, 0);

    let req = test::TestRequest::get()
        .uri("/api/admin/reviews/pending")
        .insert_header(bearer(&tokens.admin))
        .to_request();
    let pending: Paginated<Review> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(pending.total, 1);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/reviews/{}/action", created.id))
            .insert_header(bearer(&tokens.admin))
            .set_json(json!({"action": "approve", "admin_notes": "verified with carrier"}))
            .to_request();
        let outcome: ActionOutcome = test::call_and_read_body_json(&app, req).await;
        assert!(outcome.success);
        assert_eq!(outcome.new_status, ReviewStatus::Approved);
    }

    let req = test::TestRequest::get()
        .uri("/api/admin/reviews?status_filter=approved")
        .insert_header(bearer(&tokens.admin))
        .to_request();
    let approved: Paginated<Review> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(approved.total, 1);
    assert_eq!(approved.data[0].admin_notes.as_deref(), Some("verified with carrier"));

    // public viewers see the review without proof or notes
    let req = test::TestRequest::get().uri(&format!("/api/reviews?shop_id={SHOP_ID}")).to_request();
    let public: Paginated<Review> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(public.total, 1);
    assert!(public.data[0].admin_notes.is_none());
    assert!(public.data[0].proof_photos.is_empty());
    assert!(public.data[0].proof_order_number.is_none());

    // the author keeps the proof but not the note of an approved review
    let req = test::TestRequest::get()
        .uri("/api/reviews?user_id=u-shopper")
        .insert_header(bearer(&tokens.shopper))
        .to_request();
    let own: Paginated<Review> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(own.data[0].proof_order_number.as_deref(), Some("ORD-4711"));
    assert!(own.data[0].admin_notes.is_none());
}

#[actix_web::test]
async fn rejection_is_visible_to_author_with_note() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.shopper))
        .set_json(low_review_body())
        .to_request();
    let created: Review = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/admin/reviews/{}/action", created.id))
        .insert_header(bearer(&tokens.admin))
        .set_json(json!({"action": "reject", "admin_notes": "x"}))
        .to_request();
    let outcome: ActionOutcome = test::call_and_read_body_json(&app, req).await;
    assert_eq!(outcome.new_status, ReviewStatus::Rejected);

    let req = test::TestRequest::get()
        .uri("/api/reviews?user_id=u-shopper")
        .insert_header(bearer(&tokens.shopper))
        .to_request();
    let own: Paginated<Review> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(own.data[0].status, ReviewStatus::Rejected);
    assert_eq!(own.data[0].admin_notes.as_deref(), Some("x"));

    // raising the rating does not lift a rejection
    let req = test::TestRequest::put()
        .uri(&format!("/api/reviews/{}", created.id))
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"rating": 5, "comment": "Resolved after all, thanks"}))
        .to_request();
    let edited: Review = test::call_and_read_body_json(&app, req).await;
    assert_eq!(edited.status, ReviewStatus::Rejected);
    assert!(edited.proof_photos.is_empty());
}

#[actix_web::test]
async fn other_users_cannot_touch_a_review() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"shop_id": SHOP_ID, "rating": 4, "comment": "Good, but slow delivery"}))
        .to_request();
    let created: Review = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/reviews/{}", created.id))
        .insert_header(bearer(&tokens.other))
        .set_json(json!({"comment": "Hijacked comment text"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/reviews/{}", created.id))
        .insert_header(bearer(&tokens.other))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let stored = db.get_review(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.comment, "Good, but slow delivery");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/reviews/{}", created.id))
        .insert_header(bearer(&tokens.shopper))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);
    assert!(db.get_review(&created.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn editing_into_low_band_requires_proof_and_moderation() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"shop_id": SHOP_ID, "rating": 5, "comment": "Great service, fast shipping!"}))
        .to_request();
    let created: Review = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/reviews/{}", created.id))
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"rating": 2}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::put()
        .uri(&format!("/api/reviews/{}", created.id))
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"rating": 2, "proof_order_number": "ORD-9", "proof_photos": [PNG_PHOTO]}))
        .to_request();
    let edited: Review = test::call_and_read_body_json(&app, req).await;
    assert_eq!(edited.status, ReviewStatus::Pending);
}

#[actix_web::test]
async fn authentication_and_roles_are_enforced() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    let req = test::TestRequest::post().uri("/api/reviews").set_json(low_review_body()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get().uri("/api/auth/me").insert_header(bearer("bogus")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get().uri("/api/auth/me").insert_header(bearer(&tokens.admin)).to_request();
    let me: User = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me.role, Role::Admin);

    let req = test::TestRequest::get()
        .uri("/api/admin/reviews")
        .insert_header(bearer(&tokens.shopper))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::post()
        .uri("/api/admin/reviews/missing/action")
        .insert_header(bearer(&tokens.admin))
        .set_json(json!({"action": "approve"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn one_review_per_shop_and_filtered_content() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"shop_id": SHOP_ID, "rating": 4, "comment": "Write me at sarah@example.com"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    for expected in [201, 400] {
        let req = test::TestRequest::post()
            .uri("/api/reviews")
            .insert_header(bearer(&tokens.shopper))
            .set_json(json!({"shop_id": SHOP_ID, "rating": 4, "comment": "Good, but slow delivery"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), expected);
    }
}

#[actix_web::test]
async fn shop_owner_may_respond_once() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"shop_id": SHOP_ID, "rating": 4, "comment": "Good, but slow delivery"}))
        .to_request();
    let created: Review = test::call_and_read_body_json(&app, req).await;

    let reply = json!({"review_id": created.id, "response": "Sorry, we changed carriers"});
    let req = test::TestRequest::post()
        .uri("/api/review-responses")
        .insert_header(bearer(&tokens.other))
        .set_json(&reply)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::post()
        .uri("/api/review-responses")
        .insert_header(bearer(&tokens.owner))
        .set_json(&reply)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let stored: ReviewResponse = test::read_body_json(resp).await;

    let req = test::TestRequest::post()
        .uri("/api/review-responses")
        .insert_header(bearer(&tokens.owner))
        .set_json(&reply)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 409);

    let req = test::TestRequest::get()
        .uri(&format!("/api/review-responses/review/{}", created.id))
        .to_request();
    let fetched: Option<ReviewResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.map(|r| r.id), Some(stored.id.clone()));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/review-responses/{}", stored.id))
        .insert_header(bearer(&tokens.owner))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);
}

#[actix_web::test]
async fn full_size_proof_photos_are_accepted() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    // well above actix's default 2 MiB JSON limit
    let photos = vec![png_photo_of(3 * 1024 * 1024), png_photo_of(3 * 1024 * 1024)];
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({
            "shop_id": SHOP_ID,
            "rating": 2,
            "comment": "Item arrived broken and late",
            "proof_order_number": "ORD-1",
            "proof_photos": photos,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: Review = test::read_body_json(resp).await;
    assert_eq!(created.proof_photos.len(), 2);

    // the photo cap itself still applies
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.other))
        .set_json(json!({
            "shop_id": SHOP_ID,
            "rating": 2,
            "comment": "Item arrived broken and late",
            "proof_order_number": "ORD-2",
            "proof_photos": [png_photo_of(10 * 1024 * 1024 + 1)],
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn pages_past_the_end_are_empty() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"shop_id": SHOP_ID, "rating": 5, "comment": "Great service, fast shipping!"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let max = u32::MAX;
    let req = test::TestRequest::get().uri(&format!("/api/reviews?shop_id={SHOP_ID}&page={max}")).to_request();
    let public: Paginated<Review> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(public.total, 1);
    assert!(public.data.is_empty());

    let req = test::TestRequest::get()
        .uri(&format!("/api/admin/reviews?page={max}&limit=100"))
        .insert_header(bearer(&tokens.admin))
        .to_request();
    let admin: Paginated<Review> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(admin.total, 1);
    assert!(admin.data.is_empty());
}

#[actix_web::test]
async fn author_attaches_proof_while_pending() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.shopper))
        .set_json(low_review_body())
        .to_request();
    let created: Review = test::call_and_read_body_json(&app, req).await;
    let upload = json!({
        "proof_order_number": " ORD-5 ",
        "proof_photos": [PNG_PHOTO, PNG_PHOTO],
        "proof_chat_history": "Seller: no refund after 14 days",
    });

    let req = test::TestRequest::post()
        .uri(&format!("/api/reviews/{}/upload-proof", created.id))
        .insert_header(bearer(&tokens.other))
        .set_json(&upload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::post()
        .uri(&format!("/api/reviews/{}/upload-proof", created.id))
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"proof_order_number": "ORD-5", "proof_photos": []}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::post()
        .uri(&format!("/api/reviews/{}/upload-proof", created.id))
        .insert_header(bearer(&tokens.shopper))
        .set_json(&upload)
        .to_request();
    let outcome: ActionOutcome = test::call_and_read_body_json(&app, req).await;
    assert_eq!(outcome.new_status, ReviewStatus::Pending);

    let req = test::TestRequest::get()
        .uri(&format!("/api/reviews/{}/proof", created.id))
        .insert_header(bearer(&tokens.shopper))
        .to_request();
    let proof: ReviewProof = test::call_and_read_body_json(&app, req).await;
    assert_eq!(proof.proof_order_number.as_deref(), Some("ORD-5"));
    assert_eq!(proof.proof_photos.len(), 2);
    assert_eq!(proof.proof_chat_history.as_deref(), Some("Seller: no refund after 14 days"));

    let req = test::TestRequest::get()
        .uri(&format!("/api/reviews/{}/proof", created.id))
        .insert_header(bearer(&tokens.other))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // moderators see the transcript in the queue
    let req = test::TestRequest::get()
        .uri("/api/admin/reviews/pending")
        .insert_header(bearer(&tokens.admin))
        .to_request();
    let pending: Paginated<Review> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(pending.data[0].proof_chat_history.as_deref(), Some("Seller: no refund after 14 days"));

    let req = test::TestRequest::post()
        .uri(&format!("/api/admin/reviews/{}/action", created.id))
        .insert_header(bearer(&tokens.admin))
        .set_json(json!({"action": "approve"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::post()
        .uri(&format!("/api/reviews/{}/upload-proof", created.id))
        .insert_header(bearer(&tokens.shopper))
        .set_json(&upload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn proof_upload_is_refused_for_high_ratings() {
    let (db, tokens) = setup_test_environment().await;
    let app = service!(db);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"shop_id": SHOP_ID, "rating": 5, "comment": "Great service, fast shipping!"}))
        .to_request();
    let created: Review = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/reviews/{}/upload-proof", created.id))
        .insert_header(bearer(&tokens.shopper))
        .set_json(json!({"proof_order_number": "ORD-5", "proof_photos": [PNG_PHOTO]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let error: Value = test::read_body_json(resp).await;
    assert!(error["detail"].as_str().is_some_and(|d| d.contains("3 stars")));
}
