use crate::components::notification::use_notifications;
use crate::components::review_form::ReviewForm;
use crate::components::reviews_list::{stars, ReviewsList};
use crate::models::review::Review;
use crate::models::shop::Shop;
use crate::review::trust::TrustGrade;
use crate::session::Session;
use crate::utils::mount_guard::MountGuard;
use leptos::*;
use leptos_router::use_params_map;

#[component]
fn ShopHeader(shop: Shop) -> impl IntoView {
    let grade = (shop.review_count > 0).then(|| TrustGrade::from_rating(shop.rating));
    view! {
        <header class="shop-header">
            <h1>{shop.name.clone()}</h1>
            {shop.category.clone().map(|c| view! { <span class="category">{c}</span> })}
            <p>
                <span class="stars">{stars(shop.rating.round() as u8)}</span>
                {format!(" {:.2} from {} verified reviews", shop.rating, shop.review_count)}
            </p>
            {grade.map(|g| view! {
                <span class=format!("trust-grade grade-{}", g.as_str().to_lowercase())>
                    {format!("Trust grade {} ({})", g.as_str(), g.label())}
                </span>
            })}
            {shop.website.clone().map(|w| view! { <a href=w.clone() rel="noopener">{w}</a> })}
        </header>
    }
}

/// `/shops/:id`: shop summary, the submission form and the public reviews.
#[component]
pub fn ShopPage() -> impl IntoView {
    let session = expect_context::<Session>();
    let notifications = use_notifications();
    let params = use_params_map();
    let shop_id = move || params.with(|p| p.get("id").cloned().unwrap_or_default());
    let shop = create_rw_signal(None::<Shop>);
    let refresh = create_rw_signal(0u32);
    let guard = MountGuard::new();
    let user = session.user();

    create_effect({
        let session = session.clone();
        move |_| {
            let id = shop_id();
            let _ = refresh.get();
            let session = session.clone();
            let guard = guard.clone();
            spawn_local(async move {
                let result = session.client().shop(&id).await;
                guard.run("shop page", || match result {
                    Ok(loaded) => shop.set(Some(loaded)),
                    Err(err) => notifications.report(&session, &err),
                });
            });
        }
    });

    let can_respond = Signal::derive(move || {
        let owner = shop.with(|s| s.as_ref().and_then(|s| s.owner_id.clone()));
        user.with(|u| u.as_ref().is_some_and(|u| u.is_admin() || Some(&u.id) == owner.as_ref()))
    });

    view! {
        <div class="shop-page">
            {move || shop.get().map(|s| view! { <ShopHeader shop=s/> })}
            {move || {
                let id = shop_id();
                view! {
                    <ReviewForm
                        shop_id=id.clone()
                        on_created=move |_: Review| refresh.update(|n| *n += 1)
                    />
                    <ReviewsList shop_id=id refresh=refresh can_respond=can_respond/>
                }
            }}
        </div>
    }
}
