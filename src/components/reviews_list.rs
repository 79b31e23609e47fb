use crate::client::ReviewBackend;
use crate::components::notification::use_notifications;
use crate::error::ApiError;
use crate::models::review::{Paginated, Review, ReviewQuery, ReviewType};
use crate::review::actions::respond_to_review;
use crate::session::Session;
use crate::utils::in_flight::InFlight;
use crate::utils::mount_guard::MountGuard;
use leptos::logging::log;
use leptos::*;

const PAGE_SIZE: u32 = 10;

pub fn stars(rating: u8) -> String {
    (1..=5).map(|i| if i <= rating { '★' } else { '☆' }).collect()
}

/// Read-only presentation of one review.
#[component]
pub fn ReviewCard(review: Review, #[prop(optional)] children: Option<Children>) -> impl IntoView {
    let verified = review.review_type == ReviewType::Verified;
    view! {
        <article class="review-card">
            <header>
                <span class="stars" aria-label=format!("{} of 5 stars", review.rating)>{stars(review.rating.get())}</span>
                <strong>{review.user_name.clone()}</strong>
                {verified.then(|| view! { <span class="verified">"Verified purchase"</span> })}
                <time>{review.created_at.format("%d %b %Y").to_string()}</time>
            </header>
            <p>{review.comment.clone()}</p>
            {review.response.clone().map(|text| view! {
                <blockquote class="owner-response">
                    <strong>"Response from the shop"</strong>
                    <p>{text}</p>
                </blockquote>
            })}
            {children.map(|children| children())}
        </article>
    }
}

#[component]
fn ReplyForm(review_id: String, #[prop(into)] on_sent: Callback<()>) -> impl IntoView {
    let session = expect_context::<Session>();
    let notifications = use_notifications();
    let text = create_rw_signal(String::new());
    let busy = InFlight::new();
    let guard = MountGuard::new();
    let review_id = store_value(review_id);

    let send = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if !busy.begin() {
            return;
        }
        let session = session.clone();
        let guard = guard.clone();
        spawn_local(async move {
            let client = session.client();
            let result = respond_to_review(&client, &review_id.get_value(), &text.get_untracked()).await;
            guard.run("reply form", || {
                busy.finish();
                match result {
                    Ok(()) => {
                        text.set(String::new());
                        notifications.success("Your response was published.");
                        on_sent.call(());
                    }
                    Err(err) => notifications.report(&session, &err),
                }
            });
        });
    };

    view! {
        <form class="reply-form" on:submit=send>
            <textarea
                placeholder="Respond as the shop"
                prop:value=move || text.get()
                on:input=move |ev| text.set(event_target_value(&ev))
            ></textarea>
            <button type="submit" disabled=move || busy.is_busy() || text.with(|t| t.trim().is_empty())>
                "Respond"
            </button>
        </form>
    }
}

/// Public reviews of a shop, newest first. Refetches when `refresh` changes.
#[component]
pub fn ReviewsList(
    shop_id: String,
    #[prop(into)] refresh: Signal<u32>,
    #[prop(into)] can_respond: Signal<bool>,
) -> impl IntoView {
    let session = expect_context::<Session>();
    let notifications = use_notifications();
    let page = create_rw_signal(1u32);
    let listing = create_rw_signal(Paginated::<Review>::empty());
    let loading = create_rw_signal(false);
    let replied = create_rw_signal(0u32);
    let guard = MountGuard::new();
    let shop_id = store_value(shop_id);

    // effects only run in the browser, so nothing is fetched during SSR
    create_effect(move |_| {
        let query = ReviewQuery {
            shop_id: Some(shop_id.get_value()),
            page: Some(page.get()),
            limit: Some(PAGE_SIZE),
            ..ReviewQuery::default()
        };
        let _ = (refresh.get(), replied.get(), session.token().get());
        loading.set(true);
        let session = session.clone();
        let guard = guard.clone();
        spawn_local(async move {
            let result = session.client().list_reviews(&query).await;
            guard.run("reviews list", || {
                loading.set(false);
                match result {
                    Ok(data) => {
                        log!("[CLIENT] Loaded {} reviews", data.data.len());
                        listing.set(data);
                    }
                    Err(ApiError::NotFound) => listing.set(Paginated::empty()),
                    Err(err) => notifications.report(&session, &err),
                }
            });
        });
    });

    view! {
        <section class="reviews-list">
            <h3>{move || format!("Reviews ({})", listing.with(|l| l.total))}</h3>
            <Show when=move || loading.get()>
                <p class="hint">"Loading reviews..."</p>
            </Show>
            <Show when=move || !loading.get() && listing.with(|l| l.data.is_empty())>
                <p class="hint">"No reviews yet."</p>
            </Show>
            <For
                each=move || listing.get().data
                key=|review| (review.id.clone(), review.response.clone())
                children=move |review| {
                    let reply = (can_respond.get_untracked() && review.response.is_none()).then(|| {
                        let id = review.id.clone();
                        view! { <ReplyForm review_id=id on_sent=move |_| replied.update(|n| *n += 1)/> }
                    });
                    view! { <ReviewCard review=review>{reply}</ReviewCard> }
                }
            />
            <nav class="pagination">
                <button disabled=move || page.get() <= 1 on:click=move |_| page.update(|p| *p -= 1)>
                    "Previous"
                </button>
                <span>{move || format!("Page {} of {}", page.get(), listing.with(|l| l.pages))}</span>
                <button
                    disabled=move || listing.with(|l| page.get() >= l.pages)
                    on:click=move |_| page.update(|p| *p += 1)
                >
                    "Next"
                </button>
            </nav>
        </section>
    }
}
