use crate::client::ReviewBackend;
use crate::components::delete_review_dialog::DeleteReviewDialog;
use crate::components::edit_review_dialog::EditReviewDialog;
use crate::components::notification::use_notifications;
use crate::components::proof_upload_dialog::ProofUploadDialog;
use crate::components::reviews_list::ReviewCard;
use crate::components::status_badge::StatusBadge;
use crate::models::review::{Review, ReviewQuery, ReviewStatus};
use crate::review::actions::PendingDeletion;
use crate::review::proof::requires_proof;
use crate::session::Session;
use crate::utils::mount_guard::MountGuard;
use leptos::*;

const MAX_OWN_REVIEWS: u32 = 100;

/// `/account/reviews`: the signed-in customer's reviews in every status.
#[component]
pub fn MyReviews() -> impl IntoView {
    let session = expect_context::<Session>();
    let notifications = use_notifications();
    let reviews = create_rw_signal(Vec::<Review>::new());
    let loaded = create_rw_signal(false);
    let reload = create_rw_signal(0u32);
    let editing = create_rw_signal(None::<Review>);
    let deleting = create_rw_signal(None::<PendingDeletion>);
    let adding_proof = create_rw_signal(None::<Review>);
    let guard = MountGuard::new();
    let user = session.user();

    create_effect({
        let session = session.clone();
        move |_| {
            let _ = reload.get();
            let Some(user_id) = user.with(|u| u.as_ref().map(|u| u.id.clone())) else {
                return;
            };
            let query = ReviewQuery {
                user_id: Some(user_id),
                limit: Some(MAX_OWN_REVIEWS),
                ..ReviewQuery::default()
            };
            let session = session.clone();
            let guard = guard.clone();
            spawn_local(async move {
                let result = session.client().list_reviews(&query).await;
                guard.run("my reviews", || {
                    loaded.set(true);
                    match result {
                        Ok(page) => reviews.set(page.data),
                        Err(err) => notifications.report(&session, &err),
                    }
                });
            });
        }
    });

    let refetch = move |_: ()| reload.update(|n| *n += 1);

    let on_saved = move |updated: Review| {
        reviews.update(|list| {
            if let Some(slot) = list.iter_mut().find(|r| r.id == updated.id) {
                *slot = updated;
            }
        });
        editing.set(None);
        adding_proof.set(None);
    };

    view! {
        <section class="my-reviews">
            <h1>"My reviews"</h1>
            <Show when=move || loaded.get() && reviews.with(Vec::is_empty)>
                <p class="hint">"You have not written any reviews yet."</p>
            </Show>
            <For
                each=move || reviews.get()
                key=|review| (review.id.clone(), review.updated_at)
                children=move |review| {
                    let status = review.status;
                    let notes = (status == ReviewStatus::Rejected).then(|| review.admin_notes.clone()).flatten();
                    let for_edit = review.clone();
                    let for_proof = (status == ReviewStatus::Pending && requires_proof(review.rating))
                        .then(|| review.clone());
                    let for_delete = PendingDeletion::request(&review);
                    view! {
                        <ReviewCard review=review>
                            <p class="shop-name">{for_edit.shop_name.clone()}</p>
                            <StatusBadge status=status/>
                            {notes.map(|n| view! { <p class="admin-notes">"Moderator note: " {n}</p> })}
                            <div class="actions">
                                <button on:click={
                                    let for_edit = for_edit.clone();
                                    move |_| editing.set(Some(for_edit.clone()))
                                }>"Edit"</button>
                                {for_proof.map(|target| view! {
                                    <button on:click=move |_| adding_proof.set(Some(target.clone()))>
                                        "Add proof"
                                    </button>
                                })}
                                <button class="danger" on:click=move |_| deleting.set(Some(for_delete.clone()))>
                                    "Delete"
                                </button>
                            </div>
                        </ReviewCard>
                    }
                }
            />
            {move || editing.get().map(|review| view! {
                <EditReviewDialog
                    review=review
                    on_saved=on_saved
                    on_close=move |_| editing.set(None)
                    on_stale=move |_| {
                        editing.set(None);
                        refetch(());
                    }
                />
            })}
            {move || adding_proof.get().map(|review| view! {
                <ProofUploadDialog
                    review=review
                    on_saved=on_saved
                    on_close=move |_| adding_proof.set(None)
                    on_stale=move |_| {
                        adding_proof.set(None);
                        refetch(());
                    }
                />
            })}
            {move || deleting.get().map(|pending| view! {
                <DeleteReviewDialog
                    pending=pending
                    reviews=reviews
                    on_close=move |_| deleting.set(None)
                    on_stale=move |_| {
                        deleting.set(None);
                        refetch(());
                    }
                />
            })}
        </section>
    }
}
