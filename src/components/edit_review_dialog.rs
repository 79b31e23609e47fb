use crate::components::notification::use_notifications;
use crate::components::review_form::DraftFields;
use crate::error::{ApiError, ValidationError};
use crate::models::review::Review;
use crate::review::actions::edit_review;
use crate::review::draft::ReviewDraft;
use crate::session::Session;
use crate::utils::in_flight::InFlight;
use crate::utils::mount_guard::MountGuard;
use leptos::*;

/// Edit dialog pre-filled from `review`. The proof rules are applied to the
/// edited rating, not the stored one.
#[component]
pub fn EditReviewDialog(
    review: Review,
    #[prop(into)] on_saved: Callback<Review>,
    #[prop(into)] on_close: Callback<()>,
    #[prop(into)] on_stale: Callback<()>,
) -> impl IntoView {
    let session = expect_context::<Session>();
    let notifications = use_notifications();
    let initial = ReviewDraft::for_edit(&review);
    let photos = create_rw_signal(initial.proof_photos.clone());
    let draft = create_rw_signal(initial);
    let error = create_rw_signal(None::<ValidationError>);
    let busy = InFlight::new();
    let guard = MountGuard::new();
    let review_id = store_value(review.id.clone());

    let save = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let mut current = draft.get_untracked();
        current.proof_photos = photos.get_untracked();
        if let Err(err) = current.validate() {
            error.set(Some(err));
            return;
        }
        if !busy.begin() {
            return;
        }
        error.set(None);
        let session = session.clone();
        let guard = guard.clone();
        spawn_local(async move {
            let result = edit_review(&session.client(), &review_id.get_value(), &current).await;
            guard.run("edit dialog", || {
                busy.finish();
                match result {
                    Ok(outcome) => {
                        notifications.success(outcome.message);
                        on_saved.call(outcome.review);
                    }
                    Err(ApiError::Validation(err)) => error.set(Some(err)),
                    Err(err) => {
                        notifications.report(&session, &err);
                        if err.requires_refresh() {
                            on_stale.call(());
                        }
                    }
                }
            });
        });
    };

    view! {
        <div class="modal-backdrop">
            <form class="modal" role="dialog" aria-modal="true" on:submit=save>
                <h2>{format!("Edit your review of {}", review.shop_name)}</h2>
                <DraftFields draft=draft photos=photos error=error/>
                <footer>
                    <button type="button" disabled=move || busy.is_busy() on:click=move |_| on_close.call(())>
                        "Cancel"
                    </button>
                    <button type="submit" disabled=move || busy.is_busy()>
                        {move || if busy.is_busy() { "Saving..." } else { "Save changes" }}
                    </button>
                </footer>
            </form>
        </div>
    }
}
