use crate::components::notification::use_notifications;
use crate::models::review::Review;
use crate::review::actions::PendingDeletion;
use crate::session::Session;
use crate::utils::in_flight::InFlight;
use crate::utils::mount_guard::MountGuard;
use leptos::*;

/// Second step of deletion. Confirming removes the review from `reviews` in place.
#[component]
pub fn DeleteReviewDialog(
    pending: PendingDeletion,
    reviews: RwSignal<Vec<Review>>,
    #[prop(into)] on_close: Callback<()>,
    #[prop(into)] on_stale: Callback<()>,
) -> impl IntoView {
    let session = expect_context::<Session>();
    let notifications = use_notifications();
    let busy = InFlight::new();
    let guard = MountGuard::new();
    let shop_name = pending.shop_name.clone();
    let pending = store_value(pending);

    let confirm = move |_| {
        if !busy.begin() {
            return;
        }
        let session = session.clone();
        let guard = guard.clone();
        spawn_local(async move {
            let pending = pending.get_value();
            let result = pending.confirm(&session.client()).await;
            guard.run("delete dialog", || {
                busy.finish();
                match result {
                    Ok(()) => {
                        reviews.update(|list| pending.remove_from(list));
                        notifications.success("Your review was deleted.");
                        on_close.call(());
                    }
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
            <div class="modal" role="alertdialog" aria-modal="true">
                <h2>"Delete review?"</h2>
                <p>{format!("Your review of {shop_name} will be removed permanently.")}</p>
                <footer>
                    <button type="button" disabled=move || busy.is_busy() on:click=move |_| on_close.call(())>
                        "Keep review"
                    </button>
                    <button type="button" class="danger" disabled=move || busy.is_busy() on:click=confirm>
                        {move || if busy.is_busy() { "Deleting..." } else { "Delete" }}
                    </button>
                </footer>
            </div>
        </div>
    }
}
