use crate::components::image_upload::{read_as_data_url, ImageUpload};
use crate::components::notification::use_notifications;
use crate::error::{ApiError, ValidationError};
use crate::models::review::Review;
use crate::review::actions::upload_proof;
use crate::review::proof::MAX_CHAT_HISTORY_BYTES;
use crate::session::Session;
use crate::utils::in_flight::InFlight;
use crate::utils::mount_guard::MountGuard;
use leptos::*;
use web_sys::HtmlInputElement;

/// Lets the author of a pending low-rating review replace its evidence: order
/// number, photos and an optional chat transcript (pasted or attached as a file).
#[component]
pub fn ProofUploadDialog(
    review: Review,
    #[prop(into)] on_saved: Callback<Review>,
    #[prop(into)] on_close: Callback<()>,
    #[prop(into)] on_stale: Callback<()>,
) -> impl IntoView {
    let session = expect_context::<Session>();
    let notifications = use_notifications();
    let order_number = create_rw_signal(review.proof_order_number.clone().unwrap_or_default());
    let photos = create_rw_signal(review.proof_photos.clone());
    let chat_history = create_rw_signal(review.proof_chat_history.clone().unwrap_or_default());
    let stored_file = review.proof_chat_history.as_deref().is_some_and(|c| c.starts_with("data:"));
    let attached_file = create_rw_signal(stored_file.then(|| "previous attachment".to_string()));
    let error = create_rw_signal(None::<ValidationError>);
    let busy = InFlight::new();
    let guard = MountGuard::new();
    let shop_name = review.shop_name.clone();
    let review = store_value(review);

    let on_file = move |ev: web_sys::Event| {
        let input: HtmlInputElement = event_target(&ev);
        let Some(file) = input.files().and_then(|files| files.get(0)) else { return };
        if file.size() as usize > MAX_CHAT_HISTORY_BYTES {
            error.set(Some(ValidationError::ChatHistoryTooLarge {
                max_mb: MAX_CHAT_HISTORY_BYTES / (1024 * 1024),
            }));
            input.set_value("");
            return;
        }
        error.set(None);
        attached_file.set(Some(file.name()));
        read_as_data_url(file, move |data| chat_history.set(data));
    };

    let save = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if !busy.begin() {
            return;
        }
        error.set(None);
        let order = order_number.get_untracked();
        let current_photos = photos.get_untracked();
        let chat = chat_history.get_untracked();
        let session = session.clone();
        let guard = guard.clone();
        spawn_local(async move {
            let target = review.get_value();
            let result = upload_proof(&session.client(), &target, &order, &current_photos, Some(chat.as_str())).await;
            guard.run("proof upload", || {
                busy.finish();
                match result {
                    Ok(updated) => {
                        notifications.success("Proof uploaded. A moderator will check your review.");
                        on_saved.call(updated);
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
                <h2>{format!("Proof for your review of {shop_name}")}</h2>
                <label>
                    "Order number"
                    <input
                        type="text"
                        prop:value=move || order_number.get()
                        on:input=move |ev| order_number.set(event_target_value(&ev))
                    />
                </label>
                <ImageUpload photos=photos/>
                <label>
                    "Chat history with the shop (optional)"
                    <textarea
                        placeholder="Paste the conversation or attach a file below"
                        prop:value=move || if attached_file.with(Option::is_some) { String::new() } else { chat_history.get() }
                        disabled=move || attached_file.with(Option::is_some)
                        on:input=move |ev| chat_history.set(event_target_value(&ev))
                    ></textarea>
                </label>
                <input type="file" on:change=on_file/>
                {move || attached_file.get().map(|name| view! {
                    <p class="hint">
                        {format!("Attached: {name} ")}
                        <button type="button" on:click=move |_| {
                            attached_file.set(None);
                            chat_history.set(String::new());
                        }>"Remove"</button>
                    </p>
                })}
                <p class="field-error">{move || error.get().map(|e| e.to_string())}</p>
                <footer>
                    <button type="button" disabled=move || busy.is_busy() on:click=move |_| on_close.call(())>
                        "Cancel"
                    </button>
                    <button type="submit" disabled=move || busy.is_busy()>
                        {move || if busy.is_busy() { "Uploading..." } else { "Upload proof" }}
                    </button>
                </footer>
            </form>
        </div>
    }
}
