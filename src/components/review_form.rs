use crate::components::image_upload::ImageUpload;
use crate::components::notification::use_notifications;
use crate::error::{ApiError, ReviewField, ValidationError};
use crate::models::review::{Rating, Review};
use crate::review::actions::submit_review;
use crate::review::draft::ReviewDraft;
use crate::review::proof::{COMMENT_MAX_LEN, COMMENT_MIN_LEN};
use crate::session::Session;
use crate::utils::in_flight::InFlight;
use crate::utils::mount_guard::MountGuard;
use leptos::*;

fn field_error(error: RwSignal<Option<ValidationError>>, field: ReviewField) -> impl Fn() -> Option<String> + Copy + 'static {
    move || error.with(|e| e.as_ref().filter(|e| e.field() == field).map(ToString::to_string))
}

/// Rating, comment and proof inputs, shared by the submission form and the edit dialog.
/// The proof section appears only while the selected rating is in the low band.
#[component]
pub fn DraftFields(
    draft: RwSignal<ReviewDraft>,
    photos: RwSignal<Vec<String>>,
    error: RwSignal<Option<ValidationError>>,
) -> impl IntoView {
    let rating_error = field_error(error, ReviewField::Rating);
    let comment_error = field_error(error, ReviewField::Comment);
    let order_error = field_error(error, ReviewField::OrderNumber);
    let photos_error = field_error(error, ReviewField::Photos);

    view! {
        <div class="rating-input" role="radiogroup" aria-label="Rating">
            {(Rating::MIN..=Rating::MAX)
                .map(|star| {
                    view! {
                        <button
                            type="button"
                            class=move || if draft.with(|d| d.rating >= star) { "star active" } else { "star" }
                            aria-label=format!("{star} stars")
                            on:click=move |_| draft.update(|d| d.rating = star)
                        >
                            "★"
                        </button>
                    }
                })
                .collect_view()}
        </div>
        <p class="field-error">{rating_error}</p>

        <label>
            "Your experience"
            <textarea
                maxlength=COMMENT_MAX_LEN
                placeholder=format!("At least {COMMENT_MIN_LEN} characters")
                prop:value=move || draft.with(|d| d.comment.clone())
                on:input=move |ev| draft.update(|d| d.comment = event_target_value(&ev))
            ></textarea>
        </label>
        <p class="hint">{move || format!("{}/{}", draft.with(|d| d.comment.chars().count()), COMMENT_MAX_LEN)}</p>
        <p class="field-error">{comment_error}</p>

        <Show when=move || draft.with(ReviewDraft::needs_proof)>
            <fieldset class="proof">
                <legend>"Proof of purchase"</legend>
                <p class="hint">
                    "Ratings of three stars or fewer need an order number and at least one photo."
                </p>
                <label>
                    "Order number"
                    <input
                        type="text"
                        prop:value=move || draft.with(|d| d.proof_order_number.clone())
                        on:input=move |ev| draft.update(|d| d.proof_order_number = event_target_value(&ev))
                    />
                </label>
                <p class="field-error">{order_error}</p>
                <ImageUpload photos=photos/>
                <p class="field-error">{photos_error}</p>
            </fieldset>
        </Show>
    }
}

#[component]
pub fn ReviewForm(shop_id: String, #[prop(into)] on_created: Callback<Review>) -> impl IntoView {
    let session = expect_context::<Session>();
    let notifications = use_notifications();
    let draft = create_rw_signal(ReviewDraft::default());
    let photos = create_rw_signal(Vec::<String>::new());
    let error = create_rw_signal(None::<ValidationError>);
    let busy = InFlight::new();
    let guard = MountGuard::new();
    let shop_id = store_value(shop_id);
    let user = session.user();

    let submit = {
        let session = session.clone();
        move |ev: ev::SubmitEvent| {
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
                let client = session.client();
                let result = submit_review(&client, &shop_id.get_value(), &current).await;
                guard.run("review form", || {
                    busy.finish();
                    match result {
                        Ok(outcome) => {
                            notifications.success(outcome.message);
                            draft.update(ReviewDraft::reset);
                            photos.set(Vec::new());
                            on_created.call(outcome.review);
                        }
                        Err(ApiError::Validation(err)) => error.set(Some(err)),
                        Err(err) => notifications.report(&session, &err),
                    }
                });
            });
        }
    };

    view! {
        <Show
            when=move || user.with(Option::is_some)
            fallback=|| view! { <p class="hint"><a href="/signin">"Sign in"</a>" to write a review."</p> }
        >
            <form class="review-form" on:submit=submit.clone()>
                <h3>"Write a review"</h3>
                <DraftFields draft=draft photos=photos error=error/>
                <button type="submit" disabled=move || busy.is_busy()>
                    {move || if busy.is_busy() { "Submitting..." } else { "Submit review" }}
                </button>
            </form>
        </Show>
    }
}
