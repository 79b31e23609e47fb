use crate::components::notification::use_notifications;
use crate::components::reviews_list::stars;
use crate::components::status_badge::StatusBadge;
use crate::error::ApiError;
use crate::models::review::{ModerationAction, Review};
use crate::review::actions::{load_queue, PendingModeration, QueueSnapshot};
use crate::review::lifecycle::StatusFilter;
use crate::review::proof::requires_proof;
use crate::session::Session;
use crate::utils::in_flight::InFlight;
use crate::utils::mount_guard::MountGuard;
use leptos::logging::log;
use leptos::*;

/// Read-only evidence for a low-rating review.
#[component]
fn ProofViewer(review: Review, #[prop(into)] on_close: Callback<()>) -> impl IntoView {
    view! {
        <div class="modal-backdrop">
            <div class="modal proof-viewer" role="dialog" aria-modal="true">
                <h2>{format!("Proof for {}'s review of {}", review.user_name, review.shop_name)}</h2>
                <dl>
                    <dt>"Order number"</dt>
                    <dd>{review.proof_order_number.clone().unwrap_or_else(|| "none".to_string())}</dd>
                    {review.proof_chat_history.clone().map(|chat| view! {
                        <dt>"Chat history"</dt>
                        <dd>
                            {if chat.starts_with("data:") {
                                view! { <a href=chat download="chat-history">"Download attachment"</a> }.into_view()
                            } else {
                                view! { <pre class="chat-history">{chat}</pre> }.into_view()
                            }}
                        </dd>
                    })}
                </dl>
                <div class="photo-previews">
                    {review
                        .proof_photos
                        .iter()
                        .enumerate()
                        .map(|(i, src)| view! { <img src=src.clone() alt=format!("Proof photo {}", i + 1)/> })
                        .collect_view()}
                </div>
                <footer>
                    <button type="button" on:click=move |_| on_close.call(())>"Close"</button>
                </footer>
            </div>
        </div>
    }
}

/// Asks for confirmation and optional notes before a moderation decision is sent.
#[component]
fn ModerationModal(
    decision: RwSignal<Option<PendingModeration>>,
    #[prop(into)] on_done: Callback<()>,
) -> impl IntoView {
    let session = expect_context::<Session>();
    let notifications = use_notifications();
    let busy = InFlight::new();
    let guard = MountGuard::new();

    let confirm = move |_| {
        let Some(pending) = decision.get_untracked() else { return };
        if !busy.begin() {
            return;
        }
        let session = session.clone();
        let guard = guard.clone();
        spawn_local(async move {
            let action = pending.action;
            let result = pending.confirm(&session.client()).await;
            guard.run("moderation modal", || {
                busy.finish();
                match result {
                    Ok(status) => {
                        notifications.success(format!("Review {} ({})", action.past_tense(), status.label()));
                        decision.set(None);
                        on_done.call(());
                    }
                    Err(err) => {
                        notifications.report(&session, &err);
                        if err.requires_refresh() {
                            decision.set(None);
                            on_done.call(());
                        }
                    }
                }
            });
        });
    };

    let title = move || {
        decision.with(|d| match d.as_ref().map(|d| d.action) {
            Some(ModerationAction::Approve) => "Approve review?",
            Some(ModerationAction::Reject) => "Reject review?",
            None => "",
        })
    };

    view! {
        <div class="modal-backdrop">
            <div class="modal" role="dialog" aria-modal="true">
                <h2>{title}</h2>
                <label>
                    "Notes for the record (optional)"
                    <textarea
                        prop:value=move || decision.with(|d| d.as_ref().map(|d| d.notes.clone()).unwrap_or_default())
                        on:input=move |ev| {
                            let text = event_target_value(&ev);
                            decision.update(|d| {
                                if let Some(d) = d {
                                    d.notes = text;
                                }
                            })
                        }
                    ></textarea>
                </label>
                <footer>
                    <button type="button" disabled=move || busy.is_busy() on:click=move |_| decision.set(None)>
                        "Cancel"
                    </button>
                    <button type="button" disabled=move || busy.is_busy() on:click=confirm>
                        "Confirm"
                    </button>
                </footer>
            </div>
        </div>
    }
}

#[component]
fn QueueRow(
    review: Review,
    decision: RwSignal<Option<PendingModeration>>,
    proof: RwSignal<Option<Review>>,
    deleting: RwSignal<Option<String>>,
) -> impl IntoView {
    // same band that demands proof on submission
    let show_proof = requires_proof(review.rating) && review.has_proof();
    let id = store_value(review.id.clone());
    let status = review.status;
    let for_proof = store_value(review.clone());
    let decide = move |action| decision.set(Some(PendingModeration::new(id.get_value(), action)));

    view! {
        <tr>
            <td>{review.shop_name.clone()}</td>
            <td>{review.user_name.clone()}</td>
            <td class="stars">{stars(review.rating.get())}</td>
            <td class="comment">{review.comment.clone()}</td>
            <td>{review.review_type.as_str()}</td>
            <td><StatusBadge status=status/></td>
            <td>{review.created_at.format("%Y-%m-%d").to_string()}</td>
            <td class="actions">
                {show_proof.then(|| view! {
                    <button on:click=move |_| proof.set(Some(for_proof.get_value()))>"View proof"</button>
                })}
                <button on:click=move |_| decide(ModerationAction::Approve)>"Approve"</button>
                <button on:click=move |_| decide(ModerationAction::Reject)>"Reject"</button>
                <button class="danger" on:click=move |_| deleting.set(Some(id.get_value()))>"Delete"</button>
            </td>
        </tr>
    }
}

/// `/admin/reviews`: moderation queue with status filter, search and pending count.
#[component]
pub fn AdminReviews() -> impl IntoView {
    let session = expect_context::<Session>();
    let notifications = use_notifications();
    let filter = create_rw_signal(StatusFilter::default());
    let search_input = create_rw_signal(String::new());
    let search = create_rw_signal(String::new());
    let page = create_rw_signal(1u32);
    let snapshot = create_rw_signal(QueueSnapshot::default());
    let loading = create_rw_signal(false);
    let reload = create_rw_signal(0u32);
    let decision = create_rw_signal(None::<PendingModeration>);
    let proof = create_rw_signal(None::<Review>);
    let deleting = create_rw_signal(None::<String>);
    let delete_busy = InFlight::new();
    let guard = MountGuard::new();

    create_effect({
        let session = session.clone();
        let guard = guard.clone();
        move |_| {
            let (filter, search, page) = (filter.get(), search.get(), page.get());
            let _ = reload.get();
            loading.set(true);
            let session = session.clone();
            let guard = guard.clone();
            spawn_local(async move {
                let result = load_queue(&session.client(), filter, &search, page).await;
                guard.run("admin queue", || {
                    loading.set(false);
                    match result {
                        Ok(data) => {
                            log!("[QUEUE] {} reviews shown, {} pending", data.reviews.len(), data.pending_total);
                            snapshot.set(data);
                        }
                        Err(err) => notifications.report(&session, &err),
                    }
                });
            });
        }
    });

    let refetch = move |_: ()| reload.update(|n| *n += 1);

    let confirm_delete = move |_| {
        let Some(id) = deleting.get_untracked() else { return };
        if !delete_busy.begin() {
            return;
        }
        let session = session.clone();
        let guard = guard.clone();
        spawn_local(async move {
            let result = session.client().admin_delete_review(&id).await;
            guard.run("admin delete", || {
                delete_busy.finish();
                deleting.set(None);
                match result {
                    Ok(()) | Err(ApiError::NotFound) => notifications.success("Review deleted."),
                    Err(err) => notifications.report(&session, &err),
                }
                refetch(());
            });
        });
    };

    view! {
        <section class="admin-reviews">
            <h1>
                "Review moderation "
                <span class="badge badge-pending">{move || format!("{} pending", snapshot.with(|s| s.pending_total))}</span>
            </h1>
            <div class="queue-controls">
                <select on:change=move |ev| {
                    filter.set(StatusFilter::from_key(&event_target_value(&ev)));
                    page.set(1);
                }>
                    {StatusFilter::OPTIONS
                        .iter()
                        .map(|f| {
                            let f = *f;
                            view! {
                                <option value=f.key() selected=move || filter.get() == f>{f.label()}</option>
                            }
                        })
                        .collect_view()}
                </select>
                <form on:submit=move |ev: ev::SubmitEvent| {
                    ev.prevent_default();
                    search.set(search_input.get_untracked());
                    page.set(1);
                }>
                    <input
                        type="search"
                        placeholder="Search comment, shop or customer"
                        prop:value=move || search_input.get()
                        on:input=move |ev| search_input.set(event_target_value(&ev))
                    />
                    <button type="submit">"Search"</button>
                </form>
            </div>
            <Show when=move || loading.get()>
                <p class="hint">"Loading..."</p>
            </Show>
            <table class="queue">
                <thead>
                    <tr>
                        <th>"Shop"</th><th>"Customer"</th><th>"Rating"</th><th>"Comment"</th>
                        <th>"Type"</th><th>"Status"</th><th>"Date"</th><th></th>
                    </tr>
                </thead>
                <tbody>
                    <For
                        each=move || snapshot.get().reviews
                        key=|review| (review.id.clone(), review.status, review.updated_at)
                        children=move |review| view! {
                            <QueueRow review=review decision=decision proof=proof deleting=deleting/>
                        }
                    />
                </tbody>
            </table>
            <Show when=move || !loading.get() && snapshot.with(|s| s.reviews.is_empty())>
                <p class="hint">"No reviews match this filter."</p>
            </Show>
            <nav class="pagination">
                <button disabled=move || page.get() <= 1 on:click=move |_| page.update(|p| *p -= 1)>"Previous"</button>
                <span>
                    {move || snapshot.with(|s| format!("Page {} of {} ({} reviews)", page.get(), s.pages.max(1), s.total))}
                </span>
                <button
                    disabled=move || snapshot.with(|s| page.get() >= s.pages)
                    on:click=move |_| page.update(|p| *p += 1)
                >
                    "Next"
                </button>
            </nav>
            <Show when=move || decision.with(Option::is_some)>
                <ModerationModal decision=decision on_done=refetch/>
            </Show>
            {move || proof.get().map(|review| view! { <ProofViewer review=review on_close=move |_| proof.set(None)/> })}
            <Show when=move || deleting.with(Option::is_some)>
                <div class="modal-backdrop">
                    <div class="modal" role="alertdialog" aria-modal="true">
                        <h2>"Delete this review permanently?"</h2>
                        <footer>
                            <button type="button" disabled=move || delete_busy.is_busy() on:click=move |_| deleting.set(None)>
                                "Cancel"
                            </button>
                            <button type="button" class="danger" disabled=move || delete_busy.is_busy() on:click=confirm_delete.clone()>
                                "Delete"
                            </button>
                        </footer>
                    </div>
                </div>
            </Show>
        </section>
    }
}
