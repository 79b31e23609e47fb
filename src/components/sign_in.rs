use crate::components::notification::use_notifications;
use crate::session::Session;
use crate::utils::in_flight::InFlight;
use crate::utils::mount_guard::MountGuard;
use leptos::*;
use leptos_router::use_navigate;

/// Accepts a bearer token issued by the account service.
#[component]
pub fn SignIn() -> impl IntoView {
    let session = expect_context::<Session>();
    let notifications = use_notifications();
    let token = create_rw_signal(String::new());
    let busy = InFlight::new();
    let guard = MountGuard::new();
    let navigate = use_navigate();

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let value = token.get_untracked();
        if value.trim().is_empty() || !busy.begin() {
            return;
        }
        session.sign_in(&value);
        let session = session.clone();
        let guard = guard.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            session.refresh_user().await;
            guard.run("sign in", || {
                busy.finish();
                match session.user().get_untracked() {
                    Some(user) => {
                        notifications.success(format!("Welcome, {}", user.full_name));
                        navigate("/account/reviews", Default::default());
                    }
                    None => notifications.error("That token was not accepted."),
                }
            });
        });
    };

    view! {
        <form class="sign-in" on:submit=submit>
            <h1>"Sign in"</h1>
            <label>
                "Access token"
                <input
                    type="password"
                    autocomplete="off"
                    prop:value=move || token.get()
                    on:input=move |ev| token.set(event_target_value(&ev))
                />
            </label>
            <button type="submit" disabled=move || busy.is_busy()>"Sign in"</button>
        </form>
    }
}
