use crate::session::Session;
use leptos::*;
use leptos_router::A;

/// Renders `children` only for a signed-in user (and only for admins when `admin_only`).
#[component]
pub fn RequireAuth(#[prop(optional)] admin_only: bool, children: ChildrenFn) -> impl IntoView {
    let session = expect_context::<Session>();
    let user = session.user();
    let loading = session.is_loading();
    let children = store_value(children);

    view! {
        <Show when=move || !loading.get() fallback=|| view! { <p class="hint">"Loading..."</p> }>
            {move || match user.get() {
                None => view! {
                    <p class="hint">"Please " <A href="/signin">"sign in"</A> " to continue."</p>
                }
                .into_view(),
                Some(u) if admin_only && !u.is_admin() => view! {
                    <p class="hint">"You are not authorized to view this page."</p>
                }
                .into_view(),
                Some(_) => children.with_value(|c| c()).into_view(),
            }}
        </Show>
    }
}
