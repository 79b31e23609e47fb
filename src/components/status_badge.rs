use crate::models::review::ReviewStatus;
use leptos::*;

#[component]
pub fn StatusBadge(#[prop(into)] status: MaybeSignal<ReviewStatus>) -> impl IntoView {
    view! {
        <span class=move || status.get().badge_class()>{move || status.get().label()}</span>
    }
}
