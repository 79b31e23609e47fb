use crate::error::ApiError;
use crate::session::Session;
use gloo_timers::callback::Timeout;
use leptos::*;

const TOAST_MS: u32 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u32,
    pub kind: ToastKind,
    pub message: String,
}

/// Toast queue shared through context.
#[derive(Clone, Copy)]
pub struct Notifications {
    toasts: RwSignal<Vec<Toast>>,
    next_id: StoredValue<u32>,
}

impl Notifications {
    pub fn new() -> Self {
        Notifications { toasts: create_rw_signal(Vec::new()), next_id: store_value(0) }
    }

    fn push(&self, kind: ToastKind, message: String) -> u32 {
        let id = self.next_id.get_value();
        self.next_id.set_value(id.wrapping_add(1));
        self.toasts.update(|t| t.push(Toast { id, kind, message }));
        id
    }

    /// Shows a toast that hides itself after a few seconds.
    pub fn show(&self, kind: ToastKind, message: impl Into<String>) {
        let id = self.push(kind, message.into());
        let this = *self;
        Timeout::new(TOAST_MS, move || this.dismiss(id)).forget();
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(ToastKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(ToastKind::Error, message);
    }

    /// Toast for a failed request; also ends the session on 401.
    pub fn report(&self, session: &Session, err: &ApiError) {
        session.handle_error(err);
        self.error(err.user_message());
    }

    pub fn dismiss(&self, id: u32) {
        self.toasts.update(|t| t.retain(|toast| toast.id != id));
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}

pub fn use_notifications() -> Notifications {
    use_context::<Notifications>().unwrap_or_default()
}

#[component]
pub fn NotificationArea() -> impl IntoView {
    let notifications = use_notifications();
    view! {
        <div class="toasts">
            <For
                each=move || notifications.toasts.get()
                key=|toast| toast.id
                children=move |toast| {
                    let class = match toast.kind {
                        ToastKind::Success => "toast toast-success",
                        ToastKind::Error => "toast toast-error",
                    };
                    let id = toast.id;
                    view! {
                        <div class=class role="status" on:click=move |_| notifications.dismiss(id)>
                            {toast.message}
                        </div>
                    }
                }
            />
        </div>
    }
}
