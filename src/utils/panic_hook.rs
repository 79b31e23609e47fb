use leptos::logging::error;
use std::panic;

/// Adds context for panics caused by signals touched after a dialog or page unmounted.
pub fn set_custom_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        original_hook(panic_info);

        let message = if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else {
            "Unknown panic".to_string()
        };
        if message.contains("OwnerDisposed") || message.contains("disposed") {
            error!("[PANIC] A reactive value was used after its component unmounted");
            error!("[PANIC] Async results must go through MountGuard::run before touching signals");
        }
    }));
}

pub fn init() {
    set_custom_panic_hook();
    leptos::logging::log!("[PANIC_HOOK] Custom panic hook set up");
}
