use leptos::on_cleanup;
use std::cell::Cell;
use std::rc::Rc;

/// Tracks whether the component that created it is still mounted, so responses
/// that arrive after unmount are dropped instead of writing to disposed signals.
#[derive(Clone)]
pub struct MountGuard(Rc<Cell<bool>>);

impl MountGuard {
    /// Must be created inside a component; flips to unmounted on cleanup.
    pub fn new() -> Self {
        let mounted = Rc::new(Cell::new(true));
        let flag = Rc::clone(&mounted);
        on_cleanup(move || flag.set(false));
        MountGuard(mounted)
    }

    pub fn is_mounted(&self) -> bool {
        self.0.get()
    }

    /// Runs `f` only while mounted.
    pub fn run<R>(&self, context: &str, f: impl FnOnce() -> R) -> Option<R> {
        if self.is_mounted() {
            Some(f())
        } else {
            leptos::logging::log!("[OWNER] Dropping result after unmount: {}", context);
            None
        }
    }
}

impl Default for MountGuard {
    fn default() -> Self {
        Self::new()
    }
}
