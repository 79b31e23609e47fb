use leptos::*;

/// Busy flag for a single control. `begin` refuses a second concurrent start.
#[derive(Clone, Copy)]
pub struct InFlight(RwSignal<bool>);

impl InFlight {
    pub fn new() -> Self {
        InFlight(create_rw_signal(false))
    }

    pub fn begin(&self) -> bool {
        if self.0.get_untracked() {
            return false;
        }
        self.0.set(true);
        true
    }

    pub fn finish(&self) {
        self.0.set(false);
    }

    /// Reactive; use for `disabled=`.
    pub fn is_busy(&self) -> bool {
        self.0.get()
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}
