//! Signed-in user and bearer token, provided to components through Leptos context.
use crate::client::{backend_url, ApiClient};
use crate::error::ApiError;
use crate::models::user::User;
use leptos::logging::{log, warn};
use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;

pub const TOKEN_KEY: &str = "trustshop.token";

/// Where the bearer token survives page reloads.
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// `window.localStorage`, silently unavailable outside the browser.
pub struct BrowserTokenStore;

impl BrowserTokenStore {
    fn storage() -> Option<web_sys::Storage> {
        if cfg!(target_arch = "wasm32") {
            gloo_utils::window().local_storage().ok().flatten()
        } else {
            None
        }
    }
}

impl TokenStore for BrowserTokenStore {
    fn load(&self) -> Option<String> {
        Self::storage()?.get_item(TOKEN_KEY).ok().flatten()
    }

    fn save(&self, token: &str) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(TOKEN_KEY, token).is_err() {
                warn!("[SESSION] Could not persist token");
            }
        }
    }

    fn clear(&self) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(TOKEN_KEY);
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore(RefCell<Option<String>>);

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.0.borrow().clone()
    }

    fn save(&self, token: &str) {
        *self.0.borrow_mut() = Some(token.to_string());
    }

    fn clear(&self) {
        *self.0.borrow_mut() = None;
    }
}

#[derive(Clone)]
pub struct Session {
    token: RwSignal<Option<String>>,
    user: RwSignal<Option<User>>,
    loading: RwSignal<bool>,
    store: Rc<dyn TokenStore>,
}

impl Session {
    pub fn new(store: Rc<dyn TokenStore>) -> Self {
        Session {
            token: create_rw_signal(None),
            user: create_rw_signal(None),
            loading: create_rw_signal(false),
            store,
        }
    }

    /// Loads the persisted token. The user itself is fetched by [`Session::refresh_user`].
    pub fn init(&self) {
        let token = self.store.load();
        self.loading.set(token.is_some());
        self.token.set(token);
    }

    pub fn sign_in(&self, token: &str) {
        let token = token.trim();
        self.store.save(token);
        self.token.set(Some(token.to_string()));
        self.user.set(None);
        self.loading.set(true);
    }

    /// Clears memory and storage; used on sign-out and when the server answers 401.
    pub fn teardown(&self) {
        log!("[SESSION] Clearing session");
        self.store.clear();
        self.token.set(None);
        self.user.set(None);
        self.loading.set(false);
    }

    pub async fn refresh_user(&self) {
        if self.token.get_untracked().is_none() {
            self.loading.set(false);
            return;
        }
        match self.client().me().await {
            Ok(user) => {
                log!("[SESSION] Signed in as {}", user.email);
                self.user.set(Some(user));
            }
            Err(err) => {
                warn!("[SESSION] Could not load current user: {}", err);
                if err.ends_session() {
                    self.teardown();
                }
            }
        }
        self.loading.set(false);
    }

    /// Tears the session down if `err` means the token is no longer valid.
    pub fn handle_error(&self, err: &ApiError) {
        if err.ends_session() {
            self.teardown();
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(backend_url(), self.token.get_untracked())
    }

    pub fn token(&self) -> Signal<Option<String>> {
        self.token.into()
    }

    pub fn user(&self) -> Signal<Option<User>> {
        self.user.into()
    }

    pub fn is_loading(&self) -> Signal<bool> {
        self.loading.into()
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.user.with_untracked(|u| u.as_ref().map(|u| u.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_and_teardown_follow_the_store() {
        let runtime = create_runtime();
        let store = Rc::new(MemoryTokenStore::default());
        store.save("abc");

        let session = Session::new(store.clone());
        assert_eq!(session.token().get_untracked(), None);
        session.init();
        assert_eq!(session.token().get_untracked().as_deref(), Some("abc"));
        assert!(session.is_loading().get_untracked());

        session.teardown();
        assert_eq!(session.token().get_untracked(), None);
        assert_eq!(store.load(), None);
        runtime.dispose();
    }

    #[test]
    fn sign_in_persists_trimmed_token() {
        let runtime = create_runtime();
        let store = Rc::new(MemoryTokenStore::default());
        let session = Session::new(store.clone());
        session.sign_in("  tok-1 \n");
        assert_eq!(store.load().as_deref(), Some("tok-1"));
        assert_eq!(session.current_user_id(), None);

        session.handle_error(&ApiError::Forbidden);
        assert!(session.token().get_untracked().is_some());
        session.handle_error(&ApiError::Unauthorized);
        assert!(session.token().get_untracked().is_none());
        runtime.dispose();
    }
}
