pub mod app;
pub mod client;
pub mod components;
pub mod config;
pub mod error;
pub mod models;
pub mod review;
pub mod session;
pub mod utils;

#[cfg(feature = "ssr")]
pub mod api;
#[cfg(feature = "ssr")]
pub mod db;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::App;

    console_error_panic_hook::set_once();
    utils::panic_hook::init();
    leptos::mount_to_body(App);
}
