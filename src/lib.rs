/// tabOptions - duplicate tab detector and tab manager for Chrome
/// Built with Rust + WASM + Yew

mod background;
mod badge;
mod chrome;
mod config;
mod coordinator;
mod detector;
mod domain;
mod export;
mod host;
mod manager;
mod messages;
mod operations;
mod storage;
mod tab_data;
mod tracker;
pub mod ui;

#[cfg(test)]
mod testing;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    // The backend passes everything; the `log` max level does the filtering
    // so that stored settings can change it later.
    wasm_logger::init(wasm_logger::Config::new(log::Level::Trace));
    log::set_max_level(config::Config::default().log_level);
}

// Register the service-worker listeners; called from background.js
#[wasm_bindgen]
pub fn start_background() {
    background::start();
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}
