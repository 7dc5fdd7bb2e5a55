/// Management page UI
pub mod components;
pub mod popup;
