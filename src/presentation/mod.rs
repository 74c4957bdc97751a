// Presentation layer - HTTP surface consumed by the browser
pub mod app_state;
pub mod handlers;
