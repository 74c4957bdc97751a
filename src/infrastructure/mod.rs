// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod data_api_source;
pub mod historical_source;
pub mod realm_identity;
pub mod scrape_source;
