// Application layer - use cases and seams to external collaborators
pub mod dashboard_service;
pub mod data_source;
pub mod poller;
pub mod session;
pub mod snapshot_store;
pub mod transformer;
