// Domain layer - zone telemetry, chart store and chart presentation
pub mod chart;
pub mod dashboard;
pub mod telemetry;
