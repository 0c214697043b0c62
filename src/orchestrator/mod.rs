pub mod error;
pub mod fetch_orchestrator;
pub mod request_range;
