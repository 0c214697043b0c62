pub mod daily_source;
pub mod error;
pub mod msc_client;
pub(crate) mod payload;
