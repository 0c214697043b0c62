pub mod daily_dataset;
pub mod date_block;
pub mod date_key;
pub mod observation;
pub mod request_log;
pub mod station;
