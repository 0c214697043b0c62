pub mod error;
pub mod migrate;
pub mod observation_store;
mod schema;
