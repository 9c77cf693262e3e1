pub mod config_store;
pub mod controller_builder;
pub mod http_backend;
pub mod recorder_source;
