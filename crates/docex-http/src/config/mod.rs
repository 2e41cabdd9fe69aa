pub mod http_config;

pub use http_config::{HttpConfig, HttpDefaults};
