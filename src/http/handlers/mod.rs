pub mod analyze;
pub mod common;
pub mod data;
pub mod proxy_api;
pub mod sample;
