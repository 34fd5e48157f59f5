//! HTTP API handlers for xjp-ds

pub mod data;
pub mod health;
pub mod upload;

pub use data::{get_data, post_data};
pub use health::health_routes;
pub use upload::{upload_audio, upload_image};
