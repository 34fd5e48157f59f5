//! # XJP Common Library
//!
//! Shared code for the XJP56 fan site:
//! - Site document model (members, singles, posts)
//! - A-side lineup slots and the selection derivation engine
//! - Legacy history key migration and cumulative appearance counts
//! - Owned document store
//! - Media URL and election rank helpers
//! - Configuration loading
//! - Data service client and debounced saver (feature `client`)

pub mod appearances;
#[cfg(feature = "client")]
pub mod client;
pub mod config;
pub mod election;
pub mod error;
pub mod ids;
pub mod lineup;
pub mod media;
pub mod migration;
pub mod model;
pub mod selection;
pub mod store;
pub mod time;

pub use error::{Error, Result};
pub use model::Document;
pub use store::Store;
