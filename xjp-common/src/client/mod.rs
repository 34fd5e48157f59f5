//! Data service client (feature `client`)
//!
//! [`DataClient`] talks to `xjp-ds` over HTTP; [`SaveDebouncer`] coalesces
//! bursts of local edits into one document save.

mod debounce;
mod http;

pub use debounce::{DocumentSink, SaveDebouncer, DEFAULT_QUIET_PERIOD};
pub use http::{load_store, DataClient, UploadResponse};
