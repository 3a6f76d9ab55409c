//! reposift-http - Repository source backed by a remote listing service.

mod client;
pub mod endpoints;
mod source;

pub use client::ApiClient;
pub use source::HttpSource;
