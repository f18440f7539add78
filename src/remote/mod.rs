// src/remote/mod.rs

//! Remote artifact store access
//!
//! - [`Fetcher`]: the byte-level seam (HTTP in production, in-memory in tests)
//! - [`HttpFetcher`]: reqwest client with timeout and retry budget
//! - [`RemoteLayout`]: listing, package and feed URLs

mod client;
mod layout;

pub use client::{FetchOptions, Fetcher, HttpFetcher};
pub use layout::RemoteLayout;
