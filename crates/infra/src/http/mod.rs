//! HTTP client support.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
