//! Transport implementations for the Edgee SDK.
//!
//! All transports implement the `edgee_core::Transport` trait. The HTTP
//! transport talks to the Edgee gateway or any OpenAI-compatible endpoint.

pub mod http;

pub use http::HttpTransport;
