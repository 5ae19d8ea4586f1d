//! Client code for quill.
//!
//! This crate provides the HTTP transport the engine reaches the network
//! through.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig};
