//! Figma API module
//!
//! Contains types, the HTTP client and document tree walks for the Figma API.

pub mod client;
pub mod tree;
pub mod types;
