//! Figma MCP Server Library
//!
//! A Model Context Protocol (MCP) server for Figma integration.
//! Provides tools for inspecting file nodes, components, styles and page
//! structure, and for exporting renders via the Figma REST API.

pub mod config;
pub mod error;
pub mod figma;
pub mod mcp;

pub use config::Config;
pub use error::{FigmaMcpError, Result};
