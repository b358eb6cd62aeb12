//! Configuration management for the Figma MCP Server
//!
//! Handles environment variables and configuration loading.

use crate::error::{ConfigError, FigmaMcpError, Result};

/// Configuration for the Figma MCP Server
#[derive(Debug, Clone)]
pub struct Config {
    /// Personal access token sent with every API request
    pub api_key: String,

    /// File key used when a tool call omits `file_key`
    pub default_file_key: Option<String>,

    /// Base URL of the Figma REST API
    pub api_base_url: String,
}

impl Config {
    /// Create a configuration with an explicit API key and default base URL
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            default_file_key: None,
            api_base_url: figma::API_BASE_URL.to_string(),
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = read(env::API_KEY).ok_or_else(|| {
            FigmaMcpError::Config(ConfigError::MissingEnvVar {
                var: env::API_KEY.to_string(),
            })
        })?;

        let mut config = Self::new(api_key);
        config.default_file_key = read(env::FILE_KEY);
        if let Some(base_url) = read(env::API_BASE_URL) {
            config.api_base_url = base_url;
        }

        Ok(config)
    }

    /// Override the default file key
    pub fn with_default_file_key(mut self, file_key: impl Into<String>) -> Self {
        let file_key = file_key.into();
        self.default_file_key = (!file_key.is_empty()).then_some(file_key);
        self
    }

    /// Override the API base URL
    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }
}

/// Environment variable names
pub mod env {
    pub const API_KEY: &str = "FIGMA_API_KEY";
    pub const FILE_KEY: &str = "FIGMA_FILE_KEY";
    pub const API_BASE_URL: &str = "FIGMA_API_BASE_URL";
}

/// Figma API constants
pub mod figma {
    /// Base URL for Figma API
    pub const API_BASE_URL: &str = "https://api.figma.com/v1";

    /// Header carrying the personal access token
    pub const TOKEN_HEADER: &str = "x-figma-token";
}
