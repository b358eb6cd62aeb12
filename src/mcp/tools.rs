//! MCP Tool definitions and handlers
//!
//! Defines all available tools and their implementations.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{FigmaApiError, FigmaMcpError, McpError, Result, ValidationError};
use crate::figma::client::FigmaApi;
use crate::figma::tree::{collect_component_sets, entries, page_hierarchies};
use crate::figma::types::*;
use crate::mcp::types::{CallToolResult, Tool};

/// Tool names
pub mod names {
    pub const GET_FILE_NODES: &str = "get_file_nodes";
    pub const GET_FILE_COMPONENTS: &str = "get_file_components";
    pub const GET_COMPONENT_SETS: &str = "get_component_sets";
    pub const GET_FILE_STYLES: &str = "get_file_styles";
    pub const EXPORT_COMPONENT: &str = "export_component";
    pub const GET_PAGE_HIERARCHY: &str = "get_page_hierarchy";
}

/// A validated tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    GetFileNodes {
        file_key: Option<String>,
        node_ids: Vec<String>,
    },
    GetFileComponents {
        file_key: Option<String>,
    },
    GetComponentSets {
        file_key: Option<String>,
    },
    GetFileStyles {
        file_key: Option<String>,
    },
    ExportComponent {
        file_key: Option<String>,
        node_ids: Vec<String>,
        format: String,
    },
    GetPageHierarchy {
        file_key: Option<String>,
        page_name: Option<String>,
    },
}

#[derive(Deserialize)]
struct FileArgs {
    file_key: Option<String>,
}

#[derive(Deserialize)]
struct FileNodesArgs {
    file_key: Option<String>,
    node_ids: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ExportArgs {
    file_key: Option<String>,
    node_ids: Vec<String>,
    format: String,
}

#[derive(Deserialize)]
struct PageHierarchyArgs {
    file_key: Option<String>,
    page_name: Option<String>,
}

fn decode<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| {
        FigmaMcpError::Mcp(McpError::InvalidArguments {
            message: e.to_string(),
        })
    })
}

impl ToolCall {
    /// Parse a tool name and its raw arguments.
    ///
    /// Absent (`null`) arguments are treated as an empty object.
    pub fn parse(name: &str, arguments: Value) -> Result<Self> {
        let arguments = match arguments {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        let call = match name {
            names::GET_FILE_NODES => {
                let args: FileNodesArgs = decode(arguments)?;
                Self::GetFileNodes {
                    file_key: args.file_key,
                    node_ids: args.node_ids.unwrap_or_default(),
                }
            }
            names::GET_FILE_COMPONENTS => Self::GetFileComponents {
                file_key: decode::<FileArgs>(arguments)?.file_key,
            },
            names::GET_COMPONENT_SETS => Self::GetComponentSets {
                file_key: decode::<FileArgs>(arguments)?.file_key,
            },
            names::GET_FILE_STYLES => Self::GetFileStyles {
                file_key: decode::<FileArgs>(arguments)?.file_key,
            },
            names::EXPORT_COMPONENT => {
                let args: ExportArgs = decode(arguments)?;
                Self::ExportComponent {
                    file_key: args.file_key,
                    node_ids: args.node_ids,
                    format: args.format,
                }
            }
            names::GET_PAGE_HIERARCHY => {
                let args: PageHierarchyArgs = decode(arguments)?;
                Self::GetPageHierarchy {
                    file_key: args.file_key,
                    page_name: args.page_name,
                }
            }
            _ => {
                return Err(FigmaMcpError::Mcp(McpError::UnknownTool {
                    name: name.to_string(),
                }))
            }
        };

        Ok(call)
    }
}

/// Tool handler
pub struct ToolHandler {
    figma: Arc<dyn FigmaApi>,
    default_file_key: Option<String>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(figma: Arc<dyn FigmaApi>, default_file_key: Option<String>) -> Self {
        Self {
            figma,
            default_file_key,
        }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            tool_def(names::GET_FILE_NODES, "Get specific nodes from a Figma file (components, frames, pages)", get_file_nodes_schema()),
            tool_def(names::GET_FILE_COMPONENTS, "Get all components from a Figma file (design system)", file_key_only_schema()),
            tool_def(names::GET_COMPONENT_SETS, "Get all component sets and variants", file_key_only_schema()),
            tool_def(names::GET_FILE_STYLES, "Get all design tokens (colors, typography, effects, grids)", file_key_only_schema()),
            tool_def(names::EXPORT_COMPONENT, "Export a component as SVG, PNG, or PDF", export_component_schema()),
            tool_def(names::GET_PAGE_HIERARCHY, "Get page structure and component hierarchy", get_page_hierarchy_schema()),
        ]
    }

    /// Call a tool by name.
    ///
    /// Never fails: any error becomes an error result.
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        tracing::info!(tool = name, "Calling tool");

        match self.dispatch(name, args).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                CallToolResult::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<CallToolResult> {
        match ToolCall::parse(name, args)? {
            ToolCall::GetFileNodes { file_key, node_ids } => {
                CallToolResult::json(&self.get_file_nodes(file_key.as_deref(), &node_ids).await?)
            }
            ToolCall::GetFileComponents { file_key } => {
                CallToolResult::json(&self.get_file_components(file_key.as_deref()).await?)
            }
            ToolCall::GetComponentSets { file_key } => {
                CallToolResult::json(&self.get_component_sets(file_key.as_deref()).await?)
            }
            ToolCall::GetFileStyles { file_key } => {
                CallToolResult::json(&self.get_file_styles(file_key.as_deref()).await?)
            }
            ToolCall::ExportComponent {
                file_key,
                node_ids,
                format,
            } => CallToolResult::json(
                &self
                    .export_component(file_key.as_deref(), node_ids, &format)
                    .await?,
            ),
            ToolCall::GetPageHierarchy {
                file_key,
                page_name,
            } => CallToolResult::json(
                &self
                    .get_page_hierarchy(file_key.as_deref(), page_name.as_deref())
                    .await?,
            ),
        }
    }

    /// Explicit file key if non-empty, else the configured default
    fn resolve_file_key(&self, file_key: Option<&str>) -> Result<String> {
        file_key
            .filter(|key| !key.is_empty())
            .or(self.default_file_key.as_deref())
            .map(str::to_string)
            .ok_or(FigmaMcpError::Validation(ValidationError::FileKeyRequired))
    }

    // ==================== Tool Handlers ====================

    pub async fn get_file_nodes(
        &self,
        file_key: Option<&str>,
        node_ids: &[String],
    ) -> Result<FileNodesResult> {
        let key = self.resolve_file_key(file_key)?;
        let response = self.figma.get_file_nodes(&key, node_ids).await?;

        Ok(FileNodesResult {
            file: response.name,
            nodes: response.nodes,
            version: response.version,
        })
    }

    pub async fn get_file_components(&self, file_key: Option<&str>) -> Result<FileComponentsResult> {
        let key = self.resolve_file_key(file_key)?;
        let response = self.figma.get_file_components(&key).await?;

        let components = response.components.unwrap_or(Value::Null);
        let total_components = entries(&components)
            .ok_or_else(|| missing_collection("components"))?
            .len();

        Ok(FileComponentsResult {
            file: response.name,
            total_components,
            components,
        })
    }

    pub async fn get_component_sets(&self, file_key: Option<&str>) -> Result<ComponentSetsResult> {
        let key = self.resolve_file_key(file_key)?;
        let response = self.figma.get_file(&key).await?;

        let component_sets = response
            .document
            .as_ref()
            .map(collect_component_sets)
            .unwrap_or_default();

        Ok(ComponentSetsResult {
            file: response.name,
            component_sets,
        })
    }

    pub async fn get_file_styles(&self, file_key: Option<&str>) -> Result<FileStylesResult> {
        let key = self.resolve_file_key(file_key)?;
        let response = self.figma.get_file_styles(&key).await?;

        let styles = response.styles.unwrap_or(Value::Null);
        let styles = entries(&styles).ok_or_else(|| missing_collection("styles"))?;

        Ok(FileStylesResult {
            file: response.name,
            styles_by_type: StylesByType::classify(styles.iter().copied()),
            total_styles: styles.len(),
        })
    }

    /// Export nodes; `format` is forwarded as given and validated remotely
    pub async fn export_component(
        &self,
        file_key: Option<&str>,
        node_ids: Vec<String>,
        format: &str,
    ) -> Result<ExportResult> {
        let key = self.resolve_file_key(file_key)?;
        let request = ExportRequest::new(node_ids, format);
        let response = self.figma.export_nodes(&key, &request).await?;

        Ok(ExportResult {
            exports: response.exports,
            render_time: response.render_time,
        })
    }

    pub async fn get_page_hierarchy(
        &self,
        file_key: Option<&str>,
        page_name: Option<&str>,
    ) -> Result<PageHierarchyResult> {
        let key = self.resolve_file_key(file_key)?;
        let response = self.figma.get_file(&key).await?;

        let pages = match &response.document {
            Some(document) => page_hierarchies(document, page_name)?,
            None => Vec::new(),
        };

        Ok(PageHierarchyResult {
            file: response.name,
            pages,
        })
    }
}

fn missing_collection(field: &str) -> FigmaMcpError {
    FigmaMcpError::Figma(FigmaApiError::UnexpectedResponse {
        message: format!("response has no `{}` collection", field),
    })
}

// ==================== Schema Definitions ====================

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

fn get_file_nodes_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "file_key": {
                "type": "string",
                "description": "Figma file key (can be omitted if FIGMA_FILE_KEY is set)"
            },
            "node_ids": {
                "type": "array",
                "items": {"type": "string"},
                "description": "List of node IDs to retrieve (leave empty for all)"
            }
        },
        "required": []
    })
}

fn file_key_only_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "file_key": {
                "type": "string",
                "description": "Figma file key (defaults to FIGMA_FILE_KEY)"
            }
        },
        "required": []
    })
}

fn export_component_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "file_key": {
                "type": "string",
                "description": "Figma file key"
            },
            "node_ids": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Node IDs to export"
            },
            "format": {
                "type": "string",
                "enum": ["svg", "png", "pdf"],
                "description": "Export format"
            }
        },
        "required": ["node_ids", "format"]
    })
}

fn get_page_hierarchy_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "file_key": {
                "type": "string",
                "description": "Figma file key"
            },
            "page_name": {
                "type": "string",
                "description": "Page name to retrieve (optional)"
            }
        },
        "required": []
    })
}
