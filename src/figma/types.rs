//! Figma API type definitions
//!
//! Remote payloads are kept loosely typed (`serde_json::Value`) so fields the
//! server does not reshape pass through untouched. The derived shapes returned
//! by the tools are strongly typed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ==================== Remote Payloads ====================

/// Keep an explicit `null` as `Some(Value::Null)`; only absent fields are `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Response of `GET /files/{key}/nodes`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileNodesResponse {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub nodes: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub version: Option<Value>,
}

/// Response of `GET /files/{key}/components`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileComponentsResponse {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,

    /// Component metadata keyed by node id
    #[serde(default, deserialize_with = "present")]
    pub components: Option<Value>,
}

/// Response of `GET /files/{key}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileResponse {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,

    /// Root `DOCUMENT` node; its children are the pages
    #[serde(default, deserialize_with = "present")]
    pub document: Option<Value>,
}

/// Response of `GET /files/{key}/styles`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileStylesResponse {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub styles: Option<Value>,
}

/// Body of `POST /files/{key}/export`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub ids: Vec<String>,
    pub format: String,
    pub use_absolute_bounds: bool,
}

impl ExportRequest {
    /// Export request for the given nodes; bounds are always absolute
    pub fn new(ids: Vec<String>, format: impl Into<String>) -> Self {
        Self {
            ids,
            format: format.into(),
            use_absolute_bounds: true,
        }
    }
}

/// Response of `POST /files/{key}/export`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportResponse {
    #[serde(default, deserialize_with = "present")]
    pub exports: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub render_time: Option<Value>,
}

// ==================== Derived Shapes ====================

/// A node that belongs to a component set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSetRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    pub component_set_id: Value,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<Value>,
}

/// Mirror of a document node annotated with its depth below the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<Value>,

    pub depth: usize,

    /// Absent when the source node had no children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<HierarchyNode>>,
}

/// A page and the hierarchy of its direct children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageHierarchy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<Value>,

    pub hierarchy: Vec<HierarchyNode>,
}

/// Style categories recognised by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleType {
    Fill,
    Text,
    Effect,
    Grid,
}

impl StyleType {
    /// Parse a Figma `styleType` tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "FILL" => Some(Self::Fill),
            "TEXT" => Some(Self::Text),
            "EFFECT" => Some(Self::Effect),
            "GRID" => Some(Self::Grid),
            _ => None,
        }
    }
}

/// Styles partitioned by their `styleType`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StylesByType {
    pub colors: Vec<Value>,
    pub typography: Vec<Value>,
    pub effects: Vec<Value>,
    pub grids: Vec<Value>,
}

impl StylesByType {
    /// Partition styles by type, preserving input order.
    ///
    /// Styles without a recognised `styleType` are dropped.
    pub fn classify<'a, I>(styles: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut by_type = Self::default();

        for style in styles {
            let tag = style.get("styleType").and_then(Value::as_str);
            let bucket = match tag.and_then(StyleType::from_tag) {
                Some(StyleType::Fill) => &mut by_type.colors,
                Some(StyleType::Text) => &mut by_type.typography,
                Some(StyleType::Effect) => &mut by_type.effects,
                Some(StyleType::Grid) => &mut by_type.grids,
                None => continue,
            };
            bucket.push(style.clone());
        }

        by_type
    }
}

// ==================== Tool Results ====================

/// Result of `get_file_nodes`
#[derive(Debug, Clone, Serialize)]
pub struct FileNodesResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
}

/// Result of `get_file_components`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileComponentsResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Value>,

    pub total_components: usize,

    pub components: Value,
}

/// Result of `get_component_sets`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSetsResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Value>,

    pub component_sets: Vec<ComponentSetRef>,
}

/// Result of `get_file_styles`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStylesResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Value>,

    pub styles_by_type: StylesByType,

    pub total_styles: usize,
}

/// Result of `export_component`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exports: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_time: Option<Value>,
}

/// Result of `get_page_hierarchy`
#[derive(Debug, Clone, Serialize)]
pub struct PageHierarchyResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Value>,

    pub pages: Vec<PageHierarchy>,
}
