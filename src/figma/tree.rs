//! Walks over the Figma document tree
//!
//! The document comes straight from the remote API, so neither walk trusts
//! its shape: missing or non-array `children` count as a leaf, and the
//! recursive hierarchy builder is bounded by [`MAX_TREE_DEPTH`].

use serde_json::Value;

use crate::error::{FigmaApiError, FigmaMcpError, Result};
use crate::figma::types::{ComponentSetRef, HierarchyNode, PageHierarchy};

/// Deepest node level the hierarchy builder will descend to
pub const MAX_TREE_DEPTH: usize = 256;

fn children(node: &Value) -> Option<&Vec<Value>> {
    node.get("children").and_then(Value::as_array)
}

fn field(node: &Value, key: &str) -> Option<Value> {
    node.get(key).cloned()
}

/// Whether an attribute is present with a meaningful value
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Collect every node carrying a `componentSetId`, in document pre-order.
pub fn collect_component_sets(document: &Value) -> Vec<ComponentSetRef> {
    let mut found = Vec::new();
    let mut stack = vec![document];

    while let Some(node) = stack.pop() {
        if let Some(set_id) = node.get("componentSetId").filter(|v| is_set(v)) {
            found.push(ComponentSetRef {
                id: field(node, "id"),
                name: field(node, "name"),
                component_set_id: set_id.clone(),
                node_type: field(node, "type"),
            });
        }

        if let Some(kids) = children(node) {
            stack.extend(kids.iter().rev());
        }
    }

    found
}

/// Mirror `node` and its descendants, starting at `depth`.
pub fn build_hierarchy(node: &Value, depth: usize) -> Result<HierarchyNode> {
    if depth >= MAX_TREE_DEPTH {
        return Err(FigmaMcpError::Figma(FigmaApiError::TreeTooDeep {
            limit: MAX_TREE_DEPTH,
        }));
    }

    let children = match children(node) {
        Some(kids) => Some(
            kids.iter()
                .map(|child| build_hierarchy(child, depth + 1))
                .collect::<Result<Vec<_>>>()?,
        ),
        None => None,
    };

    Ok(HierarchyNode {
        id: field(node, "id"),
        name: field(node, "name"),
        node_type: field(node, "type"),
        depth,
        children,
    })
}

/// Build the hierarchy of every page under `document`.
///
/// With a `page_name` filter, only pages whose name contains it
/// (case-insensitive) are kept.
pub fn page_hierarchies(document: &Value, page_name: Option<&str>) -> Result<Vec<PageHierarchy>> {
    let Some(pages) = children(document) else {
        return Ok(Vec::new());
    };
    let filter = page_name
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase);

    pages
        .iter()
        .filter(|page| match &filter {
            Some(filter) => page
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase().contains(filter.as_str())),
            None => true,
        })
        .map(|page| -> Result<PageHierarchy> {
            let hierarchy = children(page)
                .map(|kids| {
                    kids.iter()
                        .map(|child| build_hierarchy(child, 0))
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default();

            Ok(PageHierarchy {
                id: field(page, "id"),
                name: field(page, "name"),
                node_type: field(page, "type"),
                hierarchy,
            })
        })
        .collect()
}

/// Entries of a remote collection: map values in order, or array elements.
pub fn entries(collection: &Value) -> Option<Vec<&Value>> {
    match collection {
        Value::Object(map) => Some(map.values().collect()),
        Value::Array(items) => Some(items.iter().collect()),
        _ => None,
    }
}
