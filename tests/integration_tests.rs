//! Integration tests for Figma MCP Server
//!
//! These tests run the real HTTP client against a fake Figma API served by
//! axum on a loopback port - they don't make real API calls.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use figma_mcp_server_rust::config::Config;
use figma_mcp_server_rust::figma::client::{decode_body, FigmaClient};
use figma_mcp_server_rust::mcp::server::McpServer;
use figma_mcp_server_rust::mcp::tools::ToolHandler;
use figma_mcp_server_rust::mcp::types::CallToolResult;

const TOKEN: &str = "figd_test_token";

/// Frame nesting served for the `deep` file key
const DEEP_LEVELS: usize = 200;

/// A request as seen by the fake API
#[derive(Debug, Clone)]
struct Recorded {
    method: &'static str,
    path: String,
    query: Option<String>,
    token: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct FakeFigma {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeFigma {
    fn record(
        &self,
        method: &'static str,
        path: String,
        query: Option<String>,
        headers: &HeaderMap,
        body: Option<Value>,
    ) {
        let token = headers
            .get("x-figma-token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(Recorded {
            method,
            path,
            query,
            token,
            body,
        });
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

/// A file whose only page holds a single chain of `levels` nested frames
fn deep_file(levels: usize) -> Value {
    let mut node = json!({"id": "leaf", "name": "Leaf", "type": "INSTANCE", "componentSetId": "9:9"});
    for i in (0..levels).rev() {
        node = json!({"id": format!("f{}", i), "name": "Frame", "type": "FRAME", "children": [node]});
    }
    json!({
        "name": "Deep",
        "document": {
            "id": "0:0",
            "type": "DOCUMENT",
            "children": [{"id": "0:1", "name": "Home", "type": "CANVAS", "children": [node]}]
        }
    })
}

fn failure(key: &str) -> Option<Response> {
    (key == "broken").then(|| (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response())
}

async fn file(State(fake): State<FakeFigma>, Path(key): Path<String>, headers: HeaderMap) -> Response {
    fake.record("GET", format!("/files/{}", key), None, &headers, None);
    if let Some(response) = failure(&key) {
        return response;
    }
    if key == "deep" {
        return Json(deep_file(DEEP_LEVELS)).into_response();
    }
    Json(json!({
        "name": "Design System",
        "document": {
            "id": "0:0",
            "name": "Document",
            "type": "DOCUMENT",
            "children": [
                {
                    "id": "0:1",
                    "name": "Home",
                    "type": "CANVAS",
                    "children": [
                        {
                            "id": "1:1",
                            "name": "Hero",
                            "type": "FRAME",
                            "children": [
                                {"id": "1:2", "name": "Button", "type": "INSTANCE", "componentSetId": "5:0"}
                            ]
                        }
                    ]
                },
                {"id": "0:2", "name": "Components", "type": "CANVAS"}
            ]
        }
    }))
    .into_response()
}

async fn nodes(
    State(fake): State<FakeFigma>,
    Path(key): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    fake.record("GET", format!("/files/{}/nodes", key), query, &headers, None);
    if let Some(response) = failure(&key) {
        return response;
    }
    Json(json!({
        "name": "Design System",
        "nodes": {"1:2": {"document": {"id": "1:2", "name": "Button"}}},
        "version": "1234"
    }))
    .into_response()
}

async fn components(State(fake): State<FakeFigma>, Path(key): Path<String>, headers: HeaderMap) -> Response {
    fake.record("GET", format!("/files/{}/components", key), None, &headers, None);
    if let Some(response) = failure(&key) {
        return response;
    }
    Json(json!({
        "name": "Design System",
        "components": {"1:2": {"key": "abc", "name": "Button"}}
    }))
    .into_response()
}

async fn styles(State(fake): State<FakeFigma>, Path(key): Path<String>, headers: HeaderMap) -> Response {
    fake.record("GET", format!("/files/{}/styles", key), None, &headers, None);
    if let Some(response) = failure(&key) {
        return response;
    }
    Json(json!({
        "name": "Design System",
        "styles": {
            "S:1": {"name": "Brand/Primary", "styleType": "FILL"},
            "S:2": {"name": "Heading/H1", "styleType": "TEXT"},
            "S:3": {"name": "Shadow/Soft", "styleType": "EFFECT"},
            "S:4": {"name": "Layout/12col", "styleType": "GRID"}
        }
    }))
    .into_response()
}

async fn export(
    State(fake): State<FakeFigma>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record("POST", format!("/files/{}/export", key), None, &headers, Some(body));
    if let Some(response) = failure(&key) {
        return response;
    }
    Json(json!({
        "exports": {"1:2": "https://figma-alpha-api.s3.amazonaws.com/images/1-2.png"},
        "render_time": 87
    }))
    .into_response()
}

/// Serve the fake API and return its base URL
async fn spawn_fake_figma(fake: FakeFigma) -> String {
    let app = Router::new()
        .route("/files/:key", get(file))
        .route("/files/:key/nodes", get(nodes))
        .route("/files/:key/components", get(components))
        .route("/files/:key/styles", get(styles))
        .route("/files/:key/export", post(export))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn setup(default_file_key: Option<&str>) -> (ToolHandler, FakeFigma) {
    let fake = FakeFigma::default();
    let base_url = spawn_fake_figma(fake.clone()).await;

    let mut config = Config::new(TOKEN).with_api_base_url(base_url);
    if let Some(key) = default_file_key {
        config = config.with_default_file_key(key);
    }

    let client = FigmaClient::new(&config).unwrap();
    let handler = ToolHandler::new(Arc::new(client), config.default_file_key.clone());
    (handler, fake)
}

fn result_json(result: &CallToolResult) -> Value {
    assert!(!result.is_error, "unexpected error: {:?}", result.first_text());
    serde_json::from_str(result.first_text().unwrap()).unwrap()
}

mod remote_client_tests {
    use super::*;

    #[tokio::test]
    async fn test_token_header_and_node_ids_query() {
        let (handler, fake) = setup(Some("FILE1")).await;

        let result = handler
            .call_tool("get_file_nodes", json!({"node_ids": ["1:2", "3:4"]}))
            .await;
        assert_eq!(
            result_json(&result),
            json!({
                "file": "Design System",
                "nodes": {"1:2": {"document": {"id": "1:2", "name": "Button"}}},
                "version": "1234"
            })
        );

        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/files/FILE1/nodes");
        assert_eq!(requests[0].query.as_deref(), Some("ids=1%3A2%2C3%3A4"));
        assert_eq!(requests[0].token.as_deref(), Some(TOKEN));
    }

    #[tokio::test]
    async fn test_all_nodes_without_ids() {
        let (handler, fake) = setup(Some("FILE1")).await;

        handler.call_tool("get_file_nodes", json!({"node_ids": []})).await;
        assert_eq!(fake.requests()[0].query, None);
    }

    #[tokio::test]
    async fn test_export_posts_once() {
        let (handler, fake) = setup(None).await;

        let result = handler
            .call_tool(
                "export_component",
                json!({"file_key": "FILE2", "node_ids": ["1:2"], "format": "png"}),
            )
            .await;
        assert_eq!(
            result_json(&result),
            json!({
                "exports": {"1:2": "https://figma-alpha-api.s3.amazonaws.com/images/1-2.png"},
                "renderTime": 87
            })
        );

        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/files/FILE2/export");
        assert_eq!(
            requests[0].body,
            Some(json!({"ids": ["1:2"], "format": "png", "use_absolute_bounds": true}))
        );
    }

    #[tokio::test]
    async fn test_server_error_becomes_error_result() {
        let (handler, fake) = setup(None).await;

        for (name, args) in [
            ("get_file_nodes", json!({"file_key": "broken"})),
            ("get_file_components", json!({"file_key": "broken"})),
            ("get_component_sets", json!({"file_key": "broken"})),
            ("get_file_styles", json!({"file_key": "broken"})),
            ("get_page_hierarchy", json!({"file_key": "broken"})),
            (
                "export_component",
                json!({"file_key": "broken", "node_ids": ["1:2"], "format": "svg"}),
            ),
        ] {
            let result = handler.call_tool(name, args).await;
            assert!(result.is_error, "{} should fail", name);
            let text = result.first_text().unwrap();
            assert!(text.starts_with("Error: "), "{}", text);
            assert!(text.contains("500 Internal Server Error"), "{}", text);
            assert!(text.contains("boom"), "{}", text);
        }

        // one attempt per call, no retries
        assert_eq!(fake.requests().len(), 6);
    }

    #[tokio::test]
    async fn test_unreachable_api_becomes_error_result() {
        let config = Config::new(TOKEN)
            .with_api_base_url("http://127.0.0.1:1")
            .with_default_file_key("FILE1");
        let client = FigmaClient::new(&config).unwrap();
        let handler = ToolHandler::new(Arc::new(client), config.default_file_key.clone());

        let result = handler.call_tool("get_file_styles", json!({})).await;
        assert!(result.is_error);
        assert!(result.first_text().unwrap().starts_with("Error: HTTP error"));
    }
}

mod tool_tests {
    use super::*;

    /// Tool output for deep trees nests past serde_json's default limit
    fn deep_result_json(result: &CallToolResult) -> Value {
        assert!(!result.is_error, "unexpected error: {:?}", result.first_text());
        decode_body(result.first_text().unwrap().as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_deep_document_component_sets() {
        let (handler, _) = setup(None).await;

        let result = handler
            .call_tool("get_component_sets", json!({"file_key": "deep"}))
            .await;
        assert_eq!(
            result_json(&result),
            json!({
                "file": "Deep",
                "componentSets": [{"id": "leaf", "name": "Leaf", "componentSetId": "9:9", "type": "INSTANCE"}]
            })
        );
    }

    #[tokio::test]
    async fn test_deep_document_page_hierarchy() {
        let (handler, _) = setup(None).await;

        let result = handler
            .call_tool("get_page_hierarchy", json!({"file_key": "deep", "page_name": "home"}))
            .await;
        let value = deep_result_json(&result);

        let mut node = &value["pages"][0]["hierarchy"][0];
        let mut levels = 0;
        while let Some(child) = node.get("children").and_then(|c| c.get(0)) {
            assert_eq!(child["depth"], node["depth"].as_u64().unwrap() + 1);
            node = child;
            levels += 1;
        }
        assert_eq!(levels, DEEP_LEVELS);
        assert_eq!(node["id"], "leaf");
        assert_eq!(node["depth"], DEEP_LEVELS);
        assert!(node.get("children").is_none());
    }

    #[tokio::test]
    async fn test_components_count() {
        let (handler, _) = setup(Some("FILE1")).await;

        let value = result_json(&handler.call_tool("get_file_components", json!({})).await);
        assert_eq!(value["file"], "Design System");
        assert_eq!(value["totalComponents"], 1);
        assert_eq!(value["components"]["1:2"]["name"], "Button");
    }

    #[tokio::test]
    async fn test_component_sets() {
        let (handler, _) = setup(Some("FILE1")).await;

        let value = result_json(&handler.call_tool("get_component_sets", json!({})).await);
        assert_eq!(
            value["componentSets"],
            json!([{"id": "1:2", "name": "Button", "componentSetId": "5:0", "type": "INSTANCE"}])
        );
    }

    #[tokio::test]
    async fn test_styles_by_type() {
        let (handler, _) = setup(Some("FILE1")).await;

        let value = result_json(&handler.call_tool("get_file_styles", json!({})).await);
        assert_eq!(value["totalStyles"], 4);
        assert_eq!(value["stylesByType"]["colors"][0]["name"], "Brand/Primary");
        assert_eq!(value["stylesByType"]["typography"][0]["name"], "Heading/H1");
        assert_eq!(value["stylesByType"]["effects"][0]["name"], "Shadow/Soft");
        assert_eq!(value["stylesByType"]["grids"][0]["name"], "Layout/12col");
    }

    #[tokio::test]
    async fn test_page_hierarchy() {
        let (handler, _) = setup(Some("FILE1")).await;

        let value = result_json(&handler.call_tool("get_page_hierarchy", json!({})).await);
        assert_eq!(
            value["pages"],
            json!([
                {
                    "id": "0:1",
                    "name": "Home",
                    "type": "CANVAS",
                    "hierarchy": [{
                        "id": "1:1",
                        "name": "Hero",
                        "type": "FRAME",
                        "depth": 0,
                        "children": [{"id": "1:2", "name": "Button", "type": "INSTANCE", "depth": 1}]
                    }]
                },
                {"id": "0:2", "name": "Components", "type": "CANVAS", "hierarchy": []}
            ])
        );

        let value = result_json(
            &handler
                .call_tool("get_page_hierarchy", json!({"page_name": "COMP"}))
                .await,
        );
        assert_eq!(value["pages"].as_array().unwrap().len(), 1);
        assert_eq!(value["pages"][0]["name"], "Components");
    }

    #[tokio::test]
    async fn test_missing_file_key_makes_no_request() {
        let (handler, fake) = setup(None).await;

        let result = handler.call_tool("get_file_components", json!({})).await;
        assert!(result.is_error);
        assert!(result.first_text().unwrap().contains("File key required"));
        assert!(fake.requests().is_empty());
    }
}

mod mcp_protocol_tests {
    use super::*;

    #[tokio::test]
    async fn test_stdio_session() {
        let (handler, _) = setup(Some("FILE1")).await;
        let mut server = McpServer::new(handler);

        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05",
                "clientInfo": {"name": "test-client", "version": "1.0.0"},
                "capabilities": {}
            }}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {
                "name": "get_component_sets",
                "arguments": {}
            }}),
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {
                "name": "rename_file",
                "arguments": {}
            }}),
        ]
        .iter()
        .map(|message| format!("{}\n", message))
        .collect::<String>();

        let mut output = Vec::new();
        server.run(input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 4);

        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "figma-mcp");

        let tools = responses[1]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 6);
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));

        let text = responses[2]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("{\n  \"file\": \"Design System\""));
        assert!(responses[2]["result"].get("isError").is_none());

        assert_eq!(responses[3]["result"]["isError"], true);
        assert_eq!(
            responses[3]["result"]["content"][0]["text"],
            "Error: MCP protocol error: Unknown tool: rename_file"
        );
    }
}
