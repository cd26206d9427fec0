//! JSON-RPC envelope and the stdio loop, end to end over in-memory pipes.

mod common;

use std::sync::Arc;

use semantic_model_mcp::{
    ErrorCode, JsonRpcResponse, McpServer, ToolRegistry, ValidationError, ValidationResult,
};
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;

use crate::common::{FakeValidator, RecordingFabric};

fn server(fabric: Arc<RecordingFabric>) -> McpServer {
    let validator = FakeValidator::returning(ValidationResult {
        is_valid: false,
        errors: vec![ValidationError::message("Unexpected token 'colum'")],
        summary: Some("Validation found 1 error(s) in 1 file(s).".to_string()),
    });
    McpServer::new(ToolRegistry::semantic_model_tools(fabric, Arc::new(validator)))
}

/// Feed `input` through [`McpServer::run`] and collect every output line.
async fn run_session(server: &McpServer, input: &str) -> Vec<JsonRpcResponse> {
    let (writer, mut output) = tokio::io::duplex(1 << 20);
    server.run(input.as_bytes(), writer).await.unwrap();

    let mut raw = String::new();
    output.read_to_string(&mut raw).await.unwrap();
    raw.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn by_id(responses: &[JsonRpcResponse], id: i64) -> &JsonRpcResponse {
    responses
        .iter()
        .find(|r| r.id == json!(id))
        .unwrap_or_else(|| panic!("no response for id {id}"))
}

#[tokio::test]
async fn session_answers_every_request_but_not_notifications() {
    let input = [
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{}}}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
    ]
    .join("\n");

    let responses = run_session(&server(Arc::new(RecordingFabric::new())), &input).await;
    assert_eq!(responses.len(), 3);

    let init = by_id(&responses, 1).result.as_ref().unwrap();
    assert_eq!(init["serverInfo"]["name"], "Semantic Model MCP Server");

    let tools = by_id(&responses, 2).result.as_ref().unwrap()["tools"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(tools.len(), 5);
    for tool in &tools {
        assert_eq!(tool["inputSchema"]["type"], "object");
        assert!(!tool["description"].as_str().unwrap().is_empty());
    }

    assert_eq!(by_id(&responses, 3).result, Some(json!({})));
}

#[tokio::test]
async fn tool_call_wraps_result_in_content_and_structured_content() {
    let fabric = Arc::new(RecordingFabric::new());
    let input = json!({
        "jsonrpc": "2.0",
        "id": 7,
        "method": "tools/call",
        "params": {
            "name": "createSemanticModel",
            "arguments": {
                "name": "Sales",
                "tmdlFiles": { "model.tmdl": "model Model" }
            }
        }
    })
    .to_string();

    let responses = run_session(&server(fabric.clone()), &input).await;
    let result = by_id(&responses, 7).result.clone().unwrap();

    assert_eq!(
        result["structuredContent"],
        json!({ "modelId": "model-123", "status": "Created" })
    );
    assert_eq!(result["isError"], false);
    assert_eq!(result["content"][0]["type"], "text");
    let text: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(text, result["structuredContent"]);
    assert_eq!(fabric.calls().create, 1);
}

#[tokio::test]
async fn invalid_validation_is_a_successful_call() {
    let input = r#"{"jsonrpc":"2.0","id":"v","method":"tools/call","params":{"name":"validateTmdl","arguments":{"tmdlFiles":{"model.tmdl":"model Model\n\tcolum x"}}}}"#;

    let responses = run_session(&server(Arc::new(RecordingFabric::new())), input).await;
    assert_eq!(responses.len(), 1);
    let response = &responses[0];
    assert_eq!(response.id, json!("v"));
    assert!(response.error.is_none());

    let result = &response.result.as_ref().unwrap()["structuredContent"];
    assert_eq!(result["isValid"], false);
    assert_eq!(result["errors"][0]["message"], "Unexpected token 'colum'");
    assert_eq!(result["errors"][0]["severity"], "Error");
}

#[tokio::test]
async fn handler_errors_map_to_protocol_codes() {
    let fabric = Arc::new(RecordingFabric::new());
    let input = [
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"refreshSemanticModel","arguments":{}}}"#,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"deploySemanticModel","arguments":"oops"}}"#,
        r#"{"jsonrpc":"2.0","id":4,"method":"resources/read"}"#,
        r#"{"jsonrpc":"2.0","id":5,"method":"#,
    ]
    .join("\n");

    let responses = run_session(&server(fabric.clone()), &input).await;
    assert_eq!(responses.len(), 5);

    let refresh = by_id(&responses, 1);
    assert_eq!(refresh.error_code(), Some(ErrorCode::InvalidParams));
    assert_eq!(refresh.error.as_ref().unwrap().message, "Model ID is required.");
    assert_eq!(by_id(&responses, 2).error_code(), Some(ErrorCode::MethodNotFound));
    assert_eq!(by_id(&responses, 3).error_code(), Some(ErrorCode::InvalidParams));
    assert_eq!(by_id(&responses, 4).error_code(), Some(ErrorCode::MethodNotFound));

    let parse = responses.iter().find(|r| r.id.is_null()).unwrap();
    assert_eq!(parse.error_code(), Some(ErrorCode::ParseError));
    assert_eq!(fabric.calls().total(), 0);
}

#[tokio::test]
async fn rejected_deployment_is_internal_error() {
    let fabric = Arc::new(RecordingFabric::new().on_post(|| {
        Ok(semantic_model_mcp::ApiResponse::new(400, "").with_reason("Invalid model ID"))
    }));
    let input = r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"deploySemanticModel","arguments":{"modelId":"bad","targetEnvironment":"Test"}}}"#;

    let responses = run_session(&server(fabric), input).await;
    let error = responses[0].error.as_ref().unwrap();
    assert_eq!(error.code, -32603);
    assert_eq!(error.message, "Deployment failed with status code 400: Invalid model ID");
}

#[tokio::test]
async fn concurrent_calls_are_all_answered() {
    let fabric = Arc::new(RecordingFabric::new());
    let input: Vec<String> = (0..20)
        .map(|i| {
            json!({
                "jsonrpc": "2.0",
                "id": i,
                "method": "tools/call",
                "params": {
                    "name": "refreshSemanticModel",
                    "arguments": { "modelId": format!("model-{i}") }
                }
            })
            .to_string()
        })
        .collect();

    let responses = run_session(&server(fabric.clone()), &input.join("\n")).await;
    assert_eq!(responses.len(), 20);
    for i in 0..20 {
        let result = by_id(&responses, i).result.as_ref().unwrap();
        assert_eq!(result["structuredContent"]["status"], "Refreshing");
    }
    assert_eq!(fabric.calls().refresh, 20);
}
