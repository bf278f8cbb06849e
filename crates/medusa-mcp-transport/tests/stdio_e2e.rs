//! End-to-end tests for the stdio binding over an in-memory pipe.

use std::sync::Arc;

use async_trait::async_trait;
use medusa_mcp_core::{ServerInfo, ToolOutput};
use medusa_mcp_server::{Server, ToolDescriptor, ToolProvider, compose};
use medusa_mcp_transport::{StdioTransport, serve};
use pretty_assertions::assert_eq;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

#[derive(Deserialize, JsonSchema)]
struct Greet {
    name: String,
}

struct GreetProvider;

#[async_trait]
impl ToolProvider for GreetProvider {
    fn name(&self) -> &str {
        "greet"
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![ToolDescriptor::new("greet", "Greet someone", |args: Greet| async move {
            Ok(ToolOutput::text(format!("Hello, {}!", args.name)))
        })]
    }
}

async fn test_server() -> Arc<Server> {
    let providers: Vec<Arc<dyn ToolProvider>> = vec![Arc::new(GreetProvider)];
    Arc::new(Server::new(
        ServerInfo::new("stdio-test", "0.0.0"),
        compose(&providers).await,
    ))
}

#[tokio::test]
async fn test_requests_are_answered_in_order() {
    let (client, server_side) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_side);
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(serve(
        test_server().await,
        StdioTransport::with_streams(server_read, server_write),
        shutdown.clone(),
    ));

    let (client_read, mut client_write) = tokio::io::split(client);
    let frames = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        "this is not json\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"greet","arguments":{"name":"Ada"}}}"#,
        "\n",
    );
    client_write.write_all(frames.as_bytes()).await.unwrap();

    let mut lines = BufReader::new(client_read).lines();
    let mut replies = Vec::new();
    for _ in 0..4 {
        let line = lines.next_line().await.unwrap().unwrap();
        replies.push(serde_json::from_str::<Value>(&line).unwrap());
    }

    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[0]["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(replies[1]["id"], Value::Null);
    assert_eq!(replies[1]["error"]["code"], -32700);
    assert_eq!(replies[2]["id"], 2);
    assert_eq!(replies[2]["result"]["tools"][0]["name"], "greet");
    assert_eq!(replies[3]["id"], 3);
    assert_eq!(replies[3]["result"]["content"][0]["text"], "Hello, Ada!");

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_eof_ends_session_cleanly() {
    let input: &[u8] = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n";
    let mut output = Vec::new();

    serve(
        test_server().await,
        StdioTransport::with_streams(input, &mut output),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let reply: Value = serde_json::from_slice(output.trim_ascii_end()).unwrap();
    assert_eq!(reply["id"], 1);
    assert_eq!(reply["result"], serde_json::json!({}));
}

#[tokio::test]
async fn test_unknown_tool_is_json_rpc_error() {
    let input: &[u8] =
        b"{\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"tools/call\",\"params\":{\"name\":\"missing\"}}\n";
    let mut output = Vec::new();

    serve(
        test_server().await,
        StdioTransport::with_streams(input, &mut output),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let reply: Value = serde_json::from_slice(output.trim_ascii_end()).unwrap();
    assert_eq!(reply["error"]["code"], -32602);
    assert!(reply.get("result").is_none());
}

#[tokio::test]
async fn test_unusual_ids_are_answered() {
    let input: &[u8] = concat!(
        r#"{"jsonrpc":"2.0","id":-1,"method":"ping"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#,
        "\n",
    )
    .as_bytes();
    let mut output = Vec::new();

    serve(
        test_server().await,
        StdioTransport::with_streams(input, &mut output),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let replies: Vec<Value> = output
        .split(|b| *b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_slice(line).unwrap())
        .collect();
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0]["id"], -1);
    assert_eq!(replies[0]["result"], serde_json::json!({}));
    assert_eq!(replies[1]["id"], 1.5);
    assert_eq!(replies[1]["result"], serde_json::json!({}));
    assert_eq!(replies[2]["id"], Value::Null);
    assert_eq!(replies[2]["error"]["code"], -32600);
}
