use std::time::Duration;

use serde_json::{json, Value};

use viz_control::{
    //
    create_memory_transport,
    ControlClient,
    ControlConfig,
    Error,
    MemoryEndpoint,
    Message,
    MessageId,
    MessageKind,
    Result,
};

fn test_config() -> ControlConfig {
    // ---
    ControlConfig::default().with_request_timeout(Duration::from_secs(2))
}

/// Read and decode the next frame the client sent.
async fn next_message(endpoint: &mut MemoryEndpoint) -> Message {
    // ---
    let frame = endpoint
        .sent
        .recv()
        .await
        .expect("client closed its outbound channel");
    serde_json::from_str(&frame).expect("client sent invalid JSON")
}

/// Inject a frame into the client's inbox.
async fn push(endpoint: &MemoryEndpoint, message: &Message) {
    // ---
    let frame = serde_json::to_string(message).unwrap();
    endpoint.replies.send(frame).await.unwrap();
}

fn tool_result(id: MessageId, result: Value) -> Message {
    // ---
    Message::reply(id, MessageKind::ToolResult, json!({ "result": result }))
}

/// Connect a client over a memory transport and consume its handshake.
async fn connected_client(config: ControlConfig) -> Result<(ControlClient, MemoryEndpoint)> {
    // ---
    let (transport, inbox, mut endpoint) = create_memory_transport();
    let client = ControlClient::with_transport(transport, inbox, config).await?;

    let handshake = next_message(&mut endpoint).await;
    assert_eq!(handshake.kind, MessageKind::Connect);

    Ok((client, endpoint))
}

#[tokio::test]
async fn test_handshake_declares_identity() -> Result<()> {
    // ---
    let config = test_config().with_client_id("test-rig");
    let (transport, inbox, mut endpoint) = create_memory_transport();
    let _client = ControlClient::with_transport(transport, inbox, config).await?;

    let handshake = next_message(&mut endpoint).await;

    assert_eq!(handshake.kind, MessageKind::Connect);
    assert!(handshake.timestamp.is_some());
    assert_eq!(handshake.payload["clientId"], "test-rig");
    assert_eq!(handshake.payload["version"], "1.0.0");
    assert_eq!(
        handshake.payload["capabilities"],
        json!(["pipeline", "tools", "state"])
    );

    Ok(())
}

#[tokio::test]
async fn test_tool_call_round_trip() -> Result<()> {
    // ---
    let (client, mut endpoint) = connected_client(test_config()).await?;

    let server = tokio::spawn(async move {
        // ---
        let request = next_message(&mut endpoint).await;
        assert_eq!(request.kind, MessageKind::ToolCall);
        assert_eq!(request.payload["tool"], "echo");

        // Echo the arguments back under the request's own id.
        let echoed = request.payload["args"].clone();
        push(&endpoint, &tool_result(request.id, json!({ "echoed": echoed }))).await;
        endpoint
    });

    let result = client.call_tool("echo", json!({ "value": 7 })).await?;
    assert_eq!(result["echoed"]["value"], 7);

    server.await.expect("server task panicked");
    Ok(())
}

#[tokio::test]
async fn test_send_then_await_response() -> Result<()> {
    // ---
    let (client, mut endpoint) = connected_client(test_config()).await?;

    let id = client
        .send(MessageKind::ToolCall, json!({ "tool": "noop", "args": {} }))
        .await?;

    let request = next_message(&mut endpoint).await;
    assert_eq!(request.id, id);

    push(&endpoint, &tool_result(id.clone(), json!("done"))).await;

    let reply = client.await_response(&id, None).await?;
    assert_eq!(reply.id, id);
    assert_eq!(reply.into_result()?, json!("done"));

    // The handle was consumed; a second await is a caller bug.
    assert!(client.await_response(&id, None).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_decoy_replies_are_discarded() -> Result<()> {
    // ---
    let (client, mut endpoint) = connected_client(test_config()).await?;

    let server = tokio::spawn(async move {
        // ---
        let request = next_message(&mut endpoint).await;

        // A burst of replies for identifiers the client never issued.
        for n in 0..5 {
            let decoy = Message::reply(
                MessageId::from(format!("decoy-{n}")),
                MessageKind::ToolResult,
                json!({ "result": n }),
            );
            push(&endpoint, &decoy).await;
        }

        push(&endpoint, &tool_result(request.id, json!("real"))).await;
        endpoint
    });

    let result = client.call_tool("getCurrentProject", json!({})).await?;
    assert_eq!(result, json!("real"));

    server.await.expect("server task panicked");
    Ok(())
}

#[tokio::test]
async fn test_timeout_when_no_reply_arrives() -> Result<()> {
    // ---
    let config = ControlConfig::default().with_request_timeout(Duration::from_millis(100));
    let (client, _endpoint) = connected_client(config).await?;

    let err = client.call_tool("slow", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::Timeout), "got {err:?}");

    Ok(())
}

#[tokio::test]
async fn test_error_reply_carries_remote_message() -> Result<()> {
    // ---
    let (client, mut endpoint) = connected_client(test_config()).await?;

    let server = tokio::spawn(async move {
        // ---
        let request = next_message(&mut endpoint).await;
        let reply = Message::reply(
            request.id,
            MessageKind::ToolError,
            json!({ "error": { "message": "node type not registered" } }),
        );
        push(&endpoint, &reply).await;
        endpoint
    });

    let err = client.call_tool("badTool", json!({})).await.unwrap_err();
    match err {
        Error::Remote(text) => assert!(text.contains("node type not registered")),
        other => panic!("expected remote error, got {other:?}"),
    }

    server.await.expect("server task panicked");
    Ok(())
}

#[tokio::test]
async fn test_disconnect_is_idempotent() -> Result<()> {
    // ---
    let (client, _endpoint) = connected_client(test_config()).await?;

    client.disconnect().await;
    client.disconnect().await;
    assert!(client.is_closed());

    // Sends after disconnect fail fast rather than hanging.
    let err = client.call_tool("late", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed));

    Ok(())
}

#[tokio::test]
async fn test_get_current_project_scenario() -> Result<()> {
    // ---
    let (client, mut endpoint) = connected_client(test_config()).await?;

    let server = tokio::spawn(async move {
        // ---
        let request = next_message(&mut endpoint).await;
        assert_eq!(request.kind, MessageKind::ToolCall);
        assert_eq!(request.payload["tool"], "getCurrentProject");
        assert_eq!(request.payload["args"], json!({}));

        push(
            &endpoint,
            &tool_result(request.id, json!({ "nodes": [], "edges": [] })),
        )
        .await;
        endpoint
    });

    let project = client.get_current_project().await?;
    assert_eq!(project, json!({ "nodes": [], "edges": [] }));

    server.await.expect("server task panicked");
    Ok(())
}

#[tokio::test]
async fn test_pipeline_create_and_test_shapes() -> Result<()> {
    // ---
    let (client, mut endpoint) = connected_client(test_config()).await?;

    let server = tokio::spawn(async move {
        // ---
        let create = next_message(&mut endpoint).await;
        assert_eq!(create.kind, MessageKind::PipelineCreate);
        assert_eq!(create.payload["options"]["validateFirst"], true);
        assert_eq!(create.payload["options"]["autoConnect"], true);
        assert_eq!(create.payload["spec"]["nodes"][0]["id"], "/file-loader");

        push(
            &endpoint,
            &tool_result(create.id, json!({ "pipelineId": "p-1" })),
        )
        .await;

        let test = next_message(&mut endpoint).await;
        assert_eq!(test.kind, MessageKind::PipelineTest);
        assert_eq!(test.payload["pipelineId"], "p-1");
        assert_eq!(test.payload["options"]["timeout"], 30_000);
        assert_eq!(test.payload["options"]["captureIntermediateResults"], true);
        assert_eq!(test.payload["testData"].as_array().unwrap().len(), 2);

        push(&endpoint, &tool_result(test.id, json!({ "success": true }))).await;
        endpoint
    });

    let spec = json!({
        "nodes": [{ "id": "/file-loader", "type": "FileOp" }],
        "edges": [],
    });

    let pipeline = client.create_pipeline(spec).await?;
    let pipeline_id = pipeline["pipelineId"].as_str().unwrap().to_owned();
    assert_eq!(pipeline_id, "p-1");

    let outcome = client
        .test_pipeline(&pipeline_id, json!([{ "n": 1 }, { "n": 2 }]))
        .await?;
    assert_eq!(outcome["success"], true);

    server.await.expect("server task panicked");
    Ok(())
}

#[tokio::test]
async fn test_concurrent_requests_resolve_out_of_order() -> Result<()> {
    // ---
    let (client, mut endpoint) = connected_client(test_config()).await?;

    let server = tokio::spawn(async move {
        // ---
        let first = next_message(&mut endpoint).await;
        let second = next_message(&mut endpoint).await;

        // Answer in reverse arrival order; each reply echoes the
        // request's own argument so correlation is observable.
        for request in [second, first] {
            let n = request.payload["args"]["n"].clone();
            push(&endpoint, &tool_result(request.id, n)).await;
        }
        endpoint
    });

    let (a, b) = tokio::join!(
        client.call_tool("pick", json!({ "n": 1 })),
        client.call_tool("pick", json!({ "n": 2 })),
    );

    assert_eq!(a?, json!(1));
    assert_eq!(b?, json!(2));

    server.await.expect("server task panicked");
    Ok(())
}

#[tokio::test]
async fn test_peer_drop_fails_outstanding_requests() -> Result<()> {
    // ---
    let (client, mut endpoint) = connected_client(test_config()).await?;

    let server = tokio::spawn(async move {
        // ---
        let _request = next_message(&mut endpoint).await;
        // Drop the endpoint without replying, simulating a peer disconnect.
        drop(endpoint);
    });

    let err = client.call_tool("doomed", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed), "got {err:?}");
    assert!(client.is_closed());

    server.await.expect("server task panicked");
    Ok(())
}
