use futures::StreamExt;
use kobold_client::*;
use mockito::Matcher;
use serde_json::json;

use crate::{client_for, drain, sse_body};

const STREAM_PATH: &str = "/api/extra/generate/stream";

#[tokio::test]
async fn streams_tokens_in_wire_order() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", STREAM_PATH)
        .match_header("accept", "text/event-stream")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({ "prompt": "Say hello", "stream": true })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(&["Hello", " world", "!"]))
        .create_async()
        .await;

    let client = client_for(&server)?;
    let request = GenerationRequest::new("Say hello");
    let tokens = client
        .generate_stream(&request, CancellationToken::new())
        .await?;
    let tokens: Vec<String> = drain(tokens).await.into_iter().collect::<Result<_>>()?;

    assert_eq!(tokens, vec!["Hello", " world", "!"]);
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn caller_request_is_not_changed() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", STREAM_PATH)
        .with_status(200)
        .with_body(sse_body(&["ok"]))
        .create_async()
        .await;

    let client = client_for(&server)?;
    let request = GenerationRequest::new("Unchanged");
    let before = request.clone();
    let text = client
        .generate_stream(&request, CancellationToken::new())
        .await?
        .collect_text()
        .await?;

    assert_eq!(text, "ok");
    assert_eq!(request, before);
    Ok(())
}

#[tokio::test]
async fn done_sentinel_ends_stream() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        "{}data: [DONE]\n\n{}",
        sse_body(&["before"]),
        sse_body(&["after"])
    );
    let _mock = server
        .mock("POST", STREAM_PATH)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let text = client
        .generate_stream(&GenerationRequest::new("x"), CancellationToken::new())
        .await?
        .collect_text()
        .await?;
    assert_eq!(text, "before");
    Ok(())
}

#[tokio::test]
async fn malformed_frame_is_skipped() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        "{}data: {{\"token\": oops}}\n\n: keep-alive comment\nevent: message\n{}",
        sse_body(&["one"]),
        sse_body(&["two"])
    );
    let _mock = server
        .mock("POST", STREAM_PATH)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let results = drain(
        client
            .generate_stream(&GenerationRequest::new("x"), CancellationToken::new())
            .await?,
    )
    .await;
    let tokens: Vec<String> = results.into_iter().collect::<Result<_>>()?;
    assert_eq!(tokens, vec!["one", "two"]);
    Ok(())
}

#[tokio::test]
async fn crlf_line_endings_are_accepted() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", STREAM_PATH)
        .with_status(200)
        .with_body("data: {\"token\":\"a\"}\r\n\r\ndata: {\"token\":\"b\"}\r\n\r\ndata: [DONE]\r\n")
        .create_async()
        .await;

    let client = client_for(&server)?;
    let text = client
        .generate_stream(&GenerationRequest::new("x"), CancellationToken::new())
        .await?
        .collect_text()
        .await?;
    assert_eq!(text, "ab");
    Ok(())
}

#[tokio::test]
async fn invalid_utf8_line_does_not_end_stream() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mut body = sse_body(&["one"]).into_bytes();
    body.extend_from_slice(b"data: {\"token\":\"\xff\xfe\"\n\n");
    body.extend_from_slice(sse_body(&["two"]).as_bytes());
    let _mock = server
        .mock("POST", STREAM_PATH)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let results = drain(
        client
            .generate_stream(&GenerationRequest::new("x"), CancellationToken::new())
            .await?,
    )
    .await;
    let tokens: Vec<String> = results.into_iter().collect::<Result<_>>()?;
    assert_eq!(tokens, vec!["one", "two"]);
    Ok(())
}

#[tokio::test]
async fn oversized_line_is_skipped() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let huge = format!(
        "data: {{\"token\":\"{}\"}}\n\n",
        "x".repeat(kobold_client::stream::line::MAX_LINE_LENGTH)
    );
    let body = format!("{}{}{}", sse_body(&["one"]), huge, sse_body(&["two"]));
    let _mock = server
        .mock("POST", STREAM_PATH)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let text = client
        .generate_stream(&GenerationRequest::new("x"), CancellationToken::new())
        .await?
        .collect_text()
        .await?;
    assert_eq!(text, "onetwo");
    Ok(())
}

#[tokio::test]
async fn error_status_fails_before_any_token() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", STREAM_PATH)
        .with_status(500)
        .with_body("model crashed")
        .create_async()
        .await;

    let client = client_for(&server)?;
    let res = client
        .generate_stream(&GenerationRequest::new("x"), CancellationToken::new())
        .await;
    match res {
        Err(KoboldError::StreamRequestFailed { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "model crashed");
        }
        other => panic!("expected StreamRequestFailed, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn busy_server_is_not_retried_for_streams() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", STREAM_PATH)
        .with_status(503)
        .with_body("Server is busy")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let err = client
        .generate_stream(&GenerationRequest::new("x"), CancellationToken::new())
        .await
        .err();
    assert_eq!(err.as_ref().and_then(|e| e.status()), Some(503));
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn invalid_request_never_reaches_server() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", STREAM_PATH)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let request = GenerationRequest::builder().prompt("x").top_p(2.0).build();
    let res = client
        .generate_stream(&request, CancellationToken::new())
        .await;
    assert!(matches!(res, Err(KoboldError::InvalidRequest(_))));
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn cancelled_before_start_yields_nothing() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", STREAM_PATH)
        .with_status(200)
        .with_body(sse_body(&["never"]))
        .create_async()
        .await;

    let client = client_for(&server)?;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let tokens = client
        .generate_stream(&GenerationRequest::new("x"), cancel)
        .await?;
    assert!(drain(tokens).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn cancel_after_first_token() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", STREAM_PATH)
        .with_status(200)
        .with_body(sse_body(&["first", "second", "third"]))
        .create_async()
        .await;

    let client = client_for(&server)?;
    let cancel = CancellationToken::new();
    let mut tokens = client
        .generate_stream(&GenerationRequest::new("x"), cancel.clone())
        .await?;
    assert_eq!(tokens.next().await.transpose()?, Some("first".to_string()));
    cancel.cancel();
    assert!(tokens.next().await.is_none());
    Ok(())
}

#[tokio::test]
async fn same_body_same_tokens() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", STREAM_PATH)
        .with_status(200)
        .with_body(sse_body(&["a", "", "b"]))
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let request = GenerationRequest::new("x");
    let first = client
        .generate_stream(&request, CancellationToken::new())
        .await?
        .collect_text()
        .await?;
    let second = client
        .generate_stream(&request, CancellationToken::new())
        .await?
        .collect_text()
        .await?;
    assert_eq!(first, "ab");
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn openai_completion_stream_reads_choice_text() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/completions")
        .match_header("accept", "text/event-stream")
        .match_body(Matcher::PartialJson(json!({ "model": "koboldcpp", "stream": true })))
        .with_status(200)
        .with_body(
            "data: {\"choices\":[{\"text\":\"Once\"}]}\n\n\
             data: {\"choices\":[{\"text\":\" upon\"}]}\n\n\
             data: [DONE]\n\n",
        )
        .create_async()
        .await;

    let client = client_for(&server)?;
    let text = client
        .openai_completion_stream(
            &OpenAiCompletionRequest::new("Tell a story"),
            CancellationToken::new(),
        )
        .await?
        .collect_text()
        .await?;
    assert_eq!(text, "Once upon");
    mock.assert_async().await;
    Ok(())
}
