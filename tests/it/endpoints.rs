use kobold_client::*;
use mockito::Matcher;
use serde_json::json;

use crate::client_for;

#[tokio::test]
async fn info_routes() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _version = server
        .mock("GET", "/api/v1/info/version")
        .with_status(200)
        .with_body(r#"{"result":"1.2.5"}"#)
        .create_async()
        .await;
    let _extra = server
        .mock("GET", "/api/extra/version")
        .with_status(200)
        .with_body(r#"{"result":"KoboldCpp","version":"1.80.3","protected":false,"txt2img":true,"vision":false,"transcribe":true,"multiplayer":true,"websearch":false}"#)
        .create_async()
        .await;
    let _perf = server
        .mock("GET", "/api/extra/perf")
        .with_status(200)
        .with_body(r#"{"last_process":0.5,"last_eval":2.0,"last_token_count":64,"last_seed":7,"total_gens":2,"stop_reason":1,"total_img_gens":0,"queue":0,"idle":1,"hordeexitcounter":0,"uptime":12.0,"idletime":3.0,"quiet":false}"#)
        .create_async()
        .await;
    let _props = server
        .mock("GET", "/props")
        .with_status(200)
        .with_body(r#"{"chat_template":"","total_slots":1,"default_generation_settings":{"n_ctx":4096}}"#)
        .create_async()
        .await;

    let client = client_for(&server)?;
    assert_eq!(client.version_info().await?.result, "1.2.5");
    let extra = client.extra_version_info().await?;
    assert_eq!(extra.version, "1.80.3");
    assert!(extra.txt2img && extra.transcribe && !extra.websearch);
    let perf = client.perf_info().await?;
    assert_eq!(perf.last_token_count, 64);
    assert!(perf.is_idle());
    let props = client.server_properties().await?;
    assert_eq!(props.default_generation_settings.n_ctx, 4096);
    Ok(())
}

#[tokio::test]
async fn token_routes() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let count = server
        .mock("POST", "/api/extra/tokencount")
        .match_body(Matcher::Json(json!({ "prompt": "Hello world", "special": true })))
        .with_status(200)
        .with_body(r#"{"value":3,"ids":[1,15043,3186]}"#)
        .create_async()
        .await;
    let detok = server
        .mock("POST", "/api/extra/detokenize")
        .match_body(Matcher::Json(json!({ "ids": [15043, 3186] })))
        .with_status(200)
        .with_body(r#"{"result":"Hello world","success":true}"#)
        .create_async()
        .await;
    let _logprobs = server
        .mock("GET", "/api/extra/last_logprobs")
        .with_status(200)
        .with_body(r#"{"logprobs":null}"#)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let counted = client
        .count_tokens(&CountTokensRequest::new("Hello world"))
        .await?;
    assert_eq!(counted.value, 3);
    assert_eq!(counted.ids, vec![1, 15043, 3186]);

    let text = client
        .detokenize(&DetokenizeRequest {
            ids: vec![15043, 3186],
        })
        .await?;
    assert!(text.success);
    assert_eq!(text.result, "Hello world");

    assert!(client.last_logprobs().await?.logprobs.is_none());
    count.assert_async().await;
    detok.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn multiplayer_routes() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _status = server
        .mock("POST", "/api/extra/multiplayer/status")
        .match_body(Matcher::Json(json!({ "sender": "alice", "senderbusy": false })))
        .with_status(200)
        .with_body(r#"{"turn_major":3,"turn_minor":1,"idle":true,"data_format":"kcpp_lzma_b64"}"#)
        .create_async()
        .await;
    let _story = server
        .mock("GET", "/api/extra/multiplayer/getstory")
        .with_status(200)
        .with_body("raw story payload")
        .create_async()
        .await;
    let _set = server
        .mock("POST", "/api/extra/multiplayer/setstory")
        .match_body(Matcher::PartialJson(json!({ "full_update": true, "sender": "alice" })))
        .with_status(200)
        .with_body(r#"{"success":true,"turn_major":4,"turn_minor":0,"idle":true,"data_format":"kcpp_lzma_b64"}"#)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let status = client
        .multiplayer_status(&MultiplayerStatusRequest {
            sender: "alice".to_string(),
            sender_busy: false,
        })
        .await?;
    assert_eq!(status.turn_major, 3);
    assert!(status.idle);

    assert_eq!(client.multiplayer_story().await?, "raw story payload");

    let updated = client
        .set_multiplayer_story(&MultiplayerStoryRequest {
            full_update: true,
            data_format: "kcpp_lzma_b64".to_string(),
            sender: "alice".to_string(),
            data: "abc".to_string(),
        })
        .await?;
    assert!(updated.success);
    assert_eq!(updated.turn_major, 4);
    assert!(updated.error.is_none());
    Ok(())
}

#[tokio::test]
async fn image_routes() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let txt2img = server
        .mock("POST", "/sdapi/v1/txt2img")
        .match_body(Matcher::PartialJson(json!({
            "prompt": "a lighthouse",
            "width": 512,
            "height": 512,
            "sampler_name": "euler_a"
        })))
        .with_status(200)
        .with_body(r#"{"images":["aGVsbG8="],"parameters":{},"info":"{}"}"#)
        .create_async()
        .await;
    let _interrogate = server
        .mock("POST", "/sdapi/v1/interrogate")
        .match_body(Matcher::Json(json!({ "image": "aGVsbG8=" })))
        .with_status(200)
        .with_body(r#"{"caption":"a greeting"}"#)
        .create_async()
        .await;
    let _samplers = server
        .mock("GET", "/sdapi/v1/samplers")
        .with_status(200)
        .with_body(r#"[{"name":"Euler a","aliases":["k_euler_a"],"options":{}}]"#)
        .create_async()
        .await;
    let _models = server
        .mock("GET", "/sdapi/v1/sd-models")
        .with_status(200)
        .with_body(r#"[{"title":"sd15","model_name":"sd15","hash":null,"filename":"sd15.safetensors"}]"#)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let generated = client
        .text_to_image(&TextToImageRequest::builder().prompt("a lighthouse").build())
        .await?;
    assert_eq!(generated.decode_images()?, vec![b"hello".to_vec()]);
    txt2img.assert_async().await;

    let caption = client
        .interrogate(&InterrogateRequest::from_bytes(b"hello"))
        .await?;
    assert_eq!(caption.caption, "a greeting");

    let samplers = client.sd_samplers().await?;
    assert_eq!(samplers[0].aliases, vec!["k_euler_a"]);
    let models = client.sd_models().await?;
    assert_eq!(models[0].filename, "sd15.safetensors");
    Ok(())
}

#[tokio::test]
async fn img2img_route() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/sdapi/v1/img2img")
        .match_body(Matcher::PartialJson(json!({
            "prompt": "sketch",
            "init_images": ["aGVsbG8="],
            "denoising_strength": 0.75
        })))
        .with_status(200)
        .with_body(r#"{"images":[],"parameters":{},"info":""}"#)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let request = ImageToImageRequest::new(
        TextToImageRequest::builder().prompt("sketch").build(),
        b"hello",
    );
    let response = client.image_to_image(&request).await?;
    assert!(response.images.is_empty());
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn transcribe_route() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/extra/transcribe")
        .match_body(Matcher::PartialJson(json!({
            "audio_data": "UklGRg==",
            "suppress_non_speech": false
        })))
        .with_status(200)
        .with_body(r#"{"text":"hello there"}"#)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let response = client
        .transcribe(&TranscribeRequest::from_bytes(b"RIFF"))
        .await?;
    assert_eq!(response.text, "hello there");
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn web_search_route() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/extra/websearch")
        .match_body(Matcher::Json(json!({ "q": "koboldcpp" })))
        .with_status(200)
        .with_body(r#"[{"title":"KoboldCpp","url":"https://github.com/LostRuins/koboldcpp","desc":"One file","content":"..."}]"#)
        .create_async()
        .await;

    let client = client_for(&server)?;
    let results = client.web_search("koboldcpp").await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].description, "One file");
    mock.assert_async().await;

    assert!(matches!(
        client.web_search("  ").await,
        Err(KoboldError::InvalidRequest(_))
    ));
    Ok(())
}

#[tokio::test]
async fn unparseable_response_is_a_deserialize_error() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v1/model")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let client = client_for(&server)?;
    assert!(matches!(
        client.model_info().await,
        Err(KoboldError::JSONDeserialize(_))
    ));
    Ok(())
}
