//! HTTP backend tests against a mock Gemini server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fluidvfx_genai::{
    ApiKey, CredentialSlot, EncodedImage, GenAiConfig, GenError, GenerationClient,
    VideoDownloader, VideoReference,
};
use fluidvfx_models::SceneCatalog;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-key";
const OPERATION: &str = "models/veo-3.1-generate-preview/operations/op-123";

fn config(server: &MockServer) -> GenAiConfig {
    GenAiConfig::default()
        .with_base_url(format!("{}/v1beta", server.uri()))
        .with_poll_interval(Duration::from_millis(10))
}

fn client(server: &MockServer, key: Option<&str>) -> GenerationClient {
    let slot = Arc::new(CredentialSlot::new(key.map(ApiKey::new)));
    GenerationClient::from_config(config(server), slot).expect("client")
}

fn photo() -> EncodedImage {
    EncodedImage::new("image/jpeg", "QUJDRA==")
}

#[tokio::test]
async fn test_composite_request_shape() {
    let server = MockServer::start().await;
    let scene = SceneCatalog::builtin().unwrap().get("wave").unwrap();

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-3-pro-image-preview:generateContent"))
        .and(query_param("key", KEY))
        .and(body_partial_json(json!({
            "contents": [{
                "parts": [
                    { "text": scene.image_prompt },
                    { "inlineData": { "mimeType": "image/jpeg", "data": "QUJDRA==" } }
                ]
            }],
            "generationConfig": {
                "imageConfig": { "aspectRatio": "16:9", "imageSize": "1K" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Blended." },
                        { "inlineData": { "mimeType": "image/png", "data": "UE5H" } }
                    ]
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let composite = client(&server, Some(KEY))
        .request_composite(&photo(), &scene)
        .await
        .unwrap();

    assert_eq!(composite.mime_type(), "image/png");
    assert_eq!(composite.data(), "UE5H");
}

#[tokio::test]
async fn test_composite_blocked_prompt_has_no_image() {
    let server = MockServer::start().await;
    let scene = SceneCatalog::builtin().unwrap().get("volcano").unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let err = client(&server, Some(KEY))
        .request_composite(&photo(), &scene)
        .await
        .unwrap_err();

    assert!(matches!(err, GenError::NoImageReturned));
}

#[tokio::test]
async fn test_error_envelope_is_parsed() {
    let server = MockServer::start().await;
    let scene = SceneCatalog::builtin().unwrap().get("jet").unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                    "reason": "API_KEY_INVALID",
                    "domain": "googleapis.com"
                }]
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server, Some("bogus"))
        .request_composite(&photo(), &scene)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "API key not valid. Please pass a valid API key.");
    let failure = err.upstream_failure().unwrap();
    assert_eq!(failure.status_code, Some(400));
    assert_eq!(failure.reason.as_deref(), Some("API_KEY_INVALID"));
    assert!(err.is_credential_problem());
}

#[tokio::test]
async fn test_unstructured_error_body() {
    let server = MockServer::start().await;
    let scene = SceneCatalog::builtin().unwrap().get("jet").unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client(&server, Some(KEY))
        .request_composite(&photo(), &scene)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("503"));
    assert!(err.to_string().contains("upstream unavailable"));
    assert!(!err.is_credential_problem());
}

#[tokio::test]
async fn test_video_job_end_to_end() {
    let server = MockServer::start().await;
    let scene = SceneCatalog::builtin().unwrap().get("tornado").unwrap();

    Mock::given(method("POST"))
        .and(path("/v1beta/models/veo-3.1-generate-preview:predictLongRunning"))
        .and(query_param("key", KEY))
        .and(body_partial_json(json!({
            "instances": [{
                "prompt": scene.video_prompt,
                "image": { "bytesBase64Encoded": "QUJDRA==", "mimeType": "image/jpeg" }
            }],
            "parameters": { "aspectRatio": "16:9", "resolution": "1080p", "sampleCount": 1 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": OPERATION })))
        .expect(1)
        .mount(&server)
        .await;

    // Two pending checks, then done.
    Mock::given(method("GET"))
        .and(path(format!("/v1beta/{}", OPERATION)))
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": false
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v1beta/{}", OPERATION)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "response": {
                "@type": "type.googleapis.com/google.ai.generativelanguage.v1beta.PredictLongRunningResponse",
                "generateVideoResponse": {
                    "generatedSamples": [{
                        "video": { "uri": "https://files.example/v1beta/files/vid:download?alt=media" }
                    }]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let progress = Mutex::new(Vec::new());
    let reference = client(&server, Some(KEY))
        .request_video(&photo(), &scene, |m| {
            progress.lock().unwrap().push(m.to_string())
        })
        .await
        .unwrap();

    assert_eq!(
        reference.as_str(),
        "https://files.example/v1beta/files/vid:download?alt=media&key=test-key"
    );
    assert!(progress.into_inner().unwrap().len() >= 3);
}

#[tokio::test]
async fn test_video_filtered_by_safety() {
    let server = MockServer::start().await;
    let scene = SceneCatalog::builtin().unwrap().get("lightspeed").unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "raiMediaFilteredCount": 1,
                    "raiMediaFilteredReasons": ["The input image contains a minor."]
                }
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server, Some(KEY))
        .request_video(&photo(), &scene, |_| {})
        .await
        .unwrap_err();

    match err {
        GenError::NoVideoReturned { filtered } => {
            assert_eq!(filtered, vec!["The input image contains a minor.".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_download_streams_to_file() {
    let server = MockServer::start().await;
    let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();

    Mock::given(method("GET"))
        .and(path("/v1beta/files/vid:download"))
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out").join("fluid-vfx-generated.mp4");
    let reference = VideoReference::new(format!(
        "{}/v1beta/files/vid:download?alt=media",
        server.uri()
    ))
    .with_credential(&ApiKey::new(KEY));

    let downloader = VideoDownloader::new(Duration::from_secs(5)).unwrap();
    let written = downloader.download(&reference, &destination).await.unwrap();

    assert_eq!(written, payload.len() as u64);
    assert_eq!(std::fs::read(&destination).unwrap(), payload);
}

#[tokio::test]
async fn test_download_http_error_leaves_no_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Forbidden", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("video.mp4");
    let reference = VideoReference::new(format!("{}/v1beta/files/vid:download", server.uri()));

    let err = VideoDownloader::new(Duration::from_secs(5))
        .unwrap()
        .download(&reference, &destination)
        .await
        .unwrap_err();

    assert!(matches!(err, GenError::Upstream(_)));
    assert!(!destination.exists());
}

/// Serve one video whose body arrives in `chunks` 1 KiB pieces, `gap` apart.
async fn trickle_server(chunks: usize, gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 2048];
        let _ = socket.read(&mut request).await;

        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            chunks * 1024
        );
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }
        for _ in 0..chunks {
            tokio::time::sleep(gap).await;
            if socket.write_all(&[7u8; 1024]).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
        }
    });

    format!("http://{}/video.mp4", addr)
}

#[tokio::test]
async fn test_download_slower_than_timeout_overall_completes() {
    // 6 x 150ms of body against a 400ms limit: each read is on time, the
    // whole transfer is not.
    let uri = trickle_server(6, Duration::from_millis(150)).await;
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("video.mp4");

    let written = VideoDownloader::new(Duration::from_millis(400))
        .unwrap()
        .download(&VideoReference::new(uri), &destination)
        .await
        .unwrap();

    assert_eq!(written, 6 * 1024);
    assert_eq!(std::fs::metadata(&destination).unwrap().len(), 6 * 1024);
}

#[tokio::test]
async fn test_download_stalled_body_times_out() {
    let uri = trickle_server(2, Duration::from_secs(2)).await;
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("video.mp4");

    let err = VideoDownloader::new(Duration::from_millis(200))
        .unwrap()
        .download(&VideoReference::new(uri), &destination)
        .await
        .unwrap_err();

    assert!(matches!(err, GenError::Upstream(_)));
    assert!(!destination.exists());
}
