use std::time::Duration;

use muse::ai::{ChatClient, ImageDispatcher, RunwayClient, VideoGenerator, build_http_client};
use muse::core::config::{EndpointConfig, PollPolicy};
use muse::core::models::Role;
use muse::studio::{Notification, Studio};
use muse::styles::style_by_id;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn studio(server: &MockServer) -> Studio {
    let http = build_http_client(Duration::from_secs(5)).unwrap();
    let endpoint = |p: &str| {
        EndpointConfig::new(
            &format!("{}/{p}", server.uri()),
            Some("test-key".to_string()),
            "MUSE_API_KEY",
        )
        .unwrap()
    };
    let timeout = Duration::from_secs(5);
    Studio::new(
        ChatClient::new(http.clone(), endpoint("chat")),
        ImageDispatcher::new(http.clone(), endpoint("generate-image"), endpoint("enhance-image"), timeout),
        VideoGenerator::new(
            RunwayClient::new(http, endpoint(""), timeout),
            PollPolicy {
                interval: Duration::from_millis(1),
                max_attempts: 3,
            },
        ),
    )
}

#[tokio::test]
async fn test_chat_message_streams_into_conversation() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let mut studio = studio(&server);
    let mut snapshots = Vec::new();
    let failure = studio
        .send_message("hello", None, None, &CancellationToken::new(), |s| {
            snapshots.push(s.to_string());
        })
        .await;

    assert_eq!(failure, None);
    assert_eq!(snapshots, vec!["Hi", "Hi there"]);

    let turns = studio.conversation().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, "Hi there");
}

#[tokio::test]
async fn test_image_request_routes_to_generator() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate-image"))
        .and(body_partial_json(json!({
            "prompt": "draw a lighthouse, cyberpunk style, neon lights, futuristic, high-tech low-life aesthetic"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "A neon lighthouse",
            "images": ["https://cdn/lighthouse.png"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut studio = studio(&server);
    let failure = studio
        .send_message(
            "draw a lighthouse",
            None,
            style_by_id("cyberpunk"),
            &CancellationToken::new(),
            |_| {},
        )
        .await;

    assert_eq!(failure, None);
    let gallery = studio.conversation().gallery();
    assert_eq!(gallery.len(), 1);
    assert_eq!(gallery[0].url, "https://cdn/lighthouse.png");
    assert_eq!(gallery[0].prompt, "draw a lighthouse");
    assert_eq!(gallery[0].style_label.as_deref(), Some("Cyberpunk"));
}

#[tokio::test]
async fn test_failure_becomes_reply_and_notification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Model overloaded"})))
        .mount(&server)
        .await;

    let mut studio = studio(&server);
    let failure = studio
        .send_message("hello", None, None, &CancellationToken::new(), |_| {})
        .await;

    assert_eq!(failure, Some(Notification::Error("Model overloaded".to_string())));
    let last = studio.conversation().turns().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(
        last.content,
        "I'm sorry, I encountered an error: Model overloaded. Please try again."
    );
}

#[tokio::test]
async fn test_cancelled_request_is_silent() {
    let server = MockServer::start().await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut studio = studio(&server);
    let failure = studio.send_message("hello", None, None, &cancel, |_| {}).await;

    assert_eq!(failure, None);
    assert_eq!(studio.conversation().len(), 1);
}

#[tokio::test]
async fn test_empty_message_is_ignored() {
    let server = MockServer::start().await;
    let mut studio = studio(&server);

    let failure = studio
        .send_message("   ", None, None, &CancellationToken::new(), |_| {})
        .await;

    assert_eq!(failure, None);
    assert!(studio.conversation().is_empty());
}

#[tokio::test]
async fn test_animate_image_leaves_conversation_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/image_to_video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "t1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t1",
            "status": "SUCCEEDED",
            "output": ["https://cdn/v.mp4"]
        })))
        .mount(&server)
        .await;

    let studio = studio(&server);
    let url = studio
        .animate_image("https://cdn/still.png", "", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(url, "https://cdn/v.mp4");
    assert!(studio.conversation().is_empty());

    let err = studio
        .animate_image(" ", "x", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        Notification::from_error(&err),
        Some(Notification::Error("Please provide an image to animate".to_string()))
    );
}
