use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{ header, Method, StatusCode },
    response::{ IntoResponse, Response },
    routing::post,
    Json,
    Router,
};
use log::{ error, info, warn };
use tower_http::cors::{ Any, CorsLayer };
use uuid::Uuid;

use crate::cli::Args;
use crate::config::prompt::IMAGE_ONLY_CAPTION;
use crate::models::api::{ Content, EndpointType, Part, RelayError, RelayRequest, RelayResponse };
use crate::models::chat::Role;
use crate::upstream::{ GenerateRequest, GenerativeClient, UpstreamError };

#[derive(Clone)]
struct AppState {
    api_key: Option<String>,
    upstream: Arc<dyn GenerativeClient>,
}

pub fn router(api_key: Option<String>, upstream: Arc<dyn GenerativeClient>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/ai", post(generate_handler).options(preflight_handler))
        .layer(cors)
        .with_state(AppState { api_key, upstream })
}

pub async fn start_http_server(
    args: Args,
    api_key: Option<String>,
    upstream: Arc<dyn GenerativeClient>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = args.server_addr.parse::<SocketAddr>()?;
    let app = router(api_key, upstream);

    if args.enable_tls && args.tls_cert_path.is_some() && args.tls_key_path.is_some() {
        let cert_path = args.tls_cert_path.as_ref().unwrap();
        let key_path = args.tls_key_path.as_ref().unwrap();

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Relay listening on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        info!("Relay listening on: http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

/// Non-preflight OPTIONS probes get a plain 200; actual CORS pre-flight is
/// answered by the layer before reaching here.
async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

/// Single-shot stateless relay: validate, assemble, forward, map the outcome.
/// Every failure branch degrades to a JSON error response; the handler never
/// drops the connection.
async fn generate_handler(State(state): State<AppState>, body: String) -> Response {
    let request_id = Uuid::new_v4();

    let api_key = match state.api_key.as_deref() {
        Some(key) => key,
        None => {
            error!("[{}] API key missing from server configuration", request_id);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server Configuration Error: API Key missing."
            );
        }
    };

    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing request body");
    }

    let request: RelayRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(_) => {
            warn!("[{}] rejected malformed JSON body", request_id);
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    let endpoint_type = request.endpoint_type;
    let upstream_request = build_generate_request(request);

    match state.upstream.generate(api_key, upstream_request).await {
        Ok(text) => {
            info!("[{}] {:?} request relayed", request_id, endpoint_type);
            Json(RelayResponse { text }).into_response()
        }
        Err(UpstreamError::Status { code, message }) => {
            error!("[{}] upstream error {}: {}", request_id, code, message);
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY);
            error_response(status, &message)
        }
        Err(err) => {
            error!("[{}] relay failure: {}", request_id, err);
            error_response(StatusCode::BAD_GATEWAY, &format!("Backend Crash: {}", err))
        }
    }
}

/// Assemble the upstream "contents" sequence from the inbound payload.
fn build_generate_request(request: RelayRequest) -> GenerateRequest {
    let contents = match request.endpoint_type {
        EndpointType::Chat => {
            // Replay the supplied history verbatim, then append one user turn.
            let mut contents = request.history.unwrap_or_default();
            let message = request.message.unwrap_or_default();

            let parts = match request.image {
                // Image first, caption second.
                Some(image) => vec![
                    Part::inline_data(image),
                    Part::text(if message.is_empty() {
                        IMAGE_ONLY_CAPTION.to_string()
                    } else {
                        message
                    })
                ],
                // Upstream rejects empty content; a single space keeps the
                // turn valid.
                None => vec![
                    Part::text(if message.is_empty() { " ".to_string() } else { message })
                ],
            };

            contents.push(Content { role: Role::User, parts });
            contents
        }
        EndpointType::Recommendation => {
            let prompt = request.prompt
                .filter(|prompt| !prompt.is_empty())
                .unwrap_or_else(|| "Hello".to_string());
            vec![Content { role: Role::User, parts: vec![Part::text(prompt)] }]
        }
    };

    GenerateRequest::new(contents, request.system_instruction)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(RelayError { error: message.to_string() })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::models::api::Blob;

    struct MockUpstream {
        calls: AtomicUsize,
        captured: Mutex<Option<GenerateRequest>>,
        response: Result<String, UpstreamError>,
    }

    impl MockUpstream {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                captured: Mutex::new(None),
                response: Ok(text.to_string()),
            })
        }

        fn failing(error: UpstreamError) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                captured: Mutex::new(None),
                response: Err(error),
            })
        }

        fn captured(&self) -> GenerateRequest {
            self.captured.lock().unwrap().clone().expect("no upstream call captured")
        }
    }

    #[async_trait]
    impl GenerativeClient for MockUpstream {
        async fn generate(
            &self,
            _api_key: &str,
            request: GenerateRequest
        ) -> Result<String, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.captured.lock().unwrap() = Some(request);
            self.response.clone()
        }
    }

    fn post_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/ai")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_credential_yields_500_without_upstream_call() {
        let mock = MockUpstream::ok("never called");
        let app = router(None, mock.clone() as Arc<dyn GenerativeClient>);

        let response = app
            .oneshot(post_request(r#"{ "endpointType": "chat", "message": "hi" }"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Server Configuration Error: API Key missing.");
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_post_method_yields_405() {
        let mock = MockUpstream::ok("never called");
        let app = router(Some("key".to_string()), mock.clone() as Arc<dyn GenerativeClient>);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/ai")
                    .body(Body::empty())
                    .unwrap()
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_json_yields_400() {
        let mock = MockUpstream::ok("never called");
        let app = router(Some("key".to_string()), mock.clone() as Arc<dyn GenerativeClient>);

        let response = app.oneshot(post_request("{ not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid JSON");
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_body_yields_400() {
        let mock = MockUpstream::ok("never called");
        let app = router(Some("key".to_string()), mock.clone() as Arc<dyn GenerativeClient>);

        let response = app.oneshot(post_request("")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Missing request body");
    }

    #[tokio::test]
    async fn chat_request_appends_image_before_caption() {
        let mock = MockUpstream::ok("diagnosis complete");
        let app = router(Some("key".to_string()), mock.clone() as Arc<dyn GenerativeClient>);

        let payload = serde_json::json!({
            "endpointType": "chat",
            "systemInstruction": "steer",
            "history": [
                { "role": "user", "parts": [ { "text": "earlier question" } ] },
                { "role": "model", "parts": [ { "text": "earlier answer" } ] }
            ],
            "message": "critique this layout",
            "image": { "mimeType": "image/png", "data": "aGk=" }
        });
        let response = app.oneshot(post_request(&payload.to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["text"], "diagnosis complete");

        let upstream_request = mock.captured();
        assert_eq!(upstream_request.contents.len(), 3);
        assert_eq!(upstream_request.contents[0].role, Role::User);

        let new_turn = upstream_request.contents.last().unwrap();
        assert_eq!(new_turn.role, Role::User);
        assert_eq!(new_turn.parts.len(), 2);
        match &new_turn.parts[0] {
            Part::InlineData { inline_data } => {
                assert_eq!(
                    inline_data,
                    &Blob { mime_type: "image/png".to_string(), data: "aGk=".to_string() }
                );
            }
            other => panic!("expected image first, got {:?}", other),
        }
        assert_eq!(new_turn.parts[1], Part::text("critique this layout"));

        let instruction = upstream_request.system_instruction.expect("system instruction dropped");
        assert_eq!(instruction.parts, vec![Part::text("steer")]);
    }

    #[tokio::test]
    async fn empty_chat_message_becomes_placeholder() {
        let mock = MockUpstream::ok("ok");
        let app = router(Some("key".to_string()), mock.clone() as Arc<dyn GenerativeClient>);

        let response = app
            .oneshot(post_request(r#"{ "endpointType": "chat" }"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let upstream_request = mock.captured();
        assert_eq!(upstream_request.contents.len(), 1);
        assert_eq!(upstream_request.contents[0].parts, vec![Part::text(" ")]);
    }

    #[tokio::test]
    async fn recommendation_request_builds_single_turn() {
        let mock = MockUpstream::ok("AI SmartSite + Meta Ads|Lead velocity.");
        let app = router(Some("key".to_string()), mock.clone() as Arc<dyn GenerativeClient>);

        let response = app
            .oneshot(post_request(r#"{ "endpointType": "recommendation", "prompt": "pick one" }"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let upstream_request = mock.captured();
        assert_eq!(upstream_request.contents, vec![Content {
            role: Role::User,
            parts: vec![Part::text("pick one")],
        }]);
        assert!(upstream_request.system_instruction.is_none());
    }

    #[tokio::test]
    async fn empty_prompt_falls_back_to_hello() {
        let mock = MockUpstream::ok("ok");
        let app = router(Some("key".to_string()), mock.clone() as Arc<dyn GenerativeClient>);

        app.oneshot(post_request(r#"{ "endpointType": "recommendation" }"#)).await.unwrap();

        let upstream_request = mock.captured();
        assert_eq!(upstream_request.contents[0].parts, vec![Part::text("Hello")]);
    }

    #[tokio::test]
    async fn upstream_status_passes_through() {
        let mock = MockUpstream::failing(UpstreamError::Status {
            code: 429,
            message: "Resource has been exhausted".to_string(),
        });
        let app = router(Some("key".to_string()), mock.clone() as Arc<dyn GenerativeClient>);

        let response = app
            .oneshot(post_request(r#"{ "endpointType": "chat", "message": "hi" }"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Resource has been exhausted");
    }

    #[tokio::test]
    async fn upstream_transport_failure_becomes_502() {
        let mock = MockUpstream::failing(UpstreamError::Transport("connection reset".to_string()));
        let app = router(Some("key".to_string()), mock.clone() as Arc<dyn GenerativeClient>);

        let response = app
            .oneshot(post_request(r#"{ "endpointType": "chat", "message": "hi" }"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Backend Crash:"), "unexpected message: {}", message);
        assert!(message.contains("connection reset"));
    }

    #[tokio::test]
    async fn fixed_generation_parameters_are_attached() {
        let mock = MockUpstream::ok("ok");
        let app = router(Some("key".to_string()), mock.clone() as Arc<dyn GenerativeClient>);

        app.oneshot(post_request(r#"{ "endpointType": "chat", "message": "hi" }"#)).await.unwrap();

        let config = mock.captured().generation_config;
        assert_eq!(config.max_output_tokens, 1000);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }
}
