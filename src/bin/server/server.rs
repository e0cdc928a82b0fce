//! HTTP server for digit recognition.

use crate::config::ServerConfig;
use crate::predict::{ErrorResponse, PredictEngine, PredictResponse, SharedEngine};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use digit_ocr::core::DigitError;
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Application state shared across handlers
pub struct AppState {
    engine: SharedEngine,
}

impl AppState {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }
}

#[derive(Serialize)]
struct IndexResponse {
    status: &'static str,
    message: &'static str,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

/// An image pulled out of a request body, still encoded.
enum ImagePayload {
    DataUrl(String),
    Bytes(Bytes),
}

/// What a `/predict` request carried.
struct PredictInput {
    image: Option<ImagePayload>,
    multi: bool,
    received_json: bool,
    files: Vec<String>,
}

/// Run the HTTP server
pub async fn run_server(
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Initializing recognition engine...");
    let engine = PredictEngine::new(&config.engine)?;
    info!(model = engine.model_name(), "Recognition engine initialized successfully");

    let state = Arc::new(AppState::new(Arc::new(engine)));
    let app = build_router(state, config.body_limit);

    // Parse address
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    info!("Server listening on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /                - Status");
    info!("  GET  /health          - Health check");
    info!("  POST /predict         - Digit recognition");
    info!("  POST /api/v1/predict  - Digit recognition (versioned API)");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Builds the router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .route("/api/v1/predict", post(predict_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index_handler() -> Json<IndexResponse> {
    Json(IndexResponse {
        status: "ok",
        message: "Digit recognition API is running",
    })
}

/// Health check endpoint
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Digit recognition endpoint
async fn predict_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    let input = match read_input(request).await {
        Ok(input) => input,
        Err(message) => {
            warn!(request_id = %request_id, error = %message, "Malformed request body");
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response();
        }
    };

    let Some(image) = input.image else {
        warn!(request_id = %request_id, received_json = input.received_json, "Request has no image");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::missing_image(input.received_json, input.files)),
        )
            .into_response();
    };

    info!(request_id = %request_id, multi = input.multi, "Processing predict request");
    let start = Instant::now();

    let result = match &image {
        ImagePayload::DataUrl(data_url) => state.engine.recognize_data_url(data_url, input.multi),
        ImagePayload::Bytes(bytes) => state.engine.recognize_bytes(bytes, input.multi),
    };

    let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    match result {
        Ok(recognition) => {
            let response = PredictResponse::from_recognition(recognition, processing_time_ms);
            info!(
                request_id = %request_id,
                processing_ms = processing_time_ms,
                "Prediction completed"
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let status = status_for(&e);
            error!(request_id = %request_id, error = %e, status = %status, "Prediction failed");
            (status, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
    }
}

fn status_for(error: &DigitError) -> StatusCode {
    if error.is_user_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Extracts the image and `multi` flag from a JSON or multipart body.
///
/// An unparseable JSON body is treated like an empty object, so it surfaces
/// as a missing image rather than a parse error.
async fn read_input(request: Request) -> Result<PredictInput, String> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        let body = Bytes::from_request(request, &())
            .await
            .map_err(|e| format!("Failed to read request body: {e}"))?;
        let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        let image = payload
            .get("image")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(|s| ImagePayload::DataUrl(s.to_string()));
        let multi = payload.get("multi").is_some_and(is_truthy);
        return Ok(PredictInput {
            image,
            multi,
            received_json: true,
            files: Vec::new(),
        });
    }

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| format!("Invalid multipart body: {e}"))?;
        return read_multipart(&mut multipart).await;
    }

    Ok(PredictInput {
        image: None,
        multi: false,
        received_json: false,
        files: Vec::new(),
    })
}

async fn read_multipart(multipart: &mut Multipart) -> Result<PredictInput, String> {
    let mut input = PredictInput {
        image: None,
        multi: false,
        received_json: false,
        files: Vec::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Invalid multipart body: {e}"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            input.files.push(name.clone());
        }
        match name.as_str() {
            "image" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read image field: {e}"))?;
                if !bytes.is_empty() {
                    input.image = Some(ImagePayload::Bytes(bytes));
                }
            }
            "multi" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read multi field: {e}"))?;
                input.multi = is_truthy(&Value::String(text));
            }
            _ => {}
        }
    }

    Ok(input)
}

/// Loose truthiness for the `multi` flag: `true`, non-zero numbers and
/// strings such as `"1"`, `"true"`, `"yes"` or `"on"`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use digit_ocr::core::config::PreprocessConfig;
    use digit_ocr::core::{DigitClassifier, DigitResult};
    use digit_ocr::domain::DigitRecognizer;
    use digit_ocr::processors::Glyph;
    use http_body_util::BodyExt;
    use image::{GrayImage, ImageFormat, Luma};
    use ndarray::Array2;
    use serde_json::json;
    use std::io::Cursor;
    use tower::ServiceExt;

    const BODY_LIMIT: usize = 1024 * 1024;

    /// Labels the i-th glyph of every batch with `i + 3`.
    #[derive(Debug)]
    struct StubClassifier;

    impl DigitClassifier for StubClassifier {
        fn name(&self) -> &str {
            "stub"
        }

        fn classify(&self, glyphs: &[Glyph]) -> DigitResult<Array2<f32>> {
            let mut probs = Array2::<f32>::zeros((glyphs.len(), 10));
            for i in 0..glyphs.len() {
                probs[[i, (i + 3) % 10]] = 1.0;
            }
            Ok(probs)
        }
    }

    #[derive(Debug)]
    struct FailingClassifier;

    impl DigitClassifier for FailingClassifier {
        fn name(&self) -> &str {
            "failing"
        }

        fn classify(&self, _glyphs: &[Glyph]) -> DigitResult<Array2<f32>> {
            Err(DigitError::inference("failing", "session exploded"))
        }
    }

    fn app_with(classifier: Box<dyn DigitClassifier>) -> Router {
        let recognizer = DigitRecognizer::new(classifier, PreprocessConfig::default()).unwrap();
        let engine = Arc::new(PredictEngine::from_recognizer(recognizer));
        build_router(Arc::new(AppState::new(engine)), BODY_LIMIT)
    }

    fn app() -> Router {
        app_with(Box::new(StubClassifier))
    }

    /// PNG with a white bar over each column range on a black background.
    fn drawing_png(bars: &[(u32, u32)]) -> Vec<u8> {
        let mut img = GrayImage::new(60, 30);
        for &(c0, c1) in bars {
            for x in c0..=c1 {
                for y in 5..25 {
                    img.put_pixel(x, y, Luma([255]));
                }
            }
        }
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn data_url(bars: &[(u32, u32)]) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(drawing_png(bars)))
    }

    fn json_request(uri: &str, body: Value) -> Request {
        http::Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(image: &[u8], multi: Option<&str>) -> Request {
        let boundary = "digitboundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"canvas.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(image);
        body.extend_from_slice(b"\r\n");
        if let Some(multi) = multi {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"multi\"\r\n\r\n{multi}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        http::Request::builder()
            .method("POST")
            .uri("/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request {
        http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let (status, body) = send(app(), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_missing_image_json() {
        let (status, body) = send(app(), json_request("/predict", json!({"multi": true}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": "Missing 'image' field", "received_json": true, "files": []})
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_missing_image() {
        let request = http::Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing 'image' field");
    }

    #[tokio::test]
    async fn test_missing_image_without_body() {
        let request = http::Request::builder()
            .method("POST")
            .uri("/predict")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["received_json"], false);
    }

    #[tokio::test]
    async fn test_undecodable_image_is_bad_request() {
        let request = json_request(
            "/predict",
            json!({"image": format!("data:image/png;base64,{}", STANDARD.encode(b"not a png"))}),
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let request = json_request("/predict", json!({"image": "data:image/png;base64,@@@"}));
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_single_digit_json() {
        let request = json_request("/predict", json!({"image": data_url(&[(25, 35)])}));
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], 3);
        assert_eq!(body["confidence"], 1.0);
        assert_eq!(body["success"], true);
        assert_eq!(body["probs"].as_array().unwrap().len(), 10);
        assert!(body["processingTimeMs"].is_number());
    }

    #[tokio::test]
    async fn test_two_digits_become_sequence() {
        let request = json_request(
            "/api/v1/predict",
            json!({"image": data_url(&[(5, 15), (30, 40)])}),
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sequence"], "34");
        assert_eq!(body["numDigits"], 2);
        assert_eq!(body["perDigit"][1], json!({"prediction": 4, "confidence": 1.0}));
    }

    #[tokio::test]
    async fn test_multi_on_blank_canvas() {
        let request = json_request("/predict", json!({"image": data_url(&[]), "multi": true}));
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"prediction": null, "confidence": 0.0, "sequence": "", "perDigit": []})
        );
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let png = drawing_png(&[(25, 35)]);
        let (status, body) = send(app(), multipart_request(&png, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], 3);

        let (status, body) = send(app(), multipart_request(&png, Some("true"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sequence"], "3");
    }

    #[tokio::test]
    async fn test_empty_multipart_upload_is_missing_image() {
        let (status, body) = send(app(), multipart_request(b"", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["received_json"], false);
        assert_eq!(body["files"], json!(["image"]));
    }

    #[tokio::test]
    async fn test_inference_failure_is_internal_error() {
        let request = json_request("/predict", json!({"image": data_url(&[(25, 35)])}));
        let (status, body) = send(app_with(Box::new(FailingClassifier)), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("session exploded"));
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("false")));
        assert!(!is_truthy(&json!("0")));
        assert!(is_truthy(&json!(" ON ")));
    }
}
