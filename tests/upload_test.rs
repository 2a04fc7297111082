use abnt_formatter::config::ServerConfig;
use abnt_formatter::services::formatter::PassthroughFormatter;
use abnt_formatter::{AppState, create_app};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------123456789012345678901234567";
const PDF: &str = "application/pdf";
const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

fn app_with(config: ServerConfig) -> Router {
    let state = AppState {
        formatter: Arc::new(PassthroughFormatter::new(config.processing_delay)),
        config,
    };
    create_app(state)
}

fn app() -> Router {
    app_with(ServerConfig::development())
}

struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    content_type: Option<&'a str>,
    data: &'a [u8],
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{}\"", filename));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn file_part<'a>(filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name: "file",
        filename: Some(filename),
        content_type: Some(content_type),
        data,
    }
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn error_message(response: axum::response::Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    json["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_upload_echoes_renamed_document() {
    let content = b"%PDF-1.7\n\x00\x01\x02binary thesis body\xff";
    let body = multipart_body(&[file_part("thesis.pdf", PDF, content)]);

    let response = app().oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], PDF);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"thesis-abnt.pdf\""
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], &content[..]);
}

#[tokio::test]
async fn test_upload_docx_keeps_mime_type() {
    let content = b"PK\x03\x04word/document.xml";
    let body = multipart_body(&[file_part("tcc final.docx", DOCX, content)]);

    let response = app().oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], DOCX);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"tcc final-abnt.docx\""
    );
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let body = multipart_body(&[Part {
        name: "comment",
        filename: None,
        content_type: None,
        data: b"no file here",
    }]);

    let response = app().oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "No file was uploaded");
}

#[tokio::test]
async fn test_non_multipart_requests_get_json_error() {
    let content_types = [None, Some("application/json"), Some("multipart/form-data")];

    for content_type in content_types {
        let mut builder = Request::builder().method("POST").uri("/api/upload");
        if let Some(value) = content_type {
            builder = builder.header("Content-Type", value);
        }
        let request = builder.body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{:?}", content_type);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json",
            "{:?}",
            content_type
        );
        assert_eq!(error_message(response).await, "No file was uploaded");
    }
}

#[tokio::test]
async fn test_text_field_named_file_is_not_an_upload() {
    let body = multipart_body(&[Part {
        name: "file",
        filename: None,
        content_type: None,
        data: b"just text",
    }]);

    let response = app().oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_field_name_is_missing_file() {
    let body = multipart_body(&[Part {
        name: "document",
        filename: Some("thesis.pdf"),
        content_type: Some(PDF),
        data: b"%PDF",
    }]);

    let response = app().oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "No file was uploaded");
}

#[tokio::test]
async fn test_unsupported_type_is_rejected() {
    let body = multipart_body(&[file_part("image.png", "image/png", b"\x89PNG")]);

    let response = app().oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("image/png"));
}

#[tokio::test]
async fn test_oversized_file_is_rejected() {
    let config = ServerConfig {
        max_file_size: 16,
        ..ServerConfig::development()
    };
    let body = multipart_body(&[file_part("big.pdf", PDF, &[b'x'; 17])]);

    let response = app_with(config).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("at most"));
}

#[tokio::test]
async fn test_file_at_limit_is_accepted() {
    let config = ServerConfig {
        max_file_size: 16,
        ..ServerConfig::development()
    };
    let body = multipart_body(&[file_part("edge.pdf", PDF, &[b'x'; 16])]);

    let response = app_with(config).oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_body_over_transport_limit_is_rejected() {
    let config = ServerConfig {
        max_file_size: 16,
        multipart_overhead: 64,
        ..ServerConfig::development()
    };
    let body = multipart_body(&[file_part("big.pdf", PDF, &[b'x'; 4096])]);

    let response = app_with(config).oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_second_file_is_rejected() {
    let body = multipart_body(&[
        file_part("a.pdf", PDF, b"%PDF-a"),
        file_part("b.pdf", PDF, b"%PDF-b"),
    ]);

    let response = app().oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("Only one file"));
}

#[tokio::test]
async fn test_extra_form_fields_are_ignored() {
    let body = multipart_body(&[
        Part {
            name: "style",
            filename: None,
            content_type: None,
            data: b"abnt",
        },
        file_part("thesis.pdf", PDF, b"%PDF"),
    ]);

    let response = app().oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_path_in_filename_is_stripped() {
    let body = multipart_body(&[file_part("C:\\Users\\ana\\thesis.pdf", PDF, b"%PDF")]);

    let response = app().oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"thesis-abnt.pdf\""
    );
}

#[tokio::test(start_paused = true)]
async fn test_processing_delay_is_applied() {
    let config = ServerConfig {
        processing_delay: Duration::from_millis(2000),
        ..ServerConfig::development()
    };
    let body = multipart_body(&[file_part("thesis.pdf", PDF, b"%PDF")]);

    let started = tokio::time::Instant::now();
    let response = app_with(config).oneshot(upload_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(started.elapsed() >= Duration::from_millis(2000));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let body = multipart_body(&[file_part("thesis.pdf", PDF, b"%PDF")]);
    let mut request = upload_request(body);
    request
        .headers_mut()
        .insert("x-request-id", "req-42".parse().unwrap());

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(!response.headers()["x-request-id"].is_empty());
}

#[tokio::test]
async fn test_cross_origin_requests_are_allowed() {
    let body = multipart_body(&[file_part("thesis.pdf", PDF, b"%PDF")]);
    let mut request = upload_request(body);
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://example.org".parse().unwrap());

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_health_and_validation_rules() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["formatter"], "passthrough");

    let response = app()
        .oneshot(
            Request::get("/api/validation-rules")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["max_file_size"], 10 * 1024 * 1024);
    assert_eq!(json["allowed_mime_types"][0], PDF);
    assert_eq!(json["allowed_mime_types"][1], DOCX);
}

#[tokio::test]
async fn test_openapi_document_lists_upload() {
    let response = app()
        .oneshot(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["paths"]["/api/upload"]["post"].is_object());
}
