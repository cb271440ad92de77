//! End-to-end request scenarios through the full pipeline, in process.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tonic::Code;
use tower::ServiceExt;
use url_shortener::directory::{MemoryDirectory, UrlDirectory};
use url::Url;
use url_shortener::identity::{DelegateError, GrpcPrivilegeDelegate, IdentityClientConfig};
use url_shortener::middleware::OPERATOR_AUTH_HEADER;

use common::{app, app_with, operator_header, token, valid_bearer, FakeDelegate, APP_SECRET};

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seeded() -> Arc<MemoryDirectory> {
    let directory = Arc::new(MemoryDirectory::new());
    directory.insert("abc123", "https://example.com").await.unwrap();
    directory
}

fn admin_request(method: &str, authorization: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri("/user")
        .header(CONTENT_TYPE, "application/json")
        .header(OPERATOR_AUTH_HEADER, operator_header());
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn scenario_a_redirects_to_resolved_url() {
    let service = app(seeded().await, Arc::new(FakeDelegate::granting()));

    let response = service
        .oneshot(Request::get("/abc123").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "https://example.com");
}

#[tokio::test]
async fn scenario_b_missing_alias_is_wrong_alias() {
    let service = app(seeded().await, Arc::new(FakeDelegate::granting()));

    let response = service
        .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().get(LOCATION).is_none());
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({"status": "Error", "error": "wrong alias"})
    );
}

#[tokio::test]
async fn scenario_c_invalid_credential_is_sanitized() {
    let delegate = Arc::new(FakeDelegate::new(|| {
        Err(DelegateError::InvalidCredential(
            "rpc error: code = InvalidArgument desc = invalid credentials".into(),
        ))
    }));
    let service = app(seeded().await, delegate.clone());

    let response = service
        .oneshot(admin_request(
            "POST",
            Some("Bearer tok"),
            &json!({"email": "a@b.com", "app_id": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(
        json_body(response).await,
        json!({"status": "Error", "error": "Invalid credential"})
    );
    assert_eq!(delegate.tokens(), vec!["Bearer tok".to_string()]);
}

#[tokio::test]
async fn scenario_d_missing_authorization_skips_delegate() {
    let delegate = Arc::new(FakeDelegate::granting());
    let service = app(seeded().await, delegate.clone());

    let response = service
        .oneshot(admin_request(
            "POST",
            None,
            &json!({"email": "a@b.com", "app_id": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"status": "Error", "error": "missing Authorization header"})
    );
    assert_eq!(delegate.calls(), 0);
}

#[tokio::test]
async fn generic_delegate_failure_is_opaque() {
    let delegate = Arc::new(FakeDelegate::new(|| {
        Err(DelegateError::Rpc {
            code: Code::Internal,
            message: "pq: connection refused".into(),
        })
    }));
    let service = app(seeded().await, delegate);

    let response = service
        .oneshot(admin_request(
            "DELETE",
            Some("Bearer tok"),
            &json!({"email": "a@b.com", "app_id": 1}),
        ))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body, json!({"status": "Error", "error": "error"}));
}

/// Accepts connections and never answers on them.
async fn hung_identity_service() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

#[tokio::test]
async fn hung_identity_service_reports_delegate_error() {
    let config = IdentityClientConfig::new(hung_identity_service().await)
        .with_timeout(Duration::from_millis(200))
        .with_retries(1)
        .with_initial_backoff(Duration::from_millis(10));
    let request_timeout = Duration::from_secs(2);
    assert!(config.max_call_duration() < request_timeout);

    let delegate = Arc::new(GrpcPrivilegeDelegate::new(&config).unwrap());
    let service = app_with(seeded().await, delegate, request_timeout);

    let started = Instant::now();
    let response = service
        .oneshot(admin_request(
            "POST",
            Some("Bearer tok"),
            &json!({"email": "a@b.com", "app_id": 1}),
        ))
        .await
        .unwrap();

    assert!(started.elapsed() < request_timeout);
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await, json!({"status": "Error", "error": "error"}));
}

#[tokio::test]
async fn grant_admin_succeeds() {
    let delegate = Arc::new(FakeDelegate::granting());
    let service = app(seeded().await, delegate.clone());

    let response = service
        .oneshot(admin_request(
            "POST",
            Some("Bearer tok"),
            &json!({"email": "a@b.com", "app_id": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "OK"}));
    assert_eq!(delegate.calls(), 1);
}

#[tokio::test]
async fn undecodable_admin_body() {
    let delegate = Arc::new(FakeDelegate::granting());
    let service = app(seeded().await, delegate.clone());

    let request = Request::post("/user")
        .header(CONTENT_TYPE, "application/json")
        .header(OPERATOR_AUTH_HEADER, operator_header())
        .header(AUTHORIZATION, "Bearer tok")
        .body(Body::from("{not json"))
        .unwrap();
    let response = service.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"status": "Error", "error": "failed to decode request"})
    );
    assert_eq!(delegate.calls(), 0);
}

#[tokio::test]
async fn operator_gate_rejects_missing_operator_credentials() {
    let delegate = Arc::new(FakeDelegate::granting());
    let service = app(seeded().await, delegate.clone());

    let request = Request::post("/user")
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, "Bearer tok")
        .body(Body::from(json!({"email": "a@b.com", "app_id": 1}).to_string()))
        .unwrap();
    let response = service.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("www-authenticate"));
    assert_eq!(delegate.calls(), 0);
}

#[tokio::test]
async fn save_then_redirect() {
    let directory = Arc::new(MemoryDirectory::new());
    let service = app(directory.clone(), Arc::new(FakeDelegate::granting()));

    let request = Request::post("/url")
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, valid_bearer())
        .body(Body::from(json!({"url": "https://rust-lang.org"}).to_string()))
        .unwrap();
    let response = service.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "OK");
    let alias = body["alias"].as_str().unwrap().to_string();
    assert_eq!(directory.resolve(&alias).await.unwrap(), "https://rust-lang.org/");

    let response = service
        .oneshot(Request::get(format!("/{alias}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.headers()[LOCATION], "https://rust-lang.org/");
}

#[tokio::test]
async fn saved_url_with_control_characters_still_redirects() {
    let service = app(Arc::new(MemoryDirectory::new()), Arc::new(FakeDelegate::granting()));

    let request = Request::post("/url")
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, valid_bearer())
        .body(Body::from(json!({"url": "https://example.com/a\nb\tc"}).to_string()))
        .unwrap();
    let response = service.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let alias = json_body(response).await["alias"].as_str().unwrap().to_string();

    let response = service
        .oneshot(Request::get(format!("/{alias}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "https://example.com/abc");
}

#[tokio::test]
async fn save_rejects_invalid_url() {
    let service = app(seeded().await, Arc::new(FakeDelegate::granting()));

    let request = Request::post("/url")
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, valid_bearer())
        .body(Body::from(json!({"url": "not a url"}).to_string()))
        .unwrap();
    let response = service.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid url");
}

#[tokio::test]
async fn gate_rejects_expired_token() {
    let directory = seeded().await;
    let service = app(directory.clone(), Arc::new(FakeDelegate::granting()));

    let request = Request::delete("/url/abc123")
        .header(AUTHORIZATION, format!("Bearer {}", token(APP_SECRET, -60)))
        .body(Body::empty())
        .unwrap();
    let response = service.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"status": "Error", "error": "unauthorized"})
    );
    assert!(directory.resolve("abc123").await.is_ok());
}

#[tokio::test]
async fn gate_rejects_foreign_signature() {
    let service = app(seeded().await, Arc::new(FakeDelegate::granting()));

    let request = Request::post("/url")
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {}", token("someone-else", 3600)))
        .body(Body::from(json!({"url": "https://example.org"}).to_string()))
        .unwrap();
    let response = service.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_is_not_idempotent_success() {
    let service = app(seeded().await, Arc::new(FakeDelegate::granting()));

    let delete = || {
        Request::delete("/url/abc123")
            .header(AUTHORIZATION, valid_bearer())
            .body(Body::empty())
            .unwrap()
    };

    let first = service.clone().oneshot(delete()).await.unwrap();
    assert_eq!(json_body(first).await, json!({"status": "OK"}));

    let second = service.oneshot(delete()).await.unwrap();
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(second).await,
        json!({"status": "Error", "error": "wrong alias"})
    );
}

#[tokio::test]
async fn format_extension_is_stripped_before_routing() {
    let service = app(seeded().await, Arc::new(FakeDelegate::granting()));

    let response = service
        .oneshot(Request::get("/abc123.json").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "https://example.com");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let service = app(seeded().await, Arc::new(FakeDelegate::granting()));

    let response = service
        .oneshot(
            Request::get("/abc123")
                .header("x-request-id", "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-me");
}
