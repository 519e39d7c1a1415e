use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use ir_core::Index;
use serde_json::Value;
use server::{build_app, ServerConfig};
use tower::ServiceExt;

const TOKEN: &str = "secret";

fn tiny_app() -> Router {
    let mut index = Index::new();
    index.index_corpus([
        ("http://example.com/0", "My name is Anders Langballe Jakobsen. This is a test, test."),
        ("http://example.com/1", "This is a unit test for my reverse index implementation"),
    ]);
    build_app(index, ServerConfig { admin_token: Some(TOKEN.into()), cors_allow_origin: None })
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn admin_post(uri: &str, body: &str, token: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .header("X-ADMIN-TOKEN", token)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn search_returns_matching_documents() {
    let app = tiny_app();
    let (status, json) = call(&app, get("/search?q=%28anders%20AND%20langballe%29%20OR%20unit")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 2);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr[0]["doc_id"], 0);
    assert_eq!(arr[1]["url"], "http://example.com/1");
}

#[tokio::test]
async fn search_limits_listed_results() {
    let app = tiny_app();
    let (_, json) = call(&app, get("/search?q=test&k=1")).await;
    assert_eq!(json["total_hits"], 2);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_query_is_a_bad_request() {
    let app = tiny_app();
    let (status, json) = call(&app, get("/search?q=%28anders")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "expected right parenthesis");
}

#[tokio::test]
async fn deeply_nested_query_is_a_bad_request() {
    let app = tiny_app();
    let depth = 10_000;
    let uri = format!("/search?q={}test{}", "%28".repeat(depth), "%29".repeat(depth));
    let (status, json) = call(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "query nests deeper than 256 levels");

    let (status, _) = call(&app, get("/search?q=%28%28test%29%29")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn doc_lookup() {
    let app = tiny_app();
    let (status, json) = call(&app, get("/doc/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["url"], "http://example.com/1");
    assert!(json["length"].as_f64().unwrap() > 0.0);

    let (status, _) = call(&app, get("/doc/7")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_endpoints_require_token() {
    let app = tiny_app();
    let (status, _) = call(&app, admin_post("/index/champions", "", "wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn champions_are_built_on_request() {
    let app = tiny_app();
    let (status, _) = call(&app, get("/champions/anders")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, admin_post("/index/champions?r=5", "", TOKEN)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = call(&app, get("/champions/Anders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["term"], "anders");
    assert_eq!(json["stale"], false);
    assert_eq!(json["champions"][0]["doc_id"], 0);
}

#[tokio::test]
async fn batch_reindex_replaces_postings() {
    let app = tiny_app();
    let batch = r#"[{"url": "http://example.com/2", "text": "fresh anders"}]"#;
    let (status, json) = call(&app, admin_post("/index/batch", batch, TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 3);
    assert_eq!(json["champions_stale"], true);

    let (_, json) = call(&app, get("/search?q=anders")).await;
    assert_eq!(json["total_hits"], 1);
    assert_eq!(json["results"][0]["doc_id"], 2);

    let (_, json) = call(&app, get("/search?q=test")).await;
    assert_eq!(json["total_hits"], 0);
}
