use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use filmsearch_core::{IndexStore, Record};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use time::macros::date;
use tower::ServiceExt;

fn tiny_store() -> Arc<IndexStore> {
    let store = IndexStore::default();
    store
        .rebuild(vec![
            Record::new("603", "The Matrix").with_runtime(136).with_vote_average(8.7).with_release_date(date!(1999 - 03 - 30)),
            Record::new("604", "The Matrix Reloaded").with_runtime(138).with_vote_average(7.2).with_release_date(date!(2003 - 05 - 15)),
            Record::new("27205", "Inception").with_runtime(148).with_vote_average(8.8).with_release_date(date!(2010 - 07 - 15)),
        ])
        .unwrap();
    Arc::new(store)
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(t) = token {
        builder = builder.header("X-ADMIN-TOKEN", t);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let app = server::build_app(tiny_store(), None);
    let (status, json) = call(app, get("/search?q=matrix&rows=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 2);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr[0]["record"]["title"], "The Matrix");
    assert_eq!(arr[1]["record"]["title"], "The Matrix Reloaded");
}

#[tokio::test]
async fn search_with_bounds_and_dates() {
    let app = server::build_app(tiny_store(), None);
    let (status, json) = call(app.clone(), get("/search?duration_min=140")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["record"]["title"], "Inception");

    let (_, json) = call(app.clone(), get("/search?release_date_end=2003-05-15")).await;
    assert_eq!(json["total_hits"], 2);

    let (status, _) = call(app, get("/search?release_date_start=yesterday")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn misspelled_search_suggests() {
    let app = server::build_app(tiny_store(), None);
    let (_, json) = call(app, get("/search?q=Matriks")).await;
    assert_eq!(json["total_hits"], 0);
    let suggestions: Vec<&str> = json["suggestions"].as_array().unwrap().iter().filter_map(Value::as_str).collect();
    assert!(suggestions.contains(&"matrix"));
}

#[tokio::test]
async fn autocomplete_and_doc_lookup() {
    let app = server::build_app(tiny_store(), None);
    let (_, json) = call(app.clone(), get("/autocomplete?term=The%20Mat&max=1")).await;
    assert_eq!(json, serde_json::json!(["The Matrix"]));

    let (status, json) = call(app.clone(), get("/doc/27205")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["release_date"], "2010-07-15");

    let (status, _) = call(app, get("/doc/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rebuild_accepts_numeric_and_string_fields() {
    let store = tiny_store();
    let app = server::build_app(store.clone(), Some("secret".into()));

    let body = r#"[
        {"id":"1","title":"Heat","runtime":170,"vote_average":7.9},
        {"id":"2","title":"Alien","runtime":"117","revenue":[1,2]}
    ]"#;
    let (status, json) = call(app.clone(), post_json("/index/rebuild", Some("secret"), body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 2);
    let gen = store.current();
    assert_eq!(gen.lookup("1").and_then(|r| r.runtime), Some(170));
    assert_eq!(gen.lookup("1").and_then(|r| r.vote_average), Some(7.9));
    assert_eq!(gen.lookup("2").and_then(|r| r.runtime), Some(117));
    assert_eq!(gen.lookup("2").and_then(|r| r.revenue), None);

    let (_, json) = call(app, get("/search?duration_min=150")).await;
    assert_eq!(json["results"][0]["record"]["title"], "Heat");
}

#[tokio::test]
async fn rows_default_and_cap_are_applied_by_the_server() {
    let store = IndexStore::default();
    store.rebuild((0..150).map(|i| Record::new(i.to_string(), format!("Film {i}"))).collect()).unwrap();
    let app = server::build_app(Arc::new(store), None);

    let (_, json) = call(app.clone(), get("/search?q=film")).await;
    assert_eq!(json["rows"], 10);
    assert_eq!(json["results"].as_array().unwrap().len(), 10);

    let (_, json) = call(app.clone(), get("/search?q=film&rows=500&page=1")).await;
    assert_eq!(json["rows"], 100);
    assert_eq!(json["total_hits"], 150);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 50);
    assert_eq!(arr[0]["doc_id"], 100);

    let (_, json) = call(app, get("/search?q=film&rows=0")).await;
    assert_eq!(json["rows"], 0);
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_rebuild_and_clear() {
    let store = tiny_store();
    let app = server::build_app(store.clone(), Some("secret".into()));

    let body = r#"[{"id":"1","title":"Heat","runtime":"170","vote_average":"not a number"}]"#;
    let (status, _) = call(app.clone(), post_json("/index/rebuild", None, body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(store.current().num_docs(), 3);

    let (status, json) = call(app.clone(), post_json("/index/rebuild", Some("secret"), body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 1);
    let heat = store.current().lookup("1").cloned().unwrap();
    assert_eq!(heat.runtime, Some(170));
    assert_eq!(heat.vote_average, None);

    let (status, _) = call(app.clone(), post_json("/index/rebuild", Some("secret"), "[]")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(store.current().num_docs(), 1);

    let (status, json) = call(app, post_json("/index/clear", Some("secret"), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 0);
    assert!(store.current().is_empty());
}
