use super::*;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let store = SqliteStore::open_in_memory().unwrap();
    router(Arc::new(AppState::new(store)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_token(app, method, uri, body, None).await
}

async fn send_with_token(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn lang_body(name: &str, features: &[&str]) -> Value {
    json!({
        "name": name,
        "description": format!("{} is a programming language", name),
        "imgURL": format!("https://img.example/{}.png", name.to_lowercase()),
        "keyFeatures": features,
        "advantages": ["expressive"],
        "disadvantages": ["learning curve"],
        "designedBy": "Someone",
        "yearCreated": 2000,
        "popularity": 50
    })
}

#[tokio::test]
async fn test_create_returns_saved_record() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/langs", Some(lang_body("python", &["dynamic_typing"]))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Resource created successfully!");

    let saved = &body["data"]["savedLang"];
    assert_eq!(saved["name"], "Python");
    assert_eq!(saved["keyFeatures"], json!(["dynamic_typing"]));
    assert_eq!(saved["yearCreated"], 2000);
    assert!(saved["id"].as_i64().is_some());
}

#[tokio::test]
async fn test_create_duplicate_and_invalid() {
    let app = app();
    send(&app, Method::POST, "/langs", Some(lang_body("Rust", &[]))).await;

    let (status, body) = send(&app, Method::POST, "/langs", Some(lang_body("rust", &[]))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "fail");

    let mut invalid = lang_body("Go", &[]);
    invalid["yearCreated"] = json!(3000);
    let (status, body) = send(&app, Method::POST, "/langs", Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");

    let (status, body) = send(&app, Method::POST, "/langs", Some(json!({"name": "Go"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn test_list_empty_is_not_found_then_projects() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/langs", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": "fail", "message": "Resource not found!"}));

    send(&app, Method::POST, "/langs", Some(lang_body("Rust", &["ownership"]))).await;
    send(&app, Method::POST, "/langs", Some(lang_body("Kotlin", &["null_safety"]))).await;

    let (status, body) = send(&app, Method::GET, "/langs", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["data"]["langsList"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    for item in list {
        let mut keys: Vec<_> = item.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["description", "imgURL", "name"]);
    }
}

#[tokio::test]
async fn test_get_one_normalizes_name() {
    let app = app();

    let (status, _) = send(&app, Method::POST, "/langs", Some(lang_body("Python", &[]))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status_lower, lower) = send(&app, Method::GET, "/langs/python", None).await;
    let (status_upper, upper) = send(&app, Method::GET, "/langs/Python", None).await;
    assert_eq!(status_lower, StatusCode::OK);
    assert_eq!(status_upper, StatusCode::OK);
    assert_eq!(lower, upper);
    assert_eq!(lower["data"]["lang"]["name"], "Python");

    let (status, body) = send(&app, Method::GET, "/langs/cobol", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Resource not found!");
}

#[tokio::test]
async fn test_get_one_returns_expanded_relations() {
    // areas and techs have no HTTP surface; seed them through the store
    let store = SqliteStore::open_in_memory().unwrap();
    let web = store.insert_area("Web", "Web development").unwrap();
    let django = store.insert_tech("Django", "Web framework").unwrap();
    let state = Arc::new(AppState::new(store));
    let app = router(state);

    let mut body = lang_body("Python", &[]);
    body["areas"] = json!([web.id]);
    body["techs"] = json!([django.id]);
    let (status, created) = send(&app, Method::POST, "/langs", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["savedLang"]["areas"], json!([web.id]));

    let (status, body) = send(&app, Method::GET, "/langs/python", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lang"]["areas"][0]["name"], "Web");
    assert_eq!(body["data"]["lang"]["techs"][0]["name"], "Django");

    let mut dangling = lang_body("Ruby", &[]);
    dangling["techs"] = json!([999]);
    let (status, _) = send(&app, Method::POST, "/langs", Some(dangling)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_partial() {
    let app = app();
    send(&app, Method::POST, "/langs", Some(lang_body("Ruby", &["blocks"]))).await;

    let (status, body) = send(&app, Method::PATCH, "/langs/ruby", Some(json!({"popularity": 99}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Resource updated successfully!");
    let updated = &body["data"]["updatedlang"];
    assert_eq!(updated["popularity"], 99.0);
    assert_eq!(updated["keyFeatures"], json!(["blocks"]));
    assert_eq!(updated["yearCreated"], 2000);
    assert_eq!(updated["description"], "Ruby is a programming language");

    let (status, body) = send(&app, Method::PATCH, "/langs/ruby", Some(json!({"popularity": -1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");

    let (status, _) = send(&app, Method::PATCH, "/langs/ruby", Some(json!({"yearCreated": "old"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::PATCH, "/langs/perl", Some(json!({"popularity": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Resource not found!");
}

#[tokio::test]
async fn test_delete_then_delete_again() {
    let app = app();
    send(&app, Method::POST, "/langs", Some(lang_body("Elixir", &[]))).await;

    let (status, body) = send(&app, Method::DELETE, "/langs/elixir", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(body["message"].as_str().unwrap().contains("Elixir"));
    assert!(body.get("data").is_none());

    let (status, body) = send(&app, Method::DELETE, "/langs/elixir", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], routes::DELETE_NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn test_filter_by_features() {
    let app = app();
    send(&app, Method::POST, "/langs", Some(lang_body("Rust", &["pattern_matching", "ownership"]))).await;
    send(&app, Method::POST, "/langs", Some(lang_body("Kotlin", &["null-safety"]))).await;
    send(&app, Method::POST, "/langs", Some(lang_body("C", &["pointers"]))).await;

    let (status, body) = send(&app, Method::GET, "/langs?tags=pattern-matching+null-safety", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["data"]["languages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Rust", "Kotlin"]);
    // raw records, not projections
    assert!(body["data"]["languages"][0].get("keyFeatures").is_some());

    let (status, body) = send(&app, Method::GET, "/langs?tags=gc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["languages"], json!([]));
}

#[tokio::test]
async fn test_filter_rejects_bad_tags() {
    let app = app();

    for uri in ["/langs?tags=", "/langs?tags=a&tags=b", "/langs?tags=+"] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["message"], routes::TAGS_MESSAGE);
    }
}

#[tokio::test]
async fn test_repeated_calls_are_stable() {
    let app = app();
    send(&app, Method::POST, "/langs", Some(lang_body("Haskell", &[]))).await;

    let first = send(&app, Method::GET, "/langs/haskell", None).await;
    let second = send(&app, Method::GET, "/langs/haskell", None).await;
    assert_eq!(first, second);

    let first = send(&app, Method::GET, "/langs", None).await;
    let second = send(&app, Method::GET, "/langs", None).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unknown_route_and_method_use_envelope() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");

    let (status, body) = send(&app, Method::PUT, "/langs", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status"], "fail");

    // %FF does not decode to UTF-8
    for method in [Method::GET, Method::DELETE] {
        let (status, body) = send(&app, method, "/langs/%FF", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert!(body["message"].is_string());
    }
    let (status, body) = send(&app, Method::PATCH, "/langs/%FF", Some(json!({"popularity": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn test_rename_onto_existing_name_conflicts() {
    let app = app();
    send(&app, Method::POST, "/langs", Some(lang_body("Java", &[]))).await;
    send(&app, Method::POST, "/langs", Some(lang_body("Scala", &[]))).await;

    let (status, body) = send(&app, Method::PATCH, "/langs/scala", Some(json!({"name": "java"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "fail");

    let (status, body) = send(&app, Method::GET, "/langs/scala", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lang"]["name"], "Scala");
}

#[tokio::test]
async fn test_storage_failure_hides_detail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("langdex.db");
    let app = router(Arc::new(AppState::new(SqliteStore::open(&path).unwrap())));

    // Break the schema underneath the running store
    let other = rusqlite::Connection::open(&path).unwrap();
    other.execute_batch("DROP TABLE langs;").unwrap();
    drop(other);

    let (status, body) = send(&app, Method::GET, "/langs", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": "fail", "message": envelope::INTERNAL_MESSAGE}));

    let (status, body) = send(&app, Method::GET, "/langs/rust", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], envelope::INTERNAL_MESSAGE);
}

#[tokio::test]
async fn test_auth_flow() {
    let app = app();
    let credentials = json!({"username": "ada", "password": "analytical engine"});

    let (status, body) = send(&app, Method::POST, "/auth/signup", Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["username"], "ada");

    let (status, _) = send(&app, Method::POST, "/auth/signup", Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::POST, "/auth/login", Some(credentials)).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({"username": "ada", "password": "difference engine"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let change = json!({"currentPassword": "analytical engine", "newPassword": "difference engine"});
    let (status, body) =
        send(&app, Method::PATCH, "/auth/settings/change-password", Some(change.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");

    let (status, _) = send_with_token(
        &app,
        Method::PATCH,
        "/auth/settings/change-password",
        Some(change.clone()),
        Some("not-a-real-token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_with_token(
        &app,
        Method::PATCH,
        "/auth/settings/change-password",
        Some(change),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({"username": "ada", "password": "difference engine"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
