mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn create_user_success() {
    let app = TestApp::new().await;
    let payload = json!({
        "email": "test@example.com",
        "password": "testpass123",
        "name": "Test Name",
    });

    let resp = app.post_json("/api/users", &payload, None).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body, json!({"email": "test@example.com", "name": "Test Name"}));

    let user = recipe_api::users::repo::find_by_email(&app.db, "test@example.com")
        .await
        .unwrap()
        .expect("user stored");
    assert_ne!(user.password_hash, "testpass123");
}

#[tokio::test]
async fn create_user_with_existing_email_fails() {
    let app = TestApp::new().await;
    app.create_user("test@example.com").await;

    let payload = json!({
        "email": "test@example.com",
        "password": "testpass123",
        "name": "Test Name",
    });
    let resp = app.post_json("/api/users", &payload, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["email"].is_array());
}

#[tokio::test]
async fn create_user_with_short_password_fails() {
    let app = TestApp::new().await;
    let payload = json!({
        "email": "test@example.com",
        "password": "pw",
        "name": "Test Name",
    });

    let resp = app.post_json("/api/users", &payload, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["password"].is_array());
    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 0);
}

#[tokio::test]
async fn create_user_reports_every_missing_field() {
    let app = TestApp::new().await;
    let resp = app.post_json("/api/users", &json!({}), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    for field in ["email", "password", "name"] {
        assert_eq!(body[field][0], "This field is required.");
    }
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;
    let req = axum::http::Request::builder()
        .uri("/api/users")
        .method("POST")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let resp = app.request(req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["non_field_errors"].is_array());
}

#[tokio::test]
async fn token_issued_for_valid_credentials() {
    let app = TestApp::new().await;
    app.create_user("test@example.com").await;

    let payload = json!({"email": "test@example.com", "password": "testpass123"});
    let resp = app.post_json("/api/users/token", &payload, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let token = body["token"].as_str().unwrap().to_string();
    assert!(body["refresh_token"].is_string());

    let resp = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_accepts_uppercase_email_domain() {
    let app = TestApp::new().await;
    app.create_user("test@example.com").await;

    let payload = json!({"email": "test@EXAMPLE.com", "password": "testpass123"});
    let resp = app.post_json("/api/users/token", &payload, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_rejected_for_bad_credentials() {
    let app = TestApp::new().await;
    app.create_user("test@example.com").await;

    let payload = json!({"email": "test@example.com", "password": "badpass"});
    let resp = app.post_json("/api/users/token", &payload, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(
        body["non_field_errors"][0],
        "Unable to authenticate with provided credentials."
    );
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn token_rejected_for_unknown_user_and_blank_password() {
    let app = TestApp::new().await;

    let payload = json!({"email": "nobody@example.com", "password": "testpass123"});
    let resp = app.post_json("/api/users/token", &payload, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let payload = json!({"email": "nobody@example.com"});
    let resp = app.post_json("/api/users/token", &payload, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["password"].is_array());
}

#[tokio::test]
async fn refresh_token_issues_a_new_pair() {
    let app = TestApp::new().await;
    app.create_user("test@example.com").await;

    let payload = json!({"email": "test@example.com", "password": "testpass123"});
    let body = body_json(app.post_json("/api/users/token", &payload, None).await).await;
    let refresh = body["refresh_token"].as_str().unwrap();
    let access = body["token"].as_str().unwrap();

    let resp = app
        .post_json("/api/users/token/refresh", &json!({"refresh_token": refresh}), None)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["token"].is_string());

    // Access tokens cannot be used for refresh.
    let resp = app
        .post_json("/api/users/token/refresh", &json!({"refresh_token": access}), None)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_requires_auth() {
    let app = TestApp::new().await;
    let resp = app.get("/api/users/me", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(resp).await["detail"].is_string());

    let resp = app.get("/api/users/me", Some("garbage")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn retrieve_profile() {
    let app = TestApp::new().await;
    let (_id, token) = app.create_user("test@example.com").await;

    let resp = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({"email": "test@example.com", "name": "Test Name"})
    );
}

#[tokio::test]
async fn post_to_me_is_not_allowed() {
    let app = TestApp::new().await;
    let (_id, token) = app.create_user("test@example.com").await;

    let resp = app.post_json("/api/users/me", &json!({}), Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn update_profile() {
    let app = TestApp::new().await;
    let (id, token) = app.create_user("test@example.com").await;

    let payload = json!({"name": "Updated name", "password": "newpassword123"});
    let resp = app.patch_json("/api/users/me", &payload, Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["name"], "Updated name");

    let user = recipe_api::users::repo::find_by_id(&app.db, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "Updated name");
    let authed = recipe_api::users::repo::authenticate(&app.db, "test@example.com", "newpassword123")
        .await
        .unwrap();
    assert!(authed.is_some());
}

#[tokio::test]
async fn put_profile_requires_every_field() {
    let app = TestApp::new().await;
    let (_id, token) = app.create_user("test@example.com").await;

    let resp = app
        .put_json("/api/users/me", &json!({"name": "Only name"}), Some(&token))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["email"].is_array());
    assert!(body["password"].is_array());
}

#[tokio::test]
async fn deactivated_user_loses_access_with_existing_token() {
    let app = TestApp::new().await;
    let (id, token) = app.create_user("test@example.com").await;
    let resp = app.get("/api/recipes", Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(id)
        .execute(&app.db)
        .await
        .unwrap();

    let resp = app
        .post_json("/api/recipes", &common::recipe_body(json!({})), Some(&token))
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["detail"], "User inactive or deleted.");

    for uri in ["/api/recipes", "/api/tags", "/api/ingredients", "/api/users/me"] {
        let resp = app.get(uri, Some(&token)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
    assert_eq!(app.count("SELECT COUNT(*) FROM recipes").await, 0);
}

#[tokio::test]
async fn deleted_user_token_is_rejected() {
    let app = TestApp::new().await;
    let (id, token) = app.create_user("test@example.com").await;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&app.db)
        .await
        .unwrap();

    let resp = app.get("/api/tags", Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
