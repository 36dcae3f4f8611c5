mod common;

use axum::http::{Method, StatusCode};
use manip_api::entities::user;
use sea_orm::EntityTrait;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn register_then_login_issues_working_tokens() {
    let app = TestApp::new().await;

    let registered = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(json!({
                "first_name": "Rosalind",
                "last_name": "Franklin",
                "email": "Rosalind@Example.org",
                "password": "photo-fifty-one",
            })),
            None,
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);
    assert_eq!(registered.data()["token_type"], "Bearer");
    assert_eq!(registered.data()["user"]["email"], "rosalind@example.org");
    assert_eq!(registered.data()["user"]["color"], "3f51b5");

    let login = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "rosalind@example.org", "password": "photo-fifty-one" })),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let token = login.data()["access_token"].as_str().unwrap().to_string();

    let others = app
        .request(Method::GET, "/api/users/other-users", None, Some(&token))
        .await;
    assert_eq!(others.status, StatusCode::OK);
    let emails: Vec<&str> = others
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec!["owner@example.org"]);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "owner@example.org", "password": "guess" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"]["code"], "AUTH_INVALID_CREDENTIALS");

    let unknown = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "nobody@example.org", "password": "correct-horse-battery" })),
            None,
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn passwords_are_hashed_and_never_returned() {
    let app = TestApp::new().await;

    let created = app
        .post(
            "/api/users",
            json!({
                "first_name": "Alan",
                "last_name": "Turing",
                "email": "alan@example.org",
                "password": "enigma-machine",
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert!(created.data().get("password").is_none());
    assert!(created.data().get("password_hash").is_none());

    let id = created.data()["id"].as_i64().unwrap() as i32;
    let stored = user::Entity::find_by_id(id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.password_hash.starts_with("$argon2"));
    assert_ne!(stored.password_hash, "enigma-machine");
}

#[tokio::test]
async fn duplicate_emails_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/users",
            json!({
                "first_name": "Copy",
                "last_name": "Cat",
                "email": "OWNER@example.org",
                "password": "another-password",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.field_errors("email"),
        vec!["The email has already been taken.".to_string()]
    );
}

#[tokio::test]
async fn user_update_keeps_password_when_omitted() {
    let app = TestApp::new().await;

    let updated = app
        .put(
            &format!("/api/users/{}", app.user.id),
            json!({
                "first_name": "Renamed",
                "last_name": "Owner",
                "email": "owner@example.org",
            }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.data()["first_name"], "Renamed");

    let login = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "owner@example.org", "password": "correct-horse-battery" })),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn change_color_validates_and_lowercases() {
    let app = TestApp::new().await;

    let changed = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/users/{}/change-color/FF8800", app.user.id),
            None,
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);
    assert_eq!(changed.data()["color"], "ff8800");

    let invalid = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/users/{}/change-color/orange", app.user.id),
            None,
        )
        .await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!invalid.field_errors("color").is_empty());

    let missing = app
        .request_authenticated(Method::PUT, "/api/users/999/change-color/00ff00", None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn preferences_store_an_equipment_selection() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let created = app
        .post(
            "/api/preferences",
            json!({
                "name": "Imaging kit",
                "equipments": [catalog.microscope.id, catalog.spectrometer.id, catalog.microscope.id],
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.data()["user_id"], app.user.id);
    assert_eq!(created.data()["equipments"].as_array().unwrap().len(), 2);
    let id = created.data()["id"].as_i64().unwrap();

    let updated = app
        .put(
            &format!("/api/preferences/{}", id),
            json!({ "name": "Spin kit", "equipments": [catalog.centrifuge.id] }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    let equipments = updated.data()["equipments"].as_array().unwrap();
    assert_eq!(equipments.len(), 1);
    assert_eq!(equipments[0]["id"], catalog.centrifuge.id);

    let mine = app.get("/api/preferences/user").await;
    assert_eq!(mine.data().as_array().unwrap().len(), 1);

    let colleague = app.seed_user("Grace", "grace@example.org").await;
    let token = app.token_for(&colleague);
    let theirs = app
        .request(Method::GET, "/api/preferences/user", None, Some(&token))
        .await;
    assert!(theirs.data().as_array().unwrap().is_empty());

    assert_eq!(
        app.delete(&format!("/api/preferences/{}", id)).await.status,
        StatusCode::NO_CONTENT
    );
}

#[tokio::test]
async fn preference_validation_reports_each_field() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/preferences",
            json!({ "name": "", "user_id": 4040, "equipments": [] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!response.field_errors("name").is_empty());
    assert!(!response.field_errors("equipments").is_empty());
    assert_eq!(
        response.field_errors("user_id"),
        vec!["The selected user (4040) is invalid.".to_string()]
    );
}

#[tokio::test]
async fn deleting_a_user_removes_their_manips() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let colleague = app.seed_user("Grace", "grace@example.org").await;

    let manip = app
        .post(
            "/api/manips",
            json!({
                "name": "Owned by Grace",
                "begin_date": "2024-01-01 09:00:00",
                "end_date": "2024-01-01 10:00:00",
                "location_id": catalog.location.id,
                "user_id": colleague.id,
                "equipments": [catalog.microscope.id],
            }),
        )
        .await;
    assert_eq!(manip.status, StatusCode::CREATED, "{}", manip.body);
    let manip_id = manip.data()["id"].as_i64().unwrap();

    assert_eq!(
        app.delete(&format!("/api/users/{}", colleague.id)).await.status,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        app.get(&format!("/api/manips/{}", manip_id)).await.status,
        StatusCode::NOT_FOUND
    );
}
