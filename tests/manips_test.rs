mod common;

use axum::http::{Method, StatusCode};
use manip_api::entities::{equipment_manip, manip};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};

use common::{Catalog, TestApp};

fn manip_body(catalog: &Catalog, begin: &str, end: &str, equipments: &[i32]) -> Value {
    json!({
        "name": "Cell imaging",
        "begin_date": begin,
        "end_date": end,
        "location_id": catalog.location.id,
        "equipments": equipments,
    })
}

/// Seeds reservation R: the microscope from 09:00 to 11:00
async fn reserve_r(app: &TestApp, catalog: &Catalog) -> i64 {
    let response = app
        .post(
            "/api/manips",
            manip_body(
                catalog,
                "2024-01-01 09:00:00",
                "2024-01-01 11:00:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.data()["id"].as_i64().expect("manip id")
}

#[tokio::test]
async fn create_then_get_round_trips_equipment_and_team() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let teammate = app.seed_user("Grace", "grace@example.org").await;

    let mut body = manip_body(
        &catalog,
        "2024-01-01 09:00:00",
        "2024-01-01 11:00:00",
        &[catalog.microscope.id, catalog.centrifuge.id],
    );
    body["team"] = json!([teammate.id]);
    let created = app.post("/api/manips", body).await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.data()["user_id"], app.user.id);

    let id = created.data()["id"].as_i64().unwrap();
    let fetched = app.get(&format!("/api/manips/{}", id)).await;
    assert_eq!(fetched.status, StatusCode::OK);
    let data = fetched.data();
    assert_eq!(data["name"], "Cell imaging");
    assert_eq!(data["begin_date"], "2024-01-01 09:00:00");
    assert_eq!(data["end_date"], "2024-01-01 11:00:00");
    assert_eq!(data["equipments"].as_array().unwrap().len(), 2);
    assert_eq!(data["team"][0]["id"], teammate.id);
    assert!(data["team"][0].get("password_hash").is_none());
}

#[tokio::test]
async fn partial_overlap_is_rejected_naming_the_equipment() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    reserve_r(&app, &catalog).await;

    let response = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 10:00:00",
                "2024-01-01 12:00:00",
                &[catalog.microscope.id],
            ),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let messages = response.field_errors("equipments");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains(&format!("\"Microscope\" (#{})", catalog.microscope.id)));
    assert!(messages[0].contains("2024-01-01 10:00:00 and 2024-01-01 12:00:00"));
}

#[tokio::test]
async fn window_before_existing_reservation_is_accepted() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    reserve_r(&app, &catalog).await;

    let response = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 07:00:00",
                "2024-01-01 08:30:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
}

#[tokio::test]
async fn containing_window_is_rejected() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    reserve_r(&app, &catalog).await;

    let response = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 08:00:00",
                "2024-01-01 12:00:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!response.field_errors("equipments").is_empty());
}

#[tokio::test]
async fn back_to_back_and_disjoint_equipment_are_accepted() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    reserve_r(&app, &catalog).await;

    let adjacent = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 11:00:00",
                "2024-01-01 12:00:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    assert_eq!(adjacent.status, StatusCode::CREATED, "{}", adjacent.body);

    let other_equipment = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 09:00:00",
                "2024-01-01 11:00:00",
                &[catalog.centrifuge.id],
            ),
        )
        .await;
    assert_eq!(other_equipment.status, StatusCode::CREATED);
}

#[tokio::test]
async fn updating_a_manip_does_not_conflict_with_itself() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let id = reserve_r(&app, &catalog).await;

    let mut body = manip_body(
        &catalog,
        "2024-01-01 09:30:00",
        "2024-01-01 11:30:00",
        &[catalog.microscope.id],
    );
    body["name"] = json!("Cell imaging, extended");
    let response = app.put(&format!("/api/manips/{}", id), body).await;

    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.data()["end_date"], "2024-01-01 11:30:00");
    assert_eq!(response.data()["name"], "Cell imaging, extended");
}

#[tokio::test]
async fn update_into_another_reservation_is_rejected() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    reserve_r(&app, &catalog).await;

    let later = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 13:00:00",
                "2024-01-01 14:00:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    let later_id = later.data()["id"].as_i64().unwrap();

    let response = app
        .put(
            &format!("/api/manips/{}", later_id),
            manip_body(
                &catalog,
                "2024-01-01 10:30:00",
                "2024-01-01 14:00:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!response.field_errors("equipments").is_empty());
}

#[tokio::test]
async fn owner_in_team_is_rejected_even_with_other_errors() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let mut body = manip_body(
        &catalog,
        "2024-01-01 06:00:00",
        "2024-01-01 11:00:00",
        &[catalog.microscope.id],
    );
    body["team"] = json!([app.user.id]);
    let response = app.post("/api/manips", body).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.field_errors("team").len(), 1);
    assert_eq!(response.field_errors("begin_date").len(), 1);
}

#[tokio::test]
async fn explicit_owner_is_checked_against_the_team() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let colleague = app.seed_user("Grace", "grace@example.org").await;

    let mut body = manip_body(
        &catalog,
        "2024-01-01 09:00:00",
        "2024-01-01 11:00:00",
        &[catalog.microscope.id],
    );
    body["user_id"] = json!(colleague.id);
    body["team"] = json!([colleague.id]);
    let rejected = app.post("/api/manips", body.clone()).await;
    assert_eq!(rejected.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!rejected.field_errors("team").is_empty());

    // the caller may sit in the team of a manip owned by someone else
    body["team"] = json!([app.user.id]);
    let accepted = app.post("/api/manips", body).await;
    assert_eq!(accepted.status, StatusCode::CREATED, "{}", accepted.body);
    assert_eq!(accepted.data()["user_id"], colleague.id);
}

#[tokio::test]
async fn operating_hours_are_inclusive_of_seven_and_nineteen() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let full_day = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-02 07:00:00",
                "2024-01-02 19:00:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    assert_eq!(full_day.status, StatusCode::CREATED, "{}", full_day.body);

    let late = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-03 18:00:00",
                "2024-01-03 19:01:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    assert_eq!(late.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        late.field_errors("end_date"),
        vec!["The end date (2024-01-03 19:01:00) must be between 07:00 and 19:00.".to_string()]
    );
}

#[tokio::test]
async fn end_must_follow_begin() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let response = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 11:00:00",
                "2024-01-01 11:00:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.field_errors("end_date"),
        vec!["The end date must be a date after the begin date.".to_string()]
    );
}

#[tokio::test]
async fn validation_failures_render_a_field_map() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let response = app
        .post(
            "/api/manips",
            json!({
                "begin_date": "not a date",
                "end_date": "2024-01-01 11:00:00",
                "location_id": 9999,
                "equipments": [catalog.microscope.id, 4242],
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "Unprocessable Entity");
    assert!(response.body["timestamp"].is_string());
    assert!(!response.field_errors("name").is_empty());
    assert!(!response.field_errors("begin_date").is_empty());
    assert_eq!(
        response.field_errors("location_id"),
        vec!["The selected location (9999) is invalid.".to_string()]
    );
    assert_eq!(response.field_errors("equipments").len(), 1);
}

#[tokio::test]
async fn empty_equipment_list_is_rejected() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let response = app
        .post(
            "/api/manips",
            manip_body(&catalog, "2024-01-01 09:00:00", "2024-01-01 11:00:00", &[]),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!response.field_errors("equipments").is_empty());
}

#[tokio::test]
async fn non_operational_equipment_cannot_be_reserved() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let retired = app
        .put(
            &format!("/api/equipments/{}", catalog.spectrometer.id),
            json!({
                "name": "Spectrometer",
                "equipment_group_id": catalog.spectrometer.equipment_group_id,
                "operational": false,
            }),
        )
        .await;
    assert_eq!(retired.status, StatusCode::OK, "{}", retired.body);

    let response = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 09:00:00",
                "2024-01-01 11:00:00",
                &[catalog.spectrometer.id],
            ),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.field_errors("equipments")[0].contains("not operational"));
}

#[tokio::test]
async fn weekly_recurrence_creates_every_occurrence() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let mut body = manip_body(
        &catalog,
        "2024-01-01 09:00:00",
        "2024-01-01 11:00:00",
        &[catalog.microscope.id],
    );
    body["recurrence"] = json!({ "frequency": "weekly", "occurrences": 3 });
    let response = app.post("/api/manips", body).await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let created = response.data().as_array().expect("list of occurrences");
    let begins: Vec<&str> = created
        .iter()
        .map(|m| m["begin_date"].as_str().unwrap())
        .collect();
    assert_eq!(
        begins,
        vec![
            "2024-01-01 09:00:00",
            "2024-01-08 09:00:00",
            "2024-01-15 09:00:00"
        ]
    );
}

#[tokio::test]
async fn recurrence_conflict_creates_nothing() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    // blocks the third daily occurrence
    let blocker = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-03 10:00:00",
                "2024-01-03 10:30:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    assert_eq!(blocker.status, StatusCode::CREATED);

    let mut body = manip_body(
        &catalog,
        "2024-01-01 09:00:00",
        "2024-01-01 11:00:00",
        &[catalog.microscope.id],
    );
    body["recurrence"] = json!({ "frequency": "daily", "occurrences": 5 });
    let response = app.post("/api/manips", body).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let messages = response.field_errors("equipments");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].ends_with("Occurrence 3 of 5 failed; later occurrences were not attempted."));

    let stored = manip::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count manips");
    assert_eq!(stored, 1);
    let links = equipment_manip::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count links");
    assert_eq!(links, 1);
}

#[tokio::test]
async fn recurrence_bounds_are_enforced() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    for occurrences in [0, 1000] {
        let mut body = manip_body(
            &catalog,
            "2024-01-01 09:00:00",
            "2024-01-01 11:00:00",
            &[catalog.microscope.id],
        );
        body["recurrence"] = json!({ "frequency": "daily", "occurrences": occurrences });
        let response = app.post("/api/manips", body).await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!response.field_errors("recurrence").is_empty());
    }
}

#[tokio::test]
async fn recurrence_past_the_last_calendar_day_is_rejected() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let mut body = manip_body(
        &catalog,
        "+262142-12-31 09:00:00",
        "+262142-12-31 10:00:00",
        &[catalog.microscope.id],
    );
    body["recurrence"] = json!({ "frequency": "daily", "occurrences": 2 });
    let response = app.post("/api/manips", body).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY, "{}", response.body);
    assert_eq!(
        response.field_errors("recurrence"),
        vec!["The recurrence extends past the last supported date.".to_string()]
    );
    let stored = manip::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count manips");
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn calendar_filter_returns_overlapping_manips() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    reserve_r(&app, &catalog).await;
    let next_day = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-02 09:00:00",
                "2024-01-02 10:00:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    assert_eq!(next_day.status, StatusCode::CREATED);

    let all = app.get("/api/manips").await;
    assert_eq!(all.data().as_array().unwrap().len(), 2);

    let first_day = app
        .get("/api/manips?from=2024-01-01%2000:00:00&to=2024-01-02%2000:00:00")
        .await;
    assert_eq!(first_day.status, StatusCode::OK);
    let manips = first_day.data().as_array().unwrap();
    assert_eq!(manips.len(), 1);
    assert_eq!(manips[0]["begin_date"], "2024-01-01 09:00:00");

    let bad = app.get("/api/manips?from=yesterday").await;
    assert_eq!(bad.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!bad.field_errors("from").is_empty());
}

#[tokio::test]
async fn user_manips_include_team_memberships() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let colleague = app.seed_user("Grace", "grace@example.org").await;
    let stranger = app.seed_user("Alan", "alan@example.org").await;

    reserve_r(&app, &catalog).await;
    let mut shared = manip_body(
        &catalog,
        "2024-01-01 13:00:00",
        "2024-01-01 14:00:00",
        &[catalog.centrifuge.id],
    );
    shared["team"] = json!([colleague.id]);
    assert_eq!(app.post("/api/manips", shared).await.status, StatusCode::CREATED);

    let colleague_token = app.token_for(&colleague);
    let theirs = app
        .request(Method::GET, "/api/manips/user", None, Some(&colleague_token))
        .await;
    assert_eq!(theirs.status, StatusCode::OK);
    assert_eq!(theirs.data().as_array().unwrap().len(), 1);

    let mine = app.get("/api/manips/user").await;
    assert_eq!(mine.data().as_array().unwrap().len(), 2);

    let stranger_token = app.token_for(&stranger);
    let none = app
        .request(Method::GET, "/api/manips/user", None, Some(&stranger_token))
        .await;
    assert!(none.data().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_manip_frees_its_equipment() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;
    let id = reserve_r(&app, &catalog).await;

    let deleted = app.delete(&format!("/api/manips/{}", id)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.get(&format!("/api/manips/{}", id)).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.delete(&format!("/api/manips/{}", id)).await.status,
        StatusCode::NOT_FOUND
    );

    let rebooked = app
        .post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 10:00:00",
                "2024-01-01 12:00:00",
                &[catalog.microscope.id],
            ),
        )
        .await;
    assert_eq!(rebooked.status, StatusCode::CREATED);
}

#[tokio::test]
async fn manip_routes_require_a_token() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/manips", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"]["code"], "AUTH_MISSING");

    let forged = app
        .request(Method::GET, "/api/manips", None, Some("not-a-jwt"))
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn concurrent_overlapping_creates_commit_once() {
    let app = TestApp::with_pool_size(2).await;
    let catalog = app.seed_catalog().await;

    let first = manip_body(
        &catalog,
        "2024-01-01 09:00:00",
        "2024-01-01 11:00:00",
        &[catalog.microscope.id],
    );
    let second = manip_body(
        &catalog,
        "2024-01-01 10:00:00",
        "2024-01-01 12:00:00",
        &[catalog.microscope.id],
    );
    let (a, b) = tokio::join!(
        app.post("/api/manips", first),
        app.post("/api/manips", second)
    );

    let mut statuses = vec![a.status.as_u16(), b.status.as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, vec![201, 422], "{} / {}", a.body, b.body);
    let loser = if a.status == StatusCode::CREATED { &b } else { &a };
    assert!(loser.field_errors("equipments")[0].contains("\"Microscope\" (#"));

    let stored = manip::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count manips");
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn concurrent_creates_on_disjoint_equipment_both_commit() {
    let app = TestApp::with_pool_size(2).await;
    let catalog = app.seed_catalog().await;

    let (a, b) = tokio::join!(
        app.post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 09:00:00",
                "2024-01-01 11:00:00",
                &[catalog.microscope.id],
            ),
        ),
        app.post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 09:00:00",
                "2024-01-01 11:00:00",
                &[catalog.spectrometer.id],
            ),
        )
    );
    assert_eq!(a.status, StatusCode::CREATED, "{}", a.body);
    assert_eq!(b.status, StatusCode::CREATED, "{}", b.body);

    let stored = manip::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count manips");
    assert_eq!(stored, 2);
}

#[tokio::test]
async fn concurrent_update_and_create_cannot_double_book() {
    let app = TestApp::with_pool_size(2).await;
    let catalog = app.seed_catalog().await;
    let r = reserve_r(&app, &catalog).await;

    // moves R onto 13:00-14:00 while another request claims the same slot
    let path = format!("/api/manips/{}", r);
    let (moved, created) = tokio::join!(
        app.put(
            &path,
            manip_body(
                &catalog,
                "2024-01-01 13:00:00",
                "2024-01-01 14:00:00",
                &[catalog.microscope.id],
            ),
        ),
        app.post(
            "/api/manips",
            manip_body(
                &catalog,
                "2024-01-01 13:30:00",
                "2024-01-01 14:30:00",
                &[catalog.microscope.id],
            ),
        )
    );

    let succeeded = [moved.status, created.status]
        .iter()
        .filter(|s| s.is_success())
        .count();
    assert_eq!(succeeded, 1, "{} / {}", moved.body, created.body);
}
