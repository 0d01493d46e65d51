use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

use common::{body_json, delete, get, post_json};

async fn create_session(app: &Router, body: Value) -> (String, Value) {
    let response = app
        .clone()
        .oneshot(post_json("/api/sessions", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let id = body["data"]["sessionId"].as_str().unwrap().to_string();
    (id, body["data"]["snapshot"].clone())
}

async fn act(app: &Router, id: &str, action: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(post_json(&format!("/api/sessions/{id}/actions"), action))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = common::create_test_app();

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["vocabSource"], "fallback");

    let response = app.clone().oneshot(get("/health/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/health/info")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["service"], "tango-backend");
    assert_eq!(body["autoAdvanceMs"], 0);
}

#[tokio::test]
async fn test_vocab_serves_fallback_without_credentials() {
    let app = common::create_test_app();

    let response = app.oneshot(get("/api/vocab")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let list = body["vocabList"].as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[0]["headword"], "家族");
    assert_eq!(body["levels"], json!(["N5", "N4"]));
}

#[tokio::test]
async fn test_vocab_reads_configured_source() {
    let app = common::create_test_app_with(common::six_words());

    let body = body_json(app.oneshot(get("/api/vocab")).await.unwrap()).await;
    assert_eq!(body["vocabList"].as_array().unwrap().len(), 6);
    assert_eq!(body["vocabList"][0]["reading"], "かぞく");
    assert_eq!(body["levels"], json!(["N4", "N5"]));
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let app = common::create_test_app();

    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_session_starts_in_list_mode() {
    let app = common::create_test_app();
    let (id, snapshot) = create_session(&app, json!({ "seed": 7 })).await;

    assert_eq!(snapshot["mode"], "list");
    assert_eq!(snapshot["profile"], "default");
    assert_eq!(snapshot["filter"], "all");
    assert_eq!(snapshot["list"].as_array().unwrap().len(), 3);
    assert_eq!(snapshot["canStartQuiz"], false);
    assert_eq!(snapshot["quizLength"], 10);

    let response = app
        .oneshot(get(&format!("/api/sessions/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["mode"], "list");
}

#[tokio::test]
async fn test_quiz_needs_four_words() {
    let app = common::create_test_app();
    let (id, _) = create_session(&app, json!({})).await;

    let (status, body) = act(&app, &id, json!({ "type": "startQuiz" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_action_invalid_for_mode_conflicts() {
    let app = common::create_test_app();
    let (id, _) = create_session(&app, json!({})).await;

    let (status, body) = act(&app, &id, json!({ "type": "flipCard" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_malformed_action_is_rejected() {
    let app = common::create_test_app();
    let (id, _) = create_session(&app, json!({})).await;

    let (status, body) = act(&app, &id, json!({ "type": "teleport" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unsupported_quiz_length_is_rejected() {
    let app = common::create_test_app();

    let response = app
        .oneshot(post_json("/api/sessions", json!({ "quizLength": 12 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quiz_answer_then_leave_requires_confirmation() {
    let app = common::create_test_app_with(common::six_words());
    let (id, _) = create_session(&app, json!({ "seed": 3, "quizLength": 5 })).await;

    let (status, body) = act(&app, &id, json!({ "type": "startQuiz" })).await;
    assert_eq!(status, StatusCode::OK);
    let quiz = &body["data"]["snapshot"]["quiz"];
    assert_eq!(quiz["batchLen"], 5);
    let question = &quiz["question"];
    assert_eq!(question["options"].as_array().unwrap().len(), 4);
    assert!(question["correctIndex"].is_null());

    let (status, body) = act(&app, &id, json!({ "type": "selectOption", "index": 0 })).await;
    assert_eq!(status, StatusCode::OK);
    let outcome = &body["data"]["outcome"];
    assert_eq!(outcome["kind"], "quizAnswered");
    assert!(outcome["correctIndex"].is_u64());
    assert_eq!(body["data"]["snapshot"]["quiz"]["total"], 1);

    let (status, _) = act(&app, &id, json!({ "type": "selectOption", "index": 1 })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = act(&app, &id, json!({ "type": "showList" })).await;
    assert_eq!(body["data"]["outcome"]["kind"], "confirmRequired");
    assert_eq!(body["data"]["outcome"]["pending"]["type"], "showList");
    assert_eq!(body["data"]["snapshot"]["mode"], "quiz");

    let (_, body) = act(&app, &id, json!({ "type": "confirmLeave" })).await;
    assert_eq!(body["data"]["outcome"]["kind"], "updated");
    assert_eq!(body["data"]["snapshot"]["mode"], "list");
}

#[tokio::test]
async fn test_review_grade_updates_progress() {
    let app = common::create_test_app();
    let (id, _) = create_session(&app, json!({ "profile": "mika", "seed": 1 })).await;

    let (_, body) = act(&app, &id, json!({ "type": "startReview" })).await;
    let card = &body["data"]["snapshot"]["review"]["card"];
    let headword = card["headword"].as_str().unwrap().to_string();
    assert!(card["reading"].is_null());

    let (status, body) = act(&app, &id, json!({ "type": "grade", "remembered": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"]["kind"], "reviewGraded");
    assert_eq!(body["data"]["snapshot"]["stats"]["xp"], 10);

    let response = app
        .clone()
        .oneshot(get("/api/progress?profile=mika"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["profile"], "mika");
    assert_eq!(body["data"]["mastery"][headword.as_str()], 1);
    assert_eq!(body["data"]["stats"]["xp"], 10);

    let body = body_json(app.oneshot(get("/api/progress")).await.unwrap()).await;
    assert_eq!(body["data"]["stats"]["xp"], 0);
}

#[tokio::test]
async fn test_sessions_sharing_a_profile_accumulate_progress() {
    let app = common::create_test_app_with(common::FixedSource::new(&[("家族", "かぞく", "家人", "N5")]));
    let (first, _) = create_session(&app, json!({ "seed": 1 })).await;
    let (second, _) = create_session(&app, json!({ "seed": 2 })).await;

    for id in [&first, &second] {
        act(&app, id, json!({ "type": "startReview" })).await;
        let (status, _) = act(&app, id, json!({ "type": "grade", "remembered": true })).await;
        assert_eq!(status, StatusCode::OK);
    }

    let body = body_json(app.oneshot(get("/api/progress")).await.unwrap()).await;
    assert_eq!(body["data"]["mastery"]["家族"], 2);
    assert_eq!(body["data"]["stats"]["xp"], 20);
    assert_eq!(body["data"]["stats"]["todayCount"], 2);
}

#[tokio::test]
async fn test_level_filter_narrows_list() {
    let app = common::create_test_app_with(common::six_words());
    let (id, _) = create_session(&app, json!({})).await;

    let (_, body) = act(&app, &id, json!({ "type": "setFilter", "level": "N4" })).await;
    let snapshot = &body["data"]["snapshot"];
    assert_eq!(snapshot["filter"], "N4");
    assert_eq!(snapshot["filteredCount"], 2);
    assert_eq!(snapshot["canStartQuiz"], false);
}

#[tokio::test]
async fn test_delete_session() {
    let app = common::create_test_app();
    let (id, _) = create_session(&app, json!({})).await;

    let response = app
        .clone()
        .oneshot(delete(&format!("/api/sessions/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["deleted"], true);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/sessions/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(delete(&format!("/api/sessions/{id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_garbage_session_id_is_not_found() {
    let app = common::create_test_app();
    let response = app.oneshot(get("/api/sessions/not-a-uuid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
