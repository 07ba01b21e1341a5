use kidspark::{
    api::{ADMIN_COOKIE, KID_COOKIE},
    progress::{HttpProgressSink, ProgressPatch, ProgressSink, ProgressStatus},
    session::KID_SESSION_TTL,
};
use reqwest::{StatusCode, header::CACHE_CONTROL};
use serde_json::json;

use crate::helpers::{
    ADMIN_PASSWORD, FAMILY_PASSWORD, MINUTE_MS, TestServer, add_kid, cookie_value, json,
    set_cookie_header, spawn_server,
};

/// A server with one family password and one kid, "Mia" (7).
async fn family_server() -> (TestServer, i64, i64) {
    let server = spawn_server().await;
    let credential = server
        .env
        .state
        .credentials
        .create("Family", FAMILY_PASSWORD)
        .await
        .unwrap();
    let kid = add_kid(&server.env, "Mia", 7).await;
    (server, credential.id, kid.id)
}

// ==========================
// HEALTH
// ==========================

#[tokio::test]
async fn test_health() {
    let server = spawn_server().await;
    let response = server.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json(response).await,
        json!({"status": "healthy", "backend": "sqlite"})
    );
}

// ==========================
// ADMIN AUTH
// ==========================

#[tokio::test]
async fn test_admin_login_rejects_bad_passwords() {
    let server = spawn_server().await;

    for body in [json!({"password": "nope"}), json!({"password": ""}), json!({})] {
        let response = server.post("/api/auth/admin/login", None, body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookie_header(&response, ADMIN_COOKIE).is_none());
        assert_eq!(json(response).await, json!({"error": "Invalid password"}));
    }
}

#[tokio::test]
async fn test_admin_login_sets_cookie() {
    let server = spawn_server().await;
    let response = server
        .post(
            "/api/auth/admin/login",
            None,
            json!({ "password": ADMIN_PASSWORD }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CACHE_CONTROL], "no-store");

    let header = set_cookie_header(&response, ADMIN_COOKIE).unwrap();
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("SameSite=Lax"));
    assert!(header.contains("Path=/"));
    assert!(header.contains("Max-Age=86400"));
    let token = cookie_value(&response, ADMIN_COOKIE).unwrap();
    assert_eq!(token.len(), 64);
    assert_eq!(json(response).await, json!({"ok": true}));

    let response = server
        .get("/api/auth/admin/check", Some((ADMIN_COOKIE, &token)))
        .await;
    assert_eq!(json(response).await, json!({"authenticated": true}));
}

#[tokio::test]
async fn test_admin_logout_revokes() {
    let server = spawn_server().await;
    let token = server.admin_login().await;

    let response = server
        .post("/api/auth/admin/logout", Some((ADMIN_COOKIE, &token)), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = set_cookie_header(&response, ADMIN_COOKIE).unwrap();
    assert!(cleared.starts_with("ks_admin=;"));
    assert!(cleared.contains("Max-Age=0"));

    let response = server
        .get("/api/admin/kids", Some((ADMIN_COOKIE, &token)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Logging out without a session still succeeds.
    let response = server.post("/api/auth/admin/logout", None, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_require_admin_session() {
    let (server, _, kid_id) = family_server().await;
    let kid_token = server.kid_login(kid_id, FAMILY_PASSWORD).await;

    for cookie in [None, Some((ADMIN_COOKIE, "bogus")), Some((ADMIN_COOKIE, kid_token.as_str()))] {
        let response = server.get("/api/admin/passwords", cookie).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(response).await, json!({"error": "Unauthorized"}));
    }
}

// ==========================
// ADMIN MANAGEMENT
// ==========================

#[tokio::test]
async fn test_password_management() {
    let server = spawn_server().await;
    let admin = server.admin_login().await;
    let cookie = Some((ADMIN_COOKIE, admin.as_str()));

    let response = server
        .post(
            "/api/admin/passwords",
            cookie,
            json!({"label": "Tablet", "password": FAMILY_PASSWORD}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json(response).await;
    assert_eq!(created["data"]["label"], "Tablet");
    assert!(created["data"].get("password_hash").is_none());

    let response = server
        .post("/api/admin/passwords", cookie, json!({"label": "Tablet"}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json(response).await,
        json!({"error": "label and password required"})
    );

    let listed = json(server.get("/api/admin/passwords", cookie).await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let id = created["data"]["id"].as_i64().unwrap();
    let response = server
        .client
        .delete(server.url(&format!("/api/admin/passwords/{id}")))
        .header(reqwest::header::COOKIE, format!("{ADMIN_COOKIE}={admin}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listed = json(server.get("/api/admin/passwords", cookie).await).await;
    assert_eq!(listed["data"], json!([]));
}

#[tokio::test]
async fn test_kid_management() {
    let server = spawn_server().await;
    let admin = server.admin_login().await;
    let cookie = Some((ADMIN_COOKIE, admin.as_str()));

    let response = server
        .post("/api/admin/kids", cookie, json!({"name": "Mia"}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await, json!({"error": "name and age required"}));

    let response = server
        .post("/api/admin/kids", cookie, json!({"name": "Mia", "age": 30}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .post(
            "/api/admin/kids",
            cookie,
            json!({"name": "Mia", "age": 7, "avatar": "owl"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let kid = json(response).await["data"].clone();
    let id = kid["id"].as_i64().unwrap();
    assert_eq!(kid["avatar"], "owl");

    let response = server
        .client
        .put(server.url(&format!("/api/admin/kids/{id}")))
        .header(reqwest::header::COOKIE, format!("{ADMIN_COOKIE}={admin}"))
        .json(&json!({"age": 8}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["data"]["age"], 8);

    let fetched = json(server.get(&format!("/api/admin/kids/{id}"), cookie).await).await;
    assert_eq!(fetched["data"]["name"], "Mia");
    assert_eq!(fetched["data"]["age"], 8);

    let response = server.get("/api/admin/kids/999", cookie).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(response).await, json!({"error": "Kid not found"}));

    let response = server.get("/api/admin/kids/abc", cookie).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .client
        .delete(server.url(&format!("/api/admin/kids/{id}")))
        .header(reqwest::header::COOKIE, format!("{ADMIN_COOKIE}={admin}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = json(server.get("/api/learn/kids", None).await).await;
    assert_eq!(listed["data"], json!([]));
}

// ==========================
// KID AUTH
// ==========================

#[tokio::test]
async fn test_kid_selector_is_public() {
    let (server, _, kid_id) = family_server().await;
    add_kid(&server.env, "Ada", 4).await;

    let response = server.get("/api/learn/kids", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let kids = json(response).await["data"].clone();
    assert_eq!(kids[0]["name"], "Ada");
    assert_eq!(kids[1]["id"], kid_id);
}

#[tokio::test]
async fn test_verify_error_order() {
    let (server, _, kid_id) = family_server().await;

    let response = server
        .post("/api/auth/verify", None, json!({"password": FAMILY_PASSWORD}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json(response).await,
        json!({"error": "password and kid_id required"})
    );

    // A wrong password is reported even for kids that do not exist.
    let response = server
        .post(
            "/api/auth/verify",
            None,
            json!({"password": "wrong", "kid_id": 999}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(response).await, json!({"error": "Invalid password"}));

    let response = server
        .post(
            "/api/auth/verify",
            None,
            json!({"password": FAMILY_PASSWORD, "kid_id": 999}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(response).await, json!({"error": "Kid not found"}));

    // Neither failure counts as a use of the credential.
    let listed = server.env.state.credentials.list().await.unwrap();
    assert!(listed[0].last_used_at.is_none());

    server.kid_login(kid_id, FAMILY_PASSWORD).await;
    let listed = server.env.state.credentials.list().await.unwrap();
    assert!(listed[0].last_used_at.is_some());
}

#[tokio::test]
async fn test_kid_session_cookie_and_check() {
    let (server, _, kid_id) = family_server().await;

    let response = server
        .post(
            "/api/auth/verify",
            None,
            json!({"password": FAMILY_PASSWORD, "kid_id": kid_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CACHE_CONTROL], "no-store");
    let header = set_cookie_header(&response, KID_COOKIE).unwrap();
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("Max-Age=604800"));
    let token = cookie_value(&response, KID_COOKIE).unwrap();

    let response = server.get("/api/auth/check", Some((KID_COOKIE, &token))).await;
    assert_eq!(
        json(response).await,
        json!({
            "authenticated": true,
            "kid": {"id": kid_id, "name": "Mia", "avatar": null, "age": 7},
        })
    );

    let response = server.get("/api/auth/check", None).await;
    assert_eq!(json(response).await, json!({"authenticated": false}));

    let response = server
        .post("/api/auth/logout", Some((KID_COOKIE, &token)), json!({}))
        .await;
    assert!(
        set_cookie_header(&response, KID_COOKIE)
            .unwrap()
            .contains("Max-Age=0")
    );
    let response = server.get("/api/auth/check", Some((KID_COOKIE, &token))).await;
    assert_eq!(json(response).await, json!({"authenticated": false}));
}

#[tokio::test]
async fn test_kid_session_expires() {
    let (server, _, kid_id) = family_server().await;
    let token = server.kid_login(kid_id, FAMILY_PASSWORD).await;
    let cookie = Some((KID_COOKIE, token.as_str()));

    server
        .env
        .clock
        .advance(KID_SESSION_TTL.as_millis() as i64 - MINUTE_MS);
    assert_eq!(
        server.get("/api/learn/progress", cookie).await.status(),
        StatusCode::OK
    );

    server.env.clock.advance(MINUTE_MS);
    let response = server.get("/api/learn/progress", cookie).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleting_password_ends_its_sessions() {
    let (server, credential_id, kid_id) = family_server().await;
    let other = server
        .env
        .state
        .credentials
        .create("Grandma", "tulip")
        .await
        .unwrap();

    let family_token = server.kid_login(kid_id, FAMILY_PASSWORD).await;
    let grandma_token = server.kid_login(kid_id, "tulip").await;

    let admin = server.admin_login().await;
    let response = server
        .client
        .delete(server.url(&format!("/api/admin/passwords/{credential_id}")))
        .header(reqwest::header::COOKIE, format!("{ADMIN_COOKIE}={admin}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .get("/api/learn/progress", Some((KID_COOKIE, &family_token)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = server
        .get("/api/learn/progress", Some((KID_COOKIE, &grandma_token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .post(
            "/api/auth/verify",
            None,
            json!({"password": FAMILY_PASSWORD, "kid_id": kid_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(server.env.state.credentials.list().await.unwrap()[0].id, other.id);
}

// ==========================
// PROGRESS
// ==========================

#[tokio::test]
async fn test_progress_requires_kid_session() {
    let (server, _, _) = family_server().await;
    let admin = server.admin_login().await;

    let response = server.get("/api/learn/progress", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = server
        .post(
            "/api/learn/progress/10",
            Some((ADMIN_COOKIE, &admin)),
            json!({"status": "in_progress"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_progress_round_trip() {
    let (server, _, kid_id) = family_server().await;
    let token = server.kid_login(kid_id, FAMILY_PASSWORD).await;
    let cookie = Some((KID_COOKIE, token.as_str()));

    let response = server.get("/api/learn/progress/10", cookie).await;
    assert_eq!(json(response).await, json!({"data": null}));

    let response = server
        .post(
            "/api/learn/progress/10",
            cookie,
            json!({"status": "in_progress", "time_spent_seconds": 12,
                   "answers_json": "{\"current_page\":2}"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await, json!({"ok": true}));

    let row = json(server.get("/api/learn/progress/10", cookie).await).await["data"].clone();
    assert_eq!(row["kid_id"], kid_id);
    assert_eq!(row["status"], "in_progress");
    assert_eq!(row["time_spent_seconds"], 12);
    assert_eq!(row["answers_blob"], "{\"current_page\":2}");
    assert_eq!(row["score"], json!(null));

    // Complete, then regress: the completion time survives.
    server
        .post(
            "/api/learn/progress/10",
            cookie,
            json!({"status": "completed", "score": 3, "time_spent_seconds": 40,
                   "completed_at": "ignored"}),
        )
        .await;
    let completed = json(server.get("/api/learn/progress/10", cookie).await).await["data"].clone();
    assert_eq!(completed["status"], "completed");
    assert!(!completed["completed_at"].is_null());

    server.env.clock.advance(MINUTE_MS);
    server
        .post(
            "/api/learn/progress/10",
            cookie,
            json!({"status": "in_progress", "score": null}),
        )
        .await;
    let regressed = json(server.get("/api/learn/progress/10", cookie).await).await["data"].clone();
    assert_eq!(regressed["status"], "in_progress");
    assert_eq!(regressed["score"], 3);
    assert_eq!(regressed["time_spent_seconds"], 0);
    assert_eq!(regressed["completed_at"], completed["completed_at"]);

    server
        .post("/api/learn/progress/5", cookie, json!({"status": "completed"}))
        .await;
    let listed = json(server.get("/api/learn/progress", cookie).await).await["data"].clone();
    let lessons: Vec<i64> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["lesson_id"].as_i64().unwrap())
        .collect();
    assert_eq!(lessons, vec![5, 10]);
}

#[tokio::test]
async fn test_progress_is_scoped_to_session_kid() {
    let (server, _, mia) = family_server().await;
    let leo = add_kid(&server.env, "Leo", 5).await.id;
    let mia_token = server.kid_login(mia, FAMILY_PASSWORD).await;
    let leo_token = server.kid_login(leo, FAMILY_PASSWORD).await;

    server
        .post(
            "/api/learn/progress/10",
            Some((KID_COOKIE, &mia_token)),
            json!({"status": "completed"}),
        )
        .await;

    let response = server
        .get("/api/learn/progress/10", Some((KID_COOKIE, &leo_token)))
        .await;
    assert_eq!(json(response).await, json!({"data": null}));
}

#[tokio::test]
async fn test_progress_rejects_bad_input() {
    let (server, _, kid_id) = family_server().await;
    let token = server.kid_login(kid_id, FAMILY_PASSWORD).await;
    let cookie = Some((KID_COOKIE, token.as_str()));

    let response = server
        .post("/api/learn/progress/10", cookie, json!({"status": "done"}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await, json!({"error": "Invalid status: done"}));

    let response = server
        .post(
            "/api/learn/progress/10",
            cookie,
            json!({"time_spent_seconds": -5}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/learn/progress/intro", cookie, json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await, json!({"error": "Invalid lesson id"}));

    let response = server
        .client
        .post(server.url("/api/learn/progress/10"))
        .header(reqwest::header::COOKIE, format!("{KID_COOKIE}={token}"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await, json!({"error": "Invalid JSON"}));

    assert!(server.env.state.progress.list(kid_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_kid_ends_sessions() {
    let (server, _, kid_id) = family_server().await;
    let token = server.kid_login(kid_id, FAMILY_PASSWORD).await;
    server.env.state.kids.delete(kid_id).await.unwrap();

    let response = server.get("/api/auth/check", Some((KID_COOKIE, &token))).await;
    assert_eq!(json(response).await, json!({"authenticated": false}));
}

// ==========================
// HTTP PROGRESS SINK
// ==========================

#[tokio::test]
async fn test_http_sink_writes_through_api() {
    let (server, _, kid_id) = family_server().await;
    let token = server.kid_login(kid_id, FAMILY_PASSWORD).await;

    let sink = HttpProgressSink::new(format!("{}/", server.base_url), token);
    sink.send(10, ProgressPatch::completed().with_score(2).with_time_spent(30))
        .await
        .unwrap();

    let row = server
        .env
        .state
        .progress
        .get(kid_id, 10)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, ProgressStatus::Completed);
    assert_eq!(row.score, Some(2));
    assert_eq!(row.time_spent_seconds, 30);

    let stale = HttpProgressSink::new(server.base_url.clone(), "expired");
    let err = stale
        .send(10, ProgressPatch::in_progress())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("401"));
}
