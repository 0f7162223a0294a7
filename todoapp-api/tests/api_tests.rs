//! HTTP-level scenarios driven through the router with `oneshot`

mod common;

use axum::http::{Method, StatusCode};
use common::{TestContext, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new().await;
    let response = ctx.request(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["database"], "connected");
    // In-memory test databases run on a single connection
    assert_eq!(response.body["pool"]["total_connections"], 1);
}

#[tokio::test]
async fn test_signup() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post(
            "/v1/users",
            None,
            json!({ "email": "New.User@Example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["email"], "new.user@example.com");
    assert_eq!(response.body["email_verified"], false);
    assert!(response.body.get("password_hash").is_none());
    assert!(response.body.get("email_verification_key").is_none());

    let mail = ctx.mailer.last_to("new.user@example.com").expect("mail");
    assert!(mail.body.contains("http://todo.test/v1/verify-email/"));

    let duplicate = ctx
        .post(
            "/v1/users",
            None,
            json!({ "email": "new.user@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["error"], "conflict");
}

#[tokio::test]
async fn test_signup_validation() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post(
            "/v1/users",
            None,
            json!({ "email": "not-an-email", "password": "short" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "validation_error");
    assert_eq!(response.body["details"].as_array().map(Vec::len), Some(2));

    let malformed = ctx.post("/v1/users", None, json!("just a string")).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["error"], "bad_request");
}

#[tokio::test]
async fn test_signup_login_me_logout() {
    let ctx = TestContext::new().await;
    let id = ctx.signup("flow@example.com").await;

    let wrong = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "flow@example.com", "password": "wrong password" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let unknown = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let login = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "flow@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["account_id"], id.to_string());
    let set_cookie = login.set_cookie().expect("Set-Cookie").to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    let cookie = common::cookie_pair(&set_cookie);

    let me = ctx.get("/v1/auth/me", &cookie).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["id"], id.to_string());
    assert_eq!(me.body["email"], "flow@example.com");
    assert_eq!(me.body["username"], "tester");

    let logout = ctx.post("/v1/auth/logout", Some(&cookie), json!({})).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    assert!(logout.set_cookie().expect("removal cookie").contains("Max-Age=0"));

    let me = ctx.get("/v1/auth/me", &cookie).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.body["error"], "unauthorized");
}

#[tokio::test]
async fn test_missing_or_forged_cookie() {
    let ctx = TestContext::new().await;

    let response = ctx
        .request(Method::GET, "/v1/auth/me", None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let forged = format!("token={}", "ab".repeat(64));
    let response = ctx.get("/v1/auth/me", &forged).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_management() {
    let ctx = TestContext::new().await;
    ctx.signup("devices@example.com").await;
    let laptop = ctx.login("devices@example.com").await;
    let phone = ctx.login("devices@example.com").await;

    let sessions = ctx.get("/v1/auth/sessions", &laptop).await;
    assert_eq!(sessions.status, StatusCode::OK);
    let list = sessions.body.as_array().expect("session list");
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|s| s.get("token").is_none()));

    let closed = ctx.delete("/v1/auth/sessions/others", &laptop).await;
    assert_eq!(closed.status, StatusCode::OK);
    assert_eq!(closed.body["revoked"], 1);

    assert_eq!(
        ctx.get("/v1/auth/me", &phone).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(ctx.get("/v1/auth/me", &laptop).await.status, StatusCode::OK);

    let again = ctx.delete("/v1/auth/sessions/others", &laptop).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_email_verification() {
    let ctx = TestContext::new().await;
    let (_, cookie) = ctx.user("verify@example.com").await;
    let key = ctx.verification_key("verify@example.com");

    let bogus = ctx
        .request(Method::POST, "/v1/verify-email/deadbeef", None, None)
        .await;
    assert_eq!(bogus.status, StatusCode::NOT_FOUND);

    let verified = ctx
        .request(Method::POST, &format!("/v1/verify-email/{key}"), None, None)
        .await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body["message"], "Email verified");

    let me = ctx.get("/v1/auth/me", &cookie).await;
    assert_eq!(me.body["email_verified"], true);

    let reused = ctx
        .request(Method::POST, &format!("/v1/verify-email/{key}"), None, None)
        .await;
    assert_eq!(reused.status, StatusCode::NOT_FOUND);

    let resend = ctx
        .post("/v1/verify-email/resend", Some(&cookie), json!({}))
        .await;
    assert_eq!(resend.status, StatusCode::OK);
    assert_eq!(resend.body["message"], "Already verified");
}

#[tokio::test]
async fn test_resend_verification() {
    let ctx = TestContext::new().await;
    let (_, cookie) = ctx.user("resend@example.com").await;
    let first = ctx.verification_key("resend@example.com");

    let resend = ctx
        .post("/v1/verify-email/resend", Some(&cookie), json!({}))
        .await;
    assert_eq!(resend.status, StatusCode::OK);
    assert_eq!(resend.body["message"], "Verification email sent");

    let second = ctx.verification_key("resend@example.com");
    assert_ne!(first, second);

    // The old key was replaced
    let stale = ctx
        .request(Method::POST, &format!("/v1/verify-email/{first}"), None, None)
        .await;
    assert_eq!(stale.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_update() {
    let ctx = TestContext::new().await;
    let (_, cookie) = ctx.user("profile@example.com").await;

    let updated = ctx
        .put(
            "/v1/users/me",
            &cookie,
            json!({ "name": "Ada", "surname": "Lovelace" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["name"], "Ada");
    assert_eq!(updated.body["surname"], "Lovelace");
    assert_eq!(updated.body["username"], "tester");

    let moved = ctx
        .put("/v1/users/me", &cookie, json!({ "email": "Moved@Example.com" }))
        .await;
    assert_eq!(moved.status, StatusCode::OK);
    assert_eq!(moved.body["email"], "moved@example.com");
    assert_eq!(moved.body["email_verified"], false);
    assert!(ctx.mailer.last_to("moved@example.com").is_some());

    let password = ctx
        .put(
            "/v1/users/me",
            &cookie,
            json!({ "password": "an entirely new passphrase" }),
        )
        .await;
    assert_eq!(password.status, StatusCode::OK);

    let old = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "moved@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "moved@example.com", "password": "an entirely new passphrase" }),
        )
        .await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn test_account_deletion() {
    let ctx = TestContext::new().await;
    let (_, cookie) = ctx.user("leaving@example.com").await;

    let deleted = ctx.delete("/v1/users/me", &cookie).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(deleted.set_cookie().expect("removal cookie").contains("Max-Age=0"));

    assert_eq!(
        ctx.get("/v1/users/me", &cookie).await.status,
        StatusCode::UNAUTHORIZED
    );

    // The address is free again
    ctx.signup("leaving@example.com").await;
}

#[tokio::test]
async fn test_todo_lists_and_tasks() {
    let ctx = TestContext::new().await;
    let (_, cookie) = ctx.user("lists@example.com").await;

    let empty = ctx.get("/v1/todo-lists", &cookie).await;
    assert_eq!(empty.status, StatusCode::NO_CONTENT);

    let created = ctx
        .post("/v1/todo-lists", Some(&cookie), json!({ "title": "Groceries" }))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert!(created.body.get("owner_id").is_none());
    let list_id = created.body["id"].as_str().expect("list id").to_string();

    let lists = ctx.get("/v1/todo-lists?page=1&count=10", &cookie).await;
    assert_eq!(lists.status, StatusCode::OK);
    assert_eq!(lists.body.as_array().map(Vec::len), Some(1));

    let renamed = ctx
        .put(
            &format!("/v1/todo-lists/{list_id}"),
            &cookie,
            json!({ "title": "Weekly groceries" }),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["title"], "Weekly groceries");

    let tasks_uri = format!("/v1/todo-lists/{list_id}/tasks");
    assert_eq!(
        ctx.get(&tasks_uri, &cookie).await.status,
        StatusCode::NO_CONTENT
    );

    let task = ctx
        .post(&tasks_uri, Some(&cookie), json!({ "title": "Milk" }))
        .await;
    assert_eq!(task.status, StatusCode::CREATED);
    assert_eq!(task.body["priority"], 1);
    let task_id = task.body["id"].as_str().expect("task id").to_string();

    let replaced = ctx
        .put(
            &format!("{tasks_uri}/{task_id}"),
            &cookie,
            json!({ "title": "Oat milk", "completed": true, "priority": 3 }),
        )
        .await;
    assert_eq!(replaced.status, StatusCode::OK);
    assert_eq!(replaced.body["title"], "Oat milk");
    assert_eq!(replaced.body["completed"], true);
    assert_eq!(replaced.body["priority"], 3);

    let tasks = ctx.get(&tasks_uri, &cookie).await;
    assert_eq!(tasks.status, StatusCode::OK);
    assert_eq!(tasks.body.as_array().map(Vec::len), Some(1));

    let removed = ctx.delete(&format!("{tasks_uri}/{task_id}"), &cookie).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
    assert_eq!(
        ctx.get(&tasks_uri, &cookie).await.status,
        StatusCode::NO_CONTENT
    );

    let dropped = ctx.delete(&format!("/v1/todo-lists/{list_id}"), &cookie).await;
    assert_eq!(dropped.status, StatusCode::NO_CONTENT);
    assert_eq!(
        ctx.get(&tasks_uri, &cookie).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_lists_are_private() {
    let ctx = TestContext::new().await;
    let (_, alice) = ctx.user("alice@example.com").await;
    let (_, bob) = ctx.user("bob@example.com").await;

    let created = ctx
        .post("/v1/todo-lists", Some(&alice), json!({ "title": "Secret" }))
        .await;
    let list_id = created.body["id"].as_str().expect("list id").to_string();

    assert_eq!(
        ctx.get("/v1/todo-lists", &bob).await.status,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        ctx.put(
            &format!("/v1/todo-lists/{list_id}"),
            &bob,
            json!({ "title": "Mine now" })
        )
        .await
        .status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ctx.post(
            &format!("/v1/todo-lists/{list_id}/tasks"),
            Some(&bob),
            json!({ "title": "sneaky" })
        )
        .await
        .status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ctx.delete(&format!("/v1/todo-lists/{list_id}"), &bob)
            .await
            .status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_list_paging_and_sorting() {
    let ctx = TestContext::new().await;
    let (_, cookie) = ctx.user("pager@example.com").await;
    for title in ["a", "b", "c"] {
        ctx.post("/v1/todo-lists", Some(&cookie), json!({ "title": title }))
            .await;
    }

    let page = ctx
        .get("/v1/todo-lists?page=2&count=2&sort_by=title&order=asc", &cookie)
        .await;
    assert_eq!(page.status, StatusCode::OK);
    let titles: Vec<&str> = page
        .body
        .as_array()
        .expect("lists")
        .iter()
        .filter_map(|l| l["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["c"]);

    let beyond = ctx.get("/v1/todo-lists?page=3&count=2", &cookie).await;
    assert_eq!(beyond.status, StatusCode::NO_CONTENT);

    let bad_column = ctx
        .get("/v1/todo-lists?sort_by=owner_id;drop&order=asc", &cookie)
        .await;
    assert_eq!(bad_column.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_superuser_override() {
    let ctx = TestContext::new().await;
    let (admin_id, admin) = ctx.user("admin@example.com").await;
    let (target_id, target) = ctx.user("target@example.com").await;
    ctx.promote(admin_id).await;

    let read = ctx.get(&format!("/v1/users/{target_id}"), &admin).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body["email"], "target@example.com");

    // Regular users act as themselves whatever id they name
    let own = ctx.get(&format!("/v1/users/{admin_id}"), &target).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["email"], "target@example.com");

    let malformed = ctx.get("/v1/users/42", &admin).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let deleted = ctx.delete(&format!("/v1/users/{target_id}"), &admin).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(deleted.set_cookie().is_none());

    assert_eq!(
        ctx.get("/v1/auth/me", &target).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(ctx.get("/v1/auth/me", &admin).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_lenient_target_policy() {
    let ctx = TestContext::with_vars(&[("STRICT_TARGET_ID", "false")]).await;
    let (admin_id, admin) = ctx.user("admin@example.com").await;
    ctx.promote(admin_id).await;

    let response = ctx.get("/v1/users/42", &admin).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], "admin@example.com");
}

#[tokio::test]
async fn test_custom_cookie_settings() {
    let ctx = TestContext::with_vars(&[
        ("SESSION_COOKIE_NAME", "sid"),
        ("SESSION_COOKIE_SECURE", "false"),
        ("SESSION_COOKIE_SAME_SITE", "Strict"),
    ])
    .await;
    ctx.signup("cookie@example.com").await;

    let login = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "cookie@example.com", "password": PASSWORD }),
        )
        .await;
    let set_cookie = login.set_cookie().expect("Set-Cookie").to_string();
    assert!(set_cookie.starts_with("sid="));
    assert!(!set_cookie.contains("Secure"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let cookie = common::cookie_pair(&set_cookie);
    assert_eq!(ctx.get("/v1/auth/me", &cookie).await.status, StatusCode::OK);
}
