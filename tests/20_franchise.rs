mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{Session, TestApp};

async fn create_franchise(app: &TestApp, admin: &Session, name: &str, admin_email: &str) -> Result<Value> {
    let (status, body) = app
        .request(
            Method::POST,
            "/api/franchise",
            Some(&admin.token),
            Some(json!({ "name": name, "admins": [{ "email": admin_email }] })),
        )
        .await?;
    anyhow::ensure!(status == StatusCode::OK, "create franchise failed: {} {}", status, body);
    Ok(body["data"].clone())
}

#[tokio::test]
async fn only_admins_create_franchises() -> Result<()> {
    let app = TestApp::spawn();
    let diner = app.register("pizza diner", "d@jwt.com", "diner").await?;
    let admin = app.admin("a@jwt.com").await?;

    let (status, _) = app
        .request(Method::POST, "/api/franchise", Some(&diner.token), Some(json!({ "name": "pizzaPocket", "admins": [] })))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/franchise",
            Some(&admin.token),
            Some(json!({ "name": "pizzaPocket", "admins": [{ "email": "nobody@jwt.com" }] })),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let franchise = create_franchise(&app, &admin, "pizzaPocket", "d@jwt.com").await?;
    assert_eq!(franchise["admins"][0]["email"], "d@jwt.com");

    let (status, _) = app
        .request(Method::POST, "/api/franchise", Some(&admin.token), Some(json!({ "name": "pizzaPocket" })))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn franchisee_manages_stores_of_its_own_franchise_only() -> Result<()> {
    let app = TestApp::spawn();
    app.register("franchisee", "f@jwt.com", "franchisee").await?;
    app.register("other", "o@jwt.com", "other").await?;
    let admin = app.admin("a@jwt.com").await?;

    let mine = create_franchise(&app, &admin, "pizzaPocket", "f@jwt.com").await?;
    let theirs = create_franchise(&app, &admin, "slicePalace", "o@jwt.com").await?;

    // the grant is only in tokens minted after the franchise exists
    let franchisee = app.login("f@jwt.com", "franchisee").await?;
    assert!(franchisee.user["roles"]
        .as_array()
        .is_some_and(|roles| roles.contains(&json!({ "role": "franchisee", "objectId": mine["id"] }))));

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/franchise/{}/store", mine["id"]),
            Some(&franchisee.token),
            Some(json!({ "name": "SLC" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let store_id = body["data"]["id"].clone();

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/franchise/{}/store", theirs["id"]),
            Some(&franchisee.token),
            Some(json!({ "name": "Provo" })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/franchise/{}/store/{}", mine["id"], store_id),
            Some(&franchisee.token),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/franchise/{}/store/{}", mine["id"], store_id),
            Some(&franchisee.token),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn repeated_admin_emails_grant_once() -> Result<()> {
    let app = TestApp::spawn();
    let franchisee = app.register("franchisee", "f@jwt.com", "franchisee").await?;
    let admin = app.admin("a@jwt.com").await?;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/franchise",
            Some(&admin.token),
            Some(json!({ "name": "pizzaPocket", "admins": [{ "email": "f@jwt.com" }, { "email": "f@jwt.com" }] })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["admins"].as_array().map(Vec::len), Some(1));

    let path = format!("/api/franchise/{}", franchisee.id());
    let (_, body) = app.request(Method::GET, &path, Some(&franchisee.token), None).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let relogged = app.login("f@jwt.com", "franchisee").await?;
    assert_eq!(relogged.user["roles"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn franchise_listing_hides_admins_from_non_admins() -> Result<()> {
    let app = TestApp::spawn();
    let diner = app.register("pizza diner", "d@jwt.com", "diner").await?;
    let admin = app.admin("a@jwt.com").await?;
    create_franchise(&app, &admin, "pizzaPocket", "d@jwt.com").await?;

    let (status, body) = app.request(Method::GET, "/api/franchise", Some(&diner.token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "pizzaPocket");
    assert!(body["data"][0].get("admins").is_none());

    let (_, body) = app.request(Method::GET, "/api/franchise", Some(&admin.token), None).await?;
    assert_eq!(body["data"][0]["admins"][0]["email"], "d@jwt.com");

    let (status, _) = app.request(Method::GET, "/api/franchise", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn user_franchises_are_visible_to_self_and_admins() -> Result<()> {
    let app = TestApp::spawn();
    let franchisee = app.register("franchisee", "f@jwt.com", "franchisee").await?;
    let other = app.register("other", "o@jwt.com", "other").await?;
    let admin = app.admin("a@jwt.com").await?;
    create_franchise(&app, &admin, "pizzaPocket", "f@jwt.com").await?;

    let path = format!("/api/franchise/{}", franchisee.id());

    let (status, body) = app.request(Method::GET, &path, Some(&franchisee.token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "pizzaPocket");
    assert_eq!(body["data"][0]["admins"][0]["id"], franchisee.user["id"]);

    let (status, _) = app.request(Method::GET, &path, Some(&other.token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.request(Method::GET, &path, Some(&admin.token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn deleting_a_franchise_drops_stores_and_grants() -> Result<()> {
    let app = TestApp::spawn();
    app.register("franchisee", "f@jwt.com", "franchisee").await?;
    let diner = app.register("pizza diner", "d@jwt.com", "diner").await?;
    let admin = app.admin("a@jwt.com").await?;
    let franchise = create_franchise(&app, &admin, "pizzaPocket", "f@jwt.com").await?;
    let franchisee = app.login("f@jwt.com", "franchisee").await?;

    let store_path = format!("/api/franchise/{}/store", franchise["id"]);
    app.request(Method::POST, &store_path, Some(&admin.token), Some(json!({ "name": "SLC" })))
        .await?;

    let delete_path = format!("/api/franchise/{}", franchise["id"]);
    let (status, _) = app.request(Method::DELETE, &delete_path, Some(&diner.token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.request(Method::DELETE, &delete_path, Some(&franchisee.token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "franchise deleted");

    let (_, body) = app.request(Method::GET, "/api/franchise", Some(&admin.token), None).await?;
    assert_eq!(body["data"], json!([]));

    let relogged = app.login("f@jwt.com", "franchisee").await?;
    assert_eq!(relogged.user["roles"], json!([{ "role": "diner" }]));

    let (status, _) = app.request(Method::DELETE, &delete_path, Some(&admin.token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
