#![cfg(feature = "inmem-store")]

use actix_web::{test, App};
use sabi_api::auth::{create_jwt, Role};
use sabi_api::repo::inmem::InMemRepo;
use sabi_api::{config, AppState, SecurityHeaders};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

fn setup_env() {
    std::env::set_var("JWT_SECRET", "test-secret-must-be-32-bytes-long!!");
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("SABI_DATA_DIR", tmp.path().to_str().unwrap());
}

fn admin_token() -> String {
    create_jwt("admin@sabiconsults.com", vec![Role::Admin]).unwrap()
}

fn draft_payload(slug: &str) -> serde_json::Value {
    serde_json::json!({
        "title": "Buying Land in Abuja",
        "slug": slug,
        "excerpt": "What to check before you pay",
        "content": "<p>Always verify the C of O.</p>",
        "author": "Sabi Consults",
        "status": "draft"
    })
}

#[actix_web::test]
#[serial]
async fn test_publish_timestamp_is_set_once() {
    setup_env();
    let repo = InMemRepo::new();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(AppState { repo: Arc::new(repo) }))
            .configure(config),
    )
    .await;

    // Draft: no publish timestamp, invisible publicly.
    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(draft_payload("buying-land-in-abuja"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let post: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let id = post["id"].as_str().unwrap().to_string();
    assert!(post["publishedAt"].is_null());

    let req = test::TestRequest::get().uri("/api/v1/posts").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v.as_array().unwrap().len(), 0);

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/slug/buying-land-in-abuja")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    // First publish stamps publishedAt.
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{id}"))
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(serde_json::json!({"status": "published"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let published: serde_json::Value =
        serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let first_stamp = published["publishedAt"].as_str().unwrap().to_string();

    // A later edit while published leaves the stamp alone.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{id}"))
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(serde_json::json!({"title": "Buying Land in Abuja, Updated", "status": "published"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let edited: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(edited["publishedAt"].as_str().unwrap(), first_stamp);

    // Unpublish and republish: still the original stamp.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{id}"))
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(serde_json::json!({"status": "draft"}))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    tokio::time::sleep(Duration::from_millis(10)).await;
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{id}"))
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(serde_json::json!({"status": "published"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let republished: serde_json::Value =
        serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(republished["publishedAt"].as_str().unwrap(), first_stamp);

    // Now publicly visible, by list and by slug.
    let req = test::TestRequest::get().uri("/api/v1/posts").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/slug/buying-land-in-abuja")
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());
}

#[actix_web::test]
#[serial]
async fn test_duplicate_slug_conflicts() {
    setup_env();
    let repo = InMemRepo::new();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(AppState { repo: Arc::new(repo) }))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(draft_payload("market-update"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let first: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();

    // Same slug again: 409, and the original post is untouched.
    let mut second = draft_payload("market-update");
    second["title"] = "A Different Title".into();
    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(second)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 409);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{}", first["id"].as_str().unwrap()))
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let stored: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(stored["title"], "Buying Land in Abuja");

    // Renaming another post onto a taken slug conflicts the same way.
    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(draft_payload("second-post"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let other: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{}", other["id"].as_str().unwrap()))
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(serde_json::json!({"slug": "market-update"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 409);
}

#[actix_web::test]
#[serial]
async fn test_drafts_visible_only_to_back_office() {
    setup_env();
    let repo = InMemRepo::new();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(AppState { repo: Arc::new(repo) }))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(draft_payload("hidden-draft"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    // Public list: empty. include_drafts without a token is ignored.
    let req = test::TestRequest::get().uri("/api/v1/posts?include_drafts=1").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v.as_array().unwrap().len(), 0);

    let req = test::TestRequest::get()
        .uri("/api/v1/posts?include_drafts=1")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v.as_array().unwrap().len(), 1);
}
