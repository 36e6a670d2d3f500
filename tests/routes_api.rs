#![cfg(feature = "inmem-store")]

use actix_web::{test, App};
use sabi_api::auth::{create_jwt, Role};
use sabi_api::repo::inmem::InMemRepo;
use sabi_api::{config, AppState, SecurityHeaders};
use serial_test::serial;
use std::sync::Arc;

// Helper to ensure JWT secret present & unique temp data dir per test
fn setup_env() {
    std::env::set_var("JWT_SECRET", "test-secret-must-be-32-bytes-long!!");
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("SABI_DATA_DIR", tmp.path().to_str().unwrap());
}

fn admin_token() -> String {
    create_jwt("admin@sabiconsults.com", vec![Role::Admin]).unwrap()
}

fn listing_payload(title: &str, district: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "Test listing",
        "price": 250000000i64,
        "type": "house",
        "district": district,
        "address": "1 Test Close",
        "latitude": 9.0406,
        "longitude": 7.5149,
        "bedrooms": 4,
        "images": ["https://example.com/a.jpg"],
        "features": ["Fitted Kitchen"]
    })
}

#[actix_web::test]
#[serial]
async fn test_listing_crud_flow() {
    setup_env();
    let repo = InMemRepo::new();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(AppState { repo: Arc::new(repo) }))
            .configure(config),
    )
    .await;

    // list listings empty
    let req = test::TestRequest::get().uri("/api/v1/listings").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let v: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(v.as_array().unwrap().len(), 0);

    // create listing (admin)
    let req = test::TestRequest::post()
        .uri("/api/v1/listings")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(listing_payload("4 Bedroom Terrace", "Asokoro"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["type"], "house");
    assert_eq!(created["status"], "available");

    // get by id
    let req = test::TestRequest::get().uri(&format!("/api/v1/listings/{id}")).to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // unknown id is a 404, not an empty success
    let req = test::TestRequest::get()
        .uri("/api/v1/listings/00000000-0000-0000-0000-000000000000")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // update price
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/listings/{id}"))
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(serde_json::json!({"price": 300000000i64}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let updated: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(updated["price"], 300000000i64);
    assert_eq!(updated["title"], "4 Bedroom Terrace");

    // delete
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/listings/{id}"))
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let req = test::TestRequest::get().uri(&format!("/api/v1/listings/{id}")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
#[serial]
async fn test_public_filters_and_admin_view() {
    setup_env();
    let repo = InMemRepo::new();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(AppState { repo: Arc::new(repo) }))
            .configure(config),
    )
    .await;

    // One house in Asokoro, one land in Utako, one sold house.
    let req = test::TestRequest::post()
        .uri("/api/v1/listings")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(listing_payload("Asokoro House", "Asokoro"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let mut land = listing_payload("Utako Plot", "Utako");
    land["type"] = "land".into();
    land["price"] = serde_json::json!(1200000000i64);
    let req = test::TestRequest::post()
        .uri("/api/v1/listings")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(land)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let mut sold = listing_payload("Gone Already", "Asokoro");
    sold["status"] = "sold".into();
    let req = test::TestRequest::post()
        .uri("/api/v1/listings")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(sold)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    // Public list excludes the sold one.
    let req = test::TestRequest::get().uri("/api/v1/listings").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v.as_array().unwrap().len(), 2);

    // District filter is case-insensitive.
    let req = test::TestRequest::get().uri("/api/v1/listings?district=asokoro").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["title"], "Asokoro House");

    // Type filter.
    let req = test::TestRequest::get().uri("/api/v1/listings?type=land").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v.as_array().unwrap()[0]["title"], "Utako Plot");

    // Price range keeps only the listing above 1B.
    let req = test::TestRequest::get()
        .uri("/api/v1/listings?priceRange=1000000000-")
        .to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["title"], "Utako Plot");

    // Unknown type matches nothing rather than erroring.
    let req = test::TestRequest::get().uri("/api/v1/listings?type=villa").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let v: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(v.as_array().unwrap().len(), 0);

    // The back-office view includes every status.
    let req = test::TestRequest::get()
        .uri("/api/v1/listings?include_all=1")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v.as_array().unwrap().len(), 3);

    // Without credentials include_all is silently ignored.
    let req = test::TestRequest::get().uri("/api/v1/listings?include_all=1").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v.as_array().unwrap().len(), 2);
}

#[actix_web::test]
#[serial]
async fn test_district_default_coordinates_on_create() {
    setup_env();
    let repo = InMemRepo::new();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(AppState { repo: Arc::new(repo) }))
            .configure(config),
    )
    .await;

    let mut payload = listing_payload("No Coords Yet", "Maitama");
    payload.as_object_mut().unwrap().remove("latitude");
    payload.as_object_mut().unwrap().remove("longitude");
    let req = test::TestRequest::post()
        .uri("/api/v1/listings")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    // Maitama's reference point from the district directory.
    assert_eq!(created["latitude"].as_f64().unwrap(), 9.0820);
    assert_eq!(created["longitude"].as_f64().unwrap(), 7.4878);
}

#[actix_web::test]
#[serial]
async fn test_featured_endpoint_caps_at_four() {
    setup_env();
    let repo = InMemRepo::new();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(AppState { repo: Arc::new(repo) }))
            .configure(config),
    )
    .await;

    for i in 0..5 {
        let mut payload = listing_payload(&format!("Featured {i}"), "Jabi");
        payload["featured"] = true.into();
        let req = test::TestRequest::post()
            .uri("/api/v1/listings")
            .insert_header(("Authorization", format!("Bearer {}", admin_token())))
            .set_json(payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
    }
    // A featured-but-sold listing stays off the strip.
    let mut sold = listing_payload("Featured Sold", "Jabi");
    sold["featured"] = true.into();
    sold["status"] = "sold".into();
    let req = test::TestRequest::post()
        .uri("/api/v1/listings")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(sold)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::get().uri("/api/v1/listings/featured").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 4);
    for item in arr {
        assert_eq!(item["featured"], true);
        assert_eq!(item["status"], "available");
    }
}

#[actix_web::test]
#[serial]
async fn test_map_plan_over_http() {
    setup_env();
    let repo = InMemRepo::new();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(AppState { repo: Arc::new(repo) }))
            .configure(config),
    )
    .await;

    // No listings: default city viewport.
    let req = test::TestRequest::get().uri("/api/v1/map-plan").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v["markers"].as_array().unwrap().len(), 0);
    assert_eq!(v["viewport"]["mode"], "center");
    assert_eq!(v["viewport"]["latitude"].as_f64().unwrap(), 9.0579);

    // Two listings: a fitted bounding box.
    for (title, lat, lng) in [("A", 9.08, 7.49), ("B", 9.10, 7.39)] {
        let mut payload = listing_payload(title, "Maitama");
        payload["latitude"] = serde_json::json!(lat);
        payload["longitude"] = serde_json::json!(lng);
        let req = test::TestRequest::post()
            .uri("/api/v1/listings")
            .insert_header(("Authorization", format!("Bearer {}", admin_token())))
            .set_json(payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
    }
    let req = test::TestRequest::get().uri("/api/v1/map-plan").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v["markers"].as_array().unwrap().len(), 2);
    assert_eq!(v["viewport"]["mode"], "fit");
    assert_eq!(v["viewport"]["south"].as_f64().unwrap(), 9.08);
    assert_eq!(v["viewport"]["north"].as_f64().unwrap(), 9.10);

    // Single-listing plan via the listing route.
    let id = v["markers"][0]["listingId"].as_str().unwrap().to_string();
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/listings/{id}/map-plan"))
        .to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v["markers"].as_array().unwrap().len(), 1);
    assert_eq!(v["viewport"]["mode"], "center");
    assert_eq!(v["viewport"]["zoom"].as_u64().unwrap(), 14);
}

#[actix_web::test]
#[serial]
async fn test_districts_endpoint() {
    setup_env();
    let repo = InMemRepo::new();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(AppState { repo: Arc::new(repo) }))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/districts").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 8);
    assert_eq!(arr[0]["name"], "Maitama");
    assert!(arr[0]["latitude"].as_f64().is_some());
}

#[actix_web::test]
#[serial]
async fn test_team_soft_delete() {
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
        .uri("/api/v1/team")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(serde_json::json!({
            "name": "Ada Obi",
            "role": "Principal Consultant",
            "displayOrder": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let member: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let id = member["id"].as_str().unwrap().to_string();

    // Publicly visible while active.
    let req = test::TestRequest::get().uri("/api/v1/team").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v.as_array().unwrap().len(), 1);

    // Delete takes the soft path.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/team/{id}"))
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);

    // Gone from the public list, retained for the back office.
    let req = test::TestRequest::get().uri("/api/v1/team").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v.as_array().unwrap().len(), 0);

    let req = test::TestRequest::get()
        .uri("/api/v1/team?include_inactive=1")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["isActive"], false);
}

#[actix_web::test]
#[serial]
async fn test_team_display_order() {
    setup_env();
    let repo = InMemRepo::new();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(AppState { repo: Arc::new(repo) }))
            .configure(config),
    )
    .await;

    for (name, order) in [("Second", 2), ("First", 1), ("Third", 3)] {
        let req = test::TestRequest::post()
            .uri("/api/v1/team")
            .insert_header(("Authorization", format!("Bearer {}", admin_token())))
            .set_json(serde_json::json!({
                "name": name, "role": "Consultant", "displayOrder": order
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
    }
    let req = test::TestRequest::get().uri("/api/v1/team").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    let names: Vec<_> =
        v.as_array().unwrap().iter().map(|m| m["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["First", "Second", "Third"]);
}

#[actix_web::test]
#[serial]
async fn test_settings_defaults_and_update() {
    setup_env();
    let repo = InMemRepo::new();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(AppState { repo: Arc::new(repo) }))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/settings").to_request();
    let v: serde_json::Value =
        serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await)
            .unwrap();
    assert_eq!(v["email"], "hello@sabiconsults.com");

    let req = test::TestRequest::put()
        .uri("/api/v1/settings")
        .insert_header(("Authorization", format!("Bearer {}", admin_token())))
        .set_json(serde_json::json!({"phoneNumber": "+234 811 111 1111"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let v: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(v["phoneNumber"], "+234 811 111 1111");
    // Untouched keys keep their defaults.
    assert_eq!(v["email"], "hello@sabiconsults.com");
}
