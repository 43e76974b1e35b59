mod common;

use axum::http::StatusCode;
use common::{approx, TestApp};
use serde_json::json;

#[tokio::test]
async fn custom_foods_are_searchable() {
    let app = TestApp::new();
    let cookie = app.signup("ada@example.com").await;

    let created = app
        .post(
            "/foods",
            &cookie,
            json!({ "name": "Greek yogurt", "brand": "Fage", "kcal_100g": 97, "protein_100g": 9,
                    "carbs_100g": 3.9, "fat_100g": 5, "sugar_100g": 3.9 }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["source"], "custom");
    assert!(approx(&created.body["sugar_100g"], 3.9));
    assert!(created.body["fiber_100g"].is_null());

    let hits = app.get("/foods?source=custom&query=YOGURT%20greek", &cookie).await;
    assert_eq!(hits.status, StatusCode::OK);
    assert_eq!(hits.body.as_array().unwrap().len(), 1);
    assert_eq!(hits.body[0]["brand"], "Fage");

    let misses = app.get("/foods?source=custom&query=greek%20salad", &cookie).await;
    assert_eq!(misses.body, json!([]));
}

#[tokio::test]
async fn custom_food_values_must_not_be_negative() {
    let app = TestApp::new();
    let cookie = app.signup("ada@example.com").await;

    let response = app
        .post(
            "/foods",
            &cookie,
            json!({ "name": "Anti-food", "kcal_100g": -5, "protein_100g": 0, "carbs_100g": 0, "fat_100g": 0 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let nameless = app
        .post(
            "/foods",
            &cookie,
            json!({ "name": "  ", "kcal_100g": 5, "protein_100g": 0, "carbs_100g": 0, "fat_100g": 0 }),
        )
        .await;
    assert_eq!(nameless.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn catalog_search_uses_the_builtin_sample() {
    let app = TestApp::new();
    let cookie = app.signup("ada@example.com").await;

    let rice = app.get("/foods?source=catalog&query=rice", &cookie).await;
    assert_eq!(rice.status, StatusCode::OK);
    assert_eq!(rice.body.as_array().unwrap().len(), 1);
    assert!(approx(&rice.body[0]["kcal_100g"], 130.0));
    assert_eq!(rice.body[0]["source"], "catalog");

    let blank = app.get("/foods?source=catalog&query=%20", &cookie).await;
    assert_eq!(blank.body, json!([]));

    let refreshed = app.post("/foods/catalog/refresh", &cookie, json!({})).await;
    assert_eq!(refreshed.status, StatusCode::OK);
    assert_eq!(refreshed.body["count"], 2);
}

#[tokio::test]
async fn search_parameters_are_validated() {
    let app = TestApp::new();
    let cookie = app.signup("ada@example.com").await;

    for uri in [
        "/foods?query=rice&limit=0",
        "/foods?query=rice&limit=101",
        "/foods?query=rice&source=openfoodfacts",
    ] {
        assert_eq!(app.get(uri, &cookie).await.status, StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn unreachable_usda_is_a_bad_gateway() {
    let app = TestApp::new();
    let cookie = app.signup("ada@example.com").await;

    let response = app.get("/foods?query=chicken", &cookie).await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response.body["error"].is_string());
}
