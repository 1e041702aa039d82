//! Integration tests for the storefront HTTP API.
//!
//! These tests require:
//! - A migrated database (`a10-cli migrate all`)
//! - The storefront running (`cargo run -p after10-storefront`)
//!
//! Each test uses its own cookie jar, so each gets a fresh visitor session.

#![allow(clippy::unwrap_used)]

use after10_integration_tests::{storefront_base_url, storefront_client};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn url(path: &str) -> String {
    format!("{}/api{path}", storefront_base_url())
}

fn complete_form() -> Value {
    json!({
        "firstName": "Asha",
        "lastName": "Verma",
        "Mobile_No": "9829012345",
        "address": "12 Station Road",
        "city": "Bhilwara",
        "state": "Rajasthan",
        "pinCode": "311001",
        "country": "India",
    })
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_menu_lists_sections() {
    let resp = storefront_client().get(url("/menu")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let menu: Value = resp.json().await.unwrap();
    assert!(menu["sections"].is_array());
    assert!(menu["groups"].is_array());
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_new_visitor_has_empty_cart() {
    let cart: Value = storefront_client()
        .get(url("/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["lines"], json!([]));
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_add_unknown_item_is_not_found() {
    let resp = storefront_client()
        .post(url("/cart/add"))
        .json(&json!({ "itemId": i32::MAX, "quantity": 1, "addons": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_checkout_reports_missing_fields() {
    let mut form = complete_form();
    form["city"] = json!("");
    form["pinCode"] = json!(" ");

    let resp = storefront_client()
        .post(url("/checkout"))
        .json(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["missingFields"], json!(["city", "pinCode"]));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_checkout_with_empty_cart() {
    let resp = storefront_client()
        .post(url("/checkout"))
        .json(&complete_form())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_checkout_form_has_defaults() {
    let form: Value = storefront_client()
        .get(url("/checkout/form"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!form["city"].as_str().unwrap().is_empty());
    assert_eq!(form["firstName"], "");
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_denied_location_until_reset() {
    let client = storefront_client();

    let initial: Value = client
        .get(url("/location"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(initial["status"], "pending");

    let denied = client
        .post(url("/location/acquire"))
        .json(&json!({ "errorCode": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let state: Value = client
        .get(url("/location"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["status"], "denied");
    assert!(state["coordinates"].is_null());

    // Refused without asking again.
    let again = client
        .post(url("/location/acquire"))
        .json(&json!({ "coordinates": { "lat": 25.35, "lng": 74.63 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::FORBIDDEN);

    let reset = client.delete(url("/location")).send().await.unwrap();
    assert_eq!(reset.status(), StatusCode::NO_CONTENT);

    let state: Value = client
        .get(url("/location"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["status"], "pending");
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_out_of_range_coordinates_rejected() {
    let resp = storefront_client()
        .post(url("/location/address"))
        .json(&json!({ "lat": 123.0, "lng": 74.63 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
