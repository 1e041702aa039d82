//! Integration tests for the admin HTTP API.
//!
//! These tests require:
//! - A migrated database (`a10-cli migrate admin`)
//! - The admin server running (`cargo run -p after10-admin`)
//! - `ADMIN_API_TOKEN` matching the server's
//!
//! Run with: cargo test -p after10-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use after10_integration_tests::{admin_base_url, admin_client, unique_name};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

async fn create_section(client: &Client, name: &str) -> Value {
    let resp = client
        .post(format!("{}/api/sections", admin_base_url()))
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json::<Value>().await.unwrap()["section"].clone()
}

async fn create_item(client: &Client, name: &str, section: &str) -> Value {
    let resp = client
        .post(format!("{}/api/items", admin_base_url()))
        .json(&json!({
            "name": name,
            "section": section,
            "price": "120",
            "image": "/uploads/test.jpg",
            "addons": [{ "name": "Cheese", "price": "20" }, { "name": "", "price": null }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json::<Value>().await.unwrap()["item"].clone()
}

async fn delete_section(client: &Client, id: &Value) -> Value {
    client
        .delete(format!("{}/api/sections/{id}", admin_base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_api_requires_token() {
    let resp = Client::new()
        .get(format!("{}/api/sections", admin_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_health_is_public() {
    let resp = Client::new()
        .get(format!("{}/health", admin_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Sections
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_section_create_list_and_duplicate() {
    let client = admin_client();
    let name = unique_name("Section");

    let section = create_section(&client, &name).await;
    assert_eq!(section["name"], name.as_str());

    let listed: Value = client
        .get(format!("{}/api/sections", admin_base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["success"], true);
    assert!(
        listed["sections"]
            .as_array()
            .unwrap()
            .iter()
            .any(|s| s["name"] == name.as_str())
    );

    let duplicate = client
        .post(format!("{}/api/sections", admin_base_url()))
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    let body: Value = duplicate.json().await.unwrap();
    assert_eq!(body["error"], "Section already exists");

    delete_section(&client, &section["id"]).await;
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_blank_section_name_is_rejected() {
    let resp = admin_client()
        .post(format!("{}/api/sections", admin_base_url()))
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_rename_section_moves_items() {
    let client = admin_client();
    let section = create_section(&client, &unique_name("Old")).await;
    let item = create_item(&client, "Rename Roll", section["name"].as_str().unwrap()).await;

    let new_name = unique_name("New");
    let renamed: Value = client
        .put(format!("{}/api/sections/{}", admin_base_url(), section["id"]))
        .json(&json!({ "name": new_name }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(renamed["section"]["name"], new_name.as_str());

    let items: Value = client
        .get(format!("{}/api/items", admin_base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let moved = items["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["id"] == item["id"])
        .unwrap();
    assert_eq!(moved["section"], new_name.as_str());

    delete_section(&client, &section["id"]).await;
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_section_delete_cascades() {
    let client = admin_client();
    let section = create_section(&client, &unique_name("Cascade")).await;
    let name = section["name"].as_str().unwrap().to_string();
    let first = create_item(&client, "Cascade One", &name).await;
    let second = create_item(&client, "Cascade Two", &name).await;

    let body = delete_section(&client, &section["id"]).await;
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["message"],
        "Section and associated items deleted successfully"
    );
    assert_eq!(body["data"]["sectionDeleted"], true);
    assert_eq!(body["data"]["itemsDeletedCount"], 2);

    let items: Value = client
        .get(format!("{}/api/items", admin_base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        !items["items"]
            .as_array()
            .unwrap()
            .iter()
            .any(|i| i["id"] == first["id"] || i["id"] == second["id"])
    );
}

// ============================================================================
// Items
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_item_create_drops_blank_addons() {
    let client = admin_client();
    let section = create_section(&client, &unique_name("Items")).await;
    let item = create_item(&client, "Addon Roll", section["name"].as_str().unwrap()).await;

    assert_eq!(item["inStock"], true);
    assert_eq!(item["addons"].as_array().unwrap().len(), 1);
    assert_eq!(item["addons"][0]["name"], "Cheese");

    delete_section(&client, &section["id"]).await;
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_item_with_unknown_section_is_rejected() {
    let resp = admin_client()
        .post(format!("{}/api/items", admin_base_url()))
        .json(&json!({
            "name": "Orphan",
            "section": unique_name("Missing"),
            "price": "50",
            "image": "/uploads/orphan.jpg",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_patch_stock_keeps_other_fields() {
    let client = admin_client();
    let section = create_section(&client, &unique_name("Stock")).await;
    let item = create_item(&client, "Stock Roll", section["name"].as_str().unwrap()).await;

    let patched: Value = client
        .patch(format!("{}/api/items/{}", admin_base_url(), item["id"]))
        .json(&json!({ "inStock": false }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(patched["item"]["inStock"], false);
    assert_eq!(patched["item"]["name"], "Stock Roll");
    assert_eq!(patched["item"]["addons"], item["addons"]);

    delete_section(&client, &section["id"]).await;
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_delete_item_and_missing_item() {
    let client = admin_client();
    let section = create_section(&client, &unique_name("Delete")).await;
    let item = create_item(&client, "Delete Roll", section["name"].as_str().unwrap()).await;
    let url = format!("{}/api/items/{}", admin_base_url(), item["id"]);

    let body: Value = client
        .delete(&url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Item deleted successfully");
    assert_eq!(body["data"]["itemDeleted"], true);

    let again = client.delete(&url).send().await.unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    delete_section(&client, &section["id"]).await;
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_bulk_delete_keeps_section() {
    let client = admin_client();
    let section = create_section(&client, &unique_name("Bulk")).await;
    let name = section["name"].as_str().unwrap().to_string();
    create_item(&client, "Bulk One", &name).await;
    create_item(&client, "Bulk Two", &name).await;
    create_item(&client, "Bulk Three", &name).await;

    let body: Value = client
        .delete(format!(
            "{}/api/items/section/{}",
            admin_base_url(),
            section["id"]
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Items deleted successfully");
    assert_eq!(body["data"]["deletedCount"], 3);

    let sections: Value = client
        .get(format!("{}/api/sections", admin_base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        sections["sections"]
            .as_array()
            .unwrap()
            .iter()
            .any(|s| s["id"] == section["id"])
    );

    delete_section(&client, &section["id"]).await;
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_upload_without_file() {
    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let resp = admin_client()
        .post(format!("{}/api/upload", admin_base_url()))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_upload_returns_url() {
    let part = reqwest::multipart::Part::bytes(b"\x89PNG\r\n\x1a\nfake".to_vec())
        .file_name("dish photo.png");
    let form = reqwest::multipart::Form::new().part("file", part);
    let resp = admin_client()
        .post(format!("{}/api/upload", admin_base_url()))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(!body["url"].as_str().unwrap().is_empty());
}
