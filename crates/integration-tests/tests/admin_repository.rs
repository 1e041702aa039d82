//! Integration tests for the menu repositories.
//!
//! These tests require a migrated database (`a10-cli migrate admin`) at
//! `ADMIN_DATABASE_URL` or `DATABASE_URL`.

#![allow(clippy::unwrap_used)]

use after10_admin::db::{ItemRepository, RepositoryError, SectionRepository};
use after10_core::{ItemId, ItemInput, ItemPatch, NewItem, Price, SectionName};
use after10_integration_tests::{admin_pool, unique_name};

fn new_item(name: &str, section: &SectionName) -> NewItem {
    ItemInput {
        name: name.to_string(),
        section: section.as_str().to_string(),
        price: Price::from_rupees(80),
        image: "/uploads/test.jpg".to_string(),
        in_stock: None,
        addons: None,
    }
    .validate()
    .unwrap()
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_cascade_delete_reports_removed_items() {
    let pool = admin_pool().await;
    let sections = SectionRepository::new(&pool);
    let items = ItemRepository::new(&pool);

    let name = SectionName::parse(&unique_name("Cascade")).unwrap();
    let section = sections.create(&name).await.unwrap();

    let mut created = Vec::new();
    for n in 0..4 {
        let item = items
            .create(&new_item(&format!("Item {n}"), &name))
            .await
            .unwrap();
        created.push(item.id);
    }

    let deletion = sections.delete_cascade(section.id).await.unwrap();
    assert!(deletion.section_deleted);
    assert_eq!(deletion.items_deleted_count, 4);

    let remaining = items.list().await.unwrap();
    assert!(remaining.iter().all(|i| !created.contains(&i.id)));
    assert!(sections.get(section.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_duplicate_section_conflicts() {
    let pool = admin_pool().await;
    let sections = SectionRepository::new(&pool);

    let name = SectionName::parse(&unique_name("Dup")).unwrap();
    let section = sections.create(&name).await.unwrap();

    let err = sections.create(&name).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(ref msg) if msg == "Section already exists"));

    sections.delete_cascade(section.id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_rename_carries_items() {
    let pool = admin_pool().await;
    let sections = SectionRepository::new(&pool);
    let items = ItemRepository::new(&pool);

    let old = SectionName::parse(&unique_name("Before")).unwrap();
    let section = sections.create(&old).await.unwrap();
    let item = items.create(&new_item("Travelling Roll", &old)).await.unwrap();

    let new = SectionName::parse(&unique_name("After")).unwrap();
    let renamed = sections.rename(section.id, &new).await.unwrap();
    assert_eq!(renamed.name, new);

    let moved = items.get(item.id).await.unwrap().unwrap();
    assert_eq!(moved.section, new);

    sections.delete_cascade(section.id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_item_needs_existing_section() {
    let pool = admin_pool().await;
    let items = ItemRepository::new(&pool);

    let missing = SectionName::parse(&unique_name("Ghost")).unwrap();
    let err = items
        .create(&new_item("Orphan", &missing))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidReference(_)));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_delete_by_section_keeps_section() {
    let pool = admin_pool().await;
    let sections = SectionRepository::new(&pool);
    let items = ItemRepository::new(&pool);

    let name = SectionName::parse(&unique_name("Clear")).unwrap();
    let section = sections.create(&name).await.unwrap();
    items.create(&new_item("One", &name)).await.unwrap();
    items.create(&new_item("Two", &name)).await.unwrap();

    assert_eq!(items.delete_by_section(section.id).await.unwrap(), 2);
    assert!(sections.get(section.id).await.unwrap().is_some());
    assert_eq!(items.delete_by_section(section.id).await.unwrap(), 0);

    sections.delete_cascade(section.id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_stock_update_keeps_concurrent_price_change() {
    let pool = admin_pool().await;
    let sections = SectionRepository::new(&pool);
    let items = ItemRepository::new(&pool);

    let name = SectionName::parse(&unique_name("Stock")).unwrap();
    let section = sections.create(&name).await.unwrap();
    let item = items.create(&new_item("Bun Maska", &name)).await.unwrap();

    // Another editor changes the price after this item was read.
    let mut repriced = new_item("Bun Maska", &name);
    repriced.price = Price::from_rupees(95);
    items.replace(item.id, &repriced).await.unwrap();

    let changes = ItemPatch::stock(false).validate().unwrap();
    let updated = items.update_partial(item.id, &changes).await.unwrap();
    assert!(!updated.in_stock);
    assert_eq!(updated.price, Price::from_rupees(95));
    assert_eq!(updated.name, "Bun Maska");

    sections.delete_cascade(section.id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_partial_update_of_missing_item() {
    let pool = admin_pool().await;
    let items = ItemRepository::new(&pool);

    let changes = ItemPatch::stock(true).validate().unwrap();
    let err = items
        .update_partial(ItemId::new(i32::MAX), &changes)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}
