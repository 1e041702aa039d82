//! Menu catalog view.
//!
//! The catalog is loaded from the database (sections and items fetched
//! concurrently), cached for a short time, and grouped into per-section lists
//! of in-stock items for display.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use after10_core::{Item, ItemId, Section, SectionName};
use moka::future::Cache;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::db::RepositoryError;

const CATALOG_KEY: &str = "menu";

/// Where the catalog comes from.
pub trait CatalogSource: Send + Sync {
    /// All sections, ordered by name.
    fn sections(&self) -> impl Future<Output = Result<Vec<Section>, RepositoryError>> + Send;

    /// All items in catalog order.
    fn items(&self) -> impl Future<Output = Result<Vec<Item>, RepositoryError>> + Send;
}

/// Raw catalog data.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub sections: Vec<Section>,
    pub items: Vec<Item>,
}

impl Catalog {
    #[must_use]
    pub const fn new(sections: Vec<Section>, items: Vec<Item>) -> Self {
        Self { sections, items }
    }

    #[must_use]
    pub fn find_item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Group the catalog for display.
    #[must_use]
    pub fn view(&self) -> MenuView {
        let names: Vec<SectionName> = self.sections.iter().map(|s| s.name.clone()).collect();
        group_in_stock(&names, &self.items)
    }
}

/// In-stock items of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionGroup {
    pub section: SectionName,
    pub items: Vec<Item>,
}

/// The menu as shown to visitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuView {
    /// Every section name, including ones with nothing in stock.
    pub sections: Vec<SectionName>,
    /// Sections that have at least one in-stock item, in section order.
    pub groups: Vec<SectionGroup>,
    /// Section to focus when the menu first renders.
    pub focused_section: Option<SectionName>,
}

/// Partition in-stock items by section, keeping catalog order within each.
#[must_use]
pub fn group_in_stock(sections: &[SectionName], items: &[Item]) -> MenuView {
    let groups = sections
        .iter()
        .filter_map(|section| {
            let items: Vec<Item> = items
                .iter()
                .filter(|item| item.in_stock && &item.section == section)
                .cloned()
                .collect();
            (!items.is_empty()).then(|| SectionGroup {
                section: section.clone(),
                items,
            })
        })
        .collect();

    MenuView {
        sections: sections.to_vec(),
        groups,
        focused_section: sections.first().cloned(),
    }
}

/// Short-lived cache in front of a [`CatalogSource`].
#[derive(Clone)]
pub struct MenuCatalog {
    cache: Cache<&'static str, Arc<Catalog>>,
}

impl MenuCatalog {
    /// Create a catalog cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { cache }
    }

    /// Return the cached catalog, loading it from `source` on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if either query fails. Nothing is cached in that case.
    #[instrument(skip_all)]
    pub async fn load<S: CatalogSource>(&self, source: &S) -> Result<Arc<Catalog>, RepositoryError> {
        if let Some(catalog) = self.cache.get(CATALOG_KEY).await {
            debug!("Cache hit for catalog");
            return Ok(catalog);
        }

        let (sections, items) = tokio::try_join!(source.sections(), source.items())?;
        debug!(
            sections = sections.len(),
            items = items.len(),
            "Catalog loaded"
        );

        let catalog = Arc::new(Catalog::new(sections, items));
        self.cache.insert(CATALOG_KEY, Arc::clone(&catalog)).await;
        Ok(catalog)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use after10_core::{Price, SectionId};
    use chrono::Utc;

    use super::*;

    fn name(s: &str) -> SectionName {
        SectionName::parse(s).unwrap()
    }

    fn item(id: i32, section: &str, in_stock: bool) -> Item {
        Item {
            id: ItemId::new(id),
            name: format!("Item {id}"),
            section: name(section),
            price: Price::from_rupees(50),
            image: String::new(),
            in_stock,
            addons: vec![],
        }
    }

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl CatalogSource for CountingSource {
        async fn sections(&self) -> Result<Vec<Section>, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Section {
                id: SectionId::new(1),
                name: name("Rolls"),
                created_at: Utc::now(),
            }])
        }

        async fn items(&self) -> Result<Vec<Item>, RepositoryError> {
            Ok(vec![item(1, "Rolls", true)])
        }
    }

    struct FailingSource;

    impl CatalogSource for FailingSource {
        async fn sections(&self) -> Result<Vec<Section>, RepositoryError> {
            Ok(vec![])
        }

        async fn items(&self) -> Result<Vec<Item>, RepositoryError> {
            Err(RepositoryError::DataCorruption("bad row".to_string()))
        }
    }

    #[test]
    fn test_groups_only_in_stock_items() {
        let sections = vec![name("Burgers"), name("Rolls"), name("Shakes")];
        let items = vec![
            item(1, "Rolls", true),
            item(2, "Burgers", false),
            item(3, "Rolls", false),
            item(4, "Rolls", true),
            item(5, "Shakes", true),
        ];

        let view = group_in_stock(&sections, &items);

        assert_eq!(view.sections, sections);
        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[0].section, name("Rolls"));
        let ids: Vec<i32> = view.groups[0].items.iter().map(|i| i.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(view.groups[1].section, name("Shakes"));
        assert_eq!(view.focused_section, Some(name("Burgers")));
    }

    #[test]
    fn test_empty_catalog() {
        let view = group_in_stock(&[], &[]);
        assert!(view.groups.is_empty());
        assert!(view.focused_section.is_none());
    }

    #[test]
    fn test_items_with_unknown_section_are_hidden() {
        let view = group_in_stock(&[name("Rolls")], &[item(1, "Gone", true)]);
        assert!(view.groups.is_empty());
    }

    #[tokio::test]
    async fn test_load_caches_until_expiry() {
        let source = CountingSource {
            calls: AtomicUsize::new(0),
        };
        let catalog = MenuCatalog::new(Duration::from_millis(100));

        let first = catalog.load(&source).await.unwrap();
        let second = catalog.load(&source).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.find_item(ItemId::new(1)).is_some());

        tokio::time::sleep(Duration::from_millis(250)).await;
        catalog.load(&source).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let catalog = MenuCatalog::new(Duration::from_secs(60));
        assert!(catalog.load(&FailingSource).await.is_err());
        assert!(catalog.load(&FailingSource).await.is_err());
    }
}
