//! Menu dashboard state.
//!
//! Holds the admin's local copy of sections and items and keeps it in step
//! with the server. Every mutation goes through [`OperationState`]: it starts
//! `Idle`, becomes `Pending` while the request is in flight, and settles as
//! `Succeeded` or `Failed`. The local lists change only after the server
//! confirms a mutation.
//!
//! Destructive operations ask a [`Confirm`] first. A declined confirmation
//! leaves the operation `Idle` and sends nothing.

use std::path::Path;

use after10_core::{Item, ItemId, ItemInput, ItemPatch, Section, SectionId, SectionName};
use thiserror::Error;
use tracing::instrument;

use crate::client::{ApiError, MenuApi};
use crate::db::SectionDeletion;

pub const CONFIRM_DELETE_SECTION: &str = "Delete this section and all its items?";
pub const CONFIRM_DELETE_ITEM: &str = "Delete this item?";
pub const CONFIRM_CLEAR_SECTION: &str = "Delete all items in this section?";

/// Asks the user before a destructive operation.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirms everything, for non-interactive use.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Why a dashboard operation failed.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Item {0} is not on the dashboard")]
    UnknownItem(ItemId),

    #[error("Section {0} is not on the dashboard")]
    UnknownSection(SectionId),
}

impl DashboardError {
    /// Whether the request ran out of time.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Api(ApiError::TimedOut))
    }
}

/// Lifecycle of one admin operation.
#[derive(Debug, Default)]
pub enum OperationState<T> {
    #[default]
    Idle,
    Pending,
    Succeeded(T),
    Failed(DashboardError),
}

impl<T> OperationState<T> {
    /// `Idle → Pending`. Any other state is left alone.
    #[must_use]
    pub fn begin(self) -> Self {
        match self {
            Self::Idle => Self::Pending,
            other => other,
        }
    }

    /// `Pending → Succeeded | Failed`. Any other state is left alone.
    #[must_use]
    pub fn settle<E: Into<DashboardError>>(self, result: Result<T, E>) -> Self {
        match self {
            Self::Pending => match result {
                Ok(value) => Self::Succeeded(value),
                Err(err) => Self::Failed(err.into()),
            },
            other => other,
        }
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The successful value, if any.
    #[must_use]
    pub fn succeeded(self) -> Option<T> {
        match self {
            Self::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    /// The failure, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&DashboardError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

fn failure<T>(err: DashboardError) -> OperationState<T> {
    OperationState::Pending.settle(Err::<T, _>(err))
}

/// The admin's view of the menu.
#[derive(Debug)]
pub struct Dashboard<A> {
    api: A,
    sections: Vec<Section>,
    items: Vec<Item>,
}

impl<A: MenuApi> Dashboard<A> {
    /// Fetch sections and items concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first API error from either request.
    #[instrument(skip(api))]
    pub async fn load(api: A) -> Result<Self, ApiError> {
        let (sections, items) = tokio::try_join!(api.list_sections(), api.list_items())?;
        tracing::debug!(
            sections = sections.len(),
            items = items.len(),
            "Dashboard loaded"
        );
        Ok(Self {
            api,
            sections,
            items,
        })
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Items listed under a section, in list order.
    pub fn items_in<'a>(&'a self, section: &'a SectionName) -> impl Iterator<Item = &'a Item> {
        self.items.iter().filter(move |i| &i.section == section)
    }

    /// Create a section and add it to the list.
    pub async fn add_section(&mut self, name: &str) -> OperationState<Section> {
        let state = OperationState::Idle.begin();
        let result = self.api.create_section(name).await;
        if let Ok(section) = &result {
            self.sections.push(section.clone());
            self.sections.sort_by(|a, b| a.name.cmp(&b.name));
        }
        state.settle(result)
    }

    /// Rename a section. Its items are relabelled locally to match.
    pub async fn rename_section(&mut self, id: SectionId, name: &str) -> OperationState<Section> {
        let Some(old_name) = self.section(id).map(|s| s.name.clone()) else {
            return failure(DashboardError::UnknownSection(id));
        };

        let state = OperationState::Idle.begin();
        let result = self.api.rename_section(id, name).await;
        if let Ok(section) = &result {
            for item in self.items.iter_mut().filter(|i| i.section == old_name) {
                item.section = section.name.clone();
            }
            if let Some(slot) = self.sections.iter_mut().find(|s| s.id == id) {
                *slot = section.clone();
            }
            self.sections.sort_by(|a, b| a.name.cmp(&b.name));
        }
        state.settle(result)
    }

    /// Delete a section and every item under it, after confirmation.
    pub async fn delete_section(
        &mut self,
        id: SectionId,
        confirm: &mut impl Confirm,
    ) -> OperationState<SectionDeletion> {
        let Some(name) = self.section(id).map(|s| s.name.clone()) else {
            return failure(DashboardError::UnknownSection(id));
        };
        if !confirm.confirm(CONFIRM_DELETE_SECTION) {
            return OperationState::Idle;
        }

        let state = OperationState::Idle.begin();
        let result = self.api.delete_section(id).await;
        if result.is_ok() {
            self.sections.retain(|s| s.id != id);
            self.items.retain(|i| i.section != name);
        }
        state.settle(result)
    }

    /// Create an item and append it to the list.
    pub async fn add_item(&mut self, input: &ItemInput) -> OperationState<Item> {
        let state = OperationState::Idle.begin();
        let result = self.api.create_item(input).await;
        if let Ok(item) = &result {
            self.items.push(item.clone());
        }
        state.settle(result)
    }

    /// Replace an item with the edited version.
    pub async fn update_item(&mut self, id: ItemId, input: &ItemInput) -> OperationState<Item> {
        let state = OperationState::Idle.begin();
        let result = self.api.replace_item(id, input).await;
        if let Ok(item) = &result {
            self.replace_local(item);
        }
        state.settle(result)
    }

    /// Flip an item's stock flag.
    pub async fn toggle_stock(&mut self, id: ItemId) -> OperationState<Item> {
        let Some(in_stock) = self.item(id).map(|i| i.in_stock) else {
            return failure(DashboardError::UnknownItem(id));
        };

        let state = OperationState::Idle.begin();
        let result = self.api.patch_item(id, &ItemPatch::stock(!in_stock)).await;
        if let Ok(item) = &result {
            self.replace_local(item);
        }
        state.settle(result)
    }

    /// Delete an item, after confirmation.
    pub async fn delete_item(
        &mut self,
        id: ItemId,
        confirm: &mut impl Confirm,
    ) -> OperationState<()> {
        if !confirm.confirm(CONFIRM_DELETE_ITEM) {
            return OperationState::Idle;
        }

        let state = OperationState::Idle.begin();
        let result = self.api.delete_item(id).await;
        if result.is_ok() {
            self.items.retain(|i| i.id != id);
        }
        state.settle(result)
    }

    /// Delete every item in a section, keeping the section, after
    /// confirmation. Fails with a timeout if the server takes too long.
    pub async fn clear_section(
        &mut self,
        id: SectionId,
        confirm: &mut impl Confirm,
    ) -> OperationState<u64> {
        let Some(name) = self.section(id).map(|s| s.name.clone()) else {
            return failure(DashboardError::UnknownSection(id));
        };
        if !confirm.confirm(CONFIRM_CLEAR_SECTION) {
            return OperationState::Idle;
        }

        let state = OperationState::Idle.begin();
        let result = self.api.delete_section_items(id).await;
        match &result {
            Ok(_) => self.items.retain(|i| i.section != name),
            Err(ApiError::TimedOut) => {
                tracing::warn!(section = %name, "Deleting section items timed out");
            }
            Err(_) => {}
        }
        state.settle(result)
    }

    /// Upload an image for use in an item form.
    pub async fn upload_image(&self, path: &Path) -> OperationState<String> {
        let state = OperationState::Idle.begin();
        state.settle(self.api.upload_image(path).await)
    }

    fn replace_local(&mut self, item: &Item) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == item.id) {
            *slot = item.clone();
        }
    }
}

/// User-facing outcome line for a settled operation.
#[must_use]
pub fn describe<T>(state: &OperationState<T>, done: &str, failed: &str) -> String {
    match state {
        OperationState::Idle => "Cancelled".to_string(),
        OperationState::Pending => "Working...".to_string(),
        OperationState::Succeeded(_) => done.to_string(),
        OperationState::Failed(err) if err.is_timeout() => format!("{failed}: timed out"),
        OperationState::Failed(err) => format!("{failed}: {err}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Mutex;

    use after10_core::{AddonInput, NewItem, Price};
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    #[derive(Default)]
    struct FakeMenu {
        sections: Mutex<Vec<Section>>,
        items: Mutex<Vec<Item>>,
        next_id: Mutex<i32>,
        bulk_delete_times_out: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeMenu {
        fn next_id(&self) -> i32 {
            let mut id = self.next_id.lock().unwrap();
            *id += 1;
            *id
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn store(&self, id: ItemId, new_item: NewItem) -> Item {
            Item {
                id,
                name: new_item.name,
                section: new_item.section,
                price: new_item.price,
                image: new_item.image,
                in_stock: new_item.in_stock,
                addons: new_item.addons,
            }
        }

        fn invalid(err: impl std::fmt::Display) -> ApiError {
            ApiError::Api {
                status: 422,
                message: err.to_string(),
            }
        }

        fn not_found() -> ApiError {
            ApiError::Api {
                status: 404,
                message: "Not found".to_string(),
            }
        }
    }

    impl MenuApi for FakeMenu {
        async fn list_sections(&self) -> Result<Vec<Section>, ApiError> {
            Ok(self.sections.lock().unwrap().clone())
        }

        async fn list_items(&self) -> Result<Vec<Item>, ApiError> {
            Ok(self.items.lock().unwrap().clone())
        }

        async fn create_section(&self, name: &str) -> Result<Section, ApiError> {
            self.record("create_section");
            let name = SectionName::parse(name).map_err(Self::invalid)?;
            let mut sections = self.sections.lock().unwrap();
            if sections.iter().any(|s| s.name == name) {
                return Err(ApiError::Api {
                    status: 409,
                    message: "Section already exists".to_string(),
                });
            }
            let section = Section {
                id: SectionId::new(self.next_id()),
                name,
                created_at: Utc::now(),
            };
            sections.push(section.clone());
            Ok(section)
        }

        async fn rename_section(&self, id: SectionId, name: &str) -> Result<Section, ApiError> {
            self.record("rename_section");
            let name = SectionName::parse(name).map_err(Self::invalid)?;
            let mut sections = self.sections.lock().unwrap();
            let section = sections
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(Self::not_found)?;
            let old = std::mem::replace(&mut section.name, name.clone());
            for item in self.items.lock().unwrap().iter_mut() {
                if item.section == old {
                    item.section = name.clone();
                }
            }
            Ok(section.clone())
        }

        async fn delete_section(&self, id: SectionId) -> Result<SectionDeletion, ApiError> {
            self.record("delete_section");
            let mut sections = self.sections.lock().unwrap();
            let pos = sections
                .iter()
                .position(|s| s.id == id)
                .ok_or_else(Self::not_found)?;
            let section = sections.remove(pos);
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|i| i.section != section.name);
            Ok(SectionDeletion {
                section_deleted: true,
                items_deleted_count: (before - items.len()) as u64,
            })
        }

        async fn create_item(&self, input: &ItemInput) -> Result<Item, ApiError> {
            self.record("create_item");
            let new_item = input.clone().validate().map_err(Self::invalid)?;
            let item = self.store(ItemId::new(self.next_id()), new_item);
            self.items.lock().unwrap().push(item.clone());
            Ok(item)
        }

        async fn replace_item(&self, id: ItemId, input: &ItemInput) -> Result<Item, ApiError> {
            self.record("replace_item");
            let new_item = input.clone().validate().map_err(Self::invalid)?;
            let item = self.store(id, new_item);
            let mut items = self.items.lock().unwrap();
            let slot = items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(Self::not_found)?;
            *slot = item.clone();
            Ok(item)
        }

        async fn patch_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item, ApiError> {
            self.record("patch_item");
            let mut items = self.items.lock().unwrap();
            let slot = items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(Self::not_found)?;
            let merged = patch.clone().apply_to(slot).map_err(Self::invalid)?;
            *slot = self.store(id, merged);
            Ok(slot.clone())
        }

        async fn delete_item(&self, id: ItemId) -> Result<(), ApiError> {
            self.record("delete_item");
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|i| i.id != id);
            if items.len() == before {
                return Err(Self::not_found());
            }
            Ok(())
        }

        async fn delete_section_items(&self, id: SectionId) -> Result<u64, ApiError> {
            self.record("delete_section_items");
            if self.bulk_delete_times_out {
                return Err(ApiError::TimedOut);
            }
            let sections = self.sections.lock().unwrap();
            let section = sections
                .iter()
                .find(|s| s.id == id)
                .ok_or_else(Self::not_found)?;
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|i| i.section != section.name);
            Ok((before - items.len()) as u64)
        }

        async fn upload_image(&self, path: &Path) -> Result<String, ApiError> {
            self.record("upload_image");
            Ok(format!("/uploads/1_{}", path.display()))
        }
    }

    fn item_input(name: &str, section: &str, price: i64) -> ItemInput {
        ItemInput {
            name: name.to_string(),
            section: section.to_string(),
            price: Price::new(Decimal::new(price, 0)),
            image: "/uploads/dish.jpg".to_string(),
            in_stock: None,
            addons: Some(vec![AddonInput::default()]),
        }
    }

    /// Dashboard over a menu with "Mains" (two items) and "Drinks" (one).
    async fn seeded(fake: FakeMenu) -> Dashboard<FakeMenu> {
        let mains = fake.create_section("Mains").await.unwrap();
        fake.create_section("Drinks").await.unwrap();
        fake.create_item(&item_input("Paneer Roll", "Mains", 120))
            .await
            .unwrap();
        fake.create_item(&item_input("Chicken Roll", "Mains", 150))
            .await
            .unwrap();
        fake.create_item(&item_input("Lime Soda", "Drinks", 60))
            .await
            .unwrap();
        assert_eq!(mains.id, SectionId::new(1));
        fake.calls.lock().unwrap().clear();
        Dashboard::load(fake).await.unwrap()
    }

    fn mains() -> SectionName {
        SectionName::parse("Mains").unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let state: OperationState<u8> = OperationState::Idle;
        assert!(state.is_idle());

        let state = state.begin();
        assert!(state.is_pending());

        let state = state.settle(Ok::<_, ApiError>(7));
        assert!(state.is_succeeded());

        // Settled states don't move again.
        let state = state.begin().settle(Err::<u8, _>(ApiError::TimedOut));
        assert_eq!(state.succeeded(), Some(7));
    }

    #[test]
    fn test_settle_requires_pending() {
        let state: OperationState<u8> = OperationState::Idle.settle(Ok::<_, ApiError>(1));
        assert!(state.is_idle());
    }

    #[tokio::test]
    async fn test_load_fetches_sections_and_items() {
        let dashboard = seeded(FakeMenu::default()).await;
        assert_eq!(dashboard.sections().len(), 2);
        assert_eq!(dashboard.items().len(), 3);
        assert_eq!(dashboard.items_in(&mains()).count(), 2);
    }

    #[tokio::test]
    async fn test_add_section_appends_on_success() {
        let mut dashboard = seeded(FakeMenu::default()).await;
        let state = dashboard.add_section("Desserts").await;
        assert!(state.is_succeeded());
        assert_eq!(dashboard.sections().len(), 3);
        // Kept in name order, like the server's listing.
        assert_eq!(dashboard.sections()[0].name.as_str(), "Desserts");
    }

    #[tokio::test]
    async fn test_duplicate_section_leaves_list_unchanged() {
        let mut dashboard = seeded(FakeMenu::default()).await;
        let state = dashboard.add_section("Mains").await;

        let err = state.error().unwrap();
        assert!(err.to_string().contains("Section already exists"));
        assert_eq!(dashboard.sections().len(), 2);
    }

    #[tokio::test]
    async fn test_rename_section_relabels_items() {
        let mut dashboard = seeded(FakeMenu::default()).await;
        let state = dashboard.rename_section(SectionId::new(1), "Rolls").await;
        assert!(state.is_succeeded());

        let rolls = SectionName::parse("Rolls").unwrap();
        assert_eq!(dashboard.items_in(&rolls).count(), 2);
        assert_eq!(dashboard.items_in(&mains()).count(), 0);
    }

    #[tokio::test]
    async fn test_delete_section_declined_sends_nothing() {
        let mut dashboard = seeded(FakeMenu::default()).await;
        let mut prompts = Vec::new();
        let mut decline = |prompt: &str| {
            prompts.push(prompt.to_string());
            false
        };

        let state = dashboard
            .delete_section(SectionId::new(1), &mut decline)
            .await;

        assert!(state.is_idle());
        assert_eq!(prompts, vec![CONFIRM_DELETE_SECTION.to_string()]);
        assert!(dashboard.api().calls().is_empty());
        assert_eq!(dashboard.sections().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_section_cascades_locally() {
        let mut dashboard = seeded(FakeMenu::default()).await;
        let state = dashboard
            .delete_section(SectionId::new(1), &mut AlwaysConfirm)
            .await;

        let deletion = state.succeeded().unwrap();
        assert!(deletion.section_deleted);
        assert_eq!(deletion.items_deleted_count, 2);
        assert_eq!(dashboard.sections().len(), 1);
        assert_eq!(dashboard.items().len(), 1);
        assert_eq!(dashboard.items()[0].name, "Lime Soda");
    }

    #[tokio::test]
    async fn test_add_item_rejected_keeps_list() {
        let mut dashboard = seeded(FakeMenu::default()).await;
        let state = dashboard.add_item(&item_input("Free Lunch", "Mains", 0)).await;
        assert!(state.is_failed());
        assert_eq!(dashboard.items().len(), 3);
    }

    #[tokio::test]
    async fn test_update_item_replaces_in_place() {
        let mut dashboard = seeded(FakeMenu::default()).await;
        let id = dashboard.items()[0].id;
        let state = dashboard
            .update_item(id, &item_input("Paneer Tikka Roll", "Mains", 140))
            .await;

        assert!(state.is_succeeded());
        assert_eq!(dashboard.items()[0].name, "Paneer Tikka Roll");
        assert_eq!(dashboard.items().len(), 3);
    }

    #[tokio::test]
    async fn test_toggle_stock_flips_flag() {
        let mut dashboard = seeded(FakeMenu::default()).await;
        let id = dashboard.items()[1].id;
        assert!(dashboard.items()[1].in_stock);

        let state = dashboard.toggle_stock(id).await;
        assert!(state.is_succeeded());
        assert!(!dashboard.items()[1].in_stock);
        assert_eq!(dashboard.items()[1].name, "Chicken Roll");

        dashboard.toggle_stock(id).await;
        assert!(dashboard.items()[1].in_stock);
    }

    #[tokio::test]
    async fn test_toggle_stock_unknown_item() {
        let mut dashboard = seeded(FakeMenu::default()).await;
        let state = dashboard.toggle_stock(ItemId::new(999)).await;
        assert!(matches!(
            state.error(),
            Some(DashboardError::UnknownItem(_))
        ));
        assert!(dashboard.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_item_after_confirmation() {
        let mut dashboard = seeded(FakeMenu::default()).await;
        let id = dashboard.items()[2].id;
        let state = dashboard.delete_item(id, &mut AlwaysConfirm).await;
        assert!(state.is_succeeded());
        assert!(dashboard.item(id).is_none());
    }

    #[tokio::test]
    async fn test_clear_section_keeps_section() {
        let mut dashboard = seeded(FakeMenu::default()).await;
        let state = dashboard
            .clear_section(SectionId::new(1), &mut AlwaysConfirm)
            .await;

        assert_eq!(state.succeeded(), Some(2));
        assert_eq!(dashboard.sections().len(), 2);
        assert_eq!(dashboard.items_in(&mains()).count(), 0);
    }

    #[tokio::test]
    async fn test_clear_section_timeout_is_distinct() {
        let fake = FakeMenu {
            bulk_delete_times_out: true,
            ..FakeMenu::default()
        };
        let mut dashboard = seeded(fake).await;
        let state = dashboard
            .clear_section(SectionId::new(1), &mut AlwaysConfirm)
            .await;

        assert!(state.error().unwrap().is_timeout());
        assert_eq!(
            describe(&state, "Items deleted", "Failed to delete items"),
            "Failed to delete items: timed out"
        );
        assert_eq!(dashboard.items().len(), 3);
    }

    #[tokio::test]
    async fn test_upload_image_returns_url() {
        let dashboard = seeded(FakeMenu::default()).await;
        let state = dashboard.upload_image(Path::new("dish.jpg")).await;
        assert_eq!(state.succeeded().unwrap(), "/uploads/1_dish.jpg");
    }
}
