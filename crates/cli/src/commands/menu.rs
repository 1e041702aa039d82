//! Menu management commands.
//!
//! These talk to a running admin server through the dashboard, so every
//! change goes through the same API the server exposes.
//!
//! # Usage
//!
//! ```bash
//! a10-cli section list
//! a10-cli section add "Midnight Maggi"
//! a10-cli section rename 3 "Late Night Maggi"
//! a10-cli section delete 3
//!
//! a10-cli item add --name "Cheese Maggi" --section "Midnight Maggi" \
//!     --price 90 --image-file ./maggi.jpg --addon "Extra cheese=20"
//! a10-cli item stock 12
//! a10-cli item clear-section 3 --yes
//!
//! a10-cli upload ./maggi.jpg
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_API_URL` - Admin server (default: `http://localhost:3001`)
//! - `ADMIN_API_TOKEN` - Bearer token configured on the server

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use after10_admin::client::{AdminApi, ApiError, DEFAULT_BASE_URL};
use after10_admin::dashboard::{Confirm, Dashboard, OperationState, describe};
use after10_core::{AddonInput, Item, ItemId, ItemInput, ItemPatch, Price, SectionId, SectionName};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur while managing the menu.
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Admin API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Failed(String),
}

/// Confirmation for destructive commands.
#[derive(Debug, Clone, Copy)]
pub enum CliConfirm {
    /// Ask on stdin.
    Prompt,
    /// `--yes` was passed.
    Assume,
}

impl CliConfirm {
    #[must_use]
    pub const fn from_flag(yes: bool) -> Self {
        if yes { Self::Assume } else { Self::Prompt }
    }
}

impl Confirm for CliConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        match self {
            Self::Assume => true,
            Self::Prompt => off_runtime(|| {
                ask(
                    &mut std::io::stdin().lock(),
                    &mut std::io::stdout().lock(),
                    prompt,
                )
            }),
        }
    }
}

/// Run blocking terminal IO without stalling the async runtime's workers.
fn off_runtime<T>(f: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Write the prompt and read one line of answer. IO errors count as "no".
fn ask(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> bool {
    if write!(output, "{prompt} [y/N] ")
        .and_then(|()| output.flush())
        .is_err()
    {
        return false;
    }
    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Parse `Name=Price` into an add-on row.
///
/// # Errors
///
/// Returns a message when the `=` or the price is missing or invalid.
pub fn parse_addon(raw: &str) -> Result<AddonInput, String> {
    let (name, price) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=PRICE, got '{raw}'"))?;
    let price: Decimal = price
        .trim()
        .parse()
        .map_err(|e| format!("invalid add-on price '{price}': {e}"))?;
    Ok(AddonInput {
        name: name.trim().to_string(),
        price: Some(Price::new(price)),
    })
}

/// Fields shared by `item add` and `item update`.
#[derive(Debug, Clone, Default)]
pub struct ItemFields {
    pub name: Option<String>,
    pub section: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub image_file: Option<PathBuf>,
    pub in_stock: Option<bool>,
    pub addons: Vec<AddonInput>,
}

async fn connect() -> Result<Dashboard<AdminApi>, MenuError> {
    dotenvy::dotenv().ok();

    let base_url = std::env::var("ADMIN_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let token = std::env::var("ADMIN_API_TOKEN")
        .map(SecretString::from)
        .map_err(|_| MenuError::MissingEnvVar("ADMIN_API_TOKEN"))?;

    let api = AdminApi::new(&base_url, &token)?;
    tracing::debug!(base_url = %api.base_url(), "Loading menu");
    Ok(Dashboard::load(api).await?)
}

/// Print the outcome line, or turn a failure into an error.
#[allow(clippy::print_stdout)]
fn report<T>(state: OperationState<T>, done: &str, failed: &str) -> Result<Option<T>, MenuError> {
    let line = describe(&state, done, failed);
    if state.is_failed() {
        return Err(MenuError::Failed(line));
    }
    println!("{line}");
    Ok(state.succeeded())
}

#[allow(clippy::print_stdout)]
fn print_item(item: &Item) {
    let stock = if item.in_stock { "in stock" } else { "out of stock" };
    println!(
        "#{:<4} {} [{}] {} ({stock})",
        item.id, item.name, item.section, item.price
    );
    for addon in &item.addons {
        println!("        + {} {}", addon.name, addon.price);
    }
}

// =============================================================================
// Sections
// =============================================================================

/// List sections with their item counts.
#[allow(clippy::print_stdout)]
pub async fn list_sections() -> Result<(), MenuError> {
    let dashboard = connect().await?;
    for section in dashboard.sections() {
        println!(
            "#{:<4} {} ({} items)",
            section.id,
            section.name,
            dashboard.items_in(&section.name).count()
        );
    }
    Ok(())
}

/// Create a section.
pub async fn add_section(name: &str) -> Result<(), MenuError> {
    let mut dashboard = connect().await?;
    let state = dashboard.add_section(name).await;
    report(state, "Section added", "Failed to add section")?;
    Ok(())
}

/// Rename a section and its items.
pub async fn rename_section(id: i32, name: &str) -> Result<(), MenuError> {
    let mut dashboard = connect().await?;
    let state = dashboard.rename_section(SectionId::new(id), name).await;
    report(state, "Section renamed", "Failed to rename section")?;
    Ok(())
}

/// Delete a section and all its items.
#[allow(clippy::print_stdout)]
pub async fn delete_section(id: i32, mut confirm: CliConfirm) -> Result<(), MenuError> {
    let mut dashboard = connect().await?;
    let state = dashboard
        .delete_section(SectionId::new(id), &mut confirm)
        .await;
    if let Some(deletion) = report(state, "Section deleted", "Failed to delete section")? {
        println!("{} items removed", deletion.items_deleted_count);
    }
    Ok(())
}

// =============================================================================
// Items
// =============================================================================

/// List items, optionally only one section's.
pub async fn list_items(section: Option<&str>) -> Result<(), MenuError> {
    let dashboard = connect().await?;
    match section {
        Some(name) => {
            let name =
                SectionName::parse(name).map_err(|e| MenuError::InvalidArgument(e.to_string()))?;
            dashboard.items_in(&name).for_each(print_item);
        }
        None => dashboard.items().iter().for_each(print_item),
    }
    Ok(())
}

/// Upload `image_file` if given, otherwise use `image` as is.
async fn resolve_image(
    dashboard: &Dashboard<AdminApi>,
    fields: &ItemFields,
) -> Result<Option<String>, MenuError> {
    match &fields.image_file {
        Some(path) => {
            let state = dashboard.upload_image(path).await;
            report(state, "Image uploaded", "Failed to upload image")
        }
        None => Ok(fields.image.clone()),
    }
}

/// Create an item.
pub async fn add_item(fields: ItemFields) -> Result<(), MenuError> {
    let (Some(name), Some(section), Some(price)) =
        (fields.name.clone(), fields.section.clone(), fields.price)
    else {
        return Err(MenuError::InvalidArgument(
            "--name, --section and --price are required".to_string(),
        ));
    };

    let mut dashboard = connect().await?;
    let image = resolve_image(&dashboard, &fields).await?.unwrap_or_default();

    let input = ItemInput {
        name,
        section,
        price: Price::new(price),
        image,
        in_stock: fields.in_stock,
        addons: Some(fields.addons),
    };

    let state = dashboard.add_item(&input).await;
    if let Some(item) = report(state, "Item added", "Failed to add item")? {
        print_item(&item);
    }
    Ok(())
}

/// Edit some fields of an item. Add-ons given here replace the existing set.
pub async fn update_item(id: i32, fields: ItemFields) -> Result<(), MenuError> {
    let mut dashboard = connect().await?;
    let id = ItemId::new(id);
    let image = resolve_image(&dashboard, &fields).await?;

    let current = dashboard
        .item(id)
        .ok_or_else(|| MenuError::InvalidArgument(format!("no item with id {id}")))?;

    let patch = ItemPatch {
        name: fields.name,
        section: fields.section,
        price: fields.price.map(Price::new),
        image,
        in_stock: fields.in_stock,
        addons: (!fields.addons.is_empty()).then_some(fields.addons),
    };
    let merged = patch
        .apply_to(current)
        .map_err(|e| MenuError::InvalidArgument(e.to_string()))?;

    let state = dashboard.update_item(id, &ItemInput::from(merged)).await;
    if let Some(item) = report(state, "Item updated", "Failed to update item")? {
        print_item(&item);
    }
    Ok(())
}

/// Flip an item between in stock and out of stock.
pub async fn toggle_stock(id: i32) -> Result<(), MenuError> {
    let mut dashboard = connect().await?;
    let state = dashboard.toggle_stock(ItemId::new(id)).await;
    if let Some(item) = report(state, "Stock updated", "Failed to update stock")? {
        print_item(&item);
    }
    Ok(())
}

/// Delete an item.
pub async fn delete_item(id: i32, mut confirm: CliConfirm) -> Result<(), MenuError> {
    let mut dashboard = connect().await?;
    let state = dashboard.delete_item(ItemId::new(id), &mut confirm).await;
    report(state, "Item deleted", "Failed to delete item")?;
    Ok(())
}

/// Delete every item in a section, keeping the section.
#[allow(clippy::print_stdout)]
pub async fn clear_section(section_id: i32, mut confirm: CliConfirm) -> Result<(), MenuError> {
    let mut dashboard = connect().await?;
    let state = dashboard
        .clear_section(SectionId::new(section_id), &mut confirm)
        .await;
    if let Some(count) = report(state, "Items deleted", "Failed to delete items")? {
        println!("{count} items removed");
    }
    Ok(())
}

// =============================================================================
// Uploads
// =============================================================================

/// Upload an image and print its URL.
#[allow(clippy::print_stdout)]
pub async fn upload(path: &Path) -> Result<(), MenuError> {
    let dashboard = connect().await?;
    let state = dashboard.upload_image(path).await;
    if let Some(url) = report(state, "Image uploaded", "Failed to upload image")? {
        println!("{url}");
    }
    Ok(())
}
