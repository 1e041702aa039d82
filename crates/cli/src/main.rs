//! After10 CLI - Database migrations and menu management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! a10-cli migrate storefront
//!
//! # Run admin database migrations
//! a10-cli migrate admin
//!
//! # Run all database migrations
//! a10-cli migrate all
//!
//! # Manage the menu on a running admin server
//! a10-cli section add "Midnight Maggi"
//! a10-cli item add --name "Cheese Maggi" --section "Midnight Maggi" --price 90 --image /uploads/maggi.jpg
//! a10-cli item stock 12
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `section` - List, add, rename and delete sections
//! - `item` - List, add, update, restock and delete items
//! - `upload` - Upload an image and print its URL

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use after10_core::AddonInput;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use commands::menu::{self, CliConfirm, ItemFields};

mod commands;

#[derive(Parser)]
#[command(name = "a10-cli")]
#[command(author, version, about = "After10 CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Manage menu sections
    Section {
        #[command(subcommand)]
        action: SectionAction,
    },
    /// Manage menu items
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },
    /// Upload an image and print its URL
    Upload {
        /// Image file to upload
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run storefront database migrations
    Storefront,
    /// Run admin database migrations
    Admin,
    /// Run all database migrations
    All,
}

#[derive(Subcommand)]
enum SectionAction {
    /// List sections
    List,
    /// Create a section
    Add {
        /// Section name (1-50 characters)
        name: String,
    },
    /// Rename a section; its items move with it
    Rename {
        /// Section ID
        id: i32,
        /// New name
        name: String,
    },
    /// Delete a section and all of its items
    Delete {
        /// Section ID
        id: i32,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ItemAction {
    /// List items
    List {
        /// Only show this section's items
        #[arg(short, long)]
        section: Option<String>,
    },
    /// Create an item
    Add(ItemArgs),
    /// Change some fields of an item
    Update {
        /// Item ID
        id: i32,
        #[command(flatten)]
        fields: ItemArgs,
    },
    /// Toggle an item between in stock and out of stock
    Stock {
        /// Item ID
        id: i32,
    },
    /// Delete an item
    Delete {
        /// Item ID
        id: i32,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete every item in a section, keeping the section
    ClearSection {
        /// Section ID
        section_id: i32,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args)]
struct ItemArgs {
    /// Item name
    #[arg(short, long)]
    name: Option<String>,

    /// Section name
    #[arg(short, long)]
    section: Option<String>,

    /// Price in rupees
    #[arg(short, long)]
    price: Option<Decimal>,

    /// Image URL
    #[arg(long, conflicts_with = "image_file")]
    image: Option<String>,

    /// Local image to upload first
    #[arg(long)]
    image_file: Option<PathBuf>,

    /// Mark the item out of stock
    #[arg(long)]
    out_of_stock: bool,

    /// Add-on as NAME=PRICE (repeatable)
    #[arg(short, long = "addon", value_parser = menu::parse_addon)]
    addons: Vec<AddonInput>,
}

impl From<ItemArgs> for ItemFields {
    fn from(args: ItemArgs) -> Self {
        Self {
            name: args.name,
            section: args.section,
            price: args.price,
            image: args.image,
            image_file: args.image_file,
            in_stock: args.out_of_stock.then_some(false),
            addons: args.addons,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "after10_cli=info,after10_admin=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Section { action } => match action {
            SectionAction::List => menu::list_sections().await?,
            SectionAction::Add { name } => menu::add_section(&name).await?,
            SectionAction::Rename { id, name } => menu::rename_section(id, &name).await?,
            SectionAction::Delete { id, yes } => {
                menu::delete_section(id, CliConfirm::from_flag(yes)).await?;
            }
        },
        Commands::Item { action } => match action {
            ItemAction::List { section } => menu::list_items(section.as_deref()).await?,
            ItemAction::Add(args) => menu::add_item(args.into()).await?,
            ItemAction::Update { id, fields } => menu::update_item(id, fields.into()).await?,
            ItemAction::Stock { id } => menu::toggle_stock(id).await?,
            ItemAction::Delete { id, yes } => {
                menu::delete_item(id, CliConfirm::from_flag(yes)).await?;
            }
            ItemAction::ClearSection { section_id, yes } => {
                menu::clear_section(section_id, CliConfirm::from_flag(yes)).await?;
            }
        },
        Commands::Upload { path } => menu::upload(&path).await?,
    }
    Ok(())
}
