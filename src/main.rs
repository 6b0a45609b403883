//! # Markflow CLI (`markflow`)
//!
//! Manages the bookmark collection from the terminal and starts the JSON
//! HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! markflow --config ./config/markflow.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `markflow init` | Create the SQLite database and run schema migrations |
//! | `markflow serve` | Start the HTTP server |
//! | `markflow fetch <url>` | Scrape a page's title and description |
//! | `markflow list` | List bookmarks (`--sort`, `--category`, `--search`) |
//! | `markflow add --url <url> --name <name>` | Save a bookmark |
//! | `markflow rate <id> <rating>` | Set a 0–5 rating |
//! | `markflow delete <id>` | Delete a bookmark |
//! | `markflow clear` | Delete every user-created bookmark |
//! | `markflow export` | Print or write the JSON export |
//! | `markflow categories` | List categories |
//! | `markflow add-category <name>` | Create a category |
//! | `markflow visit <id>` | Record a visit and print the URL |
//! | `markflow frequent` | Most recently visited bookmarks |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use log::warn;
use serde_json::json;
use std::path::PathBuf;

use markflow::config::{self, Config};
use markflow::service::BookmarkService;
use markflow::{export, fetch, migrate, server, visits};
use markflow_core::categories::{is_known_icon, is_palette_color, DEFAULT_COLOR, DEFAULT_ICON};
use markflow_core::models::{BookmarkInput, CategoryInput};
use markflow_core::view::{parse_category_list, SortOption, ViewQuery};

/// Markflow: a personal bookmark manager.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/markflow.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "markflow",
    about = "Markflow: a personal bookmark manager with page-metadata scraping",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/markflow.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Fetch a page and print its title and description.
    Fetch { url: String },

    /// List bookmarks.
    List {
        /// recently-added, rating-desc, rating-asc, name-asc, or name-desc.
        #[arg(long)]
        sort: Option<SortOption>,

        /// Category slug, repeatable or comma separated; `all` matches everything.
        #[arg(long, value_delimiter = ',')]
        category: Vec<String>,

        /// Case-insensitive match on name or description.
        #[arg(long)]
        search: Option<String>,
    },

    /// Save a bookmark.
    Add {
        #[arg(long)]
        url: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Free-text category name.
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        category_slug: Option<String>,
        #[arg(long)]
        logo_url: Option<String>,
        /// 0–5; anything else is stored as 0.
        #[arg(long, allow_negative_numbers = true)]
        rating: Option<f64>,
    },

    /// Set a bookmark's rating (0–5).
    Rate {
        id: String,
        #[arg(allow_negative_numbers = true)]
        rating: f64,
    },

    /// Delete a bookmark.
    Delete { id: String },

    /// Delete every user-created bookmark. Seeded bookmarks stay.
    Clear,

    /// Export all bookmarks as JSON.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List built-in and user categories.
    Categories {
        #[arg(long)]
        with_counts: bool,
    },

    /// Create a category.
    AddCategory {
        name: String,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },

    /// Record a visit to a bookmark and print its URL.
    Visit { id: String },

    /// Show the most recently visited bookmarks.
    Frequent,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // `fetch` works without a config file.
    let cfg = match (&cli.command, config::load_config(&cli.config)) {
        (Commands::Fetch { .. }, Err(_)) => Config::with_db("./data/markflow.sqlite"),
        (_, loaded) => loaded?,
    };

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized at {}", cfg.db.path.display());
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Fetch { url } => {
            fetch::run_fetch(&cfg, &url).await?;
        }
        Commands::List {
            sort,
            category,
            search,
        } => {
            let service = BookmarkService::from_config(&cfg).await?;
            let query = ViewQuery {
                sort,
                category: parse_category_list(category),
                search,
            };
            let bookmarks = service.list_bookmarks(&query).await?;
            if let Some(sort) = sort {
                println!("Sorted by: {}", sort.label());
            }
            if bookmarks.is_empty() {
                println!("No bookmarks.");
            }
            for b in &bookmarks {
                println!(
                    "{}  {:.1}★  {}  [{}]  {}",
                    b.id, b.rating, b.name, b.category_slug, b.url
                );
            }
        }
        Commands::Add {
            url,
            name,
            description,
            category,
            category_slug,
            logo_url,
            rating,
        } => {
            let service = BookmarkService::from_config(&cfg).await?;
            let input = BookmarkInput {
                url: Some(url),
                name: Some(name),
                description,
                category,
                category_slug,
                logo_url,
                rating: rating.map(|r| json!(r)),
            };
            let bookmark = service.create_bookmark(&input).await?;
            println!("Added {} ({})", bookmark.id, bookmark.name);
        }
        Commands::Rate { id, rating } => {
            let service = BookmarkService::from_config(&cfg).await?;
            let bookmark = service.update_rating(&id, Some(&json!(rating))).await?;
            println!("Rated {} {:.1}★", bookmark.id, bookmark.rating);
        }
        Commands::Delete { id } => {
            let service = BookmarkService::from_config(&cfg).await?;
            service.delete_bookmark(&id).await?;
            println!("Deleted {}", id);
        }
        Commands::Clear => {
            let service = BookmarkService::from_config(&cfg).await?;
            let removed = service.clear_user_bookmarks().await?;
            println!("Removed {} user bookmarks", removed);
        }
        Commands::Export { output } => {
            let service = BookmarkService::from_config(&cfg).await?;
            export::run_export(&service, output.as_deref()).await?;
        }
        Commands::Categories { with_counts } => {
            let service = BookmarkService::from_config(&cfg).await?;
            for c in service.list_categories(with_counts).await? {
                let icon = c.category.icon.as_deref().unwrap_or(DEFAULT_ICON);
                let color = c.category.color.as_deref().unwrap_or(DEFAULT_COLOR);
                match c.count {
                    Some(count) => println!(
                        "{:<16} {:<20} {:<12} {}  {}",
                        c.category.slug, c.category.name, icon, color, count
                    ),
                    None => println!(
                        "{:<16} {:<20} {:<12} {}",
                        c.category.slug, c.category.name, icon, color
                    ),
                }
            }
        }
        Commands::AddCategory { name, icon, color } => {
            if let Some(icon) = icon.as_deref().filter(|i| !is_known_icon(i)) {
                warn!("icon '{}' is not a built-in icon", icon);
            }
            if let Some(color) = color.as_deref().filter(|c| !is_palette_color(c)) {
                warn!("color '{}' is not in the palette", color);
            }
            let service = BookmarkService::from_config(&cfg).await?;
            let input = CategoryInput {
                name: Some(name),
                icon: icon.map(|i| json!(i)),
                color: color.map(|c| json!(c)),
            };
            let category = service.create_category(&input).await?;
            println!("Category {} ({})", category.slug, category.name);
        }
        Commands::Visit { id } => {
            let service = BookmarkService::from_config(&cfg).await?;
            visits::run_visit(&cfg, &service, &id).await?;
        }
        Commands::Frequent => {
            let service = BookmarkService::from_config(&cfg).await?;
            visits::run_frequent(&cfg, &service).await?;
        }
    }

    Ok(())
}
