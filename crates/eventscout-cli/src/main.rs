use std::path::{Path, PathBuf};

use clap::Parser;
use eventscout_core::{
    config::DatabaseConfig, providers::TicketmasterProvider, Config, DbConnection, Gateway, Item,
    OrEmpty,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "eventscout")]
#[command(version, about = "Find events nearby and keep your favorites", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/eventscout/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite cache file
    #[arg(long, global = true, env = "EVENTSCOUT_DB")]
    db: Option<PathBuf>,

    /// Ticketmaster Discovery API key
    #[arg(long, global = true, env = "TICKETMASTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Search events near a point and cache the results
    Search {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Keyword, e.g. "jazz"
        term: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Manage a user's favorites
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },
    /// Show the cached categories of an item
    Categories { item_id: String },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Check a user's password
    Login {
        user_id: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(clap::Subcommand)]
enum FavoriteAction {
    /// Favorite one or more items
    Add {
        #[arg(long)]
        user: String,
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Unfavorite one or more items
    Remove {
        #[arg(long)]
        user: String,
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// List favorites from the cache
    List {
        #[arg(long)]
        user: String,
        /// Only print item ids
        #[arg(long)]
        ids: bool,
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Subcommand)]
enum UserAction {
    /// Register a user
    Add {
        user_id: String,
        #[arg(long)]
        first: String,
        #[arg(long)]
        last: String,
        #[arg(long)]
        password: String,
    },
    /// Print a user's full name
    Name { user_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventscout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("No command specified. Try --help");
        return Ok(());
    };

    let mut config = load_config(cli.config.as_deref());
    if let Some(db) = cli.db {
        config.database.path = Some(db);
    }
    if let Some(key) = cli.api_key {
        config.ticketmaster.api_key = Some(key);
    }

    let gateway = open_gateway(&config.database);

    match command {
        Commands::Search {
            lat,
            lon,
            term,
            json,
        } => {
            let gateway = match TicketmasterProvider::from_config(&config.ticketmaster) {
                Ok(provider) => gateway.with_provider(Box::new(provider)),
                Err(e) => {
                    tracing::warn!("{}", e);
                    gateway
                }
            };
            let term = term.unwrap_or_default();
            tracing::info!("Searching for '{}' near {},{}", term, lat, lon);

            let items = gateway.search_items(lat, lon, &term).await;
            print_items(&items, json)?;
            gateway.close();
        }
        Commands::Favorite { action } => {
            match action {
                FavoriteAction::Add { user, items } => {
                    gateway
                        .set_favorite_items(&user, &items)
                        .or_empty("set_favorite_items");
                }
                FavoriteAction::Remove { user, items } => {
                    gateway
                        .unset_favorite_items(&user, &items)
                        .or_empty("unset_favorite_items");
                }
                FavoriteAction::List { user, ids, json } => {
                    if ids {
                        let mut ids: Vec<String> = gateway
                            .favorite_item_ids(&user)
                            .or_empty("favorite_item_ids")
                            .into_iter()
                            .collect();
                        ids.sort();
                        for id in ids {
                            println!("{}", id);
                        }
                    } else {
                        let mut items: Vec<Item> = gateway
                            .favorite_items(&user)
                            .or_empty("favorite_items")
                            .into_iter()
                            .collect();
                        items.sort_by(|a, b| a.name.cmp(&b.name));
                        print_items(&items, json)?;
                    }
                }
            }
            gateway.close();
        }
        Commands::Categories { item_id } => {
            let mut categories: Vec<String> = gateway
                .categories(&item_id)
                .or_empty("categories")
                .into_iter()
                .collect();
            categories.sort();
            for category in categories {
                println!("{}", category);
            }
            gateway.close();
        }
        Commands::User { action } => {
            match action {
                UserAction::Add {
                    user_id,
                    first,
                    last,
                    password,
                } => {
                    if gateway
                        .register_user(&user_id, &password, &first, &last)
                        .or_empty("register_user")
                    {
                        println!("Created user {}", user_id);
                    } else {
                        println!("User {} was not created", user_id);
                    }
                }
                UserAction::Name { user_id } => {
                    println!("{}", gateway.full_name(&user_id).or_empty("full_name"));
                }
            }
            gateway.close();
        }
        Commands::Login { user_id, password } => {
            if gateway
                .verify_login(&user_id, &password)
                .or_empty("verify_login")
            {
                println!("Login OK for {}", user_id);
            } else {
                println!("Login denied");
            }
            gateway.close();
        }
    }

    Ok(())
}

/// A broken or unreadable config file means defaults, not a crash
fn load_config(path: Option<&Path>) -> Config {
    let loaded = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!("Using default config: {}", e);
        Config::default()
    })
}

/// Open the cache, falling back to an unavailable gateway when the database
/// location can't be worked out or created
fn open_gateway(database: &DatabaseConfig) -> Gateway {
    let db_path = match database.db_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::error!("No database location: {}", e);
            return Gateway::unavailable();
        }
    };
    if let Some(parent) = db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!("Could not create {}: {}", parent.display(), e);
        }
    }
    Gateway::open(&db_path, database.store_options())
}

fn print_items(items: &[Item], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No results");
        return Ok(());
    }

    for item in items {
        let mut categories: Vec<&str> = item.categories.iter().map(String::as_str).collect();
        categories.sort_unstable();
        println!(
            "{:<24} {:<40} {:>6.1} mi  [{}]",
            item.item_id,
            item.name,
            item.distance,
            categories.join(", ")
        );
        if !item.address.is_empty() {
            println!("{:<24} {}", "", item.address);
        }
    }
    Ok(())
}
