use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use arcgis_hub::config::Config;
use arcgis_hub::content::{get_content_identifier, item_to_content};
use arcgis_hub::permissions::{CheckOptions, Permission, PolicyRegistry, check_permission};
use arcgis_hub::portal::PortalItem;
use arcgis_hub::search::{BackendType, Catalog, EntityType, HubSearchOptions, SearchApi};

#[derive(Parser)]
#[command(name = "arcgis-hub")]
#[command(about = "Evaluate Hub permissions, search catalogs and compose content")]
#[command(version)]
struct Cli {
    /// Path to hub.toml (defaults to $ARCGIS_HUB_CONFIG or the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a permission against the configured context
    Permission {
        /// Permission to check, e.g. hub:project:create
        #[arg(required_unless_present = "list")]
        permission: Option<String>,
        /// Entity JSON file supplying owner, canEdit, features and grants
        #[arg(short, long)]
        entity: Option<PathBuf>,
        /// List every known permission instead of checking one
        #[arg(long)]
        list: bool,
    },
    /// Search a catalog
    Search {
        /// Catalog JSON file
        #[arg(long)]
        catalog: PathBuf,
        /// Free text
        #[arg(short, long, default_value = "")]
        term: String,
        /// Search one collection of the catalog
        #[arg(long, conflicts_with = "scope")]
        collection: Option<String>,
        /// Search one scope of the catalog: item, group or user
        #[arg(long, default_value = "item")]
        scope: String,
        /// Page size
        #[arg(short, long)]
        num: Option<u32>,
        /// Search api: arcgis (Portal) or arcgis-hub (OGC)
        #[arg(long, default_value = "arcgis")]
        api: String,
    },
    /// Compose Hub content from an item JSON file
    Content {
        /// Item JSON file
        item: PathBuf,
        /// Site JSON used to pick the preferred identifier
        #[arg(long)]
        site: Option<PathBuf>,
    },
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arcgis_hub=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Permission {
            permission,
            entity,
            list,
        } => {
            let registry = PolicyRegistry::hub_default();
            if list {
                for permission in registry.permissions() {
                    println!("{}", permission);
                }
                return Ok(());
            }
            let Some(permission) = permission else {
                bail!("A permission is required");
            };
            let context = config.to_context()?;
            let entity = entity.as_deref().map(read_json).transpose()?;
            let options = match &entity {
                Some(entity) => CheckOptions::entity(entity),
                None => CheckOptions::default(),
            }
            .with_label("cli");
            let permission = Permission::new(permission);
            let response = check_permission(&registry, &permission, &context, options);
            print_json(&response)?;
            if !response.access {
                std::process::exit(1);
            }
        }
        Commands::Search {
            catalog,
            term,
            collection,
            scope,
            num,
            api,
        } => {
            let context = config.to_context()?;
            let catalog = Catalog::from_json(read_json(&catalog)?, context)?;
            let api_type: BackendType = api.parse().map_err(anyhow::Error::msg)?;
            let options = HubSearchOptions {
                num,
                api: (api_type == BackendType::ArcgisHub).then(|| SearchApi {
                    api_type,
                    url: config.search_api_url(),
                }),
                ..Default::default()
            };
            let response = match collection {
                Some(name) => {
                    catalog
                        .get_collection(&name)?
                        .search(term.as_str(), options)
                        .await?
                }
                None => match scope.parse::<EntityType>().map_err(anyhow::Error::msg)? {
                    EntityType::Item => catalog.search_items(term.as_str(), options).await?,
                    EntityType::Group => catalog.search_groups(term.as_str(), options).await?,
                    EntityType::User => catalog.search_users(term.as_str(), options).await?,
                    EntityType::Event => bail!("Catalogs cannot be searched for events"),
                },
            };
            print_json(&response)?;
        }
        Commands::Content { item, site } => {
            let item: PortalItem = serde_json::from_value(read_json(&item)?)
                .context("Item JSON does not look like a Portal item")?;
            let site = site.as_deref().map(read_json).transpose()?;
            let content = item_to_content(&item);
            let identifier = get_content_identifier(&content, site.as_ref());
            print_json(&json!({ "identifier": identifier, "content": content }))?;
        }
    }

    Ok(())
}
