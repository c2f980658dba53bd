//! Warehouse Audit Report
//!
//! Reads the audit log collection and prints JSON:
//! - `activity [days]`: created / updated / deleted counts
//! - `user <name> [page]`: everything a user did or had done to them
//! - `show <id>`: one flattened record
//! - `recent [page]`: newest events, optionally filtered

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mongodb::Client as MongoClient;
use serde::Serialize;
use tracing::info;

use wh_audit::{
    ActivityAggregator, AuditAction, AuditCollection, AuditFilters, AuditService, AuditStore,
    MongoAuditCollection, SystemClock,
};
use wh_config::{AppConfig, ConfigLoader};

#[derive(Parser, Debug)]
#[command(name = "wh-audit-report")]
#[command(about = "Warehouse audit log reports")]
struct Args {
    /// Config file (otherwise WAREHOUSE_CONFIG or the standard locations)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Page size for listings
    #[arg(long, env = "WAREHOUSE_REPORT_PAGE_SIZE")]
    page_size: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Activity counts over the last N days
    Activity { days: Option<u32> },

    /// Events where the user is the actor or the target
    User { name: String, page: Option<u32> },

    /// One audit record by id
    Show { id: String },

    /// Most recent events
    Recent {
        page: Option<u32>,
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long)]
        target_resource: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },

    /// Print an example configuration file
    ExampleConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    wh_common::init_logging("wh-audit-report");

    let args = Args::parse();

    if let Command::ExampleConfig = args.command {
        println!("{}", AppConfig::example_toml());
        return Ok(());
    }

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path.clone()),
        None => ConfigLoader::new(),
    };
    let config = loader.load()?;

    let mongo_client = MongoClient::with_uri_str(&config.mongodb.uri).await?;
    let db = mongo_client.database(&config.mongodb.database);
    info!(
        database = %config.mongodb.database,
        collection = %config.audit.collection,
        "Connected to MongoDB"
    );

    let mongo = MongoAuditCollection::new(&db, &config.audit.collection);
    if config.audit.ensure_indexes {
        mongo.ensure_indexes().await?;
    }

    let collection: Arc<dyn AuditCollection> = Arc::new(mongo);
    let clock = Arc::new(SystemClock);
    let store = Arc::new(AuditStore::with_clock(collection.clone(), clock.clone()));
    let service = AuditService::new(store, config.audit.clone());
    let aggregator = ActivityAggregator::new(collection, clock, config.audit.clone());

    match args.command {
        Command::Activity { days } => {
            let counts = match days {
                Some(days) => aggregator.activity_counts(days).await?,
                None => aggregator.activity_counts_default().await?,
            };
            print_json(&counts)?;
        }
        Command::User { name, page } => {
            let page = service.activity(&name, page, args.page_size).await?;
            print_json(&page)?;
        }
        Command::Show { id } => match service.get(&id).await? {
            Some(record) => print_json(&record)?,
            None => anyhow::bail!("Audit record not found: {id}"),
        },
        Command::Recent { page, action, actor, target_resource, search } => {
            let filters = AuditFilters {
                action: action.as_deref().map(str::parse::<AuditAction>).transpose()?,
                actor,
                target_resource,
                search,
                ..AuditFilters::default()
            };
            let page = service.list(&filters, page, args.page_size).await?;
            print_json(&page)?;
        }
        Command::ExampleConfig => {}
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
