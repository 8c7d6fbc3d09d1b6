//! Marginalia CLI
//!
//! Command-line interface for Marginalia operations:
//! - Create and import an annotation database
//! - Run activity searches
//! - Check group names against the create-group form rules

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use marginalia::activity::{
    self, check_redirect, extract, ActivityResults, ExecuteOptions, RouteContext,
};
use marginalia::config::{generate_default_config, Config};
use marginalia::groups::{Blacklist, GroupForm, GroupSchema, LegacyGroupSchema};
use marginalia::query::TermSyntax;
use marginalia::storage::{Database, Dataset};

#[derive(Parser)]
#[command(name = "marginalia")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Annotation activity search")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: from config)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database
    Init,

    /// Import groups, documents and annotations from a JSON file
    Import {
        /// Path to JSON file
        path: PathBuf,
    },

    /// Run an activity search
    Search {
        /// Query, e.g. "tag:rust user:jane"
        query: String,
        /// Search within a group
        #[arg(long, conflicts_with = "user")]
        group: Option<String>,
        /// Search a user's annotations
        #[arg(long)]
        user: Option<String>,
        /// Maximum number of annotations
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Validate a group name
    CheckName {
        /// Proposed group name
        name: String,
        /// Use the legacy form rules (length only)
        #[arg(long)]
        legacy: bool,
        /// Blacklist file (default: from config)
        #[arg(long)]
        blacklist: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marginalia=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_default();
    let database_path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.storage.database_path());

    match cli.command {
        Commands::Init => {
            let db = open(&database_path)?;
            println!(
                "Database ready at {:?} ({} annotations)",
                database_path,
                db.annotation_count()?
            );
        }

        Commands::Import { path } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let dataset: Dataset = serde_json::from_str(&content)
                .with_context(|| format!("Invalid import file {:?}", path))?;

            let db = open(&database_path)?;
            let stats = db.import(&dataset)?;

            println!("Import results:");
            println!("  Groups: {}", stats.groups);
            println!("  Documents: {}", stats.documents);
            println!("  Annotations: {}", stats.annotations);
        }

        Commands::Search {
            query,
            group,
            user,
            page_size,
        } => {
            let route = match (group, user) {
                (Some(pubid), _) => RouteContext::group(pubid),
                (None, Some(username)) => RouteContext::user(username),
                (None, None) => RouteContext::Search,
            };

            let Some(mut structured) = extract(Some(query.as_str()), &route, &TermSyntax)? else {
                bail!("No query given");
            };

            if let Some(target) = check_redirect(&route, &mut structured, &TermSyntax) {
                println!("Redirect: {}", target.location());
                return Ok(());
            }

            let db = open(&database_path)?;
            let options =
                ExecuteOptions::new(page_size.unwrap_or(config.activity.page_size));
            let results = activity::execute(&db, &db, &structured, &options)?;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&results)?),
                _ => print_results(&results),
            }
        }

        Commands::CheckName {
            name,
            legacy,
            blacklist,
        } => {
            let form = GroupForm::new(name.as_str());
            let result = if legacy {
                LegacyGroupSchema.validate(&form)
            } else {
                let path = blacklist
                    .unwrap_or_else(|| PathBuf::from(&config.groups.blacklist_path));
                let blacklist = Arc::new(Blacklist::load_or_empty(&path));
                GroupSchema::with_blacklist(blacklist).validate(&form)
            };

            match result {
                Ok(valid) => println!("{:?} is a valid group name", valid.name),
                Err(errors) => {
                    for (field, messages) in errors.fields() {
                        for message in messages {
                            eprintln!("{}: {}", field, message);
                        }
                    }
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn open(path: &Path) -> anyhow::Result<Database> {
    Database::open(path).with_context(|| format!("Failed to open database {:?}", path))
}

fn print_results(results: &ActivityResults) {
    println!("{} matching annotations", results.total);

    for (name, buckets) in &results.aggregations {
        let summary: Vec<String> = buckets
            .iter()
            .map(|b| format!("{} ({})", b.key, b.count))
            .collect();
        println!("{}: {}", name, summary.join(", "));
    }

    for timeframe in &results.timeframes {
        println!();
        println!("{}", timeframe.label);
        println!("{}", "-".repeat(60));

        for bucket in &timeframe.document_buckets {
            println!("  {} [{}]", bucket.title, bucket.domain);
            for entry in &bucket.annotations {
                let group = entry
                    .group
                    .as_ref()
                    .map(|g| g.name.as_str())
                    .unwrap_or("-");
                println!(
                    "    {:<20} {:<20} {}",
                    entry.annotation.username,
                    group,
                    entry.annotation.updated.format("%Y-%m-%d %H:%M")
                );
            }
        }
    }
}
