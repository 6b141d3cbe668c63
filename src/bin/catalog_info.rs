//! Inspect a color catalog and the resources it provisions.
//!
//! Usage:
//!   catalog-info list [--json]
//!   catalog-info --catalog /usr/share/colorer/catalog.xml grammars
//!   catalog-info styled --class rgb --name default
//!   catalog-info text

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colorer_factory::{ParserFactory, version};
use log::{LevelFilter, debug};
use serde::Serialize;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "catalog-info")]
#[command(about = "Load a color catalog and report what it provides", version)]
struct Cli {
    /// Catalog path; the standard locations are searched when omitted.
    #[arg(long)]
    catalog: Option<String>,
    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List hrd classes, scheme names and descriptions.
    List {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Load every grammar source and list the declared file types.
    Grammars,
    /// Build a styled mapper and report its regions.
    Styled {
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Build a text mapper and report its regions.
    Text {
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Serialize)]
struct CatalogListing {
    catalog: String,
    hrc_locations: Vec<String>,
    hrd_classes: Vec<HrdClassListing>,
}

#[derive(Serialize)]
struct HrdClassListing {
    class: String,
    schemes: Vec<HrdSchemeListing>,
}

#[derive(Serialize)]
struct HrdSchemeListing {
    name: String,
    description: String,
    locations: Vec<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_level = LevelFilter::from_str(&cli.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", cli.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    debug!(version = version(); "Starting catalog-info");

    let factory = ParserFactory::load_catalog(cli.catalog.as_deref())
        .context("loading catalog")?;

    match cli.command {
        Command::List { json } => list(&factory, json),
        Command::Grammars => grammars(&factory),
        Command::Styled { class, name } => {
            let mapper = factory
                .create_styled_mapper(class.as_deref(), name.as_deref())
                .context("building styled mapper")?;
            println!("{} regions", mapper.region_count());
            for region in mapper.region_names() {
                println!("  {region}");
            }
            Ok(())
        }
        Command::Text { name } => {
            let mapper = factory
                .create_text_mapper(name.as_deref())
                .context("building text mapper")?;
            println!("{} regions", mapper.region_count());
            for region in mapper.region_names() {
                println!("  {region}");
            }
            Ok(())
        }
    }
}

fn listing(factory: &ParserFactory) -> CatalogListing {
    let catalog = factory.catalog();
    let hrd_classes = catalog
        .hrd
        .classes()
        .map(|class| HrdClassListing {
            class: class.to_string(),
            schemes: catalog
                .hrd
                .names(class)
                .map(|name| HrdSchemeListing {
                    name: name.to_string(),
                    description: factory
                        .hrd_description(class, name)
                        .unwrap_or(name)
                        .to_string(),
                    locations: catalog
                        .hrd
                        .locations(class, name)
                        .map(<[String]>::to_vec)
                        .unwrap_or_default(),
                })
                .collect(),
        })
        .collect();

    CatalogListing {
        catalog: factory.catalog_path().display().to_string(),
        hrc_locations: catalog.hrc_locations.clone(),
        hrd_classes,
    }
}

fn list(factory: &ParserFactory, json: bool) -> Result<()> {
    let listing = listing(factory);
    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("catalog: {}", listing.catalog);
    println!("hrc locations: {}", listing.hrc_locations.len());
    for class in &listing.hrd_classes {
        println!("{}:", class.class);
        for scheme in &class.schemes {
            println!("  {} - {}", scheme.name, scheme.description);
        }
    }
    Ok(())
}

fn grammars(factory: &ParserFactory) -> Result<()> {
    let parser = factory.hrc_parser();
    println!(
        "{} file types from {} sources",
        parser.file_type_count(),
        parser.loaded_sources().len()
    );
    for file_type in parser.file_types() {
        match &file_type.description {
            Some(description) => println!("  {} - {description}", file_type.name),
            None => println!("  {}", file_type.name),
        }
    }
    Ok(())
}
