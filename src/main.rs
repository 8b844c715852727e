//! napoleon-pricebook command line
//!
//! ```bash
//! # Workbook -> crude catalog JSON
//! napoleon-pricebook extract "Napoleon 2021.xlsx" -o napoleon-crude-data.json
//!
//! # Crude JSON (or the workbook itself) -> enriched database
//! napoleon-pricebook build napoleon-crude-data.json -o napoleon-database.json
//!
//! # Database -> storefront XML feed
//! napoleon-pricebook xml napoleon-database.json -o napoleon.xml
//!
//! # Inspect a SKU
//! napoleon-pricebook lookup napoleon-database.json GSS42CFN
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use napoleon_pricebook::{
    enrich, read_json, write_json, write_xml, Catalog, CatalogIndex, Extractor, ExtractorBuilder,
    ItemKind, SheetSelector, DEFAULT_START_ROW,
};

/// Napoleon pricebook to catalog JSON and storefront XML
#[derive(Parser, Debug)]
#[command(name = "napoleon-pricebook")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the crude catalog from a pricebook workbook
    Extract {
        /// Pricebook workbook (.xlsx)
        xlsx: PathBuf,

        /// Output JSON file
        #[arg(short, long, default_value = "napoleon-crude-data.json")]
        output: PathBuf,

        #[command(flatten)]
        workbook: WorkbookArgs,
    },

    /// Build the enriched database from crude JSON or a workbook
    Build {
        /// Crude catalog JSON, or a workbook (.xlsx) to extract first
        input: PathBuf,

        /// Output JSON file
        #[arg(short, long, default_value = "napoleon-database.json")]
        output: PathBuf,

        #[command(flatten)]
        workbook: WorkbookArgs,
    },

    /// Write the storefront XML feed from an enriched database
    Xml {
        /// Enriched database JSON
        database: PathBuf,

        /// Output XML file
        #[arg(short, long, default_value = "napoleon.xml")]
        output: PathBuf,
    },

    /// Show what the catalog knows about a SKU
    Lookup {
        /// Catalog or database JSON
        database: PathBuf,

        /// Manufacturer SKU
        sku: String,
    },
}

/// Workbook reading options
#[derive(clap::Args, Debug)]
struct WorkbookArgs {
    /// Sheet name (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// First data row, zero-based
    #[arg(long, default_value_t = DEFAULT_START_ROW)]
    start_row: u32,

    /// Fail on rows wider than their series instead of widening it
    #[arg(long)]
    strict: bool,
}

impl WorkbookArgs {
    fn extractor(&self) -> Result<Extractor> {
        let selector = match &self.sheet {
            Some(name) => SheetSelector::Name(name.clone()),
            None => SheetSelector::Active,
        };
        ExtractorBuilder::new()
            .with_sheet_selector(selector)
            .with_start_row(self.start_row)
            .strict_columns(self.strict)
            .build()
            .context("Invalid extractor configuration")
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match args.command {
        Command::Extract {
            xlsx,
            output,
            workbook,
        } => {
            let catalog = workbook.extractor()?.extract(open(&xlsx)?)?;
            save_json(&catalog, &output)
        }
        Command::Build {
            input,
            output,
            workbook,
        } => {
            let database = if is_workbook(&input) {
                workbook.extractor()?.build_database(open(&input)?)?
            } else {
                let mut catalog = load_json(&input)?;
                enrich(&mut catalog);
                catalog
            };
            save_json(&database, &output)
        }
        Command::Xml { database, output } => {
            let database = load_json(&database)?;
            let file = File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            write_xml(&database, file)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            log::info!("Saved {}", output.display());
            Ok(())
        }
        Command::Lookup { database, sku } => {
            let catalog = load_json(&database)?;
            print_lookup(&catalog, &sku);
            Ok(())
        }
    }
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn load_json(path: &Path) -> Result<Catalog> {
    read_json(open(path)?).with_context(|| format!("Failed to read catalog from {}", path.display()))
}

fn save_json(catalog: &Catalog, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_json(catalog, file).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Saved {}", path.display());
    Ok(())
}

fn print_lookup(catalog: &Catalog, sku: &str) {
    let index = CatalogIndex::new(catalog);
    let kind = index.classify(sku);
    println!("{}: {}", sku, kind);

    match kind {
        ItemKind::Unit => {
            if let Some((key, _)) = index.find_series(sku) {
                println!("  series: {}", key);
            }
            if let Some(base_sku) = index.check_base_sku(sku) {
                println!("  base sku: {}", base_sku);
            }
            if let Some(name) = index.unit(sku).and_then(|unit| unit.display_name.as_deref()) {
                println!("  display name: {}", name);
            }
            let siblings: Vec<&str> = index
                .siblings(sku)
                .into_iter()
                .map(|unit| unit.manufacturer_sku.as_str())
                .collect();
            println!("  siblings: {}", siblings.join(", "));
        }
        ItemKind::Variation => {
            println!("  parents: {}", index.parent_skus(sku).join(", "));
            if let Some(summary) = index.requirement_summary(sku) {
                println!("  requirement: {}", summary);
            }
        }
        ItemKind::Product | ItemKind::NotFound => {}
    }
}
