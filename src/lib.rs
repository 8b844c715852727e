//! napoleon-pricebook - Napoleon pricebook (XLSX) to catalog JSON and storefront XML
//!
//! This crate reads the Napoleon fireplace pricebook workbook, reconstructs the
//! series / variation / product structure from its loosely formatted rows, and
//! enriches every unit with the attributes the storefront catalog needs.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use napoleon_pricebook::{write_json, ExtractorBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = ExtractorBuilder::new().build()?;
//!
//!     // Crude data: the catalog as it appears in the workbook
//!     let crude = extractor.extract(File::open("Napoleon 2021.xlsx")?)?;
//!     write_json(&crude, File::create("napoleon-crude-data.json")?)?;
//!
//!     // Database: the same catalog with derived attributes
//!     let database = extractor.build_database(File::open("Napoleon 2021.xlsx")?)?;
//!     write_json(&database, File::create("napoleon-database.json")?)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Lookups
//!
//! ```rust,no_run
//! use std::fs::File;
//! use napoleon_pricebook::{read_json, CatalogIndex, ItemKind};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let database = read_json(File::open("napoleon-database.json")?)?;
//!     let index = CatalogIndex::new(&database);
//!
//!     match index.classify("GSS42CFN") {
//!         ItemKind::Unit => println!("base sku: {:?}", index.check_base_sku("GSS42CFN")),
//!         ItemKind::Variation => println!("parents: {:?}", index.parent_skus("GSS42CFN")),
//!         other => println!("{}", other),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Storefront Feed
//!
//! ```rust,no_run
//! use std::fs::File;
//! use napoleon_pricebook::{read_json, write_xml};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let database = read_json(File::open("napoleon-database.json")?)?;
//!     write_xml(&database, File::create("napoleon.xml")?)?;
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod enrich;
mod error;
mod output;
mod parser;
mod resolver;
mod text;
mod types;

// 公開API
pub use api::{
    FuelType, GasFuelType, IgnitionType, ItemKind, Requirement, Section, SheetSelector,
};
pub use builder::{Extractor, ExtractorBuilder, DEFAULT_MAX_INPUT_SIZE, DEFAULT_START_ROW};
pub use enrich::enrich;
pub use error::PricebookError;
pub use output::{make_item_id, read_json, to_json_string, write_json, write_xml};
pub use resolver::{normalize_sku, resolve_deferred, CatalogIndex, DeferredParent};
pub use types::{
    Catalog, Product, ProductLine, Series, SeriesMap, Unit, Variation, VariationParent,
};
