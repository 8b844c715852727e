//! Parser Module
//!
//! プライスブックのシートを行単位で読み込み、カタログを組み立てるモジュール群。
//! ワークブック読み込み、行分類、セル分解、状態機械の4つで構成されます。

mod cell;
mod classify;
mod scanner;
mod workbook;

pub(crate) use scanner::{CatalogScanner, ScanOptions, ScanStep};
pub(crate) use workbook::WorkbookParser;
