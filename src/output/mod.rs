//! Output Module
//!
//! カタログの永続化（JSON）と、ストアフロント向けXMLフィードの出力を提供するモジュール。

mod xml;

use std::io::{BufWriter, Read, Write};

use crate::error::PricebookError;
use crate::types::Catalog;

pub use xml::{make_item_id, write_xml};

/// カタログを整形済みJSONとして書き込む
///
/// 抽出直後のカタログ（crude data）とエンリッチ済みのデータベースは同じ形式です。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use napoleon_pricebook::{write_json, Catalog};
///
/// # fn main() -> Result<(), napoleon_pricebook::PricebookError> {
/// let catalog = Catalog::new();
/// write_json(&catalog, File::create("napoleon-crude-data.json")?)?;
/// # Ok(())
/// # }
/// ```
pub fn write_json<W: Write>(catalog: &Catalog, output: W) -> Result<(), PricebookError> {
    let mut writer = BufWriter::new(output);
    serde_json::to_writer_pretty(&mut writer, catalog)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// JSONからカタログを読み込む
pub fn read_json<R: Read>(input: R) -> Result<Catalog, PricebookError> {
    Ok(serde_json::from_reader(input)?)
}

/// カタログを整形済みJSON文字列に変換する
pub fn to_json_string(catalog: &Catalog) -> Result<String, PricebookError> {
    Ok(serde_json::to_string_pretty(catalog)?)
}
