//! Catalog State Machine
//!
//! 行を1行ずつ受け取り、シリーズ・バリエーション・単品パーツを組み立てる
//! 有限状態機械を実装するモジュール。

use crate::api::{Requirement, Section};
use crate::error::PricebookError;
use crate::parser::cell::{self, DecodedCell};
use crate::parser::classify::{classify, RowClass};
use crate::resolver::DeferredParent;
use crate::text::{first_line, is_upper};
use crate::types::{
    Catalog, ColumnOverflow, LineTable, Product, ProductLine, Series, Unit, VariationEntry,
    VariationParent,
};

/// スキャナーの動作設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScanOptions {
    /// 列数がシリーズを超える行をエラーにする
    pub strict_columns: bool,
    /// 生の行データを`content`に記録する
    pub capture_content: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            strict_columns: false,
            capture_content: true,
        }
    }
}

/// `consume`の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanStep {
    Continue,
    /// 終端マーカーに到達した（以降の行は読まない）
    Stop,
}

/// カタログ構築の状態機械
///
/// 1行ごとに`consume`を呼び出し、最後に`finish`でカタログと
/// 未解決の親参照リストを取り出します。
#[derive(Debug)]
pub(crate) struct CatalogScanner {
    options: ScanOptions,
    catalog: Catalog,
    /// 構築中のシリーズ
    series: Series,
    /// 確定済みシリーズ数
    closed_series: usize,
    mode: Option<Section>,
    requirement: Option<Requirement>,
    category: Option<String>,
    /// "Additional Options" 表の列ごとのベースSKU
    additional_base_skus: Vec<String>,
    deferred: Vec<DeferredParent>,
}

impl CatalogScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            catalog: Catalog::new(),
            series: Series::default(),
            closed_series: 0,
            mode: None,
            requirement: None,
            category: None,
            additional_base_skus: Vec::new(),
            deferred: Vec::new(),
        }
    }

    /// 現在のモード
    #[allow(dead_code)]
    pub fn mode(&self) -> Option<Section> {
        self.mode
    }

    /// 1行を処理する
    ///
    /// # 引数
    ///
    /// * `row` - 空セルを除いたセル値の列
    ///
    /// # 戻り値
    ///
    /// * `Ok(ScanStep::Continue)` - 次の行へ進む
    /// * `Ok(ScanStep::Stop)` - 文書の終端に到達した
    /// * `Err(PricebookError::ColumnMismatch)` - 厳密モードで列数が揃わなかった
    pub fn consume(&mut self, row: Vec<String>) -> Result<ScanStep, PricebookError> {
        let classified = classify(&row);

        if let Some(venting) = classified.venting {
            self.series.venting = Some(venting);
        }

        match classified.class {
            RowClass::Skip => return Ok(ScanStep::Continue),
            RowClass::SeriesBoundary => {
                self.close_series();
                return Ok(ScanStep::Continue);
            }
            RowClass::End => return Ok(ScanStep::Stop),
            RowClass::UnitHeader { title } => {
                if title.is_some() {
                    self.series.title = title;
                }
                self.mode = Some(Section::Unit);
            }
            RowClass::VariationHeader {
                requirement,
                category,
            } => {
                self.mode = Some(Section::Variation);
                if requirement.is_some() {
                    self.requirement = requirement;
                }
                if category.is_some() {
                    self.category = category;
                }
            }
            RowClass::AdditionalHeader => self.mode = Some(Section::AdditionalVariation),
            RowClass::Reset => self.mode = None,
            RowClass::ProductHeader => self.mode = Some(Section::Product),
            RowClass::Data => match self.mode {
                Some(Section::Unit) => self.ingest_unit(&row)?,
                Some(Section::Variation) => self.ingest_variation(&row)?,
                Some(Section::AdditionalVariation) => self.ingest_additional(&row),
                Some(Section::Product) => self.ingest_product(&row),
                None => log::debug!("Dropping row outside of any section: {:?}", row),
            },
        }

        if self.options.capture_content && !is_bookmark(&row) {
            self.series.content.push(row);
        }

        Ok(ScanStep::Continue)
    }

    /// 最後のシリーズを確定し、カタログと未解決の親参照を返す
    pub fn finish(mut self) -> (Catalog, Vec<DeferredParent>) {
        self.close_series();
        (self.catalog, self.deferred)
    }

    fn current_series_key(&self) -> String {
        format!("series-{}", self.closed_series + 1)
    }

    fn close_series(&mut self) {
        let key = self.current_series_key();
        let series = std::mem::take(&mut self.series);
        log::debug!(
            "Closing {} ({} unit lines, {} variation lines)",
            key,
            series.units.len(),
            series.variations.len()
        );
        self.catalog.series.push(key, series);
        self.closed_series += 1;
    }

    fn push_line(&mut self, table: LineTable, line: ProductLine) -> Result<(), PricebookError> {
        let name = line.name.clone();
        self.series
            .push_line(table, line, self.options.strict_columns)
            .map_err(|ColumnOverflow { expected, found }| PricebookError::ColumnMismatch {
                series: self.current_series_key(),
                line: name,
                expected,
                found,
            })
    }

    fn ingest_unit(&mut self, row: &[String]) -> Result<(), PricebookError> {
        let (name, cells) = match row.split_first() {
            Some(split) => split,
            None => return Ok(()),
        };

        if is_product_description(name) {
            self.series.base_sku = cells.iter().map(|c| first_line(c).to_string()).collect();
            self.series.units.clear();
            return Ok(());
        }

        let details = cells.iter().map(|c| cell::decode_unit(c)).collect();
        self.push_line(LineTable::Units, ProductLine::new(name.as_str(), details))
    }

    fn ingest_variation(&mut self, row: &[String]) -> Result<(), PricebookError> {
        if row.len() < 2 {
            return Ok(());
        }
        let (name, cells) = match row.split_first() {
            Some(split) => split,
            None => return Ok(()),
        };
        if is_product_description(name) {
            return Ok(());
        }

        if cells.iter().any(|c| cell::is_feature_cell(c)) {
            log::debug!("Discarding feature row without priced cells: {}", name);
            return Ok(());
        }
        let decoded: Vec<Option<DecodedCell<'_>>> = cells.iter().map(|c| cell::decode(c)).collect();

        let requirement = self.requirement.clone().unwrap_or_else(|| {
            log::debug!("No requirement seen before variation '{}', using Optional", name);
            Requirement::Optional
        });
        let series_units: Vec<String> = self
            .series
            .unit_skus()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut details = Vec::with_capacity(decoded.len());
        for (idx, slot) in decoded.into_iter().enumerate() {
            let Some(decoded) = slot else {
                details.push(None);
                continue;
            };

            let base_sku = self
                .series
                .base_sku
                .get(idx)
                .map(|b| first_line(b).to_string())
                .filter(|b| !b.is_empty());
            let parents = series_units
                .iter()
                .filter(|sku| base_sku.as_deref().map_or(true, |b| sku.starts_with(b)))
                .map(|sku| VariationParent::new(sku.as_str(), requirement.clone()))
                .collect();

            self.catalog.upsert_variation(VariationEntry {
                manufacturer_sku: decoded.sku.to_string(),
                name: name.clone(),
                price: decoded.price.to_string(),
                section: Section::Variation,
                category: self.category.clone(),
                base_sku: base_sku.clone(),
                parents,
            });

            let mut unit: Unit = decoded.into_unit();
            unit.base_sku = base_sku;
            unit.section = Some(Section::Variation);
            unit.requirement = Some(requirement.clone());
            details.push(Some(unit));
        }

        if details.iter().any(Option::is_some) {
            let mut line = ProductLine::new(name.as_str(), details);
            line.catalog_product_category = self.category.clone();
            self.push_line(LineTable::Variations, line)?;
        }
        Ok(())
    }

    fn ingest_additional(&mut self, row: &[String]) {
        let first = match row.first() {
            Some(first) => first,
            None => return,
        };

        if is_product_description(first) {
            self.additional_base_skus = row
                .iter()
                .skip(3)
                .map(|c| first_line(c).to_string())
                .collect();
            return;
        }

        if row.len() == 1 {
            if is_upper(first) {
                self.category = Some(first.trim().to_string());
            }
            return;
        }

        if row.len() < 3 {
            log::debug!("Ignoring short additional option row: {:?}", row);
            return;
        }

        let fullname = row[0].as_str();
        let sku_cell = row[1].as_str();
        let price = row[2].as_str();
        let tokens = &row[3..];

        let pairs = cell::split_multi_sku(sku_cell);
        if pairs.is_empty() {
            self.add_additional_option(fullname.to_string(), sku_cell.trim(), price, tokens);
        } else {
            for (short_name, code) in pairs {
                self.add_additional_option(format!("{}: {}", fullname, short_name), code, price, tokens);
            }
        }
    }

    /// "Additional Options" 表の1エントリを列ごとに登録する
    ///
    /// 親ユニットが未出現の列は、後段で解決する参照として記録します。
    fn add_additional_option(&mut self, name: String, sku: &str, price: &str, tokens: &[String]) {
        let known_units: Vec<String> = self
            .catalog
            .all_unit_skus()
            .into_iter()
            .chain(self.series.unit_skus())
            .map(str::to_string)
            .collect();

        for (idx, token) in tokens.iter().enumerate() {
            let Some(base_sku) = self.additional_base_skus.get(idx).cloned() else {
                log::warn!(
                    "Additional option {} has a value in column {} without a base SKU",
                    sku,
                    idx
                );
                continue;
            };
            let requirement = Requirement::from_additional_token(token);

            let mut parents: Vec<VariationParent> = Vec::new();
            for unit_sku in known_units.iter().filter(|u| u.starts_with(&base_sku)) {
                if !parents.iter().any(|p| &p.sku == unit_sku) {
                    parents.push(VariationParent::new(unit_sku.as_str(), requirement.clone()));
                }
            }

            if parents.is_empty() {
                self.deferred.push(DeferredParent {
                    variation_sku: sku.to_string(),
                    base_sku: base_sku.clone(),
                    requirement: requirement.clone(),
                });
            }

            self.catalog.upsert_variation(VariationEntry {
                manufacturer_sku: sku.to_string(),
                name: name.clone(),
                price: price.to_string(),
                section: Section::AdditionalVariation,
                category: self.category.clone(),
                base_sku: Some(base_sku),
                parents,
            });
        }
    }

    fn ingest_product(&mut self, row: &[String]) {
        if row.len() < 3 || row.first().map_or(true, |c| is_product_description(c)) {
            return;
        }

        let product = Product {
            name: row[0].clone(),
            price: row[2].clone(),
            manufacturer_sku: row[1].trim().to_string(),
            section: Section::Product,
        };
        let sku = product.manufacturer_sku.clone();
        if !self.catalog.insert_product(product) {
            log::warn!("There is extra info for product {}, keeping the first entry", sku);
        }
    }
}

fn is_product_description(cell: &str) -> bool {
    cell.to_lowercase().starts_with("product description")
}

fn is_bookmark(row: &[String]) -> bool {
    row.len() == 1 && row[0].to_lowercase().starts_with("bookmark")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn scan(rows: &[&[&str]]) -> (Catalog, Vec<DeferredParent>) {
        let mut scanner = CatalogScanner::new(ScanOptions::default());
        for cells in rows {
            if scanner.consume(row(cells)).unwrap() == ScanStep::Stop {
                break;
            }
        }
        scanner.finish()
    }

    const LV_SERIES: &[&[&str]] = &[
        &["LUXURIA FEATURES"],
        &["Step 1 - LUXURIA GAS FIREPLACE (choose model)"],
        &["Product description", "LV50", "LV62"],
        &["Direct Vent Gas Fireplace", "$5000\nLV50N", "$6000\nLV62N"],
        &["Step 2 - Media Options (mandatory)"],
        &["Product description", "LV50", "LV62"],
        &["Amber glass", "$50\nMKBA", "$60\nMKBA62"],
    ];

    #[test]
    fn test_unit_row_alignment() {
        let (catalog, _) = scan(&[
            &["Step 1 - NZ WOOD FIREPLACE (choose)"],
            &["Product description", "NZ3000", "NZ5000"],
            &["Wood Fireplace", "$1200\nNZ3000H", "N/A"],
        ]);

        let series = catalog.series.get("series-1").unwrap();
        assert_eq!(series.base_sku, vec!["NZ3000", "NZ5000"]);
        let line = &series.units[0];
        assert_eq!(line.name, "Wood Fireplace");
        assert_eq!(line.details.len(), 2);
        let unit = line.details[0].as_ref().unwrap();
        assert_eq!(unit.price, "$1200");
        assert_eq!(unit.manufacturer_sku, "NZ3000H");
        assert!(line.details[1].is_none());
    }

    #[test]
    fn test_features_splits_series() {
        let (catalog, _) = scan(LV_SERIES);
        let keys: Vec<&str> = catalog.series.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["series-1", "series-2"]);
        let series = catalog.series.get("series-2").unwrap();
        assert_eq!(series.title.as_deref(), Some("LUXURIA GAS FIREPLACE"));
    }

    #[test]
    fn test_variation_parents_follow_base_sku_column() {
        let (catalog, _) = scan(LV_SERIES);

        let variation = &catalog.variations["MKBA"];
        assert_eq!(variation.section, Section::Variation);
        assert_eq!(variation.base_sku, vec!["LV50"]);
        assert_eq!(
            variation.variation_parents,
            vec![VariationParent::new("LV50N", Requirement::Required)]
        );
        assert_eq!(
            variation.catalog_product_category.as_deref(),
            Some("Media Options")
        );

        let series = catalog.series.get("series-2").unwrap();
        let slot = series.variations[0].details[1].as_ref().unwrap();
        assert_eq!(slot.manufacturer_sku, "MKBA62");
        assert_eq!(slot.base_sku.as_deref(), Some("LV62"));
        assert_eq!(slot.requirement, Some(Requirement::Required));
    }

    #[test]
    fn test_variation_row_with_unpriced_cell_is_discarded() {
        let mut rows = LV_SERIES.to_vec();
        rows.push(&["Glass", "$10\nGLS1", "Standard\nfeature"]);
        let (catalog, _) = scan(&rows);

        assert!(!catalog.variations.contains_key("GLS1"));
        let series = catalog.series.get("series-2").unwrap();
        assert_eq!(series.variations.len(), 1);
    }

    #[test]
    fn test_variation_row_with_unpriced_cell_and_blank_sku_is_discarded() {
        let mut rows = LV_SERIES.to_vec();
        rows.push(&["Glass note", "$10\nGLS1", "Standard\n"]);
        let (catalog, _) = scan(&rows);

        assert!(!catalog.variations.contains_key("GLS1"));
        let series = catalog.series.get("series-2").unwrap();
        assert_eq!(series.variations.len(), 1);
    }

    #[test]
    fn test_variation_without_base_sku_uses_all_series_units() {
        let (catalog, _) = scan(&[
            &["Step 1 - ASCENT (choose)"],
            &["Gas Fireplace", "$100\nB36NTR", "$120\nB42NTR"],
            &["Step 2 - Trim (optional)"],
            &["Trim kit", "$40\nTK1"],
        ]);
        let variation = &catalog.variations["TK1"];
        let parents: Vec<&str> = variation
            .variation_parents
            .iter()
            .map(|p| p.sku.as_str())
            .collect();
        assert_eq!(parents, vec!["B36NTR", "B42NTR"]);
        assert!(variation.base_sku.is_empty());
    }

    #[test]
    fn test_repeated_variation_is_merged() {
        let (catalog, _) = scan(&[
            &["Step 1 - LUX (choose)"],
            &["Product description", "LV50", "LV62"],
            &["Gas Fireplace", "$5000\nLV50N", "$6000\nLV62N"],
            &["Step 2 - Media (optional)"],
            &["Amber glass", "$50\nMKBA", "$50\nMKBA"],
        ]);
        let variation = &catalog.variations["MKBA"];
        assert_eq!(variation.base_sku, vec!["LV50", "LV62"]);
        assert_eq!(variation.variation_parents.len(), 2);
    }

    #[test]
    fn test_additional_options_expand_multi_sku_and_defer() {
        let (catalog, deferred) = scan(&[
            &["Step 1 - LUX (choose)"],
            &["Product description", "LV50"],
            &["Gas Fireplace", "$5000\nLV50N"],
            &["Luxuria Additional Options"],
            &["Product description", "Part", "Price", "LV50", "GX70"],
            &["GLASS BEADS"],
            &["Glass beads", "Amber (MKBA), Black (MKBK)", "$50", "OPT", "INC"],
        ]);

        let amber = &catalog.variations["MKBA"];
        assert_eq!(amber.name, "Glass beads: Amber");
        assert_eq!(amber.section, Section::AdditionalVariation);
        assert_eq!(amber.catalog_product_category.as_deref(), Some("GLASS BEADS"));
        assert_eq!(amber.base_sku, vec!["LV50", "GX70"]);
        assert_eq!(
            amber.variation_parents,
            vec![VariationParent::new("LV50N", Requirement::Optional)]
        );

        assert!(catalog.variations.contains_key("MKBK"));
        assert_eq!(deferred.len(), 2);
        assert!(deferred
            .iter()
            .all(|d| d.base_sku == "GX70" && d.requirement == Requirement::Included));
    }

    #[test]
    fn test_products_first_write_wins() {
        let (catalog, _) = scan(&[
            &["Venting components"],
            &["Product description", "Part", "Price"],
            &["Vent kit", "PVA52", "$10"],
            &["Vent kit (duplicate)", "PVA52", "$20"],
        ]);
        assert_eq!(catalog.products.len(), 1);
        assert_eq!(catalog.products["PVA52"].price, "$10");
        assert_eq!(catalog.products["PVA52"].section, Section::Product);
    }

    #[test]
    fn test_design_options_resets_mode() {
        let mut scanner = CatalogScanner::new(ScanOptions::default());
        scanner
            .consume(row(&["Step 1 - LUX (choose)"]))
            .unwrap();
        assert_eq!(scanner.mode(), Some(Section::Unit));
        scanner.consume(row(&["Outdoor Design Options"])).unwrap();
        assert_eq!(scanner.mode(), None);
        scanner
            .consume(row(&["Gas Fireplace", "$1\nX1"]))
            .unwrap();
        let (catalog, _) = scanner.finish();
        assert!(catalog.series.get("series-1").unwrap().units.is_empty());
    }

    #[test]
    fn test_product_returns_stops_scan() {
        let mut scanner = CatalogScanner::new(ScanOptions::default());
        assert_eq!(
            scanner.consume(row(&["Product Returns"])).unwrap(),
            ScanStep::Stop
        );
    }

    #[test]
    fn test_strict_columns_reports_series_and_line() {
        let mut scanner = CatalogScanner::new(ScanOptions {
            strict_columns: true,
            capture_content: false,
        });
        scanner.consume(row(&["Step 1 - LUX (choose)"])).unwrap();
        scanner
            .consume(row(&["Product description", "LV50"]))
            .unwrap();
        let err = scanner
            .consume(row(&["Gas Fireplace", "$1\nLV50N", "$2\nLV62N"]))
            .unwrap_err();
        match err {
            PricebookError::ColumnMismatch {
                series,
                line,
                expected,
                found,
            } => {
                assert_eq!(series, "series-1");
                assert_eq!(line, "Gas Fireplace");
                assert_eq!((expected, found), (1, 2));
            }
            other => panic!("Expected ColumnMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_content_capture_and_venting() {
        let (catalog, _) = scan(&[
            &["Step 1 - LUX (choose)"],
            &["Bookmark: luxuria"],
            &["Venting", "Top or Rear"],
        ]);
        let series = catalog.series.get("series-1").unwrap();
        assert_eq!(series.venting.as_deref(), Some("Top or Rear"));
        assert_eq!(series.content.len(), 2);
    }

    #[allow(unused_doc_comments)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn priced_row(name: &'static str) -> impl Strategy<Value = Vec<String>> {
            prop::collection::vec(prop::option::of("[A-Z]{2}[0-9]{2,4}"), 1..6).prop_map(
                move |cells| {
                    let mut row = vec![name.to_string()];
                    row.extend(cells.into_iter().map(|sku| match sku {
                        Some(sku) => format!("$100\n{}", sku),
                        None => "N/A".to_string(),
                    }));
                    row
                },
            )
        }

        /// 列数の異なる行を混ぜても、シリーズ内のすべての行が同じ列数になる
        proptest! {
            #[test]
            fn test_lines_share_column_count(
                units in prop::collection::vec(priced_row("Gas Fireplace"), 1..8),
                options in prop::collection::vec(priced_row("Trim kit"), 0..8),
            ) {
                let widest = units
                    .iter()
                    .chain(options.iter())
                    .map(|row| row.len() - 1)
                    .max()
                    .unwrap_or(0);

                let mut scanner = CatalogScanner::new(ScanOptions::default());
                scanner.consume(row(&["Step 1 - LUX (choose)"])).unwrap();
                for unit_row in units {
                    scanner.consume(unit_row).unwrap();
                }
                scanner.consume(row(&["Step 2 - Trim (optional)"])).unwrap();
                for option_row in options {
                    scanner.consume(option_row).unwrap();
                }
                let (catalog, _) = scanner.finish();

                let series = catalog.series.get("series-1").unwrap();
                let columns = series.column_count();
                prop_assert!(columns <= widest);
                for line in series.units.iter().chain(series.variations.iter()) {
                    prop_assert_eq!(line.details.len(), columns);
                }
            }
        }
    }
}
