//! Builder Module
//!
//! Fluent Builder APIを提供し、`Extractor`インスタンスを段階的に構築する。

use std::io::Read;

use crate::api::SheetSelector;
use crate::enrich::enrich;
use crate::error::PricebookError;
use crate::parser::{CatalogScanner, ScanOptions, ScanStep, WorkbookParser};
use crate::resolver::resolve_deferred;
use crate::types::Catalog;

/// プライスブックのデータ開始行（0始まり、シート上の32行目）
pub const DEFAULT_START_ROW: u32 = 31;

/// 入力ファイルサイズの既定の上限（2GB）
pub const DEFAULT_MAX_INPUT_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// 抽出処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ExtractorConfig {
    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// データ開始行（0始まり）
    pub start_row: u32,

    /// 入力ファイルサイズの上限（バイト）
    pub max_input_size: u64,

    /// 列数がシリーズを超える行をエラーにするか
    pub strict_columns: bool,

    /// 生の行データをシリーズに記録するか
    pub capture_content: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            sheet_selector: SheetSelector::Active,
            start_row: DEFAULT_START_ROW,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            strict_columns: false,
            capture_content: true,
        }
    }
}

impl ExtractorConfig {
    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            strict_columns: self.strict_columns,
            capture_content: self.capture_content,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Extractor`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use napoleon_pricebook::{ExtractorBuilder, SheetSelector};
///
/// # fn main() -> Result<(), napoleon_pricebook::PricebookError> {
/// let extractor = ExtractorBuilder::new()
///     .with_sheet_selector(SheetSelector::Name("Pricebook".to_string()))
///     .with_start_row(0)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExtractorBuilder {
    config: ExtractorConfig,
}

impl Default for ExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート選択: 最初のシート
    /// - データ開始行: 31（シート上の32行目）
    /// - 入力サイズ上限: 2GB
    /// - 列数の厳密チェック: 無効（シリーズを広げて警告）
    /// - 生の行データの記録: 有効
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::default(),
        }
    }

    /// 読み込むシートを選択する
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// データ開始行を指定する
    ///
    /// # 引数
    ///
    /// * `row` - 0始まりの行番号。これより前の行（表紙や注意書き）は読み飛ばします
    pub fn with_start_row(mut self, row: u32) -> Self {
        self.config.start_row = row;
        self
    }

    /// 入力ファイルサイズの上限を指定する
    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.config.max_input_size = bytes;
        self
    }

    /// 列数がシリーズを超える行をエラーにするか
    ///
    /// 無効の場合は警告を出力し、シリーズ全体の列数を広げます。
    pub fn strict_columns(mut self, strict: bool) -> Self {
        self.config.strict_columns = strict;
        self
    }

    /// 生の行データを`content`に記録するか
    pub fn capture_content(mut self, capture: bool) -> Self {
        self.config.capture_content = capture;
        self
    }

    /// 設定を検証して`Extractor`を構築する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Extractor)` - 設定が有効な場合
    /// * `Err(PricebookError::Config)` - 入力サイズの上限が0、またはシート名が空の場合
    pub fn build(self) -> Result<Extractor, PricebookError> {
        if self.config.max_input_size == 0 {
            return Err(PricebookError::Config(
                "Maximum input size must be greater than zero".to_string(),
            ));
        }

        if let SheetSelector::Name(ref name) = self.config.sheet_selector {
            if name.trim().is_empty() {
                return Err(PricebookError::Config(
                    "Sheet name must not be empty".to_string(),
                ));
            }
        }

        Ok(Extractor {
            config: self.config,
        })
    }
}

/// プライスブックの抽出器
///
/// `ExtractorBuilder`で構築します。ワークブックを読み込み、
/// カタログの抽出と参照解決、必要に応じてエンリッチメントまでを行います。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use napoleon_pricebook::ExtractorBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = ExtractorBuilder::new().build()?;
/// let database = extractor.build_database(File::open("pricebook.xlsx")?)?;
/// println!("{} series", database.series.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    /// ワークブックからカタログを抽出する（エンリッチメントなし）
    ///
    /// 終端マーカー（"Product Returns"）に到達した時点で読み込みを終了し、
    /// 走査中に解決できなかった親参照を最後にまとめて解決します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(Catalog)` - 抽出したカタログ
    /// * `Err(PricebookError)` - ワークブックを読み込めない、シートが見つからない、
    ///   または厳密モードで列数が揃わなかった場合
    pub fn extract<R: Read>(&self, input: R) -> Result<Catalog, PricebookError> {
        let mut parser = WorkbookParser::open(input, self.config.max_input_size)?;
        let sheet_name = parser.select_sheet(&self.config.sheet_selector)?;
        let rows = parser.rows(&sheet_name, self.config.start_row)?;
        log::debug!("Read {} rows from sheet '{}'", rows.len(), sheet_name);

        let mut scanner = CatalogScanner::new(self.config.scan_options());
        for row in rows {
            if scanner.consume(row)? == ScanStep::Stop {
                break;
            }
        }

        let (mut catalog, deferred) = scanner.finish();
        let pending = deferred.len();
        let resolved = resolve_deferred(&mut catalog, deferred);

        log::info!(
            "Extracted {} series, {} variations, {} products from '{}' ({}/{} deferred parents resolved)",
            catalog.series.len(),
            catalog.variations.len(),
            catalog.products.len(),
            sheet_name,
            resolved,
            pending
        );
        Ok(catalog)
    }

    /// ワークブックからエンリッチ済みのデータベースを構築する
    pub fn build_database<R: Read>(&self, input: R) -> Result<Catalog, PricebookError> {
        let mut catalog = self.extract(input)?;
        enrich(&mut catalog);
        Ok(catalog)
    }
}
