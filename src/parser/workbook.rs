//! Workbook Reader
//!
//! calamineを使用してプライスブックのシートを読み込み、
//! 空セルを除いた文字列の行として返すモジュール。

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets, Xlsx};
use std::io::{Cursor, Read};

use crate::api::SheetSelector;
use crate::error::PricebookError;

/// ワークブックパーサー
///
/// calamineのラッパーとして、シート選択と行の取り出しを提供します。
pub(crate) struct WorkbookParser {
    /// calamineのワークブック（XLSX形式のみサポート）
    workbook: Xlsx<Cursor<Vec<u8>>>,
}

impl WorkbookParser {
    /// ワークブックを開く
    ///
    /// # 引数
    ///
    /// * `reader` - XLSXファイルを読み込むためのリーダー
    /// * `max_input_size` - 許容する入力サイズ（バイト）
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - ワークブックの読み込みに成功した場合
    /// * `Err(PricebookError::InputTooLarge)` - 入力がサイズ上限を超えた場合
    /// * `Err(PricebookError::Parse)` - ワークブックとして読み込めなかった場合
    /// * `Err(PricebookError::Config)` - XLSX以外の形式だった場合
    pub fn open<R: Read>(mut reader: R, max_input_size: u64) -> Result<Self, PricebookError> {
        let mut buffer = Vec::new();
        let bytes_read = reader.read_to_end(&mut buffer)?;

        if bytes_read as u64 > max_input_size {
            return Err(PricebookError::InputTooLarge {
                size: bytes_read as u64,
                max: max_input_size,
            });
        }

        let sheets = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        let workbook = match sheets {
            Sheets::Xlsx(workbook) => workbook,
            _ => {
                return Err(PricebookError::Config(
                    "Only XLSX format is supported".to_string(),
                ))
            }
        };

        Ok(Self { workbook })
    }

    /// すべてのシート名を取得
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// シート選択方式に基づいてシート名を決定する
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - 選択されたシート名
    /// * `Err(PricebookError::Config)` - シートが見つからない、またはインデックスが範囲外の場合
    pub fn select_sheet(&self, selector: &SheetSelector) -> Result<String, PricebookError> {
        let all_sheet_names = self.sheet_names();

        match selector {
            SheetSelector::Active => all_sheet_names
                .into_iter()
                .next()
                .ok_or_else(|| PricebookError::Config("Workbook has no sheets".to_string())),

            SheetSelector::Index(index) => {
                all_sheet_names.get(*index).cloned().ok_or_else(|| {
                    PricebookError::Config(format!(
                        "Sheet index {} is out of range (total: {})",
                        index,
                        all_sheet_names.len()
                    ))
                })
            }

            SheetSelector::Name(name) => {
                if !all_sheet_names.contains(name) {
                    return Err(PricebookError::Config(format!("Sheet '{}' not found", name)));
                }
                Ok(name.clone())
            }
        }
    }

    /// シートの行を読み込む
    ///
    /// `start_row`（0始まりの絶対行番号）より前の行は読み飛ばします。
    /// 各行は空セルを除いたセル値の列になり、順序は保持されます。
    ///
    /// # 引数
    ///
    /// * `sheet_name` - 読み込むシート名
    /// * `start_row` - データ開始行（0始まり）
    pub fn rows(
        &mut self,
        sheet_name: &str,
        start_row: u32,
    ) -> Result<Vec<Vec<String>>, PricebookError> {
        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|e| PricebookError::Parse(e.into()))?;

        // calamineの範囲は最初の非空セルから始まるため、絶対行番号に換算する
        let first_row = range.start().map_or(0, |(row, _)| row);

        let rows = range
            .rows()
            .enumerate()
            .filter(|(idx, _)| first_row.saturating_add(*idx as u32) >= start_row)
            .map(|(_, cells)| cells.iter().filter_map(cell_text).collect())
            .collect();

        Ok(rows)
    }
}

/// セル値を文字列に変換する（空セルは`None`）
///
/// 整数値の浮動小数点数は `.0` を付けずに出力します。
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
