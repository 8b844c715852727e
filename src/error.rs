//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// napoleon-pricebookクレート全体で使用するエラー型
///
/// プライスブックの構造上の揺れ（説明文の混入、N/Aセル、重複SKUなど）は
/// エラーとして扱わず、ログを出力してスキップします。
/// このエラー型が表すのは、処理全体を中断すべき環境・設定由来の失敗のみです。
///
/// # エラーの種類
///
/// - `Io`: I/O操作中に発生したエラー（ファイル読み込み失敗など）
/// - `Parse`: ワークブックの解析中に発生したエラー（calamine由来）
/// - `Json`: カタログJSONの読み書きに失敗したエラー
/// - `Xml`: XMLフィードの書き込みに失敗したエラー
/// - `Config`: 設定の検証に失敗したエラー
/// - `InputTooLarge`: 入力ファイルがサイズ上限を超えたエラー
/// - `ColumnMismatch`: 厳密モードで列数が揃わなかったエラー
///
/// # 使用例
///
/// ```rust,no_run
/// use napoleon_pricebook::PricebookError;
/// use std::fs::File;
///
/// fn open_pricebook(path: &str) -> Result<(), PricebookError> {
///     let _file = File::open(path)?;  // Ioエラーが自動的に変換される
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum PricebookError {
    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ワークブックの解析中に発生したエラー
    ///
    /// ファイル形式が不正、破損したファイル、サポートされていない形式などが
    /// 原因となります。
    #[error("Failed to parse workbook: {0}")]
    Parse(#[from] calamine::Error),

    /// カタログJSONのシリアライズ・デシリアライズエラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XMLフィードの書き込みエラー
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// 設定の検証に失敗したエラー
    ///
    /// `ExtractorBuilder::build()`時、またはシート選択時に発生します。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use napoleon_pricebook::{ExtractorBuilder, PricebookError};
    ///
    /// let result = ExtractorBuilder::new()
    ///     .with_max_input_size(0)
    ///     .build();
    ///
    /// match result {
    ///     Err(PricebookError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// 入力ファイルがサイズ上限を超えた
    #[error("Input file size exceeds maximum: {size} bytes (max: {max} bytes)")]
    InputTooLarge {
        /// 読み込んだバイト数
        size: u64,
        /// 許容される最大バイト数
        max: u64,
    },

    /// 厳密モードで、製品行の列数がシリーズの列数を超えた
    #[error("Column mismatch in {series}, line '{line}': expected {expected} columns, found {found}")]
    ColumnMismatch {
        /// シリーズキー（例: `series-3`）
        series: String,
        /// 製品行の名前
        line: String,
        /// シリーズが持つ列数
        expected: usize,
        /// 行に含まれていた列数
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: PricebookError = io_err.into();

        match error {
            PricebookError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert_eq!(e.to_string(), "File not found");
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_parse_error_display() {
        let parse_err = calamine::Error::Msg("Corrupted file");
        let error: PricebookError = parse_err.into();

        let error_msg = error.to_string();
        assert!(error_msg.contains("Failed to parse workbook"));
        assert!(error_msg.contains("Corrupted file"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: PricebookError = json_err.into();
        assert!(matches!(error, PricebookError::Json(_)));
        assert!(error.to_string().starts_with("JSON error"));
    }

    #[test]
    fn test_input_too_large_display() {
        let error = PricebookError::InputTooLarge { size: 20, max: 10 };
        assert_eq!(
            error.to_string(),
            "Input file size exceeds maximum: 20 bytes (max: 10 bytes)"
        );
    }

    #[test]
    fn test_column_mismatch_display() {
        let error = PricebookError::ColumnMismatch {
            series: "series-2".to_string(),
            line: "Gas Fireplace".to_string(),
            expected: 2,
            found: 3,
        };

        let error_msg = error.to_string();
        assert!(error_msg.contains("series-2"));
        assert!(error_msg.contains("Gas Fireplace"));
        assert!(error_msg.contains("expected 2 columns, found 3"));
    }

    #[test]
    fn test_error_conversion_with_question_mark() {
        fn io_operation() -> Result<(), PricebookError> {
            let _file = std::fs::File::open("nonexistent_pricebook.xlsx")?;
            Ok(())
        }

        match io_operation() {
            Err(PricebookError::Io(_)) => {}
            _ => panic!("Expected Io error from ? operator"),
        }
    }
}
