//! Row Classifier
//!
//! 1行分のセル値から、その行がカタログのどの区画に属するかを判定するモジュール。
//! 判定は優先順位つきで行い、最初に一致した規則を採用します。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::Requirement;

static PRODUCT_RETURNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^product returns").expect("valid end marker regex"));

static VENTING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)venting").expect("valid regex"));

static VENTING_DESCRIPTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)top or rear|top & rear|top|rear").expect("valid venting descriptor regex")
});

static STEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^step\s*(\d+)").expect("valid step regex"));

static STEP_ONE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^step\s*1\s*[-:]?\s*([^(]*)").expect("valid title regex"));

static STEP_REQUIREMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)mandatory|optional").expect("valid requirement regex"));

static STEP_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^step\s*\d+\W*(.*)\(").expect("valid category regex"));

static ADDITIONAL_OPTIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)additional.*options").expect("valid additional regex"));

/// 行の分類
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RowClass {
    /// 空行、または特長の箇条書き（`›`で始まる行）
    Skip,
    /// "FEATURES" を含む行（シリーズの区切り）
    SeriesBoundary,
    /// "Product returns..."（文書の終端）
    End,
    /// "Step 1 - ..."（本体表の開始）
    UnitHeader { title: Option<String> },
    /// "Step N - ..."（N > 1、オプション表の開始）
    VariationHeader {
        requirement: Option<Requirement>,
        category: Option<String>,
    },
    /// "... Additional Options"
    AdditionalHeader,
    /// "... Design Options"（モード解除）
    Reset,
    /// "... components"（単品パーツ表の開始）
    ProductHeader,
    /// 現在のモードで取り込むデータ行
    Data,
}

/// 分類結果と、行から読み取ったベント方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Classified {
    pub class: RowClass,
    /// "venting" を含む行に現れたベント方式（`top or rear`など）
    pub venting: Option<String>,
}

/// 行を分類する
///
/// # 引数
///
/// * `row` - 空セルを除いたセル値の列（順序は保持）
pub(crate) fn classify(row: &[String]) -> Classified {
    let plain = |class| Classified {
        class,
        venting: None,
    };

    let Some(first) = row.first() else {
        return plain(RowClass::Skip);
    };

    if first.starts_with('›') {
        return plain(RowClass::Skip);
    }

    if row.iter().any(|cell| cell.contains("FEATURES")) {
        return plain(RowClass::SeriesBoundary);
    }

    if PRODUCT_RETURNS.is_match(first) {
        return plain(RowClass::End);
    }

    let joined = row.concat();
    let venting = if VENTING.is_match(&joined) {
        VENTING_DESCRIPTOR
            .find(&joined)
            .map(|m| m.as_str().to_string())
    } else {
        None
    };

    Classified {
        class: classify_section(row, first, &joined),
        venting,
    }
}

fn classify_section(row: &[String], first: &str, joined: &str) -> RowClass {
    let step = STEP
        .captures(first)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());

    match step {
        Some(1) => {
            let title = STEP_ONE_TITLE
                .captures(first)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|title| !title.is_empty());
            return RowClass::UnitHeader { title };
        }
        Some(n) if n > 1 => {
            let requirement = STEP_REQUIREMENT
                .find(joined)
                .and_then(|m| Requirement::from_step_token(m.as_str()));
            let category = STEP_CATEGORY
                .captures(joined)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string());
            return RowClass::VariationHeader {
                requirement,
                category,
            };
        }
        _ => {}
    }

    if row.len() == 1 {
        let lower = first.to_lowercase();
        if step.is_none() && ADDITIONAL_OPTIONS.is_match(first) {
            return RowClass::AdditionalHeader;
        }
        if lower.ends_with("design options") {
            return RowClass::Reset;
        }
        if lower.ends_with("components") {
            return RowClass::ProductHeader;
        }
    }

    RowClass::Data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn class_of(cells: &[&str]) -> RowClass {
        classify(&row(cells)).class
    }

    #[test]
    fn test_empty_and_bullet_rows_are_skipped() {
        assert_eq!(class_of(&[]), RowClass::Skip);
        assert_eq!(class_of(&["› Realistic log set"]), RowClass::Skip);
    }

    #[test]
    fn test_features_anywhere_is_boundary() {
        assert_eq!(class_of(&["ASCENT", "FEATURES"]), RowClass::SeriesBoundary);
        assert_eq!(class_of(&["Oakville FEATURES"]), RowClass::SeriesBoundary);
    }

    #[test]
    fn test_product_returns_ends_document() {
        assert_eq!(class_of(&["Product Returns policy"]), RowClass::End);
    }

    #[test]
    fn test_step_one_title_stops_at_first_parenthesis() {
        assert_eq!(
            class_of(&["Step 1 - ASCENT X 42 GAS FIREPLACE (choose model) (required)"]),
            RowClass::UnitHeader {
                title: Some("ASCENT X 42 GAS FIREPLACE".to_string())
            }
        );
        assert_eq!(
            class_of(&["Step 1: Oakville (choose)"]),
            RowClass::UnitHeader {
                title: Some("Oakville".to_string())
            }
        );
        assert_eq!(
            class_of(&["STEP 1 - Oakville"]),
            RowClass::UnitHeader {
                title: Some("Oakville".to_string())
            }
        );
    }

    #[test]
    fn test_later_step_is_variation_header() {
        assert_eq!(
            class_of(&["Step 2 - Log Set Options (mandatory)"]),
            RowClass::VariationHeader {
                requirement: Some(Requirement::Required),
                category: Some("Log Set Options".to_string()),
            }
        );
        assert_eq!(
            class_of(&["STEP 10: TRIM"]),
            RowClass::VariationHeader {
                requirement: None,
                category: None,
            }
        );
    }

    #[test]
    fn test_single_cell_section_headers() {
        assert_eq!(
            class_of(&["Vertical Series Additional Options"]),
            RowClass::AdditionalHeader
        );
        assert_eq!(
            class_of(&["Additional Vertical Series Options"]),
            RowClass::AdditionalHeader
        );
        assert_eq!(class_of(&["Outdoor Design Options"]), RowClass::Reset);
        assert_eq!(class_of(&["Venting components"]), RowClass::ProductHeader);
    }

    #[test]
    fn test_step_header_with_additional_options_is_a_step() {
        assert!(matches!(
            class_of(&["Step 3 - Additional Options (optional)"]),
            RowClass::VariationHeader { .. }
        ));
    }

    #[test]
    fn test_multi_cell_rows_are_data() {
        assert_eq!(
            class_of(&["Design options", "$50\nMKBA"]),
            RowClass::Data
        );
    }

    #[test]
    fn test_venting_descriptor_side_channel() {
        let classified = classify(&row(&["Venting", "Top or Rear venting available"]));
        assert_eq!(classified.class, RowClass::Data);
        assert_eq!(classified.venting.as_deref(), Some("Top or Rear"));

        let classified = classify(&row(&["Direct venting"]));
        assert_eq!(classified.venting, None);
    }
}
