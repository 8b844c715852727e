//! Cell Decoder
//!
//! 複数行セル（`価格\nSKU\n...`）を価格とSKUに分解するモジュール。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Unit;

/// `"Amber (MKBA), Black (MKBK)"` のように1セルに複数のSKUが並ぶパターン
static MULTI_SKU: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w*?)\s+\((.*?)\)").expect("valid multi-sku regex"));

/// セルを分解した結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodedCell<'a> {
    pub price: &'a str,
    pub sku: &'a str,
    pub extra: Vec<&'a str>,
}

impl DecodedCell<'_> {
    pub fn into_unit(self) -> Unit {
        let mut unit = Unit::new(self.price, self.sku);
        unit.extra = self.extra.into_iter().map(str::to_string).collect();
        unit
    }
}

/// 複数行セルを価格・SKU・残りの行に分解する
///
/// `N/A`のセル、改行を含まないセル、SKUが空のセルは`None`を返します。
pub(crate) fn decode(cell: &str) -> Option<DecodedCell<'_>> {
    if cell.trim().eq_ignore_ascii_case("n/a") || !cell.contains('\n') {
        return None;
    }

    let mut lines = cell.split('\n').map(str::trim);
    let price = lines.next()?;
    let sku = lines.next()?;
    if sku.is_empty() {
        return None;
    }

    Some(DecodedCell {
        price,
        sku,
        extra: lines.filter(|line| !line.is_empty()).collect(),
    })
}

/// 価格行が`$`で始まらない複数行セル（機能説明のセル）かどうか
///
/// SKU行の有無に関係なく判定します。`N/A`と改行を含まないセルは対象外です。
pub(crate) fn is_feature_cell(cell: &str) -> bool {
    if cell.trim().eq_ignore_ascii_case("n/a") || !cell.contains('\n') {
        return false;
    }
    cell.split('\n')
        .next()
        .is_some_and(|price| !price.trim().starts_with('$'))
}

/// 本体表のセルを分解する
///
/// `decode`の条件に加え、"venting" を含むセル（ベント説明の行）も空スロットにします。
pub(crate) fn decode_unit(cell: &str) -> Option<Unit> {
    if cell.to_lowercase().contains("venting") {
        return None;
    }
    decode(cell).map(DecodedCell::into_unit)
}

/// SKUセルに含まれる `名前 (コード)` の組を列挙する
///
/// 一致がなければ空のベクターを返します。
pub(crate) fn split_multi_sku(cell: &str) -> Vec<(&str, &str)> {
    MULTI_SKU
        .captures_iter(cell)
        .filter_map(|caps| {
            let short_name = caps.get(1)?.as_str();
            let code = caps.get(2)?.as_str().trim();
            Some((short_name, code))
        })
        .collect()
}
