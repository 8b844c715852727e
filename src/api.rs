//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::{Deserialize, Serialize};
use std::fmt;

/// シート選択方式
///
/// プライスブックとして読み込むシートを指定します。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SheetSelector {
    /// アクティブシート（デフォルト）
    ///
    /// calamineはアクティブシート情報を公開しないため、先頭のシートを使用します。
    Active,

    /// インデックス指定（0始まり）
    Index(usize),

    /// シート名指定
    ///
    /// 例: `SheetSelector::Name("Pricebook".to_string())`
    Name(String),
}

/// カタログ上のセクション種別
///
/// スキャナーの現在モードと、各レコードの`type`フィールドの両方に使用します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// 本体（暖炉・ストーブ・インサート）
    Unit,
    /// Step 2以降のオプション表
    Variation,
    /// "Additional Options" 表
    AdditionalVariation,
    /// "... components" 以降の単品パーツ
    Product,
}

/// バリエーションと親ユニットの関係
///
/// 既知の4値に加え、未知のトークンは`Other`としてそのまま保持します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Requirement {
    Required,
    Optional,
    Included,
    NotAvailable,
    Other(String),
}

impl Requirement {
    /// ステップ見出しの "mandatory" / "optional" を変換する
    pub fn from_step_token(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "mandatory" => Some(Requirement::Required),
            "optional" => Some(Requirement::Optional),
            _ => None,
        }
    }

    /// "Additional Options" 表のセル値（INC / OPT / N/A）を変換する
    ///
    /// 大文字小文字は区別しません。未知のトークンは保存形式と同じ規則
    /// （`From<String>`）で解釈するため、JSONへの保存後も同じ値に戻ります。
    pub fn from_additional_token(token: &str) -> Self {
        let token = token.trim();
        match token.to_ascii_uppercase().as_str() {
            "INC" => Requirement::Included,
            "OPT" => Requirement::Optional,
            "N/A" => Requirement::NotAvailable,
            _ => Requirement::from(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Requirement::Required => "Required",
            Requirement::Optional => "Optional",
            Requirement::Included => "Included",
            Requirement::NotAvailable => "Not Available",
            Requirement::Other(s) => s,
        }
    }
}

impl From<String> for Requirement {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Required" => Requirement::Required,
            "Optional" => Requirement::Optional,
            "Included" => Requirement::Included,
            "Not Available" => Requirement::NotAvailable,
            _ => Requirement::Other(value),
        }
    }
}

impl From<Requirement> for String {
    fn from(value: Requirement) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SKUの分類結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// いずれかのシリーズの本体表に存在する
    Unit,
    /// `variations`にのみ存在する
    Variation,
    /// `products`にのみ存在する
    Product,
    /// カタログに存在しない
    NotFound,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemKind::Unit => "unit",
            ItemKind::Variation => "variation",
            ItemKind::Product => "product",
            ItemKind::NotFound => "not found",
        })
    }
}

/// 燃料種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuelType {
    Wood,
    Gas,
    Pellet,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Wood => "Wood",
            FuelType::Gas => "Gas",
            FuelType::Pellet => "Pellet",
        }
    }
}

/// ガス種別（燃料種別がGasの場合のみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GasFuelType {
    Propane,
    #[serde(rename = "Natural Gas")]
    NaturalGas,
}

impl GasFuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GasFuelType::Propane => "Propane",
            GasFuelType::NaturalGas => "Natural Gas",
        }
    }
}

/// 点火方式（燃料種別がGasの場合のみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IgnitionType {
    #[serde(rename = "Electronic Ignition")]
    Electronic,
    #[serde(rename = "Millivolt Ignition")]
    Millivolt,
}

impl IgnitionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnitionType::Electronic => "Electronic Ignition",
            IgnitionType::Millivolt => "Millivolt Ignition",
        }
    }
}
