//! Enrichment Rules
//!
//! 製品行の名前やベースSKUから属性を導く、正規表現ベースの判定規則。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::api::{FuelType, GasFuelType, IgnitionType};
use crate::text::{collapse_whitespace, contains_ignore_case, title_case};

/// タイトルから取り除く販促用の語句（一致箇所から行末まで削除）
///
/// `SERIES`は直前が`S`でない場合のみ対象です（"...S SERIES" は残す）。
static TITLE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        (?:
            SERIES\sFIREPLACE\sMODELS
            |FIREPLACE\sMODELS
            |\bFIREPLACE\b
            |\bMODELS\b
            |\bWOOD\b
            |\bGAS\b
            |Clean\sFace\sOutdoor
            |Electric
            |(?P<keep>^|[^s])\sSERIES
        ).*",
    )
    .expect("valid title suffix regex")
});

static WOOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)wood").expect("valid regex"));
static GAS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)propane|gas").expect("valid regex"));
static PELLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)pellet").expect("valid regex"));

static GAS_FUEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)propane|natural gas").expect("valid gas fuel regex"));

static IGNITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)electronic|millivolt").expect("valid ignition regex"));

static SERIES_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2,}").expect("valid series digits regex"));

static VENT_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)vent free|direct vent").expect("valid vent type regex"));

static STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)see through|vertical|3 sided|linear").expect("valid style regex")
});

static UNIT_CATEGORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)wood fireplace|wood stove|gas insert|gas stove|gas log set")
        .expect("valid unit category regex")
});

static OPTION_PRODUCT_CATEGORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)gas (fireplaces|stoves|inserts|pellets)").expect("valid category regex")
});

/// ベースSKUとシリーズ番号の例外対応表
const SERIES_NUMBER_EXCEPTIONS: &[(&str, &str)] = &[
    ("BHD4-Glass", "BHD4"),
    ("BHD4-Cradle", "BHD4ST"),
    ("BHD4-Logs", "BHD4"),
    ("GDI3", "GDI3"),
    ("GDI3N", "GDI3"),
    ("GDI3NE", "GDI3"),
    ("GDIG3", "GDIG3"),
    ("GDIG3N", "GDIG3"),
    ("GDIX3", "GDIX3"),
    ("GDIX3N", "GDIX3"),
    ("GDIX4N", "GDIX4"),
    ("GDIX4", "GDIX4"),
    ("GDIZC", "ZC"),
    ("GSST8", "GSST8N"),
    ("GT8", "GT8NSB"),
    ("GVFT8", "GVFT8N"),
    ("EPI3", "EPI3"),
];

/// バリエーション名のキーワードとカテゴリー
///
/// 上から順に判定します（"element" を含む名前は "front" も含むことがある）。
const VARIATION_CATEGORIES: &[(&str, &str)] = &[
    ("log set", "Media Kits"),
    ("panel", "Interior Panels"),
    ("illusion glass", "Interior Panels"),
    ("trim", "Trim Kits"),
    ("element", "Front Accents"),
    ("front", "Decorative Fronts"),
    ("conversion", "Conversion Kits"),
];

pub(crate) const DEFAULT_UNIT_CATEGORY: &str = "Gas Fireplaces";
pub(crate) const OPTION_PRODUCT: &str = "Option Product";
pub(crate) const PRODUCT: &str = "Product";
pub(crate) const VARIATION_PRODUCT: &str = "Variation Product";

/// シリーズのタイトルを整える
///
/// 販促用の語句以降を削除し、非ASCII文字を除き、空白をまとめてタイトルケースにします。
///
/// ```text
/// "ASCENT X 42 GAS FIREPLACE" -> "Ascent X 42"
/// "OAKVILLE SERIES"           -> "Oakville"
/// "HIGH COUNTRY™ 3000 WOOD"   -> "High Country 3000"
/// ```
pub(crate) fn sanitize_title(title: &str) -> String {
    let cut = TITLE_SUFFIX.replace_all(title, |caps: &Captures| {
        caps.name("keep")
            .map_or_else(String::new, |m| m.as_str().to_string())
    });
    let ascii: String = cut.chars().filter(char::is_ascii).collect();
    title_case(&collapse_whitespace(ascii.trim()))
}

/// 製品行の名前から燃料種別を判定する（既定はGas）
pub(crate) fn fuel_type(line_name: &str) -> FuelType {
    if WOOD.is_match(line_name) {
        FuelType::Wood
    } else if GAS.is_match(line_name) {
        FuelType::Gas
    } else if PELLET.is_match(line_name) {
        FuelType::Pellet
    } else {
        FuelType::Gas
    }
}

/// 製品行の名前からガス種別を判定する（既定はNatural Gas）
pub(crate) fn gas_fuel_type(line_name: &str) -> GasFuelType {
    match GAS_FUEL.find(line_name) {
        Some(m) if m.as_str().eq_ignore_ascii_case("propane") => GasFuelType::Propane,
        _ => GasFuelType::NaturalGas,
    }
}

/// 製品行の名前から点火方式を判定する（既定はElectronic）
pub(crate) fn ignition_type(line_name: &str) -> IgnitionType {
    match IGNITION.find(line_name) {
        Some(m) if m.as_str().eq_ignore_ascii_case("millivolt") => IgnitionType::Millivolt,
        _ => IgnitionType::Electronic,
    }
}

/// ベースSKUからシリーズ番号を求める
///
/// 例外表にあればその値、なければ最初の2桁以上の数字列です。
pub(crate) fn series_number(base_sku: &str) -> Option<String> {
    SERIES_NUMBER_EXCEPTIONS
        .iter()
        .find(|(base, _)| *base == base_sku)
        .map(|(_, number)| number.to_string())
        .or_else(|| SERIES_DIGITS.find(base_sku).map(|m| m.as_str().to_string()))
}

/// タイトルから末尾のシリーズ番号を取り除く
pub(crate) fn series_name(title: &str, series_number: Option<&str>) -> String {
    let trimmed = title.trim_end();
    let stripped = series_number
        .filter(|number| !number.is_empty())
        .and_then(|number| trimmed.strip_suffix(number))
        .unwrap_or(trimmed);
    stripped.trim().to_string()
}

/// ガス機種のベント方式（`Vent-Free` / `Direct-Vent` / `Vented`）
pub(crate) fn vent_type(line_name: &str) -> String {
    VENT_TYPE
        .find(line_name)
        .map(|m| title_case(m.as_str()).replace(' ', "-"))
        .unwrap_or_else(|| "Vented".to_string())
}

/// 設置スタイル
///
/// シリーズ名と製品行の名前からキーワードを探し、なければベースSKUに`L`を含むかで判定します。
pub(crate) fn style(series_name: &str, line_name: &str, base_sku: &str) -> &'static str {
    let haystack = format!("{} {}", series_name, line_name);
    match STYLE.find(&haystack).map(|m| m.as_str().to_lowercase()) {
        Some(ref keyword) if keyword == "see through" => "See-Thru",
        Some(ref keyword) if keyword == "vertical" => "Vertical",
        Some(ref keyword) if keyword == "3 sided" => "Peninsula",
        Some(_) => "Linear",
        None if base_sku.contains('L') => "Linear",
        None => "Traditional",
    }
}

/// 本体の製品カテゴリー（例: `Wood Fireplaces`）
pub(crate) fn unit_category(line_name: &str) -> String {
    UNIT_CATEGORY
        .find(line_name)
        .map(|m| format!("{}s", title_case(m.as_str())))
        .unwrap_or_else(|| DEFAULT_UNIT_CATEGORY.to_string())
}

/// バリエーションの製品カテゴリー（該当なしは`None`）
pub(crate) fn variation_category(name: &str) -> Option<&'static str> {
    VARIATION_CATEGORIES
        .iter()
        .find(|(keyword, _)| contains_ignore_case(name, keyword))
        .map(|(_, category)| *category)
}

/// 本体の`productTypeNonoperative`
pub(crate) fn nonoperative_type(product_category: &str) -> &'static str {
    if OPTION_PRODUCT_CATEGORY.is_match(product_category) {
        OPTION_PRODUCT
    } else {
        PRODUCT
    }
}
