//! Types Module
//!
//! カタログのデータモデルを定義するモジュール。
//! JSON上のキー名（`baseSku`, `manufacturerSku`など）は既存のカタログ形式に合わせています。

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::api::{FuelType, GasFuelType, IgnitionType, Requirement, Section};

/// セル1つ分のレコード（本体・バリエーションの1列）
///
/// パース時には`price`と`manufacturerSku`（バリエーション列では`base_sku`・`type`・
/// `requiredOrOptional`も）が設定され、残りのフィールドはエンリッチメントで埋まります。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(default)]
    pub price: String,

    #[serde(rename = "manufacturerSku", default)]
    pub manufacturer_sku: String,

    /// セル内の3行目以降（注記など）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_sku: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,

    #[serde(
        rename = "requiredOrOptional",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub requirement: Option<Requirement>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<FuelType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_fuel_type: Option<GasFuelType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignition_type: Option<IgnitionType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vent_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_category: Option<String>,

    #[serde(
        rename = "productTypeNonoperative",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub product_type_nonoperative: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Unit {
    /// 価格とSKUのみを持つレコードを生成
    pub fn new(price: impl Into<String>, manufacturer_sku: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            manufacturer_sku: manufacturer_sku.into(),
            ..Self::default()
        }
    }

    /// 属性名から文字列値を取得（兄弟ユニット検索用）
    ///
    /// JSON上のキー名で指定します。存在しない属性は`None`を返します。
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "price" => Some(self.price.as_str()),
            "manufacturerSku" => Some(self.manufacturer_sku.as_str()),
            "base_sku" => self.base_sku.as_deref(),
            "series_number" => self.series_number.as_deref(),
            "series_name" => self.series_name.as_deref(),
            "fuel_type" => self.fuel_type.map(|f| f.as_str()),
            "gas_fuel_type" => self.gas_fuel_type.map(|g| g.as_str()),
            "ignition_type" => self.ignition_type.map(|i| i.as_str()),
            "vent_type" => self.vent_type.as_deref(),
            "style" => self.style.as_deref(),
            "product_category" => self.product_category.as_deref(),
            "productTypeNonoperative" => self.product_type_nonoperative.as_deref(),
            "display_name" => self.display_name.as_deref(),
            _ => None,
        }
    }
}

/// 空スロットを`{}`として読み書きするためのserdeヘルパー
mod slots {
    use super::Unit;
    use serde::ser::{SerializeMap, SerializeSeq};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    struct EmptySlot;

    impl Serialize for EmptySlot {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_map(Some(0))?.end()
        }
    }

    pub fn serialize<S: Serializer>(
        slots: &[Option<Unit>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(slots.len()))?;
        for slot in slots {
            match slot {
                Some(unit) => seq.serialize_element(unit)?,
                None => seq.serialize_element(&EmptySlot)?,
            }
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Option<Unit>>, D::Error> {
        let units = Vec::<Unit>::deserialize(deserializer)?;
        Ok(units
            .into_iter()
            .map(|unit| (!unit.manufacturer_sku.is_empty()).then_some(unit))
            .collect())
    }
}

/// 製品行（表の1行）
///
/// `details`はシリーズの`baseSku`と位置で対応します。
/// 同じインデックスは、同じシリーズ内の別の表でも同じ物理製品を指します。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductLine {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_product_category: Option<String>,

    #[serde(with = "slots", default)]
    pub details: Vec<Option<Unit>>,
}

impl ProductLine {
    pub fn new(name: impl Into<String>, details: Vec<Option<Unit>>) -> Self {
        Self {
            name: name.into(),
            catalog_product_category: None,
            details,
        }
    }

    /// 列数
    pub fn width(&self) -> usize {
        self.details.len()
    }

    /// 空でないスロットを列インデックス付きで列挙
    pub fn units(&self) -> impl Iterator<Item = (usize, &Unit)> {
        self.details
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|unit| (idx, unit)))
    }

    fn pad_to(&mut self, columns: usize) {
        if self.details.len() < columns {
            self.details.resize(columns, None);
        }
    }
}

/// シリーズ内のどの表に行を追加するか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineTable {
    Units,
    Variations,
}

/// 列数がシリーズの列数を超えた行
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnOverflow {
    pub expected: usize,
    pub found: usize,
}

/// シリーズ（"FEATURES" で区切られた1ブロック）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "baseSku", default)]
    pub base_sku: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venting: Option<String>,

    #[serde(default)]
    pub units: Vec<ProductLine>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variations: Vec<ProductLine>,

    /// デバッグ用の生の行データ（エンリッチメントで削除される）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Vec<String>>,
}

impl Series {
    /// シリーズが持つ列数
    ///
    /// `baseSku`の数と、既存の行の列数のうち大きい方です。
    /// 挿入時にすべての行がこの列数に揃えられるため、行同士の列数は常に一致します。
    pub fn column_count(&self) -> usize {
        self.units
            .iter()
            .chain(self.variations.iter())
            .map(ProductLine::width)
            .chain(std::iter::once(self.base_sku.len()))
            .max()
            .unwrap_or(0)
    }

    /// 行を列数に揃えて追加する
    ///
    /// 行が列数より短い場合は空スロットで埋めます。
    /// 長い場合、`strict`なら`ColumnOverflow`を返し、そうでなければシリーズ全体を広げます。
    pub(crate) fn push_line(
        &mut self,
        table: LineTable,
        mut line: ProductLine,
        strict: bool,
    ) -> Result<(), ColumnOverflow> {
        let columns = self.column_count();
        let has_lines = !self.units.is_empty() || !self.variations.is_empty();

        if line.width() > columns && (has_lines || !self.base_sku.is_empty()) {
            if strict {
                return Err(ColumnOverflow {
                    expected: columns,
                    found: line.width(),
                });
            }
            log::warn!(
                "Line '{}' has {} columns, widening series from {}",
                line.name,
                line.width(),
                columns
            );
            let widened = line.width();
            for existing in self.units.iter_mut().chain(self.variations.iter_mut()) {
                existing.pad_to(widened);
            }
        }

        line.pad_to(columns);
        match table {
            LineTable::Units => self.units.push(line),
            LineTable::Variations => self.variations.push(line),
        }
        Ok(())
    }

    /// 本体表に含まれるSKUを出現順（重複なし）で返す
    pub fn unit_skus(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.units
            .iter()
            .flat_map(ProductLine::units)
            .map(|(_, unit)| unit.manufacturer_sku.as_str())
            .filter(|sku| seen.insert(*sku))
            .collect()
    }

    /// 本体表におけるSKUの位置（行インデックス, 列インデックス）
    pub fn locate_unit(&self, sku: &str) -> Option<(usize, usize)> {
        self.units.iter().enumerate().find_map(|(line_idx, line)| {
            line.units()
                .find(|(_, unit)| unit.manufacturer_sku == sku)
                .map(|(col, _)| (line_idx, col))
        })
    }

    pub fn contains_unit(&self, sku: &str) -> bool {
        self.locate_unit(sku).is_some()
    }

    /// 本体表のすべてのユニットを可変参照で列挙
    pub fn units_mut(&mut self) -> impl Iterator<Item = (&str, usize, &mut Unit)> {
        self.units.iter_mut().flat_map(|line| {
            let name = line.name.as_str();
            line.details
                .iter_mut()
                .enumerate()
                .filter_map(move |(idx, slot)| slot.as_mut().map(|unit| (name, idx, unit)))
        })
    }
}

/// 出現順を保持する`series-N` → `Series`のマップ
///
/// JSONではオブジェクトとして読み書きし、キーの順序を保持します。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesMap(Vec<(String, Series)>);

impl SeriesMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, series: Series) {
        self.0.push((key.into(), series));
    }

    pub fn get(&self, key: &str) -> Option<&Series> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Series)> {
        self.0.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn values(&self) -> impl Iterator<Item = &Series> {
        self.0.iter().map(|(_, s)| s)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Series> {
        self.0.iter_mut().map(|(_, s)| s)
    }
}

impl Serialize for SeriesMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, series) in &self.0 {
            map.serialize_entry(key, series)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SeriesMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeriesMapVisitor;

        impl<'de> Visitor<'de> for SeriesMapVisitor {
            type Value = SeriesMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of series keys to series")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SeriesMap, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, series)) = access.next_entry::<String, Series>()? {
                    entries.push((key, series));
                }
                Ok(SeriesMap(entries))
            }
        }

        deserializer.deserialize_map(SeriesMapVisitor)
    }
}

/// バリエーションの親ユニットと、その関係
///
/// JSONでは`[parentSku, requirement]`の2要素配列として表現します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, Requirement)", into = "(String, Requirement)")]
pub struct VariationParent {
    pub sku: String,
    pub requirement: Requirement,
}

impl VariationParent {
    pub fn new(sku: impl Into<String>, requirement: Requirement) -> Self {
        Self {
            sku: sku.into(),
            requirement,
        }
    }
}

impl From<(String, Requirement)> for VariationParent {
    fn from((sku, requirement): (String, Requirement)) -> Self {
        Self { sku, requirement }
    }
}

impl From<VariationParent> for (String, Requirement) {
    fn from(parent: VariationParent) -> Self {
        (parent.sku, parent.requirement)
    }
}

/// オプション品（複数のユニットに紐づく）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    #[serde(rename = "manufacturerSku")]
    pub manufacturer_sku: String,

    pub name: String,

    pub price: String,

    #[serde(rename = "type")]
    pub section: Section,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_product_category: Option<String>,

    #[serde(rename = "baseSku", default)]
    pub base_sku: Vec<String>,

    #[serde(default)]
    pub variation_parents: Vec<VariationParent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_category: Option<String>,
}

/// 単品パーツ（親を持たない）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,

    pub price: String,

    #[serde(rename = "manufacturerSku")]
    pub manufacturer_sku: String,

    #[serde(rename = "type")]
    pub section: Section,
}

/// バリエーションを追加・マージする際の入力
#[derive(Debug, Clone)]
pub(crate) struct VariationEntry {
    pub manufacturer_sku: String,
    pub name: String,
    pub price: String,
    pub section: Section,
    pub category: Option<String>,
    pub base_sku: Option<String>,
    pub parents: Vec<VariationParent>,
}

/// カタログ全体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub series: SeriesMap,

    #[serde(default)]
    pub variations: BTreeMap<String, Variation>,

    #[serde(default)]
    pub products: BTreeMap<String, Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// すべてのシリーズの本体SKUを出現順（重複なし）で返す
    pub fn all_unit_skus(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.series
            .values()
            .flat_map(Series::unit_skus)
            .filter(|sku| seen.insert(*sku))
            .collect()
    }

    /// バリエーションを追加する
    ///
    /// 同じSKUが既に存在する場合は上書きせず、`baseSku`と`variation_parents`を追記します。
    pub(crate) fn upsert_variation(&mut self, entry: VariationEntry) {
        match self.variations.get_mut(&entry.manufacturer_sku) {
            Some(existing) => {
                existing.base_sku.extend(entry.base_sku);
                existing.variation_parents.extend(entry.parents);
            }
            None => {
                let variation = Variation {
                    manufacturer_sku: entry.manufacturer_sku.clone(),
                    name: entry.name,
                    price: entry.price,
                    section: entry.section,
                    catalog_product_category: entry.category,
                    base_sku: entry.base_sku.into_iter().collect(),
                    variation_parents: entry.parents,
                    product_category: None,
                };
                self.variations.insert(entry.manufacturer_sku, variation);
            }
        }
    }

    /// 単品パーツを追加する（先に登録されたものを優先）
    ///
    /// 追加した場合は`true`を返します。
    pub(crate) fn insert_product(&mut self, product: Product) -> bool {
        if self.products.contains_key(&product.manufacturer_sku) {
            return false;
        }
        self.products
            .insert(product.manufacturer_sku.clone(), product);
        true
    }
}
