//! Cross-Reference Resolver
//!
//! スキャン後に未解決の親参照を解決し、カタログに対する検索ヘルパーを提供するモジュール。

use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::api::{ItemKind, Requirement};
use crate::text::{collapse_whitespace, contains_ignore_case, sku_stem, title_case};
use crate::types::{Catalog, Series, Unit, VariationParent};

/// スキャン時点で親ユニットが見つからなかった参照
///
/// "Additional Options" 表は対象シリーズより前に現れることがあるため、
/// 全シリーズの読み込み後にベースSKUの前方一致で解決します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredParent {
    /// 親を追加するバリエーションのSKU
    pub variation_sku: String,
    /// 親ユニットを探すためのベースSKU
    pub base_sku: String,
    pub requirement: Requirement,
}

/// 未解決の親参照を解決する
///
/// 一致したユニットはバリエーションの`variation_parents`に追記されます。
/// 一致しない参照は破棄されます。
///
/// # 戻り値
///
/// 追加された親の数
pub fn resolve_deferred(catalog: &mut Catalog, deferred: Vec<DeferredParent>) -> usize {
    let unit_skus: Vec<String> = catalog
        .all_unit_skus()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut added = 0;
    for reference in deferred {
        let Some(variation) = catalog.variations.get_mut(&reference.variation_sku) else {
            log::debug!("Deferred parent for unknown variation {}", reference.variation_sku);
            continue;
        };

        let before = variation.variation_parents.len();
        variation.variation_parents.extend(
            unit_skus
                .iter()
                .filter(|sku| sku.starts_with(&reference.base_sku))
                .map(|sku| VariationParent::new(sku.as_str(), reference.requirement.clone())),
        );

        let resolved = variation.variation_parents.len() - before;
        if resolved == 0 {
            log::debug!(
                "No unit matches base SKU {} for variation {}",
                reference.base_sku,
                reference.variation_sku
            );
        }
        added += resolved;
    }
    added
}

/// 小文字しか含まないSKUを大文字にする
///
/// `S20i`のように小文字を含む正規のSKUがあるため、大文字を1文字も含まない場合のみ変換します。
pub fn normalize_sku(sku: &str) -> Cow<'_, str> {
    if sku.chars().any(|c| c.is_ascii_uppercase()) {
        Cow::Borrowed(sku)
    } else {
        Cow::Owned(sku.to_uppercase())
    }
}

/// カタログに対する読み取り専用の検索ビュー
///
/// すべての検索はSKUを`normalize_sku`で正規化してから行います。
///
/// # 使用例
///
/// ```rust,no_run
/// use napoleon_pricebook::{CatalogIndex, ItemKind};
/// # let catalog = napoleon_pricebook::Catalog::default();
///
/// let index = CatalogIndex::new(&catalog);
/// if index.classify("lv50n") == ItemKind::Unit {
///     println!("{:?}", index.check_base_sku("lv50n"));
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CatalogIndex<'a> {
    catalog: &'a Catalog,
}

impl<'a> CatalogIndex<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// SKUの種別を判定する
    ///
    /// 本体表に存在すれば`Unit`、次に`variations`、`products`の順に調べます。
    pub fn classify(&self, sku: &str) -> ItemKind {
        let sku = normalize_sku(sku);
        if self.find_series(&sku).is_some() {
            ItemKind::Unit
        } else if self.catalog.variations.contains_key(&*sku) {
            ItemKind::Variation
        } else if self.catalog.products.contains_key(&*sku) {
            ItemKind::Product
        } else {
            ItemKind::NotFound
        }
    }

    /// SKUを本体表に含むシリーズ（キーとシリーズ）
    pub fn find_series(&self, sku: &str) -> Option<(&'a str, &'a Series)> {
        let sku = normalize_sku(sku);
        self.catalog
            .series
            .iter()
            .find(|(_, series)| series.contains_unit(&sku))
    }

    /// SKUに対応するユニットレコード
    pub fn unit(&self, sku: &str) -> Option<&'a Unit> {
        let sku = normalize_sku(sku);
        let (_, series) = self.find_series(&sku)?;
        let (line_idx, col) = series.locate_unit(&sku)?;
        series.units[line_idx].details[col].as_ref()
    }

    /// 同じ列に並ぶユニット（自分自身を含む）
    ///
    /// 列インデックスが同じであれば、表が違っても同じ製品の別仕様（燃料・点火方式違いなど）です。
    pub fn siblings(&self, sku: &str) -> Vec<&'a Unit> {
        let sku = normalize_sku(sku);
        let Some((_, series)) = self.find_series(&sku) else {
            return Vec::new();
        };
        let Some((_, col)) = series.locate_unit(&sku) else {
            return Vec::new();
        };

        series
            .units
            .iter()
            .filter_map(|line| line.details.get(col).and_then(Option::as_ref))
            .collect()
    }

    /// 指定した属性をすべて満たす最初の兄弟ユニット
    ///
    /// # 引数
    ///
    /// * `sku` - 基準となるユニットのSKU
    /// * `requirements` - `(属性名, 値)`の組。値は大文字・小文字を無視した部分一致で比較します
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// # use napoleon_pricebook::{Catalog, CatalogIndex};
    /// # let catalog = Catalog::default();
    /// let index = CatalogIndex::new(&catalog);
    /// let propane = index.sibling_matching(
    ///     "LV50N",
    ///     &[("gas_fuel_type", "propane"), ("ignition_type", "electronic")],
    /// );
    /// ```
    pub fn sibling_matching(&self, sku: &str, requirements: &[(&str, &str)]) -> Option<&'a Unit> {
        self.siblings(sku).into_iter().find(|unit| {
            requirements.iter().all(|(attribute, value)| {
                unit.attribute(attribute)
                    .is_some_and(|actual| contains_ignore_case(actual, value))
            })
        })
    }

    /// ユニットのベースSKUを判定する
    ///
    /// シリーズのヘッダーにSKUの接頭辞となるベースSKUがあればそれを、
    /// なければユニットの列位置のベースSKUを使用します。
    /// 末尾が小文字でない限り（`BHD4-Cradle`, `S20i`など）先頭の英字と数字のみに縮めます。
    /// シリーズにベースSKUがない場合はSKU自体から同じ規則で求めます。
    ///
    /// ユニットでないSKUは`None`を返します。
    pub fn check_base_sku(&self, sku: &str) -> Option<String> {
        let sku = normalize_sku(sku);
        let (_, series) = self.find_series(&sku)?;

        if series.base_sku.is_empty() {
            return Some(sku_stem(&sku).to_string());
        }

        let header = series
            .base_sku
            .iter()
            .find(|base| !base.is_empty() && sku.starts_with(base.as_str()))
            .or_else(|| {
                let (_, col) = series.locate_unit(&sku)?;
                series.base_sku.get(col)
            })?;

        if header.chars().last().is_some_and(char::is_lowercase) {
            Some(header.clone())
        } else {
            Some(sku_stem(header).to_string())
        }
    }

    /// バリエーションの親SKU（ソート済み、重複なし）
    pub fn parent_skus(&self, sku: &str) -> Vec<String> {
        let sku = normalize_sku(sku);
        self.catalog
            .variations
            .get(&*sku)
            .map(|variation| {
                variation
                    .variation_parents
                    .iter()
                    .map(|parent| parent.sku.clone())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 親ユニットが2つ以上あるか
    pub fn is_shared_variation(&self, sku: &str) -> bool {
        self.parent_skus(sku).len() >= 2
    }

    /// 親ユニットが1つ以上あるか
    pub fn is_step_variation(&self, sku: &str) -> bool {
        !self.parent_skus(sku).is_empty()
    }

    /// 親ユニットに対する関係のまとめ（`Required/Optional`, `Included/Optional`など）
    ///
    /// `Not Available`は除外します。`Included`を含む場合は昇順、それ以外は降順で連結します。
    /// 親を持たないSKUは`None`を返します。
    pub fn requirement_summary(&self, sku: &str) -> Option<String> {
        if !self.is_step_variation(sku) {
            return None;
        }
        let sku = normalize_sku(sku);
        let variation = self.catalog.variations.get(&*sku)?;

        let requirements: BTreeSet<&str> = variation
            .variation_parents
            .iter()
            .filter(|parent| parent.requirement != Requirement::NotAvailable)
            .map(|parent| parent.requirement.as_str())
            .collect();

        let ordered: Vec<&str> = if requirements.contains("Included") {
            requirements.into_iter().collect()
        } else {
            requirements.into_iter().rev().collect()
        };
        Some(ordered.join("/"))
    }

    /// ユニットが属するシリーズのベント方式
    pub fn series_venting(&self, sku: &str) -> Option<&'a str> {
        self.find_series(sku)
            .and_then(|(_, series)| series.venting.as_deref())
    }

    /// 上部・背面のどちらにもベントを選べるシリーズか
    pub fn has_top_and_rear_venting(&self, sku: &str) -> bool {
        self.series_venting(sku)
            .is_some_and(|venting| contains_ignore_case(venting, "top or rear"))
    }

    /// シリーズ内のユニットの点火方式のまとめ
    ///
    /// 例: `"Electronic or Millivolt Ignition"`。ガス機種を含まないシリーズは`None`を返します。
    pub fn series_ignition_summary(&self, sku: &str) -> Option<String> {
        let (_, series) = self.find_series(sku)?;

        let ignition_types: BTreeSet<&str> = series
            .units
            .iter()
            .flat_map(|line| line.units())
            .filter_map(|(_, unit)| unit.ignition_type.map(|i| i.as_str()))
            .collect();
        if ignition_types.is_empty() {
            return None;
        }

        let joined = ignition_types
            .into_iter()
            .collect::<Vec<_>>()
            .join(" or ")
            .to_lowercase();
        let repeats = joined.matches("ignition").count().saturating_sub(1);
        let deduplicated = joined.replacen("ignition", "", repeats);

        Some(collapse_whitespace(&title_case(&deduplicated)).replace("Or", "or"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{IgnitionType, Section};
    use crate::types::{Product, ProductLine, Variation};

    fn unit(sku: &str) -> Option<Unit> {
        Some(Unit::new("$1", sku))
    }

    fn variation(sku: &str, parents: Vec<VariationParent>) -> Variation {
        Variation {
            manufacturer_sku: sku.to_string(),
            name: sku.to_string(),
            price: "$1".to_string(),
            section: Section::AdditionalVariation,
            catalog_product_category: None,
            base_sku: Vec::new(),
            variation_parents: parents,
            product_category: None,
        }
    }

    fn sample_catalog() -> Catalog {
        let mut catalog = Catalog::new();

        let mut bhd4 = Series {
            base_sku: vec!["BHD4-Glass".to_string(), "BHD4-Cradle".to_string()],
            ..Series::default()
        };
        bhd4.units.push(ProductLine::new(
            "Gas Fireplace",
            vec![unit("BHD4PGN"), unit("BHD4STGN")],
        ));
        catalog.series.push("series-1", bhd4);

        let mut gss = Series {
            base_sku: vec!["GSS42CF".to_string()],
            venting: Some("Top or Rear".to_string()),
            ..Series::default()
        };
        gss.units
            .push(ProductLine::new("Natural Gas Electronic", vec![unit("GSS42CFN")]));
        gss.units
            .push(ProductLine::new("Propane Millivolt", vec![unit("GSS42CFP")]));
        catalog.series.push("series-2", gss);

        let mut bare = Series::default();
        bare.units.push(ProductLine::new("Stove", vec![unit("S20i")]));
        catalog.series.push("series-3", bare);

        catalog.variations.insert(
            "MKBA".to_string(),
            variation(
                "MKBA",
                vec![
                    VariationParent::new("GSS42CFP", Requirement::Optional),
                    VariationParent::new("GSS42CFN", Requirement::Included),
                    VariationParent::new("BHD4PGN", Requirement::NotAvailable),
                ],
            ),
        );
        catalog.products.insert(
            "PVA52".to_string(),
            Product {
                name: "Vent kit".to_string(),
                price: "$10".to_string(),
                manufacturer_sku: "PVA52".to_string(),
                section: Section::Product,
            },
        );
        catalog
    }

    #[test]
    fn test_normalize_sku() {
        assert_eq!(normalize_sku("lv50n"), "LV50N");
        assert_eq!(normalize_sku("S20i"), "S20i");
    }

    #[test]
    fn test_classify() {
        let catalog = sample_catalog();
        let index = CatalogIndex::new(&catalog);
        assert_eq!(index.classify("GSS42CFN"), ItemKind::Unit);
        assert_eq!(index.classify("gss42cfn"), ItemKind::Unit);
        assert_eq!(index.classify("MKBA"), ItemKind::Variation);
        assert_eq!(index.classify("PVA52"), ItemKind::Product);
        assert_eq!(index.classify("NOPE1"), ItemKind::NotFound);
    }

    #[test]
    fn test_check_base_sku_falls_back_to_column_header() {
        let catalog = sample_catalog();
        let index = CatalogIndex::new(&catalog);
        assert_eq!(index.check_base_sku("BHD4STGN").as_deref(), Some("BHD4-Cradle"));
        assert_eq!(index.check_base_sku("GSS42CFN").as_deref(), Some("GSS42"));
        assert_eq!(index.check_base_sku("MKBA"), None);
    }

    #[test]
    fn test_check_base_sku_without_series_header() {
        let catalog = sample_catalog();
        let index = CatalogIndex::new(&catalog);
        assert_eq!(index.check_base_sku("S20i").as_deref(), Some("S20"));
    }

    #[test]
    fn test_parent_skus_and_variation_flags() {
        let catalog = sample_catalog();
        let index = CatalogIndex::new(&catalog);
        assert_eq!(
            index.parent_skus("MKBA"),
            vec!["BHD4PGN", "GSS42CFN", "GSS42CFP"]
        );
        assert!(index.is_shared_variation("MKBA"));
        assert!(index.is_step_variation("MKBA"));
        assert!(!index.is_step_variation("PVA52"));
    }

    #[test]
    fn test_requirement_summary() {
        let mut catalog = sample_catalog();
        let index = CatalogIndex::new(&catalog);
        assert_eq!(
            index.requirement_summary("MKBA").as_deref(),
            Some("Included/Optional")
        );
        assert_eq!(index.requirement_summary("PVA52"), None);

        catalog.variations.insert(
            "TK1".to_string(),
            variation(
                "TK1",
                vec![
                    VariationParent::new("GSS42CFP", Requirement::Optional),
                    VariationParent::new("GSS42CFN", Requirement::Required),
                ],
            ),
        );
        let index = CatalogIndex::new(&catalog);
        assert_eq!(
            index.requirement_summary("TK1").as_deref(),
            Some("Required/Optional")
        );
    }

    #[test]
    fn test_siblings_share_column() {
        let catalog = sample_catalog();
        let index = CatalogIndex::new(&catalog);
        let skus: Vec<&str> = index
            .siblings("GSS42CFP")
            .iter()
            .map(|u| u.manufacturer_sku.as_str())
            .collect();
        assert_eq!(skus, vec!["GSS42CFN", "GSS42CFP"]);
        assert!(index.siblings("MKBA").is_empty());
    }

    #[test]
    fn test_sibling_matching_is_conjunctive() {
        let mut catalog = sample_catalog();
        for series in catalog.series.values_mut() {
            for (line_name, _, unit) in series.units_mut() {
                if line_name.contains("Propane") {
                    unit.gas_fuel_type = Some(crate::api::GasFuelType::Propane);
                    unit.ignition_type = Some(IgnitionType::Millivolt);
                } else {
                    unit.gas_fuel_type = Some(crate::api::GasFuelType::NaturalGas);
                    unit.ignition_type = Some(IgnitionType::Electronic);
                }
            }
        }
        let index = CatalogIndex::new(&catalog);

        let found = index
            .sibling_matching("GSS42CFN", &[("gas_fuel_type", "propane"), ("ignition_type", "millivolt")])
            .map(|u| u.manufacturer_sku.as_str());
        assert_eq!(found, Some("GSS42CFP"));

        let missing = index.sibling_matching(
            "GSS42CFN",
            &[("gas_fuel_type", "propane"), ("ignition_type", "electronic")],
        );
        assert!(missing.is_none());

        assert_eq!(
            index.series_ignition_summary("GSS42CFN").as_deref(),
            Some("Electronic or Millivolt Ignition")
        );
    }

    #[test]
    fn test_venting_helpers() {
        let catalog = sample_catalog();
        let index = CatalogIndex::new(&catalog);
        assert_eq!(index.series_venting("GSS42CFN"), Some("Top or Rear"));
        assert!(index.has_top_and_rear_venting("GSS42CFN"));
        assert!(!index.has_top_and_rear_venting("BHD4PGN"));
    }

    #[test]
    fn test_resolve_deferred_appends_matching_units() {
        let mut catalog = sample_catalog();
        let deferred = vec![
            DeferredParent {
                variation_sku: "MKBA".to_string(),
                base_sku: "BHD4".to_string(),
                requirement: Requirement::Optional,
            },
            DeferredParent {
                variation_sku: "MKBA".to_string(),
                base_sku: "GX70".to_string(),
                requirement: Requirement::Optional,
            },
        ];

        let added = resolve_deferred(&mut catalog, deferred);
        assert_eq!(added, 2);

        let parents = &catalog.variations["MKBA"].variation_parents;
        assert_eq!(parents.len(), 5);
        assert_eq!(parents[3], VariationParent::new("BHD4PGN", Requirement::Optional));
        assert_eq!(parents[4], VariationParent::new("BHD4STGN", Requirement::Optional));
    }
}
