//! XML Feed Writer
//!
//! エンリッチ済みのユニットを、ストアフロントのカタログインポート形式の
//! `<product>`レコードとして書き出すモジュール。

use std::collections::HashSet;
use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::PricebookError;
use crate::resolver::CatalogIndex;
use crate::types::{Catalog, Unit};

const CATALOG_NAMESPACE: &str = "http://www.demandware.com/xml/impex/catalog/2006-10-31";
const STOREFRONT_CATALOG: &str = "northcountryfire-storefront";
const BRAND: &str = "Napoleon";
const OPTION_PRODUCT: &str = "Option Product";

/// ストアフロントの商品IDを作る
///
/// 小文字化し、空白を`-`に、`.`と`/`を`_`に置き換えます。
///
/// ```rust
/// use napoleon_pricebook::make_item_id;
///
/// assert_eq!(make_item_id("GX70NTE/1"), "gx70nte_1");
/// ```
pub fn make_item_id(sku: &str) -> String {
    sku.to_lowercase()
        .replace(' ', "-")
        .replace(['.', '/'], "_")
}

/// Option Productだけが持つ追加属性
#[derive(Debug, Default)]
struct OptionAttributes {
    ignition_type: String,
    sku_ng: String,
    sku_ng_mv: String,
    sku_lp: String,
    sku_lp_mv: String,
    shared_options: Vec<&'static str>,
}

impl OptionAttributes {
    fn collect(index: &CatalogIndex<'_>, sku: &str) -> Self {
        let sibling_sku = |requirements: &[(&str, &str)]| {
            index
                .sibling_matching(sku, requirements)
                .map(|unit| unit.manufacturer_sku.clone())
                .unwrap_or_default()
        };

        let sku_ng = sibling_sku(&[("gas_fuel_type", "natural gas"), ("ignition_type", "electronic")]);
        let sku_ng_mv = sibling_sku(&[("gas_fuel_type", "natural gas"), ("ignition_type", "millivolt")]);
        let sku_lp = sibling_sku(&[("gas_fuel_type", "propane"), ("ignition_type", "electronic")]);
        let sku_lp_mv = sibling_sku(&[("gas_fuel_type", "propane"), ("ignition_type", "millivolt")]);

        let has_millivolt = !sibling_sku(&[("ignition_type", "millivolt")]).is_empty();
        let has_electronic = !sibling_sku(&[("ignition_type", "electronic")]).is_empty();

        let mut shared_options = Vec::new();
        if !sku_ng.is_empty() && !sku_lp.is_empty() {
            shared_options.push("selectOptionFuelType");
        }
        if has_millivolt && has_electronic {
            shared_options.push("selectOptionIgnitionType");
        }
        if index.has_top_and_rear_venting(sku) {
            shared_options.push("selectOptionVentConfiguration");
        }

        Self {
            ignition_type: index.series_ignition_summary(sku).unwrap_or_default(),
            sku_ng,
            sku_ng_mv,
            sku_lp,
            sku_lp_mv,
            shared_options,
        }
    }
}

/// エンリッチ済みカタログのユニットをXMLフィードとして書き込む
///
/// シリーズの出現順にユニットを1件ずつ出力し、同じSKUは最初の1件のみ出力します。
/// 属性が未設定の場合は空要素になります。
///
/// # 引数
///
/// * `catalog` - `enrich`適用済みのカタログ
/// * `output` - 出力先のライター
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use napoleon_pricebook::{read_json, write_xml};
///
/// # fn main() -> Result<(), napoleon_pricebook::PricebookError> {
/// let database = read_json(File::open("napoleon-database.json")?)?;
/// write_xml(&database, File::create("napoleon.xml")?)?;
/// # Ok(())
/// # }
/// ```
pub fn write_xml<W: Write>(catalog: &Catalog, output: W) -> Result<(), PricebookError> {
    let index = CatalogIndex::new(catalog);
    let mut writer = Writer::new_with_indent(output, b' ', 4);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("catalog");
    root.push_attribute(("xmlns", CATALOG_NAMESPACE));
    writer.write_event(Event::Start(root))?;

    let mut seen = HashSet::new();
    for series in catalog.series.values() {
        for line in &series.units {
            for (_, unit) in line.units() {
                if !seen.insert(unit.manufacturer_sku.as_str()) {
                    continue;
                }
                write_product(&mut writer, &index, unit)?;
            }
        }
    }

    writer.write_event(Event::End(BytesEnd::new("catalog")))?;
    writer.get_mut().write_all(b"\n")?;
    log::info!("Wrote {} products to XML feed", seen.len());
    Ok(())
}

fn write_product<W: Write>(
    writer: &mut Writer<W>,
    index: &CatalogIndex<'_>,
    unit: &Unit,
) -> Result<(), quick_xml::Error> {
    let sku = unit.manufacturer_sku.as_str();
    let item_id = make_item_id(sku);
    let nonoperative = unit.product_type_nonoperative.as_deref().unwrap_or("");
    let option = (nonoperative == OPTION_PRODUCT).then(|| OptionAttributes::collect(index, sku));
    let classification = if option.is_some() {
        "gas-fireplaces"
    } else {
        "all"
    };

    let mut product = BytesStart::new("product");
    product.push_attribute(("product-id", item_id.as_str()));
    writer.write_event(Event::Start(product))?;

    text_element(writer, "ean", &[], "")?;
    text_element(writer, "upc", &[], "")?;
    text_element(writer, "unit", &[], "1")?;
    text_element(writer, "min-order-quantity", &[], "1")?;
    text_element(writer, "step-quantity", &[], "1")?;
    text_element(
        writer,
        "display-name",
        &[("xml:lang", "x-default")],
        unit.display_name.as_deref().unwrap_or(""),
    )?;
    for flag in [
        "store-force-price-flag",
        "store-non-inventory-flag",
        "store-non-revenue-flag",
        "store-non-discountable-flag",
    ] {
        text_element(writer, flag, &[], "false")?;
    }
    for flag in ["online-flag", "available-flag", "searchable-flag"] {
        text_element(writer, flag, &[], "true")?;
    }
    text_element(writer, "tax-class-id", &[], "standard")?;
    text_element(
        writer,
        "classification-category",
        &[("catalog-id", STOREFRONT_CATALOG)],
        classification,
    )?;
    text_element(writer, "pinterest-enabled-flag", &[], "false")?;
    text_element(writer, "facebook-enabled-flag", &[], "false")?;

    writer.write_event(Event::Start(BytesStart::new("store-attributes")))?;
    for flag in [
        "force-price-flag",
        "non-inventory-flag",
        "non-revenue-flag",
        "non-discountable-flag",
    ] {
        text_element(writer, flag, &[], "false")?;
    }
    writer.write_event(Event::End(BytesEnd::new("store-attributes")))?;

    text_element(writer, "brand", &[], BRAND)?;
    text_element(writer, "manufacturer-sku", &[], sku)?;

    let product_set_id = format!("{}-set", item_id);
    let mut attributes: Vec<(&str, &str)> = vec![
        ("baseSku", unit.base_sku.as_deref().unwrap_or("")),
        ("configurableProduct", "true"),
        ("fuelType", unit.fuel_type.map_or("", |f| f.as_str())),
        ("productCategory", unit.product_category.as_deref().unwrap_or("")),
        ("productSetId", product_set_id.as_str()),
        ("productTypeNonoperative", nonoperative),
        ("series", unit.series_name.as_deref().unwrap_or("")),
        ("seriesNumber", unit.series_number.as_deref().unwrap_or("")),
        ("sku", sku),
    ];
    if let Some(option) = &option {
        attributes.extend([
            ("ignitionType", option.ignition_type.as_str()),
            ("skuNG", option.sku_ng.as_str()),
            ("skuNgIpi", option.sku_ng.as_str()),
            ("skuNgMv", option.sku_ng_mv.as_str()),
            ("skuLP", option.sku_lp.as_str()),
            ("skuLpIpi", option.sku_lp.as_str()),
            ("skuLpMv", option.sku_lp_mv.as_str()),
        ]);
    }

    writer.write_event(Event::Start(BytesStart::new("custom-attributes")))?;
    for (attribute_id, value) in attributes {
        text_element(writer, "custom-attribute", &[("attribute-id", attribute_id)], value)?;
    }
    writer.write_event(Event::End(BytesEnd::new("custom-attributes")))?;

    if let Some(option) = &option {
        if option.shared_options.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("options")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("options")))?;
            for option_id in &option.shared_options {
                let mut shared = BytesStart::new("shared-option");
                shared.push_attribute(("option-id", *option_id));
                writer.write_event(Event::Empty(shared))?;
            }
            writer.write_event(Event::End(BytesEnd::new("options")))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("product")))?;
    Ok(())
}

/// テキストだけを持つ要素を書き込む（空文字列は空要素）
fn text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new(name);
    for attribute in attributes {
        start.push_attribute(*attribute);
    }

    if text.is_empty() {
        return writer.write_event(Event::Empty(start));
    }
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}
