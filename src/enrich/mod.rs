//! Enrichment Pipeline
//!
//! 読み込んだカタログに、ユニットごとの派生属性を順番に書き込むモジュール。
//! 各段階は前の段階が書き込んだ属性を読むため、実行順序は固定です。

mod rules;

use crate::api::FuelType;
use crate::text::sku_stem;
use crate::types::{Catalog, ProductLine, Series, Unit};

/// 段階ごとのユニットの文脈
struct UnitContext<'a> {
    title: Option<&'a str>,
    base_skus: &'a [String],
    line_name: &'a str,
    column: usize,
}

/// カタログをエンリッチする
///
/// 次の順で全体を走査します。
///
/// 1. `content`の削除
/// 2. シリーズタイトルの整形
/// 3. `base_sku`
/// 4. `fuel_type` → `gas_fuel_type` → `ignition_type`
/// 5. `series_number` → `series_name`
/// 6. `vent_type` → `style`
/// 7. `product_category` → `productTypeNonoperative`
/// 8. `display_name`
///
/// 同じカタログに2回適用しても結果は変わりません。
pub fn enrich(catalog: &mut Catalog) {
    strip_content(catalog);
    sanitize_titles(catalog);
    assign_base_sku(catalog);
    assign_fuel_type(catalog);
    assign_gas_fuel_type(catalog);
    assign_ignition_type(catalog);
    assign_series_number(catalog);
    assign_series_name(catalog);
    assign_vent_type(catalog);
    assign_style(catalog);
    assign_product_category(catalog);
    assign_nonoperative_type(catalog);
    assign_display_name(catalog);

    log::info!(
        "Enriched {} series, {} variations",
        catalog.series.len(),
        catalog.variations.len()
    );
}

fn for_each_unit<F>(catalog: &mut Catalog, mut f: F)
where
    F: FnMut(&UnitContext<'_>, &mut Unit),
{
    for series in catalog.series.values_mut() {
        let Series {
            title,
            base_sku,
            units,
            ..
        } = series;
        for line in units.iter_mut() {
            let ProductLine { name, details, .. } = line;
            for (column, slot) in details.iter_mut().enumerate() {
                if let Some(unit) = slot {
                    let context = UnitContext {
                        title: title.as_deref(),
                        base_skus: base_sku.as_slice(),
                        line_name: name.as_str(),
                        column,
                    };
                    f(&context, unit);
                }
            }
        }
    }
}

fn for_each_variation_slot<F>(catalog: &mut Catalog, mut f: F)
where
    F: FnMut(&str, &mut Unit),
{
    for series in catalog.series.values_mut() {
        for line in series.variations.iter_mut() {
            let ProductLine { name, details, .. } = line;
            for unit in details.iter_mut().flatten() {
                f(name.as_str(), unit);
            }
        }
    }
}

fn is_gas(unit: &Unit) -> bool {
    unit.fuel_type == Some(FuelType::Gas)
}

fn strip_content(catalog: &mut Catalog) {
    for series in catalog.series.values_mut() {
        series.content.clear();
    }
}

fn sanitize_titles(catalog: &mut Catalog) {
    for series in catalog.series.values_mut() {
        if let Some(title) = series.title.as_mut() {
            *title = rules::sanitize_title(title);
        }
    }
}

fn assign_base_sku(catalog: &mut Catalog) {
    for_each_unit(catalog, |ctx, unit| {
        let base_sku = match ctx.base_skus.get(ctx.column).filter(|b| !b.is_empty()) {
            Some(header) => header.clone(),
            None => {
                log::debug!(
                    "Unit {} has no base SKU header, deriving from SKU",
                    unit.manufacturer_sku
                );
                sku_stem(&unit.manufacturer_sku).to_string()
            }
        };
        unit.base_sku = (!base_sku.is_empty()).then_some(base_sku);
    });
}

fn assign_fuel_type(catalog: &mut Catalog) {
    for_each_unit(catalog, |ctx, unit| {
        unit.fuel_type = Some(rules::fuel_type(ctx.line_name));
    });
}

fn assign_gas_fuel_type(catalog: &mut Catalog) {
    for_each_unit(catalog, |ctx, unit| {
        unit.gas_fuel_type = is_gas(unit).then(|| rules::gas_fuel_type(ctx.line_name));
    });
}

fn assign_ignition_type(catalog: &mut Catalog) {
    for_each_unit(catalog, |ctx, unit| {
        unit.ignition_type = is_gas(unit).then(|| rules::ignition_type(ctx.line_name));
    });
}

fn assign_series_number(catalog: &mut Catalog) {
    for_each_unit(catalog, |_, unit| {
        unit.series_number = unit.base_sku.as_deref().and_then(rules::series_number);
        if unit.series_number.is_none() {
            log::debug!("No series number for unit {}", unit.manufacturer_sku);
        }
    });
}

fn assign_series_name(catalog: &mut Catalog) {
    for_each_unit(catalog, |ctx, unit| {
        unit.series_name = ctx
            .title
            .map(|title| rules::series_name(title, unit.series_number.as_deref()));
    });
}

fn assign_vent_type(catalog: &mut Catalog) {
    for_each_unit(catalog, |ctx, unit| {
        unit.vent_type = is_gas(unit).then(|| rules::vent_type(ctx.line_name));
    });
}

fn assign_style(catalog: &mut Catalog) {
    for_each_unit(catalog, |ctx, unit| {
        let style = rules::style(
            unit.series_name.as_deref().unwrap_or(""),
            ctx.line_name,
            unit.base_sku.as_deref().unwrap_or(""),
        );
        unit.style = Some(style.to_string());
    });
}

fn assign_product_category(catalog: &mut Catalog) {
    for_each_unit(catalog, |ctx, unit| {
        unit.product_category = Some(rules::unit_category(ctx.line_name));
    });
    for_each_variation_slot(catalog, |line_name, slot| {
        slot.product_category = rules::variation_category(line_name).map(str::to_string);
    });
    for variation in catalog.variations.values_mut() {
        variation.product_category = rules::variation_category(&variation.name).map(str::to_string);
    }
}

fn assign_nonoperative_type(catalog: &mut Catalog) {
    for_each_unit(catalog, |_, unit| {
        let category = unit.product_category.as_deref().unwrap_or("");
        unit.product_type_nonoperative = Some(rules::nonoperative_type(category).to_string());
    });
    for_each_variation_slot(catalog, |_, slot| {
        slot.product_type_nonoperative = Some(rules::VARIATION_PRODUCT.to_string());
    });
}

fn assign_display_name(catalog: &mut Catalog) {
    for_each_unit(catalog, |_, unit| {
        unit.display_name = Some(unit_display_name(unit));
    });
    for_each_variation_slot(catalog, |line_name, slot| {
        slot.display_name = Some(format!("Napoleon {} | {}", line_name, slot.manufacturer_sku));
    });
}

/// `Napoleon <シリーズ名 番号> [<ベント方式>] <カテゴリー（単数形）> | <ベースSKU>`
fn unit_display_name(unit: &Unit) -> String {
    let series = format!(
        "{} {}",
        unit.series_name.as_deref().unwrap_or(""),
        unit.series_number.as_deref().unwrap_or("")
    );
    let category = unit
        .product_category
        .as_deref()
        .unwrap_or("")
        .trim_end_matches('s');
    let base_sku = unit.base_sku.as_deref().unwrap_or("");

    if is_gas(unit) {
        format!(
            "Napoleon {} {} {} | {}",
            series.trim(),
            unit.vent_type.as_deref().unwrap_or(""),
            category,
            base_sku
        )
    } else {
        format!("Napoleon {} {} | {}", series.trim(), category, base_sku)
    }
}
