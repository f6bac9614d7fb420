use crate::category::Category;
use crate::types::{DrilldownRow, NormalizedRow, SummaryRow, TopProductRow};
use crate::util::shares_pct;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// The three report views derived from one set of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub summary: Vec<SummaryRow>,
    pub drilldown: Vec<DrilldownRow>,
    pub top_products: Vec<TopProductRow>,
}

pub fn aggregate(rows: &[NormalizedRow], top_limit: Option<usize>) -> Aggregates {
    Aggregates {
        summary: summarize_by_category(rows),
        drilldown: price_drilldown(rows),
        top_products: top_products(rows, top_limit),
    }
}

fn by_label(a: Category, b: Category) -> Ordering {
    a.as_str().cmp(b.as_str())
}

/// Category totals with revenue and quantity shares of the grand totals,
/// ordered by category label.
pub fn summarize_by_category(rows: &[NormalizedRow]) -> Vec<SummaryRow> {
    #[derive(Default)]
    struct Acc {
        quantity: f64,
        amount: f64,
    }
    let mut map: BTreeMap<Category, Acc> = BTreeMap::new();
    for r in rows {
        let e = map.entry(r.category).or_default();
        e.quantity += r.quantity;
        e.amount += r.amount;
    }

    let mut totals: Vec<(Category, Acc)> = map.into_iter().collect();
    totals.sort_by(|a, b| by_label(a.0, b.0));

    // shares are apportioned after sorting so remainder ties favour label order
    let amounts: Vec<f64> = totals.iter().map(|(_, a)| a.amount).collect();
    let quantities: Vec<f64> = totals.iter().map(|(_, a)| a.quantity).collect();
    let revenue_shares = shares_pct(&amounts);
    let quantity_shares = shares_pct(&quantities);

    totals
        .into_iter()
        .zip(revenue_shares.into_iter().zip(quantity_shares))
        .map(|((category, acc), (revenue_share_pct, quantity_share_pct))| SummaryRow {
            category,
            total_quantity: acc.quantity,
            total_amount: acc.amount,
            revenue_share_pct,
            quantity_share_pct,
        })
        .collect()
}

/// Totals per (category, unit price), ordered by category label then price.
pub fn price_drilldown(rows: &[NormalizedRow]) -> Vec<DrilldownRow> {
    let mut map: HashMap<(Category, OrderedFloat<f64>), f64> = HashMap::new();
    for r in rows {
        *map.entry((r.category, OrderedFloat(r.unit_cost))).or_insert(0.0) += r.quantity;
    }
    let mut out: Vec<DrilldownRow> = map
        .into_iter()
        .map(|((category, price), quantity)| DrilldownRow {
            category,
            price: price.0,
            total_quantity: quantity,
            total_amount: price.0 * quantity,
        })
        .collect();
    out.sort_by(|a, b| {
        by_label(a.category, b.category)
            .then_with(|| OrderedFloat(a.price).cmp(&OrderedFloat(b.price)))
    });
    out
}

/// Totals per exact product name, highest revenue first. Ties keep the
/// order in which products first appeared.
pub fn top_products(rows: &[NormalizedRow], limit: Option<usize>) -> Vec<TopProductRow> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<TopProductRow> = Vec::new();
    for r in rows {
        let slot = *index.entry(r.product_name.as_str()).or_insert_with(|| {
            out.push(TopProductRow {
                product_name: r.product_name.clone(),
                total_quantity: 0.0,
                total_amount: 0.0,
                category: r.category,
            });
            out.len() - 1
        });
        out[slot].total_quantity += r.quantity;
        out[slot].total_amount += r.amount;
    }
    // stable sort keeps first-seen order among equal amounts
    out.sort_by(|a, b| {
        OrderedFloat(b.total_amount).cmp(&OrderedFloat(a.total_amount))
    });
    if let Some(n) = limit {
        out.truncate(n);
    }
    out
}
