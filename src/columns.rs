//! Column role resolution.
//!
//! Each role has an ordered alias list (most specific first). Resolution is
//! two passes: exact case-insensitive match on trimmed header names for all
//! roles, then substring match for whatever is still unresolved. A column
//! claimed by one role is never handed to another.

use crate::error::{ReportError, Result};
use crate::types::{ColumnRef, ColumnRoleMap, Dataset, Role};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    pub name: Vec<String>,
    pub cost: Vec<String>,
    pub quantity: Vec<String>,
    pub date: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            name: owned(&[
                "item name",
                "product name",
                "product",
                "item",
                "name",
                "description",
                "particulars",
            ]),
            cost: owned(&[
                "item cost",
                "price",
                "unit price",
                "cost",
                "rate",
                "mrp",
                "selling price",
            ]),
            quantity: owned(&["quantity", "qty", "units", "pcs", "count", "sold"]),
            date: owned(&[
                "date",
                "order date",
                "invoice date",
                "sale date",
                "created",
                "time",
            ]),
        }
    }
}

impl ColumnAliases {
    pub fn for_role(&self, role: Role) -> &[String] {
        match role {
            Role::Name => &self.name,
            Role::Cost => &self.cost,
            Role::Quantity => &self.quantity,
            Role::Date => &self.date,
        }
    }
}

/// Manual column choices that bypass alias matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnOverrides {
    pub name: Option<String>,
    pub cost: Option<String>,
    pub quantity: Option<String>,
    pub date: Option<String>,
}

impl ColumnOverrides {
    pub fn for_role(&self, role: Role) -> Option<&str> {
        match role {
            Role::Name => self.name.as_deref(),
            Role::Cost => self.cost.as_deref(),
            Role::Quantity => self.quantity.as_deref(),
            Role::Date => self.date.as_deref(),
        }
    }
}

/// Alias-based resolution. Unresolved roles are simply absent from the map.
pub fn resolve(columns: &[String], aliases: &ColumnAliases) -> ColumnRoleMap {
    let mut map = ColumnRoleMap::default();
    resolve_into(columns, aliases, &mut map);
    map
}

/// Resolve the roles `map` does not hold yet. Columns already in `map` are
/// treated as claimed.
fn resolve_into(columns: &[String], aliases: &ColumnAliases, map: &mut ColumnRoleMap) {
    let lowered: Vec<String> = columns.iter().map(|c| c.trim().to_lowercase()).collect();

    // Pass 1: exact
    for role in Role::ALL {
        if map.get(role).is_some() {
            continue;
        }
        let hit = aliases.for_role(role).iter().find_map(|alias| {
            let alias = alias.trim().to_lowercase();
            lowered
                .iter()
                .enumerate()
                .find(|(i, c)| **c == alias && !map.contains_index(*i))
                .map(|(i, _)| i)
        });
        if let Some(index) = hit {
            debug!(%role, column = %columns[index], "exact column match");
            map.insert(role, ColumnRef { name: columns[index].clone(), index });
        }
    }

    // Pass 2: substring
    for role in Role::ALL {
        if map.get(role).is_some() {
            continue;
        }
        let hit = aliases.for_role(role).iter().find_map(|alias| {
            let alias = alias.trim().to_lowercase();
            if alias.is_empty() {
                return None;
            }
            lowered
                .iter()
                .enumerate()
                .find(|(i, c)| c.contains(&alias) && !map.contains_index(*i))
                .map(|(i, _)| i)
        });
        if let Some(index) = hit {
            debug!(%role, column = %columns[index], "substring column match");
            map.insert(role, ColumnRef { name: columns[index].clone(), index });
        }
    }
}

/// Resolve roles for a dataset, applying manual overrides first, and fail
/// if any required role is still missing. Overridden columns are claimed
/// before alias matching, so no other role can land on them.
pub fn resolve_roles(
    dataset: &Dataset,
    aliases: &ColumnAliases,
    overrides: &ColumnOverrides,
) -> Result<ColumnRoleMap> {
    let mut map = ColumnRoleMap::default();
    for role in Role::ALL {
        if let Some(column) = overrides.for_role(role) {
            let index = dataset
                .column_index(column)
                .ok_or_else(|| ReportError::UnknownColumn {
                    role,
                    column: column.to_string(),
                })?;
            map.insert(
                role,
                ColumnRef {
                    name: dataset.columns[index].clone(),
                    index,
                },
            );
        }
    }
    resolve_into(&dataset.columns, aliases, &mut map);
    let missing = map.missing_required();
    if !missing.is_empty() {
        return Err(ReportError::UnresolvedColumns { roles: missing });
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn name_of(map: &ColumnRoleMap, role: Role) -> Option<&str> {
        map.get(role).map(|c| c.name.as_str())
    }

    #[test]
    fn resolves_product_unit_price_qty_sold() {
        let map = resolve(&cols(&["Product", "Unit Price", "Qty Sold"]), &ColumnAliases::default());
        assert_eq!(name_of(&map, Role::Name), Some("Product"));
        assert_eq!(name_of(&map, Role::Cost), Some("Unit Price"));
        assert_eq!(name_of(&map, Role::Quantity), Some("Qty Sold"));
        assert_eq!(name_of(&map, Role::Date), None);
    }

    #[test]
    fn exact_match_beats_earlier_substring_column() {
        let map = resolve(
            &cols(&["Price List Ref", "Item Name", " item cost ", "Quantity", "Order Date"]),
            &ColumnAliases::default(),
        );
        assert_eq!(name_of(&map, Role::Cost), Some(" item cost "));
        assert_eq!(map.get(Role::Cost).unwrap().index, 2);
        assert_eq!(name_of(&map, Role::Date), Some("Order Date"));
    }

    #[test]
    fn alias_order_wins_over_column_order() {
        // "price" precedes "rate" in the cost list
        let map = resolve(&cols(&["Name", "Rate", "Price", "Qty"]), &ColumnAliases::default());
        assert_eq!(name_of(&map, Role::Cost), Some("Price"));
    }

    #[test]
    fn claimed_columns_are_not_reused() {
        // "Item" exactly matches name; the substring pass must not give it to cost
        let map = resolve(&cols(&["Item", "Item Rate", "Units"]), &ColumnAliases::default());
        assert_eq!(name_of(&map, Role::Name), Some("Item"));
        assert_eq!(name_of(&map, Role::Cost), Some("Item Rate"));
        assert_eq!(name_of(&map, Role::Quantity), Some("Units"));
    }

    #[test]
    fn missing_required_roles_are_reported() {
        let ds = Dataset::new(cols(&["Product", "Colour"]), vec![]);
        let err = resolve_roles(&ds, &ColumnAliases::default(), &ColumnOverrides::default())
            .unwrap_err();
        match err {
            ReportError::UnresolvedColumns { roles } => {
                assert_eq!(roles, vec![Role::Cost, Role::Quantity])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn overrides_fill_and_validate() {
        let ds = Dataset::new(cols(&["Product", "Amt", "Pieces"]), vec![]);
        let overrides = ColumnOverrides {
            cost: Some("Amt".into()),
            quantity: Some("Pieces".into()),
            ..Default::default()
        };
        let map = resolve_roles(&ds, &ColumnAliases::default(), &overrides).unwrap();
        assert_eq!(name_of(&map, Role::Cost), Some("Amt"));
        assert_eq!(map.get(Role::Quantity).unwrap().index, 2);

        let bad = ColumnOverrides {
            cost: Some("Nope".into()),
            ..overrides
        };
        let err = resolve_roles(&ds, &ColumnAliases::default(), &bad).unwrap_err();
        assert!(matches!(err, ReportError::UnknownColumn { role: Role::Cost, .. }));
    }

    #[test]
    fn overridden_columns_are_claimed_before_matching() {
        // "Sold" would exactly match quantity, but the user says it holds dates
        let ds = Dataset::new(cols(&["Product", "Sold", "Price", "Quantity Ordered"]), vec![]);
        let overrides = ColumnOverrides {
            date: Some("Sold".into()),
            ..Default::default()
        };
        let map = resolve_roles(&ds, &ColumnAliases::default(), &overrides).unwrap();
        assert_eq!(name_of(&map, Role::Date), Some("Sold"));
        assert_eq!(name_of(&map, Role::Quantity), Some("Quantity Ordered"));
        assert_eq!(name_of(&map, Role::Name), Some("Product"));
        assert_eq!(name_of(&map, Role::Cost), Some("Price"));
    }
}
