use std::collections::BTreeMap;

use serde::Serialize;

use super::schema::CartIngredient;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Sums amounts per (ingredient name, unit) across every recipe in a cart.
/// Lines come out ordered by name, then unit.
pub fn aggregate<I>(parts: I) -> Vec<ShoppingListLine>
where
    I: IntoIterator<Item = CartIngredient>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

    for part in parts {
        *totals
            .entry((part.name, part.measurement_unit))
            .or_insert(0) += i64::from(part.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListLine {
            name,
            measurement_unit,
            total_amount,
        })
        .collect()
}

pub fn render(lines: &[ShoppingListLine]) -> String {
    lines
        .iter()
        .map(|line| {
            format!(
                "{} ({}) — {}\n",
                line.name, line.measurement_unit, line.total_amount
            )
        })
        .collect()
}
