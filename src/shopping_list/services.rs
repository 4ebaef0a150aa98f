use std::collections::HashMap;

use super::repo::CartIngredientRow;

pub const REPORT_HEADER: &str = "Список покупок:";
pub const REPORT_FILENAME: &str = "shopping_cart.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Sums amounts per (name, unit), keeping the order in which groups first appear.
///
/// Rows come from the database already sorted by name, so the report follows
/// its collation.
pub fn aggregate<I>(rows: I) -> Vec<ShoppingItem>
where
    I: IntoIterator<Item = CartIngredientRow>,
{
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut items: Vec<ShoppingItem> = Vec::new();
    for row in rows {
        let key = (row.name, row.measurement_unit);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            items.push(ShoppingItem {
                name: key.0,
                measurement_unit: key.1,
                total: 0,
            });
            items.len() - 1
        });
        items[slot].total += i64::from(row.amount);
    }
    items
}

/// Header line followed by one `"{name} - {total} {unit}"` line per item.
pub fn render_report(items: &[ShoppingItem]) -> String {
    let mut out = String::with_capacity(32 + items.len() * 32);
    out.push_str(REPORT_HEADER);
    out.push('\n');
    for item in items {
        out.push_str(&format!(
            "{} - {} {}\n",
            item.name, item.total, item.measurement_unit
        ));
    }
    out
}
