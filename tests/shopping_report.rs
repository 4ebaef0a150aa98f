use foodgram::shopping_list::{aggregate, render_report, repo::CartIngredientRow, REPORT_HEADER};

fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
    CartIngredientRow {
        name: name.into(),
        measurement_unit: unit.into(),
        amount,
    }
}

#[test]
fn two_recipes_in_cart_produce_merged_report() {
    let rows = vec![
        row("молоко", "мл", 100),
        row("мука", "г", 250),
        row("яйца", "шт", 2),
        row("яйца", "шт", 3),
    ];
    let report = render_report(&aggregate(rows));
    assert_eq!(
        report,
        format!("{REPORT_HEADER}\nмолоко - 100 мл\nмука - 250 г\nяйца - 5 шт\n")
    );
}
