//! Cost and profit identities of a sales line.

use pos_model::ValidationIssue;
use pos_model::value::round_cents;
use pos_transform::CoercedTable;

use super::{difference, logic_error};

pub fn check(table: &CoercedTable, tolerance: f64) -> Vec<ValidationIssue> {
    let has_all = |fields: &[&str]| fields.iter().all(|field| table.has_field(field));
    let check_cost = has_all(&["cost_total", "cost_sales", "cost_gift"]);
    let check_profit = has_all(&["profit", "sales_amount", "cost_total"]);

    let mut issues = Vec::new();
    for (row, record) in table.records.iter().enumerate() {
        let cost_total = record.amount("cost_total");
        if check_cost {
            let cost_sales = record.amount("cost_sales");
            let cost_gift = record.amount("cost_gift");
            let expected = round_cents(cost_sales + cost_gift);
            let diff = difference(cost_total, expected);
            if diff > tolerance {
                issues.push(
                    logic_error(
                        row,
                        "cost_total",
                        format!(
                            "total cost {cost_total:.2} != sales cost + gift cost {expected:.2} (difference {diff:.2})"
                        ),
                    )
                    .with_value("cost_total", cost_total)
                    .with_value("cost_sales", cost_sales)
                    .with_value("cost_gift", cost_gift)
                    .with_value("expected", expected)
                    .with_value("difference", diff),
                );
            }
        }
        if check_profit {
            let profit = record.amount("profit");
            let sales_amount = record.amount("sales_amount");
            let expected = round_cents(sales_amount - cost_total);
            let diff = difference(profit, expected);
            if diff > tolerance {
                issues.push(
                    logic_error(
                        row,
                        "profit",
                        format!(
                            "profit {profit:.2} != sales amount - total cost {expected:.2} (difference {diff:.2})"
                        ),
                    )
                    .with_value("profit", profit)
                    .with_value("sales_amount", sales_amount)
                    .with_value("cost_total", cost_total)
                    .with_value("expected_profit", expected)
                    .with_value("difference", diff),
                );
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use pos_model::{CanonicalRecord, CanonicalValue};

    fn sales_row(values: [f64; 5]) -> CanonicalRecord {
        let mut record = CanonicalRecord::new();
        for (field, value) in ["cost_total", "cost_sales", "cost_gift", "profit", "sales_amount"]
            .into_iter()
            .zip(values)
        {
            record.insert(field, CanonicalValue::Number(value));
        }
        record
    }

    fn table(records: Vec<CanonicalRecord>) -> CoercedTable {
        CoercedTable {
            records,
            fields: ["cost_total", "cost_sales", "cost_gift", "profit", "sales_amount"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    #[test]
    fn test_consistent_line_passes() {
        let table = table(vec![sales_row([30.0, 25.0, 5.0, 70.0, 100.0])]);
        assert!(check(&table, 1.0).is_empty());
    }

    #[test]
    fn test_each_identity_reports_its_column() {
        let table = table(vec![
            sales_row([40.0, 25.0, 5.0, 60.0, 100.0]),
            sales_row([30.0, 25.0, 5.0, 50.0, 100.0]),
        ]);
        let issues = check(&table, 1.0);
        let located: Vec<(i64, &str)> = issues
            .iter()
            .map(|issue| (issue.row_index, issue.column.as_str()))
            .collect();
        assert_eq!(located, vec![(0, "cost_total"), (1, "profit")]);
        assert_eq!(issues[1].raw_snapshot["expected_profit"], 70.0);
    }
}
