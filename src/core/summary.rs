use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::amount::{round_to_cents, Amount};
use crate::core::filter::parse_date;
use crate::core::record::Purchase;

/// Category reported for purchases stored without one.
pub const OTHER_CATEGORY: &str = "Inne";

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Amount,
    /// Percentage of the overall total.
    pub share: f64,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct MonthTotal {
    /// `YYYY-MM`
    pub month: String,
    pub total: Amount,
}

/// Spending aggregated by category and by month.
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct Summary {
    pub total: Amount,
    /// Number of purchases summarized.
    pub count: usize,
    pub average: Amount,
    pub by_category: Vec<CategoryTotal>,
    pub by_month: Vec<MonthTotal>,
    pub best_month: Option<MonthTotal>,
    pub worst_month: Option<MonthTotal>,
}

impl Summary {
    pub fn of(purchases: &[Purchase]) -> Summary {
        let total: Amount = purchases.iter().map(|p| p.amount).sum();
        let count = purchases.len();
        let average = match count {
            0 => Amount::default(),
            n => Amount::from_f64(total.value() / n as f64).unwrap_or_default(),
        };
        let by_category = Summary::by_category(purchases, total);
        let by_month = Summary::by_month(purchases);

        let mut best_month: Option<&MonthTotal> = None;
        let mut worst_month: Option<&MonthTotal> = None;
        for month in &by_month {
            if best_month.map_or(true, |best| month.total > best.total) {
                best_month = Some(month);
            }
            if worst_month.map_or(true, |worst| month.total < worst.total) {
                worst_month = Some(month);
            }
        }

        Summary {
            total,
            count,
            average,
            best_month: best_month.cloned(),
            worst_month: worst_month.cloned(),
            by_category,
            by_month,
        }
    }

    fn by_category(purchases: &[Purchase], total: Amount) -> Vec<CategoryTotal> {
        let mut totals: Vec<(String, Amount)> = Vec::new();
        for purchase in purchases {
            let name = match purchase.category.trim() {
                "" => OTHER_CATEGORY,
                name => name,
            };
            match totals.iter_mut().find(|(category, _)| category == name) {
                Some((_, sum)) => *sum = *sum + purchase.amount,
                None => totals.push((name.to_owned(), purchase.amount)),
            }
        }
        // stable, so ties keep first-seen order
        totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        totals.into_iter()
            .map(|(category, sum)| CategoryTotal {
                category,
                total: sum,
                share: if total.is_positive() {
                    round_to_cents(sum.value() / total.value() * 100.0)
                } else {
                    0.0
                },
            })
            .collect()
    }

    fn by_month(purchases: &[Purchase]) -> Vec<MonthTotal> {
        let mut totals: BTreeMap<String, Amount> = BTreeMap::new();
        for purchase in purchases {
            let Some(date) = parse_date(&purchase.entry_date) else {
                continue;
            };
            let sum = totals.entry(date.format("%Y-%m").to_string()).or_default();
            *sum = *sum + purchase.amount;
        }
        totals.into_iter()
            .map(|(month, total)| MonthTotal { month, total })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use crate::core::{Amount, NewPurchase, Purchase, Summary};

    use rstest::{fixture, rstest};

    fn purchase(date: &str, category: &str, amount: f64) -> Purchase {
        Purchase::new(
            NewPurchase {
                store: "Sklep".to_owned(),
                category: category.to_owned(),
                amount: Amount::from_f64(amount).unwrap(),
            },
            format!("{}-{}", date, category),
            date.to_owned())
    }

    #[fixture]
    fn purchases() -> Vec<Purchase> {
        vec![
            purchase("2024-04-15", "Jedzenie", 30.0),
            purchase("2024-05-01", "Dom", 100.0),
            purchase("2024-05-20", "Jedzenie", 20.5),
            purchase("2024-06-02", "Transport", 49.5),
            purchase("brak", "Transport", 0.5),
        ]
    }

    #[rstest]
    fn totals(purchases: Vec<Purchase>) {
        let summary = Summary::of(&purchases);
        assert_eq!(summary.total.value(), 200.5);
    }

    #[rstest]
    fn count_and_average(purchases: Vec<Purchase>) {
        let summary = Summary::of(&purchases);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.average.value(), 40.1);
    }

    #[test]
    fn blank_category_is_reported_as_other() {
        let purchases = vec![
            purchase("2024-05-01", "", 10.0),
            purchase("2024-05-02", "Dom", 5.0),
            purchase("2024-05-03", "  ", 2.5),
        ];
        let summary = Summary::of(&purchases);
        let categories: Vec<_> = summary.by_category.iter()
            .map(|c| (c.category.as_str(), c.total.value()))
            .collect();
        assert_eq!(categories, vec![(super::OTHER_CATEGORY, 12.5), ("Dom", 5.0)]);
    }

    #[rstest]
    fn categories_sorted_by_total(purchases: Vec<Purchase>) {
        let summary = Summary::of(&purchases);
        let categories: Vec<_> = summary.by_category.iter()
            .map(|c| (c.category.as_str(), c.total.value()))
            .collect();
        assert_eq!(categories, vec![("Dom", 100.0), ("Jedzenie", 50.5), ("Transport", 50.0)]);
        assert_eq!(summary.by_category[0].share, 49.88);
    }

    #[rstest]
    fn months_ascending_without_undated_rows(purchases: Vec<Purchase>) {
        let summary = Summary::of(&purchases);
        let months: Vec<_> = summary.by_month.iter()
            .map(|m| (m.month.as_str(), m.total.value()))
            .collect();
        assert_eq!(months, vec![("2024-04", 30.0), ("2024-05", 120.5), ("2024-06", 49.5)]);
        assert_eq!(summary.best_month.unwrap().month, "2024-05");
        assert_eq!(summary.worst_month.unwrap().month, "2024-04");
    }

    #[test]
    fn empty() {
        let summary = Summary::of(&[]);
        assert_eq!(summary, Summary::default());
        assert!(summary.best_month.is_none());
    }
}
