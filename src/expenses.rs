use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One expenditure as submitted on the expenses form. Records are append-only;
/// there is no edit or delete route.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ExpenditureRecord {
    pub id: String,
    pub email: String,
    pub title: String,
    pub amount: f64,
    pub date: String,
    pub category: String,
    pub semester: String,
}

/// Per-semester spending summary for the expenses page.
///
/// `groups` holds (label, total) pairs sorted ascending by total for the bar
/// chart. Max/min are selected over the groups; with no records at all both
/// semesters are the "N/A" sentinel and both amounts 0.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ExpenditureSummary {
    pub groups: Vec<(String, f64)>,
    pub max_semester: String,
    pub max_amount: f64,
    pub min_semester: String,
    pub min_amount: f64,
}

impl Default for ExpenditureSummary {
    fn default() -> Self {
        ExpenditureSummary {
            groups: Vec::new(),
            max_semester: "N/A".to_string(),
            max_amount: 0.0,
            min_semester: "N/A".to_string(),
            min_amount: 0.0,
        }
    }
}

/// Groups a user's expenditures by semester and sums each group.
///
/// Ties on max/min totals are broken lexicographically by semester label, the
/// smaller label winning, so the selection is deterministic regardless of map
/// iteration order.
pub fn aggregate_expenditures(records: &[ExpenditureRecord]) -> ExpenditureSummary {
    if records.is_empty() {
        return ExpenditureSummary::default();
    }

    let mut totals: HashMap<String, f64> = HashMap::new();
    for record in records {
        *totals.entry(record.semester.clone()).or_insert(0.0) += record.amount;
    }

    let mut groups: Vec<(String, f64)> = totals.into_iter().collect();
    // Ascending by total for the chart; label breaks ties so the order is stable.
    groups.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    let mut max = &groups[0];
    let mut min = &groups[0];
    for group in &groups {
        if group.1 > max.1 || (group.1 == max.1 && group.0 < max.0) {
            max = group;
        }
        if group.1 < min.1 || (group.1 == min.1 && group.0 < min.0) {
            min = group;
        }
    }

    let max_semester = max.0.clone();
    let max_amount = max.1;
    let min_semester = min.0.clone();
    let min_amount = min.1;

    ExpenditureSummary {
        groups,
        max_semester,
        max_amount,
        min_semester,
        min_amount,
    }
}
