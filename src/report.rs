use std::collections::BTreeMap;

use serde::Serialize;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::employee::Employee;

/// Grouped counts keyed by department or designation name.
pub type Counts = BTreeMap<String, i64>;

/// Count employees by the value `key` picks out of each record.
pub fn count_by<'a, I, F>(employees: I, key: F) -> Counts
where
    I: IntoIterator<Item = &'a Employee>,
    F: Fn(&Employee) -> &str,
{
    let mut counts = Counts::new();
    for employee in employees {
        *counts.entry(key(employee).to_string()).or_insert(0) += 1;
    }
    counts
}

/// Share of the total for each key, `count / total * 100`.
///
/// A zero total yields 0.0 for every key rather than dividing by zero.
pub fn percentages(counts: &Counts) -> BTreeMap<String, f64> {
    let total: i64 = counts.values().sum();
    counts
        .iter()
        .map(|(key, &count)| {
            let pct = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            (key.clone(), pct)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BreakdownRow {
    #[schema(example = "IT")]
    pub name: String,
    #[schema(example = 4)]
    pub count: i64,
    #[schema(example = 40.0)]
    pub percentage: f64,
}

/// Counts with their percentages, largest group first, ties by name.
pub fn breakdown(counts: &Counts) -> Vec<BreakdownRow> {
    let pcts = percentages(counts);
    let mut rows: Vec<BreakdownRow> = counts
        .iter()
        .map(|(name, &count)| BreakdownRow {
            name: name.clone(),
            count,
            percentage: round2(pcts.get(name).copied().unwrap_or(0.0)),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    rows
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusSummary {
    pub total_present: i64,
    pub total_absent: i64,
    pub total_half_day: i64,
    pub total_leave: i64,
}

/// Tally attendance records per status.
pub fn status_summary(records: &[Attendance]) -> StatusSummary {
    let mut summary = StatusSummary::default();
    for status in AttendanceStatus::iter() {
        let n = records.iter().filter(|r| r.status == status).count() as i64;
        match status {
            AttendanceStatus::Present => summary.total_present = n,
            AttendanceStatus::Absent => summary.total_absent = n,
            AttendanceStatus::HalfDay => summary.total_half_day = n,
            AttendanceStatus::Leave => summary.total_leave = n,
        }
    }
    summary
}
