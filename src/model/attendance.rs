use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::model::employee::EmployeeKey;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    #[serde(rename = "Half Day")]
    #[strum(serialize = "Half Day")]
    HalfDay,
    Leave,
}

impl TryFrom<String> for AttendanceStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One attendance row joined with the employee it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,

    /// Public identifier of the employee.
    #[schema(example = "EMP000001")]
    pub employee_id: String,

    #[schema(example = "John Doe")]
    pub employee_name: String,

    #[schema(example = "2024-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "09:00:00", value_type = Option<String>)]
    pub in_time: Option<NaiveTime>,

    #[schema(example = "18:00:00", value_type = Option<String>)]
    pub out_time: Option<NaiveTime>,

    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,

    pub notes: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

impl Attendance {
    pub fn work_hours(&self) -> Option<f64> {
        work_hours(self.in_time, self.out_time)
    }
}

/// Elapsed hours between check-in and check-out, rounded to 2 decimals.
///
/// A check-out earlier than the check-in is treated as falling on the next
/// day. Returns `None` unless both times are present.
pub fn work_hours(in_time: Option<NaiveTime>, out_time: Option<NaiveTime>) -> Option<f64> {
    let (start, end) = (in_time?, out_time?);

    let mut elapsed = end.signed_duration_since(start);
    if elapsed < Duration::zero() {
        elapsed = elapsed + Duration::days(1);
    }

    let hours = elapsed.num_milliseconds() as f64 / 3_600_000.0;
    Some((hours * 100.0).round() / 100.0)
}

/// Values supplied by an attendance write. `None` leaves an existing
/// record's value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceFields {
    pub in_time: Option<NaiveTime>,
    pub out_time: Option<NaiveTime>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceFilter {
    pub employee: Option<EmployeeKey>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<u32>,
}

impl AttendanceFilter {
    /// Date part of the filter; the employee is resolved by the store.
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        self.date.is_none_or(|d| d == date)
            && self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
    }
}

/// Result of an upsert: the stored record and whether it was newly created.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted {
    pub attendance: Attendance,
    pub created: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32, s: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, s)
    }

    #[test]
    fn full_day() {
        assert_eq!(work_hours(t(9, 0, 0), t(18, 0, 0)), Some(9.0));
    }

    #[test]
    fn missing_side_gives_none() {
        assert_eq!(work_hours(t(9, 0, 0), None), None);
        assert_eq!(work_hours(None, t(18, 0, 0)), None);
        assert_eq!(work_hours(None, None), None);
    }

    #[test]
    fn fractional_hours_are_rounded() {
        assert_eq!(work_hours(t(9, 0, 0), t(13, 30, 0)), Some(4.5));
        assert_eq!(work_hours(t(9, 0, 0), t(9, 20, 0)), Some(0.33));
    }

    #[test]
    fn overnight_shift_wraps_to_next_day() {
        assert_eq!(work_hours(t(22, 0, 0), t(6, 0, 0)), Some(8.0));
    }

    #[test]
    fn status_round_trips_display_names() {
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "Half Day");
        assert_eq!("Half Day".parse(), Ok(AttendanceStatus::HalfDay));
        assert_eq!("present".parse(), Ok(AttendanceStatus::Present));
        assert!("Sick".parse::<AttendanceStatus>().is_err());
        assert_eq!(
            serde_json::to_value(AttendanceStatus::HalfDay).unwrap(),
            serde_json::json!("Half Day")
        );
        assert_eq!(AttendanceStatus::default(), AttendanceStatus::Present);
    }

    #[test]
    fn date_filter_bounds_are_inclusive() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let filter = AttendanceFilter {
            start_date: Some(day(10)),
            end_date: Some(day(20)),
            ..Default::default()
        };
        assert!(filter.matches_date(day(10)));
        assert!(filter.matches_date(day(20)));
        assert!(!filter.matches_date(day(9)));
        assert!(!filter.matches_date(day(21)));
    }
}
