use crate::errors::{ValidationReport, ViolationKind};
use chrono::{NaiveDateTime, NaiveTime, Timelike};

use super::dates::format_datetime;

/// Daily window in which reservations may start and end, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or_default(),
        }
    }
}

impl From<&crate::config::BookingConfig> for OperatingHours {
    fn from(booking: &crate::config::BookingConfig) -> Self {
        Self {
            open: booking.opening_time,
            close: booking.closing_time,
        }
    }
}

impl OperatingHours {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let time = at.time();
        time >= self.open && time <= self.close
    }

    /// Records a business-rule violation on `field` when `at` is outside the window
    pub fn check(&self, field: &str, at: NaiveDateTime, report: &mut ValidationReport) {
        if !self.contains(at) {
            report.push(
                field,
                ViolationKind::BusinessRuleViolation,
                format!(
                    "The {} ({}) must be between {} and {}.",
                    field.replace('_', " "),
                    format_datetime(at),
                    hhmm(self.open),
                    hhmm(self.close)
                ),
            );
        }
    }
}

fn hhmm(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// 07:00:00 up to and including 19:00:00
pub fn is_within_operating_hours(at: NaiveDateTime) -> bool {
    OperatingHours::default().contains(at)
}
