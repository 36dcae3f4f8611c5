//! Reservation rules applied to every manip write.
//!
//! The pure rules (operating hours, ordering, team ownership) run before any
//! database access. The equipment conflict rule needs the current schedule and
//! runs inside the write transaction through [`ReservationLookup`].

pub mod dates;
pub mod equipment_conflict;
pub mod operating_hours;
pub mod team;

pub use dates::{format_datetime, parse_datetime};
pub use equipment_conflict::{
    check_equipment_conflicts, BookedEquipment, BookedManip, CheckMode, DbReservationLookup,
    ReservationLookup, TimeWindow,
};
pub use operating_hours::{is_within_operating_hours, OperatingHours};
pub use team::{check_team_excludes_owner, team_excludes_owner};

use crate::errors::{ValidationReport, ViolationKind};
use chrono::NaiveDateTime;

/// Records a violation on `end_date` unless `begin < end`
pub fn check_ordering(begin: NaiveDateTime, end: NaiveDateTime, report: &mut ValidationReport) {
    if begin >= end {
        report.push(
            "end_date",
            ViolationKind::BusinessRuleViolation,
            "The end date must be a date after the begin date.",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_requires_strictly_later_end() {
        let begin = parse_datetime("2024-01-01 09:00:00").unwrap();
        let end = parse_datetime("2024-01-01 10:00:00").unwrap();

        let mut report = ValidationReport::new();
        check_ordering(begin, end, &mut report);
        assert!(report.is_empty());

        check_ordering(begin, begin, &mut report);
        assert!(report.has("end_date", ViolationKind::BusinessRuleViolation));
    }
}
