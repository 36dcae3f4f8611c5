use crate::entities::{equipment, manip};
use crate::errors::{ValidationReport, ViolationKind};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use metrics::counter;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::debug;

use super::dates::format_datetime;

/// Half-open reservation interval. Construction guarantees `begin < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(begin: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        (begin < end).then_some(Self { begin, end })
    }

    /// `self.begin < other.end && self.end > other.begin`; touching windows do not overlap
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.begin < other.end && self.end > other.begin
    }

    /// None when either bound leaves the representable calendar
    pub fn shifted(&self, by: Duration) -> Option<Self> {
        Some(Self {
            begin: self.begin.checked_add_signed(by)?,
            end: self.end.checked_add_signed(by)?,
        })
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} and {}",
            format_datetime(self.begin),
            format_datetime(self.end)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedEquipment {
    pub id: i32,
    pub name: String,
}

/// An existing manip overlapping a requested window, with only the equipment
/// it shares with the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedManip {
    pub manip_id: i32,
    pub name: String,
    pub window: TimeWindow,
    pub equipment: Vec<BookedEquipment>,
}

/// Read side of the schedule used by the conflict check.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationLookup: Send + Sync {
    /// Manips overlapping `window` that hold any of `equipment_ids`, skipping `exclude`
    async fn overlapping(
        &self,
        window: TimeWindow,
        equipment_ids: &[i32],
        exclude: Option<i32>,
    ) -> Result<Vec<BookedManip>, DbErr>;
}

/// Lookup backed by a sea-orm connection or open transaction
pub struct DbReservationLookup<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> DbReservationLookup<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<'a, C: ConnectionTrait> ReservationLookup for DbReservationLookup<'a, C> {
    async fn overlapping(
        &self,
        window: TimeWindow,
        equipment_ids: &[i32],
        exclude: Option<i32>,
    ) -> Result<Vec<BookedManip>, DbErr> {
        if equipment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = manip::Entity::find()
            .filter(manip::Column::BeginDate.lt(window.end))
            .filter(manip::Column::EndDate.gt(window.begin))
            .filter(equipment::Column::Id.is_in(equipment_ids.iter().copied()));
        if let Some(excluded) = exclude {
            query = query.filter(manip::Column::Id.ne(excluded));
        }

        let rows = query
            .find_with_related(equipment::Entity)
            .order_by_asc(manip::Column::BeginDate)
            .order_by_asc(manip::Column::Id)
            .all(self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter(|(_, equipments)| !equipments.is_empty())
            .map(|(found, equipments)| BookedManip {
                manip_id: found.id,
                name: found.name,
                window: TimeWindow {
                    begin: found.begin_date,
                    end: found.end_date,
                },
                equipment: equipments
                    .into_iter()
                    .map(|e| BookedEquipment {
                        id: e.id,
                        name: e.name,
                    })
                    .collect(),
            })
            .collect())
    }
}

/// Whether the window being checked is a standalone request or one occurrence
/// of a recurring batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    Single,
    Recurrence { occurrence: u32, total: u32 },
}

/// Records one `equipments` violation per (overlapping manip, shared equipment).
///
/// Returns true when the window is free.
pub async fn check_equipment_conflicts<L>(
    lookup: &L,
    window: TimeWindow,
    equipment_ids: &[i32],
    exclude: Option<i32>,
    mode: CheckMode,
    report: &mut ValidationReport,
) -> Result<bool, DbErr>
where
    L: ReservationLookup + ?Sized,
{
    let booked = lookup.overlapping(window, equipment_ids, exclude).await?;

    let mut conflicts = 0u64;
    for existing in booked.iter().filter(|b| b.window.overlaps(&window)) {
        for item in existing
            .equipment
            .iter()
            .filter(|e| equipment_ids.contains(&e.id))
        {
            conflicts += 1;
            let mut message = format!(
                "The equipment \"{}\" (#{}) is already reserved by manip \"{}\" between {}; requested between {}.",
                item.name, item.id, existing.name, existing.window, window
            );
            if let CheckMode::Recurrence { occurrence, total } = mode {
                message.push_str(&format!(
                    " Occurrence {} of {} failed; later occurrences were not attempted.",
                    occurrence, total
                ));
            }
            report.push("equipments", ViolationKind::BusinessRuleViolation, message);
        }
    }

    if conflicts > 0 {
        debug!(conflicts, ?exclude, "equipment conflict detected");
        counter!("manip.reservation_conflicts", conflicts);
    }

    Ok(conflicts == 0)
}
