use crate::{
    db::{begin_write_transaction, DbPool},
    entities::{equipment, equipment_manip, location, manip, manip_user, user},
    errors::{ServiceError, ValidationReport, ViolationKind},
    validation::{
        check_equipment_conflicts, check_ordering, check_team_excludes_owner, dates::wall_clock,
        parse_datetime, CheckMode, DbReservationLookup, OperatingHours, TimeWindow,
    },
};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use metrics::counter;
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseTransaction, EntityTrait, IntoActiveModel, LoaderTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{check_references, find_or_not_found, present, unique_ids};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
}

impl Frequency {
    pub fn step(self) -> Duration {
        match self {
            Frequency::Daily => Duration::days(1),
            Frequency::Weekly => Duration::weeks(1),
        }
    }
}

/// Repeats the requested window `occurrences` times, one `frequency` step apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct RecurrenceInput {
    pub frequency: Frequency,
    #[schema(example = 4)]
    pub occurrences: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct ManipInput {
    #[validate(required, custom = "super::not_blank", length(max = 255))]
    #[schema(example = "Cell imaging")]
    pub name: Option<String>,
    #[validate(required)]
    #[schema(example = "2024-01-01 09:00:00")]
    pub begin_date: Option<String>,
    #[validate(required)]
    #[schema(example = "2024-01-01 11:00:00")]
    pub end_date: Option<String>,
    #[validate(required)]
    pub location_id: Option<i32>,
    /// Owner; defaults to the authenticated user on create and to the current owner on update
    pub user_id: Option<i32>,
    #[validate(
        required,
        length(min = 1, message = "The equipments must contain at least 1 item(s).")
    )]
    #[schema(example = json!([5]))]
    pub equipments: Option<Vec<i32>>,
    /// Team members besides the owner
    #[serde(default)]
    #[schema(example = json!([2, 3]))]
    pub team: Vec<i32>,
    /// Only accepted on create
    pub recurrence: Option<RecurrenceInput>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ManipFilter {
    /// Only manips ending after this date-time
    pub from: Option<String>,
    /// Only manips beginning before this date-time
    pub to: Option<String>,
    pub location_id: Option<i32>,
}

/// A manip with its equipment and team loaded
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManipResponse {
    pub id: i32,
    pub name: String,
    /// Owner
    pub user_id: i32,
    pub location_id: i32,
    #[serde(with = "wall_clock")]
    #[schema(value_type = String, example = "2024-01-01 09:00:00")]
    pub begin_date: NaiveDateTime,
    #[serde(with = "wall_clock")]
    #[schema(value_type = String, example = "2024-01-01 11:00:00")]
    pub end_date: NaiveDateTime,
    pub equipments: Vec<equipment::Model>,
    pub team: Vec<user::Model>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ManipResponse {
    fn from_parts(
        model: manip::Model,
        equipments: Vec<equipment::Model>,
        team: Vec<user::Model>,
    ) -> Self {
        Self {
            id: model.id,
            name: model.name,
            user_id: model.user_id,
            location_id: model.location_id,
            begin_date: model.begin_date,
            end_date: model.end_date,
            equipments,
            team,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fully validated write request
#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    owner_id: i32,
    location_id: i32,
    window: TimeWindow,
    equipment_ids: Vec<i32>,
    team: Vec<i32>,
}

/// Service for scheduling manips
#[derive(Clone)]
pub struct ManipService {
    db_pool: Arc<DbPool>,
    hours: OperatingHours,
    max_occurrences: u32,
    /// Held from the conflict check to the commit. Across processes the
    /// write transaction is what keeps two overlapping writes from committing.
    schedule_lock: Arc<AsyncMutex<()>>,
}

impl ManipService {
    pub fn new(db_pool: Arc<DbPool>, hours: OperatingHours, max_occurrences: u32) -> Self {
        Self {
            db_pool,
            hours,
            max_occurrences,
            schedule_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: ManipFilter) -> Result<Vec<ManipResponse>, ServiceError> {
        let mut report = ValidationReport::new();
        let from = parse_optional("from", filter.from.as_deref(), &mut report);
        let to = parse_optional("to", filter.to.as_deref(), &mut report);
        report.into_result()?;

        let mut query = manip::Entity::find()
            .order_by_asc(manip::Column::BeginDate)
            .order_by_asc(manip::Column::Id);
        if let Some(from) = from {
            query = query.filter(manip::Column::EndDate.gt(from));
        }
        if let Some(to) = to {
            query = query.filter(manip::Column::BeginDate.lt(to));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(manip::Column::LocationId.eq(location_id));
        }

        let models = query
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        load_details(&*self.db_pool, models).await
    }

    /// Manips the user owns or takes part in as a team member
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<ManipResponse>, ServiceError> {
        let memberships = Query::select()
            .column(manip_user::Column::ManipId)
            .from(manip_user::Entity)
            .and_where(manip_user::Column::UserId.eq(user_id))
            .to_owned();

        let models = manip::Entity::find()
            .filter(
                Condition::any()
                    .add(manip::Column::UserId.eq(user_id))
                    .add(manip::Column::Id.in_subquery(memberships)),
            )
            .order_by_asc(manip::Column::BeginDate)
            .order_by_asc(manip::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        load_details(&*self.db_pool, models).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<ManipResponse, ServiceError> {
        let db = &*self.db_pool;
        let model = find_or_not_found::<manip::Entity, _>(db, id, "Manip").await?;
        load_details(db, vec![model])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("Manip {} not found", id)))
    }

    /// Field and pure business rules; referenced rows are checked later in the transaction
    fn check_request(
        &self,
        input: &ManipInput,
        owner_id: i32,
        report: &mut ValidationReport,
    ) -> Option<TimeWindow> {
        if let Err(errors) = input.validate() {
            report.extend(errors.into());
        }

        let begin = parse_field("begin_date", input.begin_date.as_deref(), report);
        let end = parse_field("end_date", input.end_date.as_deref(), report);
        if let Some(begin) = begin {
            self.hours.check("begin_date", begin, report);
        }
        if let Some(end) = end {
            self.hours.check("end_date", end, report);
        }

        check_team_excludes_owner(owner_id, &input.team, report);

        let (begin, end) = (begin?, end?);
        check_ordering(begin, end, report);
        TimeWindow::new(begin, end)
    }

    async fn check_existing<C: ConnectionTrait>(
        conn: &C,
        input: &ManipInput,
        owner_id: i32,
        report: &mut ValidationReport,
    ) -> Result<(), ServiceError> {
        if let Some(location_id) = input.location_id {
            check_references::<location::Entity, _>(
                conn,
                location::Column::Id,
                "location_id",
                &[location_id],
                report,
            )
            .await?;
        }
        check_references::<user::Entity, _>(conn, user::Column::Id, "user_id", &[owner_id], report)
            .await?;
        check_references::<user::Entity, _>(
            conn,
            user::Column::Id,
            "team",
            &unique_ids(&input.team),
            report,
        )
        .await?;

        let equipment_ids = unique_ids(input.equipments.as_deref().unwrap_or_default());
        check_references::<equipment::Entity, _>(
            conn,
            equipment::Column::Id,
            "equipments",
            &equipment_ids,
            report,
        )
        .await?;

        let out_of_service = equipment::Entity::find()
            .filter(equipment::Column::Id.is_in(equipment_ids))
            .filter(equipment::Column::Operational.eq(false))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?;
        for item in out_of_service {
            report.push(
                "equipments",
                ViolationKind::BusinessRuleViolation,
                format!(
                    "The equipment \"{}\" (#{}) is not operational and cannot be reserved.",
                    item.name, item.id
                ),
            );
        }
        Ok(())
    }

    /// Runs every rule that does not depend on the current schedule
    async fn prepare(
        &self,
        txn: &DatabaseTransaction,
        input: &ManipInput,
        owner_id: i32,
        report: &mut ValidationReport,
    ) -> Result<Option<Candidate>, ServiceError> {
        let window = self.check_request(input, owner_id, report);
        Self::check_existing(txn, input, owner_id, report).await?;

        match window {
            Some(window) if report.is_empty() => Ok(Some(Candidate {
                name: present(input.name.clone()).trim().to_string(),
                owner_id,
                location_id: present(input.location_id),
                window,
                equipment_ids: unique_ids(input.equipments.as_deref().unwrap_or_default()),
                team: unique_ids(&input.team),
            })),
            _ => Ok(None),
        }
    }

    fn occurrences(
        &self,
        recurrence: Option<RecurrenceInput>,
        report: &mut ValidationReport,
    ) -> (u32, Duration) {
        match recurrence {
            None => (1, Duration::zero()),
            Some(r) => {
                if r.occurrences < 1 || r.occurrences > self.max_occurrences {
                    report.push(
                        "recurrence",
                        ViolationKind::FieldFormat,
                        format!(
                            "The recurrence occurrences must be between 1 and {}.",
                            self.max_occurrences
                        ),
                    );
                }
                (r.occurrences, r.frequency.step())
            }
        }
    }

    /// Creates one manip, or every occurrence of a recurring request.
    ///
    /// The conflict check and the inserts share one transaction; the first
    /// conflicting occurrence rolls the whole batch back.
    #[instrument(skip(self, input), fields(name = ?input.name))]
    pub async fn create(
        &self,
        caller_id: i32,
        input: ManipInput,
    ) -> Result<Vec<ManipResponse>, ServiceError> {
        let owner_id = input.user_id.unwrap_or(caller_id);
        let mut report = ValidationReport::new();
        let (total, step) = self.occurrences(input.recurrence, &mut report);

        let schedule = self.schedule_lock.lock().await;
        let txn = begin_write_transaction(&self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        let candidate = match self.prepare(&txn, &input, owner_id, &mut report).await? {
            Some(candidate) if report.is_empty() => candidate,
            _ => return Err(report.into()),
        };

        let windows = match occurrence_windows(candidate.window, total, step) {
            Some(windows) => windows,
            None => {
                report.push(
                    "recurrence",
                    ViolationKind::FieldFormat,
                    "The recurrence extends past the last supported date.",
                );
                return Err(report.into());
            }
        };

        let lookup = DbReservationLookup::new(&txn);
        let mut created_ids = Vec::with_capacity(windows.len());
        for (index, window) in (0u32..).zip(windows) {
            let mode = if input.recurrence.is_some() {
                CheckMode::Recurrence {
                    occurrence: index + 1,
                    total,
                }
            } else {
                CheckMode::Single
            };
            let free = check_equipment_conflicts(
                &lookup,
                window,
                &candidate.equipment_ids,
                None,
                mode,
                &mut report,
            )
            .await
            .map_err(ServiceError::db_error)?;
            if !free {
                warn!(occurrence = index + 1, total, "manip rejected by equipment conflict");
                return Err(report.into());
            }

            let created = insert_manip(&txn, &candidate, window).await?;
            created_ids.push(created.id);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;
        drop(schedule);
        counter!("manip.created", created_ids.len() as u64);
        info!(count = created_ids.len(), owner_id, "Manips created");

        let models = manip::Entity::find()
            .filter(manip::Column::Id.is_in(created_ids))
            .order_by_asc(manip::Column::BeginDate)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        load_details(&*self.db_pool, models).await
    }

    /// Replaces a manip's fields, equipment and team; it never conflicts with itself
    #[instrument(skip(self, input), fields(name = ?input.name))]
    pub async fn update(
        &self,
        id: i32,
        caller_id: i32,
        input: ManipInput,
    ) -> Result<ManipResponse, ServiceError> {
        let schedule = self.schedule_lock.lock().await;
        let txn = begin_write_transaction(&self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        let existing = find_or_not_found::<manip::Entity, _>(&txn, id, "Manip").await?;
        let owner_id = input.user_id.unwrap_or(existing.user_id);

        let mut report = ValidationReport::new();
        if input.recurrence.is_some() {
            report.push(
                "recurrence",
                ViolationKind::FieldFormat,
                "A recurrence can only be given when creating a manip.",
            );
        }
        let candidate = match self.prepare(&txn, &input, owner_id, &mut report).await? {
            Some(candidate) if report.is_empty() => candidate,
            _ => return Err(report.into()),
        };

        let lookup = DbReservationLookup::new(&txn);
        let free = check_equipment_conflicts(
            &lookup,
            candidate.window,
            &candidate.equipment_ids,
            Some(id),
            CheckMode::Single,
            &mut report,
        )
        .await
        .map_err(ServiceError::db_error)?;
        if !free {
            return Err(report.into());
        }

        let mut active = existing.into_active_model();
        active.name = Set(candidate.name.clone());
        active.user_id = Set(candidate.owner_id);
        active.location_id = Set(candidate.location_id);
        active.begin_date = Set(candidate.window.begin);
        active.end_date = Set(candidate.window.end);
        active.update(&txn).await.map_err(ServiceError::db_error)?;
        replace_associations(&txn, id, &candidate).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        drop(schedule);
        info!(manip_id = id, caller_id, "Manip updated");
        self.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = manip::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Manip {} not found", id)));
        }
        info!(manip_id = id, "Manip deleted");
        Ok(())
    }
}

/// Every occurrence window, or None if one of them cannot be represented
fn occurrence_windows(first: TimeWindow, total: u32, step: Duration) -> Option<Vec<TimeWindow>> {
    (0..total)
        .map(|index| first.shifted(step.checked_mul(index as i32)?))
        .collect()
}

fn parse_field(
    field: &str,
    raw: Option<&str>,
    report: &mut ValidationReport,
) -> Option<NaiveDateTime> {
    let raw = raw?;
    if raw.trim().is_empty() {
        report.required(field);
        return None;
    }
    let parsed = parse_datetime(raw);
    if parsed.is_none() {
        report.push(
            field,
            ViolationKind::FieldFormat,
            format!("The {} is not a valid date.", field.replace('_', " ")),
        );
    }
    parsed
}

fn parse_optional(
    field: &str,
    raw: Option<&str>,
    report: &mut ValidationReport,
) -> Option<NaiveDateTime> {
    match raw {
        Some(value) if !value.trim().is_empty() => parse_field(field, Some(value), report),
        _ => None,
    }
}

async fn insert_manip(
    txn: &DatabaseTransaction,
    candidate: &Candidate,
    window: TimeWindow,
) -> Result<manip::Model, ServiceError> {
    let created = manip::ActiveModel {
        name: Set(candidate.name.clone()),
        user_id: Set(candidate.owner_id),
        location_id: Set(candidate.location_id),
        begin_date: Set(window.begin),
        end_date: Set(window.end),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)?;
    replace_associations(txn, created.id, candidate).await?;
    Ok(created)
}

async fn replace_associations(
    txn: &DatabaseTransaction,
    manip_id: i32,
    candidate: &Candidate,
) -> Result<(), ServiceError> {
    equipment_manip::Entity::delete_many()
        .filter(equipment_manip::Column::ManipId.eq(manip_id))
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;
    manip_user::Entity::delete_many()
        .filter(manip_user::Column::ManipId.eq(manip_id))
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;

    if !candidate.equipment_ids.is_empty() {
        let rows = candidate
            .equipment_ids
            .iter()
            .map(|equipment_id| equipment_manip::ActiveModel {
                manip_id: Set(manip_id),
                equipment_id: Set(*equipment_id),
            });
        equipment_manip::Entity::insert_many(rows)
            .exec_without_returning(txn)
            .await
            .map_err(ServiceError::db_error)?;
    }
    if !candidate.team.is_empty() {
        let rows = candidate.team.iter().map(|user_id| manip_user::ActiveModel {
            manip_id: Set(manip_id),
            user_id: Set(*user_id),
        });
        manip_user::Entity::insert_many(rows)
            .exec_without_returning(txn)
            .await
            .map_err(ServiceError::db_error)?;
    }
    Ok(())
}

async fn load_details<C: ConnectionTrait>(
    conn: &C,
    models: Vec<manip::Model>,
) -> Result<Vec<ManipResponse>, ServiceError> {
    let equipments = models
        .load_many_to_many(equipment::Entity, equipment_manip::Entity, conn)
        .await
        .map_err(ServiceError::db_error)?;
    let teams = models
        .load_many_to_many(user::Entity, manip_user::Entity, conn)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(models
        .into_iter()
        .zip(equipments)
        .zip(teams)
        .map(|((model, equipments), team)| ManipResponse::from_parts(model, equipments, team))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ManipService {
        ManipService::new(
            Arc::new(DbPool::Disconnected),
            OperatingHours::default(),
            52,
        )
    }

    fn input(begin: &str, end: &str) -> ManipInput {
        ManipInput {
            name: Some("Imaging".into()),
            begin_date: Some(begin.into()),
            end_date: Some(end.into()),
            location_id: Some(1),
            user_id: None,
            equipments: Some(vec![5]),
            team: vec![],
            recurrence: None,
        }
    }

    #[test]
    fn valid_request_yields_a_window() {
        let mut report = ValidationReport::new();
        let window = service().check_request(
            &input("2024-01-01 09:00:00", "2024-01-01 11:00:00"),
            1,
            &mut report,
        );
        assert!(report.is_empty());
        assert!(window.is_some());
    }

    #[test]
    fn reports_every_field_at_once() {
        let mut request = input("2024-01-01 06:59:59", "2024-01-01 19:00:01");
        request.team = vec![1];
        request.name = None;
        let mut report = ValidationReport::new();
        service().check_request(&request, 1, &mut report);

        assert!(report.has("name", ViolationKind::FieldRequired));
        assert!(report.has("begin_date", ViolationKind::BusinessRuleViolation));
        assert!(report.has("end_date", ViolationKind::BusinessRuleViolation));
        assert!(report.has("team", ViolationKind::BusinessRuleViolation));
    }

    #[test]
    fn end_before_begin_is_rejected() {
        let mut report = ValidationReport::new();
        let window = service().check_request(
            &input("2024-01-01 11:00:00", "2024-01-01 09:00:00"),
            1,
            &mut report,
        );
        assert!(window.is_none());
        assert!(report.has("end_date", ViolationKind::BusinessRuleViolation));
    }

    #[test]
    fn malformed_and_missing_dates() {
        let mut request = input("yesterday", "");
        request.equipments = Some(vec![]);
        let mut report = ValidationReport::new();
        service().check_request(&request, 1, &mut report);

        assert!(report.has("begin_date", ViolationKind::FieldFormat));
        assert!(report.has("end_date", ViolationKind::FieldRequired));
        assert!(report.has("equipments", ViolationKind::FieldFormat));
    }

    #[test]
    fn recurrence_bounds_follow_configuration() {
        let service = service();
        let mut report = ValidationReport::new();
        let (total, step) = service.occurrences(
            Some(RecurrenceInput {
                frequency: Frequency::Weekly,
                occurrences: 4,
            }),
            &mut report,
        );
        assert_eq!((total, step), (4, Duration::weeks(1)));
        assert!(report.is_empty());

        service.occurrences(
            Some(RecurrenceInput {
                frequency: Frequency::Daily,
                occurrences: 53,
            }),
            &mut report,
        );
        assert!(report.has("recurrence", ViolationKind::FieldFormat));
    }

    #[test]
    fn occurrence_windows_step_from_the_first() {
        let first = TimeWindow::new(
            parse_datetime("2024-01-01 09:00:00").unwrap(),
            parse_datetime("2024-01-01 10:00:00").unwrap(),
        )
        .unwrap();
        let windows = occurrence_windows(first, 3, Duration::days(1)).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0], first);
        assert_eq!(windows[2].begin, parse_datetime("2024-01-03 09:00:00").unwrap());
    }

    #[test]
    fn occurrence_windows_past_the_calendar_end_are_rejected() {
        let first = TimeWindow::new(
            parse_datetime("+262142-12-31 09:00:00").unwrap(),
            parse_datetime("+262142-12-31 10:00:00").unwrap(),
        )
        .unwrap();
        assert!(occurrence_windows(first, 1, Duration::days(1)).is_some());
        assert!(occurrence_windows(first, 2, Duration::days(1)).is_none());
    }

    #[test]
    fn response_serializes_wall_clock_dates() {
        let begin = parse_datetime("2024-01-01 09:00:00").unwrap();
        let response = ManipResponse {
            id: 1,
            name: "Imaging".into(),
            user_id: 1,
            location_id: 1,
            begin_date: begin,
            end_date: begin + Duration::hours(2),
            equipments: vec![],
            team: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["begin_date"], "2024-01-01 09:00:00");
        assert_eq!(json["end_date"], "2024-01-01 11:00:00");
    }
}
