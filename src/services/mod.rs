// Catalog
pub mod categories;
pub mod equipment_groups;
pub mod equipments;
pub mod locations;
pub mod sites;

// People
pub mod preferences;
pub mod users;

// Reservations
pub mod manips;

use crate::errors::{ServiceError, ValidationReport, ViolationKind};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PrimaryKeyTrait, QueryFilter, QuerySelect,
};
use validator::ValidationError;

/// Loads a row by id, or a `NotFound` naming the resource
pub async fn find_or_not_found<E, C>(
    conn: &C,
    id: i32,
    label: &str,
) -> Result<E::Model, ServiceError>
where
    E: EntityTrait,
    i32: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    C: ConnectionTrait,
{
    E::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("{} {} not found", label, id)))
}

/// The subset of `ids` present in `column`
pub async fn existing_ids<E, C>(conn: &C, column: E::Column, ids: &[i32]) -> Result<Vec<i32>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    E::find()
        .select_only()
        .column(column)
        .filter(column.is_in(ids.iter().copied()))
        .into_tuple::<i32>()
        .all(conn)
        .await
}

/// Records a `ForeignKeyMissing` violation on `field` for every id with no row
pub async fn check_references<E, C>(
    conn: &C,
    column: E::Column,
    field: &str,
    ids: &[i32],
    report: &mut ValidationReport,
) -> Result<(), ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let found = existing_ids::<E, C>(conn, column, ids)
        .await
        .map_err(ServiceError::db_error)?;
    let label = field.trim_end_matches("_id").replace('_', " ");
    for id in ids.iter().filter(|id| !found.contains(id)) {
        report.push(
            field,
            ViolationKind::ForeignKeyMissing,
            format!("The selected {} ({}) is invalid.", label, id),
        );
    }
    Ok(())
}

/// Drops repeated ids, keeping first-seen order
pub fn unique_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

/// Blank strings count as missing
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Value of a field already checked by a `required` rule
pub(crate) fn present<T: Default>(value: Option<T>) -> T {
    value.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_ids_keeps_order() {
        assert_eq!(unique_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(unique_ids(&[]).is_empty());
    }

    #[test]
    fn blank_is_required() {
        assert!(not_blank("Lab").is_ok());
        let err = not_blank("   ").unwrap_err();
        assert_eq!(err.code, "required");
    }
}
