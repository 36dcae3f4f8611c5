use crate::errors::{ValidationReport, ViolationKind};

/// True when the owner is not listed among the team members
pub fn team_excludes_owner(owner_id: i32, team: &[i32]) -> bool {
    !team.contains(&owner_id)
}

/// The owner of a manip takes part implicitly and must not also appear in its team
pub fn check_team_excludes_owner(owner_id: i32, team: &[i32], report: &mut ValidationReport) {
    if !team_excludes_owner(owner_id, team) {
        report.push(
            "team",
            ViolationKind::BusinessRuleViolation,
            "The owner of the manip cannot also be a member of its team.",
        );
    }
}
