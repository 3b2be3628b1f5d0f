//! Row shapes as read by sqlx, converted into core types with validation.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use burnout_core::scoring::Answers;
use burnout_core::types::{Evaluation, Handling, Meeting, Role, User};

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, is_active, created_at";

pub(crate) const EVALUATION_COLUMNS: &str = "id, user_id, submitted_at, \
     q1, q2, q3, q4, q5, q6, q7, q8, q9, q10, total_score, needs_support, \
     handled_by_admin_id, handled_at, \
     meeting_place, meeting_time, meeting_day, meeting_date";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PgUserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PgUserRow> for User {
    type Error = String;

    fn try_from(row: PgUserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|_| format!("user {} has unknown role '{}'", row.id, row.role))?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PgEvaluationRow {
    pub id: i64,
    pub user_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub q1: i32,
    pub q2: i32,
    pub q3: i32,
    pub q4: i32,
    pub q5: i32,
    pub q6: i32,
    pub q7: i32,
    pub q8: i32,
    pub q9: i32,
    pub q10: i32,
    pub total_score: i32,
    pub needs_support: bool,
    pub handled_by_admin_id: Option<i64>,
    pub handled_at: Option<DateTime<Utc>>,
    pub meeting_place: Option<String>,
    pub meeting_time: Option<String>,
    pub meeting_day: Option<String>,
    pub meeting_date: Option<String>,
}

impl TryFrom<PgEvaluationRow> for Evaluation {
    type Error = String;

    fn try_from(row: PgEvaluationRow) -> Result<Self, Self::Error> {
        let handling = match (row.handled_by_admin_id, row.handled_at) {
            (Some(admin_id), Some(at)) => Some(Handling { admin_id, at }),
            (None, None) => None,
            _ => return Err(format!("evaluation {} has half-set handling", row.id)),
        };
        let meeting = match (
            row.meeting_place,
            row.meeting_time,
            row.meeting_day,
            row.meeting_date,
        ) {
            (Some(place), Some(time), Some(day), Some(date)) => Some(Meeting {
                place,
                time,
                day,
                date,
            }),
            (None, None, None, None) => None,
            _ => return Err(format!("evaluation {} has partial meeting fields", row.id)),
        };
        Ok(Evaluation {
            id: row.id,
            user_id: row.user_id,
            submitted_at: row.submitted_at,
            answers: Answers::from_stored([
                row.q1, row.q2, row.q3, row.q4, row.q5, row.q6, row.q7, row.q8, row.q9, row.q10,
            ]),
            total_score: row.total_score,
            needs_support: row.needs_support,
            handling,
            meeting,
        })
    }
}
