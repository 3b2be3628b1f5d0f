use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::Answers;

pub type UserId = i64;
pub type EvaluationId = i64;

// ── Users ─────────────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::AsRefStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Student,
    Staff,
    Admin,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Input to `UserStore::insert`. The hash is already computed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

// ── Evaluations ───────────────────────────────────────────────

/// Meeting descriptor. Display strings only, never parsed as dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub place: String,
    pub time: String,
    pub day: String,
    pub date: String,
}

/// Who acknowledged an evaluation and when. Set once, never overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handling {
    pub admin_id: UserId,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub user_id: UserId,
    pub submitted_at: DateTime<Utc>,
    pub answers: Answers,
    pub total_score: i32,
    pub needs_support: bool,
    pub handling: Option<Handling>,
    pub meeting: Option<Meeting>,
}

/// Input to `EvaluationStore::insert`. Score fields are derived by the caller.
#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub user_id: UserId,
    pub submitted_at: DateTime<Utc>,
    pub answers: Answers,
    pub total_score: i32,
    pub needs_support: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest submission first.
    Newest,
    /// Oldest submission first.
    Oldest,
}

/// Result of the conditional "mark handled" write.
#[derive(Debug, Clone)]
pub enum HandleOutcome {
    /// This call set the handling fields.
    Handled(Evaluation),
    /// Someone handled it earlier; nothing was written.
    AlreadyHandled(Evaluation),
}

// ── Read models ───────────────────────────────────────────────

/// Evaluation as returned by the API, with owner and handler resolved.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationView {
    pub id: EvaluationId,
    pub submitted_at: DateTime<Utc>,
    pub date: String,
    pub total_score: i32,
    pub needs_support: bool,
    pub user: UserSummary,
    pub answers: Answers,
    pub handled_by: Option<UserSummary>,
    pub handled_at: Option<DateTime<Utc>>,
    pub meeting: Option<Meeting>,
}

impl EvaluationView {
    pub fn new(evaluation: Evaluation, owner: UserSummary, handler: Option<UserSummary>) -> Self {
        Self {
            id: evaluation.id,
            submitted_at: evaluation.submitted_at,
            date: evaluation.submitted_at.format("%Y-%m-%d").to_string(),
            total_score: evaluation.total_score,
            needs_support: evaluation.needs_support,
            user: owner,
            answers: evaluation.answers,
            handled_by: handler,
            handled_at: evaluation.handling.map(|h| h.at),
            meeting: evaluation.meeting,
        }
    }
}

/// Admin listing entry: chronological label plus alert flag.
#[derive(Debug, Clone, Serialize)]
pub struct NumberedEvaluation {
    #[serde(flatten)]
    pub evaluation: EvaluationView,
    pub evaluation_number: String,
    pub is_alert: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledBy {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingDetails {
    pub place: String,
    pub time: String,
    pub day: String,
    pub date: String,
    pub scheduled_by: ScheduledBy,
    pub evaluation_id: EvaluationId,
}

/// Outcome of a student's "where is my meeting" lookup.
#[derive(Debug, Clone)]
pub enum StudentMeetingInfo {
    NoHandledEvaluation,
    NotYetScheduled { evaluation_id: EvaluationId },
    Scheduled(MeetingDetails),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Meeting {
        evaluation_id: EvaluationId,
        message: String,
        meeting: Meeting,
    },
    PendingEvaluations {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    fn sample_evaluation() -> Evaluation {
        let answers = Answers::from_stored([4; 10]);
        Evaluation {
            id: 7,
            user_id: 3,
            submitted_at: Utc.with_ymd_and_hms(2025, 7, 1, 9, 30, 0).unwrap(),
            answers,
            total_score: 40,
            needs_support: true,
            handling: None,
            meeting: None,
        }
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(Role::from_str("Admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("STUDENT").unwrap(), Role::Student);
        assert!(Role::from_str("teacher").is_err());
        assert_eq!(Role::Staff.as_ref(), "staff");
    }

    #[test]
    fn user_json_never_contains_hash() {
        let user = User {
            id: 1,
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Student,
            is_active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "student");
    }

    #[test]
    fn view_has_date_and_null_optionals() {
        let owner = UserSummary {
            id: 3,
            username: "sam".into(),
            email: "sam@example.com".into(),
        };
        let view = EvaluationView::new(sample_evaluation(), owner, None);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["date"], "2025-07-01");
        assert_eq!(json["answers"]["q3"], 4);
        assert!(json["handled_by"].is_null());
        assert!(json["handled_at"].is_null());
        assert!(json["meeting"].is_null());
    }

    #[test]
    fn notifications_are_type_tagged() {
        let n = Notification::PendingEvaluations {
            message: "There are 2 unhandled evaluations.".into(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "pending_evaluations");
    }
}
