//! Evaluation Engine: submission scoring, listings, and the handling /
//! meeting workflow.
//!
//! An evaluation moves along two independent axes. `mark_handled` records the
//! first admin acknowledgment and never overwrites it. `schedule_meeting`
//! replaces all four meeting fields at once, before or after handling.
//! Nothing ever clears either axis; only deletion removes an evaluation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::error::BurnoutError;
use crate::gate::AccessGate;
use crate::ports::{EvaluationStore, Result, RevocationLedger, UserStore};
use crate::principal::Principal;
use crate::scoring::{Answers, QUESTION_COUNT};
use crate::types::*;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitEvaluationRequest {
    pub q1: Option<i32>,
    pub q2: Option<i32>,
    pub q3: Option<i32>,
    pub q4: Option<i32>,
    pub q5: Option<i32>,
    pub q6: Option<i32>,
    pub q7: Option<i32>,
    pub q8: Option<i32>,
    pub q9: Option<i32>,
    pub q10: Option<i32>,
}

impl SubmitEvaluationRequest {
    fn raw_answers(&self) -> [Option<i32>; QUESTION_COUNT] {
        [
            self.q1, self.q2, self.q3, self.q4, self.q5, self.q6, self.q7, self.q8, self.q9,
            self.q10,
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleMeetingRequest {
    pub place: Option<String>,
    pub time: Option<String>,
    pub day: Option<String>,
    pub date: Option<String>,
}

impl ScheduleMeetingRequest {
    /// All four fields must be present and non-blank.
    pub fn into_meeting(self) -> Result<Meeting> {
        fn filled(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.trim().is_empty())
        }
        match (
            filled(self.place),
            filled(self.time),
            filled(self.day),
            filled(self.date),
        ) {
            (Some(place), Some(time), Some(day), Some(date)) => Ok(Meeting {
                place,
                time,
                day,
                date,
            }),
            _ => Err(BurnoutError::InvalidInput(
                "All meeting details (place, time, day, date) are required.".into(),
            )),
        }
    }
}

fn evaluation_not_found() -> BurnoutError {
    BurnoutError::NotFound("Evaluation not found.".into())
}

pub struct EvaluationService {
    users: Arc<dyn UserStore>,
    evaluations: Arc<dyn EvaluationStore>,
    gate: AccessGate,
}

impl EvaluationService {
    pub fn new(
        users: Arc<dyn UserStore>,
        evaluations: Arc<dyn EvaluationStore>,
        ledger: Arc<dyn RevocationLedger>,
    ) -> Self {
        let gate = AccessGate::new(Arc::clone(&users), ledger);
        Self {
            users,
            evaluations,
            gate,
        }
    }

    // ── Read-model assembly ───────────────────────────────────

    async fn summary(
        &self,
        cache: &mut HashMap<UserId, Option<UserSummary>>,
        id: UserId,
    ) -> Result<Option<UserSummary>> {
        if let Some(hit) = cache.get(&id) {
            return Ok(hit.clone());
        }
        let summary = self.users.get(id).await?.map(|u| u.summary());
        cache.insert(id, summary.clone());
        Ok(summary)
    }

    async fn views(&self, rows: Vec<Evaluation>) -> Result<Vec<EvaluationView>> {
        let mut cache = HashMap::new();
        let mut views = Vec::with_capacity(rows.len());
        for evaluation in rows {
            let owner = self
                .summary(&mut cache, evaluation.user_id)
                .await?
                .ok_or_else(|| {
                    anyhow::anyhow!("evaluation {} has no owner", evaluation.id)
                })?;
            let handler = match evaluation.handling {
                Some(h) => self.summary(&mut cache, h.admin_id).await?,
                None => None,
            };
            views.push(EvaluationView::new(evaluation, owner, handler));
        }
        Ok(views)
    }

    async fn view(&self, evaluation: Evaluation) -> Result<EvaluationView> {
        let mut views = self.views(vec![evaluation]).await?;
        views
            .pop()
            .ok_or_else(|| anyhow::anyhow!("evaluation view missing").into())
    }

    // ── Operations ────────────────────────────────────────────

    /// Score and store a questionnaire for the calling user.
    pub async fn submit(
        &self,
        principal: &Principal,
        req: SubmitEvaluationRequest,
    ) -> Result<EvaluationView> {
        self.gate.current_user(principal).await?;
        let answers = Answers::from_submission(req.raw_answers())?;
        let score = answers.score();
        let evaluation = self
            .evaluations
            .insert(NewEvaluation {
                user_id: principal.user_id,
                submitted_at: Utc::now(),
                answers,
                total_score: score.total,
                needs_support: score.needs_support,
            })
            .await?;
        tracing::info!(
            evaluation_id = evaluation.id,
            user_id = principal.user_id,
            total_score = score.total,
            needs_support = score.needs_support,
            "evaluation submitted"
        );
        self.view(evaluation).await
    }

    /// Every evaluation, newest first. Admin only.
    pub async fn list_all(&self, principal: &Principal) -> Result<Vec<EvaluationView>> {
        self.gate.require_admin(principal).await?;
        let rows = self.evaluations.list(None, SortOrder::Newest).await?;
        self.views(rows).await
    }

    /// The caller's own evaluations, newest first.
    pub async fn list_mine(&self, principal: &Principal) -> Result<Vec<EvaluationView>> {
        self.gate.current_user(principal).await?;
        let rows = self
            .evaluations
            .list(Some(principal.user_id), SortOrder::Newest)
            .await?;
        self.views(rows).await
    }

    /// One user's evaluations, oldest first, labelled "Evaluation N". Admin only.
    pub async fn list_for_user(
        &self,
        principal: &Principal,
        user_id: UserId,
    ) -> Result<Vec<NumberedEvaluation>> {
        self.gate.require_admin(principal).await?;
        let rows = self
            .evaluations
            .list(Some(user_id), SortOrder::Oldest)
            .await?;
        if rows.is_empty() {
            return Err(BurnoutError::NotFound(
                "No evaluations found for this user.".into(),
            ));
        }
        Ok(self
            .views(rows)
            .await?
            .into_iter()
            .enumerate()
            .map(|(idx, view)| NumberedEvaluation {
                is_alert: view.needs_support,
                evaluation_number: format!("Evaluation {}", idx + 1),
                evaluation: view,
            })
            .collect())
    }

    /// A student's evaluations by username, newest first. Admin only.
    pub async fn list_for_username(
        &self,
        principal: &Principal,
        username: &str,
    ) -> Result<Vec<EvaluationView>> {
        self.gate.require_admin(principal).await?;
        let target = self
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| BurnoutError::NotFound("User not found.".into()))?;
        if target.role != Role::Student {
            return Err(BurnoutError::InvalidTarget(
                "Only student evaluations can be viewed.".into(),
            ));
        }
        let rows = self
            .evaluations
            .list(Some(target.id), SortOrder::Newest)
            .await?;
        self.views(rows).await
    }

    /// Visible to the owner and to admins. Existence is not hidden from others.
    pub async fn get(&self, principal: &Principal, id: EvaluationId) -> Result<EvaluationView> {
        let evaluation = self
            .evaluations
            .get(id)
            .await?
            .ok_or_else(evaluation_not_found)?;
        let caller = self.gate.current_user(principal).await?;
        if evaluation.user_id != caller.id && caller.role != Role::Admin {
            return Err(BurnoutError::Forbidden("Unauthorized access.".into()));
        }
        self.view(evaluation).await
    }

    pub async fn delete(&self, principal: &Principal, id: EvaluationId) -> Result<()> {
        let admin = self.gate.require_admin(principal).await?;
        if !self.evaluations.delete(id).await? {
            return Err(evaluation_not_found());
        }
        tracing::info!(evaluation_id = id, by = admin.id, "evaluation deleted");
        Ok(())
    }

    /// Replace the meeting descriptor. Validation happens before any write,
    /// so a rejected request leaves an existing meeting untouched.
    pub async fn schedule_meeting(
        &self,
        principal: &Principal,
        id: EvaluationId,
        req: ScheduleMeetingRequest,
    ) -> Result<EvaluationView> {
        let admin = self.gate.require_admin(principal).await?;
        if self.evaluations.get(id).await?.is_none() {
            return Err(evaluation_not_found());
        }
        let meeting = req.into_meeting()?;
        let evaluation = self
            .evaluations
            .set_meeting(id, &meeting)
            .await?
            .ok_or_else(evaluation_not_found)?;
        tracing::info!(evaluation_id = id, by = admin.id, "meeting scheduled");
        self.view(evaluation).await
    }

    /// Idempotent: a second call reports `AlreadyHandled` and changes nothing.
    pub async fn mark_handled(
        &self,
        principal: &Principal,
        id: EvaluationId,
    ) -> Result<HandleOutcome> {
        let admin = self.gate.require_admin(principal).await?;
        let outcome = self
            .evaluations
            .mark_handled(id, admin.id, Utc::now())
            .await?
            .ok_or_else(evaluation_not_found)?;
        if let HandleOutcome::Handled(_) = outcome {
            tracing::info!(evaluation_id = id, by = admin.id, "evaluation handled");
        }
        Ok(outcome)
    }

    /// Meeting for the student's most recently handled evaluation. Student only.
    pub async fn student_meeting_info(&self, principal: &Principal) -> Result<StudentMeetingInfo> {
        let student = self.gate.require_role(principal, &[Role::Student]).await?;
        let Some(evaluation) = self.evaluations.latest_handled(student.id).await? else {
            return Ok(StudentMeetingInfo::NoHandledEvaluation);
        };
        let (Some(meeting), Some(handling)) = (evaluation.meeting, evaluation.handling) else {
            return Ok(StudentMeetingInfo::NotYetScheduled {
                evaluation_id: evaluation.id,
            });
        };
        let handler = self
            .users
            .get(handling.admin_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("handler {} missing", handling.admin_id))?;
        Ok(StudentMeetingInfo::Scheduled(MeetingDetails {
            place: meeting.place,
            time: meeting.time,
            day: meeting.day,
            date: meeting.date,
            scheduled_by: ScheduledBy {
                id: handler.id,
                name: handler.username,
                email: handler.email,
            },
            evaluation_id: evaluation.id,
        }))
    }

    /// Role-dependent notifications derived from current data.
    ///
    /// Students see the meeting of their latest *submitted* evaluation that
    /// has one, which is a different choice from `student_meeting_info`.
    /// Admins see a pending count when anything is unhandled. Staff see nothing.
    pub async fn notifications(&self, principal: &Principal) -> Result<Vec<Notification>> {
        let caller = self.gate.current_user(principal).await?;
        let mut notifications = Vec::new();
        match caller.role {
            Role::Student => {
                if let Some(evaluation) = self.evaluations.latest_with_meeting(caller.id).await? {
                    if let Some(meeting) = evaluation.meeting {
                        notifications.push(Notification::Meeting {
                            evaluation_id: evaluation.id,
                            message: format!(
                                "A meeting has been scheduled on {} at {}.",
                                meeting.date, meeting.time
                            ),
                            meeting,
                        });
                    }
                }
            }
            Role::Admin => {
                let unhandled = self.evaluations.count_unhandled().await?;
                if unhandled > 0 {
                    notifications.push(Notification::PendingEvaluations {
                        message: format!("There are {unhandled} unhandled evaluations."),
                    });
                }
            }
            Role::Staff => {}
        }
        Ok(notifications)
    }
}
