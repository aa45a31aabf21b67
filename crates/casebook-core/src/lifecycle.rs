//! Case lifecycle engine.
//!
//! The transition table is fixed:
//!
//! | from        | to                | who                                              |
//! |-------------|-------------------|--------------------------------------------------|
//! | Filed       | In Progress       | lawyer: already assigned, or unassigned case in their specialization |
//! | In Progress | Hearing Scheduled | admin or assigned lawyer                         |
//! | In Progress | Closed            | admin or assigned lawyer                         |
//! | Closed      | In Progress       | owning client, assigned lawyer, or admin (reopen) |
//!
//! Pairs outside the table fail with `InvalidTransition` whoever asks;
//! pairs inside it fail with `Forbidden` for anyone not listed. Every
//! transition re-reads the case, persists, and only then notifies.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{CaseError, Entity};
use crate::model::{Actor, Case, CaseId, HearingDraft, HearingRecord, Role, Status, UserId};
use crate::notify::NotificationEmitter;
use crate::policy::{self, Action};
use crate::store::{CaseStore, UserDirectory};

/// A row of the transition table.
///
/// Hearing Scheduled has no outgoing row, so a scheduled case stays
/// scheduled; later hearings go through [`crate::CaseService::add_hearing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Filed -> In Progress, a lawyer taking the case.
    Accept,
    /// In Progress -> Hearing Scheduled.
    ScheduleHearing,
    /// In Progress -> Closed.
    Close,
    /// Closed -> In Progress.
    Reopen,
}

impl Transition {
    /// Look up the table row for `from -> to`.
    #[must_use]
    pub const fn between(from: Status, to: Status) -> Option<Self> {
        match (from, to) {
            (Status::Filed, Status::InProgress) => Some(Self::Accept),
            (Status::InProgress, Status::HearingScheduled) => Some(Self::ScheduleHearing),
            (Status::InProgress, Status::Closed) => Some(Self::Close),
            (Status::Closed, Status::InProgress) => Some(Self::Reopen),
            _ => None,
        }
    }

    #[must_use]
    pub const fn target(self) -> Status {
        match self {
            Self::Accept | Self::Reopen => Status::InProgress,
            Self::ScheduleHearing => Status::HearingScheduled,
            Self::Close => Status::Closed,
        }
    }
}

/// A requested status change, with hearing details when scheduling one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub to: Status,
    pub hearing: Option<HearingDraft>,
}

impl StatusChange {
    #[must_use]
    pub const fn new(to: Status) -> Self {
        Self { to, hearing: None }
    }

    #[must_use]
    pub fn with_hearing(mut self, hearing: HearingDraft) -> Self {
        self.hearing = Some(hearing);
        self
    }
}

/// Decide whether `actor` may move `case` to `to`.
///
/// # Errors
///
/// `InvalidTransition` when `case.status -> to` is not in the table;
/// `Forbidden` when it is but `actor` is not allowed to perform it.
pub fn authorize(actor: &Actor, case: &Case, to: Status) -> Result<Transition, CaseError> {
    let Some(transition) = Transition::between(case.status(), to) else {
        return Err(CaseError::InvalidTransition {
            case_id: case.id().to_string(),
            from: case.status(),
            to,
        });
    };
    policy::ensure(
        actor_may(actor, case, transition),
        actor,
        Action::Transition,
        case.id(),
    )?;
    Ok(transition)
}

fn actor_may(actor: &Actor, case: &Case, transition: Transition) -> bool {
    let assigned_lawyer = actor.is_lawyer() && case.is_assigned_to(&actor.id);
    match transition {
        Transition::Accept => {
            actor.role == Role::Lawyer
                && match case.lawyer() {
                    Some(lawyer) => lawyer == &actor.id,
                    None => case.category().is_some() && case.category() == actor.specialization,
                }
        }
        Transition::ScheduleHearing | Transition::Close => actor.is_admin() || assigned_lawyer,
        Transition::Reopen => {
            actor.is_admin() || assigned_lawyer || case.client() == &actor.id
        }
    }
}

/// Build a hearing record authored by `actor`. A missing date means the
/// hearing is recorded at `now`; blank notes and outcomes are dropped.
pub(crate) fn hearing_record(actor: &Actor, draft: HearingDraft, now: DateTime<Utc>) -> HearingRecord {
    HearingRecord {
        date: draft.date.unwrap_or(now),
        notes: non_blank(draft.notes),
        outcome: non_blank(draft.outcome),
        recorded_by: actor.id.clone(),
        recorded_at: now,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Applies transitions and lawyer assignment against the store.
pub struct LifecycleEngine<'a> {
    cases: &'a dyn CaseStore,
    users: &'a dyn UserDirectory,
    notifier: &'a NotificationEmitter<'a>,
}

impl<'a> LifecycleEngine<'a> {
    #[must_use]
    pub fn new(
        cases: &'a dyn CaseStore,
        users: &'a dyn UserDirectory,
        notifier: &'a NotificationEmitter<'a>,
    ) -> Self {
        Self {
            cases,
            users,
            notifier,
        }
    }

    /// Move a case to `change.to` on behalf of `actor`.
    ///
    /// The case is re-read from the store before deciding, so the decision
    /// is made against persisted state rather than a caller's snapshot.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition`, `Forbidden`, `Validation` (hearing
    /// details on a non-hearing transition), or a storage failure. A failed
    /// notification is never an error.
    pub fn apply(
        &self,
        actor: &Actor,
        case_id: &CaseId,
        change: StatusChange,
    ) -> Result<Case, CaseError> {
        let mut case = self.cases.find_by_id(case_id)?;
        let transition = authorize(actor, &case, change.to)?;
        let now = Utc::now();

        match (transition, change.hearing) {
            (Transition::ScheduleHearing, hearing) => {
                let record = hearing_record(actor, hearing.unwrap_or_default(), now);
                case.hearings.push(record);
            }
            (_, Some(_)) => {
                return Err(CaseError::validation(
                    "hearing details apply only when scheduling a hearing",
                ));
            }
            (Transition::Accept, None) => {
                if case.lawyer.is_none() {
                    case.lawyer = Some(actor.id.clone());
                }
            }
            (Transition::Close | Transition::Reopen, None) => {}
        }

        let from = case.status;
        case.status = transition.target();
        let saved = self.cases.save(&case)?;
        info!(
            case_id = %saved.id(),
            actor = %actor.id,
            from = %from,
            to = %saved.status(),
            ?transition,
            "case transitioned"
        );

        self.announce(actor, transition, &saved);
        Ok(saved)
    }

    /// Put `lawyer_id` on a case without changing its status. Admin only.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `NotFound` for a missing case or user,
    /// `Validation` when the user is not a lawyer.
    pub fn assign_lawyer(
        &self,
        actor: &Actor,
        case_id: &CaseId,
        lawyer_id: &UserId,
    ) -> Result<Case, CaseError> {
        policy::ensure(
            policy::can_assign_lawyer(actor),
            actor,
            Action::AssignLawyer,
            case_id,
        )?;
        let mut case = self.cases.find_by_id(case_id)?;
        let lawyer = self
            .users
            .find(lawyer_id)?
            .ok_or_else(|| CaseError::not_found(Entity::User, lawyer_id))?;
        if lawyer.role != Role::Lawyer {
            return Err(CaseError::validation(format!(
                "user '{}' is a {}, not a lawyer",
                lawyer.id, lawyer.role
            )));
        }

        case.lawyer = Some(lawyer.id);
        let saved = self.cases.save(&case)?;
        info!(case_id = %saved.id(), lawyer = %lawyer_id, actor = %actor.id, "lawyer assigned");
        Ok(saved)
    }

    fn announce(&self, actor: &Actor, transition: Transition, case: &Case) {
        let message = match transition {
            Transition::Accept => format!(
                "Lawyer {} has accepted your case: {}",
                actor.name,
                case.title()
            ),
            Transition::Close => format!("Case {} has been closed.", case.title()),
            Transition::ScheduleHearing | Transition::Reopen => return,
        };
        self.notifier.notify(case.client(), message, Some(case.id()));
    }
}
