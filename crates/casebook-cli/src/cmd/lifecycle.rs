//! Lifecycle commands: `status`, `assign`, and `hearing`.

use anyhow::Result;
use casebook_core::StatusChange;
use casebook_core::model::{CaseId, HearingDraft, Status, UserId};
use chrono::{DateTime, Utc};
use clap::Args;
use std::io::Write;

use super::{Context, with_service};
use crate::output;

/// Hearing details shared by `status ... "Hearing Scheduled"` and `hearing`.
#[derive(Args, Debug)]
pub struct HearingFields {
    /// Hearing date (RFC 3339). Defaults to now.
    #[arg(long)]
    pub date: Option<DateTime<Utc>>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub outcome: Option<String>,
}

impl HearingFields {
    fn is_empty(&self) -> bool {
        self.date.is_none() && self.notes.is_none() && self.outcome.is_none()
    }

    fn to_draft(&self) -> HearingDraft {
        HearingDraft {
            date: self.date,
            notes: self.notes.clone(),
            outcome: self.outcome.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    pub id: String,

    /// Target status, e.g. "In Progress", in-progress, closed.
    pub status: Status,

    #[command(flatten)]
    pub hearing: HearingFields,
}

#[derive(Args, Debug)]
pub struct AssignArgs {
    pub id: String,

    /// Lawyer to assign.
    pub lawyer: String,
}

#[derive(Args, Debug)]
pub struct HearingArgs {
    pub id: String,

    #[command(flatten)]
    pub hearing: HearingFields,
}

impl StatusArgs {
    fn change(&self) -> StatusChange {
        let change = StatusChange::new(self.status);
        if self.hearing.is_empty() {
            change
        } else {
            change.with_hearing(self.hearing.to_draft())
        }
    }
}

pub fn run_status(args: &StatusArgs, ctx: &Context) -> Result<()> {
    with_service(ctx, |service, actor| {
        let case = service.change_status_with(actor, &CaseId::new(args.id.as_str()), args.change())?;
        output::render(ctx.output, &case, |case, w| {
            writeln!(w, "✓ {} is now {}", case.case_number(), case.status())
        })
    })
}

pub fn run_assign(args: &AssignArgs, ctx: &Context) -> Result<()> {
    with_service(ctx, |service, actor| {
        let case = service.assign_lawyer(
            actor,
            &CaseId::new(args.id.as_str()),
            &UserId::new(args.lawyer.as_str()),
        )?;
        output::render(ctx.output, &case, |case, w| {
            writeln!(w, "✓ assigned {} to {}", args.lawyer, case.case_number())
        })
    })
}

pub fn run_hearing(args: &HearingArgs, ctx: &Context) -> Result<()> {
    with_service(ctx, |service, actor| {
        let case =
            service.add_hearing(actor, &CaseId::new(args.id.as_str()), args.hearing.to_draft())?;
        output::render(ctx.output, &case, |case, w| {
            writeln!(
                w,
                "✓ recorded hearing on {} ({} total)",
                case.case_number(),
                case.hearings().len()
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrap {
        #[command(flatten)]
        args: StatusArgs,
    }

    #[test]
    fn plain_status_change_has_no_hearing() {
        let w = Wrap::parse_from(["test", "c-1", "In Progress"]);
        assert_eq!(w.args.status, Status::InProgress);
        assert_eq!(w.args.change(), StatusChange::new(Status::InProgress));
    }

    #[test]
    fn hearing_flags_attach_details() {
        let w = Wrap::parse_from([
            "test",
            "c-1",
            "hearing-scheduled",
            "--date",
            "2026-11-03T09:30:00Z",
            "--notes",
            "Courtroom 4",
        ]);
        let change = w.args.change();
        assert_eq!(change.to, Status::HearingScheduled);
        let hearing = change.hearing.unwrap();
        assert_eq!(hearing.notes.as_deref(), Some("Courtroom 4"));
        assert_eq!(
            hearing.date.unwrap().to_rfc3339(),
            "2026-11-03T09:30:00+00:00"
        );
    }
}
