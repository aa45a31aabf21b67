//! Case record commands: `file`, `list`, `show`, `update`, `delete`,
//! `evidence`, and `grant`.

use anyhow::Result;
use casebook_core::model::{Case, CaseDraft, CaseId, CasePatch, Category, Permission, Status, UserId};
use chrono::SecondsFormat;
use clap::Args;
use std::io::Write;

use super::{Context, with_service};
use crate::output::{self, kv, section};

#[derive(Args, Debug)]
pub struct FileArgs {
    /// Short title of the matter.
    #[arg(short, long)]
    pub title: String,

    /// What the case is about.
    #[arg(short, long)]
    pub description: String,

    /// civil, criminal, family, or corporate.
    #[arg(short, long)]
    pub category: Option<Category>,

    /// Case number to use instead of a generated one.
    #[arg(long)]
    pub number: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only cases in this status.
    #[arg(long)]
    pub status: Option<Status>,

    /// Maximum number of cases to show.
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: String,

    #[arg(short, long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Set the category. Only allowed while the case has none.
    #[arg(short, long)]
    pub category: Option<Category>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct EvidenceArgs {
    pub id: String,

    /// Reference to the uploaded file.
    pub file_ref: String,
}

#[derive(Args, Debug)]
pub struct GrantArgs {
    pub id: String,

    /// User receiving access.
    pub user: String,

    /// view or edit.
    #[arg(long, default_value = "view")]
    pub permission: Permission,
}

pub fn run_file(args: &FileArgs, ctx: &Context) -> Result<()> {
    with_service(ctx, |service, actor| {
        let case = service.file_case(
            actor,
            CaseDraft {
                case_number: args.number.clone(),
                title: args.title.clone(),
                description: args.description.clone(),
                category: args.category,
            },
        )?;
        output::render(ctx.output, &case, |case, w| {
            writeln!(w, "✓ filed {} ({})", case.case_number(), case.id())
        })
    })
}

pub fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    with_service(ctx, |service, actor| {
        let cases = service.list_cases_with(actor, args.status, args.limit)?;
        output::render(ctx.output, &cases, |cases, w| write_case_rows(cases, w))
    })
}

pub fn run_show(args: &ShowArgs, ctx: &Context) -> Result<()> {
    with_service(ctx, |service, actor| {
        let case = service.get_case(actor, &CaseId::new(args.id.as_str()))?;
        output::render(ctx.output, &case, |case, w| write_case(case, w))
    })
}

pub fn run_update(args: &UpdateArgs, ctx: &Context) -> Result<()> {
    with_service(ctx, |service, actor| {
        let patch = CasePatch {
            title: args.title.clone(),
            description: args.description.clone(),
            category: args.category,
        };
        let case = service.update_details(actor, &CaseId::new(args.id.as_str()), patch)?;
        output::render(ctx.output, &case, |case, w| {
            writeln!(w, "✓ updated {}", case.case_number())
        })
    })
}

pub fn run_delete(args: &DeleteArgs, ctx: &Context) -> Result<()> {
    with_service(ctx, |service, actor| {
        service.delete_case(actor, &CaseId::new(args.id.as_str()))?;
        output::render_success(ctx.output, &format!("deleted case {}", args.id))
    })
}

pub fn run_evidence(args: &EvidenceArgs, ctx: &Context) -> Result<()> {
    with_service(ctx, |service, actor| {
        let case =
            service.attach_evidence(actor, &CaseId::new(args.id.as_str()), &args.file_ref)?;
        output::render(ctx.output, &case, |case, w| {
            writeln!(
                w,
                "✓ attached {} to {} ({} item(s))",
                args.file_ref,
                case.case_number(),
                case.evidence().len()
            )
        })
    })
}

pub fn run_grant(args: &GrantArgs, ctx: &Context) -> Result<()> {
    with_service(ctx, |service, actor| {
        let case = service.grant_access(
            actor,
            &CaseId::new(args.id.as_str()),
            &UserId::new(args.user.as_str()),
            args.permission,
        )?;
        output::render(ctx.output, &case, |case, w| {
            writeln!(
                w,
                "✓ {} may now {} {}",
                args.user,
                args.permission,
                case.case_number()
            )
        })
    })
}

fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn category_label(case: &Case) -> String {
    case.category()
        .map_or_else(|| "-".to_string(), |category| category.label().to_string())
}

pub fn write_case_rows(cases: &[Case], w: &mut dyn Write) -> std::io::Result<()> {
    if cases.is_empty() {
        return writeln!(w, "no cases");
    }
    for case in cases {
        writeln!(
            w,
            "{:<14}  {:<17}  {:<9}  {}  {}",
            case.case_number(),
            case.status().label(),
            category_label(case),
            case.title(),
            case.id()
        )?;
    }
    Ok(())
}

pub fn write_case(case: &Case, w: &mut dyn Write) -> std::io::Result<()> {
    section(w, &format!("{}  {}", case.case_number(), case.title()))?;
    kv(w, "ID", case.id().as_str())?;
    kv(w, "Status", case.status().label())?;
    kv(w, "Category", category_label(case))?;
    kv(w, "Client", case.client().as_str())?;
    kv(
        w,
        "Lawyer",
        case.lawyer().map_or("-", UserId::as_str),
    )?;
    kv(w, "Filed", timestamp(case.created_at()))?;
    kv(w, "Updated", timestamp(case.updated_at()))?;
    writeln!(w)?;
    writeln!(w, "{}", case.description())?;

    if !case.evidence().is_empty() {
        writeln!(w)?;
        section(w, "Evidence")?;
        for entry in case.evidence() {
            writeln!(
                w,
                "{}  {}  by {}",
                timestamp(entry.uploaded_at),
                entry.file_ref,
                entry.uploaded_by
            )?;
        }
    }

    if !case.hearings().is_empty() {
        writeln!(w)?;
        section(w, "Hearings")?;
        for hearing in case.hearings() {
            write!(w, "{}  by {}", timestamp(hearing.date), hearing.recorded_by)?;
            if let Some(notes) = &hearing.notes {
                write!(w, "  notes: {notes}")?;
            }
            if let Some(outcome) = &hearing.outcome {
                write!(w, "  outcome: {outcome}")?;
            }
            writeln!(w)?;
        }
    }

    if !case.access_list().is_empty() {
        writeln!(w)?;
        section(w, "Access")?;
        for grant in case.access_list() {
            writeln!(w, "{}  {}", grant.user, grant.permission)?;
        }
    }
    Ok(())
}
