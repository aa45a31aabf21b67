//! `cb notifications`: the acting user's inbox.

use anyhow::Result;
use casebook_core::model::{Notification, NotificationId};
use clap::{Args, Subcommand};
use std::io::Write;

use super::{Context, with_service};
use crate::output;

#[derive(Subcommand, Debug)]
pub enum NotificationCommand {
    /// Show your notifications, newest first.
    List(ListNotificationsArgs),
    /// Mark one of your notifications read.
    Read(ReadNotificationArgs),
}

#[derive(Args, Debug)]
pub struct ListNotificationsArgs {
    /// Only unread notifications.
    #[arg(long)]
    pub unread: bool,
}

#[derive(Args, Debug)]
pub struct ReadNotificationArgs {
    pub id: String,
}

pub fn run_notifications(command: &NotificationCommand, ctx: &Context) -> Result<()> {
    with_service(ctx, |service, actor| match command {
        NotificationCommand::List(args) => {
            let inbox = service.list_notifications(actor, args.unread)?;
            output::render(ctx.output, &inbox, |inbox, w| write_inbox(inbox, w))
        }
        NotificationCommand::Read(args) => {
            let notification =
                service.mark_notification_read(actor, &NotificationId::new(args.id.as_str()))?;
            output::render(ctx.output, &notification, |notification, w| {
                writeln!(w, "✓ marked {} read", notification.id)
            })
        }
    })
}

fn write_inbox(inbox: &[Notification], w: &mut dyn Write) -> std::io::Result<()> {
    if inbox.is_empty() {
        return writeln!(w, "no notifications");
    }
    for notification in inbox {
        let marker = if notification.read { ' ' } else { '*' };
        writeln!(
            w,
            "{marker} {}  {}  {}",
            notification.created_at.format("%Y-%m-%d %H:%M"),
            notification.message,
            notification.id
        )?;
    }
    Ok(())
}
