//! `cb user`: manage the local user directory.

use anyhow::Result;
use casebook_core::model::{Category, Role, User};
use casebook_core::store::SqliteUserDirectory;
use clap::{Args, Subcommand};
use std::io::Write;

use super::{Context, open_existing};
use crate::output::{self, kv};

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user.
    Add(AddUserArgs),
    /// List registered users.
    List,
}

#[derive(Args, Debug)]
pub struct AddUserArgs {
    /// Display name.
    #[arg(long)]
    pub name: String,

    /// admin, lawyer, or client.
    #[arg(long)]
    pub role: Role,

    /// Practice area; required for lawyers.
    #[arg(long)]
    pub specialization: Option<Category>,
}

pub fn run_user(command: &UserCommand, ctx: &Context) -> Result<()> {
    let (conn, _config) = open_existing(ctx)?;
    let users = SqliteUserDirectory::new(&conn);
    match command {
        UserCommand::Add(args) => {
            let user = users.register(&args.name, args.role, args.specialization)?;
            output::render(ctx.output, &user, |user, w| {
                writeln!(w, "✓ registered {} ({})", user.name, user.role)?;
                kv(w, "ID", user.id.as_str())
            })
        }
        UserCommand::List => {
            let listed = users.list()?;
            output::render(ctx.output, &listed, |users, w| write_users(users, w))
        }
    }
}

fn write_users(users: &[User], w: &mut dyn Write) -> std::io::Result<()> {
    if users.is_empty() {
        return writeln!(w, "no users registered");
    }
    for user in users {
        let specialization = user
            .specialization
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        writeln!(
            w,
            "{:<36}  {:<7}  {:<10}  {}",
            user.id.as_str(),
            user.role.to_string(),
            specialization,
            user.name
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(subcommand)]
        command: UserCommand,
    }

    #[test]
    fn add_parses_role_and_specialization() {
        let w = Wrapper::parse_from([
            "test",
            "add",
            "--name",
            "Ada",
            "--role",
            "lawyer",
            "--specialization",
            "civil",
        ]);
        match w.command {
            UserCommand::Add(args) => {
                assert_eq!(args.role, Role::Lawyer);
                assert_eq!(args.specialization, Some(Category::Civil));
            }
            UserCommand::List => panic!("expected add"),
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Wrapper::try_parse_from(["test", "add", "--name", "x", "--role", "judge"]).is_err());
    }
}
