#![forbid(unsafe_code)]

mod actor;
mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cb: role-based legal case management",
    long_about = None
)]
struct Cli {
    /// Log at debug level (ignored when CASEBOOK_LOG is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Act as this user id (otherwise CASEBOOK_USER).
    #[arg(long = "as", value_name = "USER_ID", global = true)]
    as_user: Option<String>,

    /// Case database path (overrides CASEBOOK_DB and config).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create the config and case database",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    cb init"
    )]
    Init(cmd::init::InitArgs),

    #[command(next_help_heading = "Setup", about = "Manage the user directory")]
    User {
        #[command(subcommand)]
        command: cmd::user::UserCommand,
    },

    #[command(
        next_help_heading = "Cases",
        about = "File a new case as the acting user",
        after_help = "EXAMPLES:\n    # File a civil case\n    cb --as <client-id> file --title Dispute --description \"Fence line\" --category civil"
    )]
    File(cmd::case::FileArgs),

    #[command(next_help_heading = "Cases", about = "List cases visible to the acting user")]
    List(cmd::case::ListArgs),

    #[command(next_help_heading = "Cases", about = "Show one case")]
    Show(cmd::case::ShowArgs),

    #[command(next_help_heading = "Cases", about = "Edit title, description, or unset category")]
    Update(cmd::case::UpdateArgs),

    #[command(next_help_heading = "Cases", about = "Delete a case")]
    Delete(cmd::case::DeleteArgs),

    #[command(next_help_heading = "Cases", about = "Attach an evidence reference")]
    Evidence(cmd::case::EvidenceArgs),

    #[command(next_help_heading = "Cases", about = "Grant view or edit access to a user")]
    Grant(cmd::case::GrantArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Move a case to a new status",
        after_help = "EXAMPLES:\n    # Accept a filed case\n    cb --as <lawyer-id> status <case-id> \"In Progress\"\n\n    # Schedule a hearing\n    cb --as <lawyer-id> status <case-id> hearing-scheduled --date 2026-11-03T09:30:00Z"
    )]
    Status(cmd::lifecycle::StatusArgs),

    #[command(next_help_heading = "Lifecycle", about = "Assign a lawyer to a case (admin)")]
    Assign(cmd::lifecycle::AssignArgs),

    #[command(next_help_heading = "Lifecycle", about = "Record a hearing without changing status")]
    Hearing(cmd::lifecycle::HearingArgs),

    #[command(next_help_heading = "Inbox", about = "List or acknowledge notifications")]
    Notifications {
        #[command(subcommand)]
        command: cmd::notification::NotificationCommand,
    },
}

/// Default filter when `CASEBOOK_LOG` is unset.
const fn default_filter(verbose: bool, debug_env: bool) -> &'static str {
    if verbose || debug_env {
        "casebook=debug,info"
    } else {
        "casebook=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CASEBOOK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(default_filter(verbose, env::var("DEBUG").is_ok()))
    });

    let format = env::var("CASEBOOK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(command: &Commands, ctx: &cmd::Context) -> anyhow::Result<()> {
    match command {
        Commands::Init(args) => cmd::init::run_init(args, ctx),
        Commands::User { command } => cmd::user::run_user(command, ctx),
        Commands::File(args) => cmd::case::run_file(args, ctx),
        Commands::List(args) => cmd::case::run_list(args, ctx),
        Commands::Show(args) => cmd::case::run_show(args, ctx),
        Commands::Update(args) => cmd::case::run_update(args, ctx),
        Commands::Delete(args) => cmd::case::run_delete(args, ctx),
        Commands::Evidence(args) => cmd::case::run_evidence(args, ctx),
        Commands::Grant(args) => cmd::case::run_grant(args, ctx),
        Commands::Status(args) => cmd::lifecycle::run_status(args, ctx),
        Commands::Assign(args) => cmd::lifecycle::run_assign(args, ctx),
        Commands::Hearing(args) => cmd::lifecycle::run_hearing(args, ctx),
        Commands::Notifications { command } => {
            cmd::notification::run_notifications(command, ctx)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if cli.verbose {
        debug!("verbose logging enabled");
    }

    let output = cli.output_mode();
    let project_root = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("error: cannot read current directory: {err}");
            return ExitCode::FAILURE;
        }
    };
    let ctx = cmd::Context {
        project_root,
        db_override: cli.db,
        as_user: cli.as_user,
        output,
    };

    match run(&cli.command, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cli_err = CliError::from(&err);
            debug!(error = ?err, status = cli_err.status, "command failed");
            if let Err(render_err) = output::render_error(output, &cli_err) {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::from(cli_err.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["cb", "--json", "list"]);
        assert!(cli.output_mode().is_json());
        let cli = Cli::parse_from(["cb", "list", "--json"]);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn default_output_is_human() {
        let cli = Cli::parse_from(["cb", "list"]);
        assert!(!cli.output_mode().is_json());
    }

    #[test]
    fn as_flag_parsed_before_or_after_subcommand() {
        let cli = Cli::parse_from(["cb", "--as", "u-1", "list"]);
        assert_eq!(cli.as_user.as_deref(), Some("u-1"));
        let cli = Cli::parse_from(["cb", "show", "c-1", "--as", "u-2"]);
        assert_eq!(cli.as_user.as_deref(), Some("u-2"));
    }

    #[test]
    fn db_flag_parsed() {
        let cli = Cli::parse_from(["cb", "--db", "/tmp/cases.db", "init"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/cases.db")));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["cb", "init"],
            vec!["cb", "user", "add", "--name", "Ada", "--role", "admin"],
            vec!["cb", "user", "list"],
            vec!["cb", "file", "--title", "t", "--description", "d"],
            vec!["cb", "list", "--status", "closed"],
            vec!["cb", "show", "c-1"],
            vec!["cb", "update", "c-1", "--title", "t"],
            vec!["cb", "delete", "c-1"],
            vec!["cb", "evidence", "c-1", "files/a.pdf"],
            vec!["cb", "grant", "c-1", "u-2", "--permission", "edit"],
            vec!["cb", "status", "c-1", "closed"],
            vec!["cb", "assign", "c-1", "u-3"],
            vec!["cb", "hearing", "c-1", "--notes", "n"],
            vec!["cb", "notifications", "list", "--unread"],
            vec!["cb", "notifications", "read", "n-1"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(Cli::try_parse_from(["cb", "status", "c-1", "archived"]).is_err());
    }

    #[test]
    fn verbose_raises_default_filter() {
        assert_eq!(default_filter(false, false), "casebook=info,warn");
        assert_eq!(default_filter(true, false), "casebook=debug,info");
        assert_eq!(default_filter(false, true), "casebook=debug,info");

        let cli = Cli::parse_from(["cb", "list", "-v"]);
        assert!(cli.verbose);
    }
}
