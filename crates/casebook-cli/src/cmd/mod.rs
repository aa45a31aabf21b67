pub mod case;
pub mod init;
pub mod lifecycle;
pub mod notification;
pub mod user;

use anyhow::Context as _;
use casebook_core::config::{self, CasebookConfig};
use casebook_core::model::Actor;
use casebook_core::store::{SqliteCaseStore, SqliteNotificationStore, SqliteUserDirectory};
use casebook_core::{CaseService, ErrorCode, db};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::actor;
use crate::output::{CommandError, OutputMode};

/// Global flags every command sees.
#[derive(Debug, Clone)]
pub struct Context {
    pub project_root: PathBuf,
    pub db_override: Option<PathBuf>,
    pub as_user: Option<String>,
    pub output: OutputMode,
}

impl Context {
    fn load_config(&self) -> anyhow::Result<CasebookConfig> {
        config::load_config(&self.project_root).map_err(|err| {
            CommandError::new(ErrorCode::ConfigParseError, format!("{err:#}")).into()
        })
    }

    /// Store path: `--db`, then `CASEBOOK_DB`, then the config.
    pub fn db_path(&self, config: &CasebookConfig) -> PathBuf {
        match &self.db_override {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.project_root.join(path),
            None => config::resolve_db_path(&self.project_root, config),
        }
    }
}

/// Open an existing store. Never creates one; that is `cb init`'s job.
pub fn open_existing(ctx: &Context) -> anyhow::Result<(Connection, CasebookConfig)> {
    let config = ctx.load_config()?;
    let path = ctx.db_path(&config);
    if !path.exists() {
        return Err(CommandError::new(
            ErrorCode::NotInitialized,
            format!("no case database at {}", path.display()),
        )
        .into());
    }
    let conn = db::open_store(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok((conn, config))
}

/// Open the store, resolve the acting user, and hand both to `f`.
pub fn with_service<T>(
    ctx: &Context,
    f: impl FnOnce(&CaseService<'_>, &Actor) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let (conn, config) = open_existing(ctx)?;
    let cases = SqliteCaseStore::new(&conn);
    let users = SqliteUserDirectory::new(&conn);
    let notifications = SqliteNotificationStore::new(&conn);
    let actor = actor::require_actor(ctx.as_user.as_deref(), &users)?;
    let service = CaseService::with_config(&cases, &users, &notifications, &config);
    f(&service, &actor)
}

pub fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
