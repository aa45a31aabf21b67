//! Acting-user resolution for CLI commands.
//!
//! The resolution chain: `--as` flag > `CASEBOOK_USER` env. The resolved id
//! must name a user in the directory; its role and specialization come
//! from there, never from the command line.

use casebook_core::error::CaseError;
use casebook_core::model::{Actor, UserId};
use casebook_core::store::UserDirectory;
use casebook_core::ErrorCode;
use std::env;

use crate::output::CommandError;

pub const USER_ENV: &str = "CASEBOOK_USER";

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

fn resolve_user_id_with(cli_flag: Option<&str>, env: &dyn EnvReader) -> Option<UserId> {
    if let Some(id) = cli_flag.map(str::trim).filter(|id| !id.is_empty()) {
        return Some(UserId::new(id));
    }
    env.get(USER_ENV).map(|id| UserId::new(id.trim()))
}

/// Resolve the acting user and load them from `users`.
///
/// # Errors
///
/// `ActorRequired` when neither `--as` nor `CASEBOOK_USER` is set, or a
/// user-not-found error when the id is unknown.
pub fn require_actor(cli_flag: Option<&str>, users: &dyn UserDirectory) -> anyhow::Result<Actor> {
    require_actor_with(cli_flag, users, &RealEnv)
}

fn require_actor_with(
    cli_flag: Option<&str>,
    users: &dyn UserDirectory,
    env: &dyn EnvReader,
) -> anyhow::Result<Actor> {
    let Some(id) = resolve_user_id_with(cli_flag, env) else {
        return Err(CommandError::from(ErrorCode::ActorRequired).into());
    };
    let user = users.find(&id)?.ok_or_else(|| CaseError::NotFound {
        entity: casebook_core::error::Entity::User,
        id: id.to_string(),
    })?;
    tracing::debug!(user = %user.id, role = %user.role, "resolved acting user");
    Ok(Actor::from(user))
}
