use anyhow::{Context as _, Result};
use casebook_core::config;
use casebook_core::db;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use tracing::info;

use super::{Context, display_path};
use crate::output::{self, kv};

#[derive(Args, Debug)]
pub struct InitArgs {}

#[derive(Debug, Serialize)]
struct InitReport {
    database: String,
    config: String,
    config_written: bool,
    schema_version: u32,
}

/// Execute `cb init`. Creates `.casebook/config.toml` when missing and
/// opens (creating or migrating) the case database. Safe to re-run.
///
/// # Errors
///
/// Returns an error if the config cannot be written or parsed, or the
/// database cannot be opened.
pub fn run_init(_args: &InitArgs, ctx: &Context) -> Result<()> {
    let config_written = config::write_default_config(&ctx.project_root)?;
    let cfg = ctx.load_config()?;
    let path = ctx.db_path(&cfg);

    let conn = db::open_store(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let schema_version = db::migrations::current_schema_version(&conn)?;
    info!(path = %path.display(), schema_version, "case database ready");

    let report = InitReport {
        database: display_path(&ctx.project_root, &path),
        config: display_path(&ctx.project_root, &config::config_path(&ctx.project_root)),
        config_written,
        schema_version,
    };
    output::render(ctx.output, &report, |report, w| {
        writeln!(w, "✓ casebook initialized")?;
        kv(w, "Database", &report.database)?;
        kv(
            w,
            "Config",
            if report.config_written {
                format!("{} (created)", report.config)
            } else {
                report.config.clone()
            },
        )?;
        kv(w, "Schema", report.schema_version.to_string())
    })
}
