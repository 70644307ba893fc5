//! `jd init` — set up a drishti project in the current directory.

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

use crate::output::{OutputMode, render_success};
use drishti_core::config::{PROJECT_DIR, ProjectConfig};
use drishti_core::store::SqliteStore;

#[derive(Args, Debug)]
pub struct InitArgs {}

pub fn run(_args: &InitArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let project_dir = cwd.join(PROJECT_DIR);
    std::fs::create_dir_all(&project_dir)
        .with_context(|| format!("create {}", project_dir.display()))?;

    let config_path = project_dir.join("config.toml");
    if !config_path.exists() {
        let rendered =
            toml::to_string_pretty(&ProjectConfig::default()).context("render default config")?;
        std::fs::write(&config_path, rendered)
            .with_context(|| format!("write {}", config_path.display()))?;
    }

    let config = drishti_core::config::load_project_config(cwd)?;
    let db_path = cwd.join(&config.store.db_path);
    SqliteStore::open(&db_path)?;

    render_success(
        output,
        &format!("Initialized drishti project in {}", project_dir.display()),
    )
}
