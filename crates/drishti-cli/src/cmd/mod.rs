//! Command handlers, one module per subcommand.

pub mod delete;
pub mod edit;
pub mod init;
pub mod list;
pub mod mine;
pub mod report;
pub mod show;
pub mod status;

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use drishti_core::backend::Backend;
use drishti_core::config::{self, ProjectConfig};
use drishti_core::lifecycle;
use drishti_core::model::Issue;
use drishti_core::store::{Caller, SqliteStore};

/// Everything a command handler needs besides its own args.
pub struct CmdContext {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub caller: Caller,
}

impl CmdContext {
    /// Locate the project root and load its config.
    pub fn discover(caller: Caller) -> Result<Self> {
        let root = find_project_root()?;
        tracing::debug!(root = %root.display(), %caller, "project located");
        let config = config::load_project_config(&root)?;
        Ok(Self { root, config, caller })
    }

    /// Open the project store wrapped in a connected backend.
    pub fn open_backend(&self) -> Result<Backend<SqliteStore>> {
        let db_path = self.root.join(&self.config.store.db_path);
        let mut store = SqliteStore::open(&db_path)?;
        store.set_policy(lifecycle::configured(self.config.lifecycle.strict_transitions));
        Ok(Backend::connected(store))
    }
}

/// Walk up from the working directory looking for `.drishti/`.
fn find_project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("determine working directory")?;
    let mut dir: &Path = &cwd;
    loop {
        if dir.join(config::PROJECT_DIR).is_dir() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => bail!("not a drishti project (run `jd init` first)"),
        }
    }
}

/// Resolve an issue reference: a `JD-...` public code or an internal id.
pub fn resolve_issue(
    backend: &Backend<SqliteStore>,
    reference: &str,
    caller: &Caller,
) -> Result<Issue> {
    let issue = if reference.trim_start().starts_with("JD-") {
        backend.find_by_public_code(reference, caller)?
    } else {
        backend.get(reference, caller)?
    };
    Ok(issue)
}
