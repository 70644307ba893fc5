//! `jd mine` — list the calling citizen's own issues.

use anyhow::{Result, bail};
use clap::Args;

use super::CmdContext;
use crate::output::{OutputMode, render_issue_list};

#[derive(Args, Debug)]
pub struct MineArgs {}

pub fn run(_args: &MineArgs, output: OutputMode, ctx: &CmdContext) -> Result<()> {
    let Some(reporter_id) = ctx.caller.citizen_id().map(str::to_string) else {
        bail!("this command requires a citizen identity (pass --as citizen:<id>)");
    };

    let backend = ctx.open_backend()?;
    let issues = backend.list_for_reporter(&reporter_id, &ctx.caller)?;
    render_issue_list(output, &issues, None)
}
