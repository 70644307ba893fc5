//! `jd show` — show one issue by public code or internal id.

use anyhow::Result;
use clap::Args;

use super::{CmdContext, resolve_issue};
use crate::output::{OutputMode, render_issue};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Public code (`JD-...`) or internal id (`iss-...`).
    pub reference: String,
}

pub fn run(args: &ShowArgs, output: OutputMode, ctx: &CmdContext) -> Result<()> {
    let backend = ctx.open_backend()?;
    let issue = resolve_issue(&backend, &args.reference, &ctx.caller)?;
    render_issue(output, &issue)
}
