//! `jd delete` — delete an open issue as its reporter.

use anyhow::Result;
use clap::Args;

use super::{CmdContext, resolve_issue};
use crate::output::{OutputMode, render_success};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Public code (`JD-...`) or internal id (`iss-...`).
    pub reference: String,
}

pub fn run(args: &DeleteArgs, output: OutputMode, ctx: &CmdContext) -> Result<()> {
    let mut backend = ctx.open_backend()?;
    let issue = resolve_issue(&backend, &args.reference, &ctx.caller)?;
    backend.delete(&issue.id, &ctx.caller)?;
    render_success(output, &format!("Deleted issue {}", issue.public_code))
}
