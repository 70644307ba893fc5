//! `jd status` — change an issue's status (admin).

use anyhow::Result;
use clap::Args;

use super::{CmdContext, resolve_issue};
use crate::output::{OutputMode, render_issue};
use drishti_core::error::Error;
use drishti_core::model::Status;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Public code (`JD-...`) or internal id (`iss-...`).
    pub reference: String,

    /// New status: open, pending, resolved, rejected.
    pub status: String,
}

pub fn run(args: &StatusArgs, output: OutputMode, ctx: &CmdContext) -> Result<()> {
    let status: Status = args
        .status
        .parse()
        .map_err(|e: drishti_core::model::ParseStatusError| Error::validation(e.to_string()))?;

    let mut backend = ctx.open_backend()?;
    let issue = resolve_issue(&backend, &args.reference, &ctx.caller)?;
    let updated = backend.update_status(&issue.id, status, &ctx.caller)?;
    render_issue(output, &updated)
}
