//! `jd edit` — edit an open issue as its reporter.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;

use super::{CmdContext, resolve_issue};
use crate::output::{OutputMode, render_issue};
use drishti_core::model::MediaRef;
use drishti_core::store::{IssueEdit, MediaDelta};

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Public code (`JD-...`) or internal id (`iss-...`).
    pub reference: String,

    /// Replacement title.
    #[arg(short, long)]
    pub title: Option<String>,

    /// Replacement description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Replacement location.
    #[arg(short, long)]
    pub location: Option<String>,

    /// Replacement occurrence date (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Stored media path to keep (repeatable). When any media flag is
    /// used, stored paths not listed here are removed.
    #[arg(long)]
    pub keep_media: Vec<String>,

    /// New attachment path to add (repeatable; images and videos only).
    #[arg(long)]
    pub add_media: Vec<String>,
}

pub fn run(args: &EditArgs, output: OutputMode, ctx: &CmdContext) -> Result<()> {
    let media = if args.keep_media.is_empty() && args.add_media.is_empty() {
        None
    } else {
        Some(MediaDelta {
            retained: args.keep_media.clone(),
            added: args.add_media.iter().map(MediaRef::new).collect(),
        })
    };

    let edit = IssueEdit {
        title: args.title.clone(),
        description: args.description.clone(),
        location: args.location.clone(),
        occurred_on: args.date,
        media,
    };
    edit.validate()?;

    let mut backend = ctx.open_backend()?;
    let issue = resolve_issue(&backend, &args.reference, &ctx.caller)?;
    let updated = backend.update(&issue.id, &edit, &ctx.caller)?;
    render_issue(output, &updated)
}
