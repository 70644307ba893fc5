//! `jd report` — submit a new issue as a citizen.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Args;

use super::CmdContext;
use crate::output::{OutputMode, render_issue};
use drishti_core::model::{MediaRef, ReporterSnapshot};
use drishti_core::store::IssueDraft;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Short title of the problem (e.g. "Road potholes").
    #[arg(short, long)]
    pub title: String,

    /// What happened, in the citizen's words.
    #[arg(short, long)]
    pub description: String,

    /// Free-text location of the problem.
    #[arg(short, long)]
    pub location: String,

    /// Date the problem was observed (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub date: NaiveDate,

    /// Attachment path (repeatable; images and videos only).
    #[arg(short, long)]
    pub media: Vec<String>,

    /// Reporter's full name.
    #[arg(long)]
    pub name: String,

    /// Reporter's contact line (phone and/or address).
    #[arg(long)]
    pub contact: String,

    /// Reporter category (resident, shopkeeper, commuter, other...).
    #[arg(long, default_value = "resident")]
    pub category: String,

    /// Detail when the category is "other".
    #[arg(long)]
    pub category_detail: Option<String>,
}

pub fn run(args: &ReportArgs, output: OutputMode, ctx: &CmdContext) -> Result<()> {
    let Some(reporter_id) = ctx.caller.citizen_id() else {
        bail!("reporting requires a citizen identity (pass --as citizen:<id>)");
    };

    let draft = IssueDraft {
        title: args.title.clone(),
        description: args.description.clone(),
        location: args.location.clone(),
        occurred_on: Some(args.date),
        media: args.media.iter().map(MediaRef::new).collect(),
        reporter: ReporterSnapshot {
            id: reporter_id.to_string(),
            name: args.name.clone(),
            contact: args.contact.clone(),
            category: args.category.clone(),
            category_detail: args.category_detail.clone(),
        },
    };
    draft.validate()?;

    let mut backend = ctx.open_backend()?;
    let issue = backend.create(draft, &ctx.caller)?;
    render_issue(output, &issue)
}
