//! `jd list` — list issues with filtering and client-side pagination.

use anyhow::{Result, bail};
use clap::Args;

use super::CmdContext;
use crate::output::{OutputMode, render_issue_list};
use drishti_core::model::Status;
use drishti_core::store::IssueFilter;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status: open, pending, resolved, rejected.
    #[arg(short, long)]
    pub status: Option<String>,

    /// Case-insensitive search over public code, title, and description.
    #[arg(long)]
    pub search: Option<String>,

    /// Page to show (pages are fixed-size, newest issues first).
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Show the full result set without pagination.
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: &ListArgs, output: OutputMode, ctx: &CmdContext) -> Result<()> {
    let status = match args.status.as_deref() {
        Some(raw) => Some(raw.parse::<Status>().map_err(|e| anyhow::anyhow!("{e}"))?),
        None => None,
    };
    let filter = IssueFilter { status, search: args.search.clone() };

    let backend = ctx.open_backend()?;
    let issues = backend.list(&filter, &ctx.caller)?;

    if args.all {
        return render_issue_list(output, &issues, None);
    }

    if args.page == 0 {
        bail!("pages are numbered from 1");
    }
    let page_size = ctx.config.client.page_size.max(1);
    let pages = issues.len().div_ceil(page_size).max(1);
    if args.page > pages {
        bail!("page {} is out of range (1..={pages})", args.page);
    }
    let start = (args.page - 1) * page_size;
    let end = (start + page_size).min(issues.len());

    render_issue_list(
        output,
        issues.get(start..end).unwrap_or_default(),
        Some((args.page, pages, issues.len())),
    )
}
