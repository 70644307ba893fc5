//! Shared output layer for pretty/text/JSON parity across all commands.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--json` flag
//! 2. `DRISHTI_FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. User config `output` key
//! 4. Default: pretty if stdout is a TTY; text if piped.

use drishti_core::model::Issue;
use serde_json::json;
use std::io::{self, IsTerminal, Write};

/// Shared width for pretty separators.
const PRETTY_RULE_WIDTH: usize = 72;

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-optimized output (sections, visual framing).
    Pretty,
    /// Token-efficient plain text for agents and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_inner(
    json_flag: bool,
    format_env: Option<&str>,
    user_output: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    for raw in [format_env, user_output].into_iter().flatten() {
        match raw.trim().to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {} // unknown value — fall through
        }
    }

    if is_tty { OutputMode::Pretty } else { OutputMode::Text }
}

/// Resolve the output mode from the flag, environment, user config, and
/// TTY default.
pub fn resolve_output_mode(json_flag: bool) -> OutputMode {
    let env_val = std::env::var("DRISHTI_FORMAT").ok();
    let user_val = drishti_core::config::load_user_config()
        .ok()
        .and_then(|cfg| cfg.output);
    let is_tty = io::stdout().is_terminal();
    resolve_inner(json_flag, env_val.as_deref(), user_val.as_deref(), is_tty)
}

fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

fn write_issue_pretty(w: &mut dyn Write, issue: &Issue) -> io::Result<()> {
    writeln!(w, "{}  [{}]", issue.public_code, issue.status.as_str().to_uppercase())?;
    pretty_rule(w)?;
    pretty_kv(w, "Title", &issue.title)?;
    pretty_kv(w, "Description", &issue.description)?;
    pretty_kv(w, "Location", &issue.location)?;
    pretty_kv(w, "Occurred", issue.occurred_on.to_string())?;
    pretty_kv(
        w,
        "Reporter",
        format!("{} ({})", issue.reporter.name, issue.reporter.category),
    )?;
    pretty_kv(w, "Contact", &issue.reporter.contact)?;
    pretty_kv(w, "Reported", issue.created_at.to_rfc3339())?;
    if let Some(resolved_at) = issue.resolved_at {
        pretty_kv(w, "Resolved", resolved_at.to_rfc3339())?;
    }
    if !issue.media.is_empty() {
        let listing: Vec<String> = issue
            .media
            .iter()
            .map(|m| format!("{} ({})", m.path(), m.kind()))
            .collect();
        pretty_kv(w, "Media", listing.join(", "))?;
    }
    pretty_kv(w, "Id", &issue.id)?;
    Ok(())
}

fn issue_row(issue: &Issue) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        issue.public_code,
        issue.status,
        issue.title,
        issue.location
    )
}

/// Render one issue in the given mode.
pub fn render_issue(mode: OutputMode, issue: &Issue) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    match mode {
        OutputMode::Pretty => write_issue_pretty(&mut stdout, issue)?,
        OutputMode::Text => writeln!(stdout, "{}", issue_row(issue))?,
        OutputMode::Json => writeln!(stdout, "{}", serde_json::to_string(issue)?)?,
    }
    Ok(())
}

/// Render an issue listing with optional page framing.
pub fn render_issue_list(
    mode: OutputMode,
    issues: &[Issue],
    page: Option<(usize, usize, usize)>,
) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    match mode {
        OutputMode::Pretty => {
            if issues.is_empty() {
                writeln!(stdout, "No issues found matching your criteria.")?;
                return Ok(());
            }
            for issue in issues {
                write_issue_pretty(&mut stdout, issue)?;
                writeln!(stdout)?;
            }
            if let Some((page, pages, total)) = page {
                writeln!(stdout, "Page {page} of {pages} ({total} issues)")?;
            }
        }
        OutputMode::Text => {
            for issue in issues {
                writeln!(stdout, "{}", issue_row(issue))?;
            }
        }
        OutputMode::Json => {
            let body = match page {
                Some((page, pages, total)) => json!({
                    "issues": issues,
                    "page": page,
                    "pages": pages,
                    "total": total,
                }),
                None => json!(issues),
            };
            writeln!(stdout, "{body}")?;
        }
    }
    Ok(())
}

/// Render a success acknowledgement (mutations without a record to show).
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    if mode.is_json() {
        writeln!(stdout, "{}", json!({ "ok": true, "message": message }))?;
    } else {
        writeln!(stdout, "{message}")?;
    }
    Ok(())
}
