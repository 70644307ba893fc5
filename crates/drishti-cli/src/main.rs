#![forbid(unsafe_code)]

mod cmd;
mod identity;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::CmdContext;
use identity::resolve_identity;
use output::resolve_output_mode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "jd: Jan Drishti civic issue reporting",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Act as this identity: 'admin', 'admin:<name>', or 'citizen:<id>'.
    #[arg(long = "as", value_name = "IDENTITY", global = true)]
    identity: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Project",
        about = "Initialize a drishti project",
        long_about = "Initialize a drishti project (config and issue database) in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a project here\n    jd init\n\n    # Emit machine-readable output\n    jd init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Citizen",
        about = "Report a new issue",
        long_about = "Submit a new issue with required details and optional media attachments.",
        after_help = "EXAMPLES:\n    # Report a pothole\n    jd report --as citizen:usr-17 --title \"Road potholes\" \\\n        --description \"Deep potholes near the market\" \\\n        --location \"MG Road, ward 12\" --date 2026-08-05 \\\n        --name \"Asha Rao\" --contact \"98450 00000\" --media photos/pit.jpg"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        next_help_heading = "Citizen",
        about = "List your own issues",
        after_help = "EXAMPLES:\n    jd mine --as citizen:usr-17"
    )]
    Mine(cmd::mine::MineArgs),

    #[command(
        next_help_heading = "Citizen",
        about = "Edit one of your open issues",
        long_about = "Edit an issue you reported while its status is still open.",
        after_help = "EXAMPLES:\n    # Fix the description and swap media\n    jd edit JD-20260807-0001 --as citizen:usr-17 \\\n        --description \"Now with standing water\" \\\n        --keep-media /uploads/pit.jpg --add-media photos/flood.mp4"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(
        next_help_heading = "Citizen",
        about = "Delete one of your open issues",
        after_help = "EXAMPLES:\n    jd delete JD-20260807-0001 --as citizen:usr-17"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Admin",
        about = "List issues with filters",
        long_about = "List issues with optional status filter and text search, paginated client-side.",
        after_help = "EXAMPLES:\n    # Resolved issues only\n    jd list --as admin --status resolved\n\n    # Search, second page\n    jd list --as admin --search pothole --page 2\n\n    # Emit machine-readable output\n    jd list --as admin --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Admin",
        about = "Show one issue",
        after_help = "EXAMPLES:\n    jd show JD-20260807-0001 --as admin"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Admin",
        about = "Update an issue's status",
        long_about = "Move an issue to a new lifecycle status. Entering 'resolved' stamps the resolution time; leaving it clears it.",
        after_help = "EXAMPLES:\n    jd status JD-20260807-0001 resolved --as admin:nisha"
    )]
    Status(cmd::status::StatusArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("DRISHTI_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = resolve_output_mode(cli.json);
    let caller = resolve_identity(cli.identity.as_deref())?;

    match &cli.command {
        Commands::Init(args) => {
            let cwd = std::env::current_dir()?;
            cmd::init::run(args, output, &cwd)
        }
        Commands::Report(args) => cmd::report::run(args, output, &CmdContext::discover(caller)?),
        Commands::Mine(args) => cmd::mine::run(args, output, &CmdContext::discover(caller)?),
        Commands::Edit(args) => cmd::edit::run(args, output, &CmdContext::discover(caller)?),
        Commands::Delete(args) => cmd::delete::run(args, output, &CmdContext::discover(caller)?),
        Commands::List(args) => cmd::list::run(args, output, &CmdContext::discover(caller)?),
        Commands::Show(args) => cmd::show::run(args, output, &CmdContext::discover(caller)?),
        Commands::Status(args) => cmd::status::run(args, output, &CmdContext::discover(caller)?),
    }
}

fn main() {
    if let Err(err) = run() {
        if let Some(core) = err.downcast_ref::<drishti_core::Error>() {
            eprintln!("error[{}]: {core}", core.code());
            if let Some(hint) = core.hint() {
                eprintln!("hint: {hint}");
            }
        } else {
            eprintln!("error: {err:#}");
        }
        std::process::exit(1);
    }
}
