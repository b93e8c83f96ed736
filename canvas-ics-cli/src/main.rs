mod commands;
mod prompt;

use std::path::PathBuf;

use anyhow::Result;
use canvas_ics_core::Error;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "canvas-ics")]
#[command(about = "Export Canvas assignments to an ICS calendar")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Canvas instance URL, e.g. https://school.instructure.com
    #[arg(long, env = "CANVAS_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Canvas personal access token
    #[arg(long, env = "CANVAS_API_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "CANVAS_TIMEOUT", global = true, default_value_t = canvas_ics_core::client::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// IANA time zone for due dates (defaults to the system zone)
    #[arg(long, env = "CANVAS_TIMEZONE", global = true)]
    pub timezone: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick courses and assignments and write an ICS file (default)
    Export(ExportArgs),

    /// List active courses
    Courses,

    /// Print assignments for the chosen courses
    List {
        /// Course id to include (repeatable); prompts when omitted
        #[arg(short = 'c', long = "course")]
        courses: Vec<u64>,
    },
}

#[derive(Args, Debug, Default)]
struct ExportArgs {
    /// Course id to include (repeatable); prompts when omitted
    #[arg(short = 'c', long = "course")]
    courses: Vec<u64>,

    /// Export all assignments or pick them; prompts when omitted
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Output file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Calendar name
    #[arg(long)]
    calendar_name: Option<String>,

    /// Reminder before each due date (minutes)
    #[arg(long)]
    reminder_minutes: Option<u32>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    All,
    Select,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log level
    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("canvas_ics_cli={log_level},canvas_ics_core={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Nothing to do is reported, not treated as a failure
    match run(cli).await {
        Err(err) if err.downcast_ref::<Error>().is_some_and(Error::is_empty_result) => {
            println!("{err}");
            Ok(())
        }
        other => other,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let connection = commands::Connection::open(&cli.connection)?;
    let mut selector = prompt::TerminalSelector::stdio();

    match cli.command.unwrap_or(Commands::Export(ExportArgs::default())) {
        Commands::Export(args) => {
            commands::export_command(
                &connection.canvas,
                connection.dates,
                &mut selector,
                commands::ExportParams {
                    courses: args.courses,
                    mode: args.mode.map(|m| match m {
                        ModeArg::All => canvas_ics_core::select::ExportMode::All,
                        ModeArg::Select => canvas_ics_core::select::ExportMode::Select,
                    }),
                    output: args.output.unwrap_or_else(|| {
                        PathBuf::from(canvas_ics_core::ics::DEFAULT_FILENAME)
                    }),
                    calendar_name: args.calendar_name,
                    reminder_minutes: args.reminder_minutes,
                },
            )
            .await?;
            Ok(())
        }

        Commands::Courses => commands::courses_command(&connection.canvas).await,

        Commands::List { courses } => {
            commands::list_command(&connection.canvas, connection.dates, &mut selector, courses)
                .await
        }
    }
}
