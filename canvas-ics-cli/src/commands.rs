use std::path::PathBuf;

use anyhow::{Context, Result};
use canvas_ics_core::{Error, prelude::*};

use crate::ConnectionArgs;

/// Canvas connection built from command line / environment settings.
pub struct Connection {
    pub canvas: Canvas<CanvasClient>,
    pub dates: DateNormalizer,
}

impl Connection {
    pub fn open(args: &ConnectionArgs) -> Result<Self> {
        let config = ClientConfig {
            base_url: required(args.base_url.as_deref(), "CANVAS_BASE_URL")?,
            token: required(args.token.as_deref(), "CANVAS_API_TOKEN")?,
            timeout: Some(args.timeout),
        };

        let zone = match args.timezone.as_deref() {
            Some(name) => DisplayZone::from_name(name).map_err(Error::Config)?,
            None => DisplayZone::Local,
        };

        let client = CanvasClientBuilder::from_config(&config).build()?;
        tracing::debug!(
            base_url = client.base_url(),
            timeout = args.timeout,
            "configured Canvas client"
        );
        Ok(Self {
            canvas: Canvas::new(client, &config.base_url),
            dates: DateNormalizer::new(zone),
        })
    }
}

fn required(value: Option<&str>, name: &str) -> Result<String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(v.to_string()),
        None => Err(Error::Config(format!(
            "Missing required environment variable: {name}"
        ))
        .into()),
    }
}

/// Options for the export command.
pub struct ExportParams {
    /// Course ids given up front; empty means ask
    pub courses: Vec<u64>,
    /// Export mode given up front; `None` means ask
    pub mode: Option<ExportMode>,
    pub output: PathBuf,
    pub calendar_name: Option<String>,
    pub reminder_minutes: Option<u32>,
}

/// Fetch courses, let the user pick, print the assignments and write the
/// calendar file.
pub async fn export_command<S: PageSource, Sel: Selector>(
    canvas: &Canvas<S>,
    dates: DateNormalizer,
    selector: &mut Sel,
    params: ExportParams,
) -> Result<IcsDocument> {
    let assignments = fetch_and_print(canvas, dates, selector, params.courses).await?;

    let mode = match params.mode {
        Some(mode) => mode,
        None => selector
            .select_one("Export options", &ExportMode::choices())?
            .unwrap_or_default(),
    };

    let chosen = match mode {
        ExportMode::All => assignments,
        ExportMode::Select => {
            let chosen = select_assignments(selector, &assignments)?;
            if chosen.is_empty() {
                return Err(
                    Error::EmptyResult("No assignment selected. Exiting.".to_string()).into(),
                );
            }
            chosen
        }
    };

    let exporter = IcsExporter::new(
        IcsOptions {
            calendar_name: params.calendar_name,
            reminder_minutes: params.reminder_minutes,
        },
        dates,
    );
    let document = exporter
        .export_to_file(&chosen, &params.output)
        .await
        .with_context(|| format!("failed to write {}", params.output.display()))?;

    if document.skipped > 0 {
        println!(
            "\n{} assignment(s) without a usable due date were left out.",
            document.skipped
        );
    }
    println!("\nCreated calendar file: {}", params.output.display());

    Ok(document)
}

/// List active courses.
pub async fn courses_command<S: PageSource>(canvas: &Canvas<S>) -> Result<()> {
    let courses = canvas.fetch_courses().await?;
    if courses.is_empty() {
        return Err(Error::EmptyResult("No courses found.".to_string()).into());
    }

    println!("Active courses:");
    for course in &courses {
        println!("  {:>8}  {}", course.id, course.label());
    }
    Ok(())
}

/// Print assignments without exporting.
pub async fn list_command<S: PageSource, Sel: Selector>(
    canvas: &Canvas<S>,
    dates: DateNormalizer,
    selector: &mut Sel,
    courses: Vec<u64>,
) -> Result<()> {
    fetch_and_print(canvas, dates, selector, courses).await?;
    Ok(())
}

async fn fetch_and_print<S: PageSource, Sel: Selector>(
    canvas: &Canvas<S>,
    dates: DateNormalizer,
    selector: &mut Sel,
    preselected: Vec<u64>,
) -> Result<Vec<Assignment>> {
    let courses = canvas.fetch_courses().await?;
    if courses.is_empty() {
        return Err(Error::EmptyResult("No courses found.".to_string()).into());
    }

    let selected = if preselected.is_empty() {
        selector.select_subset(
            "Select courses to include in calendar",
            &course_choices(&courses),
        )?
    } else {
        preselected
    };
    if selected.is_empty() {
        return Err(Error::EmptyResult("No courses selected.".to_string()).into());
    }

    let assignments = AssignmentCollector::new(canvas, dates)
        .collect_for(&courses, &selected)
        .await?;

    println!("{}", format_assignments(&assignments));
    Ok(assignments)
}
