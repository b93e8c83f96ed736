use std::path::Path;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Assignment, IcsOptions, Result, date::DateNormalizer};

pub const DEFAULT_FILENAME: &str = "assignments.ics";

const ICS_DATETIME: &str = "%Y%m%dT%H%M%SZ";
/// Content lines longer than this many octets are folded.
const MAX_LINE_OCTETS: usize = 75;

/// Result of rendering a calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsDocument {
    pub content: String,
    /// Assignments that became events
    pub included: usize,
    /// Assignments left out for having no usable due date
    pub skipped: usize,
}

/// Renders assignments as an iCalendar document.
pub struct IcsExporter {
    options: IcsOptions,
    dates: DateNormalizer,
}

impl IcsExporter {
    pub fn new(options: IcsOptions, dates: DateNormalizer) -> Self {
        Self { options, dates }
    }

    /// Build the calendar text in memory.
    ///
    /// Assignments without a due date, or whose due date cannot be read,
    /// are skipped; the calendar itself is always produced.
    pub fn generate(&self, assignments: &[Assignment]) -> IcsDocument {
        self.generate_at(assignments, Utc::now())
    }

    fn generate_at(&self, assignments: &[Assignment], stamp: DateTime<Utc>) -> IcsDocument {
        let mut ics_content = String::new();

        push_line(&mut ics_content, "BEGIN:VCALENDAR");
        push_line(&mut ics_content, "VERSION:2.0");
        push_line(&mut ics_content, "PRODID:-//Canvas ICS//Canvas Assignments//EN");
        push_line(&mut ics_content, "CALSCALE:GREGORIAN");
        push_line(&mut ics_content, "METHOD:PUBLISH");

        if let Some(ref name) = self.options.calendar_name {
            push_line(&mut ics_content, &format!("X-WR-CALNAME:{}", escape_text(name)));
        }

        let mut included = 0;
        let mut skipped = 0;
        for assignment in assignments {
            let Some(ref due_at) = assignment.due_at else {
                skipped += 1;
                continue;
            };
            match self.dates.calendar(due_at) {
                Ok(start) => {
                    self.add_assignment_event(&mut ics_content, assignment, start, stamp);
                    included += 1;
                }
                Err(warning) => {
                    tracing::warn!(assignment = %assignment.name, "{warning}, leaving it out of the calendar");
                    skipped += 1;
                }
            }
        }

        push_line(&mut ics_content, "END:VCALENDAR");

        IcsDocument {
            content: ics_content,
            included,
            skipped,
        }
    }

    /// Render the calendar and write it to `path`, replacing any existing file.
    pub async fn export_to_file(
        &self,
        assignments: &[Assignment],
        path: impl AsRef<Path>,
    ) -> Result<IcsDocument> {
        let document = self.generate(assignments);
        tokio::fs::write(path.as_ref(), &document.content).await?;
        tracing::info!(
            path = %path.as_ref().display(),
            included = document.included,
            skipped = document.skipped,
            "wrote calendar"
        );
        Ok(document)
    }

    fn add_assignment_event(
        &self,
        ics_content: &mut String,
        assignment: &Assignment,
        start: DateTime<Utc>,
        stamp: DateTime<Utc>,
    ) {
        push_line(ics_content, "BEGIN:VEVENT");
        push_line(ics_content, &format!("UID:{}", Uuid::new_v4()));
        push_line(ics_content, &format!("DTSTAMP:{}", stamp.format(ICS_DATETIME)));
        push_line(ics_content, &format!("DTSTART:{}", start.format(ICS_DATETIME)));
        push_line(
            ics_content,
            &format!("SUMMARY:{}", escape_text(&assignment.name)),
        );
        push_line(
            ics_content,
            &format!(
                "DESCRIPTION:{}",
                escape_text(&format!("Course: {}", assignment.course_name))
            ),
        );

        // URL is a URI value, so an empty one is left out rather than written blank
        let url = assignment.html_url.as_deref().unwrap_or("");
        if !url.is_empty() {
            push_line(ics_content, &format!("URL:{url}"));
        }

        if let Some(reminder_minutes) = self.options.reminder_minutes {
            push_line(ics_content, "BEGIN:VALARM");
            push_line(ics_content, "ACTION:DISPLAY");
            push_line(
                ics_content,
                &format!("DESCRIPTION:{}", escape_text(&assignment.name)),
            );
            push_line(ics_content, &format!("TRIGGER:-PT{reminder_minutes}M"));
            push_line(ics_content, "END:VALARM");
        }

        push_line(ics_content, "END:VEVENT");
    }
}

impl Default for IcsExporter {
    fn default() -> Self {
        Self::new(IcsOptions::default(), DateNormalizer::default())
    }
}

/// Escape a TEXT property value.
fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
        .replace('\r', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

/// Append one content line, folded at 75 octets without splitting a
/// UTF-8 sequence.
fn push_line(ics_content: &mut String, line: &str) {
    let mut rest = line;
    let mut limit = MAX_LINE_OCTETS;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        ics_content.push_str(&rest[..cut]);
        ics_content.push_str("\r\n ");
        rest = &rest[cut..];
        // continuation lines spend one octet on the leading space
        limit = MAX_LINE_OCTETS - 1;
    }
    ics_content.push_str(rest);
    ics_content.push_str("\r\n");
}

#[cfg(test)]
mod tests;
